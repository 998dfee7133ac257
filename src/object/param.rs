use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{
    backend::contract::RenderBackend, device::Device, foundation::core::DataType, frame::Frame,
};

/// Opaque caller data forwarded to the completion callback.
pub type UserData = Arc<dyn Any + Send + Sync>;

/// Shared handle to a frame. Cloning extends the frame's lifetime.
pub type FrameHandle<B> = Arc<Frame<B>>;

/// Callback invoked once per render that registered it, on a device notifier thread.
///
/// Arguments are the registered user data, the device passed to the render, and the frame.
pub type FrameCompletionCallback<B> =
    Arc<dyn Fn(Option<&UserData>, &Arc<Device<B>>, &FrameHandle<B>) + Send + Sync>;

/// A typed parameter value. The variant is the value's type tag.
pub enum ParamValue<B: RenderBackend> {
    /// `BOOL`.
    Bool(bool),
    /// `INT32`.
    Int32(i32),
    /// `UINT32`.
    UInt32(u32),
    /// `FLOAT32`.
    Float32(f32),
    /// `FLOAT32_VEC3`.
    Float32Vec3([f32; 3]),
    /// `UINT32_VEC2`.
    UInt32Vec2([u32; 2]),
    /// `STRING`.
    String(String),
    /// `DATA_TYPE`.
    DataType(DataType),
    /// `VOID_POINTER`.
    UserData(UserData),
    /// `RENDERER`.
    Renderer(Arc<B::Renderer>),
    /// `CAMERA`.
    Camera(Arc<B::Camera>),
    /// `WORLD`.
    World(Arc<B::World>),
    /// `FRAME_COMPLETION_CALLBACK`.
    FrameCompletionCallback(FrameCompletionCallback<B>),
}

impl<B: RenderBackend> ParamValue<B> {
    /// Type tag of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::Int32(_) => DataType::Int32,
            Self::UInt32(_) => DataType::UInt32,
            Self::Float32(_) => DataType::Float32,
            Self::Float32Vec3(_) => DataType::Float32Vec3,
            Self::UInt32Vec2(_) => DataType::UInt32Vec2,
            Self::String(_) => DataType::String,
            Self::DataType(_) => DataType::DataType,
            Self::UserData(_) => DataType::VoidPointer,
            Self::Renderer(_) => DataType::Renderer,
            Self::Camera(_) => DataType::Camera,
            Self::World(_) => DataType::World,
            Self::FrameCompletionCallback(_) => DataType::FrameCompletionCallback,
        }
    }

    /// Wrap a closure as a `FRAME_COMPLETION_CALLBACK` value.
    pub fn completion_callback<F>(f: F) -> Self
    where
        F: Fn(Option<&UserData>, &Arc<Device<B>>, &FrameHandle<B>) + Send + Sync + 'static,
    {
        Self::FrameCompletionCallback(Arc::new(f))
    }

    /// Wrap any shareable value as `VOID_POINTER` user data.
    pub fn user_data<T: Any + Send + Sync>(value: T) -> Self {
        Self::UserData(Arc::new(value))
    }
}

impl<B: RenderBackend> Clone for ParamValue<B> {
    fn clone(&self) -> Self {
        match self {
            Self::Bool(v) => Self::Bool(*v),
            Self::Int32(v) => Self::Int32(*v),
            Self::UInt32(v) => Self::UInt32(*v),
            Self::Float32(v) => Self::Float32(*v),
            Self::Float32Vec3(v) => Self::Float32Vec3(*v),
            Self::UInt32Vec2(v) => Self::UInt32Vec2(*v),
            Self::String(v) => Self::String(v.clone()),
            Self::DataType(v) => Self::DataType(*v),
            Self::UserData(v) => Self::UserData(Arc::clone(v)),
            Self::Renderer(v) => Self::Renderer(Arc::clone(v)),
            Self::Camera(v) => Self::Camera(Arc::clone(v)),
            Self::World(v) => Self::World(Arc::clone(v)),
            Self::FrameCompletionCallback(v) => Self::FrameCompletionCallback(Arc::clone(v)),
        }
    }
}

impl<B: RenderBackend> fmt::Debug for ParamValue<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::Int32(v) => write!(f, "Int32({v})"),
            Self::UInt32(v) => write!(f, "UInt32({v})"),
            Self::Float32(v) => write!(f, "Float32({v})"),
            Self::Float32Vec3(v) => write!(f, "Float32Vec3({v:?})"),
            Self::UInt32Vec2(v) => write!(f, "UInt32Vec2({v:?})"),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::DataType(v) => write!(f, "DataType({v})"),
            // Object payloads are opaque; print the tag only.
            other => write!(f, "{}", other.data_type()),
        }
    }
}
