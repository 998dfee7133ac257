use std::fmt;

/// Type tag carried by every parameter value, property query, and mapped channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DataType {
    /// `bool`.
    #[serde(rename = "BOOL")]
    Bool,
    /// `i32`.
    #[serde(rename = "INT32")]
    Int32,
    /// `u32`.
    #[serde(rename = "UINT32")]
    UInt32,
    /// `f32`.
    #[serde(rename = "FLOAT32")]
    Float32,
    /// `[f32; 3]`.
    #[serde(rename = "FLOAT32_VEC3")]
    Float32Vec3,
    /// `[f32; 4]`.
    #[serde(rename = "FLOAT32_VEC4")]
    Float32Vec4,
    /// `[u32; 2]`.
    #[serde(rename = "UINT32_VEC2")]
    UInt32Vec2,
    /// Four normalized 8-bit components, linear.
    #[serde(rename = "UFIXED8_VEC4")]
    UFixed8Vec4,
    /// Four normalized 8-bit components, sRGB-encoded color with linear alpha.
    #[serde(rename = "UFIXED8_RGBA_SRGB")]
    UFixed8RgbaSrgb,
    /// UTF-8 string.
    #[serde(rename = "STRING")]
    String,
    /// A [`DataType`] value itself.
    #[serde(rename = "DATA_TYPE")]
    DataType,
    /// Opaque user data.
    #[serde(rename = "VOID_POINTER")]
    VoidPointer,
    /// Backend renderer object.
    #[serde(rename = "RENDERER")]
    Renderer,
    /// Backend camera object.
    #[serde(rename = "CAMERA")]
    Camera,
    /// Backend world object.
    #[serde(rename = "WORLD")]
    World,
    /// Frame completion callback.
    #[serde(rename = "FRAME_COMPLETION_CALLBACK")]
    FrameCompletionCallback,
}

impl DataType {
    /// Stable upper-case name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "BOOL",
            Self::Int32 => "INT32",
            Self::UInt32 => "UINT32",
            Self::Float32 => "FLOAT32",
            Self::Float32Vec3 => "FLOAT32_VEC3",
            Self::Float32Vec4 => "FLOAT32_VEC4",
            Self::UInt32Vec2 => "UINT32_VEC2",
            Self::UFixed8Vec4 => "UFIXED8_VEC4",
            Self::UFixed8RgbaSrgb => "UFIXED8_RGBA_SRGB",
            Self::String => "STRING",
            Self::DataType => "DATA_TYPE",
            Self::VoidPointer => "VOID_POINTER",
            Self::Renderer => "RENDERER",
            Self::Camera => "CAMERA",
            Self::World => "WORLD",
            Self::FrameCompletionCallback => "FRAME_COMPLETION_CALLBACK",
        }
    }

    /// Size of one pixel element in bytes, for types that can appear in a mapped channel.
    pub fn pixel_size(self) -> Option<usize> {
        match self {
            Self::UFixed8Vec4 | Self::UFixed8RgbaSrgb | Self::Float32 => Some(4),
            Self::Float32Vec3 => Some(12),
            Self::Float32Vec4 => Some(16),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage format of the color channel.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum PixelFormat {
    /// 8-bit linear RGBA.
    #[default]
    Rgba8,
    /// 8-bit sRGB color, linear alpha.
    Srgba8,
    /// 32-bit float RGBA.
    Rgba32F,
}

impl PixelFormat {
    /// Map a color-channel element type onto a storage format.
    pub fn from_data_type(ty: DataType) -> Option<Self> {
        match ty {
            DataType::UFixed8Vec4 => Some(Self::Rgba8),
            DataType::UFixed8RgbaSrgb => Some(Self::Srgba8),
            DataType::Float32Vec4 => Some(Self::Rgba32F),
            _ => None,
        }
    }

    /// Element type reported when the color channel is mapped.
    pub fn data_type(self) -> DataType {
        match self {
            Self::Rgba8 => DataType::UFixed8Vec4,
            Self::Srgba8 => DataType::UFixed8RgbaSrgb,
            Self::Rgba32F => DataType::Float32Vec4,
        }
    }

    /// Bytes per color pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 | Self::Srgba8 => 4,
            Self::Rgba32F => 16,
        }
    }
}

bitflags::bitflags! {
    /// Flags accepted by property queries.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u32 {
        /// Block on the pending render before reading the value.
        const WAIT = 1;
    }
}

impl PropertyFlags {
    /// Non-blocking query.
    pub const NO_WAIT: Self = Self::empty();
}

/// Blocking behavior for [`crate::Frame::ready`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitMask {
    /// Poll and return immediately.
    NoWait,
    /// Block until the pending render has finished.
    Wait,
}

/// Value returned by a property query.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    /// `FLOAT32` property.
    Float32(f32),
    /// `STRING` property.
    String(String),
}

impl PropertyValue {
    /// The float payload, if this is a `FLOAT32` value.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float32(v) => Some(*v),
            Self::String(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
