use std::sync::Arc;

use crate::{
    backend::contract::RenderBackend,
    channel::registry::{Channel, FrameBufferChannels},
    foundation::core::PixelFormat,
    object::param::{FrameCompletionCallback, UserData},
};

/// Caller-visible configuration of a frame, as last written through parameters.
pub(crate) struct FrameConfig<B: RenderBackend> {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) format: PixelFormat,
    /// Enabled optional planes; color is implicit.
    pub(crate) channels: FrameBufferChannels,
    pub(crate) renderer: Option<Arc<B::Renderer>>,
    pub(crate) camera: Option<Arc<B::Camera>>,
    pub(crate) world: Option<Arc<B::World>>,
    pub(crate) callback: Option<FrameCompletionCallback<B>>,
    pub(crate) user_data: Option<UserData>,
}

impl<B: RenderBackend> FrameConfig<B> {
    pub(crate) fn has_channel(&self, channel: Channel) -> bool {
        channel == Channel::Color || self.channels.contains(channel.buffer_flag())
    }
}

impl<B: RenderBackend> Default for FrameConfig<B> {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            format: PixelFormat::default(),
            channels: FrameBufferChannels::empty(),
            renderer: None,
            camera: None,
            world: None,
            callback: None,
            user_data: None,
        }
    }
}

impl<B: RenderBackend> Clone for FrameConfig<B> {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            format: self.format,
            channels: self.channels,
            renderer: self.renderer.clone(),
            camera: self.camera.clone(),
            world: self.world.clone(),
            callback: self.callback.clone(),
            user_data: self.user_data.clone(),
        }
    }
}

impl<B: RenderBackend> std::fmt::Debug for FrameConfig<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("channels", &self.channels)
            .field("renderer", &self.renderer.is_some())
            .field("camera", &self.camera.is_some())
            .field("world", &self.world.is_some())
            .field("callback", &self.callback.is_some())
            .field("user_data", &self.user_data.is_some())
            .finish()
    }
}
