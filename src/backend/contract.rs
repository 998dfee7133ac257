use crate::{
    channel::registry::FrameBufferChannels,
    foundation::{
        core::PixelFormat,
        error::{FrameError, FrameResult},
    },
};

/// Allocation request for a backend frame buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameBufferDesc {
    /// Width in pixels, > 0.
    pub width: u32,
    /// Height in pixels, > 0.
    pub height: u32,
    /// Storage format of the color plane.
    pub format: PixelFormat,
    /// Planes to allocate.
    pub channels: FrameBufferChannels,
}

impl FrameBufferDesc {
    /// Reject descriptors no backend can allocate.
    pub fn validate(&self) -> FrameResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::validation(format!(
                "frame buffer extent must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.channels.contains(FrameBufferChannels::COLOR) {
            return Err(FrameError::validation(
                "frame buffer must include the color plane",
            ));
        }
        Ok(())
    }

    /// Number of pixels in one plane.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }
}

/// Render backend contract consumed by [`crate::Frame`].
///
/// The backend owns frame-buffer allocation, render submission, the future/progress primitives,
/// and pixel mapping. Handles are plain values; the frame scopes their lifetime and hands them
/// back through the `release_*` methods exactly once.
///
/// Renderer, camera, and world objects are created by the backend's user and shared with frames
/// through `Arc`.
pub trait RenderBackend: Send + Sync + 'static {
    /// Frame-buffer handle.
    type FrameBuffer: Send + Sync + 'static;
    /// Handle to one in-flight render.
    type Future: Send + Sync + 'static;
    /// Renderer object.
    type Renderer: Send + Sync + 'static;
    /// Camera object.
    type Camera: Send + Sync + 'static;
    /// World object.
    type World: Send + Sync + 'static;
    /// Read-only view over one mapped plane.
    type Mapping: AsRef<[u8]> + Send + Sync + 'static;

    /// Allocate a frame buffer.
    fn new_frame_buffer(&self, desc: &FrameBufferDesc) -> FrameResult<Self::FrameBuffer>;

    /// Release a frame buffer obtained from [`RenderBackend::new_frame_buffer`].
    fn release_frame_buffer(&self, fb: Self::FrameBuffer);

    /// Submit an asynchronous render into `fb`.
    ///
    /// Renders into one frame buffer complete in submission order. Must not block on renders
    /// already in flight; frames call this with their state locked.
    fn render_frame(
        &self,
        fb: &Self::FrameBuffer,
        renderer: &Self::Renderer,
        camera: &Self::Camera,
        world: &Self::World,
    ) -> FrameResult<Self::Future>;

    /// Drop the caller's interest in a render. Does not cancel it.
    fn release_future(&self, future: Self::Future);

    /// Block until the render has finished.
    fn wait(&self, future: &Self::Future);

    /// Whether the render has finished.
    fn is_ready(&self, future: &Self::Future) -> bool;

    /// Completed fraction in `[0, 1]`.
    fn progress(&self, future: &Self::Future) -> f32;

    /// Wall-clock seconds spent rendering so far.
    fn task_duration(&self, future: &Self::Future) -> f32;

    /// Current variance estimate of the accumulated image.
    fn variance(&self, fb: &Self::FrameBuffer) -> f32;

    /// Restart progressive accumulation.
    ///
    /// Applies after renders already submitted into `fb` and before later ones. Like
    /// [`RenderBackend::render_frame`], must not block on renders in flight.
    fn reset_accumulation(&self, fb: &Self::FrameBuffer);

    /// Map one plane for reading. `channel` holds exactly one flag.
    fn map_frame_buffer(
        &self,
        fb: &Self::FrameBuffer,
        channel: FrameBufferChannels,
    ) -> FrameResult<Self::Mapping>;

    /// Release a mapping obtained from [`RenderBackend::map_frame_buffer`].
    fn unmap_frame_buffer(&self, fb: &Self::FrameBuffer, mapping: Self::Mapping);
}
