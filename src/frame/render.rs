use std::sync::Arc;

use crate::{
    backend::{contract::RenderBackend, scoped::Owned},
    device::Device,
    foundation::error::{FrameError, FrameResult},
    frame::Frame,
};

impl<B: RenderBackend> Frame<B> {
    /// Submit one asynchronous render of the committed frame buffer.
    ///
    /// The previous submission is released first (it keeps running; only the handle goes away).
    /// Accumulation restarts when `device` reports modified scene objects. With a completion
    /// callback registered this blocks until the render finishes, then schedules the callback on
    /// the device's notifier pool with a fresh handle to this frame.
    #[tracing::instrument(skip_all)]
    pub fn render(self: &Arc<Self>, device: &Arc<Device<B>>) -> FrameResult<()> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(fb) = state.frame_buffer.get() else {
            return Err(FrameError::precondition(
                "frame must be committed before rendering",
            ));
        };
        let (Some(renderer), Some(camera), Some(world)) = (
            state.config.renderer.as_ref(),
            state.config.camera.as_ref(),
            state.config.world.as_ref(),
        ) else {
            return Err(FrameError::precondition(
                "rendering requires 'renderer', 'camera' and 'world' to be set",
            ));
        };

        state.pending.clear();
        if device.is_modified() {
            tracing::debug!("scene modified, resetting accumulation");
            self.backend().reset_accumulation(fb);
        }
        let future = self.backend().render_frame(fb, renderer, camera, world)?;
        state.pending.replace(future);

        let Some(callback) = state.config.callback.clone() else {
            return Ok(());
        };
        let user_data = state.config.user_data.clone();
        let pending = state.pending.share();
        drop(guard);

        // Telemetry queries from other threads stay answerable while this waits.
        if let Some(future) = pending.as_deref().and_then(Owned::get) {
            self.backend().wait(future);
        }
        drop(pending);

        // The notifier owns these handles; they drop when the job returns or unwinds.
        let frame = Arc::clone(self);
        let notified = Arc::clone(device);
        device.notifier().spawn(move || {
            callback(user_data.as_ref(), &notified, &frame);
        });
        Ok(())
    }
}
