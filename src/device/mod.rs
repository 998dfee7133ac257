pub(crate) mod notifier;

use std::fmt;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    backend::contract::RenderBackend,
    foundation::error::{FrameError, FrameResult},
    frame::Frame,
    object::param::FrameHandle,
};

use notifier::Notifier;

/// Options controlling a [`Device`].
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DeviceOpts {
    /// Worker threads running completion callbacks. `None` uses rayon defaults.
    pub notifier_threads: Option<usize>,
}

impl DeviceOpts {
    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> FrameResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| FrameError::validation(format!("invalid device options: {e}")))
    }
}

/// Owner of a render backend and the frames created on it.
///
/// The device tracks whether scene objects changed since the last render (frames reset
/// accumulation when they did) and runs frame completion callbacks on its notifier pool.
pub struct Device<B: RenderBackend> {
    backend: Arc<B>,
    modified: AtomicBool,
    notifier: Notifier,
}

impl<B: RenderBackend> Device<B> {
    /// Create a device that takes ownership of `backend`.
    pub fn new(backend: B, opts: DeviceOpts) -> FrameResult<Arc<Self>> {
        Self::with_shared_backend(Arc::new(backend), opts)
    }

    /// Create a device over a backend the caller keeps a handle to.
    pub fn with_shared_backend(backend: Arc<B>, opts: DeviceOpts) -> FrameResult<Arc<Self>> {
        Ok(Arc::new(Self {
            backend,
            modified: AtomicBool::new(false),
            notifier: Notifier::new(opts.notifier_threads)?,
        }))
    }

    /// The backend frames on this device render with.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Create an empty, uncommitted frame.
    pub fn new_frame(&self) -> FrameHandle<B> {
        Arc::new(Frame::new(Arc::clone(&self.backend)))
    }

    /// Record that scene objects changed.
    pub fn mark_modified(&self) {
        self.modified.store(true, Ordering::Release);
    }

    /// Whether scene objects changed since the flag was last cleared.
    pub fn is_modified(&self) -> bool {
        self.modified.load(Ordering::Acquire)
    }

    /// Clear the modification flag.
    pub fn clear_modified(&self) {
        self.modified.store(false, Ordering::Release);
    }

    /// Render `frame`, then clear the modification flag.
    pub fn render_frame(self: &Arc<Self>, frame: &FrameHandle<B>) -> FrameResult<()> {
        frame.render(self)?;
        self.clear_modified();
        Ok(())
    }

    /// Completion callbacks scheduled but not yet finished.
    pub fn pending_notifications(&self) -> usize {
        self.notifier.pending()
    }

    /// Block until every scheduled completion callback has run.
    ///
    /// Must not be called from inside a completion callback.
    pub fn wait_for_notifications(&self) {
        self.notifier.wait_idle();
    }

    pub(crate) fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

impl<B: RenderBackend> fmt::Debug for Device<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("modified", &self.is_modified())
            .field("pending_notifications", &self.pending_notifications())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/device/device.rs"]
mod tests;
