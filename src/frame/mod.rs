//! The frame object: parameters, lazy frame-buffer reconstruction, asynchronous render, and
//! channel mapping.

pub(crate) mod config;
pub(crate) mod dispatch;
pub(crate) mod mapper;
pub(crate) mod reconstruct;
pub(crate) mod render;
pub(crate) mod telemetry;

use std::fmt;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    backend::{
        contract::{FrameBufferDesc, RenderBackend},
        scoped::Scoped,
    },
    channel::registry::Channel,
    foundation::{core::PixelFormat, error::FrameResult},
    object::{base::BaseObject, param::ParamValue},
};

use config::FrameConfig;
use dispatch::{Reduced, Unset};

pub use mapper::MappedChannel;

/// A render target: configuration plus the backend resources built from it.
///
/// Parameter writes only record intent and mark the frame dirty; the backend frame buffer is
/// rebuilt on [`Frame::commit`]. Frames are created by [`crate::Device::new_frame`] and shared as
/// [`crate::FrameHandle`].
pub struct Frame<B: RenderBackend> {
    backend: Arc<B>,
    state: Mutex<FrameState<B>>,
    legacy_alias_uses: AtomicU64,
}

pub(crate) struct FrameState<B: RenderBackend> {
    pub(crate) config: FrameConfig<B>,
    pub(crate) dirty: bool,
    pub(crate) base: BaseObject<B>,
    /// Descriptor the current frame buffer was allocated with.
    pub(crate) allocated: Option<FrameBufferDesc>,
    // Field order is drop order: the pending render goes before its frame buffer.
    pub(crate) pending: Scoped<B, B::Future>,
    pub(crate) frame_buffer: Scoped<B, B::FrameBuffer>,
}

impl<B: RenderBackend> Frame<B> {
    pub(crate) fn new(backend: Arc<B>) -> Self {
        let state = FrameState {
            config: FrameConfig::default(),
            dirty: false,
            base: BaseObject::default(),
            allocated: None,
            pending: Scoped::empty(Arc::clone(&backend), B::release_future),
            frame_buffer: Scoped::empty(Arc::clone(&backend), B::release_frame_buffer),
        };
        Self {
            backend,
            state: Mutex::new(state),
            legacy_alias_uses: AtomicU64::new(0),
        }
    }

    /// Write a parameter.
    ///
    /// Recognized names update the frame configuration; everything else is stored on the generic
    /// parameter store. A rejected write leaves the frame unchanged.
    pub fn set_param(&self, name: &str, value: ParamValue<B>) -> FrameResult<()> {
        let mut state = self.lock();
        match dispatch::reduce(&state.config, name, value)? {
            Reduced::Applied {
                config,
                reconstruct,
                legacy_alias,
            } => {
                if let Some(channel) = legacy_alias {
                    self.note_legacy_alias(name, channel);
                }
                state.config = config;
                state.dirty |= reconstruct;
                tracing::trace!(name, reconstruct, "frame parameter applied");
            }
            Reduced::Unhandled(value) => state.base.set_param(name, value),
        }
        Ok(())
    }

    /// Remove a parameter, restoring its default.
    pub fn unset_param(&self, name: &str) {
        let mut state = self.lock();
        match dispatch::reduce_unset(&state.config, name) {
            Unset::Applied {
                config,
                reconstruct,
                legacy_alias,
            } => {
                if let Some(channel) = legacy_alias {
                    self.note_legacy_alias(name, channel);
                }
                state.config = config;
                state.dirty |= reconstruct;
            }
            Unset::Unhandled => {
                state.base.unset_param(name);
            }
        }
    }

    /// A generic parameter previously stored under `name`.
    pub fn param(&self, name: &str) -> Option<ParamValue<B>> {
        self.lock().base.param(name).cloned()
    }

    /// Names of the generic parameters stored on this frame, sorted.
    pub fn param_names(&self) -> Vec<String> {
        self.lock()
            .base
            .param_names()
            .map(str::to_string)
            .collect()
    }

    /// Rebuild the backend frame buffer if any reconstruction-relevant parameter changed.
    ///
    /// On allocation failure the frame stays dirty, so the next commit retries.
    #[tracing::instrument(skip(self))]
    pub fn commit(&self) -> FrameResult<()> {
        let mut state = self.lock();
        if !state.dirty {
            return Ok(());
        }

        let desc = reconstruct::frame_buffer_desc(&state.config)?;
        state.frame_buffer.clear();
        state.allocated = None;

        let fb = self.backend.new_frame_buffer(&desc)?;
        state.frame_buffer.replace(fb);
        state.allocated = Some(desc);
        state.dirty = false;
        tracing::debug!(
            width = desc.width,
            height = desc.height,
            format = ?desc.format,
            channels = ?desc.channels,
            "frame buffer reconstructed"
        );
        Ok(())
    }

    /// Whether a frame buffer currently exists.
    pub fn is_committed(&self) -> bool {
        self.lock().frame_buffer.is_some()
    }

    /// Whether a parameter change is waiting for [`Frame::commit`].
    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Whether a render has been submitted and not yet replaced.
    pub fn has_pending_render(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Configured `(width, height)`; `(0, 0)` until `size` is set.
    pub fn size(&self) -> (u32, u32) {
        let state = self.lock();
        (state.config.width, state.config.height)
    }

    /// Configured color format.
    pub fn pixel_format(&self) -> PixelFormat {
        self.lock().config.format
    }

    /// Channels enabled in the configuration. Color is always listed.
    pub fn enabled_channels(&self) -> Vec<Channel> {
        let state = self.lock();
        Channel::ALL
            .into_iter()
            .filter(|c| state.config.has_channel(*c))
            .collect()
    }

    /// Descriptor of the current frame buffer, if committed.
    pub fn frame_buffer_desc(&self) -> Option<FrameBufferDesc> {
        self.lock().allocated
    }

    /// How many times this frame was addressed through a deprecated channel name.
    pub fn legacy_alias_uses(&self) -> u64 {
        self.legacy_alias_uses.load(Ordering::Relaxed)
    }

    pub(crate) fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, FrameState<B>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn note_legacy_alias(&self, name: &str, channel: Channel) {
        self.legacy_alias_uses.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            target: "lumaframe::deprecation",
            name,
            replacement = channel.canonical_name(),
            "unprefixed channel name is deprecated"
        );
    }
}

impl<B: RenderBackend> fmt::Debug for Frame<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Frame")
            .field("config", &state.config)
            .field("dirty", &state.dirty)
            .field("allocated", &state.allocated)
            .field("pending", &state.pending.is_some())
            .field("params", &state.base)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/frame.rs"]
mod tests;
