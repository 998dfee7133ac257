use std::fmt;

use crate::{
    backend::{contract::RenderBackend, scoped::Owned},
    channel::registry::{Channel, resolve_channel},
    foundation::{
        core::DataType,
        error::{FrameError, FrameResult},
    },
    frame::Frame,
};

/// Read-only pixels of one channel, valid until passed to [`Frame::unmap_channel`].
pub struct MappedChannel<B: RenderBackend> {
    /// Channel the pixels belong to.
    pub channel: Channel,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Type of one pixel element.
    pub element_type: DataType,
    pixels: B::Mapping,
}

impl<B: RenderBackend> MappedChannel<B> {
    /// Row-major pixel bytes, `width * height` elements of `element_type`.
    pub fn bytes(&self) -> &[u8] {
        self.pixels.as_ref()
    }
}

impl<B: RenderBackend> fmt::Debug for MappedChannel<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedChannel")
            .field("channel", &self.channel)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("element_type", &self.element_type)
            .field("len", &self.bytes().len())
            .finish()
    }
}

impl<B: RenderBackend> Frame<B> {
    /// Map a channel of the committed frame buffer for reading.
    ///
    /// Returns `Ok(None)` for names that are not channels and for channels the frame buffer was
    /// not allocated with.
    pub fn map_channel(&self, name: &str) -> FrameResult<Option<MappedChannel<B>>> {
        let Some(resolved) = resolve_channel(name) else {
            return Ok(None);
        };
        let channel = resolved.channel;
        if resolved.legacy {
            self.note_legacy_alias(name, channel);
        }

        let (frame_buffer, allocated) = {
            let state = self.lock();
            (state.frame_buffer.share(), state.allocated)
        };
        let (Some(fb), Some(desc)) = (frame_buffer.as_deref().and_then(Owned::get), allocated)
        else {
            return Err(FrameError::precondition(
                "frame must be committed before mapping",
            ));
        };
        if !desc.channels.contains(channel.buffer_flag()) {
            return Ok(None);
        }

        // Copying pixels may wait for a running render; the frame stays unlocked meanwhile.
        let pixels = self
            .backend()
            .map_frame_buffer(fb, channel.buffer_flag())?;
        Ok(Some(MappedChannel {
            channel,
            width: desc.width,
            height: desc.height,
            element_type: channel.element_type(desc.format),
            pixels,
        }))
    }

    /// Release a mapping returned by [`Frame::map_channel`].
    ///
    /// Fails if the frame buffer no longer exists; the mapping is dropped either way.
    pub fn unmap_channel(&self, mapped: MappedChannel<B>) -> FrameResult<()> {
        let frame_buffer = self.lock().frame_buffer.share();
        let Some(fb) = frame_buffer.as_deref().and_then(Owned::get) else {
            return Err(FrameError::precondition(
                "frame buffer released while a channel was mapped",
            ));
        };
        self.backend().unmap_frame_buffer(fb, mapped.pixels);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/mapper.rs"]
mod tests;
