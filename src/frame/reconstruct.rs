use crate::{
    backend::contract::{FrameBufferDesc, RenderBackend},
    channel::registry::FrameBufferChannels,
    foundation::error::FrameResult,
    frame::config::FrameConfig,
};

/// Allocation request for the frame buffer `config` describes.
///
/// Color, accumulation, and variance are always requested; the optional planes follow the
/// enabled channels.
pub(crate) fn frame_buffer_desc<B: RenderBackend>(
    config: &FrameConfig<B>,
) -> FrameResult<FrameBufferDesc> {
    let desc = FrameBufferDesc {
        width: config.width,
        height: config.height,
        format: config.format,
        channels: FrameBufferChannels::REQUIRED
            | (config.channels & FrameBufferChannels::OPTIONAL),
    };
    desc.validate()?;
    Ok(desc)
}

#[cfg(test)]
#[path = "../../tests/unit/frame/reconstruct.rs"]
mod tests;
