//! Parameter reducer: `(config, write) -> (config', reconstruct?)`.
//!
//! Works on a copy of the configuration so that a rejected write never applies partially.

use crate::{
    backend::contract::RenderBackend,
    channel::registry::{Channel, resolve_channel},
    foundation::{
        core::{DataType, PixelFormat},
        error::{FrameError, FrameResult},
    },
    frame::config::FrameConfig,
    object::param::ParamValue,
};

/// Outcome of reducing one parameter write.
pub(crate) enum Reduced<B: RenderBackend> {
    /// The write was recognized and valid.
    Applied {
        config: FrameConfig<B>,
        /// The frame buffer must be rebuilt on the next commit.
        reconstruct: bool,
        /// The write addressed a channel through its unprefixed legacy name.
        legacy_alias: Option<Channel>,
    },
    /// Not a frame parameter; the value is handed back for the base object.
    Unhandled(ParamValue<B>),
}

/// Outcome of reducing one parameter removal.
pub(crate) enum Unset<B: RenderBackend> {
    Applied {
        config: FrameConfig<B>,
        reconstruct: bool,
        legacy_alias: Option<Channel>,
    },
    Unhandled,
}

pub(crate) fn reduce<B: RenderBackend>(
    current: &FrameConfig<B>,
    name: &str,
    value: ParamValue<B>,
) -> FrameResult<Reduced<B>> {
    if let Some(resolved) = resolve_channel(name) {
        let ParamValue::DataType(requested) = value else {
            return Err(FrameError::type_mismatch(
                name,
                DataType::DataType,
                value.data_type(),
            ));
        };
        let channel = resolved.channel;
        if !channel.accepts(requested) {
            return Err(FrameError::UnsupportedChannelType { channel, requested });
        }

        let mut next = current.clone();
        if channel == Channel::Color {
            let Some(format) = PixelFormat::from_data_type(requested) else {
                return Err(FrameError::UnsupportedChannelType { channel, requested });
            };
            next.format = format;
        } else {
            next.channels |= channel.buffer_flag();
        }
        return Ok(Reduced::Applied {
            config: next,
            reconstruct: true,
            legacy_alias: resolved.legacy.then_some(channel),
        });
    }

    let expected = match name {
        "size" => DataType::UInt32Vec2,
        "renderer" => DataType::Renderer,
        "camera" => DataType::Camera,
        "world" => DataType::World,
        "frameCompletionCallback" => DataType::FrameCompletionCallback,
        "frameCompletionCallbackUserData" => DataType::VoidPointer,
        _ => return Ok(Reduced::Unhandled(value)),
    };
    if value.data_type() != expected {
        return Err(FrameError::type_mismatch(
            name,
            expected,
            value.data_type(),
        ));
    }

    let mut next = current.clone();
    let mut reconstruct = false;
    match value {
        ParamValue::UInt32Vec2([w, h]) => {
            if w == 0 || h == 0 {
                return Err(FrameError::validation(format!(
                    "frame size must be positive, got {w}x{h}"
                )));
            }
            next.width = w;
            next.height = h;
            reconstruct = true;
        }
        ParamValue::Renderer(r) => next.renderer = Some(r),
        ParamValue::Camera(c) => next.camera = Some(c),
        ParamValue::World(w) => next.world = Some(w),
        ParamValue::FrameCompletionCallback(cb) => next.callback = Some(cb),
        ParamValue::UserData(data) => next.user_data = Some(data),
        other => return Ok(Reduced::Unhandled(other)),
    }

    Ok(Reduced::Applied {
        config: next,
        reconstruct,
        legacy_alias: None,
    })
}

pub(crate) fn reduce_unset<B: RenderBackend>(current: &FrameConfig<B>, name: &str) -> Unset<B> {
    let mut next = current.clone();

    if let Some(resolved) = resolve_channel(name) {
        let channel = resolved.channel;
        if channel == Channel::Color {
            next.format = PixelFormat::default();
        } else {
            next.channels.remove(channel.buffer_flag());
        }
        return Unset::Applied {
            config: next,
            reconstruct: true,
            legacy_alias: resolved.legacy.then_some(channel),
        };
    }

    let reconstruct = match name {
        "size" => {
            next.width = 0;
            next.height = 0;
            true
        }
        "renderer" => {
            next.renderer = None;
            false
        }
        "camera" => {
            next.camera = None;
            false
        }
        "world" => {
            next.world = None;
            false
        }
        "frameCompletionCallback" => {
            next.callback = None;
            false
        }
        "frameCompletionCallbackUserData" => {
            next.user_data = None;
            false
        }
        _ => return Unset::Unhandled,
    };

    Unset::Applied {
        config: next,
        reconstruct,
        legacy_alias: None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/dispatch.rs"]
mod tests;
