use std::fmt;

use crate::foundation::core::{DataType, PixelFormat};

bitflags::bitflags! {
    /// Planes a backend frame buffer is allocated with.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FrameBufferChannels: u32 {
        /// Final color in the frame's [`PixelFormat`].
        const COLOR = 1 << 0;
        /// Per-pixel depth, `FLOAT32`.
        const DEPTH = 1 << 1;
        /// Progressive accumulation plane.
        const ACCUM = 1 << 2;
        /// Variance estimate plane.
        const VARIANCE = 1 << 3;
        /// Shading normal, `FLOAT32_VEC3`.
        const NORMAL = 1 << 4;
        /// Surface albedo, `FLOAT32_VEC3`.
        const ALBEDO = 1 << 5;
    }
}

impl FrameBufferChannels {
    /// Planes every frame buffer carries regardless of configuration.
    pub const REQUIRED: Self = Self::COLOR.union(Self::ACCUM).union(Self::VARIANCE);

    /// Planes a caller may enable in addition to color.
    pub const OPTIONAL: Self = Self::DEPTH.union(Self::NORMAL).union(Self::ALBEDO);
}

/// A caller-addressable output plane of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Color, always present.
    Color,
    /// Depth.
    Depth,
    /// Normal.
    Normal,
    /// Albedo.
    Albedo,
}

impl Channel {
    /// Every channel, in registry order.
    pub const ALL: [Self; 4] = [Self::Color, Self::Depth, Self::Normal, Self::Albedo];

    /// Prefixed name, e.g. `channel.depth`.
    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Color => "channel.color",
            Self::Depth => "channel.depth",
            Self::Normal => "channel.normal",
            Self::Albedo => "channel.albedo",
        }
    }

    /// Unprefixed name still accepted for backward compatibility.
    pub fn legacy_name(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Depth => "depth",
            Self::Normal => "normal",
            Self::Albedo => "albedo",
        }
    }

    /// Backend plane backing this channel.
    pub fn buffer_flag(self) -> FrameBufferChannels {
        match self {
            Self::Color => FrameBufferChannels::COLOR,
            Self::Depth => FrameBufferChannels::DEPTH,
            Self::Normal => FrameBufferChannels::NORMAL,
            Self::Albedo => FrameBufferChannels::ALBEDO,
        }
    }

    /// Element type the channel is stored as, or `None` when it follows the pixel format.
    pub fn fixed_element_type(self) -> Option<DataType> {
        match self {
            Self::Color => None,
            Self::Depth => Some(DataType::Float32),
            Self::Normal | Self::Albedo => Some(DataType::Float32Vec3),
        }
    }

    /// Element type of mapped pixels for a frame stored in `format`.
    pub fn element_type(self, format: PixelFormat) -> DataType {
        self.fixed_element_type().unwrap_or(format.data_type())
    }

    /// Whether a channel write carrying `requested` may be applied.
    ///
    /// Depth is enabled by any request and always stored as `FLOAT32`.
    pub fn accepts(self, requested: DataType) -> bool {
        match self {
            Self::Color => PixelFormat::from_data_type(requested).is_some(),
            Self::Depth => true,
            Self::Normal | Self::Albedo => requested == DataType::Float32Vec3,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.legacy_name())
    }
}

/// Result of resolving a channel identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedChannel {
    /// The addressed channel.
    pub channel: Channel,
    /// Whether the identifier was the unprefixed legacy spelling.
    pub legacy: bool,
}

/// Resolve a canonical or legacy channel identifier.
pub fn resolve_channel(name: &str) -> Option<ResolvedChannel> {
    Channel::ALL.into_iter().find_map(|channel| {
        if name == channel.canonical_name() {
            Some(ResolvedChannel {
                channel,
                legacy: false,
            })
        } else if name == channel.legacy_name() {
            Some(ResolvedChannel {
                channel,
                legacy: true,
            })
        } else {
            None
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/channel/registry.rs"]
mod tests;
