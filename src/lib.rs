//! lumaframe is the render-target core of a ray-tracing device layer.
//!
//! A [`Frame`] collects typed parameters (extent, color format, optional channels, the scene
//! objects to draw, a completion callback), rebuilds its backend frame buffer lazily on
//! [`Frame::commit`], submits asynchronous renders, answers telemetry queries about the latest
//! render, and maps channels for reading.
//!
//! # Lifecycle
//!
//! 1. **Create**: [`Device::new_frame`] returns an empty [`FrameHandle`].
//! 2. **Configure**: [`Frame::set_param`] records intent and marks the frame dirty when the frame
//!    buffer must change.
//! 3. **Commit**: [`Frame::commit`] reallocates the frame buffer iff the frame is dirty.
//! 4. **Render**: [`Frame::render`] (or [`Device::render_frame`]) submits one render; progress,
//!    duration, and variance are read through [`Frame::get_property`].
//! 5. **Map**: [`Frame::map_channel`] / [`Frame::unmap_channel`] expose pixels.
//!
//! The backend is any [`RenderBackend`]; [`HeadlessBackend`] is a CPU reference implementation.
//!
//! Channel parameters accept the prefixed names (`channel.color`, `channel.depth`,
//! `channel.normal`, `channel.albedo`) and, for compatibility, their unprefixed spellings. The
//! latter log a warning under the `lumaframe::deprecation` target.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(missing_docs_in_private_items)]

mod backend;
mod channel;
mod device;
mod foundation;
mod frame;
mod object;

pub use backend::contract::{FrameBufferDesc, RenderBackend};
pub use backend::headless::{
    HeadlessBackend, HeadlessCamera, HeadlessFrameBuffer, HeadlessFuture, HeadlessMapping,
    HeadlessOpts, HeadlessRenderer, HeadlessStats, HeadlessWorld,
};
pub use channel::registry::{Channel, FrameBufferChannels, ResolvedChannel, resolve_channel};
pub use device::{Device, DeviceOpts};
pub use foundation::core::{DataType, PixelFormat, PropertyFlags, PropertyValue, WaitMask};
pub use foundation::error::{FrameError, FrameResult};
pub use frame::{Frame, MappedChannel};
pub use object::param::{FrameCompletionCallback, FrameHandle, ParamValue, UserData};
