use super::*;
use crate::backend::testing::{Call, RecordingBackend};
use crate::channel::registry::FrameBufferChannels;
use crate::device::{Device, DeviceOpts};
use crate::object::param::ParamValue;
use std::sync::Arc;

fn frame_with(params: &[(&str, ParamValue<RecordingBackend>)]) -> (
    Arc<RecordingBackend>,
    Arc<Frame<RecordingBackend>>,
) {
    let backend = Arc::new(RecordingBackend::default());
    let device = Device::with_shared_backend(Arc::clone(&backend), DeviceOpts::default()).unwrap();
    let frame = device.new_frame();
    frame
        .set_param("size", ParamValue::UInt32Vec2([3, 2]))
        .unwrap();
    for (name, value) in params {
        frame.set_param(name, value.clone()).unwrap();
    }
    frame.commit().unwrap();
    (backend, frame)
}

#[test]
fn color_maps_with_the_frame_format() {
    let (backend, frame) = frame_with(&[(
        "channel.color",
        ParamValue::DataType(DataType::UFixed8RgbaSrgb),
    )]);
    let mapped = frame.map_channel("channel.color").unwrap().unwrap();
    assert_eq!(mapped.channel, Channel::Color);
    assert_eq!((mapped.width, mapped.height), (3, 2));
    assert_eq!(mapped.element_type, DataType::UFixed8RgbaSrgb);
    assert_eq!(mapped.bytes().len(), 24);

    frame.unmap_channel(mapped).unwrap();
    assert_eq!(
        backend.calls()[1..],
        [Call::Map(1, FrameBufferChannels::COLOR), Call::Unmap(1)]
    );
}

#[test]
fn optional_channels_report_their_fixed_types() {
    let (_, frame) = frame_with(&[
        ("channel.depth", ParamValue::DataType(DataType::UFixed8Vec4)),
        ("channel.normal", ParamValue::DataType(DataType::Float32Vec3)),
    ]);
    let depth = frame.map_channel("channel.depth").unwrap().unwrap();
    assert_eq!(depth.element_type, DataType::Float32);
    let normal = frame.map_channel("normal").unwrap().unwrap();
    assert_eq!(normal.element_type, DataType::Float32Vec3);
    assert_eq!(frame.legacy_alias_uses(), 1);
    frame.unmap_channel(depth).unwrap();
    frame.unmap_channel(normal).unwrap();
}

#[test]
fn unknown_or_disabled_channels_map_to_none() {
    let (backend, frame) = frame_with(&[]);
    assert!(frame.map_channel("channel.albedo").unwrap().is_none());
    assert!(frame.map_channel("accum").unwrap().is_none());
    assert!(frame.map_channel("").unwrap().is_none());
    assert_eq!(backend.calls().len(), 1);
}

#[test]
fn channels_enabled_after_commit_are_not_mappable_yet() {
    let (_, frame) = frame_with(&[]);
    frame
        .set_param("channel.albedo", ParamValue::DataType(DataType::Float32Vec3))
        .unwrap();
    assert!(frame.map_channel("channel.albedo").unwrap().is_none());
    frame.commit().unwrap();
    let albedo = frame.map_channel("channel.albedo").unwrap().unwrap();
    frame.unmap_channel(albedo).unwrap();
}

#[test]
fn mapping_before_commit_is_a_precondition_error() {
    let backend = Arc::new(RecordingBackend::default());
    let device = Device::with_shared_backend(Arc::clone(&backend), DeviceOpts::default()).unwrap();
    let frame = device.new_frame();
    let err = frame.map_channel("channel.color").unwrap_err();
    assert!(matches!(err, FrameError::Precondition(_)));
    // Unknown names never reach the frame buffer check.
    assert!(frame.map_channel("unknown").unwrap().is_none());
}
