use super::*;

#[test]
fn canonical_and_legacy_names_resolve_to_same_channel() {
    for ch in Channel::ALL {
        let canonical = resolve_channel(ch.canonical_name()).unwrap();
        let legacy = resolve_channel(ch.legacy_name()).unwrap();
        assert_eq!(canonical.channel, ch);
        assert_eq!(legacy.channel, ch);
        assert!(!canonical.legacy);
        assert!(legacy.legacy);
    }
}

#[test]
fn unknown_names_do_not_resolve() {
    assert_eq!(resolve_channel("channel.variance"), None);
    assert_eq!(resolve_channel("Channel.color"), None);
    assert_eq!(resolve_channel("channel."), None);
    assert_eq!(resolve_channel(""), None);
}

#[test]
fn optional_channels_require_vec3_floats() {
    assert!(Channel::Albedo.accepts(DataType::Float32Vec3));
    assert!(!Channel::Albedo.accepts(DataType::Float32Vec4));
    assert!(Channel::Normal.accepts(DataType::Float32Vec3));
    assert!(!Channel::Normal.accepts(DataType::Float32));
    assert!(Channel::Depth.accepts(DataType::Float32));
    assert!(Channel::Color.accepts(DataType::UFixed8RgbaSrgb));
    assert!(!Channel::Color.accepts(DataType::Float32Vec3));
}

#[test]
fn element_types_follow_format_only_for_color() {
    assert_eq!(
        Channel::Color.element_type(PixelFormat::Rgba32F),
        DataType::Float32Vec4
    );
    assert_eq!(
        Channel::Depth.element_type(PixelFormat::Rgba32F),
        DataType::Float32
    );
    assert_eq!(
        Channel::Albedo.element_type(PixelFormat::Rgba8),
        DataType::Float32Vec3
    );
}

#[test]
fn required_planes_include_accumulation_and_variance() {
    let req = FrameBufferChannels::REQUIRED;
    assert!(req.contains(FrameBufferChannels::COLOR));
    assert!(req.contains(FrameBufferChannels::ACCUM));
    assert!(req.contains(FrameBufferChannels::VARIANCE));
    assert!(!req.intersects(FrameBufferChannels::OPTIONAL));
    for ch in Channel::ALL.into_iter().skip(1) {
        assert!(FrameBufferChannels::OPTIONAL.contains(ch.buffer_flag()));
    }
}
