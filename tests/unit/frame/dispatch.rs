use super::*;
use crate::backend::testing::{MockObject, RecordingBackend};
use std::sync::Arc;

type Config = FrameConfig<RecordingBackend>;
type Value = ParamValue<RecordingBackend>;

fn applied(
    result: FrameResult<Reduced<RecordingBackend>>,
) -> (Config, bool, Option<Channel>) {
    match result.unwrap() {
        Reduced::Applied {
            config,
            reconstruct,
            legacy_alias,
        } => (config, reconstruct, legacy_alias),
        Reduced::Unhandled(v) => panic!("write was not handled: {v:?}"),
    }
}

#[test]
fn size_sets_extent_and_requests_reconstruction() {
    let (config, reconstruct, legacy) =
        applied(reduce(&Config::default(), "size", Value::UInt32Vec2([800, 600])));
    assert_eq!((config.width, config.height), (800, 600));
    assert!(reconstruct);
    assert_eq!(legacy, None);
}

#[test]
fn zero_extent_is_rejected() {
    for extent in [[0, 600], [800, 0], [0, 0]] {
        let err = reduce(&Config::default(), "size", Value::UInt32Vec2(extent))
            .err()
            .unwrap();
        assert!(matches!(err, FrameError::Validation(_)), "{err}");
    }
}

#[test]
fn color_selects_pixel_format() {
    let cases = [
        (DataType::UFixed8Vec4, PixelFormat::Rgba8),
        (DataType::UFixed8RgbaSrgb, PixelFormat::Srgba8),
        (DataType::Float32Vec4, PixelFormat::Rgba32F),
    ];
    for (ty, format) in cases {
        let (config, reconstruct, _) =
            applied(reduce(&Config::default(), "channel.color", Value::DataType(ty)));
        assert_eq!(config.format, format);
        assert!(reconstruct);
    }
}

#[test]
fn color_rejects_non_color_types() {
    let err = reduce(
        &Config::default(),
        "channel.color",
        Value::DataType(DataType::Float32Vec3),
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        FrameError::UnsupportedChannelType {
            channel: Channel::Color,
            requested: DataType::Float32Vec3
        }
    ));
}

#[test]
fn depth_is_enabled_by_any_element_type() {
    let (config, reconstruct, _) = applied(reduce(
        &Config::default(),
        "channel.depth",
        Value::DataType(DataType::UFixed8Vec4),
    ));
    assert!(config.has_channel(Channel::Depth));
    assert!(reconstruct);
}

#[test]
fn albedo_and_normal_require_vec3() {
    for name in ["channel.albedo", "channel.normal"] {
        let (config, _, _) = applied(reduce(
            &Config::default(),
            name,
            Value::DataType(DataType::Float32Vec3),
        ));
        let channel = resolve_channel(name).unwrap().channel;
        assert!(config.has_channel(channel));

        let err = reduce(
            &Config::default(),
            name,
            Value::DataType(DataType::Float32Vec4),
        )
        .err()
        .unwrap();
        assert_eq!(
            err.to_string(),
            format!("unsupported {channel} channel type: FLOAT32_VEC4")
        );
    }
}

#[test]
fn legacy_names_behave_like_canonical_and_are_reported() {
    let (canonical, _, none) = applied(reduce(
        &Config::default(),
        "channel.normal",
        Value::DataType(DataType::Float32Vec3),
    ));
    let (legacy, _, some) = applied(reduce(
        &Config::default(),
        "normal",
        Value::DataType(DataType::Float32Vec3),
    ));
    assert_eq!(canonical.channels, legacy.channels);
    assert_eq!(none, None);
    assert_eq!(some, Some(Channel::Normal));
}

#[test]
fn channel_writes_accumulate() {
    let (config, _, _) = applied(reduce(
        &Config::default(),
        "channel.depth",
        Value::DataType(DataType::Float32),
    ));
    let (config, _, _) = applied(reduce(
        &config,
        "albedo",
        Value::DataType(DataType::Float32Vec3),
    ));
    assert!(config.has_channel(Channel::Depth));
    assert!(config.has_channel(Channel::Albedo));
    assert!(!config.has_channel(Channel::Normal));
}

#[test]
fn recognized_names_reject_wrong_types() {
    let err = reduce(
        &Config::default(),
        "size",
        Value::Float32Vec3([1.0, 2.0, 3.0]),
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        FrameError::TypeMismatch {
            expected: DataType::UInt32Vec2,
            actual: DataType::Float32Vec3,
            ..
        }
    ));

    let err = reduce(
        &Config::default(),
        "renderer",
        Value::Camera(Arc::new(MockObject)),
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        FrameError::TypeMismatch {
            expected: DataType::Renderer,
            actual: DataType::Camera,
            ..
        }
    ));

    let err = reduce(&Config::default(), "depth", Value::Bool(true))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        FrameError::TypeMismatch {
            expected: DataType::DataType,
            ..
        }
    ));
}

#[test]
fn scene_objects_do_not_request_reconstruction() {
    let obj = Arc::new(MockObject);
    let (config, reconstruct, _) =
        applied(reduce(&Config::default(), "renderer", Value::Renderer(Arc::clone(&obj))));
    assert!(!reconstruct);
    assert!(config.renderer.is_some());
    assert_eq!(Arc::strong_count(&obj), 2);
    drop(config);
    assert_eq!(Arc::strong_count(&obj), 1);

    let (config, reconstruct, _) = applied(reduce(
        &Config::default(),
        "frameCompletionCallbackUserData",
        Value::user_data(7_u32),
    ));
    assert!(!reconstruct);
    assert!(config.user_data.is_some());
}

#[test]
fn unknown_names_are_handed_back() {
    match reduce(&Config::default(), "name", Value::String("main".into())).unwrap() {
        Reduced::Unhandled(Value::String(s)) => assert_eq!(s, "main"),
        _ => panic!("expected an unhandled string"),
    }
}

#[test]
fn unset_restores_defaults() {
    let (config, _, _) = applied(reduce(
        &Config::default(),
        "channel.color",
        Value::DataType(DataType::Float32Vec4),
    ));
    let (config, _, _) = applied(reduce(
        &config,
        "channel.depth",
        Value::DataType(DataType::Float32),
    ));

    let Unset::Applied {
        config,
        reconstruct,
        legacy_alias,
    } = reduce_unset(&config, "channel.color")
    else {
        panic!("color unset was not handled");
    };
    assert_eq!(config.format, PixelFormat::Rgba8);
    assert!(reconstruct);
    assert_eq!(legacy_alias, None);

    let Unset::Applied {
        config,
        legacy_alias,
        ..
    } = reduce_unset(&config, "depth")
    else {
        panic!("depth unset was not handled");
    };
    assert!(!config.has_channel(Channel::Depth));
    assert_eq!(legacy_alias, Some(Channel::Depth));

    let Unset::Applied { reconstruct, .. } = reduce_unset(&config, "camera") else {
        panic!("camera unset was not handled");
    };
    assert!(!reconstruct);

    assert!(matches!(
        reduce_unset(&config, "name"),
        Unset::Unhandled
    ));
}
