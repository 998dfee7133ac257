use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lumaframe::{
    Channel, DataType, Device, DeviceOpts, HeadlessBackend, HeadlessCamera, HeadlessOpts,
    HeadlessRenderer, HeadlessWorld, MappedChannel, ParamValue, PropertyFlags, WaitMask,
};

#[derive(Parser, Debug)]
#[command(name = "lumaframe", version)]
struct Cli {
    /// Log verbosity; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a frame with the headless backend and write one channel as a PNG.
    Render(RenderArgs),
    /// List the channel registry.
    Channels,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Frame description JSON.
    #[arg(long)]
    config: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Accumulation passes; overrides `passes` in the config.
    #[arg(long)]
    passes: Option<u32>,

    /// Channel to write, canonical or legacy name.
    #[arg(long, default_value = "channel.color")]
    channel: String,
}

/// Frame description read by `lumaframe render`.
#[derive(Debug, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FrameSpec {
    size: [u32; 2],
    color: DataType,
    channels: Vec<Channel>,
    passes: u32,
    renderer: HeadlessRenderer,
    camera: HeadlessCamera,
    world: HeadlessWorld,
    device: DeviceOpts,
    backend: HeadlessOpts,
}

impl Default for FrameSpec {
    fn default() -> Self {
        Self {
            size: [256, 256],
            color: DataType::UFixed8Vec4,
            channels: Vec::new(),
            passes: 1,
            renderer: HeadlessRenderer::default(),
            camera: HeadlessCamera::default(),
            world: HeadlessWorld::default(),
            device: DeviceOpts::default(),
            backend: HeadlessOpts::default(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Channels => {
            cmd_channels();
            Ok(())
        }
    }
}

fn read_spec_json(path: &Path) -> anyhow::Result<FrameSpec> {
    let f = File::open(path).with_context(|| format!("open frame config '{}'", path.display()))?;
    let spec: FrameSpec = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse frame config '{}'", path.display()))?;
    Ok(spec)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let spec = read_spec_json(&args.config)?;
    let passes = args.passes.unwrap_or(spec.passes);
    anyhow::ensure!(passes >= 1, "at least one render pass is required");

    let backend = HeadlessBackend::new(spec.backend)?;
    let device = Device::new(backend, spec.device)?;
    let frame = device.new_frame();

    frame.set_param("name", ParamValue::String("lumaframe-cli".to_string()))?;
    frame.set_param("size", ParamValue::UInt32Vec2(spec.size))?;
    frame.set_param("channel.color", ParamValue::DataType(spec.color))?;
    for channel in spec.channels.iter().filter(|c| **c != Channel::Color) {
        let ty = channel.fixed_element_type().unwrap_or(spec.color);
        frame
            .set_param(channel.canonical_name(), ParamValue::DataType(ty))
            .with_context(|| format!("enable {channel} channel"))?;
    }
    frame.set_param("renderer", ParamValue::Renderer(Arc::new(spec.renderer)))?;
    frame.set_param("camera", ParamValue::Camera(Arc::new(spec.camera)))?;
    frame.set_param("world", ParamValue::World(Arc::new(spec.world)))?;
    frame.commit()?;

    for pass in 1..=passes {
        device.render_frame(&frame)?;
        frame.ready(WaitMask::Wait);
        let read = |name| {
            frame
                .get_property(name, DataType::Float32, PropertyFlags::WAIT)
                .and_then(|v| v.as_f32())
                .unwrap_or(f32::NAN)
        };
        println!(
            "pass {pass}/{passes}: progress={:.2} variance={:.5} duration={:.4}s",
            read("progress"),
            read("variance"),
            read("duration"),
        );
    }

    let mapped = frame
        .map_channel(&args.channel)?
        .with_context(|| format!("channel '{}' is not enabled on this frame", args.channel))?;
    let rgba = to_rgba8(&mapped)?;
    let (width, height) = (mapped.width, mapped.height);
    frame.unmap_channel(mapped)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &rgba,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_channels() {
    for channel in Channel::ALL {
        let ty = channel
            .fixed_element_type()
            .map_or("pixel format", DataType::as_str);
        println!(
            "{:<16} {:<8} {}",
            channel.canonical_name(),
            channel.legacy_name(),
            ty
        );
    }
}

/// Convert a mapped channel into displayable 8-bit RGBA.
fn to_rgba8(mapped: &MappedChannel<HeadlessBackend>) -> anyhow::Result<Vec<u8>> {
    let bytes = mapped.bytes();
    let floats = || {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
    };

    let rgba = match mapped.element_type {
        DataType::UFixed8Vec4 | DataType::UFixed8RgbaSrgb => bytes.to_vec(),
        DataType::Float32Vec4 => floats().map(unorm8).collect(),
        DataType::Float32 => {
            let (lo, hi) = floats().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
            let span = (hi - lo).max(f32::EPSILON);
            floats()
                .flat_map(|v| {
                    let g = unorm8((v - lo) / span);
                    [g, g, g, 255]
                })
                .collect()
        }
        DataType::Float32Vec3 => {
            let remap = mapped.channel == Channel::Normal;
            let values: Vec<f32> = floats().collect();
            values
                .chunks_exact(3)
                .flat_map(|v| {
                    let c = |x: f32| unorm8(if remap { x * 0.5 + 0.5 } else { x });
                    [c(v[0]), c(v[1]), c(v[2]), 255]
                })
                .collect()
        }
        other => anyhow::bail!("cannot convert {other} pixels to an image"),
    };

    let expected = mapped.width as usize * mapped.height as usize * 4;
    anyhow::ensure!(
        rgba.len() == expected,
        "mapped {} has {} bytes, expected {expected}",
        mapped.channel,
        rgba.len()
    );
    Ok(rgba)
}

fn unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}
