//! Headless reference backend.
//!
//! Renders a deterministic noisy gradient on a dedicated rayon pool so that the frame lifecycle
//! (asynchronous submission, progressive accumulation, variance, mapping) can be exercised
//! without a GPU or an external renderer. It is a test pattern, not a renderer.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    Arc, Condvar, Mutex, PoisonError,
    atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering},
};
use std::time::Instant;

use rayon::prelude::*;

use crate::{
    backend::contract::{FrameBufferDesc, RenderBackend},
    channel::registry::FrameBufferChannels,
    foundation::{
        core::PixelFormat,
        error::{FrameError, FrameResult},
    },
};

/// Options for [`HeadlessBackend`].
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HeadlessOpts {
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

/// Renderer settings understood by the headless backend.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HeadlessRenderer {
    /// Samples accumulated per pixel on each render.
    pub pixel_samples: u32,
    /// Amplitude of the per-sample noise.
    pub noise: f32,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self {
            pixel_samples: 1,
            noise: 0.25,
        }
    }
}

/// Camera settings: a vertical gradient from `top` to `bottom`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HeadlessCamera {
    /// Linear RGB at the first row.
    pub top: [f32; 3],
    /// Linear RGB at the last row.
    pub bottom: [f32; 3],
}

impl Default for HeadlessCamera {
    fn default() -> Self {
        Self {
            top: [0.25, 0.45, 0.85],
            bottom: [0.95, 0.85, 0.7],
        }
    }
}

/// World settings.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HeadlessWorld {
    /// Reflectance applied to the gradient, also written to the albedo plane.
    pub albedo: [f32; 3],
    /// Depth at the first row; grows by one across the image.
    pub near_depth: f32,
}

impl Default for HeadlessWorld {
    fn default() -> Self {
        Self {
            albedo: [0.8, 0.8, 0.8],
            near_depth: 1.0,
        }
    }
}

/// Snapshot of live handle counts, for leak checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    /// Frame buffers allocated and not yet released.
    pub live_frame_buffers: usize,
    /// Render futures issued and not yet released.
    pub live_futures: usize,
    /// Mappings handed out and not yet unmapped.
    pub live_mappings: usize,
    /// Total renders submitted.
    pub renders_submitted: u64,
}

#[derive(Debug, Default)]
struct Counters {
    live_frame_buffers: AtomicUsize,
    live_futures: AtomicUsize,
    live_mappings: AtomicUsize,
    renders_submitted: AtomicU64,
}

#[derive(Debug)]
struct Planes {
    sample_count: u32,
    accum: Vec<[f32; 4]>,
    color: Vec<u8>,
    depth: Vec<f32>,
    normal: Vec<[f32; 3]>,
    albedo: Vec<[f32; 3]>,
}

impl Planes {
    fn try_new(desc: &FrameBufferDesc) -> FrameResult<Self> {
        let too_large = || {
            FrameError::backend(format!(
                "frame buffer of {}x{} pixels is too large",
                desc.width, desc.height
            ))
        };
        let n = (desc.width as usize)
            .checked_mul(desc.height as usize)
            .ok_or_else(too_large)?;
        let color_len = n
            .checked_mul(desc.format.bytes_per_pixel())
            .ok_or_else(too_large)?;
        let plane = |flag: FrameBufferChannels| if desc.channels.contains(flag) { n } else { 0 };

        Ok(Self {
            sample_count: 0,
            accum: zeroed(n, [0.0; 4])?,
            color: zeroed(color_len, 0)?,
            depth: zeroed(plane(FrameBufferChannels::DEPTH), 0.0)?,
            normal: zeroed(plane(FrameBufferChannels::NORMAL), [0.0; 3])?,
            albedo: zeroed(plane(FrameBufferChannels::ALBEDO), [0.0; 3])?,
        })
    }

    fn reset(&mut self) {
        self.accum.fill([0.0; 4]);
        self.sample_count = 0;
    }
}

/// Frame buffer of the headless backend.
#[derive(Debug)]
pub struct HeadlessFrameBuffer {
    desc: FrameBufferDesc,
    target: Arc<Target>,
}

impl HeadlessFrameBuffer {
    /// The descriptor this buffer was allocated with.
    pub fn desc(&self) -> FrameBufferDesc {
        self.desc
    }

    /// Samples accumulated per pixel since the last reset.
    pub fn sample_count(&self) -> u32 {
        lock(&self.target.planes).sample_count
    }
}

/// Work queued against one frame buffer.
#[derive(Debug)]
enum LaneOp {
    Render { job: ShadeJob, finish: FinishGuard },
    Reset,
}

/// Ops for one frame buffer, run in submission order by at most one pool job at a time.
#[derive(Debug, Default)]
struct Lane {
    queue: VecDeque<LaneOp>,
    draining: bool,
}

/// State shared between a frame buffer and the pool job draining its lane.
#[derive(Debug)]
struct Target {
    planes: Mutex<Planes>,
    // Readable while a render holds the planes.
    variance_bits: AtomicU32,
    lane: Mutex<Lane>,
}

impl Target {
    /// Run queued ops until the lane is empty.
    fn drain(&self) {
        let mut finished: Option<FinishGuard> = None;
        loop {
            let op = {
                let mut lane = lock(&self.lane);
                let op = lane.queue.pop_front();
                lane.draining = op.is_some();
                op
            };
            // Waiters wake after the lane is marked idle, so a reset issued right after a wait
            // applies immediately.
            drop(finished.take());
            let Some(op) = op else {
                return;
            };
            finished = self.run(op);
        }
    }

    fn run(&self, op: LaneOp) -> Option<FinishGuard> {
        match op {
            LaneOp::Reset => {
                self.reset();
                None
            }
            LaneOp::Render { job, finish } => {
                let mut planes = lock(&self.planes);
                let shaded = panic::catch_unwind(AssertUnwindSafe(|| {
                    let variance = job.accumulate(&mut planes, &finish.0);
                    self.variance_bits
                        .store(variance.to_bits(), Ordering::Release);
                    job.resolve(&mut planes);
                }));
                if shaded.is_err() {
                    tracing::error!("headless render panicked; frame buffer left partially shaded");
                }
                Some(finish)
            }
        }
    }

    fn reset(&self) {
        lock(&self.planes).reset();
        self.variance_bits
            .store(f32::INFINITY.to_bits(), Ordering::Release);
    }
}

#[derive(Debug)]
struct RenderTask {
    height: u32,
    rows_done: AtomicU32,
    started: Instant,
    duration_bits: AtomicU32,
    done: Mutex<bool>,
    finished: Condvar,
}

impl RenderTask {
    fn new(height: u32) -> Self {
        Self {
            height,
            rows_done: AtomicU32::new(0),
            started: Instant::now(),
            duration_bits: AtomicU32::new(0),
            done: Mutex::new(false),
            finished: Condvar::new(),
        }
    }

    fn finish(&self) {
        let secs = self.started.elapsed().as_secs_f32();
        self.duration_bits.store(secs.to_bits(), Ordering::Release);
        *lock(&self.done) = true;
        self.finished.notify_all();
    }

    fn is_done(&self) -> bool {
        *lock(&self.done)
    }

    fn wait(&self) {
        let mut done = lock(&self.done);
        while !*done {
            done = self
                .finished
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Marks the task finished when dropped, so waiters never hang.
#[derive(Debug)]
struct FinishGuard(Arc<RenderTask>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Handle to one headless render.
#[derive(Debug)]
pub struct HeadlessFuture {
    task: Arc<RenderTask>,
}

/// Byte snapshot of one mapped plane.
#[derive(Debug)]
pub struct HeadlessMapping {
    bytes: Vec<u8>,
}

impl AsRef<[u8]> for HeadlessMapping {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Asynchronous CPU backend producing a deterministic test pattern.
#[derive(Debug)]
pub struct HeadlessBackend {
    pool: rayon::ThreadPool,
    counters: Counters,
}

impl HeadlessBackend {
    /// Build a backend with its own worker pool.
    pub fn new(opts: HeadlessOpts) -> FrameResult<Self> {
        Ok(Self {
            pool: build_thread_pool(opts.threads)?,
            counters: Counters::default(),
        })
    }

    /// Queue `op` on the buffer's lane, starting a drain job on the pool if none is running.
    fn enqueue(&self, target: &Arc<Target>, op: LaneOp) {
        let mut lane = lock(&target.lane);
        lane.queue.push_back(op);
        if !lane.draining {
            lane.draining = true;
            let target = Arc::clone(target);
            self.pool.spawn(move || target.drain());
        }
    }

    /// Current live-handle counts.
    pub fn stats(&self) -> HeadlessStats {
        HeadlessStats {
            live_frame_buffers: self.counters.live_frame_buffers.load(Ordering::Acquire),
            live_futures: self.counters.live_futures.load(Ordering::Acquire),
            live_mappings: self.counters.live_mappings.load(Ordering::Acquire),
            renders_submitted: self.counters.renders_submitted.load(Ordering::Acquire),
        }
    }
}

impl RenderBackend for HeadlessBackend {
    type FrameBuffer = HeadlessFrameBuffer;
    type Future = HeadlessFuture;
    type Renderer = HeadlessRenderer;
    type Camera = HeadlessCamera;
    type World = HeadlessWorld;
    type Mapping = HeadlessMapping;

    fn new_frame_buffer(&self, desc: &FrameBufferDesc) -> FrameResult<Self::FrameBuffer> {
        desc.validate()?;
        let planes = Planes::try_new(desc)?;
        self.counters
            .live_frame_buffers
            .fetch_add(1, Ordering::AcqRel);
        Ok(HeadlessFrameBuffer {
            desc: *desc,
            target: Arc::new(Target {
                planes: Mutex::new(planes),
                variance_bits: AtomicU32::new(f32::INFINITY.to_bits()),
                lane: Mutex::new(Lane::default()),
            }),
        })
    }

    fn release_frame_buffer(&self, fb: Self::FrameBuffer) {
        self.counters
            .live_frame_buffers
            .fetch_sub(1, Ordering::AcqRel);
        drop(fb);
    }

    fn render_frame(
        &self,
        fb: &Self::FrameBuffer,
        renderer: &Self::Renderer,
        camera: &Self::Camera,
        world: &Self::World,
    ) -> FrameResult<Self::Future> {
        if renderer.pixel_samples == 0 {
            return Err(FrameError::backend("renderer pixel_samples must be >= 1"));
        }

        let task = Arc::new(RenderTask::new(fb.desc.height));
        let job = ShadeJob {
            desc: fb.desc,
            renderer: *renderer,
            camera: *camera,
            world: *world,
        };
        self.enqueue(
            &fb.target,
            LaneOp::Render {
                job,
                finish: FinishGuard(Arc::clone(&task)),
            },
        );

        self.counters.live_futures.fetch_add(1, Ordering::AcqRel);
        self.counters
            .renders_submitted
            .fetch_add(1, Ordering::AcqRel);
        Ok(HeadlessFuture { task })
    }

    fn release_future(&self, future: Self::Future) {
        self.counters.live_futures.fetch_sub(1, Ordering::AcqRel);
        drop(future);
    }

    fn wait(&self, future: &Self::Future) {
        future.task.wait();
    }

    fn is_ready(&self, future: &Self::Future) -> bool {
        future.task.is_done()
    }

    fn progress(&self, future: &Self::Future) -> f32 {
        let task = &future.task;
        if task.is_done() {
            return 1.0;
        }
        // Reserve the tail for the resolve step.
        let rows = task.rows_done.load(Ordering::Acquire) as f32;
        (rows / (task.height as f32 + 1.0)).clamp(0.0, 1.0)
    }

    fn task_duration(&self, future: &Self::Future) -> f32 {
        let task = &future.task;
        if task.is_done() {
            f32::from_bits(task.duration_bits.load(Ordering::Acquire))
        } else {
            task.started.elapsed().as_secs_f32()
        }
    }

    fn variance(&self, fb: &Self::FrameBuffer) -> f32 {
        f32::from_bits(fb.target.variance_bits.load(Ordering::Acquire))
    }

    fn reset_accumulation(&self, fb: &Self::FrameBuffer) {
        let mut lane = lock(&fb.target.lane);
        if lane.draining {
            // Takes effect after the renders already queued, before any submitted later.
            lane.queue.push_back(LaneOp::Reset);
        } else {
            fb.target.reset();
        }
    }

    fn map_frame_buffer(
        &self,
        fb: &Self::FrameBuffer,
        channel: FrameBufferChannels,
    ) -> FrameResult<Self::Mapping> {
        if channel.bits().count_ones() != 1 {
            return Err(FrameError::backend(format!(
                "map expects exactly one plane, got {channel:?}"
            )));
        }
        if !fb.desc.channels.contains(channel) {
            return Err(FrameError::backend(format!(
                "plane {channel:?} was not allocated"
            )));
        }

        let planes = lock(&fb.target.planes);
        let bytes = if channel == FrameBufferChannels::COLOR {
            planes.color.clone()
        } else if channel == FrameBufferChannels::DEPTH {
            f32_bytes(planes.depth.iter().copied())
        } else if channel == FrameBufferChannels::NORMAL {
            f32_bytes(planes.normal.iter().flatten().copied())
        } else if channel == FrameBufferChannels::ALBEDO {
            f32_bytes(planes.albedo.iter().flatten().copied())
        } else if channel == FrameBufferChannels::ACCUM {
            f32_bytes(planes.accum.iter().flatten().copied())
        } else {
            return Err(FrameError::backend(format!(
                "plane {channel:?} cannot be mapped"
            )));
        };

        self.counters.live_mappings.fetch_add(1, Ordering::AcqRel);
        Ok(HeadlessMapping { bytes })
    }

    fn unmap_frame_buffer(&self, _fb: &Self::FrameBuffer, mapping: Self::Mapping) {
        self.counters.live_mappings.fetch_sub(1, Ordering::AcqRel);
        drop(mapping);
    }
}

#[derive(Clone, Copy, Debug)]
struct ShadeJob {
    desc: FrameBufferDesc,
    renderer: HeadlessRenderer,
    camera: HeadlessCamera,
    world: HeadlessWorld,
}

impl ShadeJob {
    fn sample(&self, x: usize, y: usize, index: u32) -> [f32; 4] {
        let t = (y as f32 + 0.5) / self.desc.height as f32;
        let seed = ((y as u64) << 32) ^ ((x as u64) << 8) ^ u64::from(index);
        let mut rgb = [0.0f32; 3];
        for (c, out) in rgb.iter_mut().enumerate() {
            let grad = self.camera.top[c] + (self.camera.bottom[c] - self.camera.top[c]) * t;
            let n = noise(seed.wrapping_add(c as u64)) * self.renderer.noise;
            *out = grad * self.world.albedo[c] + n;
        }
        [rgb[0], rgb[1], rgb[2], 1.0]
    }

    /// Add `pixel_samples` samples per pixel and return the new variance estimate.
    fn accumulate(&self, planes: &mut Planes, task: &RenderTask) -> f32 {
        let width = self.desc.width as usize;
        let base = planes.sample_count;
        let total = base + self.renderer.pixel_samples;

        let delta_sum: f64 = planes
            .accum
            .par_chunks_mut(width)
            .enumerate()
            .map(|(y, row)| {
                let mut delta = 0.0f64;
                for (x, px) in row.iter_mut().enumerate() {
                    let before = luminance(px, base);
                    for s in 0..self.renderer.pixel_samples {
                        let v = self.sample(x, y, base + s);
                        for (acc, v) in px.iter_mut().zip(v) {
                            *acc += v;
                        }
                    }
                    if let Some(before) = before {
                        let after = luminance(px, total).unwrap_or(before);
                        delta += f64::from((after - before).abs());
                    }
                }
                task.rows_done.fetch_add(1, Ordering::AcqRel);
                delta
            })
            .sum();

        planes.sample_count = total;
        if base == 0 {
            f32::INFINITY
        } else {
            (delta_sum / self.desc.pixel_count() as f64) as f32
        }
    }

    /// Convert accumulation into the color plane and fill auxiliary planes.
    fn resolve(&self, planes: &mut Planes) {
        let n = planes.sample_count.max(1) as f32;
        let bpp = self.desc.format.bytes_per_pixel();
        let format = self.desc.format;
        let Planes {
            accum,
            color,
            depth,
            normal,
            albedo,
            ..
        } = planes;

        color
            .par_chunks_mut(bpp)
            .zip(accum.par_iter())
            .for_each(|(out, sum)| {
                let mean = [sum[0] / n, sum[1] / n, sum[2] / n, sum[3] / n];
                encode_pixel(format, mean, out);
            });

        let width = self.desc.width as usize;
        let height = self.desc.height as f32;
        for (i, d) in depth.iter_mut().enumerate() {
            *d = self.world.near_depth + (i / width) as f32 / height;
        }
        normal.fill([0.0, 0.0, 1.0]);
        albedo.fill(self.world.albedo);
    }
}

fn encode_pixel(format: PixelFormat, rgba: [f32; 4], out: &mut [u8]) {
    match format {
        PixelFormat::Rgba8 => {
            for (o, v) in out.iter_mut().zip(rgba) {
                *o = unorm8(v);
            }
        }
        PixelFormat::Srgba8 => {
            for (o, v) in out.iter_mut().zip(&rgba[..3]) {
                *o = unorm8(linear_to_srgb(*v));
            }
            out[3] = unorm8(rgba[3]);
        }
        PixelFormat::Rgba32F => {
            for (chunk, v) in out.chunks_exact_mut(4).zip(rgba) {
                chunk.copy_from_slice(&v.to_le_bytes());
            }
        }
    }
}

fn luminance(sum: &[f32; 4], samples: u32) -> Option<f32> {
    if samples == 0 {
        return None;
    }
    let n = samples as f32;
    Some((0.2126 * sum[0] + 0.7152 * sum[1] + 0.0722 * sum[2]) / n)
}

fn unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

fn linear_to_srgb(v: f32) -> f32 {
    let v = v.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic value in `[-0.5, 0.5)`.
fn noise(seed: u64) -> f32 {
    let bits = mix64(seed.wrapping_add(0x9E37_79B9_7F4A_7C15)) >> 40;
    (bits as f32 / (1u64 << 24) as f32) - 0.5
}

fn f32_bytes(values: impl Iterator<Item = f32>) -> Vec<u8> {
    values.flat_map(f32::to_le_bytes).collect()
}

/// Allocate a plane of `len` copies of `fill`, reporting allocation failure instead of aborting.
fn zeroed<T: Clone>(len: usize, fill: T) -> FrameResult<Vec<T>> {
    let mut plane = Vec::new();
    plane.try_reserve_exact(len).map_err(|e| {
        FrameError::backend(format!("failed to allocate a {len}-pixel plane: {e}"))
    })?;
    plane.resize(len, fill);
    Ok(plane)
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn build_thread_pool(threads: Option<usize>) -> FrameResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FrameError::validation(
            "headless 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("lumaframe-headless-{i}"))
        .panic_handler(|_| tracing::error!("headless render job panicked"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| FrameError::backend(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/backend/headless.rs"]
mod tests;
