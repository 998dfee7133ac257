#![allow(dead_code)]

use std::sync::{
    Arc, Condvar, Mutex,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use lumaframe::{
    Device, DeviceOpts, FrameBufferChannels, FrameBufferDesc, FrameHandle, FrameResult,
    ParamValue, RenderBackend,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Alloc(u64, FrameBufferDesc),
    ReleaseFrameBuffer(u64),
    Render { fb: u64, future: u64 },
    ReleaseFuture(u64),
    Wait(u64),
    Reset(u64),
    Map(u64, FrameBufferChannels),
    Unmap(u64),
}

#[derive(Debug)]
pub struct GatedFrameBuffer {
    pub id: u64,
    pub desc: FrameBufferDesc,
}

#[derive(Debug)]
pub struct GatedFuture {
    pub id: u64,
}

#[derive(Debug)]
pub struct SceneObject(pub &'static str);

/// Backend whose renders complete only once the gate is opened.
#[derive(Default)]
pub struct GatedBackend {
    open: Mutex<bool>,
    opened: Condvar,
    next_id: AtomicU64,
    live_frame_buffers: AtomicUsize,
    live_futures: AtomicUsize,
    events: Mutex<Vec<Event>>,
}

impl GatedBackend {
    pub fn opened() -> Self {
        let b = Self::default();
        b.open_gate();
        b
    }

    pub fn closed() -> Self {
        Self::default()
    }

    pub fn open_gate(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }

    pub fn is_open(&self) -> bool {
        *self.open.lock().unwrap()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn allocations(&self) -> Vec<(u64, FrameBufferDesc)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Alloc(id, desc) => Some((id, desc)),
                _ => None,
            })
            .collect()
    }

    pub fn live_frame_buffers(&self) -> usize {
        self.live_frame_buffers.load(Ordering::SeqCst)
    }

    pub fn live_futures(&self) -> usize {
        self.live_futures.load(Ordering::SeqCst)
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl RenderBackend for GatedBackend {
    type FrameBuffer = GatedFrameBuffer;
    type Future = GatedFuture;
    type Renderer = SceneObject;
    type Camera = SceneObject;
    type World = SceneObject;
    type Mapping = Vec<u8>;

    fn new_frame_buffer(&self, desc: &FrameBufferDesc) -> FrameResult<Self::FrameBuffer> {
        let id = self.next();
        self.push(Event::Alloc(id, *desc));
        self.live_frame_buffers.fetch_add(1, Ordering::SeqCst);
        Ok(GatedFrameBuffer { id, desc: *desc })
    }

    fn release_frame_buffer(&self, fb: Self::FrameBuffer) {
        self.live_frame_buffers.fetch_sub(1, Ordering::SeqCst);
        self.push(Event::ReleaseFrameBuffer(fb.id));
    }

    fn render_frame(
        &self,
        fb: &Self::FrameBuffer,
        _renderer: &Self::Renderer,
        _camera: &Self::Camera,
        _world: &Self::World,
    ) -> FrameResult<Self::Future> {
        let id = self.next();
        self.push(Event::Render { fb: fb.id, future: id });
        self.live_futures.fetch_add(1, Ordering::SeqCst);
        Ok(GatedFuture { id })
    }

    fn release_future(&self, future: Self::Future) {
        self.live_futures.fetch_sub(1, Ordering::SeqCst);
        self.push(Event::ReleaseFuture(future.id));
    }

    fn wait(&self, future: &Self::Future) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
        drop(open);
        self.push(Event::Wait(future.id));
    }

    fn is_ready(&self, _future: &Self::Future) -> bool {
        self.is_open()
    }

    fn progress(&self, _future: &Self::Future) -> f32 {
        if self.is_open() { 1.0 } else { 0.0 }
    }

    fn task_duration(&self, _future: &Self::Future) -> f32 {
        if self.is_open() { 0.125 } else { 0.0 }
    }

    fn variance(&self, _fb: &Self::FrameBuffer) -> f32 {
        0.0
    }

    fn reset_accumulation(&self, fb: &Self::FrameBuffer) {
        self.push(Event::Reset(fb.id));
    }

    fn map_frame_buffer(
        &self,
        fb: &Self::FrameBuffer,
        channel: FrameBufferChannels,
    ) -> FrameResult<Self::Mapping> {
        self.push(Event::Map(fb.id, channel));
        Ok(vec![0; fb.desc.pixel_count() * 4])
    }

    fn unmap_frame_buffer(&self, fb: &Self::FrameBuffer, _mapping: Self::Mapping) {
        self.push(Event::Unmap(fb.id));
    }
}

pub fn device(backend: &Arc<GatedBackend>) -> Arc<Device<GatedBackend>> {
    Device::with_shared_backend(Arc::clone(backend), DeviceOpts::default()).unwrap()
}

pub fn attach_scene(frame: &FrameHandle<GatedBackend>) {
    frame
        .set_param("renderer", ParamValue::Renderer(Arc::new(SceneObject("r"))))
        .unwrap();
    frame
        .set_param("camera", ParamValue::Camera(Arc::new(SceneObject("c"))))
        .unwrap();
    frame
        .set_param("world", ParamValue::World(Arc::new(SceneObject("w"))))
        .unwrap();
}

pub fn committed_frame(
    device: &Arc<Device<GatedBackend>>,
    width: u32,
    height: u32,
) -> FrameHandle<GatedBackend> {
    let frame = device.new_frame();
    frame
        .set_param("size", ParamValue::UInt32Vec2([width, height]))
        .unwrap();
    attach_scene(&frame);
    frame.commit().unwrap();
    frame
}
