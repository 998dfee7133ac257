use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use crate::{
    backend::contract::{FrameBufferDesc, RenderBackend},
    channel::registry::FrameBufferChannels,
    foundation::error::{FrameError, FrameResult},
};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    NewFrameBuffer(u64, FrameBufferDesc),
    ReleaseFrameBuffer(u64),
    Render { fb: u64, future: u64 },
    ReleaseFuture(u64),
    Wait(u64),
    ResetAccumulation(u64),
    Map(u64, FrameBufferChannels),
    Unmap(u64),
}

#[derive(Debug)]
pub(crate) struct MockFrameBuffer {
    pub(crate) id: u64,
    pub(crate) desc: FrameBufferDesc,
}

#[derive(Debug)]
pub(crate) struct MockFuture {
    pub(crate) id: u64,
}

#[derive(Debug, Default)]
pub(crate) struct MockObject;

#[derive(Default)]
pub(crate) struct RecordingBackend {
    next_id: AtomicU64,
    pub(crate) fail_allocations: AtomicBool,
    log: Mutex<Vec<Call>>,
}

impl RecordingBackend {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }

    fn next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn allocations(&self) -> Vec<(u64, FrameBufferDesc)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::NewFrameBuffer(id, desc) => Some((id, desc)),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for RecordingBackend {
    type FrameBuffer = MockFrameBuffer;
    type Future = MockFuture;
    type Renderer = MockObject;
    type Camera = MockObject;
    type World = MockObject;
    type Mapping = Vec<u8>;

    fn new_frame_buffer(&self, desc: &FrameBufferDesc) -> FrameResult<Self::FrameBuffer> {
        if self.fail_allocations.load(Ordering::Relaxed) {
            return Err(FrameError::backend("allocation refused"));
        }
        let id = self.next();
        self.push(Call::NewFrameBuffer(id, *desc));
        Ok(MockFrameBuffer { id, desc: *desc })
    }

    fn release_frame_buffer(&self, fb: Self::FrameBuffer) {
        self.push(Call::ReleaseFrameBuffer(fb.id));
    }

    fn render_frame(
        &self,
        fb: &Self::FrameBuffer,
        _renderer: &Self::Renderer,
        _camera: &Self::Camera,
        _world: &Self::World,
    ) -> FrameResult<Self::Future> {
        let id = self.next();
        self.push(Call::Render { fb: fb.id, future: id });
        Ok(MockFuture { id })
    }

    fn release_future(&self, future: Self::Future) {
        self.push(Call::ReleaseFuture(future.id));
    }

    fn wait(&self, future: &Self::Future) {
        self.push(Call::Wait(future.id));
    }

    fn is_ready(&self, _future: &Self::Future) -> bool {
        true
    }

    fn progress(&self, _future: &Self::Future) -> f32 {
        1.0
    }

    fn task_duration(&self, _future: &Self::Future) -> f32 {
        0.25
    }

    fn variance(&self, _fb: &Self::FrameBuffer) -> f32 {
        0.5
    }

    fn reset_accumulation(&self, fb: &Self::FrameBuffer) {
        self.push(Call::ResetAccumulation(fb.id));
    }

    fn map_frame_buffer(
        &self,
        fb: &Self::FrameBuffer,
        channel: FrameBufferChannels,
    ) -> FrameResult<Self::Mapping> {
        self.push(Call::Map(fb.id, channel));
        Ok(vec![0; fb.desc.pixel_count() * 4])
    }

    fn unmap_frame_buffer(&self, fb: &Self::FrameBuffer, _mapping: Self::Mapping) {
        self.push(Call::Unmap(fb.id));
    }
}
