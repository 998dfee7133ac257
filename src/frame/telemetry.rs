use crate::{
    backend::{contract::RenderBackend, scoped::Owned},
    foundation::core::{DataType, PropertyFlags, PropertyValue, WaitMask},
    frame::Frame,
};

impl<B: RenderBackend> Frame<B> {
    /// Query a property.
    ///
    /// `duration`, `progress` and `variance` are answered as `FLOAT32` while a render is pending;
    /// with [`PropertyFlags::WAIT`] the query blocks until that render finishes. Every other
    /// query falls through to the generic parameter store.
    ///
    /// The frame is not locked while waiting, so queries from other threads keep answering.
    pub fn get_property(
        &self,
        name: &str,
        ty: DataType,
        flags: PropertyFlags,
    ) -> Option<PropertyValue> {
        if ty == DataType::Float32 && matches!(name, "duration" | "progress" | "variance") {
            let (pending, frame_buffer) = {
                let state = self.lock();
                (state.pending.share(), state.frame_buffer.share())
            };
            if let Some(future) = pending.as_deref().and_then(Owned::get) {
                let backend = self.backend();
                if flags.contains(PropertyFlags::WAIT) {
                    backend.wait(future);
                }
                let value = match name {
                    "duration" => Some(backend.task_duration(future)),
                    "progress" => Some(backend.progress(future)),
                    _ => frame_buffer
                        .as_deref()
                        .and_then(Owned::get)
                        .map(|fb| backend.variance(fb)),
                };
                if let Some(value) = value {
                    return Some(PropertyValue::Float32(value));
                }
            }
        }
        self.lock().base.get_property(name, ty, flags)
    }

    /// Whether the latest render has finished. A frame with nothing submitted is ready.
    pub fn ready(&self, mask: WaitMask) -> bool {
        let pending = self.lock().pending.share();
        let Some(future) = pending.as_deref().and_then(Owned::get) else {
            return true;
        };
        match mask {
            WaitMask::Wait => {
                self.backend().wait(future);
                true
            }
            WaitMask::NoWait => self.backend().is_ready(future),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/telemetry.rs"]
mod tests;
