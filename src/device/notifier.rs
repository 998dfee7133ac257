use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::foundation::error::{FrameError, FrameResult};

#[derive(Debug, Default)]
struct Inflight {
    count: Mutex<usize>,
    idle: Condvar,
}

/// One outstanding notification. Dropping it, on any exit path, retires the task.
struct Ticket(Arc<Inflight>);

impl Ticket {
    fn issue(inflight: &Arc<Inflight>) -> Self {
        *inflight
            .count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Self(Arc::clone(inflight))
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let mut count = self
            .0
            .count
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.0.idle.notify_all();
        }
    }
}

/// Managed task runner for completion callbacks.
///
/// Every spawned notification is tracked until it returns or unwinds, so owners can join them
/// with [`Notifier::wait_idle`].
#[derive(Debug)]
pub(crate) struct Notifier {
    pool: rayon::ThreadPool,
    inflight: Arc<Inflight>,
}

impl Notifier {
    pub(crate) fn new(threads: Option<usize>) -> FrameResult<Self> {
        Ok(Self {
            pool: build_thread_pool(threads)?,
            inflight: Arc::new(Inflight::default()),
        })
    }

    pub(crate) fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let ticket = Ticket::issue(&self.inflight);
        self.pool.spawn(move || {
            let _ticket = ticket;
            job();
        });
    }

    pub(crate) fn pending(&self) -> usize {
        *self
            .inflight
            .count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until every spawned notification has finished.
    ///
    /// Must not be called from inside a notification.
    pub(crate) fn wait_idle(&self) {
        let mut count = self
            .inflight
            .count
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *count > 0 {
            count = self
                .inflight
                .idle
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> FrameResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FrameError::validation(
            "device 'notifier_threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("lumaframe-notify-{i}"))
        .panic_handler(|payload| {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::error!(panic = %msg, "frame completion callback panicked");
        });
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| FrameError::backend(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/device/notifier.rs"]
mod tests;
