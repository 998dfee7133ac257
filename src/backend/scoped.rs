use std::sync::Arc;

use crate::backend::contract::RenderBackend;

/// One backend handle, handed back to the backend when the last owner drops it.
pub(crate) struct Owned<B: RenderBackend, H> {
    backend: Arc<B>,
    handle: Option<H>,
    release: fn(&B, H),
}

impl<B: RenderBackend, H> Owned<B, H> {
    pub(crate) fn get(&self) -> Option<&H> {
        self.handle.as_ref()
    }
}

impl<B: RenderBackend, H> Drop for Owned<B, H> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            (self.release)(&self.backend, handle);
        }
    }
}

/// Slot owning at most one backend handle.
///
/// Installing a new handle or calling [`Scoped::clear`] gives up the slot's share of the previous
/// one. [`Scoped::share`] lends the handle out so it can be used without the slot's owner held
/// locked; the release runs once the slot and every share are gone.
pub(crate) struct Scoped<B: RenderBackend, H> {
    backend: Arc<B>,
    held: Option<Arc<Owned<B, H>>>,
    release: fn(&B, H),
}

impl<B: RenderBackend, H> Scoped<B, H> {
    pub(crate) fn empty(backend: Arc<B>, release: fn(&B, H)) -> Self {
        Self {
            backend,
            held: None,
            release,
        }
    }

    pub(crate) fn get(&self) -> Option<&H> {
        self.held.as_deref().and_then(Owned::get)
    }

    pub(crate) fn share(&self) -> Option<Arc<Owned<B, H>>> {
        self.held.clone()
    }

    pub(crate) fn is_some(&self) -> bool {
        self.held.is_some()
    }

    /// Install `handle`, dropping the slot's share of whatever was held before.
    pub(crate) fn replace(&mut self, handle: H) {
        self.clear();
        self.held = Some(Arc::new(Owned {
            backend: Arc::clone(&self.backend),
            handle: Some(handle),
            release: self.release,
        }));
    }

    pub(crate) fn clear(&mut self) {
        self.held = None;
    }
}

impl<B: RenderBackend, H> std::fmt::Debug for Scoped<B, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scoped")
            .field("held", &self.held.is_some())
            .field("shares", &self.held.as_ref().map_or(0, Arc::strong_count))
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/backend/scoped.rs"]
mod tests;
