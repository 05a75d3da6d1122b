//! Shared store handle
//!
//! Stores are single-owner. `SharedStore` is the external serialization for
//! callers that need to reach one store from several threads.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

/// Cloneable, mutex-guarded handle to a store
///
/// ## Concurrency:
/// - Every clone shares one store and therefore one cursor
/// - Compound operations (move cursor, then read) must run inside a single
///   `with` call or while holding one `lock()` guard
pub struct SharedStore<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> SharedStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Lock the store for exclusive use
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the store
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Recover the store if this is the last handle
    pub fn try_unwrap(self) -> std::result::Result<S, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<S> Clone for SharedStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
