//! Dummy texture backend for testing and development.
//!
//! Performs no GPU work but tracks live handles and supports failure
//! injection, so tests can drive the churn engine through its error paths
//! and assert that every handle is released exactly once.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::BackendError;

use super::{QuadCorners, TextureBackend, TextureHandle};

/// No-op backend with handle bookkeeping and failure injection.
#[derive(Debug, Default)]
pub struct DummyBackend {
    next_handle: AtomicU64,
    live: Mutex<HashSet<u64>>,
    refuse_handles: AtomicBool,
    fail_uploads: AtomicBool,
    pending_error: Mutex<Option<BackendError>>,
    double_deletes: AtomicUsize,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, `create_handle` refuses every request.
    pub fn refuse_handles(&self, refuse: bool) {
        self.refuse_handles.store(refuse, Ordering::Relaxed);
    }

    /// When set, every upload flags a sticky backend error.
    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::Relaxed);
    }

    /// Number of handles currently allocated and not yet released.
    pub fn live_handles(&self) -> usize {
        self.live.lock().expect("dummy backend mutex poisoned").len()
    }

    /// Number of times a handle was released more than once.
    pub fn double_deletes(&self) -> usize {
        self.double_deletes.load(Ordering::Relaxed)
    }

    fn flag_error(&self, message: &str) {
        let mut pending = self
            .pending_error
            .lock()
            .expect("dummy backend mutex poisoned");
        // Sticky: keep the first error until it is queried.
        if pending.is_none() {
            *pending = Some(BackendError(message.to_string()));
        }
    }
}

impl TextureBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "dummy"
    }

    fn max_texture_dimension(&self) -> u32 {
        16_384
    }

    fn create_handle(&self) -> Option<TextureHandle> {
        if self.refuse_handles.load(Ordering::Relaxed) {
            log::trace!("DummyBackend: refusing handle allocation");
            return None;
        }
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed) + 1;
        self.live
            .lock()
            .expect("dummy backend mutex poisoned")
            .insert(id);
        log::trace!("DummyBackend: created handle {id}");
        Some(TextureHandle(id))
    }

    fn upload_level(
        &self,
        handle: TextureHandle,
        level: u32,
        width: u32,
        height: u32,
        texels: &[u8],
    ) {
        log::trace!(
            "DummyBackend: upload handle={} level={level} {width}x{height} ({} bytes)",
            handle.0,
            texels.len()
        );
        if self.fail_uploads.load(Ordering::Relaxed) {
            self.flag_error("injected upload failure");
        }
    }

    fn upload_region(
        &self,
        handle: TextureHandle,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        texels: &[u8],
    ) {
        log::trace!(
            "DummyBackend: region upload handle={} level={level} +{x}+{y} {width}x{height} ({} bytes)",
            handle.0,
            texels.len()
        );
        if self.fail_uploads.load(Ordering::Relaxed) {
            self.flag_error("injected upload failure");
        }
    }

    fn query_error(&self) -> Result<(), BackendError> {
        match self
            .pending_error
            .lock()
            .expect("dummy backend mutex poisoned")
            .take()
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn draw_quad(&self, handle: TextureHandle, corners: QuadCorners) {
        log::trace!("DummyBackend: draw handle={} {corners:?}", handle.0);
    }

    fn delete_handle(&self, handle: TextureHandle) {
        let removed = self
            .live
            .lock()
            .expect("dummy backend mutex poisoned")
            .remove(&handle.0);
        if removed {
            log::trace!("DummyBackend: deleted handle {}", handle.0);
        } else {
            self.double_deletes.fetch_add(1, Ordering::Relaxed);
            log::error!("DummyBackend: handle {} released twice", handle.0);
        }
    }

    fn finish_frame(&self) {
        log::trace!("DummyBackend: frame finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique_and_tracked() {
        let backend = DummyBackend::new();
        let a = backend.create_handle().unwrap();
        let b = backend.create_handle().unwrap();
        assert_ne!(a, b);
        assert_eq!(backend.live_handles(), 2);

        backend.delete_handle(a);
        backend.delete_handle(b);
        assert_eq!(backend.live_handles(), 0);
        assert_eq!(backend.double_deletes(), 0);
    }

    #[test]
    fn test_refused_handles() {
        let backend = DummyBackend::new();
        backend.refuse_handles(true);
        assert!(backend.create_handle().is_none());
        backend.refuse_handles(false);
        assert!(backend.create_handle().is_some());
    }

    #[test]
    fn test_upload_error_is_sticky_until_queried() {
        let backend = DummyBackend::new();
        let handle = backend.create_handle().unwrap();

        assert!(backend.query_error().is_ok());

        backend.fail_uploads(true);
        backend.upload_level(handle, 0, 2, 2, &[0; 16]);
        backend.upload_level(handle, 1, 1, 1, &[0; 4]);
        assert!(backend.query_error().is_err());
        // Cleared by the query.
        assert!(backend.query_error().is_ok());
    }

    #[test]
    fn test_double_delete_is_counted() {
        let backend = DummyBackend::new();
        let handle = backend.create_handle().unwrap();
        backend.delete_handle(handle);
        backend.delete_handle(handle);
        assert_eq!(backend.double_deletes(), 1);
    }
}
