//! Error types for the thrasher.
//!
//! Every error here is non-fatal by design: creation failures are caught at
//! the churn-loop boundary, logged, and folded into the budget accounting so
//! the harness keeps running under adverse backend conditions.

use thiserror::Error;

/// Errors produced by the fill service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FillError {
    /// The requested fill does not fit in the bounded scratch buffer.
    /// The buffer contents are left untouched.
    #[error("fill of {requested} bytes exceeds scratch capacity of {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
    /// The allocator refused a per-call buffer of the requested size.
    #[error("allocation of {requested} bytes was refused")]
    AllocationFailed { requested: usize },
}

/// A sticky error reported by the graphics backend.
///
/// Backends surface upload failures only through [`query_error`], mirroring
/// drivers where upload calls return nothing and errors accumulate until
/// queried.
///
/// [`query_error`]: crate::backend::TextureBackend::query_error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("backend error: {0}")]
pub struct BackendError(pub String);

/// Errors from texture creation.
///
/// Creation is atomic from the caller's perspective: on any failure the
/// backend handle (if one was allocated) has already been released.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CreateError {
    /// The backend refused to allocate a texture handle.
    #[error("backend refused to allocate a texture handle")]
    HandleAllocationFailed,
    /// A mip level fill failed.
    #[error("mip level fill failed: {0}")]
    FillFailed(#[from] FillError),
    /// The backend reported an error after the mip uploads.
    #[error("backend reported an upload error: {0}")]
    BackendUploadError(#[from] BackendError),
}

/// Errors from the replay script pipeline.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// A script line could not be parsed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    /// The script file could not be read.
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FillError::CapacityExceeded {
            requested: 4096,
            capacity: 1024,
        };
        assert_eq!(
            err.to_string(),
            "fill of 4096 bytes exceeds scratch capacity of 1024"
        );

        let err = CreateError::HandleAllocationFailed;
        assert_eq!(
            err.to_string(),
            "backend refused to allocate a texture handle"
        );
    }

    #[test]
    fn test_fill_error_converts_to_create_error() {
        let err: CreateError = FillError::AllocationFailed { requested: 64 }.into();
        assert!(matches!(err, CreateError::FillFailed(_)));
    }
}
