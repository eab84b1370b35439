//! Texture backend abstraction layer.
//!
//! This module provides a trait-based abstraction over the graphics backend
//! the thrasher exercises.
//!
//! # Available Backends
//!
//! - `dummy`: No-op backend for tests and CI, with failure injection
//! - `wgpu-backend` (default feature): Headless wgpu backend that allocates
//!   real GPU textures and draws quads into an offscreen target
//!
//! # Surface
//!
//! The trait deliberately mirrors how drivers expose texture memory: handle
//! allocation can refuse, uploads return nothing, and upload errors are
//! observable only through a separate sticky error query.

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_backend;

pub mod dummy;

use std::sync::Arc;

use crate::error::BackendError;
use crate::rng::RandomSource;

/// Opaque handle to a backend texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u64);

/// Screen-space corners of one textured quad, each in `[-1, 1]`.
///
/// The corners are drawn independently, so the quad may be mirrored or
/// degenerate; placement only has to vary per frame, not look good.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadCorners {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl QuadCorners {
    /// Draw four independent corners from `rng`.
    pub fn random(rng: &mut RandomSource) -> Self {
        Self {
            left: rng.float_in(-1.0, 1.0),
            right: rng.float_in(-1.0, 1.0),
            top: rng.float_in(-1.0, 1.0),
            bottom: rng.float_in(-1.0, 1.0),
        }
    }
}

/// Graphics backend consumed by the texture abstraction and the replay
/// player.
pub trait TextureBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// The largest texture dimension the backend supports, in texels.
    fn max_texture_dimension(&self) -> u32;

    /// Allocate a texture handle. `None` means the backend refused.
    fn create_handle(&self) -> Option<TextureHandle>;

    /// Upload one full mip level. Errors are observable only via
    /// [`query_error`](Self::query_error).
    fn upload_level(&self, handle: TextureHandle, level: u32, width: u32, height: u32, texels: &[u8]);

    /// Upload a sub-region of an existing mip level (replay's `update_mip`).
    #[allow(clippy::too_many_arguments)]
    fn upload_region(
        &self,
        handle: TextureHandle,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        texels: &[u8],
    );

    /// Return and clear the sticky error state.
    fn query_error(&self) -> Result<(), BackendError>;

    /// Emit one textured quad.
    fn draw_quad(&self, handle: TextureHandle, corners: QuadCorners);

    /// Release a handle. Each handle is released exactly once.
    fn delete_handle(&self, handle: TextureHandle);

    /// Frame boundary: submit/flush outstanding work. Stands in for the
    /// buffer swap of a windowed driver.
    fn finish_frame(&self);
}

/// Backend selection for [`create_backend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BackendKind {
    /// Prefer wgpu when available, fall back to dummy.
    #[default]
    Auto,
    /// Headless wgpu backend (real GPU memory).
    Wgpu,
    /// No-op backend for testing without a GPU.
    Dummy,
}

/// Select and create a backend.
///
/// `Auto` tries wgpu first (when compiled in) and falls back to the dummy
/// backend; explicitly requesting an unavailable backend is an error.
pub fn create_backend(kind: BackendKind) -> Result<Arc<dyn TextureBackend>, BackendError> {
    match kind {
        BackendKind::Auto => {
            #[cfg(feature = "wgpu-backend")]
            {
                match wgpu_backend::WgpuBackend::new() {
                    Ok(backend) => {
                        log::info!("using wgpu backend");
                        return Ok(Arc::new(backend));
                    }
                    Err(e) => {
                        log::warn!("failed to create wgpu backend: {e}");
                    }
                }
            }
            log::info!("using dummy backend");
            Ok(Arc::new(dummy::DummyBackend::new()))
        }
        BackendKind::Wgpu => {
            #[cfg(feature = "wgpu-backend")]
            {
                let backend = wgpu_backend::WgpuBackend::new()?;
                log::info!("using wgpu backend");
                Ok(Arc::new(backend))
            }
            #[cfg(not(feature = "wgpu-backend"))]
            {
                Err(BackendError(
                    "wgpu backend not compiled in (enable the `wgpu-backend` feature)".to_string(),
                ))
            }
        }
        BackendKind::Dummy => {
            log::info!("using dummy backend");
            Ok(Arc::new(dummy::DummyBackend::new()))
        }
    }
}
