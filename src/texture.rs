//! Mip-mapped fake texture resources.
//!
//! A [`FakeTexture`] owns one backend handle plus the full mip chain
//! uploaded through it. Its byte footprint is fixed at creation and is the
//! authoritative accounting unit for the churn engine: the budget math never
//! re-measures a texture, it trusts `size_bytes`.

use std::sync::Arc;

use crate::backend::{QuadCorners, TextureBackend, TextureHandle};
use crate::error::CreateError;
use crate::fill::TexelFiller;
use crate::rng::RandomSource;

/// RGBA8: four bytes per texel at every mip level.
pub const BYTES_PER_TEXEL: usize = 4;

/// Number of levels in the mip chain for a `width`×`height` base image:
/// `floor(log2(min(width, height))) + 1`. Both dimensions must be nonzero.
pub fn mip_chain_len(width: u32, height: u32) -> u32 {
    let min = width.min(height);
    debug_assert!(min > 0);
    32 - min.leading_zeros()
}

/// A texture-like resource: one backend handle, a full mip chain, and the
/// exact byte count that was uploaded.
pub struct FakeTexture {
    backend: Arc<dyn TextureBackend>,
    handle: Option<TextureHandle>,
    width: u32,
    height: u32,
    size_bytes: usize,
}

impl FakeTexture {
    /// Create a texture and upload its complete mip chain.
    ///
    /// Atomic from the caller's perspective: on any failure the handle has
    /// already been released and no resource exists. Level dimensions start
    /// at `(width, height)` and halve (integer division) per level down to
    /// the last level where `min(width, height)` reaches 1.
    pub fn create(
        backend: Arc<dyn TextureBackend>,
        width: u32,
        height: u32,
        filler: &mut TexelFiller,
        rng: &mut RandomSource,
    ) -> Result<Self, CreateError> {
        let mut texture = Self::acquire(backend)?;
        texture.width = width;
        texture.height = height;

        let levels = mip_chain_len(width, height);
        let (mut level_width, mut level_height) = (width, height);
        for level in 0..levels {
            // Failure drops `texture`, releasing the handle.
            texture.upload_mip(level, level_width, level_height, filler, rng)?;
            level_width /= 2;
            level_height /= 2;
        }

        texture.backend.query_error()?;
        log::trace!(
            "created {width}x{height} texture, {levels} levels, {} bytes",
            texture.size_bytes
        );
        Ok(texture)
    }

    /// Allocate a handle without uploading anything.
    ///
    /// Used by the replay player, which learns dimensions and levels from
    /// the captured command stream instead of computing them.
    pub fn acquire(backend: Arc<dyn TextureBackend>) -> Result<Self, CreateError> {
        let handle = backend
            .create_handle()
            .ok_or(CreateError::HandleAllocationFailed)?;
        Ok(Self {
            backend,
            handle: Some(handle),
            width: 0,
            height: 0,
            size_bytes: 0,
        })
    }

    /// Fill and upload one mip level, accumulating its byte size.
    ///
    /// A level-0 upload records the base dimensions.
    pub fn upload_mip(
        &mut self,
        level: u32,
        width: u32,
        height: u32,
        filler: &mut TexelFiller,
        rng: &mut RandomSource,
    ) -> Result<(), CreateError> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        let size = width as usize * height as usize * BYTES_PER_TEXEL;
        let texels = filler.fill(size, rng)?;
        self.backend.upload_level(handle, level, width, height, texels);
        if level == 0 {
            self.width = width;
            self.height = height;
        }
        self.size_bytes += size;
        Ok(())
    }

    /// Fill and upload a sub-region of an existing mip level.
    ///
    /// Region updates rewrite resident texels, so the byte footprint does
    /// not change.
    #[allow(clippy::too_many_arguments)]
    pub fn update_region(
        &mut self,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        filler: &mut TexelFiller,
        rng: &mut RandomSource,
    ) -> Result<(), CreateError> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        let size = width as usize * height as usize * BYTES_PER_TEXEL;
        let texels = filler.fill(size, rng)?;
        self.backend
            .upload_region(handle, level, x, y, width, height, texels);
        Ok(())
    }

    /// Draw one quad at freshly randomized screen-space corners.
    ///
    /// No-op when the texture holds no valid handle. Placement draws do not
    /// affect memory accounting.
    pub fn draw(&self, rng: &mut RandomSource) {
        let Some(handle) = self.handle else {
            return;
        };
        self.backend.draw_quad(handle, QuadCorners::random(rng));
    }

    /// Level-0 width in texels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Level-0 height in texels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total bytes uploaded across all mip levels. Fixed at creation.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

impl Drop for FakeTexture {
    fn drop(&mut self) {
        // Taking the handle out guarantees release-exactly-once.
        if let Some(handle) = self.handle.take() {
            self.backend.delete_handle(handle);
        }
    }
}

impl std::fmt::Debug for FakeTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeTexture")
            .field("handle", &self.handle)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}
