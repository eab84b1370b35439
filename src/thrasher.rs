//! The budget-driven churn engine.
//!
//! Each [`QuadThrasher::thrash`] round evicts a random half of the pool,
//! draws a fresh byte budget inside the configured oscillation band, and
//! refills the remaining headroom with newly sized textures. Creation
//! failures are logged and charged against the headroom at their estimated
//! footprint, which is what guarantees the fill loop terminates even when
//! the backend refuses every allocation.

use std::sync::Arc;

use crate::backend::TextureBackend;
use crate::config::ThrashConfig;
use crate::fill::TexelFiller;
use crate::rng::RandomSource;
use crate::texture::{FakeTexture, BYTES_PER_TEXEL};

/// Upper bound on the byte footprint of a full mip chain for a
/// `width`×`height` base level: `ceil(w * h * 4 * 4/3)`.
///
/// The halving series `1 + 1/4 + 1/16 + ...` sums below `4/3` of the level-0
/// size, so the bound always covers the exact chain sum. Its floor is 6
/// bytes (a 1×1 texture), which gives every fill-loop iteration a positive
/// minimum charge.
pub fn chain_upper_bound(width: usize, height: usize) -> usize {
    (width * height * BYTES_PER_TEXEL * 4 + 2) / 3
}

/// Owns the texture pool and churns it against an oscillating budget.
pub struct QuadThrasher {
    backend: Arc<dyn TextureBackend>,
    filler: TexelFiller,
    quads: Vec<FakeTexture>,
    average_memory_usage_bytes: usize,
    delta_bytes: usize,
    max_texture_dimension_texels: usize,
}

impl QuadThrasher {
    /// Create an engine with an empty pool.
    pub fn new(backend: Arc<dyn TextureBackend>, filler: TexelFiller, config: &ThrashConfig) -> Self {
        Self {
            backend,
            filler,
            quads: Vec::new(),
            average_memory_usage_bytes: config.average_memory_usage_bytes,
            delta_bytes: config.delta_bytes,
            max_texture_dimension_texels: config.max_texture_dimension_texels.max(1),
        }
    }

    /// One churn round: evict, re-account, draw a budget, fill the headroom.
    ///
    /// On return the pool's byte total never exceeds the budget drawn this
    /// round, and that budget never falls below what survived eviction.
    pub fn thrash(&mut self, rng: &mut RandomSource) {
        // Eviction: an independent coin flip per resource, deliberately
        // ignoring size and age. Dropping a texture releases its handle.
        self.quads.retain(|_| !rng.coin_flip());

        let bytes_used = self.bytes_used();

        let low = self
            .average_memory_usage_bytes
            .saturating_sub(self.delta_bytes);
        let high = self.average_memory_usage_bytes + self.delta_bytes;
        // Headroom is never negative: the budget is clamped up to whatever
        // is already resident.
        let target = rng.size_in(low, high).max(bytes_used);
        let mut headroom = target - bytes_used;

        log::debug!(
            "thrash: {} survivors, {bytes_used} bytes used, target {target}, headroom {headroom}",
            self.quads.len()
        );

        loop {
            let width = rng.size_in(1, self.max_texture_dimension_texels);
            let height = rng.size_in(1, self.max_texture_dimension_texels);
            let bound = chain_upper_bound(width, height);
            if bound > headroom {
                break;
            }

            match FakeTexture::create(
                self.backend.clone(),
                width as u32,
                height as u32,
                &mut self.filler,
                rng,
            ) {
                Ok(texture) => {
                    // The bound covers the exact chain sum, so this cannot
                    // underflow headroom.
                    debug_assert!(texture.size_bytes() <= bound);
                    headroom -= texture.size_bytes();
                    self.quads.push(texture);
                }
                Err(err) => {
                    // Charge the failed attempt at its estimated footprint;
                    // otherwise a persistently failing backend would spin
                    // here forever.
                    log::warn!("texture creation failed ({width}x{height}): {err}");
                    headroom -= bound;
                }
            }
        }
    }

    /// Draw every pooled texture once, in pool order.
    pub fn draw(&self, rng: &mut RandomSource) {
        for quad in &self.quads {
            quad.draw(rng);
        }
    }

    /// Total bytes resident across the pool.
    pub fn bytes_used(&self) -> usize {
        self.quads.iter().map(FakeTexture::size_bytes).sum()
    }

    /// Number of textures currently pooled.
    pub fn pool_len(&self) -> usize {
        self.quads.len()
    }
}

impl std::fmt::Debug for QuadThrasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadThrasher")
            .field("pool_len", &self.quads.len())
            .field("bytes_used", &self.bytes_used())
            .field("average", &self.average_memory_usage_bytes)
            .field("delta", &self.delta_bytes)
            .field("max_dimension", &self.max_texture_dimension_texels)
            .finish()
    }
}
