//! Runtime configuration for the thrasher.

use crate::backend::TextureBackend;
use crate::fill::TexelFiller;
use crate::texture::BYTES_PER_TEXEL;

/// Knobs for the churn engine and frame driver.
///
/// CLI parsing lives in the binaries; the library takes a plain struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrashConfig {
    /// Center of the oscillating memory budget, in bytes.
    pub average_memory_usage_bytes: usize,
    /// Half-width of the oscillation band, in bytes. The per-round budget
    /// is drawn uniformly from `[average - delta, average + delta]`.
    pub delta_bytes: usize,
    /// Largest texture dimension to request, in texels.
    pub max_texture_dimension_texels: usize,
    /// Frames between churn rounds.
    pub thrash_interval: u64,
    /// Whether quads are drawn each frame. Texture lifecycle churn happens
    /// either way.
    pub draw: bool,
    /// Allocate a fresh fill buffer per mip upload instead of reusing one
    /// bounded scratch buffer.
    pub per_call_buffers: bool,
}

impl Default for ThrashConfig {
    fn default() -> Self {
        let average = 200_000;
        Self {
            average_memory_usage_bytes: average,
            delta_bytes: Self::delta_bytes_from_fraction(average, 0.25),
            max_texture_dimension_texels: 100,
            thrash_interval: 30,
            draw: true,
            per_call_buffers: false,
        }
    }
}

impl ThrashConfig {
    /// Convert a `0..=1` band fraction into bytes around `average`.
    pub fn delta_bytes_from_fraction(average: usize, fraction: f64) -> usize {
        (average as f64 * fraction) as usize
    }

    /// Clamp the requested texture dimension to what the backend reports.
    pub fn clamp_to_backend(&mut self, backend: &dyn TextureBackend) {
        let supported = backend.max_texture_dimension() as usize;
        if self.max_texture_dimension_texels > supported {
            log::warn!(
                "requested texture dimension {} exceeds the driver maximum {supported}, clamping",
                self.max_texture_dimension_texels
            );
            self.max_texture_dimension_texels = supported;
        }
    }

    /// Scratch capacity that fits the largest possible level-0 fill.
    pub fn scratch_capacity(&self) -> usize {
        self.max_texture_dimension_texels * self.max_texture_dimension_texels * BYTES_PER_TEXEL
    }

    /// Build the fill service this configuration asks for.
    pub fn filler(&self) -> TexelFiller {
        if self.per_call_buffers {
            TexelFiller::per_call()
        } else {
            TexelFiller::scratch(self.scratch_capacity())
        }
    }
}
