//! Pixel-data fabrication for texture uploads.
//!
//! A fill produces `size` bytes of fake RGBA8 texel data: four random bytes
//! are drawn once per call and repeated across the whole buffer, so every
//! fill is a flat random color. Only the byte count and the repeating
//! pattern matter; the color itself is arbitrary.
//!
//! The two allocation policies are observably identical in output and differ
//! only in where the bytes live: a bounded scratch buffer reused across
//! calls, or a fresh allocation per call.

use crate::error::FillError;
use crate::rng::RandomSource;

/// Allocation policy for fill buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPolicy {
    /// One fixed-capacity buffer, allocated up front and reused. Fills
    /// larger than the capacity fail with [`FillError::CapacityExceeded`].
    Scratch,
    /// A fresh, exactly-sized buffer per call. Fails only if the allocator
    /// refuses the request.
    PerCall,
}

/// Produces byte buffers of fake texel data.
pub struct TexelFiller {
    policy: FillPolicy,
    buffer: Vec<u8>,
}

impl TexelFiller {
    /// Create a filler with a bounded scratch buffer of `capacity` bytes.
    pub fn scratch(capacity: usize) -> Self {
        Self {
            policy: FillPolicy::Scratch,
            buffer: vec![0; capacity],
        }
    }

    /// Create a filler that allocates a fresh buffer on every call.
    pub fn per_call() -> Self {
        Self {
            policy: FillPolicy::PerCall,
            buffer: Vec::new(),
        }
    }

    /// The active allocation policy.
    pub fn policy(&self) -> FillPolicy {
        self.policy
    }

    /// Fill `size` bytes with a freshly drawn repeating RGBA pattern.
    ///
    /// The returned slice is valid until the next call. On failure no bytes
    /// are written: a scratch filler keeps its previous contents, and no
    /// random draws are consumed.
    pub fn fill(&mut self, size: usize, rng: &mut RandomSource) -> Result<&[u8], FillError> {
        match self.policy {
            FillPolicy::Scratch => {
                let capacity = self.buffer.len();
                if size > capacity {
                    return Err(FillError::CapacityExceeded {
                        requested: size,
                        capacity,
                    });
                }
            }
            FillPolicy::PerCall => {
                let mut fresh = Vec::new();
                fresh
                    .try_reserve_exact(size)
                    .map_err(|_| FillError::AllocationFailed { requested: size })?;
                fresh.resize(size, 0);
                self.buffer = fresh;
            }
        }

        let pattern = [rng.byte(), rng.byte(), rng.byte(), rng.byte()];
        for (slot, value) in self.buffer[..size].iter_mut().zip(pattern.iter().cycle()) {
            *slot = *value;
        }

        Ok(&self.buffer[..size])
    }
}

impl std::fmt::Debug for TexelFiller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TexelFiller")
            .field("policy", &self.policy)
            .field("buffer_len", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_repeats_four_byte_pattern() {
        let mut rng = RandomSource::from_seed(3);
        let mut filler = TexelFiller::scratch(4096);
        let buffer = filler.fill(1023, &mut rng).unwrap();
        assert_eq!(buffer.len(), 1023);
        for i in 0..buffer.len() {
            assert_eq!(buffer[i], buffer[i % 4]);
        }
    }

    #[test]
    fn test_per_call_fill_matches_scratch_output_shape() {
        let mut rng = RandomSource::from_seed(4);
        let mut filler = TexelFiller::per_call();
        let buffer = filler.fill(64, &mut rng).unwrap();
        assert_eq!(buffer.len(), 64);
        for i in 0..buffer.len() {
            assert_eq!(buffer[i], buffer[i % 4]);
        }
    }

    #[test]
    fn test_oversized_scratch_fill_fails_without_partial_write() {
        let mut rng = RandomSource::from_seed(5);
        let mut filler = TexelFiller::scratch(16);
        filler.fill(16, &mut rng).unwrap();
        let before = filler.buffer.clone();

        let err = filler.fill(17, &mut rng).unwrap_err();
        assert_eq!(
            err,
            FillError::CapacityExceeded {
                requested: 17,
                capacity: 16,
            }
        );
        assert_eq!(filler.buffer, before, "failed fill touched the buffer");
    }

    #[test]
    fn test_zero_sized_fill_is_empty() {
        let mut rng = RandomSource::from_seed(6);
        let mut filler = TexelFiller::scratch(8);
        assert!(filler.fill(0, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_each_fill_draws_a_fresh_color() {
        let mut rng = RandomSource::from_seed(7);
        let mut filler = TexelFiller::scratch(16);
        let first: Vec<u8> = filler.fill(4, &mut rng).unwrap().to_vec();
        let mut differed = false;
        for _ in 0..32 {
            if filler.fill(4, &mut rng).unwrap() != first.as_slice() {
                differed = true;
                break;
            }
        }
        assert!(differed, "32 consecutive fills drew the same color");
    }
}
