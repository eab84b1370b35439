//! Headless frame loop.
//!
//! Stands where a windowed driver's render loop would: churn every
//! `thrash_interval` frames, draw every frame when enabled, and mark the
//! frame boundary on the backend in place of a buffer swap. Window and
//! context management stay outside this crate.

use std::sync::Arc;

use crate::backend::TextureBackend;
use crate::config::ThrashConfig;
use crate::rng::RandomSource;
use crate::thrasher::QuadThrasher;

/// Drives the churn engine at a fixed frame cadence.
pub struct FrameDriver {
    backend: Arc<dyn TextureBackend>,
    thrasher: QuadThrasher,
    rng: RandomSource,
    thrash_interval: u64,
    draw_enabled: bool,
    frame_count: u64,
}

impl FrameDriver {
    /// Build the driver, its engine, and the configured fill service.
    pub fn new(backend: Arc<dyn TextureBackend>, config: &ThrashConfig, rng: RandomSource) -> Self {
        let thrasher = QuadThrasher::new(backend.clone(), config.filler(), config);
        Self {
            backend,
            thrasher,
            rng,
            thrash_interval: config.thrash_interval.max(1),
            draw_enabled: config.draw,
            frame_count: 0,
        }
    }

    /// Run one frame: churn on cadence, optionally draw, finish the frame.
    pub fn step(&mut self) {
        if self.frame_count % self.thrash_interval == 0 {
            self.thrasher.thrash(&mut self.rng);
            self.frame_count = 0;
            log::debug!(
                "churned: {} textures, {} bytes resident",
                self.thrasher.pool_len(),
                self.thrasher.bytes_used()
            );
        }
        if self.draw_enabled {
            self.thrasher.draw(&mut self.rng);
        }
        self.backend.finish_frame();
        self.frame_count += 1;
    }

    /// Run `max_frames` frames, or forever when `None`.
    pub fn run(&mut self, max_frames: Option<u64>) {
        match max_frames {
            Some(frames) => {
                for _ in 0..frames {
                    self.step();
                }
            }
            None => loop {
                self.step();
            },
        }
    }

    /// The engine, for inspection after a bounded run.
    pub fn thrasher(&self) -> &QuadThrasher {
        &self.thrasher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;

    #[test]
    fn test_bounded_run_terminates_and_churns() {
        let backend = Arc::new(DummyBackend::new());
        let config = ThrashConfig {
            average_memory_usage_bytes: 50_000,
            delta_bytes: 0,
            thrash_interval: 3,
            ..ThrashConfig::default()
        };
        let mut driver = FrameDriver::new(backend.clone(), &config, RandomSource::from_seed(41));
        driver.run(Some(10));
        assert!(driver.thrasher().bytes_used() <= 50_000);
        assert_eq!(backend.live_handles(), driver.thrasher().pool_len());
    }

    #[test]
    fn test_zero_interval_is_treated_as_every_frame() {
        let backend = Arc::new(DummyBackend::new());
        let config = ThrashConfig {
            thrash_interval: 0,
            draw: false,
            ..ThrashConfig::default()
        };
        let mut driver = FrameDriver::new(backend, &config, RandomSource::from_seed(42));
        driver.run(Some(2));
    }
}
