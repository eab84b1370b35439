//! # quad-thrasher
//!
//! A texture-memory stress harness. It churns randomly sized, mip-mapped
//! RGBA8 textures (creating, uploading, drawing, and destroying them) while
//! keeping the aggregate resident byte count inside a randomly oscillating
//! budget. The point is to exercise a driver's texture-memory management
//! under realistic allocation/free patterns, not to render anything
//! meaningful.
//!
//! ## Overview
//!
//! - [`QuadThrasher`] - the budget-driven churn engine
//! - [`FakeTexture`] - one backend handle plus its full mip chain
//! - [`TexelFiller`] - fake pixel data, bounded-scratch or per-call
//! - [`TextureBackend`] - trait over the driver surface, with a dummy
//!   backend for tests and a headless wgpu backend (`wgpu-backend` feature)
//! - [`FrameDriver`] - churn/draw cadence without a window
//! - [`replay`] - parser and player for captured texture-call scripts
//!
//! ## Example
//!
//! ```
//! use quad_thrasher::{
//!     backend::dummy::DummyBackend, QuadThrasher, RandomSource, ThrashConfig,
//! };
//! use std::sync::Arc;
//!
//! let backend = Arc::new(DummyBackend::new());
//! let config = ThrashConfig::default();
//! let mut rng = RandomSource::from_seed(1);
//! let mut thrasher = QuadThrasher::new(backend, config.filler(), &config);
//!
//! thrasher.thrash(&mut rng);
//! assert!(thrasher.bytes_used() <= config.average_memory_usage_bytes + config.delta_bytes);
//! ```

pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod fill;
pub mod replay;
pub mod rng;
pub mod texture;
pub mod thrasher;

// Re-export main types for convenience
pub use backend::{create_backend, BackendKind, QuadCorners, TextureBackend, TextureHandle};
pub use config::ThrashConfig;
pub use driver::FrameDriver;
pub use error::{BackendError, CreateError, FillError, ReplayError};
pub use fill::{FillPolicy, TexelFiller};
pub use rng::RandomSource;
pub use texture::{mip_chain_len, FakeTexture, BYTES_PER_TEXEL};
pub use thrasher::{chain_upper_bound, QuadThrasher};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
