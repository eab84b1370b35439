//! Texture memory thrasher CLI.

use std::process::ExitCode;

use clap::Parser;

use quad_thrasher::{create_backend, BackendKind, FrameDriver, RandomSource, ThrashConfig};

/// A texture memory thrasher.
///
/// Continuously creates and destroys randomly sized mip-mapped textures
/// while keeping aggregate texture memory inside an oscillating budget.
#[derive(Parser, Debug)]
#[command(name = "thrash", version)]
struct Args {
    /// Maximum texture dimension in texels (largest texture is
    /// TEXELSxTEXELS). If this exceeds what the driver supports, the
    /// driver's maximum is used.
    #[arg(short = 't', long = "texture-size", value_name = "TEXELS", default_value_t = 100)]
    texture_size: usize,

    /// Base texture memory usage cap in bytes. The actual per-round cap
    /// oscillates around this value by --delta.
    #[arg(short = 'm', long = "memory-cap", value_name = "BYTES", default_value_t = 200_000)]
    memory_cap: usize,

    /// Oscillate memory usage randomly within the band
    /// [memory-cap - delta * memory-cap, memory-cap + delta * memory-cap].
    #[arg(short = 'd', long, value_name = "PERCENT", default_value_t = 0.25)]
    delta: f64,

    /// Number of frames between texture memory thrashes.
    #[arg(short = 'i', long, value_name = "INTERVAL", default_value_t = 30)]
    interval: u64,

    /// Allocate a new source buffer for each mip upload.
    #[arg(long)]
    alloc_buffers: bool,

    /// Do not draw any quads. (Textures are still created/deleted.)
    #[arg(long)]
    no_draw: bool,

    /// Graphics backend to use.
    #[arg(long, value_enum, default_value_t = BackendKind::Auto)]
    backend: BackendKind,

    /// Seed the random source for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Exit after N frames (useful for testing). Runs forever when omitted.
    #[arg(long)]
    max_frames: Option<u64>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if !(0.0..=1.0).contains(&args.delta) {
        eprintln!("delta percentage must be between 0 and 1");
        return ExitCode::FAILURE;
    }

    let backend = match create_backend(args.backend) {
        Ok(backend) => backend,
        Err(err) => {
            eprintln!("failed to create backend: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut config = ThrashConfig {
        average_memory_usage_bytes: args.memory_cap,
        delta_bytes: ThrashConfig::delta_bytes_from_fraction(args.memory_cap, args.delta),
        max_texture_dimension_texels: args.texture_size,
        thrash_interval: args.interval,
        draw: !args.no_draw,
        per_call_buffers: args.alloc_buffers,
    };
    config.clamp_to_backend(backend.as_ref());

    println!("backend: {}", backend.name());
    println!(
        "max texture size: {0}x{0}",
        config.max_texture_dimension_texels
    );
    println!("memory cap: {} bytes", config.average_memory_usage_bytes);
    println!("delta: {} bytes", config.delta_bytes);
    println!("interval: {} frames", config.thrash_interval);
    println!("alloc buffers: {}", config.per_call_buffers);
    println!("draw: {}", config.draw);

    let rng = match args.seed {
        Some(seed) => RandomSource::from_seed(seed),
        None => RandomSource::new(),
    };

    let mut driver = FrameDriver::new(backend, &config, rng);
    driver.run(args.max_frames);

    ExitCode::SUCCESS
}
