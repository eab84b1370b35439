//! Replays a captured texture-call script against a backend.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use quad_thrasher::replay::{parse_script, Playback};
use quad_thrasher::{create_backend, BackendKind, RandomSource, TexelFiller};

/// Replay a captured texture-call script.
///
/// The script is the textual command stream written by the capture
/// interceptor: one `playback.*(...)` call per observed driver call, in
/// call order.
#[derive(Parser, Debug)]
#[command(name = "playback", version)]
struct Args {
    /// Path to the captured script.
    script: PathBuf,

    /// Graphics backend to use.
    #[arg(long, value_enum, default_value_t = BackendKind::Auto)]
    backend: BackendKind,

    /// Seed the random source (fill colors, quad placement) for a
    /// reproducible replay.
    #[arg(long)]
    seed: Option<u64>,

    /// Scratch buffer capacity in bytes for mip fills. Captured uploads
    /// larger than this are skipped with a warning.
    #[arg(long, value_name = "BYTES", default_value_t = 101_782_080)]
    scratch_bytes: usize,

    /// Allocate a new fill buffer per upload instead of the bounded
    /// scratch buffer.
    #[arg(long)]
    alloc_buffers: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let source = match std::fs::read_to_string(&args.script) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("failed to read {}: {err}", args.script.display());
            return ExitCode::FAILURE;
        }
    };
    let script = match parse_script(&source) {
        Ok(script) => script,
        Err(err) => {
            eprintln!("{}: {err}", args.script.display());
            return ExitCode::FAILURE;
        }
    };
    log::info!("parsed {} commands", script.len());

    let backend = match create_backend(args.backend) {
        Ok(backend) => backend,
        Err(err) => {
            eprintln!("failed to create backend: {err}");
            return ExitCode::FAILURE;
        }
    };

    let filler = if args.alloc_buffers {
        TexelFiller::per_call()
    } else {
        TexelFiller::scratch(args.scratch_bytes)
    };
    let rng = match args.seed {
        Some(seed) => RandomSource::from_seed(seed),
        None => RandomSource::new(),
    };

    let mut playback = Playback::new(backend, filler, rng);
    playback.run_script(&script);
    log::info!(
        "replay done: {} textures live, {} bytes resident",
        playback.live_textures(),
        playback.bytes_used()
    );

    ExitCode::SUCCESS
}
