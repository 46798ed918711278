//! sky - inspect, validate and exercise rendering pipelines
//!
//! Works on pipeline documents (YAML). Rendering uses synthetic input
//! frames; there is no image file I/O.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod pattern;

#[derive(Parser)]
#[command(name = "sky")]
#[command(author, version, about = "Astronomical image rendering pipeline tool")]
#[command(long_about = "
Inspect, validate and run rendering pipelines for astronomical images.

Examples:
  sky stages                              # List stage types
  sky params zscale                       # Tunables of one auto-cuts algorithm
  sky default-pipeline -o viewer.yaml     # Write the standard viewer chain
  sky check viewer.yaml                   # Validate a pipeline document
  sky render viewer.yaml -W 1024 -H 1024 --pattern stars
  sky -v render viewer.yaml --order BGRA --save-after tuned.yaml
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// List stage types
    Stages,

    /// Show auto-cuts algorithm parameters
    #[command(visible_alias = "p")]
    Params(ParamsArgs),

    /// Validate a pipeline document
    #[command(visible_alias = "c")]
    Check(CheckArgs),

    /// Run a pipeline on a synthetic frame
    #[command(visible_alias = "r")]
    Render(RenderArgs),

    /// Print or write the default viewer pipeline
    #[command(name = "default-pipeline", visible_alias = "dp")]
    DefaultPipeline(DefaultPipelineArgs),
}

#[derive(Args)]
struct ParamsArgs {
    /// Algorithm name (all algorithms if omitted)
    algorithm: Option<String>,
}

#[derive(Args)]
struct CheckArgs {
    /// Pipeline document
    pipeline: PathBuf,
}

/// Synthetic input frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Pattern {
    /// Diagonal ramp
    Gradient,
    /// Flat sky background with noise
    Noise,
    /// Noisy background with Gaussian stars
    Stars,
}

#[derive(Args)]
struct RenderArgs {
    /// Pipeline document
    pipeline: PathBuf,

    /// Frame width
    #[arg(short = 'W', long, default_value = "512")]
    width: usize,

    /// Frame height
    #[arg(short = 'H', long, default_value = "512")]
    height: usize,

    /// Input pattern
    #[arg(short, long, value_enum, default_value = "stars")]
    pattern: Pattern,

    /// Pattern seed
    #[arg(long, default_value = "1")]
    seed: u32,

    /// Output channel order requested from color-mapping stages
    #[arg(long, default_value = "RGB")]
    order: String,

    /// Register an ICC profile: NAME=PATH (repeatable)
    #[arg(long = "icc", value_name = "NAME=PATH")]
    icc: Vec<String>,

    /// Save the pipeline after the run (auto cut levels filled in)
    #[arg(long)]
    save_after: Option<PathBuf>,
}

#[derive(Args)]
struct DefaultPipelineArgs {
    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Stages => commands::stages::run(cli.verbose),
        Commands::Params(args) => commands::params::run(args, cli.verbose),
        Commands::Check(args) => commands::check::run(args, cli.verbose),
        Commands::Render(args) => commands::render::run(args, cli.verbose),
        Commands::DefaultPipeline(args) => commands::default_pipeline::run(args),
    }
}
