//! Run a pipeline on a synthetic frame.

use crate::RenderArgs;
use crate::pattern;
use anyhow::{Context, Result, bail};
use sky_core::{ChannelOrder, PixelBuffer};
use sky_pipeline::Pipeline;
use std::path::Path;
use tracing::info;

/// Renders a synthetic frame through the pipeline and prints per-stage
/// timings and output statistics.
pub fn run(args: RenderArgs, verbose: bool) -> Result<()> {
    let doc = super::load_doc(&args.pipeline)?;
    let mut pipe = Pipeline::from_doc(doc);

    for spec in &args.icc {
        let (name, path) = spec
            .split_once('=')
            .with_context(|| format!("--icc expects NAME=PATH, got '{spec}'"))?;
        pipe.profiles_mut()
            .register_file(name, Path::new(path))
            .with_context(|| format!("Failed to load ICC profile: {path}"))?;
    }
    pipe.blackboard_mut().order = ChannelOrder::new(&args.order)?;

    let input = pattern::generate(args.pattern, args.width, args.height, args.seed)?;
    info!(
        pattern = ?args.pattern,
        width = args.width,
        height = args.height,
        seed = args.seed,
        "synthetic input"
    );
    pipe.set_input(input);

    let report = pipe.run_all()?;
    print_stages(&pipe);

    if let Some(failed) = &report.failed {
        bail!("stage {} ({}) failed: {}", failed.index, failed.kind, failed.error);
    }
    let frame = pipe.output().context("pipeline produced no output")?;

    println!();
    print_frame(frame, verbose);
    let bb = pipe.blackboard();
    if let Some((lo, hi)) = bb.cut_levels {
        println!("  Cut levels: {lo:.3} .. {hi:.3}");
    }
    if let Some(profile) = &bb.icc_profile_used {
        match &bb.proof_profile_used {
            Some(proof) => println!("  ICC:        {profile} (proofing {proof})"),
            None => println!("  ICC:        {profile}"),
        }
    }
    println!("  Total:      {:.2} ms", bb.last_run_ms);

    if let Some(path) = &args.save_after {
        pipe.save_file(path)
            .with_context(|| format!("Failed to save: {}", path.display()))?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn print_stages(pipe: &Pipeline) {
    println!("{:>3}  {:<13} {:<9} {:>9}  result", "#", "stage", "status", "ms");
    for (i, stage) in pipe.stages().iter().enumerate() {
        let ms = stage
            .elapsed()
            .map(|d| format!("{:.2}", d.as_secs_f64() * 1000.0))
            .unwrap_or_default();
        let result = stage
            .result()
            .map(|r| format!("{}x{} {}", r.width, r.height, r.order))
            .unwrap_or_else(|| "-".into());
        let kind = if stage.bypass() { format!("{} (off)", stage.kind()) } else { stage.kind().into() };
        println!("{:>3}  {:<13} {:<9} {:>9}  {}", i, kind, format!("{:?}", stage.status()), ms, result);
    }
}

fn print_frame(frame: &PixelBuffer, verbose: bool) {
    println!("Output");
    println!("  Size:       {}x{}", frame.width, frame.height);
    println!("  Order:      {} ({:?})", frame.order, frame.depth);
    let nc = frame.channels;
    for (c, name) in frame.order.as_str().chars().enumerate() {
        let (mut lo, mut hi, mut sum) = (f32::MAX, f32::MIN, 0.0f64);
        for px in frame.data.chunks_exact(nc) {
            lo = lo.min(px[c]);
            hi = hi.max(px[c]);
            sum += px[c] as f64;
        }
        let mean = sum / frame.pixel_count() as f64;
        if verbose || name != 'A' {
            println!("  {name}:          min {lo:.1}  max {hi:.1}  mean {mean:.2}");
        }
    }
}
