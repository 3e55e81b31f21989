//! The `drawkit probe` command: header-only inspection of one image.

use clap::Args;
use drawkit_core::pipeline::OrientationCorrector;
use drawkit_core::{BackgroundCompressor, Config, ImageSource, OrientationHint, ProbeResult, ScalePlan};
use serde::Serialize;
use std::path::PathBuf;

/// Arguments for the `probe` command.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Image file to inspect
    pub input: PathBuf,
}

#[derive(Debug, Serialize)]
struct ProbeReport {
    source: PathBuf,
    #[serde(flatten)]
    probe: ProbeResult,
    plan: ScalePlan,
    orientation: OrientationHint,
}

/// Execute the probe command. Prints JSON to stdout.
pub fn execute(args: ProbeArgs, config: &Config) -> anyhow::Result<()> {
    let report = probe(&args.input, config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn probe(path: &std::path::Path, config: &Config) -> anyhow::Result<ProbeReport> {
    let compressor = BackgroundCompressor::new(config);
    let source = ImageSource::file(path);
    let probe = compressor.decoder().probe(&source)?;
    let plan = compressor.planner().plan(probe)?;
    Ok(ProbeReport {
        source: path.to_path_buf(),
        probe,
        plan,
        orientation: OrientationCorrector::read_file(path),
    })
}
