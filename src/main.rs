use anyhow::{bail, Context, Result};
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cgm_kinematics::calibration::load_calibration;
use cgm_kinematics::config::Config;
use cgm_kinematics::joints::JointMapping;
use cgm_kinematics::marker::MarkerFrame;
use cgm_kinematics::pipeline::Pipeline;
use cgm_kinematics::processor::Processor;

const CONFIG_PATH: &str = "config.toml";

struct Args {
    trial: String,
    output: String,
    pipeline: Pipeline,
}

fn parse_args() -> Result<Args> {
    // Usage: cgm <trial.json> [output.json] [--lower-body | --upper-body]
    let mut positional = Vec::new();
    let mut pipeline = Pipeline::full();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--lower-body" => pipeline = Pipeline::lower_body(),
            "--upper-body" => pipeline = Pipeline::upper_body(),
            s if s.starts_with("--") => bail!("unknown option: {}", s),
            _ => positional.push(arg),
        }
    }
    let mut positional = positional.into_iter();
    let Some(trial) = positional.next() else {
        bail!("usage: cgm <trial.json> [output.json] [--lower-body | --upper-body]");
    };
    let output = positional.next().unwrap_or_else(|| "kinematics.json".to_string());
    Ok(Args { trial, output, pipeline })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("=== CGM kinematics {} ===", env!("CGM_BUILD_VERSION"));

    let args = parse_args()?;
    let config = Config::load_or_default(CONFIG_PATH)?;

    let measurements = load_calibration(&config.calibration.output_path)
        .with_context(|| "static calibration not found, run `calibrate` first")?;

    let content = fs::read_to_string(&args.trial)
        .with_context(|| format!("Failed to read trial {}", args.trial))?;
    let frames: Vec<MarkerFrame> = serde_json::from_str(&content)?;
    info!("{} frames from {}", frames.len(), args.trial);

    if let Some(first) = frames.first() {
        let unknown = first.unknown_labels();
        if !unknown.is_empty() {
            warn!("Ignoring unknown marker labels: {}", unknown.join(", "));
        }
    }

    let joints = JointMapping::default_for(&args.pipeline);
    let processor = Processor::new(args.pipeline, joints, measurements, config.processing.cores);
    let results = processor.process_trial(&frames)?;

    fs::write(&args.output, serde_json::to_string_pretty(&results)?)
        .with_context(|| format!("Failed to write {}", args.output))?;
    info!("{} frames, {} joints -> {}", results.len(), processor.joints().entries().len(), args.output);

    Ok(())
}
