use anyhow::{bail, Context, Result};
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cgm_kinematics::calibration::{calibrate, save_calibration};
use cgm_kinematics::config::Config;
use cgm_kinematics::marker::MarkerFrame;
use cgm_kinematics::measurements::SubjectMeasurements;

const CONFIG_PATH: &str = "config.toml";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Usage: calibrate <static.json> <subject.toml>
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("usage: calibrate <static.json> <subject.toml>");
    }

    let config = Config::load_or_default(CONFIG_PATH)?;
    let cal_config = &config.calibration;

    info!("=== CGM static calibration {} ===", env!("CGM_BUILD_VERSION"));
    info!("  flat foot: {}", cal_config.flat_foot);
    info!("  output: {}", cal_config.output_path);

    let content = fs::read_to_string(&args[1])
        .with_context(|| format!("Failed to read static trial {}", args[1]))?;
    let frames: Vec<MarkerFrame> = serde_json::from_str(&content)?;

    if let Some(first) = frames.first() {
        let unknown = first.unknown_labels();
        if !unknown.is_empty() {
            warn!("Ignoring unknown marker labels: {}", unknown.join(", "));
        }
    }
    let subject = SubjectMeasurements::load(&args[2])?;

    let policy = cal_config.foot_policy(subject.right_sole_delta, subject.left_sole_delta);
    let measurements = calibrate(&frames, &subject, policy, cal_config.gcs)?;

    save_calibration(&cal_config.output_path, &measurements)?;
    info!("saved {}", cal_config.output_path);

    Ok(())
}
