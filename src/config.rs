use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::measurements::Measurements;
use crate::segments::FootPolicy;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessingConfig {
    /// ワーカースレッド数（1 = 逐次）
    #[serde(default = "default_cores")]
    pub cores: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalibrationConfig {
    /// 静的トライアルを平坦な足で撮ったか
    #[serde(default)]
    pub flat_foot: bool,
    /// 全体座標系（行が軸）
    #[serde(default = "Measurements::default_gcs")]
    pub gcs: [[f64; 3]; 3],
    /// 保存先パス
    #[serde(default = "default_calibration_output")]
    pub output_path: String,
}

fn default_cores() -> usize { 1 }
fn default_calibration_output() -> String { "calibration.json".to_string() }

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { cores: default_cores() }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            flat_foot: false,
            gcs: Measurements::default_gcs(),
            output_path: default_calibration_output(),
        }
    }
}

impl CalibrationConfig {
    /// 足部補正の方針
    pub fn foot_policy(&self, right_sole_delta: f64, left_sole_delta: f64) -> FootPolicy {
        FootPolicy::from_flag(self.flat_foot, right_sole_delta, left_sole_delta)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// ファイルが無ければ既定値。壊れたファイルはエラー
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }
}
