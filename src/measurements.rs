use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::error::{CgmError, Result};

/// 被験者の計測値（被験者ファイルから読み込む生データ, mm / 度）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SubjectMeasurements {
    pub left_leg_length: f64,
    pub right_leg_length: f64,
    /// 0 の場合は脚長から推定
    pub left_asis_trocanter_distance: f64,
    pub right_asis_trocanter_distance: f64,
    /// 0 の場合は静的トライアルの RASI-LASI 距離平均
    pub inter_asis_distance: f64,
    pub left_knee_width: f64,
    pub right_knee_width: f64,
    pub left_ankle_width: f64,
    pub right_ankle_width: f64,
    /// 脛骨捻転（度）
    pub left_tibial_torsion: f64,
    pub right_tibial_torsion: f64,
    /// 踵とつま先の高さの差（フラットフット補正用）
    pub left_sole_delta: f64,
    pub right_sole_delta: f64,
    pub left_shoulder_offset: f64,
    pub right_shoulder_offset: f64,
    pub left_elbow_width: f64,
    pub right_elbow_width: f64,
    pub left_hand_thickness: f64,
    pub right_hand_thickness: f64,
}

impl SubjectMeasurements {
    /// TOML ファイルから読み込み
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read subject file {}", path.display()))?;
        let subject: SubjectMeasurements = toml::from_str(&content)?;
        Ok(subject)
    }
}

/// 静的キャリブレーションで求めるオフセット角（ラジアン）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StaticOffsets {
    pub right_static_rot_off: f64,
    pub right_static_plant_flex: f64,
    pub left_static_rot_off: f64,
    pub left_static_plant_flex: f64,
    pub head_offset: f64,
}

/// キャリブレーション済み計測値
///
/// 静的キャリブレーションで一度だけ作られ、以降は共有参照でのみ使う。
/// 全フレーム・全ワーカーが同じ値を読む。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    #[serde(rename = "MeanLegLength")]
    pub mean_leg_length: f64,
    #[serde(rename = "R_AsisToTrocanterMeasure")]
    pub right_asis_trocanter: f64,
    #[serde(rename = "L_AsisToTrocanterMeasure")]
    pub left_asis_trocanter: f64,
    #[serde(rename = "InterAsisDistance")]
    pub inter_asis_distance: f64,
    #[serde(rename = "RightKneeWidth")]
    pub right_knee_width: f64,
    #[serde(rename = "LeftKneeWidth")]
    pub left_knee_width: f64,
    #[serde(rename = "RightAnkleWidth")]
    pub right_ankle_width: f64,
    #[serde(rename = "LeftAnkleWidth")]
    pub left_ankle_width: f64,
    #[serde(rename = "RightTibialTorsion", default)]
    pub right_tibial_torsion: f64,
    #[serde(rename = "LeftTibialTorsion", default)]
    pub left_tibial_torsion: f64,
    #[serde(rename = "RightSoleDelta", default)]
    pub right_sole_delta: f64,
    #[serde(rename = "LeftSoleDelta", default)]
    pub left_sole_delta: f64,
    #[serde(rename = "RightShoulderOffset", default)]
    pub right_shoulder_offset: f64,
    #[serde(rename = "LeftShoulderOffset", default)]
    pub left_shoulder_offset: f64,
    #[serde(rename = "RightElbowWidth", default)]
    pub right_elbow_width: f64,
    #[serde(rename = "LeftElbowWidth", default)]
    pub left_elbow_width: f64,
    #[serde(rename = "RightHandThickness", default)]
    pub right_hand_thickness: f64,
    #[serde(rename = "LeftHandThickness", default)]
    pub left_hand_thickness: f64,
    /// 全体座標系（行が軸）
    #[serde(rename = "GCS", default = "Measurements::default_gcs")]
    pub gcs: [[f64; 3]; 3],
    #[serde(flatten)]
    pub offsets: StaticOffsets,
}

impl Measurements {
    /// 名前 → 値の平坦なマップから構築
    ///
    /// GCS は単位行列、未指定のオフセット・上肢計測値は 0 になる。
    pub fn from_map(values: &HashMap<String, f64>) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> = values
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(*v)))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| CgmError::Measurement(e.to_string()))
    }

    /// 既定の全体座標系（単位行列）
    pub fn default_gcs() -> [[f64; 3]; 3] {
        [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
    }

    /// 全体座標系の行列
    pub fn gcs_matrix(&self) -> Matrix3<f64> {
        let g = &self.gcs;
        Matrix3::new(
            g[0][0], g[0][1], g[0][2],
            g[1][0], g[1][1], g[1][2],
            g[2][0], g[2][1], g[2][2],
        )
    }
}
