use std::fs;

use anyhow::{Context, Result};
use nalgebra::{Matrix3, Point3};
use tracing::{debug, info, warn};

use crate::angles::{head_offset_angle, static_offset_angles, HEAD_REFERENCE};
use crate::axis::{AxisFrame, SidePair};
use crate::error::CgmError;
use crate::marker::{Marker, MarkerFrame};
use crate::measurements::{Measurements, StaticOffsets, SubjectMeasurements};
use crate::segments::{
    ankle_axis, corrected_foot_axis, head_axis_uncorrected, hip_axis, knee_axis, pelvis_axis,
    uncorrected_foot_axis, FootPolicy, HEAD_MARKERS,
};

// --- Save / Load ---

pub fn save_calibration(path: &str, measurements: &Measurements) -> Result<()> {
    let json = serde_json::to_string_pretty(measurements)?;
    fs::write(path, json).context("Failed to write calibration file")?;
    Ok(())
}

pub fn load_calibration(path: &str) -> Result<Measurements> {
    let content = fs::read_to_string(path).context("Failed to read calibration file")?;
    let measurements: Measurements = serde_json::from_str(&content)?;
    Ok(measurements)
}

// --- 足部オフセット ---

/// 補正前と補正後の足部座標系の間のオフセット角（ラジアン）
///
/// 戻り値は左右それぞれ [alpha(回旋), beta(底屈), gamma]。
pub fn static_foot_angles(
    toes: &SidePair<Point3<f64>>,
    heels: &SidePair<Point3<f64>>,
    ankle: &SidePair<AxisFrame>,
    policy: FootPolicy,
) -> crate::error::Result<SidePair<[f64; 3]>> {
    let uncorrected = uncorrected_foot_axis(toes, ankle)?;
    let corrected = corrected_foot_axis(toes, heels, ankle, policy)?;

    Ok(SidePair::new(
        static_offset_angles(&uncorrected.right.directions(), &corrected.right.directions())?,
        static_offset_angles(&uncorrected.left.directions(), &corrected.left.directions())?,
    ))
}

// --- 静的キャリブレーション ---

/// ASIS-大転子距離の回帰推定
fn estimate_asis_trocanter(leg_length: f64) -> f64 {
    0.1288 * leg_length - 48.56
}

/// 静的トライアルの RASI-LASI 距離の平均
fn mean_inter_asis_distance(frames: &[MarkerFrame]) -> crate::error::Result<f64> {
    let mut sum = 0.0;
    for (i, frame) in frames.iter().enumerate() {
        let rasi = frame.get(Marker::Rasi).map_err(|e| e.at_frame(i))?;
        let lasi = frame.get(Marker::Lasi).map_err(|e| e.at_frame(i))?;
        sum += (rasi - lasi).norm();
    }
    Ok(sum / frames.len() as f64)
}

/// 被験者計測値から、オフセット以外のキャリブレーション値を導出
fn anthropometrics(
    frames: &[MarkerFrame],
    subject: &SubjectMeasurements,
    gcs: [[f64; 3]; 3],
) -> crate::error::Result<Measurements> {
    if subject.left_leg_length <= 0.0 || subject.right_leg_length <= 0.0 {
        return Err(CgmError::Measurement("leg lengths must be positive".to_string()));
    }

    let mean_leg_length = (subject.left_leg_length + subject.right_leg_length) / 2.0;

    let (right_asis_trocanter, left_asis_trocanter) =
        if subject.left_asis_trocanter_distance == 0.0 || subject.right_asis_trocanter_distance == 0.0 {
            (
                estimate_asis_trocanter(subject.right_leg_length),
                estimate_asis_trocanter(subject.left_leg_length),
            )
        } else {
            (subject.right_asis_trocanter_distance, subject.left_asis_trocanter_distance)
        };

    let inter_asis_distance = if subject.inter_asis_distance == 0.0 {
        let iad = mean_inter_asis_distance(frames)?;
        debug!("InterAsisDistance estimated from static trial: {:.3}", iad);
        iad
    } else {
        subject.inter_asis_distance
    };

    Ok(Measurements {
        mean_leg_length,
        right_asis_trocanter,
        left_asis_trocanter,
        inter_asis_distance,
        right_knee_width: subject.right_knee_width,
        left_knee_width: subject.left_knee_width,
        right_ankle_width: subject.right_ankle_width,
        left_ankle_width: subject.left_ankle_width,
        right_tibial_torsion: subject.right_tibial_torsion,
        left_tibial_torsion: subject.left_tibial_torsion,
        right_sole_delta: subject.right_sole_delta,
        left_sole_delta: subject.left_sole_delta,
        right_shoulder_offset: subject.right_shoulder_offset,
        left_shoulder_offset: subject.left_shoulder_offset,
        right_elbow_width: subject.right_elbow_width,
        left_elbow_width: subject.left_elbow_width,
        right_hand_thickness: subject.right_hand_thickness,
        left_hand_thickness: subject.left_hand_thickness,
        gcs,
        offsets: StaticOffsets::default(),
    })
}

/// 1フレーム分の足部オフセットと頭部オフセット
fn static_frame(
    frame: &MarkerFrame,
    base: &Measurements,
    policy: FootPolicy,
    with_head: bool,
) -> crate::error::Result<(SidePair<[f64; 3]>, Option<f64>)> {
    let pelvis = pelvis_axis(frame)?;
    let hip = hip_axis(&pelvis, base);
    let knee = knee_axis(frame, &hip.centers(), base)?;
    let ankle = ankle_axis(frame, &knee.map(|f| f.origin), base)?;

    let toes = SidePair::new(frame.get(Marker::Rtoe)?, frame.get(Marker::Ltoe)?);
    let heels = SidePair::new(frame.get(Marker::Rhee)?, frame.get(Marker::Lhee)?);
    let foot = static_foot_angles(&toes, &heels, &ankle, policy)?;

    let head = if with_head {
        let reference = Matrix3::from_row_slice(&HEAD_REFERENCE.concat());
        let head = head_axis_uncorrected(frame)?;
        Some(head_offset_angle(&reference, &head.directions())?)
    } else {
        None
    };

    Ok((foot, head))
}

/// 静的トライアルからキャリブレーション済み計測値を求める
///
/// 全フレームで下肢の座標系を構築し、足部オフセット角を平均する。
/// 最初のフレームに頭部マーカーが揃っていれば頭部オフセットも求める。
/// どのフレームで失敗してもデフォルト値には戻さずエラーを返す。
pub fn calibrate(
    frames: &[MarkerFrame],
    subject: &SubjectMeasurements,
    policy: FootPolicy,
    gcs: [[f64; 3]; 3],
) -> crate::error::Result<Measurements> {
    if frames.is_empty() {
        return Err(CgmError::Calibration("static trial has no frames".to_string()));
    }

    let base = anthropometrics(frames, subject, gcs)?;

    let with_head = HEAD_MARKERS.iter().all(|m| frames[0].contains(*m));
    if !with_head {
        warn!("Head markers missing from static trial, HeadOffset set to 0");
    }

    let mut right = [0.0; 3];
    let mut left = [0.0; 3];
    let mut head_sum = 0.0;
    for (i, frame) in frames.iter().enumerate() {
        let (foot, head) = static_frame(frame, &base, policy, with_head).map_err(|e| e.at_frame(i))?;
        for k in 0..3 {
            right[k] += foot.right[k];
            left[k] += foot.left[k];
        }
        head_sum += head.unwrap_or(0.0);
    }

    let n = frames.len() as f64;
    let offsets = StaticOffsets {
        right_static_rot_off: -(right[0] / n),
        right_static_plant_flex: right[1] / n,
        left_static_rot_off: left[0] / n,
        left_static_plant_flex: left[1] / n,
        head_offset: head_sum / n,
    };

    info!(
        "Static calibration: {} frames, plantflex R={:.4} L={:.4}, rotoff R={:.4} L={:.4}, head={:.4} (rad)",
        frames.len(),
        offsets.right_static_plant_flex,
        offsets.left_static_plant_flex,
        offsets.right_static_rot_off,
        offsets.left_static_rot_off,
        offsets.head_offset
    );

    Ok(Measurements { offsets, ..base })
}
