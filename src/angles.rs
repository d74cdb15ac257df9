use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::axis::AxisFrame;
use crate::error::Result;
use crate::geometry::invert;

/// 関節角の分解規約
///
/// いずれも相対回転 M = D · P⁻¹ の要素から角度を取り出すが、
/// 使う要素と符号が関節ごとに異なる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AngleConvention {
    /// 股・膝・足関節・足部進行角・肘・手首
    Generic,
    Shoulder,
    Spine,
    /// 頭部・胸郭・頸部
    Head,
    Pelvis,
}

/// 相対回転行列 M = D · P⁻¹
///
/// P, D は行が各軸の方向ベクトル。P が特異ならエラー。
pub fn relative_rotation(proximal: &Matrix3<f64>, distal: &Matrix3<f64>) -> Result<Matrix3<f64>> {
    Ok(distal * invert(proximal)?)
}

/// 近位・遠位の方向行列から関節角（度）を求める
///
/// ジンバルロック付近では NaN を含みうる（補正しない）。
pub fn decompose(
    convention: AngleConvention,
    proximal: &Matrix3<f64>,
    distal: &Matrix3<f64>,
) -> Result<[f64; 3]> {
    let m = relative_rotation(proximal, distal)?;
    Ok(match convention {
        AngleConvention::Generic => generic(&m),
        AngleConvention::Shoulder => shoulder(&m),
        AngleConvention::Spine => spine(&m),
        AngleConvention::Head => head(&m),
        AngleConvention::Pelvis => pelvis(&m),
    })
}

/// 2つのセグメント座標系の間の関節角（度）
pub fn joint_angle(convention: AngleConvention, proximal: &AxisFrame, distal: &AxisFrame) -> Result<[f64; 3]> {
    decompose(convention, &proximal.directions(), &distal.directions())
}

fn generic(m: &Matrix3<f64>) -> [f64; 3] {
    let alpha = m[(2, 0)].atan2(m[(2, 2)]);
    let beta = (-m[(2, 1)]).atan2(m[(2, 0)].hypot(m[(2, 2)]));
    let gamma = m[(0, 1)].atan2(m[(1, 1)]);

    let mut third = 90.0 - gamma.to_degrees();
    if third > 180.0 {
        third -= 360.0;
    }
    [alpha.to_degrees(), beta.to_degrees(), third]
}

fn shoulder(m: &Matrix3<f64>) -> [f64; 3] {
    let alpha = m[(2, 0)].asin();
    let beta = (-m[(2, 1)]).atan2(m[(2, 2)]);
    let gamma = (-m[(1, 0)]).atan2(m[(0, 0)]);
    [alpha.to_degrees(), beta.to_degrees(), gamma.to_degrees()]
}

fn spine(m: &Matrix3<f64>) -> [f64; 3] {
    let alpha = m[(1, 2)].asin();
    let gamma = (-m[(1, 0)] / alpha.cos()).asin();
    let beta = (-m[(0, 2)] / alpha.cos()).asin();
    [beta.to_degrees(), gamma.to_degrees(), alpha.to_degrees()]
}

fn head(m: &Matrix3<f64>) -> [f64; 3] {
    let alpha = (-m[(2, 0)]).atan2(m[(2, 2)]).to_degrees();
    let beta = m[(2, 1)].atan2(m[(2, 0)].hypot(m[(2, 2)])).to_degrees();
    let gamma = (-m[(0, 1)]).atan2(m[(1, 1)]).to_degrees();

    let beta = -beta;

    let alpha = if alpha < 0.0 {
        -alpha
    } else if alpha > 0.0 && alpha < 180.0 {
        360.0 - alpha
    } else {
        alpha
    };

    let gamma = if gamma > 90.0 {
        if gamma > 120.0 {
            -(gamma - 180.0)
        } else {
            -(gamma + 180.0)
        }
    } else if gamma < 0.0 {
        -(gamma + 180.0)
    } else {
        -gamma - 180.0
    };

    [alpha, beta, gamma]
}

fn pelvis(m: &Matrix3<f64>) -> [f64; 3] {
    let alpha = m[(2, 0)].atan2(m[(2, 2)]);
    let beta = m[(2, 1)].atan2(m[(2, 0)].hypot(m[(2, 2)]));
    let gamma = m[(0, 1)].atan2(m[(1, 1)]);
    [alpha.to_degrees(), beta.to_degrees(), gamma.to_degrees()]
}

/// 静的オフセット角（ラジアン, YXZ 順の逆オイラー）
///
/// 補正前の足部軸 P から補正後 D への回転を [alpha, beta, gamma] で返す。
/// 静的姿勢では ±π/2 を超えない前提で arctan を使う。
pub fn static_offset_angles(proximal: &Matrix3<f64>, distal: &Matrix3<f64>) -> Result<[f64; 3]> {
    let m = relative_rotation(proximal, distal)?;
    let alpha = (m[(2, 1)] / m[(2, 0)].hypot(m[(2, 2)])).atan();
    let beta = (-m[(2, 0)] / m[(2, 2)]).atan();
    let gamma = (-m[(0, 1)] / m[(1, 1)]).atan();
    Ok([alpha, beta, gamma])
}

/// 頭部の基準座標系（前方 +Y、左 -X、上 +Z）
pub const HEAD_REFERENCE: [[f64; 3]; 3] = [[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];

/// 頭部の前後傾オフセット（ラジアン）
pub fn head_offset_angle(reference: &Matrix3<f64>, head: &Matrix3<f64>) -> Result<f64> {
    let m = relative_rotation(reference, head)?;
    Ok((m[(0, 2)] / m[(2, 2)].hypot(m[(1, 2)])).atan())
}
