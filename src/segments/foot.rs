use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::axis::{AxisFrame, SidePair};
use crate::error::Result;
use crate::geometry::{normalize, rotate_about_x, rotate_about_y};
use crate::marker::{Marker, MarkerFrame};
use crate::measurements::Measurements;

/// 静的トライアルでの足部補正方針
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FootPolicy {
    /// 足底が床に平らに接地している（踵とつま先の高さ差を補正）
    FlatFoot { right_sole_delta: f64, left_sole_delta: f64 },
    /// 踵→つま先をそのまま足部長軸とする
    NonFlatFoot,
}

impl FootPolicy {
    /// 設定フラグと計測値から方針を決定
    pub fn from_flag(flat_foot: bool, right_sole_delta: f64, left_sole_delta: f64) -> Self {
        if flat_foot {
            FootPolicy::FlatFoot { right_sole_delta, left_sole_delta }
        } else {
            FootPolicy::NonFlatFoot
        }
    }
}

/// 足関節の屈曲軸上の点（足関節座標系の Y 端点）から屈曲軸方向
fn flexion_axis(ankle: &AxisFrame, ankle_center: &Point3<f64>) -> Result<Vector3<f64>> {
    normalize(&(ankle.y - ankle_center))
}

/// Z 軸と屈曲軸から X/Y を直交化
fn toe_axes(z: Vector3<f64>, y_flex: &Vector3<f64>) -> Result<[Vector3<f64>; 3]> {
    let x = normalize(&y_flex.cross(&z))?;
    let y = normalize(&z.cross(&x))?;
    Ok([x, y, z])
}

/// 補正前の足部座標系（Z = つま先→足関節中心）
pub fn uncorrected_foot_axis(
    toes: &SidePair<Point3<f64>>,
    ankle: &SidePair<AxisFrame>,
) -> Result<SidePair<AxisFrame>> {
    let side = |toe: Point3<f64>, ankle: &AxisFrame| -> Result<AxisFrame> {
        let z = normalize(&(ankle.origin - toe))?;
        let axes = toe_axes(z, &flexion_axis(ankle, &ankle.origin)?)?;
        Ok(AxisFrame::from_axes(toe, axes))
    };
    Ok(SidePair::new(side(toes.right, &ankle.right)?, side(toes.left, &ankle.left)?))
}

/// 静的トライアル用の補正済み足部座標系
pub fn corrected_foot_axis(
    toes: &SidePair<Point3<f64>>,
    heels: &SidePair<Point3<f64>>,
    ankle: &SidePair<AxisFrame>,
    policy: FootPolicy,
) -> Result<SidePair<AxisFrame>> {
    match policy {
        FootPolicy::NonFlatFoot => Ok(SidePair::new(
            non_flat_side(toes.right, heels.right, &ankle.right)?,
            non_flat_side(toes.left, heels.left, &ankle.left)?,
        )),
        FootPolicy::FlatFoot { right_sole_delta, left_sole_delta } => Ok(SidePair::new(
            flat_side(toes.right, heels.right, &ankle.right, right_sole_delta)?,
            flat_side(toes.left, heels.left, &ankle.left, left_sole_delta)?,
        )),
    }
}

fn non_flat_side(toe: Point3<f64>, heel: Point3<f64>, ankle: &AxisFrame) -> Result<AxisFrame> {
    let z = normalize(&(heel - toe))?;
    let axes = toe_axes(z, &flexion_axis(ankle, &ankle.origin)?)?;
    Ok(AxisFrame::from_axes(toe, axes))
}

fn flat_side(
    toe: Point3<f64>,
    heel: Point3<f64>,
    ankle: &AxisFrame,
    sole_delta: f64,
) -> Result<AxisFrame> {
    // 足関節中心を足底の高さ差だけ持ち上げる
    let ankle_center = ankle.origin + Vector3::new(0.0, 0.0, sole_delta);
    let z = normalize(&(ankle_center - toe))?;

    // つま先の高さでの水平な踵方向
    let heel_to_toe = normalize(&Vector3::new(heel.x - toe.x, heel.y - toe.y, 0.0))?;
    let a = normalize(&heel_to_toe.cross(&z))?;
    let b = normalize(&a.cross(&heel_to_toe))?;
    let z = normalize(&b.cross(&a))?;

    let y_flex = flexion_axis(ankle, &ankle_center)?;
    let [x, y, _] = toe_axes(z, &y_flex)?;
    let z = normalize(&x.cross(&y))?;
    Ok(AxisFrame::from_directions(toe, x, y, z))
}

/// 静的オフセット角（ラジアン）を小数5桁の度に丸めて戻す
fn rounded_offset(radians: f64) -> f64 {
    ((radians.to_degrees() * 1e5).round_ties_even() / 1e5).to_radians()
}

/// 動的トライアルの足部座標系
///
/// 補正前の座標系を底屈オフセットで Y 軸まわり、
/// 回旋オフセットで X 軸まわりに回転させる。右の回旋は符号反転。
pub fn foot_axis(
    frame: &MarkerFrame,
    ankle: &SidePair<AxisFrame>,
    m: &Measurements,
) -> Result<SidePair<AxisFrame>> {
    let toes = SidePair::new(frame.get(Marker::Rtoe)?, frame.get(Marker::Ltoe)?);
    let uncorrected = uncorrected_foot_axis(&toes, ankle)?;

    let offsets = &m.offsets;
    let right = apply_static_offsets(
        &uncorrected.right,
        -rounded_offset(offsets.right_static_rot_off),
        rounded_offset(offsets.right_static_plant_flex),
    );
    let left = apply_static_offsets(
        &uncorrected.left,
        rounded_offset(offsets.left_static_rot_off),
        rounded_offset(offsets.left_static_plant_flex),
    );
    Ok(SidePair::new(right, left))
}

fn apply_static_offsets(foot: &AxisFrame, alpha: f64, beta: f64) -> AxisFrame {
    let axes = rotate_about_y(&foot.axes(), beta);
    let axes = rotate_about_x(&axes, alpha);
    AxisFrame::from_axes(foot.origin, axes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::test_util::{assert_axes_eq, assert_frame_eq};
    use std::collections::HashMap;

    fn ankle() -> SidePair<AxisFrame> {
        SidePair::new(
            AxisFrame::from_rows([
                [393.76181608, 247.67829633, 87.73775041],
                [394.4817575, 248.37201348, 87.715368],
                [393.07114384, 248.39110006, 87.61575574],
                [393.69314056, 247.78157916, 88.73002876],
            ]),
            AxisFrame::from_rows([
                [98.74901939, 219.46930221, 80.6306816],
                [98.47494966, 220.42553803, 80.52821783],
                [97.79246671, 219.20927275, 80.76255901],
                [98.84848169, 219.60345781, 81.61663775],
            ]),
        )
    }

    fn toes() -> SidePair<Point3<f64>> {
        SidePair::new(
            Point3::new(442.81997681, 381.62280273, 42.66047668),
            Point3::new(39.43652725, 382.44522095, 41.78911591),
        )
    }

    fn heels() -> SidePair<Point3<f64>> {
        SidePair::new(
            Point3::new(374.01257324, 181.57929993, 49.50960922),
            Point3::new(105.30126953, 180.2130127, 47.15660858),
        )
    }

    #[test]
    fn test_uncorrected_foot_reference() {
        let foot = uncorrected_foot_axis(&toes(), &ankle()).unwrap();
        assert_frame_eq(
            &foot.right,
            [
                [442.81997681, 381.62280273, 42.66047668],
                [442.93807347, 381.90040642, 43.61388602],
                [441.882686, 381.97104076, 42.67518049],
                [442.49204525, 380.72744444, 42.96179781],
            ],
            1e-6,
        );
        assert_frame_eq(
            &foot.left,
            [
                [39.43652725, 382.44522095, 41.78911591],
                [39.50071636, 382.6986218, 42.7543453],
                [38.49604413, 382.13712948, 41.93254235],
                [39.77025057, 381.52823259, 42.00765902],
            ],
            1e-6,
        );
    }

    #[test]
    fn test_non_flat_foot_reference() {
        let foot = corrected_foot_axis(&toes(), &heels(), &ankle(), FootPolicy::NonFlatFoot).unwrap();
        assert_eq!(foot.right.origin, toes().right);
        assert_axes_eq(
            &foot.right,
            [
                [442.71651135, 381.69236202, 43.65267444],
                [441.87997036, 381.94200709, 42.54007546],
                [442.49488793, 380.67767307, 42.69283623],
            ],
            1e-6,
        );
        assert_axes_eq(
            &foot.left,
            [
                [39.55544558, 382.51024763, 42.77988832],
                [38.49311916, 382.14149804, 41.92228333],
                [39.74610697, 381.4946822, 41.81434438],
            ],
            1e-6,
        );
    }

    #[test]
    fn test_flat_foot_reference() {
        let policy = FootPolicy::FlatFoot { right_sole_delta: 0.45, left_sole_delta: 0.35 };
        let foot = corrected_foot_axis(&toes(), &heels(), &ankle(), policy).unwrap();
        assert_axes_eq(
            &foot.right,
            [
                [442.30666241, 381.79936348, 43.50031871],
                [442.02580128, 381.89596909, 42.1176458],
                [442.49471759, 380.67717784, 42.66047668],
            ],
            1e-6,
        );
        assert_axes_eq(
            &foot.left,
            [
                [39.23195009, 382.37859248, 42.76569608],
                [38.5079544, 382.14279528, 41.57396209],
                [39.74620554, 381.49437955, 41.78911591],
            ],
            1e-6,
        );
        // 補正後の Z はつま先と同じ高さ（水平）
        assert!(foot.right.z_dir().z.abs() < 1e-9);
    }

    #[test]
    fn test_dynamic_foot_reference() {
        let values: HashMap<String, f64> = [
            ("MeanLegLength", 940.0),
            ("R_AsisToTrocanterMeasure", 72.512),
            ("L_AsisToTrocanterMeasure", 72.512),
            ("InterAsisDistance", 215.908996582031),
            ("RightKneeWidth", 105.0),
            ("LeftKneeWidth", 105.0),
            ("RightAnkleWidth", 70.0),
            ("LeftAnkleWidth", 70.0),
            ("RightStaticRotOff", 0.015683497632642047),
            ("LeftStaticRotOff", 0.009402910292403012),
            ("RightStaticPlantFlex", 0.2702417907002758),
            ("LeftStaticPlantFlex", 0.20251085737834015),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let m = Measurements::from_map(&values).unwrap();
        let frame = MarkerFrame::new()
            .with(Marker::Rtoe, [442.81997681, 381.62280273, 42.66047668])
            .with(Marker::Ltoe, [39.43652725, 382.44522095, 41.78911591]);

        let foot = foot_axis(&frame, &ankle(), &m).unwrap();
        assert_frame_eq(
            &foot.right,
            [
                [442.81997681, 381.62280273, 42.66047668],
                [442.84624127, 381.6513024, 43.65972537],
                [441.87735057, 381.9563035, 42.67574106],
                [442.48716163, 380.68048378, 42.69610043],
            ],
            1e-6,
        );
        assert_frame_eq(
            &foot.left,
            [
                [39.43652725, 382.44522095, 41.78911591],
                [39.56652626, 382.50901001, 42.77857597],
                [38.49313328, 382.14606841, 41.93234851],
                [39.74166341, 381.4931502, 41.81040459],
            ],
            1e-6,
        );
        assert!(foot.right.is_orthonormal(1e-9));
    }

    #[test]
    fn test_zero_offsets_keep_uncorrected_axis() {
        let values: HashMap<String, f64> = [
            ("MeanLegLength", 940.0),
            ("R_AsisToTrocanterMeasure", 72.512),
            ("L_AsisToTrocanterMeasure", 72.512),
            ("InterAsisDistance", 215.9),
            ("RightKneeWidth", 105.0),
            ("LeftKneeWidth", 105.0),
            ("RightAnkleWidth", 70.0),
            ("LeftAnkleWidth", 70.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let m = Measurements::from_map(&values).unwrap();
        let frame = MarkerFrame::new()
            .with(Marker::Rtoe, [442.81997681, 381.62280273, 42.66047668])
            .with(Marker::Ltoe, [39.43652725, 382.44522095, 41.78911591]);

        let dynamic = foot_axis(&frame, &ankle(), &m).unwrap();
        let uncorrected = uncorrected_foot_axis(&toes(), &ankle()).unwrap();
        assert!((dynamic.right.directions() - uncorrected.right.directions()).norm() < 1e-12);
        assert!((dynamic.left.directions() - uncorrected.left.directions()).norm() < 1e-12);
    }

    #[test]
    fn test_offset_rounding() {
        let r = rounded_offset(0.2702417907002758);
        assert!((r.to_degrees() - 15.48371).abs() < 1e-9, "rounded: {}", r.to_degrees());
    }

    #[test]
    fn test_policy_from_flag() {
        assert_eq!(FootPolicy::from_flag(false, 0.4, 0.4), FootPolicy::NonFlatFoot);
        assert_eq!(
            FootPolicy::from_flag(true, 0.4, 0.3),
            FootPolicy::FlatFoot { right_sole_delta: 0.4, left_sole_delta: 0.3 }
        );
    }
}
