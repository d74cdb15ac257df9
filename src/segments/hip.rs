use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::axis::{AxisFrame, SidePair};
use crate::geometry::midpoint;
use crate::measurements::Measurements;

use super::MARKER_RADIUS;

/// Davis (1991) 回帰式の定数
const THETA: f64 = 0.500000178813934;
const BETA: f64 = 0.314000427722931;

/// 股関節座標系
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HipAxes {
    /// 左右股関節中心（骨盤と同じ向き）
    pub joint_centers: SidePair<AxisFrame>,
    /// 左右中心の中点に置いた共有座標系
    pub shared: AxisFrame,
}

impl HipAxes {
    pub fn centers(&self) -> SidePair<Point3<f64>> {
        self.joint_centers.map(|f| f.origin)
    }
}

/// 骨盤座標系から股関節中心を推定
///
/// 骨盤座標系の各軸に沿った平行移動量を脚長・ASIS間距離から求める。
pub fn hip_axis(pelvis: &AxisFrame, m: &Measurements) -> HipAxes {
    let c = m.mean_leg_length * 0.115 - 15.3;
    let aa = m.inter_asis_distance / 2.0;
    let lateral = c * THETA.sin() - aa;

    let [px, py, pz] = pelvis.axes();
    let center = |asis_trocanter: f64, yh: f64| {
        let xh = (-asis_trocanter - MARKER_RADIUS) * BETA.cos() + c * THETA.cos() * BETA.sin();
        let zh = (-asis_trocanter - MARKER_RADIUS) * BETA.sin() - c * THETA.cos() * BETA.cos();
        pelvis.origin + px * xh + py * yh + pz * zh
    };

    // 骨盤Yは左向き: 右は lateral、左は符号反転
    let right = center(m.right_asis_trocanter, lateral);
    let left = center(m.left_asis_trocanter, -lateral);

    HipAxes {
        joint_centers: SidePair::new(pelvis.translated_to(right), pelvis.translated_to(left)),
        shared: pelvis.translated_to(midpoint(&right, &left)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::test_util::assert_frame_eq;
    use std::collections::HashMap;

    fn measurements() -> Measurements {
        let values: HashMap<String, f64> = [
            ("MeanLegLength", 940.0),
            ("R_AsisToTrocanterMeasure", 72.512),
            ("L_AsisToTrocanterMeasure", 72.512),
            ("InterAsisDistance", 215.908996582031),
            ("RightKneeWidth", 105.0),
            ("LeftKneeWidth", 105.0),
            ("RightAnkleWidth", 70.0),
            ("LeftAnkleWidth", 70.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Measurements::from_map(&values).unwrap()
    }

    fn pelvis() -> AxisFrame {
        AxisFrame::from_rows([
            [251.60830688, 391.74131775, 1032.89349365],
            [251.74063624, 392.72694721, 1032.78850073],
            [250.61711554, 391.87232862, 1032.8741063],
            [251.60295336, 391.84795134, 1033.88777762],
        ])
    }

    #[test]
    fn test_shared_hip_axis() {
        let hip = hip_axis(&pelvis(), &measurements());
        assert_frame_eq(
            &hip.shared,
            [
                [245.47574075, 331.11787116, 936.75939614],
                [245.60807011, 332.10350062, 936.65440322],
                [244.48454941, 331.24888203, 936.74000879],
                [245.47038723, 331.22450475, 937.75368011],
            ],
            1e-6,
        );
    }

    #[test]
    fn test_per_side_joint_centers() {
        let pelvis = pelvis();
        let hip = hip_axis(&pelvis, &measurements());
        let expected = SidePair::new(
            [308.38050352, 322.80342433, 937.98979092],
            [182.57097799, 339.43231799, 935.52900136],
        );

        for (frame, origin) in [
            (&hip.joint_centers.right, expected.right),
            (&hip.joint_centers.left, expected.left),
        ] {
            let o = Point3::from(origin);
            let x = o + pelvis.x_dir();
            let y = o + pelvis.y_dir();
            let z = o + pelvis.z_dir();
            assert_frame_eq(
                frame,
                [origin, [x.x, x.y, x.z], [y.x, y.y, y.z], [z.x, z.y, z.z]],
                1e-6,
            );
        }
    }

    #[test]
    fn test_joint_centers_symmetric_about_shared_origin() {
        let pelvis = pelvis();
        let hip = hip_axis(&pelvis, &measurements());
        let centers = hip.centers();

        let mid = midpoint(&centers.right, &centers.left);
        assert!((mid - hip.shared.origin).norm() < 1e-9);

        // 左右の差は骨盤Y方向のみ、右が -Y 側
        let diff = centers.left - centers.right;
        let y = pelvis.y_dir();
        assert!((diff.normalize() - y).norm() < 1e-6, "left-right: {:?}", diff);

        // 各中心の座標系は骨盤と同じ向き
        assert!((hip.joint_centers.right.directions() - pelvis.directions()).norm() < 1e-9);
        assert!((hip.joint_centers.left.directions() - pelvis.directions()).norm() < 1e-9);
    }
}
