use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::axis::{AxisFrame, SidePair};
use crate::error::Result;
use crate::geometry::{cross, find_joint_center, normalize};
use crate::marker::{Marker, MarkerFrame};
use crate::measurements::Measurements;

use super::MARKER_RADIUS;

/// 肩関節の結果（仮想ワンドマーカーを含む）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShoulderAxes {
    pub wand: SidePair<Point3<f64>>,
    pub frames: SidePair<AxisFrame>,
}

impl ShoulderAxes {
    pub fn centers(&self) -> SidePair<Point3<f64>> {
        self.frames.map(|f| f.origin)
    }
}

/// 鎖骨方向を表す仮想ワンドマーカー
///
/// 胸郭原点から見た肩マーカー方向と胸郭 X 軸の外積を単位長で原点に付ける。
pub fn wand_markers(frame: &MarkerFrame, thorax: &AxisFrame) -> Result<SidePair<Point3<f64>>> {
    let rsho = frame.get(Marker::Rsho)?;
    let lsho = frame.get(Marker::Lsho)?;
    let origin = thorax.origin;
    let x = thorax.x_dir();

    let right = origin + normalize(&cross(&(rsho - origin), &x))?;
    let left = origin + normalize(&cross(&x, &(lsho - origin)))?;
    Ok(SidePair::new(right, left))
}

/// 肩関節座標系
pub fn shoulder_axis(
    frame: &MarkerFrame,
    thorax: &AxisFrame,
    m: &Measurements,
) -> Result<ShoulderAxes> {
    let rsho = frame.get(Marker::Rsho)?;
    let lsho = frame.get(Marker::Lsho)?;
    let wand = wand_markers(frame, thorax)?;
    let origin = thorax.origin;

    let side = |wand: Point3<f64>, sho: Point3<f64>, offset: f64| -> Result<AxisFrame> {
        let jc = find_joint_center(wand, origin, sho, offset + MARKER_RADIUS)?;
        let z = origin - jc;
        let x = (wand - origin).cross(&z);
        let y = z.cross(&x);
        AxisFrame::from_raw_axes(jc, &x, &y, &z)
    };

    let frames = SidePair::new(
        side(wand.right, rsho, m.right_shoulder_offset)?,
        side(wand.left, lsho, m.left_shoulder_offset)?,
    );
    Ok(ShoulderAxes { wand, frames })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::fixtures::{full_body_frame, full_measurements};
    use crate::segments::thorax_axis;

    #[test]
    fn test_wand_is_unit_distance_from_thorax_origin() {
        let frame = full_body_frame();
        let thorax = thorax_axis(&frame).unwrap();
        let wand = wand_markers(&frame, &thorax).unwrap();

        for w in [wand.right, wand.left] {
            let d = w - thorax.origin;
            assert!((d.norm() - 1.0).abs() < 1e-12);
            // 胸郭 X に直交
            assert!(d.dot(&thorax.x_dir()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_shoulder_joint_centers() {
        let frame = full_body_frame();
        let m = full_measurements();
        let thorax = thorax_axis(&frame).unwrap();
        let shoulder = shoulder_axis(&frame, &thorax, &m).unwrap();

        for (axis, marker) in [
            (&shoulder.frames.right, Marker::Rsho),
            (&shoulder.frames.left, Marker::Lsho),
        ] {
            assert!(axis.is_orthonormal(1e-9), "{} not orthonormal", marker.name());
            let dist = (axis.origin - frame.get(marker).unwrap()).norm();
            assert!((dist - 47.0).abs() < 1e-6, "{}: distance {}", marker.name(), dist);
            // Z は胸郭原点を向く
            let to_thorax = (thorax.origin - axis.origin).normalize();
            assert!((axis.z_dir() - to_thorax).norm() < 1e-9);
        }
        // 右肩中心は胸郭原点より +X (実験室) 側
        assert!(shoulder.centers().right.x > thorax.origin.x);
        assert!(shoulder.centers().left.x < thorax.origin.x);
    }
}
