use nalgebra::Point3;

use crate::axis::{AxisFrame, SidePair};
use crate::error::Result;
use crate::geometry::find_joint_center;
use crate::marker::{Marker, MarkerFrame};
use crate::measurements::Measurements;

use super::arm::{bar_x_axis, wrist_bars};
use super::MARKER_RADIUS;

/// 手部座標系
///
/// 関節中心は WRA・手首関節中心・FIN から手の厚みで推定。
pub fn hand_axis(
    frame: &MarkerFrame,
    wrist_centers: &SidePair<Point3<f64>>,
    m: &Measurements,
) -> Result<SidePair<AxisFrame>> {
    let rfin = frame.get(Marker::Rfin)?;
    let lfin = frame.get(Marker::Lfin)?;
    let bars = wrist_bars(frame)?;

    let side = |(wra, wrb): (Point3<f64>, Point3<f64>),
                fin: Point3<f64>,
                wjc: Point3<f64>,
                thickness: f64,
                right: bool|
     -> Result<AxisFrame> {
        let hjc = find_joint_center(wra, wjc, fin, thickness / 2.0 + MARKER_RADIUS)?;
        let z = wjc - hjc;
        let x = bar_x_axis(&wra, &wrb, &z, right);
        let y = z.cross(&x);
        AxisFrame::from_raw_axes(hjc, &x, &y, &z)
    };

    Ok(SidePair::new(
        side(bars.right, rfin, wrist_centers.right, m.right_hand_thickness, true)?,
        side(bars.left, lfin, wrist_centers.left, m.left_hand_thickness, false)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::fixtures::{full_body_frame, full_measurements};
    use crate::segments::{elbow_wrist_axis, shoulder_axis, thorax_axis};

    #[test]
    fn test_hand_joint_centers() {
        let frame = full_body_frame();
        let m = full_measurements();
        let thorax = thorax_axis(&frame).unwrap();
        let shoulder = shoulder_axis(&frame, &thorax, &m).unwrap();
        let arm = elbow_wrist_axis(&frame, &shoulder.centers(), &m).unwrap();
        let wrist_centers = arm.wrist.map(|f| f.origin);
        let hand = hand_axis(&frame, &wrist_centers, &m).unwrap();

        for (axis, marker, wjc) in [
            (&hand.right, Marker::Rfin, wrist_centers.right),
            (&hand.left, Marker::Lfin, wrist_centers.left),
        ] {
            assert!(axis.is_orthonormal(1e-9));
            let dist = (axis.origin - frame.get(marker).unwrap()).norm();
            assert!((dist - 14.5).abs() < 1e-6, "{}: distance {}", marker.name(), dist);
            let to_wrist = (wjc - axis.origin).normalize();
            assert!((axis.z_dir() - to_wrist).norm() < 1e-9);
        }
    }
}
