use nalgebra::{Point3, Vector3};

use crate::axis::{AxisFrame, SidePair};
use crate::error::Result;
use crate::geometry::find_joint_center;
use crate::marker::{Marker, MarkerFrame};
use crate::measurements::Measurements;

use super::MARKER_RADIUS;

/// 膝関節座標系
///
/// 関節中心は大腿ワンド (THI)・股関節中心・膝マーカー (KNE) から推定。
/// Z は膝→股関節、X は Z と (THI - KNE) の外積。
pub fn knee_axis(
    frame: &MarkerFrame,
    hip_centers: &SidePair<Point3<f64>>,
    m: &Measurements,
) -> Result<SidePair<AxisFrame>> {
    let rthi = frame.get(Marker::Rthi)?;
    let lthi = frame.get(Marker::Lthi)?;
    let rkne = frame.get(Marker::Rkne)?;
    let lkne = frame.get(Marker::Lkne)?;

    let right_delta = m.right_knee_width / 2.0 + MARKER_RADIUS;
    let left_delta = m.left_knee_width / 2.0 + MARKER_RADIUS;

    let right_jc = find_joint_center(rthi, hip_centers.right, rkne, right_delta)?;
    let left_jc = find_joint_center(lthi, hip_centers.left, lkne, left_delta)?;

    // 右
    let z = hip_centers.right - right_jc;
    let x = z.cross(&(rthi - rkne));
    let right = knee_frame(right_jc, x, z)?;

    // 左（X の向きを揃えるため外積の順序を反転）
    let z = hip_centers.left - left_jc;
    let x = (lthi - lkne).cross(&z);
    let left = knee_frame(left_jc, x, z)?;

    Ok(SidePair::new(right, left))
}

fn knee_frame(origin: Point3<f64>, x: Vector3<f64>, z: Vector3<f64>) -> Result<AxisFrame> {
    let y = z.cross(&x);
    AxisFrame::from_raw_axes(origin, &x, &y, &z)
}
