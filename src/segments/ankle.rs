use nalgebra::{Point3, Vector3};

use crate::axis::{AxisFrame, SidePair};
use crate::error::Result;
use crate::geometry::{find_joint_center, normalize, rotate_about_z};
use crate::marker::{Marker, MarkerFrame};
use crate::measurements::Measurements;

use super::MARKER_RADIUS;

/// 足関節座標系
///
/// 関節中心は脛骨ワンド (TIB)・膝関節中心・外果マーカー (ANK) から推定し、
/// 最後に脛骨捻転角（度）だけ自身の Z 軸まわりに回転させる。
pub fn ankle_axis(
    frame: &MarkerFrame,
    knee_centers: &SidePair<Point3<f64>>,
    m: &Measurements,
) -> Result<SidePair<AxisFrame>> {
    let rtib = frame.get(Marker::Rtib)?;
    let ltib = frame.get(Marker::Ltib)?;
    let rank = frame.get(Marker::Rank)?;
    let lank = frame.get(Marker::Lank)?;

    let right_delta = m.right_ankle_width / 2.0 + MARKER_RADIUS;
    let left_delta = m.left_ankle_width / 2.0 + MARKER_RADIUS;

    let right_jc = find_joint_center(rtib, knee_centers.right, rank, right_delta)?;
    let left_jc = find_joint_center(ltib, knee_centers.left, lank, left_delta)?;

    let z = knee_centers.right - right_jc;
    let x = z.cross(&(rtib - rank));
    let right = ankle_frame(right_jc, x, z, m.right_tibial_torsion)?;

    let z = knee_centers.left - left_jc;
    let x = (ltib - lank).cross(&z);
    let left = ankle_frame(left_jc, x, z, m.left_tibial_torsion)?;

    Ok(SidePair::new(right, left))
}

fn ankle_frame(
    origin: Point3<f64>,
    x: Vector3<f64>,
    z: Vector3<f64>,
    torsion_deg: f64,
) -> Result<AxisFrame> {
    let y = z.cross(&x);
    let axes = [normalize(&x)?, normalize(&y)?, normalize(&z)?];
    Ok(AxisFrame::from_axes(origin, rotate_about_z(&axes, torsion_deg.to_radians())))
}
