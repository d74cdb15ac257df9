use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::axis::{AxisFrame, SidePair};
use crate::error::Result;
use crate::geometry::{find_joint_center, midpoint};
use crate::marker::{Marker, MarkerFrame};
use crate::measurements::Measurements;

use super::MARKER_RADIUS;

/// 肘（上腕）と手首（前腕）の座標系
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmAxes {
    pub elbow: SidePair<AxisFrame>,
    pub wrist: SidePair<AxisFrame>,
}

/// 左右の手首バー (WRA, WRB)
pub(crate) fn wrist_bars(frame: &MarkerFrame) -> Result<SidePair<(Point3<f64>, Point3<f64>)>> {
    Ok(SidePair::new(
        (frame.get(Marker::Rwra)?, frame.get(Marker::Rwrb)?),
        (frame.get(Marker::Lwra)?, frame.get(Marker::Lwrb)?),
    ))
}

/// 手首バーから前腕/手部の X 軸
///
/// 右は (WRA - WRB) × Z、左は Z × (WRA - WRB)。
pub(crate) fn bar_x_axis(wra: &Point3<f64>, wrb: &Point3<f64>, z: &Vector3<f64>, right: bool) -> Vector3<f64> {
    let bar = wra - wrb;
    if right {
        bar.cross(z)
    } else {
        z.cross(&bar)
    }
}

/// 肘・手首座標系
///
/// 肘関節中心は手首中点・肩関節中心・肘マーカーから推定。
/// 手首関節中心は手首バーの中点。
pub fn elbow_wrist_axis(
    frame: &MarkerFrame,
    shoulder_centers: &SidePair<Point3<f64>>,
    m: &Measurements,
) -> Result<ArmAxes> {
    let relb = frame.get(Marker::Relb)?;
    let lelb = frame.get(Marker::Lelb)?;
    let bars = wrist_bars(frame)?;

    let side = |(wra, wrb): (Point3<f64>, Point3<f64>),
                elb: Point3<f64>,
                sjc: Point3<f64>,
                width: f64,
                right: bool|
     -> Result<(AxisFrame, AxisFrame)> {
        let wjc = midpoint(&wra, &wrb);
        let ejc = find_joint_center(wjc, sjc, elb, width / 2.0 + MARKER_RADIUS)?;

        // 上腕
        let z = sjc - ejc;
        let x = if right { z.cross(&(elb - sjc)) } else { (elb - sjc).cross(&z) };
        let y = z.cross(&x);
        let elbow = AxisFrame::from_raw_axes(ejc, &x, &y, &z)?;

        // 前腕
        let z = ejc - wjc;
        let x = bar_x_axis(&wra, &wrb, &z, right);
        let y = z.cross(&x);
        let wrist = AxisFrame::from_raw_axes(wjc, &x, &y, &z)?;

        Ok((elbow, wrist))
    };

    let (right_elbow, right_wrist) =
        side(bars.right, relb, shoulder_centers.right, m.right_elbow_width, true)?;
    let (left_elbow, left_wrist) =
        side(bars.left, lelb, shoulder_centers.left, m.left_elbow_width, false)?;

    Ok(ArmAxes {
        elbow: SidePair::new(right_elbow, left_elbow),
        wrist: SidePair::new(right_wrist, left_wrist),
    })
}
