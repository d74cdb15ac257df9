use nalgebra::Point3;

use crate::axis::AxisFrame;
use crate::error::Result;
use crate::geometry::{midpoint, normalize};
use crate::marker::{Marker, MarkerFrame};

/// 骨盤座標系
///
/// 原点は左右ASISの中点。仙骨点は SACR があればそれを、
/// 無ければ RPSI/LPSI の中点を使う。
pub fn pelvis_axis(frame: &MarkerFrame) -> Result<AxisFrame> {
    let rasi = frame.get(Marker::Rasi)?;
    let lasi = frame.get(Marker::Lasi)?;
    let sacrum = match frame.get_optional(Marker::Sacr) {
        Some(sacr) => sacr,
        None => midpoint(&frame.get(Marker::Rpsi)?, &frame.get(Marker::Lpsi)?),
    };
    pelvis_axis_from_points(&rasi, &lasi, &sacrum)
}

/// ASIS と仙骨点から骨盤座標系を構築
pub fn pelvis_axis_from_points(
    rasi: &Point3<f64>,
    lasi: &Point3<f64>,
    sacrum: &Point3<f64>,
) -> Result<AxisFrame> {
    let origin = midpoint(rasi, lasi);

    let beta1 = origin - sacrum;
    let y = normalize(&(lasi - rasi))?;
    // β1 から Y 成分を除いたものが X
    let x = normalize(&(beta1 - y * beta1.dot(&y)))?;
    let z = x.cross(&y);

    Ok(AxisFrame::from_directions(origin, x, y, z))
}
