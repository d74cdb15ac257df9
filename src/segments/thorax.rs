use crate::axis::AxisFrame;
use crate::error::Result;
use crate::geometry::{midpoint, normalize};
use crate::marker::{Marker, MarkerFrame};

use super::MARKER_RADIUS;

/// 胸郭座標系
///
/// Z は下位 (STRN/T10) → 上位 (CLAV/C7)、前後方向との外積で Y を決め、
/// 原点は CLAV からマーカー半径だけ後方へずらす。
pub fn thorax_axis(frame: &MarkerFrame) -> Result<AxisFrame> {
    let clav = frame.get(Marker::Clav)?;
    let c7 = frame.get(Marker::C7)?;
    let strn = frame.get(Marker::Strn)?;
    let t10 = frame.get(Marker::T10)?;

    let upper = midpoint(&clav, &c7);
    let lower = midpoint(&strn, &t10);
    let front = midpoint(&clav, &strn);
    let back = midpoint(&c7, &t10);

    let z = normalize(&(upper - lower))?;
    let y = normalize(&z.cross(&(front - back)))?;
    let x = y.cross(&z);

    let origin = clav - x * MARKER_RADIUS;
    Ok(AxisFrame::from_directions(origin, x, y, z))
}
