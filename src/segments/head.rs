use crate::axis::AxisFrame;
use crate::error::Result;
use crate::geometry::{midpoint, normalize, rotate_about_y};
use crate::marker::{Marker, MarkerFrame};

/// 頭部マーカー
pub const HEAD_MARKERS: [Marker; 4] = [Marker::Lfhd, Marker::Rfhd, Marker::Lbhd, Marker::Rbhd];

/// 頭部座標系（オフセット補正なし）
///
/// 原点は前頭2点の中点。X は後→前、Y は右→左を
/// 直交化し直したもの。
pub fn head_axis_uncorrected(frame: &MarkerFrame) -> Result<AxisFrame> {
    let lfhd = frame.get(Marker::Lfhd)?;
    let rfhd = frame.get(Marker::Rfhd)?;
    let lbhd = frame.get(Marker::Lbhd)?;
    let rbhd = frame.get(Marker::Rbhd)?;

    let front = midpoint(&lfhd, &rfhd);
    let back = midpoint(&lbhd, &rbhd);
    let left = midpoint(&lfhd, &lbhd);
    let right = midpoint(&rfhd, &rbhd);

    let x = normalize(&(front - back))?;
    let y = normalize(&(left - right))?;
    let z = normalize(&x.cross(&y))?;
    let y = normalize(&z.cross(&x))?;
    let x = normalize(&y.cross(&z))?;

    Ok(AxisFrame::from_directions(front, x, y, z))
}

/// 動的トライアルの頭部座標系
///
/// 静的キャリブレーションで求めた頭部オフセット（ラジアン）だけ
/// Y 軸まわりに逆回転させる。
pub fn head_axis(frame: &MarkerFrame, head_offset: f64) -> Result<AxisFrame> {
    let head = head_axis_uncorrected(frame)?;
    let axes = rotate_about_y(&head.axes(), -head_offset);
    Ok(AxisFrame::from_axes(head.origin, axes))
}
