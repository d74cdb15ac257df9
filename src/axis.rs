use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::normalize;

/// セグメント座標系
///
/// 原点と、原点から各単位軸方向に 1 離れた3点で表す。
/// 方向ベクトルは差分 (x - origin など) で再計算する。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisFrame {
    pub origin: Point3<f64>,
    pub x: Point3<f64>,
    pub y: Point3<f64>,
    pub z: Point3<f64>,
}

impl AxisFrame {
    /// 単位方向ベクトルから構築
    pub fn from_directions(
        origin: Point3<f64>,
        x: Vector3<f64>,
        y: Vector3<f64>,
        z: Vector3<f64>,
    ) -> Self {
        Self { origin, x: origin + x, y: origin + y, z: origin + z }
    }

    /// 未正規化の方向ベクトルから構築（各軸を正規化）
    pub fn from_raw_axes(
        origin: Point3<f64>,
        x: &Vector3<f64>,
        y: &Vector3<f64>,
        z: &Vector3<f64>,
    ) -> Result<Self> {
        Ok(Self::from_directions(origin, normalize(x)?, normalize(y)?, normalize(z)?))
    }

    /// [x, y, z] 方向ベクトル組から構築
    pub fn from_axes(origin: Point3<f64>, axes: [Vector3<f64>; 3]) -> Self {
        let [x, y, z] = axes;
        Self::from_directions(origin, x, y, z)
    }

    /// [origin, x, y, z] の4行から構築
    pub fn from_rows(rows: [[f64; 3]; 4]) -> Self {
        let p = |r: [f64; 3]| Point3::new(r[0], r[1], r[2]);
        Self { origin: p(rows[0]), x: p(rows[1]), y: p(rows[2]), z: p(rows[3]) }
    }

    /// 全体座標系（原点0、行が軸方向の行列）
    pub fn global(gcs: &Matrix3<f64>) -> Self {
        let row = |i: usize| Vector3::new(gcs[(i, 0)], gcs[(i, 1)], gcs[(i, 2)]);
        Self::from_directions(Point3::origin(), row(0), row(1), row(2))
    }

    pub fn x_dir(&self) -> Vector3<f64> {
        self.x - self.origin
    }

    pub fn y_dir(&self) -> Vector3<f64> {
        self.y - self.origin
    }

    pub fn z_dir(&self) -> Vector3<f64> {
        self.z - self.origin
    }

    pub fn axes(&self) -> [Vector3<f64>; 3] {
        [self.x_dir(), self.y_dir(), self.z_dir()]
    }

    /// 行が x, y, z 方向ベクトルの 3x3 行列
    pub fn directions(&self) -> Matrix3<f64> {
        Matrix3::from_rows(&[
            self.x_dir().transpose(),
            self.y_dir().transpose(),
            self.z_dir().transpose(),
        ])
    }

    /// 同じ向きのまま原点を移動
    pub fn translated_to(&self, origin: Point3<f64>) -> Self {
        Self::from_axes(origin, self.axes())
    }

    /// 正規直交性の検査
    pub fn is_orthonormal(&self, tol: f64) -> bool {
        let [x, y, z] = self.axes();
        let unit = [x, y, z].iter().all(|v| (v.norm() - 1.0).abs() < tol);
        let orthogonal = x.dot(&y).abs() < tol && y.dot(&z).abs() < tol && z.dot(&x).abs() < tol;
        unit && orthogonal
    }

    /// [origin, x, y, z] の4行
    pub fn to_rows(&self) -> [[f64; 3]; 4] {
        let r = |p: &Point3<f64>| [p.x, p.y, p.z];
        [r(&self.origin), r(&self.x), r(&self.y), r(&self.z)]
    }
}

/// 左右対の結果（常に両側をまとめて算出）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SidePair<T> {
    pub right: T,
    pub left: T,
}

impl<T> SidePair<T> {
    pub fn new(right: T, left: T) -> Self {
        Self { right, left }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> SidePair<U> {
        SidePair { right: f(self.right), left: f(self.left) }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::AxisFrame;

    /// 4行すべてを許容誤差で比較
    pub fn assert_frame_eq(actual: &AxisFrame, expected: [[f64; 3]; 4], tol: f64) {
        let rows = actual.to_rows();
        for (i, (a, e)) in rows.iter().zip(expected.iter()).enumerate() {
            for j in 0..3 {
                assert!(
                    (a[j] - e[j]).abs() < tol,
                    "row {} col {}: expected {}, got {} (frame {:?})",
                    i,
                    j,
                    e[j],
                    a[j],
                    rows
                );
            }
        }
    }

    /// 軸3行（origin を除く）を比較
    pub fn assert_axes_eq(actual: &AxisFrame, expected: [[f64; 3]; 3], tol: f64) {
        let rows = actual.to_rows();
        for i in 0..3 {
            for j in 0..3 {
                assert!(
                    (rows[i + 1][j] - expected[i][j]).abs() < tol,
                    "axis {} col {}: expected {}, got {}",
                    i,
                    j,
                    expected[i][j],
                    rows[i + 1][j]
                );
            }
        }
    }
}
