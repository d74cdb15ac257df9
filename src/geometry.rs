use nalgebra::{Matrix3, Point3, Vector3};

use crate::error::{CgmError, Result};

/// 3次元座標への変換（整数・単精度・nalgebra型を同一に扱う）
pub trait IntoPoint {
    fn into_point(self) -> Point3<f64>;
}

impl IntoPoint for Point3<f64> {
    fn into_point(self) -> Point3<f64> {
        self
    }
}

impl IntoPoint for &Point3<f64> {
    fn into_point(self) -> Point3<f64> {
        *self
    }
}

impl IntoPoint for Vector3<f64> {
    fn into_point(self) -> Point3<f64> {
        Point3::from(self)
    }
}

impl IntoPoint for [f64; 3] {
    fn into_point(self) -> Point3<f64> {
        Point3::new(self[0], self[1], self[2])
    }
}

impl IntoPoint for [f32; 3] {
    fn into_point(self) -> Point3<f64> {
        Point3::new(f64::from(self[0]), f64::from(self[1]), f64::from(self[2]))
    }
}

impl IntoPoint for [i32; 3] {
    fn into_point(self) -> Point3<f64> {
        Point3::new(f64::from(self[0]), f64::from(self[1]), f64::from(self[2]))
    }
}

impl IntoPoint for [i64; 3] {
    fn into_point(self) -> Point3<f64> {
        Point3::new(self[0] as f64, self[1] as f64, self[2] as f64)
    }
}

impl IntoPoint for (f64, f64, f64) {
    fn into_point(self) -> Point3<f64> {
        Point3::new(self.0, self.1, self.2)
    }
}

impl IntoPoint for (i32, i32, i32) {
    fn into_point(self) -> Point3<f64> {
        Point3::new(f64::from(self.0), f64::from(self.1), f64::from(self.2))
    }
}

/// 外積
pub fn cross(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a.cross(b)
}

/// 単位ベクトル化（ノルム0はエラー）
pub fn normalize(v: &Vector3<f64>) -> Result<Vector3<f64>> {
    let norm = v.norm();
    if norm == 0.0 {
        return Err(CgmError::DivideByZero);
    }
    Ok(v / norm)
}

/// 2点の中点
pub fn midpoint(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    Point3::from((a.coords + b.coords) / 2.0)
}

/// 軸角から回転行列 (Rodrigues)
///
/// - axis: 単位ベクトル
/// - angle: ラジアン
pub fn rodrigues(axis: &Vector3<f64>, angle: f64) -> Matrix3<f64> {
    let (ux, uy, uz) = (axis.x, axis.y, axis.z);
    let cs = angle.cos();
    let sn = angle.sin();
    let t = 1.0 - cs;

    Matrix3::new(
        cs + ux * ux * t,      ux * uy * t - uz * sn, ux * uz * t + uy * sn,
        uy * ux * t + uz * sn, cs + uy * uy * t,      uy * uz * t - ux * sn,
        uz * ux * t - uy * sn, uz * uy * t + ux * sn, cs + uz * uz * t,
    )
}

/// 関節中心を推定
///
/// a, b, c の3点が張る平面内で、c から delta 離れ、
/// かつ (b - 関節中心) と (c - 関節中心) が直交する点を返す。
/// 典型的には a = 上流のwand/thighマーカー、b = 上流の関節中心、c = 関節マーカー。
pub fn find_joint_center(
    a: impl IntoPoint,
    b: impl IntoPoint,
    c: impl IntoPoint,
    delta: f64,
) -> Result<Point3<f64>> {
    let a = a.into_point();
    let b = b.into_point();
    let c = c.into_point();

    let v1 = a - c;
    let v2 = b - c;
    let v3 = normalize(&v1.cross(&v2))?;

    let m = midpoint(&b, &c);
    let length = (b - m).norm();

    let span = v2.norm();
    let ratio = delta / span;
    if !(-1.0..=1.0).contains(&ratio) {
        return Err(CgmError::JointCenterOutOfReach { delta, distance: span });
    }
    let theta = ratio.acos();

    // v2 を平面法線まわりに 2θ 回転し、半径 |b - m| に揃える
    let r = rodrigues(&v3, 2.0 * theta) * v2;
    let r = r * (length / r.norm());

    Ok(m + r)
}

/// オイラー角（度）から回転行列 Rx · Ry · Rz
pub fn rotation_matrix(x: f64, y: f64, z: f64) -> Matrix3<f64> {
    let rx = x.to_radians();
    let ry = y.to_radians();
    let rz = z.to_radians();

    let rot_x = Matrix3::new(
        1.0, 0.0, 0.0,
        0.0, rx.cos(), -rx.sin(),
        0.0, rx.sin(), rx.cos(),
    );
    let rot_y = Matrix3::new(
        ry.cos(), 0.0, ry.sin(),
        0.0, 1.0, 0.0,
        -ry.sin(), 0.0, ry.cos(),
    );
    let rot_z = Matrix3::new(
        rz.cos(), -rz.sin(), 0.0,
        rz.sin(), rz.cos(), 0.0,
        0.0, 0.0, 1.0,
    );
    rot_x * rot_y * rot_z
}

/// 逆行列（特異ならエラー）
pub fn invert(m: &Matrix3<f64>) -> Result<Matrix3<f64>> {
    m.try_inverse().ok_or(CgmError::SingularMatrix)
}

/// X軸まわりの回転: [x, y, z] の方向ベクトル組を回す
pub fn rotate_about_x(axes: &[Vector3<f64>; 3], angle: f64) -> [Vector3<f64>; 3] {
    let (s, c) = angle.sin_cos();
    let [x, y, z] = axes;
    [*x, y * c - z * s, y * s + z * c]
}

/// Y軸まわりの回転
pub fn rotate_about_y(axes: &[Vector3<f64>; 3], angle: f64) -> [Vector3<f64>; 3] {
    let (s, c) = angle.sin_cos();
    let [x, y, z] = axes;
    [x * c + z * s, *y, -x * s + z * c]
}

/// Z軸まわりの回転
pub fn rotate_about_z(axes: &[Vector3<f64>; 3], angle: f64) -> [Vector3<f64>; 3] {
    let (s, c) = angle.sin_cos();
    let [x, y, z] = axes;
    [x * c - y * s, x * s + y * c, *z]
}
