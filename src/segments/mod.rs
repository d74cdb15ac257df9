//! セグメント座標系の構築
//!
//! 各関数はマーカー・上流セグメントの結果・計測値のみを受け取る純粋関数。

pub mod ankle;
pub mod arm;
pub mod foot;
pub mod hand;
pub mod head;
pub mod hip;
pub mod knee;
pub mod pelvis;
pub mod shoulder;
pub mod thorax;

pub use ankle::ankle_axis;
pub use arm::{elbow_wrist_axis, ArmAxes};
pub use foot::{corrected_foot_axis, foot_axis, uncorrected_foot_axis, FootPolicy};
pub use hand::hand_axis;
pub use head::{head_axis, head_axis_uncorrected, HEAD_MARKERS};
pub use hip::{hip_axis, HipAxes};
pub use knee::knee_axis;
pub use pelvis::{pelvis_axis, pelvis_axis_from_points};
pub use shoulder::{shoulder_axis, wand_markers, ShoulderAxes};
pub use thorax::thorax_axis;

/// マーカー半径 (mm)
pub const MARKER_RADIUS: f64 = 7.0;
