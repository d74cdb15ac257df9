use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::axis::{AxisFrame, SidePair};
use crate::error::{CgmError, Result};
use crate::marker::MarkerFrame;
use crate::measurements::Measurements;
use crate::segments::{
    ankle_axis, elbow_wrist_axis, foot_axis, hand_axis, head_axis, hip_axis, knee_axis, pelvis_axis,
    shoulder_axis, thorax_axis, ArmAxes, HipAxes, ShoulderAxes,
};

/// 出力されるセグメント座標系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    Pelvis,
    Hip,
    RightHip,
    LeftHip,
    RightKnee,
    LeftKnee,
    RightAnkle,
    LeftAnkle,
    RightFoot,
    LeftFoot,
    Head,
    Thorax,
    RightShoulder,
    LeftShoulder,
    RightElbow,
    LeftElbow,
    RightWrist,
    LeftWrist,
    RightHand,
    LeftHand,
}

impl Segment {
    pub const ALL: [Segment; 20] = [
        Segment::Pelvis,
        Segment::Hip,
        Segment::RightHip,
        Segment::LeftHip,
        Segment::RightKnee,
        Segment::LeftKnee,
        Segment::RightAnkle,
        Segment::LeftAnkle,
        Segment::RightFoot,
        Segment::LeftFoot,
        Segment::Head,
        Segment::Thorax,
        Segment::RightShoulder,
        Segment::LeftShoulder,
        Segment::RightElbow,
        Segment::LeftElbow,
        Segment::RightWrist,
        Segment::LeftWrist,
        Segment::RightHand,
        Segment::LeftHand,
    ];
}

/// 座標系を構築する処理段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Pelvis,
    Hip,
    Knee,
    Ankle,
    Foot,
    Head,
    Thorax,
    Shoulder,
    ElbowWrist,
    Hand,
}

impl Stage {
    /// 先に実行されている必要がある段
    pub fn dependencies(self) -> &'static [Stage] {
        match self {
            Stage::Pelvis | Stage::Head | Stage::Thorax => &[],
            Stage::Hip => &[Stage::Pelvis],
            Stage::Knee => &[Stage::Hip],
            Stage::Ankle => &[Stage::Knee],
            Stage::Foot => &[Stage::Ankle],
            Stage::Shoulder => &[Stage::Thorax],
            Stage::ElbowWrist => &[Stage::Shoulder],
            Stage::Hand => &[Stage::ElbowWrist],
        }
    }

    /// この段が出力するセグメント
    pub fn segments(self) -> &'static [Segment] {
        match self {
            Stage::Pelvis => &[Segment::Pelvis],
            Stage::Hip => &[Segment::Hip, Segment::RightHip, Segment::LeftHip],
            Stage::Knee => &[Segment::RightKnee, Segment::LeftKnee],
            Stage::Ankle => &[Segment::RightAnkle, Segment::LeftAnkle],
            Stage::Foot => &[Segment::RightFoot, Segment::LeftFoot],
            Stage::Head => &[Segment::Head],
            Stage::Thorax => &[Segment::Thorax],
            Stage::Shoulder => &[Segment::RightShoulder, Segment::LeftShoulder],
            Stage::ElbowWrist => &[
                Segment::RightElbow,
                Segment::LeftElbow,
                Segment::RightWrist,
                Segment::LeftWrist,
            ],
            Stage::Hand => &[Segment::RightHand, Segment::LeftHand],
        }
    }
}

/// 1フレーム内の各段の出力
///
/// 各段は宣言した上流段の出力だけを読む。テストでは上流を直接与えて
/// 単独の段を実行できる。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentAxes {
    pub pelvis: Option<AxisFrame>,
    pub hip: Option<HipAxes>,
    pub knee: Option<SidePair<AxisFrame>>,
    pub ankle: Option<SidePair<AxisFrame>>,
    pub foot: Option<SidePair<AxisFrame>>,
    pub head: Option<AxisFrame>,
    pub thorax: Option<AxisFrame>,
    pub shoulder: Option<ShoulderAxes>,
    pub arm: Option<ArmAxes>,
    pub hand: Option<SidePair<AxisFrame>>,
}

fn upstream<T>(value: &Option<T>, stage: Stage) -> Result<&T> {
    value
        .as_ref()
        .ok_or_else(|| CgmError::Pipeline(format!("{:?} output not available", stage)))
}

impl SegmentAxes {
    /// 段を1つ実行して結果を格納
    pub fn run_stage(&mut self, stage: Stage, frame: &MarkerFrame, m: &Measurements) -> Result<()> {
        match stage {
            Stage::Pelvis => self.pelvis = Some(pelvis_axis(frame)?),
            Stage::Hip => {
                let pelvis = upstream(&self.pelvis, Stage::Pelvis)?;
                self.hip = Some(hip_axis(pelvis, m));
            }
            Stage::Knee => {
                let hip = upstream(&self.hip, Stage::Hip)?;
                self.knee = Some(knee_axis(frame, &hip.centers(), m)?);
            }
            Stage::Ankle => {
                let knee = upstream(&self.knee, Stage::Knee)?;
                self.ankle = Some(ankle_axis(frame, &knee.map(|f| f.origin), m)?);
            }
            Stage::Foot => {
                let ankle = upstream(&self.ankle, Stage::Ankle)?;
                self.foot = Some(foot_axis(frame, ankle, m)?);
            }
            Stage::Head => self.head = Some(head_axis(frame, m.offsets.head_offset)?),
            Stage::Thorax => self.thorax = Some(thorax_axis(frame)?),
            Stage::Shoulder => {
                let thorax = upstream(&self.thorax, Stage::Thorax)?;
                self.shoulder = Some(shoulder_axis(frame, thorax, m)?);
            }
            Stage::ElbowWrist => {
                let shoulder = upstream(&self.shoulder, Stage::Shoulder)?;
                self.arm = Some(elbow_wrist_axis(frame, &shoulder.centers(), m)?);
            }
            Stage::Hand => {
                let arm = upstream(&self.arm, Stage::ElbowWrist)?;
                let wrist_centers: SidePair<Point3<f64>> = arm.wrist.map(|f| f.origin);
                self.hand = Some(hand_axis(frame, &wrist_centers, m)?);
            }
        }
        Ok(())
    }

    /// セグメント座標系を取得（未計算なら None）
    pub fn get(&self, segment: Segment) -> Option<AxisFrame> {
        match segment {
            Segment::Pelvis => self.pelvis,
            Segment::Hip => self.hip.map(|h| h.shared),
            Segment::RightHip => self.hip.map(|h| h.joint_centers.right),
            Segment::LeftHip => self.hip.map(|h| h.joint_centers.left),
            Segment::RightKnee => self.knee.map(|p| p.right),
            Segment::LeftKnee => self.knee.map(|p| p.left),
            Segment::RightAnkle => self.ankle.map(|p| p.right),
            Segment::LeftAnkle => self.ankle.map(|p| p.left),
            Segment::RightFoot => self.foot.map(|p| p.right),
            Segment::LeftFoot => self.foot.map(|p| p.left),
            Segment::Head => self.head,
            Segment::Thorax => self.thorax,
            Segment::RightShoulder => self.shoulder.map(|s| s.frames.right),
            Segment::LeftShoulder => self.shoulder.map(|s| s.frames.left),
            Segment::RightElbow => self.arm.map(|a| a.elbow.right),
            Segment::LeftElbow => self.arm.map(|a| a.elbow.left),
            Segment::RightWrist => self.arm.map(|a| a.wrist.right),
            Segment::LeftWrist => self.arm.map(|a| a.wrist.left),
            Segment::RightHand => self.hand.map(|p| p.right),
            Segment::LeftHand => self.hand.map(|p| p.left),
        }
    }
}

/// 実行順序が検証済みの段の並び
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// 依存段が必ず先に来ること、重複が無いことを検証
    pub fn new(stages: Vec<Stage>) -> Result<Self> {
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].contains(stage) {
                return Err(CgmError::Pipeline(format!("{:?} listed twice", stage)));
            }
            for dep in stage.dependencies() {
                if !stages[..i].contains(dep) {
                    return Err(CgmError::Pipeline(format!(
                        "{:?} requires {:?} to run before it",
                        stage, dep
                    )));
                }
            }
        }
        Ok(Self { stages })
    }

    /// 全身
    pub fn full() -> Self {
        Self {
            stages: vec![
                Stage::Pelvis,
                Stage::Hip,
                Stage::Knee,
                Stage::Ankle,
                Stage::Foot,
                Stage::Head,
                Stage::Thorax,
                Stage::Shoulder,
                Stage::ElbowWrist,
                Stage::Hand,
            ],
        }
    }

    /// 下肢のみ
    pub fn lower_body() -> Self {
        Self { stages: vec![Stage::Pelvis, Stage::Hip, Stage::Knee, Stage::Ankle, Stage::Foot] }
    }

    /// 上肢・頭部・体幹のみ
    pub fn upper_body() -> Self {
        Self {
            stages: vec![
                Stage::Head,
                Stage::Thorax,
                Stage::Shoulder,
                Stage::ElbowWrist,
                Stage::Hand,
            ],
        }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// このパイプラインが出力するセグメント
    pub fn produces(&self, segment: Segment) -> bool {
        self.stages.iter().any(|s| s.segments().contains(&segment))
    }

    /// 1フレーム分の全段を実行
    pub fn run(&self, frame: &MarkerFrame, m: &Measurements) -> Result<SegmentAxes> {
        let mut axes = SegmentAxes::default();
        for stage in &self.stages {
            axes.run_stage(*stage, frame, m)?;
        }
        Ok(axes)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::full()
    }
}
