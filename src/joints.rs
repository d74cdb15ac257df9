use serde::{Deserialize, Serialize};

use crate::angles::AngleConvention;
use crate::axis::AxisFrame;
use crate::error::{CgmError, Result};
use crate::pipeline::{Pipeline, Segment, SegmentAxes};

/// 出力される関節角度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Joint {
    Pelvis,
    RightHip,
    LeftHip,
    RightKnee,
    LeftKnee,
    RightAnkle,
    LeftAnkle,
    RightFootProgression,
    LeftFootProgression,
    Head,
    Thorax,
    Neck,
    Spine,
    RightShoulder,
    LeftShoulder,
    RightElbow,
    LeftElbow,
    RightWrist,
    LeftWrist,
}

/// 角度計算に使う座標系の取得元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxisSource {
    /// 全体座標系
    Global,
    Segment(Segment),
}

impl AxisSource {
    fn resolve(self, axes: &SegmentAxes, global: &AxisFrame) -> Result<AxisFrame> {
        match self {
            AxisSource::Global => Ok(*global),
            AxisSource::Segment(segment) => axes
                .get(segment)
                .ok_or_else(|| CgmError::Pipeline(format!("{:?} axis not computed", segment))),
        }
    }

    fn available_in(self, pipeline: &Pipeline) -> bool {
        match self {
            AxisSource::Global => true,
            AxisSource::Segment(segment) => pipeline.produces(segment),
        }
    }
}

/// 関節角度1つ分の定義（近位 → 遠位）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngle {
    pub joint: Joint,
    pub proximal: AxisSource,
    pub distal: AxisSource,
    pub convention: AngleConvention,
}

impl JointAngle {
    pub const fn new(joint: Joint, proximal: AxisSource, distal: AxisSource, convention: AngleConvention) -> Self {
        Self { joint, proximal, distal, convention }
    }

    /// 1フレーム分の角度（度）
    pub fn compute(&self, axes: &SegmentAxes, global: &AxisFrame) -> Result<[f64; 3]> {
        let proximal = self.proximal.resolve(axes, global)?;
        let distal = self.distal.resolve(axes, global)?;
        crate::angles::joint_angle(self.convention, &proximal, &distal)
    }
}

const fn seg(segment: Segment) -> AxisSource {
    AxisSource::Segment(segment)
}

/// 標準の関節角度表
pub const DEFAULT_JOINTS: [JointAngle; 19] = {
    use AngleConvention as C;
    use AxisSource::Global;
    [
        JointAngle::new(Joint::Pelvis, Global, seg(Segment::Pelvis), C::Pelvis),
        JointAngle::new(Joint::RightHip, seg(Segment::Hip), seg(Segment::RightKnee), C::Generic),
        JointAngle::new(Joint::LeftHip, seg(Segment::Hip), seg(Segment::LeftKnee), C::Generic),
        JointAngle::new(Joint::RightKnee, seg(Segment::RightKnee), seg(Segment::RightAnkle), C::Generic),
        JointAngle::new(Joint::LeftKnee, seg(Segment::LeftKnee), seg(Segment::LeftAnkle), C::Generic),
        JointAngle::new(Joint::RightAnkle, seg(Segment::RightAnkle), seg(Segment::RightFoot), C::Generic),
        JointAngle::new(Joint::LeftAnkle, seg(Segment::LeftAnkle), seg(Segment::LeftFoot), C::Generic),
        JointAngle::new(Joint::RightFootProgression, Global, seg(Segment::RightFoot), C::Generic),
        JointAngle::new(Joint::LeftFootProgression, Global, seg(Segment::LeftFoot), C::Generic),
        JointAngle::new(Joint::Head, Global, seg(Segment::Head), C::Head),
        JointAngle::new(Joint::Thorax, Global, seg(Segment::Thorax), C::Head),
        JointAngle::new(Joint::Neck, seg(Segment::Thorax), seg(Segment::Head), C::Head),
        JointAngle::new(Joint::Spine, seg(Segment::Pelvis), seg(Segment::Thorax), C::Spine),
        // 上腕は肘座標系で代表
        JointAngle::new(Joint::RightShoulder, seg(Segment::Thorax), seg(Segment::RightElbow), C::Shoulder),
        JointAngle::new(Joint::LeftShoulder, seg(Segment::Thorax), seg(Segment::LeftElbow), C::Shoulder),
        JointAngle::new(Joint::RightElbow, seg(Segment::RightElbow), seg(Segment::RightWrist), C::Generic),
        JointAngle::new(Joint::LeftElbow, seg(Segment::LeftElbow), seg(Segment::LeftWrist), C::Generic),
        JointAngle::new(Joint::RightWrist, seg(Segment::RightWrist), seg(Segment::RightHand), C::Generic),
        JointAngle::new(Joint::LeftWrist, seg(Segment::LeftWrist), seg(Segment::LeftHand), C::Generic),
    ]
};

/// 計算する関節角度の一覧
#[derive(Debug, Clone, PartialEq)]
pub struct JointMapping {
    entries: Vec<JointAngle>,
}

impl JointMapping {
    /// 取得元がパイプラインで出力されるか、関節が重複していないかを検証
    pub fn new(entries: Vec<JointAngle>, pipeline: &Pipeline) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.joint == entry.joint) {
                return Err(CgmError::Pipeline(format!("{:?} mapped twice", entry.joint)));
            }
            for source in [entry.proximal, entry.distal] {
                if !source.available_in(pipeline) {
                    return Err(CgmError::Pipeline(format!(
                        "{:?} needs {:?} which the pipeline does not produce",
                        entry.joint, source
                    )));
                }
            }
        }
        Ok(Self { entries })
    }

    /// 標準表のうち、パイプラインが出力するセグメントだけで計算できるもの
    pub fn default_for(pipeline: &Pipeline) -> Self {
        let entries = DEFAULT_JOINTS
            .iter()
            .filter(|e| e.proximal.available_in(pipeline) && e.distal.available_in(pipeline))
            .copied()
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[JointAngle] {
        &self.entries
    }

    pub fn joints(&self) -> Vec<Joint> {
        self.entries.iter().map(|e| e.joint).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Stage;

    #[test]
    fn test_default_for_full_has_every_joint() {
        let mapping = JointMapping::default_for(&Pipeline::full());
        assert_eq!(mapping.entries().len(), DEFAULT_JOINTS.len());
        assert_eq!(mapping.entries(), &DEFAULT_JOINTS[..]);
    }

    #[test]
    fn test_default_for_lower_body() {
        let mapping = JointMapping::default_for(&Pipeline::lower_body());
        let joints = mapping.joints();
        assert_eq!(
            joints,
            vec![
                Joint::Pelvis,
                Joint::RightHip,
                Joint::LeftHip,
                Joint::RightKnee,
                Joint::LeftKnee,
                Joint::RightAnkle,
                Joint::LeftAnkle,
                Joint::RightFootProgression,
                Joint::LeftFootProgression,
            ]
        );
    }

    #[test]
    fn test_default_for_upper_body_skips_spine() {
        let mapping = JointMapping::default_for(&Pipeline::upper_body());
        let joints = mapping.joints();
        assert!(joints.contains(&Joint::Neck));
        assert!(joints.contains(&Joint::RightWrist));
        assert!(!joints.contains(&Joint::Spine), "spine needs the pelvis");
        assert!(!joints.contains(&Joint::Pelvis));
    }

    #[test]
    fn test_new_rejects_unproduced_source() {
        let pipeline = Pipeline::new(vec![Stage::Pelvis, Stage::Hip]).unwrap();
        let entries = vec![DEFAULT_JOINTS[1]];
        assert!(matches!(JointMapping::new(entries, &pipeline), Err(CgmError::Pipeline(_))));
    }

    #[test]
    fn test_new_rejects_duplicate_joint() {
        let entries = vec![DEFAULT_JOINTS[0], DEFAULT_JOINTS[0]];
        assert!(matches!(
            JointMapping::new(entries, &Pipeline::full()),
            Err(CgmError::Pipeline(_))
        ));
    }

    #[test]
    fn test_custom_mapping() {
        // 骨盤に対する大腿の向き
        let entry = JointAngle::new(
            Joint::RightHip,
            AxisSource::Segment(Segment::Pelvis),
            AxisSource::Segment(Segment::RightKnee),
            AngleConvention::Generic,
        );
        let pipeline = Pipeline::lower_body();
        let mapping = JointMapping::new(vec![entry], &pipeline).unwrap();
        assert_eq!(mapping.joints(), vec![Joint::RightHip]);
    }

    #[test]
    fn test_compute_aligned_with_global() {
        let global = AxisFrame::global(&nalgebra::Matrix3::identity());
        let axes = SegmentAxes { thorax: Some(global), ..Default::default() };
        let entry = JointAngle::new(
            Joint::Thorax,
            AxisSource::Global,
            AxisSource::Segment(Segment::Thorax),
            AngleConvention::Generic,
        );
        // 同じ向きなら第3角は 90 度
        let angle = entry.compute(&axes, &global).unwrap();
        let expected = [0.0, 0.0, 90.0];
        for i in 0..3 {
            assert!((angle[i] - expected[i]).abs() < 1e-9, "angle {:?}", angle);
        }
    }

    #[test]
    fn test_compute_missing_segment() {
        let global = AxisFrame::global(&nalgebra::Matrix3::identity());
        let result = DEFAULT_JOINTS[0].compute(&SegmentAxes::default(), &global);
        assert!(matches!(result, Err(CgmError::Pipeline(_))));
    }
}
