use std::collections::BTreeMap;
use std::sync::mpsc;
use std::thread;

use ndarray::{Array3, Array4};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::axis::AxisFrame;
use crate::error::{CgmError, Result};
use crate::joints::{Joint, JointMapping};
use crate::marker::MarkerFrame;
use crate::measurements::Measurements;
use crate::pipeline::{Pipeline, Segment};

/// 1フレーム分の出力
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    pub axes: BTreeMap<Segment, AxisFrame>,
    /// 関節角（度）
    pub angles: BTreeMap<Joint, [f64; 3]>,
}

/// トライアル全体の出力（フレーム順）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialResults {
    pub frames: Vec<FrameResult>,
}

impl TrialResults {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// フレーム × 関節 × 3 の角度配列。未計算の関節は NaN
    pub fn angles_array(&self, joints: &[Joint]) -> Array3<f64> {
        let mut out = Array3::from_elem((self.frames.len(), joints.len(), 3), f64::NAN);
        for (f, frame) in self.frames.iter().enumerate() {
            for (j, joint) in joints.iter().enumerate() {
                if let Some(angle) = frame.angles.get(joint) {
                    for k in 0..3 {
                        out[[f, j, k]] = angle[k];
                    }
                }
            }
        }
        out
    }

    /// フレーム × セグメント × 4 × 3 の座標系配列（原点, X, Y, Z）
    pub fn axes_array(&self, segments: &[Segment]) -> Array4<f64> {
        let mut out = Array4::from_elem((self.frames.len(), segments.len(), 4, 3), f64::NAN);
        for (f, frame) in self.frames.iter().enumerate() {
            for (s, segment) in segments.iter().enumerate() {
                if let Some(axis) = frame.axes.get(segment) {
                    for (r, row) in axis.to_rows().iter().enumerate() {
                        for k in 0..3 {
                            out[[f, s, r, k]] = row[k];
                        }
                    }
                }
            }
        }
        out
    }
}

/// フレーム単位の運動学計算
///
/// キャリブレーション済み計測値は読み取り専用で、フレーム間に状態は無い。
pub struct Processor {
    pipeline: Pipeline,
    joints: JointMapping,
    measurements: Measurements,
    global: AxisFrame,
    cores: usize,
}

impl Processor {
    pub fn new(pipeline: Pipeline, joints: JointMapping, measurements: Measurements, cores: usize) -> Self {
        let global = AxisFrame::global(&measurements.gcs_matrix());
        Self {
            pipeline,
            joints,
            measurements,
            global,
            cores: cores.max(1),
        }
    }

    /// 全身・標準関節表・1コア
    pub fn full_body(measurements: Measurements) -> Self {
        let pipeline = Pipeline::full();
        let joints = JointMapping::default_for(&pipeline);
        Self::new(pipeline, joints, measurements, 1)
    }

    pub fn measurements(&self) -> &Measurements {
        &self.measurements
    }

    pub fn joints(&self) -> &JointMapping {
        &self.joints
    }

    /// 1フレームを処理
    pub fn process_frame(&self, frame: &MarkerFrame) -> Result<FrameResult> {
        let axes = self.pipeline.run(frame, &self.measurements)?;

        let mut result = FrameResult::default();
        for stage in self.pipeline.stages() {
            for segment in stage.segments() {
                if let Some(axis) = axes.get(*segment) {
                    result.axes.insert(*segment, axis);
                }
            }
        }
        for entry in self.joints.entries() {
            result.angles.insert(entry.joint, entry.compute(&axes, &self.global)?);
        }
        Ok(result)
    }

    /// トライアル全体を処理
    ///
    /// フレームを連続したチャンクに分けて `cores` 個のスレッドで処理し、
    /// フレーム順に並べ直す。失敗したフレームのうち最小の番号を返す。
    pub fn process_trial(&self, frames: &[MarkerFrame]) -> Result<TrialResults> {
        if self.cores == 1 || frames.len() < 2 {
            let frames = self.process_chunk(frames, 0)?;
            return Ok(TrialResults { frames });
        }

        let chunk_size = frames.len().div_ceil(self.cores);
        let (tx, rx) = mpsc::channel();

        thread::scope(|s| {
            for (i, chunk) in frames.chunks(chunk_size).enumerate() {
                let tx = tx.clone();
                let start = i * chunk_size;
                s.spawn(move || {
                    debug!("worker {}: frames {}..{}", i, start, start + chunk.len());
                    let _ = tx.send((start, self.process_chunk(chunk, start)));
                });
            }
        });
        drop(tx);

        let mut chunks: Vec<(usize, Result<Vec<FrameResult>>)> = rx.into_iter().collect();
        chunks.sort_by_key(|(start, _)| *start);

        let mut results = Vec::with_capacity(frames.len());
        for (_, chunk) in chunks {
            results.extend(chunk?);
        }
        Ok(TrialResults { frames: results })
    }

    fn process_chunk(&self, frames: &[MarkerFrame], start: usize) -> Result<Vec<FrameResult>> {
        frames
            .iter()
            .enumerate()
            .map(|(i, frame)| self.process_frame(frame).map_err(|e| e.at_frame(start + i)))
            .collect()
    }
}
