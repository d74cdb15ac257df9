use std::collections::HashMap;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::{CgmError, Result};

/// CGM マーカーセット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Marker {
    // 骨盤
    Rasi = 0,
    Lasi = 1,
    Rpsi = 2,
    Lpsi = 3,
    Sacr = 4,
    // 下肢
    Rthi = 5,
    Lthi = 6,
    Rkne = 7,
    Lkne = 8,
    Rtib = 9,
    Ltib = 10,
    Rank = 11,
    Lank = 12,
    Rtoe = 13,
    Ltoe = 14,
    Rhee = 15,
    Lhee = 16,
    // 頭部
    Lfhd = 17,
    Rfhd = 18,
    Lbhd = 19,
    Rbhd = 20,
    // 体幹
    Clav = 21,
    C7 = 22,
    Strn = 23,
    T10 = 24,
    // 上肢
    Rsho = 25,
    Lsho = 26,
    Relb = 27,
    Lelb = 28,
    Rwra = 29,
    Rwrb = 30,
    Lwra = 31,
    Lwrb = 32,
    Rfin = 33,
    Lfin = 34,
}

impl Marker {
    pub const COUNT: usize = 35;

    pub const ALL: [Marker; Self::COUNT] = [
        Self::Rasi, Self::Lasi, Self::Rpsi, Self::Lpsi, Self::Sacr,
        Self::Rthi, Self::Lthi, Self::Rkne, Self::Lkne, Self::Rtib, Self::Ltib,
        Self::Rank, Self::Lank, Self::Rtoe, Self::Ltoe, Self::Rhee, Self::Lhee,
        Self::Lfhd, Self::Rfhd, Self::Lbhd, Self::Rbhd,
        Self::Clav, Self::C7, Self::Strn, Self::T10,
        Self::Rsho, Self::Lsho, Self::Relb, Self::Lelb,
        Self::Rwra, Self::Rwrb, Self::Lwra, Self::Lwrb, Self::Rfin, Self::Lfin,
    ];

    /// ラベル名（トライアルファイル上の表記）
    pub fn name(self) -> &'static str {
        match self {
            Self::Rasi => "RASI",
            Self::Lasi => "LASI",
            Self::Rpsi => "RPSI",
            Self::Lpsi => "LPSI",
            Self::Sacr => "SACR",
            Self::Rthi => "RTHI",
            Self::Lthi => "LTHI",
            Self::Rkne => "RKNE",
            Self::Lkne => "LKNE",
            Self::Rtib => "RTIB",
            Self::Ltib => "LTIB",
            Self::Rank => "RANK",
            Self::Lank => "LANK",
            Self::Rtoe => "RTOE",
            Self::Ltoe => "LTOE",
            Self::Rhee => "RHEE",
            Self::Lhee => "LHEE",
            Self::Lfhd => "LFHD",
            Self::Rfhd => "RFHD",
            Self::Lbhd => "LBHD",
            Self::Rbhd => "RBHD",
            Self::Clav => "CLAV",
            Self::C7 => "C7",
            Self::Strn => "STRN",
            Self::T10 => "T10",
            Self::Rsho => "RSHO",
            Self::Lsho => "LSHO",
            Self::Relb => "RELB",
            Self::Lelb => "LELB",
            Self::Rwra => "RWRA",
            Self::Rwrb => "RWRB",
            Self::Lwra => "LWRA",
            Self::Lwrb => "LWRB",
            Self::Rfin => "RFIN",
            Self::Lfin => "LFIN",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|m| m.name() == name)
    }
}

/// 1フレーム分のマーカー座標 (mm)
///
/// JSON 上はラベル名 → [x, y, z] のオブジェクト。
/// 欠損マーカーはキー自体が存在しない。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerFrame {
    markers: HashMap<String, [f64; 3]>,
}

impl MarkerFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, marker: Marker, position: [f64; 3]) {
        self.markers.insert(marker.name().to_string(), position);
    }

    /// ビルダー形式で追加
    pub fn with(mut self, marker: Marker, position: [f64; 3]) -> Self {
        self.insert(marker, position);
        self
    }

    pub fn remove(&mut self, marker: Marker) -> Option<[f64; 3]> {
        self.markers.remove(marker.name())
    }

    /// 必須マーカーを取得
    pub fn get(&self, marker: Marker) -> Result<Point3<f64>> {
        self.get_optional(marker)
            .ok_or_else(|| CgmError::MissingMarker(marker.name().to_string()))
    }

    /// 任意マーカーを取得 (SACR など)
    pub fn get_optional(&self, marker: Marker) -> Option<Point3<f64>> {
        self.markers
            .get(marker.name())
            .map(|p| Point3::new(p[0], p[1], p[2]))
    }

    pub fn contains(&self, marker: Marker) -> bool {
        self.markers.contains_key(marker.name())
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// 既知のマーカー名に当てはまらないラベル（名前順）
    pub fn unknown_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .markers
            .keys()
            .map(String::as_str)
            .filter(|name| Marker::from_name(name).is_none())
            .collect();
        labels.sort_unstable();
        labels
    }
}

impl FromIterator<(Marker, [f64; 3])> for MarkerFrame {
    fn from_iter<I: IntoIterator<Item = (Marker, [f64; 3])>>(iter: I) -> Self {
        let mut frame = Self::new();
        for (marker, position) in iter {
            frame.insert(marker, position);
        }
        frame
    }
}
