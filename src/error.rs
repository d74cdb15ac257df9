/// 運動学計算のエラー
#[derive(Debug, thiserror::Error)]
pub enum CgmError {
    #[error("cannot normalize a zero-length vector")]
    DivideByZero,

    #[error("joint center out of reach: delta {delta} vs marker distance {distance}")]
    JointCenterOutOfReach { delta: f64, distance: f64 },

    #[error("axis matrix is singular")]
    SingularMatrix,

    #[error("missing marker: {0}")]
    MissingMarker(String),

    #[error("measurement error: {0}")]
    Measurement(String),

    #[error("pipeline error: {0}")]
    Pipeline(String),

    #[error("static calibration error: {0}")]
    Calibration(String),

    #[error("frame {index}: {source}")]
    Frame {
        index: usize,
        #[source]
        source: Box<CgmError>,
    },
}

impl CgmError {
    /// フレーム番号を付与
    pub fn at_frame(self, index: usize) -> Self {
        CgmError::Frame { index, source: Box::new(self) }
    }
}

pub type Result<T> = std::result::Result<T, CgmError>;
