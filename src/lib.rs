pub mod angles;
pub mod axis;
pub mod calibration;
pub mod config;
pub mod error;
pub mod geometry;
pub mod joints;
pub mod marker;
pub mod measurements;
pub mod pipeline;
pub mod processor;
pub mod segments;

pub use error::{CgmError, Result};
