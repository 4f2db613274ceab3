//! Offline calibration: depth bounds and two-camera extrinsic alignment

pub mod io;
pub mod solver;

use thiserror::Error;

use crate::core::camera::AcquisitionError;
use crate::core::matrix::{Mat4, SingularMatrix};

/// Persisted result of the offline calibration procedure, consumed at
/// startup by the tracking pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationRecord {
    /// Usable floor height in millimetres.
    pub z_floor: i32,
    /// Usable ceiling height in millimetres.
    pub z_ceiling: i32,
    /// Maps secondary-camera points into the primary camera's frame.
    pub extrinsic: Mat4,
}

/// Calibration failure.
///
/// A singular matrix means the marker placements were degenerate; the
/// attempt is abandoned and the operator recaptures. No fallback transform
/// is ever substituted.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("frame acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),
    #[error("camera {camera} observed no marker in placement {placement}")]
    NoMarker { camera: u32, placement: usize },
    #[error("reference points are degenerate: {0}")]
    Degenerate(#[from] SingularMatrix),
}

pub use solver::{
    calibrate_single_camera, calibrate_two_cameras, solve_extrinsic, DepthBounds, MarkerSet,
    BOUNDS_MARGIN,
};
