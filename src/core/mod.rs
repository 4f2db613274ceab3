//! Core data structures for depthtrack

pub mod camera;
pub mod matrix;
pub mod vec;

pub use camera::{
    AcquisitionError, DepthCamera, DepthFrame, DepthSource, ReplaySource, FRAME_HEIGHT,
    FRAME_PIXELS, FRAME_WIDTH,
};
pub use matrix::{Mat4, SingularMatrix};
pub use vec::{Metric, Vec4};
