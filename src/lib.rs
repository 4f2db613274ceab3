//! depthtrack - single-target 3D tracking from depth cameras
//!
//! ## Quick Start
//!
//! ```rust
//! use depthtrack::{ClusterList, Metric, Vec4};
//!
//! let mut list = ClusterList::new();
//! list.add_or_fuse(Vec4::point(0.0, 2000.0, 100.0), 1, 300.0, Metric::Full);
//! ```

// Re-export core types
pub use crate::core::{DepthCamera, DepthFrame, DepthSource, Mat4, Metric, Vec4};
pub use detect::{ClusterList, DetectorConfig, ListOutcome, PointDetector, WeightedPoint};
pub use pipeline::{PipelineState, TrackerPipeline};

// Modules
pub mod calib;
pub mod cli;
pub mod config;
pub mod core;
pub mod detect;
pub mod net;
pub mod pipeline;
