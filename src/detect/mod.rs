//! Point detection and cluster fusion

pub mod cluster;
pub mod detector;

pub use cluster::{ClusterList, ListOutcome, WeightedPoint, MAX_CLUSTERS};
pub use detector::{DetectorConfig, PointDetector};
