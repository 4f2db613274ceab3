//! Stochastic depth-to-point detector
//!
//! Turns a raw depth frame into a small set of weighted 3D candidate points
//! by sampling random pixels, gating them by depth and height, and feeding
//! the survivors into a cluster list.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::core::camera::{DepthFrame, FRAME_PIXELS, FRAME_WIDTH};
use crate::core::vec::{Metric, Vec4};
use crate::detect::cluster::ClusterList;

/// Detection tuning, passed in explicitly so pipelines in the same process
/// can run with independent settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Random pixel samples per frame. Larger counts trade CPU for recall.
    pub iterations: u32,
    /// Lower depth gate in millimetres, filters the sensor noise floor.
    pub min_depth: u16,
    /// Upper depth gate in millimetres, filters readings past max range.
    pub max_depth: u16,
    /// Added to every raw depth reading before projection, compensating the
    /// sensor-specific origin offset.
    pub depth_offset: f32,
    /// Lower height gate in millimetres (environment floor).
    pub min_z: f32,
    /// Upper height gate in millimetres (environment ceiling).
    pub max_z: f32,
    /// Distance under which a sample merges into an existing cluster.
    pub fuse_tolerance: f32,
}

impl Default for DetectorConfig {
    /// Live-loop settings.
    fn default() -> Self {
        Self {
            iterations: 4000,
            min_depth: 400,
            max_depth: 6000,
            depth_offset: 280.0,
            min_z: -600.0,
            max_z: 1000.0,
            fuse_tolerance: 300.0,
        }
    }
}

impl DetectorConfig {
    /// Offline calibration settings: far more samples for precision and the
    /// calibration-specific depth offset.
    pub fn calibration() -> Self {
        Self {
            iterations: 200_000,
            depth_offset: 50.0,
            min_z: -1000.0,
            max_z: 1000.0,
            ..Self::default()
        }
    }

    /// Replace the height gates, typically with calibrated bounds.
    pub fn with_height_bounds(mut self, min_z: f32, max_z: f32) -> Self {
        self.min_z = min_z;
        self.max_z = max_z;
        self
    }
}

/// Randomized point detector over dense depth frames.
pub struct PointDetector {
    config: DetectorConfig,
    rng: StdRng,
}

impl PointDetector {
    /// Detector with a randomly seeded RNG, for production use.
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Detector with a fixed seed; identical frame and seed produce an
    /// identical cluster list.
    pub fn from_seed(config: DetectorConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Populate `list` with weighted candidate points from `frame`.
    ///
    /// The list is reset first; up to `iterations` random pixels are gated
    /// by `[min_depth, max_depth]`, projected, gated by `[min_z, max_z]`,
    /// and fused into the list with weight 1. A full list is tolerated, the
    /// remaining samples simply cannot open new clusters.
    pub fn detect(&mut self, frame: &DepthFrame, list: &mut ClusterList, metric: Metric) {
        list.reset();
        for _ in 0..self.config.iterations {
            let index = self.rng.gen_range(0..FRAME_PIXELS);
            let depth = frame.depth_at(index);
            if depth <= self.config.min_depth || depth >= self.config.max_depth {
                continue;
            }
            let xs = (index % FRAME_WIDTH) as f32;
            let ys = (index / FRAME_WIDTH) as f32;
            let point =
                Vec4::from_depth_pixel(xs, ys, depth as f32, self.config.depth_offset);
            if point.z <= self.config.min_z || point.z >= self.config.max_z {
                continue;
            }
            list.add_or_fuse(point, 1, self.config.fuse_tolerance, metric);
        }
    }
}
