//! TOML-backed tracker configuration
//!
//! Every pipeline gets its own explicit configuration; nothing here is
//! process-global, so several pipelines with independent tuning can coexist
//! in one process.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::calib::io::{SINGLE_CAMERA_FILE, TWO_CAMERA_FILE};
use crate::detect::detector::DetectorConfig;
use crate::pipeline::FUSION_TOLERANCE;

/// Full tracker configuration as loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// Detection tuning block.
    pub detector: DetectorConfig,
    /// Cross-camera fusion tolerance in millimetres.
    pub fusion_tolerance: f32,
    /// Calibration file consumed at startup. Unset means the per-mode
    /// default name.
    pub calibration_file: Option<PathBuf>,
    /// Use a second camera fused through the calibrated extrinsic.
    pub two_cameras: bool,
    /// UDP destinations for position packets, `host:port`.
    pub destinations: Vec<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            fusion_tolerance: FUSION_TOLERANCE,
            calibration_file: None,
            two_cameras: false,
            destinations: vec!["127.0.0.1:5005".to_string()],
        }
    }
}

impl TrackerConfig {
    /// Calibration file to read, falling back to the camera-mode default
    /// name when no explicit path was configured.
    pub fn calibration_path(&self) -> PathBuf {
        match &self.calibration_file {
            Some(path) => path.clone(),
            None if self.two_cameras => PathBuf::from(TWO_CAMERA_FILE),
            None => PathBuf::from(SINGLE_CAMERA_FILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_live_tuning() {
        let config = TrackerConfig::default();
        assert_eq!(config.detector.iterations, 4000);
        assert_eq!(config.detector.depth_offset, 280.0);
        assert_eq!(config.fusion_tolerance, 200.0);
        assert!(!config.two_cameras);
        assert_eq!(config.calibration_file, None);
    }

    #[test]
    fn calibration_path_follows_camera_mode() {
        let mut config = TrackerConfig::default();
        assert_eq!(config.calibration_path(), PathBuf::from(SINGLE_CAMERA_FILE));

        config.two_cameras = true;
        assert_eq!(config.calibration_path(), PathBuf::from(TWO_CAMERA_FILE));

        config.calibration_file = Some(PathBuf::from("lab.cal"));
        assert_eq!(config.calibration_path(), PathBuf::from("lab.cal"));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: TrackerConfig = toml::from_str(
            r#"
            two_cameras = true

            [detector]
            iterations = 8000
            "#,
        )
        .unwrap();
        assert!(config.two_cameras);
        assert_eq!(config.detector.iterations, 8000);
        assert_eq!(config.detector.min_depth, 400);
        assert_eq!(config.fusion_tolerance, 200.0);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<TrackerConfig, _> = toml::from_str("kalman = true");
        assert!(result.is_err());
    }
}
