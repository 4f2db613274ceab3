//! Acquisition and transmission loop
//!
//! Per tick: acquire a fresh frame per camera, detect candidate points, map
//! secondary observations into the primary frame, fuse and simplify, then
//! transmit the heaviest point. Cluster lists are rebuilt from zero every
//! tick; the only cross-tick state is the cameras' extrinsics and the
//! configured bounds.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use crate::core::camera::{AcquisitionError, DepthCamera, DepthSource};
use crate::core::vec::Metric;
use crate::detect::cluster::{ClusterList, ListOutcome, WeightedPoint};
use crate::detect::detector::{DetectorConfig, PointDetector};
use crate::net::packet::Packet;
use crate::net::sender::PacketSink;

/// Default cross-camera fusion tolerance in millimetres.
pub const FUSION_TOLERANCE: f32 = 200.0;

/// Lifecycle of the tracking loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopped,
}

/// Unrecoverable pipeline failure. The loop exits rather than degrade:
/// continuing with a dead sensor produces meaningless detections.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("acquisition failed for camera {camera}: {source}")]
    Acquisition {
        camera: u32,
        source: AcquisitionError,
    },
    #[error("packet transmission failed: {0}")]
    Send(#[from] io::Error),
}

/// Single-target tracking pipeline over one or two depth cameras.
pub struct TrackerPipeline {
    primary: DepthCamera,
    secondary: Option<DepthCamera>,
    detector: PointDetector,
    fusion_tolerance: f32,
    primary_list: ClusterList,
    secondary_list: ClusterList,
    state: PipelineState,
    cancel: Arc<AtomicBool>,
}

impl TrackerPipeline {
    pub fn new(
        primary: DepthCamera,
        secondary: Option<DepthCamera>,
        config: DetectorConfig,
        fusion_tolerance: f32,
    ) -> Self {
        Self {
            primary,
            secondary,
            detector: PointDetector::new(config),
            fusion_tolerance,
            primary_list: ClusterList::new(),
            secondary_list: ClusterList::new(),
            state: PipelineState::Idle,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pipeline with a seeded detector, for reproducible runs.
    pub fn from_seed(
        primary: DepthCamera,
        secondary: Option<DepthCamera>,
        config: DetectorConfig,
        fusion_tolerance: f32,
        seed: u64,
    ) -> Self {
        Self {
            primary,
            secondary,
            detector: PointDetector::from_seed(config, seed),
            fusion_tolerance,
            primary_list: ClusterList::new(),
            secondary_list: ClusterList::new(),
            state: PipelineState::Idle,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Shared cancellation flag.
    ///
    /// The watcher task sets it exactly once and never resets it; the loop
    /// polls it at tick boundaries only, so an in-flight acquisition is not
    /// interrupted and one extra tick after cancellation is acceptable.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run until cancelled or an unrecoverable error occurs.
    pub fn run<S: DepthSource, K: PacketSink>(
        &mut self,
        source: &mut S,
        sink: &mut K,
    ) -> Result<(), PipelineError> {
        self.state = PipelineState::Running;
        info!("tracking loop started");
        let result = loop {
            if self.cancel.load(Ordering::Relaxed) {
                info!("cancellation observed, stopping");
                break Ok(());
            }
            match self.tick(source, sink) {
                Ok(_) => {}
                Err(err) => break Err(err),
            }
        };
        self.state = PipelineState::Stopped;
        result
    }

    /// One acquisition/detection/transmission cycle.
    ///
    /// Returns the transmitted point, or `None` when nothing was detected
    /// this tick (not an error).
    pub fn tick<S: DepthSource, K: PacketSink>(
        &mut self,
        source: &mut S,
        sink: &mut K,
    ) -> Result<Option<WeightedPoint>, PipelineError> {
        let camera = self.primary.id;
        let frame = self
            .primary
            .update(source)
            .map_err(|source| PipelineError::Acquisition { camera, source })?;
        self.detector
            .detect(frame, &mut self.primary_list, Metric::Full);

        if let Some(secondary) = self.secondary.as_mut() {
            let camera = secondary.id;
            let frame = secondary
                .update(source)
                .map_err(|source| PipelineError::Acquisition { camera, source })?;
            self.detector
                .detect(frame, &mut self.secondary_list, Metric::Full);

            // Map secondary observations into the primary frame before
            // fusing the lists.
            self.secondary_list.transform(&secondary.extrinsic);
            let outcome =
                self.primary_list
                    .fuse(&self.secondary_list, self.fusion_tolerance, Metric::Full);
            if outcome == ListOutcome::Full {
                warn!("cluster list overflow during fusion, result is partial");
            }
        }
        self.primary_list
            .simplify(self.fusion_tolerance, Metric::Full);

        let best = match self.primary_list.heaviest() {
            Some(best) => *best,
            None => {
                debug!("no detection this tick");
                return Ok(None);
            }
        };
        sink.send(&Packet::position(&best.point))?;
        debug!(
            "sent ({:.0}, {:.0}, {:.0}) weight {}",
            best.point.x, best.point.y, best.point.z, best.weight
        );
        Ok(Some(best))
    }
}
