//! Bounded weighted cluster list with incremental fusion
//!
//! A list is rebuilt from scratch every detection tick; it is a derived
//! structure, never authoritative across ticks.

use crate::core::matrix::Mat4;
use crate::core::vec::{Metric, Vec4};

/// Maximum number of clusters a list can hold.
pub const MAX_CLUSTERS: usize = 16;

/// One accumulated position estimate and the number of raw samples fused
/// into it.
#[derive(Debug, Clone, Copy)]
pub struct WeightedPoint {
    pub point: Vec4,
    pub weight: u32,
}

/// Outcome of feeding points into a list, ordered by severity.
///
/// `Full` means more distinct clusters than capacity, an expected
/// tolerance-tunable condition the caller treats as information loss, not a
/// fatal error. When a multi-point operation observes several outcomes it
/// reports the most severe one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ListOutcome {
    /// Appended as a new cluster.
    Added,
    /// Merged into an existing cluster.
    Fused,
    /// No match and no free capacity; the point was dropped.
    Full,
}

/// Bounded ordered list of weighted cluster centroids.
#[derive(Debug, Clone, Default)]
pub struct ClusterList {
    entries: Vec<WeightedPoint>,
}

impl ClusterList {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MAX_CLUSTERS),
        }
    }

    /// Number of clusters currently held. Always `<= MAX_CLUSTERS`.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all clusters.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightedPoint> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&WeightedPoint> {
        self.entries.get(index)
    }

    /// Add a point, fusing it into the first cluster within `tolerance`.
    ///
    /// Fusion is a weighted running mean: the centroid moves to
    /// `(old*w_old + point*weight) / (w_old + weight)` and the weights sum.
    /// The result is order-dependent but convergent under repeated close
    /// observations. With no match and no free slot the point is dropped
    /// and `Full` is reported.
    pub fn add_or_fuse(
        &mut self,
        point: Vec4,
        weight: u32,
        tolerance: f32,
        metric: Metric,
    ) -> ListOutcome {
        for entry in self.entries.iter_mut() {
            if metric.distance(&point, &entry.point) < tolerance {
                merge_into(entry, &point, weight);
                return ListOutcome::Fused;
            }
        }
        if self.entries.len() < MAX_CLUSTERS {
            self.entries.push(WeightedPoint {
                point,
                weight: weight.max(1),
            });
            ListOutcome::Added
        } else {
            ListOutcome::Full
        }
    }

    /// Fuse every cluster of `other` into this list, carrying each cluster's
    /// accumulated weight.
    ///
    /// Overflow is sticky: remaining entries are still attempted after a
    /// `Full`, and the most severe outcome observed across the whole call is
    /// reported at the end.
    pub fn fuse(&mut self, other: &ClusterList, tolerance: f32, metric: Metric) -> ListOutcome {
        let mut worst = ListOutcome::Added;
        for entry in other.iter() {
            let outcome = self.add_or_fuse(entry.point, entry.weight, tolerance, metric);
            worst = worst.max(outcome);
        }
        worst
    }

    /// Merge all pairs of clusters within `tolerance` until a fixed point.
    ///
    /// A single pass merges the pair in place, compacts the list by shifting
    /// later entries down, and re-examines the same index, since the fused
    /// centroid may now be close to a later cluster. Passes repeat until one
    /// makes no merge; a single pass is not enough for convergence.
    pub fn simplify(&mut self, tolerance: f32, metric: Metric) {
        loop {
            if !self.simplify_pass(tolerance, metric) {
                break;
            }
        }
    }

    fn simplify_pass(&mut self, tolerance: f32, metric: Metric) -> bool {
        let mut merged = false;
        let mut i = 0;
        while i < self.entries.len() {
            let mut j = i + 1;
            while j < self.entries.len() {
                if metric.distance(&self.entries[i].point, &self.entries[j].point) < tolerance {
                    let absorbed = self.entries[j];
                    merge_into(&mut self.entries[i], &absorbed.point, absorbed.weight);
                    // Shift-removal keeps order and leaves index j pointing
                    // at the next unexamined cluster.
                    self.entries.remove(j);
                    merged = true;
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
        merged
    }

    /// Apply a transform to every cluster centroid in place.
    ///
    /// Used to map a secondary camera's observations into the primary frame
    /// before cross-camera fusion. Weights are untouched.
    pub fn transform(&mut self, matrix: &Mat4) {
        for entry in self.entries.iter_mut() {
            entry.point = matrix.transform(&entry.point);
        }
    }

    /// The cluster with the highest weight; first occurrence wins ties.
    pub fn heaviest(&self) -> Option<&WeightedPoint> {
        let mut best: Option<&WeightedPoint> = None;
        for entry in self.entries.iter() {
            match best {
                Some(b) if entry.weight <= b.weight => {}
                _ => best = Some(entry),
            }
        }
        best
    }
}

/// Weighted running-mean merge of `point` into `entry`.
fn merge_into(entry: &mut WeightedPoint, point: &Vec4, weight: u32) {
    let old_w = entry.weight as f32;
    let new_w = weight as f32;
    entry.weight += weight;
    let total = entry.weight as f32;
    entry.point.x = (entry.point.x * old_w + point.x * new_w) / total;
    entry.point.y = (entry.point.y * old_w + point.y * new_w) / total;
    entry.point.z = (entry.point.z * old_w + point.z * new_w) / total;
}
