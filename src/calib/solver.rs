//! Bounds refinement and the 4-point extrinsic solve

use log::{debug, info};

use crate::calib::{CalibrationError, CalibrationRecord};
use crate::core::camera::{DepthCamera, DepthSource};
use crate::core::matrix::Mat4;
use crate::core::vec::{Metric, Vec4};
use crate::detect::cluster::ClusterList;
use crate::detect::detector::{DetectorConfig, PointDetector};

/// Safety margin applied inward to both height bounds, in millimetres.
pub const BOUNDS_MARGIN: i32 = 100;

/// Synthetic fourth reference point is this far above the first, extending
/// the planar 3-point correspondence to a full-rank 4x4 solve.
const SYNTHETIC_POINT_RISE: f32 = 1000.0;

/// Usable height range of the environment.
///
/// Starts wide open and is narrowed by [`DepthBounds::refine`] as floor and
/// ceiling observations come in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthBounds {
    pub floor: i32,
    pub ceiling: i32,
}

impl Default for DepthBounds {
    fn default() -> Self {
        Self {
            floor: -1000,
            ceiling: 1000,
        }
    }
}

impl DepthBounds {
    /// Pull the bounds inward from an environment scan's clusters.
    ///
    /// Non-negative cluster heights lower the ceiling, negative ones raise
    /// the floor. Repeated scans keep narrowing the same bounds.
    pub fn refine(&mut self, scan: &ClusterList) {
        for entry in scan.iter() {
            let z = entry.point.z;
            if z >= 0.0 {
                if (z as i32) < self.ceiling {
                    self.ceiling = z as i32;
                }
            } else if (z as i32) > self.floor {
                self.floor = z as i32;
            }
        }
    }

    /// Shrink both bounds inward by [`BOUNDS_MARGIN`].
    pub fn apply_margin(&mut self) {
        self.floor += BOUNDS_MARGIN;
        self.ceiling -= BOUNDS_MARGIN;
    }
}

/// One camera's observations of the three marker placements.
#[derive(Debug, Clone, Copy)]
pub struct MarkerSet {
    points: [Vec4; 3],
}

impl MarkerSet {
    pub fn new(points: [Vec4; 3]) -> Self {
        Self { points }
    }

    /// Expand to the four reference points used by the solve.
    ///
    /// The physical setup assumes all markers share the first placement's
    /// apparent height plane, so placements 2 and 3 get their z forced to
    /// placement 1's. The fourth point is fabricated straight above the
    /// first, spanning the remaining spatial dimension.
    fn reference_points(&self) -> [Vec4; 4] {
        let p0 = self.points[0];
        let mut p1 = self.points[1];
        let mut p2 = self.points[2];
        p1.z = p0.z;
        p2.z = p0.z;
        let p3 = Vec4::new(p0.x, p0.y, p0.z + SYNTHETIC_POINT_RISE, p0.w);
        [p0, p1, p2, p3]
    }
}

/// Solve for the transform mapping secondary-camera points into the primary
/// camera's frame.
///
/// Each marker set becomes a 4x4 matrix with its reference points as
/// columns; the extrinsic is `primary * inverse(secondary)`. A singular
/// secondary matrix (collinear or otherwise degenerate placements) fails the
/// attempt outright.
pub fn solve_extrinsic(
    primary: &MarkerSet,
    secondary: &MarkerSet,
) -> Result<Mat4, CalibrationError> {
    let m_primary = Mat4::from_points(&primary.reference_points());
    let m_secondary = Mat4::from_points(&secondary.reference_points());
    let inverse = m_secondary.invert()?;
    Ok(m_primary.multiply(&inverse))
}

/// Non-interactive two-camera calibration over a depth source.
///
/// Consumes frames in a fixed order: one environment scan per camera, then
/// for each of the three marker placements one frame per camera. The
/// operator-driven capture/retry flow sits outside this function.
pub fn calibrate_two_cameras<S: DepthSource>(
    source: &mut S,
    primary: &mut DepthCamera,
    secondary: &mut DepthCamera,
) -> Result<CalibrationRecord, CalibrationError> {
    let config = DetectorConfig::calibration();
    let mut detector = PointDetector::new(config);
    let mut list = ClusterList::new();

    // Phase 1: environment bounds from both cameras' scans.
    let mut bounds = DepthBounds::default();
    for camera in [&mut *primary, &mut *secondary] {
        let frame = camera.update(source)?;
        detector.detect(frame, &mut list, Metric::Height);
        bounds.refine(&list);
    }
    bounds.apply_margin();
    info!(
        "environment bounds: floor {} mm, ceiling {} mm",
        bounds.floor, bounds.ceiling
    );

    // Phase 2: marker correspondence, heaviest cluster per camera per
    // placement under the planar metric.
    let mut primary_points = [Vec4::point(0.0, 0.0, 0.0); 3];
    let mut secondary_points = [Vec4::point(0.0, 0.0, 0.0); 3];
    for placement in 0..3 {
        for (camera, points) in [
            (&mut *primary, &mut primary_points),
            (&mut *secondary, &mut secondary_points),
        ] {
            let frame = camera.update(source)?;
            detector.detect(frame, &mut list, Metric::Planar);
            let best = list.heaviest().ok_or(CalibrationError::NoMarker {
                camera: camera.id,
                placement,
            })?;
            points[placement] = best.point;
            debug!(
                "camera {} placement {}: ({:.1}, {:.1}, {:.1}) weight {}",
                camera.id, placement, best.point.x, best.point.y, best.point.z, best.weight
            );
        }
    }

    // Phase 3: assemble and solve.
    let extrinsic = solve_extrinsic(
        &MarkerSet::new(primary_points),
        &MarkerSet::new(secondary_points),
    )?;

    Ok(CalibrationRecord {
        z_floor: bounds.floor,
        z_ceiling: bounds.ceiling,
        extrinsic,
    })
}

/// Single-camera calibration: environment bounds only, no transform.
pub fn calibrate_single_camera<S: DepthSource>(
    source: &mut S,
    camera: &mut DepthCamera,
) -> Result<DepthBounds, CalibrationError> {
    let mut detector = PointDetector::new(DetectorConfig::calibration());
    let mut list = ClusterList::new();
    let mut bounds = DepthBounds::default();

    let frame = camera.update(source)?;
    detector.detect(frame, &mut list, Metric::Height);
    bounds.refine(&list);
    bounds.apply_margin();
    info!(
        "environment bounds: floor {} mm, ceiling {} mm",
        bounds.floor, bounds.ceiling
    );
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_narrow_toward_observations() {
        let mut bounds = DepthBounds::default();
        let mut scan = ClusterList::new();
        scan.add_or_fuse(Vec4::point(0.0, 2000.0, 800.0), 5, 1.0, Metric::Height);
        scan.add_or_fuse(Vec4::point(0.0, 2000.0, -700.0), 5, 1.0, Metric::Height);
        scan.add_or_fuse(Vec4::point(0.0, 2000.0, 900.0), 5, 1.0, Metric::Height);
        bounds.refine(&scan);
        assert_eq!(bounds.ceiling, 800);
        assert_eq!(bounds.floor, -700);

        bounds.apply_margin();
        assert_eq!(bounds.ceiling, 700);
        assert_eq!(bounds.floor, -600);
    }

    #[test]
    fn bounds_ignore_observations_outside_current_range() {
        let mut bounds = DepthBounds::default();
        let mut scan = ClusterList::new();
        scan.add_or_fuse(Vec4::point(0.0, 0.0, 500.0), 1, 1.0, Metric::Height);
        bounds.refine(&scan);
        assert_eq!(bounds.ceiling, 500);

        // A higher ceiling observation must not widen the range again.
        let mut second = ClusterList::new();
        second.add_or_fuse(Vec4::point(0.0, 0.0, 900.0), 1, 1.0, Metric::Height);
        bounds.refine(&second);
        assert_eq!(bounds.ceiling, 500);
    }

    #[test]
    fn solve_recovers_a_known_rigid_offset() {
        // Secondary camera sees the same markers shifted by a rigid motion.
        let motion = Mat4::translation_rotation_z(400.0, -250.0, 120.0, 0.35);
        let primary_points = [
            Vec4::point(100.0, 2000.0, -50.0),
            Vec4::point(900.0, 2400.0, -50.0),
            Vec4::point(300.0, 3100.0, -50.0),
        ];
        let secondary_points = [
            motion.transform(&primary_points[0]),
            motion.transform(&primary_points[1]),
            motion.transform(&primary_points[2]),
        ];

        let extrinsic = solve_extrinsic(
            &MarkerSet::new(primary_points),
            &MarkerSet::new(secondary_points),
        )
        .unwrap();

        // The extrinsic must map secondary observations back onto the
        // primary frame.
        for (p, s) in primary_points.iter().zip(secondary_points.iter()) {
            let mapped = extrinsic.transform(s);
            assert!((mapped.x - p.x).abs() < 1.0);
            assert!((mapped.y - p.y).abs() < 1.0);
            assert!((mapped.z - p.z).abs() < 1.0);
        }
    }

    #[test]
    fn degenerate_markers_fail_the_solve() {
        // Collinear placements give a rank-deficient reference matrix.
        let collinear = MarkerSet::new([
            Vec4::point(0.0, 0.0, 0.0),
            Vec4::point(100.0, 0.0, 0.0),
            Vec4::point(200.0, 0.0, 0.0),
        ]);
        let good = MarkerSet::new([
            Vec4::point(100.0, 2000.0, -50.0),
            Vec4::point(900.0, 2400.0, -50.0),
            Vec4::point(300.0, 3100.0, -50.0),
        ]);
        let result = solve_extrinsic(&good, &collinear);
        assert!(matches!(result, Err(CalibrationError::Degenerate(_))));
    }
}
