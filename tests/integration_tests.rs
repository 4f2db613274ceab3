//! End-to-end scenarios crossing module boundaries.

use depthtrack::calib::{solve_extrinsic, MarkerSet};
use depthtrack::{ClusterList, Mat4, Metric, Vec4};

/// Two cameras observe the same scene separated by a known rigid motion.
/// After solving the extrinsic from marker correspondences and applying it
/// to the secondary observations, matching points must fuse into single
/// clusters instead of doubling up.
#[test]
fn solved_extrinsic_collapses_cross_camera_duplicates() {
    let motion = Mat4::translation_rotation_z(600.0, -300.0, 80.0, 0.25);

    // Marker placements seen by both cameras.
    let primary_markers = [
        Vec4::point(-200.0, 1800.0, -40.0),
        Vec4::point(700.0, 2500.0, -40.0),
        Vec4::point(-100.0, 3200.0, -40.0),
    ];
    let secondary_markers = [
        motion.transform(&primary_markers[0]),
        motion.transform(&primary_markers[1]),
        motion.transform(&primary_markers[2]),
    ];
    let extrinsic = solve_extrinsic(
        &MarkerSet::new(primary_markers),
        &MarkerSet::new(secondary_markers),
    )
    .unwrap();

    // Live detections of one target, as each camera sees it.
    let target = Vec4::point(150.0, 2400.0, 120.0);
    let mut primary_list = ClusterList::new();
    primary_list.add_or_fuse(target, 12, 300.0, Metric::Full);

    let mut secondary_list = ClusterList::new();
    secondary_list.add_or_fuse(motion.transform(&target), 9, 300.0, Metric::Full);

    secondary_list.transform(&extrinsic);
    primary_list.fuse(&secondary_list, 200.0, Metric::Full);
    primary_list.simplify(200.0, Metric::Full);

    assert_eq!(primary_list.len(), 1);
    let fused = primary_list.heaviest().unwrap();
    assert_eq!(fused.weight, 21);
    assert!((fused.point.x - target.x).abs() < 10.0);
    assert!((fused.point.y - target.y).abs() < 10.0);
    assert!((fused.point.z - target.z).abs() < 10.0);
}

/// Without the extrinsic applied, the same two observations stay apart.
#[test]
fn unaligned_cameras_leave_two_clusters() {
    let motion = Mat4::translation_rotation_z(600.0, -300.0, 80.0, 0.25);
    let target = Vec4::point(150.0, 2400.0, 120.0);

    let mut primary_list = ClusterList::new();
    primary_list.add_or_fuse(target, 12, 300.0, Metric::Full);

    let mut secondary_list = ClusterList::new();
    secondary_list.add_or_fuse(motion.transform(&target), 9, 300.0, Metric::Full);

    primary_list.fuse(&secondary_list, 200.0, Metric::Full);
    primary_list.simplify(200.0, Metric::Full);
    assert_eq!(primary_list.len(), 2);
}
