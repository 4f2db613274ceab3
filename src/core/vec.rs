//! Homogeneous vectors and distance metrics

/// Horizontal angular scale, small-angle linearization of the sensor's
/// field of view around the image center (radians per pixel, roughly
/// `tan(0.001554434)` per pixel).
pub const ANGULAR_SCALE_X: f32 = 0.001_696_736_56;

/// Vertical angular scale, same linearization as [`ANGULAR_SCALE_X`].
pub const ANGULAR_SCALE_Z: f32 = 0.001_641_293_65;

/// Horizontal image center in pixels.
const CENTER_X: f32 = 320.0;

/// Vertical image center in pixels.
const CENTER_Y: f32 = 240.0;

/// A homogeneous 3D point or direction.
///
/// Points carry `w = 1`; the pipeline never renormalizes by `w` after a
/// transform, matching the affine transforms it works with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    /// Create a vector from explicit components.
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Create a homogeneous point (`w = 1`).
    pub fn point(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, w: 1.0 }
    }

    /// Project a depth pixel to a camera-relative 3D point.
    ///
    /// `xs`/`ys` are pixel coordinates, `depth` the raw millimetre reading.
    /// `depth_offset` compensates the sensor-specific origin offset before
    /// projection. `y` points away from the sensor, `z` up, `x` right.
    pub fn from_depth_pixel(xs: f32, ys: f32, depth: f32, depth_offset: f32) -> Self {
        let depth = depth + depth_offset;
        Self {
            x: depth * (xs - CENTER_X) * ANGULAR_SCALE_X,
            y: depth,
            z: depth * (CENTER_Y - ys) * ANGULAR_SCALE_Z,
            w: 1.0,
        }
    }
}

/// Distance metric selector for detection and clustering.
///
/// Calibration groups points by planar position or height alone, while live
/// detection compares full 3D positions, so the metric is injected into every
/// clustering call rather than fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Euclidean distance over (x, y) only.
    Planar,
    /// Euclidean distance over (x, y, z).
    Full,
    /// Absolute difference of z.
    Height,
}

impl Metric {
    /// Distance between two points under this metric.
    pub fn distance(self, a: &Vec4, b: &Vec4) -> f32 {
        match self {
            Metric::Planar => {
                let dx = a.x - b.x;
                let dy = a.y - b.y;
                (dx * dx + dy * dy).sqrt()
            }
            Metric::Full => {
                let dx = a.x - b.x;
                let dy = a.y - b.y;
                let dz = a.z - b.z;
                (dx * dx + dy * dy + dz * dz).sqrt()
            }
            Metric::Height => (a.z - b.z).abs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_pixel_projects_onto_depth_axis() {
        let v = Vec4::from_depth_pixel(320.0, 240.0, 2000.0, 280.0);
        assert_eq!(v.x, 0.0);
        assert_eq!(v.z, 0.0);
        assert_eq!(v.y, 2280.0);
        assert_eq!(v.w, 1.0);
    }

    #[test]
    fn projection_applies_depth_offset() {
        let a = Vec4::from_depth_pixel(400.0, 240.0, 2000.0, 0.0);
        let b = Vec4::from_depth_pixel(400.0, 240.0, 2000.0, 280.0);
        assert!(b.x > a.x);
        assert_eq!(b.y - a.y, 280.0);
    }

    #[test]
    fn planar_metric_ignores_height() {
        let a = Vec4::point(0.0, 0.0, 0.0);
        let b = Vec4::point(3.0, 4.0, 1000.0);
        assert_eq!(Metric::Planar.distance(&a, &b), 5.0);
    }

    #[test]
    fn full_metric_includes_height() {
        let a = Vec4::point(0.0, 0.0, 0.0);
        let b = Vec4::point(2.0, 3.0, 6.0);
        assert_eq!(Metric::Full.distance(&a, &b), 7.0);
    }

    #[test]
    fn height_metric_is_symmetric() {
        let a = Vec4::point(10.0, 20.0, -150.0);
        let b = Vec4::point(-5.0, 3.0, 250.0);
        assert_eq!(Metric::Height.distance(&a, &b), 400.0);
        assert_eq!(Metric::Height.distance(&b, &a), 400.0);
    }
}
