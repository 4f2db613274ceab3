//! 4x4 matrix algebra for camera extrinsics
//!
//! The matrices involved are always 4x4, so inversion is done in closed form
//! via cofactor expansion instead of pulling in a linear-algebra dependency.
//! Singularity is reported as an error, never papered over with a fallback.

use thiserror::Error;

use crate::core::vec::Vec4;

/// Inversion failed because the determinant is zero.
///
/// During calibration this means the reference points were degenerate
/// (collinear or coplanar) and must be recaptured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("matrix is singular, cannot invert")]
pub struct SingularMatrix;

/// A 4x4 transform, 16 values in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [f32; 16],
}

impl Mat4 {
    /// The identity transform.
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Build a matrix from raw row-major values.
    pub fn from_rows(m: [f32; 16]) -> Self {
        Self { m }
    }

    /// Build a matrix with the four points as its columns.
    ///
    /// Used during calibration to assemble a camera's observed reference
    /// frame before solving for the extrinsic transform.
    pub fn from_points(points: &[Vec4; 4]) -> Self {
        let mut m = [0.0; 16];
        for (i, p) in points.iter().enumerate() {
            m[i] = p.x;
            m[i + 4] = p.y;
            m[i + 8] = p.z;
            m[i + 12] = p.w;
        }
        Self { m }
    }

    /// Rotation around the Z axis composed with a translation.
    pub fn translation_rotation_z(x: f32, y: f32, z: f32, angle: f32) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self {
            m: [
                c, -s, 0.0, x, //
                s, c, 0.0, y, //
                0.0, 0.0, 1.0, z, //
                0.0, 0.0, 0.0, 1.0,
            ],
        }
    }

    /// Row-by-column matrix product `self * other`. Not commutative.
    pub fn multiply(&self, other: &Mat4) -> Mat4 {
        let mut m = [0.0; 16];
        for j in 0..4 {
            for i in 0..4 {
                let mut acc = 0.0;
                for k in 0..4 {
                    acc += self.m[k + j * 4] * other.m[i + k * 4];
                }
                m[i + j * 4] = acc;
            }
        }
        Mat4 { m }
    }

    /// Apply this transform to a homogeneous point.
    ///
    /// Each output component is the dot product of `v` with one matrix row.
    /// The result is not renormalized by `w`.
    pub fn transform(&self, v: &Vec4) -> Vec4 {
        Vec4 {
            x: v.x * self.m[0] + v.y * self.m[1] + v.z * self.m[2] + v.w * self.m[3],
            y: v.x * self.m[4] + v.y * self.m[5] + v.z * self.m[6] + v.w * self.m[7],
            z: v.x * self.m[8] + v.y * self.m[9] + v.z * self.m[10] + v.w * self.m[11],
            w: v.x * self.m[12] + v.y * self.m[13] + v.z * self.m[14] + v.w * self.m[15],
        }
    }

    /// Signed 3x3 minor determinant with row `y` and column `x` removed.
    pub fn cofactor(&self, x: usize, y: usize) -> f32 {
        let mut sub = [0.0f32; 9];
        let mut l = 0;
        for j in 0..4 {
            if j == y {
                continue;
            }
            let mut k = 0;
            for i in 0..4 {
                if i != x {
                    sub[k + 3 * l] = self.m[i + j * 4];
                    k += 1;
                }
            }
            l += 1;
        }
        sub[0] * sub[4] * sub[8] + sub[1] * sub[5] * sub[6] + sub[2] * sub[3] * sub[7]
            - sub[2] * sub[4] * sub[6]
            - sub[1] * sub[3] * sub[8]
            - sub[0] * sub[5] * sub[7]
    }

    /// Closed-form inverse via the adjugate.
    ///
    /// The determinant is accumulated along the first row while the adjugate
    /// is filled in; a determinant of exactly zero reports [`SingularMatrix`].
    pub fn invert(&self) -> Result<Mat4, SingularMatrix> {
        let mut inv = [0.0f32; 16];
        let mut det = 0.0f32;
        for i in 0..4 {
            for j in 0..4 {
                let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
                inv[j + 4 * i] = sign * self.cofactor(i, j);
            }
            det += self.m[i] * inv[4 * i];
        }
        if det == 0.0 {
            return Err(SingularMatrix);
        }
        for value in inv.iter_mut() {
            *value /= det;
        }
        Ok(Mat4 { m: inv })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &Mat4, b: &Mat4, tol: f32) {
        for i in 0..16 {
            assert!(
                (a.m[i] - b.m[i]).abs() < tol,
                "element {} differs: {} vs {}",
                i,
                a.m[i],
                b.m[i]
            );
        }
    }

    #[test]
    fn identity_is_multiplicative_neutral() {
        let m = Mat4::translation_rotation_z(120.0, -45.0, 300.0, 0.7);
        assert_close(&m.multiply(&Mat4::IDENTITY), &m, 1e-6);
        assert_close(&Mat4::IDENTITY.multiply(&m), &m, 1e-6);
    }

    #[test]
    fn multiply_is_not_commutative() {
        let a = Mat4::translation_rotation_z(100.0, 0.0, 0.0, 0.5);
        let b = Mat4::translation_rotation_z(0.0, 200.0, 0.0, -0.3);
        let ab = a.multiply(&b);
        let ba = b.multiply(&a);
        assert!(ab.m.iter().zip(ba.m.iter()).any(|(x, y)| (x - y).abs() > 1e-3));
    }

    #[test]
    fn inverse_round_trips_to_identity() {
        let m = Mat4::translation_rotation_z(512.0, -830.0, 150.0, 1.2);
        let inv = m.invert().unwrap();
        assert_close(&m.multiply(&inv), &Mat4::IDENTITY, 1e-3);
        assert_close(&inv.multiply(&m), &Mat4::IDENTITY, 1e-3);
    }

    #[test]
    fn inverse_of_general_matrix_round_trips() {
        let m = Mat4::from_rows([
            2.0, 1.0, 0.0, 3.0, //
            0.0, 1.0, 4.0, -1.0, //
            5.0, 0.0, 1.0, 2.0, //
            1.0, -2.0, 0.0, 1.0,
        ]);
        let inv = m.invert().unwrap();
        assert_close(&m.multiply(&inv), &Mat4::IDENTITY, 1e-3);
    }

    #[test]
    fn collinear_points_make_a_singular_matrix() {
        let points = [
            Vec4::point(0.0, 0.0, 0.0),
            Vec4::point(1.0, 0.0, 0.0),
            Vec4::point(2.0, 0.0, 0.0),
            Vec4::point(3.0, 0.0, 0.0),
        ];
        let m = Mat4::from_points(&points);
        assert_eq!(m.invert(), Err(SingularMatrix));
    }

    #[test]
    fn transform_applies_translation_to_points() {
        let m = Mat4::translation_rotation_z(10.0, 20.0, 30.0, 0.0);
        let p = m.transform(&Vec4::point(1.0, 2.0, 3.0));
        assert_eq!(p.x, 11.0);
        assert_eq!(p.y, 22.0);
        assert_eq!(p.z, 33.0);
        assert_eq!(p.w, 1.0);
    }

    #[test]
    fn from_points_places_points_as_columns() {
        let points = [
            Vec4::point(1.0, 5.0, 9.0),
            Vec4::point(2.0, 6.0, 10.0),
            Vec4::point(3.0, 7.0, 11.0),
            Vec4::point(4.0, 8.0, 12.0),
        ];
        let m = Mat4::from_points(&points);
        assert_eq!(m.m[0], 1.0);
        assert_eq!(m.m[4], 5.0);
        assert_eq!(m.m[8], 9.0);
        assert_eq!(m.m[12], 1.0);
        assert_eq!(m.m[3], 4.0);
        assert_eq!(m.m[15], 1.0);
    }
}
