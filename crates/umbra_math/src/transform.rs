// Transform utilities for Mat4
//
// Extends glam::Mat4 with the operations the transform primitive needs.
// glam already provides transform_point3(), transform_vector3() and inverse().

use crate::Aabb;
use glam::{Mat4, Vec3};

/// Determinant magnitude below which a matrix is treated as singular.
const SINGULAR_DETERMINANT: f32 = 1e-12;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform a surface normal, treating `self` as the inverse-transpose of
    /// the object-to-world matrix. The result is renormalized; a degenerate
    /// input yields the zero vector.
    fn transform_normal3(&self, normal: Vec3) -> Vec3;

    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// True if the matrix can be inverted.
    fn is_invertible(&self) -> bool;
}

impl Mat4Ext for Mat4 {
    fn transform_normal3(&self, normal: Vec3) -> Vec3 {
        // w = 0: translation (and the projective row) must not touch normals
        self.transform_vector3(normal).normalize_or_zero()
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        let lo = aabb.min();
        let hi = aabb.max();

        let mut result_min = Vec3::splat(f32::INFINITY);
        let mut result_max = Vec3::splat(f32::NEG_INFINITY);

        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { lo.x } else { hi.x },
                if i & 2 == 0 { lo.y } else { hi.y },
                if i & 4 == 0 { lo.z } else { hi.z },
            );
            let transformed = self.transform_point3(corner);
            result_min = result_min.min(transformed);
            result_max = result_max.max(transformed);
        }

        Aabb::from_points(result_min, result_max)
    }

    fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > SINGULAR_DETERMINANT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_vector3_no_translation() {
        let mat = Mat4::from_translation(Vec3::new(10.0, 20.0, 30.0));
        let vector = Vec3::new(1.0, 0.0, 0.0);

        // Translation should NOT affect vectors (w=0)
        assert_eq!(mat.transform_vector3(vector), vector);
    }

    #[test]
    fn test_transform_normal_non_uniform_scale() {
        // Plane x + y = 0 has normal (1,1,0)/sqrt2. Scaling x by 2 turns the
        // plane into x/2 + y = 0, whose normal is (1,2,0)/sqrt5.
        let m = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let inverse_transpose = m.inverse().transpose();
        let n = inverse_transpose.transform_normal3(Vec3::new(1.0, 1.0, 0.0).normalize());

        let expected = Vec3::new(1.0, 2.0, 0.0).normalize();
        assert!((n - expected).length() < 1e-5);
    }

    #[test]
    fn test_transform_aabb_identity() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = Mat4::IDENTITY.transform_aabb(&aabb);

        assert!((transformed.min() - aabb.min()).length() < 0.001);
        assert!((transformed.max() - aabb.max()).length() < 0.001);
    }

    #[test]
    fn test_transform_aabb_translation() {
        let mat = Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0));
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = mat.transform_aabb(&aabb);

        assert!((transformed.min() - Vec3::new(5.0, 5.0, 5.0)).length() < 0.001);
        assert!((transformed.max() - Vec3::new(6.0, 6.0, 6.0)).length() < 0.001);
    }

    #[test]
    fn test_transform_aabb_rotation_grows() {
        use std::f32::consts::FRAC_PI_4;

        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let transformed = Mat4::from_rotation_y(FRAC_PI_4).transform_aabb(&aabb);

        let half_diagonal = 2.0_f32.sqrt();
        assert!((transformed.x.max - half_diagonal).abs() < 1e-4);
        assert!((transformed.y.max - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_is_invertible() {
        assert!(Mat4::IDENTITY.is_invertible());
        assert!(Mat4::from_scale(Vec3::new(1.0, 0.5, 3.0)).is_invertible());
        assert!(!Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0)).is_invertible());
    }
}
