use crate::{Mat4, Vec3};

/// A ray in 3D space with origin, direction, and time.
///
/// `P(t) = origin + t * direction`. The direction is not required to be
/// unit length; `t` is always measured in multiples of it. `time` selects the
/// instant inside the camera shutter and drives sphere motion blur.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub time: f32,
}

impl Ray {
    /// Create a new ray.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, time: f32) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Get the point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Map this ray through an affine matrix.
    ///
    /// The origin is transformed as a point (w = 1) and the direction as a
    /// vector (w = 0), so translation only moves the origin. The direction is
    /// left unnormalized to keep `t` identical in both spaces.
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
            self.time,
        )
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::X,
            time: 0.0,
        }
    }
}
