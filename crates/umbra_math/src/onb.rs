use crate::Vec3;

/// Orthonormal basis (u, v, w).
///
/// Used to map hemisphere samples around a normal into world space, and to
/// express world-space normals in camera space for the denoiser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Onb {
    u: Vec3,
    v: Vec3,
    w: Vec3,
}

impl Onb {
    /// Build a basis whose `w` axis is `n` (need not be unit length).
    pub fn from_w(n: Vec3) -> Self {
        let w = n.normalize();
        // Any axis not parallel to w works as a helper
        let a = if w.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
        let v = w.cross(a).normalize();
        let u = w.cross(v);
        Self { u, v, w }
    }

    /// Build a basis from three (possibly unnormalized) orthogonal axes.
    pub fn from_axes(u: Vec3, v: Vec3, w: Vec3) -> Self {
        Self {
            u: u.normalize(),
            v: v.normalize(),
            w: w.normalize(),
        }
    }

    #[inline]
    pub fn u(&self) -> Vec3 {
        self.u
    }

    #[inline]
    pub fn v(&self) -> Vec3 {
        self.v
    }

    #[inline]
    pub fn w(&self) -> Vec3 {
        self.w
    }

    /// Local coordinates -> world vector.
    #[inline]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        local.x * self.u + local.y * self.v + local.z * self.w
    }

    /// World vector -> local coordinates (projection onto each axis).
    #[inline]
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        Vec3::new(world.dot(self.u), world.dot(self.v), world.dot(self.w))
    }
}

impl Default for Onb {
    fn default() -> Self {
        Self {
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
        }
    }
}
