//! Hittable trait, primitive handles and HitRecord for ray-object intersection.

use crate::MaterialRef;
use std::fmt;
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// Which primitive array a [`PrimitiveRef`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Sphere,
    Triangle,
    Parallelogram,
    Cuboid,
    Transform,
}

/// Handle to a primitive stored in [`crate::Geometry`].
///
/// The pair is resolved with a single `match` in
/// [`crate::Geometry::hit_primitive`], so no trait objects are needed during
/// traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveRef {
    pub kind: PrimitiveKind,
    pub index: usize,
}

impl PrimitiveRef {
    #[inline]
    pub const fn new(kind: PrimitiveKind, index: usize) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for PrimitiveRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{}]", self.kind, self.index)
    }
}

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Point of intersection
    pub p: Vec3,
    /// Surface normal at intersection (always points against ray)
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: MaterialRef,
    /// UV surface coordinates
    pub u: f32,
    pub v: f32,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Whether the ray hit the front face (outside) of the surface
    pub front_face: bool,
}

impl Default for HitRecord {
    fn default() -> Self {
        Self {
            p: Vec3::ZERO,
            normal: Vec3::ZERO,
            material: MaterialRef::default(),
            u: 0.0,
            v: 0.0,
            t: 0.0,
            front_face: false,
        }
    }
}

impl HitRecord {
    /// Set the face normal based on ray direction and outward normal.
    ///
    /// The normal is always stored pointing against the ray direction,
    /// so we need to track whether we hit the front or back face.
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        // If the ray and normal point in the same direction, we're inside
        self.front_face = ray.direction().dot(outward_normal) < 0.0;

        // Normal always points against the ray
        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }

    /// The geometric normal pointing out of the surface, regardless of which
    /// side the ray arrived from.
    #[inline]
    pub fn outward_normal(&self) -> Vec3 {
        if self.front_face {
            self.normal
        } else {
            -self.normal
        }
    }
}

/// Trait for leaf primitives that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Test if a ray hits this object within the given interval.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord>;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;

    /// Point used to sort the primitive during BVH construction.
    fn centroid(&self) -> Vec3 {
        self.bounding_box().centroid()
    }
}
