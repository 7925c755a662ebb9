//! Affine transform wrapper around another primitive.
//!
//! Rays are mapped into the wrapped primitive's local space with the inverse
//! matrix, intersected there, and the hit is mapped back. The wrapped
//! primitive is resolved through [`Geometry`], so any leaf kind can be
//! transformed without a trait object.

use crate::geometry::Geometry;
use crate::hittable::{HitRecord, PrimitiveKind, PrimitiveRef};
use crate::scene::{SceneError, SceneResult};
use umbra_math::{Aabb, EulerRot, Interval, Mat4, Mat4Ext, Quat, Ray, Vec3};

/// A primitive placed in the world by a 4x4 affine matrix.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    target: PrimitiveRef,
    /// Local-to-world
    matrix: Mat4,
    /// World-to-local, used for rays
    inverse: Mat4,
    /// Used for normals
    inverse_transpose: Mat4,
    bbox: Aabb,
    centroid: Vec3,
}

impl Transform {
    /// Wrap `target` (which must already live in `geometry`) with `matrix`.
    pub fn new(geometry: &Geometry, target: PrimitiveRef, matrix: Mat4) -> SceneResult<Self> {
        if target.kind == PrimitiveKind::Transform {
            return Err(SceneError::NestedTransform(target));
        }
        if !geometry.contains(target) {
            return Err(SceneError::InvalidPrimitive(target));
        }
        if !matrix.is_invertible() {
            return Err(SceneError::SingularTransform(target));
        }

        let inverse = matrix.inverse();
        let bbox = matrix.transform_aabb(&geometry.bounding_box_of(target));
        let centroid = matrix.transform_point3(geometry.centroid_of(target));

        Ok(Self {
            target,
            matrix,
            inverse,
            inverse_transpose: inverse.transpose(),
            bbox,
            centroid,
        })
    }

    /// Build `M = T * R * S` from a scale, XYZ Euler rotation in degrees and
    /// a translation.
    pub fn from_srt(
        geometry: &Geometry,
        target: PrimitiveRef,
        scale: Vec3,
        rotation_degrees: Vec3,
        translation: Vec3,
    ) -> SceneResult<Self> {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            rotation_degrees.x.to_radians(),
            rotation_degrees.y.to_radians(),
            rotation_degrees.z.to_radians(),
        );
        let matrix = Mat4::from_scale_rotation_translation(scale, rotation, translation);
        Self::new(geometry, target, matrix)
    }

    pub fn target(&self) -> PrimitiveRef {
        self.target
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Intersect in local space and map the record back to world space.
    ///
    /// `t` and the surface UV carry over unchanged because the local ray's
    /// direction is not renormalized.
    pub fn hit(&self, geometry: &Geometry, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let local_ray = ray.transformed(&self.inverse);
        let mut rec = geometry.hit_primitive(self.target, &local_ray, ray_t)?;

        let outward = self.inverse_transpose.transform_normal3(rec.outward_normal());
        rec.p = self.matrix.transform_point3(rec.p);
        rec.set_face_normal(ray, outward);

        Some(rec)
    }
}
