//! Primitive storage, addressed by [`PrimitiveRef`].
//!
//! Each primitive kind lives in its own array. [`Geometry::hit_primitive`] is
//! the one place a reference is resolved back to a concrete type.

use crate::hittable::{HitRecord, Hittable, PrimitiveKind, PrimitiveRef};
use crate::scene::SceneResult;
use crate::{Cuboid, MaterialRef, Parallelogram, Sphere, Transform, Triangle};
use std::collections::HashSet;
use umbra_math::{Aabb, Interval, Mat4, Ray, Vec3};

/// All primitives of a scene, stored by kind.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub spheres: Vec<Sphere>,
    pub triangles: Vec<Triangle>,
    pub parallelograms: Vec<Parallelogram>,
    pub cuboids: Vec<Cuboid>,
    pub transforms: Vec<Transform>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sphere(&mut self, sphere: Sphere) -> PrimitiveRef {
        self.spheres.push(sphere);
        PrimitiveRef::new(PrimitiveKind::Sphere, self.spheres.len() - 1)
    }

    pub fn add_triangle(&mut self, triangle: Triangle) -> PrimitiveRef {
        self.triangles.push(triangle);
        PrimitiveRef::new(PrimitiveKind::Triangle, self.triangles.len() - 1)
    }

    pub fn add_parallelogram(&mut self, parallelogram: Parallelogram) -> PrimitiveRef {
        self.parallelograms.push(parallelogram);
        PrimitiveRef::new(PrimitiveKind::Parallelogram, self.parallelograms.len() - 1)
    }

    pub fn add_cuboid(&mut self, cuboid: Cuboid) -> PrimitiveRef {
        self.cuboids.push(cuboid);
        PrimitiveRef::new(PrimitiveKind::Cuboid, self.cuboids.len() - 1)
    }

    pub fn add_transform(&mut self, transform: Transform) -> PrimitiveRef {
        self.transforms.push(transform);
        PrimitiveRef::new(PrimitiveKind::Transform, self.transforms.len() - 1)
    }

    /// Wrap an existing primitive in a transform and store it.
    ///
    /// The wrapped primitive is then only reachable through the transform.
    pub fn add_transformed(&mut self, target: PrimitiveRef, matrix: Mat4) -> SceneResult<PrimitiveRef> {
        let transform = Transform::new(self, target, matrix)?;
        Ok(self.add_transform(transform))
    }

    /// True if `r` points at an existing primitive.
    pub fn contains(&self, r: PrimitiveRef) -> bool {
        let len = match r.kind {
            PrimitiveKind::Sphere => self.spheres.len(),
            PrimitiveKind::Triangle => self.triangles.len(),
            PrimitiveKind::Parallelogram => self.parallelograms.len(),
            PrimitiveKind::Cuboid => self.cuboids.len(),
            PrimitiveKind::Transform => self.transforms.len(),
        };
        r.index < len
    }

    /// Intersect a single primitive.
    ///
    /// # Panics
    ///
    /// If `r` does not point at an existing primitive.
    #[inline]
    pub fn hit_primitive(&self, r: PrimitiveRef, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        match r.kind {
            PrimitiveKind::Sphere => self.spheres[r.index].hit(ray, ray_t),
            PrimitiveKind::Triangle => self.triangles[r.index].hit(ray, ray_t),
            PrimitiveKind::Parallelogram => self.parallelograms[r.index].hit(ray, ray_t),
            PrimitiveKind::Cuboid => self.cuboids[r.index].hit(ray, ray_t),
            PrimitiveKind::Transform => self.transforms[r.index].hit(self, ray, ray_t),
        }
    }

    pub fn bounding_box_of(&self, r: PrimitiveRef) -> Aabb {
        match r.kind {
            PrimitiveKind::Sphere => self.spheres[r.index].bounding_box(),
            PrimitiveKind::Triangle => self.triangles[r.index].bounding_box(),
            PrimitiveKind::Parallelogram => self.parallelograms[r.index].bounding_box(),
            PrimitiveKind::Cuboid => self.cuboids[r.index].bounding_box(),
            PrimitiveKind::Transform => self.transforms[r.index].bounding_box(),
        }
    }

    pub fn centroid_of(&self, r: PrimitiveRef) -> Vec3 {
        match r.kind {
            PrimitiveKind::Sphere => self.spheres[r.index].centroid(),
            PrimitiveKind::Triangle => self.triangles[r.index].centroid(),
            PrimitiveKind::Parallelogram => self.parallelograms[r.index].centroid(),
            PrimitiveKind::Cuboid => self.cuboids[r.index].centroid(),
            PrimitiveKind::Transform => self.transforms[r.index].centroid(),
        }
    }

    /// Material of a leaf primitive. Transforms carry no material of their own.
    pub fn material_of(&self, r: PrimitiveRef) -> Option<MaterialRef> {
        match r.kind {
            PrimitiveKind::Sphere => self.spheres.get(r.index).map(Sphere::material),
            PrimitiveKind::Triangle => self.triangles.get(r.index).map(Triangle::material),
            PrimitiveKind::Parallelogram => {
                self.parallelograms.get(r.index).map(Parallelogram::material)
            }
            PrimitiveKind::Cuboid => self.cuboids.get(r.index).map(Cuboid::material),
            PrimitiveKind::Transform => None,
        }
    }

    /// Primitives wrapped by a transform.
    pub fn transform_targets(&self) -> HashSet<PrimitiveRef> {
        self.transforms.iter().map(Transform::target).collect()
    }

    /// References to every top-level primitive, in the order spheres,
    /// triangles, parallelograms, transforms, cuboids.
    ///
    /// Primitives wrapped by a transform are skipped; they are only visible
    /// at the transformed location.
    pub fn primitive_refs(&self) -> Vec<PrimitiveRef> {
        let hidden = self.transform_targets();
        let counts = [
            (PrimitiveKind::Sphere, self.spheres.len()),
            (PrimitiveKind::Triangle, self.triangles.len()),
            (PrimitiveKind::Parallelogram, self.parallelograms.len()),
            (PrimitiveKind::Transform, self.transforms.len()),
            (PrimitiveKind::Cuboid, self.cuboids.len()),
        ];

        counts
            .into_iter()
            .flat_map(|(kind, len)| (0..len).map(move |index| PrimitiveRef::new(kind, index)))
            .filter(|r| !hidden.contains(r))
            .collect()
    }

    /// Number of top-level primitives.
    pub fn primitive_count(&self) -> usize {
        self.primitive_refs().len()
    }

    /// Closest hit over every top-level primitive, without acceleration.
    pub fn hit_linear(&self, ray: &Ray, ray_t: Interval) -> Option<(PrimitiveRef, HitRecord)> {
        let mut closest = ray_t.max;
        let mut result = None;

        for r in self.primitive_refs() {
            if let Some(rec) = self.hit_primitive(r, ray, Interval::new(ray_t.min, closest)) {
                closest = rec.t;
                result = Some((r, rec));
            }
        }

        result
    }
}
