//! Axis-aligned box built from six parallelogram faces.

use crate::hittable::{HitRecord, Hittable};
use crate::parallelogram::Parallelogram;
use crate::MaterialRef;
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// Axis-aligned box. All faces share one material and face outward.
#[derive(Debug, Clone, Copy)]
pub struct Cuboid {
    sides: [Parallelogram; 6],
    material: MaterialRef,
    bbox: Aabb,
}

impl Cuboid {
    /// Create the box spanned by two opposite corners.
    pub fn new(a: Vec3, b: Vec3, material: MaterialRef) -> Self {
        let min = a.min(b);
        let max = a.max(b);

        let dx = Vec3::new(max.x - min.x, 0.0, 0.0);
        let dy = Vec3::new(0.0, max.y - min.y, 0.0);
        let dz = Vec3::new(0.0, 0.0, max.z - min.z);

        let face = |q: Vec3, u: Vec3, v: Vec3| Parallelogram::new(q, u, v, material);
        let sides = [
            face(Vec3::new(min.x, min.y, max.z), dx, dy),  // front
            face(Vec3::new(max.x, min.y, max.z), -dz, dy), // right
            face(Vec3::new(max.x, min.y, min.z), -dx, dy), // back
            face(Vec3::new(min.x, min.y, min.z), dz, dy),  // left
            face(Vec3::new(min.x, max.y, max.z), dx, -dz), // top
            face(Vec3::new(min.x, min.y, min.z), dx, dz),  // bottom
        ];

        Self {
            sides,
            material,
            bbox: Aabb::from_points(min, max),
        }
    }

    pub fn material(&self) -> MaterialRef {
        self.material
    }

    pub fn sides(&self) -> &[Parallelogram; 6] {
        &self.sides
    }
}

impl Hittable for Cuboid {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let mut closest = ray_t.max;
        let mut result = None;

        for side in &self.sides {
            if let Some(rec) = side.hit(ray, Interval::new(ray_t.min, closest)) {
                closest = rec.t;
                result = Some(rec);
            }
        }

        result
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn centroid(&self) -> Vec3 {
        self.bbox.centroid()
    }
}
