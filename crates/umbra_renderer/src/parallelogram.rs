//! Parallelogram primitive, also used as an area light.

use crate::hittable::{HitRecord, Hittable};
use crate::sampling::gen_f32;
use crate::MaterialRef;
use rand::RngCore;
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// Denominator magnitude below which the ray is treated as parallel.
const PARALLEL_EPSILON: f32 = 1e-8;

/// Planar quad spanned by corner `q` and edges `u`, `v`.
#[derive(Debug, Clone, Copy)]
pub struct Parallelogram {
    q: Vec3,
    u: Vec3,
    v: Vec3,
    /// n / (n . n), used to recover the in-plane coordinates
    w: Vec3,
    normal: Vec3,
    /// Plane constant: normal . P = d
    d: f32,
    area: f32,
    material: MaterialRef,
    bbox: Aabb,
}

impl Parallelogram {
    /// Create a parallelogram. The front face is the side `u × v` points to.
    ///
    /// Degenerate edges produce a zero-area shape that is never hit.
    pub fn new(q: Vec3, u: Vec3, v: Vec3, material: MaterialRef) -> Self {
        let n = u.cross(v);
        let n_dot_n = n.length_squared();

        let (normal, w, area) = if n_dot_n > f32::EPSILON * f32::EPSILON {
            (n.normalize(), n / n_dot_n, n_dot_n.sqrt())
        } else {
            (Vec3::ZERO, Vec3::ZERO, 0.0)
        };

        let diagonal0 = Aabb::from_points(q, q + u + v);
        let diagonal1 = Aabb::from_points(q + u, q + v);

        Self {
            q,
            u,
            v,
            w,
            normal,
            d: normal.dot(q),
            area,
            material,
            bbox: Aabb::surrounding(&diagonal0, &diagonal1),
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn area(&self) -> f32 {
        self.area
    }

    pub fn material(&self) -> MaterialRef {
        self.material
    }

    /// Point sampled uniformly over the surface.
    pub fn random_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.q + gen_f32(rng) * self.u + gen_f32(rng) * self.v
    }

    /// Unnormalized direction from `origin` to a uniform surface point.
    pub fn random_direction(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        self.random_point(rng) - origin
    }

    /// Solid-angle density of [`Parallelogram::random_direction`] along
    /// `direction`, or zero when the ray misses.
    pub fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        let ray = Ray::new(origin, direction, 0.0);
        let Some(rec) = self.hit(&ray, Interval::new(0.001, f32::INFINITY)) else {
            return 0.0;
        };

        let length_squared = direction.length_squared();
        let distance_squared = rec.t * rec.t * length_squared;
        let cosine = (direction.dot(rec.normal) / length_squared.sqrt()).abs();

        distance_squared / (cosine * self.area)
    }
}

impl Hittable for Parallelogram {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let denom = self.normal.dot(ray.direction());

        // Parallel to the plane, or no plane at all
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = (self.d - self.normal.dot(ray.origin())) / denom;
        if !ray_t.contains(t) {
            return None;
        }

        let intersection = ray.at(t);
        let planar = intersection - self.q;
        let alpha = self.w.dot(planar.cross(self.v));
        let beta = self.w.dot(self.u.cross(planar));

        if !(0.0..=1.0).contains(&alpha) || !(0.0..=1.0).contains(&beta) {
            return None;
        }

        let mut rec = HitRecord {
            t,
            p: intersection,
            material: self.material,
            u: alpha,
            v: beta,
            ..HitRecord::default()
        };
        rec.set_face_normal(ray, self.normal);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn centroid(&self) -> Vec3 {
        self.q + 0.5 * (self.u + self.v)
    }
}
