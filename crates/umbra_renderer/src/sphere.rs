//! Sphere primitive for ray tracing.

use crate::hittable::{HitRecord, Hittable};
use crate::sampling::random_to_sphere;
use crate::MaterialRef;
use rand::RngCore;
use std::f32::consts::PI;
use umbra_math::{Aabb, Interval, Onb, Ray, Vec3};

/// A sphere primitive, optionally moving linearly over the shutter interval.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    /// Center at time 0 plus motion per unit time
    center: Ray,
    radius: f32,
    material: MaterialRef,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new stationary sphere.
    pub fn new(center: Vec3, radius: f32, material: MaterialRef) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = Aabb::from_points(center - rvec, center + rvec);

        Self {
            center: Ray::new(center, Vec3::ZERO, 0.0),
            radius,
            material,
            bbox,
        }
    }

    /// Create a sphere that moves from `center0` at time 0 to `center1` at time 1.
    pub fn moving(center0: Vec3, center1: Vec3, radius: f32, material: MaterialRef) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let box0 = Aabb::from_points(center0 - rvec, center0 + rvec);
        let box1 = Aabb::from_points(center1 - rvec, center1 + rvec);

        Self {
            center: Ray::new(center0, center1 - center0, 0.0),
            radius,
            material,
            bbox: Aabb::surrounding(&box0, &box1),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> MaterialRef {
        self.material
    }

    /// Center of the sphere at the given time.
    #[inline]
    pub fn center_at(&self, time: f32) -> Vec3 {
        self.center.at(time)
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn get_sphere_uv(p: Vec3) -> (f32, f32) {
        // theta: angle down from +Y, phi: angle around Y from -X
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        (phi / (2.0 * PI), theta / PI)
    }

    /// Direction from `origin` toward a point sampled uniformly inside the
    /// cone the sphere subtends.
    pub fn random_direction(&self, origin: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let direction = self.center_at(0.0) - origin;
        let distance_squared = direction.length_squared();
        let uvw = Onb::from_w(direction);
        uvw.to_world(random_to_sphere(rng, self.radius, distance_squared))
    }

    /// Solid-angle density of [`Sphere::random_direction`] along `direction`.
    ///
    /// Zero when the ray misses or when `origin` lies inside the sphere.
    pub fn pdf_value(&self, origin: Vec3, direction: Vec3) -> f32 {
        let ray = Ray::new(origin, direction, 0.0);
        if self.hit(&ray, Interval::new(0.001, f32::INFINITY)).is_none() {
            return 0.0;
        }

        let distance_squared = (self.center_at(0.0) - origin).length_squared();
        let ratio = self.radius * self.radius / distance_squared;
        if ratio >= 1.0 {
            return 0.0;
        }

        let cos_theta_max = (1.0 - ratio).sqrt();
        let solid_angle = 2.0 * PI * (1.0 - cos_theta_max);
        1.0 / solid_angle
    }
}

impl Hittable for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        // A point sphere has no surface normal
        if self.radius <= 0.0 {
            return None;
        }

        let current_center = self.center_at(ray.time());
        let oc = current_center - ray.origin();
        let a = ray.direction().length_squared();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = (h - sqrtd) / a;
        if !ray_t.surrounds(root) {
            root = (h + sqrtd) / a;
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let mut rec = HitRecord {
            t: root,
            p: ray.at(root),
            material: self.material,
            ..HitRecord::default()
        };
        let outward_normal = (rec.p - current_center) / self.radius;
        rec.set_face_normal(ray, outward_normal);
        (rec.u, rec.v) = Self::get_sphere_uv(outward_normal);

        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn centroid(&self) -> Vec3 {
        self.bbox.centroid()
    }
}
