//! Surface materials.
//!
//! Materials are plain data stored by kind in [`Materials`] and addressed by
//! [`MaterialRef`]. The integrator matches on the kind and calls the
//! kind-specific operation directly.

use crate::hittable::HitRecord;
use crate::sampling::{gen_f32, random_in_unit_sphere};
use rand::RngCore;
use umbra_math::{Ray, Vec3};
use std::f32::consts::PI;

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// Which material array a [`MaterialRef`] points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialKind {
    #[default]
    Rough,
    Metal,
    Dielectric,
    DiffuseLight,
}

/// Handle to a material stored in [`Materials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialRef {
    pub kind: MaterialKind,
    pub index: usize,
}

impl MaterialRef {
    #[inline]
    pub const fn new(kind: MaterialKind, index: usize) -> Self {
        Self { kind, index }
    }
}

impl std::fmt::Display for MaterialRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.kind, self.index)
    }
}

/// Lambertian (diffuse) material.
///
/// Scattering is driven by the integrator's mixture PDF, so the material only
/// exposes its BRDF and the cosine term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rough {
    albedo: Color,
}

impl Rough {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }

    pub fn albedo(&self) -> Color {
        self.albedo
    }

    /// Lambertian BRDF, constant over the hemisphere.
    #[inline]
    pub fn brdf(&self) -> Color {
        self.albedo / PI
    }

    /// Cosine between the surface normal and a scattered direction, clamped
    /// to zero below the surface.
    #[inline]
    pub fn cos_theta(&self, normal: Vec3, direction: Vec3) -> f32 {
        normal.dot(direction.normalize_or_zero()).max(0.0)
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metal {
    albedo: Color,
    fuzz: f32,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fn new(albedo: Color, fuzz: f32) -> Self {
        Self {
            albedo,
            fuzz: fuzz.clamp(0.0, 1.0),
        }
    }

    pub fn albedo(&self) -> Color {
        self.albedo
    }

    pub fn fuzz(&self) -> f32 {
        self.fuzz
    }

    /// Reflect the incoming ray about the normal.
    ///
    /// Returns `None` when the fuzzed direction ends up below the surface and
    /// the ray is absorbed.
    pub fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<Ray> {
        let reflected = reflect(ray_in.direction().normalize(), rec.normal);
        let direction =
            (reflected + self.fuzz * random_in_unit_sphere(rng)).normalize_or_zero();

        if direction.dot(rec.normal) > 0.0 {
            Some(Ray::new(rec.p, direction, ray_in.time()))
        } else {
            None
        }
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dielectric {
    /// Index of refraction
    ior: f32,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    pub fn new(ior: f32) -> Self {
        Self { ior }
    }

    pub fn ior(&self) -> f32 {
        self.ior
    }

    /// Schlick's approximation for reflectance
    fn reflectance(cosine: f32, refraction_ratio: f32) -> f32 {
        let r0 = ((1.0 - refraction_ratio) / (1.0 + refraction_ratio)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }

    /// Reflect or refract the incoming ray. Attenuation is always white.
    pub fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Ray {
        let refraction_ratio = if rec.front_face {
            1.0 / self.ior
        } else {
            self.ior
        };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

        // Total internal reflection
        let cannot_refract = refraction_ratio * sin_theta > 1.0;

        let direction = if cannot_refract
            || Self::reflectance(cos_theta, refraction_ratio) > gen_f32(rng)
        {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, refraction_ratio)
        };

        Ray::new(rec.p, direction, ray_in.time())
    }
}

/// Diffuse light emitter. Emits from the front face only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffuseLight {
    emit: Color,
}

impl DiffuseLight {
    /// Create a new diffuse light with the given emission color.
    pub fn new(emit: Color) -> Self {
        Self { emit }
    }

    pub fn emitted(&self, front_face: bool) -> Color {
        if front_face {
            self.emit
        } else {
            Color::ZERO
        }
    }
}

/// Material arrays, one per kind.
#[derive(Debug, Clone, Default)]
pub struct Materials {
    pub rough: Vec<Rough>,
    pub metal: Vec<Metal>,
    pub dielectric: Vec<Dielectric>,
    pub lights: Vec<DiffuseLight>,
}

impl Materials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rough(&mut self, material: Rough) -> MaterialRef {
        self.rough.push(material);
        MaterialRef::new(MaterialKind::Rough, self.rough.len() - 1)
    }

    pub fn add_metal(&mut self, material: Metal) -> MaterialRef {
        self.metal.push(material);
        MaterialRef::new(MaterialKind::Metal, self.metal.len() - 1)
    }

    pub fn add_dielectric(&mut self, material: Dielectric) -> MaterialRef {
        self.dielectric.push(material);
        MaterialRef::new(MaterialKind::Dielectric, self.dielectric.len() - 1)
    }

    pub fn add_light(&mut self, material: DiffuseLight) -> MaterialRef {
        self.lights.push(material);
        MaterialRef::new(MaterialKind::DiffuseLight, self.lights.len() - 1)
    }

    /// True if `material` points at an existing entry.
    pub fn contains(&self, material: MaterialRef) -> bool {
        let len = match material.kind {
            MaterialKind::Rough => self.rough.len(),
            MaterialKind::Metal => self.metal.len(),
            MaterialKind::Dielectric => self.dielectric.len(),
            MaterialKind::DiffuseLight => self.lights.len(),
        };
        material.index < len
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Mirror `v` about the normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Snell refraction of the unit vector `uv` through a surface with normal `n`.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hit_at_origin(normal: Vec3, front_face: bool) -> HitRecord {
        HitRecord {
            normal,
            front_face,
            ..HitRecord::default()
        }
    }

    #[test]
    fn test_reflect() {
        let v = Vec3::new(1.0, -1.0, 0.0);
        let r = reflect(v, Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_refract_straight_through() {
        let r = refract(-Vec3::Y, Vec3::Y, 1.0 / 1.5);
        assert!((r - (-Vec3::Y)).length() < 1e-5);
    }

    #[test]
    fn test_rough_brdf_and_cosine() {
        let rough = Rough::new(Color::new(0.5, 0.25, 1.0));
        assert!((rough.brdf() - Color::new(0.5, 0.25, 1.0) / PI).length() < 1e-6);

        assert!((rough.cos_theta(Vec3::Z, Vec3::new(0.0, 0.0, 3.0)) - 1.0).abs() < 1e-6);
        assert_eq!(rough.cos_theta(Vec3::Z, Vec3::new(0.0, 0.0, -1.0)), 0.0);
    }

    #[test]
    fn test_metal_fuzz_clamped() {
        assert_eq!(Metal::new(Color::ONE, 3.0).fuzz(), 1.0);
        assert_eq!(Metal::new(Color::ONE, -1.0).fuzz(), 0.0);
    }

    #[test]
    fn test_perfect_mirror_reflects() {
        let metal = Metal::new(Color::ONE, 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), 0.0);

        let scattered = metal
            .scatter(&ray, &hit_at_origin(Vec3::Y, true), &mut rng)
            .expect("mirror should not absorb");
        assert!((scattered.direction() - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-5);
    }

    #[test]
    fn test_metal_grazing_fuzz_can_absorb() {
        let metal = Metal::new(Color::ONE, 1.0);
        let mut rng = StdRng::seed_from_u64(9);
        // Nearly tangent incoming ray: heavy fuzz pushes many reflections below the surface
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, -0.01, 0.0), 0.0);
        let rec = hit_at_origin(Vec3::Y, true);

        let absorbed = (0..200)
            .filter(|_| metal.scatter(&ray, &rec, &mut rng).is_none())
            .count();
        assert!(absorbed > 0);
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let glass = Dielectric::new(1.5);
        let mut rng = StdRng::seed_from_u64(2);
        // Inside the glass, hitting the surface at a grazing angle
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.2, 0.0), 0.0);
        let rec = hit_at_origin(-Vec3::Y, false);

        for _ in 0..16 {
            let out = glass.scatter(&ray, &rec, &mut rng);
            // Reflection keeps the ray on the inside
            assert!(out.direction().y < 0.0);
        }
    }

    #[test]
    fn test_light_emits_front_face_only() {
        let light = DiffuseLight::new(Color::splat(4.0));
        assert_eq!(light.emitted(true), Color::splat(4.0));
        assert_eq!(light.emitted(false), Color::ZERO);
    }

    #[test]
    fn test_materials_refs() {
        let mut materials = Materials::new();
        let a = materials.add_rough(Rough::new(Color::ONE));
        let b = materials.add_metal(Metal::new(Color::ONE, 0.1));
        let c = materials.add_rough(Rough::new(Color::ZERO));

        assert_eq!(a, MaterialRef::new(MaterialKind::Rough, 0));
        assert_eq!(b, MaterialRef::new(MaterialKind::Metal, 0));
        assert_eq!(c, MaterialRef::new(MaterialKind::Rough, 1));
        assert!(materials.contains(c));
        assert!(!materials.contains(MaterialRef::new(MaterialKind::Dielectric, 0)));
    }
}
