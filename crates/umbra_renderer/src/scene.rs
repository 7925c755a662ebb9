//! Scene description and the immutable world built from it.

use crate::bvh::Bvh;
use crate::geometry::Geometry;
use crate::hittable::{HitRecord, PrimitiveKind, PrimitiveRef};
use crate::material::{MaterialRef, Materials};
use crate::pdf::{HittablePdf, MAX_MIXTURE_COMPONENTS};
use rand::RngCore;
use std::time::Instant;
use thiserror::Error;
use umbra_math::{Interval, Ray};

/// Errors that can occur while assembling a scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Primitive {primitive} references missing material {material}")]
    InvalidMaterial {
        primitive: PrimitiveRef,
        material: MaterialRef,
    },

    #[error("Invalid primitive reference: {0}")]
    InvalidPrimitive(PrimitiveRef),

    #[error("Transform cannot wrap another transform: {0}")]
    NestedTransform(PrimitiveRef),

    #[error("Transform matrix for {0} is not invertible")]
    SingularTransform(PrimitiveRef),
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Everything needed to build a [`World`]: primitives, materials and the
/// primitives to sample as lights.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub geometry: Geometry,
    pub materials: Materials,
    pub lights: Vec<PrimitiveRef>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a primitive for direct light sampling.
    pub fn add_light(&mut self, light: PrimitiveRef) {
        self.lights.push(light);
    }
}

/// A validated scene with its BVH. Immutable and shared across render threads.
#[derive(Debug, Clone)]
pub struct World {
    geometry: Geometry,
    materials: Materials,
    lights: Vec<PrimitiveRef>,
    bvh: Bvh,
}

impl World {
    /// Validate `scene` and build its acceleration structure.
    ///
    /// Lights that cannot be direct-sampled are dropped with a warning, as are
    /// any beyond the mixture capacity.
    pub fn build(scene: Scene, rng: &mut dyn RngCore) -> SceneResult<Self> {
        let start = Instant::now();
        let Scene {
            geometry,
            materials,
            lights,
        } = scene;

        validate_materials(&geometry, &materials)?;
        validate_transforms(&geometry)?;
        let lights = select_lights(&geometry, lights)?;

        let primitive_count = geometry.primitive_count();
        if primitive_count == 0 {
            log::warn!("Scene is empty; only the background will be rendered");
        }

        let bvh = Bvh::build(&geometry, rng);

        log::info!(
            "World built: {} primitives, {} lights in {:.2?}",
            primitive_count,
            lights.len(),
            start.elapsed()
        );

        Ok(Self {
            geometry,
            materials,
            lights,
            bvh,
        })
    }

    /// Closest hit in `ray_t`.
    #[inline]
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        self.bvh.hit(&self.geometry, ray, ray_t)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn materials(&self) -> &Materials {
        &self.materials
    }

    /// Primitives sampled by the integrator's mixture PDF.
    pub fn lights(&self) -> &[PrimitiveRef] {
        &self.lights
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }
}

fn validate_materials(geometry: &Geometry, materials: &Materials) -> SceneResult<()> {
    let spheres = geometry.spheres.iter().map(|s| s.material());
    let triangles = geometry.triangles.iter().map(|t| t.material());
    let parallelograms = geometry.parallelograms.iter().map(|p| p.material());
    let cuboids = geometry.cuboids.iter().map(|c| c.material());

    let tagged = spheres
        .enumerate()
        .map(|(i, m)| (PrimitiveRef::new(PrimitiveKind::Sphere, i), m))
        .chain(
            triangles
                .enumerate()
                .map(|(i, m)| (PrimitiveRef::new(PrimitiveKind::Triangle, i), m)),
        )
        .chain(
            parallelograms
                .enumerate()
                .map(|(i, m)| (PrimitiveRef::new(PrimitiveKind::Parallelogram, i), m)),
        )
        .chain(
            cuboids
                .enumerate()
                .map(|(i, m)| (PrimitiveRef::new(PrimitiveKind::Cuboid, i), m)),
        );

    for (primitive, material) in tagged {
        if !materials.contains(material) {
            return Err(SceneError::InvalidMaterial {
                primitive,
                material,
            });
        }
    }
    Ok(())
}

fn validate_transforms(geometry: &Geometry) -> SceneResult<()> {
    for transform in &geometry.transforms {
        let target = transform.target();
        if target.kind == PrimitiveKind::Transform {
            return Err(SceneError::NestedTransform(target));
        }
        if !geometry.contains(target) {
            return Err(SceneError::InvalidPrimitive(target));
        }
    }
    Ok(())
}

fn select_lights(geometry: &Geometry, lights: Vec<PrimitiveRef>) -> SceneResult<Vec<PrimitiveRef>> {
    let hidden = geometry.transform_targets();
    let mut selected = Vec::with_capacity(lights.len());

    for light in lights {
        if !geometry.contains(light) {
            return Err(SceneError::InvalidPrimitive(light));
        }
        if !HittablePdf::supports(light.kind) {
            log::warn!("Light {} cannot be sampled directly; dropping it from the light list", light);
            continue;
        }
        if hidden.contains(&light) {
            log::warn!("Light {} is only placed through a transform; dropping it from the light list", light);
            continue;
        }
        selected.push(light);
    }

    // One slot is reserved for the cosine lobe
    let max_lights = MAX_MIXTURE_COMPONENTS - 1;
    if selected.len() > max_lights {
        log::warn!(
            "{} lights exceed the sampling limit; only the first {} are sampled",
            selected.len(),
            max_lights
        );
        selected.truncate(max_lights);
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Color, DiffuseLight, MaterialKind, Parallelogram, Rough, Sphere, Triangle,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use umbra_math::{Mat4, Vec3};

    fn lit_scene() -> Scene {
        let mut scene = Scene::new();
        let white = scene.materials.add_rough(Rough::new(Color::splat(0.7)));
        let lamp = scene.materials.add_light(DiffuseLight::new(Color::splat(5.0)));

        scene.geometry.add_sphere(Sphere::new(Vec3::ZERO, 1.0, white));
        let quad = scene.geometry.add_parallelogram(Parallelogram::new(
            Vec3::new(-1.0, 3.0, -1.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
            lamp,
        ));
        scene.add_light(quad);
        scene
    }

    #[test]
    fn test_world_build_and_hit() {
        let world = World::build(lit_scene(), &mut StdRng::seed_from_u64(0)).expect("valid scene");
        assert_eq!(world.lights().len(), 1);
        assert_eq!(world.bvh().len(), 3);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0), 0.0);
        let rec = world
            .hit(&ray, Interval::new(0.001, f32::INFINITY))
            .expect("ray should hit the sphere");
        assert!((rec.t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_invalid_material_rejected() {
        let mut scene = lit_scene();
        let bogus = MaterialRef::new(MaterialKind::Metal, 0);
        scene.geometry.add_triangle(Triangle::new(Vec3::X, Vec3::Y, Vec3::Z, bogus));

        let err = World::build(scene, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(
            err,
            SceneError::InvalidMaterial {
                primitive: PrimitiveRef::new(PrimitiveKind::Triangle, 0),
                material: bogus,
            }
        );
    }

    #[test]
    fn test_invalid_light_rejected() {
        let mut scene = lit_scene();
        let missing = PrimitiveRef::new(PrimitiveKind::Sphere, 12);
        scene.add_light(missing);

        let err = World::build(scene, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, SceneError::InvalidPrimitive(missing));
    }

    #[test]
    fn test_unsupported_lights_dropped() {
        let mut scene = lit_scene();
        let lamp = MaterialRef::new(MaterialKind::DiffuseLight, 0);
        let tri = scene.geometry.add_triangle(Triangle::new(Vec3::X, Vec3::Y, Vec3::Z, lamp));
        scene.add_light(tri);

        let world = World::build(scene, &mut StdRng::seed_from_u64(0)).expect("valid scene");
        assert_eq!(world.lights(), &[PrimitiveRef::new(PrimitiveKind::Parallelogram, 0)]);
    }

    #[test]
    fn test_light_list_capped() {
        let mut scene = Scene::new();
        let lamp = scene.materials.add_light(DiffuseLight::new(Color::ONE));
        for i in 0..40 {
            let s = scene
                .geometry
                .add_sphere(Sphere::new(Vec3::new(i as f32 * 3.0, 0.0, 0.0), 1.0, lamp));
            scene.add_light(s);
        }

        let world = World::build(scene, &mut StdRng::seed_from_u64(0)).expect("valid scene");
        assert_eq!(world.lights().len(), MAX_MIXTURE_COMPONENTS - 1);
    }

    #[test]
    fn test_empty_world() {
        let world = World::build(Scene::new(), &mut StdRng::seed_from_u64(0)).expect("empty is fine");
        assert!(world.bvh().is_empty());
        let ray = Ray::new(Vec3::ZERO, Vec3::Z, 0.0);
        assert!(world.hit(&ray, Interval::UNIVERSE).is_none());
    }

    #[test]
    fn test_transformed_primitive_only_visible_once() {
        let mut scene = lit_scene();
        let sphere = PrimitiveRef::new(PrimitiveKind::Sphere, 0);
        scene
            .geometry
            .add_transformed(sphere, Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)))
            .expect("valid transform");

        let world = World::build(scene, &mut StdRng::seed_from_u64(0)).expect("valid scene");
        let interval = Interval::new(0.001, f32::INFINITY);

        let at_origin = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0), 0.0);
        assert!(world.hit(&at_origin, interval).is_none());

        let moved = Ray::new(Vec3::new(10.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0), 0.0);
        assert!(world.hit(&moved, interval).is_some());
    }

    #[test]
    fn test_scene_error_messages() {
        let err = SceneError::SingularTransform(PrimitiveRef::new(PrimitiveKind::Sphere, 2));
        assert_eq!(err.to_string(), "Transform matrix for Sphere[2] is not invertible");
    }
}
