//! Path integrator.
//!
//! Paths are traced iteratively with a running throughput. Diffuse bounces
//! sample a mixture of the cosine lobe and every light; metal and glass
//! follow their single scattered direction.

use crate::camera::Camera;
use crate::material::{Color, MaterialKind};
use crate::pdf::{CosinePdf, HittablePdf, MixturePdf, Pdf, PdfComponent};
use crate::scene::World;
use rand::RngCore;
use umbra_math::{near_zero, Interval, Ray, Vec3};

/// Lower bound of the hit interval, to avoid self-intersection.
pub const T_MIN: f32 = 0.001;

/// Denoiser side channel for one camera sample: albedo and camera-space
/// normal of the first non-emissive surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SampleAov {
    pub albedo: Color,
    pub normal: Vec3,
    pub recorded: bool,
}

impl SampleAov {
    fn record(&mut self, albedo: Color, world_normal: Vec3, camera: &Camera) {
        if self.recorded {
            return;
        }
        self.albedo = albedo;
        self.normal = camera.basis().to_local(world_normal);
        self.recorded = true;
    }
}

/// Averaged result for one pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PixelSample {
    /// Mean linear radiance
    pub color: Color,
    /// Mean first-hit albedo
    pub albedo: Color,
    /// Normalized sum of camera-space first-hit normals (zero if nothing was hit)
    pub normal: Vec3,
}

/// Estimate the radiance arriving along `ray`.
///
/// `scratch` is reset at every diffuse bounce so one allocation serves the
/// whole path. Paths that run out of bounces return their throughput as is.
pub fn ray_color<'a>(
    ray: &Ray,
    world: &'a World,
    camera: &Camera,
    scratch: &mut MixturePdf<'a>,
    aov: &mut SampleAov,
    rng: &mut dyn RngCore,
) -> Color {
    let materials = world.materials();
    let mut ray = *ray;
    let mut throughput = Color::ONE;

    for _ in 0..camera.max_depth {
        let Some(rec) = world.hit(&ray, Interval::new(T_MIN, f32::INFINITY)) else {
            return throughput * camera.background;
        };

        let index = rec.material.index;
        match rec.material.kind {
            MaterialKind::DiffuseLight => {
                return throughput * materials.lights[index].emitted(rec.front_face);
            }
            MaterialKind::Rough => {
                let rough = &materials.rough[index];

                scratch.clear();
                scratch.push(PdfComponent::Cosine(CosinePdf::new(rec.normal)));
                for &light in world.lights() {
                    scratch.push(PdfComponent::Hittable(HittablePdf::new(
                        world.geometry(),
                        light,
                        rec.p,
                    )));
                }

                // Light samplers may return unnormalized directions
                let direction = scratch.generate(rng).normalize_or_zero();
                let pdf = scratch.value(direction);
                if direction == Vec3::ZERO || !pdf.is_finite() || near_zero(pdf) {
                    return Color::ZERO;
                }

                throughput *= rough.brdf() * rough.cos_theta(rec.normal, direction) / pdf;
                aov.record(rough.albedo(), rec.normal, camera);
                ray = Ray::new(rec.p, direction, ray.time());
            }
            MaterialKind::Metal => {
                let metal = &materials.metal[index];
                match metal.scatter(&ray, &rec, rng) {
                    Some(scattered) => {
                        aov.record(metal.albedo(), rec.normal, camera);
                        throughput *= metal.albedo();
                        ray = scattered;
                    }
                    None => return throughput,
                }
            }
            MaterialKind::Dielectric => {
                aov.record(Color::ONE, rec.normal, camera);
                ray = materials.dielectric[index].scatter(&ray, &rec, rng);
            }
        }
    }

    throughput
}

/// Trace every stratified sample of pixel (i, j) and average the results.
pub fn render_pixel(world: &World, camera: &Camera, i: u32, j: u32, rng: &mut dyn RngCore) -> PixelSample {
    let mut scratch = MixturePdf::new();
    let mut color = Color::ZERO;
    let mut albedo = Color::ZERO;
    let mut normal = Vec3::ZERO;

    let sqrt_spp = camera.sqrt_spp();
    for s_j in 0..sqrt_spp {
        for s_i in 0..sqrt_spp {
            let ray = camera.get_ray(i, j, s_i, s_j, rng);
            let mut aov = SampleAov::default();
            color += ray_color(&ray, world, camera, &mut scratch, &mut aov, rng);
            albedo += aov.albedo;
            normal += aov.normal;
        }
    }

    let scale = 1.0 / (sqrt_spp * sqrt_spp) as f32;
    PixelSample {
        color: color * scale,
        albedo: albedo * scale,
        normal: normal.normalize_or_zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use crate::{Dielectric, DiffuseLight, Metal, Parallelogram, Rough, Sphere};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn camera_looking_down_z(background: Color, max_depth: u32) -> Camera {
        let mut camera = Camera::new()
            .with_resolution(16, 16)
            .with_samples(1)
            .with_max_depth(max_depth)
            .with_position(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
            .with_lens(30.0, 0.0, 5.0)
            .with_background(background);
        camera.initialize();
        camera
    }

    fn build(scene: Scene) -> World {
        World::build(scene, &mut StdRng::seed_from_u64(0)).expect("valid scene")
    }

    fn trace(world: &World, camera: &Camera, ray: Ray, seed: u64) -> (Color, SampleAov) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut scratch = MixturePdf::new();
        let mut aov = SampleAov::default();
        let color = ray_color(&ray, world, camera, &mut scratch, &mut aov, &mut rng);
        (color, aov)
    }

    #[test]
    fn test_miss_returns_background() {
        let world = build(Scene::new());
        let background = Color::new(0.2, 0.4, 0.8);
        let camera = camera_looking_down_z(background, 10);

        let (color, aov) = trace(&world, &camera, Ray::new(Vec3::ZERO, Vec3::Z, 0.0), 1);
        assert_eq!(color, background);
        assert!(!aov.recorded);
    }

    #[test]
    fn test_light_front_and_back() {
        let mut scene = Scene::new();
        let lamp = scene.materials.add_light(DiffuseLight::new(Color::splat(3.0)));
        // Faces +Z, toward the camera
        scene.geometry.add_parallelogram(Parallelogram::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            lamp,
        ));
        let world = build(scene);
        let camera = camera_looking_down_z(Color::ZERO, 10);

        let front = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z, 0.0);
        assert_eq!(trace(&world, &camera, front, 1).0, Color::splat(3.0));

        let back = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 0.0);
        assert_eq!(trace(&world, &camera, back, 1).0, Color::ZERO);
    }

    #[test]
    fn test_depth_exhaustion_returns_throughput() {
        let mut scene = Scene::new();
        let glass = scene.materials.add_dielectric(Dielectric::new(1.5));
        scene.geometry.add_sphere(Sphere::new(Vec3::ZERO, 1.0, glass));
        let world = build(scene);

        // Glass never changes throughput, so one bounce then truncation yields white
        let camera = camera_looking_down_z(Color::ZERO, 1);
        let (color, aov) = trace(&world, &camera, Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z, 0.0), 2);
        assert_eq!(color, Color::ONE);
        assert!(aov.recorded);
        assert_eq!(aov.albedo, Color::ONE);
    }

    #[test]
    fn test_zero_depth_returns_white() {
        let world = build(Scene::new());
        let camera = camera_looking_down_z(Color::splat(0.5), 0);
        let (color, _) = trace(&world, &camera, Ray::new(Vec3::ZERO, Vec3::Z, 0.0), 3);
        assert_eq!(color, Color::ONE);
    }

    #[test]
    fn test_mirror_reflects_background() {
        let mut scene = Scene::new();
        let mirror = scene.materials.add_metal(Metal::new(Color::new(0.9, 0.8, 0.7), 0.0));
        scene.geometry.add_parallelogram(Parallelogram::new(
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            mirror,
        ));
        let world = build(scene);
        let background = Color::splat(0.5);
        let camera = camera_looking_down_z(background, 10);

        let (color, aov) = trace(&world, &camera, Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z, 0.0), 4);
        assert!((color - Color::new(0.9, 0.8, 0.7) * background).length() < 1e-5);
        assert_eq!(aov.albedo, Color::new(0.9, 0.8, 0.7));
        // Facing the camera: camera-space normal is +w
        assert!((aov.normal - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_diffuse_ambient_occlusion_converges() {
        // A closed-off half space: one diffuse floor under a uniform sky.
        // Every bounce off the floor escapes, so the estimate is C * albedo.
        let mut scene = Scene::new();
        let albedo = Color::new(0.5, 0.6, 0.7);
        let floor = scene.materials.add_rough(Rough::new(albedo));
        scene.geometry.add_parallelogram(Parallelogram::new(
            Vec3::new(-1000.0, 0.0, 1000.0),
            Vec3::new(2000.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -2000.0),
            floor,
        ));
        let world = build(scene);
        let background = Color::new(1.0, 0.8, 0.6);
        let camera = camera_looking_down_z(background, 8);

        let mut rng = StdRng::seed_from_u64(77);
        let mut scratch = MixturePdf::new();
        let n = 20_000;
        let mut sum = Color::ZERO;
        for _ in 0..n {
            let mut aov = SampleAov::default();
            let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, 0.0);
            sum += ray_color(&ray, &world, &camera, &mut scratch, &mut aov, &mut rng);
        }
        let estimate = sum / n as f32;
        let expected = background * albedo;
        assert!((estimate - expected).length() < 0.02, "estimate = {estimate}");
    }

    #[test]
    fn test_diffuse_inside_sphere_converges_to_albedo_power() {
        // Inside a closed diffuse sphere with no lights, every path bounces
        // until depth runs out: the result is albedo^depth exactly in expectation.
        let mut scene = Scene::new();
        let albedo = Color::splat(0.8);
        let wall = scene.materials.add_rough(Rough::new(albedo));
        scene.geometry.add_sphere(Sphere::new(Vec3::ZERO, 10.0, wall));
        let world = build(scene);
        let depth = 4;
        let camera = camera_looking_down_z(Color::ONE, depth);

        let mut rng = StdRng::seed_from_u64(78);
        let mut scratch = MixturePdf::new();
        let n = 4_000;
        let mut sum = Color::ZERO;
        for _ in 0..n {
            let mut aov = SampleAov::default();
            let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.0);
            sum += ray_color(&ray, &world, &camera, &mut scratch, &mut aov, &mut rng);
        }
        let estimate = sum / n as f32;
        let expected = albedo.powf(depth as f32);
        assert!((estimate - expected).length() < 1e-3, "estimate = {estimate}");
    }

    #[test]
    fn test_render_pixel_aovs() {
        let mut scene = Scene::new();
        let grey = scene.materials.add_rough(Rough::new(Color::splat(0.5)));
        scene.geometry.add_sphere(Sphere::new(Vec3::ZERO, 1.0, grey));
        let world = build(scene);

        let mut camera = Camera::new()
            .with_resolution(9, 9)
            .with_samples(4)
            .with_max_depth(5)
            .with_position(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y)
            .with_lens(30.0, 0.0, 5.0)
            .with_background(Color::ONE);
        camera.initialize();

        let mut rng = StdRng::seed_from_u64(42);
        let center = render_pixel(&world, &camera, 4, 4, &mut rng);
        assert!((center.albedo - Color::splat(0.5)).length() < 1e-5);
        assert!(center.normal.z > 0.9);
        assert!(center.color.length() > 0.0);

        let corner = render_pixel(&world, &camera, 0, 0, &mut rng);
        assert_eq!(corner.color, Color::ONE);
        assert_eq!(corner.albedo, Color::ZERO);
        assert_eq!(corner.normal, Vec3::ZERO);
    }

    #[test]
    fn test_light_samples_respect_occluders() {
        // A black slab just above a lit floor blocks a distant overhead light
        let mut scene = Scene::new();
        let white = scene.materials.add_rough(Rough::new(Color::splat(0.8)));
        let black = scene.materials.add_rough(Rough::new(Color::ZERO));
        let lamp = scene.materials.add_light(DiffuseLight::new(Color::splat(10.0)));
        scene.geometry.add_parallelogram(Parallelogram::new(
            Vec3::new(-1000.0, 0.0, 1000.0),
            Vec3::new(2000.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -2000.0),
            white,
        ));
        scene.geometry.add_parallelogram(Parallelogram::new(
            Vec3::new(-1000.0, 0.3, 1000.0),
            Vec3::new(2000.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -2000.0),
            black,
        ));
        // Faces -Y, down at the floor
        let light = scene.geometry.add_parallelogram(Parallelogram::new(
            Vec3::new(-50.0, 500.0, -50.0),
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 100.0),
            lamp,
        ));
        scene.add_light(light);
        let world = build(scene);
        let camera = camera_looking_down_z(Color::ZERO, 4);

        let mut rng = StdRng::seed_from_u64(91);
        let mut scratch = MixturePdf::new();
        for _ in 0..2000 {
            let mut aov = SampleAov::default();
            let ray = Ray::new(Vec3::new(0.0, 0.2, 0.0), -Vec3::Y, 0.0);
            let color = ray_color(&ray, &world, &camera, &mut scratch, &mut aov, &mut rng);
            assert_eq!(color, Color::ZERO);
            assert_eq!(aov.albedo, Color::splat(0.8));
        }
    }

    #[test]
    fn test_degenerate_density_ends_path_black() {
        // The light lies in the floor plane: every light-sampled direction is
        // tangent to the floor, where both mixture densities vanish.
        let mut scene = Scene::new();
        let floor = scene.materials.add_rough(Rough::new(Color::splat(0.5)));
        let lamp = scene.materials.add_light(DiffuseLight::new(Color::splat(5.0)));
        scene.geometry.add_parallelogram(Parallelogram::new(
            Vec3::new(-1000.0, 0.0, 1000.0),
            Vec3::new(2000.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -2000.0),
            floor,
        ));
        let light = scene.geometry.add_parallelogram(Parallelogram::new(
            Vec3::new(5.0, 0.0, 5.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            lamp,
        ));
        scene.add_light(light);
        let world = build(scene);
        let camera = camera_looking_down_z(Color::ONE, 4);

        let mut rng = StdRng::seed_from_u64(92);
        let mut scratch = MixturePdf::new();
        let mut black = 0;
        let mut lit = 0;
        for _ in 0..500 {
            let mut aov = SampleAov::default();
            let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, 0.0);
            let color = ray_color(&ray, &world, &camera, &mut scratch, &mut aov, &mut rng);
            assert!(color.is_finite(), "color = {color}");
            if color == Color::ZERO {
                black += 1;
            } else {
                lit += 1;
            }
        }
        assert!(black > 100, "only {black} paths hit the degenerate density");
        assert!(lit > 100, "only {lit} paths escaped to the sky");
    }

    #[test]
    fn test_metal_absorption_returns_prior_throughput() {
        // Fully fuzzed metal under a grazing ray absorbs about half the bounces.
        // Scattered bounces escape to a black sky.
        let mut scene = Scene::new();
        let metal = scene.materials.add_metal(Metal::new(Color::splat(0.5), 1.0));
        scene.geometry.add_parallelogram(Parallelogram::new(
            Vec3::new(-1000.0, 0.0, 1000.0),
            Vec3::new(2000.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -2000.0),
            metal,
        ));
        let world = build(scene);
        let camera = camera_looking_down_z(Color::ZERO, 4);

        let direction = Vec3::new(1.0, -0.05, 0.0).normalize();
        let mut absorbed = 0;
        for seed in 0..200 {
            let ray = Ray::new(Vec3::new(-20.0, 1.0, 0.0), direction, 0.0);
            let (color, aov) = trace(&world, &camera, ray, seed);
            if color == Color::ONE {
                absorbed += 1;
                assert!(!aov.recorded);
            } else {
                assert_eq!(color, Color::ZERO);
                assert!(aov.recorded);
                assert_eq!(aov.albedo, Color::splat(0.5));
            }
        }
        assert!(absorbed > 20, "only {absorbed} bounces were absorbed");
    }
}
