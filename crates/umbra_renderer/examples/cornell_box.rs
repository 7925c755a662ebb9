//! Cornell box render.
//!
//! Usage: `cargo run --release --example cornell_box [config.json] [output.png]`
//!
//! The optional JSON file overrides any subset of `RenderConfig` fields.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::AtomicBool;
use umbra_renderer::{
    render, Camera, Color, Cuboid, Dielectric, DiffuseLight, Mat4, Metal, Parallelogram,
    RenderConfig, Rough, Scene, Sphere, Transform, Vec3, World,
};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => load_config(&path)?,
        None => RenderConfig {
            samples_per_pixel: 64,
            max_depth: 50,
            ..RenderConfig::default()
        },
    };
    let output_path = args.next().unwrap_or_else(|| "cornell_box.png".to_string());

    let scene = build_scene()?;
    let world = World::build(scene, &mut StdRng::seed_from_u64(config.seed))?;

    let camera = Camera::new()
        .with_resolution(600, 600)
        .with_position(
            Vec3::new(278.0, 278.0, -800.0), // look_from
            Vec3::new(278.0, 278.0, 0.0),    // look_at
            Vec3::Y,                          // vup
        )
        .with_lens(40.0, 0.0, 10.0);

    let cancel = AtomicBool::new(false);
    let output = render(&world, &camera, &config, &cancel)?;

    let image = image::RgbaImage::from_raw(output.color.width, output.color.height, output.color.to_rgba())
        .context("render output does not match the image dimensions")?;
    image
        .save(&output_path)
        .with_context(|| format!("failed to write {output_path}"))?;

    log::info!("Saved {}", output_path);
    Ok(())
}

fn load_config(path: &str) -> Result<RenderConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    let config: RenderConfig =
        serde_json::from_str(&text).with_context(|| format!("failed to parse {path}"))?;
    log::info!("Loaded render config from {}", path);
    Ok(config)
}

fn build_scene() -> Result<Scene> {
    let mut scene = Scene::new();
    let materials = &mut scene.materials;

    let red = materials.add_rough(Rough::new(Color::new(0.65, 0.05, 0.05)));
    let white = materials.add_rough(Rough::new(Color::splat(0.73)));
    let green = materials.add_rough(Rough::new(Color::new(0.12, 0.45, 0.15)));
    let aluminum = materials.add_metal(Metal::new(Color::new(0.8, 0.85, 0.88), 0.0));
    let glass = materials.add_dielectric(Dielectric::new(1.5));
    let lamp = materials.add_light(DiffuseLight::new(Color::splat(15.0)));

    let geometry = &mut scene.geometry;

    // Walls
    geometry.add_parallelogram(Parallelogram::new(
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        green,
    ));
    geometry.add_parallelogram(Parallelogram::new(
        Vec3::ZERO,
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        red,
    ));
    geometry.add_parallelogram(Parallelogram::new(
        Vec3::ZERO,
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        white,
    ));
    geometry.add_parallelogram(Parallelogram::new(
        Vec3::new(555.0, 555.0, 555.0),
        Vec3::new(-555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -555.0),
        white,
    ));
    geometry.add_parallelogram(Parallelogram::new(
        Vec3::new(0.0, 0.0, 555.0),
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        white,
    ));

    // Ceiling light, facing down
    let light = geometry.add_parallelogram(Parallelogram::new(
        Vec3::new(343.0, 554.0, 332.0),
        Vec3::new(-130.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -105.0),
        lamp,
    ));

    // Tall mirrored box, rotated and moved into place
    let tall = geometry.add_cuboid(Cuboid::new(Vec3::ZERO, Vec3::new(165.0, 330.0, 165.0), aluminum));
    let placed = Transform::from_srt(
        geometry,
        tall,
        Vec3::ONE,
        Vec3::new(0.0, 15.0, 0.0),
        Vec3::new(265.0, 0.0, 295.0),
    )?;
    geometry.add_transform(placed);

    // Short box
    let short = geometry.add_cuboid(Cuboid::new(Vec3::ZERO, Vec3::splat(165.0), white));
    let turn = Mat4::from_translation(Vec3::new(130.0, 0.0, 65.0))
        * Mat4::from_rotation_y((-18.0f32).to_radians());
    geometry.add_transformed(short, turn)?;

    let ball = geometry.add_sphere(Sphere::new(Vec3::new(190.0, 255.0, 190.0), 90.0, glass));

    scene.add_light(light);
    scene.add_light(ball);
    Ok(scene)
}
