//! Parallel bucket renderer and its output buffers.

use crate::bucket::{generate_buckets, render_bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::camera::Camera;
use crate::material::Color;
use crate::scene::{SceneError, World};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;
use thiserror::Error;

/// Errors that can occur while rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Render cancelled")]
    Cancelled,

    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Rounded down to a square stratified grid
    pub samples_per_pixel: u32,
    /// Maximum bounces per path
    pub max_depth: u32,
    /// Radiance for rays that leave the scene
    pub background: Color,
    /// Base seed; every bucket derives its own stream from it
    pub seed: u64,
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 100,
            max_depth: 50,
            background: Color::ZERO,
            seed: 0,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> RenderResult<()> {
        if self.samples_per_pixel == 0 {
            return Err(RenderError::InvalidConfig("samples_per_pixel must be at least 1".into()));
        }
        if self.max_depth == 0 {
            return Err(RenderError::InvalidConfig("max_depth must be at least 1".into()));
        }
        if self.bucket_size == 0 {
            return Err(RenderError::InvalidConfig("bucket_size must be at least 1".into()));
        }
        Ok(())
    }
}

impl From<&Camera> for RenderConfig {
    fn from(camera: &Camera) -> Self {
        Self {
            samples_per_pixel: camera.samples_per_pixel,
            max_depth: camera.max_depth,
            background: camera.background,
            ..Self::default()
        }
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let channel = |c: f32| (255.0 * linear_to_gamma(c).clamp(0.0, 1.0)) as u8;
    [channel(color.x), channel(color.y), channel(color.z), 255]
}

/// Row-major RGB float image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width * height) as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Gamma-corrected RGBA bytes, for display or saving.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| color_to_rgba(*c)).collect()
    }

    /// Flat `[r, g, b, r, g, b, ...]` view of the pixels.
    pub fn as_f32_slice(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }
}

/// Everything a render produces: beauty pass plus denoiser side channels.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    /// Linear radiance
    pub color: ImageBuffer,
    /// Mean first-hit albedo
    pub albedo: ImageBuffer,
    /// Unit camera-space normals, zero where nothing was hit
    pub normal: ImageBuffer,
}

impl RenderOutput {
    fn new(width: u32, height: u32) -> Self {
        Self {
            color: ImageBuffer::new(width, height),
            albedo: ImageBuffer::new(width, height),
            normal: ImageBuffer::new(width, height),
        }
    }

    fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        let coords = (0..bucket.height).flat_map(|y| (0..bucket.width).map(move |x| (x, y)));
        for ((x, y), sample) in coords.zip(&result.pixels) {
            let (px, py) = (bucket.x + x, bucket.y + y);
            self.color.set(px, py, sample.color);
            self.albedo.set(px, py, sample.albedo);
            self.normal.set(px, py, sample.normal);
        }
    }

    /// Borrowed float buffers in the layout denoisers expect.
    pub fn denoiser_input(&self) -> DenoiserInput<'_> {
        DenoiserInput {
            width: self.color.width,
            height: self.color.height,
            color: self.color.as_f32_slice(),
            albedo: self.albedo.as_f32_slice(),
            normal: self.normal.as_f32_slice(),
        }
    }
}

/// Flat RGB float views of a [`RenderOutput`], three floats per pixel.
#[derive(Debug, Clone, Copy)]
pub struct DenoiserInput<'a> {
    pub width: u32,
    pub height: u32,
    pub color: &'a [f32],
    pub albedo: &'a [f32],
    pub normal: &'a [f32],
}

/// Render `world` through `camera` in parallel buckets.
///
/// Sampling settings come from `config` and override the camera's. Raising
/// `cancel` stops every worker at its next pixel.
pub fn render(
    world: &World,
    camera: &Camera,
    config: &RenderConfig,
    cancel: &AtomicBool,
) -> RenderResult<RenderOutput> {
    config.validate()?;
    if camera.image_width == 0 || camera.image_height == 0 {
        return Err(RenderError::InvalidConfig(format!(
            "image resolution must be non-zero, got {}x{}",
            camera.image_width, camera.image_height
        )));
    }

    let mut camera = camera
        .clone()
        .with_samples(config.samples_per_pixel)
        .with_max_depth(config.max_depth)
        .with_background(config.background);
    camera.initialize();

    let (width, height) = (camera.image_width, camera.image_height);
    let buckets = generate_buckets(width, height, config.bucket_size);
    let total = buckets.len();

    log::info!(
        "Rendering {}x{} at {} spp, depth {}, {} buckets",
        width,
        height,
        camera.samples_per_pixel,
        camera.max_depth,
        total
    );

    let start = Instant::now();
    let completed = AtomicUsize::new(0);
    let camera = &camera;

    let results = buckets
        .par_iter()
        .map(|bucket| -> RenderResult<BucketResult> {
            let result = render_bucket(bucket, world, camera, config.seed, cancel)?;
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            let percent = done * 100 / total;
            if percent / 10 > (done - 1) * 100 / total / 10 {
                log::info!("Render progress: {}% ({}/{} buckets)", percent, done, total);
            }
            Ok(result)
        })
        .collect::<RenderResult<Vec<_>>>();

    let results = match results {
        Ok(results) => results,
        Err(err) => {
            log::warn!("Render stopped after {:.2?}: {}", start.elapsed(), err);
            return Err(err);
        }
    };

    let mut output = RenderOutput::new(width, height);
    for result in &results {
        output.write_bucket(result);
    }

    log::info!("Render complete in {:.2?}", start.elapsed());
    Ok(output)
}
