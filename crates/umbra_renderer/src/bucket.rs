//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that can be rendered
//! independently and in parallel using rayon. Each bucket draws from its
//! own RNG stream, so a fixed seed reproduces the same image no matter how
//! the buckets are scheduled.

use crate::camera::Camera;
use crate::integrator::{render_pixel, PixelSample};
use crate::renderer::{RenderError, RenderResult};
use crate::scene::World;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position in the render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// Generate buckets for an image, sorted in spiral order from center.
///
/// Center buckets come first so the most important part of the frame
/// finishes early.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let bucket_size = bucket_size.max(1);
    let mut buckets = Vec::new();

    for y in (0..height).step_by(bucket_size as usize) {
        for x in (0..width).step_by(bucket_size as usize) {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, buckets.len()));
        }
    }

    sort_spiral(&mut buckets, width, height);

    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center. Ties keep grid order.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    let distance = |b: &Bucket| {
        let bx = b.x as f32 + b.width as f32 / 2.0;
        let by = b.y as f32 + b.height as f32 / 2.0;
        (bx - center_x).powi(2) + (by - center_y).powi(2)
    };

    buckets.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Seed for bucket `index` derived from the render seed (splitmix64 finalizer).
pub fn bucket_seed(seed: u64, index: usize) -> u64 {
    let mut z = (index as u64).wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    seed ^ (z ^ (z >> 31))
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    /// Pixels in row-major order within the bucket
    pub pixels: Vec<PixelSample>,
}

impl BucketResult {
    pub fn new(bucket: Bucket, pixels: Vec<PixelSample>) -> Self {
        Self { bucket, pixels }
    }
}

/// Render a single bucket.
///
/// `cancel` is polled before every pixel; a raised flag abandons the bucket
/// with [`RenderError::Cancelled`].
pub fn render_bucket(
    bucket: &Bucket,
    world: &World,
    camera: &Camera,
    seed: u64,
    cancel: &AtomicBool,
) -> RenderResult<BucketResult> {
    let start = Instant::now();
    let mut rng = StdRng::seed_from_u64(bucket_seed(seed, bucket.index));
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            if cancel.load(Ordering::Relaxed) {
                return Err(RenderError::Cancelled);
            }
            let i = bucket.x + local_x;
            let j = bucket.y + local_y;
            pixels.push(render_pixel(world, camera, i, j, &mut rng));
        }
    }

    log::debug!(
        "Bucket {} ({}x{} at {},{}) rendered in {:.2?}",
        bucket.index,
        bucket.width,
        bucket.height,
        bucket.x,
        bucket.y,
        start.elapsed()
    );

    Ok(BucketResult::new(*bucket, pixels))
}
