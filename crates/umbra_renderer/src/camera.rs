//! Camera for ray generation.

use crate::sampling::{gen_f32, random_in_unit_disk};
use crate::Color;
use rand::RngCore;
use umbra_math::{Interval, Onb, Ray, Vec3};

/// Camera for generating rays into the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,
    /// Always a perfect square (`sqrt_spp * sqrt_spp`)
    pub samples_per_pixel: u32,
    pub max_depth: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel
    focus_dist: f32,    // Distance from camera to plane of perfect focus

    /// Shutter open/close times; ray times are drawn uniformly from it
    shutter: Interval,

    /// Radiance returned for rays that escape the scene
    pub background: Color,

    // Cached computed values (set by initialize())
    sqrt_spp: u32,
    recip_sqrt_spp: f32,
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    basis: Onb,
    defocus_radius: f32,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 800,
            image_height: 450,
            samples_per_pixel: 9,
            max_depth: 50,
            look_from: Vec3::new(0.0, 0.0, 0.0),
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::new(0.0, 1.0, 0.0),
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 1.0,
            shutter: Interval::new(0.0, 1.0),
            background: Color::ZERO,
            // Cached values (initialized to defaults)
            sqrt_spp: 3,
            recip_sqrt_spp: 1.0 / 3.0,
            center: Vec3::ZERO,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            basis: Onb::default(),
            defocus_radius: 0.0,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set samples per pixel, rounded down to a square stratified grid.
    pub fn with_samples(mut self, samples: u32) -> Self {
        let sqrt_spp = ((samples as f64).sqrt() as u32).max(1);
        self.sqrt_spp = sqrt_spp;
        self.samples_per_pixel = sqrt_spp * sqrt_spp;
        self
    }

    /// Set maximum number of bounces per path.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    /// Set the shutter interval used for motion blur.
    pub fn with_shutter(mut self, shutter: Interval) -> Self {
        self.shutter = shutter;
        self
    }

    /// Set background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Initialize the camera (must be called before generating rays).
    pub fn initialize(&mut self) {
        self.sqrt_spp = self.sqrt_spp.max(1);
        self.samples_per_pixel = self.sqrt_spp * self.sqrt_spp;
        self.recip_sqrt_spp = 1.0 / self.sqrt_spp as f32;
        self.center = self.look_from;

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width =
            viewport_height * (self.image_width as f32 / self.image_height.max(1) as f32);

        // Camera basis: w points backwards, away from the look-at point
        let w = self.look_from - self.look_at;
        let u = self.vup.cross(w);
        let v = w.cross(u);
        self.basis = Onb::from_axes(u, v, w);

        // Calculate viewport vectors
        let viewport_u = viewport_width * self.basis.u();
        let viewport_v = -viewport_height * self.basis.v();

        // Calculate pixel delta vectors
        self.pixel_delta_u = viewport_u / self.image_width.max(1) as f32;
        self.pixel_delta_v = viewport_v / self.image_height.max(1) as f32;

        // Calculate upper left pixel location
        let viewport_upper_left =
            self.center - self.focus_dist * self.basis.w() - viewport_u / 2.0 - viewport_v / 2.0;

        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        // Calculate defocus disk basis vectors
        self.defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = self.basis.u() * self.defocus_radius;
        self.defocus_disk_v = self.basis.v() * self.defocus_radius;
    }

    /// Generate a ray for pixel (i, j), jittered inside stratum (s_i, s_j).
    ///
    /// The direction is unit length and the time is uniform over the shutter.
    pub fn get_ray(&self, i: u32, j: u32, s_i: u32, s_j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = self.sample_square_stratified(s_i, s_j, rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        let ray_direction = (pixel_sample - ray_origin).normalize();
        let ray_time = self.shutter.min + gen_f32(rng) * self.shutter.size();

        Ray::new(ray_origin, ray_direction, ray_time)
    }

    /// Random offset in [-0.5, 0.5]^2 restricted to one cell of the
    /// `sqrt_spp x sqrt_spp` grid.
    fn sample_square_stratified(&self, s_i: u32, s_j: u32, rng: &mut dyn RngCore) -> Vec3 {
        let px = ((s_i as f32) + gen_f32(rng)) * self.recip_sqrt_spp - 0.5;
        let py = ((s_j as f32) + gen_f32(rng)) * self.recip_sqrt_spp - 0.5;
        Vec3::new(px, py, 0.0)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }

    /// Number of strata along each pixel axis.
    pub fn sqrt_spp(&self) -> u32 {
        self.sqrt_spp
    }

    /// Center of the upper-left pixel.
    pub fn pixel_origin(&self) -> Vec3 {
        self.pixel00_loc
    }

    /// Offsets from one pixel to the next along a row and down a column.
    pub fn pixel_deltas(&self) -> (Vec3, Vec3) {
        (self.pixel_delta_u, self.pixel_delta_v)
    }

    pub fn defocus_radius(&self) -> f32 {
        self.defocus_radius
    }

    pub fn shutter(&self) -> Interval {
        self.shutter
    }

    /// Camera frame: `u` right, `v` up, `w` backwards.
    pub fn basis(&self) -> &Onb {
        &self.basis
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
