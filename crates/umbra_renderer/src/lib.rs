//! Umbra - CPU Path Tracing
//!
//! A Monte Carlo path tracer over a flat, handle-indexed scene:
//! primitives and materials live in per-kind arrays and are referenced by
//! `(kind, index)` tags, a flattened BVH accelerates closest-hit queries,
//! and diffuse bounces are importance sampled toward the lights.

pub mod bucket;
pub mod bvh;
pub mod camera;
pub mod cuboid;
pub mod geometry;
pub mod hittable;
pub mod integrator;
pub mod material;
pub mod parallelogram;
pub mod pdf;
pub mod renderer;
pub mod sampling;
pub mod scene;
pub mod sphere;
pub mod transform;
pub mod triangle;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::{Bvh, BvhNode, BvhStats, LEAF_MAX_SIZE, MAX_TRAVERSAL_DEPTH};
pub use camera::Camera;
pub use cuboid::Cuboid;
pub use geometry::Geometry;
pub use hittable::{HitRecord, Hittable, PrimitiveKind, PrimitiveRef};
pub use integrator::{ray_color, render_pixel, PixelSample, SampleAov};
pub use material::{
    Color, Dielectric, DiffuseLight, MaterialKind, MaterialRef, Materials, Metal, Rough,
};
pub use parallelogram::Parallelogram;
pub use pdf::{CosinePdf, HittablePdf, MixturePdf, Pdf, PdfComponent, MAX_MIXTURE_COMPONENTS};
pub use renderer::{
    color_to_rgba, linear_to_gamma, render, DenoiserInput, ImageBuffer, RenderConfig,
    RenderError, RenderOutput, RenderResult,
};
pub use scene::{Scene, SceneError, SceneResult, World};
pub use sphere::Sphere;
pub use transform::Transform;
pub use triangle::Triangle;

/// Re-export common math types from umbra_math
pub use umbra_math::{Aabb, Interval, Mat4, Ray, Vec3};
