// Re-export glam for convenience
pub use glam::*;

// Umbra math types
mod aabb;
mod interval;
mod onb;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;
pub use transform::Mat4Ext;

/// Tolerance used for "near zero" float comparisons (parallel slabs,
/// degenerate densities, interval validity).
pub const NEAR_ZERO_EPSILON: f32 = 1e-5;

/// Returns true if `value` is within [`NEAR_ZERO_EPSILON`] of zero.
#[inline]
pub fn near_zero(value: f32) -> bool {
    value.abs() < NEAR_ZERO_EPSILON
}
