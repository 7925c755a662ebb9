use crate::{Interval, Ray, Vec3, NEAR_ZERO_EPSILON};

/// Smallest extent an AABB axis may have. Thinner axes are padded so flat
/// primitives (quads, axis-aligned triangles) still have volume for the
/// slab test.
const MIN_AXIS_EXTENT: f32 = 0.0001;

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let x = Interval::new(a.x.min(b.x), a.x.max(b.x));
        let y = Interval::new(a.y.min(b.y), a.y.max(b.y));
        let z = Interval::new(a.z.min(b.z), a.z.max(b.z));

        Self::new(x, y, z)
    }

    /// Create an AABB that surrounds two other AABBs.
    ///
    /// Merging never shrinks either input, so no re-padding is needed.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Test if a ray intersects this AABB within the given interval.
    ///
    /// Slab method. Returns the entry parameter (the lower bound of the
    /// surviving interval) on a hit. Axes the ray runs parallel to only
    /// reject when the origin lies outside that slab.
    pub fn hit(&self, r: &Ray, ray_t: Interval) -> Option<f32> {
        let mut current = ray_t;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let q = r.origin[axis];
            let d = r.direction[axis];

            if d.abs() < NEAR_ZERO_EPSILON {
                if q < slab.min || q > slab.max {
                    return None;
                }
                continue;
            }

            let t1 = (slab.min - q) / d;
            let t2 = (slab.max - q) / d;
            let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };

            if near > current.min {
                current.min = near;
            }
            if far < current.max {
                current.max = far;
            }

            if !current.is_valid_within(NEAR_ZERO_EPSILON) {
                return None;
            }
        }

        Some(current.min)
    }

    /// Pad intervals to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        if self.x.size() < MIN_AXIS_EXTENT {
            self.x = self.x.expand(MIN_AXIS_EXTENT);
        }
        if self.y.size() < MIN_AXIS_EXTENT {
            self.y = self.y.expand(MIN_AXIS_EXTENT);
        }
        if self.z.size() < MIN_AXIS_EXTENT {
            self.z = self.z.expand(MIN_AXIS_EXTENT);
        }
    }

    /// Returns true if `other` lies entirely inside this box.
    pub fn encloses(&self, other: &Aabb) -> bool {
        self.x.encloses(&other.x) && self.y.encloses(&other.y) && self.z.encloses(&other.z)
    }

    /// Translate (move) the AABB by an offset vector.
    pub fn translate(&self, offset: Vec3) -> Aabb {
        Aabb::new(
            self.x.add_scalar(offset.x),
            self.y.add_scalar(offset.y),
            self.z.add_scalar(offset.z),
        )
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let x_size = self.x.size();
        let y_size = self.y.size();
        let z_size = self.z.size();

        if x_size > y_size && x_size > z_size {
            0
        } else if y_size > z_size {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    /// Static constants
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    pub const UNIVERSE: Aabb = Aabb {
        x: Interval::UNIVERSE,
        y: Interval::UNIVERSE,
        z: Interval::UNIVERSE,
    };
}
