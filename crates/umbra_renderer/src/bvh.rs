//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree is stored flat: nodes live in one `Vec`, leaves point into a
//! table of [`PrimitiveRef`]s, and an internal node's children always sit
//! next to each other. Both construction and traversal are iterative.

use crate::geometry::Geometry;
use crate::hittable::{HitRecord, PrimitiveRef};
use rand::{Rng, RngCore};
use std::collections::VecDeque;
use std::time::Instant;
use umbra_math::{Aabb, Interval, Ray, Vec3};

/// Maximum primitives per leaf node before splitting.
pub const LEAF_MAX_SIZE: usize = 4;

/// Capacity of the traversal stack.
pub const MAX_TRAVERSAL_DEPTH: usize = 64;

/// BVH node - either an internal node with two adjacent children or a leaf
/// with a run of primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    /// `count` primitives starting at `first` in the primitive table.
    Leaf { bbox: Aabb, first: usize, count: usize },
    /// Children at `left` and `left + 1`.
    Internal { bbox: Aabb, left: usize },
}

impl BvhNode {
    /// Slot filler for nodes not yet written by the builder.
    const PLACEHOLDER: BvhNode = BvhNode::Leaf {
        bbox: Aabb::EMPTY,
        first: 0,
        count: 0,
    };

    pub fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Leaf { bbox, .. } | BvhNode::Internal { bbox, .. } => *bbox,
        }
    }
}

/// Per-primitive data the builder sorts.
#[derive(Debug, Clone, Copy)]
struct PrimitiveInfo {
    bbox: Aabb,
    centroid: Vec3,
    primitive: PrimitiveRef,
}

/// Pending node: the range `[start, end)` of the info array becomes node `slot`.
#[derive(Debug, Clone, Copy)]
struct BuildTask {
    slot: usize,
    start: usize,
    end: usize,
}

/// Build statistics, logged after construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub max_depth: usize,
}

/// Flattened BVH over the top-level primitives of a [`Geometry`].
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    primitives: Vec<PrimitiveRef>,
}

impl Bvh {
    /// Build a BVH over `geometry.primitive_refs()`.
    ///
    /// Splits are median-by-random-axis: each internal node sorts its range
    /// by centroid on an axis drawn from `rng` and halves it. The node array
    /// is sized to `2N - 1` up front.
    pub fn build(geometry: &Geometry, rng: &mut dyn RngCore) -> Self {
        let start_time = Instant::now();

        let mut infos: Vec<PrimitiveInfo> = geometry
            .primitive_refs()
            .into_iter()
            .map(|primitive| PrimitiveInfo {
                bbox: geometry.bounding_box_of(primitive),
                centroid: geometry.centroid_of(primitive),
                primitive,
            })
            .collect();

        let n = infos.len();
        if n == 0 {
            log::info!("BVH: empty scene, no nodes built");
            return Self::default();
        }

        let mut nodes = vec![BvhNode::PLACEHOLDER; 2 * n - 1];
        let mut primitives = Vec::with_capacity(n);
        let mut next = 1;

        let mut queue = VecDeque::new();
        queue.push_back(BuildTask {
            slot: 0,
            start: 0,
            end: n,
        });

        while let Some(task) = queue.pop_front() {
            let range = &mut infos[task.start..task.end];
            let bbox = range
                .iter()
                .fold(Aabb::EMPTY, |acc, info| Aabb::surrounding(&acc, &info.bbox));
            let count = range.len();

            if count <= LEAF_MAX_SIZE {
                nodes[task.slot] = BvhNode::Leaf {
                    bbox,
                    first: primitives.len(),
                    count,
                };
                primitives.extend(range.iter().map(|info| info.primitive));
                continue;
            }

            let axis = rng.gen_range(0..3);
            range.sort_unstable_by(|a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));

            let left = next;
            next += 2;
            let mid = task.start + count / 2;

            nodes[task.slot] = BvhNode::Internal { bbox, left };
            queue.push_back(BuildTask {
                slot: left,
                start: task.start,
                end: mid,
            });
            queue.push_back(BuildTask {
                slot: left + 1,
                start: mid,
                end: task.end,
            });
        }

        let bvh = Self { nodes, primitives };
        let stats = bvh.stats();
        log::info!(
            "BVH built: {} primitives, {} nodes, {} leaves, max depth {} in {:.2?}",
            n,
            stats.node_count,
            stats.leaf_count,
            stats.max_depth,
            start_time.elapsed()
        );
        bvh
    }

    /// Number of node slots (`2N - 1`, or 0 for an empty tree).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Primitive table that leaves index into.
    pub fn primitives(&self) -> &[PrimitiveRef] {
        &self.primitives
    }

    /// Bounding box of the whole tree.
    pub fn bounding_box(&self) -> Aabb {
        self.nodes
            .first()
            .map(BvhNode::bounding_box)
            .unwrap_or(Aabb::EMPTY)
    }

    /// Node, leaf and depth counts of the reachable tree.
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats::default();
        if self.nodes.is_empty() {
            return stats;
        }

        let mut stack = vec![(0usize, 1usize)];
        while let Some((index, depth)) = stack.pop() {
            stats.node_count += 1;
            stats.max_depth = stats.max_depth.max(depth);
            match self.nodes[index] {
                BvhNode::Leaf { .. } => stats.leaf_count += 1,
                BvhNode::Internal { left, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((left + 1, depth + 1));
                }
            }
        }
        stats
    }

    /// Closest hit in `ray_t`.
    pub fn hit(&self, geometry: &Geometry, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
        self.closest_hit(geometry, ray, ray_t).map(|(_, rec)| rec)
    }

    /// Closest hit in `ray_t`, along with the primitive that produced it.
    pub fn closest_hit(
        &self,
        geometry: &Geometry,
        ray: &Ray,
        ray_t: Interval,
    ) -> Option<(PrimitiveRef, HitRecord)> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut range = ray_t;
        let mut result = None;
        let mut stack = [0usize; MAX_TRAVERSAL_DEPTH];
        let mut stack_len = 1;

        while stack_len > 0 {
            stack_len -= 1;
            let node = &self.nodes[stack[stack_len]];

            // The box may have been entered before a closer hit shrank the range
            if node.bounding_box().hit(ray, range).is_none() {
                continue;
            }

            match *node {
                BvhNode::Leaf { first, count, .. } => {
                    for &primitive in &self.primitives[first..first + count] {
                        if let Some(rec) = geometry.hit_primitive(primitive, ray, range) {
                            range.max = rec.t;
                            result = Some((primitive, rec));
                        }
                    }
                }
                BvhNode::Internal { left, .. } => {
                    let right = left + 1;
                    let left_t = self.nodes[left].bounding_box().hit(ray, range);
                    let right_t = self.nodes[right].bounding_box().hit(ray, range);

                    // Push the farther child first so the nearer one is popped next
                    let mut push = |index: usize| {
                        debug_assert!(stack_len < MAX_TRAVERSAL_DEPTH, "BVH traversal stack overflow");
                        stack[stack_len] = index;
                        stack_len += 1;
                    };
                    match (left_t, right_t) {
                        (Some(lt), Some(rt)) => {
                            if lt <= rt {
                                push(right);
                                push(left);
                            } else {
                                push(left);
                                push(right);
                            }
                        }
                        (Some(_), None) => push(left),
                        (None, Some(_)) => push(right),
                        (None, None) => {}
                    }
                }
            }
        }

        result
    }
}
