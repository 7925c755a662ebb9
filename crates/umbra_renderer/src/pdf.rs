//! Probability density functions over directions, used for importance
//! sampling at diffuse surfaces.

use crate::geometry::Geometry;
use crate::hittable::{PrimitiveKind, PrimitiveRef};
use crate::sampling::{gen_f32, random_cosine_direction};
use rand::RngCore;
use std::f32::consts::PI;
use umbra_math::{Onb, Vec3};

/// Upper bound on the components of a [`MixturePdf`]: one cosine lobe plus
/// up to 31 lights.
pub const MAX_MIXTURE_COMPONENTS: usize = 32;

/// A density over directions that can also be sampled.
pub trait Pdf {
    /// Solid-angle density of `direction`.
    fn value(&self, direction: Vec3) -> f32;

    /// Draw a direction distributed according to this density.
    fn generate(&self, rng: &mut dyn RngCore) -> Vec3;
}

/// Cosine-weighted hemisphere around a normal.
#[derive(Debug, Clone, Copy)]
pub struct CosinePdf {
    uvw: Onb,
}

impl CosinePdf {
    pub fn new(normal: Vec3) -> Self {
        Self {
            uvw: Onb::from_w(normal),
        }
    }
}

impl Pdf for CosinePdf {
    fn value(&self, direction: Vec3) -> f32 {
        let cosine = direction.normalize_or_zero().dot(self.uvw.w());
        cosine.max(0.0) / PI
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.uvw.to_world(random_cosine_direction(rng))
    }
}

/// Directions from `origin` toward a sampleable primitive.
///
/// Spheres and parallelograms are supported. Any other kind generates the
/// zero vector and has zero density everywhere.
#[derive(Debug, Clone, Copy)]
pub struct HittablePdf<'a> {
    geometry: &'a Geometry,
    target: PrimitiveRef,
    origin: Vec3,
}

impl<'a> HittablePdf<'a> {
    pub fn new(geometry: &'a Geometry, target: PrimitiveRef, origin: Vec3) -> Self {
        Self {
            geometry,
            target,
            origin,
        }
    }

    /// True if this primitive kind can be direct-sampled.
    pub fn supports(kind: PrimitiveKind) -> bool {
        matches!(kind, PrimitiveKind::Sphere | PrimitiveKind::Parallelogram)
    }
}

impl Pdf for HittablePdf<'_> {
    fn value(&self, direction: Vec3) -> f32 {
        match self.target.kind {
            PrimitiveKind::Sphere => {
                self.geometry.spheres[self.target.index].pdf_value(self.origin, direction)
            }
            PrimitiveKind::Parallelogram => {
                self.geometry.parallelograms[self.target.index].pdf_value(self.origin, direction)
            }
            _ => 0.0,
        }
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        match self.target.kind {
            PrimitiveKind::Sphere => {
                self.geometry.spheres[self.target.index].random_direction(self.origin, rng)
            }
            PrimitiveKind::Parallelogram => self.geometry.parallelograms[self.target.index]
                .random_direction(self.origin, rng),
            _ => Vec3::ZERO,
        }
    }
}

/// One entry of a [`MixturePdf`].
#[derive(Debug, Clone, Copy)]
pub enum PdfComponent<'a> {
    Cosine(CosinePdf),
    Hittable(HittablePdf<'a>),
}

impl Pdf for PdfComponent<'_> {
    fn value(&self, direction: Vec3) -> f32 {
        match self {
            PdfComponent::Cosine(pdf) => pdf.value(direction),
            PdfComponent::Hittable(pdf) => pdf.value(direction),
        }
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        match self {
            PdfComponent::Cosine(pdf) => pdf.generate(rng),
            PdfComponent::Hittable(pdf) => pdf.generate(rng),
        }
    }
}

/// Equal-weight mixture of up to [`MAX_MIXTURE_COMPONENTS`] densities.
///
/// `generate` delegates to one component picked uniformly; `value` is the
/// plain mean of every component's density. The component list is meant to
/// be cleared and refilled at each bounce without reallocating.
#[derive(Debug, Clone, Default)]
pub struct MixturePdf<'a> {
    components: Vec<PdfComponent<'a>>,
}

impl<'a> MixturePdf<'a> {
    pub fn new() -> Self {
        Self {
            components: Vec::with_capacity(MAX_MIXTURE_COMPONENTS),
        }
    }

    pub fn clear(&mut self) {
        self.components.clear();
    }

    /// Add a component. Returns `false` (and drops it) when the mixture is full.
    pub fn push(&mut self, component: PdfComponent<'a>) -> bool {
        if self.components.len() >= MAX_MIXTURE_COMPONENTS {
            return false;
        }
        self.components.push(component);
        true
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Pdf for MixturePdf<'_> {
    fn value(&self, direction: Vec3) -> f32 {
        if self.components.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.components.iter().map(|c| c.value(direction)).sum();
        sum / self.components.len() as f32
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Vec3 {
        let count = self.components.len();
        if count == 0 {
            return Vec3::ZERO;
        }
        let pick = ((gen_f32(rng) * count as f32) as usize).min(count - 1);
        self.components[pick].generate(rng)
    }
}
