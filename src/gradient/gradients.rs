// gradient/gradients.rs - Built-in gradient sources
//
// Constant and closure-backed fields for leaf values, and a reference
// gradient that forwards to another gradient through its own sampler.
// Reference gradients are how chains (and accidental cycles) are built.

use crate::gradient::context::GradientContext;
use crate::gradient::math::Vec3;
use crate::gradient::sampler::{GradientSampleParams, GradientSampler};
use crate::gradient::source::{EntityId, GradientSource};

/// The same value everywhere.
#[derive(Debug, Clone, Copy)]
pub struct ConstantGradient {
    pub value: f32,
}

impl ConstantGradient {
    pub fn new(value: f32) -> Self {
        ConstantGradient { value }
    }
}

impl GradientSource for ConstantGradient {
    fn get_value(&self, _ctx: &GradientContext, _params: &GradientSampleParams) -> f32 {
        self.value
    }
}

/// A field computed from the sample position by a closure.
pub struct FnGradient<F> {
    f: F,
}

impl<F> FnGradient<F>
where
    F: Fn(Vec3) -> f32 + Send + Sync,
{
    pub fn new(f: F) -> Self {
        FnGradient { f }
    }
}

impl<F> GradientSource for FnGradient<F>
where
    F: Fn(Vec3) -> f32 + Send + Sync,
{
    fn get_value(&self, _ctx: &GradientContext, params: &GradientSampleParams) -> f32 {
        (self.f)(params.position)
    }

    fn get_values(&self, _ctx: &GradientContext, positions: &[Vec3], out_values: &mut [f32]) {
        for (p, out) in positions.iter().zip(out_values.iter_mut()) {
            *out = (self.f)(*p);
        }
    }
}

/// Forwards to another gradient through an embedded sampler, so the
/// referenced value picks up this sampler's transform, levels and opacity.
#[derive(Debug, Clone)]
pub struct ReferenceGradient {
    pub sampler: GradientSampler,
}

impl ReferenceGradient {
    pub fn new(sampler: GradientSampler) -> Self {
        ReferenceGradient { sampler }
    }
}

impl GradientSource for ReferenceGradient {
    fn get_value(&self, ctx: &GradientContext, params: &GradientSampleParams) -> f32 {
        self.sampler.get_value(ctx, params)
    }

    fn get_values(&self, ctx: &GradientContext, positions: &[Vec3], out_values: &mut [f32]) {
        self.sampler.get_values(ctx, positions, out_values);
    }

    fn is_entity_in_hierarchy(&self, ctx: &GradientContext, entity: EntityId) -> bool {
        self.sampler.is_entity_in_hierarchy(ctx, entity)
    }
}
