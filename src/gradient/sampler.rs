// gradient/sampler.rs - The gradient evaluation pipeline
//
// transform position -> guarded source lookup -> invert -> levels -> opacity
//
// The single and batch paths share `post_process`, so they agree bit for
// bit on the same positions. Every failure mode (disabled sampler, missing
// source, cyclic reference) degrades to zero output. For a cyclic reference
// that holds for every sampler inside the loop, not only the one that
// detected it.

use crate::error::{SamplerError, SamplerResult};
use crate::gradient::config::SamplerConfig;
use crate::gradient::context::GradientContext;
use crate::gradient::dispatch::CyclicDispatch;
use crate::gradient::levels::get_levels;
use crate::gradient::math::Vec3;
use crate::gradient::source::EntityId;

/// Per-sample query. The pipeline transforms a private copy of it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GradientSampleParams {
    pub position: Vec3,
}

impl GradientSampleParams {
    pub fn new(position: Vec3) -> Self {
        GradientSampleParams { position }
    }
}

/// Diagnostic key used when a cycle through `gradient` is detected.
pub fn cycle_diagnostic_key(gradient: EntityId) -> String {
    format!("cyclic-gradient-reference:{}", gradient.raw())
}

/// Reads a referenced gradient and post-processes the result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GradientSampler {
    pub config: SamplerConfig,
    /// Entity that holds this sampler. Only consulted by reference validation.
    pub owner_entity_id: EntityId,
}

impl GradientSampler {
    pub fn new(config: SamplerConfig) -> Self {
        GradientSampler {
            config,
            owner_entity_id: EntityId::INVALID,
        }
    }

    pub fn with_owner(config: SamplerConfig, owner_entity_id: EntityId) -> Self {
        GradientSampler {
            config,
            owner_entity_id,
        }
    }

    fn is_enabled(&self) -> bool {
        self.config.opacity > 0.0 && self.config.gradient_id.is_valid()
    }

    // ── Evaluation ──────────────────────────────────────────────────

    pub fn get_value(&self, ctx: &GradientContext, params: &GradientSampleParams) -> f32 {
        if !self.is_enabled() {
            return 0.0;
        }
        let gradient_id = self.config.gradient_id;
        let source = match ctx.registry().resolve(gradient_id) {
            Some(source) => source,
            None => return 0.0,
        };

        let mut transformed = *params;
        if self.config.transform.is_active() {
            let matrix = self.config.transform.to_matrix();
            transformed.position = matrix.transform_point(transformed.position);
        }

        let raw = {
            let guard = match ctx.dispatch().enter_gradient(gradient_id) {
                Ok(guard) => guard,
                Err(cycle) => {
                    report_cycle(ctx, cycle);
                    return 0.0;
                }
            };
            let raw = source.get_value(ctx, &transformed);
            // This dispatch is part of a loop; its value is meaningless.
            if guard.cycle_detected() {
                return 0.0;
            }
            raw
        };

        self.post_process(raw)
    }

    /// Batch form of [`get_value`](Self::get_value).
    ///
    /// `out_values.len() == positions.len()` is the caller's responsibility;
    /// only the common prefix is written when they differ.
    pub fn get_values(&self, ctx: &GradientContext, positions: &[Vec3], out_values: &mut [f32]) {
        debug_assert_eq!(
            positions.len(),
            out_values.len(),
            "get_values: output length must match position count"
        );
        let n = positions.len().min(out_values.len());
        let positions = &positions[..n];
        let out_values = &mut out_values[..n];

        if !self.is_enabled() {
            out_values.fill(0.0);
            return;
        }
        let gradient_id = self.config.gradient_id;
        let source = match ctx.registry().resolve(gradient_id) {
            Some(source) => source,
            None => {
                out_values.fill(0.0);
                return;
            }
        };

        let transformed: Vec<Vec3>;
        let query = if self.config.transform.is_active() {
            let matrix = self.config.transform.to_matrix();
            transformed = positions.iter().map(|p| matrix.transform_point(*p)).collect();
            &transformed[..]
        } else {
            positions
        };

        {
            let guard = match ctx.dispatch().enter_gradient(gradient_id) {
                Ok(guard) => guard,
                Err(cycle) => {
                    report_cycle(ctx, cycle);
                    out_values.fill(0.0);
                    return;
                }
            };
            source.get_values(ctx, query, out_values);
            if guard.cycle_detected() {
                out_values.fill(0.0);
                return;
            }
        }

        for value in out_values.iter_mut() {
            *value = self.post_process(*value);
        }
    }

    fn post_process(&self, raw: f32) -> f32 {
        let mut value = raw;
        if self.config.invert_input {
            value = 1.0 - value;
        }
        let levels = &self.config.levels;
        if levels.is_active() {
            value = get_levels(
                value,
                levels.input_mid,
                levels.input_min,
                levels.input_max,
                levels.output_min,
                levels.output_max,
            );
        }
        value * self.config.opacity
    }

    // ── Hierarchy queries ───────────────────────────────────────────

    /// Whether `entity` is this sampler's gradient or appears anywhere in
    /// that gradient's reference chain. Cycles answer `false`.
    pub fn is_entity_in_hierarchy(&self, ctx: &GradientContext, entity: EntityId) -> bool {
        let gradient_id = self.config.gradient_id;
        if !gradient_id.is_valid() || !entity.is_valid() {
            return false;
        }
        if gradient_id == entity {
            return true;
        }
        let source = match ctx.registry().resolve(gradient_id) {
            Some(source) => source,
            None => return false,
        };
        match ctx.dispatch().enter_gradient(gradient_id) {
            Ok(_guard) => source.is_entity_in_hierarchy(ctx, entity),
            Err(_) => false,
        }
    }

    // ── Reference validation ────────────────────────────────────────

    /// Check whether `candidate` may become this sampler's gradient.
    ///
    /// Clearing the reference (an invalid candidate) is always allowed. The
    /// owner itself is rejected, as is any gradient whose chain already
    /// leads back to the owner.
    pub fn validate_source_reference(
        &self,
        ctx: &GradientContext,
        candidate: EntityId,
    ) -> SamplerResult<()> {
        let owner = self.owner_entity_id;
        if !candidate.is_valid() || !owner.is_valid() {
            return Ok(());
        }
        if candidate == owner {
            return Err(SamplerError::SelfReference { entity: owner });
        }
        let probe = GradientSampler::new(SamplerConfig::for_gradient(candidate));
        if probe.is_entity_in_hierarchy(ctx, owner) {
            return Err(SamplerError::CyclicReference { candidate, owner });
        }
        Ok(())
    }

    /// Validate and store a new gradient reference.
    pub fn set_gradient_id(&mut self, ctx: &GradientContext, candidate: EntityId) -> SamplerResult<()> {
        self.validate_source_reference(ctx, candidate)?;
        self.config.gradient_id = candidate;
        Ok(())
    }

    /// Clear a stored self-reference. Returns whether the stored id was kept.
    pub fn validate_gradient_id(&mut self) -> bool {
        let id = self.config.gradient_id;
        if id.is_valid() && id == self.owner_entity_id {
            log::warn!(
                target: "gradient_signal",
                "gradient {} referenced itself; clearing the reference",
                id
            );
            self.config.gradient_id = EntityId::INVALID;
            return false;
        }
        true
    }
}

/// Log the cycle once and mark every dispatch in the loop so the enclosing
/// samplers return zero instead of post-processing.
fn report_cycle(ctx: &GradientContext, cycle: CyclicDispatch) {
    ctx.dispatch().mark_cycle(cycle.0);
    let key = cycle_diagnostic_key(cycle.0);
    let message = format!(
        "Detected cyclic dependencies with gradient entity references ({})",
        cycle
    );
    ctx.diagnostics().error_once(&key, &message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::gradients::{ConstantGradient, FnGradient};
    use std::sync::Arc;

    fn ctx_with(id: u64, value: f32) -> GradientContext {
        let ctx = GradientContext::new();
        ctx.registry()
            .register(EntityId::new(id), Arc::new(ConstantGradient::new(value)));
        ctx
    }

    fn sample(sampler: &GradientSampler, ctx: &GradientContext) -> f32 {
        sampler.get_value(ctx, &GradientSampleParams::default())
    }

    #[test]
    fn disabled_sampler_returns_zero() {
        let ctx = ctx_with(1, 0.8);

        let unset = GradientSampler::default();
        assert_eq!(sample(&unset, &ctx), 0.0);

        let mut transparent = GradientSampler::new(SamplerConfig::for_gradient(EntityId::new(1)));
        transparent.config.opacity = 0.0;
        transparent.config.invert_input = true;
        assert_eq!(sample(&transparent, &ctx), 0.0);

        transparent.config.opacity = -1.0;
        let mut out = [9.0; 3];
        transparent.get_values(&ctx, &[Vec3::ZERO; 3], &mut out);
        assert_eq!(out, [0.0; 3]);
    }

    #[test]
    fn unregistered_id_returns_zero() {
        let ctx = ctx_with(1, 0.8);
        let sampler = GradientSampler::new(SamplerConfig::for_gradient(EntityId::new(2)));
        assert_eq!(sample(&sampler, &ctx), 0.0);

        let mut out = [9.0; 2];
        sampler.get_values(&ctx, &[Vec3::ZERO, Vec3::ONE], &mut out);
        assert_eq!(out, [0.0, 0.0]);
    }

    #[test]
    fn invert_then_levels_then_opacity() {
        let ctx = ctx_with(1, 0.75);
        let mut config = SamplerConfig::for_gradient(EntityId::new(1));
        config.invert_input = true;
        config.levels.enabled = true;
        config.levels.input_mid = 0.25;
        config.opacity = 0.5;
        let sampler = GradientSampler::new(config);

        // 1 - 0.75 = 0.25 sits on the pivot -> 0.5, then * 0.5
        assert!((sample(&sampler, &ctx) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn caller_params_are_not_mutated() {
        let ctx = GradientContext::new();
        ctx.registry().register(
            EntityId::new(1),
            Arc::new(FnGradient::new(|p: Vec3| p.x)),
        );
        let mut config = SamplerConfig::for_gradient(EntityId::new(1));
        config.transform.enabled = true;
        config.transform.translate = Vec3::new(0.25, 0.0, 0.0);
        let sampler = GradientSampler::new(config);

        let params = GradientSampleParams::new(Vec3::new(0.5, 0.0, 0.0));
        assert!((sampler.get_value(&ctx, &params) - 0.75).abs() < 1e-6);
        assert_eq!(params.position, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn mismatched_lengths_write_common_prefix() {
        if cfg!(debug_assertions) {
            return;
        }
        let ctx = ctx_with(1, 0.5);
        let sampler = GradientSampler::new(SamplerConfig::for_gradient(EntityId::new(1)));
        let mut out = [9.0; 3];
        sampler.get_values(&ctx, &[Vec3::ZERO; 2], &mut out);
        assert_eq!(out, [0.5, 0.5, 9.0]);
    }

    #[test]
    fn self_reference_is_rejected_and_cleared() {
        let ctx = ctx_with(1, 0.5);
        let owner = EntityId::new(1);
        let mut sampler = GradientSampler::with_owner(SamplerConfig::default(), owner);

        let err = sampler.set_gradient_id(&ctx, owner).unwrap_err();
        assert!(matches!(err, SamplerError::SelfReference { .. }));
        assert!(err.to_string().contains("cannot reference itself"));
        assert!(!sampler.config.gradient_id.is_valid());

        // A self-reference that slipped in some other way gets cleared.
        sampler.config.gradient_id = owner;
        assert!(!sampler.validate_gradient_id());
        assert!(!sampler.config.gradient_id.is_valid());

        sampler.config.gradient_id = EntityId::new(2);
        assert!(sampler.validate_gradient_id());
        assert_eq!(sampler.config.gradient_id, EntityId::new(2));
    }

    #[test]
    fn clearing_reference_is_always_allowed() {
        let ctx = GradientContext::new();
        let mut sampler = GradientSampler::with_owner(
            SamplerConfig::for_gradient(EntityId::new(3)),
            EntityId::new(1),
        );
        assert!(sampler.set_gradient_id(&ctx, EntityId::INVALID).is_ok());
        assert!(!sampler.config.gradient_id.is_valid());
    }

    #[test]
    fn hierarchy_includes_direct_reference() {
        let ctx = ctx_with(4, 0.5);
        let sampler = GradientSampler::new(SamplerConfig::for_gradient(EntityId::new(4)));
        assert!(sampler.is_entity_in_hierarchy(&ctx, EntityId::new(4)));
        assert!(!sampler.is_entity_in_hierarchy(&ctx, EntityId::new(5)));
        assert!(!sampler.is_entity_in_hierarchy(&ctx, EntityId::INVALID));
    }
}
