// gradient/source.rs - Gradient providers and their registry
//
// A sampler never owns its source. It holds an `EntityId` and resolves it
// through the `GradientRegistry` on every call, so an id may be invalid,
// unregistered, or re-registered between calls.

use crate::gradient::context::GradientContext;
use crate::gradient::math::Vec3;
use crate::gradient::sampler::GradientSampleParams;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── EntityId ────────────────────────────────────────────────────────

/// Opaque handle naming a gradient provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    pub const INVALID: EntityId = EntityId(u64::MAX);

    pub const fn new(raw: u64) -> Self {
        EntityId(raw)
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "[{}]", self.0)
        } else {
            f.write_str("[invalid]")
        }
    }
}

// ── GradientSource ──────────────────────────────────────────────────

/// A scalar field that samplers can read from.
///
/// Implementations that themselves read other gradients must do so through a
/// [`GradientSampler`](crate::gradient::sampler::GradientSampler) and the
/// `ctx` they were handed, so that cycle detection sees the whole chain.
pub trait GradientSource: Send + Sync {
    fn get_value(&self, ctx: &GradientContext, params: &GradientSampleParams) -> f32;

    /// Batch form. `out_values.len() == positions.len()`.
    fn get_values(&self, ctx: &GradientContext, positions: &[Vec3], out_values: &mut [f32]) {
        for (position, out) in positions.iter().zip(out_values.iter_mut()) {
            *out = self.get_value(ctx, &GradientSampleParams::new(*position));
        }
    }

    /// Whether `entity` appears anywhere in this source's reference chain.
    fn is_entity_in_hierarchy(&self, _ctx: &GradientContext, _entity: EntityId) -> bool {
        false
    }
}

// ── GradientRegistry ────────────────────────────────────────────────

/// Thread-safe id → source map.
///
/// Lookups hand out a cloned `Arc` so no registry lock is held while a
/// source evaluates (sources may look up other sources re-entrantly).
#[derive(Default)]
pub struct GradientRegistry {
    sources: RwLock<FxHashMap<EntityId, Arc<dyn GradientSource>>>,
    generation: AtomicU64,
}

impl GradientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the source for `id`. Returns the previous one.
    /// Registering under `EntityId::INVALID` is ignored.
    pub fn register(
        &self,
        id: EntityId,
        source: Arc<dyn GradientSource>,
    ) -> Option<Arc<dyn GradientSource>> {
        if !id.is_valid() {
            log::warn!(target: "gradient_signal", "ignoring gradient registration under an invalid id");
            return None;
        }
        let previous = self.sources.write().insert(id, source);
        self.generation.fetch_add(1, Ordering::AcqRel);
        log::debug!(target: "gradient_signal", "registered gradient {}", id);
        previous
    }

    pub fn unregister(&self, id: EntityId) -> Option<Arc<dyn GradientSource>> {
        let removed = self.sources.write().remove(&id);
        if removed.is_some() {
            self.generation.fetch_add(1, Ordering::AcqRel);
            log::debug!(target: "gradient_signal", "unregistered gradient {}", id);
        }
        removed
    }

    pub fn resolve(&self, id: EntityId) -> Option<Arc<dyn GradientSource>> {
        if !id.is_valid() {
            return None;
        }
        self.sources.read().get(&id).cloned()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.sources.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bumped on every mutation; used to invalidate cached previews.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
