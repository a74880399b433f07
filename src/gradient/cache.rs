// gradient/cache.rs - LRU cache for preview grids
//
// Keyed by a hash of the sampler configuration, the grid parameters and the
// registry generation. Any registry mutation changes the generation, so a
// re-registered source never serves a stale preview.
//
// Results are stored behind `Arc` so cache hits return a reference count
// bump instead of cloning the value buffer.

use crate::gradient::context::GradientContext;
use crate::gradient::grid::{evaluate_grid, GridResult};
use crate::gradient::sampler::GradientSampler;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Grid sampling parameters, as passed to [`evaluate_grid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridRequest {
    pub resolution: u32,
    pub range_min: f32,
    pub range_max: f32,
    pub z_level: f32,
}

pub struct PreviewCache {
    grids: Mutex<LruCache<u64, Arc<GridResult>>>,
}

impl PreviewCache {
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        PreviewCache {
            grids: Mutex::new(LruCache::new(cap)),
        }
    }

    pub fn get(&self, hash: u64) -> Option<Arc<GridResult>> {
        self.grids.lock().get(&hash).cloned()
    }

    pub fn put(&self, hash: u64, result: GridResult) -> Arc<GridResult> {
        let result = Arc::new(result);
        self.grids.lock().put(hash, Arc::clone(&result));
        result
    }

    /// Return the cached preview for this sampler/request, evaluating and
    /// storing it on a miss.
    pub fn get_or_evaluate(
        &self,
        sampler: &GradientSampler,
        ctx: &GradientContext,
        request: GridRequest,
    ) -> Arc<GridResult> {
        let hash = hash_grid_request(sampler, request, ctx.registry().generation());
        if let Some(hit) = self.get(hash) {
            log::debug!(target: "gradient_signal", "preview cache hit {:016x}", hash);
            return hit;
        }
        // Evaluated without holding the cache lock.
        let result = evaluate_grid(
            sampler,
            ctx,
            request.resolution,
            request.range_min,
            request.range_max,
            request.z_level,
        );
        self.put(hash, result)
    }

    pub fn clear(&self) {
        self.grids.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.grids.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Request hashing ────────────────────────────────────────────────

/// Hash sampler config + grid params + registry generation deterministically.
pub fn hash_grid_request(sampler: &GradientSampler, request: GridRequest, generation: u64) -> u64 {
    let mut hasher = DefaultHasher::new();

    sampler.config.hash_into(&mut hasher);

    request.resolution.hash(&mut hasher);
    request.range_min.to_bits().hash(&mut hasher);
    request.range_max.to_bits().hash(&mut hasher);
    request.z_level.to_bits().hash(&mut hasher);

    generation.hash(&mut hasher);

    hasher.finish()
}
