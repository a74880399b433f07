// gradient/grid.rs - 2D preview grids with rayon parallelism
//
// Samples a gradient sampler over an NxN grid of world-space positions.
// Each row is one batch request, and rows are spread across the rayon pool.
// Rows still serialize on the context's dispatch region while the source
// runs; the parallel part is position generation and post-processing.

use crate::gradient::context::GradientContext;
use crate::gradient::math::Vec3;
use crate::gradient::sampler::GradientSampler;
use rayon::prelude::*;
use serde::Serialize;

/// Result of sampling a gradient over a 2D grid.
#[derive(Debug, Clone, Serialize)]
pub struct GridResult {
    /// Row-major values. Length = resolution × resolution.
    pub values: Vec<f32>,
    pub resolution: u32,
    pub min_value: f32,
    pub max_value: f32,
}

/// Sample `sampler` over an NxN grid.
///
/// The grid covers [range_min, range_max] in both X and Y, sampling each
/// cell at its center. Z is fixed at `z_level`.
///
/// Must not be called from inside a gradient or surface dispatch: the pool
/// threads would wait on the region the calling thread already holds.
pub fn evaluate_grid(
    sampler: &GradientSampler,
    ctx: &GradientContext,
    resolution: u32,
    range_min: f32,
    range_max: f32,
    z_level: f32,
) -> GridResult {
    let n = resolution as usize;
    if n == 0 {
        return GridResult {
            values: Vec::new(),
            resolution,
            min_value: 0.0,
            max_value: 0.0,
        };
    }
    let step = (range_max - range_min) / n as f32;

    let row_results: Vec<(Vec<f32>, f32, f32)> = (0..n)
        .into_par_iter()
        .map(|y_idx| {
            let y = range_min + (y_idx as f32 + 0.5) * step;
            let positions: Vec<Vec3> = (0..n)
                .map(|x_idx| Vec3::new(range_min + (x_idx as f32 + 0.5) * step, y, z_level))
                .collect();

            let mut row = vec![0.0; n];
            sampler.get_values(ctx, &positions, &mut row);

            let row_min = row.iter().copied().fold(f32::MAX, f32::min);
            let row_max = row.iter().copied().fold(f32::MIN, f32::max);
            (row, row_min, row_max)
        })
        .collect();

    let mut values = Vec::with_capacity(n * n);
    let mut min_val = f32::MAX;
    let mut max_val = f32::MIN;

    for (row, r_min, r_max) in row_results {
        min_val = min_val.min(r_min);
        max_val = max_val.max(r_max);
        values.extend(row);
    }

    GridResult {
        values,
        resolution,
        min_value: min_val,
        max_value: max_val,
    }
}

/// World-space position of grid cell (`x_idx`, `y_idx`), matching
/// [`evaluate_grid`].
pub fn cell_center(
    resolution: u32,
    range_min: f32,
    range_max: f32,
    z_level: f32,
    x_idx: usize,
    y_idx: usize,
) -> Vec3 {
    let step = (range_max - range_min) / resolution as f32;
    Vec3::new(
        range_min + (x_idx as f32 + 0.5) * step,
        range_min + (y_idx as f32 + 0.5) * step,
        z_level,
    )
}
