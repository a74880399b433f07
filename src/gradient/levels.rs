// gradient/levels.rs - Photo-editing style levels remap
//
// Normalizes a value against [input_min, input_max], bends it around the
// midtone pivot with a two-segment power curve, and rescales it into
// [output_min, output_max]. The pivot lands on the middle of the output
// range unless it sits on an input bound; a pivot halfway between the input
// bounds is a linear remap.

/// Lower bound on the normalized pivot (and `1 - pivot`). Keeps both curve
/// segments non-degenerate.
pub const MIN_PIVOT: f32 = 0.01;

/// Remap `input` through the levels curve.
///
/// All bounds and the input are clamped to [0, 1] first. When the input
/// bounds coincide the curve becomes a step at `input_min`.
///
/// `input_mid` maps to the middle of the output range only while its
/// normalized position stays inside `[MIN_PIVOT, 1 - MIN_PIVOT]`. A mid
/// on (or past) an input bound is clamped there, and the bound keeps mapping
/// to its output endpoint.
pub fn get_levels(
    input: f32,
    input_mid: f32,
    input_min: f32,
    input_max: f32,
    output_min: f32,
    output_max: f32,
) -> f32 {
    let input = input.clamp(0.0, 1.0);
    let input_min = input_min.clamp(0.0, 1.0);
    let input_max = input_max.clamp(0.0, 1.0);
    let output_min = output_min.clamp(0.0, 1.0);
    let output_max = output_max.clamp(0.0, 1.0);

    let corrected = if input_min == input_max {
        if input <= input_min {
            0.0
        } else {
            1.0
        }
    } else {
        let span = input_max - input_min;
        let t = ((input - input_min) / span).clamp(0.0, 1.0);
        let pivot = ((input_mid - input_min) / span).clamp(MIN_PIVOT, 1.0 - MIN_PIVOT);
        pivot_curve(t, pivot)
    };

    output_min + (output_max - output_min) * corrected
}

/// Two-segment power curve through (0,0), (pivot,0.5) and (1,1).
fn pivot_curve(t: f32, pivot: f32) -> f32 {
    if t <= pivot {
        0.5 * (t / pivot).powf(2.0 * pivot)
    } else {
        let upper = 1.0 - pivot;
        1.0 - 0.5 * ((1.0 - t) / upper).powf(2.0 * upper)
    }
}
