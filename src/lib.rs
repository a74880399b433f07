//! Gradient sampling pipeline.
//!
//! A [`GradientSampler`](gradient::sampler::GradientSampler) fetches a scalar
//! value from a referenced [`GradientSource`](gradient::source::GradientSource)
//! and runs it through the transform, invert, levels and opacity stages.
//! Cross-subsystem dispatch is serialized by the
//! [`DispatchCoordinator`](gradient::dispatch::DispatchCoordinator) owned by a
//! [`GradientContext`](gradient::context::GradientContext).

pub mod error;
pub mod gradient;

pub use error::{SamplerError, SamplerResult};
pub use gradient::config::{LevelsConfig, SamplerConfig, TransformConfig};
pub use gradient::context::GradientContext;
pub use gradient::math::Vec3;
pub use gradient::sampler::{GradientSampleParams, GradientSampler};
pub use gradient::source::{EntityId, GradientSource};
