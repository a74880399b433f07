pub mod cache;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod dispatch;
pub mod gradients;
pub mod grid;
pub mod levels;
pub mod math;
pub mod sampler;
pub mod source;
