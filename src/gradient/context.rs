// gradient/context.rs - Everything an evaluation needs besides the sampler
//
// The context owns the registry, the dispatch coordinator and the
// diagnostic sink. It is passed by reference into every gradient and
// surface entry point instead of living in global state. Sources receive
// the same reference, so nothing in the registry ever points back at the
// context.

use crate::gradient::diagnostics::DiagnosticSink;
use crate::gradient::dispatch::DispatchCoordinator;
use crate::gradient::source::GradientRegistry;

#[derive(Default)]
pub struct GradientContext {
    registry: GradientRegistry,
    dispatch: DispatchCoordinator,
    diagnostics: DiagnosticSink,
}

impl GradientContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &GradientRegistry {
        &self.registry
    }

    pub fn dispatch(&self) -> &DispatchCoordinator {
        &self.dispatch
    }

    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }
}
