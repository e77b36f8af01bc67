// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use symbolic_term::{Definition, EvalContext};

use crate::cache::{ImplicationCache, SimplificationCache};
use crate::diagnostics::{DiagnosticsSink, LogSink, TraceEvent};
use crate::options::{EngineOptions, SmtSolver};
use crate::smt::{DisabledBridge, Phase, SmtBridge, SmtOperations, SolverRequest};
use crate::unifier::{StructuralUnifier, Unifier};

/// Everything a reasoning call needs besides its formulas. Cloning shares
/// the caches, the solver and the phase flag.
#[derive(Clone)]
pub struct ReasoningContext {
    definition: Arc<Definition>,
    options: Arc<EngineOptions>,
    simplifications: Arc<SimplificationCache>,
    implications: Arc<ImplicationCache>,
    unifier: Arc<dyn Unifier>,
    bridge: Arc<dyn SmtBridge>,
    sink: Arc<dyn DiagnosticsSink>,
    execution_phase: Arc<AtomicBool>,
}

impl ReasoningContext {
    pub fn new(definition: Definition, options: EngineOptions) -> Self {
        let bridge: Arc<dyn SmtBridge> = match options.smt.solver {
            SmtSolver::Z3 => Arc::new(SmtOperations::new(options.smt.clone())),
            SmtSolver::None => Arc::new(DisabledBridge),
        };
        ReasoningContext {
            definition: Arc::new(definition),
            simplifications: Arc::new(SimplificationCache::new(options.cache_capacity)),
            implications: Arc::new(ImplicationCache::new()),
            options: Arc::new(options),
            unifier: Arc::new(StructuralUnifier),
            bridge,
            sink: Arc::new(LogSink),
            execution_phase: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_unifier(self, unifier: Arc<dyn Unifier>) -> Self {
        ReasoningContext { unifier, ..self }
    }

    pub fn with_bridge(self, bridge: Arc<dyn SmtBridge>) -> Self {
        ReasoningContext { bridge, ..self }
    }

    pub fn with_sink(self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        ReasoningContext { sink, ..self }
    }

    pub fn definition(&self) -> &Definition {
        &self.definition
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn eval_context(&self) -> EvalContext<'_> {
        EvalContext::new(&self.definition)
    }

    pub fn simplification_cache(&self) -> &SimplificationCache {
        &self.simplifications
    }

    pub fn implication_cache(&self) -> &ImplicationCache {
        &self.implications
    }

    pub fn unifier(&self) -> &dyn Unifier {
        self.unifier.as_ref()
    }

    pub fn bridge(&self) -> &dyn SmtBridge {
        self.bridge.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.execution_phase.load(Ordering::Relaxed) {
            Phase::Execution
        } else {
            Phase::Initialization
        }
    }

    /// Switches every clone of this context to the execution phase.
    pub fn enter_execution_phase(&self) {
        self.execution_phase.store(true, Ordering::Relaxed);
    }

    pub fn constraint_request(&self) -> SolverRequest {
        SolverRequest::new(self.phase(), self.options.smt.constraint_timeout_ms)
    }

    pub fn implication_request(&self) -> SolverRequest {
        SolverRequest::new(self.phase(), self.options.smt.implication_timeout_ms)
    }

    /// Records an event if the sink wants it. The event is only built in
    /// that case.
    pub fn emit(&self, event: impl FnOnce() -> TraceEvent) {
        if self.sink.enabled() {
            self.sink.record(&event());
        }
    }
}
