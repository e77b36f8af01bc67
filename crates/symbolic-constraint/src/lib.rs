// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Symbolic constraint engine.
//!
//! Constraints are conjunctions of variable bindings, pending equalities
//! and nested disjunctions over [`symbolic_term::Term`]s. The engine
//! simplifies them to a fixpoint by unification ([`Conjunction::simplify`]),
//! converts them to disjunctive normal form ([`Conjunction::to_dnf`]) and
//! decides entailment between them ([`Conjunction::implies`]), falling back
//! to an SMT solver through the [`SmtBridge`] when local reasoning runs out.
//!
//! All shared state (caches, solver, diagnostics) lives in an explicit
//! [`ReasoningContext`].

pub mod cache;
pub mod conjunction;
pub mod context;
pub mod diagnostics;
pub mod disjunction;
pub mod equality;
pub mod implication;
pub mod options;
pub mod simplify;
pub mod smt;
pub mod substitution;
pub mod unifier;

pub use cache::{ImplicationCache, ImplicationKey, SimplificationCache, Simplified};
pub use conjunction::{Conjunction, Contradiction};
pub use context::ReasoningContext;
pub use diagnostics::{DiagnosticsSink, LogSink, NullSink, TraceEvent};
pub use disjunction::Disjunction;
pub use equality::{Equality, TruthValue};
pub use options::{EngineOptions, SmtOptions, SmtSolver};
pub use simplify::SimplifyMode;
pub use smt::{DisabledBridge, Phase, SmtBridge, SmtError, SmtOperations, SmtProfiler, SolverRequest};
pub use substitution::Substitution;
pub use unifier::{StructuralUnifier, UnificationFailure, Unifier};
