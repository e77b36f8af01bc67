// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Delegation of satisfiability and implication questions to an external
//! SMT solver.
//!
//! A bridge answers `true` only when the solver proves the question. Every
//! failure, including a disabled solver, reads as "not proved".

use std::collections::BTreeSet;
use std::fmt;

use log::debug;
use symbolic_term::Variable;

use crate::conjunction::Conjunction;

pub mod error;
pub mod operations;
pub mod process;
pub mod translate;

pub use error::{SmtError, SmtResult};
pub use operations::{SmtOperations, SmtProfiler};
pub use translate::SmtLibTranslator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Initialization,
    Execution,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Initialization => write!(f, "init phase"),
            Phase::Execution => write!(f, "execution phase"),
        }
    }
}

/// Per-call solver parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverRequest {
    pub phase: Phase,
    pub timeout_ms: u64,
}

impl SolverRequest {
    pub fn new(phase: Phase, timeout_ms: u64) -> Self {
        SolverRequest { phase, timeout_ms }
    }
}

pub trait SmtBridge: Send + Sync {
    /// True iff the solver proves `constraint` unsatisfiable.
    fn check_unsat(&self, constraint: &Conjunction, request: &SolverRequest) -> bool;

    /// True iff the solver proves that `left` implies `right`, where the
    /// variables of `existentials` are existentially quantified in `right`.
    fn implies(
        &self,
        left: &Conjunction,
        right: &Conjunction,
        existentials: &BTreeSet<Variable>,
        request: &SolverRequest,
    ) -> bool;
}

/// Bridge used when no solver is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBridge;

impl SmtBridge for DisabledBridge {
    fn check_unsat(&self, _constraint: &Conjunction, request: &SolverRequest) -> bool {
        debug!("{}: {}", request.phase, SmtError::Disabled);
        false
    }

    fn implies(
        &self,
        _left: &Conjunction,
        _right: &Conjunction,
        _existentials: &BTreeSet<Variable>,
        request: &SolverRequest,
    ) -> bool {
        debug!("{}: {}", request.phase, SmtError::Disabled);
        false
    }
}
