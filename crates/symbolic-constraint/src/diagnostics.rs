// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Structured trace events. Recording them never influences a result.

use std::fmt;

use log::{debug, log_enabled, Level};
use symbolic_term::Term;

use crate::conjunction::Conjunction;
use crate::equality::Equality;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    ImplicationAttempted {
        left: Conjunction,
        right: Conjunction,
    },
    ProvedBySimplification {
        right: Conjunction,
    },
    CaseSplit {
        condition: Term,
    },
    SmtProved {
        left: Conjunction,
        right: Conjunction,
    },
    SmtFailed {
        left: Conjunction,
        right: Conjunction,
    },
    Falsified {
        witness: Equality,
    },
    UnificationFailure {
        lhs: Term,
        rhs: Term,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::ImplicationAttempted { left, right } => {
                write!(f, "attempting implication: {left} => {right}")
            }
            TraceEvent::ProvedBySimplification { right } => {
                write!(f, "proved by simplification, remaining {right}")
            }
            TraceEvent::CaseSplit { condition } => write!(f, "case split on {condition}"),
            TraceEvent::SmtProved { left, right } => write!(f, "smt proved {left} => {right}"),
            TraceEvent::SmtFailed { left, right } => {
                write!(f, "failure: cannot prove {left} => {right}")
            }
            TraceEvent::Falsified { witness } => write!(f, "falsified by {witness}"),
            TraceEvent::UnificationFailure { lhs, rhs } => {
                write!(f, "unification failure: {lhs} vs {rhs}")
            }
        }
    }
}

pub trait DiagnosticsSink: Send + Sync {
    /// Events are only built when this returns true.
    fn enabled(&self) -> bool;

    fn record(&self, event: &TraceEvent);
}

/// Forwards events to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn enabled(&self) -> bool {
        log_enabled!(Level::Debug)
    }

    fn record(&self, event: &TraceEvent) {
        debug!("{event}");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&self, _event: &TraceEvent) {}
}
