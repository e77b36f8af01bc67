// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fmt;

use symbolic_term::{clashes, substitute_and_evaluate, Bindings, EvalContext, Term, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TruthValue {
    True,
    False,
    Unknown,
}

/// Two terms asserted equal. The truth value is decided structurally when
/// the equality is built.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Equality {
    lhs: Term,
    rhs: Term,
    truth: TruthValue,
}

impl Equality {
    pub fn new(lhs: Term, rhs: Term) -> Self {
        let truth = if lhs == rhs {
            TruthValue::True
        } else if clashes(&lhs, &rhs) {
            TruthValue::False
        } else {
            TruthValue::Unknown
        };
        Equality { lhs, rhs, truth }
    }

    pub fn lhs(&self) -> &Term {
        &self.lhs
    }

    pub fn rhs(&self) -> &Term {
        &self.rhs
    }

    pub fn truth_value(&self) -> TruthValue {
        self.truth
    }

    pub fn is_true(&self) -> bool {
        self.truth == TruthValue::True
    }

    pub fn is_false(&self) -> bool {
        self.truth == TruthValue::False
    }

    pub fn reversed(&self) -> Equality {
        Equality {
            lhs: self.rhs.clone(),
            rhs: self.lhs.clone(),
            truth: self.truth,
        }
    }

    /// Both sides have a shape the unifier can take apart.
    pub fn is_simplifiable(&self, pattern_folding: bool) -> bool {
        self.lhs.is_rigid(pattern_folding) && self.rhs.is_rigid(pattern_folding)
    }

    /// Equality between the empty list and a list with elements.
    pub fn is_empty_vs_non_empty_list(&self) -> bool {
        (self.lhs.is_empty_list() && self.rhs.is_non_empty_list())
            || (self.rhs.is_empty_list() && self.lhs.is_non_empty_list())
    }

    pub fn to_term(&self) -> Term {
        Term::eq_k(self.lhs.clone(), self.rhs.clone())
    }

    pub fn substitute_and_evaluate(&self, bindings: &dyn Bindings, ctx: &EvalContext) -> Equality {
        Equality::new(
            substitute_and_evaluate(&self.lhs, bindings, ctx),
            substitute_and_evaluate(&self.rhs, bindings, ctx),
        )
    }

    pub fn collect_variables(&self, vars: &mut BTreeSet<Variable>) {
        self.lhs.collect_variables(vars);
        self.rhs.collect_variables(vars);
    }
}

impl fmt::Display for Equality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}
