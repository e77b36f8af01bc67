// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! The conjunctive formula: a substitution, pending equalities and nested
//! disjunctions.
//!
//! A [`Conjunction`] is a value. Adding to it never changes a formula that
//! has already been shared, since every component is a persistent
//! structure and cloning is cheap. Once falsified, a conjunction keeps
//! only its witness and ignores further additions.

use std::collections::BTreeSet;
use std::fmt;

use im::OrdSet;
use itertools::Itertools;
use symbolic_term::{BooleanFacts, BuiltinOp, EvalContext, Term, Variable};
use thiserror::Error;

use crate::disjunction::Disjunction;
use crate::equality::{Equality, TruthValue};
use crate::substitution::Substitution;

/// A formula was shown unsatisfiable. `witness` is the equality that
/// turned out false.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Error)]
#[error("contradiction: {witness}")]
pub struct Contradiction {
    pub witness: Equality,
}

impl Contradiction {
    pub fn new(witness: Equality) -> Self {
        Contradiction { witness }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Conjunction {
    substitution: Substitution,
    equalities: OrdSet<Equality>,
    disjunctions: OrdSet<Disjunction>,
    contradiction: Option<Contradiction>,
}

impl Conjunction {
    /// The empty, trivially true conjunction.
    pub fn new() -> Self {
        Conjunction::default()
    }

    pub fn falsified(witness: Equality) -> Self {
        Conjunction {
            contradiction: Some(Contradiction::new(witness)),
            ..Conjunction::default()
        }
    }

    pub(crate) fn from_parts(
        substitution: Substitution,
        equalities: OrdSet<Equality>,
        disjunctions: OrdSet<Disjunction>,
    ) -> Self {
        debug_assert!(
            !equalities.iter().any(Equality::is_empty_vs_non_empty_list),
            "equality between an empty and a non-empty list must be falsified"
        );
        Conjunction {
            substitution,
            equalities,
            disjunctions,
            contradiction: None,
        }
    }

    pub fn from_equalities(equalities: impl IntoIterator<Item = Equality>) -> Self {
        let mut conjunction = Conjunction::new();
        for equality in equalities {
            conjunction.add_equality(equality);
        }
        conjunction
    }

    pub fn substitution(&self) -> &Substitution {
        &self.substitution
    }

    pub fn equalities(&self) -> &OrdSet<Equality> {
        &self.equalities
    }

    pub fn disjunctions(&self) -> &OrdSet<Disjunction> {
        &self.disjunctions
    }

    pub fn contradiction(&self) -> Option<&Contradiction> {
        self.contradiction.as_ref()
    }

    pub fn truth_value(&self) -> TruthValue {
        if self.contradiction.is_some() {
            TruthValue::False
        } else if self.substitution.is_empty()
            && self.equalities.is_empty()
            && self.disjunctions.is_empty()
        {
            TruthValue::True
        } else {
            TruthValue::Unknown
        }
    }

    pub fn is_true(&self) -> bool {
        self.truth_value() == TruthValue::True
    }

    pub fn is_false(&self) -> bool {
        self.contradiction.is_some()
    }

    pub fn into_result(self) -> Result<Conjunction, Contradiction> {
        match self.contradiction {
            Some(contradiction) => Err(contradiction),
            None => Ok(self),
        }
    }

    fn falsify(&mut self, witness: Equality) {
        *self = Conjunction::falsified(witness);
    }

    pub fn add_terms(&mut self, lhs: Term, rhs: Term) {
        self.add_equality(Equality::new(lhs, rhs));
    }

    /// Adds each term as a side condition, `term = true`.
    pub fn add_condition(&mut self, conditions: impl IntoIterator<Item = Term>) {
        for condition in conditions {
            self.add_terms(condition, Term::Bool(true));
        }
    }

    pub fn add_equality(&mut self, equality: Equality) {
        if self.is_false() {
            return;
        }
        if let Some(parts) = decompose_connective(&equality) {
            for part in parts {
                self.add_equality(part);
            }
            return;
        }
        match equality.truth_value() {
            TruthValue::True => {}
            TruthValue::False => self.falsify(equality),
            TruthValue::Unknown => {
                if !self.equalities.contains(&equality.reversed()) {
                    self.equalities.insert(equality);
                }
            }
        }
    }

    /// Adds every binding as an equality.
    pub fn add_substitution(&mut self, substitution: &Substitution) {
        for equality in substitution.equalities() {
            self.add_equality(equality);
        }
    }

    pub fn add_disjunction(&mut self, disjunction: Disjunction) {
        if self.is_false() {
            return;
        }
        let members: Vec<Conjunction> = disjunction
            .conjunctions()
            .iter()
            .filter(|conjunction| !conjunction.is_false())
            .cloned()
            .collect();
        match members.as_slice() {
            [] => self.falsify(
                disjunction
                    .conjunctions()
                    .iter()
                    .find_map(|conjunction| conjunction.contradiction().cloned())
                    .map_or_else(
                        || Equality::new(Term::Bool(true), Term::Bool(false)),
                        |contradiction| contradiction.witness,
                    ),
            ),
            [only] => self.add_conjunction(only),
            _ if members.iter().any(Conjunction::is_true) => {}
            _ => {
                self.disjunctions.insert(Disjunction::new(members));
            }
        }
    }

    pub fn add_conjunction(&mut self, other: &Conjunction) {
        if self.is_false() {
            return;
        }
        if let Some(contradiction) = &other.contradiction {
            self.falsify(contradiction.witness.clone());
            return;
        }
        for (var, term) in other.substitution.iter() {
            self.unsafe_add_variable_binding(var.clone(), term.clone());
        }
        for equality in other.equalities.iter() {
            self.add_equality(equality.clone());
        }
        for disjunction in other.disjunctions.iter() {
            self.add_disjunction(disjunction.clone());
        }
    }

    /// Binds `var` directly, without simplification. Binding an already
    /// bound variable to a different term falsifies the conjunction.
    pub fn unsafe_add_variable_binding(&mut self, var: Variable, term: Term) {
        if self.is_false() {
            return;
        }
        if let Err(bound) = self.substitution.insert(var, term.clone()) {
            self.falsify(Equality::new(bound, term));
        }
    }

    /// Removes `equality`, in either orientation, from the pending
    /// equalities or the substitution.
    pub fn minus(&self, equality: &Equality) -> Conjunction {
        if self.is_false() {
            return self.clone();
        }
        let mut result = self.clone();
        result.equalities.remove(equality);
        result.equalities.remove(&equality.reversed());
        for (var, term) in [
            (equality.lhs(), equality.rhs()),
            (equality.rhs(), equality.lhs()),
        ] {
            if let Some(var) = var.as_var() {
                if result.substitution.get(var) == Some(term) {
                    result.substitution = result.substitution.minus(var);
                }
            }
        }
        result
    }

    /// Drops the bindings of `vars` once they are no longer needed.
    pub fn remove_bindings(&self, vars: &BTreeSet<Variable>) -> Conjunction {
        if self.is_false() {
            return self.clone();
        }
        Conjunction {
            substitution: self.substitution.minus_all(vars),
            ..self.clone()
        }
    }

    /// Only bindings, no pending equalities or disjunctions.
    pub fn is_substitution(&self) -> bool {
        !self.is_false() && self.equalities.is_empty() && self.disjunctions.is_empty()
    }

    /// A substitution binding exactly `vars`.
    pub fn is_matching(&self, vars: &BTreeSet<Variable>) -> bool {
        self.is_substitution() && self.substitution.keys().eq(vars.iter())
    }

    pub fn contains_equality(&self, equality: &Equality) -> bool {
        let bound = |var: &Term, term: &Term| {
            var.as_var()
                .map_or(false, |var| self.substitution.get(var) == Some(term))
        };
        self.equalities.contains(equality)
            || self.equalities.contains(&equality.reversed())
            || bound(equality.lhs(), equality.rhs())
            || bound(equality.rhs(), equality.lhs())
    }

    /// Cheap syntactic unsatisfiability check: some term is asserted both
    /// `false` and `true`, or asserted `false` while it is one of the
    /// equalities of this formula read as a `==K` term.
    pub fn is_false_from_contradictions(&self) -> bool {
        if self.is_false() {
            return false;
        }
        let mut facts = BTreeSet::new();
        let mut true_terms = BTreeSet::new();
        let mut false_terms = BTreeSet::new();

        let bindings = self
            .substitution
            .iter()
            .map(|(var, term)| (Term::Var(var.clone()), term.clone()));
        let pairs = self
            .equalities
            .iter()
            .map(|equality| (equality.lhs().clone(), equality.rhs().clone()));
        for (lhs, rhs) in bindings.chain(pairs) {
            match (&lhs, &rhs) {
                (term, Term::Bool(true)) | (Term::Bool(true), term) => {
                    true_terms.insert(term.clone());
                }
                (term, Term::Bool(false)) | (Term::Bool(false), term) => {
                    false_terms.insert(term.clone());
                }
                _ => {}
            }
            facts.insert(Term::eq_k(rhs.clone(), lhs.clone()));
            facts.insert(Term::eq_k(lhs, rhs));
        }
        false_terms
            .iter()
            .any(|term| facts.contains(term) || true_terms.contains(term))
    }

    pub fn is_false_extended(&self) -> bool {
        self.is_false() || self.is_false_from_contradictions()
    }

    /// Reorients bindings `X ↦ Y` with `Y` in `vars` and `X` outside it into
    /// `Y ↦ X`, renaming `Y` to `X` everywhere else, so that the variables
    /// of `vars` end up as keys wherever an equivalence class allows it.
    pub fn orient_substitution(&self, vars: &BTreeSet<Variable>, ctx: &EvalContext) -> Conjunction {
        if self.is_false() {
            return self.clone();
        }
        let mut renaming = Substitution::new();
        for (key, value) in self.substitution.iter() {
            if vars.contains(key) {
                continue;
            }
            if let Some(value) = value.as_var() {
                if vars.contains(value) && !renaming.contains_key(value) {
                    renaming = renaming
                        .plus(value.clone(), Term::Var(key.clone()))
                        .unwrap_or(renaming);
                }
            }
        }
        if renaming.is_empty() {
            return self.clone();
        }

        let mut result = Conjunction::new();
        for (key, value) in self.substitution.iter() {
            match value.as_var() {
                Some(value_var) if renaming.get(value_var) == Some(&Term::Var(key.clone())) => {
                    result.unsafe_add_variable_binding(value_var.clone(), Term::Var(key.clone()));
                }
                _ => {
                    let value = symbolic_term::substitute_and_evaluate(value, &renaming, ctx);
                    result.unsafe_add_variable_binding(key.clone(), value);
                }
            }
        }
        for equality in self.equalities.iter() {
            result.add_equality(equality.substitute_and_evaluate(&renaming, ctx));
        }
        for disjunction in self.disjunctions.iter() {
            result.add_disjunction(disjunction.substitute_and_evaluate(&renaming, ctx));
        }
        result
    }

    /// Removes from `constraint` every binding, equality and disjunction
    /// that `self` already contains.
    pub fn simplify_constraint(&self, constraint: &Conjunction) -> Conjunction {
        if constraint.is_false() {
            return constraint.clone();
        }
        let substitution = constraint
            .substitution
            .iter()
            .filter(|(var, term)| {
                !self.contains_equality(&Equality::new(Term::Var((*var).clone()), (*term).clone()))
            })
            .map(|(var, term)| (var.clone(), term.clone()))
            .collect();
        let equalities = constraint
            .equalities
            .iter()
            .filter(|equality| !self.contains_equality(equality))
            .cloned()
            .collect();
        let disjunctions = constraint
            .disjunctions
            .iter()
            .filter(|disjunction| !self.disjunctions.contains(disjunction))
            .cloned()
            .collect();
        Conjunction::from_parts(substitution, equalities, disjunctions)
    }

    /// Treats the named symbols as injective: `f(A1..An) = f(B1..Bn)`
    /// becomes `A1 = B1 ∧ .. ∧ An = Bn`, repeatedly.
    pub fn resolve_matching_symbols(&self, names: &BTreeSet<String>) -> Conjunction {
        if self.is_false() {
            return self.clone();
        }
        let mut result = Conjunction {
            equalities: OrdSet::new(),
            ..self.clone()
        };
        let mut worklist: Vec<Equality> = self.equalities.iter().cloned().collect();
        while let Some(equality) = worklist.pop() {
            match (equality.lhs(), equality.rhs()) {
                (
                    Term::App {
                        symbol: lsym,
                        args: largs,
                        ..
                    },
                    Term::App {
                        symbol: rsym,
                        args: rargs,
                        ..
                    },
                ) if lsym == rsym
                    && largs.len() == rargs.len()
                    && names.contains(lsym.name()) =>
                {
                    worklist.extend(
                        largs
                            .iter()
                            .zip(rargs)
                            .map(|(l, r)| Equality::new(l.clone(), r.clone())),
                    );
                }
                _ => result.add_equality(equality),
            }
        }
        result
    }

    /// Applies `bindings` to every part of the formula. Bindings of the
    /// formula itself come back as equalities.
    pub fn substitute_and_evaluate(&self, bindings: &Substitution, ctx: &EvalContext) -> Conjunction {
        if self.is_false() {
            return self.clone();
        }
        let mut result = Conjunction::new();
        for equality in self.substitution.equalities().chain(self.equalities.iter().cloned()) {
            result.add_equality(equality.substitute_and_evaluate(bindings, ctx));
        }
        for disjunction in self.disjunctions.iter() {
            result.add_disjunction(disjunction.substitute_and_evaluate(bindings, ctx));
        }
        result
    }

    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    pub(crate) fn collect_variables(&self, vars: &mut BTreeSet<Variable>) {
        for (var, term) in self.substitution.iter() {
            vars.insert(var.clone());
            term.collect_variables(vars);
        }
        for equality in self.equalities.iter() {
            equality.collect_variables(vars);
        }
        for disjunction in self.disjunctions.iter() {
            for conjunction in disjunction.conjunctions() {
                conjunction.collect_variables(vars);
            }
        }
    }

    /// Conditions of the if-then-else terms anywhere in the formula, in a
    /// fixed order without duplicates.
    pub fn if_then_else_conditions(&self) -> Vec<Term> {
        let mut conditions = vec![];
        for (_, term) in self.substitution.iter() {
            conditions.extend(term.if_then_else_conditions());
        }
        for equality in self.equalities.iter() {
            conditions.extend(equality.lhs().if_then_else_conditions());
            conditions.extend(equality.rhs().if_then_else_conditions());
        }
        for disjunction in self.disjunctions.iter() {
            for conjunction in disjunction.conjunctions() {
                conditions.extend(conjunction.if_then_else_conditions());
            }
        }
        conditions.into_iter().unique().collect()
    }

    fn parts(&self) -> Vec<String> {
        let bindings = self
            .substitution
            .iter()
            .map(|(var, term)| format!("{} = {}", var.name(), term));
        let equalities = self.equalities.iter().map(ToString::to_string);
        let disjunctions = self.disjunctions.iter().map(|d| format!("({d})"));
        bindings.chain(equalities).chain(disjunctions).collect()
    }

    pub fn to_string_multiline(&self) -> String {
        match &self.contradiction {
            Some(contradiction) => format!("false\n  witness: {}", contradiction.witness),
            None if self.is_true() => "true".to_string(),
            None => self
                .parts()
                .iter()
                .map(|part| format!("  {part}"))
                .join("\n/\\\n"),
        }
    }
}

/// Splits `x andBool y = true`, `x orBool y = false` and `notBool x = b`,
/// in either orientation.
fn decompose_connective(equality: &Equality) -> Option<Vec<Equality>> {
    let split = |term: &Term, value: bool| -> Option<Vec<Equality>> {
        let Term::Builtin { op, args } = term else {
            return None;
        };
        match (op, args.as_slice(), value) {
            (BuiltinOp::AndBool, [x, y], true) | (BuiltinOp::OrBool, [x, y], false) => Some(vec![
                Equality::new(x.clone(), Term::Bool(value)),
                Equality::new(y.clone(), Term::Bool(value)),
            ]),
            (BuiltinOp::NotBool, [x], _) => Some(vec![Equality::new(x.clone(), Term::Bool(!value))]),
            _ => None,
        }
    };
    match (equality.lhs(), equality.rhs()) {
        (term, Term::Bool(value)) | (Term::Bool(value), term) => split(term, *value),
        _ => None,
    }
}

/// Truth of `term` according to the given bindings and equalities.
pub(crate) fn truth_from_facts<'a>(
    term: &Term,
    substitution: &Substitution,
    equalities: impl Iterator<Item = &'a Equality>,
) -> Option<bool> {
    if let Term::Builtin {
        op: BuiltinOp::NotBool,
        args,
    } = term
    {
        if let [inner] = args.as_slice() {
            return truth_from_facts(inner, substitution, equalities).map(|value| !value);
        }
    }
    if let Some(var) = term.as_var() {
        if let Some(Term::Bool(value)) = substitution.get(var) {
            return Some(*value);
        }
    }
    let as_eq_k = match term {
        Term::Builtin {
            op: BuiltinOp::EqK,
            args,
        } => match args.as_slice() {
            [lhs, rhs] => Some((lhs, rhs)),
            _ => None,
        },
        _ => None,
    };
    if let Some((lhs, rhs)) = as_eq_k {
        if let Some(var) = lhs.as_var() {
            if substitution.get(var) == Some(rhs) {
                return Some(true);
            }
        }
    }
    for equality in equalities {
        match (equality.lhs(), equality.rhs()) {
            (fact, Term::Bool(value)) | (Term::Bool(value), fact) if fact == term => {
                return Some(*value);
            }
            (fact_lhs, fact_rhs) => {
                if let Some((lhs, rhs)) = as_eq_k {
                    if (lhs == fact_lhs && rhs == fact_rhs) || (lhs == fact_rhs && rhs == fact_lhs) {
                        return Some(true);
                    }
                }
            }
        }
    }
    None
}

impl BooleanFacts for Conjunction {
    fn truth_of(&self, term: &Term) -> Option<bool> {
        if self.is_false() {
            return None;
        }
        truth_from_facts(term, &self.substitution, self.equalities.iter())
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.contradiction {
            Some(_) => f.write_str("false"),
            None if self.is_true() => f.write_str("true"),
            None => write!(f, "{}", self.parts().iter().format(" /\\ ")),
        }
    }
}
