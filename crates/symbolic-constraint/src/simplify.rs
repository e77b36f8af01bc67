// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Unification-based simplification of conjunctions.
//!
//! Pending equalities are visited in order. Each is first rewritten with
//! the bindings found so far and evaluated against the rest of the formula,
//! then either dropped, decomposed by the [`Unifier`](crate::Unifier),
//! turned into a binding, or kept. Passes repeat until a pass eliminates
//! nothing. Disjunctions are rewritten with the final bindings; one that
//! collapses to a single alternative is merged back and the loop restarts.

use im::OrdSet;
use itertools::Itertools;
use log::debug;
use symbolic_term::{BooleanFacts, Definition, EvalContext, FreshNames, Sort, Term, Variable};

use crate::conjunction::{truth_from_facts, Conjunction, Contradiction};
use crate::context::ReasoningContext;
use crate::diagnostics::TraceEvent;
use crate::disjunction::Disjunction;
use crate::equality::{Equality, TruthValue};
use crate::substitution::Substitution;

/// Flags that change the result of simplification. Both are part of the
/// cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SimplifyMode {
    /// Decompose equalities between applications of the same pattern symbol.
    pub pattern_folding: bool,
    /// Split list equalities even when the remainders stay unresolved.
    pub partial_simplification: bool,
}

impl SimplifyMode {
    pub const DEFAULT: SimplifyMode = SimplifyMode {
        pattern_folding: false,
        partial_simplification: true,
    };

    pub const BEFORE_PATTERN_FOLDING: SimplifyMode = SimplifyMode {
        pattern_folding: false,
        partial_simplification: false,
    };

    pub const MODULO_PATTERN_FOLDING: SimplifyMode = SimplifyMode {
        pattern_folding: true,
        partial_simplification: true,
    };
}

impl Default for SimplifyMode {
    fn default() -> Self {
        SimplifyMode::DEFAULT
    }
}

impl Conjunction {
    pub fn simplify(&self, ctx: &ReasoningContext) -> Result<Conjunction, Contradiction> {
        self.simplify_with(SimplifyMode::DEFAULT, false, ctx)
    }

    /// Leaves list equalities that cannot be fully resolved untouched.
    pub fn simplify_before_pattern_folding(
        &self,
        log_failures: bool,
        ctx: &ReasoningContext,
    ) -> Result<Conjunction, Contradiction> {
        self.simplify_with(SimplifyMode::BEFORE_PATTERN_FOLDING, log_failures, ctx)
    }

    pub fn simplify_modulo_pattern_folding(
        &self,
        ctx: &ReasoningContext,
    ) -> Result<Conjunction, Contradiction> {
        self.simplify_with(SimplifyMode::MODULO_PATTERN_FOLDING, false, ctx)
    }

    /// `log_failures` only controls logging of the falsifying equality and
    /// is not part of the cache key.
    pub fn simplify_with(
        &self,
        mode: SimplifyMode,
        log_failures: bool,
        ctx: &ReasoningContext,
    ) -> Result<Conjunction, Contradiction> {
        if let Some(contradiction) = self.contradiction() {
            return Err(contradiction.clone());
        }
        if self.is_true() {
            return Ok(self.clone());
        }
        if !ctx.options().cache_simplifications {
            return Simplifier::new(mode, log_failures, ctx).run(self);
        }
        ctx.simplification_cache().get_or_compute(self, mode, || {
            Simplifier::new(mode, log_failures, ctx).run(self)
        })
    }
}

/// Facts of the working formula, except the equality at `skip`.
struct RestFacts<'a> {
    substitution: &'a Substitution,
    equalities: &'a [Equality],
    skip: usize,
}

impl BooleanFacts for RestFacts<'_> {
    fn truth_of(&self, term: &Term) -> Option<bool> {
        let rest = self
            .equalities
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != self.skip)
            .map(|(_, equality)| equality);
        truth_from_facts(term, self.substitution, rest)
    }
}

enum Step {
    Drop,
    Keep(Equality),
    Replace(Vec<Equality>),
    Decompose(Vec<Equality>, Vec<Disjunction>),
    Bind(Variable, Term),
}

struct Simplifier<'a> {
    mode: SimplifyMode,
    log_failures: bool,
    ctx: &'a ReasoningContext,
    fresh: FreshNames,
    substitution: Substitution,
    pending: Vec<Equality>,
    disjunctions: Vec<Disjunction>,
}

impl<'a> Simplifier<'a> {
    fn new(mode: SimplifyMode, log_failures: bool, ctx: &'a ReasoningContext) -> Self {
        Simplifier {
            mode,
            log_failures,
            ctx,
            fresh: FreshNames::default(),
            substitution: Substitution::new(),
            pending: vec![],
            disjunctions: vec![],
        }
    }

    fn run(mut self, formula: &Conjunction) -> Result<Conjunction, Contradiction> {
        self.fresh = FreshNames::avoiding(&formula.variables());
        self.pending = formula
            .substitution()
            .equalities()
            .chain(formula.equalities().iter().cloned())
            .collect();
        self.disjunctions = formula.disjunctions().iter().cloned().collect();

        loop {
            self.solve_equalities()?;
            if !self.absorb_disjunctions()? {
                break;
            }
        }

        let equalities: OrdSet<Equality> = self.pending.into_iter().collect();
        let disjunctions: OrdSet<Disjunction> = self.disjunctions.into_iter().collect();
        Ok(Conjunction::from_parts(
            self.substitution,
            equalities,
            disjunctions,
        ))
    }

    fn fail(&self, witness: Equality) -> Contradiction {
        if self.log_failures {
            debug!("simplification failed on {witness}");
        }
        self.ctx.emit(|| TraceEvent::Falsified {
            witness: witness.clone(),
        });
        Contradiction::new(witness)
    }

    fn solve_equalities(&mut self) -> Result<(), Contradiction> {
        let definition = self.ctx.definition();
        let eval = EvalContext::new(definition);
        loop {
            let mut eliminated = false;
            let mut index = 0;
            while index < self.pending.len() {
                let equality = {
                    let facts = RestFacts {
                        substitution: &self.substitution,
                        equalities: &self.pending,
                        skip: index,
                    };
                    self.pending[index]
                        .substitute_and_evaluate(&self.substitution, &eval.with_facts(&facts))
                };
                match self.classify(equality, definition)? {
                    Step::Drop => {
                        self.pending.remove(index);
                    }
                    Step::Keep(equality) => {
                        self.pending[index] = equality;
                        index += 1;
                    }
                    Step::Replace(parts) => {
                        self.pending.splice(index..=index, parts);
                        eliminated = true;
                    }
                    Step::Decompose(parts, disjunctions) => {
                        self.pending.splice(index..=index, parts);
                        self.disjunctions.extend(disjunctions);
                        eliminated = true;
                    }
                    Step::Bind(var, term) => {
                        let binding = Substitution::singleton(var, term);
                        self.substitution = self
                            .substitution
                            .compose_and_evaluate(&binding, &eval)
                            .map_err(|witness| self.fail(witness))?;
                        self.pending.remove(index);
                        eliminated = true;
                    }
                }
            }
            if !eliminated {
                return Ok(());
            }
        }
    }

    fn classify(&self, equality: Equality, definition: &Definition) -> Result<Step, Contradiction> {
        match equality.truth_value() {
            TruthValue::True => return Ok(Step::Drop),
            TruthValue::False => return Err(self.fail(equality)),
            TruthValue::Unknown => {}
        }
        let (lhs, rhs) = (equality.lhs(), equality.rhs());
        if !definition
            .lattice()
            .have_common_subsort(&lhs.sort(), &rhs.sort())
        {
            return Err(self.fail(equality));
        }

        if equality.is_simplifiable(self.mode.pattern_folding) {
            return self.unify(equality);
        }

        match (lhs, rhs) {
            (Term::Var(left), Term::Var(right)) => {
                Ok(self.bind_variables(left, right, definition, &equality))
            }
            (Term::Var(var), term) | (term, Term::Var(var)) => {
                if !term.occurs(var) {
                    Ok(self
                        .narrow(var, term, definition)
                        .unwrap_or(Step::Keep(equality.clone())))
                } else if term.is_normal() {
                    Err(self.fail(equality.clone()))
                } else {
                    Ok(Step::Keep(equality.clone()))
                }
            }
            _ => Ok(Step::Keep(equality.clone())),
        }
    }

    fn unify(&self, equality: Equality) -> Result<Step, Contradiction> {
        let unified = self
            .ctx
            .unifier()
            .unify(equality.lhs(), equality.rhs(), self.mode, self.ctx)
            .map_err(|failure| {
                self.ctx.emit(|| TraceEvent::UnificationFailure {
                    lhs: failure.lhs.clone(),
                    rhs: failure.rhs.clone(),
                });
                self.fail(Equality::new(failure.lhs, failure.rhs))
            })?;
        if let Some(contradiction) = unified.contradiction() {
            return Err(self.fail(contradiction.witness.clone()));
        }

        let parts: Vec<Equality> = unified
            .substitution()
            .equalities()
            .chain(unified.equalities().iter().cloned())
            .collect();
        if unified.disjunctions().is_empty()
            && parts
                .iter()
                .any(|part| *part == equality || *part == equality.reversed())
        {
            return Ok(Step::Keep(equality));
        }
        Ok(Step::Decompose(
            parts,
            unified.disjunctions().iter().cloned().collect(),
        ))
    }

    fn bind_variables(
        &self,
        left: &Variable,
        right: &Variable,
        definition: &Definition,
        equality: &Equality,
    ) -> Step {
        let lattice = definition.lattice();
        if left.sort() == right.sort() {
            let (larger, smaller) = if left > right {
                (left, right)
            } else {
                (right, left)
            };
            Step::Bind(larger.clone(), Term::Var(smaller.clone()))
        } else if lattice.is_subsorted_eq(left.sort(), right.sort()) {
            Step::Bind(left.clone(), Term::Var(right.clone()))
        } else if lattice.is_subsorted_eq(right.sort(), left.sort()) {
            Step::Bind(right.clone(), Term::Var(left.clone()))
        } else {
            match lattice.glb(left.sort(), right.sort()) {
                Some(sort) => {
                    let fresh = Term::Var(self.fresh.derive(&[left, right], sort));
                    Step::Replace(vec![
                        Equality::new(Term::Var(left.clone()), fresh.clone()),
                        Equality::new(Term::Var(right.clone()), fresh),
                    ])
                }
                None => Step::Keep(equality.clone()),
            }
        }
    }

    /// A sort-correct way of binding `var` to `term`, if there is one.
    ///
    /// An overloaded constructor applied to variables is re-instantiated
    /// with fresh variables of narrower sorts when exactly one of its
    /// signatures fits the sort of `var`.
    fn narrow(&self, var: &Variable, term: &Term, definition: &Definition) -> Option<Step> {
        let lattice = definition.lattice();
        if lattice.is_subsorted_eq(var.sort(), &term.sort()) {
            return Some(Step::Bind(var.clone(), term.clone()));
        }
        let Term::App { symbol, args, .. } = term else {
            return None;
        };
        if !symbol.is_constructor() || !symbol.is_overloaded() {
            return None;
        }
        let arg_vars: Vec<&Variable> = args.iter().map(Term::as_var).collect::<Option<_>>()?;
        let arg_sorts = arg_vars.iter().map(|arg| arg.sort().clone()).collect_vec();
        let candidates = definition
            .possible_signatures(symbol, &arg_sorts)
            .filter(|signature| lattice.is_subsorted_eq(var.sort(), &signature.result))
            .collect_vec();
        let [signature] = candidates.as_slice() else {
            return None;
        };

        let narrowed_sorts: Vec<Sort> = signature
            .params
            .iter()
            .zip(&arg_sorts)
            .map(|(param, arg)| lattice.glb(param, arg))
            .collect::<Option<_>>()?;
        if !lattice.is_subsorted_eq(var.sort(), &definition.least_sort(symbol, &narrowed_sorts)) {
            return None;
        }

        let fresh_args = arg_vars
            .iter()
            .zip(narrowed_sorts)
            .map(|(arg, sort)| Term::Var(self.fresh.derive(&[*arg], sort)))
            .collect_vec();
        let mut parts = vec![Equality::new(
            Term::Var(var.clone()),
            definition.apply(symbol, fresh_args.clone()),
        )];
        parts.extend(
            arg_vars
                .iter()
                .zip(fresh_args)
                .map(|(arg, fresh)| Equality::new(Term::Var((*arg).clone()), fresh)),
        );
        Some(Step::Replace(parts))
    }

    /// Rewrites the disjunctions with the current bindings. Returns true if
    /// one of them collapsed into a single alternative whose equalities
    /// were moved back to the pending set.
    fn absorb_disjunctions(&mut self) -> Result<bool, Contradiction> {
        let eval = EvalContext::new(self.ctx.definition());
        let mut absorbed = false;
        let mut kept = vec![];
        for disjunction in std::mem::take(&mut self.disjunctions) {
            let rewritten = disjunction.substitute_and_evaluate(&self.substitution, &eval);
            let mut holder = Conjunction::new();
            holder.add_disjunction(rewritten);
            if let Some(contradiction) = holder.contradiction() {
                return Err(self.fail(contradiction.witness.clone()));
            }
            if holder.disjunctions().len() == 1
                && holder.equalities().is_empty()
                && holder.substitution().is_empty()
            {
                kept.extend(holder.disjunctions().iter().cloned());
                continue;
            }
            absorbed |= !holder.is_true();
            self.pending.extend(
                holder
                    .substitution()
                    .equalities()
                    .chain(holder.equalities().iter().cloned()),
            );
            kept.extend(holder.disjunctions().iter().cloned());
        }
        self.disjunctions = kept.into_iter().unique().collect();
        Ok(absorbed)
    }
}
