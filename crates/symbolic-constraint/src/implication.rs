// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Entailment between conjunctions.
//!
//! Goals are processed from a queue. Each goal first tries to discharge
//! the right side by rewriting it with what the left side knows. A right
//! side that still holds an if-then-else is split on its condition, and
//! only goals without open conditions reach the solver.

use std::collections::{BTreeSet, VecDeque};

use log::debug;
use symbolic_term::{Term, Variable};

use crate::cache::ImplicationKey;
use crate::conjunction::{Conjunction, Contradiction};
use crate::context::ReasoningContext;
use crate::diagnostics::TraceEvent;
use crate::substitution::Substitution;

struct Goal {
    left: Conjunction,
    right: Conjunction,
    /// Conditions already split on along the path to this goal.
    splits: BTreeSet<Term>,
}

impl Conjunction {
    /// Whether every solution of `self` is a solution of `right`, with the
    /// variables of `existentials` existentially quantified in `right`.
    pub fn implies(
        &self,
        right: &Conjunction,
        existentials: &BTreeSet<Variable>,
        ctx: &ReasoningContext,
    ) -> bool {
        ctx.emit(|| TraceEvent::ImplicationAttempted {
            left: self.clone(),
            right: right.clone(),
        });
        let left = match self.simplify(ctx) {
            Ok(left) => left,
            Err(_) => return true,
        };

        let mut goals = VecDeque::from([Goal {
            left,
            right: right.clone(),
            splits: BTreeSet::new(),
        }]);
        while let Some(goal) = goals.pop_front() {
            if !prove_goal(goal, existentials, ctx, &mut goals) {
                return false;
            }
        }
        true
    }

    /// Applies the bindings of `self` to `right` before checking the
    /// implication without existentials.
    pub fn smart_implies(&self, right: &Conjunction, ctx: &ReasoningContext) -> bool {
        let right = right.substitute_and_evaluate(self.substitution(), &ctx.eval_context());
        self.implies(&right, &BTreeSet::new(), ctx)
    }

    /// Whether the solver proves `self` unsatisfiable.
    pub fn check_unsat(&self, ctx: &ReasoningContext) -> bool {
        self.is_false() || ctx.bridge().check_unsat(self, &ctx.constraint_request())
    }
}

/// Proves `goal` directly, or replaces it with its case splits. Returns
/// false when the goal cannot be proved.
fn prove_goal(
    goal: Goal,
    existentials: &BTreeSet<Variable>,
    ctx: &ReasoningContext,
    goals: &mut VecDeque<Goal>,
) -> bool {
    let Goal {
        left,
        right,
        mut splits,
    } = goal;
    if left.is_false_extended() {
        return true;
    }

    let right = match reduce(&left, &right, existentials, ctx) {
        Ok(right) => right,
        Err(contradiction) => {
            debug!("right side falsified by {}", contradiction.witness);
            return left.check_unsat(ctx);
        }
    };
    if is_discharged(&right, existentials) {
        ctx.emit(|| TraceEvent::ProvedBySimplification {
            right: right.clone(),
        });
        return true;
    }

    if splits.len() < ctx.options().max_case_splits {
        let open = right
            .if_then_else_conditions()
            .into_iter()
            .find(|condition| !splits.contains(condition));
        if let Some(condition) = open {
            ctx.emit(|| TraceEvent::CaseSplit {
                condition: condition.clone(),
            });
            splits.insert(condition.clone());
            for value in [true, false] {
                let mut branch = left.clone();
                branch.add_terms(condition.clone(), Term::bool(value));
                // an infeasible branch holds vacuously
                if let Ok(branch) = branch.simplify(ctx) {
                    goals.push_back(Goal {
                        left: branch,
                        right: right.clone(),
                        splits: splits.clone(),
                    });
                }
            }
            return true;
        }
    }

    prove_with_solver(&left, &right, existentials, ctx)
}

/// Rewrites `right` with the bindings and facts of `left` and removes what
/// `left` already states.
fn reduce(
    left: &Conjunction,
    right: &Conjunction,
    existentials: &BTreeSet<Variable>,
    ctx: &ReasoningContext,
) -> Result<Conjunction, Contradiction> {
    let eval = ctx.eval_context();
    let right = right.orient_substitution(existentials, &eval);
    let right = right
        .substitute_and_evaluate(left.substitution(), &eval.with_facts(left))
        .simplify(ctx)?;
    let right = left.simplify_constraint(&right);
    Ok(right.orient_substitution(existentials, &eval))
}

fn is_discharged(right: &Conjunction, existentials: &BTreeSet<Variable>) -> bool {
    right.is_true()
        || (right.equalities().is_empty()
            && right.disjunctions().is_empty()
            && right.substitution().keys().all(|var| existentials.contains(var)))
}

fn prove_with_solver(
    left: &Conjunction,
    right: &Conjunction,
    existentials: &BTreeSet<Variable>,
    ctx: &ReasoningContext,
) -> bool {
    // the bindings of `left` are already applied to `right`
    let left = Conjunction::from_parts(
        Substitution::new(),
        left.equalities().clone(),
        left.disjunctions().clone(),
    );
    let request = ctx.implication_request();
    let ask = || ctx.bridge().implies(&left, right, existentials, &request);
    let proved = if ctx.options().cache_implications {
        let key = ImplicationKey {
            left: left.clone(),
            right: right.clone(),
            existentials: existentials.clone(),
        };
        ctx.implication_cache().get_or_compute(key, ask)
    } else {
        ask()
    };

    if proved {
        ctx.emit(|| TraceEvent::SmtProved {
            left: left.clone(),
            right: right.clone(),
        });
    } else {
        ctx.emit(|| TraceEvent::SmtFailed {
            left: left.clone(),
            right: right.clone(),
        });
        if ctx.options().debug_formulas {
            debug!(
                "cannot prove\n{}\n=>\n{}",
                left.to_string_multiline(),
                right.to_string_multiline()
            );
        }
    }
    proved
}
