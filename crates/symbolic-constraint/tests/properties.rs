// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use itertools::Itertools;
use proptest::prelude::*;
use symbolic_constraint::{
    Conjunction, Disjunction, EngineOptions, Equality, ReasoningContext, SmtOptions, SmtSolver,
};
use symbolic_term::{substitute_and_evaluate, Definition, EvalContext, Sort, Term, Variable};

const VARIABLES: usize = 4;

fn context(cache_simplifications: bool) -> ReasoningContext {
    let options = EngineOptions {
        cache_simplifications,
        smt: SmtOptions {
            solver: SmtSolver::None,
            ..SmtOptions::default()
        },
        ..EngineOptions::default()
    };
    ReasoningContext::new(Definition::new(), options)
}

fn atom() -> impl Strategy<Value = Term> {
    prop_oneof![
        (0..VARIABLES).prop_map(|i| Term::var(&format!("X{i}"), Sort::int())),
        (0..3i64).prop_map(Term::int),
        (0..VARIABLES, 0..3i64)
            .prop_map(|(i, n)| Term::add(Term::var(&format!("X{i}"), Sort::int()), Term::int(n))),
    ]
}

fn formula() -> impl Strategy<Value = Conjunction> {
    prop::collection::vec((atom(), atom()), 0..6).prop_map(|pairs| {
        let mut formula = Conjunction::new();
        for (lhs, rhs) in pairs {
            formula.add_terms(lhs, rhs);
        }
        formula
    })
}

/// Every assignment of `0..5` to the generated variables.
fn assignments() -> impl Iterator<Item = BTreeMap<Variable, Term>> {
    (0..VARIABLES)
        .map(|_| 0..5i64)
        .multi_cartesian_product()
        .map(|values| {
            values
                .into_iter()
                .enumerate()
                .map(|(i, value)| (Variable::new(&format!("X{i}"), Sort::int()), Term::int(value)))
                .collect()
        })
}

/// Whether `formula` holds under a ground `assignment`.
fn satisfies(formula: &Conjunction, assignment: &BTreeMap<Variable, Term>, ctx: &EvalContext) -> bool {
    if formula.is_false() {
        return false;
    }
    let holds = |equality: &Equality| {
        substitute_and_evaluate(equality.lhs(), assignment, ctx)
            == substitute_and_evaluate(equality.rhs(), assignment, ctx)
    };
    formula.substitution().equalities().all(|equality| holds(&equality))
        && formula.equalities().iter().all(|equality| holds(equality))
        && formula.disjunctions().iter().all(|disjunction| {
            disjunction
                .conjunctions()
                .iter()
                .any(|alternative| satisfies(alternative, assignment, ctx))
        })
}

proptest! {
    #[test]
    fn simplify_is_idempotent(formula in formula()) {
        let ctx = context(true);
        if let Ok(simplified) = formula.simplify(&ctx) {
            prop_assert_eq!(simplified.simplify(&ctx), Ok(simplified.clone()));
        }
    }

    #[test]
    fn cache_is_transparent(formula in formula()) {
        let cached = context(true);
        let uncached = context(false);
        let first = formula.simplify(&cached);
        prop_assert_eq!(formula.simplify(&cached), first.clone());
        prop_assert_eq!(formula.simplify(&uncached), first);
    }

    #[test]
    fn bindings_are_fully_applied(formula in formula()) {
        let ctx = context(true);
        if let Ok(simplified) = formula.simplify(&ctx) {
            let keys = simplified.substitution().key_set();
            for (var, term) in simplified.substitution().iter() {
                prop_assert!(!term.occurs(var));
                prop_assert!(term.variables().is_disjoint(&keys), "{} = {}", var, term);
            }
        }
    }

    #[test]
    fn dnf_members_choose_one_branch_each(
        base in formula(),
        branches in prop::collection::vec(prop::collection::vec(formula(), 2..4), 0..3),
    ) {
        let mut combined = base;
        for branch in &branches {
            combined.add_disjunction(Disjunction::new(branch.clone()));
        }
        if combined.is_false() {
            return Ok(());
        }
        let dnf = combined.to_dnf();
        let combinations: usize = branches.iter().map(Vec::len).product();
        prop_assert!(dnf.len() <= combinations.max(1));
        for member in dnf.conjunctions() {
            prop_assert!(member.disjunctions().is_empty());
            prop_assert!(!member.is_false());
        }
    }

    #[test]
    fn contradictions_have_no_solutions(formula in formula()) {
        let ctx = context(true);
        if let Err(contradiction) = formula.simplify(&ctx) {
            let definition = Definition::new();
            let eval = EvalContext::new(&definition);
            for assignment in assignments() {
                prop_assert!(
                    !satisfies(&formula, &assignment, &eval),
                    "{} is satisfiable, yet falsified by {}",
                    formula,
                    contradiction.witness
                );
            }
        }
    }

    #[test]
    fn adding_an_equality_keeps_only_solutions(formula in formula(), lhs in atom(), rhs in atom()) {
        let mut extended = formula.clone();
        extended.add_terms(lhs, rhs);
        let definition = Definition::new();
        let eval = EvalContext::new(&definition);
        for assignment in assignments() {
            if satisfies(&extended, &assignment, &eval) {
                prop_assert!(satisfies(&formula, &assignment, &eval));
            }
        }
    }
}
