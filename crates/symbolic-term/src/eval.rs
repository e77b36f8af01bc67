// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Substitution application and builtin evaluation.
//!
//! Evaluation is bottom-up and total: anything that cannot be reduced is
//! rebuilt with its reduced children. Boolean subterms that are not
//! tokens may additionally be decided by a set of known facts.

use std::collections::BTreeMap;

use crate::definition::Definition;
use crate::term::{clashes, BuiltinOp, Term};
use crate::variable::Variable;

pub trait Bindings {
    fn binding(&self, var: &Variable) -> Option<&Term>;
}

impl Bindings for BTreeMap<Variable, Term> {
    fn binding(&self, var: &Variable) -> Option<&Term> {
        self.get(var)
    }
}

/// Known truth values of boolean terms.
pub trait BooleanFacts {
    fn truth_of(&self, term: &Term) -> Option<bool>;
}

#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    definition: &'a Definition,
    facts: Option<&'a dyn BooleanFacts>,
}

impl<'a> EvalContext<'a> {
    pub fn new(definition: &'a Definition) -> Self {
        EvalContext {
            definition,
            facts: None,
        }
    }

    pub fn with_facts(self, facts: &'a dyn BooleanFacts) -> Self {
        EvalContext {
            facts: Some(facts),
            ..self
        }
    }

    pub fn without_facts(self) -> Self {
        EvalContext {
            facts: None,
            ..self
        }
    }

    pub fn definition(&self) -> &'a Definition {
        self.definition
    }

    fn decide(&self, term: Term) -> Term {
        if term.is_concrete() || !term.sort().is_bool() {
            return term;
        }
        match self.facts.and_then(|facts| facts.truth_of(&term)) {
            Some(value) => Term::Bool(value),
            None => term,
        }
    }
}

/// Replaces bound variables, without evaluating.
pub fn substitute(term: &Term, bindings: &dyn Bindings) -> Term {
    match term {
        Term::Var(var) => bindings
            .binding(var)
            .cloned()
            .unwrap_or_else(|| term.clone()),
        Term::Bool(_) | Term::Int(_) | Term::Str(_) => term.clone(),
        Term::App { symbol, args, sort } => Term::App {
            symbol: symbol.clone(),
            args: args.iter().map(|arg| substitute(arg, bindings)).collect(),
            sort: sort.clone(),
        },
        Term::Builtin { op, args } => Term::Builtin {
            op: *op,
            args: args.iter().map(|arg| substitute(arg, bindings)).collect(),
        },
        Term::List { elements, frame } => Term::list(
            elements
                .iter()
                .map(|elem| substitute(elem, bindings))
                .collect(),
            frame.as_deref().map(|frame| substitute(frame, bindings)),
        ),
        Term::Ite {
            cond,
            then_branch,
            else_branch,
        } => Term::ite(
            substitute(cond, bindings),
            substitute(then_branch, bindings),
            substitute(else_branch, bindings),
        ),
    }
}

pub fn substitute_and_evaluate(term: &Term, bindings: &dyn Bindings, ctx: &EvalContext) -> Term {
    evaluate(&substitute(term, bindings), ctx)
}

pub fn evaluate(term: &Term, ctx: &EvalContext) -> Term {
    match term {
        Term::Bool(_) | Term::Int(_) | Term::Str(_) => term.clone(),
        Term::Var(_) => ctx.decide(term.clone()),
        Term::App { symbol, args, .. } => {
            let args: Vec<Term> = args.iter().map(|arg| evaluate(arg, ctx)).collect();
            ctx.decide(ctx.definition().apply(symbol, args))
        }
        Term::Builtin { op, args } => {
            let args: Vec<Term> = args.iter().map(|arg| evaluate(arg, ctx)).collect();
            ctx.decide(evaluate_builtin(*op, args))
        }
        Term::List { elements, frame } => Term::list(
            elements.iter().map(|elem| evaluate(elem, ctx)).collect(),
            frame.as_deref().map(|frame| evaluate(frame, ctx)),
        ),
        Term::Ite {
            cond,
            then_branch,
            else_branch,
        } => match evaluate(cond, ctx) {
            Term::Bool(true) => evaluate(then_branch, ctx),
            Term::Bool(false) => evaluate(else_branch, ctx),
            cond => {
                let then_branch = evaluate(then_branch, ctx);
                let else_branch = evaluate(else_branch, ctx);
                if then_branch == else_branch {
                    then_branch
                } else {
                    ctx.decide(Term::ite(cond, then_branch, else_branch))
                }
            }
        },
    }
}

fn evaluate_builtin(op: BuiltinOp, args: Vec<Term>) -> Term {
    match (op, args.as_slice()) {
        // true andBool x → x
        (BuiltinOp::AndBool, [Term::Bool(true), other] | [other, Term::Bool(true)]) => {
            other.clone()
        }
        // false andBool x → false
        (BuiltinOp::AndBool, [Term::Bool(false), _] | [_, Term::Bool(false)]) => Term::Bool(false),
        // false orBool x → x
        (BuiltinOp::OrBool, [Term::Bool(false), other] | [other, Term::Bool(false)]) => {
            other.clone()
        }
        // true orBool x → true
        (BuiltinOp::OrBool, [Term::Bool(true), _] | [_, Term::Bool(true)]) => Term::Bool(true),
        (BuiltinOp::NotBool, [Term::Bool(value)]) => Term::Bool(!value),
        // notBool notBool x → x
        (
            BuiltinOp::NotBool,
            [Term::Builtin {
                op: BuiltinOp::NotBool,
                args: inner,
            }],
        ) if inner.len() == 1 => inner[0].clone(),
        (BuiltinOp::EqK, [left, right]) if left == right => Term::Bool(true),
        (BuiltinOp::EqK, [left, right]) if clashes(left, right) => Term::Bool(false),
        (BuiltinOp::AddInt, [Term::Int(left), Term::Int(right)]) => Term::Int(left + right),
        (BuiltinOp::SubInt, [Term::Int(left), Term::Int(right)]) => Term::Int(left - right),
        (BuiltinOp::LtInt, [Term::Int(left), Term::Int(right)]) => Term::Bool(left < right),
        (BuiltinOp::LeInt, [Term::Int(left), Term::Int(right)]) => Term::Bool(left <= right),
        _ => Term::Builtin { op, args },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::Sort;

    struct Facts(Vec<(Term, bool)>);

    impl BooleanFacts for Facts {
        fn truth_of(&self, term: &Term) -> Option<bool> {
            self.0
                .iter()
                .find(|(fact, _)| fact == term)
                .map(|(_, value)| *value)
        }
    }

    #[test]
    fn test_builtin_evaluation() {
        let definition = Definition::new();
        let ctx = EvalContext::new(&definition);
        let x = Term::var("X", Sort::bool());

        assert_eq!(evaluate(&Term::and(Term::bool(true), x.clone()), &ctx), x);
        assert_eq!(
            evaluate(&Term::or(x.clone(), Term::bool(true)), &ctx),
            Term::bool(true)
        );
        assert_eq!(evaluate(&Term::not(Term::not(x.clone())), &ctx), x);
        assert_eq!(
            evaluate(&Term::lt(Term::add(Term::int(1), Term::int(2)), Term::int(4)), &ctx),
            Term::bool(true)
        );
        assert_eq!(
            evaluate(&Term::eq_k(Term::int(1), Term::int(2)), &ctx),
            Term::bool(false)
        );
    }

    #[test]
    fn test_substitute_and_evaluate() {
        let definition = Definition::new();
        let ctx = EvalContext::new(&definition);
        let x = Variable::new("X", Sort::int());
        let bindings = BTreeMap::from([(x.clone(), Term::int(2))]);
        let term = Term::ite(
            Term::lt(Term::Var(x), Term::int(3)),
            Term::string("small"),
            Term::string("big"),
        );
        assert_eq!(
            substitute_and_evaluate(&term, &bindings, &ctx),
            Term::string("small")
        );
    }

    #[test]
    fn test_facts_decide_conditions() {
        let definition = Definition::new();
        let x = Term::var("X", Sort::int());
        let cond = Term::lt(x.clone(), Term::int(3));
        let facts = Facts(vec![(cond.clone(), false)]);
        let ctx = EvalContext::new(&definition).with_facts(&facts);

        let term = Term::ite(cond.clone(), Term::int(1), Term::int(2));
        assert_eq!(evaluate(&term, &ctx), Term::int(2));
        assert_eq!(evaluate(&cond, &ctx.without_facts()), cond);
    }

    #[test]
    fn test_ite_with_equal_branches() {
        let definition = Definition::new();
        let ctx = EvalContext::new(&definition);
        let term = Term::ite(Term::var("C", Sort::bool()), Term::int(7), Term::int(7));
        assert_eq!(evaluate(&term, &ctx), Term::int(7));
    }
}
