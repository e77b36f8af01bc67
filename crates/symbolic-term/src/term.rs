// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! The closed term type.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use num::BigInt;

use crate::sort::Sort;
use crate::symbol::{Symbol, SymbolKind};
use crate::variable::Variable;

/// Builtin operations understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuiltinOp {
    AndBool,
    OrBool,
    NotBool,
    EqK,
    AddInt,
    SubInt,
    LtInt,
    LeInt,
}

impl BuiltinOp {
    pub fn name(self) -> &'static str {
        match self {
            BuiltinOp::AndBool => "andBool",
            BuiltinOp::OrBool => "orBool",
            BuiltinOp::NotBool => "notBool",
            BuiltinOp::EqK => "==K",
            BuiltinOp::AddInt => "+Int",
            BuiltinOp::SubInt => "-Int",
            BuiltinOp::LtInt => "<Int",
            BuiltinOp::LeInt => "<=Int",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            BuiltinOp::NotBool => 1,
            _ => 2,
        }
    }

    pub fn result_sort(self) -> Sort {
        match self {
            BuiltinOp::AddInt | BuiltinOp::SubInt => Sort::int(),
            _ => Sort::bool(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    Var(Variable),
    Bool(bool),
    Int(BigInt),
    Str(Arc<str>),
    App {
        symbol: Symbol,
        args: Vec<Term>,
        sort: Sort,
    },
    Builtin {
        op: BuiltinOp,
        args: Vec<Term>,
    },
    /// Builtin list: a prefix of elements followed by an optional frame
    /// standing for the rest of the list.
    List {
        elements: Vec<Term>,
        frame: Option<Box<Term>>,
    },
    Ite {
        cond: Box<Term>,
        then_branch: Box<Term>,
        else_branch: Box<Term>,
    },
}

impl From<Variable> for Term {
    fn from(var: Variable) -> Self {
        Term::Var(var)
    }
}

impl Term {
    pub fn var(name: &str, sort: Sort) -> Self {
        Term::Var(Variable::new(name, sort))
    }

    pub fn bool(value: bool) -> Self {
        Term::Bool(value)
    }

    pub fn int(value: i64) -> Self {
        Term::Int(BigInt::from(value))
    }

    pub fn string(value: &str) -> Self {
        Term::Str(Arc::from(value))
    }

    /// An application with an explicitly given sort. Use
    /// [`Definition::apply`](crate::Definition::apply) to have the least
    /// sort computed from the signatures.
    pub fn app(symbol: Symbol, args: Vec<Term>, sort: Sort) -> Self {
        Term::App { symbol, args, sort }
    }

    pub fn builtin(op: BuiltinOp, args: Vec<Term>) -> Self {
        debug_assert_eq!(op.arity(), args.len(), "wrong arity for {}", op.name());
        Term::Builtin { op, args }
    }

    pub fn and(left: Term, right: Term) -> Self {
        Term::builtin(BuiltinOp::AndBool, vec![left, right])
    }

    pub fn or(left: Term, right: Term) -> Self {
        Term::builtin(BuiltinOp::OrBool, vec![left, right])
    }

    pub fn not(inner: Term) -> Self {
        Term::builtin(BuiltinOp::NotBool, vec![inner])
    }

    pub fn eq_k(left: Term, right: Term) -> Self {
        Term::builtin(BuiltinOp::EqK, vec![left, right])
    }

    pub fn add(left: Term, right: Term) -> Self {
        Term::builtin(BuiltinOp::AddInt, vec![left, right])
    }

    pub fn sub(left: Term, right: Term) -> Self {
        Term::builtin(BuiltinOp::SubInt, vec![left, right])
    }

    pub fn lt(left: Term, right: Term) -> Self {
        Term::builtin(BuiltinOp::LtInt, vec![left, right])
    }

    pub fn le(left: Term, right: Term) -> Self {
        Term::builtin(BuiltinOp::LeInt, vec![left, right])
    }

    pub fn ite(cond: Term, then_branch: Term, else_branch: Term) -> Self {
        Term::Ite {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn empty_list() -> Self {
        Term::List {
            elements: vec![],
            frame: None,
        }
    }

    /// Builds a list, flattening nested frames. `[ | F]` is `F` itself.
    pub fn list(mut elements: Vec<Term>, frame: Option<Term>) -> Self {
        match frame {
            None => Term::List {
                elements,
                frame: None,
            },
            Some(Term::List {
                elements: rest,
                frame: inner,
            }) => {
                elements.extend(rest);
                Term::list(elements, inner.map(|frame| *frame))
            }
            Some(frame) if elements.is_empty() => frame,
            Some(frame) => Term::List {
                elements,
                frame: Some(Box::new(frame)),
            },
        }
    }

    pub fn sort(&self) -> Sort {
        match self {
            Term::Var(var) => var.sort().clone(),
            Term::Bool(_) => Sort::bool(),
            Term::Int(_) => Sort::int(),
            Term::Str(_) => Sort::string(),
            Term::App { sort, .. } => sort.clone(),
            Term::Builtin { op, .. } => op.result_sort(),
            Term::List { .. } => Sort::list(),
            Term::Ite { then_branch, .. } => then_branch.sort(),
        }
    }

    pub fn as_var(&self) -> Option<&Variable> {
        match self {
            Term::Var(var) => Some(var),
            _ => None,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Term::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_true(&self) -> bool {
        self.as_bool() == Some(true)
    }

    pub fn is_false(&self) -> bool {
        self.as_bool() == Some(false)
    }

    /// Builtin tokens: booleans, integers and strings.
    pub fn is_concrete(&self) -> bool {
        matches!(self, Term::Bool(_) | Term::Int(_) | Term::Str(_))
    }

    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) => false,
            Term::Bool(_) | Term::Int(_) | Term::Str(_) => true,
            Term::App { args, .. } | Term::Builtin { args, .. } => args.iter().all(Term::is_ground),
            Term::List { elements, frame } => {
                elements.iter().all(Term::is_ground)
                    && frame.as_deref().map_or(true, Term::is_ground)
            }
            Term::Ite {
                cond,
                then_branch,
                else_branch,
            } => cond.is_ground() && then_branch.is_ground() && else_branch.is_ground(),
        }
    }

    /// Built only from variables, tokens, constructors and list structure.
    /// Such a term cannot be equal to a proper subterm of itself.
    pub fn is_normal(&self) -> bool {
        match self {
            Term::Var(_) | Term::Bool(_) | Term::Int(_) | Term::Str(_) => true,
            Term::App { symbol, args, .. } => {
                symbol.kind() == SymbolKind::Constructor && args.iter().all(Term::is_normal)
            }
            Term::List { elements, frame } => {
                elements.iter().all(Term::is_normal)
                    && frame.as_deref().map_or(true, Term::is_normal)
            }
            Term::Builtin { .. } | Term::Ite { .. } => false,
        }
    }

    /// Has a head that unification can decompose. Pattern symbols only
    /// count when `pattern_folding` is on.
    pub fn is_rigid(&self, pattern_folding: bool) -> bool {
        match self {
            Term::Bool(_) | Term::Int(_) | Term::Str(_) | Term::List { .. } => true,
            Term::App { symbol, .. } => match symbol.kind() {
                SymbolKind::Constructor => true,
                SymbolKind::Pattern => pattern_folding,
                SymbolKind::Function => false,
            },
            Term::Var(_) | Term::Builtin { .. } | Term::Ite { .. } => false,
        }
    }

    pub fn is_empty_list(&self) -> bool {
        matches!(self, Term::List { elements, frame: None } if elements.is_empty())
    }

    /// A list with at least one element.
    pub fn is_non_empty_list(&self) -> bool {
        matches!(self, Term::List { elements, .. } if !elements.is_empty())
    }

    pub fn variables(&self) -> BTreeSet<Variable> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    pub fn collect_variables(&self, vars: &mut BTreeSet<Variable>) {
        match self {
            Term::Var(var) => {
                vars.insert(var.clone());
            }
            Term::Bool(_) | Term::Int(_) | Term::Str(_) => {}
            Term::App { args, .. } | Term::Builtin { args, .. } => {
                args.iter().for_each(|arg| arg.collect_variables(vars))
            }
            Term::List { elements, frame } => {
                elements.iter().for_each(|elem| elem.collect_variables(vars));
                if let Some(frame) = frame {
                    frame.collect_variables(vars);
                }
            }
            Term::Ite {
                cond,
                then_branch,
                else_branch,
            } => {
                cond.collect_variables(vars);
                then_branch.collect_variables(vars);
                else_branch.collect_variables(vars);
            }
        }
    }

    pub fn occurs(&self, var: &Variable) -> bool {
        match self {
            Term::Var(other) => other == var,
            Term::Bool(_) | Term::Int(_) | Term::Str(_) => false,
            Term::App { args, .. } | Term::Builtin { args, .. } => {
                args.iter().any(|arg| arg.occurs(var))
            }
            Term::List { elements, frame } => {
                elements.iter().any(|elem| elem.occurs(var))
                    || frame.as_deref().map_or(false, |frame| frame.occurs(var))
            }
            Term::Ite {
                cond,
                then_branch,
                else_branch,
            } => cond.occurs(var) || then_branch.occurs(var) || else_branch.occurs(var),
        }
    }

    /// Conditions of if-then-else subterms, outermost first.
    pub fn if_then_else_conditions(&self) -> Vec<Term> {
        let mut conditions = vec![];
        self.collect_conditions(&mut conditions);
        conditions
    }

    fn collect_conditions(&self, conditions: &mut Vec<Term>) {
        match self {
            Term::Var(_) | Term::Bool(_) | Term::Int(_) | Term::Str(_) => {}
            Term::App { args, .. } | Term::Builtin { args, .. } => {
                args.iter().for_each(|arg| arg.collect_conditions(conditions))
            }
            Term::List { elements, frame } => {
                elements
                    .iter()
                    .for_each(|elem| elem.collect_conditions(conditions));
                if let Some(frame) = frame {
                    frame.collect_conditions(conditions);
                }
            }
            Term::Ite {
                cond,
                then_branch,
                else_branch,
            } => {
                conditions.push((**cond).clone());
                cond.collect_conditions(conditions);
                then_branch.collect_conditions(conditions);
                else_branch.collect_conditions(conditions);
            }
        }
    }
}

/// True if `left` and `right` can be shown different by structure alone:
/// distinct tokens, distinct constructors, or lists of incompatible length.
pub fn clashes(left: &Term, right: &Term) -> bool {
    match (left, right) {
        (l, r) if l.is_concrete() && r.is_concrete() => l != r,
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
        ) if lsym.is_constructor() && rsym.is_constructor() => {
            lsym != rsym
                || largs.len() != rargs.len()
                || largs.iter().zip(rargs).any(|(l, r)| clashes(l, r))
        }
        (
            Term::List {
                elements: lelems,
                frame: lframe,
            },
            Term::List {
                elements: relems,
                frame: rframe,
            },
        ) => {
            let shorter_is_closed = match lelems.len().cmp(&relems.len()) {
                std::cmp::Ordering::Less => lframe.is_none(),
                std::cmp::Ordering::Greater => rframe.is_none(),
                // the frame may still be empty
                std::cmp::Ordering::Equal => false,
            };
            shorter_is_closed || lelems.iter().zip(relems).any(|(l, r)| clashes(l, r))
        }
        (token, Term::App { symbol, .. }) | (Term::App { symbol, .. }, token)
            if token.is_concrete() =>
        {
            symbol.is_constructor()
        }
        (token, Term::List { .. }) | (Term::List { .. }, token) if token.is_concrete() => true,
        (Term::App { symbol, .. }, Term::List { .. })
        | (Term::List { .. }, Term::App { symbol, .. }) => symbol.is_constructor(),
        _ => false,
    }
}

fn fmt_args(f: &mut fmt::Formatter<'_>, args: &[Term]) -> fmt::Result {
    write!(f, "{}", args.iter().format(", "))
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(var) => f.write_str(var.name()),
            Term::Bool(value) => write!(f, "{value}"),
            Term::Int(value) => write!(f, "{value}"),
            Term::Str(value) => write!(f, "{value:?}"),
            Term::App { symbol, args, .. } => {
                write!(f, "{symbol}(")?;
                fmt_args(f, args)?;
                f.write_str(")")
            }
            Term::Builtin { op, args } => match args.as_slice() {
                [left, right] => write!(f, "({left} {} {right})", op.name()),
                _ => {
                    write!(f, "{}(", op.name())?;
                    fmt_args(f, args)?;
                    f.write_str(")")
                }
            },
            Term::List { elements, frame } => {
                f.write_str("[")?;
                fmt_args(f, elements)?;
                if let Some(frame) = frame {
                    write!(f, " | {frame}")?;
                }
                f.write_str("]")
            }
            Term::Ite {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "#if {cond} #then {then_branch} #else {else_branch} #fi"),
        }
    }
}
