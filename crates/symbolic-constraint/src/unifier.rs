// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Structural decomposition of equalities between rigid terms.

use symbolic_term::Term;
use thiserror::Error;

use crate::conjunction::Conjunction;
use crate::context::ReasoningContext;
use crate::simplify::SimplifyMode;

/// Two subterms that can never be equal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot unify {lhs} with {rhs}")]
pub struct UnificationFailure {
    pub lhs: Term,
    pub rhs: Term,
}

impl UnificationFailure {
    fn new(lhs: &Term, rhs: &Term) -> Self {
        UnificationFailure {
            lhs: lhs.clone(),
            rhs: rhs.clone(),
        }
    }
}

pub trait Unifier: Send + Sync {
    /// Decomposes `lhs = rhs` into simpler equalities. Returning a
    /// conjunction that holds just `lhs = rhs` means nothing could be done.
    fn unify(
        &self,
        lhs: &Term,
        rhs: &Term,
        mode: SimplifyMode,
        ctx: &ReasoningContext,
    ) -> Result<Conjunction, UnificationFailure>;
}

/// Syntactic unification modulo builtin lists.
///
/// Constructors are free: equal heads decompose argument-wise and distinct
/// heads fail. Pattern symbols decompose only under pattern folding and
/// are otherwise left alone. Lists are matched element by element from the
/// front; what is left over becomes an equality between the remainders.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuralUnifier;

impl Unifier for StructuralUnifier {
    fn unify(
        &self,
        lhs: &Term,
        rhs: &Term,
        mode: SimplifyMode,
        _ctx: &ReasoningContext,
    ) -> Result<Conjunction, UnificationFailure> {
        let mut result = Conjunction::new();
        decompose(lhs, rhs, mode, &mut result)?;
        Ok(result)
    }
}

fn decompose(
    lhs: &Term,
    rhs: &Term,
    mode: SimplifyMode,
    out: &mut Conjunction,
) -> Result<(), UnificationFailure> {
    if lhs == rhs {
        return Ok(());
    }
    if !(lhs.is_rigid(mode.pattern_folding) && rhs.is_rigid(mode.pattern_folding)) {
        out.add_terms(lhs.clone(), rhs.clone());
        return Ok(());
    }
    match (lhs, rhs) {
        (l, r) if l.is_concrete() && r.is_concrete() => Err(UnificationFailure::new(l, r)),
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
        ) => {
            if lsym == rsym && largs.len() == rargs.len() {
                for (l, r) in largs.iter().zip(rargs) {
                    decompose(l, r, mode, out)?;
                }
                Ok(())
            } else if lsym.is_constructor() && rsym.is_constructor() {
                Err(UnificationFailure::new(lhs, rhs))
            } else {
                // a pattern symbol against anything else stays as it is
                out.add_terms(lhs.clone(), rhs.clone());
                Ok(())
            }
        }
        (Term::List { .. }, Term::List { .. }) => decompose_lists(lhs, rhs, mode, out),
        (Term::App { symbol, .. }, _) | (_, Term::App { symbol, .. }) if symbol.is_pattern() => {
            out.add_terms(lhs.clone(), rhs.clone());
            Ok(())
        }
        _ => Err(UnificationFailure::new(lhs, rhs)),
    }
}

fn decompose_lists(
    lhs: &Term,
    rhs: &Term,
    mode: SimplifyMode,
    out: &mut Conjunction,
) -> Result<(), UnificationFailure> {
    let (
        Term::List {
            elements: lelems,
            frame: lframe,
        },
        Term::List {
            elements: relems,
            frame: rframe,
        },
    ) = (lhs, rhs)
    else {
        return Err(UnificationFailure::new(lhs, rhs));
    };

    let mut scratch = Conjunction::new();
    let common = lelems.len().min(relems.len());
    for (l, r) in lelems.iter().zip(relems) {
        decompose(l, r, mode, &mut scratch)?;
    }
    let lrest = Term::list(
        lelems[common..].to_vec(),
        lframe.as_deref().cloned(),
    );
    let rrest = Term::list(
        relems[common..].to_vec(),
        rframe.as_deref().cloned(),
    );

    if lrest != rrest {
        if symbolic_term::clashes(&lrest, &rrest) {
            return Err(UnificationFailure::new(&lrest, &rrest));
        }
        let resolved = lrest.is_var() || rrest.is_var();
        if !resolved && !mode.partial_simplification {
            out.add_terms(lhs.clone(), rhs.clone());
            return Ok(());
        }
        scratch.add_terms(lrest, rrest);
    }
    out.add_conjunction(&scratch);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equality::Equality;
    use crate::options::EngineOptions;
    use symbolic_term::{Definition, Signature, Sort, Symbol, SymbolKind};

    fn context() -> ReasoningContext {
        ReasoningContext::new(Definition::new(), EngineOptions::default())
    }

    fn pair() -> Symbol {
        Symbol::new(
            "pair",
            SymbolKind::Constructor,
            vec![Signature::new(vec![Sort::k(), Sort::k()], Sort::k())],
        )
    }

    #[test]
    fn test_constructor_decomposition() {
        let ctx = context();
        let x = Term::var("X", Sort::int());
        let y = Term::var("Y", Sort::int());
        let lhs = Term::app(pair(), vec![x.clone(), Term::int(2)], Sort::k());
        let rhs = Term::app(pair(), vec![Term::int(1), y.clone()], Sort::k());
        let result = StructuralUnifier
            .unify(&lhs, &rhs, SimplifyMode::DEFAULT, &ctx)
            .unwrap();
        assert_eq!(
            result,
            Conjunction::from_equalities([
                Equality::new(x, Term::int(1)),
                Equality::new(Term::int(2), y),
            ])
        );
    }

    #[test]
    fn test_constructor_clash() {
        let ctx = context();
        let lhs = Term::app(pair(), vec![Term::int(1), Term::int(2)], Sort::k());
        let rhs = Term::app(pair(), vec![Term::int(1), Term::int(3)], Sort::k());
        let failure = StructuralUnifier
            .unify(&lhs, &rhs, SimplifyMode::DEFAULT, &ctx)
            .unwrap_err();
        assert_eq!(failure, UnificationFailure::new(&Term::int(2), &Term::int(3)));
    }

    #[test]
    fn test_list_remainder() {
        let ctx = context();
        let x = Term::var("X", Sort::int());
        let frame = Term::var("F", Sort::list());
        let lhs = Term::list(vec![x.clone()], Some(frame.clone()));
        let rhs = Term::list(vec![Term::int(1), Term::int(2)], None);
        let result = StructuralUnifier
            .unify(&lhs, &rhs, SimplifyMode::BEFORE_PATTERN_FOLDING, &ctx)
            .unwrap();
        assert_eq!(
            result,
            Conjunction::from_equalities([
                Equality::new(x, Term::int(1)),
                Equality::new(frame, Term::list(vec![Term::int(2)], None)),
            ])
        );
    }

    #[test]
    fn test_unresolved_list_remainder() {
        let ctx = context();
        let mut definition = Definition::new();
        let rest = definition.declare_symbol(
            "rest",
            SymbolKind::Function,
            vec![Signature::new(vec![Sort::k()], Sort::list())],
        );
        let x = Term::var("X", Sort::int());
        let y = Term::var("Y", Sort::int());
        let opaque = definition.apply(&rest, vec![y]);
        let lhs = Term::list(vec![x.clone()], Some(opaque.clone()));
        let rhs = Term::list(vec![Term::int(1)], None);

        let partial = StructuralUnifier
            .unify(&lhs, &rhs, SimplifyMode::DEFAULT, &ctx)
            .unwrap();
        assert_eq!(
            partial,
            Conjunction::from_equalities([
                Equality::new(x, Term::int(1)),
                Equality::new(opaque, Term::empty_list()),
            ])
        );

        let intact = StructuralUnifier
            .unify(&lhs, &rhs, SimplifyMode::BEFORE_PATTERN_FOLDING, &ctx)
            .unwrap();
        assert_eq!(
            intact,
            Conjunction::from_equalities([Equality::new(lhs, rhs)])
        );
    }

    #[test]
    fn test_pattern_symbols() {
        let ctx = context();
        let abs = Symbol::new(
            "#abs",
            SymbolKind::Pattern,
            vec![Signature::new(vec![Sort::int()], Sort::int())],
        );
        let x = Term::var("X", Sort::int());
        let y = Term::var("Y", Sort::int());
        let lhs = Term::app(abs.clone(), vec![x.clone()], Sort::int());
        let rhs = Term::app(abs, vec![y.clone()], Sort::int());
        let folded = StructuralUnifier
            .unify(&lhs, &rhs, SimplifyMode::MODULO_PATTERN_FOLDING, &ctx)
            .unwrap();
        assert_eq!(folded, Conjunction::from_equalities([Equality::new(x, y)]));

        let unfolded = StructuralUnifier
            .unify(&lhs, &rhs, SimplifyMode::DEFAULT, &ctx)
            .unwrap();
        assert_eq!(
            unfolded,
            Conjunction::from_equalities([Equality::new(lhs, rhs)])
        );
    }
}
