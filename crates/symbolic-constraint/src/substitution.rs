// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use im::OrdMap;
use symbolic_term::{substitute_and_evaluate, Bindings, EvalContext, Term, Variable};

use crate::equality::Equality;

/// Persistent map from variables to terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Substitution {
    bindings: OrdMap<Variable, Term>,
}

impl Substitution {
    pub fn new() -> Self {
        Substitution::default()
    }

    pub fn singleton(var: Variable, term: Term) -> Self {
        Substitution {
            bindings: OrdMap::unit(var, term),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.bindings.get(var)
    }

    pub fn contains_key(&self, var: &Variable) -> bool {
        self.bindings.contains_key(var)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.bindings.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Variable> {
        self.bindings.keys()
    }

    pub fn key_set(&self) -> BTreeSet<Variable> {
        self.bindings.keys().cloned().collect()
    }

    /// Adds a binding. `None` if `var` is already bound to another term.
    pub fn plus(&self, var: Variable, term: Term) -> Option<Substitution> {
        match self.bindings.get(&var) {
            Some(bound) if *bound != term => None,
            Some(_) => Some(self.clone()),
            None => Some(Substitution {
                bindings: self.bindings.update(var, term),
            }),
        }
    }

    /// Adds a binding in place. On a conflict returns the term `var` is
    /// already bound to and leaves `self` unchanged.
    pub(crate) fn insert(&mut self, var: Variable, term: Term) -> Result<(), Term> {
        match self.bindings.get(&var) {
            Some(bound) if *bound != term => Err(bound.clone()),
            Some(_) => Ok(()),
            None => {
                self.bindings.insert(var, term);
                Ok(())
            }
        }
    }

    pub fn minus(&self, var: &Variable) -> Substitution {
        Substitution {
            bindings: self.bindings.without(var),
        }
    }

    pub fn minus_all<'a>(&self, vars: impl IntoIterator<Item = &'a Variable>) -> Substitution {
        let mut bindings = self.bindings.clone();
        for var in vars {
            bindings.remove(var);
        }
        Substitution { bindings }
    }

    pub fn equalities(&self) -> impl Iterator<Item = Equality> + '_ {
        self.bindings
            .iter()
            .map(|(var, term)| Equality::new(Term::Var(var.clone()), term.clone()))
    }

    /// Applies `other` to every value of `self` and adds the bindings of
    /// `other`, re-evaluating the values. Fails with the offending pair when
    /// a variable ends up bound to two different terms, or bound to a
    /// constructor term containing itself.
    pub fn compose_and_evaluate(
        &self,
        other: &Substitution,
        ctx: &EvalContext,
    ) -> Result<Substitution, Equality> {
        let mut bindings = OrdMap::new();
        for (var, term) in self.bindings.iter() {
            let term = substitute_and_evaluate(term, other, ctx);
            if let Some(bound) = other.get(var) {
                if *bound != term {
                    return Err(Equality::new(term, bound.clone()));
                }
            }
            bindings.insert(var.clone(), term);
        }
        for (var, term) in other.bindings.iter() {
            bindings.entry(var.clone()).or_insert_with(|| term.clone());
        }

        let mut composed = OrdMap::new();
        for (var, term) in bindings {
            if term.as_var() == Some(&var) {
                continue;
            }
            if term.occurs(&var) && term.is_normal() {
                return Err(Equality::new(Term::Var(var), term));
            }
            composed.insert(var, term);
        }
        Ok(Substitution { bindings: composed })
    }
}

impl Bindings for Substitution {
    fn binding(&self, var: &Variable) -> Option<&Term> {
        self.bindings.get(var)
    }
}

impl FromIterator<(Variable, Term)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (Variable, Term)>>(iter: I) -> Self {
        Substitution {
            bindings: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symbolic_term::{Definition, Sort};

    #[test]
    fn test_plus_conflict() {
        let x = Variable::new("X", Sort::int());
        let subst = Substitution::singleton(x.clone(), Term::int(1));
        assert!(subst.plus(x.clone(), Term::int(1)).is_some());
        assert!(subst.plus(x, Term::int(2)).is_none());
    }

    #[test]
    fn test_insert_conflict() {
        let x = Variable::new("X", Sort::int());
        let mut subst = Substitution::new();
        assert_eq!(subst.insert(x.clone(), Term::int(1)), Ok(()));
        assert_eq!(subst.insert(x.clone(), Term::int(1)), Ok(()));
        assert_eq!(subst.insert(x.clone(), Term::int(2)), Err(Term::int(1)));
        assert_eq!(subst.get(&x), Some(&Term::int(1)));
        assert_eq!(subst.len(), 1);
    }

    #[test]
    fn test_compose_and_evaluate() {
        let definition = Definition::new();
        let ctx = EvalContext::new(&definition);
        let x = Variable::new("X", Sort::int());
        let y = Variable::new("Y", Sort::int());

        let first = Substitution::singleton(x.clone(), Term::add(Term::Var(y.clone()), Term::int(1)));
        let second = Substitution::singleton(y.clone(), Term::int(2));
        let composed = first.compose_and_evaluate(&second, &ctx).unwrap();
        assert_eq!(composed.get(&x), Some(&Term::int(3)));
        assert_eq!(composed.get(&y), Some(&Term::int(2)));
    }

    #[test]
    fn test_compose_conflict() {
        let definition = Definition::new();
        let ctx = EvalContext::new(&definition);
        let x = Variable::new("X", Sort::int());

        let first = Substitution::singleton(x.clone(), Term::int(1));
        let second = Substitution::singleton(x, Term::int(2));
        let witness = first.compose_and_evaluate(&second, &ctx).unwrap_err();
        assert_eq!(witness, Equality::new(Term::int(1), Term::int(2)));
    }

    #[test]
    fn test_compose_drops_identity() {
        let definition = Definition::new();
        let ctx = EvalContext::new(&definition);
        let x = Variable::new("X", Sort::int());
        let y = Variable::new("Y", Sort::int());

        let first = Substitution::singleton(y.clone(), Term::Var(x.clone()));
        let second = Substitution::singleton(x, Term::Var(y.clone()));
        let composed = first.compose_and_evaluate(&second, &ctx).unwrap();
        assert!(composed.get(&y).is_none());
    }
}
