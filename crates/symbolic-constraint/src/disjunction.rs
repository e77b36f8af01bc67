// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use itertools::Itertools;
use symbolic_term::EvalContext;

use crate::conjunction::Conjunction;
use crate::equality::TruthValue;
use crate::substitution::Substitution;

/// Alternatives, in a fixed order and without duplicates. The empty
/// disjunction is false.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Disjunction {
    conjunctions: Vec<Conjunction>,
}

impl Disjunction {
    pub fn new(conjunctions: impl IntoIterator<Item = Conjunction>) -> Self {
        Disjunction {
            conjunctions: conjunctions.into_iter().unique().collect(),
        }
    }

    pub fn conjunctions(&self) -> &[Conjunction] {
        &self.conjunctions
    }

    pub fn len(&self) -> usize {
        self.conjunctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conjunctions.is_empty()
    }

    pub fn truth_value(&self) -> TruthValue {
        if self.conjunctions.iter().any(Conjunction::is_true) {
            TruthValue::True
        } else if self.conjunctions.iter().all(Conjunction::is_false) {
            TruthValue::False
        } else {
            TruthValue::Unknown
        }
    }

    pub fn is_true(&self) -> bool {
        self.truth_value() == TruthValue::True
    }

    pub fn is_false(&self) -> bool {
        self.truth_value() == TruthValue::False
    }

    pub fn substitute_and_evaluate(&self, bindings: &Substitution, ctx: &EvalContext) -> Disjunction {
        Disjunction::new(
            self.conjunctions
                .iter()
                .map(|conjunction| conjunction.substitute_and_evaluate(bindings, ctx)),
        )
    }
}

impl Conjunction {
    /// Distributes nested disjunctions over the rest of the formula. The
    /// result has one member per combination of branches; members that
    /// are already false are left out.
    pub fn to_dnf(&self) -> Disjunction {
        if self.disjunctions().is_empty() || self.is_false() {
            return Disjunction::new([self.clone()]);
        }

        let mut base = Conjunction::new();
        for (var, term) in self.substitution().iter() {
            base.unsafe_add_variable_binding(var.clone(), term.clone());
        }
        for equality in self.equalities().iter() {
            base.add_equality(equality.clone());
        }

        let branches: Vec<Vec<Conjunction>> = self
            .disjunctions()
            .iter()
            .map(|disjunction| {
                disjunction
                    .conjunctions()
                    .iter()
                    .flat_map(|conjunction| conjunction.to_dnf().conjunctions)
                    .collect()
            })
            .collect();

        Disjunction::new(
            branches
                .into_iter()
                .multi_cartesian_product()
                .map(|combination| {
                    let mut member = base.clone();
                    for branch in &combination {
                        member.add_conjunction(branch);
                    }
                    member
                })
                .filter(|member| !member.is_false()),
        )
    }
}

impl fmt::Display for Disjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conjunctions.is_empty() {
            return f.write_str("false");
        }
        write!(f, "{}", self.conjunctions.iter().format(" \\/ "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equality::Equality;
    use symbolic_term::{Sort, Term};

    fn eq(name: &str, value: i64) -> Conjunction {
        Conjunction::from_equalities([Equality::new(Term::var(name, Sort::int()), Term::int(value))])
    }

    #[test]
    fn test_truth_value() {
        assert!(Disjunction::new(vec![]).is_false());
        assert!(Disjunction::new(vec![eq("X", 1), Conjunction::new()]).is_true());
        assert_eq!(
            Disjunction::new(vec![eq("X", 1), eq("X", 2)]).truth_value(),
            TruthValue::Unknown
        );
    }

    #[test]
    fn test_duplicates_are_removed() {
        let disjunction = Disjunction::new(vec![eq("X", 1), eq("X", 2), eq("X", 1)]);
        assert_eq!(disjunction.len(), 2);
        assert_eq!(disjunction.conjunctions()[1], eq("X", 2));
    }

    #[test]
    fn test_dnf_without_disjunctions() {
        let conjunction = eq("X", 1);
        assert_eq!(conjunction.to_dnf().conjunctions(), &[conjunction]);
    }

    #[test]
    fn test_dnf_cartesian_product() {
        let mut conjunction = eq("Z", 0);
        conjunction.add_disjunction(Disjunction::new(vec![eq("X", 1), eq("X", 2)]));
        conjunction.add_disjunction(Disjunction::new(vec![eq("Y", 1), eq("Y", 2)]));

        let dnf = conjunction.to_dnf();
        assert_eq!(dnf.len(), 4);
        for member in dnf.conjunctions() {
            assert!(member.disjunctions().is_empty());
            assert_eq!(member.equalities().len(), 3);
            assert!(member
                .equalities()
                .contains(&Equality::new(Term::var("Z", Sort::int()), Term::int(0))));
        }
    }

    #[test]
    fn test_dnf_drops_contradictory_combinations() {
        let mut x_is_one = Conjunction::new();
        x_is_one.unsafe_add_variable_binding(
            symbolic_term::Variable::new("X", Sort::int()),
            Term::int(1),
        );
        let mut x_is_two = Conjunction::new();
        x_is_two.unsafe_add_variable_binding(
            symbolic_term::Variable::new("X", Sort::int()),
            Term::int(2),
        );

        let mut conjunction = Conjunction::new();
        conjunction.add_disjunction(Disjunction::new(vec![x_is_one.clone(), x_is_two.clone()]));
        conjunction.add_disjunction(Disjunction::new(vec![x_is_one, eq("Y", 5)]));

        assert_eq!(conjunction.to_dnf().len(), 3);
    }
}
