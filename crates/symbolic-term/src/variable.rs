// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::sort::Sort;

/// A sorted logical variable. Variables order by name first, which is the
/// tie-break used when two variables are unified.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    name: Arc<str>,
    sort: Sort,
}

impl Variable {
    pub fn new(name: &str, sort: Sort) -> Self {
        Variable {
            name: Arc::from(name),
            sort,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn is_fresh(&self) -> bool {
        self.name.starts_with('_')
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.sort)
    }
}

/// Names for the variables introduced while simplifying one formula.
///
/// A name is built from the variables the new one stands for, so a formula
/// always gets the same names, and a pair of variables gets the same name
/// in every formula that meets it. Names the formula already uses are
/// skipped by appending primes.
#[derive(Debug, Default)]
pub struct FreshNames {
    taken: RefCell<BTreeSet<String>>,
}

impl FreshNames {
    pub fn avoiding<'v>(vars: impl IntoIterator<Item = &'v Variable>) -> Self {
        FreshNames {
            taken: RefCell::new(vars.into_iter().map(|var| var.name().to_string()).collect()),
        }
    }

    /// A new variable of `sort` standing for `origins`, which are named in
    /// sorted order.
    pub fn derive(&self, origins: &[&Variable], sort: Sort) -> Variable {
        let mut name = format!("_{}", origins.iter().sorted().map(|var| var.name()).join("_"));
        let mut taken = self.taken.borrow_mut();
        while taken.contains(&name) {
            name.push('\'');
        }
        taken.insert(name.clone());
        Variable::new(&name, sort)
    }
}

#[test]
fn test_fresh_names_are_derived_from_origins() {
    let x = Variable::new("X", Sort::new("A"));
    let y = Variable::new("Y", Sort::new("B"));
    let names = FreshNames::avoiding([&x, &y]);
    let fresh = names.derive(&[&y, &x], Sort::new("C"));
    assert_eq!(fresh.name(), "_X_Y");
    assert!(fresh.is_fresh());
    assert_eq!(fresh.sort(), &Sort::new("C"));

    let again = FreshNames::avoiding([&x, &y]).derive(&[&x, &y], Sort::new("C"));
    assert_eq!(fresh, again);
}

#[test]
fn test_fresh_names_skip_taken_names() {
    let x = Variable::new("X", Sort::int());
    let taken = Variable::new("_X", Sort::int());
    let names = FreshNames::avoiding([&x, &taken]);
    assert_eq!(names.derive(&[&x], Sort::int()).name(), "_X'");
    assert_eq!(names.derive(&[&x], Sort::int()).name(), "_X''");
}

#[test]
fn test_order_is_by_name() {
    let x = Variable::new("X", Sort::k());
    let y = Variable::new("Y", Sort::bool());
    assert!(x < y);
}
