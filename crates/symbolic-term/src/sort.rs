// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Sorts and the subsort lattice.
//!
//! `K` is the top sort: every sort is a subsort of it. All other subsort
//! relations are declared explicitly and kept transitively closed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sort(Arc<str>);

impl Sort {
    pub fn new(name: &str) -> Self {
        Sort(Arc::from(name))
    }

    pub fn bool() -> Self {
        Sort::new("Bool")
    }

    pub fn int() -> Self {
        Sort::new("Int")
    }

    pub fn string() -> Self {
        Sort::new("String")
    }

    pub fn list() -> Self {
        Sort::new("List")
    }

    /// The top sort.
    pub fn k() -> Self {
        Sort::new("K")
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_k(&self) -> bool {
        &*self.0 == "K"
    }

    pub fn is_bool(&self) -> bool {
        &*self.0 == "Bool"
    }

    pub fn is_int(&self) -> bool {
        &*self.0 == "Int"
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reflexive, transitive subsort relation.
///
/// For every declared sort we store the set of sorts below it (itself
/// included), so queries are a single set lookup.
#[derive(Debug, Clone, Default)]
pub struct SortLattice {
    below: BTreeMap<Sort, BTreeSet<Sort>>,
}

impl SortLattice {
    /// A lattice with the builtin sorts declared.
    pub fn new() -> Self {
        let mut lattice = SortLattice::default();
        for sort in [Sort::bool(), Sort::int(), Sort::string(), Sort::list()] {
            lattice.declare(sort);
        }
        lattice
    }

    pub fn declare(&mut self, sort: Sort) {
        if sort.is_k() {
            return;
        }
        self.below
            .entry(sort.clone())
            .or_insert_with(|| BTreeSet::from([sort]));
    }

    /// Declares `small < big` and restores transitive closure.
    pub fn add_subsort(&mut self, big: Sort, small: Sort) {
        self.declare(big.clone());
        self.declare(small.clone());
        if big.is_k() {
            return;
        }
        let below_small = self.lower_set(&small);
        for (sort, below) in self.below.iter_mut() {
            if *sort == big || below.contains(&big) {
                below.extend(below_small.iter().cloned());
            }
        }
    }

    pub fn sorts(&self) -> impl Iterator<Item = &Sort> {
        self.below.keys()
    }

    /// `small <= big` in the subsort order.
    pub fn is_subsorted_eq(&self, big: &Sort, small: &Sort) -> bool {
        if big == small || big.is_k() {
            return true;
        }
        self.below
            .get(big)
            .map_or(false, |below| below.contains(small))
    }

    fn lower_set(&self, sort: &Sort) -> BTreeSet<Sort> {
        if sort.is_k() {
            let mut all: BTreeSet<Sort> = self.below.keys().cloned().collect();
            all.insert(Sort::k());
            return all;
        }
        self.below
            .get(sort)
            .cloned()
            .unwrap_or_else(|| BTreeSet::from([sort.clone()]))
    }

    fn common_lower_bounds(&self, left: &Sort, right: &Sort) -> BTreeSet<Sort> {
        let right_below = self.lower_set(right);
        self.lower_set(left)
            .into_iter()
            .filter(|sort| right_below.contains(sort))
            .collect()
    }

    pub fn have_common_subsort(&self, left: &Sort, right: &Sort) -> bool {
        !self.common_lower_bounds(left, right).is_empty()
    }

    /// Greatest lower bound, if there is a unique maximal common subsort.
    pub fn glb(&self, left: &Sort, right: &Sort) -> Option<Sort> {
        if self.is_subsorted_eq(left, right) {
            return Some(right.clone());
        }
        if self.is_subsorted_eq(right, left) {
            return Some(left.clone());
        }
        let common = self.common_lower_bounds(left, right);
        let maximal: Vec<&Sort> = common
            .iter()
            .filter(|candidate| {
                !common
                    .iter()
                    .any(|other| other != *candidate && self.is_subsorted_eq(other, candidate))
            })
            .collect();
        match maximal.as_slice() {
            [only] => Some((*only).clone()),
            _ => None,
        }
    }
}
