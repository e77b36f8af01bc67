// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Memo tables for simplification and implication results.
//!
//! Both tables are concurrent maps with insert-if-absent semantics. Two
//! threads racing on the same key may both compute the value; the first
//! insertion wins and every reader gets a complete value.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use symbolic_term::Variable;

use crate::conjunction::{Conjunction, Contradiction};
use crate::simplify::SimplifyMode;

pub type Simplified = Result<Conjunction, Contradiction>;

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }
}

/// Results of `simplify`, keyed by the formula and every mode flag that
/// affects the result.
#[derive(Debug, Default)]
pub struct SimplificationCache {
    entries: DashMap<(Conjunction, SimplifyMode), Simplified>,
    capacity: Option<usize>,
    counters: Counters,
}

impl SimplificationCache {
    /// With a capacity, the table is emptied whenever it fills up.
    pub fn new(capacity: Option<usize>) -> Self {
        SimplificationCache {
            capacity,
            ..SimplificationCache::default()
        }
    }

    pub fn get(&self, formula: &Conjunction, mode: SimplifyMode) -> Option<Simplified> {
        self.entries
            .get(&(formula.clone(), mode))
            .map(|entry| entry.value().clone())
    }

    /// Stores `value` unless the key is already present, and returns the
    /// stored value.
    pub fn insert(&self, formula: Conjunction, mode: SimplifyMode, value: Simplified) -> Simplified {
        if self.capacity.map_or(false, |capacity| self.entries.len() >= capacity) {
            self.entries.clear();
        }
        self.entries
            .entry((formula, mode))
            .or_insert(value)
            .value()
            .clone()
    }

    pub fn get_or_compute(
        &self,
        formula: &Conjunction,
        mode: SimplifyMode,
        compute: impl FnOnce() -> Simplified,
    ) -> Simplified {
        if let Some(value) = self.get(formula, mode) {
            self.counters.hit();
            return value;
        }
        self.counters.miss();
        let value = compute();
        self.insert(formula.clone(), mode, value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn hits(&self) -> u64 {
        self.counters.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.counters.misses.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImplicationKey {
    pub left: Conjunction,
    pub right: Conjunction,
    pub existentials: BTreeSet<Variable>,
}

/// Outcomes of solver-backed implication checks.
#[derive(Debug, Default)]
pub struct ImplicationCache {
    entries: DashMap<ImplicationKey, bool>,
    counters: Counters,
}

impl ImplicationCache {
    pub fn new() -> Self {
        ImplicationCache::default()
    }

    pub fn get(&self, key: &ImplicationKey) -> Option<bool> {
        self.entries.get(key).map(|entry| *entry.value())
    }

    pub fn get_or_compute(&self, key: ImplicationKey, compute: impl FnOnce() -> bool) -> bool {
        if let Some(value) = self.get(&key) {
            self.counters.hit();
            return value;
        }
        self.counters.miss();
        let value = compute();
        *self.entries.entry(key).or_insert(value).value()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.counters.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.counters.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equality::Equality;
    use std::sync::Arc;
    use std::thread;
    use symbolic_term::{Sort, Term};

    fn formula(value: i64) -> Conjunction {
        Conjunction::from_equalities([Equality::new(Term::var("X", Sort::int()), Term::int(value))])
    }

    #[test]
    fn test_mode_is_part_of_the_key() {
        let cache = SimplificationCache::new(None);
        let stored = Ok(formula(1));
        cache.insert(formula(1), SimplifyMode::DEFAULT, stored.clone());
        assert_eq!(cache.get(&formula(1), SimplifyMode::DEFAULT), Some(stored));
        assert_eq!(cache.get(&formula(1), SimplifyMode::BEFORE_PATTERN_FOLDING), None);
        assert_eq!(cache.get(&formula(2), SimplifyMode::DEFAULT), None);
    }

    #[test]
    fn test_insert_if_absent() {
        let cache = SimplificationCache::new(None);
        let first = cache.insert(formula(1), SimplifyMode::DEFAULT, Ok(formula(1)));
        let second = cache.insert(formula(1), SimplifyMode::DEFAULT, Ok(formula(2)));
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity() {
        let cache = SimplificationCache::new(Some(2));
        for value in 0..5 {
            cache.insert(formula(value), SimplifyMode::DEFAULT, Ok(formula(value)));
        }
        assert!(cache.len() <= 2);
    }

    #[test]
    fn test_get_or_compute_counts() {
        let cache = SimplificationCache::new(None);
        let mut calls = 0;
        for _ in 0..3 {
            cache.get_or_compute(&formula(1), SimplifyMode::DEFAULT, || {
                calls += 1;
                Ok(formula(1))
            });
        }
        assert_eq!(calls, 1);
        assert_eq!((cache.hits(), cache.misses()), (2, 1));
    }

    #[test]
    fn test_concurrent_implication_cache() {
        let cache = Arc::new(ImplicationCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let key = ImplicationKey {
                        left: formula((i % 2) as i64),
                        right: Conjunction::new(),
                        existentials: BTreeSet::new(),
                    };
                    cache.get_or_compute(key, || i % 2 == 0)
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), i % 2 == 0);
        }
        assert_eq!(cache.len(), 2);
    }
}
