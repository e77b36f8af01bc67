// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::sort::Sort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SymbolKind {
    /// Free constructor: injective and disjoint from every other constructor.
    Constructor,
    /// Uninterpreted function. Applications are never decomposed.
    Function,
    /// Abstraction function introduced by pattern folding. Treated as
    /// injective only when pattern folding is enabled.
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature {
    pub params: Vec<Sort>,
    pub result: Sort,
}

impl Signature {
    pub fn new(params: Vec<Sort>, result: Sort) -> Self {
        Signature { params, result }
    }
}

/// A symbol is identified by its name and kind; signatures are carried
/// along for sort computation.
#[derive(Debug, Clone)]
pub struct Symbol {
    name: Arc<str>,
    kind: SymbolKind,
    signatures: Arc<[Signature]>,
}

impl Symbol {
    pub fn new(name: &str, kind: SymbolKind, signatures: Vec<Signature>) -> Self {
        Symbol {
            name: Arc::from(name),
            kind,
            signatures: Arc::from(signatures),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == SymbolKind::Constructor
    }

    pub fn is_pattern(&self) -> bool {
        self.kind == SymbolKind::Pattern
    }

    pub fn is_overloaded(&self) -> bool {
        self.signatures.len() > 1
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.kind == other.kind
    }
}

impl Eq for Symbol {}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.kind.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
