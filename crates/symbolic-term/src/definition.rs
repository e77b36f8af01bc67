// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Sort lattice plus symbol table.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::sort::{Sort, SortLattice};
use crate::symbol::{Signature, Symbol, SymbolKind};
use crate::term::Term;

#[derive(Debug, Clone)]
pub struct Definition {
    lattice: SortLattice,
    symbols: BTreeMap<Arc<str>, Symbol>,
}

impl Default for Definition {
    fn default() -> Self {
        Definition::new()
    }
}

impl Definition {
    pub fn new() -> Self {
        Definition {
            lattice: SortLattice::new(),
            symbols: BTreeMap::new(),
        }
    }

    pub fn lattice(&self) -> &SortLattice {
        &self.lattice
    }

    pub fn declare_sort(&mut self, name: &str) -> Sort {
        let sort = Sort::new(name);
        self.lattice.declare(sort.clone());
        sort
    }

    pub fn add_subsort(&mut self, big: &Sort, small: &Sort) {
        self.lattice.add_subsort(big.clone(), small.clone());
    }

    pub fn declare_symbol(
        &mut self,
        name: &str,
        kind: SymbolKind,
        signatures: Vec<Signature>,
    ) -> Symbol {
        for signature in &signatures {
            for sort in signature.params.iter().chain([&signature.result]) {
                self.lattice.declare(sort.clone());
            }
        }
        let symbol = Symbol::new(name, kind, signatures);
        self.symbols.insert(Arc::from(name), symbol.clone());
        symbol
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Applies `symbol`, computing the least sort of the application.
    pub fn apply(&self, symbol: &Symbol, args: Vec<Term>) -> Term {
        let arg_sorts: Vec<Sort> = args.iter().map(Term::sort).collect();
        let sort = self.least_sort(symbol, &arg_sorts);
        Term::app(symbol.clone(), args, sort)
    }

    /// Least result sort among the signatures whose parameters accept the
    /// argument sorts. Falls back to the unique maximal declared result,
    /// and to `K` when even that is ambiguous.
    pub fn least_sort(&self, symbol: &Symbol, arg_sorts: &[Sort]) -> Sort {
        let applicable: Vec<&Sort> = symbol
            .signatures()
            .iter()
            .filter(|signature| {
                signature.params.len() == arg_sorts.len()
                    && signature
                        .params
                        .iter()
                        .zip(arg_sorts)
                        .all(|(param, arg)| self.lattice.is_subsorted_eq(param, arg))
            })
            .map(|signature| &signature.result)
            .collect();
        let least = applicable.iter().find(|candidate| {
            applicable
                .iter()
                .all(|other| self.lattice.is_subsorted_eq(other, candidate))
        });
        if let Some(least) = least {
            return (*least).clone();
        }

        let results: Vec<&Sort> = symbol
            .signatures()
            .iter()
            .map(|signature| &signature.result)
            .collect();
        let greatest = results.iter().find(|candidate| {
            results
                .iter()
                .all(|other| self.lattice.is_subsorted_eq(candidate, other))
        });
        greatest.map_or_else(Sort::k, |sort| (*sort).clone())
    }

    /// Result sorts of every signature the arguments could still be
    /// narrowed into.
    pub fn possible_sorts(&self, symbol: &Symbol, arg_sorts: &[Sort]) -> BTreeSet<Sort> {
        self.possible_signatures(symbol, arg_sorts)
            .map(|signature| signature.result.clone())
            .collect()
    }

    pub fn possible_signatures<'a>(
        &'a self,
        symbol: &'a Symbol,
        arg_sorts: &'a [Sort],
    ) -> impl Iterator<Item = &'a Signature> + 'a {
        symbol.signatures().iter().filter(move |signature| {
            signature.params.len() == arg_sorts.len()
                && signature
                    .params
                    .iter()
                    .zip(arg_sorts)
                    .all(|(param, arg)| self.lattice.have_common_subsort(param, arg))
        })
    }
}
