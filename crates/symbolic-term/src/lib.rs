// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Order-sorted symbolic terms.
//!
//! This crate is the term layer the constraint engine is built on: sorts
//! with a subsort lattice, constructor and function symbols, variables,
//! a closed [`Term`] type, and substitution with builtin evaluation. It is
//! intentionally small. There is no parser and no rewriting here.

pub mod definition;
pub mod eval;
pub mod sort;
pub mod symbol;
pub mod term;
pub mod variable;

pub use definition::Definition;
pub use eval::{evaluate, substitute, substitute_and_evaluate, Bindings, BooleanFacts, EvalContext};
pub use sort::{Sort, SortLattice};
pub use symbol::{Signature, Symbol, SymbolKind};
pub use term::{clashes, BuiltinOp, Term};
pub use variable::{FreshNames, Variable};
