// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Translation of constraints to SMT-LIB 2 text.
//!
//! Integers and booleans map to the builtin theories. Every other sort
//! becomes an uninterpreted sort and every symbol an uninterpreted
//! function. Strings and lists are not translated.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use itertools::Itertools;
use symbolic_term::{BuiltinOp, Sort, Term, Variable};

use crate::conjunction::Conjunction;
use crate::equality::Equality;
use crate::smt::error::{SmtError, SmtResult};

fn mangle(prefix: &str, name: &str) -> String {
    let mut mangled = String::from(prefix);
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            mangled.push(c);
        } else {
            let _ = write!(mangled, "${:x}", c as u32);
        }
    }
    mangled
}

/// Collects declarations while translating, so that a query can be
/// emitted once all of its formulas are translated.
#[derive(Debug, Default)]
pub struct SmtLibTranslator {
    sorts: BTreeSet<String>,
    constants: BTreeMap<String, String>,
    functions: BTreeMap<String, (Vec<String>, String)>,
}

impl SmtLibTranslator {
    pub fn new() -> Self {
        SmtLibTranslator::default()
    }

    pub fn translate_sort(&mut self, sort: &Sort) -> SmtResult<String> {
        match sort.name() {
            "Int" => Ok("Int".to_string()),
            "Bool" => Ok("Bool".to_string()),
            "String" | "List" => Err(SmtError::Untranslatable(format!("sort {sort}"))),
            name => {
                let mangled = mangle("S_", name);
                self.sorts.insert(mangled.clone());
                Ok(mangled)
            }
        }
    }

    fn variable_name(var: &Variable) -> String {
        mangle("v_", var.name())
    }

    /// Translates a term. Variables in `bound` are not declared.
    pub fn translate_term(&mut self, term: &Term, bound: &BTreeSet<Variable>) -> SmtResult<String> {
        match term {
            Term::Var(var) => {
                let name = Self::variable_name(var);
                if !bound.contains(var) {
                    let sort = self.translate_sort(var.sort())?;
                    match self.constants.get(&name) {
                        Some(declared) if *declared != sort => {
                            return Err(SmtError::Untranslatable(format!(
                                "variable {} used at different sorts",
                                var.name()
                            )))
                        }
                        Some(_) => {}
                        None => {
                            self.constants.insert(name.clone(), sort);
                        }
                    }
                }
                Ok(name)
            }
            Term::Bool(value) => Ok(value.to_string()),
            Term::Int(value) if value.sign() == num::bigint::Sign::Minus => {
                Ok(format!("(- {})", -value))
            }
            Term::Int(value) => Ok(value.to_string()),
            Term::Str(_) | Term::List { .. } => {
                Err(SmtError::Untranslatable(format!("term {term}")))
            }
            Term::App { symbol, args, sort } => {
                let name = mangle("f_", symbol.name());
                let params = args
                    .iter()
                    .map(|arg| self.translate_sort(&arg.sort()))
                    .collect::<SmtResult<Vec<_>>>()?;
                let result = self.translate_sort(sort)?;
                let signature = (params, result);
                match self.functions.get(&name) {
                    Some(declared) if *declared != signature => {
                        return Err(SmtError::Untranslatable(format!(
                            "symbol {symbol} used at different sorts"
                        )))
                    }
                    Some(_) => {}
                    None => {
                        self.functions.insert(name.clone(), signature);
                    }
                }
                if args.is_empty() {
                    return Ok(name);
                }
                let args = args
                    .iter()
                    .map(|arg| self.translate_term(arg, bound))
                    .collect::<SmtResult<Vec<_>>>()?;
                Ok(format!("({name} {})", args.join(" ")))
            }
            Term::Builtin { op, args } => {
                let operator = match op {
                    BuiltinOp::AndBool => "and",
                    BuiltinOp::OrBool => "or",
                    BuiltinOp::NotBool => "not",
                    BuiltinOp::EqK => "=",
                    BuiltinOp::AddInt => "+",
                    BuiltinOp::SubInt => "-",
                    BuiltinOp::LtInt => "<",
                    BuiltinOp::LeInt => "<=",
                };
                let args = args
                    .iter()
                    .map(|arg| self.translate_term(arg, bound))
                    .collect::<SmtResult<Vec<_>>>()?;
                Ok(format!("({operator} {})", args.join(" ")))
            }
            Term::Ite {
                cond,
                then_branch,
                else_branch,
            } => Ok(format!(
                "(ite {} {} {})",
                self.translate_term(cond, bound)?,
                self.translate_term(then_branch, bound)?,
                self.translate_term(else_branch, bound)?
            )),
        }
    }

    pub fn translate_equality(
        &mut self,
        equality: &Equality,
        bound: &BTreeSet<Variable>,
    ) -> SmtResult<String> {
        Ok(format!(
            "(= {} {})",
            self.translate_term(equality.lhs(), bound)?,
            self.translate_term(equality.rhs(), bound)?
        ))
    }

    pub fn translate_conjunction(
        &mut self,
        conjunction: &Conjunction,
        bound: &BTreeSet<Variable>,
    ) -> SmtResult<String> {
        if conjunction.is_false() {
            return Ok("false".to_string());
        }
        let mut parts = vec![];
        for equality in conjunction
            .substitution()
            .equalities()
            .chain(conjunction.equalities().iter().cloned())
        {
            parts.push(self.translate_equality(&equality, bound)?);
        }
        for disjunction in conjunction.disjunctions().iter() {
            let alternatives = disjunction
                .conjunctions()
                .iter()
                .map(|alternative| self.translate_conjunction(alternative, bound))
                .collect::<SmtResult<Vec<_>>>()?;
            parts.push(match alternatives.as_slice() {
                [] => "false".to_string(),
                [only] => only.clone(),
                _ => format!("(or {})", alternatives.join(" ")),
            });
        }
        Ok(match parts.as_slice() {
            [] => "true".to_string(),
            [only] => only.clone(),
            _ => format!("(and {})", parts.join(" ")),
        })
    }

    fn declarations(&self) -> String {
        let mut out = String::new();
        for sort in &self.sorts {
            let _ = writeln!(out, "(declare-sort {sort} 0)");
        }
        for (name, sort) in &self.constants {
            let _ = writeln!(out, "(declare-fun {name} () {sort})");
        }
        for (name, (params, result)) in &self.functions {
            let _ = writeln!(out, "(declare-fun {name} ({}) {result})", params.join(" "));
        }
        out
    }

    /// Query whose answer is `unsat` iff `constraint` is unsatisfiable.
    pub fn constraint_query(constraint: &Conjunction) -> SmtResult<String> {
        let mut translator = SmtLibTranslator::new();
        let formula = translator.translate_conjunction(constraint, &BTreeSet::new())?;
        Ok(format!(
            "{}(assert {formula})\n(check-sat)\n",
            translator.declarations()
        ))
    }

    /// Query whose answer is `unsat` iff `left` implies `right` with the
    /// variables of `existentials` quantified existentially in `right`.
    pub fn implication_query(
        left: &Conjunction,
        right: &Conjunction,
        existentials: &BTreeSet<Variable>,
    ) -> SmtResult<String> {
        let mut translator = SmtLibTranslator::new();
        let bound: BTreeSet<Variable> = right
            .variables()
            .into_iter()
            .filter(|var| existentials.contains(var))
            .collect();
        let left_formula = translator.translate_conjunction(left, &BTreeSet::new())?;
        let right_formula = translator.translate_conjunction(right, &bound)?;
        let goal = if bound.is_empty() {
            right_formula
        } else {
            let binders = bound
                .iter()
                .map(|var| {
                    translator
                        .translate_sort(var.sort())
                        .map(|sort| format!("({} {sort})", Self::variable_name(var)))
                })
                .collect::<SmtResult<Vec<_>>>()?;
            format!("(exists ({}) {right_formula})", binders.iter().join(" "))
        };
        Ok(format!(
            "{}(assert {left_formula})\n(assert (not {goal}))\n(check-sat)\n",
            translator.declarations()
        ))
    }
}
