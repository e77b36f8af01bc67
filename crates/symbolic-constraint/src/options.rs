// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Prelude sent before every query when no prelude file is configured.
pub const DEFAULT_SMT_PRELUDE: &str = "(set-option :auto-config false)\n(set-option :smt.mbqi false)\n";

fn read_env_var(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

/// Engine options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    /// Whether simplification results are memoized.
    pub cache_simplifications: bool,
    /// Whether solver-backed implication results are memoized.
    pub cache_implications: bool,
    /// Number of simplification results kept before the table is emptied.
    /// No limit when absent.
    pub cache_capacity: Option<usize>,
    /// Maximum number of case splits along one implication goal.
    pub max_case_splits: usize,
    /// Whether formulas are pretty printed in full in debug output.
    pub debug_formulas: bool,
    pub smt: SmtOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_simplifications: true,
            cache_implications: true,
            cache_capacity: None,
            max_case_splits: 16,
            debug_formulas: false,
            smt: SmtOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtSolver {
    Z3,
    None,
}

/// SMT solver options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmtOptions {
    pub solver: SmtSolver,
    /// Path to the z3 executable. `z3` from `PATH` when empty.
    pub z3_exe: String,
    /// Soft solver timeout for satisfiability checks of a single
    /// constraint, in milliseconds.
    pub constraint_timeout_ms: u64,
    /// Soft solver timeout for implication checks, in milliseconds.
    pub implication_timeout_ms: u64,
    /// A hard timeout for the solver process; if it does not terminate
    /// within this time frame, it will be killed. Zero means twice the
    /// soft timeout plus one second.
    pub hard_timeout_secs: u64,
    /// File whose content replaces the default prelude.
    pub smt_prelude: Option<PathBuf>,
    /// Whether queries that cannot be translated to SMT-LIB are reported at
    /// debug level instead of as warnings.
    pub ignore_missing_smtlib_warning: bool,
    /// Whether queries and solver answers are logged.
    pub debug_z3_queries: bool,
}

impl Default for SmtOptions {
    fn default() -> Self {
        Self {
            solver: SmtSolver::Z3,
            z3_exe: read_env_var("Z3_EXE"),
            constraint_timeout_ms: 50,
            implication_timeout_ms: 5000,
            hard_timeout_secs: 0,
            smt_prelude: None,
            ignore_missing_smtlib_warning: false,
            debug_z3_queries: false,
        }
    }
}

impl EngineOptions {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid engine options")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read options file `{}`", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("in options file `{}`", path.display()))
    }
}

impl SmtOptions {
    /// Returns command line to call z3 with the given soft timeout.
    pub fn get_z3_command(&self, timeout_ms: u64) -> Vec<String> {
        let exe = if self.z3_exe.is_empty() {
            "z3".to_string()
        } else {
            self.z3_exe.clone()
        };
        vec![
            exe,
            "-in".to_string(),
            "-smt2".to_string(),
            format!("-t:{timeout_ms}"),
        ]
    }

    pub fn hard_timeout(&self, timeout_ms: u64) -> std::time::Duration {
        if self.hard_timeout_secs > 0 {
            std::time::Duration::from_secs(self.hard_timeout_secs)
        } else {
            std::time::Duration::from_millis(2 * timeout_ms + 1000)
        }
    }
}
