// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Error types for SMT operations

use thiserror::Error;

/// Result type alias for SMT operations
pub type SmtResult<T> = std::result::Result<T, SmtError>;

/// Errors that can occur while building or running a solver query. None of
/// them is fatal: the bridge turns every one into "not proved".
#[derive(Debug, Error)]
pub enum SmtError {
    /// Term or sort with no SMT-LIB counterpart
    #[error("cannot translate to SMT-LIB: {0}")]
    Untranslatable(String),

    /// Solver disabled by configuration
    #[error("SMT solver is disabled")]
    Disabled,

    /// The solver did not answer in time
    #[error("SMT solver timed out after {0}ms")]
    Timeout(u64),

    /// Solver process could not be started or talked to
    #[error("SMT solver process error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything but sat, unsat or unknown
    #[error("unexpected solver response `{response}` to query:\n{query}")]
    UnexpectedResponse { response: String, query: String },

    /// Prelude file could not be read
    #[error("cannot read SMT prelude: {0}")]
    Prelude(String),
}
