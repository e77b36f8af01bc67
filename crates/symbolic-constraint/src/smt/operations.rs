// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fmt;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};
use once_cell::sync::OnceCell;
use symbolic_term::Variable;

use crate::conjunction::Conjunction;
use crate::options::{SmtOptions, DEFAULT_SMT_PRELUDE};
use crate::smt::error::{SmtError, SmtResult};
use crate::smt::process::run_with_timeout;
use crate::smt::translate::SmtLibTranslator;
use crate::smt::{SmtBridge, SolverRequest};

/// Number of times a query is resent after an empty solver answer.
const RESTART_LIMIT: usize = 3;

#[derive(Debug, Default)]
pub struct SmtProfiler {
    requests: AtomicU64,
    query_build_failures: AtomicU64,
    timeouts: AtomicU64,
    unsat_answers: AtomicU64,
}

impl SmtProfiler {
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn query_build_failures(&self) -> u64 {
        self.query_build_failures.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub fn unsat_answers(&self) -> u64 {
        self.unsat_answers.load(Ordering::Relaxed)
    }

    fn count(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Display for SmtProfiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "smt requests: {}, query build failures: {}, timeouts: {}, unsat: {}",
            self.requests(),
            self.query_build_failures(),
            self.timeouts(),
            self.unsat_answers()
        )
    }
}

/// Bridge to a `z3` process, one process per query.
#[derive(Debug)]
pub struct SmtOperations {
    options: SmtOptions,
    prelude: OnceCell<String>,
    profiler: SmtProfiler,
}

impl SmtOperations {
    pub fn new(options: SmtOptions) -> Self {
        SmtOperations {
            options,
            prelude: OnceCell::new(),
            profiler: SmtProfiler::default(),
        }
    }

    pub fn options(&self) -> &SmtOptions {
        &self.options
    }

    pub fn profiler(&self) -> &SmtProfiler {
        &self.profiler
    }

    fn prelude(&self) -> SmtResult<&str> {
        self.prelude
            .get_or_try_init(|| match &self.options.smt_prelude {
                None => Ok(DEFAULT_SMT_PRELUDE.to_string()),
                Some(path) => std::fs::read_to_string(path)
                    .map_err(|err| SmtError::Prelude(format!("{}: {err}", path.display()))),
            })
            .map(String::as_str)
    }

    fn run_query(&self, query: &str, request: &SolverRequest) -> SmtResult<bool> {
        let input = format!("{}{query}", self.prelude()?);
        if self.options.debug_z3_queries {
            debug!("{}: z3 query:\n{input}", request.phase);
        }
        let command = self.options.get_z3_command(request.timeout_ms);
        let hard_timeout = self.options.hard_timeout(request.timeout_ms);

        for attempt in 0..=RESTART_LIMIT {
            let output = match run_with_timeout(&command, &input, hard_timeout) {
                Err(err) if err.kind() == ErrorKind::TimedOut => {
                    return Err(SmtError::Timeout(request.timeout_ms))
                }
                result => result?,
            };
            let response = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if response.is_empty() {
                debug!("{}: empty z3 answer, attempt {attempt}", request.phase);
                continue;
            }
            if self.options.debug_z3_queries {
                debug!("{}: z3 answer: {response}", request.phase);
            }
            return match response.lines().next().map(str::trim) {
                Some("unsat") => Ok(true),
                Some("sat") | Some("unknown") => Ok(false),
                Some("timeout") => Err(SmtError::Timeout(request.timeout_ms)),
                _ => Err(SmtError::UnexpectedResponse {
                    response,
                    query: input,
                }),
            };
        }
        Err(SmtError::UnexpectedResponse {
            response: String::new(),
            query: input,
        })
    }

    fn decide(&self, query: SmtResult<String>, request: &SolverRequest) -> bool {
        SmtProfiler::count(&self.profiler.requests);
        let result = query
            .map_err(|err| {
                SmtProfiler::count(&self.profiler.query_build_failures);
                err
            })
            .and_then(|query| self.run_query(&query, request));
        match result {
            Ok(unsat) => {
                if unsat {
                    SmtProfiler::count(&self.profiler.unsat_answers);
                }
                unsat
            }
            Err(err @ SmtError::Untranslatable(_)) if self.options.ignore_missing_smtlib_warning => {
                debug!("{}: {err}", request.phase);
                false
            }
            Err(err) => {
                if let SmtError::Timeout(_) = err {
                    SmtProfiler::count(&self.profiler.timeouts);
                }
                warn!("{}: {err}", request.phase);
                false
            }
        }
    }
}

impl SmtBridge for SmtOperations {
    fn check_unsat(&self, constraint: &Conjunction, request: &SolverRequest) -> bool {
        if constraint.is_false() {
            return true;
        }
        if constraint.is_true() {
            return false;
        }
        self.decide(SmtLibTranslator::constraint_query(constraint), request)
    }

    fn implies(
        &self,
        left: &Conjunction,
        right: &Conjunction,
        existentials: &BTreeSet<Variable>,
        request: &SolverRequest,
    ) -> bool {
        if left.is_false() || right.is_true() {
            return true;
        }
        self.decide(
            SmtLibTranslator::implication_query(left, right, existentials),
            request,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smt::Phase;
    use symbolic_term::{Sort, Term};

    fn request() -> SolverRequest {
        SolverRequest::new(Phase::Execution, 50)
    }

    fn bounded_x() -> (Conjunction, Conjunction) {
        let x = Term::var("X", Sort::int());
        let mut left = Conjunction::new();
        left.add_terms(Term::lt(x.clone(), Term::int(3)), Term::bool(true));
        let mut right = Conjunction::new();
        right.add_terms(Term::lt(x, Term::int(5)), Term::bool(true));
        (left, right)
    }

    #[test]
    fn test_missing_solver_is_not_proof() {
        let operations = SmtOperations::new(SmtOptions {
            z3_exe: "/nonexistent/z3".to_string(),
            ..SmtOptions::default()
        });
        let (left, right) = bounded_x();
        assert!(!operations.implies(&left, &right, &BTreeSet::new(), &request()));
        assert!(!operations.check_unsat(&left, &request()));
        assert_eq!(operations.profiler().requests(), 2);
        assert_eq!(operations.profiler().unsat_answers(), 0);
    }

    #[test]
    fn test_untranslatable_query_is_not_proof() {
        let operations = SmtOperations::new(SmtOptions {
            z3_exe: "/nonexistent/z3".to_string(),
            ignore_missing_smtlib_warning: true,
            ..SmtOptions::default()
        });
        let mut left = Conjunction::new();
        left.add_terms(Term::var("S", Sort::string()), Term::string("a"));
        assert!(!operations.check_unsat(&left, &request()));
        assert_eq!(operations.profiler().query_build_failures(), 1);
    }

    #[test]
    fn test_missing_prelude_is_not_proof() {
        let dir = tempfile::tempdir().unwrap();
        let operations = SmtOperations::new(SmtOptions {
            smt_prelude: Some(dir.path().join("missing.smt2")),
            ..SmtOptions::default()
        });
        let (left, right) = bounded_x();
        assert!(!operations.implies(&left, &right, &BTreeSet::new(), &request()));
    }

    #[cfg(unix)]
    fn fake_solver(dir: &tempfile::TempDir, answer: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join(format!("z3-{answer}"));
        std::fs::write(&path, format!("#!/bin/sh\ncat > /dev/null\necho {answer}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    #[cfg(unix)]
    #[test]
    fn test_solver_answers() {
        let dir = tempfile::tempdir().unwrap();
        let (left, right) = bounded_x();
        for (answer, proved) in [("unsat", true), ("sat", false), ("unknown", false), ("oops", false)] {
            let operations = SmtOperations::new(SmtOptions {
                z3_exe: fake_solver(&dir, answer),
                ..SmtOptions::default()
            });
            assert_eq!(
                operations.implies(&left, &right, &BTreeSet::new(), &request()),
                proved,
                "answer {answer}"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_solver_timeout_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let operations = SmtOptions {
            z3_exe: fake_solver(&dir, "timeout"),
            ..SmtOptions::default()
        };
        let operations = SmtOperations::new(operations);
        let (left, _) = bounded_x();
        assert!(!operations.check_unsat(&left, &request()));
        assert_eq!(operations.profiler().timeouts(), 1);
    }
}
