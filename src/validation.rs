//! Ordered validation pipelines.
//!
//! A [`Chain`] is a list of pure [`Check`]s run in order against a submission. In
//! [`ValidationMode::Strict`] the first failure stops everything. In
//! [`ValidationMode::FallThrough`] the checks marked [`Severity::Reported`] only record their
//! failure and let the chain continue: the client gets the error, but the write still happens.

use serde_json::{Map, Value};

use crate::errors::Error;

pub mod dishes;
pub mod orders;

/// How a chain reacts to failed checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ValidationMode {
    /// Any failed check rejects the request
    #[default]
    Strict,
    /// Reported checks don't stop the chain, the write goes through and the client still gets
    /// the first error
    FallThrough,
}

/// Whether a failed check always stops its chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Halting,
    Reported,
}

/// A named, side-effect free precondition on a submission
pub struct Check<T> {
    pub name: &'static str,
    pub severity: Severity,
    run: fn(&T) -> std::result::Result<(), Error>,
}

impl<T> Check<T> {
    pub fn halting(name: &'static str, run: fn(&T) -> std::result::Result<(), Error>) -> Self {
        Check {
            name,
            severity: Severity::Halting,
            run,
        }
    }

    pub fn reported(name: &'static str, run: fn(&T) -> std::result::Result<(), Error>) -> Self {
        Check {
            name,
            severity: Severity::Reported,
            run,
        }
    }

    pub fn run(&self, input: &T) -> std::result::Result<(), Error> {
        (self.run)(input)
    }
}

/// Outcome of running a chain
#[derive(Debug)]
pub enum Verdict {
    /// Every check passed
    Pass,
    /// The request must be rejected without touching the store
    Reject(Error),
    /// Only reported checks failed in fall-through mode: perform the write, then answer with
    /// this error
    Proceed(Error),
}

/// An ordered list of checks
pub struct Chain<T> {
    checks: Vec<Check<T>>,
}

impl<T> Chain<T> {
    pub fn new(checks: Vec<Check<T>>) -> Self {
        Chain { checks }
    }

    /// Append the checks of another chain after ours
    pub fn then(mut self, other: Chain<T>) -> Self {
        self.checks.extend(other.checks);
        self
    }

    pub fn run(&self, input: &T, mode: ValidationMode) -> Verdict {
        let mut reported: Option<Error> = None;

        for check in &self.checks {
            let Err(err) = check.run(input) else {
                continue;
            };
            tracing::debug!(check = check.name, %err, "Check failed");

            let keep_going =
                mode == ValidationMode::FallThrough && check.severity == Severity::Reported;
            if !keep_going {
                // Always the first failure, even if it was only recorded
                return Verdict::Reject(reported.unwrap_or(err));
            }
            reported.get_or_insert(err);
        }

        match reported {
            Some(err) => Verdict::Proceed(err),
            None => Verdict::Pass,
        }
    }
}

/// What a check gets to look at: the route id, the `data` object of the body, and the stored
/// record for operations on an existing one
pub struct Submission<'a, R> {
    pub route_id: Option<&'a str>,
    pub data: &'a Map<String, Value>,
    pub existing: Option<&'a R>,
}

impl<'a, R> Submission<'a, R> {
    pub fn new(data: &'a Map<String, Value>) -> Self {
        Submission {
            route_id: None,
            data,
            existing: None,
        }
    }

    pub fn for_record(route_id: &'a str, data: &'a Map<String, Value>, existing: &'a R) -> Self {
        Submission {
            route_id: Some(route_id),
            data,
            existing: Some(existing),
        }
    }

    /// The field if it is a non-empty string
    pub fn text(&self, field: &str) -> Option<&'a str> {
        self.data
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// A body id that is set and differs from the route id, if any. Ids that aren't strings
    /// never match a route id.
    pub fn mismatched_id(&self) -> Option<String> {
        let route_id = self.route_id?;
        match self.data.get("id").filter(|id| truthy(id))? {
            Value::String(id) if id == route_id => None,
            Value::String(id) => Some(id.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Whether a JSON value counts as set: not null, false, 0 or an empty string
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    }
}

/// A strictly positive integer
pub fn positive_integer(value: Option<&Value>) -> Option<u64> {
    value.and_then(Value::as_u64).filter(|n| *n > 0)
}
