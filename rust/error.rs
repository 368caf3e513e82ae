//! Error types raised by the rotation, season and allocation engines.

use crate::rotations::Phase;
use std::fmt;
use thiserror::Error;

/// A phase which does not take part in the rotation constraint in one or both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityViolation {
    pub phase: Phase,
    /// The phase requires no history.
    pub missing_require: bool,
    /// The phase provides no history.
    pub missing_provide: bool,
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.missing_require, self.missing_provide) {
            (true, true) => write!(f, "{} requires and provides no history", self.phase),
            (true, false) => write!(f, "{} requires no history", self.phase),
            _ => write!(f, "{} provides no history", self.phase),
        }
    }
}

/// Errors raised by this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or internally inconsistent configuration. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every offending phase found in one generation pass.
    #[error("{} rotation phase(s) fail the history relation: {}", .violations.len(), join_violations(.violations))]
    RotationIntegrity { violations: Vec<IntegrityViolation> },

    /// An item allocated more than its whole mass into a taxonomy.
    #[error("allocation of item starting {start} over {length} days sums to {total} across `{taxonomy}`")]
    AllocationOverflow {
        taxonomy: String,
        start: chrono::NaiveDate,
        length: i64,
        total: f64,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not encode rotation cache: {0}")]
    CacheEncode(#[from] bincode::error::EncodeError),
}

fn join_violations(violations: &[IntegrityViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Shorthand for [`Error::Configuration`].
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "python")]
impl From<Error> for pyo3::PyErr {
    fn from(err: Error) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}
