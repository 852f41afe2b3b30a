use serde::Serialize;
use thiserror::Error;

/// Defects in a case definition rather than in the implementation under
/// test. Reported separately so a broken fixture is not read as a
/// regression.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum FixtureError {
    #[error("case has no expectations")]
    NoExpectations,
    #[error("expectation {step} passes {actual} arguments but the case takes {expected}")]
    ArityMismatch {
        step: usize,
        expected: usize,
        actual: usize,
    },
    #[error("stable selector `{selector}` matches no element at step {step}")]
    NoMatch { selector: String, step: usize },
    #[error("stable selector `{selector}` matches {actual} elements at step {step} but {expected} at step 0")]
    MatchCount {
        selector: String,
        step: usize,
        expected: usize,
        actual: usize,
    },
    #[error("stable selector `{selector}` is invalid: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("expected markup of step {step} does not parse: {message}")]
    InvalidExpectedMarkup { step: usize, message: String },
    #[error("a case named `{name}` is already registered")]
    DuplicateName { name: String },
}

impl FixtureError {
    /// Expectation step the defect belongs to.
    pub fn step(&self) -> usize {
        match self {
            FixtureError::ArityMismatch { step, .. }
            | FixtureError::NoMatch { step, .. }
            | FixtureError::MatchCount { step, .. }
            | FixtureError::InvalidExpectedMarkup { step, .. } => *step,
            FixtureError::NoExpectations
            | FixtureError::InvalidSelector { .. }
            | FixtureError::DuplicateName { .. } => 0,
        }
    }
}
