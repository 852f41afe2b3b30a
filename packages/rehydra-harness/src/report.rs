use crate::adapter::SutError;
use crate::check::CheckFailure;
use crate::compare::MarkupDiff;
use crate::error::FixtureError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Where in the cycle a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Case validation, before any implementation call.
    Setup,
    ServerRender,
    Hydrate,
    Update,
    /// Re-applying the same arguments a second time.
    Reupdate,
    Check,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Setup => "setup",
            Phase::ServerRender => "server render",
            Phase::Hydrate => "hydrate",
            Phase::Update => "update",
            Phase::Reupdate => "re-update",
            Phase::Check => "check",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    Fixture {
        error: FixtureError,
    },
    MarkupMismatch {
        expected: String,
        actual: String,
        diff: MarkupDiff,
    },
    IdentityMismatch {
        selectors: BTreeSet<String>,
    },
    CheckFailed {
        message: String,
    },
    /// The implementation returned an error or panicked.
    Sut {
        message: String,
    },
}

impl From<FixtureError> for FailureKind {
    fn from(error: FixtureError) -> Self {
        FailureKind::Fixture { error }
    }
}

impl From<SutError> for FailureKind {
    fn from(err: SutError) -> Self {
        FailureKind::Sut {
            message: err.message,
        }
    }
}

impl From<CheckFailure> for FailureKind {
    fn from(err: CheckFailure) -> Self {
        FailureKind::CheckFailed {
            message: err.message,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Fixture { error } => write!(f, "fixture error: {error}"),
            FailureKind::MarkupMismatch { diff, .. } => write!(
                f,
                "markup mismatch at {}:{}\n    expected: {:?}\n    actual:   {:?}",
                diff.line, diff.column, diff.expected_excerpt, diff.actual_excerpt
            ),
            FailureKind::IdentityMismatch { selectors } => {
                let list: Vec<&str> = selectors.iter().map(String::as_str).collect();
                write!(f, "nodes were replaced: {}", list.join(", "))
            }
            FailureKind::CheckFailed { message } => write!(f, "check failed: {message}"),
            FailureKind::Sut { message } => write!(f, "implementation error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub step: usize,
    pub phase: Phase,
    #[serde(flatten)]
    pub kind: FailureKind,
}

impl Failure {
    pub fn new(step: usize, phase: Phase, kind: impl Into<FailureKind>) -> Self {
        Self {
            step,
            phase,
            kind: kind.into(),
        }
    }

    pub fn is_fixture_error(&self) -> bool {
        matches!(self.kind, FailureKind::Fixture { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Passed { steps: usize },
    Failed { failure: Failure },
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl CaseReport {
    pub fn failure(&self) -> Option<&Failure> {
        match &self.outcome {
            Outcome::Failed { failure } => Some(failure),
            _ => None,
        }
    }
}

impl fmt::Display for CaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Passed { steps } => write!(f, "PASS {} ({steps} steps)", self.name),
            Outcome::Skipped => write!(f, "SKIP {}", self.name),
            Outcome::Failed { failure } => write!(
                f,
                "FAIL {} [step {}, {}]\n  {}",
                self.name, failure.step, failure.phase, failure.kind
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Failures caused by the case definition; included in `failed`.
    pub fixture_errors: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportCollection {
    pub reports: Vec<CaseReport>,
}

impl ReportCollection {
    pub fn push(&mut self, report: CaseReport) {
        self.reports.push(report);
    }

    pub fn get(&self, name: &str) -> Option<&CaseReport> {
        self.reports.iter().find(|r| r.name == name)
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for report in &self.reports {
            match &report.outcome {
                Outcome::Passed { .. } => summary.passed += 1,
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Failed { failure } => {
                    summary.failed += 1;
                    if failure.is_fixture_error() {
                        summary.fixture_errors += 1;
                    }
                }
            }
        }
        summary
    }

    pub fn is_success(&self) -> bool {
        self.summary().failed == 0
    }

    /// Machine-readable form: every case report plus the summary.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "reports": self.reports,
            "summary": self.summary(),
        })
    }
}

impl fmt::Display for ReportCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.reports {
            writeln!(f, "{report}")?;
        }
        let s = self.summary();
        write!(
            f,
            "{} passed, {} failed ({} fixture errors), {} skipped",
            s.passed, s.failed, s.fixture_errors, s.skipped
        )
    }
}
