pub mod adapter;
pub mod case;
pub mod check;
pub mod compare;
pub mod error;
pub mod identity;
pub mod registry;
pub mod report;
pub mod runner;

pub use adapter::{SutAdapter, SutError};
pub use case::{Args, CaseSpec, CheckFn, Expectation, TestCase};
pub use check::CheckFailure;
pub use compare::MarkupDiff;
pub use error::FixtureError;
pub use identity::CapturedNodes;
pub use registry::Registry;
pub use report::{CaseReport, Failure, FailureKind, Outcome, Phase, ReportCollection, Summary};
pub use runner::{Runner, RunnerConfig};
