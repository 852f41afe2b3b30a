use crate::adapter::SutAdapter;
use crate::case::CaseSpec;
use crate::compare::{compare_dom, compare_markup, expected_markup};
use crate::error::FixtureError;
use crate::identity::CapturedNodes;
use crate::registry::Registry;
use crate::report::{CaseReport, Failure, FailureKind, Outcome, Phase, ReportCollection};
use rehydra_dom::{Document, NodeId};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, info_span, warn};

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Only cases whose name contains this substring run. Others are left
    /// out of the report entirely.
    pub filter: Option<String>,
    /// Re-apply a step's arguments a second time and require nothing to
    /// change. Step 0 is only re-applied when it is the case's only step.
    pub verify_idempotence: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            filter: None,
            verify_idempotence: true,
        }
    }
}

/// Last point the cycle reached, used to attribute panics.
#[derive(Debug, Clone, Copy)]
struct Progress {
    step: usize,
    phase: Phase,
}

impl Progress {
    fn at(&mut self, step: usize, phase: Phase) {
        self.step = step;
        self.phase = phase;
    }

    fn fail(&self, kind: impl Into<FailureKind>) -> Failure {
        Failure::new(self.step, self.phase, kind)
    }
}

/// Drives every registered case through server render, hydration and
/// updates against one implementation.
#[derive(Debug, Default)]
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn run<S: SutAdapter>(
        &self,
        registry: &Registry<S::Template>,
        sut: &mut S,
    ) -> ReportCollection {
        let mut doc = Document::new();
        self.run_in(registry, sut, &mut doc)
    }

    /// Like [`Runner::run`] but inside a caller-owned document. Each case
    /// gets a fresh container which is removed again afterwards.
    pub fn run_in<S: SutAdapter>(
        &self,
        registry: &Registry<S::Template>,
        sut: &mut S,
        doc: &mut Document,
    ) -> ReportCollection {
        let selected: Vec<&dyn CaseSpec<S::Template>> = registry
            .iter()
            .filter(|case| match &self.config.filter {
                Some(filter) => case.name().contains(filter.as_str()),
                None => true,
            })
            .collect();
        info!(
            cases = selected.len(),
            registered = registry.len(),
            "running conformance cases"
        );

        let mut reports = ReportCollection::default();
        for case in selected {
            let _span = info_span!("case", name = case.name()).entered();
            let outcome = self.run_case(case, sut, doc);
            match &outcome {
                Outcome::Passed { steps } => info!(steps, "passed"),
                Outcome::Skipped => warn!("skipped"),
                Outcome::Failed { failure } => warn!(
                    step = failure.step,
                    phase = %failure.phase,
                    "failed: {}",
                    failure.kind
                ),
            }
            reports.push(CaseReport {
                name: case.name().to_string(),
                outcome,
            });
        }

        let summary = reports.summary();
        info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            fixture_errors = summary.fixture_errors,
            "conformance run finished"
        );
        reports
    }

    fn run_case<S: SutAdapter>(
        &self,
        case: &dyn CaseSpec<S::Template>,
        sut: &mut S,
        doc: &mut Document,
    ) -> Outcome {
        if case.is_skipped() {
            return Outcome::Skipped;
        }
        let expected = match validate(case) {
            Ok(expected) => expected,
            Err(failure) => return Outcome::Failed { failure },
        };

        let container = doc.create_element("div");
        let mut progress = Progress {
            step: 0,
            phase: Phase::Setup,
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.cycle(case, &expected, sut, doc, container, &mut progress)
        }))
        .unwrap_or_else(|payload| Err(progress.fail(panic_failure(payload))));

        if panic::catch_unwind(AssertUnwindSafe(|| sut.teardown(doc, container))).is_err() {
            warn!("teardown panicked");
        }
        if let Err(err) = doc.remove(container) {
            warn!(%err, "could not remove case container");
        }

        match result {
            Ok(steps) => Outcome::Passed { steps },
            Err(failure) => Outcome::Failed { failure },
        }
    }

    fn cycle<S: SutAdapter>(
        &self,
        case: &dyn CaseSpec<S::Template>,
        expected: &[String],
        sut: &mut S,
        doc: &mut Document,
        container: NodeId,
        progress: &mut Progress,
    ) -> Result<usize, Failure> {
        progress.at(0, Phase::ServerRender);
        let template = case.render(0);
        let markup = sut
            .render_to_string(&template)
            .map_err(|err| progress.fail(err))?;
        compare_markup(&expected[0], &markup).map_err(|kind| progress.fail(kind))?;
        debug!(bytes = markup.len(), "server markup matches");

        progress.at(0, Phase::Hydrate);
        doc.set_inner_html(container, &markup)
            .map_err(|err| progress.fail(FailureKind::Sut {
                message: err.to_string(),
            }))?;
        sut.hydrate(doc, container, &template, &markup)
            .map_err(|err| progress.fail(err))?;
        compare_dom(doc, container, &expected[0]).map_err(|kind| progress.fail(kind))?;
        let captured = CapturedNodes::capture(doc, container, case.stable_selectors())
            .map_err(|err| progress.fail(err))?;
        debug!(selectors = captured.len(), "hydrated");
        self.finish_step(case, 0, &expected[0], &captured, sut, doc, container, progress)?;

        for step in 1..case.steps() {
            progress.at(step, Phase::Update);
            let template = case.render(step);
            sut.update(doc, container, &template)
                .map_err(|err| progress.fail(err))?;
            compare_dom(doc, container, &expected[step]).map_err(|kind| progress.fail(kind))?;
            captured
                .verify(doc, container)
                .map_err(|kind| progress.fail(kind))?;
            debug!(step, "updated");
            self.finish_step(case, step, &expected[step], &captured, sut, doc, container, progress)?;
        }
        Ok(case.steps())
    }

    /// Runs the step's check and, when enabled, the idempotence pass.
    #[allow(clippy::too_many_arguments)]
    fn finish_step<S: SutAdapter>(
        &self,
        case: &dyn CaseSpec<S::Template>,
        step: usize,
        expected: &str,
        captured: &CapturedNodes,
        sut: &mut S,
        doc: &mut Document,
        container: NodeId,
        progress: &mut Progress,
    ) -> Result<(), Failure> {
        if let Some(check) = case.check(step) {
            progress.at(step, Phase::Check);
            check(doc, container).map_err(|err| progress.fail(err))?;
        }

        // The first step of a multi-step case is re-applied by the next
        // step's update already.
        let reapply = step > 0 || case.steps() == 1;
        if self.config.verify_idempotence && reapply {
            progress.at(step, Phase::Reupdate);
            let template = case.render(step);
            sut.update(doc, container, &template)
                .map_err(|err| progress.fail(err))?;
            compare_dom(doc, container, expected).map_err(|kind| progress.fail(kind))?;
            captured
                .verify(doc, container)
                .map_err(|kind| progress.fail(kind))?;
        }
        Ok(())
    }
}

/// Checks the case definition itself and normalizes every expected markup.
fn validate<T>(case: &dyn CaseSpec<T>) -> Result<Vec<String>, Failure> {
    let setup = |step: usize, err: FixtureError| Failure::new(step, Phase::Setup, err);

    if case.steps() == 0 {
        return Err(setup(0, FixtureError::NoExpectations));
    }
    let arity = case.arity(0);
    for step in 1..case.steps() {
        if case.arity(step) != arity {
            return Err(setup(
                step,
                FixtureError::ArityMismatch {
                    step,
                    expected: arity,
                    actual: case.arity(step),
                },
            ));
        }
    }
    CapturedNodes::validate(case.stable_selectors()).map_err(|err| setup(0, err))?;

    let expected = (0..case.steps())
        .map(|step| expected_markup(step, case.expected_html(step)).map_err(|err| setup(step, err)))
        .collect::<Result<Vec<_>, _>>()?;
    CapturedNodes::validate_expected(case.stable_selectors(), &expected)
        .map_err(|err| setup(err.step(), err))?;
    Ok(expected)
}

fn panic_failure(payload: Box<dyn Any + Send>) -> FailureKind {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };
    FailureKind::Sut {
        message: format!("panicked: {message}"),
    }
}
