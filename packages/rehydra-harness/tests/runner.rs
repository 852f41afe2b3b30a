use rehydra_dom::{Document, NodeId};
use rehydra_harness::check::{ensure, query};
use rehydra_harness::{
    CheckFailure, FailureKind, FixtureError, Outcome, Phase, Registry, Runner, RunnerConfig,
    SutAdapter, SutError, TestCase,
};

/// Renders each string as a `<p>`. Updates patch text in place unless
/// `replace_on_update` is set.
#[derive(Default)]
struct Paragraphs {
    calls: Vec<&'static str>,
    replace_on_update: bool,
    reject_hydrate: bool,
    panic_on_update: bool,
    extra_server_markup: bool,
}

fn markup(items: &[String]) -> String {
    items.iter().map(|s| format!("<p>{s}</p>")).collect()
}

impl SutAdapter for Paragraphs {
    type Template = Vec<String>;

    fn render_to_string(&mut self, template: &Vec<String>) -> Result<String, SutError> {
        self.calls.push("render");
        let mut out = markup(template);
        if self.extra_server_markup {
            out.push_str("<hr>");
        }
        Ok(out)
    }

    fn hydrate(
        &mut self,
        _doc: &mut Document,
        _container: NodeId,
        _template: &Vec<String>,
        _source_markup: &str,
    ) -> Result<(), SutError> {
        self.calls.push("hydrate");
        if self.reject_hydrate {
            return Err(SutError::new("no hydration markers found"));
        }
        Ok(())
    }

    fn update(
        &mut self,
        doc: &mut Document,
        container: NodeId,
        template: &Vec<String>,
    ) -> Result<(), SutError> {
        self.calls.push("update");
        if self.panic_on_update {
            panic!("update exploded");
        }
        if self.replace_on_update {
            return doc
                .set_inner_html(container, &markup(template))
                .map_err(SutError::new);
        }
        let paragraphs = doc.children(container).to_vec();
        for (&p, text) in paragraphs.iter().zip(template) {
            match doc.children(p).first().copied() {
                Some(node) => doc.set_text(node, text.clone()).map_err(SutError::new)?,
                None => {
                    let node = doc.create_text(text.clone());
                    doc.append_child(p, node).map_err(SutError::new)?;
                }
            }
        }
        Ok(())
    }

    fn teardown(&mut self, _doc: &mut Document, _container: NodeId) {
        self.calls.push("teardown");
    }
}

fn pair(&(a, b): &(&'static str, &'static str)) -> Vec<String> {
    vec![a.to_string(), b.to_string()]
}

fn list(items: &Vec<&'static str>) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn two_steps() -> TestCase<(&'static str, &'static str), Vec<String>> {
    TestCase::new("two steps", pair)
        .expect(("A", "B"), "<p>A</p><p>B</p>")
        .expect(("C", "D"), "<p>C</p><p>D</p>")
        .stable(&["p"])
}

fn failure_of(outcome: &Outcome) -> (usize, Phase, &FailureKind) {
    match outcome {
        Outcome::Failed { failure } => (failure.step, failure.phase, &failure.kind),
        other => panic!("expected a failure, got {other:?}"),
    }
}

#[test]
fn test_patching_implementation_passes() {
    let registry = Registry::new().with(two_steps()).unwrap();
    let mut sut = Paragraphs::default();
    let reports = Runner::default().run(&registry, &mut sut);

    assert!(reports.is_success());
    assert_eq!(reports.get("two steps").unwrap().outcome, Outcome::Passed { steps: 2 });
    assert_eq!(
        sut.calls,
        vec!["render", "hydrate", "update", "update", "teardown"]
    );
}

#[test]
fn test_idempotence_pass_can_be_disabled() {
    let registry = Registry::new().with(two_steps()).unwrap();
    let mut sut = Paragraphs::default();
    let runner = Runner::new(RunnerConfig {
        verify_idempotence: false,
        ..RunnerConfig::default()
    });
    runner.run(&registry, &mut sut);
    assert_eq!(sut.calls, vec!["render", "hydrate", "update", "teardown"]);
}

#[test]
fn test_replacing_nodes_is_an_identity_mismatch() {
    let registry = Registry::new().with(two_steps()).unwrap();
    let mut sut = Paragraphs {
        replace_on_update: true,
        ..Paragraphs::default()
    };
    let reports = Runner::default().run(&registry, &mut sut);

    let report = reports.get("two steps").unwrap();
    let (step, phase, kind) = failure_of(&report.outcome);
    assert_eq!((step, phase), (1, Phase::Update));
    let FailureKind::IdentityMismatch { selectors } = kind else {
        panic!("expected identity mismatch, got {kind:?}");
    };
    assert!(selectors.contains("p"));

    let mut sut = Paragraphs {
        replace_on_update: true,
        ..Paragraphs::default()
    };
    let runner = Runner::new(RunnerConfig {
        verify_idempotence: false,
        ..RunnerConfig::default()
    });
    let reports = runner.run(&registry, &mut sut);
    let (step, phase, _) = failure_of(&reports.get("two steps").unwrap().outcome);
    assert_eq!((step, phase), (1, Phase::Update));
}

#[test]
fn test_single_step_case_is_reapplied() {
    let case = TestCase::new("single step", pair)
        .expect(("A", "B"), "<p>A</p><p>B</p>")
        .stable(&["p"]);
    let registry = Registry::new().with(case).unwrap();
    let mut sut = Paragraphs {
        replace_on_update: true,
        ..Paragraphs::default()
    };
    let reports = Runner::default().run(&registry, &mut sut);

    let (step, phase, kind) = failure_of(&reports.get("single step").unwrap().outcome);
    assert_eq!((step, phase), (0, Phase::Reupdate));
    assert!(matches!(kind, FailureKind::IdentityMismatch { .. }));
    assert_eq!(sut.calls, vec!["render", "hydrate", "update", "teardown"]);
}

#[test]
fn test_skipped_case_never_reaches_the_implementation() {
    let registry = Registry::new().with(two_steps().skipped()).unwrap();
    let mut sut = Paragraphs::default();
    let reports = Runner::default().run(&registry, &mut sut);

    assert_eq!(reports.get("two steps").unwrap().outcome, Outcome::Skipped);
    assert!(sut.calls.is_empty());
    assert!(reports.is_success());
}

#[test]
fn test_server_markup_mismatch() {
    let registry = Registry::new().with(two_steps()).unwrap();
    let mut sut = Paragraphs {
        extra_server_markup: true,
        ..Paragraphs::default()
    };
    let reports = Runner::default().run(&registry, &mut sut);

    let (step, phase, kind) = failure_of(&reports.get("two steps").unwrap().outcome);
    assert_eq!((step, phase), (0, Phase::ServerRender));
    let FailureKind::MarkupMismatch { expected, actual, diff } = kind else {
        panic!("expected markup mismatch, got {kind:?}");
    };
    assert_eq!(expected, "<p>A</p><p>B</p>");
    assert_eq!(actual, "<p>A</p><p>B</p><hr>");
    assert_eq!(diff.offset, expected.len());
    // Nothing after the failing phase runs, but teardown always does.
    assert_eq!(sut.calls, vec!["render", "teardown"]);
}

#[test]
fn test_hydrate_error_is_reported_as_implementation_failure() {
    let registry = Registry::new().with(two_steps()).unwrap();
    let mut sut = Paragraphs {
        reject_hydrate: true,
        ..Paragraphs::default()
    };
    let reports = Runner::default().run(&registry, &mut sut);
    let (step, phase, kind) = failure_of(&reports.get("two steps").unwrap().outcome);
    assert_eq!((step, phase), (0, Phase::Hydrate));
    assert_eq!(
        kind,
        &FailureKind::Sut {
            message: "no hydration markers found".to_string()
        }
    );
}

#[test]
fn test_panics_are_contained_to_their_case() {
    let registry = Registry::new()
        .with(two_steps())
        .and_then(|r| {
            r.with(
                TestCase::new("single step", pair)
                    .expect(("x", "y"), "<p>x</p><p>y</p>"),
            )
        })
        .unwrap();
    let mut sut = Paragraphs {
        panic_on_update: true,
        ..Paragraphs::default()
    };
    let runner = Runner::new(RunnerConfig {
        verify_idempotence: false,
        ..RunnerConfig::default()
    });
    let reports = runner.run(&registry, &mut sut);

    let (step, phase, kind) = failure_of(&reports.get("two steps").unwrap().outcome);
    assert_eq!((step, phase), (1, Phase::Update));
    assert_eq!(
        kind,
        &FailureKind::Sut {
            message: "panicked: update exploded".to_string()
        }
    );
    assert_eq!(
        reports.get("single step").unwrap().outcome,
        Outcome::Passed { steps: 1 }
    );
}

fn second_is_b(doc: &mut Document, container: NodeId) -> Result<(), CheckFailure> {
    let first = query(doc, container, "p")?;
    let second = doc
        .next_sibling(first)
        .ok_or_else(|| CheckFailure::new("missing second paragraph"))?;
    let text = doc.children(second).first().and_then(|&t| doc.text(t));
    ensure(text == Some("B"), "second paragraph should read B")
}

#[test]
fn test_check_failure_message_is_verbatim() {
    let case = TestCase::new("checked", pair)
        .expect_checked(("A", "B"), "<p>A</p><p>B</p>", second_is_b)
        .expect_checked(("A", "C"), "<p>A</p><p>C</p>", second_is_b);
    let registry = Registry::new().with(case).unwrap();
    let reports = Runner::default().run(&registry, &mut Paragraphs::default());

    let (step, phase, kind) = failure_of(&reports.get("checked").unwrap().outcome);
    assert_eq!((step, phase), (1, Phase::Check));
    assert_eq!(
        kind,
        &FailureKind::CheckFailed {
            message: "second paragraph should read B".to_string()
        }
    );
}

#[test]
fn test_fixture_errors() {
    let registry = Registry::new()
        .with(TestCase::new("empty", pair))
        .and_then(|r| {
            r.with(
                TestCase::new("arity", list)
                    .expect(vec!["a", "b"], "<p>a</p><p>b</p>")
                    .expect(vec!["a"], "<p>a</p>"),
            )
        })
        .and_then(|r| {
            r.with(
                TestCase::new("no match", pair)
                    .expect(("a", "b"), "<p>a</p><p>b</p>")
                    .stable(&["span"]),
            )
        })
        .and_then(|r| {
            r.with(
                TestCase::new("bad selector", pair)
                    .expect(("a", "b"), "<p>a</p><p>b</p>")
                    .stable(&["p["]),
            )
        })
        .and_then(|r| {
            r.with(TestCase::new("bad markup", pair).expect(("a", "b"), "<p>a</div>"))
        })
        .and_then(|r| {
            r.with(
                TestCase::new("dropped selector", pair)
                    .expect(("a", "b"), "<p>a</p><p>b</p>")
                    .expect(("c", "d"), "<div>c d</div>")
                    .stable(&["p"]),
            )
        })
        .and_then(|r| {
            r.with(
                TestCase::new("count change", pair)
                    .expect(("a", "b"), "<p>a</p><p>b</p>")
                    .expect(("c", "d"), "<p>c d</p>")
                    .stable(&["p"]),
            )
        })
        .unwrap();
    let mut sut = Paragraphs::default();
    let reports = Runner::default().run(&registry, &mut sut);

    let fixture = |name: &str| match failure_of(&reports.get(name).unwrap().outcome) {
        (step, phase, FailureKind::Fixture { error }) => (step, phase, error.clone()),
        (_, _, kind) => panic!("expected fixture error for {name}, got {kind:?}"),
    };
    assert_eq!(fixture("empty"), (0, Phase::Setup, FixtureError::NoExpectations));
    assert_eq!(
        fixture("arity"),
        (
            1,
            Phase::Setup,
            FixtureError::ArityMismatch {
                step: 1,
                expected: 2,
                actual: 1
            }
        )
    );
    assert_eq!(
        fixture("no match"),
        (
            0,
            Phase::Setup,
            FixtureError::NoMatch {
                selector: "span".to_string(),
                step: 0,
            }
        )
    );
    assert_eq!(
        fixture("dropped selector"),
        (
            1,
            Phase::Setup,
            FixtureError::NoMatch {
                selector: "p".to_string(),
                step: 1,
            }
        )
    );
    assert_eq!(
        fixture("count change"),
        (
            1,
            Phase::Setup,
            FixtureError::MatchCount {
                selector: "p".to_string(),
                step: 1,
                expected: 2,
                actual: 1,
            }
        )
    );
    assert!(matches!(
        fixture("bad selector"),
        (0, Phase::Setup, FixtureError::InvalidSelector { .. })
    ));
    assert!(matches!(
        fixture("bad markup"),
        (0, Phase::Setup, FixtureError::InvalidExpectedMarkup { step: 0, .. })
    ));

    let summary = reports.summary();
    assert_eq!(summary.failed, 7);
    assert_eq!(summary.fixture_errors, 7);
    assert!(sut.calls.is_empty());
}

#[test]
fn test_filter_leaves_other_cases_out() {
    let registry = Registry::new()
        .with(two_steps())
        .and_then(|r| r.with(TestCase::new("other", pair).expect(("a", "b"), "<p>a</p><p>b</p>")))
        .unwrap();
    let runner = Runner::new(RunnerConfig {
        filter: Some("two".to_string()),
        ..RunnerConfig::default()
    });
    let reports = runner.run(&registry, &mut Paragraphs::default());
    assert_eq!(reports.reports.len(), 1);
    assert!(reports.get("other").is_none());
}

#[test]
fn test_containers_are_removed_after_each_case() {
    let registry = Registry::new()
        .with(two_steps())
        .and_then(|r| {
            r.with(
                TestCase::new("fails", pair)
                    .expect(("a", "b"), "<p>a</p><p>b</p>")
                    .expect(("c", "d"), "<p>wrong</p><p>d</p>"),
            )
        })
        .unwrap();
    let mut doc = Document::new();
    let reports = Runner::default().run_in(&registry, &mut Paragraphs::default(), &mut doc);

    assert_eq!(reports.summary().passed, 1);
    assert_eq!(reports.summary().failed, 1);
    assert!(doc.is_empty());
}

#[test]
fn test_json_report_lists_every_case() {
    let registry = Registry::new()
        .with(two_steps())
        .and_then(|r| r.with(TestCase::new("later", pair).skipped()))
        .unwrap();
    let reports = Runner::default().run(&registry, &mut Paragraphs::default());
    let json = reports.to_json();

    assert_eq!(json["reports"][0]["name"], "two steps");
    assert_eq!(json["reports"][0]["outcome"], "passed");
    assert_eq!(json["reports"][1]["outcome"], "skipped");
    assert_eq!(json["summary"]["passed"], 1);
}
