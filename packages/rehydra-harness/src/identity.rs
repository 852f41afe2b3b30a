//! Node identity tracking across updates.
//!
//! After hydration every stable selector is resolved once and the handles
//! are kept. A later step passes only when each selector still resolves to
//! exactly the same handles in the same order. Slot keys are generational,
//! so a node that was removed and replaced never compares equal to the
//! captured one even if its slot was reused.

use crate::error::FixtureError;
use crate::report::FailureKind;
use rehydra_dom::{Document, NodeId, Selector};
use std::collections::BTreeSet;

#[derive(Debug)]
struct Captured {
    selector: Selector,
    nodes: Vec<NodeId>,
}

/// Handles captured right after hydration, keyed by selector.
#[derive(Debug, Default)]
pub struct CapturedNodes {
    entries: Vec<Captured>,
}

impl CapturedNodes {
    /// Parses every selector without touching the document.
    pub fn validate(selectors: &[&str]) -> Result<(), FixtureError> {
        for source in selectors {
            parse(source)?;
        }
        Ok(())
    }

    /// Runs every selector against every step's normalized expected markup.
    /// Each selector must match in every step, and as many elements as it
    /// matches at step 0.
    pub fn validate_expected(
        selectors: &[&str],
        expected: &[String],
    ) -> Result<(), FixtureError> {
        if selectors.is_empty() {
            return Ok(());
        }
        let parsed = selectors
            .iter()
            .map(|source| parse(source).map(|selector| (*source, selector)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut first_counts = Vec::with_capacity(parsed.len());
        for (step, markup) in expected.iter().enumerate() {
            let mut doc = Document::new();
            let root = doc.create_element("template");
            doc.parse_fragment_into(root, markup)
                .map_err(|err| FixtureError::InvalidExpectedMarkup {
                    step,
                    message: err.to_string(),
                })?;
            for (i, (source, selector)) in parsed.iter().enumerate() {
                let actual = doc.query_selector_all(root, selector).len();
                if actual == 0 {
                    return Err(FixtureError::NoMatch {
                        selector: source.to_string(),
                        step,
                    });
                }
                match first_counts.get(i) {
                    None => first_counts.push(actual),
                    Some(&expected) if expected != actual => {
                        return Err(FixtureError::MatchCount {
                            selector: source.to_string(),
                            step,
                            expected,
                            actual,
                        });
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Resolves each selector under `container`. A selector with no match
    /// is a fixture defect.
    pub fn capture(
        doc: &Document,
        container: NodeId,
        selectors: &[&str],
    ) -> Result<Self, FixtureError> {
        let mut entries = Vec::with_capacity(selectors.len());
        for source in selectors {
            let selector = parse(source)?;
            let nodes = doc.query_selector_all(container, &selector);
            if nodes.is_empty() {
                return Err(FixtureError::NoMatch {
                    selector: source.to_string(),
                    step: 0,
                });
            }
            tracing::trace!(selector = %selector, matched = nodes.len(), "captured stable nodes");
            entries.push(Captured { selector, nodes });
        }
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Selectors whose current matches differ from the captured ones.
    pub fn changed(&self, doc: &Document, container: NodeId) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|entry| doc.query_selector_all(container, &entry.selector) != entry.nodes)
            .map(|entry| entry.selector.to_string())
            .collect()
    }

    pub fn verify(&self, doc: &Document, container: NodeId) -> Result<(), FailureKind> {
        let selectors = self.changed(doc, container);
        if selectors.is_empty() {
            Ok(())
        } else {
            Err(FailureKind::IdentityMismatch { selectors })
        }
    }
}

fn parse(source: &str) -> Result<Selector, FixtureError> {
    Selector::parse(source).map_err(|err| FixtureError::InvalidSelector {
        selector: source.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Document, NodeId) {
        let mut doc = Document::new();
        let container = doc.create_element("div");
        doc.set_inner_html(container, "<ol><li>a</li><li>b</li></ol>")
            .unwrap();
        (doc, container)
    }

    #[test]
    fn test_unchanged_tree_verifies() {
        let (mut doc, container) = fixture();
        let captured = CapturedNodes::capture(&doc, container, &["ol", "li"]).unwrap();
        let li = doc.select(container, "li").unwrap()[0];
        let text = doc.children(li)[0];
        doc.set_text(text, "changed").unwrap();
        assert!(captured.verify(&doc, container).is_ok());
    }

    #[test]
    fn test_replaced_node_is_detected() {
        let (mut doc, container) = fixture();
        let captured = CapturedNodes::capture(&doc, container, &["ol", "li"]).unwrap();
        let ol = doc.select(container, "ol").unwrap()[0];
        let first = doc.children(ol)[0];
        doc.remove(first).unwrap();
        let fresh = doc.create_element("li");
        let second = doc.children(ol)[0];
        doc.insert_before(ol, fresh, Some(second)).unwrap();

        let changed = captured.changed(&doc, container);
        assert_eq!(changed.into_iter().collect::<Vec<_>>(), vec!["li".to_string()]);
    }

    #[test]
    fn test_missing_match_is_a_fixture_error() {
        let (doc, container) = fixture();
        assert_eq!(
            CapturedNodes::capture(&doc, container, &["span"]).unwrap_err(),
            FixtureError::NoMatch {
                selector: "span".to_string(),
                step: 0,
            }
        );
    }

    #[test]
    fn test_expected_markup_must_keep_every_selector() {
        let steps = |markups: &[&str]| markups.iter().map(|m| m.to_string()).collect::<Vec<_>>();
        assert!(
            CapturedNodes::validate_expected(
                &["ol", "li"],
                &steps(&["<ol><li>A</li></ol>", "<ol><li>B</li></ol>"])
            )
            .is_ok()
        );
        assert_eq!(
            CapturedNodes::validate_expected(
                &["li"],
                &steps(&["<ol><li>A</li></ol>", "<ol></ol>"])
            ),
            Err(FixtureError::NoMatch {
                selector: "li".to_string(),
                step: 1,
            })
        );
        assert_eq!(
            CapturedNodes::validate_expected(
                &["li"],
                &steps(&["<ol><li>A</li></ol>", "<ol><li>A</li>\n  <li>B</li></ol>"])
            ),
            Err(FixtureError::MatchCount {
                selector: "li".to_string(),
                step: 1,
                expected: 1,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_invalid_selector() {
        assert!(matches!(
            CapturedNodes::validate(&["li", "[oops"]),
            Err(FixtureError::InvalidSelector { .. })
        ));
    }
}
