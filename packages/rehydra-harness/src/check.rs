//! Assertion helpers for `check` callbacks.

use rehydra_dom::{Document, DomError, NodeId};
use std::fmt::Debug;
use thiserror::Error;

/// A failed custom check. The message is surfaced verbatim in reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CheckFailure {
    pub message: String,
}

impl CheckFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<DomError> for CheckFailure {
    fn from(err: DomError) -> Self {
        Self::new(err.to_string())
    }
}

pub fn strict_equal<T: PartialEq + Debug>(
    actual: T,
    expected: T,
    what: &str,
) -> Result<(), CheckFailure> {
    if actual == expected {
        Ok(())
    } else {
        Err(CheckFailure::new(format!(
            "expected {what} to strictly equal {expected:?}, got {actual:?}"
        )))
    }
}

pub fn ensure(condition: bool, message: &str) -> Result<(), CheckFailure> {
    if condition {
        Ok(())
    } else {
        Err(CheckFailure::new(message))
    }
}

/// First element under `root` matching `selector`.
pub fn query(doc: &Document, root: NodeId, selector: &str) -> Result<NodeId, CheckFailure> {
    doc.select(root, selector)?
        .first()
        .copied()
        .ok_or_else(|| CheckFailure::new(format!("no element matches `{selector}`")))
}

/// Asserts `(root.querySelector(selector) as any)[name] === expected`.
pub fn property_equals(
    doc: &Document,
    root: NodeId,
    selector: &str,
    name: &str,
    expected: serde_json::Value,
) -> Result<(), CheckFailure> {
    let el = query(doc, root, selector)?;
    strict_equal(
        doc.property(el, name),
        Some(&expected),
        &format!("{selector}.{name}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_equals_distinguishes_types() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        let el = doc.create_element("div");
        doc.append_child(root, el).unwrap();
        doc.set_property(el, "foo", json!("1")).unwrap();

        assert!(property_equals(&doc, root, "div", "foo", json!("1")).is_ok());
        let err = property_equals(&doc, root, "div", "foo", json!(1)).unwrap_err();
        assert!(err.message.starts_with("expected div.foo to strictly equal"));
    }

    #[test]
    fn test_query_reports_missing_element() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        assert_eq!(
            query(&doc, root, "button"),
            Err(CheckFailure::new("no element matches `button`"))
        );
    }
}
