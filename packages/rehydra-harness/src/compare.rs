//! Structural comparison of markup. Both sides are reduced to the
//! normalized form produced by `rehydra_dom` before comparing, so attribute
//! order, quoting and interpolation markers never cause a mismatch.

use crate::error::FixtureError;
use crate::report::FailureKind;
use rehydra_dom::{Document, NodeId, normalize_markup};
use serde::Serialize;

const EXCERPT_CHARS: usize = 24;

/// Where two normalized markup strings first diverge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkupDiff {
    /// Byte offset of the first difference.
    pub offset: usize,
    pub line: usize,
    pub column: usize,
    pub expected_excerpt: String,
    pub actual_excerpt: String,
}

impl MarkupDiff {
    /// `None` when the strings are equal.
    pub fn between(expected: &str, actual: &str) -> Option<Self> {
        if expected == actual {
            return None;
        }
        let offset = expected
            .char_indices()
            .zip(actual.chars())
            .find(|((_, e), a)| e != a)
            .map(|((i, _), _)| i)
            .unwrap_or_else(|| expected.len().min(actual.len()));

        let before = &expected[..offset];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map_or(0, |l| l.chars().count())
            + 1;

        Some(Self {
            offset,
            line,
            column,
            expected_excerpt: excerpt(expected, offset),
            actual_excerpt: excerpt(actual, offset),
        })
    }
}

fn excerpt(s: &str, offset: usize) -> String {
    let start = s[..offset]
        .char_indices()
        .rev()
        .nth(EXCERPT_CHARS / 2)
        .map_or(0, |(i, _)| i);
    s[start..].chars().take(EXCERPT_CHARS).collect()
}

/// Normalizes a fixture's expected markup.
pub fn expected_markup(step: usize, html: &str) -> Result<String, FixtureError> {
    normalize_markup(html).map_err(|err| FixtureError::InvalidExpectedMarkup {
        step,
        message: err.to_string(),
    })
}

fn judge(expected: &str, actual: String) -> Result<(), FailureKind> {
    match MarkupDiff::between(expected, &actual) {
        None => Ok(()),
        Some(diff) => Err(FailureKind::MarkupMismatch {
            expected: expected.to_string(),
            actual,
            diff,
        }),
    }
}

/// String mode: compares server-rendered markup text.
pub fn compare_markup(expected: &str, markup: &str) -> Result<(), FailureKind> {
    let actual = normalize_markup(markup).map_err(|err| FailureKind::Sut {
        message: format!("server markup is not well-formed: {err}"),
    })?;
    judge(expected, actual)
}

/// DOM mode: serializes the live children of `container`.
pub fn compare_dom(doc: &Document, container: NodeId, expected: &str) -> Result<(), FailureKind> {
    judge(expected, doc.normalized_inner_html(container))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_position() {
        let diff = MarkupDiff::between("<div>A\n  B</div>", "<div>A\n  C</div>").unwrap();
        assert_eq!(diff.offset, 9);
        assert_eq!(diff.line, 2);
        assert_eq!(diff.column, 3);
        assert!(diff.expected_excerpt.contains("B</div>"));
        assert!(diff.actual_excerpt.contains("C</div>"));
    }

    #[test]
    fn test_diff_when_one_side_is_a_prefix() {
        let diff = MarkupDiff::between("<p>ab</p>", "<p>ab</p><p>").unwrap();
        assert_eq!(diff.offset, 9);
        assert_eq!(diff.expected_excerpt, "<p>ab</p>");
        assert_eq!(diff.actual_excerpt, "<p>ab</p><p>");
    }

    #[test]
    fn test_equal_strings_have_no_diff() {
        assert!(MarkupDiff::between("<b></b>", "<b></b>").is_none());
    }

    #[test]
    fn test_string_mode_ignores_markers_and_attribute_order() {
        assert!(
            compare_markup(
                "<div ab=\"a b\" c=\"c\"></div>",
                "<!--part--><div c=\"c\" ab=\"a b\"></div><!--/part-->"
            )
            .is_ok()
        );
    }

    #[test]
    fn test_string_mode_collapses_whitespace_between_interpolations() {
        let expected = expected_markup(0, "<div>A\n  B</div>").unwrap();
        assert!(
            compare_markup(
                &expected,
                "<div><!--part-->A<!--/part-->\n  <!--part-->B<!--/part--></div>"
            )
            .is_ok()
        );
    }

    #[test]
    fn test_string_mode_reports_malformed_markup() {
        assert!(matches!(
            compare_markup("<div></div>", "<div></span>"),
            Err(FailureKind::Sut { .. })
        ));
    }
}
