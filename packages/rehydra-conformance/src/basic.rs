//! Basic hydration cases: text, attribute, property, boolean and event
//! bindings, nested templates and lists.
//!
//! Adjacent interpolations show up in expected markup as `"\n  "`, the
//! separator the normalizer emits between values that the server wrapped
//! in separate hydration markers.

use rehydra_dom::{Document, NodeId};
use rehydra_harness::check::{property_equals, query, strict_equal};
use rehydra_harness::{CheckFailure, FixtureError, Registry, TestCase};
use rehydra_template::{Listener, Template, html};
use serde_json::json;

type Words = (Vec<&'static str>,);

fn text_expression(&(x,): &(&'static str,)) -> Template {
    html!(["<div>", "</div>"], x)
}

fn two_text_expressions(&(x, y): &(&'static str, &'static str)) -> Template {
    html!(["<div>", "", "</div>"], x, y)
}

fn nested_templates(&(x, y): &(&'static str, &'static str)) -> Template {
    html!(["<div>", "", "</div>"], x, html!(["<span>", "</span>"], y))
}

fn attribute_expression(&(x,): &(&'static str,)) -> Template {
    html!(["<div class=", "></div>"], x)
}

fn two_attribute_expressions(&(x, y): &(&'static str, &'static str)) -> Template {
    html!(["<div class=", " foo=", "></div>"], x, y)
}

fn two_expressions_in_one_attribute(&(x, y): &(&'static str, &'static str)) -> Template {
    html!(["<div class=\"", " ", "\"></div>"], x, y)
}

type Six = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
);

fn mixed_attributes(&(a, b, c, d, e, f): &Six) -> Template {
    html!(
        [
            "<div ab=\"",
            " ",
            "\" x c=\"",
            "\" y de=\"",
            " ",
            "\" f=\"",
            "\" z></div>",
        ],
        a,
        b,
        c,
        d,
        e,
        f
    )
}

fn property_expression(&(x,): &(i64,)) -> Template {
    html!(["<div .foo=", "></div>"], x)
}

fn two_property_expressions(&(x, y): &(i64, bool)) -> Template {
    html!(["<div .foo=", " .bar=", "></div>"], x, y)
}

fn two_expressions_in_one_property(&(x, y): &(i64, bool)) -> Template {
    html!(["<div .foo=\"", ",", "\"></div>"], x, y)
}

fn event_binding((listener,): &(Listener,)) -> Template {
    html!(["<button @click=", ">X</button>"], listener.clone())
}

fn boolean_attribute(&(hide,): &(bool,)) -> Template {
    html!(["<div ?hidden=", "></div>"], hide)
}

fn array_of_strings((words,): &Words) -> Template {
    html!(["<div>", "</div>"], words.clone())
}

fn array_of_templates((words,): &Words) -> Template {
    let items: Vec<Template> = words
        .iter()
        .map(|&w| html!(["<li>", "</li>"], w))
        .collect();
    html!(["<ol>", "</ol>"], items)
}

// No keyed repeat directive yet; these render plain lists.
fn repeat_strings((words,): &Words) -> Template {
    let items: Vec<String> = words
        .iter()
        .enumerate()
        .map(|(i, w)| format!("({i} {w})"))
        .collect();
    html!(["", ""], items)
}

fn repeat_templates((words,): &Words) -> Template {
    let items: Vec<Template> = words
        .iter()
        .enumerate()
        .map(|(i, &w)| html!(["<p>", ") ", "</p>"], i, w))
        .collect();
    html!(["", ""], items)
}

fn foo_is_1(doc: &mut Document, root: NodeId) -> Result<(), CheckFailure> {
    property_equals(doc, root, "div", "foo", json!(1))
}

fn foo_is_2(doc: &mut Document, root: NodeId) -> Result<(), CheckFailure> {
    property_equals(doc, root, "div", "foo", json!(2))
}

fn foo_1_bar_true(doc: &mut Document, root: NodeId) -> Result<(), CheckFailure> {
    property_equals(doc, root, "div", "foo", json!(1))?;
    property_equals(doc, root, "div", "bar", json!(true))
}

fn foo_2_bar_false(doc: &mut Document, root: NodeId) -> Result<(), CheckFailure> {
    property_equals(doc, root, "div", "foo", json!(2))?;
    property_equals(doc, root, "div", "bar", json!(false))
}

fn foo_joined_1_true(doc: &mut Document, root: NodeId) -> Result<(), CheckFailure> {
    property_equals(doc, root, "div", "foo", json!("1,true"))
}

fn foo_joined_2_false(doc: &mut Document, root: NodeId) -> Result<(), CheckFailure> {
    property_equals(doc, root, "div", "foo", json!("2,false"))
}

/// Listener that flags the clicked element with an expando property.
fn mark_target(flag: &'static str) -> Listener {
    Listener::new(move |doc, event| {
        if let Err(err) = doc.set_property(event.target, flag, json!(true)) {
            tracing::warn!(%err, "listener could not mark its target");
        }
    })
}

fn click_sets(doc: &mut Document, root: NodeId, flag: &str) -> Result<(), CheckFailure> {
    let button = query(doc, root, "button")?;
    doc.click(button)?;
    strict_equal(
        doc.property(button, flag),
        Some(&json!(true)),
        &format!("button.{flag}"),
    )
}

fn click_sets_was_clicked(doc: &mut Document, root: NodeId) -> Result<(), CheckFailure> {
    click_sets(doc, root, "__wasClicked")
}

fn click_sets_was_clicked2(doc: &mut Document, root: NodeId) -> Result<(), CheckFailure> {
    click_sets(doc, root, "__wasClicked2")
}

/// Every basic case, in run order.
pub fn basic_cases() -> Result<Registry<Template>, FixtureError> {
    let mut registry = Registry::new();

    registry.register(
        TestCase::new("textExpression", text_expression)
            .expect(("TEST",), "<div>TEST</div>")
            .expect(("TEST2",), "<div>TEST2</div>")
            .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new("twoTextExpression", two_text_expressions)
            .expect(("A", "B"), "<div>A\n  B</div>")
            .expect(("C", "D"), "<div>C\n  D</div>")
            .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new("nested templates", nested_templates)
            .expect(("A", "B"), "<div>A\n  <span>B</span></div>")
            .expect(("C", "D"), "<div>C\n  <span>D</span></div>")
            .stable(&["div", "span"]),
    )?;

    registry.register(
        TestCase::new("attributeExpression", attribute_expression)
            .expect(("TEST",), "<div class=\"TEST\"></div>")
            .expect(("TEST2",), "<div class=\"TEST2\"></div>")
            .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new("two attribute expressions", two_attribute_expressions)
            .expect(("A", "B"), "<div class=\"A\" foo=\"B\"></div>")
            .expect(("C", "D"), "<div class=\"C\" foo=\"D\"></div>")
            .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new(
            "two expressions in same attribute",
            two_expressions_in_one_attribute,
        )
        .expect(("A", "B"), "<div class=\"A B\"></div>")
        .expect(("C", "D"), "<div class=\"C D\"></div>")
        .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new(
            "mix of expressions across multiple attributes",
            mixed_attributes,
        )
        .expect(
            ("a", "b", "c", "d", "e", "f"),
            "<div ab=\"a b\" x c=\"c\" y de=\"d e\" f=\"f\" z></div>",
        )
        .expect(
            ("A", "B", "C", "D", "E", "F"),
            "<div ab=\"A B\" x c=\"C\" y de=\"D E\" f=\"F\" z></div>",
        )
        .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new("property expression", property_expression)
            .expect_checked((1,), "<div></div>", foo_is_1)
            .expect_checked((2,), "<div></div>", foo_is_2)
            .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new("two property expression", two_property_expressions)
            .expect_checked((1, true), "<div></div>", foo_1_bar_true)
            .expect_checked((2, false), "<div></div>", foo_2_bar_false)
            .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new(
            "two expressions in one property",
            two_expressions_in_one_property,
        )
        .expect_checked((1, true), "<div></div>", foo_joined_1_true)
        .expect_checked((2, false), "<div></div>", foo_joined_2_false)
        .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new("event binding", event_binding)
            .expect_checked(
                (mark_target("__wasClicked"),),
                "<button>X</button>",
                click_sets_was_clicked,
            )
            .expect_checked(
                (mark_target("__wasClicked2"),),
                "<button>X</button>",
                click_sets_was_clicked2,
            )
            .stable(&["button"]),
    )?;

    registry.register(
        TestCase::new("boolean attribute binding, initially true", boolean_attribute)
            .expect((true,), "<div hidden></div>")
            .expect((false,), "<div></div>")
            .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new("array with strings", array_of_strings)
            .expect((vec!["A", "B", "C"],), "<div>A\n  B\n  C</div>")
            .expect((vec!["D", "E", "F"],), "<div>D\n  E\n  F</div>")
            .stable(&["div"]),
    )?;

    // The second expectations of the two resize cases are provisional until
    // attribute hydration works.
    registry.register(
        TestCase::new("array with strings, updated with fewer items", array_of_strings)
            .expect((vec!["A", "B", "C"],), "<div>A\n  B\n  C</div>")
            .expect((vec!["D", "E"],), "<div>D\n  E</div>")
            .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new("array with strings, updated with more items", array_of_strings)
            .expect((vec!["A", "B", "C"],), "<div>A\n  B\n  C</div>")
            .expect((vec!["D", "E", "F", "G"],), "<div>D\n  E\n  F\n  G</div>")
            .stable(&["div"]),
    )?;

    registry.register(
        TestCase::new("array with templates", array_of_templates)
            .expect(
                (vec!["A", "B", "C"],),
                "<ol><li>A</li>\n  <li>B</li>\n  <li>C</li></ol>",
            )
            .expect(
                (vec!["D", "E", "F"],),
                "<ol><li>D</li>\n  <li>E</li>\n  <li>F</li></ol>",
            )
            .stable(&["ol", "li"]),
    )?;

    // Second expectations are provisional as well.
    registry.register(
        TestCase::new("repeat with strings", repeat_strings)
            .expect((vec!["foo", "bar", "qux"],), "(0 foo)\n(1 bar)\n(2 qux)")
            .expect((vec!["A", "B", "C"],), "(0 A)(1 B)(2 C)")
            .skipped(),
    )?;

    registry.register(
        TestCase::new("repeat with templates", repeat_templates)
            .expect(
                (vec!["foo", "bar", "qux"],),
                "<p>0) foo</p><p>1) bar</p><p>2) qux</p>",
            )
            .expect(
                (vec!["A", "B", "C"],),
                "<p>0) A</p><p>1) B</p><p>2) C</p>",
            )
            .stable(&["p"])
            .skipped(),
    )?;

    Ok(registry)
}
