use futures::StreamExt;
use rehydra_dom::normalize_markup;
use rehydra_template::{Listener, Renderer, TemplateError, Value, html, render_to_string};

#[test]
fn test_text_binding_is_wrapped_in_markers() {
    let t = html!(["<div>", "</div>"], "TEST");
    assert_eq!(
        render_to_string(&t).unwrap(),
        "<!--part--><div><!--part-->TEST<!--/part--></div><!--/part-->"
    );
}

#[test]
fn test_attribute_bindings_render_into_markup() {
    let t = html!(["<div class=\"", " ", "\" foo=", "></div>"], "A", "B", "C");
    assert_eq!(
        normalize_markup(&render_to_string(&t).unwrap()).unwrap(),
        "<div class=\"A B\" foo=\"C\"></div>"
    );
}

#[test]
fn test_client_only_bindings_leave_no_markup() {
    let t = html!(
        ["<button .foo=", " ?hidden=", " @click=", ">X</button>"],
        1,
        false,
        Listener::new(|_, _| {})
    );
    assert_eq!(
        normalize_markup(&render_to_string(&t).unwrap()).unwrap(),
        "<button>X</button>"
    );
}

#[test]
fn test_truthy_boolean_renders_bare_attribute() {
    let t = html!(["<div ?hidden=", "></div>"], true);
    assert_eq!(
        render_to_string(&t).unwrap(),
        "<!--part--><div hidden></div><!--/part-->"
    );
}

#[test]
fn test_list_items_get_their_own_markers() {
    let t = html!(["<div>", "</div>"], vec!["A", "B"]);
    assert_eq!(
        render_to_string(&t).unwrap(),
        "<!--part--><div><!--part--><!--part-->A<!--/part--><!--part-->B<!--/part--><!--/part--></div><!--/part-->"
    );
}

#[test]
fn test_text_is_escaped() {
    let t = html!(["<p>", "</p>"], "<b>&");
    assert!(render_to_string(&t).unwrap().contains("&lt;b&gt;&amp;"));
}

#[test]
fn test_value_count_mismatch_is_reported() {
    let t = rehydra_template::Template::new(&["<p>", "</p>"], vec![]);
    assert_eq!(
        render_to_string(&t),
        Err(TemplateError::ValueCount {
            expected: 1,
            actual: 0
        })
    );
}

#[test]
fn test_nothing_renders_empty_part() {
    let t = html!(["<p>", "</p>"], Value::Nothing);
    assert_eq!(
        render_to_string(&t).unwrap(),
        "<!--part--><p><!--part--><!--/part--></p><!--/part-->"
    );
}

#[tokio::test]
async fn test_ssr_streaming_order() {
    let inner = html!(["<span>", "</span>"], "B");
    let t = html!(["<div>", "", "</div>"], "A", inner);
    let chunks: Vec<String> = Renderer::new(&t)
        .render_to_stream()
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;

    assert_eq!(chunks.first().map(String::as_str), Some("<!--part-->"));
    assert_eq!(chunks.last().map(String::as_str), Some("<!--/part-->"));
    let span_open = chunks.iter().position(|c| c == "<span>").unwrap();
    let a_text = chunks.iter().position(|c| c == "A").unwrap();
    assert!(a_text < span_open);
    assert_eq!(chunks.concat(), render_to_string(&t).unwrap());
}
