use rehydra_dom::{Document, Selector};

fn fixture() -> (Document, rehydra_dom::NodeId) {
    let mut doc = Document::new();
    let root = doc.create_element("div");
    doc.parse_fragment_into(
        root,
        "<ol id=\"list\"><li class=\"item first\">A</li><li class=\"item\">B</li></ol>\
         <section><p data-role=\"note\"><span>x</span></p></section>",
    )
    .unwrap();
    (doc, root)
}

#[test]
fn test_type_selector_returns_document_order() {
    let (doc, root) = fixture();
    let lis = doc.select(root, "li").unwrap();
    assert_eq!(lis.len(), 2);
    assert_eq!(doc.text(doc.children(lis[0])[0]), Some("A"));
    assert_eq!(doc.text(doc.children(lis[1])[0]), Some("B"));
}

#[test]
fn test_scope_is_excluded() {
    let (doc, root) = fixture();
    assert!(doc.select(root, "div").unwrap().is_empty());
}

#[test]
fn test_class_id_and_attribute_selectors() {
    let (doc, root) = fixture();
    assert_eq!(doc.select(root, ".first").unwrap().len(), 1);
    assert_eq!(doc.select(root, "#list").unwrap().len(), 1);
    assert_eq!(doc.select(root, "[data-role=note]").unwrap().len(), 1);
    assert_eq!(doc.select(root, "p[data-role]").unwrap().len(), 1);
    assert_eq!(doc.select(root, "li.item.first").unwrap().len(), 1);
}

#[test]
fn test_combinators() {
    let (doc, root) = fixture();
    assert_eq!(doc.select(root, "section span").unwrap().len(), 1);
    assert_eq!(doc.select(root, "section > span").unwrap().len(), 0);
    assert_eq!(doc.select(root, "section > p > span").unwrap().len(), 1);
    assert_eq!(doc.select(root, "ol>li").unwrap().len(), 2);
}

#[test]
fn test_selector_list() {
    let (doc, root) = fixture();
    let found = doc.select(root, "ol, span").unwrap();
    assert_eq!(found.len(), 2);
    let sel = Selector::parse("ol, span").unwrap();
    assert_eq!(doc.query_selector(root, &sel), Some(found[0]));
}
