//! Turns the static pieces of a template into a shape: the static DOM
//! structure with the position and kind of every binding.

use crate::error::TemplateError;
use crate::value::Template;
use rehydra_dom::{Document, NodeId, NodeKind};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Stands in for each binding while the joined markup is parsed.
const MARKER: char = '\u{E000}';

#[derive(Debug)]
pub struct Shape {
    pub nodes: Vec<Rc<ShapeNode>>,
    pub binding_count: usize,
}

#[derive(Debug)]
pub enum ShapeNode {
    Text(String),
    Element(ShapeElement),
    /// Child binding, by value index.
    Child(usize),
}

#[derive(Debug)]
pub struct ShapeElement {
    pub tag: String,
    pub attributes: Vec<ShapeAttribute>,
    pub children: Vec<Rc<ShapeNode>>,
}

#[derive(Debug)]
pub enum ShapeAttribute {
    Static { name: String, value: String },
    Binding(AttributeBinding),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `name=${v}` or `name="a ${v} b"`
    Attribute,
    /// `.name=${v}`
    Property,
    /// `?name=${v}`
    Boolean,
    /// `@name=${v}`
    Event,
}

#[derive(Debug, Clone)]
pub struct AttributeBinding {
    pub kind: BindingKind,
    pub name: String,
    /// Static text around the bound values; always one longer than `values`.
    pub strings: Vec<String>,
    pub values: Vec<usize>,
}

impl AttributeBinding {
    /// A single value with no surrounding static text.
    pub fn is_single(&self) -> bool {
        self.values.len() == 1 && self.strings.iter().all(String::is_empty)
    }
}

thread_local! {
    static SHAPES: RefCell<FxHashMap<(usize, usize), Rc<Shape>>> =
        RefCell::new(FxHashMap::default());
}

/// Compiled shape of `template`, cached per static-pieces array.
pub fn shape_of(template: &Template) -> Result<Rc<Shape>, TemplateError> {
    let strings = template.strings();
    let key = (strings.as_ptr() as usize, strings.len());
    if let Some(shape) = SHAPES.with(|cache| cache.borrow().get(&key).cloned()) {
        return check_values(shape, template);
    }

    let shape = Rc::new(compile(strings)?);
    tracing::trace!(bindings = shape.binding_count, "compiled template shape");
    SHAPES.with(|cache| cache.borrow_mut().insert(key, shape.clone()));
    check_values(shape, template)
}

fn check_values(shape: Rc<Shape>, template: &Template) -> Result<Rc<Shape>, TemplateError> {
    if shape.binding_count != template.values().len() {
        return Err(TemplateError::ValueCount {
            expected: shape.binding_count,
            actual: template.values().len(),
        });
    }
    Ok(shape)
}

pub fn compile(strings: &[&str]) -> Result<Shape, TemplateError> {
    let separator = MARKER.to_string();
    let joined = strings.join(separator.as_str());
    let mut doc = Document::new();
    let root = doc.create_element("template");
    doc.parse_fragment_into(root, &joined)?;

    let mut next = 0;
    let nodes = compile_children(&doc, root, &mut next)?;
    let expected = strings.len().saturating_sub(1);
    if next != expected {
        return Err(TemplateError::UnsupportedBinding(format!(
            "{} of {expected} bindings are in positions that cannot hold a value",
            expected - next.min(expected)
        )));
    }
    Ok(Shape {
        nodes,
        binding_count: next,
    })
}

fn compile_children(
    doc: &Document,
    parent: NodeId,
    next: &mut usize,
) -> Result<Vec<Rc<ShapeNode>>, TemplateError> {
    let mut out = Vec::new();
    for &child in doc.children(parent) {
        let Some(node) = doc.node(child) else {
            continue;
        };
        match &node.kind {
            NodeKind::Comment(data) => {
                if data.contains(MARKER) {
                    return Err(TemplateError::UnsupportedBinding(
                        "binding inside a comment".to_string(),
                    ));
                }
            }
            NodeKind::Text(text) => {
                for (i, piece) in text.split(MARKER).enumerate() {
                    if i > 0 {
                        out.push(Rc::new(ShapeNode::Child(*next)));
                        *next += 1;
                    }
                    if !piece.is_empty() {
                        out.push(Rc::new(ShapeNode::Text(piece.to_string())));
                    }
                }
            }
            NodeKind::Element(el) => {
                if el.tag.contains(MARKER) {
                    return Err(TemplateError::UnsupportedBinding(
                        "binding in tag name position".to_string(),
                    ));
                }
                let mut attributes = Vec::with_capacity(el.attributes.len());
                for attr in &el.attributes {
                    attributes.push(compile_attribute(&attr.name, &attr.value, next)?);
                }
                let children = compile_children(doc, child, next)?;
                out.push(Rc::new(ShapeNode::Element(ShapeElement {
                    tag: el.tag.clone(),
                    attributes,
                    children,
                })));
            }
        }
    }
    Ok(out)
}

fn compile_attribute(
    raw_name: &str,
    value: &str,
    next: &mut usize,
) -> Result<ShapeAttribute, TemplateError> {
    if raw_name.contains(MARKER) {
        return Err(TemplateError::UnsupportedBinding(
            "binding in attribute name position".to_string(),
        ));
    }

    let (kind, name) = match raw_name.chars().next() {
        Some('.') => (BindingKind::Property, &raw_name[1..]),
        Some('?') => (BindingKind::Boolean, &raw_name[1..]),
        Some('@') => (BindingKind::Event, &raw_name[1..]),
        _ => (BindingKind::Attribute, raw_name),
    };

    if !value.contains(MARKER) {
        if kind != BindingKind::Attribute {
            return Err(TemplateError::UnsupportedBinding(format!(
                "`{raw_name}` needs a bound value"
            )));
        }
        return Ok(ShapeAttribute::Static {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    let strings: Vec<String> = value.split(MARKER).map(str::to_string).collect();
    let values: Vec<usize> = (0..strings.len() - 1)
        .map(|i| *next + i)
        .collect();
    *next += values.len();

    let binding = AttributeBinding {
        kind,
        name: name.to_string(),
        strings,
        values,
    };
    if matches!(kind, BindingKind::Boolean | BindingKind::Event) && !binding.is_single() {
        return Err(TemplateError::UnsupportedBinding(format!(
            "`{raw_name}` takes exactly one value and no static text"
        )));
    }
    Ok(ShapeAttribute::Binding(binding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_order_follows_source_order() {
        let shape = compile(&["<div a=\"", " ", "\" .p=", ">", "</div>"]).unwrap();
        assert_eq!(shape.binding_count, 4);
        let ShapeNode::Element(el) = shape.nodes[0].as_ref() else {
            panic!("expected element");
        };
        let ShapeAttribute::Binding(a) = &el.attributes[0] else {
            panic!("expected binding");
        };
        assert_eq!(a.values, vec![0, 1]);
        assert_eq!(a.strings, vec!["", " ", ""]);
        let ShapeAttribute::Binding(p) = &el.attributes[1] else {
            panic!("expected binding");
        };
        assert_eq!(p.kind, BindingKind::Property);
        assert!(p.is_single());
        assert!(matches!(el.children[0].as_ref(), ShapeNode::Child(3)));
    }

    #[test]
    fn test_adjacent_child_bindings() {
        let shape = compile(&["<div>", "", "</div>"]).unwrap();
        let ShapeNode::Element(el) = shape.nodes[0].as_ref() else {
            panic!("expected element");
        };
        assert_eq!(el.children.len(), 2);
    }

    #[test]
    fn test_rejects_tag_name_binding() {
        assert!(matches!(
            compile(&["<", "></div>"]),
            Err(TemplateError::UnsupportedBinding(_)) | Err(TemplateError::Dom(_))
        ));
    }

    #[test]
    fn test_rejects_static_event_attribute() {
        assert!(compile(&["<button @click=\"x\"></button>"]).is_err());
    }

    #[test]
    fn test_rejects_interpolated_boolean() {
        assert!(compile(&["<div ?hidden=\"a", "\"></div>"]).is_err());
    }
}
