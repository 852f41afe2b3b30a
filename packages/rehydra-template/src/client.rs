//! Client half of the engine: adopts server-rendered DOM (hydration) or
//! builds it fresh, then patches it in place on every update.

use crate::compile::{AttributeBinding, BindingKind, Shape, ShapeAttribute, ShapeNode, shape_of};
use crate::error::TemplateError;
use crate::ssr::interpolate;
use crate::value::{Listener, Template, Value};
use crate::{PART_END, PART_START};
use rehydra_dom::{Document, Event, NodeId, NodeKind};
use std::cell::RefCell;
use std::rc::Rc;

/// A child binding: everything between its start and end marker comments.
pub struct ChildPart {
    start: NodeId,
    end: NodeId,
    committed: Committed,
}

enum Committed {
    Nothing,
    Text(NodeId),
    Template(TemplateInstance),
    List(Vec<ChildPart>),
}

pub struct TemplateInstance {
    strings: &'static [&'static str],
    children: Vec<(usize, ChildPart)>,
    attributes: Vec<AttributePart>,
}

struct AttributePart {
    element: NodeId,
    binding: AttributeBinding,
    state: AttributeState,
}

enum AttributeState {
    Unset,
    Text(String),
    Present(bool),
    Property(serde_json::Value),
    Event(Rc<RefCell<Option<Listener>>>),
}

/// The rendered root of one container.
pub struct Root {
    container: NodeId,
    part: ChildPart,
}

impl Root {
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Re-applies `template` to the live subtree, patching in place.
    pub fn update(&mut self, doc: &mut Document, template: &Template) -> Result<(), TemplateError> {
        set_value(doc, &mut self.part, &Value::Template(template.clone()))
    }
}

/// Adopts the server-rendered nodes already inside `container`.
pub fn hydrate(
    doc: &mut Document,
    container: NodeId,
    template: &Template,
) -> Result<Root, TemplateError> {
    let mut cursor = 0;
    let part = hydrate_part(
        doc,
        container,
        &mut cursor,
        &Value::Template(template.clone()),
    )?;
    expect_end(doc, container, cursor)?;
    tracing::debug!(?container, "hydrated template");
    Ok(Root { container, part })
}

/// Client-only render: replaces the children of `container` with freshly
/// created nodes.
pub fn render(
    doc: &mut Document,
    container: NodeId,
    template: &Template,
) -> Result<Root, TemplateError> {
    doc.clear_children(container)?;
    let part = create_part(doc, container, None, &Value::Template(template.clone()))?;
    Ok(Root { container, part })
}

fn describe(doc: &Document, id: Option<NodeId>) -> String {
    match id.and_then(|id| doc.node(id)).map(|n| &n.kind) {
        Some(NodeKind::Element(el)) => format!("<{}>", el.tag),
        Some(NodeKind::Text(t)) => format!("text {t:?}"),
        Some(NodeKind::Comment(c)) => format!("<!--{c}-->"),
        None => "end of children".to_string(),
    }
}

fn mismatch(doc: &Document, parent: NodeId, index: usize, expected: String) -> TemplateError {
    TemplateError::HydrationMismatch {
        parent,
        index,
        expected,
        found: describe(doc, doc.children(parent).get(index).copied()),
    }
}

fn expect_end(doc: &Document, parent: NodeId, cursor: usize) -> Result<(), TemplateError> {
    if cursor != doc.children(parent).len() {
        return Err(mismatch(doc, parent, cursor, "end of children".to_string()));
    }
    Ok(())
}

fn expect_marker(
    doc: &Document,
    parent: NodeId,
    cursor: &mut usize,
    data: &str,
) -> Result<NodeId, TemplateError> {
    match doc.children(parent).get(*cursor).copied() {
        Some(id) if doc.is_comment(id) && doc.text(id) == Some(data) => {
            *cursor += 1;
            Ok(id)
        }
        _ => Err(mismatch(doc, parent, *cursor, format!("<!--{data}-->"))),
    }
}

fn hydrate_part(
    doc: &mut Document,
    parent: NodeId,
    cursor: &mut usize,
    value: &Value,
) -> Result<ChildPart, TemplateError> {
    let start = expect_marker(doc, parent, cursor, PART_START)?;
    let committed = match value {
        Value::Template(t) => Committed::Template(hydrate_template(doc, parent, cursor, t)?),
        Value::List(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(hydrate_part(doc, parent, cursor, item)?);
            }
            Committed::List(parts)
        }
        v if v.is_primitive() => {
            let text = v.to_text();
            if text.is_empty() {
                // Empty text leaves no node in server markup.
                let reference = doc.children(parent).get(*cursor).copied();
                let node = doc.create_text("");
                doc.insert_before(parent, node, reference)?;
                *cursor += 1;
                Committed::Text(node)
            } else {
                match doc.children(parent).get(*cursor).copied() {
                    Some(id) if doc.text(id) == Some(text.as_str()) && doc.is_text(id) => {
                        *cursor += 1;
                        Committed::Text(id)
                    }
                    _ => return Err(mismatch(doc, parent, *cursor, format!("text {text:?}"))),
                }
            }
        }
        _ => Committed::Nothing,
    };
    let end = expect_marker(doc, parent, cursor, PART_END)?;
    Ok(ChildPart {
        start,
        end,
        committed,
    })
}

fn hydrate_template(
    doc: &mut Document,
    parent: NodeId,
    cursor: &mut usize,
    template: &Template,
) -> Result<TemplateInstance, TemplateError> {
    let shape = shape_of(template)?;
    let mut instance = TemplateInstance {
        strings: template.strings(),
        children: Vec::new(),
        attributes: Vec::new(),
    };
    for node in &shape.nodes {
        hydrate_node(doc, parent, cursor, node, template.values(), &mut instance)?;
    }
    Ok(instance)
}

fn hydrate_node(
    doc: &mut Document,
    parent: NodeId,
    cursor: &mut usize,
    node: &ShapeNode,
    values: &[Value],
    instance: &mut TemplateInstance,
) -> Result<(), TemplateError> {
    let current = doc.children(parent).get(*cursor).copied();
    match node {
        ShapeNode::Text(text) => match current {
            Some(id) if doc.is_text(id) && doc.text(id) == Some(text.as_str()) => {
                *cursor += 1;
                Ok(())
            }
            _ => Err(mismatch(doc, parent, *cursor, format!("text {text:?}"))),
        },
        ShapeNode::Child(index) => {
            let part = hydrate_part(doc, parent, cursor, &values[*index])?;
            instance.children.push((*index, part));
            Ok(())
        }
        ShapeNode::Element(el) => {
            let element = match current {
                Some(id) if doc.tag_name(id) == Some(el.tag.as_str()) => id,
                _ => return Err(mismatch(doc, parent, *cursor, format!("<{}>", el.tag))),
            };
            *cursor += 1;

            for attr in &el.attributes {
                if let ShapeAttribute::Binding(binding) = attr {
                    let mut part = AttributePart {
                        element,
                        binding: binding.clone(),
                        state: AttributeState::Unset,
                    };
                    match binding.kind {
                        // Already present in the server markup; remember
                        // what was rendered without touching the node.
                        BindingKind::Attribute => {
                            part.state = AttributeState::Text(interpolate(
                                &binding.strings,
                                &binding.values,
                                values,
                            ));
                        }
                        BindingKind::Boolean => {
                            part.state =
                                AttributeState::Present(values[binding.values[0]].is_truthy());
                        }
                        BindingKind::Property | BindingKind::Event => part.commit(doc, values)?,
                    }
                    instance.attributes.push(part);
                }
            }

            let mut inner = 0;
            for child in &el.children {
                hydrate_node(doc, element, &mut inner, child, values, instance)?;
            }
            expect_end(doc, element, inner)
        }
    }
}

fn create_part(
    doc: &mut Document,
    parent: NodeId,
    before: Option<NodeId>,
    value: &Value,
) -> Result<ChildPart, TemplateError> {
    let start = doc.create_comment(PART_START);
    let end = doc.create_comment(PART_END);
    doc.insert_before(parent, start, before)?;
    doc.insert_before(parent, end, before)?;
    let committed = create_content(doc, parent, end, value)?;
    Ok(ChildPart {
        start,
        end,
        committed,
    })
}

/// Builds the nodes for `value` just before `end`.
fn create_content(
    doc: &mut Document,
    parent: NodeId,
    end: NodeId,
    value: &Value,
) -> Result<Committed, TemplateError> {
    Ok(match value {
        Value::Template(t) => Committed::Template(instantiate(doc, parent, Some(end), t)?),
        Value::List(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                parts.push(create_part(doc, parent, Some(end), item)?);
            }
            Committed::List(parts)
        }
        v if v.is_primitive() => {
            let node = doc.create_text(v.to_text());
            doc.insert_before(parent, node, Some(end))?;
            Committed::Text(node)
        }
        _ => Committed::Nothing,
    })
}

fn instantiate(
    doc: &mut Document,
    parent: NodeId,
    before: Option<NodeId>,
    template: &Template,
) -> Result<TemplateInstance, TemplateError> {
    let shape: Rc<Shape> = shape_of(template)?;
    let mut instance = TemplateInstance {
        strings: template.strings(),
        children: Vec::new(),
        attributes: Vec::new(),
    };
    for node in &shape.nodes {
        instantiate_node(doc, parent, before, node, template.values(), &mut instance)?;
    }
    Ok(instance)
}

fn instantiate_node(
    doc: &mut Document,
    parent: NodeId,
    before: Option<NodeId>,
    node: &ShapeNode,
    values: &[Value],
    instance: &mut TemplateInstance,
) -> Result<(), TemplateError> {
    match node {
        ShapeNode::Text(text) => {
            let id = doc.create_text(text.as_str());
            doc.insert_before(parent, id, before)?;
        }
        ShapeNode::Child(index) => {
            let part = create_part(doc, parent, before, &values[*index])?;
            instance.children.push((*index, part));
        }
        ShapeNode::Element(el) => {
            let element = doc.create_element(&el.tag);
            doc.insert_before(parent, element, before)?;
            for attr in &el.attributes {
                match attr {
                    ShapeAttribute::Static { name, value } => {
                        doc.set_attribute(element, name, value.as_str())?;
                    }
                    ShapeAttribute::Binding(binding) => {
                        let mut part = AttributePart {
                            element,
                            binding: binding.clone(),
                            state: AttributeState::Unset,
                        };
                        part.commit(doc, values)?;
                        instance.attributes.push(part);
                    }
                }
            }
            for child in &el.children {
                instantiate_node(doc, element, None, child, values, instance)?;
            }
        }
    }
    Ok(())
}

impl TemplateInstance {
    fn update(&mut self, doc: &mut Document, template: &Template) -> Result<(), TemplateError> {
        let values = template.values();
        for (index, part) in &mut self.children {
            set_value(doc, part, &values[*index])?;
        }
        for part in &mut self.attributes {
            part.commit(doc, values)?;
        }
        Ok(())
    }
}

impl AttributePart {
    fn commit(&mut self, doc: &mut Document, values: &[Value]) -> Result<(), TemplateError> {
        let binding = &self.binding;
        match binding.kind {
            BindingKind::Attribute => {
                let text = interpolate(&binding.strings, &binding.values, values);
                if !matches!(&self.state, AttributeState::Text(old) if *old == text) {
                    doc.set_attribute(self.element, &binding.name, text.as_str())?;
                    self.state = AttributeState::Text(text);
                }
            }
            BindingKind::Boolean => {
                let present = values[binding.values[0]].is_truthy();
                if !matches!(self.state, AttributeState::Present(old) if old == present) {
                    if present {
                        doc.set_attribute(self.element, &binding.name, "")?;
                    } else {
                        doc.remove_attribute(self.element, &binding.name)?;
                    }
                    self.state = AttributeState::Present(present);
                }
            }
            BindingKind::Property => {
                let value = if binding.is_single() {
                    values[binding.values[0]].to_json()
                } else {
                    serde_json::Value::String(interpolate(
                        &binding.strings,
                        &binding.values,
                        values,
                    ))
                };
                if !matches!(&self.state, AttributeState::Property(old) if *old == value) {
                    doc.set_property(self.element, &binding.name, value.clone())?;
                    self.state = AttributeState::Property(value);
                }
            }
            BindingKind::Event => {
                let listener = match &values[binding.values[0]] {
                    Value::Listener(l) => Some(l.clone()),
                    Value::Nothing => None,
                    _ => {
                        return Err(TemplateError::InvalidValue {
                            name: format!("@{}", binding.name),
                            expected: "a listener or nothing",
                        });
                    }
                };
                // One DOM listener per binding; updates only swap the
                // callback it delegates to.
                if let AttributeState::Event(slot) = &self.state {
                    *slot.borrow_mut() = listener;
                    return Ok(());
                }
                let slot = Rc::new(RefCell::new(listener));
                let target = slot.clone();
                doc.add_event_listener(
                    self.element,
                    &binding.name,
                    Rc::new(move |doc: &mut Document, event: &Event| {
                        let current = target.borrow().clone();
                        if let Some(listener) = current {
                            listener.call(doc, event);
                        }
                    }),
                )?;
                self.state = AttributeState::Event(slot);
            }
        }
        Ok(())
    }
}

/// Removes every node strictly between the part's markers.
fn clear(doc: &mut Document, part: &ChildPart) -> Result<(), TemplateError> {
    while let Some(next) = doc.next_sibling(part.start) {
        if next == part.end {
            break;
        }
        doc.remove(next)?;
    }
    Ok(())
}

fn set_value(doc: &mut Document, part: &mut ChildPart, value: &Value) -> Result<(), TemplateError> {
    match (&mut part.committed, value) {
        (Committed::Nothing, Value::Nothing | Value::Listener(_)) => return Ok(()),
        (Committed::Text(node), v) if v.is_primitive() => {
            let text = v.to_text();
            if doc.text(*node) != Some(text.as_str()) {
                doc.set_text(*node, text)?;
            }
            return Ok(());
        }
        (Committed::Template(instance), Value::Template(t))
            if std::ptr::eq(instance.strings, t.strings()) || instance.strings == t.strings() =>
        {
            shape_of(t)?;
            return instance.update(doc, t);
        }
        (Committed::List(items), Value::List(new_items)) => {
            let parent = doc.parent(part.end).ok_or(TemplateError::NotRendered(part.end))?;
            for (i, item) in new_items.iter().enumerate() {
                match items.get_mut(i) {
                    Some(existing) => set_value(doc, existing, item)?,
                    None => items.push(create_part(doc, parent, Some(part.end), item)?),
                }
            }
            for stale in items.drain(new_items.len()..) {
                clear(doc, &stale)?;
                doc.remove(stale.start)?;
                doc.remove(stale.end)?;
            }
            return Ok(());
        }
        _ => {}
    }

    // Different kind of value: rebuild the content between the markers.
    let parent = doc.parent(part.end).ok_or(TemplateError::NotRendered(part.end))?;
    clear(doc, part)?;
    part.committed = create_content(doc, parent, part.end, value)?;
    Ok(())
}
