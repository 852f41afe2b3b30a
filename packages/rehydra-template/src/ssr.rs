use crate::compile::{BindingKind, ShapeAttribute, ShapeNode, shape_of};
use crate::error::TemplateError;
use crate::value::{Template, Value};
use crate::{PART_END, PART_START};
use futures::stream::Stream;
use rehydra_dom::is_void_element;
use rehydra_dom::serialize::{escape_attribute, escape_text};
use std::collections::VecDeque;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Streams the server markup of a template in document order. Every child
/// binding, and the template root, is wrapped in `<!--part-->` /
/// `<!--/part-->` comments so the client can find binding boundaries.
pub struct SsrStream<'a> {
    // Walk order: Start Tag -> Children -> End Tag, with end tags queued
    // behind the children that precede them.
    stack: VecDeque<RenderOp<'a>>,
}

enum RenderOp<'a> {
    Emit(String),
    Template(&'a Template),
    Node(Rc<ShapeNode>, &'a [Value]),
    Part(&'a Value),
}

impl<'a> SsrStream<'a> {
    pub fn new(root: &'a Template) -> Self {
        let mut stack = VecDeque::new();
        stack.push_back(RenderOp::Emit(marker(PART_START)));
        stack.push_back(RenderOp::Template(root));
        stack.push_back(RenderOp::Emit(marker(PART_END)));
        Self { stack }
    }

    /// Runs one op. Returns markup when the op produced any.
    fn step(&mut self, op: RenderOp<'a>) -> Result<Option<String>, TemplateError> {
        match op {
            RenderOp::Emit(chunk) => Ok(Some(chunk)),
            RenderOp::Template(template) => {
                let shape = shape_of(template)?;
                for node in shape.nodes.iter().rev() {
                    self.stack
                        .push_front(RenderOp::Node(node.clone(), template.values()));
                }
                Ok(None)
            }
            RenderOp::Part(value) => {
                self.stack.push_front(RenderOp::Emit(marker(PART_END)));
                match value {
                    Value::Template(t) => self.stack.push_front(RenderOp::Template(t)),
                    Value::List(items) => {
                        for item in items.iter().rev() {
                            self.stack.push_front(RenderOp::Part(item));
                        }
                    }
                    v if v.is_primitive() => {
                        let text = v.to_text();
                        if !text.is_empty() {
                            self.stack.push_front(RenderOp::Emit(escape_text(&text)));
                        }
                    }
                    _ => {}
                }
                Ok(Some(marker(PART_START)))
            }
            RenderOp::Node(node, values) => match node.as_ref() {
                ShapeNode::Text(text) => Ok(Some(escape_text(text))),
                ShapeNode::Child(index) => {
                    self.stack.push_front(RenderOp::Part(&values[*index]));
                    Ok(None)
                }
                ShapeNode::Element(el) => {
                    let mut chunk = String::new();
                    chunk.push('<');
                    chunk.push_str(&el.tag);
                    for attr in &el.attributes {
                        match attr {
                            ShapeAttribute::Static { name, value } => {
                                push_attribute(&mut chunk, name, value);
                            }
                            ShapeAttribute::Binding(binding) => match binding.kind {
                                BindingKind::Attribute => {
                                    let value = interpolate(&binding.strings, &binding.values, values);
                                    push_attribute(&mut chunk, &binding.name, &value);
                                }
                                BindingKind::Boolean => {
                                    if values[binding.values[0]].is_truthy() {
                                        push_attribute(&mut chunk, &binding.name, "");
                                    }
                                }
                                // Client-only bindings leave no trace in markup.
                                BindingKind::Property | BindingKind::Event => {}
                            },
                        }
                    }
                    chunk.push('>');

                    if !is_void_element(&el.tag) {
                        self.stack
                            .push_front(RenderOp::Emit(format!("</{}>", el.tag)));
                        for child in el.children.iter().rev() {
                            self.stack.push_front(RenderOp::Node(child.clone(), values));
                        }
                    }
                    Ok(Some(chunk))
                }
            },
        }
    }
}

impl<'a> Stream for SsrStream<'a> {
    type Item = Result<String, TemplateError>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        while let Some(op) = self.stack.pop_front() {
            match self.step(op) {
                Ok(Some(chunk)) => return Poll::Ready(Some(Ok(chunk))),
                Ok(None) => continue,
                Err(err) => {
                    self.stack.clear();
                    return Poll::Ready(Some(Err(err)));
                }
            }
        }
        Poll::Ready(None)
    }
}

fn marker(data: &str) -> String {
    format!("<!--{data}-->")
}

fn push_attribute(chunk: &mut String, name: &str, value: &str) {
    chunk.push(' ');
    chunk.push_str(name);
    if !value.is_empty() {
        chunk.push_str("=\"");
        chunk.push_str(&escape_attribute(value));
        chunk.push('"');
    }
}

/// Joins the static pieces of an attribute binding with its bound values.
pub(crate) fn interpolate(strings: &[String], indices: &[usize], values: &[Value]) -> String {
    let mut out = String::new();
    for (i, piece) in strings.iter().enumerate() {
        out.push_str(piece);
        if let Some(&index) = indices.get(i) {
            out.push_str(&values[index].to_text());
        }
    }
    out
}

pub struct Renderer<'a> {
    template: &'a Template,
}

impl<'a> Renderer<'a> {
    pub fn new(template: &'a Template) -> Self {
        Self { template }
    }

    pub fn render_to_stream(&self) -> SsrStream<'a> {
        SsrStream::new(self.template)
    }

    pub fn render_to_string(&self) -> Result<String, TemplateError> {
        let mut out = String::new();
        for chunk in futures::executor::block_on_stream(self.render_to_stream()) {
            out.push_str(&chunk?);
        }
        Ok(out)
    }
}

/// Server-renders `template` to markup with hydration markers.
pub fn render_to_string(template: &Template) -> Result<String, TemplateError> {
    Renderer::new(template).render_to_string()
}
