use crate::error::DomError;
use crate::is_void_element;
use crate::node::{Attribute, Document, NodeId, NodeKind};

/// Emitted between two sibling values that were produced by separate
/// interpolations (siblings separated only by marker comments).
pub const INTERPOLATION_SEPARATOR: &str = "\n  ";

impl Document {
    /// Raw markup of the children of `id`: comments kept, attributes in
    /// insertion order.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_raw(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_raw(id, &mut out);
        out
    }

    fn write_raw(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(t) => out.push_str(&escape_text(t)),
            NodeKind::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for attr in &el.attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(&attr.value));
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&el.tag) {
                    return;
                }
                for &child in &node.children {
                    self.write_raw(child, out);
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }

    /// Markup of the children of `id` in comparison form: comments and
    /// empty text dropped, attributes sorted, valueless attributes bare, and
    /// [`INTERPOLATION_SEPARATOR`] between siblings that were split by
    /// comments. Whitespace-only text touching a comment between two values
    /// is part of that boundary and collapses into the one separator.
    pub fn normalized_inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_normalized_children(id, &mut out);
        out
    }

    fn write_normalized_children(&self, id: NodeId, out: &mut String) {
        let children: Vec<NodeId> = self
            .children(id)
            .iter()
            .copied()
            .filter(|&c| !(self.is_text(c) && self.text(c) == Some("")))
            .collect();
        let mut wrote_any = false;
        let mut boundary = false;
        // Boundary whitespace not yet known to sit between two values.
        let mut pending = String::new();
        for (i, &child) in children.iter().enumerate() {
            match self.node(child).map(|n| &n.kind) {
                Some(NodeKind::Comment(_)) => boundary |= wrote_any,
                Some(NodeKind::Text(t))
                    if t.chars().all(char::is_whitespace) && self.touches_comment(&children, i) =>
                {
                    if wrote_any {
                        pending.push_str(t);
                        boundary = true;
                    } else {
                        // Leading whitespace is not a value of its own.
                        out.push_str(&escape_text(t));
                    }
                }
                Some(_) => {
                    if boundary {
                        out.push_str(INTERPOLATION_SEPARATOR);
                        boundary = false;
                    }
                    pending.clear();
                    self.write_normalized(child, out);
                    wrote_any = true;
                }
                None => {}
            }
        }
        // Trailing whitespace after the last value is ordinary text.
        out.push_str(&escape_text(&pending));
    }

    fn touches_comment(&self, siblings: &[NodeId], index: usize) -> bool {
        let before = index.checked_sub(1).and_then(|i| siblings.get(i));
        let after = siblings.get(index + 1);
        [before, after]
            .into_iter()
            .flatten()
            .any(|&sibling| self.is_comment(sibling))
    }

    fn write_normalized(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(t) => out.push_str(&escape_text(t)),
            NodeKind::Comment(_) => {}
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                let mut attrs: Vec<&Attribute> = el.attributes.iter().collect();
                attrs.sort_by(|a, b| a.name.cmp(&b.name));
                for attr in attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    if !attr.value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attribute(&attr.value));
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(&el.tag) {
                    return;
                }
                self.write_normalized_children(id, out);
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

/// Parses `markup` into a scratch document and returns its normalized form.
pub fn normalize_markup(markup: &str) -> Result<String, DomError> {
    let mut doc = Document::new();
    let root = doc.create_element("template");
    doc.parse_fragment_into(root, markup)?;
    Ok(doc.normalized_inner_html(root))
}

pub fn escape_text(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '&' => output.push_str("&amp;"),
            _ => output.push(c),
        }
    }
    output
}

pub fn escape_attribute(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(c),
        }
    }
    output
}
