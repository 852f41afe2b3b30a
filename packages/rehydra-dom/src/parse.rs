use crate::error::DomError;
use crate::is_void_element;
use crate::node::{Document, NodeId};
use std::borrow::Cow;

impl Document {
    /// Parses `markup` and appends the resulting nodes to `parent`.
    /// Returns the top-level nodes that were created, in order.
    pub fn parse_fragment_into(
        &mut self,
        parent: NodeId,
        markup: &str,
    ) -> Result<Vec<NodeId>, DomError> {
        let mut parser = Parser {
            src: markup,
            pos: 0,
            doc: self,
            root: parent,
            open: Vec::new(),
            top: Vec::new(),
        };
        parser.run()?;
        Ok(parser.top)
    }

    /// Replaces the children of `parent` with the nodes parsed from `markup`.
    pub fn set_inner_html(&mut self, parent: NodeId, markup: &str) -> Result<(), DomError> {
        self.clear_children(parent)?;
        self.parse_fragment_into(parent, markup)?;
        Ok(())
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    doc: &'a mut Document,
    root: NodeId,
    open: Vec<(NodeId, String)>,
    top: Vec<NodeId>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        let src = self.src;
        &src[self.pos..]
    }

    fn run(&mut self) -> Result<(), DomError> {
        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.comment()?;
            } else if rest.starts_with("</") {
                self.end_tag()?;
            } else if starts_tag(rest) {
                self.start_tag()?;
            } else {
                self.text()?;
            }
        }
        // Elements left open at end of input are closed implicitly.
        Ok(())
    }

    fn attach(&mut self, node: NodeId) -> Result<(), DomError> {
        match self.open.last() {
            Some((parent, _)) => self.doc.append_child(*parent, node),
            None => {
                self.doc.append_child(self.root, node)?;
                self.top.push(node);
                Ok(())
            }
        }
    }

    fn comment(&mut self) -> Result<(), DomError> {
        let start = self.pos;
        let src = self.src;
        let body = &src[start + 4..];
        let end = body
            .find("-->")
            .ok_or_else(|| DomError::parse(start, "unterminated comment"))?;
        let node = self.doc.create_comment(&body[..end]);
        self.pos = start + 4 + end + 3;
        self.attach(node)
    }

    fn text(&mut self) -> Result<(), DomError> {
        let rest = self.rest();
        // A `<` that does not open markup is plain text.
        let mut end = rest.len();
        let mut search = rest.chars().next().map_or(1, char::len_utf8);
        while let Some(idx) = rest[search..].find('<') {
            let at = search + idx;
            let tail = &rest[at..];
            if tail.starts_with("<!--") || tail.starts_with("</") || starts_tag(tail) {
                end = at;
                break;
            }
            search = at + 1;
        }
        let raw = &rest[..end];
        self.pos += end;
        let node = self.doc.create_text(decode_entities(raw).into_owned());
        self.attach(node)
    }

    fn end_tag(&mut self) -> Result<(), DomError> {
        let start = self.pos;
        let src = self.src;
        let rest = &src[start + 2..];
        let close = rest
            .find('>')
            .ok_or_else(|| DomError::parse(start, "unterminated end tag"))?;
        let name = rest[..close].trim().to_ascii_lowercase();
        self.pos = start + 2 + close + 1;

        let depth = self
            .open
            .iter()
            .rposition(|(_, tag)| *tag == name)
            .ok_or_else(|| DomError::parse(start, format!("unexpected end tag </{name}>")))?;
        self.open.truncate(depth);
        Ok(())
    }

    fn start_tag(&mut self) -> Result<(), DomError> {
        let start = self.pos;
        self.pos += 1;
        let name = self.take_while(|c| !c.is_whitespace() && c != '/' && c != '>');
        let tag = name.to_ascii_lowercase();
        let el = self.doc.create_element(&tag);

        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return Err(DomError::parse(start, format!("unterminated start tag <{tag}")));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }

            let attr_start = self.pos;
            let attr_name =
                self.take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/');
            if attr_name.is_empty() {
                return Err(DomError::parse(attr_start, "expected attribute name"));
            }
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attribute_value(attr_start)?
            } else {
                String::new()
            };
            // First occurrence wins, as in HTML.
            if !self.doc.has_attribute(el, attr_name) {
                self.doc.set_attribute(el, attr_name, value)?;
            }
        }

        self.attach(el)?;
        if self_closing || is_void_element(&tag) {
            return Ok(());
        }
        if tag == "script" || tag == "style" {
            return self.raw_text(el, &tag);
        }
        self.open.push((el, tag));
        Ok(())
    }

    fn attribute_value(&mut self, attr_start: usize) -> Result<String, DomError> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body
                    .find(quote)
                    .ok_or_else(|| DomError::parse(attr_start, "unterminated attribute value"))?;
                self.pos += 1 + end + 1;
                Ok(decode_entities(&body[..end]).into_owned())
            }
            _ => {
                let raw = self.take_while(|c| !c.is_whitespace() && c != '>');
                Ok(decode_entities(raw).into_owned())
            }
        }
    }

    fn raw_text(&mut self, el: NodeId, tag: &str) -> Result<(), DomError> {
        let rest = self.rest();
        let closing = format!("</{tag}");
        let end = rest
            .find(&closing)
            .ok_or_else(|| DomError::parse(self.pos, format!("unterminated <{tag}>")))?;
        if end > 0 {
            let text = self.doc.create_text(&rest[..end]);
            self.doc.append_child(el, text)?;
        }
        self.pos += end;
        self.open.push((el, tag.to_string()));
        self.end_tag()
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }
}

fn starts_tag(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Decodes the character references that appear in serialized markup.
/// Unknown references are left untouched.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        match candidate.find(';').filter(|&semi| semi <= 10) {
            Some(semi) => {
                let entity = &candidate[1..semi];
                match decode_entity(entity) {
                    Some(c) => {
                        out.push(c);
                        rest = &candidate[semi + 1..];
                    }
                    None => {
                        out.push('&');
                        rest = &candidate[1..];
                    }
                }
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
