use crate::error::DomError;
use crate::node::{Document, NodeId};
use std::fmt;

/// A parsed CSS selector list. Supports type, universal, id, class and
/// attribute-presence/equality selectors joined by descendant or child
/// combinators, plus comma-separated alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Vec<(Combinator, Compound)>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let invalid = |message: &str| DomError::InvalidSelector {
            selector: source.to_string(),
            message: message.to_string(),
        };

        let mut alternatives = Vec::new();
        for alternative in source.split(',') {
            let mut parts = Vec::new();
            let mut combinator = Combinator::Descendant;
            let mut tokens = alternative.split_whitespace().peekable();
            if tokens.peek().is_none() {
                return Err(invalid("empty selector"));
            }
            for token in tokens {
                if token == ">" {
                    if parts.is_empty() || combinator == Combinator::Child {
                        return Err(invalid("dangling `>` combinator"));
                    }
                    combinator = Combinator::Child;
                    continue;
                }
                // `a>b` without spaces
                for (i, piece) in token.split('>').enumerate() {
                    if i > 0 {
                        combinator = Combinator::Child;
                    }
                    if piece.is_empty() {
                        return Err(invalid("dangling `>` combinator"));
                    }
                    parts.push((combinator, parse_compound(piece).map_err(|m| invalid(&m))?));
                    combinator = Combinator::Descendant;
                }
            }
            if combinator == Combinator::Child {
                return Err(invalid("dangling `>` combinator"));
            }
            alternatives.push(parts);
        }

        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|parts| matches_complex(doc, node, parts))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_compound(piece: &str) -> Result<Compound, String> {
    let mut compound = Compound::default();
    let mut rest = piece;

    let tag_len = rest
        .find(['#', '.', '['])
        .unwrap_or(rest.len());
    if tag_len > 0 {
        let tag = &rest[..tag_len];
        if tag != "*" {
            if !tag.chars().all(is_name_char) {
                return Err(format!("unexpected characters in `{tag}`"));
            }
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        rest = &rest[tag_len..];
    }

    while let Some(first) = rest.chars().next() {
        match first {
            '#' | '.' => {
                let body = &rest[1..];
                let len = body.find(|c: char| !is_name_char(c)).unwrap_or(body.len());
                if len == 0 {
                    return Err(format!("empty name after `{first}`"));
                }
                let name = body[..len].to_string();
                if first == '#' {
                    compound.id = Some(name);
                } else {
                    compound.classes.push(name);
                }
                rest = &body[len..];
            }
            '[' => {
                let close = rest.find(']').ok_or("unterminated attribute selector")?;
                let inner = &rest[1..close];
                let (name, value) = match inner.split_once('=') {
                    Some((n, v)) => {
                        let v = v.trim().trim_matches(|c| c == '"' || c == '\'');
                        (n.trim(), Some(v.to_string()))
                    }
                    None => (inner.trim(), None),
                };
                if name.is_empty() {
                    return Err("empty attribute name".to_string());
                }
                compound.attributes.push((name.to_string(), value));
                rest = &rest[close + 1..];
            }
            other => return Err(format!("unexpected `{other}`")),
        }
    }
    Ok(compound)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

impl Compound {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(el) = doc.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if el.tag != *tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.attribute("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = el.attribute("class").unwrap_or("");
            if !self
                .classes
                .iter()
                .all(|c| class_attr.split_whitespace().any(|have| have == c))
            {
                return false;
            }
        }
        self.attributes.iter().all(|(name, value)| {
            match (el.attribute(name), value) {
                (Some(_), None) => true,
                (Some(have), Some(want)) => have == want,
                (None, _) => false,
            }
        })
    }
}

fn matches_complex(doc: &Document, node: NodeId, parts: &[(Combinator, Compound)]) -> bool {
    let Some(((combinator, compound), rest)) = parts.split_last() else {
        return false;
    };
    if !compound.matches(doc, node) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    match combinator {
        Combinator::Child => doc
            .parent(node)
            .is_some_and(|p| matches_complex(doc, p, rest)),
        Combinator::Descendant => {
            let mut cursor = doc.parent(node);
            while let Some(ancestor) = cursor {
                if matches_complex(doc, ancestor, rest) {
                    return true;
                }
                cursor = doc.parent(ancestor);
            }
            false
        }
    }
}

impl Document {
    /// All descendant elements of `scope` matching `selector`, in document
    /// order. `scope` itself is never returned.
    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&id| selector.matches(self, id))
            .collect()
    }

    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|&id| selector.matches(self, id))
    }

    /// Parses `selector` and runs [`Document::query_selector_all`].
    pub fn select(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        Ok(self.query_selector_all(scope, &Selector::parse(selector)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_selectors() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div >").is_err());
        assert!(Selector::parse("div[").is_err());
        assert!(Selector::parse("a$b").is_err());
    }

    #[test]
    fn test_compound_parsing() {
        let sel = Selector::parse("li.item#first[data-x=\"1\"]").unwrap();
        assert_eq!(sel.alternatives.len(), 1);
        let (_, compound) = &sel.alternatives[0][0];
        assert_eq!(compound.tag.as_deref(), Some("li"));
        assert_eq!(compound.id.as_deref(), Some("first"));
        assert_eq!(compound.classes, vec!["item".to_string()]);
        assert_eq!(
            compound.attributes,
            vec![("data-x".to_string(), Some("1".to_string()))]
        );
    }
}
