use rehydra_dom::{Document, Event};
use std::fmt;
use std::rc::Rc;

/// A template instance: the static markup pieces of one template literal
/// plus the values bound between them. Two templates share a shape when
/// their static pieces are equal.
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    strings: &'static [&'static str],
    values: Vec<Value>,
}

impl Template {
    pub fn new(strings: &'static [&'static str], values: Vec<Value>) -> Self {
        Self { strings, values }
    }

    pub fn strings(&self) -> &'static [&'static str] {
        self.strings
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn same_shape(&self, other: &Template) -> bool {
        std::ptr::eq(self.strings, other.strings) || self.strings == other.strings
    }
}

/// Event listener value. Equality is identity of the underlying closure.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&mut Document, &Event)>);

impl Listener {
    pub fn new(f: impl Fn(&mut Document, &Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, doc: &mut Document, event: &Event) {
        (self.0)(doc, event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nothing,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Template(Template),
    List(Vec<Value>),
    Listener(Listener),
}

impl Value {
    /// String form used for text content and attribute interpolation.
    pub fn to_text(&self) -> String {
        match self {
            Value::Nothing | Value::Template(_) | Value::Listener(_) => String::new(),
            Value::Text(s) => s.clone(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::to_text)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Property form: primitives keep their type.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nothing | Value::Template(_) | Value::Listener(_) => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => items.iter().map(Value::to_json).collect(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nothing => false,
            Value::Text(s) => !s.is_empty(),
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Bool(b) => *b,
            Value::Template(_) | Value::List(_) | Value::Listener(_) => true,
        }
    }

    /// Values rendered as a single text node.
    pub(crate) fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Text(_) | Value::Int(_) | Value::Float(_) | Value::Bool(_)
        )
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Template> for Value {
    fn from(t: Template) -> Self {
        Value::Template(t)
    }
}

impl From<Listener> for Value {
    fn from(l: Listener) -> Self {
        Value::Listener(l)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nothing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_forms() {
        assert_eq!(Value::from(1).to_text(), "1");
        assert_eq!(Value::from(true).to_text(), "true");
        assert_eq!(Value::from(2.5).to_text(), "2.5");
        assert_eq!(Value::from(vec!["a", "b"]).to_text(), "a,b");
        assert_eq!(Value::Nothing.to_text(), "");
    }

    #[test]
    fn test_json_forms_keep_types() {
        assert_eq!(Value::from(1).to_json(), json!(1));
        assert_eq!(Value::from(false).to_json(), json!(false));
        assert_eq!(Value::from("x").to_json(), json!("x"));
    }

    #[test]
    fn test_listener_equality_is_identity() {
        let a = Listener::new(|_, _| {});
        let b = Listener::new(|_, _| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
