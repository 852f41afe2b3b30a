use rehydra_dom::{DomError, NodeId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("binding not allowed here: {0}")]
    UnsupportedBinding(String),
    #[error("template has {expected} bindings but {actual} values were supplied")]
    ValueCount { expected: usize, actual: usize },
    #[error("hydration mismatch under {parent:?} at child {index}: expected {expected}, found {found}")]
    HydrationMismatch {
        parent: NodeId,
        index: usize,
        expected: String,
        found: String,
    },
    #[error("`{name}` binding expects {expected}")]
    InvalidValue { name: String, expected: &'static str },
    #[error("container {0:?} has not been hydrated or rendered")]
    NotRendered(NodeId),
    #[error(transparent)]
    Dom(#[from] DomError),
}
