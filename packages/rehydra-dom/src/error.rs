use crate::node::NodeId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0:?} does not exist (removed or never created)")]
    UnknownNode(NodeId),
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0:?} is not a text or comment node")]
    NotCharacterData(NodeId),
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    HierarchyRequest { parent: NodeId, child: NodeId },
    #[error("reference node {reference:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, reference: NodeId },
    #[error("markup parse error at byte {offset}: {message}")]
    Parse { offset: usize, message: String },
    #[error("invalid selector `{selector}`: {message}")]
    InvalidSelector { selector: String, message: String },
}

impl DomError {
    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        DomError::Parse {
            offset,
            message: message.into(),
        }
    }
}
