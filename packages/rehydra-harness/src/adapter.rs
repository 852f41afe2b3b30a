use rehydra_dom::{Document, NodeId};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SutError {
    pub message: String,
}

impl SutError {
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// The seam between the harness and the implementation under test.
///
/// The harness never looks inside `Template`; it only hands back what a
/// case's `render` produced.
pub trait SutAdapter {
    type Template;

    /// Server render. Must be deterministic for identical templates.
    fn render_to_string(&mut self, template: &Self::Template) -> Result<String, SutError>;

    /// Attach live bindings to the nodes already inside `container`, which
    /// the harness parsed from `source_markup`. Nodes must be adopted, not
    /// recreated.
    fn hydrate(
        &mut self,
        doc: &mut Document,
        container: NodeId,
        template: &Self::Template,
        source_markup: &str,
    ) -> Result<(), SutError>;

    /// Re-apply `template` to the hydrated subtree, patching in place.
    fn update(
        &mut self,
        doc: &mut Document,
        container: NodeId,
        template: &Self::Template,
    ) -> Result<(), SutError>;

    /// Called once the harness is done with `container`, pass or fail, just
    /// before the container is removed from the document.
    fn teardown(&mut self, _doc: &mut Document, _container: NodeId) {}
}
