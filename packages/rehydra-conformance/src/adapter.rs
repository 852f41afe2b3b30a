use rehydra_dom::{Document, NodeId};
use rehydra_harness::{SutAdapter, SutError};
use rehydra_template::{Root, Template, hydrate, render_to_string};
use rustc_hash::FxHashMap;

/// Runs cases against the reference template engine. One hydrated root is
/// kept per container until the harness tears that container down.
#[derive(Default)]
pub struct ReferenceSut {
    roots: FxHashMap<NodeId, Root>,
}

impl ReferenceSut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Containers currently holding a live root.
    pub fn live_roots(&self) -> usize {
        self.roots.len()
    }
}

impl SutAdapter for ReferenceSut {
    type Template = Template;

    fn render_to_string(&mut self, template: &Template) -> Result<String, SutError> {
        render_to_string(template).map_err(SutError::new)
    }

    fn hydrate(
        &mut self,
        doc: &mut Document,
        container: NodeId,
        template: &Template,
        _source_markup: &str,
    ) -> Result<(), SutError> {
        let root = hydrate(doc, container, template).map_err(SutError::new)?;
        self.roots.insert(container, root);
        Ok(())
    }

    fn update(
        &mut self,
        doc: &mut Document,
        container: NodeId,
        template: &Template,
    ) -> Result<(), SutError> {
        let root = self
            .roots
            .get_mut(&container)
            .ok_or_else(|| SutError::new(format!("container {container:?} was never hydrated")))?;
        root.update(doc, template).map_err(SutError::new)
    }

    fn teardown(&mut self, _doc: &mut Document, container: NodeId) {
        if self.roots.remove(&container).is_some() {
            tracing::trace!(?container, "dropped hydrated root");
        }
    }
}
