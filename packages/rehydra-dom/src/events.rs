use crate::error::DomError;
use crate::node::{Document, NodeId};
use std::rc::Rc;

/// Listener callback. It receives the document mutably so handlers can
/// record state on the target, as a browser handler would set an expando.
pub type EventHandler = Rc<dyn Fn(&mut Document, &Event)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
    pub current_target: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) struct Listener {
    pub(crate) id: ListenerId,
    pub(crate) name: String,
    pub(crate) handler: EventHandler,
}

impl Document {
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        name: &str,
        handler: EventHandler,
    ) -> Result<ListenerId, DomError> {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.element_mut(node)?.listeners.push(Listener {
            id,
            name: name.to_string(),
            handler,
        });
        Ok(id)
    }

    /// Returns whether a listener was removed.
    pub fn remove_event_listener(&mut self, node: NodeId, id: ListenerId) -> bool {
        match self.element_mut(node) {
            Ok(el) => {
                let before = el.listeners.len();
                el.listeners.retain(|l| l.id != id);
                el.listeners.len() != before
            }
            Err(_) => false,
        }
    }

    pub fn listener_count(&self, node: NodeId, name: &str) -> usize {
        self.element(node)
            .map(|el| el.listeners.iter().filter(|l| l.name == name).count())
            .unwrap_or(0)
    }

    /// Dispatches a bubbling event at `target`. Returns how many handlers ran.
    pub fn dispatch_event(&mut self, target: NodeId, name: &str) -> Result<usize, DomError> {
        if !self.contains(target) {
            return Err(DomError::UnknownNode(target));
        }

        let mut path = vec![target];
        let mut cursor = target;
        while let Some(parent) = self.parent(cursor) {
            path.push(parent);
            cursor = parent;
        }

        let mut invoked = 0;
        for current in path {
            // Handlers may mutate the tree, so collect before calling.
            let handlers: Vec<EventHandler> = match self.element(current) {
                Some(el) => el
                    .listeners
                    .iter()
                    .filter(|l| l.name == name)
                    .map(|l| l.handler.clone())
                    .collect(),
                None => continue,
            };
            for handler in handlers {
                let event = Event {
                    name: name.to_string(),
                    target,
                    current_target: current,
                };
                handler(self, &event);
                invoked += 1;
            }
        }
        tracing::trace!(name, invoked, "dispatched event");
        Ok(invoked)
    }

    pub fn click(&mut self, target: NodeId) -> Result<usize, DomError> {
        self.dispatch_event(target, "click")
    }
}
