pub mod error;
pub mod events;
pub mod node;
pub mod parse;
pub mod selector;
pub mod serialize;

pub use error::DomError;
pub use events::{Event, EventHandler, ListenerId};
pub use node::{Attribute, Document, Element, Node, NodeId, NodeKind};
pub use selector::Selector;
pub use serialize::{INTERPOLATION_SEPARATOR, normalize_markup};

/// Elements that never have children or a closing tag.
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}
