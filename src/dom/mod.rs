//! Host abstraction.
//!
//! The runtime never touches a concrete document. It talks to the host
//! through two traits:
//!
//! - [`Dom`] - node creation, tree edits, attributes, classes, properties,
//!   event listeners
//! - [`EventLoop`] - clock, zero-delay timers, animation frames
//!
//! [`MemoryHost`] implements both in memory for headless runs and tests.

pub mod memory;
pub mod nodes;

use std::fmt;
use std::rc::Rc;

use crate::types::Millis;

pub use memory::{MemoryHost, Mutation};
pub use nodes::DomNodes;

// =============================================================================
// Node handles
// =============================================================================

/// Opaque handle to a host node. Equality is node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Value of an element property (as opposed to a markup attribute).
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Text(String),
    Bool(bool),
    Number(f64),
}

impl PropValue {
    /// Text form, as an input's `value` reads.
    pub fn as_text(&self) -> String {
        match self {
            PropValue::Text(s) => s.clone(),
            PropValue::Bool(b) => b.to_string(),
            PropValue::Number(n) => n.to_string(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<String> for PropValue {
    fn from(s: String) -> Self {
        PropValue::Text(s)
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        PropValue::Text(s.to_string())
    }
}

impl From<bool> for PropValue {
    fn from(b: bool) -> Self {
        PropValue::Bool(b)
    }
}

impl From<f64> for PropValue {
    fn from(n: f64) -> Self {
        PropValue::Number(n)
    }
}

/// An event delivered to a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomEvent {
    pub kind: String,
    pub target: NodeId,
}

pub type EventHandler = Rc<dyn Fn(&DomEvent)>;

// =============================================================================
// Traits
// =============================================================================

/// Document operations the runtime needs from its host.
pub trait Dom {
    fn create_element(&self, tag: &str) -> NodeId;
    fn create_text(&self, text: &str) -> NodeId;

    fn set_text(&self, node: NodeId, text: &str);
    fn text(&self, node: NodeId) -> Option<String>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// Move or insert `node` under `parent`, before `before` (append when
    /// `None`).
    fn insert_before(&self, parent: NodeId, node: NodeId, before: Option<NodeId>);
    fn remove_child(&self, parent: NodeId, node: NodeId);

    fn set_attribute(&self, node: NodeId, name: &str, value: &str);
    fn get_attribute(&self, node: NodeId, name: &str) -> Option<String>;
    fn remove_attribute(&self, node: NodeId, name: &str);

    fn add_class(&self, node: NodeId, class: &str);
    fn remove_class(&self, node: NodeId, class: &str);
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    fn set_property(&self, node: NodeId, name: &str, value: PropValue);
    fn get_property(&self, node: NodeId, name: &str) -> Option<PropValue>;

    fn add_event_listener(&self, node: NodeId, kind: &str, handler: EventHandler);

    /// Constraint validation of a form field. Hosts without one accept
    /// everything.
    fn check_validity(&self, _node: NodeId) -> bool {
        true
    }
}

/// Clock and callback queues of the host loop.
pub trait EventLoop {
    /// Current time in milliseconds.
    fn now(&self) -> Millis;

    fn set_timeout(&self, delay: Millis, f: Box<dyn FnOnce()>);

    /// Run `f` before the next repaint with the frame timestamp.
    fn request_animation_frame(&self, f: Box<dyn FnOnce(Millis)>);
}

impl fmt::Debug for dyn Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Dom")
    }
}

impl fmt::Debug for dyn EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn EventLoop")
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Insert `node` before `pos` unless it already sits there.
pub(crate) fn insert_at(dom: &dyn Dom, parent: NodeId, pos: Option<NodeId>, node: NodeId) {
    let in_place = dom.parent(node) == Some(parent) && dom.next_sibling(node) == pos;
    if !in_place {
        dom.insert_before(parent, node, pos);
    }
}

/// Remove `node` if it is still a child of `parent`.
pub(crate) fn remove_node(dom: &dyn Dom, parent: NodeId, node: NodeId) {
    if dom.parent(node) == Some(parent) {
        dom.remove_child(parent, node);
    }
}

/// The `value` property of a form field, as text.
pub(crate) fn input_value(dom: &dyn Dom, node: NodeId) -> String {
    dom.get_property(node, "value")
        .map(|v| v.as_text())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_at_skips_positioned_node() {
        let host = MemoryHost::new();
        let parent = host.create_element("div");
        let a = host.create_text("a");
        let b = host.create_text("b");
        host.insert_before(parent, a, None);
        host.insert_before(parent, b, None);
        host.clear_mutations();

        insert_at(&host, parent, Some(b), a);
        insert_at(&host, parent, None, b);
        assert!(host.mutations().is_empty());

        insert_at(&host, parent, Some(a), b);
        assert_eq!(host.children(parent), vec![b, a]);
    }

    #[test]
    fn test_remove_node_checks_parent() {
        let host = MemoryHost::new();
        let p1 = host.create_element("div");
        let p2 = host.create_element("div");
        let a = host.create_text("a");
        host.insert_before(p1, a, None);

        remove_node(&host, p2, a);
        assert_eq!(host.parent(a), Some(p1));
        remove_node(&host, p1, a);
        assert_eq!(host.parent(a), None);
    }

    #[test]
    fn test_prop_value_conversions() {
        assert_eq!(PropValue::from("x").as_text(), "x");
        assert_eq!(PropValue::from(true).as_bool(), Some(true));
        assert_eq!(PropValue::from(1.5).as_text(), "1.5");
    }
}
