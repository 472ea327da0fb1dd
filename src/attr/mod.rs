//! Element attributes.
//!
//! An [`Attr`] is a persistent description of what to do to an element:
//! static effects applied once at insertion, dynamic nodes re-synced when
//! their View changes, and callbacks run after the first render.
//!
//! - [`Attr`] - attribute trees and their constructors
//! - [`AttrNode`] - runtime side of a dynamic attribute
//! - [`Dyn`] - the attributes of one live element
//! - input bindings (`value`, `checked`, `int_value`, ...) in [`input`]

pub mod dyn_attr;
pub mod input;
pub mod node;

use std::fmt;
use std::rc::Rc;

use crate::animation::Trans;
use crate::doc::RenderCallback;
use crate::dom::{Dom, DomEvent, NodeId, PropValue};
use crate::reactive::View;
use crate::types::{AnimFlags, tree_reduce};

pub use dyn_attr::Dyn;
pub use node::{AnimatedAttrNode, AttrNode, DynamicAttrNode, PushFn};

/// Effect applied once to a freshly inserted element.
pub type AttrEffect = Rc<dyn Fn(&Rc<dyn Dom>, NodeId)>;

// =============================================================================
// Attr
// =============================================================================

#[derive(Clone, Default)]
pub enum Attr {
    #[default]
    Empty,
    Static(AttrEffect),
    Dynamic(Rc<dyn AttrNode>, AnimFlags),
    /// Both sides, with their flags OR-ed.
    Append(Rc<Attr>, Rc<Attr>, AnimFlags),
    OnAfterRender(RenderCallback),
}

impl fmt::Debug for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Empty => f.write_str("Empty"),
            Attr::Static(_) => f.write_str("Static"),
            Attr::Dynamic(_, flags) => f.debug_tuple("Dynamic").field(flags).finish(),
            Attr::Append(a, b, flags) => {
                f.debug_tuple("Append").field(a).field(b).field(flags).finish()
            }
            Attr::OnAfterRender(_) => f.write_str("OnAfterRender"),
        }
    }
}

impl Attr {
    pub fn flags(&self) -> AnimFlags {
        match self {
            Attr::Dynamic(_, flags) | Attr::Append(_, _, flags) => *flags,
            _ => AnimFlags::empty(),
        }
    }

    pub fn append(&self, other: &Attr) -> Attr {
        match (self, other) {
            (Attr::Empty, x) | (x, Attr::Empty) => x.clone(),
            (a, b) => Attr::Append(Rc::new(a.clone()), Rc::new(b.clone()), a.flags() | b.flags()),
        }
    }

    pub fn concat(attrs: impl IntoIterator<Item = Attr>) -> Attr {
        let attrs: Vec<Attr> = attrs.into_iter().collect();
        tree_reduce(Attr::Empty, &attrs, &Attr::append)
    }

    // -------------------------------------------------------------------------
    // Static
    // -------------------------------------------------------------------------

    /// Set a markup attribute once.
    pub fn create(name: &str, value: &str) -> Attr {
        let (name, value) = (name.to_string(), value.to_string());
        Attr::Static(Rc::new(move |dom: &Rc<dyn Dom>, el: NodeId| {
            dom.set_attribute(el, &name, &value)
        }))
    }

    /// Add `class` when `is_set`.
    pub fn class_pred(class: &str, is_set: bool) -> Attr {
        let class = class.to_string();
        Attr::Static(Rc::new(move |dom: &Rc<dyn Dom>, el: NodeId| {
            if is_set {
                dom.add_class(el, &class);
            }
        }))
    }

    /// Listen for `event` on the element.
    pub fn handler(event: &str, f: impl Fn(NodeId, &DomEvent) + 'static) -> Attr {
        let event = event.to_string();
        let f: Rc<dyn Fn(NodeId, &DomEvent)> = Rc::new(f);
        Attr::Static(Rc::new(move |dom: &Rc<dyn Dom>, el: NodeId| {
            let f = f.clone();
            dom.add_event_listener(el, &event, Rc::new(move |ev: &DomEvent| f(el, ev)));
        }))
    }

    /// Listen for `event` with access to the host, for reading element
    /// state back.
    pub(crate) fn element_handler(event: &str, f: impl Fn(&Rc<dyn Dom>, NodeId) + 'static) -> Attr {
        let event = event.to_string();
        let f: Rc<dyn Fn(&Rc<dyn Dom>, NodeId)> = Rc::new(f);
        Attr::Static(Rc::new(move |dom: &Rc<dyn Dom>, el: NodeId| {
            let (f, host) = (f.clone(), dom.clone());
            dom.add_event_listener(el, &event, Rc::new(move |_: &DomEvent| f(&host, el)));
        }))
    }

    /// Run `f` with the element after its first sync.
    pub fn on_after_render(f: impl Fn(NodeId) + 'static) -> Attr {
        Attr::OnAfterRender(Rc::new(f))
    }

    // -------------------------------------------------------------------------
    // Dynamic
    // -------------------------------------------------------------------------

    /// Push every value with `push`.
    pub fn dynamic_custom<T: Clone + 'static>(
        view: &View<T>,
        push: impl Fn(&Rc<dyn Dom>, NodeId, &T) + 'static,
    ) -> Attr {
        Attr::Dynamic(Rc::new(DynamicAttrNode::new(view, push)), AnimFlags::empty())
    }

    /// Markup attribute following a View.
    pub fn dynamic(name: &str, view: &View<String>) -> Attr {
        let name = name.to_string();
        Attr::dynamic_custom(view, move |dom, el, v: &String| dom.set_attribute(el, &name, v))
    }

    /// Element property following a View.
    pub fn dynamic_prop(name: &str, view: &View<PropValue>) -> Attr {
        let name = name.to_string();
        Attr::dynamic_custom(view, move |dom, el, v: &PropValue| {
            dom.set_property(el, &name, v.clone())
        })
    }

    /// Toggle `class` with a View.
    pub fn dynamic_class_pred(class: &str, view: &View<bool>) -> Attr {
        let class = class.to_string();
        Attr::dynamic_custom(view, move |dom, el, on: &bool| {
            if *on {
                dom.add_class(el, &class);
            } else {
                dom.remove_class(el, &class);
            }
        })
    }

    /// Markup attribute animated by `trans` between rendered values.
    pub fn animated<T: Clone + 'static>(
        name: &str,
        trans: Trans<T>,
        view: &View<T>,
        render: impl Fn(&T) -> String + 'static,
    ) -> Attr {
        let name = name.to_string();
        let flags = trans.flags();
        let node = AnimatedAttrNode::new(trans, view, move |dom, el, v: &T| {
            dom.set_attribute(el, &name, &render(v))
        });
        Attr::Dynamic(Rc::new(node), flags)
    }
}
