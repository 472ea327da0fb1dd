//! Dynamic attribute nodes.
//!
//! An attribute node binds a View to a DOM write. Pulling
//! [`AttrNode::changed`] records the latest value and marks the node dirty;
//! [`AttrNode::sync`] writes it during the next reconciliation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::animation::{An, Anim, Trans};
use crate::dom::{Dom, NodeId};
use crate::reactive::View;

/// Writes a value to an element.
pub type PushFn<T> = Rc<dyn Fn(&Rc<dyn Dom>, NodeId, &T)>;

/// Runtime side of a dynamic attribute.
pub trait AttrNode {
    /// Change signal; pulling it records the current value.
    fn changed(&self) -> View<()>;

    fn change_anim(&self, _dom: &Rc<dyn Dom>, _el: NodeId) -> An {
        An::empty()
    }

    fn enter_anim(&self, _dom: &Rc<dyn Dom>, _el: NodeId) -> An {
        An::empty()
    }

    fn exit_anim(&self, _dom: &Rc<dyn Dom>, _el: NodeId) -> An {
        An::empty()
    }

    /// Write the recorded value if it changed since the last sync.
    fn sync(&self, dom: &Rc<dyn Dom>, el: NodeId);
}

// =============================================================================
// DynamicAttrNode
// =============================================================================

struct DynamicState<T> {
    value: RefCell<Option<T>>,
    dirty: Cell<bool>,
}

/// Pushes the latest value on sync.
pub struct DynamicAttrNode<T> {
    state: Rc<DynamicState<T>>,
    push: PushFn<T>,
    updates: View<()>,
}

impl<T: Clone + 'static> DynamicAttrNode<T> {
    pub fn new(view: &View<T>, push: impl Fn(&Rc<dyn Dom>, NodeId, &T) + 'static) -> Self {
        let state = Rc::new(DynamicState {
            value: RefCell::new(None),
            dirty: Cell::new(false),
        });
        let s = state.clone();
        let updates = view.map(move |x| {
            *s.value.borrow_mut() = Some(x.clone());
            s.dirty.set(true);
        });
        Self {
            state,
            push: Rc::new(push),
            updates,
        }
    }
}

impl<T: Clone + 'static> AttrNode for DynamicAttrNode<T> {
    fn changed(&self) -> View<()> {
        self.updates.clone()
    }

    fn sync(&self, dom: &Rc<dyn Dom>, el: NodeId) {
        if !self.state.dirty.replace(false) {
            return;
        }
        let value = self.state.value.borrow().clone();
        if let Some(v) = value {
            (self.push)(dom, el, &v);
        }
    }
}

// =============================================================================
// AnimatedAttrNode
// =============================================================================

struct AnimatedState<T> {
    /// Latest value from the View.
    logical: RefCell<Option<T>>,
    /// Value last written to the element.
    visible: RefCell<Option<T>>,
    dirty: Cell<bool>,
}

/// Animates between the visible and the logical value using a [`Trans`].
pub struct AnimatedAttrNode<T> {
    trans: Trans<T>,
    state: Rc<AnimatedState<T>>,
    push: PushFn<T>,
    updates: View<()>,
}

impl<T: Clone + 'static> AnimatedAttrNode<T> {
    pub fn new(
        trans: Trans<T>,
        view: &View<T>,
        push: impl Fn(&Rc<dyn Dom>, NodeId, &T) + 'static,
    ) -> Self {
        let state = Rc::new(AnimatedState {
            logical: RefCell::new(None),
            visible: RefCell::new(None),
            dirty: Cell::new(true),
        });
        let s = state.clone();
        let updates = view.map(move |x| {
            *s.logical.borrow_mut() = Some(x.clone());
            s.dirty.set(true);
        });
        Self {
            trans,
            state,
            push: Rc::new(push),
            updates,
        }
    }

    fn sync_state(state: &AnimatedState<T>, push: &PushFn<T>, dom: &Rc<dyn Dom>, el: NodeId) {
        if !state.dirty.get() {
            return;
        }
        let logical = state.logical.borrow().clone();
        if let Some(v) = &logical {
            push(dom, el, v);
        }
        *state.visible.borrow_mut() = logical;
        state.dirty.set(false);
    }

    /// Settle on the logical value once the animation list is done.
    fn settle(&self, an: An, dom: &Rc<dyn Dom>, el: NodeId) -> An {
        let (state, push, dom) = (self.state.clone(), self.push.clone(), dom.clone());
        an.when_done(move || Self::sync_state(&state, &push, &dom, el))
    }

    fn animate(&self, anim: Anim<T>, dom: &Rc<dyn Dom>, el: NodeId) -> An {
        let (state, push, d) = (self.state.clone(), self.push.clone(), dom.clone());
        let action = anim.map(move |v| {
            *state.visible.borrow_mut() = Some(v.clone());
            state.dirty.set(true);
            push(&d, el, &v);
        });
        self.settle(An::pack(action), dom, el)
    }

    fn snapshot(&self) -> (Option<T>, Option<T>, bool) {
        (
            self.state.visible.borrow().clone(),
            self.state.logical.borrow().clone(),
            self.state.dirty.get(),
        )
    }
}

impl<T: Clone + 'static> AttrNode for AnimatedAttrNode<T> {
    fn changed(&self) -> View<()> {
        self.updates.clone()
    }

    fn change_anim(&self, dom: &Rc<dyn Dom>, el: NodeId) -> An {
        match self.snapshot() {
            (Some(v), Some(l), true) => self.animate(self.trans.animate_change(&v, &l), dom, el),
            _ => self.settle(An::empty(), dom, el),
        }
    }

    fn enter_anim(&self, dom: &Rc<dyn Dom>, el: NodeId) -> An {
        match self.snapshot() {
            (Some(v), Some(l), true) => self.animate(self.trans.animate_change(&v, &l), dom, el),
            (None, Some(l), _) => self.animate(self.trans.animate_enter(&l), dom, el),
            _ => self.settle(An::empty(), dom, el),
        }
    }

    fn exit_anim(&self, dom: &Rc<dyn Dom>, el: NodeId) -> An {
        match self.snapshot() {
            (Some(cur), _, _) => self.animate(self.trans.animate_exit(&cur), dom, el),
            _ => An::empty(),
        }
    }

    fn sync(&self, dom: &Rc<dyn Dom>, el: NodeId) {
        Self::sync_state(&self.state, &self.push, dom, el);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{DoubleInterpolation, Easing};
    use crate::dom::MemoryHost;
    use crate::reactive::Var;

    #[test]
    fn test_dynamic_node_pushes_once_per_change() {
        let host = MemoryHost::new();
        let dom = host.dom();
        let el = host.create_element("div");
        let var = Var::create("a".to_string());
        let node = DynamicAttrNode::new(&var.view(), |dom: &Rc<dyn Dom>, el, v: &String| {
            dom.set_attribute(el, "title", v)
        });

        node.changed().snap();
        node.sync(&dom, el);
        assert_eq!(host.get_attribute(el, "title").as_deref(), Some("a"));

        host.clear_mutations();
        node.sync(&dom, el);
        assert!(host.mutations().is_empty());

        var.set("b".to_string());
        node.changed().snap();
        node.sync(&dom, el);
        assert_eq!(host.get_attribute(el, "title").as_deref(), Some("b"));
    }

    #[test]
    fn test_animated_node_change_anim() {
        let host = MemoryHost::new();
        let dom = host.dom();
        let el = host.create_element("div");
        let var = Var::create(0.0);
        let trans = Trans::create(|a: &f64, b: &f64| {
            Anim::simple(DoubleInterpolation, Easing::linear(), 100.0, *a, *b)
        });
        let node = AnimatedAttrNode::new(trans, &var.view(), |dom: &Rc<dyn Dom>, el, v: &f64| {
            dom.set_attribute(el, "x", &v.to_string())
        });

        node.changed().snap();
        node.sync(&dom, el);
        assert_eq!(host.get_attribute(el, "x").as_deref(), Some("0"));

        var.set(10.0);
        node.changed().snap();
        let an = node.change_anim(&dom, el);
        let action = an.actions();
        assert_eq!(action.duration(), 100.0);
        action.compute(50.0);
        assert_eq!(host.get_attribute(el, "x").as_deref(), Some("5"));
        an.finalize();
        assert_eq!(host.get_attribute(el, "x").as_deref(), Some("10"));
    }
}
