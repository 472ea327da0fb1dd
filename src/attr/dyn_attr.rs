//! Attributes installed on a live element.

use std::fmt;
use std::rc::Rc;

use super::{Attr, AttrNode};
use crate::animation::An;
use crate::doc::RenderCallback;
use crate::dom::{Dom, NodeId};
use crate::reactive::View;
use crate::types::{AnimFlags, tree_reduce};

/// The dynamic part of an element's attributes after insertion.
///
/// Static attributes are applied once by [`Dyn::insert`] and leave nothing
/// behind. What remains is the list of dynamic nodes, their combined
/// animation flags and the pending after-render callbacks.
#[derive(Clone)]
pub struct Dyn {
    elem: NodeId,
    flags: AnimFlags,
    nodes: Rc<[Rc<dyn AttrNode>]>,
    on_after_render: Rc<[RenderCallback]>,
}

impl fmt::Debug for Dyn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dyn")
            .field("elem", &self.elem)
            .field("flags", &self.flags)
            .field("nodes", &self.nodes.len())
            .field("on_after_render", &self.on_after_render.len())
            .finish()
    }
}

impl Dyn {
    /// No attributes on `elem`.
    pub fn empty(elem: NodeId) -> Self {
        Self {
            elem,
            flags: AnimFlags::empty(),
            nodes: Rc::from(Vec::new()),
            on_after_render: Rc::from(Vec::new()),
        }
    }

    /// Apply the static parts of `tree` to `elem` and collect the rest.
    pub fn insert(dom: &Rc<dyn Dom>, elem: NodeId, tree: &Attr) -> Self {
        let mut nodes = Vec::new();
        let mut render = Vec::new();
        collect(dom, elem, tree, &mut nodes, &mut render);
        Self {
            elem,
            flags: tree.flags(),
            nodes: Rc::from(nodes),
            on_after_render: Rc::from(render),
        }
    }

    pub fn element(&self) -> NodeId {
        self.elem
    }

    pub fn flags(&self) -> AnimFlags {
        self.flags
    }

    pub fn has_change_anim(&self) -> bool {
        self.flags.contains(AnimFlags::CHANGE)
    }

    pub fn has_enter_anim(&self) -> bool {
        self.flags.contains(AnimFlags::ENTER)
    }

    pub fn has_exit_anim(&self) -> bool {
        self.flags.contains(AnimFlags::EXIT)
    }

    pub fn change_anim(&self, dom: &Rc<dyn Dom>) -> An {
        An::concat(self.nodes.iter().map(|n| n.change_anim(dom, self.elem)))
    }

    pub fn enter_anim(&self, dom: &Rc<dyn Dom>) -> An {
        An::concat(self.nodes.iter().map(|n| n.enter_anim(dom, self.elem)))
    }

    pub fn exit_anim(&self, dom: &Rc<dyn Dom>) -> An {
        An::concat(self.nodes.iter().map(|n| n.exit_anim(dom, self.elem)))
    }

    /// Combined change signal of all dynamic nodes.
    pub fn updates(&self) -> View<()> {
        let changes: Vec<View<()>> = self.nodes.iter().map(|n| n.changed()).collect();
        tree_reduce(View::constant(()), &changes, &View::map2_unit)
    }

    /// Write every dirty node.
    pub fn sync(&self, dom: &Rc<dyn Dom>) {
        for node in self.nodes.iter() {
            node.sync(dom, self.elem);
        }
    }

    /// The after-render callbacks, if any.
    pub(crate) fn on_after_render(&self) -> Option<Vec<RenderCallback>> {
        if self.on_after_render.is_empty() {
            None
        } else {
            Some(self.on_after_render.to_vec())
        }
    }
}

fn collect(
    dom: &Rc<dyn Dom>,
    elem: NodeId,
    tree: &Attr,
    nodes: &mut Vec<Rc<dyn AttrNode>>,
    render: &mut Vec<RenderCallback>,
) {
    match tree {
        Attr::Empty => {}
        Attr::Static(apply) => apply(dom, elem),
        Attr::Dynamic(node, _) => nodes.push(node.clone()),
        Attr::Append(a, b, _) => {
            collect(dom, elem, a, nodes, render);
            collect(dom, elem, b, nodes, render);
        }
        Attr::OnAfterRender(f) => render.push(f.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryHost;
    use crate::reactive::{SnapKind, Var};

    #[test]
    fn test_insert_applies_static_and_keeps_dynamic() {
        let host = MemoryHost::new();
        let dom = host.dom();
        let el = host.create_element("div");
        let title = Var::create("t1".to_string());
        let attr = Attr::concat([
            Attr::create("id", "main"),
            Attr::dynamic("title", &title.view()),
            Attr::on_after_render(|_| ()),
        ]);

        let d = Dyn::insert(&dom, el, &attr);
        assert_eq!(host.get_attribute(el, "id").as_deref(), Some("main"));
        assert_eq!(host.get_attribute(el, "title"), None);
        assert!(d.on_after_render().is_some());
        assert!(d.flags().is_empty());

        d.updates().snap();
        d.sync(&dom);
        assert_eq!(host.get_attribute(el, "title").as_deref(), Some("t1"));
    }

    #[test]
    fn test_static_only_updates_are_forever() {
        let host = MemoryHost::new();
        let el = host.create_element("div");
        let d = Dyn::insert(&host.dom(), el, &Attr::create("id", "x"));
        assert_eq!(d.updates().snap().kind(), SnapKind::Forever);
        assert!(d.on_after_render().is_none());
    }
}
