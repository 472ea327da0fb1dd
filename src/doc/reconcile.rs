//! Incremental reconciliation of a [`DocNode`] tree against the host.
//!
//! ```text
//! find_all ─▶ change ++ exit anims ─▶ play ─▶ sync on next frame ─▶ enter anims ─▶ play
//!                                                  │
//!                          sync_elem_node ◀────────┘
//!                            ├─ attrs sync
//!                            ├─ do_sync_element (remove stale, insert right to left)
//!                            ├─ children sync
//!                            └─ after_render (once)
//! ```
//!
//! Only `CurrentDyn` nodes change structure, so a pass only moves nodes
//! under embeds that were marked dirty since the previous pass.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::node::{DocElemNode, DocNode, DocTreeNode, TreeItem};
use super::node_set::NodeSet;
use crate::animation::An;
use crate::attr::{Attr, Dyn};
use crate::concurrency::{Async, Continuations};
use crate::dom::{Dom, DomNodes, NodeId, insert_at, remove_node};
use crate::error::{Error, Result};
use crate::pipeline::Runtime;

// =============================================================================
// Run state
// =============================================================================

/// Per mount point: the root element and the elements seen by the last pass.
#[derive(Debug)]
pub struct RunState {
    pub(crate) previous_nodes: RefCell<NodeSet>,
    pub(crate) top: DocElemNode,
}

impl RunState {
    pub fn top(&self) -> &DocElemNode {
        &self.top
    }
}

/// Run state owning the children of `parent`.
pub fn create_run_state(dom: &Rc<dyn Dom>, parent: NodeId, doc: DocNode) -> RunState {
    RunState {
        previous_nodes: RefCell::new(NodeSet::empty()),
        top: create_elem_node(dom, parent, &Attr::Empty, doc),
    }
}

/// Run state owning the nodes strictly between two sibling markers.
pub fn create_delimited_run_state(
    dom: &Rc<dyn Dom>,
    ldelim: NodeId,
    rdelim: NodeId,
    doc: DocNode,
) -> Result<RunState> {
    Ok(RunState {
        previous_nodes: RefCell::new(NodeSet::empty()),
        top: create_delimited_elem_node(dom, ldelim, rdelim, &Attr::Empty, doc)?,
    })
}

// =============================================================================
// Element nodes
// =============================================================================

/// Put `children` under `el`, install `attr` and wrap the result.
pub fn create_elem_node(dom: &Rc<dyn Dom>, el: NodeId, attr: &Attr, children: DocNode) -> DocElemNode {
    link_element(&**dom, el, &children);
    let attr = Dyn::insert(dom, el, attr);
    DocElemNode::new(attr, children, None, el)
}

/// Like [`create_elem_node`], but the children live between `ldelim` and
/// `rdelim` inside their common parent.
pub fn create_delimited_elem_node(
    dom: &Rc<dyn Dom>,
    ldelim: NodeId,
    rdelim: NodeId,
    attr: &Attr,
    children: DocNode,
) -> Result<DocElemNode> {
    let el = dom.parent(ldelim).ok_or(Error::Detached(ldelim))?;
    link_prev_element(&**dom, rdelim, &children)?;
    let attr = Dyn::insert(dom, el, attr);
    Ok(DocElemNode::new(attr, children, Some((ldelim, rdelim)), el))
}

// =============================================================================
// Animated update
// =============================================================================

/// One reconciliation pass, as a reusable computation.
///
/// With animations on: play change and exit animations, sync the DOM, play
/// enter animations, then remember the current elements for the next pass.
pub fn perform_animated_update(rt: &Runtime, st: Rc<RunState>, doc: DocNode) -> Async<()> {
    if !rt.config().use_animations {
        return sync_elem_nodes_next_frame(rt, st);
    }
    let rt = rt.clone();
    Async::delay(move || {
        let dom = rt.dom();
        let cur = NodeSet::find_all(&doc);
        let change = compute_change_anim(dom, &st, &cur);
        let enter = compute_enter_anim(dom, &st, &cur);
        let exit = compute_exit_anim(dom, &st, &cur);
        debug!(elements = cur.len(), "reconciliation pass");

        let (rt, st) = (rt.clone(), st.clone());
        change.append(&exit).play(rt.event_loop()).bind(move |()| {
            let (rt, st, enter, cur) = (rt.clone(), st.clone(), enter.clone(), cur.clone());
            sync_elem_nodes_next_frame(&rt, st.clone()).bind(move |()| {
                let (st, cur) = (st.clone(), cur.clone());
                enter.play(rt.event_loop()).map(move |()| {
                    *st.previous_nodes.borrow_mut() = cur.clone();
                })
            })
        })
    })
}

/// Sync the whole mount point, on the next animation frame when updates
/// are batched.
pub fn sync_elem_nodes_next_frame(rt: &Runtime, st: Rc<RunState>) -> Async<()> {
    let rt = rt.clone();
    if rt.config().batch_updates {
        Async::from_continuations(move |k: Continuations<()>| {
            let (dom, top) = (rt.dom().clone(), st.top.clone());
            rt.event_loop().request_animation_frame(Box::new(move |_| {
                sync_elem_node(&dom, &top);
                k.ok(());
            }));
        })
    } else {
        Async::delay(move || {
            sync_elem_node(rt.dom(), &st.top);
            Async::zero()
        })
    }
}

pub fn compute_change_anim(dom: &Rc<dyn Dom>, st: &RunState, cur: &NodeSet) -> An {
    let relevant = |set: &NodeSet| set.filter(|n| n.attr().has_change_anim());
    let both = relevant(&*st.previous_nodes.borrow()).intersect(&relevant(cur));
    An::concat(both.to_vec().iter().map(|n| n.attr().change_anim(dom)))
}

pub fn compute_enter_anim(dom: &Rc<dyn Dom>, st: &RunState, cur: &NodeSet) -> An {
    let entering = cur
        .filter(|n| n.attr().has_enter_anim())
        .except(&st.previous_nodes.borrow());
    An::concat(entering.to_vec().iter().map(|n| n.attr().enter_anim(dom)))
}

pub fn compute_exit_anim(dom: &Rc<dyn Dom>, st: &RunState, cur: &NodeSet) -> An {
    let exiting = st
        .previous_nodes
        .borrow()
        .filter(|n| n.attr().has_exit_anim())
        .except(cur);
    An::concat(exiting.to_vec().iter().map(|n| n.attr().exit_anim(dom)))
}

// =============================================================================
// Sync
// =============================================================================

/// Sync an element, then its children, then run its after-render callbacks.
pub fn sync_elem_node(dom: &Rc<dyn Dom>, el: &DocElemNode) {
    sync_element(dom, el);
    sync(dom, el.children());
    after_render(el);
}

/// Sync the element's attributes, and its child list when some embed below
/// it changed.
pub fn sync_element(dom: &Rc<dyn Dom>, el: &DocElemNode) {
    el.attr().sync(dom);
    if has_dirty_children(el) {
        do_sync_element(&**dom, el);
    }
}

fn has_dirty_children(el: &DocElemNode) -> bool {
    fn dirty(doc: &DocNode) -> bool {
        match doc {
            DocNode::Append(a, b) => dirty(a) || dirty(b),
            DocNode::CurrentDyn(d) => d.dirty.get() || dirty(&d.current.borrow()),
            DocNode::TemplateTree(t) => {
                t.dirty.get()
                    || t.holes.iter().any(has_dirty_children)
                    || t.els.iter().any(|item| matches!(item, TreeItem::Doc(d) if dirty(d)))
            }
            _ => false,
        }
    }
    dirty(el.children())
}

/// Sync every node below `doc`.
pub fn sync(dom: &Rc<dyn Dom>, doc: &DocNode) {
    match doc {
        DocNode::Elem(el) => sync_elem_node(dom, el),
        DocNode::CurrentDyn(d) => {
            let current = d.current.borrow().clone();
            sync(dom, &current);
        }
        DocNode::Text(t) => {
            if t.dirty.replace(false) {
                dom.set_text(t.text, &t.value.borrow());
            }
        }
        DocNode::TemplateTree(t) => {
            for item in &t.els {
                if let TreeItem::Doc(d) = item {
                    sync(dom, d);
                }
            }
            for hole in &t.holes {
                sync_elem_node(dom, hole);
            }
            for (_, attr) in &t.attrs {
                attr.sync(dom);
            }
            after_render_tree(t);
        }
        DocNode::Append(a, b) => {
            sync(dom, a);
            sync(dom, b);
        }
        DocNode::Empty | DocNode::StaticDomNode(_) => {}
    }
}

/// Run the after-render callbacks of `el`, once.
pub fn after_render(el: &DocElemNode) {
    let callbacks = el.0.render.borrow_mut().take();
    for f in callbacks.into_iter().flatten() {
        f(el.element());
    }
}

fn after_render_tree(t: &DocTreeNode) {
    let callbacks = t.render.borrow_mut().take();
    if let Some(first) = t.first_node() {
        for f in callbacks.into_iter().flatten() {
            f(first);
        }
    }
}

/// Patch the child list of `el`: drop host nodes that are no longer
/// wanted, then walk the children right to left so that nodes already in
/// place are left alone.
pub fn do_sync_element(dom: &dyn Dom, el: &DocElemNode) {
    let parent = el.element();
    let desired = DomNodes::doc_children(el);
    let actual = DomNodes::children(dom, parent, el.delimiters());
    let stale = actual.except(&desired);
    if !stale.is_empty() {
        debug!(parent = parent.0, removed = stale.len(), "removing stale nodes");
    }
    for node in stale.iter() {
        remove_node(dom, parent, node);
    }

    fn ins(dom: &dyn Dom, parent: NodeId, doc: &DocNode, pos: Option<NodeId>) -> Option<NodeId> {
        match doc {
            DocNode::Elem(e) => Some(e.element()),
            DocNode::CurrentDyn(d) => {
                let current = d.current.borrow().clone();
                if d.dirty.replace(false) {
                    insert_doc(dom, parent, &current, pos)
                } else {
                    ins(dom, parent, &current, pos)
                }
            }
            DocNode::Empty => pos,
            DocNode::Text(t) => Some(t.text),
            DocNode::StaticDomNode(n) => Some(*n),
            DocNode::TemplateTree(t) => {
                t.dirty.set(false);
                t.els.iter().rev().fold(pos, |pos, item| match item {
                    TreeItem::Node(n) => Some(*n),
                    TreeItem::Doc(d) => ins(dom, parent, d, pos),
                })
            }
            DocNode::Append(a, b) => {
                let pos = ins(dom, parent, b, pos);
                ins(dom, parent, a, pos)
            }
        }
    }

    ins(dom, parent, el.children(), el.delimiters().map(|(_, end)| end));
}

// =============================================================================
// Insertion
// =============================================================================

/// Insert every host node of `doc` before `pos`, right to left. Returns
/// the new insertion point: the first node of `doc`, or `pos` if it has
/// none.
pub fn insert_doc(dom: &dyn Dom, parent: NodeId, doc: &DocNode, pos: Option<NodeId>) -> Option<NodeId> {
    match doc {
        DocNode::Elem(e) => insert_node(dom, parent, e.element(), pos),
        DocNode::CurrentDyn(d) => {
            d.dirty.set(false);
            let current = d.current.borrow().clone();
            insert_doc(dom, parent, &current, pos)
        }
        DocNode::Empty => pos,
        DocNode::Text(t) => insert_node(dom, parent, t.text, pos),
        DocNode::StaticDomNode(n) => insert_node(dom, parent, *n, pos),
        DocNode::TemplateTree(t) => t.els.iter().rev().fold(pos, |pos, item| match item {
            TreeItem::Node(n) => insert_node(dom, parent, *n, pos),
            TreeItem::Doc(d) => insert_doc(dom, parent, d, pos),
        }),
        DocNode::Append(a, b) => {
            let pos = insert_doc(dom, parent, b, pos);
            insert_doc(dom, parent, a, pos)
        }
    }
}

pub fn insert_node(dom: &dyn Dom, parent: NodeId, node: NodeId, pos: Option<NodeId>) -> Option<NodeId> {
    insert_at(dom, parent, pos, node);
    Some(node)
}

/// Append the host nodes of `children` to `el`.
pub fn link_element(dom: &dyn Dom, el: NodeId, children: &DocNode) {
    insert_doc(dom, el, children, None);
}

/// Insert the host nodes of `children` right before `el`.
pub fn link_prev_element(dom: &dyn Dom, el: NodeId, children: &DocNode) -> Result<()> {
    let parent = dom.parent(el).ok_or(Error::Detached(el))?;
    insert_doc(dom, parent, children, Some(el));
    Ok(())
}

/// Insert `doc` before `after_delim`, preceded by a fresh empty marker.
/// Returns the marker.
pub fn insert_before_delim(dom: &dyn Dom, after_delim: NodeId, doc: &DocNode) -> Result<NodeId> {
    let parent = dom.parent(after_delim).ok_or(Error::Detached(after_delim))?;
    let before = dom.create_text("");
    dom.insert_before(parent, before, Some(after_delim));
    link_prev_element(dom, after_delim, doc)?;
    Ok(before)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::node::{DocEmbedNode, DocTextNode};
    use crate::dom::{MemoryHost, Mutation};
    use std::cell::Cell;

    fn text(host: &MemoryHost, s: &str) -> DocNode {
        DocNode::StaticDomNode(host.create_text(s))
    }

    fn append(a: DocNode, b: DocNode) -> DocNode {
        DocNode::Append(Rc::new(a), Rc::new(b))
    }

    #[test]
    fn test_create_elem_node_links_children_in_order() {
        let host = MemoryHost::new();
        let dom = host.dom();
        let el = host.create_element("div");
        let node = create_elem_node(&dom, el, &Attr::Empty, append(text(&host, "a"), text(&host, "b")));
        assert_eq!(host.text_content(el), "ab");
        assert_eq!(node.element(), el);
    }

    #[test]
    fn test_dirty_text_is_written_once() {
        let host = MemoryHost::new();
        let dom = host.dom();
        let el = host.create_element("p");
        let t = Rc::new(DocTextNode::new(host.create_text("")));
        let node = create_elem_node(&dom, el, &Attr::Empty, DocNode::Text(t.clone()));

        t.update("hi");
        host.clear_mutations();
        sync_elem_node(&dom, &node);
        assert_eq!(host.mutations(), vec![Mutation::SetText(t.node(), "hi".to_string())]);

        host.clear_mutations();
        sync_elem_node(&dom, &node);
        assert!(host.mutations().is_empty());
    }

    #[test]
    fn test_embed_swap_removes_and_inserts() {
        let host = MemoryHost::new();
        let dom = host.dom();
        let el = host.create_element("ul");
        let embed = Rc::new(DocEmbedNode::default());
        let tail = text(&host, "!");
        let node = create_elem_node(&dom, el, &Attr::Empty, append(DocNode::CurrentDyn(embed.clone()), tail));

        embed.update(append(text(&host, "x"), text(&host, "y")));
        sync_elem_node(&dom, &node);
        assert_eq!(host.text_content(el), "xy!");
        assert!(!embed.dirty.get());

        embed.update(text(&host, "z"));
        sync_elem_node(&dom, &node);
        assert_eq!(host.text_content(el), "z!");
        assert_eq!(host.children(el).len(), 2);
    }

    #[test]
    fn test_reorder_moves_only_what_changed_place() {
        let host = MemoryHost::new();
        let dom = host.dom();
        let el = host.create_element("ul");
        let (a, b, c) = (host.create_text("a"), host.create_text("b"), host.create_text("c"));
        let list = |ids: [NodeId; 3]| {
            let [x, y, z] = ids.map(DocNode::StaticDomNode);
            append(x, append(y, z))
        };
        let embed = Rc::new(DocEmbedNode::default());
        embed.update(list([a, b, c]));
        let node = create_elem_node(&dom, el, &Attr::Empty, DocNode::CurrentDyn(embed.clone()));
        assert_eq!(host.text_content(el), "abc");

        embed.update(list([a, c, b]));
        host.clear_mutations();
        sync_elem_node(&dom, &node);
        assert_eq!(host.text_content(el), "acb");
        // Walking right to left, `b` goes to the end; `c` and `a` are then in place.
        assert_eq!(
            host.mutations(),
            vec![Mutation::InsertBefore { parent: el, node: b, before: None }]
        );
    }

    #[test]
    fn test_after_render_runs_once() {
        let host = MemoryHost::new();
        let dom = host.dom();
        let el = host.create_element("div");
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let attr = Attr::on_after_render(move |_| c.set(c.get() + 1));
        let node = create_elem_node(&dom, el, &attr, DocNode::Empty);
        sync_elem_node(&dom, &node);
        sync_elem_node(&dom, &node);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_delimited_node_keeps_outside_content() {
        let host = MemoryHost::new();
        let dom = host.dom();
        let parent = host.create_element("div");
        let before = host.create_text("<");
        let end = host.create_text("");
        let after = host.create_text(">");
        for n in [before, end, after] {
            host.insert_before(parent, n, None);
        }

        let embed = Rc::new(DocEmbedNode::default());
        let start = insert_before_delim(&*dom, end, &DocNode::CurrentDyn(embed.clone())).unwrap();
        let node = create_delimited_elem_node(&dom, start, end, &Attr::Empty, DocNode::CurrentDyn(embed.clone()))
            .unwrap();
        assert_eq!(node.element(), parent);

        embed.update(text(&host, "1"));
        sync_elem_node(&dom, &node);
        assert_eq!(host.text_content(parent), "<1>");

        embed.update(text(&host, "2"));
        sync_elem_node(&dom, &node);
        assert_eq!(host.text_content(parent), "<2>");
    }

    #[test]
    fn test_detached_delimiter_is_an_error() {
        let host = MemoryHost::new();
        let lone = host.create_text("");
        let err = insert_before_delim(&host, lone, &DocNode::Empty).unwrap_err();
        assert_eq!(err, Error::Detached(lone));
    }
}
