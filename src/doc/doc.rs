//! The public document API.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::node::{DocEmbedNode, DocNode, DocTextNode, DocTreeNode, RenderCallback, TreeItem};
use super::reconcile::create_elem_node;
use crate::attr::{Attr, Dyn};
use crate::dom::NodeId;
use crate::error::Result;
use crate::pipeline::{MountHandle, Runtime, mount};
use crate::reactive::View;
use crate::types::tree_reduce;

/// A document fragment together with its change signal.
///
/// Host nodes are created when the Doc is built; mounting attaches them
/// and keeps them in sync with `updates`.
#[derive(Clone)]
pub struct Doc {
    pub(crate) node: DocNode,
    pub(crate) updates: View<()>,
}

impl fmt::Debug for Doc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Doc").field("node", &self.node).finish()
    }
}

/// Top-level entry of a template fragment.
#[derive(Debug, Clone)]
pub enum TemplateItem {
    /// A host node of the fragment, used as is.
    Node(NodeId),
    /// A document spliced into the fragment.
    Doc(Doc),
}

impl Doc {
    fn mk(node: DocNode, updates: View<()>) -> Self {
        Self { node, updates }
    }

    pub fn node(&self) -> &DocNode {
        &self.node
    }

    pub fn updates(&self) -> &View<()> {
        &self.updates
    }

    pub fn empty() -> Self {
        Self::mk(DocNode::Empty, View::constant(()))
    }

    pub fn append(&self, other: &Doc) -> Self {
        Self::mk(
            DocNode::Append(Rc::new(self.node.clone()), Rc::new(other.node.clone())),
            View::map2_unit(&self.updates, &other.updates),
        )
    }

    pub fn concat(docs: impl IntoIterator<Item = Doc>) -> Self {
        let docs: Vec<Doc> = docs.into_iter().collect();
        tree_reduce(Doc::empty(), &docs, &Doc::append)
    }

    /// A text node that never changes.
    pub fn text_node(rt: &Runtime, text: &str) -> Self {
        Self::mk(DocNode::StaticDomNode(rt.dom().create_text(text)), View::constant(()))
    }

    /// A text node following a View.
    pub fn text_view(rt: &Runtime, text: &View<String>) -> Self {
        let node = Rc::new(DocTextNode::new(rt.dom().create_text("")));
        let n = node.clone();
        let updates = text.map(move |t| n.update(t));
        Self::mk(DocNode::Text(node), updates)
    }

    /// A new `tag` element with attributes and children.
    pub fn element(
        rt: &Runtime,
        tag: &str,
        attrs: impl IntoIterator<Item = Attr>,
        children: impl IntoIterator<Item = Doc>,
    ) -> Self {
        let el = rt.dom().create_element(tag);
        let attr = Attr::concat(attrs);
        let children = Doc::concat(children);
        let node = create_elem_node(rt.dom(), el, &attr, children.node);
        let updates = View::map2_unit(&node.attr().updates(), &children.updates);
        Self::mk(DocNode::Elem(node), updates)
    }

    /// An existing host node, inserted as is and never synced.
    pub fn static_node(node: NodeId) -> Self {
        Self::mk(DocNode::StaticDomNode(node), View::constant(()))
    }

    /// A document whose content is chosen by a View.
    pub fn embed_view(view: &View<Doc>) -> Self {
        let node = Rc::new(DocEmbedNode::default());
        let n = node.clone();
        let updates = view.bind(move |doc| {
            n.update(doc.node.clone());
            doc.updates.clone()
        });
        Self::mk(DocNode::CurrentDyn(node), updates)
    }

    /// A pre-built fragment.
    ///
    /// `items` are the fragment's top-level entries. Each hole is an element
    /// inside the fragment whose children become the given Doc; `attrs`
    /// attach attributes to other elements of the fragment. After-render
    /// callbacks of `attrs` run with their own element.
    pub fn template_tree(
        rt: &Runtime,
        items: Vec<TemplateItem>,
        holes: Vec<(NodeId, Attr, Doc)>,
        attrs: Vec<(NodeId, Attr)>,
    ) -> Self {
        let dom = rt.dom();
        let mut updates = Vec::new();

        let els = items
            .into_iter()
            .map(|item| match item {
                TemplateItem::Node(n) => TreeItem::Node(n),
                TemplateItem::Doc(d) => {
                    updates.push(d.updates);
                    TreeItem::Doc(d.node)
                }
            })
            .collect();

        let holes = holes
            .into_iter()
            .map(|(el, attr, doc)| {
                let node = create_elem_node(dom, el, &attr, doc.node);
                updates.push(View::map2_unit(&node.attr().updates(), &doc.updates));
                node
            })
            .collect();

        let mut render: Vec<RenderCallback> = Vec::new();
        let attrs: Vec<(NodeId, Dyn)> = attrs
            .into_iter()
            .map(|(el, attr)| {
                let d = Dyn::insert(dom, el, &attr);
                updates.push(d.updates());
                for f in d.on_after_render().into_iter().flatten() {
                    render.push(Rc::new(move |_: NodeId| f(el)));
                }
                (el, d)
            })
            .collect();

        let tree = DocTreeNode {
            els,
            holes,
            attrs,
            dirty: Cell::new(true),
            render: RefCell::new((!render.is_empty()).then_some(render)),
        };
        let updates = tree_reduce(View::constant(()), &updates, &View::map2_unit);
        Self::mk(DocNode::TemplateTree(Rc::new(tree)), updates)
    }

    /// Mount as the children of `parent`.
    pub fn run_in_place(rt: &Runtime, parent: NodeId, doc: &Doc) -> MountHandle {
        mount::run_in_place(rt, parent, doc)
    }

    /// Mount in place of `element`, which is removed from its parent.
    pub fn run_replace(rt: &Runtime, element: NodeId, doc: &Doc) -> Result<MountHandle> {
        mount::run_replace(rt, element, doc)
    }
}
