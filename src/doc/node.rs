//! The logical document tree.
//!
//! A [`DocNode`] tree mirrors the part of the host document the runtime
//! controls. It is persistent: `Append` nodes never change once built, and
//! structure only changes through `CurrentDyn` nodes whose content is
//! swapped by a View. The mutable parts are leaf `dirty` flags and the
//! values waiting to be written.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::attr::Dyn;
use crate::dom::NodeId;
use crate::types::ElemKey;

/// One-shot callback run after the first sync of an element.
pub type RenderCallback = Rc<dyn Fn(NodeId)>;

// =============================================================================
// DocNode
// =============================================================================

#[derive(Clone, Default)]
pub enum DocNode {
    #[default]
    Empty,
    Append(Rc<DocNode>, Rc<DocNode>),
    Elem(DocElemNode),
    Text(Rc<DocTextNode>),
    /// A host node inserted as is and never synced.
    StaticDomNode(NodeId),
    /// A node whose content is itself reactive.
    CurrentDyn(Rc<DocEmbedNode>),
    TemplateTree(Rc<DocTreeNode>),
}

impl fmt::Debug for DocNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocNode::Empty => f.write_str("Empty"),
            DocNode::Append(a, b) => f.debug_tuple("Append").field(a).field(b).finish(),
            DocNode::Elem(e) => f.debug_tuple("Elem").field(e).finish(),
            DocNode::Text(t) => f.debug_tuple("Text").field(&t.text).finish(),
            DocNode::StaticDomNode(n) => f.debug_tuple("StaticDomNode").field(n).finish(),
            DocNode::CurrentDyn(d) => f.debug_tuple("CurrentDyn").field(&*d.current.borrow()).finish(),
            DocNode::TemplateTree(t) => f.debug_tuple("TemplateTree").field(&t.els.len()).finish(),
        }
    }
}

// =============================================================================
// Leaves
// =============================================================================

/// A text node bound to a View.
#[derive(Debug)]
pub struct DocTextNode {
    pub(crate) text: NodeId,
    pub(crate) dirty: Cell<bool>,
    pub(crate) value: RefCell<String>,
}

impl DocTextNode {
    pub(crate) fn new(text: NodeId) -> Self {
        Self {
            text,
            dirty: Cell::new(false),
            value: RefCell::new(String::new()),
        }
    }

    /// Store a value for the next sync.
    pub(crate) fn update(&self, value: &str) {
        *self.value.borrow_mut() = value.to_string();
        self.dirty.set(true);
    }

    pub fn node(&self) -> NodeId {
        self.text
    }
}

/// Holder of the current content of an embedded View.
#[derive(Debug, Default)]
pub struct DocEmbedNode {
    pub(crate) current: RefCell<DocNode>,
    pub(crate) dirty: Cell<bool>,
}

impl DocEmbedNode {
    pub(crate) fn update(&self, doc: DocNode) {
        *self.current.borrow_mut() = doc;
        self.dirty.set(true);
    }
}

/// Entry of a template tree: a fixed host node or a nested document.
#[derive(Debug, Clone)]
pub enum TreeItem {
    Node(NodeId),
    Doc(DocNode),
}

/// A pre-built fragment with holes filled by documents and attributes.
pub struct DocTreeNode {
    pub(crate) els: Vec<TreeItem>,
    pub(crate) holes: Vec<DocElemNode>,
    pub(crate) attrs: Vec<(NodeId, Dyn)>,
    pub(crate) dirty: Cell<bool>,
    pub(crate) render: RefCell<Option<Vec<RenderCallback>>>,
}

impl DocTreeNode {
    /// First host element among the fragment's top-level nodes.
    pub(crate) fn first_node(&self) -> Option<NodeId> {
        self.els.iter().find_map(|item| match item {
            TreeItem::Node(n) => Some(*n),
            TreeItem::Doc(_) => None,
        })
    }
}

// =============================================================================
// DocElemNode
// =============================================================================

pub(crate) struct DocElemInner {
    pub(crate) attr: Dyn,
    pub(crate) children: DocNode,
    /// Markers bounding the managed children when the element was replaced
    /// in place rather than owned.
    pub(crate) delimiters: Option<(NodeId, NodeId)>,
    pub(crate) el: NodeId,
    pub(crate) key: ElemKey,
    pub(crate) render: RefCell<Option<Vec<RenderCallback>>>,
}

/// A live host element under runtime control.
///
/// Equality and hashing use the element key only.
#[derive(Clone)]
pub struct DocElemNode(pub(crate) Rc<DocElemInner>);

impl DocElemNode {
    pub(crate) fn new(
        attr: Dyn,
        children: DocNode,
        delimiters: Option<(NodeId, NodeId)>,
        el: NodeId,
    ) -> Self {
        let render = attr.on_after_render();
        Self(Rc::new(DocElemInner {
            attr,
            children,
            delimiters,
            el,
            key: ElemKey::fresh(),
            render: RefCell::new(render),
        }))
    }

    pub fn key(&self) -> ElemKey {
        self.0.key
    }

    pub fn element(&self) -> NodeId {
        self.0.el
    }

    pub fn delimiters(&self) -> Option<(NodeId, NodeId)> {
        self.0.delimiters
    }

    pub(crate) fn attr(&self) -> &Dyn {
        &self.0.attr
    }

    pub(crate) fn children(&self) -> &DocNode {
        &self.0.children
    }
}

impl PartialEq for DocElemNode {
    fn eq(&self, other: &Self) -> bool {
        self.0.key == other.0.key
    }
}

impl Eq for DocElemNode {}

impl Hash for DocElemNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.key.hash(state);
    }
}

impl fmt::Debug for DocElemNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocElemNode")
            .field("key", &self.0.key)
            .field("el", &self.0.el)
            .field("delimiters", &self.0.delimiters)
            .finish()
    }
}
