//! Ordered lists of host nodes, compared by identity.

use super::{Dom, NodeId};
use crate::doc::{DocElemNode, DocNode, TreeItem};

/// Host nodes in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomNodes(Vec<NodeId>);

impl DomNodes {
    /// The host nodes an element's logical children map to, in order.
    pub fn doc_children(el: &DocElemNode) -> Self {
        fn walk(doc: &DocNode, out: &mut Vec<NodeId>) {
            match doc {
                DocNode::Empty => {}
                DocNode::Append(a, b) => {
                    walk(a, out);
                    walk(b, out);
                }
                DocNode::Elem(e) => out.push(e.element()),
                DocNode::Text(t) => out.push(t.text),
                DocNode::StaticDomNode(n) => out.push(*n),
                DocNode::CurrentDyn(d) => walk(&d.current.borrow(), out),
                DocNode::TemplateTree(t) => {
                    for item in &t.els {
                        match item {
                            TreeItem::Node(n) => out.push(*n),
                            TreeItem::Doc(d) => walk(d, out),
                        }
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(el.children(), &mut out);
        Self(out)
    }

    /// The actual children of `elem`, or the nodes strictly between the
    /// delimiters when there are some.
    pub fn children(dom: &dyn Dom, elem: NodeId, delims: Option<(NodeId, NodeId)>) -> Self {
        match delims {
            Some((start, end)) => {
                let mut out = Vec::new();
                let mut n = dom.next_sibling(start);
                while let Some(node) = n {
                    if node == end {
                        break;
                    }
                    out.push(node);
                    n = dom.next_sibling(node);
                }
                Self(out)
            }
            None => Self(dom.children(elem)),
        }
    }

    /// Nodes of `self` absent from `other`, order kept.
    pub fn except(&self, other: &DomNodes) -> Self {
        Self(self.0.iter().copied().filter(|n| !other.0.contains(n)).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<NodeId>> for DomNodes {
    fn from(nodes: Vec<NodeId>) -> Self {
        Self(nodes)
    }
}
