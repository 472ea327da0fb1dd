//! Sets of live elements, keyed by element key.

use ahash::AHashSet;

use super::node::{DocElemNode, DocNode, TreeItem};

/// The elements of a document, compared by key.
#[derive(Debug, Clone, Default)]
pub struct NodeSet(AHashSet<DocElemNode>);

impl NodeSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every element reachable from `doc`, nested ones included.
    pub fn find_all(doc: &DocNode) -> Self {
        fn walk(doc: &DocNode, out: &mut AHashSet<DocElemNode>) {
            match doc {
                DocNode::Append(a, b) => {
                    walk(a, out);
                    walk(b, out);
                }
                DocNode::Elem(el) => walk_elem(el, out),
                DocNode::CurrentDyn(d) => walk(&d.current.borrow(), out),
                DocNode::TemplateTree(t) => {
                    for item in &t.els {
                        if let TreeItem::Doc(d) = item {
                            walk(d, out);
                        }
                    }
                    for hole in &t.holes {
                        walk_elem(hole, out);
                    }
                }
                DocNode::Empty | DocNode::Text(_) | DocNode::StaticDomNode(_) => {}
            }
        }

        fn walk_elem(el: &DocElemNode, out: &mut AHashSet<DocElemNode>) {
            out.insert(el.clone());
            walk(el.children(), out);
        }

        let mut out = AHashSet::new();
        walk(doc, &mut out);
        Self(out)
    }

    pub fn filter(&self, f: impl Fn(&DocElemNode) -> bool) -> Self {
        Self(self.0.iter().filter(|n| f(n)).cloned().collect())
    }

    pub fn intersect(&self, other: &NodeSet) -> Self {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    /// Elements of `self` missing from `other`.
    pub fn except(&self, other: &NodeSet) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    pub fn contains(&self, el: &DocElemNode) -> bool {
        self.0.contains(el)
    }

    pub fn to_vec(&self) -> Vec<DocElemNode> {
        self.0.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<DocElemNode> for NodeSet {
    fn from_iter<I: IntoIterator<Item = DocElemNode>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::Dyn;
    use crate::doc::node::DocEmbedNode;
    use crate::dom::NodeId;
    use std::rc::Rc;

    fn elem(id: u64, children: DocNode) -> DocElemNode {
        DocElemNode::new(Dyn::empty(NodeId(id)), children, None, NodeId(id))
    }

    #[test]
    fn test_find_all_descends_into_children_and_embeds() {
        let inner = elem(2, DocNode::Empty);
        let embedded = elem(3, DocNode::Empty);
        let embed = Rc::new(DocEmbedNode::default());
        embed.update(DocNode::Elem(embedded.clone()));
        let outer = elem(
            1,
            DocNode::Append(Rc::new(DocNode::Elem(inner.clone())), Rc::new(DocNode::CurrentDyn(embed))),
        );

        let all = NodeSet::find_all(&DocNode::Elem(outer.clone()));
        assert_eq!(all.len(), 3);
        assert!(all.contains(&outer) && all.contains(&inner) && all.contains(&embedded));
    }

    #[test]
    fn test_set_algebra() {
        let (a, b, c) = (elem(1, DocNode::Empty), elem(2, DocNode::Empty), elem(3, DocNode::Empty));
        let ab: NodeSet = [a.clone(), b.clone()].into_iter().collect();
        let bc: NodeSet = [b.clone(), c.clone()].into_iter().collect();

        assert_eq!(ab.intersect(&bc).to_vec(), vec![b.clone()]);
        assert_eq!(ab.except(&bc).to_vec(), vec![a.clone()]);
        assert_eq!(bc.except(&ab).to_vec(), vec![c.clone()]);
        assert_eq!(ab.filter(|n| n.element() == NodeId(1)).to_vec(), vec![a]);
        assert!(NodeSet::empty().is_empty());
    }
}
