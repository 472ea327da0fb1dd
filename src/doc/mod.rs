//! Documents and their reconciliation.
//!
//! - [`Doc`] - public builder API and mount entry points
//! - [`DocNode`] / [`DocElemNode`] - the persistent logical tree
//! - [`NodeSet`] - element sets for animation diffs
//! - [`reconcile`] - the sync passes that patch the host

#[allow(clippy::module_inception)]
pub mod doc;
pub mod node;
pub mod node_set;
pub mod reconcile;

pub use doc::{Doc, TemplateItem};
pub use node::{
    DocElemNode, DocEmbedNode, DocNode, DocTextNode, DocTreeNode, RenderCallback, TreeItem,
};
pub use node_set::NodeSet;
pub use reconcile::RunState;
