//! Mount API - attaching a Doc to the host and keeping it in sync.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::{Doc, MemoryHost, Runtime, RuntimeConfig, Var};
//!
//! let host = MemoryHost::new();
//! let rt = Runtime::memory(&host, RuntimeConfig::default());
//! let name = Var::create("world".to_string());
//!
//! let root = rt.dom().create_element("div");
//! let doc = Doc::text_view(&rt, &name.view());
//! let handle = Doc::run_in_place(&rt, root, &doc);
//!
//! host.flush();
//! name.set("there".to_string());
//! host.flush();
//!
//! handle.unmount();
//! ```

use std::rc::Rc;

use tracing::debug;

use super::runtime::Runtime;
use crate::concurrency::{Mailbox, ProcessorState};
use crate::doc::reconcile::{
    create_delimited_run_state, create_run_state, perform_animated_update, sync_elem_node,
};
use crate::doc::{Doc, RunState};
use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::reactive::{Subscription, View};

// =============================================================================
// Mount Handle
// =============================================================================

/// Handle returned by [`run_in_place`] and [`run_replace`].
///
/// Holds:
/// - The subscription driving updates (disposed on unmount or drop)
/// - The mailbox coalescing reconciliation passes
/// - The run state of the mount point
pub struct MountHandle {
    rt: Runtime,
    state: Rc<RunState>,
    updates: View<()>,
    mailbox: Mailbox,
    subscription: Subscription,
}

impl std::fmt::Debug for MountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountHandle")
            .field("top", self.state.top())
            .field("mailbox", &self.mailbox)
            .field("running", &self.is_running())
            .finish()
    }
}

impl MountHandle {
    /// Reconcile immediately, bypassing the scheduler, animations and
    /// frame batching.
    pub fn sync_now(&self) {
        self.updates.snap();
        sync_elem_node(self.rt.dom(), self.state.top());
    }

    /// Stop tracking changes. The host nodes stay where they are.
    pub fn unmount(self) {
        debug!(root = self.state.top().element().0, "unmounting");
        self.subscription.dispose();
    }

    /// Whether changes are still being tracked.
    pub fn is_running(&self) -> bool {
        self.subscription.is_active()
    }

    /// Whether a reconciliation pass is in flight.
    pub fn is_updating(&self) -> bool {
        self.mailbox.state() != ProcessorState::Idle
    }

    /// Element whose children this mount manages.
    pub fn root(&self) -> NodeId {
        self.state.top().element()
    }
}

impl Drop for MountHandle {
    fn drop(&mut self) {
        self.subscription.dispose();
    }
}

// =============================================================================
// Mount Functions
// =============================================================================

/// Mount `doc` as the children of `parent`.
///
/// This sets up:
/// 1. The run state, linking the current host nodes under `parent`
/// 2. A mailbox running one reconciliation pass at a time
/// 3. A sink on the doc's updates triggering the mailbox
pub fn run_in_place(rt: &Runtime, parent: NodeId, doc: &Doc) -> MountHandle {
    let state = Rc::new(create_run_state(rt.dom(), parent, doc.node.clone()));
    start(rt, state, doc)
}

/// Mount `doc` in place of `element`.
///
/// `element` is swapped for a pair of empty text markers; the doc lives
/// between them and the rest of the parent is never touched.
pub fn run_replace(rt: &Runtime, element: NodeId, doc: &Doc) -> Result<MountHandle> {
    let dom = rt.dom();
    let parent = dom.parent(element).ok_or(Error::Detached(element))?;

    let rdelim = dom.create_text("");
    dom.insert_before(parent, rdelim, Some(element));
    dom.remove_child(parent, element);
    let ldelim = dom.create_text("");
    dom.insert_before(parent, ldelim, Some(rdelim));

    let state = Rc::new(create_delimited_run_state(dom, ldelim, rdelim, doc.node.clone())?);
    Ok(start(rt, state, doc))
}

fn start(rt: &Runtime, state: Rc<RunState>, doc: &Doc) -> MountHandle {
    let process = perform_animated_update(rt, state.clone(), doc.node.clone());
    let mailbox = Mailbox::start_processor(process, rt.scheduler());
    let m = mailbox.clone();
    let subscription = doc.updates.sink(rt.scheduler(), move |_| m.trigger());
    debug!(
        root = state.top().element().0,
        animations = rt.config().use_animations,
        batched = rt.config().batch_updates,
        "mounted"
    );
    MountHandle {
        rt: rt.clone(),
        state,
        updates: doc.updates.clone(),
        mailbox,
        subscription,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr::Attr;
    use crate::dom::{Dom, MemoryHost};
    use crate::pipeline::RuntimeConfig;
    use crate::reactive::Var;

    fn setup(config: RuntimeConfig) -> (MemoryHost, Runtime, NodeId) {
        let host = MemoryHost::new();
        let rt = Runtime::memory(&host, config);
        let root = host.create_element("div");
        (host, rt, root)
    }

    #[test]
    fn test_run_in_place_renders_and_updates() {
        let (host, rt, root) = setup(RuntimeConfig::default());
        let name = Var::create("a".to_string());
        let doc = Doc::element(&rt, "p", [], [Doc::text_view(&rt, &name.view())]);
        let handle = Doc::run_in_place(&rt, root, &doc);
        assert!(handle.is_running());

        host.flush();
        assert_eq!(host.markup(root), "<div><p>a</p></div>");

        name.set("b".to_string());
        host.flush();
        assert_eq!(host.markup(root), "<div><p>b</p></div>");
        assert!(!handle.is_updating());
    }

    #[test]
    fn test_unmount_stops_updates() {
        let (host, rt, root) = setup(RuntimeConfig::default().with_animations(false));
        let name = Var::create("a".to_string());
        let handle = Doc::run_in_place(&rt, root, &Doc::text_view(&rt, &name.view()));
        host.flush();
        assert_eq!(host.text_content(root), "a");

        handle.unmount();
        name.set("b".to_string());
        host.flush();
        assert_eq!(host.text_content(root), "a");
    }

    #[test]
    fn test_sync_now_skips_the_scheduler() {
        let (host, rt, root) = setup(RuntimeConfig::default());
        let title = Var::create("x".to_string());
        let doc = Doc::element(&rt, "span", [Attr::dynamic("title", &title.view())], []);
        let handle = Doc::run_in_place(&rt, root, &doc);

        handle.sync_now();
        assert_eq!(host.markup(root), "<div><span title=\"x\"></span></div>");
        assert_eq!(handle.root(), root);
    }

    #[test]
    fn test_run_replace_needs_a_parent() {
        let (_host, rt, root) = setup(RuntimeConfig::default());
        let err = Doc::run_replace(&rt, root, &Doc::empty()).unwrap_err();
        assert_eq!(err, Error::Detached(root));
    }

    #[test]
    fn test_run_replace_swaps_element() {
        let (host, rt, root) = setup(RuntimeConfig::default().with_batch_updates(false));
        let placeholder = host.create_element("slot");
        host.insert_before(root, placeholder, None);

        let _handle = Doc::run_replace(&rt, placeholder, &Doc::text_node(&rt, "hi")).unwrap();
        host.flush();
        assert_eq!(host.parent(placeholder), None);
        assert_eq!(host.text_content(root), "hi");
        // Two markers around the content.
        assert_eq!(host.children(root).len(), 3);
    }
}
