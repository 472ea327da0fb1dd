//! In-memory host: a document tree, a mutation log and a virtual clock.
//!
//! Time only moves when told to. Timers run through [`MemoryHost::run_timers`]
//! and animation frames through [`MemoryHost::advance_frame`];
//! [`MemoryHost::flush`] alternates both until the host is quiescent.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use super::{Dom, DomEvent, EventHandler, EventLoop, NodeId, PropValue};
use crate::types::Millis;

/// Length of one virtual animation frame.
pub const FRAME_MS: Millis = 16.0;

/// Upper bound on timer/frame rounds in one [`MemoryHost::flush`].
const FLUSH_LIMIT: usize = 10_000;

/// One recorded DOM write.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateElement(NodeId, String),
    CreateText(NodeId, String),
    SetText(NodeId, String),
    InsertBefore { parent: NodeId, node: NodeId, before: Option<NodeId> },
    RemoveChild { parent: NodeId, node: NodeId },
    SetAttribute(NodeId, String, String),
    RemoveAttribute(NodeId, String),
    AddClass(NodeId, String),
    RemoveClass(NodeId, String),
    SetProperty(NodeId, String, PropValue),
}

enum NodeKind {
    Element(String),
    Text(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    properties: HashMap<String, PropValue>,
    listeners: Vec<(String, EventHandler)>,
    valid: bool,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: BTreeMap::new(),
            classes: Vec::new(),
            properties: HashMap::new(),
            listeners: Vec::new(),
            valid: true,
        }
    }
}

struct Timer {
    due: Millis,
    seq: u64,
    f: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct HostInner {
    nodes: RefCell<Vec<NodeData>>,
    log: RefCell<Vec<Mutation>>,
    now: Cell<Millis>,
    timer_seq: Cell<u64>,
    timers: RefCell<Vec<Timer>>,
    frames: RefCell<Vec<Box<dyn FnOnce(Millis)>>>,
}

/// Headless [`Dom`] + [`EventLoop`].
///
/// Cloning yields another handle to the same document and clock.
#[derive(Clone, Default)]
pub struct MemoryHost(Rc<HostInner>);

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("nodes", &self.0.nodes.borrow().len())
            .field("now", &self.0.now.get())
            .field("timers", &self.0.timers.borrow().len())
            .field("frames", &self.0.frames.borrow().len())
            .finish()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// This host as a shared [`Dom`].
    pub fn dom(&self) -> Rc<dyn Dom> {
        Rc::new(self.clone())
    }

    /// This host as a shared [`EventLoop`].
    pub fn event_loop(&self) -> Rc<dyn EventLoop> {
        Rc::new(self.clone())
    }

    fn record(&self, m: Mutation) {
        self.0.log.borrow_mut().push(m);
    }

    fn alloc(&self, kind: NodeKind) -> NodeId {
        let mut nodes = self.0.nodes.borrow_mut();
        nodes.push(NodeData::new(kind));
        NodeId(nodes.len() as u64 - 1)
    }

    fn with_node<R>(&self, node: NodeId, f: impl FnOnce(&NodeData) -> R) -> Option<R> {
        self.0.nodes.borrow().get(node.0 as usize).map(f)
    }

    fn with_node_mut<R>(&self, node: NodeId, f: impl FnOnce(&mut NodeData) -> R) -> Option<R> {
        self.0.nodes.borrow_mut().get_mut(node.0 as usize).map(f)
    }

    fn detach(&self, node: NodeId) {
        let Some(parent) = self.with_node(node, |n| n.parent).flatten() else {
            return;
        };
        self.with_node_mut(parent, |p| p.children.retain(|c| *c != node));
        self.with_node_mut(node, |n| n.parent = None);
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Writes recorded since the last [`clear_mutations`](Self::clear_mutations).
    pub fn mutations(&self) -> Vec<Mutation> {
        self.0.log.borrow().clone()
    }

    pub fn clear_mutations(&self) {
        self.0.log.borrow_mut().clear();
    }

    /// Concatenated text of a subtree.
    pub fn text_content(&self, node: NodeId) -> String {
        let (own, children) = match self.with_node(node, |n| match &n.kind {
            NodeKind::Text(t) => (Some(t.clone()), Vec::new()),
            NodeKind::Element(_) => (None, n.children.clone()),
        }) {
            Some(pair) => pair,
            None => return String::new(),
        };
        match own {
            Some(t) => t,
            None => children.into_iter().map(|c| self.text_content(c)).collect(),
        }
    }

    /// Compact markup of a subtree: `<tag a="v">children</tag>`.
    ///
    /// Attributes are sorted; classes and properties are not rendered.
    pub fn markup(&self, node: NodeId) -> String {
        let Some((tag, attrs, children)) = self.with_node(node, |n| match &n.kind {
            NodeKind::Text(t) => (None, t.clone(), Vec::new()),
            NodeKind::Element(tag) => {
                let attrs: String = n
                    .attributes
                    .iter()
                    .map(|(k, v)| format!(" {k}=\"{v}\""))
                    .collect();
                (Some(tag.clone()), attrs, n.children.clone())
            }
        }) else {
            return String::new();
        };
        match tag {
            None => attrs,
            Some(tag) => {
                let inner: String = children.into_iter().map(|c| self.markup(c)).collect();
                format!("<{tag}{attrs}>{inner}</{tag}>")
            }
        }
    }

    /// Deliver an event to the listeners of `node` registered for `kind`.
    pub fn dispatch_event(&self, node: NodeId, kind: &str) {
        let handlers: Vec<EventHandler> = self
            .with_node(node, |n| {
                n.listeners
                    .iter()
                    .filter(|(k, _)| k == kind)
                    .map(|(_, h)| h.clone())
                    .collect()
            })
            .unwrap_or_default();
        let event = DomEvent { kind: kind.to_string(), target: node };
        for handler in handlers {
            handler(&event);
        }
    }

    /// Make [`Dom::check_validity`] report `valid` for `node`.
    pub fn set_validity(&self, node: NodeId, valid: bool) {
        self.with_node_mut(node, |n| n.valid = valid);
    }

    // -------------------------------------------------------------------------
    // Virtual clock
    // -------------------------------------------------------------------------

    /// Move the clock without running anything.
    pub fn advance_clock(&self, ms: Millis) {
        self.0.now.set(self.0.now.get() + ms);
    }

    /// Run the earliest due timer. Returns whether one ran.
    pub fn run_next_timer(&self) -> bool {
        let now = self.0.now.get();
        let next = {
            let mut timers = self.0.timers.borrow_mut();
            let idx = timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due <= now)
                .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
                .map(|(i, _)| i);
            idx.map(|i| timers.remove(i))
        };
        match next {
            Some(timer) => {
                (timer.f)();
                true
            }
            None => false,
        }
    }

    /// Run due timers, including ones they schedule, until none is due.
    pub fn run_timers(&self) {
        let mut rounds = 0;
        while self.run_next_timer() {
            rounds += 1;
            if rounds >= FLUSH_LIMIT {
                warn!(rounds, "timer queue did not settle");
                return;
            }
        }
    }

    /// Advance one frame: move the clock, run the frame callbacks queued so
    /// far, then run due timers.
    pub fn advance_frame(&self) {
        self.advance_clock(FRAME_MS);
        let now = self.0.now.get();
        let frames = std::mem::take(&mut *self.0.frames.borrow_mut());
        for f in frames {
            f(now);
        }
        self.run_timers();
    }

    pub fn has_pending_frames(&self) -> bool {
        !self.0.frames.borrow().is_empty()
    }

    /// Alternate timers and frames until neither has work left.
    pub fn flush(&self) {
        self.run_timers();
        let mut rounds = 0;
        while self.has_pending_frames() {
            self.advance_frame();
            rounds += 1;
            if rounds >= FLUSH_LIMIT {
                warn!(rounds, "animation frames did not settle");
                return;
            }
        }
    }
}

// =============================================================================
// Dom
// =============================================================================

impl Dom for MemoryHost {
    fn create_element(&self, tag: &str) -> NodeId {
        let id = self.alloc(NodeKind::Element(tag.to_string()));
        self.record(Mutation::CreateElement(id, tag.to_string()));
        id
    }

    fn create_text(&self, text: &str) -> NodeId {
        let id = self.alloc(NodeKind::Text(text.to_string()));
        self.record(Mutation::CreateText(id, text.to_string()));
        id
    }

    fn set_text(&self, node: NodeId, text: &str) {
        self.with_node_mut(node, |n| {
            if let NodeKind::Text(t) = &mut n.kind {
                *t = text.to_string();
            }
        });
        self.record(Mutation::SetText(node, text.to_string()));
    }

    fn text(&self, node: NodeId) -> Option<String> {
        self.with_node(node, |n| match &n.kind {
            NodeKind::Text(t) => Some(t.clone()),
            NodeKind::Element(_) => None,
        })
        .flatten()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.with_node(node, |n| n.parent).flatten()
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.with_node(node, |n| n.children.clone()).unwrap_or_default()
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let idx = siblings.iter().position(|c| *c == node)?;
        siblings.get(idx + 1).copied()
    }

    fn insert_before(&self, parent: NodeId, node: NodeId, before: Option<NodeId>) {
        self.detach(node);
        self.with_node_mut(parent, |p| {
            let idx = before.and_then(|b| p.children.iter().position(|c| *c == b));
            if before.is_some() && idx.is_none() {
                warn!(?parent, ?before, "reference node is not a child, appending");
            }
            match idx {
                Some(i) => p.children.insert(i, node),
                None => p.children.push(node),
            }
        });
        self.with_node_mut(node, |n| n.parent = Some(parent));
        self.record(Mutation::InsertBefore { parent, node, before });
    }

    fn remove_child(&self, parent: NodeId, node: NodeId) {
        if self.parent(node) == Some(parent) {
            self.detach(node);
            self.record(Mutation::RemoveChild { parent, node });
        }
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.with_node_mut(node, |n| n.attributes.insert(name.to_string(), value.to_string()));
        self.record(Mutation::SetAttribute(node, name.to_string(), value.to_string()));
    }

    fn get_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.with_node(node, |n| n.attributes.get(name).cloned()).flatten()
    }

    fn remove_attribute(&self, node: NodeId, name: &str) {
        self.with_node_mut(node, |n| n.attributes.remove(name));
        self.record(Mutation::RemoveAttribute(node, name.to_string()));
    }

    fn add_class(&self, node: NodeId, class: &str) {
        let added = self
            .with_node_mut(node, |n| {
                if n.classes.iter().any(|c| c == class) {
                    false
                } else {
                    n.classes.push(class.to_string());
                    true
                }
            })
            .unwrap_or(false);
        if added {
            self.record(Mutation::AddClass(node, class.to_string()));
        }
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        let removed = self
            .with_node_mut(node, |n| {
                let before = n.classes.len();
                n.classes.retain(|c| c != class);
                n.classes.len() != before
            })
            .unwrap_or(false);
        if removed {
            self.record(Mutation::RemoveClass(node, class.to_string()));
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.with_node(node, |n| n.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    fn set_property(&self, node: NodeId, name: &str, value: PropValue) {
        self.with_node_mut(node, |n| n.properties.insert(name.to_string(), value.clone()));
        self.record(Mutation::SetProperty(node, name.to_string(), value));
    }

    fn get_property(&self, node: NodeId, name: &str) -> Option<PropValue> {
        self.with_node(node, |n| n.properties.get(name).cloned()).flatten()
    }

    fn add_event_listener(&self, node: NodeId, kind: &str, handler: EventHandler) {
        self.with_node_mut(node, |n| n.listeners.push((kind.to_string(), handler)));
    }

    fn check_validity(&self, node: NodeId) -> bool {
        self.with_node(node, |n| n.valid).unwrap_or(true)
    }
}

// =============================================================================
// EventLoop
// =============================================================================

impl EventLoop for MemoryHost {
    fn now(&self) -> Millis {
        self.0.now.get()
    }

    fn set_timeout(&self, delay: Millis, f: Box<dyn FnOnce()>) {
        let seq = self.0.timer_seq.get();
        self.0.timer_seq.set(seq + 1);
        let due = self.0.now.get() + delay.max(0.0);
        self.0.timers.borrow_mut().push(Timer { due, seq, f });
    }

    fn request_animation_frame(&self, f: Box<dyn FnOnce(Millis)>) {
        self.0.frames.borrow_mut().push(f);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_edits_and_markup() {
        let host = MemoryHost::new();
        let ul = host.create_element("ul");
        let a = host.create_element("li");
        let b = host.create_element("li");
        host.insert_before(ul, a, None);
        host.insert_before(ul, b, Some(a));
        host.set_attribute(ul, "id", "list");
        host.insert_before(a, host.create_text("a"), None);

        assert_eq!(host.children(ul), vec![b, a]);
        assert_eq!(host.next_sibling(b), Some(a));
        assert_eq!(host.markup(ul), "<ul id=\"list\"><li></li><li>a</li></ul>");

        host.remove_child(ul, b);
        assert_eq!(host.children(ul), vec![a]);
        assert_eq!(host.text_content(ul), "a");
    }

    #[test]
    fn test_insert_moves_between_parents() {
        let host = MemoryHost::new();
        let p1 = host.create_element("div");
        let p2 = host.create_element("div");
        let t = host.create_text("t");
        host.insert_before(p1, t, None);
        host.insert_before(p2, t, None);
        assert!(host.children(p1).is_empty());
        assert_eq!(host.parent(t), Some(p2));
    }

    #[test]
    fn test_timers_run_in_due_order() {
        let host = MemoryHost::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay, tag) in [(10.0, "late"), (0.0, "first"), (0.0, "second")] {
            let l = log.clone();
            host.set_timeout(delay, Box::new(move || l.borrow_mut().push(tag)));
        }
        host.run_timers();
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        host.advance_clock(10.0);
        host.run_timers();
        assert_eq!(*log.borrow(), vec!["first", "second", "late"]);
    }

    #[test]
    fn test_frames_receive_clock() {
        let host = MemoryHost::new();
        let seen = Rc::new(Cell::new(0.0));
        let s = seen.clone();
        host.request_animation_frame(Box::new(move |t| s.set(t)));
        host.flush();
        assert_eq!(seen.get(), FRAME_MS);
        assert!(!host.has_pending_frames());
    }

    #[test]
    fn test_dispatch_event_and_validity() {
        let host = MemoryHost::new();
        let input = host.create_element("input");
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        host.add_event_listener(input, "input", Rc::new(move |e| {
            assert_eq!(e.kind, "input");
            h.set(h.get() + 1);
        }));
        host.dispatch_event(input, "input");
        host.dispatch_event(input, "change");
        assert_eq!(hits.get(), 1);

        assert!(host.check_validity(input));
        host.set_validity(input, false);
        assert!(!host.check_validity(input));
    }
}
