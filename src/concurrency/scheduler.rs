//! Cooperative FIFO scheduler.
//!
//! The only concurrency primitive in the crate. Actions are queued with
//! [`Scheduler::fork`] and drained by [`Scheduler::tick`], which the host
//! event loop invokes through a zero-delay timer. A tick runs actions in
//! submission order until the queue is empty or the time slice is spent,
//! then re-arms itself so the remainder runs on the next turn of the loop.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::dom::EventLoop;
use crate::types::Millis;

/// Default length of one tick.
pub const DEFAULT_TIME_SLICE_MS: Millis = 40.0;

type Action = Box<dyn FnOnce()>;

struct SchedulerInner {
    robin: RefCell<VecDeque<Action>>,
    idle: Cell<bool>,
    event_loop: Rc<dyn EventLoop>,
    time_slice: Millis,
}

/// Single-threaded round-robin run queue.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct Scheduler(Rc<SchedulerInner>);

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .field("idle", &self.0.idle.get())
            .field("time_slice", &self.0.time_slice)
            .finish()
    }
}

impl Scheduler {
    pub fn new(event_loop: Rc<dyn EventLoop>, time_slice: Millis) -> Self {
        Self(Rc::new(SchedulerInner {
            robin: RefCell::new(VecDeque::new()),
            idle: Cell::new(true),
            event_loop,
            time_slice,
        }))
    }

    /// Queue an action. Arms a tick if the scheduler was idle.
    pub fn fork(&self, action: impl FnOnce() + 'static) {
        self.0.robin.borrow_mut().push_back(Box::new(action));
        if self.0.idle.get() {
            self.0.idle.set(false);
            self.arm();
        }
    }

    fn arm(&self) {
        let this = self.clone();
        self.0.event_loop.set_timeout(0.0, Box::new(move || this.tick()));
    }

    /// Run queued actions until the queue is empty or the slice is spent.
    pub fn tick(&self) {
        let start = self.0.event_loop.now();
        loop {
            let next = self.0.robin.borrow_mut().pop_front();
            let Some(action) = next else {
                self.0.idle.set(true);
                return;
            };
            action();

            let elapsed = self.0.event_loop.now() - start;
            if elapsed > self.0.time_slice {
                trace!(elapsed, remaining = self.pending(), "scheduler slice spent, yielding");
                self.arm();
                return;
            }
        }
    }

    /// Number of queued actions.
    pub fn pending(&self) -> usize {
        self.0.robin.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.0.idle.get()
    }

    pub(crate) fn event_loop(&self) -> &Rc<dyn EventLoop> {
        &self.0.event_loop
    }
}

// =============================================================================
// Tests
// =============================================================================
