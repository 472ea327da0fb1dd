//! Mailbox - at most one concurrent run of a repeating process.
//!
//! ```text
//!            trigger                 trigger              trigger
//!   Idle ───────────▶ Running ───────────────▶ Pending ─────────▶ Pending
//!    ▲                   │  ▲                     │
//!    └──── run done ─────┘  └────── run done ─────┘ (runs again)
//! ```
//!
//! A burst of triggers while a run is in flight collapses into exactly one
//! re-run.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::{error, trace};

use super::cancellation::CancellationToken;
use super::scheduler::Scheduler;
use super::task::{Async, Outcome};

/// Lifecycle of a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessorState {
    Idle,
    Running,
    /// Running, with one more run requested.
    Pending,
}

struct MailboxInner {
    state: Cell<ProcessorState>,
    process: Async<()>,
    scheduler: Scheduler,
}

/// Coalescing trigger for an asynchronous process.
#[derive(Clone)]
pub struct Mailbox(Rc<MailboxInner>);

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox").field("state", &self.state()).finish()
    }
}

impl Mailbox {
    /// Wrap `process`. Nothing runs until the first [`trigger`](Self::trigger).
    pub fn start_processor(process: Async<()>, scheduler: &Scheduler) -> Self {
        Self(Rc::new(MailboxInner {
            state: Cell::new(ProcessorState::Idle),
            process,
            scheduler: scheduler.clone(),
        }))
    }

    /// Request a run.
    pub fn trigger(&self) {
        match self.0.state.get() {
            ProcessorState::Idle => {
                self.0.state.set(ProcessorState::Running);
                Self::work(self.0.clone());
            }
            ProcessorState::Running => {
                trace!("mailbox busy, queueing one re-run");
                self.0.state.set(ProcessorState::Pending);
            }
            ProcessorState::Pending => {}
        }
    }

    pub fn state(&self) -> ProcessorState {
        self.0.state.get()
    }

    fn work(inner: Rc<MailboxInner>) {
        let process = inner.process.clone();
        let scheduler = inner.scheduler.clone();
        process.start_with(&scheduler, CancellationToken::none(), move |outcome| {
            match outcome {
                Outcome::Ok(()) => {}
                Outcome::Err(e) => error!(error = %e, "mailbox process failed"),
                Outcome::Cancelled(_) => trace!("mailbox process cancelled"),
            }
            match inner.state.get() {
                ProcessorState::Pending => {
                    inner.state.set(ProcessorState::Running);
                    Self::work(inner);
                }
                _ => inner.state.set(ProcessorState::Idle),
            }
        });
    }
}
