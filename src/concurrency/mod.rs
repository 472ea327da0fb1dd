//! Cooperative concurrency.
//!
//! Everything runs on one thread. The host timer and animation-frame
//! callbacks are the only suspension points; all continuations are
//! trampolined through the [`Scheduler`].
//!
//! - [`scheduler`] - FIFO run queue with time-sliced ticks
//! - [`task`] - [`Async`] computations and their continuations
//! - [`cancellation`] - advisory cancellation tokens
//! - [`mailbox`] - coalescing process trigger

pub mod cancellation;
pub mod mailbox;
pub mod scheduler;
pub mod task;

pub use cancellation::{CancellationToken, CancellationTokenSource};
pub use mailbox::{Mailbox, ProcessorState};
pub use scheduler::{DEFAULT_TIME_SLICE_MS, Scheduler};
pub use task::{Async, AsyncBody, Continuations, Outcome};
