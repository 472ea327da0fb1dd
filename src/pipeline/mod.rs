//! Mount Pipeline
//!
//! This module connects a [`Doc`](crate::doc::Doc) to the host and keeps it
//! in sync.
//!
//! # Pipeline Architecture
//!
//! ```text
//! Var.set → View obsolete → sink (Scheduler) → Mailbox.trigger → reconciliation pass → DOM patch
//! ```
//!
//! ## Data Flow
//!
//! 1. **sink** - Re-pulls the doc's updates after every obsolescence
//! 2. **Mailbox** - Collapses bursts of triggers into one pending pass
//! 3. **reconciliation pass** - Animations, then a frame-aligned sync
//!
//! ## Key Design Principles
//!
//! - **Explicit context**: every mount takes a [`Runtime`]; there is no
//!   global state
//! - **Pull on demand**: Views only recompute when the sink re-pulls them
//! - **One pass at a time**: the Mailbox never overlaps two passes

pub mod mount;
pub mod runtime;

// Re-exports
pub use mount::{MountHandle, run_in_place, run_replace};
pub use runtime::{Runtime, RuntimeConfig};
