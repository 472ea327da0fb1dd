//! # spark-dom
//!
//! Reactive DOM runtime for Rust.
//!
//! ## Architecture
//!
//! spark-dom keeps a live document bound to mutable reactive cells. Values
//! flow through memoized Views; a change obsoletes the Snaps that depended
//! on it, and the next pull recomputes only those. Mounted documents
//! re-pull their Views on a cooperative scheduler and patch the host
//! incrementally, optionally animating what entered, exited or changed.
//!
//! The update pipeline is pull-based:
//! ```text
//! Var.set → Snap obsolete → sink re-pull → Mailbox → reconciliation pass → DOM patch
//! ```
//!
//! The host is abstract: [`Dom`] and [`EventLoop`] are traits, and
//! [`MemoryHost`] implements both in memory for headless runs and tests.
//!
//! ## Modules
//!
//! - [`types`] - Core types (Millis, ElemKey, AnimFlags, CheckedInput)
//! - [`error`] - Error types
//! - [`reactive`] - Snap, View, Var
//! - [`concurrency`] - Scheduler, Async, cancellation, Mailbox
//! - [`dom`] - Host traits and the in-memory host
//! - [`animation`] - Anim, An, easing, transitions
//! - [`attr`] - Attribute trees and input bindings
//! - [`doc`] - Documents and reconciliation
//! - [`pipeline`] - Runtime context and mount entry points

pub mod animation;
pub mod attr;
pub mod concurrency;
pub mod doc;
pub mod dom;
pub mod error;
pub mod pipeline;
pub mod reactive;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{AsyncError, Error, OperationCanceled, Result};

pub use reactive::{Snap, SnapKind, Subscription, Var, View};

pub use concurrency::{
    Async, CancellationToken, CancellationTokenSource, Continuations, Mailbox, Outcome,
    ProcessorState, Scheduler,
};

pub use dom::{Dom, DomEvent, DomNodes, EventLoop, MemoryHost, Mutation, NodeId, PropValue};

pub use animation::{An, Anim, Anims, AppendList, DoubleInterpolation, Easing, Interpolation, Trans};

pub use attr::{Attr, AttrNode, Dyn};

pub use doc::{Doc, DocElemNode, DocNode, NodeSet, TemplateItem};

pub use pipeline::{MountHandle, Runtime, RuntimeConfig, run_in_place, run_replace};
