//! Reactive core.
//!
//! ```text
//! Var ──set──▶ Snap (obsolete) ──cascade──▶ derived Snaps ──▶ View cache reset
//!                                                              │
//!                                     next pull recomputes ◀───┘
//! ```
//!
//! - [`Snap`] - single-assignment cell with obsolescence
//! - [`View`] - memoized projection, pulled synchronously
//! - [`Var`] - mutable root

pub mod snap;
pub mod var;
pub mod view;

pub use snap::{ObsoleteHook, Obsoletable, Snap, SnapKind};
pub use var::Var;
pub use view::{Subscription, View};
