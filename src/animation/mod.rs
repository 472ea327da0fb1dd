//! Animation algebra.
//!
//! ```text
//! Anim<T> ──map──▶ Anim<()> ──pack──▶ An ──append/concat──▶ An ──play──▶ Async<()>
//! ```
//!
//! - [`Anim`] / [`Anims`] - finite, time-parameterized values
//! - [`An`] - lists of parallel actions and finalizers
//! - [`AppendList`] - the lazy list behind [`An`]
//! - [`Easing`], [`Interpolation`] - tween building blocks
//! - [`Trans`] - change/enter/exit transitions for animated attributes

pub mod an;
pub mod anim;
pub mod append_list;
pub mod easing;
pub mod trans;

pub use an::{An, AnimItem};
pub use anim::{Anim, Anims};
pub use append_list::AppendList;
pub use easing::{DoubleInterpolation, Easing, Interpolation};
pub use trans::Trans;
