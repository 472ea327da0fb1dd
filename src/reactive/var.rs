//! Var - mutable reactive roots.
//!
//! A Var holds a current value and the Snap observing it. Writing replaces
//! both and obsoletes the previous Snap, which invalidates every View
//! derived from it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use super::snap::Snap;
use super::view::View;
use crate::types::fresh_id;

struct VarInner<T> {
    is_const: Cell<bool>,
    current: RefCell<T>,
    snap: RefCell<Snap<T>>,
    id: u64,
}

/// A mutable reactive cell.
///
/// Cloning a `Var` creates a new handle to the same cell.
pub struct Var<T>(Rc<VarInner<T>>);

impl<T> Clone for Var<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> PartialEq for Var<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl<T> Eq for Var<T> {}

impl<T: fmt::Debug> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("id", &self.0.id)
            .field("value", &*self.0.current.borrow())
            .field("final", &self.0.is_const.get())
            .finish()
    }
}

impl<T: Clone + 'static> Var<T> {
    fn with_snap(value: T, snap: Snap<T>, is_const: bool) -> Self {
        Self(Rc::new(VarInner {
            is_const: Cell::new(is_const),
            current: RefCell::new(value),
            snap: RefCell::new(snap),
            id: fresh_id(),
        }))
    }

    /// A writable Var.
    pub fn create(value: T) -> Self {
        Self::with_snap(value.clone(), Snap::ready(value), false)
    }

    /// A Var that is final from the start.
    pub fn create_const(value: T) -> Self {
        Self::with_snap(value.clone(), Snap::forever(value), true)
    }

    /// The current value.
    pub fn get(&self) -> T {
        self.0.current.borrow().clone()
    }

    /// Identity token. Two handles are equal iff their ids are.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn is_final(&self) -> bool {
        self.0.is_const.get()
    }

    /// Replace the value and obsolete the previous Snap.
    ///
    /// Ignored, with a warning, once the Var is final. Dependents observing
    /// the obsolescence already read the new value.
    pub fn set(&self, value: T) {
        if self.is_final() {
            warn!(var = self.0.id, "invalid attempt to change value of a Var after calling set_final");
            return;
        }
        let old = self.replace(value.clone(), Snap::ready(value));
        old.obsolete();
    }

    /// Set a last value. Every later `set` is ignored.
    pub fn set_final(&self, value: T) {
        if self.is_final() {
            warn!(var = self.0.id, "invalid attempt to change value of a Var after calling set_final");
            return;
        }
        self.0.is_const.set(true);
        let old = self.replace(value.clone(), Snap::forever(value));
        old.obsolete();
    }

    fn replace(&self, value: T, snap: Snap<T>) -> Snap<T> {
        *self.0.current.borrow_mut() = value;
        self.0.snap.replace(snap)
    }

    /// Set to `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let current = self.get();
        self.set(f(&current));
    }

    /// The reactive View of this Var.
    pub fn view(&self) -> View<T> {
        let inner = self.0.clone();
        View::from_fn(move || inner.snap.borrow().clone())
    }
}

impl<T: Clone + PartialEq + 'static> Var<T> {
    /// Set to the value `f` returns, if any and if it differs from the
    /// current one.
    ///
    /// Equal writes leave the current Snap untouched, so no-op input events
    /// do not re-render anything.
    pub fn update_maybe(&self, f: impl FnOnce(&T) -> Option<T>) {
        let current = self.get();
        if let Some(next) = f(&current) {
            if *self.0.current.borrow() != next {
                self.set(next);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
