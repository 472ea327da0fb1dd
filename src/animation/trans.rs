//! Transitions: how a value animates when it changes, enters or exits.

use std::fmt;
use std::rc::Rc;

use super::anim::{Anim, Anims};
use crate::types::AnimFlags;

type ChangeFn<T> = Rc<dyn Fn(&T, &T) -> Anim<T>>;
type EdgeFn<T> = Rc<dyn Fn(&T) -> Anim<T>>;

/// Transition descriptor for an animated attribute.
///
/// Only the animations whose flags are set are ever requested by the
/// reconciler.
pub struct Trans<T> {
    change: ChangeFn<T>,
    enter: EdgeFn<T>,
    exit: EdgeFn<T>,
    flags: AnimFlags,
}

impl<T> Clone for Trans<T> {
    fn clone(&self) -> Self {
        Self {
            change: self.change.clone(),
            enter: self.enter.clone(),
            exit: self.exit.clone(),
            flags: self.flags,
        }
    }
}

impl<T> fmt::Debug for Trans<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trans").field("flags", &self.flags).finish()
    }
}

impl<T: Clone + 'static> Trans<T> {
    /// Jumps straight to the new value; no flags.
    pub fn trivial() -> Self {
        Self {
            change: Rc::new(|_: &T, y: &T| Anims::constant(y.clone())),
            enter: Rc::new(|y: &T| Anims::constant(y.clone())),
            exit: Rc::new(|y: &T| Anims::constant(y.clone())),
            flags: AnimFlags::empty(),
        }
    }

    /// Animate changes from the old to the new value.
    pub fn create(change: impl Fn(&T, &T) -> Anim<T> + 'static) -> Self {
        Self {
            change: Rc::new(change),
            flags: AnimFlags::CHANGE,
            ..Self::trivial()
        }
    }

    pub fn enter(mut self, f: impl Fn(&T) -> Anim<T> + 'static) -> Self {
        self.enter = Rc::new(f);
        self.flags |= AnimFlags::ENTER;
        self
    }

    pub fn exit(mut self, f: impl Fn(&T) -> Anim<T> + 'static) -> Self {
        self.exit = Rc::new(f);
        self.flags |= AnimFlags::EXIT;
        self
    }

    pub fn flags(&self) -> AnimFlags {
        self.flags
    }

    pub fn animate_change(&self, from: &T, to: &T) -> Anim<T> {
        (self.change)(from, to)
    }

    pub fn animate_enter(&self, to: &T) -> Anim<T> {
        (self.enter)(to)
    }

    pub fn animate_exit(&self, from: &T) -> Anim<T> {
        (self.exit)(from)
    }
}
