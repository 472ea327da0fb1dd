//! Time-parameterized animations.
//!
//! An [`Anim<T>`] computes a frame value from the elapsed time and has a
//! fixed duration. Actions are `Anim<()>`: computing a frame performs the
//! effect.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use super::easing::{Easing, Interpolation};
use crate::types::Millis;

/// A finite animation producing `T` at each elapsed time.
pub struct Anim<T> {
    pub(crate) compute: Rc<dyn Fn(Millis) -> T>,
    pub(crate) duration: Millis,
}

impl<T> Clone for Anim<T> {
    fn clone(&self) -> Self {
        Self {
            compute: Rc::clone(&self.compute),
            duration: self.duration,
        }
    }
}

impl<T> fmt::Debug for Anim<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anim").field("duration", &self.duration).finish()
    }
}

impl<T: 'static> Anim<T> {
    pub fn duration(&self) -> Millis {
        self.duration
    }

    /// Frame at elapsed time `t`.
    pub fn compute(&self, t: Millis) -> T {
        (self.compute)(t)
    }

    /// Tween from `start` to `end` over `duration`.
    pub fn simple(
        interpolation: impl Interpolation<T> + 'static,
        easing: Easing,
        duration: Millis,
        start: T,
        end: T,
    ) -> Self {
        Anims::def(duration, move |t| {
            let progress = if duration <= 0.0 { 1.0 } else { (t / duration).clamp(0.0, 1.0) };
            interpolation.interpolate(easing.transform_time(progress), &start, &end)
        })
    }

    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Anim<U> {
        let compute = self.compute.clone();
        Anims::def(self.duration, move |t| f(compute(t)))
    }
}

/// Constructors and combinators over [`Anim`].
pub struct Anims;

impl Anims {
    pub fn def<T>(duration: Millis, compute: impl Fn(Millis) -> T + 'static) -> Anim<T> {
        Anim {
            compute: Rc::new(compute),
            duration,
        }
    }

    /// Zero-length animation holding `value`.
    pub fn constant<T: Clone + 'static>(value: T) -> Anim<T> {
        Anims::def(0.0, move |_| value.clone())
    }

    /// Stretch `anim` to `duration`; past its own duration it keeps
    /// returning its last frame, computed once.
    pub fn prolong<T: Clone + 'static>(duration: Millis, anim: &Anim<T>) -> Anim<T> {
        let inner = anim.clone();
        let last: OnceCell<T> = OnceCell::new();
        Anims::def(duration, move |t| {
            if t >= inner.duration {
                last.get_or_init(|| inner.compute(inner.duration)).clone()
            } else {
                inner.compute(t)
            }
        })
    }

    /// Play actions in parallel. The result lasts as long as the longest;
    /// shorter ones hold their last frame.
    pub fn concat_actions(actions: impl IntoIterator<Item = Anim<()>>) -> Anim<()> {
        let actions: Vec<Anim<()>> = actions.into_iter().collect();
        match actions.len() {
            0 => Anims::constant(()),
            1 => actions[0].clone(),
            _ => {
                let duration = actions.iter().map(|a| a.duration).fold(0.0, f64::max);
                let prolonged: Vec<Anim<()>> =
                    actions.iter().map(|a| Anims::prolong(duration, a)).collect();
                Anims::def(duration, move |t| {
                    for anim in &prolonged {
                        anim.compute(t);
                    }
                })
            }
        }
    }
}
