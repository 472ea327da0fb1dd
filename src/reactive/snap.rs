//! Snap - the single-assignment reactive cell.
//!
//! A Snap is one observation of a changing value. It is created `Pending`
//! (or directly `Ready`/`Forever`), receives its value at most once, and is
//! eventually marked `Obsolete` when the value it observed is superseded.
//!
//! ```text
//! Pending ──mark_ready──▶ Ready ──obsolete──▶ Obsolete
//!    │                                          ▲
//!    ├──mark_forever──▶ Forever (terminal)      │
//!    └──────────────────obsolete────────────────┘
//! ```
//!
//! # Invariants
//!
//! - Transitions are monotonic; a Snap never goes back to `Pending`.
//! - Every available callback fires at most once, every obsolete hook fires
//!   at most once.
//! - `Forever` Snaps keep no subscriber lists: they can never change.
//!
//! Obsolete queues hold [`ObsoleteHook`]s, a tagged list of either a
//! downstream Snap (obsolescence cascades to it) or a plain callback.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::view::View;

/// Number of insertions between two compactions of an obsolete queue.
pub(crate) const COMPACTION_INTERVAL: usize = 20;

type AvailableCallback<T> = Box<dyn FnOnce(&T, bool)>;

// =============================================================================
// Obsolete hooks
// =============================================================================

/// Something that can be obsoleted, independent of its value type.
///
/// Lets a `Snap<A>` hold downstream `Snap<B>`s in its obsolete queue.
pub trait Obsoletable {
    /// Mark obsolete and fire queued hooks. Idempotent.
    fn mark_obsolete(&self);

    /// Whether the cell is already obsolete.
    fn is_obsolete(&self) -> bool;
}

/// Entry of an obsolete queue.
pub enum ObsoleteHook {
    /// Downstream cell, obsoleted in turn.
    Snap(Rc<dyn Obsoletable>),
    /// Plain callback.
    Callback(Box<dyn FnOnce()>),
}

impl ObsoleteHook {
    /// Wrap a callback.
    pub fn callback(f: impl FnOnce() + 'static) -> Self {
        ObsoleteHook::Callback(Box::new(f))
    }

    /// Dead Snap hooks can be dropped from queues; callbacks are always live.
    fn is_live(&self) -> bool {
        match self {
            ObsoleteHook::Snap(snap) => !snap.is_obsolete(),
            ObsoleteHook::Callback(_) => true,
        }
    }

    fn fire(self) {
        match self {
            ObsoleteHook::Snap(snap) => snap.mark_obsolete(),
            ObsoleteHook::Callback(f) => f(),
        }
    }
}

impl fmt::Debug for ObsoleteHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObsoleteHook::Snap(_) => f.write_str("ObsoleteHook::Snap"),
            ObsoleteHook::Callback(_) => f.write_str("ObsoleteHook::Callback"),
        }
    }
}

/// Push onto an obsolete queue, compacting it every
/// [`COMPACTION_INTERVAL`] insertions. Compaction keeps insertion order.
fn enqueue_safe(queue: &mut Vec<ObsoleteHook>, hook: ObsoleteHook) {
    queue.push(hook);
    if queue.len() % COMPACTION_INTERVAL == 0 {
        queue.retain(ObsoleteHook::is_live);
    }
}

// =============================================================================
// Snap state
// =============================================================================

enum SnapState<T> {
    Forever(T),
    Ready(T, Vec<ObsoleteHook>),
    Pending(Vec<AvailableCallback<T>>, Vec<ObsoleteHook>),
    Obsolete,
}

/// Observable state of a [`Snap`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapKind {
    /// Terminal value.
    Forever,
    /// Value available, may still become obsolete.
    Ready,
    /// No value yet.
    Pending,
    /// Superseded.
    Obsolete,
}

impl<T> Obsoletable for RefCell<SnapState<T>> {
    fn mark_obsolete(&self) {
        let old = {
            let mut state = self.borrow_mut();
            if matches!(*state, SnapState::Forever(_) | SnapState::Obsolete) {
                return;
            }
            std::mem::replace(&mut *state, SnapState::Obsolete)
        };
        let (SnapState::Ready(_, hooks) | SnapState::Pending(_, hooks)) = old else {
            return;
        };
        for hook in hooks {
            hook.fire();
        }
    }

    fn is_obsolete(&self) -> bool {
        // A cell borrowed further up the stack is mid-transition, hence live.
        self.try_borrow()
            .map(|state| matches!(*state, SnapState::Obsolete))
            .unwrap_or(false)
    }
}

/// What `when` must do once the state borrow is released.
enum Dispatch<T> {
    Available(AvailableCallback<T>, T, bool),
    Obsolete(ObsoleteHook),
    Queued,
}

// =============================================================================
// Snap
// =============================================================================

/// A single-assignment reactive cell with obsolescence.
///
/// Cloning a `Snap` creates a new handle to the **same** cell.
pub struct Snap<T>(Rc<RefCell<SnapState<T>>>);

impl<T> Clone for Snap<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Snap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Snap").field(&self.kind()).finish()
    }
}

impl<T> Snap<T> {
    fn from_state(state: SnapState<T>) -> Self {
        Self(Rc::new(RefCell::new(state)))
    }

    /// A terminal Snap.
    pub fn forever(value: T) -> Self {
        Self::from_state(SnapState::Forever(value))
    }

    /// A Snap holding a value that may later become obsolete.
    pub fn ready(value: T) -> Self {
        Self::from_state(SnapState::Ready(value, Vec::new()))
    }

    /// A Snap still waiting for its value.
    pub fn pending() -> Self {
        Self::from_state(SnapState::Pending(Vec::new(), Vec::new()))
    }

    /// Current state, without the payload.
    pub fn kind(&self) -> SnapKind {
        match &*self.0.borrow() {
            SnapState::Forever(_) => SnapKind::Forever,
            SnapState::Ready(..) => SnapKind::Ready,
            SnapState::Pending(..) => SnapKind::Pending,
            SnapState::Obsolete => SnapKind::Obsolete,
        }
    }

    /// Whether the Snap reached its terminal value.
    pub fn is_forever(&self) -> bool {
        self.kind() == SnapKind::Forever
    }

    /// Whether the Snap has been superseded.
    pub fn is_obsolete(&self) -> bool {
        self.kind() == SnapKind::Obsolete
    }

    /// Whether a value is available (`Ready` or `Forever`).
    pub fn is_available(&self) -> bool {
        matches!(self.kind(), SnapKind::Ready | SnapKind::Forever)
    }

    /// Whether two handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address of the shared cell, for identity checks that must not keep
    /// the Snap alive.
    pub(crate) fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0).cast()
    }

    /// Mark obsolete, cascading through queued hooks.
    ///
    /// No-op on `Forever` and `Obsolete` Snaps, so calling it twice never
    /// fires a callback twice.
    pub fn obsolete(&self) {
        self.0.mark_obsolete();
    }

    /// Queue a callback to run when the Snap becomes obsolete.
    ///
    /// Runs immediately if it already is; dropped if the Snap is `Forever`.
    pub fn when_obsolete_run(&self, f: impl FnOnce() + 'static) {
        let fire_now = {
            let mut state = self.0.borrow_mut();
            match &mut *state {
                SnapState::Ready(_, queue) | SnapState::Pending(_, queue) => {
                    queue.push(ObsoleteHook::callback(f));
                    None
                }
                SnapState::Obsolete => Some(f),
                SnapState::Forever(_) => None,
            }
        };
        if let Some(f) = fire_now {
            f();
        }
    }

    /// Queue an obsolete hook, compacting the queue.
    pub fn when_obsolete(&self, hook: ObsoleteHook) {
        let fire_now = {
            let mut state = self.0.borrow_mut();
            match &mut *state {
                SnapState::Ready(_, queue) | SnapState::Pending(_, queue) => {
                    enqueue_safe(queue, hook);
                    None
                }
                SnapState::Obsolete => Some(hook),
                SnapState::Forever(_) => None,
            }
        };
        if let Some(hook) = fire_now {
            hook.fire();
        }
    }
}

impl<T: 'static> Snap<T> {
    /// This Snap as an obsolete hook for an upstream queue.
    pub fn hook(&self) -> ObsoleteHook {
        let cell: Rc<dyn Obsoletable> = self.0.clone();
        ObsoleteHook::Snap(cell)
    }
}

impl<T: Clone + 'static> Snap<T> {
    /// The value, if available.
    pub fn value(&self) -> Option<T> {
        self.value_and_forever().map(|(v, _)| v)
    }

    /// The value plus whether it is terminal, if available.
    pub fn value_and_forever(&self) -> Option<(T, bool)> {
        match &*self.0.borrow() {
            SnapState::Forever(v) => Some((v.clone(), true)),
            SnapState::Ready(v, _) => Some((v.clone(), false)),
            _ => None,
        }
    }

    fn forever_value(&self) -> Option<T> {
        match &*self.0.borrow() {
            SnapState::Forever(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Resolve a `Pending` Snap with a terminal value.
    ///
    /// Queued available callbacks fire once; obsolete hooks are dropped since
    /// a terminal Snap never becomes obsolete. No-op in any other state.
    pub fn mark_forever(&self, value: T) {
        let callbacks = {
            let mut state = self.0.borrow_mut();
            if !matches!(*state, SnapState::Pending(..)) {
                return;
            }
            let SnapState::Pending(callbacks, _) =
                std::mem::replace(&mut *state, SnapState::Forever(value.clone()))
            else {
                return;
            };
            callbacks
        };
        for callback in callbacks {
            callback(&value, true);
        }
    }

    /// Resolve a `Pending` Snap with a value that may become obsolete.
    pub fn mark_ready(&self, value: T) {
        let callbacks = {
            let mut state = self.0.borrow_mut();
            if !matches!(*state, SnapState::Pending(..)) {
                return;
            }
            let SnapState::Pending(callbacks, hooks) =
                std::mem::replace(&mut *state, SnapState::Obsolete)
            else {
                return;
            };
            *state = SnapState::Ready(value.clone(), hooks);
            callbacks
        };
        for callback in callbacks {
            callback(&value, false);
        }
    }

    /// Resolve with `mark_forever` when the source was terminal, `mark_ready`
    /// otherwise.
    pub fn mark_done(&self, source_forever: bool, value: T) {
        if source_forever {
            self.mark_forever(value);
        } else {
            self.mark_ready(value);
        }
    }

    /// Subscribe to availability and obsolescence.
    ///
    /// - `Obsolete`: the hook fires now, `avail` never runs.
    /// - `Ready`: the hook is queued (with compaction), `avail` runs now.
    /// - `Forever`: `avail` runs now, the hook is dropped.
    /// - `Pending`: both are queued.
    ///
    /// `avail` receives the value and whether it is terminal.
    pub fn when(&self, avail: impl FnOnce(&T, bool) + 'static, hook: ObsoleteHook) {
        self.dispatch(Box::new(avail), hook, true);
    }

    /// Like [`when`](Self::when) with a callback hook and no compaction.
    pub fn when_run(&self, avail: impl FnOnce(&T, bool) + 'static, obs: impl FnOnce() + 'static) {
        self.dispatch(Box::new(avail), ObsoleteHook::callback(obs), false);
    }

    fn dispatch(&self, avail: AvailableCallback<T>, hook: ObsoleteHook, compact: bool) {
        let push = |queue: &mut Vec<ObsoleteHook>, hook: ObsoleteHook| {
            if compact {
                enqueue_safe(queue, hook);
            } else {
                queue.push(hook);
            }
        };
        let dispatch = {
            let mut state = self.0.borrow_mut();
            match &mut *state {
                SnapState::Obsolete => Dispatch::Obsolete(hook),
                SnapState::Ready(v, queue) => {
                    let v = v.clone();
                    push(queue, hook);
                    Dispatch::Available(avail, v, false)
                }
                SnapState::Pending(callbacks, queue) => {
                    callbacks.push(avail);
                    push(queue, hook);
                    Dispatch::Queued
                }
                SnapState::Forever(v) => Dispatch::Available(avail, v.clone(), true),
            }
        };
        match dispatch {
            Dispatch::Available(avail, v, forever) => avail(&v, forever),
            Dispatch::Obsolete(hook) => hook.fire(),
            Dispatch::Queued => {}
        }
    }

    /// Project the value.
    ///
    /// A terminal input yields a terminal result without allocating a
    /// subscription.
    pub fn map<U: Clone + 'static>(&self, f: impl FnOnce(&T) -> U + 'static) -> Snap<U> {
        if let Some(v) = self.forever_value() {
            return Snap::forever(f(&v));
        }
        let res = Snap::pending();
        let target = res.clone();
        self.when(move |v, forever| target.mark_done(forever, f(v)), res.hook());
        res
    }

    /// A Snap carrying the same value, detached from this Snap's callbacks.
    pub fn copy(&self) -> Snap<T> {
        match self.kind() {
            SnapKind::Obsolete | SnapKind::Forever => self.clone(),
            SnapKind::Ready => match self.value() {
                Some(v) => {
                    let res = Snap::ready(v);
                    self.when_obsolete(res.hook());
                    res
                }
                None => self.clone(),
            },
            SnapKind::Pending => {
                let res = Snap::pending();
                let target = res.clone();
                self.when(move |v, forever| target.mark_done(forever, v.clone()), res.hook());
                res
            }
        }
    }

    /// Combine two Snaps.
    ///
    /// The result is `Forever` iff both inputs are `Forever` once both are
    /// available.
    pub fn map2<A, B>(a: &Snap<A>, b: &Snap<B>, f: impl Fn(&A, &B) -> T + 'static) -> Snap<T>
    where
        A: Clone + 'static,
        B: Clone + 'static,
    {
        match (a.forever_value(), b.forever_value()) {
            (Some(x), Some(y)) => Snap::forever(f(&x, &y)),
            (Some(x), None) => b.map(move |y| f(&x, y)),
            (None, Some(y)) => a.map(move |x| f(x, &y)),
            (None, None) => {
                let res = Snap::pending();
                let cont: Rc<dyn Fn()> = {
                    let (res, a, b) = (res.clone(), a.clone(), b.clone());
                    Rc::new(move || {
                        if res.is_available() {
                            return;
                        }
                        if let (Some((x, fx)), Some((y, fy))) =
                            (a.value_and_forever(), b.value_and_forever())
                        {
                            res.mark_done(fx && fy, f(&x, &y));
                        }
                    })
                };
                let c1 = cont.clone();
                a.when(move |_, _| c1(), res.hook());
                b.when(move |_, _| cont(), res.hook());
                res
            }
        }
    }

    /// Combine three Snaps.
    ///
    /// When some inputs are already terminal the combination collapses to a
    /// `map` or `map2` over the remaining ones.
    pub fn map3<A, B, C>(
        a: &Snap<A>,
        b: &Snap<B>,
        c: &Snap<C>,
        f: impl Fn(&A, &B, &C) -> T + 'static,
    ) -> Snap<T>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        C: Clone + 'static,
    {
        match (a.forever_value(), b.forever_value(), c.forever_value()) {
            (Some(x), Some(y), Some(z)) => Snap::forever(f(&x, &y, &z)),
            (Some(x), Some(y), None) => c.map(move |z| f(&x, &y, z)),
            (Some(x), None, Some(z)) => b.map(move |y| f(&x, y, &z)),
            (Some(x), None, None) => Snap::map2(b, c, move |y, z| f(&x, y, z)),
            (None, Some(y), Some(z)) => a.map(move |x| f(x, &y, &z)),
            (None, Some(y), None) => Snap::map2(a, c, move |x, z| f(x, &y, z)),
            (None, None, Some(z)) => Snap::map2(a, b, move |x, y| f(x, y, &z)),
            (None, None, None) => {
                let res = Snap::pending();
                let cont: Rc<dyn Fn()> = {
                    let (res, a, b, c) = (res.clone(), a.clone(), b.clone(), c.clone());
                    Rc::new(move || {
                        if res.is_available() {
                            return;
                        }
                        if let (Some((x, fx)), Some((y, fy)), Some((z, fz))) = (
                            a.value_and_forever(),
                            b.value_and_forever(),
                            c.value_and_forever(),
                        ) {
                            res.mark_done(fx && fy && fz, f(&x, &y, &z));
                        }
                    })
                };
                let (c1, c2) = (cont.clone(), cont.clone());
                a.when(move |_, _| c1(), res.hook());
                b.when(move |_, _| c2(), res.hook());
                c.when(move |_, _| cont(), res.hook());
                res
            }
        }
    }

    /// Flatten a Snap of Views: the result follows the inner View's Snap and
    /// becomes obsolete when either layer does.
    pub fn join(outer: &Snap<View<T>>) -> Snap<T> {
        let res = Snap::pending();
        let target = res.clone();
        outer.when(
            move |view, outer_forever| {
                let inner = view.snap();
                let hook = target.hook();
                inner.when(
                    move |v, inner_forever| target.mark_done(outer_forever && inner_forever, v.clone()),
                    hook,
                );
            },
            res.hook(),
        );
        res
    }
}

impl<T: Clone + 'static> Snap<Vec<T>> {
    /// Combine any number of Snaps into a Snap of their values, in order.
    ///
    /// # Panics
    ///
    /// If an input reports availability but holds no value when the last
    /// input arrives; that is a broken Snap, not a user error.
    pub fn sequence(snaps: impl IntoIterator<Item = Snap<T>>) -> Snap<Vec<T>> {
        let snaps: Rc<Vec<Snap<T>>> = Rc::new(snaps.into_iter().collect());
        if snaps.is_empty() {
            return Snap::forever(Vec::new());
        }
        let res = Snap::pending();
        let waiting = Rc::new(Cell::new(snaps.len() - 1));
        let cont: Rc<dyn Fn()> = {
            let (res, snaps) = (res.clone(), snaps.clone());
            Rc::new(move || {
                if waiting.get() > 0 {
                    waiting.set(waiting.get() - 1);
                    return;
                }
                let mut all_forever = true;
                let values = snaps
                    .iter()
                    .map(|s| match s.value_and_forever() {
                        Some((v, forever)) => {
                            all_forever &= forever;
                            v
                        }
                        None => panic!("value not found by Snap::sequence"),
                    })
                    .collect();
                res.mark_done(all_forever, values);
            })
        };
        for snap in snaps.iter() {
            let cont = cont.clone();
            snap.when(move |_, _| cont(), res.hook());
        }
        res
    }
}

impl Snap<()> {
    /// Combine two unit Snaps; a terminal side is skipped entirely.
    pub fn map2_unit(a: &Snap<()>, b: &Snap<()>) -> Snap<()> {
        match (a.is_forever(), b.is_forever()) {
            (true, true) => Snap::forever(()),
            (true, false) => b.clone(),
            (false, true) => a.clone(),
            (false, false) => Snap::map2(a, b, |_, _| ()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() -> Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move || c.clone())
    }

    #[test]
    fn test_state_transitions() {
        let snap: Snap<i32> = Snap::pending();
        assert_eq!(snap.kind(), SnapKind::Pending);
        snap.mark_ready(1);
        assert_eq!(snap.kind(), SnapKind::Ready);
        assert_eq!(snap.value(), Some(1));

        // Already resolved: a second resolution is ignored.
        snap.mark_forever(2);
        assert_eq!(snap.value_and_forever(), Some((1, false)));

        snap.obsolete();
        assert_eq!(snap.kind(), SnapKind::Obsolete);
        assert_eq!(snap.value(), None);
    }

    #[test]
    fn test_forever_never_obsolete() {
        let snap = Snap::forever(5);
        snap.obsolete();
        assert!(snap.is_forever());
    }

    #[test]
    fn test_obsolete_is_idempotent() {
        let (count, handle) = counter();
        let snap = Snap::ready(1);
        let c = handle();
        snap.when_obsolete_run(move || c.set(c.get() + 1));

        snap.obsolete();
        snap.obsolete();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_obsolete_cascades() {
        let upstream = Snap::ready(1);
        let downstream: Snap<i32> = Snap::pending();
        upstream.when_obsolete(downstream.hook());

        upstream.obsolete();
        assert!(downstream.is_obsolete());
    }

    #[test]
    fn test_when_dispatch() {
        let seen = Rc::new(RefCell::new(Vec::new()));

        let pending: Snap<i32> = Snap::pending();
        let s = seen.clone();
        pending.when(move |v, forever| s.borrow_mut().push((*v, forever)), ObsoleteHook::callback(|| {}));
        assert!(seen.borrow().is_empty());
        pending.mark_forever(7);
        assert_eq!(*seen.borrow(), vec![(7, true)]);

        let obsolete: Snap<i32> = Snap::ready(0);
        obsolete.obsolete();
        let (count, handle) = counter();
        let c = handle();
        obsolete.when(|_, _| panic!("no value"), ObsoleteHook::callback(move || c.set(1)));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_map_of_forever_is_forever() {
        let snap = Snap::forever(2).map(|x| x * 10);
        assert_eq!(snap.value_and_forever(), Some((20, true)));
    }

    #[test]
    fn test_map_follows_ready_source() {
        let src = Snap::ready(3);
        let mapped = src.map(|x| x + 1);
        assert_eq!(mapped.value_and_forever(), Some((4, false)));

        src.obsolete();
        assert!(mapped.is_obsolete());
    }

    #[test]
    fn test_map2_waits_for_both() {
        let a: Snap<i32> = Snap::pending();
        let b: Snap<i32> = Snap::pending();
        let sum = Snap::map2(&a, &b, |x, y| x + y);

        a.mark_forever(1);
        assert_eq!(sum.kind(), SnapKind::Pending);
        b.mark_ready(2);
        assert_eq!(sum.value_and_forever(), Some((3, false)));
    }

    #[test]
    fn test_map2_all_forever() {
        let a: Snap<i32> = Snap::pending();
        let b: Snap<i32> = Snap::pending();
        let sum = Snap::map2(&a, &b, |x, y| x + y);
        a.mark_forever(1);
        b.mark_forever(2);
        assert_eq!(sum.value_and_forever(), Some((3, true)));
    }

    #[test]
    fn test_map3_fast_paths() {
        let x = Snap::forever(1);
        let y = Snap::ready(2);
        let z = Snap::forever(3);
        let total = Snap::map3(&x, &y, &z, |a, b, c| a + b + c);
        assert_eq!(total.value_and_forever(), Some((6, false)));

        y.obsolete();
        assert!(total.is_obsolete());

        let all = Snap::map3(&Snap::forever(1), &Snap::forever(1), &Snap::forever(1), |a, b, c| a + b + c);
        assert_eq!(all.value_and_forever(), Some((3, true)));
    }

    #[test]
    fn test_diamond_fires_once() {
        let root: Snap<i32> = Snap::pending();
        let left = root.map(|x| x + 1);
        let right = root.map(|x| x * 2);
        let (count, handle) = counter();
        let c = handle();
        let joined = Snap::map2(&left, &right, move |l, r| {
            c.set(c.get() + 1);
            l + r
        });

        root.mark_ready(5);
        assert_eq!(joined.value(), Some(16));
        assert_eq!(count.get(), 1);

        root.obsolete();
        assert!(joined.is_obsolete());
    }

    #[test]
    fn test_sequence() {
        let empty: Snap<Vec<i32>> = Snap::sequence(Vec::new());
        assert_eq!(empty.value_and_forever(), Some((vec![], true)));

        let a: Snap<i32> = Snap::pending();
        let b = Snap::forever(2);
        let c: Snap<i32> = Snap::pending();
        let all = Snap::sequence(vec![a.clone(), b, c.clone()]);
        c.mark_ready(3);
        assert_eq!(all.kind(), SnapKind::Pending);
        a.mark_forever(1);
        assert_eq!(all.value_and_forever(), Some((vec![1, 2, 3], false)));
    }

    #[test]
    fn test_map2_unit_skips_forever() {
        let live = Snap::ready(());
        let combined = Snap::map2_unit(&Snap::forever(()), &live);
        assert!(combined.ptr_eq(&live));
    }

    #[test]
    fn test_copy_detaches() {
        let src = Snap::ready(1);
        let copy = src.copy();
        assert!(!copy.ptr_eq(&src));
        assert_eq!(copy.value(), Some(1));
        src.obsolete();
        assert!(copy.is_obsolete());
    }

    #[test]
    fn test_compaction_keeps_order_and_live_hooks() {
        let snap = Snap::ready(0);
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut dead = Vec::new();
        for i in 0..COMPACTION_INTERVAL * 2 {
            if i % 2 == 0 {
                let target: Snap<i32> = Snap::pending();
                target.obsolete();
                snap.when_obsolete(target.hook());
                dead.push(target);
            } else {
                let o = order.clone();
                snap.when_obsolete(ObsoleteHook::callback(move || o.borrow_mut().push(i)));
            }
        }
        {
            let state = snap.0.borrow();
            let SnapState::Ready(_, queue) = &*state else { panic!("expected ready") };
            assert_eq!(queue.len(), COMPACTION_INTERVAL);
        }
        snap.obsolete();
        let expected: Vec<usize> = (0..COMPACTION_INTERVAL * 2).filter(|i| i % 2 == 1).collect();
        assert_eq!(*order.borrow(), expected);
    }
}
