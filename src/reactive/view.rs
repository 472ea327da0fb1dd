//! View - memoized, recomputable projections over Snaps.
//!
//! A View is a function `() -> Snap<T>`. Pulling it is synchronous. Views
//! built with [`View::create_lazy`] cache the last Snap they produced and
//! only recompute once that Snap has become obsolete; when the cached Snap is
//! `Forever` the generator is dropped for good.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::snap::Snap;
use crate::concurrency::Scheduler;

type Observe<T> = Rc<dyn Fn() -> Snap<T>>;

// =============================================================================
// Lazy memoization
// =============================================================================

enum LazyState<T> {
    /// No cached Snap; next pull runs the generator.
    Idle(Observe<T>),
    /// Cached Snap, dropped when it becomes obsolete.
    Cached(Observe<T>, Snap<T>),
    /// Cached terminal Snap; the generator is gone.
    Final(Snap<T>),
}

fn pull_lazy<T: Clone + 'static>(state: &Rc<RefCell<LazyState<T>>>) -> Snap<T> {
    let observe = match &*state.borrow() {
        LazyState::Cached(_, snap) | LazyState::Final(snap) => return snap.clone(),
        LazyState::Idle(observe) => observe.clone(),
    };

    let snap = observe();
    if snap.is_forever() {
        *state.borrow_mut() = LazyState::Final(snap.clone());
        return snap;
    }
    *state.borrow_mut() = LazyState::Cached(observe, snap.clone());

    let weak: Weak<RefCell<LazyState<T>>> = Rc::downgrade(state);
    let cached = snap.as_ptr();
    snap.when_obsolete_run(move || {
        let Some(state) = weak.upgrade() else {
            return;
        };
        let mut state = state.borrow_mut();
        let reset = match &*state {
            LazyState::Cached(observe, current) if current.as_ptr() == cached => Some(observe.clone()),
            _ => None,
        };
        if let Some(observe) = reset {
            *state = LazyState::Idle(observe);
        }
    });
    snap
}

// =============================================================================
// View
// =============================================================================

/// A reactive value that can be observed as a sequence of Snaps.
pub struct View<T>(Observe<T>);

impl<T> Clone for View<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for View<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("View(..)")
    }
}

impl<T: Clone + 'static> View<T> {
    /// Wrap a raw observer. No memoization.
    pub fn from_fn(observe: impl Fn() -> Snap<T> + 'static) -> Self {
        Self(Rc::new(observe))
    }

    /// Wrap an observer with single-slot memoization.
    pub fn create_lazy(observe: impl Fn() -> Snap<T> + 'static) -> Self {
        let state = Rc::new(RefCell::new(LazyState::Idle(Rc::new(observe) as Observe<T>)));
        Self(Rc::new(move || pull_lazy(&state)))
    }

    /// A View that never changes.
    pub fn constant(value: T) -> Self {
        let snap = Snap::forever(value);
        Self(Rc::new(move || snap.clone()))
    }

    /// Pull the current Snap.
    pub fn snap(&self) -> Snap<T> {
        (self.0)()
    }

    /// The current value, if the current Snap has one.
    pub fn try_get(&self) -> Option<T> {
        self.snap().value()
    }

    pub fn map<U: Clone + 'static>(&self, f: impl Fn(&T) -> U + 'static) -> View<U> {
        let src = self.clone();
        let f = Rc::new(f);
        View::create_lazy(move || {
            let f = f.clone();
            src.snap().map(move |v| f(v))
        })
    }

    pub fn map2<A, B>(a: &View<A>, b: &View<B>, f: impl Fn(&A, &B) -> T + 'static) -> View<T>
    where
        A: Clone + 'static,
        B: Clone + 'static,
    {
        let (a, b) = (a.clone(), b.clone());
        let f = Rc::new(f);
        View::create_lazy(move || {
            let f = f.clone();
            Snap::map2(&a.snap(), &b.snap(), move |x, y| f(x, y))
        })
    }

    pub fn map3<A, B, C>(
        a: &View<A>,
        b: &View<B>,
        c: &View<C>,
        f: impl Fn(&A, &B, &C) -> T + 'static,
    ) -> View<T>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        C: Clone + 'static,
    {
        let (a, b, c) = (a.clone(), b.clone(), c.clone());
        let f = Rc::new(f);
        View::create_lazy(move || {
            let f = f.clone();
            Snap::map3(&a.snap(), &b.snap(), &c.snap(), move |x, y, z| f(x, y, z))
        })
    }

    /// Flatten a View of Views.
    pub fn join(outer: &View<View<T>>) -> View<T> {
        let outer = outer.clone();
        View::create_lazy(move || Snap::join(&outer.snap()))
    }

    /// Monadic bind: the result follows whichever View `f` picks.
    pub fn bind<U: Clone + 'static>(&self, f: impl Fn(&T) -> View<U> + 'static) -> View<U> {
        View::join(&self.map(f))
    }

    /// Run `act` on every value, resubscribing after each obsolescence.
    ///
    /// The first pull and every re-pull are forked onto `scheduler`, so a
    /// burst of writes between two ticks produces a single call.
    pub fn sink(&self, scheduler: &Scheduler, act: impl Fn(&T) + 'static) -> Subscription {
        let active = Rc::new(Cell::new(true));
        let sink = Rc::new(SinkLoop {
            view: self.clone(),
            act: Rc::new(act),
            scheduler: scheduler.clone(),
            active: active.clone(),
        });
        scheduler.fork(move || sink.run());
        Subscription { active }
    }
}

impl<T: Clone + 'static> View<Vec<T>> {
    /// Combine any number of Views into a View of their values, in order.
    pub fn sequence(views: impl IntoIterator<Item = View<T>>) -> View<Vec<T>> {
        let views: Vec<View<T>> = views.into_iter().collect();
        View::create_lazy(move || Snap::sequence(views.iter().map(View::snap)))
    }
}

impl View<()> {
    /// Combine two change signals, skipping terminal sides.
    pub fn map2_unit(a: &View<()>, b: &View<()>) -> View<()> {
        let (a, b) = (a.clone(), b.clone());
        View::create_lazy(move || Snap::map2_unit(&a.snap(), &b.snap()))
    }
}

// =============================================================================
// Sink
// =============================================================================

struct SinkLoop<T> {
    view: View<T>,
    act: Rc<dyn Fn(&T)>,
    scheduler: Scheduler,
    active: Rc<Cell<bool>>,
}

impl<T: Clone + 'static> SinkLoop<T> {
    fn run(self: Rc<Self>) {
        if !self.active.get() {
            return;
        }
        let snap = self.view.snap();
        let act = self.act.clone();
        let active = self.active.clone();
        snap.when_run(
            move |value, _| {
                if active.get() {
                    act(value);
                }
            },
            move || {
                let scheduler = self.scheduler.clone();
                scheduler.fork(move || self.run());
            },
        );
    }
}

/// Handle returned by [`View::sink`].
///
/// Dropping it leaves the sink running; call [`dispose`](Self::dispose) to
/// stop it.
#[derive(Debug, Clone)]
pub struct Subscription {
    active: Rc<Cell<bool>>,
}

impl Subscription {
    /// Stop delivering values. The loop ends at the next obsolescence.
    pub fn dispose(&self) {
        self.active.set(false);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryHost;
    use crate::reactive::{SnapKind, Var};

    #[test]
    fn test_constant_is_forever() {
        let v = View::constant(3);
        assert_eq!(v.snap().kind(), SnapKind::Forever);
        assert_eq!(v.try_get(), Some(3));
    }

    #[test]
    fn test_lazy_memoizes_until_obsolete() {
        let calls = Rc::new(Cell::new(0));
        let var = Var::create(1);
        let c = calls.clone();
        let src = var.view();
        let view = View::create_lazy(move || {
            c.set(c.get() + 1);
            src.snap().map(|x| x * 2)
        });

        assert_eq!(view.try_get(), Some(2));
        assert_eq!(view.try_get(), Some(2));
        assert_eq!(calls.get(), 1);

        var.set(5);
        assert_eq!(view.try_get(), Some(10));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_lazy_forever_drops_generator() {
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let view = View::create_lazy(move || {
            c.set(c.get() + 1);
            Snap::forever(1)
        });
        view.snap();
        view.snap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_map2_of_constants_is_forever() {
        let v = View::map2(&View::constant(2), &View::constant(3), |a, b| a * b);
        let snap = v.snap();
        assert_eq!(snap.value_and_forever(), Some((6, true)));
    }

    #[test]
    fn test_map3_follows_vars() {
        let a = Var::create(1);
        let b = Var::create(2);
        let v = View::map3(&a.view(), &b.view(), &View::constant(10), |x, y, z| x + y + z);
        assert_eq!(v.try_get(), Some(13));
        b.set(5);
        assert_eq!(v.try_get(), Some(16));
    }

    #[test]
    fn test_sequence_and_bind() {
        let a = Var::create(1);
        let seq = View::sequence(vec![a.view(), View::constant(2)]);
        assert_eq!(seq.try_get(), Some(vec![1, 2]));

        let flag = Var::create(true);
        let left = Var::create("left");
        let right = View::constant("right");
        let lv = left.view();
        let chosen = flag.view().bind(move |f| if *f { lv.clone() } else { right.clone() });
        assert_eq!(chosen.try_get(), Some("left"));
        left.set("LEFT");
        assert_eq!(chosen.try_get(), Some("LEFT"));
        flag.set(false);
        assert_eq!(chosen.try_get(), Some("right"));
    }

    #[test]
    fn test_sink_runs_on_scheduler() {
        let host = MemoryHost::new();
        let scheduler = Scheduler::new(host.event_loop(), 40.0);
        let var = Var::create(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let sub = var.view().sink(&scheduler, move |v| s.borrow_mut().push(*v));

        assert!(seen.borrow().is_empty());
        host.flush();
        assert_eq!(*seen.borrow(), vec![1]);

        var.set(2);
        var.set(3);
        host.flush();
        assert_eq!(*seen.borrow(), vec![1, 3]);

        sub.dispose();
        var.set(4);
        host.flush();
        assert_eq!(*seen.borrow(), vec![1, 3]);
    }
}
