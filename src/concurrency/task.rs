//! Continuation-passing asynchronous computations.
//!
//! An [`Async<T>`] is a reusable function of an [`AsyncBody`]: the
//! continuation to call exactly once with an [`Outcome`], the cancellation
//! token, and the scheduler that trampolines every step.
//!
//! ```text
//! comp.bind(f):  check token ─▶ run comp ─▶ Ok(x)  ─fork─▶ f(x) runs with the same body
//!                    │                  └─▶ Err/Cancelled ─fork─▶ k(outcome)
//!                    └─ cancelled ─▶ k(Cancelled)
//! ```
//!
//! Forking every continuation keeps the stack flat for long chains.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use tracing::error;

use super::cancellation::CancellationToken;
use super::scheduler::Scheduler;
use crate::error::{AsyncError, OperationCanceled};

/// How a computation finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Err(AsyncError),
    Cancelled(OperationCanceled),
}

/// Continuation record handed to a computation.
pub struct AsyncBody<T> {
    pub k: Box<dyn FnOnce(Outcome<T>)>,
    pub token: CancellationToken,
    pub scheduler: Scheduler,
}

impl<T> AsyncBody<T> {
    fn finish(self, outcome: Outcome<T>) {
        (self.k)(outcome)
    }
}

/// A reusable asynchronous computation producing `T`.
pub struct Async<T>(Rc<dyn Fn(AsyncBody<T>)>);

impl<T> Clone for Async<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Async<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Async(..)")
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

type Continuation<T> = Box<dyn FnOnce(Outcome<T>)>;

/// Build and run a computation with its continuation parked in a one-shot
/// slot. A panic escaping the build or the run goes to the continuation if
/// it has not been called yet, and never unwinds into the scheduler.
fn run_guarded<T: 'static>(make: impl FnOnce() -> Async<T>, body: AsyncBody<T>) {
    let AsyncBody { k, token, scheduler } = body;
    let slot: Rc<RefCell<Option<Continuation<T>>>> = Rc::new(RefCell::new(Some(k)));
    let once = slot.clone();
    let run = AssertUnwindSafe(move || {
        make().run(AsyncBody {
            k: Box::new(move |outcome| {
                let k = once.borrow_mut().take();
                if let Some(k) = k {
                    k(outcome);
                }
            }),
            token,
            scheduler,
        });
    });
    if let Err(payload) = catch_unwind(run) {
        let message = panic_message(payload);
        let k = slot.borrow_mut().take();
        match k {
            Some(k) => k(Outcome::Err(AsyncError::Panicked(message))),
            None => error!(panic = %message, "panic after the continuation was called"),
        }
    }
}

impl<T: 'static> Async<T> {
    /// Build from a raw body function.
    pub fn new(run: impl Fn(AsyncBody<T>) + 'static) -> Self {
        Self(Rc::new(run))
    }

    /// Run with an explicit body.
    pub fn run(&self, body: AsyncBody<T>) {
        (self.0)(body)
    }

    /// Succeed with `value`.
    pub fn ret(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(move |body| body.finish(Outcome::Ok(value.clone())))
    }

    /// Fail with `error`.
    pub fn fail(error: AsyncError) -> Self {
        Self::new(move |body| body.finish(Outcome::Err(error.clone())))
    }

    /// Build the computation when it runs. A panic while building or
    /// running it becomes an `Err`.
    pub fn delay(make: impl Fn() -> Async<T> + 'static) -> Self {
        Self::new(move |body| run_guarded(|| make(), body))
    }

    /// Sequence with `f`. The continuation is forked through the scheduler;
    /// a panic inside `f` or the computation it returns is routed to the
    /// error continuation.
    pub fn bind<U: 'static>(&self, f: impl Fn(T) -> Async<U> + 'static) -> Async<U> {
        let comp = self.clone();
        let f = Rc::new(f);
        Async::new(move |body: AsyncBody<U>| {
            if body.token.is_cancellation_requested() {
                body.finish(Outcome::Cancelled(OperationCanceled));
                return;
            }
            let AsyncBody { k, token, scheduler } = body;
            let f = f.clone();
            let (next_token, next_scheduler) = (token.clone(), scheduler.clone());
            comp.run(AsyncBody {
                k: Box::new(move |outcome| {
                    let fork_on = next_scheduler.clone();
                    fork_on.fork(move || match outcome {
                        Outcome::Ok(x) => run_guarded(
                            move || f(x),
                            AsyncBody {
                                k,
                                token: next_token,
                                scheduler: next_scheduler,
                            },
                        ),
                        Outcome::Err(e) => k(Outcome::Err(e)),
                        Outcome::Cancelled(c) => k(Outcome::Cancelled(c)),
                    });
                }),
                token,
                scheduler,
            });
        })
    }

    /// Project the result.
    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Async<U> {
        let comp = self.clone();
        let f = Rc::new(f);
        Async::new(move |body: AsyncBody<U>| {
            let AsyncBody { k, token, scheduler } = body;
            let f = f.clone();
            comp.run(AsyncBody {
                k: Box::new(move |outcome| match outcome {
                    Outcome::Ok(x) => match catch_unwind(AssertUnwindSafe(|| f(x))) {
                        Ok(y) => k(Outcome::Ok(y)),
                        Err(payload) => k(Outcome::Err(AsyncError::Panicked(panic_message(payload)))),
                    },
                    Outcome::Err(e) => k(Outcome::Err(e)),
                    Outcome::Cancelled(c) => k(Outcome::Cancelled(c)),
                }),
                token,
                scheduler,
            });
        })
    }

    /// Wrap a callback-based API.
    ///
    /// `subscribe` receives one-shot [`Continuations`]; the chosen one is
    /// forked through the scheduler.
    pub fn from_continuations(subscribe: impl Fn(Continuations<T>) + 'static) -> Self {
        Self::new(move |body| {
            let AsyncBody { k, scheduler, .. } = body;
            subscribe(Continuations(Rc::new(ContinuationState {
                continued: Cell::new(false),
                k: RefCell::new(Some(k)),
                scheduler,
            })));
        })
    }

    /// Fork the computation and hand its outcome to `k`.
    ///
    /// Does nothing if `token` is already cancelled when the fork runs.
    pub fn start_with(
        &self,
        scheduler: &Scheduler,
        token: CancellationToken,
        k: impl FnOnce(Outcome<T>) + 'static,
    ) {
        let comp = self.clone();
        let body_scheduler = scheduler.clone();
        scheduler.fork(move || {
            if token.is_cancellation_requested() {
                return;
            }
            comp.run(AsyncBody {
                k: Box::new(k),
                token,
                scheduler: body_scheduler,
            });
        });
    }

    /// Fork the computation, discarding its result. Errors are logged.
    pub fn start(&self, scheduler: &Scheduler, token: Option<CancellationToken>) {
        self.start_with(scheduler, token.unwrap_or_default(), |outcome| {
            if let Outcome::Err(e) = outcome {
                error!(error = %e, "uncaught asynchronous error");
            }
        });
    }
}

impl Async<()> {
    /// Succeed with `()`.
    pub fn zero() -> Self {
        Self::ret(())
    }
}

// =============================================================================
// Continuations
// =============================================================================

struct ContinuationState<T> {
    continued: Cell<bool>,
    k: RefCell<Option<Box<dyn FnOnce(Outcome<T>)>>>,
    scheduler: Scheduler,
}

/// One-shot success/error/cancel callbacks given to
/// [`Async::from_continuations`].
///
/// # Panics
///
/// Invoking any of them after one has already been invoked.
pub struct Continuations<T>(Rc<ContinuationState<T>>);

impl<T> Clone for Continuations<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: 'static> Continuations<T> {
    fn once(&self, outcome: Outcome<T>) {
        if self.0.continued.replace(true) {
            panic!("a continuation provided by Async::from_continuations was invoked multiple times");
        }
        if let Some(k) = self.0.k.borrow_mut().take() {
            self.0.scheduler.fork(move || k(outcome));
        }
    }

    pub fn ok(&self, value: T) {
        self.once(Outcome::Ok(value));
    }

    pub fn err(&self, error: AsyncError) {
        self.once(Outcome::Err(error));
    }

    pub fn cancel(&self) {
        self.once(Outcome::Cancelled(OperationCanceled));
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::CancellationTokenSource;
    use crate::dom::MemoryHost;

    fn setup() -> (MemoryHost, Scheduler) {
        let host = MemoryHost::new();
        let scheduler = Scheduler::new(host.event_loop(), 40.0);
        (host, scheduler)
    }

    fn collect<T: 'static>(
        comp: &Async<T>,
        scheduler: &Scheduler,
        token: CancellationToken,
    ) -> Rc<RefCell<Option<Outcome<T>>>> {
        let slot = Rc::new(RefCell::new(None));
        let s = slot.clone();
        comp.start_with(scheduler, token, move |o| *s.borrow_mut() = Some(o));
        slot
    }

    #[test]
    fn test_bind_chain() {
        let (host, scheduler) = setup();
        let comp = Async::ret(2).bind(|x| Async::ret(x * 3)).map(|x| x + 1);
        let out = collect(&comp, &scheduler, CancellationToken::none());
        host.flush();
        assert_eq!(*out.borrow(), Some(Outcome::Ok(7)));
    }

    #[test]
    fn test_panic_in_bind_becomes_error() {
        let (host, scheduler) = setup();
        let comp: Async<i32> = Async::ret(1).bind(|_| -> Async<i32> { panic!("boom") });
        let out = collect(&comp, &scheduler, CancellationToken::none());
        host.flush();
        assert_eq!(*out.borrow(), Some(Outcome::Err(AsyncError::Panicked("boom".into()))));
    }

    #[test]
    fn test_delay_catches_builder_panic() {
        let (host, scheduler) = setup();
        let comp: Async<()> = Async::delay(|| panic!("bad builder"));
        let out = collect(&comp, &scheduler, CancellationToken::none());
        host.flush();
        assert!(matches!(*out.borrow(), Some(Outcome::Err(AsyncError::Panicked(_)))));
    }

    #[test]
    fn test_cancellation_routes_to_cancel() {
        let (host, scheduler) = setup();
        let cts = CancellationTokenSource::new();
        let gate = Rc::new(RefCell::new(None::<Continuations<()>>));
        let g = gate.clone();
        let comp = Async::from_continuations(move |c| *g.borrow_mut() = Some(c))
            .bind(|()| Async::ret(1).bind(|x| Async::ret(x + 1)));
        let out = collect(&comp, &scheduler, cts.token());
        host.flush();
        assert_eq!(*out.borrow(), None);

        cts.cancel();
        let c = gate.borrow_mut().take();
        if let Some(c) = c {
            c.ok(());
        }
        host.flush();
        assert_eq!(*out.borrow(), Some(Outcome::Cancelled(OperationCanceled)));
    }

    #[test]
    fn test_cancelled_token_skips_computation() {
        let (_host, scheduler) = setup();
        let cts = CancellationTokenSource::new();
        cts.cancel();
        let comp = Async::<i32>::new(|_| panic!("must not run")).bind(Async::ret);
        let slot = Rc::new(RefCell::new(None));
        let s = slot.clone();
        comp.run(AsyncBody {
            k: Box::new(move |o| *s.borrow_mut() = Some(o)),
            token: cts.token(),
            scheduler,
        });
        assert_eq!(*slot.borrow(), Some(Outcome::Cancelled(OperationCanceled)));
    }

    #[test]
    #[should_panic(expected = "invoked multiple times")]
    fn test_double_continuation_panics() {
        let (_host, scheduler) = setup();
        let comp = Async::from_continuations(|c: Continuations<i32>| {
            c.ok(1);
            c.ok(2);
        });
        comp.run(AsyncBody {
            k: Box::new(|_| {}),
            token: CancellationToken::none(),
            scheduler,
        });
    }

    #[test]
    fn test_start_logs_errors_without_panicking() {
        let (host, scheduler) = setup();
        Async::<()>::fail(AsyncError::failed("nope")).start(&scheduler, None);
        host.flush();
        assert!(scheduler.is_idle());
    }
}
