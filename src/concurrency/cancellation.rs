//! Cooperative cancellation.
//!
//! A token is a shared flag plus a list of registrations. Nothing is
//! preempted: computations check the flag at each bind step.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Default)]
struct TokenState {
    cancelled: Cell<bool>,
    registrations: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Owner side: requests cancellation.
#[derive(Clone, Default)]
pub struct CancellationTokenSource(Rc<TokenState>);

/// Observer side: polled by computations.
///
/// [`CancellationToken::none`] can never be cancelled.
#[derive(Clone, Default)]
pub struct CancellationToken(Option<Rc<TokenState>>);

impl CancellationTokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancellationToken {
        CancellationToken(Some(self.0.clone()))
    }

    /// Set the flag and run registrations. Later calls do nothing.
    pub fn cancel(&self) {
        if self.0.cancelled.replace(true) {
            return;
        }
        let registrations = std::mem::take(&mut *self.0.registrations.borrow_mut());
        for f in registrations {
            f();
        }
    }

    pub fn is_cancellation_requested(&self) -> bool {
        self.0.cancelled.get()
    }
}

impl CancellationToken {
    /// A token nobody can cancel.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn is_cancellation_requested(&self) -> bool {
        self.0.as_ref().is_some_and(|s| s.cancelled.get())
    }

    /// Run `f` on cancellation, or now if already cancelled.
    pub fn register(&self, f: impl FnOnce() + 'static) {
        match &self.0 {
            Some(state) if state.cancelled.get() => f(),
            Some(state) => state.registrations.borrow_mut().push(Box::new(f)),
            None => {}
        }
    }
}

impl fmt::Debug for CancellationTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationTokenSource")
            .field("cancelled", &self.0.cancelled.get())
            .finish()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancellation_requested())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_runs_registrations_once() {
        let cts = CancellationTokenSource::new();
        let token = cts.token();
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        token.register(move || c.set(c.get() + 1));

        assert!(!token.is_cancellation_requested());
        cts.cancel();
        cts.cancel();
        assert!(token.is_cancellation_requested());
        assert_eq!(count.get(), 1);

        let c = count.clone();
        token.register(move || c.set(c.get() + 10));
        assert_eq!(count.get(), 11);
    }

    #[test]
    fn test_none_token() {
        let token = CancellationToken::none();
        token.register(|| panic!("never cancelled"));
        assert!(!token.is_cancellation_requested());
    }
}
