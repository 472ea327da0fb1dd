//! Animation lists: parallel actions plus finalizers.
//!
//! [`An::play`] runs every action in parallel on the frame clock, then runs
//! every finalizer in order.

use std::fmt;
use std::rc::Rc;

use super::anim::{Anim, Anims};
use super::append_list::AppendList;
use crate::concurrency::{Async, Continuations};
use crate::dom::EventLoop;
use crate::types::Millis;

#[derive(Clone)]
pub enum AnimItem {
    /// Runs once, after all actions completed.
    Finalize(Rc<dyn Fn()>),
    Action(Anim<()>),
}

impl fmt::Debug for AnimItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimItem::Finalize(_) => f.write_str("Finalize"),
            AnimItem::Action(a) => f.debug_tuple("Action").field(a).finish(),
        }
    }
}

/// A composable list of animation items.
#[derive(Debug, Clone, Default)]
pub struct An(AppendList<AnimItem>);

impl An {
    pub fn empty() -> Self {
        Self(AppendList::Empty)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A single action.
    pub fn pack(anim: Anim<()>) -> Self {
        Self(AppendList::single(AnimItem::Action(anim)))
    }

    pub fn append(&self, other: &An) -> Self {
        Self(self.0.append(&other.0))
    }

    pub fn concat(xs: impl IntoIterator<Item = An>) -> Self {
        Self(AppendList::concat(xs.into_iter().map(|a| a.0)))
    }

    /// Add a finalizer.
    pub fn when_done(&self, f: impl Fn() + 'static) -> Self {
        Self(self.0.append(&AppendList::single(AnimItem::Finalize(Rc::new(f)))))
    }

    /// All actions merged into one parallel action.
    pub fn actions(&self) -> Anim<()> {
        Anims::concat_actions(self.0.to_vec().into_iter().filter_map(|item| match item {
            AnimItem::Action(a) => Some(a),
            AnimItem::Finalize(_) => None,
        }))
    }

    /// Run the finalizers in order.
    pub fn finalize(&self) {
        for item in self.0.to_vec() {
            if let AnimItem::Finalize(f) = item {
                f();
            }
        }
    }

    /// Run all actions to completion, then the finalizers.
    pub fn play(&self, event_loop: &Rc<dyn EventLoop>) -> Async<()> {
        let this = self.clone();
        let ev = event_loop.clone();
        Async::delay(move || {
            let done = this.clone();
            An::run(&ev, this.actions()).map(move |()| done.finalize())
        })
    }

    /// Drive `anim` on animation frames until its duration has elapsed.
    ///
    /// Zero-length animations complete without waiting for a frame.
    pub fn run(event_loop: &Rc<dyn EventLoop>, anim: Anim<()>) -> Async<()> {
        if anim.duration() == 0.0 {
            return Async::zero();
        }
        let ev = event_loop.clone();
        Async::from_continuations(move |done: Continuations<()>| {
            let (anim, next_ev) = (anim.clone(), ev.clone());
            ev.request_animation_frame(Box::new(move |t| frame_loop(next_ev, anim, t, t, done)));
        })
    }
}

fn frame_loop(ev: Rc<dyn EventLoop>, anim: Anim<()>, start: Millis, now: Millis, done: Continuations<()>) {
    let t = now - start;
    anim.compute(t);
    if t <= anim.duration() {
        let next_ev = ev.clone();
        ev.request_animation_frame(Box::new(move |now| frame_loop(next_ev, anim, start, now, done)));
    } else {
        done.ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::{CancellationToken, Outcome, Scheduler};
    use crate::dom::MemoryHost;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_play_runs_actions_then_finalizers() {
        let host = MemoryHost::new();
        let scheduler = Scheduler::new(host.event_loop(), 40.0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        let action = Anims::def(40.0, move |t| l.borrow_mut().push(format!("frame {t}")));
        let l = log.clone();
        let an = An::pack(action).when_done(move || l.borrow_mut().push("done".to_string()));

        let finished = Rc::new(Cell::new(false));
        let f = finished.clone();
        an.play(&host.event_loop())
            .start_with(&scheduler, CancellationToken::none(), move |o| f.set(o == Outcome::Ok(())));
        host.flush();

        assert!(finished.get());
        assert_eq!(
            *log.borrow(),
            vec!["frame 0", "frame 16", "frame 32", "frame 48", "done"]
        );
    }

    #[test]
    fn test_empty_play_completes_without_frames() {
        let host = MemoryHost::new();
        let scheduler = Scheduler::new(host.event_loop(), 40.0);
        let finished = Rc::new(Cell::new(false));
        let f = finished.clone();
        An::empty()
            .play(&host.event_loop())
            .start_with(&scheduler, CancellationToken::none(), move |_| f.set(true));
        host.run_timers();
        assert!(finished.get());
        assert!(!host.has_pending_frames());
    }

    #[test]
    fn test_concat_keeps_items() {
        let a = An::pack(Anims::def(10.0, |_| ()));
        let b = An::empty().when_done(|| ());
        let all = An::concat([a, An::empty(), b]);
        assert_eq!(all.0.to_vec().len(), 2);
        assert_eq!(all.actions().duration(), 10.0);
    }
}
