//! Runtime context.
//!
//! A [`Runtime`] bundles the host, the scheduler and the configuration a
//! mount point needs. It is created once and cloned into every mount;
//! dropping the last clone tears it down.

use std::fmt;
use std::rc::Rc;

use crate::concurrency::{DEFAULT_TIME_SLICE_MS, Scheduler};
use crate::dom::{Dom, EventLoop, MemoryHost};
use crate::types::Millis;

// =============================================================================
// Configuration
// =============================================================================

/// Runtime switches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeConfig {
    /// Play change, enter and exit animations around each update.
    pub use_animations: bool,
    /// Apply DOM patches on the next animation frame instead of
    /// immediately.
    pub batch_updates: bool,
    /// Scheduler time slice in milliseconds.
    pub time_slice_ms: Millis,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            use_animations: true,
            batch_updates: true,
            time_slice_ms: DEFAULT_TIME_SLICE_MS,
        }
    }
}

impl RuntimeConfig {
    pub fn with_animations(mut self, on: bool) -> Self {
        self.use_animations = on;
        self
    }

    pub fn with_batch_updates(mut self, on: bool) -> Self {
        self.batch_updates = on;
        self
    }

    pub fn with_time_slice(mut self, ms: Millis) -> Self {
        self.time_slice_ms = ms;
        self
    }
}

// =============================================================================
// Runtime
// =============================================================================

struct RuntimeInner {
    dom: Rc<dyn Dom>,
    event_loop: Rc<dyn EventLoop>,
    scheduler: Scheduler,
    config: RuntimeConfig,
}

/// Shared handle to a host, its scheduler and the configuration.
#[derive(Clone)]
pub struct Runtime(Rc<RuntimeInner>);

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.0.config)
            .field("scheduler", &self.0.scheduler)
            .finish()
    }
}

impl Runtime {
    pub fn new(dom: Rc<dyn Dom>, event_loop: Rc<dyn EventLoop>, config: RuntimeConfig) -> Self {
        let scheduler = Scheduler::new(event_loop.clone(), config.time_slice_ms);
        Self(Rc::new(RuntimeInner {
            dom,
            event_loop,
            scheduler,
            config,
        }))
    }

    /// A runtime over an in-memory host.
    pub fn memory(host: &MemoryHost, config: RuntimeConfig) -> Self {
        Self::new(host.dom(), host.event_loop(), config)
    }

    pub fn dom(&self) -> &Rc<dyn Dom> {
        &self.0.dom
    }

    pub fn event_loop(&self) -> &Rc<dyn EventLoop> {
        &self.0.event_loop
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.0.scheduler
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.0.config
    }
}
