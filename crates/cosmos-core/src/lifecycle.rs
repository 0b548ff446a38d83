//! Scoped acquisition and teardown of per-section resources.
//!
//! Every listener, timer, frame loop and renderer handle a section creates is
//! registered on its [`ResourceScope`]. Releasing the scope flips the shared
//! [`Liveness`] flag first, so callbacks already queued for this turn become
//! no-ops, then runs the recorded teardowns newest-first.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Shared "section still mounted" flag checked by deferred callbacks.
#[derive(Clone, Debug)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.0.get()
    }

    fn kill(&self) {
        self.0.set(false);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

struct Teardown {
    label: &'static str,
    run: Box<dyn FnOnce()>,
}

/// Owner of everything one mounted section acquired.
pub struct ResourceScope {
    section: String,
    liveness: Liveness,
    teardowns: Vec<Teardown>,
    released: bool,
    active: Rc<Cell<usize>>,
}

impl fmt::Debug for ResourceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceScope")
            .field("section", &self.section)
            .field("resources", &self.teardowns.len())
            .field("released", &self.released)
            .finish()
    }
}

impl ResourceScope {
    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Number of resources still waiting for teardown.
    pub fn len(&self) -> usize {
        self.teardowns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teardowns.is_empty()
    }

    /// Record a teardown. Registering on a released scope runs it at once.
    pub fn defer(&mut self, label: &'static str, run: impl FnOnce() + 'static) {
        if self.released {
            log::debug!("[scope] {} already released, running {label}", self.section);
            run();
            return;
        }
        self.teardowns.push(Teardown {
            label,
            run: Box::new(run),
        });
    }

    /// Keep `value` alive until the scope is released, then drop it.
    pub fn hold<T: 'static>(&mut self, label: &'static str, value: T) {
        self.defer(label, move || drop(value));
    }

    /// Wrap a callback so it does nothing once the scope is released.
    pub fn guard<A>(&self, mut f: impl FnMut(A)) -> impl FnMut(A) {
        let live = self.liveness();
        move |arg| {
            if live.is_alive() {
                f(arg);
            }
        }
    }

    /// Undo everything, newest first. Safe to call repeatedly.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.liveness.kill();
        let count = self.teardowns.len();
        while let Some(t) = self.teardowns.pop() {
            log::trace!("[scope] {} teardown {}", self.section, t.label);
            (t.run)();
        }
        self.active.set(self.active.get().saturating_sub(1));
        log::info!("[scope] released {} ({count} resources)", self.section);
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        self.release();
    }
}

/// Hands out one [`ResourceScope`] per mounted section.
#[derive(Debug, Default)]
pub struct LifecycleManager {
    active: Rc<Cell<usize>>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, section: &str) -> ResourceScope {
        self.active.set(self.active.get() + 1);
        log::info!("[scope] acquired {section}");
        ResourceScope {
            section: section.to_string(),
            liveness: Liveness::new(),
            teardowns: Vec::new(),
            released: false,
            active: self.active.clone(),
        }
    }

    /// Scopes acquired and not yet released.
    pub fn active_scopes(&self) -> usize {
        self.active.get()
    }
}
