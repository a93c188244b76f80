#![forbid(unsafe_code)]

//! RAII guards for listener registrations.
//!
//! Every registration in this workspace (bus topics, dispatcher listeners,
//! store observers) hands back a [`Subscription`]. The registration owns a
//! shared liveness flag; dispatchers snapshot their listener lists before
//! invoking them and skip entries whose flag has been cleared. That gives two
//! properties at once:
//!
//! 1. A listener removed mid-dispatch is never invoked afterwards.
//! 2. Removing a listener mid-dispatch never shifts or skips the others.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared liveness flag between a registration and its guard.
#[derive(Debug, Clone)]
pub struct Liveness(Rc<Cell<bool>>);

impl Liveness {
    /// A new, live flag.
    #[must_use]
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    /// Whether the registration is still live.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.0.get()
    }

    /// Clear the flag. Returns `true` only for the call that cleared it.
    pub(crate) fn kill(&self) -> bool {
        self.0.replace(false)
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle that removes one registration.
///
/// [`unsubscribe`](Self::unsubscribe) is idempotent; dropping the guard
/// unsubscribes as well.
pub struct Subscription {
    live: Liveness,
    prune: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    /// Build a guard from a liveness flag and a pruning closure.
    ///
    /// `prune` runs at most once, after the flag has been cleared, and should
    /// physically remove the entry from its owner's list.
    pub fn new(live: Liveness, prune: impl FnOnce() + 'static) -> Self {
        Self {
            live,
            prune: RefCell::new(Some(Box::new(prune))),
        }
    }

    /// A guard that was never attached to anything.
    #[must_use]
    pub fn detached() -> Self {
        let live = Liveness::new();
        live.kill();
        Self {
            live,
            prune: RefCell::new(None),
        }
    }

    /// Whether the registration is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.live.is_live()
    }

    /// Remove the registration. Calling this again is a no-op.
    pub fn unsubscribe(&self) {
        if !self.live.kill() {
            return;
        }
        let prune = self.prune.borrow_mut().take();
        if let Some(prune) = prune {
            prune();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsubscribe_runs_prune_once() {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let sub = Subscription::new(Liveness::new(), move || {
            count_clone.set(count_clone.get() + 1);
        });
        assert!(sub.is_active());
        sub.unsubscribe();
        sub.unsubscribe();
        drop(sub);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn drop_unsubscribes() {
        let live = Liveness::new();
        let observer = live.clone();
        let sub = Subscription::new(live, || {});
        drop(sub);
        assert!(!observer.is_live());
    }

    #[test]
    fn detached_guard_is_inactive() {
        let sub = Subscription::detached();
        assert!(!sub.is_active());
        sub.unsubscribe();
    }
}
