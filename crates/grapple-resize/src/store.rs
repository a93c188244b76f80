#![forbid(unsafe_code)]

//! Shared resize state with change notification.
//!
//! # Design
//!
//! [`ResizeStore`] is a cloneable handle to `Rc<RefCell<..>>` storage, so
//! several handles can drive one logical resize (two edges of one panel) or
//! each own a private store.
//!
//! Every [`set_state`](ResizeStore::set_state) notifies, even when the merged
//! state equals the previous one: an empty update is how a freshly attached
//! handle publishes the initial state.
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: observers may call `set_state`; the borrow is released
//!   before any callback runs. Nested updates notify depth-first.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use grapple_core::subscription::{Liveness, Subscription};
use tracing::trace;

/// Snapshot of one resize.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResizeState {
    /// Cumulative horizontal delta from the base.
    pub delta_x: f64,
    /// Cumulative vertical delta from the base.
    pub delta_y: f64,
    /// True between press and release.
    pub resizing: bool,
}

/// Partial update merged into a [`ResizeState`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResizeUpdate {
    pub delta_x: Option<f64>,
    pub delta_y: Option<f64>,
    pub resizing: Option<bool>,
}

impl ResizeUpdate {
    /// Update touching nothing. Still notifies.
    pub const EMPTY: Self = Self {
        delta_x: None,
        delta_y: None,
        resizing: None,
    };

    #[must_use]
    pub const fn delta_x(value: f64) -> Self {
        Self {
            delta_x: Some(value),
            ..Self::EMPTY
        }
    }

    #[must_use]
    pub const fn delta_y(value: f64) -> Self {
        Self {
            delta_y: Some(value),
            ..Self::EMPTY
        }
    }

    #[must_use]
    pub const fn resizing(value: bool) -> Self {
        Self {
            resizing: Some(value),
            ..Self::EMPTY
        }
    }

    fn apply(self, state: &mut ResizeState) {
        if let Some(delta_x) = self.delta_x {
            state.delta_x = delta_x;
        }
        if let Some(delta_y) = self.delta_y {
            state.delta_y = delta_y;
        }
        if let Some(resizing) = self.resizing {
            state.resizing = resizing;
        }
    }
}

type StateCallback = Rc<dyn Fn(&ResizeState)>;

struct Observer {
    id: u64,
    live: Liveness,
    callback: StateCallback,
}

struct StoreInner {
    state: ResizeState,
    updater: Option<StateCallback>,
    observers: Vec<Observer>,
    next_id: u64,
    updates: u64,
}

/// Handle to one resize state.
///
/// # Invariants
///
/// 1. The updater runs before the observers, once per `set_state`.
/// 2. Observers run in subscription order.
/// 3. Observers removed mid-notification are not called afterwards.
#[derive(Clone)]
pub struct ResizeStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl fmt::Debug for ResizeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ResizeStore")
            .field("state", &inner.state)
            .field("has_updater", &inner.updater.is_some())
            .field("observers", &inner.observers.len())
            .field("updates", &inner.updates)
            .finish()
    }
}

impl Default for ResizeStore {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl ResizeStore {
    /// Store starting at the given base deltas, not resizing.
    #[must_use]
    pub fn new(base_delta_x: f64, base_delta_y: f64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                state: ResizeState {
                    delta_x: base_delta_x,
                    delta_y: base_delta_y,
                    resizing: false,
                },
                updater: None,
                observers: Vec::new(),
                next_id: 1,
                updates: 0,
            })),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ResizeState {
        self.inner.borrow().state
    }

    /// Merge `update` and notify the updater and every observer.
    pub fn set_state(&self, update: ResizeUpdate) {
        let (state, updater, observers) = {
            let mut inner = self.inner.borrow_mut();
            update.apply(&mut inner.state);
            inner.updates = inner.updates.saturating_add(1);
            let observers: Vec<(Liveness, StateCallback)> = inner
                .observers
                .iter()
                .map(|observer| (observer.live.clone(), Rc::clone(&observer.callback)))
                .collect();
            (inner.state, inner.updater.clone(), observers)
        };
        trace!(
            delta_x = state.delta_x,
            delta_y = state.delta_y,
            resizing = state.resizing,
            "resize.store.set"
        );
        if let Some(updater) = updater {
            updater(&state);
        }
        for (live, callback) in &observers {
            if live.is_live() {
                callback(&state);
            }
        }
    }

    /// Install the primary update callback, replacing any previous one.
    pub fn set_updater(&self, updater: impl Fn(&ResizeState) + 'static) {
        self.inner.borrow_mut().updater = Some(Rc::new(updater));
    }

    /// Remove the primary update callback.
    pub fn clear_updater(&self) {
        self.inner.borrow_mut().updater = None;
    }

    /// Observe every `set_state` until the guard is dropped.
    pub fn subscribe(&self, callback: impl Fn(&ResizeState) + 'static) -> Subscription {
        let live = Liveness::new();
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id = inner.next_id.saturating_add(1);
            inner.observers.push(Observer {
                id,
                live: live.clone(),
                callback: Rc::new(callback),
            });
            id
        };
        let weak: Weak<RefCell<StoreInner>> = Rc::downgrade(&self.inner);
        Subscription::new(live, move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().observers.retain(|observer| observer.id != id);
            }
        })
    }

    /// Number of live observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner
            .borrow()
            .observers
            .iter()
            .filter(|observer| observer.live.is_live())
            .count()
    }

    /// Number of `set_state` calls so far.
    #[must_use]
    pub fn update_count(&self) -> u64 {
        self.inner.borrow().updates
    }

    #[cfg(test)]
    pub(crate) fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
