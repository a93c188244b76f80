#![forbid(unsafe_code)]

//! Topic-keyed publish/subscribe channel.
//!
//! # Design
//!
//! [`SignalBus<P>`] maps topic strings to ordered listener lists stored in
//! shared, reference-counted storage (`Rc<RefCell<..>>`). Cloning the bus
//! yields another handle to the same registry, which is how a drag source and
//! its drop targets talk without holding references to each other.
//!
//! # Invariants
//!
//! 1. Listeners of one topic run synchronously, in registration order.
//! 2. `emit` on a topic with no listeners is a no-op.
//! 3. Unsubscribing is idempotent and never disturbs an in-flight `emit`:
//!    the listener list is snapshotted before the first call, and entries
//!    removed mid-dispatch are skipped rather than shifted.
//! 4. No ordering is defined across different topics.
//!
//! # Failure Modes
//!
//! - **Listener panic**: propagates to the caller of `emit`; remaining
//!   listeners for that emit are not run.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use tracing::{info_span, trace};
use web_time::Instant;

use crate::subscription::{Liveness, Subscription};

type ListenerRc<P> = Rc<dyn Fn(&P)>;

struct Registration<P> {
    id: u64,
    live: Liveness,
    listener: ListenerRc<P>,
}

struct BusInner<P> {
    topics: AHashMap<String, Vec<Registration<P>>>,
    next_id: u64,
}

/// A shared publish/subscribe registry keyed by topic string.
pub struct SignalBus<P> {
    inner: Rc<RefCell<BusInner<P>>>,
}

// Manual Clone: shares the same Rc.
impl<P> Clone for SignalBus<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P> std::fmt::Debug for SignalBus<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SignalBus")
            .field("topics", &inner.topics.len())
            .field("next_id", &inner.next_id)
            .finish()
    }
}

impl<P: 'static> Default for SignalBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: 'static> SignalBus<P> {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                topics: AHashMap::new(),
                next_id: 1,
            })),
        }
    }

    /// Register `listener` on `topic`.
    ///
    /// The returned [`Subscription`] removes exactly this registration.
    pub fn on(&self, topic: impl Into<String>, listener: impl Fn(&P) + 'static) -> Subscription {
        let topic = topic.into();
        let live = Liveness::new();
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id = inner.next_id.saturating_add(1);
            inner
                .topics
                .entry(topic.clone())
                .or_default()
                .push(Registration {
                    id,
                    live: live.clone(),
                    listener: Rc::new(listener),
                });
            id
        };
        trace!(topic = %topic, id, "bus.on");

        let weak: Weak<RefCell<BusInner<P>>> = Rc::downgrade(&self.inner);
        Subscription::new(live, move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut inner = inner.borrow_mut();
            if let Some(list) = inner.topics.get_mut(&topic) {
                list.retain(|registration| registration.id != id);
                if list.is_empty() {
                    inner.topics.remove(&topic);
                }
            }
        })
    }

    /// Invoke every live listener of `topic` with `payload`.
    ///
    /// Returns the number of listeners that ran.
    pub fn emit(&self, topic: &str, payload: &P) -> usize {
        // Snapshot first so listeners may (un)subscribe while we iterate.
        let snapshot: Vec<(Liveness, ListenerRc<P>)> = {
            let inner = self.inner.borrow();
            match inner.topics.get(topic) {
                Some(list) => list
                    .iter()
                    .map(|registration| {
                        (registration.live.clone(), Rc::clone(&registration.listener))
                    })
                    .collect(),
                None => return 0,
            }
        };

        let started = Instant::now();
        let _span = info_span!(
            "grapple.bus.emit",
            topic,
            listeners = snapshot.len() as u64,
            duration_us = tracing::field::Empty
        )
        .entered();

        let mut delivered = 0;
        for (live, listener) in &snapshot {
            if !live.is_live() {
                continue;
            }
            listener(payload);
            delivered += 1;
        }

        let duration_us = started.elapsed().as_micros() as u64;
        tracing::Span::current().record("duration_us", duration_us);
        delivered
    }

    /// Number of live registrations on `topic`.
    #[must_use]
    pub fn listener_count(&self, topic: &str) -> usize {
        self.inner
            .borrow()
            .topics
            .get(topic)
            .map_or(0, |list| list.iter().filter(|r| r.live.is_live()).count())
    }

    #[cfg(test)]
    fn topic_count(&self) -> usize {
        self.inner.borrow().topics.len()
    }
}
