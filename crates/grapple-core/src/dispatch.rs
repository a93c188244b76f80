#![forbid(unsafe_code)]

//! Host-driven pointer dispatch.
//!
//! [`PointerDispatcher`] plays the role of a document: controllers register
//! press listeners on individual elements and, while a gesture is in flight,
//! document-level move/release listeners that see the pointer wherever it
//! goes. It also owns the animation-frame queue that throttled consumers
//! schedule onto.
//!
//! The host pushes input explicitly:
//!
//! ```
//! use grapple_core::dispatch::PointerDispatcher;
//! use grapple_core::event::PointerEvent;
//! use grapple_core::surface::ElementId;
//!
//! let dispatcher = PointerDispatcher::new();
//! let button = ElementId::new(7);
//! let _press = dispatcher.on_press(button, |event| assert_eq!(event.client_x(), 1.0));
//! assert_eq!(dispatcher.press(button, &PointerEvent::new(1.0, 2.0)), 1);
//! assert_eq!(dispatcher.pointer_move(&PointerEvent::new(5.0, 5.0)), 0);
//! ```
//!
//! # Invariants
//!
//! 1. Listeners are invoked in registration order from a snapshot; entries
//!    removed during a dispatch are skipped, never shifted.
//! 2. Frame callbacks requested while [`run_frame`](PointerDispatcher::run_frame)
//!    is executing are deferred to the next tick.
//! 3. A cancelled frame request never runs.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::event::PointerEvent;
use crate::subscription::{Liveness, Subscription};
use crate::surface::ElementId;

type PointerListener = Rc<dyn Fn(&PointerEvent)>;

/// Which pointer lifecycle phase a listener observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    /// Pointer pressed on a specific element.
    Press,
    /// Pointer moved anywhere in the document.
    Move,
    /// Pointer released anywhere in the document.
    Release,
}

struct ListenerEntry {
    id: u64,
    element: Option<ElementId>,
    live: Liveness,
    callback: PointerListener,
}

struct FrameEntry {
    id: u64,
    live: Liveness,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct DispatcherInner {
    press: Vec<ListenerEntry>,
    moves: Vec<ListenerEntry>,
    releases: Vec<ListenerEntry>,
    frames: Vec<FrameEntry>,
    next_id: u64,
}

impl DispatcherInner {
    fn list_mut(&mut self, phase: PointerPhase) -> &mut Vec<ListenerEntry> {
        match phase {
            PointerPhase::Press => &mut self.press,
            PointerPhase::Move => &mut self.moves,
            PointerPhase::Release => &mut self.releases,
        }
    }

    fn list(&self, phase: PointerPhase) -> &[ListenerEntry] {
        match phase {
            PointerPhase::Press => &self.press,
            PointerPhase::Move => &self.moves,
            PointerPhase::Release => &self.releases,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }
}

/// Pending animation-frame callback.
///
/// Unlike [`Subscription`], dropping a `FrameRequest` does not cancel it;
/// call [`cancel`](Self::cancel) explicitly.
pub struct FrameRequest {
    id: u64,
    live: Liveness,
    owner: Weak<RefCell<DispatcherInner>>,
}

impl FrameRequest {
    /// Whether the callback is still queued.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.live.is_live()
            && self.owner.upgrade().is_some_and(|inner| {
                inner.borrow().frames.iter().any(|frame| frame.id == self.id)
            })
    }

    /// Cancel the callback if it has not run yet. Idempotent.
    pub fn cancel(&self) {
        if !self.live.kill() {
            return;
        }
        if let Some(inner) = self.owner.upgrade() {
            inner.borrow_mut().frames.retain(|frame| frame.id != self.id);
        }
    }
}

impl fmt::Debug for FrameRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameRequest")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Document-level pointer listener registry and frame queue.
///
/// Cloning a dispatcher yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct PointerDispatcher {
    inner: Rc<RefCell<DispatcherInner>>,
}

impl fmt::Debug for PointerDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("PointerDispatcher")
            .field("press", &inner.press.len())
            .field("moves", &inner.moves.len())
            .field("releases", &inner.releases.len())
            .field("frames", &inner.frames.len())
            .finish()
    }
}

impl PointerDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for presses on `element`.
    pub fn on_press(
        &self,
        element: ElementId,
        listener: impl Fn(&PointerEvent) + 'static,
    ) -> Subscription {
        self.register(PointerPhase::Press, Some(element), Rc::new(listener))
    }

    /// Listen for pointer moves anywhere in the document.
    pub fn on_document_move(&self, listener: impl Fn(&PointerEvent) + 'static) -> Subscription {
        self.register(PointerPhase::Move, None, Rc::new(listener))
    }

    /// Listen for pointer releases anywhere in the document.
    pub fn on_document_release(&self, listener: impl Fn(&PointerEvent) + 'static) -> Subscription {
        self.register(PointerPhase::Release, None, Rc::new(listener))
    }

    fn register(
        &self,
        phase: PointerPhase,
        element: Option<ElementId>,
        callback: PointerListener,
    ) -> Subscription {
        let live = Liveness::new();
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.allocate_id();
            inner.list_mut(phase).push(ListenerEntry {
                id,
                element,
                live: live.clone(),
                callback,
            });
            id
        };
        trace!(?phase, ?element, id, "dispatcher.listen");

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(live, move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .borrow_mut()
                    .list_mut(phase)
                    .retain(|entry| entry.id != id);
            }
        })
    }

    /// Deliver a press on `element`. Returns the number of listeners invoked.
    pub fn press(&self, element: ElementId, event: &PointerEvent) -> usize {
        self.dispatch(PointerPhase::Press, Some(element), event)
    }

    /// Deliver a document-level move. Returns the number of listeners invoked.
    pub fn pointer_move(&self, event: &PointerEvent) -> usize {
        self.dispatch(PointerPhase::Move, None, event)
    }

    /// Deliver a document-level release. Returns the number of listeners invoked.
    pub fn pointer_release(&self, event: &PointerEvent) -> usize {
        self.dispatch(PointerPhase::Release, None, event)
    }

    fn dispatch(
        &self,
        phase: PointerPhase,
        element: Option<ElementId>,
        event: &PointerEvent,
    ) -> usize {
        let snapshot: Vec<(Liveness, PointerListener)> = {
            let inner = self.inner.borrow();
            inner
                .list(phase)
                .iter()
                .filter(|entry| element.is_none() || entry.element == element)
                .map(|entry| (entry.live.clone(), Rc::clone(&entry.callback)))
                .collect()
        };

        let mut invoked = 0;
        for (live, callback) in &snapshot {
            if !live.is_live() {
                continue;
            }
            callback(event);
            invoked += 1;
        }
        invoked
    }

    /// Number of live listeners for `phase`.
    #[must_use]
    pub fn listener_count(&self, phase: PointerPhase) -> usize {
        self.inner
            .borrow()
            .list(phase)
            .iter()
            .filter(|entry| entry.live.is_live())
            .count()
    }

    /// Queue `callback` for the next [`run_frame`](Self::run_frame).
    pub fn request_animation_frame(&self, callback: impl FnOnce() + 'static) -> FrameRequest {
        let live = Liveness::new();
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.allocate_id();
            inner.frames.push(FrameEntry {
                id,
                live: live.clone(),
                callback: Box::new(callback),
            });
            id
        };
        FrameRequest {
            id,
            live,
            owner: Rc::downgrade(&self.inner),
        }
    }

    /// Run every frame callback queued before this call.
    ///
    /// Returns the number of callbacks that ran.
    pub fn run_frame(&self) -> usize {
        let due = {
            let mut inner = self.inner.borrow_mut();
            std::mem::take(&mut inner.frames)
        };
        let mut ran = 0;
        for frame in due {
            if !frame.live.is_live() {
                continue;
            }
            (frame.callback)();
            ran += 1;
        }
        trace!(ran, "dispatcher.frame");
        ran
    }

    /// Number of frame callbacks waiting for the next tick.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.inner
            .borrow()
            .frames
            .iter()
            .filter(|frame| frame.live.is_live())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&PointerEvent) + 'static) {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        (count, move |_: &PointerEvent| {
            count_clone.set(count_clone.get() + 1)
        })
    }

    #[test]
    fn press_only_reaches_listeners_of_that_element() {
        let dispatcher = PointerDispatcher::new();
        let (hits_a, listener_a) = counter();
        let (hits_b, listener_b) = counter();
        let _a = dispatcher.on_press(ElementId::new(1), listener_a);
        let _b = dispatcher.on_press(ElementId::new(2), listener_b);

        assert_eq!(dispatcher.press(ElementId::new(1), &PointerEvent::new(0.0, 0.0)), 1);
        assert_eq!(hits_a.get(), 1);
        assert_eq!(hits_b.get(), 0);
    }

    #[test]
    fn document_listeners_see_every_move() {
        let dispatcher = PointerDispatcher::new();
        let (hits, listener) = counter();
        let sub = dispatcher.on_document_move(listener);
        dispatcher.pointer_move(&PointerEvent::new(1.0, 1.0));
        dispatcher.pointer_move(&PointerEvent::new(900.0, -4.0));
        assert_eq!(hits.get(), 2);

        sub.unsubscribe();
        dispatcher.pointer_move(&PointerEvent::new(1.0, 1.0));
        assert_eq!(hits.get(), 2);
        assert_eq!(dispatcher.listener_count(PointerPhase::Move), 0);
    }

    #[test]
    fn release_listener_can_detach_itself_and_its_sibling() {
        let dispatcher = PointerDispatcher::new();
        let (moves, move_listener) = counter();
        let move_sub = Rc::new(dispatcher.on_document_move(move_listener));
        let release_slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let move_sub_clone = Rc::clone(&move_sub);
        let slot_clone = Rc::clone(&release_slot);
        let release = dispatcher.on_document_release(move |_| {
            move_sub_clone.unsubscribe();
            if let Some(sub) = slot_clone.borrow().as_ref() {
                sub.unsubscribe();
            }
        });
        *release_slot.borrow_mut() = Some(release);

        assert_eq!(dispatcher.pointer_release(&PointerEvent::new(0.0, 0.0)), 1);
        assert_eq!(dispatcher.pointer_release(&PointerEvent::new(0.0, 0.0)), 0);
        dispatcher.pointer_move(&PointerEvent::new(0.0, 0.0));
        assert_eq!(moves.get(), 0);
    }

    #[test]
    fn frames_run_once_and_defer_nested_requests() {
        let dispatcher = PointerDispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_outer = Rc::clone(&log);
        let dispatcher_clone = dispatcher.clone();
        let _request = dispatcher.request_animation_frame(move || {
            log_outer.borrow_mut().push("outer");
            let log_inner = Rc::clone(&log_outer);
            let _nested = dispatcher_clone
                .request_animation_frame(move || log_inner.borrow_mut().push("inner"));
        });

        assert_eq!(dispatcher.pending_frames(), 1);
        assert_eq!(dispatcher.run_frame(), 1);
        assert_eq!(*log.borrow(), vec!["outer"]);
        assert_eq!(dispatcher.run_frame(), 1);
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
        assert_eq!(dispatcher.run_frame(), 0);
        assert_eq!(dispatcher.pending_frames(), 0);
    }

    #[test]
    fn cancelled_frame_never_runs() {
        let dispatcher = PointerDispatcher::new();
        let ran = Rc::new(Cell::new(false));
        let ran_clone = Rc::clone(&ran);
        let request = dispatcher.request_animation_frame(move || ran_clone.set(true));
        assert!(request.is_pending());
        request.cancel();
        request.cancel();
        assert!(!request.is_pending());
        assert_eq!(dispatcher.run_frame(), 0);
        assert!(!ran.get());
    }

    #[test]
    fn dropping_frame_request_keeps_it_queued() {
        let dispatcher = PointerDispatcher::new();
        let ran = Rc::new(Cell::new(false));
        let ran_clone = Rc::clone(&ran);
        drop(dispatcher.request_animation_frame(move || ran_clone.set(true)));
        dispatcher.run_frame();
        assert!(ran.get());
    }
}
