#![forbid(unsafe_code)]

//! Resize controller: a press on a handle element starts a gesture whose
//! pointer motion is turned into a clamped, direction-aware delta.
//!
//! # State Machine
//!
//! ```text
//! Idle --press--> Resizing --release--> Idle
//!                   |  ^
//!                   move (coalesced to one store write per frame)
//! ```
//!
//! - **press**: record the pointer origin and the store delta, set
//!   `resizing`, resolve the effective bounds once (static bounds overridden
//!   by the dynamic ones), notify `resizing_change(true)`, arm document-level
//!   move/release listeners.
//! - **move**: push the position into a [`FrameThrottle`]; the first push of a
//!   frame requests an animation frame, later pushes only replace the value.
//! - **frame**: `start + (pointer - origin) * sign` on the handle's axis,
//!   clamped, written to the store.
//! - **release**: flush a still-pending move synchronously, cancel the frame,
//!   detach listeners, clear `resizing`, notify `resizing_change(false)`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use grapple_core::dispatch::{FrameRequest, PointerDispatcher};
use grapple_core::event::PointerEvent;
use grapple_core::frame_throttle::FrameThrottle;
use grapple_core::geometry::Point;
use grapple_core::subscription::Subscription;
use grapple_core::surface::ElementId;
use tracing::{debug, trace};

use crate::bounds::DeltaBounds;
use crate::direction::{Axis, ResizeDirection};
use crate::store::{ResizeState, ResizeStore, ResizeUpdate};

/// Dynamic bounds evaluated at press time from the current store state.
pub type BoundsFn = Box<dyn Fn(&ResizeState) -> DeltaBounds>;

/// Callback told when a gesture starts (`true`) or ends (`false`).
pub type ResizingChangeFn = Box<dyn Fn(bool)>;

/// Store update callback installed on whichever store the handle uses.
pub type UpdaterFn = Box<dyn Fn(&ResizeState)>;

/// Configuration of one resize handle.
pub struct ResizeConfig {
    direction: ResizeDirection,
    base_delta_x: f64,
    base_delta_y: f64,
    bounds: DeltaBounds,
    first_update: bool,
    get_min_max_delta: Option<BoundsFn>,
    resizing_change: Option<ResizingChangeFn>,
    store: Option<ResizeStore>,
    updater: Option<UpdaterFn>,
}

impl fmt::Debug for ResizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeConfig")
            .field("direction", &self.direction)
            .field("base_delta_x", &self.base_delta_x)
            .field("base_delta_y", &self.base_delta_y)
            .field("bounds", &self.bounds)
            .field("first_update", &self.first_update)
            .field("get_min_max_delta", &self.get_min_max_delta.is_some())
            .field("resizing_change", &self.resizing_change.is_some())
            .field("store", &self.store.is_some())
            .field("updater", &self.updater.is_some())
            .finish()
    }
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            direction: ResizeDirection::default(),
            base_delta_x: 0.0,
            base_delta_y: 0.0,
            bounds: DeltaBounds::UNBOUNDED,
            first_update: true,
            get_min_max_delta: None,
            resizing_change: None,
            store: None,
            updater: None,
        }
    }
}

impl ResizeConfig {
    /// Left-edge handle, no bounds, private store at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn direction(mut self, direction: ResizeDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Base deltas of the private store. Ignored when a shared store is given.
    #[must_use]
    pub fn base_delta(mut self, x: f64, y: f64) -> Self {
        self.base_delta_x = x;
        self.base_delta_y = y;
        self
    }

    #[must_use]
    pub fn bounds(mut self, bounds: DeltaBounds) -> Self {
        self.bounds = bounds;
        self
    }

    #[must_use]
    pub fn min_delta_x(mut self, value: f64) -> Self {
        self.bounds.min_delta_x = Some(value);
        self
    }

    #[must_use]
    pub fn max_delta_x(mut self, value: f64) -> Self {
        self.bounds.max_delta_x = Some(value);
        self
    }

    #[must_use]
    pub fn min_delta_y(mut self, value: f64) -> Self {
        self.bounds.min_delta_y = Some(value);
        self
    }

    #[must_use]
    pub fn max_delta_y(mut self, value: f64) -> Self {
        self.bounds.max_delta_y = Some(value);
        self
    }

    /// Publish the initial state right after attaching (default `true`).
    #[must_use]
    pub fn first_update(mut self, enabled: bool) -> Self {
        self.first_update = enabled;
        self
    }

    /// Bounds computed from the store state at press time; present fields
    /// override the static ones.
    #[must_use]
    pub fn get_min_max_delta(mut self, f: impl Fn(&ResizeState) -> DeltaBounds + 'static) -> Self {
        self.get_min_max_delta = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn resizing_change(mut self, f: impl Fn(bool) + 'static) -> Self {
        self.resizing_change = Some(Box::new(f));
        self
    }

    /// Drive a shared store instead of a private one.
    #[must_use]
    pub fn store(mut self, store: ResizeStore) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn updater(mut self, f: impl Fn(&ResizeState) + 'static) -> Self {
        self.updater = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn configured_direction(&self) -> ResizeDirection {
        self.direction
    }

    #[must_use]
    pub fn configured_bounds(&self) -> DeltaBounds {
        self.bounds
    }
}

/// Observable phase of a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePhase {
    Idle,
    Resizing,
}

/// Why a pointer signal did not advance the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeIgnoredReason {
    /// This handle already has a gesture in flight.
    GestureInProgress,
    /// Another handle sharing the store is resizing.
    StoreBusy,
    /// Move/release arrived with no gesture.
    NotResizing,
}

struct Gesture {
    origin: Point,
    start: ResizeState,
    bounds: DeltaBounds,
    moves: Subscription,
    release: Subscription,
}

struct HandleInner {
    dispatcher: PointerDispatcher,
    store: ResizeStore,
    direction: ResizeDirection,
    bounds: DeltaBounds,
    get_min_max_delta: Option<BoundsFn>,
    resizing_change: Option<ResizingChangeFn>,
    gesture: RefCell<Option<Gesture>>,
    throttle: RefCell<FrameThrottle<Point>>,
    frame: RefCell<Option<FrameRequest>>,
}

impl HandleInner {
    fn ignored(&self, phase: &'static str, reason: ResizeIgnoredReason) {
        debug!(direction = %self.direction, phase, ?reason, "resize.ignored");
    }

    fn notify_resizing(&self, resizing: bool) {
        if let Some(resizing_change) = &self.resizing_change {
            resizing_change(resizing);
        }
    }

    fn pointer_down(this: &Rc<Self>, event: &PointerEvent) {
        if this.gesture.borrow().is_some() {
            this.ignored("press", ResizeIgnoredReason::GestureInProgress);
            return;
        }
        if this.store.state().resizing {
            this.ignored("press", ResizeIgnoredReason::StoreBusy);
            return;
        }

        let start = this.store.state();
        this.store.set_state(ResizeUpdate::resizing(true));
        let bounds = match &this.get_min_max_delta {
            Some(dynamic) => this.bounds.merge(dynamic(&this.store.state())),
            None => this.bounds,
        };

        let weak: Weak<Self> = Rc::downgrade(this);
        let moves = this.dispatcher.on_document_move({
            let weak = weak.clone();
            move |event| {
                if let Some(inner) = weak.upgrade() {
                    Self::pointer_move(&inner, event);
                }
            }
        });
        let release = this.dispatcher.on_document_release(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.pointer_up(event);
            }
        });
        *this.gesture.borrow_mut() = Some(Gesture {
            origin: event.position,
            start,
            bounds,
            moves,
            release,
        });
        debug!(
            direction = %this.direction,
            x = event.client_x(),
            y = event.client_y(),
            "resize.start"
        );
        this.notify_resizing(true);
    }

    fn pointer_move(this: &Rc<Self>, event: &PointerEvent) {
        event.prevent_default();
        if this.gesture.borrow().is_none() {
            this.ignored("move", ResizeIgnoredReason::NotResizing);
            return;
        }
        let needs_frame = this.throttle.borrow_mut().push(event.position);
        if !needs_frame {
            trace!(direction = %this.direction, "resize.move.coalesced");
            return;
        }
        let weak = Rc::downgrade(this);
        let request = this.dispatcher.request_animation_frame(move || {
            if let Some(inner) = weak.upgrade() {
                inner.flush();
            }
        });
        *this.frame.borrow_mut() = Some(request);
    }

    /// Frame callback: apply the latest pending position.
    fn flush(&self) {
        let pending = self.throttle.borrow_mut().take();
        self.frame.borrow_mut().take();
        if let Some(pointer) = pending {
            self.apply(pointer);
        }
    }

    fn apply(&self, pointer: Point) {
        let (origin, start, bounds) = {
            let gesture = self.gesture.borrow();
            let Some(gesture) = gesture.as_ref() else {
                return;
            };
            (gesture.origin, gesture.start, gesture.bounds)
        };
        let axis = self.direction.axis();
        let sign = self.direction.sign();
        let update = match axis {
            Axis::Horizontal => {
                let raw = start.delta_x + (pointer.x - origin.x) * sign;
                ResizeUpdate::delta_x(bounds.clamp(axis, raw))
            }
            Axis::Vertical => {
                let raw = start.delta_y + (pointer.y - origin.y) * sign;
                ResizeUpdate::delta_y(bounds.clamp(axis, raw))
            }
        };
        trace!(direction = %self.direction, ?update, "resize.apply");
        self.store.set_state(update);
    }

    /// Drop the frame request and return the position it would have applied.
    fn cancel_frame(&self) -> Option<Point> {
        let pending = self.throttle.borrow_mut().cancel();
        let frame = self.frame.borrow_mut().take();
        if let Some(frame) = frame {
            frame.cancel();
        }
        pending
    }

    fn pointer_up(&self, event: &PointerEvent) {
        event.prevent_default();
        if self.gesture.borrow().is_none() {
            self.ignored("release", ResizeIgnoredReason::NotResizing);
            return;
        }
        if let Some(pointer) = self.cancel_frame() {
            self.apply(pointer);
        }
        let gesture = self.gesture.borrow_mut().take();
        if let Some(gesture) = gesture {
            gesture.moves.unsubscribe();
            gesture.release.unsubscribe();
        }
        self.store.set_state(ResizeUpdate::resizing(false));
        let state = self.store.state();
        debug!(
            direction = %self.direction,
            delta_x = state.delta_x,
            delta_y = state.delta_y,
            coalesced = self.throttle.borrow().coalesced(),
            "resize.end"
        );
        self.notify_resizing(false);
    }

    /// Tear down without applying the pending move or calling back.
    fn abort(&self) {
        self.cancel_frame();
        let gesture = self.gesture.borrow_mut().take();
        if gesture.is_some() {
            drop(gesture);
            self.store.set_state(ResizeUpdate::resizing(false));
            debug!(direction = %self.direction, "resize.torn_down");
        }
    }
}

/// A resize handle bound to one element.
///
/// Dropping the handle (or calling [`detach`](Self::detach)) removes its
/// listeners, cancels a pending frame, and clears `resizing` if a gesture was
/// in flight.
pub struct ResizeHandle {
    inner: Rc<HandleInner>,
    press: Option<Subscription>,
    element: Option<ElementId>,
}

impl fmt::Debug for ResizeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeHandle")
            .field("element", &self.element)
            .field("direction", &self.inner.direction)
            .field("phase", &self.phase())
            .field("store", &self.inner.store)
            .finish()
    }
}

impl ResizeHandle {
    /// Listen for presses on `element` (`None` attaches nothing but still
    /// resolves the store and performs the first update).
    pub fn attach(
        dispatcher: &PointerDispatcher,
        element: Option<ElementId>,
        config: ResizeConfig,
    ) -> Self {
        let ResizeConfig {
            direction,
            base_delta_x,
            base_delta_y,
            bounds,
            first_update,
            get_min_max_delta,
            resizing_change,
            store,
            updater,
        } = config;

        let store = store.unwrap_or_else(|| ResizeStore::new(base_delta_x, base_delta_y));
        if let Some(updater) = updater {
            store.set_updater(updater);
        }

        let inner = Rc::new(HandleInner {
            dispatcher: dispatcher.clone(),
            store,
            direction,
            bounds,
            get_min_max_delta,
            resizing_change,
            gesture: RefCell::new(None),
            throttle: RefCell::new(FrameThrottle::new()),
            frame: RefCell::new(None),
        });

        let mut handle = Self {
            inner,
            press: None,
            element: None,
        };
        handle.retarget(element);

        if first_update {
            handle.inner.store.set_state(ResizeUpdate::EMPTY);
        }
        handle
    }

    /// Rebind to another element, keeping the store. A gesture in flight is
    /// aborted.
    pub fn retarget(&mut self, element: Option<ElementId>) {
        self.detach();
        self.element = element;
        let Some(element) = element else {
            return;
        };
        let weak = Rc::downgrade(&self.inner);
        self.press = Some(self.inner.dispatcher.on_press(element, move |event| {
            if let Some(inner) = weak.upgrade() {
                HandleInner::pointer_down(&inner, event);
            }
        }));
        debug!(direction = %self.inner.direction, element = element.get(), "resize.attach");
    }

    /// The store this handle writes to.
    #[must_use]
    pub fn store(&self) -> &ResizeStore {
        &self.inner.store
    }

    /// Current store state.
    #[must_use]
    pub fn state(&self) -> ResizeState {
        self.inner.store.state()
    }

    #[must_use]
    pub fn phase(&self) -> ResizePhase {
        if self.inner.gesture.borrow().is_some() {
            ResizePhase::Resizing
        } else {
            ResizePhase::Idle
        }
    }

    #[must_use]
    pub fn direction(&self) -> ResizeDirection {
        self.inner.direction
    }

    #[must_use]
    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    /// Whether a press listener is installed.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.press.as_ref().is_some_and(Subscription::is_active)
    }

    /// Whether a coalesced move is waiting for the next frame.
    #[must_use]
    pub fn has_pending_move(&self) -> bool {
        self.inner.throttle.borrow().has_pending()
    }

    /// Stop listening. Idempotent.
    pub fn detach(&mut self) {
        if let Some(press) = self.press.take() {
            press.unsubscribe();
        }
        self.inner.abort();
    }
}

impl Drop for ResizeHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grapple_core::dispatch::PointerPhase;
    use grapple_harness::Scene;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn handle(scene: &Scene, config: ResizeConfig) -> (ElementId, ResizeHandle) {
        let grip = scene.add_element(100.0, 0.0, 4.0, 100.0);
        let handle = ResizeHandle::attach(&scene.dispatcher, Some(grip), config);
        (grip, handle)
    }

    #[test]
    fn right_handle_follows_pointer() {
        let scene = Scene::new();
        let (grip, handle) = handle(&scene, ResizeConfig::new().direction(ResizeDirection::Right));
        scene.press(grip, 101.0, 50.0);
        assert_eq!(handle.phase(), ResizePhase::Resizing);
        assert!(handle.state().resizing);
        scene.move_and_frame(131.0, 80.0);
        assert_eq!(handle.state().delta_x, 30.0);
        assert_eq!(handle.state().delta_y, 0.0);
        scene.release(131.0, 80.0);
        assert!(!handle.state().resizing);
        assert_eq!(handle.phase(), ResizePhase::Idle);
    }

    #[test]
    fn left_and_top_invert_sign() {
        let scene = Scene::new();
        let (grip, handle) = handle(&scene, ResizeConfig::new());
        scene.press(grip, 101.0, 50.0);
        scene.move_and_frame(131.0, 50.0);
        scene.release(131.0, 50.0);
        assert_eq!(handle.state().delta_x, -30.0);

        let (grip, top) = handle_top(&scene);
        scene.press(grip, 0.0, 10.0);
        scene.move_and_frame(0.0, 0.0);
        scene.release(0.0, 0.0);
        assert_eq!(top.state().delta_y, 10.0);
    }

    fn handle_top(scene: &Scene) -> (ElementId, ResizeHandle) {
        handle(scene, ResizeConfig::new().direction(ResizeDirection::Top))
    }

    #[test]
    fn delta_accumulates_across_gestures() {
        let scene = Scene::new();
        let (grip, handle) = handle(
            &scene,
            ResizeConfig::new()
                .direction(ResizeDirection::Bottom)
                .base_delta(0.0, 5.0),
        );
        scene.press(grip, 0.0, 0.0);
        scene.move_and_frame(0.0, 10.0);
        scene.release(0.0, 10.0);
        scene.press(grip, 0.0, 50.0);
        scene.move_and_frame(0.0, 70.0);
        scene.release(0.0, 70.0);
        assert_eq!(handle.state().delta_y, 35.0);
    }

    #[test]
    fn moves_within_a_frame_coalesce() {
        let scene = Scene::new();
        let writes = Rc::new(Cell::new(0u32));
        let writes_clone = Rc::clone(&writes);
        let (grip, handle) = handle(
            &scene,
            ResizeConfig::new()
                .direction(ResizeDirection::Right)
                .first_update(false)
                .updater(move |_| writes_clone.set(writes_clone.get() + 1)),
        );
        scene.press(grip, 0.0, 0.0);
        let after_press = writes.get();
        scene.move_to(10.0, 0.0);
        scene.move_to(20.0, 0.0);
        scene.move_to(40.0, 0.0);
        assert_eq!(scene.dispatcher.pending_frames(), 1);
        assert_eq!(handle.state().delta_x, 0.0);
        scene.frame();
        assert_eq!(writes.get(), after_press + 1);
        assert_eq!(handle.state().delta_x, 40.0);
        assert_eq!(handle.inner.throttle.borrow().coalesced(), 2);
        scene.release(40.0, 0.0);
    }

    #[test]
    fn release_flushes_pending_move() {
        let scene = Scene::new();
        let (grip, handle) = handle(&scene, ResizeConfig::new().direction(ResizeDirection::Right));
        scene.press(grip, 0.0, 0.0);
        scene.move_to(25.0, 0.0);
        scene.release(25.0, 0.0);
        assert_eq!(handle.state().delta_x, 25.0);
        assert_eq!(scene.dispatcher.pending_frames(), 0);
        assert!(!handle.has_pending_move());
        assert_eq!(scene.frame(), 0);
    }

    #[test]
    fn bounds_clamp_and_dynamic_override() {
        let scene = Scene::new();
        let (grip, handle) = handle(
            &scene,
            ResizeConfig::new()
                .direction(ResizeDirection::Right)
                .min_delta_x(-50.0)
                .max_delta_x(100.0)
                .get_min_max_delta(|state| {
                    assert!(state.resizing);
                    DeltaBounds {
                        max_delta_x: Some(60.0),
                        ..DeltaBounds::UNBOUNDED
                    }
                }),
        );
        scene.press(grip, 0.0, 0.0);
        scene.move_and_frame(500.0, 0.0);
        assert_eq!(handle.state().delta_x, 60.0);
        scene.move_and_frame(-500.0, 0.0);
        assert_eq!(handle.state().delta_x, -50.0);
        scene.release(-500.0, 0.0);
    }

    #[test]
    fn resizing_change_brackets_gesture() {
        let scene = Scene::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = Rc::clone(&log);
        let (grip, _handle) = handle(
            &scene,
            ResizeConfig::new().resizing_change(move |resizing| log_clone.borrow_mut().push(resizing)),
        );
        scene.press(grip, 0.0, 0.0);
        scene.release(0.0, 0.0);
        assert_eq!(*log.borrow(), vec![true, false]);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Move), 0);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Release), 0);
    }

    #[test]
    fn first_update_publishes_initial_state() {
        let scene = Scene::new();
        let seen = Rc::new(Cell::new(None));
        let seen_clone = Rc::clone(&seen);
        let (_grip, _handle) = handle(
            &scene,
            ResizeConfig::new()
                .base_delta(7.0, 3.0)
                .updater(move |state| seen_clone.set(Some(*state))),
        );
        assert_eq!(
            seen.get(),
            Some(ResizeState {
                delta_x: 7.0,
                delta_y: 3.0,
                resizing: false
            })
        );
    }

    #[test]
    fn second_press_is_ignored() {
        let scene = Scene::new();
        let store = ResizeStore::default();
        let (a, first) = handle(&scene, ResizeConfig::new().store(store.clone()));
        let (b, second) = handle(&scene, ResizeConfig::new().store(store.clone()));
        scene.press(a, 0.0, 0.0);
        scene.press(b, 0.0, 0.0);
        scene.press(a, 5.0, 0.0);
        assert_eq!(first.phase(), ResizePhase::Resizing);
        assert_eq!(second.phase(), ResizePhase::Idle);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Move), 1);
        scene.release(0.0, 0.0);
    }

    #[test]
    fn drop_mid_gesture_cancels_frame_and_clears_resizing() {
        let scene = Scene::new();
        let (grip, handle) = handle(&scene, ResizeConfig::new());
        let store = handle.store().clone();
        scene.press(grip, 0.0, 0.0);
        scene.move_to(10.0, 0.0);
        drop(handle);
        assert_eq!(scene.dispatcher.pending_frames(), 0);
        assert!(!store.state().resizing);
        assert_eq!(store.state().delta_x, 0.0);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Press), 0);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Move), 0);
    }

    #[test]
    fn retarget_keeps_store_and_aborts_gesture() {
        let scene = Scene::new();
        let (grip, mut handle) = handle(&scene, ResizeConfig::new().direction(ResizeDirection::Right));
        let store = handle.store().clone();
        scene.press(grip, 0.0, 0.0);
        scene.move_and_frame(20.0, 0.0);
        scene.move_to(30.0, 0.0);

        let other = scene.add_element(300.0, 0.0, 4.0, 100.0);
        handle.retarget(Some(other));
        assert_eq!(handle.phase(), ResizePhase::Idle);
        assert_eq!(handle.element(), Some(other));
        assert!(!store.state().resizing);
        assert_eq!(store.state().delta_x, 20.0);
        assert_eq!(scene.dispatcher.pending_frames(), 0);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Move), 0);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Press), 1);

        scene.press(grip, 0.0, 0.0);
        assert_eq!(handle.phase(), ResizePhase::Idle);

        scene.press(other, 300.0, 0.0);
        scene.move_and_frame(310.0, 0.0);
        scene.release(310.0, 0.0);
        assert_eq!(store.state().delta_x, 30.0);
        assert!(handle.store().ptr_eq(&store));
    }

    #[test]
    fn null_element_still_resolves_store() {
        let scene = Scene::new();
        let handle = ResizeHandle::attach(&scene.dispatcher, None, ResizeConfig::new().base_delta(4.0, 0.0));
        assert!(!handle.is_attached());
        assert_eq!(handle.state().delta_x, 4.0);
        assert_eq!(handle.store().update_count(), 1);
    }
}
