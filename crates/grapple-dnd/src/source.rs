#![forbid(unsafe_code)]

//! Drag controller: turns press/move/release on a source element into a
//! floating proxy that follows the pointer and bus signals for drop targets.
//!
//! # State Machine
//!
//! ```text
//! Idle --press--> Armed --first move--> Dragging --release--> Idle
//!                   \-------------release (aborted)---------> Idle
//! ```
//!
//! - **press**: record the grab offset, attach the proxy container to the
//!   surface root, arm document-level move/release listeners (the pointer
//!   may leave the source during a drag).
//! - **first move**: clone the source into the proxy, call `on_drag_start`.
//! - **later moves**: translate the proxy, emit `{key}-move`, then compute the
//!   source-containment effect (`auto` over the source, otherwise `disabled`
//!   unless a drop zone has claimed entry).
//! - **release**: detach both listeners exactly once; if dragging, call
//!   `on_drag_end` and emit `{key}-release`; always reset effect, proxy, and
//!   session.
//!
//! # Invariants
//!
//! 1. A release without an intervening move fires no drag callbacks and no
//!    bus signals, yet still returns the session to its initial state.
//! 2. `on_drag_start` runs exactly once per drag and before any move signal.
//! 3. A press while this source or the shared session is busy is ignored.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use grapple_core::event::PointerEvent;
use grapple_core::subscription::Subscription;
use grapple_core::surface::ElementId;
use serde_json::Value;
use tracing::{debug, trace};

use crate::context::{DragContext, move_topic, release_topic};
use crate::effect::DragEffect;
use crate::session::{DragData, DragSession};

/// Callback invoked at drag start and drag end.
pub type DragCallback = Box<dyn Fn(&PointerEvent, &DragHandle<'_>)>;

/// What drag callbacks may do to the session.
pub struct DragHandle<'a> {
    session: &'a DragSession,
    node: Option<ElementId>,
}

impl<'a> DragHandle<'a> {
    /// Merge `data` into the session payload.
    pub fn set_drag_data(&self, data: DragData) {
        self.session.set_drag_data(data);
    }

    /// Set one payload entry.
    pub fn set_drag_value(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.session.set_drag_value(key, value);
    }

    /// Copy of the session payload.
    #[must_use]
    pub fn get_drag_data(&self) -> DragData {
        self.session.get_drag_data()
    }

    /// Switch the effect mode.
    pub fn update_drag_effect(&self, effect: DragEffect) {
        self.session.update_drag_effect(effect);
    }

    /// The clone of the source placed inside the proxy.
    #[must_use]
    pub fn node(&self) -> Option<ElementId> {
        self.node
    }
}

/// Configuration of one drag source.
pub struct DragOptions {
    key: String,
    container_class_name: Option<String>,
    on_drag_start: Option<DragCallback>,
    on_drag_end: Option<DragCallback>,
}

impl fmt::Debug for DragOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragOptions")
            .field("key", &self.key)
            .field("container_class_name", &self.container_class_name)
            .field("on_drag_start", &self.on_drag_start.is_some())
            .field("on_drag_end", &self.on_drag_end.is_some())
            .finish()
    }
}

impl DragOptions {
    /// Options pairing this source with the drop targets sharing `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            container_class_name: None,
            on_drag_start: None,
            on_drag_end: None,
        }
    }

    /// Extra class appended to the proxy container's base class.
    #[must_use]
    pub fn container_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.container_class_name = Some(class_name.into());
        self
    }

    /// Called on the first move after press.
    #[must_use]
    pub fn on_drag_start(mut self, f: impl Fn(&PointerEvent, &DragHandle<'_>) + 'static) -> Self {
        self.on_drag_start = Some(Box::new(f));
        self
    }

    /// Called on release after a drag started.
    #[must_use]
    pub fn on_drag_end(mut self, f: impl Fn(&PointerEvent, &DragHandle<'_>) + 'static) -> Self {
        self.on_drag_end = Some(Box::new(f));
        self
    }

    /// Session key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Observable phase of a drag source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    /// Pressed, no move yet.
    Armed,
    Dragging,
}

/// Why a pointer signal did not advance the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragIgnoredReason {
    /// The source element is unset or no longer measurable.
    MissingElement,
    /// This source already has a gesture in flight.
    GestureInProgress,
    /// Another source sharing the session is mid-gesture.
    SessionBusy,
    /// Move/release arrived with nothing armed.
    NotArmed,
}

struct GestureListeners {
    moves: Subscription,
    release: Subscription,
}

impl GestureListeners {
    fn detach(self) {
        self.moves.unsubscribe();
        self.release.unsubscribe();
    }
}

enum GestureState {
    Idle,
    Armed {
        source: ElementId,
        listeners: GestureListeners,
    },
    Dragging {
        source: ElementId,
        listeners: GestureListeners,
        node: Option<ElementId>,
    },
}

impl GestureState {
    fn phase(&self) -> DragPhase {
        match self {
            Self::Idle => DragPhase::Idle,
            Self::Armed { .. } => DragPhase::Armed,
            Self::Dragging { .. } => DragPhase::Dragging,
        }
    }
}

struct SourceInner {
    context: DragContext,
    options: DragOptions,
    move_topic: String,
    release_topic: String,
    element: Cell<Option<ElementId>>,
    state: RefCell<GestureState>,
}

impl SourceInner {
    fn ignored(&self, phase: &'static str, reason: DragIgnoredReason) {
        debug!(key = %self.options.key, phase, ?reason, "drag.ignored");
    }

    fn pointer_down(this: &Rc<Self>, event: &PointerEvent) {
        if !matches!(*this.state.borrow(), GestureState::Idle) {
            this.ignored("press", DragIgnoredReason::GestureInProgress);
            return;
        }
        let session = this.context.session();
        if session.is_armed() {
            this.ignored("press", DragIgnoredReason::SessionBusy);
            return;
        }
        let Some(source) = this.element.get() else {
            this.ignored("press", DragIgnoredReason::MissingElement);
            return;
        };
        let Some(rect) = this.context.surface().bounding_rect(source) else {
            this.ignored("press", DragIgnoredReason::MissingElement);
            return;
        };

        session.ensure_proxy(this.options.container_class_name.as_deref());
        session.arm(rect.pointer_offset(event.position));

        let dispatcher = this.context.dispatcher();
        let weak: Weak<Self> = Rc::downgrade(this);
        let moves = dispatcher.on_document_move({
            let weak = weak.clone();
            move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.pointer_move(event);
                }
            }
        });
        let release = dispatcher.on_document_release(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.pointer_up(event);
            }
        });
        *this.state.borrow_mut() = GestureState::Armed {
            source,
            listeners: GestureListeners { moves, release },
        };
        debug!(key = %this.options.key, source = source.get(), "drag.armed");
    }

    fn pointer_move(&self, event: &PointerEvent) {
        event.prevent_default();
        let (source, first) = match &*self.state.borrow() {
            GestureState::Idle => {
                self.ignored("move", DragIgnoredReason::NotArmed);
                return;
            }
            GestureState::Armed { source, .. } => (*source, true),
            GestureState::Dragging { source, .. } => (*source, false),
        };
        let session = self.context.session();

        if first {
            let node = session.fill_proxy(source);
            {
                let mut state = self.state.borrow_mut();
                if let GestureState::Armed { source, listeners } =
                    std::mem::replace(&mut *state, GestureState::Idle)
                {
                    *state = GestureState::Dragging {
                        source,
                        listeners,
                        node,
                    };
                }
            }
            if let Some(on_drag_start) = &self.options.on_drag_start {
                on_drag_start(event, &DragHandle { session, node });
            }
            session.set_dragging(true);
            debug!(key = %self.options.key, "drag.start");
        }

        session.position_proxy(event.position);

        if !first {
            trace!(key = %self.options.key, x = event.client_x(), y = event.client_y(), "drag.move");
            self.context.bus().emit(&self.move_topic, event);
        }

        let over_source = self
            .context
            .surface()
            .bounding_rect(source)
            .is_some_and(|rect| rect.contains(event.position));
        if over_source {
            session.update_drag_effect(DragEffect::Auto);
        } else if !session.is_over_drop_zone() {
            session.update_drag_effect(DragEffect::Disabled);
        }
    }

    fn pointer_up(&self, event: &PointerEvent) {
        event.prevent_default();
        let previous = std::mem::replace(&mut *self.state.borrow_mut(), GestureState::Idle);
        let (listeners, dragged) = match previous {
            GestureState::Idle => {
                self.ignored("release", DragIgnoredReason::NotArmed);
                return;
            }
            GestureState::Armed { listeners, .. } => (listeners, None),
            GestureState::Dragging {
                listeners, node, ..
            } => (listeners, Some(node)),
        };
        listeners.detach();

        let session = self.context.session();
        if let Some(node) = dragged {
            if let Some(on_drag_end) = &self.options.on_drag_end {
                on_drag_end(event, &DragHandle { session, node });
            }
            self.context.bus().emit(&self.release_topic, event);
            debug!(key = %self.options.key, "drag.end");
        } else {
            debug!(key = %self.options.key, "drag.aborted");
        }

        session.update_drag_effect(DragEffect::Auto);
        session.release_proxy();
        session.reset();
    }

    /// Tear down an in-flight gesture without firing callbacks.
    fn abort(&self) {
        let previous = std::mem::replace(&mut *self.state.borrow_mut(), GestureState::Idle);
        let listeners = match previous {
            GestureState::Idle => return,
            GestureState::Armed { listeners, .. } | GestureState::Dragging { listeners, .. } => {
                listeners
            }
        };
        listeners.detach();
        let session = self.context.session();
        session.release_proxy();
        session.reset();
        debug!(key = %self.options.key, "drag.torn_down");
    }
}

/// A draggable element.
///
/// Dropping the source (or calling [`detach`](Self::detach)) removes its
/// press listener and tears down any gesture it has in flight.
pub struct DragSource {
    inner: Rc<SourceInner>,
    press: Option<Subscription>,
}

impl fmt::Debug for DragSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragSource")
            .field("key", &self.inner.options.key)
            .field("element", &self.inner.element.get())
            .field("phase", &self.phase())
            .finish()
    }
}

impl DragSource {
    /// Listen for presses on `element` (`None` attaches nothing).
    pub fn attach(context: &DragContext, element: Option<ElementId>, options: DragOptions) -> Self {
        let inner = Rc::new(SourceInner {
            context: context.clone(),
            move_topic: move_topic(&options.key),
            release_topic: release_topic(&options.key),
            options,
            element: Cell::new(None),
            state: RefCell::new(GestureState::Idle),
        });
        let mut source = Self { inner, press: None };
        source.retarget(element);
        source
    }

    /// Rebind to another element, aborting any gesture in flight.
    pub fn retarget(&mut self, element: Option<ElementId>) {
        self.detach();
        self.inner.element.set(element);
        let Some(element) = element else {
            return;
        };
        let weak = Rc::downgrade(&self.inner);
        self.press = Some(self.inner.context.dispatcher().on_press(element, move |event| {
            if let Some(inner) = weak.upgrade() {
                SourceInner::pointer_down(&inner, event);
            }
        }));
    }

    /// Stop listening. Idempotent.
    pub fn detach(&mut self) {
        if let Some(press) = self.press.take() {
            press.unsubscribe();
        }
        self.inner.abort();
    }

    /// Whether a press listener is installed.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.press.as_ref().is_some_and(Subscription::is_active)
    }

    /// The source element.
    #[must_use]
    pub fn element(&self) -> Option<ElementId> {
        self.inner.element.get()
    }

    /// Current gesture phase.
    #[must_use]
    pub fn phase(&self) -> DragPhase {
        self.inner.state.borrow().phase()
    }

    /// Session key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.options.key
    }
}

impl Drop for DragSource {
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
    use serde_json::json;

    fn context(scene: &Scene) -> DragContext {
        DragContext::new(scene.dispatcher.clone(), scene.surface())
    }

    fn counter() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    #[test]
    fn press_arms_document_listeners() {
        let scene = Scene::new();
        let card = scene.add_element(0.0, 0.0, 50.0, 20.0);
        let ctx = context(&scene);
        let source = ctx.attach_drag_source(Some(card), DragOptions::new("list"));

        scene.press(card, 10.0, 5.0);
        assert_eq!(source.phase(), DragPhase::Armed);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Move), 1);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Release), 1);
        assert!(ctx.session().is_armed());
        assert!(!ctx.session().is_dragging());
        assert_eq!(
            ctx.session().pointer_offset(),
            grapple_core::geometry::Point::new(10.0, 5.0)
        );
    }

    #[test]
    fn press_release_without_move_fires_nothing() {
        let scene = Scene::new();
        let card = scene.add_element(0.0, 0.0, 50.0, 20.0);
        let ctx = context(&scene);
        let starts = counter();
        let ends = counter();
        let signals = counter();
        let (s, e) = (Rc::clone(&starts), Rc::clone(&ends));
        let _source = ctx.attach_drag_source(
            Some(card),
            DragOptions::new("list")
                .on_drag_start(move |_, _| s.set(s.get() + 1))
                .on_drag_end(move |_, _| e.set(e.get() + 1)),
        );
        let sig = Rc::clone(&signals);
        let _bus_sub = ctx
            .bus()
            .on(release_topic("list"), move |_| sig.set(sig.get() + 1));

        scene.press(card, 10.0, 5.0);
        let release = scene.release(10.0, 5.0);

        assert_eq!((starts.get(), ends.get(), signals.get()), (0, 0, 0));
        assert!(release.default_prevented());
        assert_eq!(ctx.session().snapshot(), crate::session::SessionState::default());
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Move), 0);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Release), 0);
        let proxy = ctx.session().proxy().expect("proxy created on press");
        assert!(!scene.surface.is_attached(proxy));
    }

    #[test]
    fn first_move_starts_drag_and_clones_source() {
        let scene = Scene::new();
        let card = scene.add_element(0.0, 0.0, 50.0, 20.0);
        let ctx = context(&scene);
        let started_node = Rc::new(Cell::new(None));
        let started_clone = Rc::clone(&started_node);
        let source = ctx.attach_drag_source(
            Some(card),
            DragOptions::new("list")
                .container_class_name("ghost")
                .on_drag_start(move |_, handle| {
                    handle.set_drag_value("id", 42);
                    started_clone.set(handle.node());
                }),
        );

        scene.press(card, 10.0, 5.0);
        scene.move_to(12.0, 6.0);

        assert_eq!(source.phase(), DragPhase::Dragging);
        assert!(ctx.session().is_dragging());
        let proxy = ctx.session().proxy().expect("proxy");
        let node = started_node.get().expect("clone handed to callback");
        assert_eq!(scene.surface.children(proxy), vec![node]);
        let record = scene.surface.node(proxy).expect("proxy record");
        assert_eq!(record.class_name, "grapple-drag-proxy ghost");
        assert_eq!(record.size, Some((50.0, 20.0)));
        assert_eq!(
            record.translate,
            Some(grapple_core::geometry::Point::new(2.0, 1.0))
        );
        assert_eq!(
            serde_json::Value::Object(ctx.session().get_drag_data()),
            json!({"id": 42})
        );
    }

    #[test]
    fn first_move_does_not_emit_later_moves_do() {
        let scene = Scene::new();
        let card = scene.add_element(0.0, 0.0, 50.0, 20.0);
        let ctx = context(&scene);
        let moves = counter();
        let m = Rc::clone(&moves);
        let _sub = ctx.bus().on(move_topic("list"), move |_| m.set(m.get() + 1));
        let _source = ctx.attach_drag_source(Some(card), DragOptions::new("list"));

        scene.press(card, 1.0, 1.0);
        scene.move_to(2.0, 2.0);
        assert_eq!(moves.get(), 0);
        scene.move_to(3.0, 3.0);
        scene.move_to(4.0, 4.0);
        assert_eq!(moves.get(), 2);
    }

    #[test]
    fn effect_tracks_source_containment() {
        let scene = Scene::new();
        let card = scene.add_element(0.0, 0.0, 50.0, 20.0);
        let ctx = context(&scene);
        let _source = ctx.attach_drag_source(Some(card), DragOptions::new("list"));

        scene.press(card, 10.0, 10.0);
        scene.move_to(11.0, 11.0);
        assert_eq!(ctx.session().effect(), DragEffect::Auto);
        scene.move_to(200.0, 200.0);
        assert_eq!(ctx.session().effect(), DragEffect::Disabled);
        let proxy = ctx.session().proxy().expect("proxy");
        assert_eq!(
            scene.surface.attribute(proxy, "effect").as_deref(),
            Some("disabled")
        );
        scene.move_to(50.0, 20.0);
        assert_eq!(ctx.session().effect(), DragEffect::Auto);
    }

    #[test]
    fn release_after_drag_fires_end_and_signal_then_resets() {
        let scene = Scene::new();
        let card = scene.add_element(0.0, 0.0, 50.0, 20.0);
        let ctx = context(&scene);
        let order = Rc::new(RefCell::new(Vec::new()));
        let (o1, o2) = (Rc::clone(&order), Rc::clone(&order));
        let _source = ctx.attach_drag_source(
            Some(card),
            DragOptions::new("list").on_drag_end(move |_, handle| {
                assert!(handle.node().is_some());
                o1.borrow_mut().push("end");
            }),
        );
        let _sub = ctx
            .bus()
            .on(release_topic("list"), move |_| o2.borrow_mut().push("signal"));

        scene.drag_along(card, (5.0, 5.0), &[(6.0, 6.0), (100.0, 100.0)]);

        assert_eq!(*order.borrow(), vec!["end", "signal"]);
        assert!(!ctx.session().is_armed());
        assert_eq!(ctx.session().effect(), DragEffect::None);
        let proxy = ctx.session().proxy().expect("proxy");
        assert!(scene.surface.children(proxy).is_empty());
        assert!(!scene.surface.is_attached(proxy));
        assert_eq!(
            scene.surface.attribute(proxy, "effect").as_deref(),
            Some("")
        );
    }

    #[test]
    fn second_press_while_armed_is_ignored() {
        let scene = Scene::new();
        let a = scene.add_element(0.0, 0.0, 50.0, 20.0);
        let b = scene.add_element(0.0, 100.0, 50.0, 20.0);
        let ctx = context(&scene);
        let source_a = ctx.attach_drag_source(Some(a), DragOptions::new("list"));
        let source_b = ctx.attach_drag_source(Some(b), DragOptions::new("list"));

        scene.press(a, 10.0, 10.0);
        scene.press(b, 10.0, 110.0);
        scene.press(a, 10.0, 10.0);
        assert_eq!(source_a.phase(), DragPhase::Armed);
        assert_eq!(source_b.phase(), DragPhase::Idle);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Move), 1);
        assert_eq!(
            ctx.session().pointer_offset(),
            grapple_core::geometry::Point::new(10.0, 10.0)
        );
    }

    #[test]
    fn missing_element_press_is_noop() {
        let scene = Scene::new();
        let card = scene.add_element(0.0, 0.0, 50.0, 20.0);
        let ctx = context(&scene);
        let source = ctx.attach_drag_source(Some(card), DragOptions::new("list"));
        scene.surface.remove_element(card);
        scene.press(card, 1.0, 1.0);
        assert_eq!(source.phase(), DragPhase::Idle);
        assert!(ctx.session().proxy().is_none());
    }

    #[test]
    fn null_element_attaches_nothing() {
        let scene = Scene::new();
        let ctx = context(&scene);
        let source = ctx.attach_drag_source(None, DragOptions::new("list"));
        assert!(!source.is_attached());
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Press), 0);
    }

    #[test]
    fn dropping_source_mid_drag_cleans_up() {
        let scene = Scene::new();
        let card = scene.add_element(0.0, 0.0, 50.0, 20.0);
        let ctx = context(&scene);
        let source = ctx.attach_drag_source(Some(card), DragOptions::new("list"));
        scene.press(card, 1.0, 1.0);
        scene.move_to(80.0, 80.0);
        drop(source);

        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Press), 0);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Move), 0);
        assert_eq!(scene.dispatcher.listener_count(PointerPhase::Release), 0);
        assert!(!ctx.session().is_armed());
        scene.release(80.0, 80.0);
    }

    #[test]
    fn retarget_moves_press_listener() {
        let scene = Scene::new();
        let a = scene.add_element(0.0, 0.0, 50.0, 20.0);
        let b = scene.add_element(0.0, 100.0, 50.0, 20.0);
        let ctx = context(&scene);
        let mut source = ctx.attach_drag_source(Some(a), DragOptions::new("list"));
        source.retarget(Some(b));

        scene.press(a, 1.0, 1.0);
        assert_eq!(source.phase(), DragPhase::Idle);
        scene.press(b, 1.0, 101.0);
        assert_eq!(source.phase(), DragPhase::Armed);
        assert_eq!(source.element(), Some(b));
    }
}
