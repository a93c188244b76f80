#![forbid(unsafe_code)]

//! Drop controller: listens on the bus for the moves and releases of drag
//! sources sharing its key and tracks pointer containment in its element.
//!
//! Containment is recomputed from the element's bounding rect on every
//! signal, so a zone that moves or resizes mid-drag is hit-tested where it
//! currently is.
//!
//! Per drag the callbacks fire as `enter (move)* leave` any number of times,
//! then at most one `drop`, which only happens while inside the zone and only
//! when the validator accepts.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use grapple_core::event::PointerEvent;
use grapple_core::subscription::Subscription;
use grapple_core::surface::ElementId;
use tracing::{debug, trace};

use crate::context::{DragContext, move_topic, release_topic};
use crate::effect::DragEffect;
use crate::session::{DragData, DragSession};

/// Callback invoked on enter, leave, move and drop.
pub type DropCallback = Box<dyn Fn(&PointerEvent, &DropHandle<'_>)>;

/// Decides whether a release inside the zone counts as a drop.
pub type DropValidator = Box<dyn Fn(&PointerEvent, &DropHandle<'_>) -> bool>;

/// What drop callbacks may do to the session.
pub struct DropHandle<'a> {
    session: &'a DragSession,
}

impl DropHandle<'_> {
    /// Switch the effect mode.
    pub fn update_drag_effect(&self, effect: DragEffect) {
        self.session.update_drag_effect(effect);
    }

    /// Copy of the payload set by the drag source.
    #[must_use]
    pub fn get_drag_data(&self) -> DragData {
        self.session.get_drag_data()
    }
}

/// Configuration of one drop target.
pub struct DropOptions {
    key: String,
    on_drag_enter: Option<DropCallback>,
    on_drag_leave: Option<DropCallback>,
    on_drag_move: Option<DropCallback>,
    on_drop: Option<DropCallback>,
    on_valid_drop: Option<DropValidator>,
}

impl fmt::Debug for DropOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropOptions")
            .field("key", &self.key)
            .field("on_drag_enter", &self.on_drag_enter.is_some())
            .field("on_drag_leave", &self.on_drag_leave.is_some())
            .field("on_drag_move", &self.on_drag_move.is_some())
            .field("on_drop", &self.on_drop.is_some())
            .field("on_valid_drop", &self.on_valid_drop.is_some())
            .finish()
    }
}

impl DropOptions {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            on_drag_enter: None,
            on_drag_leave: None,
            on_drag_move: None,
            on_drop: None,
            on_valid_drop: None,
        }
    }

    #[must_use]
    pub fn on_drag_enter(mut self, f: impl Fn(&PointerEvent, &DropHandle<'_>) + 'static) -> Self {
        self.on_drag_enter = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_drag_leave(mut self, f: impl Fn(&PointerEvent, &DropHandle<'_>) + 'static) -> Self {
        self.on_drag_leave = Some(Box::new(f));
        self
    }

    /// Called for each move while the pointer stays inside after entering.
    #[must_use]
    pub fn on_drag_move(mut self, f: impl Fn(&PointerEvent, &DropHandle<'_>) + 'static) -> Self {
        self.on_drag_move = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_drop(mut self, f: impl Fn(&PointerEvent, &DropHandle<'_>) + 'static) -> Self {
        self.on_drop = Some(Box::new(f));
        self
    }

    /// Gate for [`on_drop`](Self::on_drop). Without one every drop is valid.
    #[must_use]
    pub fn on_valid_drop(
        mut self,
        f: impl Fn(&PointerEvent, &DropHandle<'_>) -> bool + 'static,
    ) -> Self {
        self.on_valid_drop = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

struct TargetInner {
    context: DragContext,
    options: DropOptions,
    element: ElementId,
    entered: Cell<bool>,
}

impl TargetInner {
    fn contains(&self, event: &PointerEvent) -> bool {
        self.context
            .surface()
            .bounding_rect(self.element)
            .is_some_and(|rect| rect.contains(event.position))
    }

    fn fire(&self, callback: Option<&DropCallback>, event: &PointerEvent) {
        if let Some(callback) = callback {
            callback(
                event,
                &DropHandle {
                    session: self.context.session(),
                },
            );
        }
    }

    fn on_signal_move(&self, event: &PointerEvent) {
        let session = self.context.session();
        let inside = self.contains(event);
        let entered = self.entered.get();

        if inside && !entered {
            self.entered.set(true);
            session.claim_drop_zone();
            debug!(key = %self.options.key, element = self.element.get(), "drop.enter");
            self.fire(self.options.on_drag_enter.as_ref(), event);
            session.update_drag_effect(DragEffect::Drop);
        } else if inside {
            trace!(key = %self.options.key, element = self.element.get(), "drop.move");
            self.fire(self.options.on_drag_move.as_ref(), event);
        } else if entered {
            self.entered.set(false);
            if !session.release_drop_zone() {
                session.update_drag_effect(DragEffect::Disabled);
            }
            debug!(key = %self.options.key, element = self.element.get(), "drop.leave");
            self.fire(self.options.on_drag_leave.as_ref(), event);
        }
    }

    fn on_signal_release(&self, event: &PointerEvent) {
        if self.contains(event) {
            let handle = DropHandle {
                session: self.context.session(),
            };
            let valid = self
                .options
                .on_valid_drop
                .as_ref()
                .is_none_or(|validate| validate(event, &handle));
            if valid {
                debug!(key = %self.options.key, element = self.element.get(), "drop.accepted");
                self.fire(self.options.on_drop.as_ref(), event);
            } else {
                debug!(key = %self.options.key, element = self.element.get(), "drop.rejected");
            }
        }
        if self.entered.replace(false) {
            self.context.session().release_drop_zone();
        }
    }
}

/// A drop zone.
///
/// Dropping the target (or calling [`detach`](Self::detach)) unsubscribes
/// both bus listeners.
pub struct DropTarget {
    inner: Option<Rc<TargetInner>>,
    subscriptions: Vec<Subscription>,
}

impl fmt::Debug for DropTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropTarget")
            .field("element", &self.element())
            .field("entered", &self.is_entered())
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl DropTarget {
    /// Subscribe to `{key}-move` and `{key}-release` for `element`
    /// (`None` attaches nothing).
    pub fn attach(context: &DragContext, element: Option<ElementId>, options: DropOptions) -> Self {
        let Some(element) = element else {
            return Self {
                inner: None,
                subscriptions: Vec::new(),
            };
        };
        let moves = move_topic(&options.key);
        let releases = release_topic(&options.key);
        let inner = Rc::new(TargetInner {
            context: context.clone(),
            options,
            element,
            entered: Cell::new(false),
        });
        let bus = context.bus();
        let on_move = bus.on(moves, {
            let weak = Rc::downgrade(&inner);
            move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_signal_move(event);
                }
            }
        });
        let on_release = bus.on(releases, {
            let weak = Rc::downgrade(&inner);
            move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_signal_release(event);
                }
            }
        });
        Self {
            inner: Some(inner),
            subscriptions: vec![on_move, on_release],
        }
    }

    /// Stop listening. Idempotent.
    pub fn detach(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        if let Some(inner) = self.inner.take()
            && inner.entered.replace(false)
        {
            inner.context.session().release_drop_zone();
        }
    }

    /// Whether the bus listeners are installed.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Whether the pointer is currently inside after an enter.
    #[must_use]
    pub fn is_entered(&self) -> bool {
        self.inner.as_ref().is_some_and(|inner| inner.entered.get())
    }

    #[must_use]
    pub fn element(&self) -> Option<ElementId> {
        self.inner.as_ref().map(|inner| inner.element)
    }
}

impl Drop for DropTarget {
    fn drop(&mut self) {
        self.detach();
    }
}
