#![forbid(unsafe_code)]

//! Wiring shared by every source and target of one drag surface.

use std::fmt;
use std::rc::Rc;

use grapple_core::bus::SignalBus;
use grapple_core::dispatch::PointerDispatcher;
use grapple_core::event::PointerEvent;
use grapple_core::surface::{ElementId, Surface};

use crate::config::DragConfig;
use crate::session::DragSession;
use crate::source::{DragOptions, DragSource};
use crate::target::{DropOptions, DropTarget};

/// Bus topic carrying drag moves for `key`.
#[must_use]
pub fn move_topic(key: &str) -> String {
    format!("{key}-move")
}

/// Bus topic carrying drag releases for `key`.
#[must_use]
pub fn release_topic(key: &str) -> String {
    format!("{key}-release")
}

/// Dispatcher, surface, session, and bus shared by a family of controllers.
///
/// Cloning is cheap and shares everything. Two independent contexts never
/// see each other's drags, even with identical keys.
#[derive(Clone)]
pub struct DragContext {
    dispatcher: PointerDispatcher,
    surface: Rc<dyn Surface>,
    session: DragSession,
    bus: SignalBus<PointerEvent>,
}

impl fmt::Debug for DragContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragContext")
            .field("dispatcher", &self.dispatcher)
            .field("session", &self.session)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl DragContext {
    /// Context with a fresh session and bus and the default configuration.
    #[must_use]
    pub fn new(dispatcher: PointerDispatcher, surface: Rc<dyn Surface>) -> Self {
        Self::with_config(dispatcher, surface, DragConfig::default())
    }

    /// Context with a fresh session and bus.
    #[must_use]
    pub fn with_config(
        dispatcher: PointerDispatcher,
        surface: Rc<dyn Surface>,
        config: DragConfig,
    ) -> Self {
        let session = DragSession::with_config(Rc::clone(&surface), config);
        Self {
            dispatcher,
            surface,
            session,
            bus: SignalBus::new(),
        }
    }

    /// Make `element` draggable. `None` yields an inert source.
    pub fn attach_drag_source(
        &self,
        element: Option<ElementId>,
        options: DragOptions,
    ) -> DragSource {
        DragSource::attach(self, element, options)
    }

    /// Make `element` a drop zone. `None` yields an inert target.
    pub fn attach_drop_target(
        &self,
        element: Option<ElementId>,
        options: DropOptions,
    ) -> DropTarget {
        DropTarget::attach(self, element, options)
    }

    /// The shared drag session.
    #[must_use]
    pub fn session(&self) -> &DragSession {
        &self.session
    }

    /// The bus connecting sources to targets.
    #[must_use]
    pub fn bus(&self) -> &SignalBus<PointerEvent> {
        &self.bus
    }

    /// The pointer dispatcher controllers listen on.
    #[must_use]
    pub fn dispatcher(&self) -> &PointerDispatcher {
        &self.dispatcher
    }

    /// The visual layer.
    #[must_use]
    pub fn surface(&self) -> &Rc<dyn Surface> {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_names() {
        assert_eq!(move_topic("board"), "board-move");
        assert_eq!(release_topic("board"), "board-release");
    }
}
