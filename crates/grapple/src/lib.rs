#![forbid(unsafe_code)]

//! grapple public facade.
//!
//! [`Grapple`] owns the pointer dispatcher and the drag context for one
//! surface and is the single entry point for attaching drag sources, drop
//! targets, and resize handles. The building blocks are re-exported for hosts
//! that want to wire them differently.
//!
//! ```
//! use grapple::{DragOptions, DropOptions, Grapple, GrappleConfig};
//! use grapple_harness::Scene;
//!
//! let scene = Scene::new();
//! let card = scene.add_element(0.0, 0.0, 80.0, 30.0);
//! let bin = scene.add_element(300.0, 0.0, 100.0, 100.0);
//! let grapple = Grapple::with_dispatcher(
//!     scene.dispatcher.clone(),
//!     scene.surface(),
//!     GrappleConfig::default(),
//! );
//!
//! let _source = grapple.attach_drag_source(
//!     Some(card),
//!     DragOptions::new("cards").on_drag_start(|_, drag| drag.set_drag_value("id", 7)),
//! );
//! let _bin = grapple.attach_drop_target(
//!     Some(bin),
//!     DropOptions::new("cards").on_drop(|_, drop| {
//!         assert_eq!(drop.get_drag_data()["id"], 7);
//!     }),
//! );
//! scene.drag_along(card, (10.0, 10.0), &[(11.0, 11.0), (320.0, 20.0)]);
//! ```

pub mod config;

use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

pub use config::{ConfigError, GrappleConfig, ResizeDefaults};

// --- Core re-exports -------------------------------------------------------

pub use grapple_core::{
    ElementId, FrameRequest, Modifiers, Point, PointerButton, PointerDispatcher, PointerEvent,
    PointerPhase, Rect, SignalBus, Subscription, Surface,
};

// --- Drag and drop re-exports ----------------------------------------------

pub use grapple_dnd::{
    DragConfig, DragContext, DragData, DragEffect, DragHandle, DragOptions, DragPhase,
    DragSession, DragSource, DropHandle, DropOptions, DropTarget,
};

// --- Resize re-exports -----------------------------------------------------

pub use grapple_resize::{
    DeltaBounds, ResizeConfig, ResizeDirection, ResizeHandle, ResizePhase, ResizeState,
    ResizeStore, ResizeUpdate,
};

/// Interaction engines bound to one surface.
pub struct Grapple {
    dispatcher: PointerDispatcher,
    drag: DragContext,
    config: GrappleConfig,
}

impl fmt::Debug for Grapple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grapple")
            .field("dispatcher", &self.dispatcher)
            .field("drag", &self.drag)
            .field("config", &self.config)
            .finish()
    }
}

impl Grapple {
    /// Engines with the default configuration and a fresh dispatcher.
    #[must_use]
    pub fn new(surface: Rc<dyn Surface>) -> Self {
        Self::with_config(surface, GrappleConfig::default())
    }

    /// Engines with a fresh dispatcher.
    #[must_use]
    pub fn with_config(surface: Rc<dyn Surface>, config: GrappleConfig) -> Self {
        Self::with_dispatcher(PointerDispatcher::new(), surface, config)
    }

    /// Engines listening on a dispatcher the host already drives.
    #[must_use]
    pub fn with_dispatcher(
        dispatcher: PointerDispatcher,
        surface: Rc<dyn Surface>,
        config: GrappleConfig,
    ) -> Self {
        for warning in config.warnings() {
            warn!(%warning, "grapple.config");
        }
        let drag = DragContext::with_config(dispatcher.clone(), surface, config.drag.clone());
        debug!(proxy_class = %config.drag.proxy_class, "grapple.init");
        Self {
            dispatcher,
            drag,
            config,
        }
    }

    /// The dispatcher the host feeds pointer input and frame ticks into.
    #[must_use]
    pub fn dispatcher(&self) -> &PointerDispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn drag_context(&self) -> &DragContext {
        &self.drag
    }

    #[must_use]
    pub fn config(&self) -> &GrappleConfig {
        &self.config
    }

    /// Make `element` draggable.
    pub fn attach_drag_source(
        &self,
        element: Option<ElementId>,
        options: DragOptions,
    ) -> DragSource {
        self.drag.attach_drag_source(element, options)
    }

    /// Make `element` a drop zone for sources with the same key.
    pub fn attach_drop_target(
        &self,
        element: Option<ElementId>,
        options: DropOptions,
    ) -> DropTarget {
        self.drag.attach_drop_target(element, options)
    }

    /// Copy of the current drag payload.
    #[must_use]
    pub fn get_drag_data(&self) -> DragData {
        self.drag.session().get_drag_data()
    }

    /// Merge `data` into the current drag payload.
    pub fn set_drag_data(&self, data: DragData) {
        self.drag.session().set_drag_data(data);
    }

    /// Resize configuration seeded from [`ResizeDefaults`].
    #[must_use]
    pub fn resize_config(&self) -> ResizeConfig {
        let defaults = self.config.resize;
        ResizeConfig::new()
            .direction(defaults.direction)
            .bounds(defaults.bounds)
            .first_update(defaults.first_update)
    }

    /// Make `element` a resize handle.
    pub fn attach_resize_handle(
        &self,
        element: Option<ElementId>,
        config: ResizeConfig,
    ) -> ResizeHandle {
        ResizeHandle::attach(&self.dispatcher, element, config)
    }

    /// A store that several handles can share.
    #[must_use]
    pub fn resize_store(&self, base_delta_x: f64, base_delta_y: f64) -> ResizeStore {
        ResizeStore::new(base_delta_x, base_delta_y)
    }
}

pub mod prelude {
    pub use crate::{
        DeltaBounds, DragEffect, DragOptions, DropOptions, ElementId, Grapple, GrappleConfig,
        PointerEvent, ResizeConfig, ResizeDirection, ResizeState, ResizeStore, Surface,
    };

    pub use crate::{core, dnd, resize};
}

pub use grapple_core as core;
pub use grapple_core::logging;
pub use grapple_dnd as dnd;
pub use grapple_resize as resize;
