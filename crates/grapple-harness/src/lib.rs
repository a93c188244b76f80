#![forbid(unsafe_code)]

//! Test harness for grapple interactions.
//!
//! [`Scene`] bundles a [`HeadlessSurface`] with a [`PointerDispatcher`] and
//! offers one-line helpers for the press/move/release/frame sequences that
//! gesture tests are made of.
//!
//! ```
//! use grapple_harness::Scene;
//!
//! let scene = Scene::new();
//! let card = scene.add_element(10.0, 10.0, 40.0, 20.0);
//! scene.press(card, 12.0, 12.0);
//! scene.move_to(80.0, 80.0);
//! scene.release(80.0, 80.0);
//! assert_eq!(scene.dispatcher.pending_frames(), 0);
//! ```

pub mod surface;

use std::rc::Rc;

use grapple_core::dispatch::PointerDispatcher;
use grapple_core::event::PointerEvent;
use grapple_core::geometry::Rect;
use grapple_core::surface::{ElementId, Surface};
use tracing::trace;

pub use surface::{HeadlessSurface, NodeRecord};

/// A headless visual tree plus the dispatcher that feeds it input.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub surface: HeadlessSurface,
    pub dispatcher: PointerDispatcher,
}

impl Scene {
    /// Empty scene: just a root node.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The surface as the trait object controllers consume.
    #[must_use]
    pub fn surface(&self) -> Rc<dyn Surface> {
        self.surface.as_surface()
    }

    /// Add an element under the root.
    pub fn add_element(&self, x: f64, y: f64, width: f64, height: f64) -> ElementId {
        self.surface.add_element(Rect::new(x, y, width, height))
    }

    /// Press on `element` at `(x, y)`.
    pub fn press(&self, element: ElementId, x: f64, y: f64) -> PointerEvent {
        let event = PointerEvent::new(x, y);
        let invoked = self.dispatcher.press(element, &event);
        trace!(element = element.get(), x, y, invoked, "scene.press");
        event
    }

    /// Move the pointer to `(x, y)`.
    pub fn move_to(&self, x: f64, y: f64) -> PointerEvent {
        let event = PointerEvent::new(x, y);
        let invoked = self.dispatcher.pointer_move(&event);
        trace!(x, y, invoked, "scene.move");
        event
    }

    /// Release the pointer at `(x, y)`.
    pub fn release(&self, x: f64, y: f64) -> PointerEvent {
        let event = PointerEvent::new(x, y);
        let invoked = self.dispatcher.pointer_release(&event);
        trace!(x, y, invoked, "scene.release");
        event
    }

    /// Advance one animation frame.
    pub fn frame(&self) -> usize {
        self.dispatcher.run_frame()
    }

    /// Move then immediately run a frame, as a host that renders every move would.
    pub fn move_and_frame(&self, x: f64, y: f64) -> PointerEvent {
        let event = self.move_to(x, y);
        self.frame();
        event
    }

    /// Press on `element`, visit every point of `path`, release at the last one.
    ///
    /// An empty path releases where the press happened.
    pub fn drag_along(&self, element: ElementId, from: (f64, f64), path: &[(f64, f64)]) {
        self.press(element, from.0, from.1);
        for &(x, y) in path {
            self.move_to(x, y);
        }
        let (x, y) = path.last().copied().unwrap_or(from);
        self.release(x, y);
    }
}
