#![forbid(unsafe_code)]

//! Canonical pointer event type.
//!
//! Hosts translate their native pointer input into [`PointerEvent`] values
//! and push them through a [`PointerDispatcher`](crate::dispatch::PointerDispatcher).
//!
//! # Design Notes
//!
//! - Coordinates are client coordinates, the same space that
//!   [`Surface::bounding_rect`](crate::surface::Surface::bounding_rect) measures in.
//! - `prevent_default` is a marker the host may read back after dispatch to
//!   suppress native behavior (text selection, native drag images).

use std::cell::Cell;

use bitflags::bitflags;

use crate::geometry::Point;

/// Pointer button that produced a press/release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

bitflags! {
    /// Modifier keys held during a pointer event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// A pointer press, move, or release.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    /// Pointer position in client coordinates.
    pub position: Point,
    /// Button involved (for moves: the button held, if known).
    pub button: PointerButton,
    /// Modifier keys held.
    pub modifiers: Modifiers,
    default_prevented: Cell<bool>,
}

impl PointerEvent {
    /// Create a primary-button event at `(x, y)` with no modifiers.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self::at(Point::new(x, y))
    }

    /// Create a primary-button event at `position`.
    #[must_use]
    pub fn at(position: Point) -> Self {
        Self {
            position,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            default_prevented: Cell::new(false),
        }
    }

    /// Set the button.
    #[must_use]
    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Set the modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Horizontal client coordinate.
    #[inline]
    #[must_use]
    pub fn client_x(&self) -> f64 {
        self.position.x
    }

    /// Vertical client coordinate.
    #[inline]
    #[must_use]
    pub fn client_y(&self) -> f64 {
        self.position.y
    }

    /// Ask the host to suppress its native handling of this event.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Whether any listener called [`prevent_default`](Self::prevent_default).
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}
