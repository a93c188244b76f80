#![forbid(unsafe_code)]

//! Pointer-driven edge resizing.
//!
//! A [`ResizeHandle`] turns press/move/release on a handle element into
//! signed, clamped deltas written to a [`ResizeStore`]. Moves are applied at
//! most once per animation frame.
//!
//! ```
//! use grapple_harness::Scene;
//! use grapple_resize::{ResizeConfig, ResizeDirection, ResizeHandle};
//!
//! let scene = Scene::new();
//! let grip = scene.add_element(200.0, 0.0, 4.0, 300.0);
//! let handle = ResizeHandle::attach(
//!     &scene.dispatcher,
//!     Some(grip),
//!     ResizeConfig::new()
//!         .direction(ResizeDirection::Right)
//!         .min_delta_x(-50.0)
//!         .max_delta_x(100.0),
//! );
//!
//! scene.press(grip, 201.0, 10.0);
//! scene.move_and_frame(701.0, 10.0);
//! scene.release(701.0, 10.0);
//! assert_eq!(handle.state().delta_x, 100.0);
//! ```

pub mod bounds;
pub mod direction;
pub mod handle;
pub mod store;

pub use bounds::DeltaBounds;
pub use direction::{Axis, ResizeDirection};
pub use handle::{ResizeConfig, ResizeHandle, ResizeIgnoredReason, ResizePhase};
pub use store::{ResizeState, ResizeStore, ResizeUpdate};
