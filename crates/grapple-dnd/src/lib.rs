#![forbid(unsafe_code)]

//! Pointer-driven drag and drop.
//!
//! A [`DragContext`] groups one [`DragSession`], one signal bus, a pointer
//! dispatcher and a surface. Sources attached through it render a floating
//! proxy on drag and broadcast `{key}-move` / `{key}-release`; targets with
//! the same key hit-test those signals against their own element.
//!
//! ```
//! use grapple_dnd::{DragContext, DragOptions, DropOptions};
//! use grapple_harness::Scene;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let scene = Scene::new();
//! let card = scene.add_element(0.0, 0.0, 40.0, 20.0);
//! let zone = scene.add_element(100.0, 0.0, 50.0, 50.0);
//! let ctx = DragContext::new(scene.dispatcher.clone(), scene.surface());
//!
//! let dropped = Rc::new(Cell::new(false));
//! let flag = Rc::clone(&dropped);
//! let _source = ctx.attach_drag_source(Some(card), DragOptions::new("cards"));
//! let _target = ctx.attach_drop_target(
//!     Some(zone),
//!     DropOptions::new("cards").on_drop(move |_, _| flag.set(true)),
//! );
//!
//! scene.drag_along(card, (5.0, 5.0), &[(6.0, 6.0), (120.0, 10.0)]);
//! assert!(dropped.get());
//! ```

pub mod config;
pub mod context;
pub mod effect;
pub mod session;
pub mod source;
pub mod target;

pub use config::DragConfig;
pub use context::{DragContext, move_topic, release_topic};
pub use effect::DragEffect;
pub use session::{DragData, DragSession, SessionState};
pub use source::{DragHandle, DragIgnoredReason, DragOptions, DragPhase, DragSource};
pub use target::{DropHandle, DropOptions, DropTarget};
