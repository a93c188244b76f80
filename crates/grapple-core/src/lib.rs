// Forbid unsafe in production; deny in tests.
#![cfg_attr(not(test), forbid(unsafe_code))]
#![cfg_attr(test, deny(unsafe_code))]

//! Core: pointer geometry, events, signalling, and host dispatch.
//!
//! # Role in grapple
//! `grapple-core` is the layer every interaction engine builds on. It owns
//! the pointer event type, the geometry used for hit testing, the signal bus
//! that connects drag sources to drop targets, and the host-facing seams
//! ([`surface::Surface`] for the visual tree, [`dispatch::PointerDispatcher`]
//! for input and animation frames).
//!
//! # Primary responsibilities
//! - **Geometry**: inclusive containment and grab offsets.
//! - **PointerEvent**: canonical press/move/release payload.
//! - **SignalBus**: synchronous, ordered, topic-keyed publish/subscribe.
//! - **PointerDispatcher**: element press listeners, document-level
//!   move/release listeners, and the frame queue.
//! - **FrameThrottle**: latest-wins coalescing to frame cadence.
//!
//! # How it fits in the system
//! `grapple-dnd` and `grapple-resize` implement gesture state machines on top
//! of these types; `grapple-harness` implements [`surface::Surface`] in memory
//! for tests.

pub mod bus;
pub mod dispatch;
pub mod event;
pub mod frame_throttle;
pub mod geometry;
pub mod logging;
pub mod subscription;
pub mod surface;

pub use bus::SignalBus;
pub use dispatch::{FrameRequest, PointerDispatcher, PointerPhase};
pub use event::{Modifiers, PointerButton, PointerEvent};
pub use frame_throttle::FrameThrottle;
pub use geometry::{Point, Rect};
pub use subscription::Subscription;
pub use surface::{ElementId, Surface};
