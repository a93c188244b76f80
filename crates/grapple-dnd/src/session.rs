#![forbid(unsafe_code)]

//! Shared drag session state.
//!
//! # Design
//!
//! [`DragSession`] is an explicitly owned, cloneable handle (`Rc<RefCell<..>>`)
//! rather than a process-wide singleton: every [`DragContext`](crate::DragContext)
//! owns one, and all sources and targets created from that context share it.
//!
//! # Invariants
//!
//! 1. At most one gesture is armed per session; a second press is ignored.
//! 2. `dragging` is true only between the first move after press and release.
//! 3. The effect never changes without the proxy attribute being rewritten
//!    (when a proxy exists).
//! 4. [`reset`](DragSession::reset) restores every field to its initial value
//!    except the proxy handle, which is reused by the next session.
//! 5. [`get_drag_data`](DragSession::get_drag_data) returns a copy; the live
//!    payload is only mutable through [`set_drag_data`](DragSession::set_drag_data).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use grapple_core::geometry::Point;
use grapple_core::surface::{ElementId, Surface};
use serde_json::Value;
use tracing::debug;

use crate::config::DragConfig;
use crate::effect::DragEffect;

/// Payload carried from drag source to drop target.
pub type DragData = serde_json::Map<String, Value>;

/// The resettable part of a drag session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    /// Payload set by the source during the session.
    pub data: DragData,
    /// A press has been accepted and listeners are armed.
    pub armed: bool,
    /// The first move after press has happened.
    pub dragging: bool,
    /// Drop targets currently entered. Several zones sharing a key may
    /// overlap, or hand over within one move, so each holds its own claim.
    pub drop_zone_claims: usize,
    /// Vector from the source origin to the pointer at press time.
    pub pointer_offset: Point,
    /// Last effect written.
    pub effect: DragEffect,
}

#[derive(Debug, Default)]
struct SessionInner {
    state: SessionState,
    proxy: Option<ElementId>,
}

/// Handle to one shared drag session.
#[derive(Clone)]
pub struct DragSession {
    inner: Rc<RefCell<SessionInner>>,
    surface: Rc<dyn Surface>,
    config: Rc<DragConfig>,
}

impl fmt::Debug for DragSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("DragSession")
            .field("state", &inner.state)
            .field("proxy", &inner.proxy)
            .finish_non_exhaustive()
    }
}

impl DragSession {
    /// Create an idle session drawing its proxy on `surface`.
    #[must_use]
    pub fn new(surface: Rc<dyn Surface>) -> Self {
        Self::with_config(surface, DragConfig::default())
    }

    /// Create an idle session with explicit configuration.
    #[must_use]
    pub fn with_config(surface: Rc<dyn Surface>, config: DragConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SessionInner::default())),
            surface,
            config: Rc::new(config),
        }
    }

    /// Configuration in effect.
    #[must_use]
    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    /// Merge `data` into the payload; later keys win.
    pub fn set_drag_data(&self, data: DragData) {
        let mut inner = self.inner.borrow_mut();
        for (key, value) in data {
            inner.state.data.insert(key, value);
        }
    }

    /// Set one payload entry.
    pub fn set_drag_value(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .borrow_mut()
            .state
            .data
            .insert(key.into(), value.into());
    }

    /// Copy of the payload.
    #[must_use]
    pub fn get_drag_data(&self) -> DragData {
        self.inner.borrow().state.data.clone()
    }

    /// Switch the effect mode.
    ///
    /// No-op when `effect` equals the current mode. Otherwise the new mode is
    /// recorded and written to the proxy attribute. Returns whether it changed.
    pub fn update_drag_effect(&self, effect: DragEffect) -> bool {
        let proxy = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.effect == effect {
                return false;
            }
            inner.state.effect = effect;
            inner.proxy
        };
        if let Some(proxy) = proxy {
            self.surface
                .set_attribute(proxy, &self.config.effect_attribute, effect.as_attribute());
        }
        debug!(%effect, "drag.effect");
        true
    }

    /// Current effect mode.
    #[must_use]
    pub fn effect(&self) -> DragEffect {
        self.inner.borrow().state.effect
    }

    /// Whether a press is armed (dragging or about to).
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.inner.borrow().state.armed
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.inner.borrow().state.dragging
    }

    /// Whether the pointer is inside at least one entered drop zone.
    #[must_use]
    pub fn is_over_drop_zone(&self) -> bool {
        self.inner.borrow().state.drop_zone_claims > 0
    }

    /// Grab offset recorded at press time.
    #[must_use]
    pub fn pointer_offset(&self) -> Point {
        self.inner.borrow().state.pointer_offset
    }

    /// Copy of the resettable state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner.borrow().state.clone()
    }

    /// The floating proxy container, once created.
    #[must_use]
    pub fn proxy(&self) -> Option<ElementId> {
        self.inner.borrow().proxy
    }

    /// Restore the initial empty state. The proxy handle is kept for reuse
    /// and its effect attribute is cleared along with the effect.
    pub fn reset(&self) {
        let (proxy, previous) = {
            let mut inner = self.inner.borrow_mut();
            let previous = std::mem::take(&mut inner.state).effect;
            (inner.proxy, previous)
        };
        if previous != DragEffect::None
            && let Some(proxy) = proxy
        {
            self.surface.set_attribute(
                proxy,
                &self.config.effect_attribute,
                DragEffect::None.as_attribute(),
            );
        }
    }

    pub(crate) fn arm(&self, pointer_offset: Point) {
        let mut inner = self.inner.borrow_mut();
        inner.state.armed = true;
        inner.state.pointer_offset = pointer_offset;
    }

    pub(crate) fn set_dragging(&self, dragging: bool) {
        self.inner.borrow_mut().state.dragging = dragging;
    }

    pub(crate) fn claim_drop_zone(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.state.drop_zone_claims = inner.state.drop_zone_claims.saturating_add(1);
    }

    /// Give up one claim. Returns whether another zone still holds one.
    pub(crate) fn release_drop_zone(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        inner.state.drop_zone_claims = inner.state.drop_zone_claims.saturating_sub(1);
        inner.state.drop_zone_claims > 0
    }

    /// Make sure the proxy exists and hangs off the surface root.
    ///
    /// The class list is only rewritten when the proxy is (re)attached.
    pub(crate) fn ensure_proxy(&self, extra_class: Option<&str>) -> ElementId {
        let existing = self.inner.borrow().proxy;
        let proxy = match existing {
            Some(proxy) => proxy,
            None => {
                let proxy = self.surface.create_element();
                self.inner.borrow_mut().proxy = Some(proxy);
                proxy
            }
        };
        let root = self.surface.root();
        if self.surface.parent_of(proxy) != Some(root) {
            self.surface
                .set_class_name(proxy, &self.config.proxy_class_name(extra_class));
            self.surface.append_child(root, proxy);
        }
        proxy
    }

    /// Clone `source` into the proxy and size the proxy to match it.
    pub(crate) fn fill_proxy(&self, source: ElementId) -> Option<ElementId> {
        let proxy = self.inner.borrow().proxy?;
        let node = self.surface.clone_subtree(source)?;
        self.surface.set_static_position(node);
        if let Some(rect) = self.surface.bounding_rect(source) {
            self.surface.set_size(proxy, rect.width, rect.height);
        }
        self.surface.append_child(proxy, node);
        Some(node)
    }

    /// Translate the proxy so the grab point stays under the pointer.
    pub(crate) fn position_proxy(&self, pointer: Point) {
        let (proxy, offset) = {
            let inner = self.inner.borrow();
            (inner.proxy, inner.state.pointer_offset)
        };
        if let Some(proxy) = proxy {
            self.surface.set_translate(proxy, pointer - offset);
        }
    }

    /// Remove the cloned child and detach the proxy from the tree.
    pub(crate) fn release_proxy(&self) {
        let Some(proxy) = self.inner.borrow().proxy else {
            return;
        };
        if let Some(child) = self.surface.first_child(proxy) {
            self.surface.remove_child(proxy, child);
        }
        self.surface.detach(proxy);
    }
}
