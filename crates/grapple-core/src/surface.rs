#![forbid(unsafe_code)]

//! The visual-layer seam.
//!
//! The engine never paints. Everything it needs from the host's visual tree
//! (measuring, cloning, attaching the floating proxy, writing attributes) goes
//! through the [`Surface`] trait, which hosts implement over their own node
//! representation. Methods take `&self`; implementations are expected to use
//! interior mutability the way a DOM does.

use crate::geometry::{Point, Rect};

/// Opaque handle naming a node of the host's visual tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Wrap a host-assigned identifier.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The host-assigned identifier.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Operations the engine consumes from the visual layer.
pub trait Surface {
    /// The node proxies are attached to (the document body).
    fn root(&self) -> ElementId;

    /// Measured bounding box in client coordinates, or `None` when the
    /// element does not exist. A missing element is treated as a null
    /// reference: controllers silently do nothing.
    fn bounding_rect(&self, element: ElementId) -> Option<Rect>;

    /// Create a new, detached node.
    fn create_element(&self) -> ElementId;

    /// Deep-clone `element` into a new detached node.
    fn clone_subtree(&self, element: ElementId) -> Option<ElementId>;

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere.
    fn append_child(&self, parent: ElementId, child: ElementId);

    /// Remove `child` from `parent`. No-op if it is not a child of `parent`.
    fn remove_child(&self, parent: ElementId, child: ElementId);

    /// Current parent of `element`.
    fn parent_of(&self, element: ElementId) -> Option<ElementId>;

    /// First child of `element`.
    fn first_child(&self, element: ElementId) -> Option<ElementId>;

    /// Replace the class list of `element`.
    fn set_class_name(&self, element: ElementId, class_name: &str);

    /// Set an observable attribute on `element`.
    fn set_attribute(&self, element: ElementId, name: &str, value: &str);

    /// Fix the rendered size of `element`.
    fn set_size(&self, element: ElementId, width: f64, height: f64);

    /// Translate `element` by a 2D offset from its layout position.
    fn set_translate(&self, element: ElementId, offset: Point);

    /// Take `element` out of absolute/fixed positioning.
    fn set_static_position(&self, element: ElementId);

    /// Detach `element` from whatever parent it has.
    fn detach(&self, element: ElementId) {
        if let Some(parent) = self.parent_of(element) {
            self.remove_child(parent, element);
        }
    }
}
