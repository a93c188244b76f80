#![forbid(unsafe_code)]

//! In-memory [`Surface`] implementation.
//!
//! Nodes are plain records in a `BTreeMap`, so tests can inspect exactly
//! what the engine did to the visual tree: which class the proxy got, which
//! effect attribute was written last, where it was translated to.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use grapple_core::geometry::{Point, Rect};
use grapple_core::surface::{ElementId, Surface};

/// Snapshot of one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeRecord {
    /// Measured layout box (before any translate).
    pub rect: Rect,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub class_name: String,
    pub attributes: BTreeMap<String, String>,
    /// Size fixed through [`Surface::set_size`].
    pub size: Option<(f64, f64)>,
    /// Offset set through [`Surface::set_translate`].
    pub translate: Option<Point>,
    pub static_position: bool,
    /// Source node when this node was produced by `clone_subtree`.
    pub cloned_from: Option<ElementId>,
}

#[derive(Debug)]
struct SurfaceInner {
    nodes: BTreeMap<ElementId, NodeRecord>,
    next_id: u64,
    root: ElementId,
}

impl SurfaceInner {
    fn allocate(&mut self, record: NodeRecord) -> ElementId {
        self.next_id += 1;
        let id = ElementId::new(self.next_id);
        self.nodes.insert(id, record);
        id
    }

    fn unlink(&mut self, child: ElementId) {
        let parent = self.nodes.get(&child).and_then(|node| node.parent);
        if let Some(parent) = parent
            && let Some(parent_node) = self.nodes.get_mut(&parent)
        {
            parent_node.children.retain(|id| *id != child);
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = None;
        }
    }

    fn deep_clone(&mut self, source: ElementId) -> Option<ElementId> {
        let original = self.nodes.get(&source)?.clone();
        let copy = self.allocate(NodeRecord {
            parent: None,
            children: Vec::new(),
            cloned_from: Some(source),
            ..original.clone()
        });
        for child in original.children {
            if let Some(child_copy) = self.deep_clone(child) {
                if let Some(node) = self.nodes.get_mut(&child_copy) {
                    node.parent = Some(copy);
                }
                if let Some(node) = self.nodes.get_mut(&copy) {
                    node.children.push(child_copy);
                }
            }
        }
        Some(copy)
    }
}

/// Shared, inspectable visual tree.
///
/// Cloning yields another handle to the same tree.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    inner: Rc<RefCell<SurfaceInner>>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    /// Create a tree containing only the root.
    #[must_use]
    pub fn new() -> Self {
        let root = ElementId::new(1);
        let mut nodes = BTreeMap::new();
        nodes.insert(root, NodeRecord::default());
        Self {
            inner: Rc::new(RefCell::new(SurfaceInner {
                nodes,
                next_id: 1,
                root,
            })),
        }
    }

    /// Add an element with the given layout box under the root.
    pub fn add_element(&self, rect: Rect) -> ElementId {
        let root = self.root();
        let id = self.inner.borrow_mut().allocate(NodeRecord {
            rect,
            ..NodeRecord::default()
        });
        self.append_child(root, id);
        id
    }

    /// Add an element under `parent`.
    pub fn add_child(&self, parent: ElementId, rect: Rect) -> ElementId {
        let id = self.inner.borrow_mut().allocate(NodeRecord {
            rect,
            ..NodeRecord::default()
        });
        self.append_child(parent, id);
        id
    }

    /// Move/resize an element, as a scroll or reflow would.
    pub fn set_rect(&self, element: ElementId, rect: Rect) {
        if let Some(node) = self.inner.borrow_mut().nodes.get_mut(&element) {
            node.rect = rect;
        }
    }

    /// Delete an element entirely so it measures as missing.
    pub fn remove_element(&self, element: ElementId) {
        let mut inner = self.inner.borrow_mut();
        inner.unlink(element);
        inner.nodes.remove(&element);
    }

    /// Snapshot of a node.
    #[must_use]
    pub fn node(&self, element: ElementId) -> Option<NodeRecord> {
        self.inner.borrow().nodes.get(&element).cloned()
    }

    /// Value of an attribute.
    #[must_use]
    pub fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(&element)
            .and_then(|node| node.attributes.get(name).cloned())
    }

    /// Children of a node, in order.
    #[must_use]
    pub fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.inner
            .borrow()
            .nodes
            .get(&element)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Whether `element` is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, element: ElementId) -> bool {
        let inner = self.inner.borrow();
        let mut current = Some(element);
        while let Some(id) = current {
            if id == inner.root {
                return true;
            }
            current = inner.nodes.get(&id).and_then(|node| node.parent);
        }
        false
    }

    /// Total nodes ever created and not removed, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    /// This tree as a trait object for the engine.
    #[must_use]
    pub fn as_surface(&self) -> Rc<dyn Surface> {
        Rc::new(self.clone())
    }
}

impl Surface for HeadlessSurface {
    fn root(&self) -> ElementId {
        self.inner.borrow().root
    }

    fn bounding_rect(&self, element: ElementId) -> Option<Rect> {
        let inner = self.inner.borrow();
        let node = inner.nodes.get(&element)?;
        let (width, height) = node.size.unwrap_or((node.rect.width, node.rect.height));
        let offset = node.translate.unwrap_or(Point::ORIGIN);
        Some(Rect::new(
            node.rect.x + offset.x,
            node.rect.y + offset.y,
            width,
            height,
        ))
    }

    fn create_element(&self) -> ElementId {
        self.inner.borrow_mut().allocate(NodeRecord::default())
    }

    fn clone_subtree(&self, element: ElementId) -> Option<ElementId> {
        self.inner.borrow_mut().deep_clone(element)
    }

    fn append_child(&self, parent: ElementId, child: ElementId) {
        let mut inner = self.inner.borrow_mut();
        if !inner.nodes.contains_key(&parent) || !inner.nodes.contains_key(&child) {
            return;
        }
        inner.unlink(child);
        if let Some(node) = inner.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = inner.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn remove_child(&self, parent: ElementId, child: ElementId) {
        let mut inner = self.inner.borrow_mut();
        let is_child = inner
            .nodes
            .get(&child)
            .is_some_and(|node| node.parent == Some(parent));
        if is_child {
            inner.unlink(child);
        }
    }

    fn parent_of(&self, element: ElementId) -> Option<ElementId> {
        self.inner.borrow().nodes.get(&element)?.parent
    }

    fn first_child(&self, element: ElementId) -> Option<ElementId> {
        self.inner
            .borrow()
            .nodes
            .get(&element)?
            .children
            .first()
            .copied()
    }

    fn set_class_name(&self, element: ElementId, class_name: &str) {
        if let Some(node) = self.inner.borrow_mut().nodes.get_mut(&element) {
            node.class_name = class_name.to_string();
        }
    }

    fn set_attribute(&self, element: ElementId, name: &str, value: &str) {
        if let Some(node) = self.inner.borrow_mut().nodes.get_mut(&element) {
            node.attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn set_size(&self, element: ElementId, width: f64, height: f64) {
        if let Some(node) = self.inner.borrow_mut().nodes.get_mut(&element) {
            node.size = Some((width, height));
        }
    }

    fn set_translate(&self, element: ElementId, offset: Point) {
        if let Some(node) = self.inner.borrow_mut().nodes.get_mut(&element) {
            node.translate = Some(offset);
        }
    }

    fn set_static_position(&self, element: ElementId) {
        if let Some(node) = self.inner.borrow_mut().nodes.get_mut(&element) {
            node.static_position = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn added_elements_hang_off_root() {
        let surface = HeadlessSurface::new();
        let a = surface.add_element(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(surface.children(surface.root()), vec![a]);
        assert!(surface.is_attached(a));
    }

    #[test]
    fn clone_subtree_is_deep_and_detached() {
        let surface = HeadlessSurface::new();
        let card = surface.add_element(Rect::new(5.0, 5.0, 50.0, 20.0));
        let label = surface.add_child(card, Rect::new(6.0, 6.0, 10.0, 4.0));
        surface.set_attribute(label, "text", "hello");

        let copy = surface.clone_subtree(card).expect("card exists");
        assert!(!surface.is_attached(copy));
        let copy_children = surface.children(copy);
        assert_eq!(copy_children.len(), 1);
        assert_ne!(copy_children[0], label);
        assert_eq!(
            surface.attribute(copy_children[0], "text").as_deref(),
            Some("hello")
        );
        assert_eq!(surface.node(copy).and_then(|n| n.cloned_from), Some(card));
    }

    #[test]
    fn append_moves_between_parents() {
        let surface = HeadlessSurface::new();
        let a = surface.add_element(Rect::default());
        let b = surface.add_element(Rect::default());
        let loose = surface.create_element();
        surface.append_child(a, loose);
        surface.append_child(b, loose);
        assert!(surface.children(a).is_empty());
        assert_eq!(surface.children(b), vec![loose]);
        surface.detach(loose);
        assert_eq!(surface.parent_of(loose), None);
    }

    #[test]
    fn remove_child_ignores_non_children() {
        let surface = HeadlessSurface::new();
        let a = surface.add_element(Rect::default());
        let b = surface.add_element(Rect::default());
        surface.remove_child(a, b);
        assert_eq!(surface.parent_of(b), Some(surface.root()));
    }

    #[test]
    fn translate_and_size_shape_the_measured_box() {
        let surface = HeadlessSurface::new();
        let proxy = surface.create_element();
        surface.set_size(proxy, 30.0, 12.0);
        surface.set_translate(proxy, Point::new(100.0, 40.0));
        assert_eq!(
            surface.bounding_rect(proxy),
            Some(Rect::new(100.0, 40.0, 30.0, 12.0))
        );
    }

    #[test]
    fn removed_element_measures_as_missing() {
        let surface = HeadlessSurface::new();
        let a = surface.add_element(Rect::new(0.0, 0.0, 1.0, 1.0));
        surface.remove_element(a);
        assert_eq!(surface.bounding_rect(a), None);
        assert!(surface.children(surface.root()).is_empty());
    }
}
