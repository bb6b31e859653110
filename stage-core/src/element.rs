//! Rendered elements - identities, live nodes and weak handles.
//!
//! The render runtime owns every [`ElementNode`]; the engine only ever holds
//! [`ElementHandle`]s, which are weak back-references. A handle outlives its
//! node harmlessly: geometry reads return `None` once the node is dropped.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Name of the attribute the rendered surface exposes identities under.
pub const ID_ATTRIBUTE: &str = "data-stage-id";

static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Stable identity of one rendered node, supplied by the page description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    /// Create an identity from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identity as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an identity out of a page-description value (string or number).
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.is_empty() => Some(Self::new(s.clone())),
            serde_json::Value::Number(n) => Some(Self::new(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for ElementId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&ElementId> for ElementId {
    fn from(value: &ElementId) -> Self {
        value.clone()
    }
}

/// How an element participates in page layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Positioning {
    /// Freely positioned; drags move it.
    #[default]
    Absolute,
    /// Part of the document flow; drags reorder it among siblings.
    Flow,
    /// Pinned to the viewport; does not scroll with the page.
    Fixed,
}

/// Description of a node as published by the render runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Identity attribute value.
    pub id: ElementId,
    /// Parent element identity, if nested.
    #[serde(default)]
    pub parent: Option<ElementId>,
    /// Bounds in page coordinates.
    pub bounds: Rect,
    /// Layout participation.
    #[serde(default)]
    pub positioning: Positioning,
    /// Stacking order; higher paints on top.
    #[serde(default)]
    pub z_index: i32,
    /// Whether the element advertises itself as a drop container.
    #[serde(default)]
    pub container: bool,
    /// Per-element opt-in to scroll-into-view on selection.
    #[serde(default)]
    pub auto_scroll_into_view: bool,
}

impl ElementSpec {
    /// Create a spec with default layout flags.
    #[must_use]
    pub fn new(id: impl Into<ElementId>, bounds: Rect) -> Self {
        Self {
            id: id.into(),
            parent: None,
            bounds,
            positioning: Positioning::Absolute,
            z_index: 0,
            container: false,
            auto_scroll_into_view: false,
        }
    }

    /// Set the parent element.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<ElementId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the layout participation.
    #[must_use]
    pub fn with_positioning(mut self, positioning: Positioning) -> Self {
        self.positioning = positioning;
        self
    }

    /// Set the stacking order.
    #[must_use]
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Mark the element as a drop container.
    #[must_use]
    pub fn with_container(mut self, container: bool) -> Self {
        self.container = container;
        self
    }

    /// Opt the element into scroll-into-view on selection.
    #[must_use]
    pub fn with_auto_scroll_into_view(mut self, enabled: bool) -> Self {
        self.auto_scroll_into_view = enabled;
        self
    }
}

/// A live node in the rendered surface.
///
/// Geometry and marker classes are interior-mutable so the runtime can
/// update layout in place without invalidating outstanding handles.
#[derive(Debug)]
pub struct ElementNode {
    id: ElementId,
    parent: Option<ElementId>,
    positioning: Positioning,
    z_index: i32,
    container: bool,
    auto_scroll_into_view: bool,
    seq: u64,
    bounds: RwLock<Rect>,
    classes: RwLock<BTreeSet<String>>,
}

impl ElementNode {
    /// Create a new node from a spec.
    #[must_use]
    pub fn new(spec: ElementSpec) -> Arc<Self> {
        Arc::new(Self {
            id: spec.id,
            parent: spec.parent,
            positioning: spec.positioning,
            z_index: spec.z_index,
            container: spec.container,
            auto_scroll_into_view: spec.auto_scroll_into_view,
            seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
            bounds: RwLock::new(spec.bounds),
            classes: RwLock::new(BTreeSet::new()),
        })
    }

    /// Identity attribute value.
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Parent identity.
    #[must_use]
    pub fn parent(&self) -> Option<&ElementId> {
        self.parent.as_ref()
    }

    /// Stacking order.
    #[must_use]
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Creation order, used to break paint-order ties.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Current bounds.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        *self.bounds.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the bounds in place.
    pub fn set_bounds(&self, rect: Rect) {
        *self.bounds.write().unwrap_or_else(PoisonError::into_inner) = rect;
    }

    /// Take a weak handle to this node.
    #[must_use]
    pub fn handle(self: &Arc<Self>) -> ElementHandle {
        ElementHandle {
            id: self.id.clone(),
            node: Arc::downgrade(self),
        }
    }
}

/// A weak reference into the rendered surface.
///
/// Two handles are equal only when they point at the same live node; a node
/// re-created under the same identity yields a different handle.
#[derive(Clone)]
pub struct ElementHandle {
    id: ElementId,
    node: Weak<ElementNode>,
}

impl ElementHandle {
    /// Identity the handle was resolved from.
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.id
    }

    /// Whether the underlying node is still rendered.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.node.strong_count() > 0
    }

    /// Current bounds, or `None` if the node is gone.
    #[must_use]
    pub fn rect(&self) -> Option<Rect> {
        self.node.upgrade().map(|node| node.bounds())
    }

    /// Parent identity, if the node is alive and nested.
    #[must_use]
    pub fn parent_id(&self) -> Option<ElementId> {
        self.node.upgrade().and_then(|node| node.parent.clone())
    }

    /// Layout participation; defaults to absolute once the node is gone.
    #[must_use]
    pub fn positioning(&self) -> Positioning {
        self.node
            .upgrade()
            .map(|node| node.positioning)
            .unwrap_or_default()
    }

    /// Whether the runtime advertised this element as a container.
    #[must_use]
    pub fn is_container_hint(&self) -> bool {
        self.node.upgrade().is_some_and(|node| node.container)
    }

    /// Whether the element opted into scroll-into-view on selection.
    #[must_use]
    pub fn auto_scroll_into_view(&self) -> bool {
        self.node
            .upgrade()
            .is_some_and(|node| node.auto_scroll_into_view)
    }

    /// Check for a marker class.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.node.upgrade().is_some_and(|node| {
            node.classes
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(class)
        })
    }

    /// Add a marker class. No-op on a dropped node.
    pub fn add_class(&self, class: &str) {
        if let Some(node) = self.node.upgrade() {
            node.classes
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(class.to_string());
        }
    }

    /// Remove a marker class. No-op on a dropped node.
    pub fn remove_class(&self, class: &str) {
        if let Some(node) = self.node.upgrade() {
            node.classes
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(class);
        }
    }

    /// Whether both handles reference the same live node.
    #[must_use]
    pub fn ptr_eq(&self, other: &ElementHandle) -> bool {
        self.node.ptr_eq(&other.node)
    }

    /// Whether both handles carry the same identity, regardless of node.
    #[must_use]
    pub fn same_id(&self, other: &ElementHandle) -> bool {
        self.id == other.id
    }
}

impl PartialEq for ElementHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Read the identity attribute back from a handle.
#[must_use]
pub fn get_id_from_el(el: &ElementHandle) -> Option<ElementId> {
    if el.id.as_str().is_empty() {
        None
    } else {
        Some(el.id.clone())
    }
}
