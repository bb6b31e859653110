//! # Renderer
//!
//! Owns the element registry and drives the host's render runtime.
//!
//! ```text
//!   StageCore ──select/update/add/remove──▶ StageRender ──▶ RenderRuntime (host)
//!       ▲                                       │                 │
//!       │                                ElementRegistry ◀── RenderHost
//!       └──────────── RendererEvent (mpsc) ◀────────────────────┘
//! ```
//!
//! The runtime is handed a [`RenderHost`] on mount. Through it the runtime
//! publishes the nodes it rendered and signals readiness and page changes;
//! it never sees the engine.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use stage_core::{
    ElementHandle, ElementId, ElementNode, ElementSpec, Point, Rect, RemoveData, RenderType,
    RuntimeInfo, Size, StageOptions, StageResult, UpdateData,
};
use tokio::sync::mpsc;

/// Host-provided region the stage mounts into.
#[derive(Debug, Clone, PartialEq)]
pub struct MountTarget {
    /// Host name for the region (for logs).
    pub name: String,
    /// Visible size of the region.
    pub size: Size,
}

impl MountTarget {
    /// Create a mount target.
    #[must_use]
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            size: Size::new(width, height),
        }
    }
}

/// Everything a runtime needs to start rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct MountRequest {
    /// Region to render into.
    pub target: MountTarget,
    /// How the surface is produced.
    pub render_type: RenderType,
    /// Runtime document for iframe rendering.
    pub runtime_url: Option<String>,
    /// Current zoom.
    pub zoom: f64,
}

/// Events the renderer raises towards the engine.
#[derive(Debug, Clone)]
pub enum RendererEvent {
    /// The runtime finished booting.
    RuntimeReady(RuntimeInfo),
    /// The top-level page element was replaced.
    PageElUpdate(ElementHandle),
}

/// The content surface, implemented by the host.
///
/// Every future completes only once the surface reflects the request.
#[async_trait]
pub trait RenderRuntime: Send + Sync {
    /// Start rendering into `request.target`, publishing nodes through `host`.
    async fn mount(&self, request: MountRequest, host: RenderHost) -> StageResult<()>;

    /// Apply the visual "selected" state to `ids`.
    async fn select(&self, ids: &[ElementId]) -> StageResult<()>;

    /// Update an existing node.
    async fn update(&self, data: &UpdateData) -> StageResult<()>;

    /// Add a node.
    async fn add(&self, data: &UpdateData) -> StageResult<()>;

    /// Remove a node.
    async fn remove(&self, data: &RemoveData) -> StageResult<()>;

    /// Reload the runtime document.
    async fn reload(&self, _url: &str) -> StageResult<()> {
        Ok(())
    }

    /// Zoom changed.
    fn set_zoom(&self, _zoom: f64) {}

    /// The stage is being torn down.
    fn destroy(&self) {}
}

/// Identity → node map for the rendered surface.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    nodes: HashMap<ElementId, Arc<ElementNode>>,
}

impl ElementRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any node with the same identity.
    pub fn insert(&mut self, spec: ElementSpec) -> ElementHandle {
        let node = ElementNode::new(spec);
        let handle = node.handle();
        self.nodes.insert(node.id().clone(), node);
        handle
    }

    /// Resolve an identity.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<ElementHandle> {
        self.nodes.get(id).map(ElementNode::handle)
    }

    /// Update geometry in place. Returns whether the node exists.
    pub fn set_bounds(&mut self, id: &ElementId, rect: Rect) -> bool {
        match self.nodes.get(id) {
            Some(node) => {
                node.set_bounds(rect);
                true
            }
            None => false,
        }
    }

    /// Remove a node and its descendants. Returns whether the node existed.
    pub fn remove(&mut self, id: &ElementId) -> bool {
        if self.nodes.remove(id).is_none() {
            return false;
        }
        let mut orphans = vec![id.clone()];
        while let Some(parent) = orphans.pop() {
            let children: Vec<ElementId> = self
                .nodes
                .values()
                .filter(|node| node.parent() == Some(&parent))
                .map(|node| node.id().clone())
                .collect();
            for child in children {
                self.nodes.remove(&child);
                orphans.push(child);
            }
        }
        true
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Number of rendered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing is rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes under a page point, topmost first.
    ///
    /// Paint order: higher z-index, then deeper nesting, then later creation.
    #[must_use]
    pub fn elements_from_point(&self, point: Point) -> Vec<ElementHandle> {
        let mut hits: Vec<(&Arc<ElementNode>, usize)> = self
            .nodes
            .values()
            .filter(|node| node.bounds().contains(point))
            .map(|node| (node, self.depth(node)))
            .collect();

        hits.sort_by(|(a, da), (b, db)| {
            b.z_index()
                .cmp(&a.z_index())
                .then(db.cmp(da))
                .then(b.seq().cmp(&a.seq()))
        });

        hits.into_iter().map(|(node, _)| node.handle()).collect()
    }

    fn depth(&self, node: &ElementNode) -> usize {
        let mut depth = 0;
        let mut parent = node.parent();
        // Bounded by the node count so a malformed cycle cannot spin.
        while let Some(id) = parent {
            if depth >= self.nodes.len() {
                break;
            }
            depth += 1;
            parent = self.nodes.get(id).and_then(|p| p.parent());
        }
        depth
    }
}

/// The runtime's handle back into the renderer.
#[derive(Clone)]
pub struct RenderHost {
    registry: Arc<RwLock<ElementRegistry>>,
    events: mpsc::UnboundedSender<RendererEvent>,
}

impl RenderHost {
    /// Publish a rendered node. Re-registering an identity replaces the node,
    /// invalidating outstanding handles to the old one.
    pub fn register(&self, spec: ElementSpec) -> ElementHandle {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(spec)
    }

    /// Report new geometry for a node without replacing it.
    pub fn set_bounds(&self, id: &ElementId, rect: Rect) -> bool {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_bounds(id, rect)
    }

    /// Withdraw a node and its descendants.
    pub fn unregister(&self, id: &ElementId) -> bool {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    /// Withdraw every node.
    pub fn clear(&self) {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Resolve an identity.
    #[must_use]
    pub fn resolve(&self, id: &ElementId) -> Option<ElementHandle> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
    }

    /// Signal that the runtime is ready.
    pub fn runtime_ready(&self, info: RuntimeInfo) {
        self.send(RendererEvent::RuntimeReady(info));
    }

    /// Signal that `id` is now the top-level page element.
    ///
    /// Returns `false` if `id` is not registered.
    pub fn page_el_update(&self, id: &ElementId) -> bool {
        let Some(page) = self.resolve(id) else {
            tracing::debug!(id = %id, "page element not registered");
            return false;
        };
        self.send(RendererEvent::PageElUpdate(page));
        true
    }

    fn send(&self, event: RendererEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("renderer event dropped: stage destroyed");
        }
    }
}

/// The renderer subsystem.
pub struct StageRender {
    runtime: Arc<dyn RenderRuntime>,
    registry: Arc<RwLock<ElementRegistry>>,
    events: mpsc::UnboundedSender<RendererEvent>,
    render_type: RenderType,
    runtime_url: RwLock<Option<String>>,
    zoom: RwLock<f64>,
}

impl StageRender {
    /// Create a renderer and the receiving end of its event channel.
    #[must_use]
    pub fn new(
        runtime: Arc<dyn RenderRuntime>,
        options: &StageOptions,
    ) -> (Self, mpsc::UnboundedReceiver<RendererEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let renderer = Self {
            runtime,
            registry: Arc::new(RwLock::new(ElementRegistry::new())),
            events,
            render_type: options.render_type,
            runtime_url: RwLock::new(options.runtime_url.clone()),
            zoom: RwLock::new(options.zoom),
        };
        (renderer, rx)
    }

    /// A host handle sharing this renderer's registry and event channel.
    #[must_use]
    pub fn host(&self) -> RenderHost {
        RenderHost {
            registry: Arc::clone(&self.registry),
            events: self.events.clone(),
        }
    }

    /// Resolve an identity to a live handle, if rendered.
    #[must_use]
    pub fn get_target_element(&self, id: &ElementId) -> Option<ElementHandle> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
    }

    /// Nodes under a page point, topmost first.
    #[must_use]
    pub fn get_elements_from_point(&self, point: Point) -> Vec<ElementHandle> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .elements_from_point(point)
    }

    /// Mount the runtime into `target`.
    ///
    /// # Errors
    ///
    /// Propagates runtime failures.
    pub async fn mount(&self, target: &MountTarget) -> StageResult<()> {
        let request = MountRequest {
            target: target.clone(),
            render_type: self.render_type,
            runtime_url: self
                .runtime_url
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            zoom: self.zoom(),
        };
        self.runtime.mount(request, self.host()).await
    }

    /// Apply the visual selected state.
    ///
    /// # Errors
    ///
    /// Propagates runtime failures.
    pub async fn select(&self, ids: &[ElementId]) -> StageResult<()> {
        self.runtime.select(ids).await
    }

    /// Update a node.
    ///
    /// # Errors
    ///
    /// Propagates runtime failures.
    pub async fn update(&self, data: &UpdateData) -> StageResult<()> {
        self.runtime.update(data).await
    }

    /// Add a node.
    ///
    /// # Errors
    ///
    /// Propagates runtime failures.
    pub async fn add(&self, data: &UpdateData) -> StageResult<()> {
        self.runtime.add(data).await
    }

    /// Remove a node.
    ///
    /// # Errors
    ///
    /// Propagates runtime failures.
    pub async fn remove(&self, data: &RemoveData) -> StageResult<()> {
        self.runtime.remove(data).await
    }

    /// Reload the runtime document from `url`.
    ///
    /// # Errors
    ///
    /// Propagates runtime failures.
    pub async fn reload_iframe(&self, url: &str) -> StageResult<()> {
        *self
            .runtime_url
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(url.to_string());
        self.runtime.reload(url).await
    }

    /// Current zoom.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        *self.zoom.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Change the zoom.
    pub fn set_zoom(&self, zoom: f64) {
        *self.zoom.write().unwrap_or_else(PoisonError::into_inner) = zoom;
        self.runtime.set_zoom(zoom);
    }

    /// Tear down the runtime and forget every node.
    pub fn destroy(&self) {
        self.runtime.destroy();
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, x: f64, y: f64, w: f64, h: f64) -> ElementSpec {
        ElementSpec::new(id, Rect::new(x, y, w, h))
    }

    #[test]
    fn test_elements_from_point_orders_children_above_parents() {
        let mut registry = ElementRegistry::new();
        registry.insert(spec("page", 0.0, 0.0, 400.0, 800.0));
        registry.insert(spec("box", 0.0, 0.0, 200.0, 200.0).with_parent("page"));
        registry.insert(spec("text", 10.0, 10.0, 50.0, 20.0).with_parent("box"));

        let ids: Vec<String> = registry
            .elements_from_point(Point::new(20.0, 20.0))
            .iter()
            .map(|el| el.id().to_string())
            .collect();
        assert_eq!(ids, vec!["text", "box", "page"]);
    }

    #[test]
    fn test_z_index_wins_over_depth() {
        let mut registry = ElementRegistry::new();
        registry.insert(spec("page", 0.0, 0.0, 400.0, 800.0));
        registry.insert(spec("deep", 0.0, 0.0, 100.0, 100.0).with_parent("page"));
        registry.insert(spec("overlay", 0.0, 0.0, 100.0, 100.0).with_z_index(10));

        let top = registry.elements_from_point(Point::new(5.0, 5.0));
        assert_eq!(top.first().map(|el| el.id().as_str()), Some("overlay"));
    }

    #[test]
    fn test_remove_drops_descendants() {
        let mut registry = ElementRegistry::new();
        registry.insert(spec("page", 0.0, 0.0, 400.0, 800.0));
        registry.insert(spec("box", 0.0, 0.0, 200.0, 200.0).with_parent("page"));
        registry.insert(spec("text", 10.0, 10.0, 50.0, 20.0).with_parent("box"));
        registry.insert(spec("other", 300.0, 0.0, 50.0, 20.0).with_parent("page"));

        assert!(registry.remove(&ElementId::from("box")));
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&ElementId::from("text")).is_none());
        assert!(registry.get(&ElementId::from("other")).is_some());
        assert!(!registry.remove(&ElementId::from("box")));
    }

    #[test]
    fn test_reinsert_invalidates_old_handle() {
        let mut registry = ElementRegistry::new();
        let old = registry.insert(spec("a", 0.0, 0.0, 10.0, 10.0));
        let fresh = registry.insert(spec("a", 0.0, 0.0, 20.0, 20.0));
        assert!(!old.is_alive());
        assert!(fresh.is_alive());
        assert!(!old.ptr_eq(&fresh));
    }

    #[test]
    fn test_page_el_update_requires_registered_page() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let host = RenderHost {
            registry: Arc::new(RwLock::new(ElementRegistry::new())),
            events: tx,
        };
        assert!(!host.page_el_update(&ElementId::from("page")));

        host.register(spec("page", 0.0, 0.0, 400.0, 800.0));
        assert!(host.page_el_update(&ElementId::from("page")));
        match rx.try_recv() {
            Ok(RendererEvent::PageElUpdate(page)) => assert_eq!(page.id().as_str(), "page"),
            other => panic!("expected page-el-update, got {other:?}"),
        }
    }
}
