//! A scripted render runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use stage_core::{
    ElementId, ElementSpec, Rect, RemoveData, RuntimeInfo, StageError, StageResult, UpdateData,
};
use stage_engine::{MountRequest, RenderHost, RenderRuntime};

/// A call the engine made into the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCall {
    /// `mount` into the named target.
    Mount(String),
    /// `select` with these identities.
    Select(Vec<String>),
    /// `update` of one node.
    Update(String),
    /// `add` of one node.
    Add(String),
    /// `remove` of one node.
    Remove(String),
    /// `reload` from a URL.
    Reload(String),
    /// `set_zoom`.
    SetZoom(f64),
    /// `destroy`.
    Destroy,
}

/// Runtime that renders a fixed page and applies geometry from node configs.
///
/// Fixture page, in page coordinates:
///
/// ```text
///   page            (0, 0)     800 x 2000
///   ├─ node-1       (10, 10)   100 x 50
///   ├─ node-2       (10, 100)  100 x 50
///   ├─ node-far     (10, 1500) 100 x 50
///   └─ container-1  (200, 200) 300 x 300   container
///      └─ inner     (250, 300) 100 x 100   container
/// ```
#[derive(Default)]
pub struct MockRuntime {
    host: Mutex<Option<RenderHost>>,
    calls: Mutex<Vec<RuntimeCall>>,
    fail_select: AtomicBool,
}

impl MockRuntime {
    /// Create an unmounted runtime.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The host handle received on mount.
    pub fn host(&self) -> RenderHost {
        self.host
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .expect("runtime mounted")
    }

    /// Publish the fixture page, then signal readiness and the page element.
    pub fn render_fixture_page(&self) {
        let host = self.host();
        host.register(ElementSpec::new("page", Rect::new(0.0, 0.0, 800.0, 2000.0)));
        host.register(
            ElementSpec::new("node-1", Rect::new(10.0, 10.0, 100.0, 50.0)).with_parent("page"),
        );
        host.register(
            ElementSpec::new("node-2", Rect::new(10.0, 100.0, 100.0, 50.0)).with_parent("page"),
        );
        host.register(
            ElementSpec::new("node-far", Rect::new(10.0, 1500.0, 100.0, 50.0))
                .with_parent("page"),
        );
        host.register(
            ElementSpec::new("container-1", Rect::new(200.0, 200.0, 300.0, 300.0))
                .with_parent("page")
                .with_container(true),
        );
        host.register(
            ElementSpec::new("inner", Rect::new(250.0, 300.0, 100.0, 100.0))
                .with_parent("container-1")
                .with_container(true),
        );
        host.runtime_ready(RuntimeInfo {
            name: "mock".to_string(),
            version: Some("1.0.0".to_string()),
        });
        host.page_el_update(&ElementId::from("page"));
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Only the `select` calls, in order.
    pub fn select_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RuntimeCall::Select(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    /// Make the next `select` fail.
    pub fn fail_next_select(&self) {
        self.fail_select.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: RuntimeCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

fn config_rect(config: &serde_json::Value, base: Rect) -> Rect {
    let field = |name: &str, fallback: f64| config[name].as_f64().unwrap_or(fallback);
    Rect::new(
        field("left", base.x),
        field("top", base.y),
        field("width", base.width),
        field("height", base.height),
    )
}

#[async_trait]
impl RenderRuntime for MockRuntime {
    async fn mount(&self, request: MountRequest, host: RenderHost) -> StageResult<()> {
        self.record(RuntimeCall::Mount(request.target.name));
        *self.host.lock().unwrap_or_else(PoisonError::into_inner) = Some(host);
        Ok(())
    }

    async fn select(&self, ids: &[ElementId]) -> StageResult<()> {
        tokio::task::yield_now().await;
        if self.fail_select.swap(false, Ordering::SeqCst) {
            return Err(StageError::Runtime("select rejected".to_string()));
        }
        self.record(RuntimeCall::Select(
            ids.iter().map(ToString::to_string).collect(),
        ));
        Ok(())
    }

    async fn update(&self, data: &UpdateData) -> StageResult<()> {
        let id = data.id().expect("update payload has an id");
        self.record(RuntimeCall::Update(id.to_string()));
        tokio::task::yield_now().await;

        let host = self.host();
        if let Some(current) = host.resolve(&id).and_then(|el| el.rect()) {
            host.set_bounds(&id, config_rect(&data.config, current));
        }
        Ok(())
    }

    async fn add(&self, data: &UpdateData) -> StageResult<()> {
        let id = data.id().expect("add payload has an id");
        self.record(RuntimeCall::Add(id.to_string()));

        let mut spec = ElementSpec::new(id, config_rect(&data.config, Rect::default()));
        if let Some(parent) = &data.parent_id {
            spec = spec.with_parent(parent.clone());
        }
        self.host().register(spec);
        Ok(())
    }

    async fn remove(&self, data: &RemoveData) -> StageResult<()> {
        self.record(RuntimeCall::Remove(data.id.to_string()));
        self.host().unregister(&data.id);
        Ok(())
    }

    async fn reload(&self, url: &str) -> StageResult<()> {
        self.record(RuntimeCall::Reload(url.to_string()));
        Ok(())
    }

    fn set_zoom(&self, zoom: f64) {
        self.record(RuntimeCall::SetZoom(zoom));
    }

    fn destroy(&self) {
        self.record(RuntimeCall::Destroy);
    }
}
