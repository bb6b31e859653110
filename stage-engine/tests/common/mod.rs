//! Shared test harness for stage-engine integration tests.
//!
//! Provides a scripted render runtime, counting platform observers and a
//! mounted stage over a small fixture page.

#![allow(dead_code)]

pub mod platform;
pub mod runtime;

use std::sync::Arc;
use std::time::Duration;

use stage_core::{
    DefaultHooks, ElementHandle, ElementId, StageEvent, StageHooks, StageOptions, StagePlatform,
};
use stage_engine::{MountTarget, StageConfig, StageCore};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

pub use platform::{IntersectionProbe, ResizeProbe, WatchStats};
pub use runtime::{MockRuntime, RuntimeCall};

/// Visible stage size used by every harness.
pub const WRAPPER: (f64, f64) = (800.0, 600.0);

/// How long to wait for an expected event.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// Route engine logs to the test writer; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A mounted stage with its collaborators.
pub struct Harness {
    /// The engine under test.
    pub stage: StageCore,
    /// The scripted runtime behind the stage.
    pub runtime: Arc<MockRuntime>,
    /// Page resize observer.
    pub resize: Arc<ResizeProbe>,
    /// Visibility observer.
    pub intersection: Arc<IntersectionProbe>,
    /// Subscription taken before mount.
    pub events: broadcast::Receiver<StageEvent>,
    /// Event names seen while mounting, in order.
    pub startup: Vec<&'static str>,
}

impl Harness {
    /// Mount a stage with default options and hooks.
    pub async fn mounted() -> Self {
        Self::with_options(StageOptions::default()).await
    }

    /// Mount a stage with the given options.
    pub async fn with_options(options: StageOptions) -> Self {
        Self::with_config(options, Arc::new(DefaultHooks)).await
    }

    /// Mount a stage, render the fixture page and wait for `page-el-update`.
    pub async fn with_config(options: StageOptions, hooks: Arc<dyn StageHooks>) -> Self {
        init_tracing();
        let runtime = MockRuntime::new();
        let resize = Arc::new(ResizeProbe::default());
        let intersection = Arc::new(IntersectionProbe::default());
        let platform = StagePlatform::new()
            .with_resize(resize.clone())
            .with_intersection(intersection.clone());

        let stage = StageCore::new(
            StageConfig::new(runtime.clone())
                .with_options(options)
                .with_hooks(hooks)
                .with_platform(platform),
        )
        .expect("valid stage config");
        let mut events = stage.subscribe();

        stage
            .mount(&MountTarget::new("stage", WRAPPER.0, WRAPPER.1))
            .await
            .expect("mount succeeds");
        runtime.render_fixture_page();

        let mut startup = Vec::new();
        loop {
            let event = next_event(&mut events).await;
            startup.push(event.name());
            if matches!(event, StageEvent::PageElUpdate(_)) {
                break;
            }
        }

        Self {
            stage,
            runtime,
            resize,
            intersection,
            events,
            startup,
        }
    }

    /// Resolve a rendered fixture node.
    pub fn el(&self, id: &str) -> ElementHandle {
        self.runtime
            .host()
            .resolve(&ElementId::from(id))
            .unwrap_or_else(|| panic!("{id} is rendered"))
    }

    /// Wait for the next event with `name`, skipping others.
    pub async fn expect_event(&mut self, name: &str) -> StageEvent {
        next_named(&mut self.events, name).await
    }

    /// Every event already published, without waiting.
    pub fn drain(&mut self) -> Vec<StageEvent> {
        drain(&mut self.events)
    }

    /// Names of every event already published, without waiting.
    pub fn drain_names(&mut self) -> Vec<&'static str> {
        self.drain().iter().map(StageEvent::name).collect()
    }
}

/// Wait for the next event.
pub async fn next_event(rx: &mut broadcast::Receiver<StageEvent>) -> StageEvent {
    timeout(EVENT_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a stage event")
        .expect("stage event stream open")
}

/// Wait for the next event with `name`, skipping others.
pub async fn next_named(rx: &mut broadcast::Receiver<StageEvent>, name: &str) -> StageEvent {
    timeout(EVENT_TIMEOUT, async {
        loop {
            let event = rx.recv().await.expect("stage event stream open");
            if event.name() == name {
                return event;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {name}"))
}

/// Every event already published, without waiting.
pub fn drain(rx: &mut broadcast::Receiver<StageEvent>) -> Vec<StageEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Identities of a list of handles.
pub fn ids(els: &[ElementHandle]) -> Vec<String> {
    els.iter().map(|el| el.id().to_string()).collect()
}
