//! # Stage Core
//!
//! Wires the renderer, the mask and the action manager together and exposes
//! one ordered event stream.
//!
//! ```text
//!                  ┌──────────── StageCore ─────────────┐
//!   host calls ──▶ │ StageRender  StageMask  ActionMgr  │ ──▶ broadcast
//!   pointer/keys ▶ │     │            ▲          │      │
//!                  └─────┼────────────┼──────────┼──────┘
//!                 RendererEvent   MaskEvent  ActionEvent
//!                (mpsc, 1 relay)  returned    returned
//! ```
//!
//! ## Relay rules
//!
//! - Renderer events arrive over an mpsc channel drained by exactly one relay
//!   task, spawned on construction and aborted on destroy.
//! - Mask and action manager events are return values, dispatched by a single
//!   `match` as soon as the producing call returns.
//! - `before-select`, `before-multi-select` and `change-to-select` are absorbed
//!   and turned into calls to [`StageCore::select`] and
//!   [`StageCore::multi_select`]; everything else is forwarded.
//!
//! ## Locking
//!
//! Mask and action manager state sit behind one `std::sync::Mutex`. The lock
//! is never held across an `.await`, and never while calling platform
//! `observe` or `disconnect`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use futures::{Stream, StreamExt};
use stage_core::{
    get_id_from_el, DefaultHooks, DragStatus, ElementHandle, ElementId, GuideAxis, GuideSet,
    IntersectionCallback, IntersectionEntry, KeyEvent, MoveableOptions, ObservationHandle,
    PointerEvent, Rect, RemoveData, ResizeCallback, ResizeEntry, SelectionState, StageError,
    StageEvent, StageHooks, StageOptions, StagePlatform, StageResult, UpdateData,
};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;

use crate::action::{ActionEvent, ActionManager, ArmPlan, ContainerMarkTimer, ContainerMarker};
use crate::mask::{MaskEvent, MaskLayout, StageMask};
use crate::render::{MountTarget, RenderRuntime, RendererEvent, StageRender};

/// Everything needed to build a [`StageCore`].
#[derive(Clone)]
pub struct StageConfig {
    /// Serializable options.
    pub options: StageOptions,
    /// The content surface.
    pub runtime: Arc<dyn RenderRuntime>,
    /// Selection, container and drag policy.
    pub hooks: Arc<dyn StageHooks>,
    /// Observation capabilities.
    pub platform: StagePlatform,
}

impl StageConfig {
    /// Default options and hooks, no platform capabilities.
    #[must_use]
    pub fn new(runtime: Arc<dyn RenderRuntime>) -> Self {
        Self {
            options: StageOptions::default(),
            runtime,
            hooks: Arc::new(DefaultHooks),
            platform: StagePlatform::new(),
        }
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn StageHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replace the platform capabilities.
    #[must_use]
    pub fn with_platform(mut self, platform: StagePlatform) -> Self {
        self.platform = platform;
        self
    }
}

struct StageState {
    mask: StageMask,
    action_manager: ActionManager,
    page_resize_watch: Option<Box<dyn ObservationHandle>>,
    mounted: bool,
}

struct StageInner {
    options: StageOptions,
    platform: StagePlatform,
    renderer: RwLock<Option<Arc<StageRender>>>,
    state: Mutex<Option<StageState>>,
    events: Mutex<Option<broadcast::Sender<StageEvent>>>,
    relay: Mutex<Option<JoinHandle<()>>>,
}

/// The stage coordination engine.
///
/// Cheap to clone; clones share one engine. After [`destroy`](Self::destroy)
/// every operation is a silent no-op.
#[derive(Clone)]
pub struct StageCore {
    inner: Arc<StageInner>,
}

impl StageCore {
    /// Build an engine and start its renderer relay.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid.
    pub fn new(config: StageConfig) -> StageResult<Self> {
        config.options.validate()?;

        let (renderer, renderer_events) = StageRender::new(config.runtime, &config.options);
        let (events, _) = broadcast::channel(config.options.event_capacity);
        let state = StageState {
            mask: StageMask::new(&config.options),
            action_manager: ActionManager::new(&config.options, config.hooks),
            page_resize_watch: None,
            mounted: false,
        };

        let inner = Arc::new(StageInner {
            options: config.options,
            platform: config.platform,
            renderer: RwLock::new(Some(Arc::new(renderer))),
            state: Mutex::new(Some(state)),
            events: Mutex::new(Some(events)),
            relay: Mutex::new(None),
        });

        let relay = tokio::spawn(Self::relay(Arc::downgrade(&inner), renderer_events));
        *inner.relay.lock().unwrap_or_else(PoisonError::into_inner) = Some(relay);

        Ok(Self { inner })
    }

    async fn relay(
        inner: Weak<StageInner>,
        mut events: mpsc::UnboundedReceiver<RendererEvent>,
    ) {
        while let Some(event) = events.recv().await {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            Self { inner }.on_renderer_event(event);
        }
        tracing::debug!("renderer relay finished");
    }

    fn on_renderer_event(&self, event: RendererEvent) {
        match event {
            RendererEvent::RuntimeReady(info) => {
                tracing::info!(runtime = %info.name, "runtime ready");
                self.emit(StageEvent::RuntimeReady(info));
            }
            RendererEvent::PageElUpdate(page) => {
                self.watch_page(&page);
                self.emit(StageEvent::PageElUpdate(page));
            }
        }
    }

    /// Re-observe the page element and replace the single resize watch.
    fn watch_page(&self, page: &ElementHandle) {
        let previous = self.with_state(|state| {
            state.mask.observe(page);
            state.page_resize_watch.take()
        });
        let Some(previous) = previous else {
            return;
        };
        if let Some(mut watch) = previous {
            tracing::debug!("page resize watch replaced");
            watch.disconnect();
        }

        let Some(resize) = &self.inner.platform.resize else {
            return;
        };
        let weak = Arc::downgrade(&self.inner);
        let callback: ResizeCallback = Arc::new(move |entries: &[ResizeEntry]| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.on_page_resize(entries);
            }
        });
        let mut watch = Some(resize.observe(page, callback));
        let stale = self
            .with_state(|state| std::mem::replace(&mut state.page_resize_watch, watch.take()))
            .flatten();
        if watch.is_some() {
            tracing::warn!("page resize watch created after destroy");
        }
        for mut handle in stale.into_iter().chain(watch) {
            handle.disconnect();
        }
    }

    fn on_page_resize(&self, entries: &[ResizeEntry]) {
        self.with_state(|state| {
            state.mask.page_resize(entries);
            state.action_manager.update_moveable();
        });
    }

    fn observe_intersection(&self, el: &ElementHandle) {
        let Some(intersection) = &self.inner.platform.intersection else {
            return;
        };
        if let Some(Some(mut previous)) = self.with_state(|state| state.mask.take_intersection()) {
            previous.disconnect();
        }

        let weak = Arc::downgrade(&self.inner);
        let callback: IntersectionCallback = Arc::new(move |entries: &[IntersectionEntry]| {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.on_intersection(entries);
            }
        });
        let handle = intersection.observe(el, callback);

        let mut handle = Some(handle);
        let stale = self
            .with_state(|state| {
                handle
                    .take()
                    .and_then(|handle| state.mask.set_intersection(el, handle))
            })
            .flatten();
        for mut stale in stale.into_iter().chain(handle) {
            stale.disconnect();
        }
    }

    fn on_intersection(&self, entries: &[IntersectionEntry]) {
        if let Some(Some(mut ended)) = self.with_state(|state| state.mask.on_intersection(entries))
        {
            ended.disconnect();
        }
    }

    /// Select one element by identity.
    ///
    /// No-op if the element is not rendered or is already the single
    /// selection. The mask is positioned before `select` is published.
    ///
    /// # Errors
    ///
    /// Propagates render runtime failures.
    pub async fn select(
        &self,
        id: impl Into<ElementId>,
        event: Option<PointerEvent>,
    ) -> StageResult<()> {
        let id = id.into();
        let Some(renderer) = self.renderer() else {
            return Ok(());
        };
        let Some(el) = renderer.get_target_element(&id) else {
            tracing::debug!(id = %id, "select skipped: element not rendered");
            return Ok(());
        };
        let current = self.with_state(|state| state.action_manager.is_current_single(&el));
        if current != Some(false) {
            tracing::debug!(id = %id, "select skipped: already selected");
            return Ok(());
        }

        renderer.select(std::slice::from_ref(&id)).await?;

        let observe = self.with_state(|state| {
            state.mask.set_layout(&el);
            state.action_manager.select(&el);
            self.inner.options.auto_scroll_into_view || el.auto_scroll_into_view()
        });
        let Some(observe) = observe else {
            return Ok(());
        };
        if observe {
            self.observe_intersection(&el);
        }
        self.emit(StageEvent::Select { el, event });
        Ok(())
    }

    /// Select several elements by identity, in order.
    ///
    /// Unrendered identities are skipped; no-op if none resolve. The mask
    /// follows the last resolved element.
    ///
    /// # Errors
    ///
    /// Propagates render runtime failures.
    pub async fn multi_select<I>(&self, ids: I, event: Option<PointerEvent>) -> StageResult<()>
    where
        I: IntoIterator,
        I::Item: Into<ElementId>,
    {
        let Some(renderer) = self.renderer() else {
            return Ok(());
        };
        let els: Vec<ElementHandle> = ids
            .into_iter()
            .map(Into::into)
            .filter_map(|id| renderer.get_target_element(&id))
            .collect();
        let Some(anchor) = els.last().cloned() else {
            tracing::debug!("multi-select skipped: nothing rendered");
            return Ok(());
        };
        let resolved: Vec<ElementId> = els.iter().map(|el| el.id().clone()).collect();

        renderer.select(&resolved).await?;

        let observe = self.with_state(|state| {
            let reduced = els.len() < state.action_manager.selection().len();
            state.mask.set_layout(&anchor);
            state.action_manager.multi_select(els.clone());
            !reduced && (self.inner.options.auto_scroll_into_view || anchor.auto_scroll_into_view())
        });
        let Some(observe) = observe else {
            return Ok(());
        };
        if observe {
            self.observe_intersection(&anchor);
        }
        self.emit(StageEvent::MultiSelect { els, event });
        Ok(())
    }

    /// Hover-highlight an element. No selection side effect.
    pub fn highlight(&self, id: impl Into<ElementId>) {
        let id = id.into();
        let Some(el) = self.renderer().and_then(|r| r.get_target_element(&id)) else {
            tracing::debug!(id = %id, "highlight skipped: element not rendered");
            return;
        };
        self.with_state(|state| state.action_manager.highlight(&el));
    }

    /// Drop the hover highlight.
    pub fn clear_highlight(&self) {
        self.with_state(|state| state.action_manager.clear_highlight());
    }

    /// Update a node, then on a later scheduler turn re-layout the mask and
    /// handles if the node is still selected.
    ///
    /// # Errors
    ///
    /// Propagates render runtime failures.
    pub async fn update(&self, data: &UpdateData) -> StageResult<()> {
        let Some(renderer) = self.renderer() else {
            return Ok(());
        };
        renderer.update(data).await?;

        let Some(id) = data.id() else {
            return Ok(());
        };
        let stage = self.clone();
        tokio::spawn(async move {
            stage.settle_update(&id);
        });
        Ok(())
    }

    fn settle_update(&self, id: &ElementId) {
        let Some(el) = self.renderer().and_then(|r| r.get_target_element(id)) else {
            return;
        };
        self.with_state(|state| {
            if !state.action_manager.is_selected_el(&el) {
                return;
            }
            state.action_manager.set_selected_el(&el);
            if let Some(anchor) = state.action_manager.selection().layout_anchor().cloned() {
                state.mask.set_layout(&anchor);
            }
            state.action_manager.update_moveable();
            tracing::debug!(id = %id, "selection settled after update");
        });
    }

    /// Add a node.
    ///
    /// # Errors
    ///
    /// Propagates render runtime failures.
    pub async fn add(&self, data: &UpdateData) -> StageResult<()> {
        match self.renderer() {
            Some(renderer) => renderer.add(data).await,
            None => Ok(()),
        }
    }

    /// Remove a node. The selection is left to the host.
    ///
    /// # Errors
    ///
    /// Propagates render runtime failures.
    pub async fn remove(&self, data: &RemoveData) -> StageResult<()> {
        match self.renderer() {
            Some(renderer) => renderer.remove(data).await,
            None => Ok(()),
        }
    }

    /// Mount the renderer, then the mask, into `target` and publish `mounted`.
    ///
    /// Mounting again re-targets both.
    ///
    /// # Errors
    ///
    /// Propagates render runtime failures.
    pub async fn mount(&self, target: &MountTarget) -> StageResult<()> {
        let Some(renderer) = self.renderer() else {
            return Ok(());
        };
        renderer.mount(target).await?;

        let mounted = self.with_state(|state| {
            state.mask.mount(target);
            state.mounted = true;
        });
        if mounted.is_some() {
            tracing::info!(target = %target.name, "stage mounted");
            self.emit(StageEvent::Mounted);
        }
        Ok(())
    }

    /// Replace the guides on one axis.
    pub fn set_guides(&self, axis: GuideAxis, guides: Vec<f64>) {
        let event = self
            .with_state(|state| {
                state
                    .mask
                    .set_guides(axis, guides)
                    .map(|event| Self::relay_mask_event(state, event))
            })
            .flatten();
        if let Some(event) = event {
            self.emit(event);
        }
    }

    /// Clear mask and snap guides together.
    pub fn clear_guides(&self) {
        let events = self
            .with_state(|state| {
                let events: Vec<StageEvent> = state
                    .mask
                    .clear_guides()
                    .into_iter()
                    .map(|event| Self::relay_mask_event(state, event))
                    .collect();
                state.action_manager.clear_guides();
                events
            })
            .unwrap_or_default();
        for event in events {
            self.emit(event);
        }
    }

    /// Hand a mask event to the action manager and map it to its public form.
    fn relay_mask_event(state: &mut StageState, event: MaskEvent) -> StageEvent {
        match event {
            MaskEvent::ChangeGuides(data) => {
                state
                    .action_manager
                    .set_guidelines(data.axis, data.guides.clone());
                StageEvent::ChangeGuides(data)
            }
        }
    }

    /// Arm a dwell timer that marks the topmost eligible container under the
    /// pointer, skipping `exclude`.
    ///
    /// Returns `None` when marking is not armed: no eligible container, the
    /// container is already marked, or the Alt key is required and not held.
    /// Re-arming for the container whose timer is running returns that timer.
    /// The caller cancels the timer on pointer-leave or drag end.
    ///
    /// # Errors
    ///
    /// Propagates `is_container` hook failures.
    pub fn delayed_mark_container(
        &self,
        event: &PointerEvent,
        exclude: &[ElementHandle],
    ) -> StageResult<Option<ContainerMarkTimer>> {
        let Some(renderer) = self.renderer() else {
            return Ok(None);
        };
        let Some(page_point) = self.with_state(|state| state.mask.to_page_point(event.point))
        else {
            return Ok(None);
        };
        let hits = renderer.get_elements_from_point(page_point);

        self.with_state(|state| -> StageResult<Option<ContainerMarkTimer>> {
            if !state.action_manager.marker().can_arm(event) {
                return Ok(None);
            }
            let hooks = state.action_manager.hooks();
            match ContainerMarker::find_candidate(hooks, &hits, event, exclude)? {
                Some(container) => Ok(self.arm_container_mark(state, &container)),
                None => Ok(None),
            }
        })
        .unwrap_or(Ok(None))
    }

    /// Former name of [`delayed_mark_container`](Self::delayed_mark_container).
    ///
    /// # Errors
    ///
    /// Propagates `is_container` hook failures.
    #[deprecated(note = "use delayed_mark_container")]
    pub fn container_highlight_timeout(
        &self,
        event: &PointerEvent,
        exclude: &[ElementHandle],
    ) -> StageResult<Option<ContainerMarkTimer>> {
        self.delayed_mark_container(event, exclude)
    }

    fn arm_container_mark(
        &self,
        state: &mut StageState,
        container: &ElementHandle,
    ) -> Option<ContainerMarkTimer> {
        let marker = state.action_manager.marker_mut();
        let seq = match marker.plan(container) {
            ArmPlan::AlreadyMarked => return None,
            ArmPlan::Running(timer) => return Some(timer),
            ArmPlan::Arm(seq) => seq,
        };

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let weak = Arc::downgrade(&self.inner);
        let dwell = marker.duration();
        let task = tokio::spawn(async move {
            tokio::time::sleep(dwell).await;
            if flag.load(Ordering::SeqCst) {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                Self { inner }.confirm_container_mark(seq);
            }
        });

        tracing::debug!(id = %container.id(), seq, "container mark armed");
        let timer = ContainerMarkTimer::new(seq, container.clone(), cancelled, task.abort_handle());
        marker.attach(timer.clone());
        Some(timer)
    }

    fn confirm_container_mark(&self, seq: u64) {
        let marked = self
            .with_state(|state| state.action_manager.marker_mut().confirm(seq))
            .flatten();
        if let Some(container) = marked {
            self.emit(StageEvent::Highlight(container));
        }
    }

    /// The confirmed drop container, if any.
    #[must_use]
    pub fn marked_container(&self) -> Option<ElementHandle> {
        self.with_state(|state| state.action_manager.marker().marked().cloned())
            .flatten()
    }

    /// Cancel any pending dwell timer and unmark the marked container.
    pub fn clear_container_mark(&self) {
        self.with_state(|state| state.action_manager.marker_mut().reset());
    }

    /// Feed one pointer event (stage coordinates) through the action manager.
    ///
    /// # Errors
    ///
    /// Propagates host hook failures, and render runtime failures from the
    /// selections the event triggers.
    pub async fn handle_pointer(&self, event: PointerEvent) -> StageResult<()> {
        let Some(renderer) = self.renderer() else {
            return Ok(());
        };
        let Some(page_point) = self.with_state(|state| state.mask.to_page_point(event.point))
        else {
            return Ok(());
        };
        let hits = renderer.get_elements_from_point(page_point);

        let events = self
            .with_state(|state| {
                state
                    .action_manager
                    .handle_pointer(&event, page_point, &hits)
            })
            .unwrap_or_else(|| Ok(Vec::new()))?;
        for event in events {
            self.dispatch(event).await?;
        }
        Ok(())
    }

    /// Feed one key press through the action manager.
    ///
    /// # Errors
    ///
    /// Propagates render runtime failures from triggered selections.
    pub async fn handle_key(&self, event: &KeyEvent) -> StageResult<()> {
        let events = self
            .with_state(|state| state.action_manager.handle_key(event))
            .unwrap_or_default();
        for event in events {
            self.dispatch(event).await?;
        }
        Ok(())
    }

    async fn dispatch(&self, event: ActionEvent) -> StageResult<()> {
        let public = match event {
            ActionEvent::BeforeSelect { el, event } | ActionEvent::ChangeToSelect { el, event } => {
                if let Some(id) = get_id_from_el(&el) {
                    self.select(id, Some(event)).await?;
                }
                return Ok(());
            }
            ActionEvent::BeforeMultiSelect { els, event } => {
                let ids: Vec<ElementId> = els.iter().filter_map(get_id_from_el).collect();
                return self.multi_select(ids, Some(event)).await;
            }
            ActionEvent::ArmContainerMark { container } => {
                self.with_state(|state| self.arm_container_mark(state, &container));
                return Ok(());
            }
            ActionEvent::Highlight(el) => StageEvent::Highlight(el),
            ActionEvent::Update(data) | ActionEvent::MultiUpdate(data) => StageEvent::Update(data),
            ActionEvent::Sort(data) => StageEvent::Sort(data),
            ActionEvent::Remove(data) => StageEvent::Remove(data),
            ActionEvent::SelectParent => StageEvent::SelectParent,
            ActionEvent::Rerender => StageEvent::Rerender,
            ActionEvent::Dblclick(event) => StageEvent::Dblclick(event),
            ActionEvent::Mousemove(event) => StageEvent::Mousemove(event),
            ActionEvent::Mouseleave(event) => StageEvent::Mouseleave(event),
            ActionEvent::DragStart(event) => StageEvent::DragStart(event),
        };
        self.emit(public);
        Ok(())
    }

    /// Change the zoom of the renderer and the mask.
    ///
    /// # Errors
    ///
    /// Returns an error if `zoom` is not a positive number.
    pub fn set_zoom(&self, zoom: f64) -> StageResult<()> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(StageError::InvalidConfig(format!(
                "zoom must be a positive number, got {zoom}"
            )));
        }
        if let Some(renderer) = self.renderer() {
            renderer.set_zoom(zoom);
        }
        self.with_state(|state| state.mask.set_zoom(zoom));
        Ok(())
    }

    /// Scroll the stage viewport.
    pub fn scroll_by(&self, dx: f64, dy: f64) {
        self.with_state(|state| state.mask.scroll_by(dx, dy));
    }

    /// Reload the runtime document.
    ///
    /// # Errors
    ///
    /// Propagates render runtime failures.
    pub async fn reload(&self, url: &str) -> StageResult<()> {
        match self.renderer() {
            Some(renderer) => renderer.reload_iframe(url).await,
            None => Ok(()),
        }
    }

    /// Drag/resize handle options.
    #[must_use]
    pub fn moveable_options(&self) -> MoveableOptions {
        self.inner.options.moveable_options.clone()
    }

    /// Progress of the current gesture.
    #[must_use]
    pub fn drag_status(&self) -> DragStatus {
        self.with_state(|state| state.action_manager.drag_status())
            .unwrap_or_default()
    }

    /// Ignore multi-select modifiers.
    pub fn disable_multi_select(&self) {
        self.with_state(|state| state.action_manager.disable_multi_select());
    }

    /// Honour multi-select modifiers again.
    pub fn enable_multi_select(&self) {
        self.with_state(|state| state.action_manager.enable_multi_select());
    }

    /// Tear down every subsystem, the resize watch and the event stream.
    pub fn destroy(&self) {
        let state = self
            .inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let renderer = self
            .inner
            .renderer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(relay) = self
            .inner
            .relay
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            relay.abort();
        }

        if let Some(mut state) = state {
            if let Some(mut intersection) = state.mask.destroy() {
                intersection.disconnect();
            }
            state.action_manager.destroy();
            if let Some(mut watch) = state.page_resize_watch.take() {
                watch.disconnect();
            }
        }
        if let Some(renderer) = renderer {
            renderer.destroy();
        }
        self.inner
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tracing::info!("stage destroyed");
    }

    /// Subscribe to the public event stream.
    ///
    /// After destroy the receiver is already closed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StageEvent> {
        match &*self.inner.events.lock().unwrap_or_else(PoisonError::into_inner) {
            Some(events) => events.subscribe(),
            None => broadcast::channel(1).1,
        }
    }

    /// The public event stream as a `Stream`, skipping events lost to lag.
    #[must_use]
    pub fn event_stream(&self) -> impl Stream<Item = StageEvent> + Send + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(|event| async move {
            match event {
                Ok(event) => Some(event),
                Err(lagged) => {
                    tracing::warn!(%lagged, "stage subscriber lagged");
                    None
                }
            }
        })
    }

    /// The renderer, until destroy.
    #[must_use]
    pub fn renderer(&self) -> Option<Arc<StageRender>> {
        self.inner
            .renderer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether the stage has been mounted and not destroyed.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.with_state(|state| state.mounted).unwrap_or(false)
    }

    /// Whether [`destroy`](Self::destroy) was called.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.with_state(|_| ()).is_none()
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> SelectionState {
        self.with_state(|state| state.action_manager.selection().clone())
            .unwrap_or_default()
    }

    /// The single selection, if any.
    #[must_use]
    pub fn selected_el(&self) -> Option<ElementHandle> {
        self.with_state(|state| state.action_manager.selected_el().cloned())
            .flatten()
    }

    /// Every selected element, in order.
    #[must_use]
    pub fn selected_el_list(&self) -> Vec<ElementHandle> {
        self.with_state(|state| state.action_manager.selected_el_list())
            .unwrap_or_default()
    }

    /// Current hover highlight.
    #[must_use]
    pub fn highlighted_el(&self) -> Option<ElementHandle> {
        self.with_state(|state| state.action_manager.highlighted().cloned())
            .flatten()
    }

    /// Frame the drag/resize handles are attached to, in page coordinates.
    #[must_use]
    pub fn moveable_frame(&self) -> Option<Rect> {
        self.with_state(|state| state.action_manager.moveable_frame())
            .flatten()
    }

    /// Current overlay geometry.
    #[must_use]
    pub fn mask_layout(&self) -> Option<MaskLayout> {
        self.with_state(|state| state.mask.layout())
    }

    /// Guides drawn by the mask.
    #[must_use]
    pub fn guides(&self) -> GuideSet {
        self.with_state(|state| state.mask.guides().clone())
            .unwrap_or_default()
    }

    /// Guides the action manager snaps to.
    #[must_use]
    pub fn snap_guides(&self) -> GuideSet {
        self.with_state(|state| state.action_manager.guides().clone())
            .unwrap_or_default()
    }

    /// Whether a page resize watch is live.
    #[must_use]
    pub fn has_page_resize_watch(&self) -> bool {
        self.with_state(|state| state.page_resize_watch.is_some())
            .unwrap_or(false)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut StageState) -> R) -> Option<R> {
        self.lock_state().as_mut().map(f)
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<StageState>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: StageEvent) {
        if let Some(events) = &*self.inner.events.lock().unwrap_or_else(PoisonError::into_inner) {
            if events.send(event).is_err() {
                tracing::trace!("stage event dropped: no subscribers");
            }
        }
    }
}
