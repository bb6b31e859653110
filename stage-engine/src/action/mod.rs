//! # Action Manager
//!
//! Pointer and keyboard interaction over the rendered surface.
//!
//! ```text
//!   Idle ──down on selectable──▶ Pressed ──move > threshold──▶ Dragging ──up──▶ Idle
//!     │                            │                                          ▲
//!     └──down on resize handle─────┼──────────────▶ Resizing ──up─────────────┘
//!                                  └──up (multi member)──▶ change-to-select
//! ```
//!
//! The manager never talks in identities and never calls the renderer. It
//! returns [`ActionEvent`]s for the engine to relay or translate. Host hooks
//! are evaluated before any state changes, so a failing hook leaves the
//! manager exactly as it was.

mod container;
mod drag;

use std::sync::Arc;

pub use container::{ArmPlan, ContainerMarkTimer, ContainerMarker};
pub use drag::{DragSession, ResizeDirection, ResizeSession};

use stage_core::{
    DragStatus, ElementHandle, GuideAxis, GuideSet, GuidesOptions, Key, KeyEvent,
    MoveableOptions, Point, PointerButton, PointerEvent, PointerKind, Positioning, Rect,
    RemoveEventData, SelectionState, SortEventData, StageHooks, StageOptions, StageResult,
    UpdateEventData, UpdateEventItem,
};

/// Events raised by the action manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEvent {
    /// A click asks to select `el`. Absorbed by the engine.
    BeforeSelect {
        /// Clicked element.
        el: ElementHandle,
        /// The click.
        event: PointerEvent,
    },
    /// A modifier click asks to change the multi selection. Absorbed by the engine.
    BeforeMultiSelect {
        /// Full requested selection, in order.
        els: Vec<ElementHandle>,
        /// The click.
        event: PointerEvent,
    },
    /// A click on one member of a multi selection collapses it to that member.
    ChangeToSelect {
        /// Clicked member.
        el: ElementHandle,
        /// The click.
        event: PointerEvent,
    },
    /// A drag hovers over a container; arm its dwell timer.
    ArmContainerMark {
        /// Candidate container.
        container: ElementHandle,
    },
    /// Hover highlight.
    Highlight(ElementHandle),
    /// One element moved or resized.
    Update(UpdateEventData),
    /// Several elements moved together.
    MultiUpdate(UpdateEventData),
    /// A flow element was dropped onto a sibling.
    Sort(SortEventData),
    /// Delete gesture.
    Remove(RemoveEventData),
    /// Escalate selection to the parent.
    SelectParent,
    /// Full content refresh.
    Rerender,
    /// Double click.
    Dblclick(PointerEvent),
    /// Pointer moved.
    Mousemove(PointerEvent),
    /// Pointer left the stage.
    Mouseleave(PointerEvent),
    /// Drag started.
    DragStart(PointerEvent),
}

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Pressed {
        target: ElementHandle,
        origin: Point,
        collapse: bool,
        event: PointerEvent,
    },
    Dragging(DragSession),
    Resizing(ResizeSession),
}

/// Interaction state over pointer input.
pub struct ActionManager {
    hooks: Arc<dyn StageHooks>,
    moveable: MoveableOptions,
    guides_options: GuidesOptions,
    disabled_drag_start: bool,
    disabled_rule: bool,
    multi_disabled: bool,
    selection: SelectionState,
    highlighted: Option<ElementHandle>,
    guides: GuideSet,
    gesture: Gesture,
    frame: Option<Rect>,
    marker: ContainerMarker,
}

impl ActionManager {
    /// Create an idle manager.
    #[must_use]
    pub fn new(options: &StageOptions, hooks: Arc<dyn StageHooks>) -> Self {
        Self {
            hooks,
            moveable: options.moveable_options.clone(),
            guides_options: options.guides_options.clone(),
            disabled_drag_start: options.disabled_drag_start,
            disabled_rule: options.disabled_rule,
            multi_disabled: options.disabled_multi_select,
            selection: SelectionState::None,
            highlighted: None,
            guides: GuideSet::new(),
            gesture: Gesture::Idle,
            frame: None,
            marker: ContainerMarker::new(options),
        }
    }

    /// Handle one pointer event.
    ///
    /// `page_point` is the event position in page coordinates; `hits` are the
    /// elements under it, topmost first.
    ///
    /// # Errors
    ///
    /// Propagates host hook failures. State is unchanged on error.
    pub fn handle_pointer(
        &mut self,
        event: &PointerEvent,
        page_point: Point,
        hits: &[ElementHandle],
    ) -> StageResult<Vec<ActionEvent>> {
        match event.kind {
            PointerKind::Down => self.pointer_down(event, page_point, hits),
            PointerKind::Move => self.pointer_move(event, page_point, hits),
            PointerKind::Up => Ok(self.pointer_up(hits)),
            PointerKind::DoubleClick => Ok(vec![ActionEvent::Dblclick(*event)]),
            PointerKind::Leave => {
                self.highlighted = None;
                self.marker.cancel_pending();
                Ok(vec![ActionEvent::Mouseleave(*event)])
            }
        }
    }

    fn pointer_down(
        &mut self,
        event: &PointerEvent,
        page_point: Point,
        hits: &[ElementHandle],
    ) -> StageResult<Vec<ActionEvent>> {
        if event.button != PointerButton::Primary {
            return Ok(Vec::new());
        }

        if let Some(session) = self.resize_session_at(page_point) {
            tracing::debug!(direction = ?session.direction(), "resize started");
            self.gesture = Gesture::Resizing(session);
            return Ok(Vec::new());
        }

        let Some(target) = self.selectable_at(hits, event)? else {
            self.gesture = Gesture::Idle;
            return Ok(Vec::new());
        };

        if event.modifiers.is_multi_select() && !self.multi_disabled {
            let mut els = self.selection.handles();
            if let Some(pos) = els.iter().position(|el| el.same_id(&target)) {
                els.remove(pos);
            } else {
                els.push(target);
            }
            self.gesture = Gesture::Idle;
            return Ok(vec![ActionEvent::BeforeMultiSelect { els, event: *event }]);
        }

        let collapse = self.selection.is_multi() && self.selection.contains_id(&target);
        let already = self
            .selection
            .single()
            .is_some_and(|el| el.same_id(&target));
        self.gesture = Gesture::Pressed {
            target: target.clone(),
            origin: page_point,
            collapse,
            event: *event,
        };

        if collapse || already {
            Ok(Vec::new())
        } else {
            Ok(vec![ActionEvent::BeforeSelect {
                el: target,
                event: *event,
            }])
        }
    }

    fn pointer_move(
        &mut self,
        event: &PointerEvent,
        page_point: Point,
        hits: &[ElementHandle],
    ) -> StageResult<Vec<ActionEvent>> {
        let mut events = Vec::new();
        let mut started = None;
        let mut candidate = None;
        let mut off_containers = false;

        match &self.gesture {
            Gesture::Idle => match self.selectable_at(hits, event)? {
                Some(target) => {
                    if !self.highlighted.as_ref().is_some_and(|el| el.ptr_eq(&target)) {
                        self.highlighted = Some(target.clone());
                        events.push(ActionEvent::Highlight(target));
                    }
                }
                None => self.highlighted = None,
            },
            Gesture::Pressed { target, origin, .. } => {
                started = self.start_drag(target, *origin, page_point)?;
            }
            Gesture::Dragging(session) => {
                if self.marker.can_arm(event) {
                    let exclude: Vec<ElementHandle> = session.targets().cloned().collect();
                    let hooks = self.hooks.as_ref();
                    candidate = ContainerMarker::find_candidate(hooks, hits, event, &exclude)?;
                    off_containers = candidate.is_none();
                }
            }
            Gesture::Resizing(_) => {}
        }

        // A mark only stands while the pointer stays over a container.
        if off_containers {
            self.marker.reset();
        }

        if let Some(session) = started {
            self.gesture = Gesture::Dragging(session);
            events.push(ActionEvent::DragStart(*event));
        }
        let guides = (self.moveable.snappable && !self.disabled_rule)
            .then_some((&self.guides, &self.guides_options));
        match &mut self.gesture {
            Gesture::Dragging(session) => session.drag_to(page_point, guides),
            Gesture::Resizing(session) => session.resize_to(page_point, &self.moveable),
            Gesture::Idle | Gesture::Pressed { .. } => {}
        }
        if let Some(container) = candidate {
            events.push(ActionEvent::ArmContainerMark { container });
        }

        events.push(ActionEvent::Mousemove(*event));
        Ok(events)
    }

    fn start_drag(
        &self,
        target: &ElementHandle,
        origin: Point,
        page_point: Point,
    ) -> StageResult<Option<DragSession>> {
        if origin.distance(page_point) <= self.moveable.drag_threshold
            || !self.moveable.draggable
            || self.disabled_drag_start
        {
            return Ok(None);
        }
        let members = if self.selection.contains_id(target) {
            self.selection.handles()
        } else {
            vec![target.clone()]
        };
        let mut targets = Vec::with_capacity(members.len());
        for el in &members {
            targets.push(self.hooks.update_drag_el(el)?);
        }
        tracing::debug!(count = targets.len(), "drag started");
        Ok(Some(DragSession::new(origin, targets)))
    }

    fn pointer_up(&mut self, hits: &[ElementHandle]) -> Vec<ActionEvent> {
        match std::mem::take(&mut self.gesture) {
            Gesture::Dragging(session) => self.finish_drag(&session, hits),
            Gesture::Resizing(session) => vec![ActionEvent::Update(UpdateEventData {
                data: vec![session.item()],
                parent_el: None,
            })],
            Gesture::Pressed {
                target,
                collapse: true,
                event,
                ..
            } => vec![ActionEvent::ChangeToSelect { el: target, event }],
            Gesture::Pressed { .. } | Gesture::Idle => Vec::new(),
        }
    }

    fn finish_drag(&mut self, session: &DragSession, hits: &[ElementHandle]) -> Vec<ActionEvent> {
        self.marker.cancel_pending();

        if session.len() == 1 {
            if let Some(src) = session.targets().next() {
                if src.positioning() == Positioning::Flow {
                    self.marker.take_mark();
                    let parent = src.parent_id();
                    let sibling = hits
                        .iter()
                        .find(|el| !el.same_id(src) && el.parent_id() == parent);
                    return match sibling {
                        Some(dist) => vec![ActionEvent::Sort(SortEventData {
                            src: src.id().clone(),
                            dist: dist.id().clone(),
                        })],
                        None => vec![ActionEvent::Rerender],
                    };
                }
            }
        }

        let data = UpdateEventData {
            data: session.items(),
            parent_el: self.marker.take_mark(),
        };
        if data.data.is_empty() {
            Vec::new()
        } else if session.len() > 1 || self.selection.is_multi() {
            vec![ActionEvent::MultiUpdate(data)]
        } else {
            vec![ActionEvent::Update(data)]
        }
    }

    /// Handle one key press.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Vec<ActionEvent> {
        if self.selection.is_empty() || !matches!(self.gesture, Gesture::Idle) {
            return Vec::new();
        }
        let step = if event.modifiers.shift {
            self.moveable.keyboard_shift_step
        } else {
            self.moveable.keyboard_step
        };
        let (dx, dy) = match event.key {
            Key::Delete | Key::Backspace => {
                return vec![ActionEvent::Remove(RemoveEventData {
                    data: self.selection.handles(),
                })];
            }
            Key::Escape => return vec![ActionEvent::SelectParent],
            Key::ArrowUp => (0.0, -step),
            Key::ArrowDown => (0.0, step),
            Key::ArrowLeft => (-step, 0.0),
            Key::ArrowRight => (step, 0.0),
            Key::Other(_) => return Vec::new(),
        };

        let items: Vec<UpdateEventItem> = self
            .selection
            .handles()
            .into_iter()
            .filter_map(|el| {
                el.rect().map(|rect| UpdateEventItem {
                    el,
                    rect: rect.translate(dx, dy),
                })
            })
            .collect();
        if items.is_empty() {
            return Vec::new();
        }
        let data = UpdateEventData {
            data: items,
            parent_el: None,
        };
        if self.selection.is_multi() {
            vec![ActionEvent::MultiUpdate(data)]
        } else {
            vec![ActionEvent::Update(data)]
        }
    }

    fn resize_session_at(&self, page_point: Point) -> Option<ResizeSession> {
        if !self.moveable.resizable {
            return None;
        }
        let el = self.selection.single()?;
        let frame = self.frame?;
        let direction = ResizeDirection::hit(&frame, page_point, self.moveable.handle_size)?;
        Some(ResizeSession::new(el.clone(), frame, page_point, direction))
    }

    fn selectable_at(
        &self,
        hits: &[ElementHandle],
        event: &PointerEvent,
    ) -> StageResult<Option<ElementHandle>> {
        for el in hits {
            if self.hooks.can_select(el, event)? {
                return Ok(Some(el.clone()));
            }
        }
        Ok(None)
    }

    /// Record `el` as the single selection and attach handles to it.
    pub fn select(&mut self, el: &ElementHandle) {
        self.selection = SelectionState::Single(el.clone());
        self.update_moveable();
    }

    /// Record `els` as the multi selection, in order.
    pub fn multi_select(&mut self, els: Vec<ElementHandle>) {
        self.selection = SelectionState::Multi(els);
        self.update_moveable();
    }

    /// Whether `el` is the same node as the current single selection.
    #[must_use]
    pub fn is_current_single(&self, el: &ElementHandle) -> bool {
        self.selection.single().is_some_and(|selected| selected.ptr_eq(el))
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// The single selection, if any.
    #[must_use]
    pub fn selected_el(&self) -> Option<&ElementHandle> {
        self.selection.single()
    }

    /// Every selected element, in order.
    #[must_use]
    pub fn selected_el_list(&self) -> Vec<ElementHandle> {
        self.selection.handles()
    }

    /// Whether an element with the same identity is selected.
    #[must_use]
    pub fn is_selected_el(&self, el: &ElementHandle) -> bool {
        self.selection.contains_id(el)
    }

    /// Swap a re-rendered element into the selection.
    pub fn set_selected_el(&mut self, el: &ElementHandle) -> bool {
        self.selection.refresh(el)
    }

    /// Re-read the handle frame from the layout anchor.
    pub fn update_moveable(&mut self) {
        self.frame = self.selection.layout_anchor().and_then(ElementHandle::rect);
    }

    /// Frame the drag/resize handles are attached to, in page coordinates.
    #[must_use]
    pub fn moveable_frame(&self) -> Option<Rect> {
        self.frame
    }

    /// Drag/resize handle options.
    #[must_use]
    pub fn moveable_options(&self) -> &MoveableOptions {
        &self.moveable
    }

    /// Progress of the current gesture.
    #[must_use]
    pub fn drag_status(&self) -> DragStatus {
        match self.gesture {
            Gesture::Idle => DragStatus::End,
            Gesture::Pressed { .. } => DragStatus::Start,
            Gesture::Dragging(_) | Gesture::Resizing(_) => DragStatus::Ing,
        }
    }

    /// Set the hover highlight. Returns whether it changed.
    pub fn highlight(&mut self, el: &ElementHandle) -> bool {
        if self.highlighted.as_ref().is_some_and(|current| current.ptr_eq(el)) {
            return false;
        }
        self.highlighted = Some(el.clone());
        true
    }

    /// Drop the hover highlight.
    pub fn clear_highlight(&mut self) {
        self.highlighted = None;
    }

    /// Current hover highlight.
    #[must_use]
    pub fn highlighted(&self) -> Option<&ElementHandle> {
        self.highlighted.as_ref()
    }

    /// Snap guides on one axis.
    pub fn set_guidelines(&mut self, axis: GuideAxis, guides: Vec<f64>) {
        self.guides.set(axis, guides);
    }

    /// Drop every snap guide.
    pub fn clear_guides(&mut self) {
        self.guides.clear();
    }

    /// Snap guides.
    #[must_use]
    pub fn guides(&self) -> &GuideSet {
        &self.guides
    }

    /// Ignore multi-select modifiers.
    pub fn disable_multi_select(&mut self) {
        self.multi_disabled = true;
    }

    /// Honour multi-select modifiers again.
    pub fn enable_multi_select(&mut self) {
        self.multi_disabled = false;
    }

    /// Container marking state.
    #[must_use]
    pub fn marker(&self) -> &ContainerMarker {
        &self.marker
    }

    /// Container marking state.
    pub fn marker_mut(&mut self) -> &mut ContainerMarker {
        &mut self.marker
    }

    /// The hook set.
    #[must_use]
    pub fn hooks(&self) -> &dyn StageHooks {
        self.hooks.as_ref()
    }

    /// Reset every piece of interaction state.
    pub fn destroy(&mut self) {
        self.marker.reset();
        self.selection = SelectionState::None;
        self.highlighted = None;
        self.guides.clear();
        self.gesture = Gesture::Idle;
        self.frame = None;
    }
}
