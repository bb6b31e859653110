//! Input events consumed by the stage and the public event stream it emits.

use serde::{Deserialize, Serialize};

use crate::element::{ElementHandle, ElementId};
use crate::geometry::{Point, Rect};
use crate::guides::GuideAxis;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    /// Button pressed.
    Down,
    /// Pointer moved (with or without a button held).
    Move,
    /// Button released.
    Up,
    /// Double click.
    DoubleClick,
    /// Pointer left the stage.
    Leave,
}

/// Pointer button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Left / primary button.
    #[default]
    Primary,
    /// Middle button.
    Middle,
    /// Right / secondary button.
    Secondary,
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    pub shift: bool,
    /// Control key pressed.
    pub ctrl: bool,
    /// Alt/Option key pressed.
    pub alt: bool,
    /// Meta/Command key pressed.
    pub meta: bool,
}

impl KeyModifiers {
    /// Modifiers that request additive (multi) selection.
    #[must_use]
    pub fn is_multi_select(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// A pointer event in stage coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Event phase.
    pub kind: PointerKind,
    /// Position relative to the stage viewport.
    pub point: Point,
    /// Button involved.
    #[serde(default)]
    pub button: PointerButton,
    /// Active modifier keys.
    #[serde(default)]
    pub modifiers: KeyModifiers,
    /// Timestamp in milliseconds.
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl PointerEvent {
    /// Create an event with the primary button and no modifiers.
    #[must_use]
    pub fn new(kind: PointerKind, x: f64, y: f64) -> Self {
        Self {
            kind,
            point: Point::new(x, y),
            button: PointerButton::Primary,
            modifiers: KeyModifiers::default(),
            timestamp_ms: 0,
        }
    }

    /// Replace the modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: KeyModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Replace the button.
    #[must_use]
    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }
}

/// Keys the action manager reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "value")]
pub enum Key {
    /// Delete key.
    Delete,
    /// Backspace key.
    Backspace,
    /// Escape key.
    Escape,
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// Any other key, by name.
    Other(String),
}

/// A key press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Key pressed.
    pub key: Key,
    /// Active modifiers.
    #[serde(default)]
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    /// Create a key event without modifiers.
    #[must_use]
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::default(),
        }
    }
}

/// Progress of the current drag gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragStatus {
    /// Pointer pressed on a target; no movement yet.
    Start,
    /// Dragging or resizing.
    Ing,
    /// No gesture in progress.
    #[default]
    End,
}

/// Information the render runtime publishes when it becomes ready.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    /// Runtime name (framework or renderer flavour).
    pub name: String,
    /// Runtime version, if known.
    #[serde(default)]
    pub version: Option<String>,
}

/// New geometry for one element after a drag, resize or nudge.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEventItem {
    /// Element that moved.
    pub el: ElementHandle,
    /// Its new bounds in page coordinates.
    pub rect: Rect,
}

/// Payload of `update` (single or multi).
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEventData {
    /// One item per moved element, in selection order.
    pub data: Vec<UpdateEventItem>,
    /// Container the elements were dropped into, if one was marked.
    pub parent_el: Option<ElementHandle>,
}

/// Payload of `sort`: move `src` to the position of `dist` among siblings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortEventData {
    /// Element being moved.
    pub src: ElementId,
    /// Sibling it was dropped onto.
    pub dist: ElementId,
}

/// Payload of `remove`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveEventData {
    /// Elements the user asked to delete.
    pub data: Vec<ElementHandle>,
}

/// Payload of `change-guides`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidesEventData {
    /// Axis that changed.
    pub axis: GuideAxis,
    /// Full guide list for that axis after the change.
    pub guides: Vec<f64>,
}

/// The unified, ordered event stream exposed to hosts.
#[derive(Debug, Clone, PartialEq)]
pub enum StageEvent {
    /// Renderer and mask are mounted.
    Mounted,
    /// The render runtime signalled readiness.
    RuntimeReady(RuntimeInfo),
    /// The top-level page element was replaced.
    PageElUpdate(ElementHandle),
    /// Single selection committed; the mask is already positioned.
    Select {
        /// Selected element.
        el: ElementHandle,
        /// Pointer event that caused it, if any.
        event: Option<PointerEvent>,
    },
    /// Multi selection committed; the mask sits on the last element.
    MultiSelect {
        /// Selected elements in order.
        els: Vec<ElementHandle>,
        /// Pointer event that caused it, if any.
        event: Option<PointerEvent>,
    },
    /// Hover highlight or a confirmed container mark.
    Highlight(ElementHandle),
    /// Geometry changed for one or more elements.
    Update(UpdateEventData),
    /// An element was reordered among its siblings.
    Sort(SortEventData),
    /// The user asked to delete elements.
    Remove(RemoveEventData),
    /// The user asked to escalate selection to the parent.
    SelectParent,
    /// A full content refresh is requested.
    Rerender,
    /// Guides changed on one axis.
    ChangeGuides(GuidesEventData),
    /// Double click on the stage.
    Dblclick(PointerEvent),
    /// Pointer moved over the stage.
    Mousemove(PointerEvent),
    /// Pointer left the stage.
    Mouseleave(PointerEvent),
    /// A drag gesture started.
    DragStart(PointerEvent),
}

impl StageEvent {
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mounted => "mounted",
            Self::RuntimeReady(_) => "runtime-ready",
            Self::PageElUpdate(_) => "page-el-update",
            Self::Select { .. } => "select",
            Self::MultiSelect { .. } => "multi-select",
            Self::Highlight(_) => "highlight",
            Self::Update(_) => "update",
            Self::Sort(_) => "sort",
            Self::Remove(_) => "remove",
            Self::SelectParent => "select-parent",
            Self::Rerender => "rerender",
            Self::ChangeGuides(_) => "change-guides",
            Self::Dblclick(_) => "dblclick",
            Self::Mousemove(_) => "mousemove",
            Self::Mouseleave(_) => "mouseleave",
            Self::DragStart(_) => "drag-start",
        }
    }
}
