//! # Saorsa Stage Core
//!
//! Runtime-free model shared by the stage engine and its hosts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 stage-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Element Model   │  Interaction Model       │
//! │  - Identity      │  - Pointer/key events    │
//! │  - Handles       │  - Selection state       │
//! │  - Geometry      │  - Guide sets            │
//! ├─────────────────────────────────────────────┤
//! │  Host Contracts  │  Public Stream           │
//! │  - Hooks         │  - StageEvent            │
//! │  - Platform      │  - Payloads              │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod data;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod guides;
pub mod hooks;
pub mod platform;
pub mod selection;

pub use config::{
    ContainerHighlightType, GuidesOptions, MoveableOptions, RenderType, StageOptions,
    DEFAULT_CONTAINER_HIGHLIGHT_CLASS, DEFAULT_CONTAINER_HIGHLIGHT_DURATION_MS, DEFAULT_ZOOM,
};
pub use data::{RemoveData, UpdateData};
pub use element::{
    get_id_from_el, ElementHandle, ElementId, ElementNode, ElementSpec, Positioning, ID_ATTRIBUTE,
};
pub use error::{StageError, StageResult};
pub use event::{
    DragStatus, GuidesEventData, Key, KeyEvent, KeyModifiers, PointerButton, PointerEvent,
    PointerKind, RemoveEventData, RuntimeInfo, SortEventData, StageEvent, UpdateEventData,
    UpdateEventItem,
};
pub use geometry::{Point, Rect, Size};
pub use guides::{GuideAxis, GuideSet};
pub use hooks::{DefaultHooks, StageHooks};
pub use platform::{
    IntersectionCallback, IntersectionEntry, IntersectionObserving, ObservationHandle,
    ResizeCallback, ResizeEntry, ResizeObserving, StagePlatform,
};
pub use selection::SelectionState;

/// Stage core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
