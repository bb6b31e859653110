//! # Saorsa Stage Engine
//!
//! The stage coordination engine: keeps a live-rendered page, the selection
//! overlay drawn above it and the pointer interaction state in sync, and
//! exposes one ordered event stream to the host.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  StageCore                  │
//! ├───────────────┬───────────────┬─────────────┤
//! │  StageRender  │  StageMask    │ ActionMgr   │
//! │  - Registry   │  - Outline    │ - Selection │
//! │  - Runtime    │  - Guides     │ - Drag      │
//! │  - Hit test   │  - Viewport   │ - Resize    │
//! │               │  - Visibility │ - Dwell     │
//! └───────────────┴───────────────┴─────────────┘
//! ```
//!
//! The three subsystems never reference each other; only [`StageCore`]
//! holds all three.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod mask;
pub mod render;
pub mod stage;

pub use action::{
    ActionEvent, ActionManager, ArmPlan, ContainerMarkTimer, ContainerMarker, DragSession,
    ResizeDirection, ResizeSession,
};
pub use mask::{MaskEvent, MaskLayout, StageMask};
pub use render::{
    ElementRegistry, MountRequest, MountTarget, RenderHost, RenderRuntime, RendererEvent,
    StageRender,
};
pub use stage::{StageConfig, StageCore};

/// Stage engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
