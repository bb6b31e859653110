//! Construction-time stage options.
//!
//! Option names follow the host-facing camelCase keys, so a stage can be
//! configured straight from host JSON:
//!
//! ```text
//! { "renderType": "iframe", "runtimeUrl": "/runtime/index.html",
//!   "containerHighlightDuration": 800, "autoScrollIntoView": true }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StageError, StageResult};

/// Default zoom factor.
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Default dwell before a hovered container is marked.
pub const DEFAULT_CONTAINER_HIGHLIGHT_DURATION_MS: u64 = 800;

/// Default marker class applied to the marked container.
pub const DEFAULT_CONTAINER_HIGHLIGHT_CLASS: &str = "stage-container-highlight";

/// When container marking is armed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerHighlightType {
    /// Always arm on hover.
    #[default]
    Default,
    /// Arm only while the Alt key is held.
    Alt,
}

/// How the content surface is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderType {
    /// Separate document loaded from `runtime_url`.
    Iframe,
    /// Rendered in the host document by the runtime's own render hook.
    #[default]
    Native,
}

/// Drag/resize handle behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MoveableOptions {
    /// Allow moving elements by dragging.
    pub draggable: bool,
    /// Allow resizing through edge handles.
    pub resizable: bool,
    /// Snap frames to guides.
    pub snappable: bool,
    /// Pointer travel (px) before a press becomes a drag.
    pub drag_threshold: f64,
    /// Half-width (px) of the grab zone around the selection frame edges.
    pub handle_size: f64,
    /// Minimum width while resizing.
    pub min_width: f64,
    /// Minimum height while resizing.
    pub min_height: f64,
    /// Preserve aspect ratio on corner resizes.
    pub keep_ratio: bool,
    /// Arrow-key nudge distance.
    pub keyboard_step: f64,
    /// Arrow-key nudge distance with Shift held.
    pub keyboard_shift_step: f64,
}

impl Default for MoveableOptions {
    fn default() -> Self {
        Self {
            draggable: true,
            resizable: true,
            snappable: true,
            drag_threshold: 3.0,
            handle_size: 6.0,
            min_width: 1.0,
            min_height: 1.0,
            keep_ratio: false,
            keyboard_step: 1.0,
            keyboard_shift_step: 10.0,
        }
    }
}

/// Guide snapping behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GuidesOptions {
    /// Distance (px) within which frame edges snap to a guide.
    pub snap_threshold: f64,
    /// Also snap frame centers.
    pub snap_to_center: bool,
}

impl Default for GuidesOptions {
    fn default() -> Self {
        Self {
            snap_threshold: 5.0,
            snap_to_center: true,
        }
    }
}

/// Recognized stage options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct StageOptions {
    /// Marker class for the marked drop container.
    pub container_highlight_class_name: String,
    /// Dwell (ms) before a hovered container is marked.
    pub container_highlight_duration: u64,
    /// When container marking is armed.
    pub container_highlight_type: ContainerHighlightType,
    /// Drag/resize handle behaviour.
    pub moveable_options: MoveableOptions,
    /// Never start drags.
    pub disabled_drag_start: bool,
    /// Ignore multi-select modifiers.
    pub disabled_multi_select: bool,
    /// Scroll newly selected elements into view.
    pub auto_scroll_into_view: bool,
    /// Guide snapping behaviour.
    pub guides_options: GuidesOptions,
    /// Suppress guides and snapping.
    pub disabled_rule: bool,
    /// How the content surface is produced.
    pub render_type: RenderType,
    /// Runtime document for iframe rendering.
    pub runtime_url: Option<String>,
    /// Initial zoom.
    pub zoom: f64,
    /// Buffered events per public subscriber.
    pub event_capacity: usize,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            container_highlight_class_name: DEFAULT_CONTAINER_HIGHLIGHT_CLASS.to_string(),
            container_highlight_duration: DEFAULT_CONTAINER_HIGHLIGHT_DURATION_MS,
            container_highlight_type: ContainerHighlightType::Default,
            moveable_options: MoveableOptions::default(),
            disabled_drag_start: false,
            disabled_multi_select: false,
            auto_scroll_into_view: false,
            guides_options: GuidesOptions::default(),
            disabled_rule: false,
            render_type: RenderType::default(),
            runtime_url: None,
            zoom: DEFAULT_ZOOM,
            event_capacity: 256,
        }
    }
}

impl StageOptions {
    /// Parse options from host JSON, then validate them.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the options are invalid.
    pub fn from_json(json: &str) -> StageResult<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Dwell before a hovered container is marked.
    #[must_use]
    pub fn container_highlight_duration(&self) -> Duration {
        Duration::from_millis(self.container_highlight_duration)
    }

    /// Check the options for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found.
    pub fn validate(&self) -> StageResult<()> {
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(StageError::InvalidConfig(format!(
                "zoom must be a positive number, got {}",
                self.zoom
            )));
        }
        if self.render_type == RenderType::Iframe
            && self.runtime_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(StageError::InvalidConfig(
                "iframe rendering requires a runtimeUrl".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(StageError::InvalidConfig(
                "eventCapacity must be at least 1".to_string(),
            ));
        }
        let moveable = &self.moveable_options;
        let thresholds = [
            ("dragThreshold", moveable.drag_threshold),
            ("handleSize", moveable.handle_size),
            ("minWidth", moveable.min_width),
            ("minHeight", moveable.min_height),
            ("snapThreshold", self.guides_options.snap_threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(StageError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
