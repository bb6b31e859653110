//! Guide lines used for snapping during drag and resize.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Orientation of a guide line.
///
/// Horizontal guides are lines at a fixed `y`; vertical guides at a fixed `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideAxis {
    /// Lines of constant `y`.
    Horizontal,
    /// Lines of constant `x`.
    Vertical,
}

impl GuideAxis {
    /// Both axes, horizontal first.
    pub const ALL: [GuideAxis; 2] = [GuideAxis::Horizontal, GuideAxis::Vertical];
}

/// Per-axis ordered guide positions.
///
/// Only changed through [`GuideSet::set`] and [`GuideSet::clear`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuideSet {
    horizontal: Vec<f64>,
    vertical: Vec<f64>,
}

impl GuideSet {
    /// Create an empty guide set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Guides on one axis, in the order they were set.
    #[must_use]
    pub fn get(&self, axis: GuideAxis) -> &[f64] {
        match axis {
            GuideAxis::Horizontal => &self.horizontal,
            GuideAxis::Vertical => &self.vertical,
        }
    }

    /// Replace the guides on one axis. Returns whether anything changed.
    pub fn set(&mut self, axis: GuideAxis, guides: Vec<f64>) -> bool {
        let slot = match axis {
            GuideAxis::Horizontal => &mut self.horizontal,
            GuideAxis::Vertical => &mut self.vertical,
        };
        if *slot == guides {
            return false;
        }
        tracing::trace!(?axis, count = guides.len(), "guides replaced");
        *slot = guides;
        true
    }

    /// Remove every guide on both axes.
    pub fn clear(&mut self) {
        self.horizontal.clear();
        self.vertical.clear();
    }

    /// Whether both axes are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_empty() && self.vertical.is_empty()
    }

    /// Nearest guide on `axis` within `threshold` of any of `positions`.
    ///
    /// Returns the correction to add to the positions to land on the guide.
    #[must_use]
    pub fn snap_offset(&self, axis: GuideAxis, positions: &[f64], threshold: f64) -> Option<f64> {
        let mut best: Option<f64> = None;
        for guide in self.get(axis) {
            for position in positions {
                let offset = guide - position;
                if offset.abs() <= threshold && best.map_or(true, |b| offset.abs() < b.abs()) {
                    best = Some(offset);
                }
            }
        }
        best
    }

    /// Snap a frame's edges (and optionally center) to the guides.
    ///
    /// Returns the `(dx, dy)` correction; zero on an axis with no guide in range.
    #[must_use]
    pub fn snap_frame(&self, frame: &Rect, threshold: f64, include_center: bool) -> (f64, f64) {
        let center = frame.center();
        let mut xs = vec![frame.x, frame.right()];
        let mut ys = vec![frame.y, frame.bottom()];
        if include_center {
            xs.push(center.x);
            ys.push(center.y);
        }
        let dx = self
            .snap_offset(GuideAxis::Vertical, &xs, threshold)
            .unwrap_or(0.0);
        let dy = self
            .snap_offset(GuideAxis::Horizontal, &ys, threshold)
            .unwrap_or(0.0);
        (dx, dy)
    }
}
