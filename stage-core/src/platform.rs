//! Host-platform observation capabilities.
//!
//! The stage needs two notifications it cannot produce itself: box-size
//! changes of the page element and visibility of the focused element. Hosts
//! provide them through [`ResizeObserving`] and [`IntersectionObserving`].
//!
//! Contract for implementors:
//! - `observe` returns immediately; callbacks are delivered later, never from
//!   inside `observe` itself.
//! - After `disconnect`, the callback is never invoked again.

use std::fmt;
use std::sync::Arc;

use crate::element::ElementHandle;
use crate::geometry::Size;

/// A box-size change report.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeEntry {
    /// Observed element.
    pub target: ElementHandle,
    /// New content-box size in page coordinates.
    pub size: Size,
}

/// A visibility report.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    /// Observed element.
    pub target: ElementHandle,
    /// Visible fraction of the element, `0.0..=1.0`.
    pub intersection_ratio: f64,
}

/// Callback invoked with resize reports.
pub type ResizeCallback = Arc<dyn Fn(&[ResizeEntry]) + Send + Sync>;

/// Callback invoked with visibility reports.
pub type IntersectionCallback = Arc<dyn Fn(&[IntersectionEntry]) + Send + Sync>;

/// A live observation; dropping it without `disconnect` leaks the watch.
pub trait ObservationHandle: Send {
    /// Stop delivering callbacks.
    fn disconnect(&mut self);
}

/// Box-size change notification.
pub trait ResizeObserving: Send + Sync {
    /// Start observing `target`.
    fn observe(&self, target: &ElementHandle, callback: ResizeCallback)
        -> Box<dyn ObservationHandle>;
}

/// Visibility-fraction notification.
pub trait IntersectionObserving: Send + Sync {
    /// Start observing `target`.
    fn observe(
        &self,
        target: &ElementHandle,
        callback: IntersectionCallback,
    ) -> Box<dyn ObservationHandle>;
}

/// The set of platform capabilities available to a stage.
///
/// Either may be absent; the matching observation is then skipped.
#[derive(Clone, Default)]
pub struct StagePlatform {
    /// Box-size change notification.
    pub resize: Option<Arc<dyn ResizeObserving>>,
    /// Visibility-fraction notification.
    pub intersection: Option<Arc<dyn IntersectionObserving>>,
}

impl StagePlatform {
    /// A platform with no observation capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide resize observation.
    #[must_use]
    pub fn with_resize(mut self, resize: Arc<dyn ResizeObserving>) -> Self {
        self.resize = Some(resize);
        self
    }

    /// Provide intersection observation.
    #[must_use]
    pub fn with_intersection(mut self, intersection: Arc<dyn IntersectionObserving>) -> Self {
        self.intersection = Some(intersection);
        self
    }
}

impl fmt::Debug for StagePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagePlatform")
            .field("resize", &self.resize.is_some())
            .field("intersection", &self.intersection.is_some())
            .finish()
    }
}
