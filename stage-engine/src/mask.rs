//! # Mask
//!
//! The overlay drawn above the rendered surface: the outline of the focused
//! element, the guide lines, and the viewport (scroll and zoom) the overlay
//! maps through.
//!
//! ```text
//!   stage point ──(+ scroll) / zoom──▶ page point
//!   page rect   ──× zoom − scroll────▶ outline (fixed elements skip scroll)
//! ```
//!
//! The mask is a synchronous state machine owned by the engine. Operations
//! that change guides return [`MaskEvent`]s instead of publishing them, and
//! observation handles are handed back to the caller to disconnect outside
//! any lock.

use stage_core::{
    ElementHandle, GuideAxis, GuideSet, GuidesEventData, IntersectionEntry, ObservationHandle,
    Point, Positioning, Rect, ResizeEntry, Size, StageOptions,
};

use crate::render::MountTarget;

/// Events raised by the mask.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskEvent {
    /// Guides changed on one axis.
    ChangeGuides(GuidesEventData),
}

/// A snapshot of the overlay geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskLayout {
    /// Outline of the focused element in stage coordinates.
    pub outline: Option<Rect>,
    /// Viewport scroll offset in stage pixels.
    pub scroll: Point,
    /// Current zoom.
    pub zoom: f64,
    /// Visible stage size.
    pub wrapper: Size,
    /// Page content size in page coordinates.
    pub content: Size,
}

/// The selection overlay.
pub struct StageMask {
    mounted: bool,
    wrapper: Size,
    content: Size,
    scroll: Point,
    zoom: f64,
    page: Option<ElementHandle>,
    focused: Option<ElementHandle>,
    outline: Option<Rect>,
    guides: GuideSet,
    disabled_rule: bool,
    intersection: Option<(ElementHandle, Box<dyn ObservationHandle>)>,
}

impl StageMask {
    /// Create an unmounted mask.
    #[must_use]
    pub fn new(options: &StageOptions) -> Self {
        Self {
            mounted: false,
            wrapper: Size::default(),
            content: Size::default(),
            scroll: Point::default(),
            zoom: options.zoom,
            page: None,
            focused: None,
            outline: None,
            guides: GuideSet::new(),
            disabled_rule: options.disabled_rule,
            intersection: None,
        }
    }

    /// Attach to the mount region. A remount re-targets the wrapper size.
    pub fn mount(&mut self, target: &MountTarget) {
        self.wrapper = target.size;
        self.mounted = true;
        self.clamp_scroll();
        tracing::debug!(target = %target.name, "mask mounted");
    }

    /// Whether the mask is mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Track a new page element.
    pub fn observe(&mut self, page: &ElementHandle) {
        if let Some(rect) = page.rect() {
            self.content = rect.size();
        }
        self.page = Some(page.clone());
        self.clamp_scroll();
        self.relayout();
    }

    /// The tracked page element.
    #[must_use]
    pub fn page(&self) -> Option<&ElementHandle> {
        self.page.as_ref()
    }

    /// The page element's box changed.
    pub fn page_resize(&mut self, entries: &[ResizeEntry]) {
        let Some(page) = &self.page else {
            return;
        };
        if let Some(entry) = entries.iter().rev().find(|entry| entry.target.same_id(page)) {
            self.content = entry.size;
        }
        self.clamp_scroll();
        self.relayout();
    }

    /// Position the outline over `el`.
    pub fn set_layout(&mut self, el: &ElementHandle) {
        self.focused = Some(el.clone());
        self.relayout();
    }

    /// The element the outline follows.
    #[must_use]
    pub fn focused(&self) -> Option<&ElementHandle> {
        self.focused.as_ref()
    }

    /// Current overlay geometry.
    #[must_use]
    pub fn layout(&self) -> MaskLayout {
        MaskLayout {
            outline: self.outline,
            scroll: self.scroll,
            zoom: self.zoom,
            wrapper: self.wrapper,
            content: self.content,
        }
    }

    /// Current zoom.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Change the zoom and re-layout.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
        self.clamp_scroll();
        self.relayout();
    }

    /// Convert a stage point to page coordinates.
    #[must_use]
    pub fn to_page_point(&self, point: Point) -> Point {
        Point::new(
            (point.x + self.scroll.x) / self.zoom,
            (point.y + self.scroll.y) / self.zoom,
        )
    }

    /// Scroll the viewport by a delta, clamped to the content.
    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.scroll_to(self.scroll.x + dx, self.scroll.y + dy);
    }

    /// Scroll the viewport to an offset, clamped to the content.
    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll = Point::new(x, y);
        self.clamp_scroll();
        self.relayout();
    }

    /// Whether any part of `el` is inside the viewport.
    #[must_use]
    pub fn is_in_view(&self, el: &ElementHandle) -> bool {
        match self.outline_of(el) {
            Some(outline) => {
                outline.intersects(&Rect::new(0.0, 0.0, self.wrapper.width, self.wrapper.height))
            }
            None => false,
        }
    }

    /// Scroll so the top-left of `el` is at the top-left of the viewport.
    pub fn scroll_into_view(&mut self, el: &ElementHandle) {
        if el.positioning() == Positioning::Fixed {
            return;
        }
        if let Some(rect) = el.rect() {
            let scaled = rect.scale(self.zoom);
            tracing::debug!(id = %el.id(), "scrolling element into view");
            self.scroll_to(scaled.x, scaled.y);
        }
    }

    /// Element currently watched for visibility.
    #[must_use]
    pub fn observed(&self) -> Option<&ElementHandle> {
        self.intersection.as_ref().map(|(target, _)| target)
    }

    /// Stop tracking visibility, handing back the handle to disconnect.
    pub fn take_intersection(&mut self) -> Option<Box<dyn ObservationHandle>> {
        self.intersection.take().map(|(_, handle)| handle)
    }

    /// Record a new visibility watch on `target`.
    ///
    /// Returns any previous watch, which the caller must disconnect.
    pub fn set_intersection(
        &mut self,
        target: &ElementHandle,
        handle: Box<dyn ObservationHandle>,
    ) -> Option<Box<dyn ObservationHandle>> {
        self.intersection
            .replace((target.clone(), handle))
            .map(|(_, previous)| previous)
    }

    /// Visibility report for the watched element.
    ///
    /// Once the element is reported fully outside the viewport it is scrolled
    /// into view and the watch ends; the ended handle is returned.
    pub fn on_intersection(
        &mut self,
        entries: &[IntersectionEntry],
    ) -> Option<Box<dyn ObservationHandle>> {
        let target = self.observed()?.clone();
        let hidden = entries
            .iter()
            .filter(|entry| entry.target.ptr_eq(&target))
            .any(|entry| entry.intersection_ratio <= 0.0);
        if !hidden {
            return None;
        }
        self.scroll_into_view(&target);
        self.take_intersection()
    }

    /// Current guides.
    #[must_use]
    pub fn guides(&self) -> &GuideSet {
        &self.guides
    }

    /// Replace the guides on one axis.
    ///
    /// Returns the change event, or `None` when rules are disabled or nothing
    /// changed.
    pub fn set_guides(&mut self, axis: GuideAxis, guides: Vec<f64>) -> Option<MaskEvent> {
        if self.disabled_rule {
            tracing::debug!(?axis, "guides ignored: rules disabled");
            return None;
        }
        if !self.guides.set(axis, guides) {
            return None;
        }
        Some(MaskEvent::ChangeGuides(GuidesEventData {
            axis,
            guides: self.guides.get(axis).to_vec(),
        }))
    }

    /// Remove every guide, returning one change event per axis that had any.
    pub fn clear_guides(&mut self) -> Vec<MaskEvent> {
        let mut events = Vec::new();
        for axis in GuideAxis::ALL {
            if self.guides.set(axis, Vec::new()) {
                events.push(MaskEvent::ChangeGuides(GuidesEventData {
                    axis,
                    guides: Vec::new(),
                }));
            }
        }
        events
    }

    /// Reset to the unmounted state, handing back any live visibility watch.
    pub fn destroy(&mut self) -> Option<Box<dyn ObservationHandle>> {
        let handle = self.take_intersection();
        self.mounted = false;
        self.page = None;
        self.focused = None;
        self.outline = None;
        self.guides.clear();
        self.scroll = Point::default();
        self.content = Size::default();
        handle
    }

    fn outline_of(&self, el: &ElementHandle) -> Option<Rect> {
        let scaled = el.rect()?.scale(self.zoom);
        if el.positioning() == Positioning::Fixed {
            Some(scaled)
        } else {
            Some(scaled.translate(-self.scroll.x, -self.scroll.y))
        }
    }

    fn relayout(&mut self) {
        self.outline = self.focused.as_ref().and_then(|el| self.outline_of(el));
    }

    fn clamp_scroll(&mut self) {
        let max_x = (self.content.width * self.zoom - self.wrapper.width).max(0.0);
        let max_y = (self.content.height * self.zoom - self.wrapper.height).max(0.0);
        self.scroll = Point::new(self.scroll.x.clamp(0.0, max_x), self.scroll.y.clamp(0.0, max_y));
    }
}
