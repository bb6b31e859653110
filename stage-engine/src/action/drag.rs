//! Drag and resize sessions.

use stage_core::{
    ElementHandle, GuideSet, GuidesOptions, MoveableOptions, Point, Rect, UpdateEventItem,
};

/// Which frame edge(s) a resize moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeDirection {
    /// Top edge.
    N,
    /// Bottom edge.
    S,
    /// Right edge.
    E,
    /// Left edge.
    W,
    /// Top-right corner.
    NE,
    /// Top-left corner.
    NW,
    /// Bottom-right corner.
    SE,
    /// Bottom-left corner.
    SW,
}

impl ResizeDirection {
    /// The handle under `point`, if it is within `handle_size` of a frame edge.
    #[must_use]
    pub fn hit(frame: &Rect, point: Point, handle_size: f64) -> Option<Self> {
        let grab = Rect::new(
            frame.x - handle_size,
            frame.y - handle_size,
            frame.width + handle_size * 2.0,
            frame.height + handle_size * 2.0,
        );
        if !grab.contains(point) {
            return None;
        }

        let north = (point.y - frame.y).abs() <= handle_size;
        let south = (point.y - frame.bottom()).abs() <= handle_size;
        let west = (point.x - frame.x).abs() <= handle_size;
        let east = (point.x - frame.right()).abs() <= handle_size;

        match (north, south, west, east) {
            (true, _, true, _) => Some(Self::NW),
            (true, _, _, true) => Some(Self::NE),
            (_, true, true, _) => Some(Self::SW),
            (_, true, _, true) => Some(Self::SE),
            (true, ..) => Some(Self::N),
            (_, true, ..) => Some(Self::S),
            (_, _, true, _) => Some(Self::W),
            (.., true) => Some(Self::E),
            _ => None,
        }
    }

    fn moves_left(self) -> bool {
        matches!(self, Self::W | Self::NW | Self::SW)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::E | Self::NE | Self::SE)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::N | Self::NE | Self::NW)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::S | Self::SE | Self::SW)
    }

    fn is_corner(self) -> bool {
        matches!(self, Self::NE | Self::NW | Self::SE | Self::SW)
    }

    /// Resize `start` by the pointer delta.
    #[must_use]
    pub fn apply(self, start: &Rect, dx: f64, dy: f64, options: &MoveableOptions) -> Rect {
        let mut width = start.width;
        let mut height = start.height;
        if self.moves_left() {
            width -= dx;
        } else if self.moves_right() {
            width += dx;
        }
        if self.moves_top() {
            height -= dy;
        } else if self.moves_bottom() {
            height += dy;
        }
        width = width.max(options.min_width);
        height = height.max(options.min_height);

        if options.keep_ratio && self.is_corner() && start.height > 0.0 {
            let ratio = start.width / start.height;
            height = (width / ratio).max(options.min_height);
        }

        let x = if self.moves_left() {
            start.right() - width
        } else {
            start.x
        };
        let y = if self.moves_top() {
            start.bottom() - height
        } else {
            start.y
        };
        Rect::new(x, y, width, height)
    }
}

/// A move of one or more elements.
#[derive(Debug, Clone)]
pub struct DragSession {
    origin: Point,
    frames: Vec<(ElementHandle, Rect)>,
    delta: (f64, f64),
}

impl DragSession {
    /// Start a drag at `origin` for `targets`. Elements no longer rendered are skipped.
    #[must_use]
    pub fn new(origin: Point, targets: Vec<ElementHandle>) -> Self {
        let frames = targets
            .into_iter()
            .filter_map(|el| el.rect().map(|rect| (el, rect)))
            .collect();
        Self {
            origin,
            frames,
            delta: (0.0, 0.0),
        }
    }

    /// Elements being moved.
    pub fn targets(&self) -> impl Iterator<Item = &ElementHandle> {
        self.frames.iter().map(|(el, _)| el)
    }

    /// Number of elements being moved.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether nothing is being moved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Follow the pointer, snapping the anchor (last element) to `guides`.
    pub fn drag_to(&mut self, point: Point, guides: Option<(&GuideSet, &GuidesOptions)>) {
        let mut dx = point.x - self.origin.x;
        let mut dy = point.y - self.origin.y;
        if let (Some((guides, options)), Some((_, anchor))) = (guides, self.frames.last()) {
            let moved = anchor.translate(dx, dy);
            let (sx, sy) =
                guides.snap_frame(&moved, options.snap_threshold, options.snap_to_center);
            dx += sx;
            dy += sy;
        }
        self.delta = (dx, dy);
    }

    /// Current delta from the start frames.
    #[must_use]
    pub fn delta(&self) -> (f64, f64) {
        self.delta
    }

    /// Final frames at the current delta.
    #[must_use]
    pub fn items(&self) -> Vec<UpdateEventItem> {
        let (dx, dy) = self.delta;
        self.frames
            .iter()
            .map(|(el, rect)| UpdateEventItem {
                el: el.clone(),
                rect: rect.translate(dx, dy),
            })
            .collect()
    }
}

/// A resize of the single selected element.
#[derive(Debug, Clone)]
pub struct ResizeSession {
    el: ElementHandle,
    start: Rect,
    origin: Point,
    direction: ResizeDirection,
    current: Rect,
}

impl ResizeSession {
    /// Start resizing `el` from `start` by `direction`.
    #[must_use]
    pub fn new(el: ElementHandle, start: Rect, origin: Point, direction: ResizeDirection) -> Self {
        Self {
            el,
            start,
            origin,
            direction,
            current: start,
        }
    }

    /// Follow the pointer.
    pub fn resize_to(&mut self, point: Point, options: &MoveableOptions) {
        self.current = self.direction.apply(
            &self.start,
            point.x - self.origin.x,
            point.y - self.origin.y,
            options,
        );
    }

    /// Handle being resized.
    #[must_use]
    pub fn direction(&self) -> ResizeDirection {
        self.direction
    }

    /// Final frame.
    #[must_use]
    pub fn item(&self) -> UpdateEventItem {
        UpdateEventItem {
            el: self.el.clone(),
            rect: self.current,
        }
    }
}
