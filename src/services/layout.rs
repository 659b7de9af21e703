use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Edges are inclusive, matching client-rect hit checks on pointer release.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right() && p.y >= self.top && p.y <= self.bottom()
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn with_origin(&self, origin: Point) -> Self {
        Self {
            left: origin.x,
            top: origin.y,
            ..*self
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        self.with_origin(Point::new(self.left + dx, self.top + dy))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Clamp a single drag delta component to `±max`. Infinities clamp like any other
/// out-of-range value; NaN collapses to 0.
pub fn clamp_delta(delta: f64, max: f64) -> f64 {
    if delta.is_nan() {
        return 0.0;
    }
    delta.clamp(-max, max)
}

/// Keep `rect` fully inside `container`, shifting (never resizing) it.
///
/// A rect larger than the container is pinned to the container's top-left.
pub fn clamp_into(rect: Rect, container: Rect) -> Rect {
    let min_x = container.left;
    let max_x = (container.right() - rect.width).max(min_x);
    let min_y = container.top;
    let max_y = (container.bottom() - rect.height).max(min_y);

    rect.with_origin(Point::new(
        rect.left.clamp(min_x, max_x),
        rect.top.clamp(min_y, max_y),
    ))
}

/// Position of a secondary panel linked to a primary one: directly above it,
/// left edges aligned, separated by `gap`.
///
/// Pure function of its inputs; calling it again with the same bounds yields the same point.
pub fn place_linked_panel(primary: Rect, secondary: Size, gap: f64) -> Point {
    Point::new(primary.left, primary.top - secondary.height - gap)
}
