//! Integer geometry in document pixel coordinates.
//! 0,0 is top left, +X right, +Y down.

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}
impl Point {
    pub const ZERO: Self = Self { x: 0, y: 0 };
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
impl std::ops::Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}
impl std::ops::Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}
impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height, in pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}
impl Size {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
    /// Number of pixels, or None if it does not fit in a `usize`.
    #[must_use]
    pub fn area(self) -> Option<usize> {
        usize::try_from(self.width)
            .ok()?
            .checked_mul(usize::try_from(self.height).ok()?)
    }
}
impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned rectangle. Always normalized - the size can't be negative.
///
/// A rectangle with zero width or height is empty, and all empty rectangles compare
/// equal to [`Rect::EMPTY`] once passed through [`Rect::normalized`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}
impl Rect {
    pub const EMPTY: Self = Self {
        origin: Point::ZERO,
        size: Size::new(0, 0),
    };
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }
    #[must_use]
    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }
    /// Rectangle spanning two corners, in any order. The far corner is exclusive.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let min = Point::new(a.x.min(b.x), a.y.min(b.y));
        let max = Point::new(a.x.max(b.x), a.y.max(b.y));
        Self {
            origin: min,
            size: Size::new(max.x.abs_diff(min.x), max.y.abs_diff(min.y)),
        }
        .normalized()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }
    /// Collapse any empty rectangle to [`Rect::EMPTY`].
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.is_empty() {
            Self::EMPTY
        } else {
            self
        }
    }
    #[must_use]
    pub fn left(&self) -> i64 {
        i64::from(self.origin.x)
    }
    #[must_use]
    pub fn top(&self) -> i64 {
        i64::from(self.origin.y)
    }
    /// Exclusive right edge.
    #[must_use]
    pub fn right(&self) -> i64 {
        self.left() + i64::from(self.size.width)
    }
    /// Exclusive bottom edge.
    #[must_use]
    pub fn bottom(&self) -> i64 {
        self.top() + i64::from(self.size.height)
    }
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        let (x, y) = (i64::from(point.x), i64::from(point.y));
        !self.is_empty() && x >= self.left() && x < self.right() && y >= self.top() && y < self.bottom()
    }
    /// Same size, new top-left.
    #[must_use = "returns a new rect and does not modify `self`"]
    pub fn with_origin(self, origin: Point) -> Self {
        Self { origin, ..self }
    }
    #[must_use = "returns a new rect and does not modify `self`"]
    pub fn translated(self, delta: Point) -> Self {
        self.with_origin(self.origin + delta)
    }
    /// The overlapping area, or [`Rect::EMPTY`] if they do not overlap.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return Self::EMPTY;
        }
        // In range - bounded by the inputs' own coordinates.
        let (Ok(x), Ok(y), Ok(width), Ok(height)) = (
            i32::try_from(left),
            i32::try_from(top),
            u32::try_from(right - left),
            u32::try_from(bottom - top),
        ) else {
            return Self::EMPTY;
        };
        Self::new(x, y, width, height)
    }
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.intersection(other).is_empty()
    }
    /// Rectangle covering the canvas of the given size.
    #[must_use]
    pub fn of_size(size: Size) -> Self {
        Self::from_origin_size(Point::ZERO, size).normalized()
    }
}
impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.size, self.origin)
    }
}
