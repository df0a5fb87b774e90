use serde::Serialize;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize
)]
pub struct Point {
  pub x: i32,
  pub y: i32
}

impl Point {
  #[must_use]
  pub const fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }
}

/// Pixel rectangle. Right and bottom edges
/// are exclusive.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize
)]
pub struct Rect {
  pub x:      i32,
  pub y:      i32,
  pub width:  i32,
  pub height: i32
}

impl Rect {
  pub const EMPTY: Rect = Rect {
    x:      0,
    y:      0,
    width:  0,
    height: 0
  };

  #[must_use]
  pub const fn new(
    x: i32,
    y: i32,
    width: i32,
    height: i32
  ) -> Self {
    Self {
      x,
      y,
      width,
      height
    }
  }

  #[must_use]
  pub fn from_ltrb(
    left: i32,
    top: i32,
    right: i32,
    bottom: i32
  ) -> Self {
    Self {
      x:      left,
      y:      top,
      width:  right - left,
      height: bottom - top
    }
  }

  #[must_use]
  pub fn left(&self) -> i32 {
    self.x
  }

  #[must_use]
  pub fn top(&self) -> i32 {
    self.y
  }

  #[must_use]
  pub fn right(&self) -> i32 {
    self.x + self.width
  }

  #[must_use]
  pub fn bottom(&self) -> i32 {
    self.y + self.height
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.width <= 0 || self.height <= 0
  }

  #[must_use]
  pub fn contains(&self, p: Point) -> bool {
    !self.is_empty()
      && p.x >= self.left()
      && p.x < self.right()
      && p.y >= self.top()
      && p.y < self.bottom()
  }

  #[must_use]
  pub fn intersects(
    &self,
    other: &Rect
  ) -> bool {
    !self.is_empty()
      && !other.is_empty()
      && other.left() < self.right()
      && self.left() < other.right()
      && other.top() < self.bottom()
      && self.top() < other.bottom()
  }

  /// Smallest rectangle covering both. An
  /// empty side is ignored.
  #[must_use]
  pub fn union(&self, other: &Rect) -> Rect {
    if self.is_empty() {
      return *other;
    }
    if other.is_empty() {
      return *self;
    }
    Rect::from_ltrb(
      self.left().min(other.left()),
      self.top().min(other.top()),
      self.right().max(other.right()),
      self.bottom().max(other.bottom())
    )
  }

  /// Clips to `bounds`; the result is empty
  /// when they do not overlap.
  #[must_use]
  pub fn clip(&self, bounds: &Rect) -> Rect {
    let left = self.left().max(bounds.left());
    let top = self.top().max(bounds.top());
    let right =
      self.right().min(bounds.right());
    let bottom =
      self.bottom().min(bounds.bottom());
    if right <= left || bottom <= top {
      return Rect::EMPTY;
    }
    Rect::from_ltrb(left, top, right, bottom)
  }

  #[must_use]
  pub fn inflate(
    &self,
    dx: i32,
    dy: i32
  ) -> Rect {
    Rect::from_ltrb(
      self.left() - dx,
      self.top() - dy,
      self.right() + dx,
      self.bottom() + dy
    )
  }
}
