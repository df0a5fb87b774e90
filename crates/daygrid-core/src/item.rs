use std::cmp::Ordering;
use std::fmt;

use chrono::{
  Duration,
  NaiveDate,
  NaiveDateTime
};
use serde::{
  Deserialize,
  Serialize
};
use sha2::{
  Digest,
  Sha256
};

use crate::datetime::{
  day_end,
  day_start,
  ole_day_count
};
use crate::geometry::{
  Point,
  Rect
};

/// Width of the grab zone at either end of
/// an item for resizing.
pub const RESIZE_MARGIN: i32 = 4;

/// Index into the calendar's item arena.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize
)]
pub struct ItemId(pub usize);

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize
)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
  pub a: u8,
  pub r: u8,
  pub g: u8,
  pub b: u8
}

impl Color {
  pub const WHITE: Color = Color {
    a: 255,
    r: 255,
    g: 255,
    b: 255
  };

  #[must_use]
  pub const fn rgb(
    r: u8,
    g: u8,
    b: u8
  ) -> Self {
    Self { a: 255, r, g, b }
  }

  #[must_use]
  pub fn to_argb(self) -> u32 {
    u32::from_be_bytes([
      self.a, self.r, self.g, self.b
    ])
  }
}

impl TryFrom<String> for Color {
  type Error = String;

  fn try_from(
    raw: String
  ) -> Result<Self, Self::Error> {
    let hex =
      raw.trim().trim_start_matches('#');
    let value =
      u32::from_str_radix(hex, 16)
        .map_err(|err| {
          format!(
            "invalid color {raw:?}: {err}"
          )
        })?;
    match hex.len() {
      | 6 => {
        let [_, r, g, b] =
          value.to_be_bytes();
        Ok(Color::rgb(r, g, b))
      }
      | 8 => {
        let [a, r, g, b] =
          value.to_be_bytes();
        Ok(Color { a, r, g, b })
      }
      | _ => {
        Err(format!(
          "invalid color {raw:?}: expected \
           #RRGGBB or #AARRGGBB"
        ))
      }
    }
  }
}

impl From<Color> for String {
  fn from(color: Color) -> Self {
    if color.a == 255 {
      format!(
        "#{:02x}{:02x}{:02x}",
        color.r, color.g, color.b
      )
    } else {
      format!("#{:08x}", color.to_argb())
    }
  }
}

/// Source record handed to the engine by a
/// data adapter.
#[derive(
  Debug, Clone, Serialize, Deserialize,
)]
pub struct ItemRecord {
  pub id:          i64,
  #[serde(default)]
  pub tag_id:      i64,
  #[serde(default)]
  pub resource_id: i64,
  pub start:       NaiveDateTime,
  pub end:         NaiveDateTime,
  #[serde(default)]
  pub all_day:     bool,
  #[serde(default, alias = "display")]
  pub text:        String,
  #[serde(default)]
  pub background:  Option<Color>,
  #[serde(default)]
  pub foreground:  Option<Color>,
  #[serde(default)]
  pub image:       Option<String>,
  #[serde(default)]
  pub locked:      bool
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize
)]
pub struct DragState {
  pub dragging:       bool,
  pub resizing_start: bool,
  pub resizing_end:   bool
}

/// Content hash used to recognise the same
/// logical item across reloads.
#[derive(
  Clone, Copy, PartialEq, Eq, Hash,
)]
pub struct ItemIdentity([u8; 32]);

impl fmt::Display for ItemIdentity {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    for byte in self.0 {
      write!(f, "{byte:02x}")?;
    }
    Ok(())
  }
}

impl fmt::Debug for ItemIdentity {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(f, "ItemIdentity({self})")
  }
}

/// Grid elements an item is attached to.
/// Units are `(day, unit)` pairs.
#[derive(Debug, Clone, Default)]
pub(crate) struct Passing {
  pub(crate) days:  Vec<usize>,
  pub(crate) tops:  Vec<usize>,
  pub(crate) units: Vec<(usize, usize)>
}

impl Passing {
  pub(crate) fn is_empty(&self) -> bool {
    self.days.is_empty()
      && self.tops.is_empty()
      && self.units.is_empty()
  }
}

#[derive(Debug, Clone)]
pub struct Item {
  pub appointment_id:           i64,
  pub tag_id:                   i64,
  pub resource_id:              i64,
  start:                        NaiveDateTime,
  end:                          NaiveDateTime,
  pub all_day:                  bool,
  pub text:                     String,
  pub background:               Option<Color>,
  pub foreground:               Option<Color>,
  pub image:                    Option<String>,
  pub locked:                   bool,
  pub(crate) selected:          bool,
  pub(crate) drag:              DragState,
  pub(crate) bounds:            Rect,
  pub(crate) additional_bounds: Vec<Rect>,
  pub(crate) on_view:           bool,
  pub(crate) column:            usize,
  pub(crate) column_count:      usize,
  pub(crate) minute_start_top:  i32,
  pub(crate) minute_end_top:    i32,
  pub(crate) passing:           Passing
}

impl Item {
  /// Reversed bounds are swapped.
  pub fn new(
    start: NaiveDateTime,
    end: NaiveDateTime,
    text: impl Into<String>
  ) -> Self {
    let (start, end) = ordered(start, end);
    Self {
      appointment_id: 0,
      tag_id: 0,
      resource_id: 0,
      start,
      end,
      all_day: false,
      text: text.into(),
      background: None,
      foreground: None,
      image: None,
      locked: false,
      selected: false,
      drag: DragState::default(),
      bounds: Rect::EMPTY,
      additional_bounds: vec![],
      on_view: false,
      column: 0,
      column_count: 0,
      minute_start_top: 0,
      minute_end_top: 0,
      passing: Passing::default()
    }
  }

  pub fn from_record(
    record: &ItemRecord
  ) -> Self {
    let mut item = Item::new(
      record.start,
      record.end,
      record.text.clone()
    );
    item.appointment_id = record.id;
    item.tag_id = record.tag_id;
    item.resource_id = record.resource_id;
    item.all_day = record.all_day;
    item.background = record.background;
    item.foreground = record.foreground;
    item.image = record.image.clone();
    item.locked = record.locked;
    item
  }

  #[must_use]
  pub fn start(&self) -> NaiveDateTime {
    self.start
  }

  #[must_use]
  pub fn end(&self) -> NaiveDateTime {
    self.end
  }

  /// Callers detach grid membership
  /// first.
  pub(crate) fn set_dates(
    &mut self,
    start: NaiveDateTime,
    end: NaiveDateTime
  ) {
    let (start, end) = ordered(start, end);
    self.start = start;
    self.end = end;
  }

  #[must_use]
  pub fn duration(&self) -> Duration {
    self.end - self.start
  }

  /// Crosses a day boundary or is flagged
  /// all-day.
  #[must_use]
  pub fn is_on_day_top(&self) -> bool {
    let last = self.end + Duration::seconds(1);
    self.start.date() != last.date()
      || self.all_day
  }

  #[must_use]
  pub fn is_open_start(
    &self,
    first_day: NaiveDate
  ) -> bool {
    self.start < day_start(first_day)
  }

  #[must_use]
  pub fn is_open_end(
    &self,
    last_day: NaiveDate
  ) -> bool {
    self.end > day_end(last_day)
  }

  #[must_use]
  pub fn is_on_view_date_range(
    &self,
    first_day: NaiveDate,
    last_day: NaiveDate
  ) -> bool {
    self.start < day_end(last_day)
      && day_start(first_day) <= self.end
  }

  #[must_use]
  pub fn identity(&self) -> ItemIdentity {
    let background = self
      .background
      .unwrap_or(Color::WHITE)
      .to_argb();
    let seconds = self
      .duration()
      .num_seconds()
      as f64;

    let mut hasher = Sha256::new();
    hasher.update(
      self.appointment_id.to_le_bytes()
    );
    hasher.update(self.tag_id.to_le_bytes());
    hasher.update(
      self.resource_id.to_le_bytes()
    );
    hasher.update(background.to_le_bytes());
    hasher.update(
      ole_day_count(self.start).to_le_bytes()
    );
    hasher.update(seconds.to_le_bytes());

    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    ItemIdentity(bytes)
  }

  #[must_use]
  pub fn bounds(&self) -> Rect {
    self.bounds
  }

  #[must_use]
  pub fn additional_bounds(&self) -> &[Rect] {
    &self.additional_bounds
  }

  /// Every rectangle, ordered top to bottom.
  #[must_use]
  pub fn all_bounds(&self) -> Vec<Rect> {
    let mut rects = self
      .additional_bounds
      .iter()
      .copied()
      .filter(|r| !r.is_empty())
      .collect::<Vec<_>>();
    if !self.bounds.is_empty() {
      rects.push(self.bounds);
    }
    rects.sort_by_key(|r| (r.top(), r.left()));
    rects
  }

  #[must_use]
  pub fn is_selected(&self) -> bool {
    self.selected
  }

  #[must_use]
  pub fn is_on_view(&self) -> bool {
    self.on_view
  }

  #[must_use]
  pub fn drag_state(&self) -> DragState {
    self.drag
  }

  #[must_use]
  pub fn column(&self) -> usize {
    self.column
  }

  #[must_use]
  pub fn column_count(&self) -> usize {
    self.column_count
  }

  #[must_use]
  pub fn minute_tops(&self) -> (i32, i32) {
    (
      self.minute_start_top,
      self.minute_end_top
    )
  }

  /// Days, DayTops and TimeUnits this item
  /// is currently attached to.
  #[must_use]
  pub fn passing_days(&self) -> &[usize] {
    &self.passing.days
  }

  #[must_use]
  pub fn passing_tops(&self) -> &[usize] {
    &self.passing.tops
  }

  #[must_use]
  pub fn passing_units(
    &self
  ) -> &[(usize, usize)] {
    &self.passing.units
  }

  #[must_use]
  pub fn intersects(
    &self,
    start: NaiveDateTime,
    end: NaiveDateTime
  ) -> bool {
    date_intersects(
      self.start, self.end, start, end
    )
  }

  /// `horizontal` is true on the DayTop
  /// lane and in Short mode, where items
  /// resize along the x axis.
  #[must_use]
  pub fn resize_start_zone(
    &self,
    p: Point,
    horizontal: bool
  ) -> bool {
    let rects = self.all_bounds();
    let Some(first) = rects.first() else {
      return false;
    };
    let zone = if horizontal {
      Rect::from_ltrb(
        first.left(),
        first.top(),
        first.left() + RESIZE_MARGIN,
        first.bottom()
      )
    } else {
      Rect::from_ltrb(
        first.left(),
        first.top(),
        first.right(),
        first.top() + RESIZE_MARGIN
      )
    };
    zone.contains(p)
  }

  #[must_use]
  pub fn resize_end_zone(
    &self,
    p: Point,
    horizontal: bool
  ) -> bool {
    let rects = self.all_bounds();
    let Some(last) = rects.last() else {
      return false;
    };
    let zone = if horizontal {
      Rect::from_ltrb(
        last.right() - RESIZE_MARGIN,
        last.top(),
        last.right(),
        last.bottom()
      )
    } else {
      Rect::from_ltrb(
        last.left(),
        last.bottom() - RESIZE_MARGIN,
        last.right(),
        last.bottom()
      )
    };
    zone.contains(p)
  }

  pub(crate) fn clear_bounds(&mut self) {
    self.bounds = Rect::EMPTY;
    self.additional_bounds.clear();
    self.on_view = false;
    self.column = 0;
    self.column_count = 0;
    self.minute_start_top = 0;
    self.minute_end_top = 0;
  }

  /// First rectangle becomes `bounds`, the
  /// rest are appended in order.
  pub(crate) fn add_bounds(
    &mut self,
    r: Rect
  ) {
    if r.is_empty() {
      return;
    }
    if self.bounds.is_empty() {
      self.bounds = r;
    } else {
      self.additional_bounds.push(r);
    }
    self.on_view = true;
  }

  /// Insets the leading and trailing edges
  /// unless the item continues past the
  /// view at that edge.
  pub(crate) fn gap_first_and_last(
    &mut self,
    padding: i32,
    open_start: bool,
    open_end: bool
  ) {
    if self.bounds.is_empty() {
      return;
    }
    if !open_start {
      let r = self.bounds;
      self.bounds = Rect::from_ltrb(
        (r.left() + padding)
          .min(r.right() - 1),
        r.top(),
        r.right(),
        r.bottom()
      );
    }
    if !open_end {
      let last = self
        .additional_bounds
        .last_mut()
        .unwrap_or(&mut self.bounds);
      let r = *last;
      *last = Rect::from_ltrb(
        r.left(),
        r.top(),
        (r.right() - padding)
          .max(r.left() + 1),
        r.bottom()
      );
    }
  }
}

impl PartialEq for Item {
  fn eq(&self, other: &Self) -> bool {
    self.identity() == other.identity()
  }
}

impl Eq for Item {}

/// Half-open range intersection.
#[must_use]
pub fn date_intersects(
  start_a: NaiveDateTime,
  end_a: NaiveDateTime,
  start_b: NaiveDateTime,
  end_b: NaiveDateTime
) -> bool {
  start_b < end_a && start_a < end_b
}

/// Stacking order: latest start first, then
/// latest end, then highest appointment id.
#[must_use]
pub fn item_order(
  a: &Item,
  b: &Item
) -> Ordering {
  b.start
    .cmp(&a.start)
    .then_with(|| b.end.cmp(&a.end))
    .then_with(|| {
      b.appointment_id
        .cmp(&a.appointment_id)
    })
}

/// `item_order` extended with missing items
/// sorting first.
#[must_use]
pub fn compare_items(
  a: Option<&Item>,
  b: Option<&Item>
) -> Ordering {
  match (a, b) {
    | (None, None) => Ordering::Equal,
    | (None, Some(_)) => Ordering::Less,
    | (Some(_), None) => Ordering::Greater,
    | (Some(a), Some(b)) => item_order(a, b)
  }
}

fn ordered(
  start: NaiveDateTime,
  end: NaiveDateTime
) -> (NaiveDateTime, NaiveDateTime) {
  if end < start {
    (end, start)
  } else {
    (start, end)
  }
}
