use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  NaiveDateTime
};
use tracing::debug;

use crate::datetime::{
  day_start,
  days_from_week_start,
  minutes_of_day
};
use crate::geometry::Rect;
use crate::highlight::{
  HighlightRange,
  is_highlighted
};
use crate::item::ItemId;
use crate::scale::TimeScale;
use crate::view::{
  DaysMode,
  ViewWindow
};

/// Fixed-duration slot in a day's body.
#[derive(Debug, Clone)]
pub struct TimeUnit {
  day:                    usize,
  index:                  usize,
  hour:                   u32,
  minute:                 u32,
  duration:               Duration,
  pub(crate) passing:     Vec<ItemId>,
  pub(crate) highlighted: bool,
  pub(crate) selected:    bool,
  pub(crate) visible:     bool,
  pub(crate) bounds:      Rect
}

impl TimeUnit {
  fn new(
    day: usize,
    index: usize,
    scale: TimeScale
  ) -> Self {
    let offset =
      index as u32 * scale.minutes();
    Self {
      day,
      index,
      hour: offset / 60,
      minute: offset % 60,
      duration: scale.duration(),
      passing: vec![],
      highlighted: false,
      selected: false,
      visible: false,
      bounds: Rect::EMPTY
    }
  }

  #[must_use]
  pub fn day(&self) -> usize {
    self.day
  }

  #[must_use]
  pub fn index(&self) -> usize {
    self.index
  }

  #[must_use]
  pub fn hour(&self) -> u32 {
    self.hour
  }

  #[must_use]
  pub fn minute(&self) -> u32 {
    self.minute
  }

  #[must_use]
  pub fn duration(&self) -> Duration {
    self.duration
  }

  #[must_use]
  pub fn minutes_of_day(&self) -> u32 {
    self.hour * 60 + self.minute
  }

  #[must_use]
  pub fn passing_items(&self) -> &[ItemId] {
    &self.passing
  }

  #[must_use]
  pub fn is_highlighted(&self) -> bool {
    self.highlighted
  }

  #[must_use]
  pub fn is_selected(&self) -> bool {
    self.selected
  }

  #[must_use]
  pub fn is_visible(&self) -> bool {
    self.visible
  }

  #[must_use]
  pub fn bounds(&self) -> Rect {
    self.bounds
  }
}

/// All-day / multi-day lane above a day's
/// body.
#[derive(Debug, Clone)]
pub struct DayTop {
  day:                 usize,
  pub(crate) passing:  Vec<ItemId>,
  pub(crate) selected: bool,
  pub(crate) bounds:   Rect
}

impl DayTop {
  #[must_use]
  pub fn day(&self) -> usize {
    self.day
  }

  #[must_use]
  pub fn passing_items(&self) -> &[ItemId] {
    &self.passing
  }

  #[must_use]
  pub fn is_selected(&self) -> bool {
    self.selected
  }

  #[must_use]
  pub fn bounds(&self) -> Rect {
    self.bounds
  }

  pub(crate) fn add_passing_item(
    &mut self,
    id: ItemId
  ) {
    if !self.passing.contains(&id) {
      self.passing.push(id);
    }
  }
}

#[derive(Debug, Clone)]
pub struct Day {
  date:                      NaiveDate,
  index:                     usize,
  pub(crate) time_units:     Vec<TimeUnit>,
  pub(crate) day_top:        DayTop,
  pub(crate) overflow_start: bool,
  pub(crate) overflow_end:   bool,
  pub(crate) item_index:     usize,
  pub(crate) capacity:       usize,
  pub(crate) contained:      Vec<ItemId>,
  pub(crate) selected:       bool,
  pub(crate) bounds:         Rect,
  pub(crate) header_bounds:  Rect
}

impl Day {
  fn new(
    date: NaiveDate,
    index: usize,
    scale: TimeScale
  ) -> Self {
    let time_units = (0..scale
      .units_per_day())
      .map(|unit| {
        TimeUnit::new(index, unit, scale)
      })
      .collect();
    Self {
      date,
      index,
      time_units,
      day_top: DayTop {
        day:      index,
        passing:  vec![],
        selected: false,
        bounds:   Rect::EMPTY
      },
      overflow_start: false,
      overflow_end: false,
      item_index: 0,
      capacity: 0,
      contained: vec![],
      selected: false,
      bounds: Rect::EMPTY,
      header_bounds: Rect::EMPTY
    }
  }

  #[must_use]
  pub fn date(&self) -> NaiveDate {
    self.date
  }

  #[must_use]
  pub fn index(&self) -> usize {
    self.index
  }

  #[must_use]
  pub fn time_units(&self) -> &[TimeUnit] {
    &self.time_units
  }

  #[must_use]
  pub fn day_top(&self) -> &DayTop {
    &self.day_top
  }

  #[must_use]
  pub fn overflow_start(&self) -> bool {
    self.overflow_start
  }

  #[must_use]
  pub fn overflow_end(&self) -> bool {
    self.overflow_end
  }

  #[must_use]
  pub fn item_index(&self) -> usize {
    self.item_index
  }

  /// Rows of items the day shows at once.
  #[must_use]
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Items on this day, in stacking order.
  #[must_use]
  pub fn contained_items(&self) -> &[ItemId] {
    &self.contained
  }

  #[must_use]
  pub fn is_selected(&self) -> bool {
    self.selected
  }

  #[must_use]
  pub fn bounds(&self) -> Rect {
    self.bounds
  }

  #[must_use]
  pub fn header_bounds(&self) -> Rect {
    self.header_bounds
  }

  /// Area below the DayTop lane.
  #[must_use]
  pub fn body_bounds(&self) -> Rect {
    let top = if self.day_top.bounds.is_empty()
    {
      self.header_bounds.bottom()
    } else {
      self.day_top.bounds.bottom()
    };
    Rect::from_ltrb(
      self.bounds.left(),
      top.max(self.bounds.top()),
      self.bounds.right(),
      self.bounds.bottom()
    )
  }

  #[must_use]
  pub fn unit_date(
    &self,
    unit: usize
  ) -> Option<NaiveDateTime> {
    self.time_units.get(unit).map(|u| {
      day_start(self.date)
        + Duration::minutes(i64::from(
          u.minutes_of_day()
        ))
    })
  }
}

/// Seven consecutive days starting on the
/// first day of the week (Short mode).
#[derive(Debug, Clone)]
pub struct Week {
  start:             NaiveDate,
  first_day:         usize,
  pub(crate) bounds: Rect
}

impl Week {
  #[must_use]
  pub fn start(&self) -> NaiveDate {
    self.start
  }

  /// Index of the week's first day.
  #[must_use]
  pub fn first_day(&self) -> usize {
    self.first_day
  }

  #[must_use]
  pub fn bounds(&self) -> Rect {
    self.bounds
  }
}

/// Days, units and lanes of one build.
/// Replaced wholesale whenever the view or
/// scale changes.
#[derive(Debug, Clone)]
pub struct TimeGrid {
  mode:            DaysMode,
  scale:           TimeScale,
  pub(crate) days: Vec<Day>,
  pub(crate) weeks: Vec<Week>
}

impl TimeGrid {
  /// Builds the grid for `view`. When the
  /// span is out of range the view's end is
  /// clamped and `None` is returned; the
  /// caller runs another pass.
  #[tracing::instrument(skip(
    view, highlights
  ))]
  pub fn build(
    view: &mut ViewWindow,
    scale: TimeScale,
    highlights: &[HighlightRange]
  ) -> Option<TimeGrid> {
    if view.clamp_span() {
      return None;
    }

    let span = view.span_days() as usize;
    let start = view.start().date();
    let mode = view.mode();

    let (pre_days, total) = match mode {
      | DaysMode::Short => {
        let pre = days_from_week_start(
          start,
          view.first_day_of_week()
        ) as usize;
        (pre, (span + pre).div_ceil(7) * 7)
      }
      | DaysMode::Expanded => (0, span)
    };

    let first = start
      - Duration::days(pre_days as i64);
    let days = (0..total)
      .map(|index| {
        Day::new(
          first
            + Duration::days(index as i64),
          index,
          scale
        )
      })
      .collect::<Vec<_>>();

    let weeks = match mode {
      | DaysMode::Short => {
        days
          .iter()
          .filter(|day| {
            day.date.weekday()
              == view.first_day_of_week()
          })
          .map(|day| Week {
            start:     day.date,
            first_day: day.index,
            bounds:    Rect::EMPTY
          })
          .collect()
      }
      | DaysMode::Expanded => vec![]
    };

    let mut grid = TimeGrid {
      mode,
      scale,
      days,
      weeks
    };
    grid.apply_highlights(highlights);

    debug!(
      ?mode,
      days = grid.days.len(),
      weeks = grid.weeks.len(),
      pre_days,
      "built time grid"
    );
    Some(grid)
  }

  #[must_use]
  pub fn mode(&self) -> DaysMode {
    self.mode
  }

  #[must_use]
  pub fn scale(&self) -> TimeScale {
    self.scale
  }

  #[must_use]
  pub fn days(&self) -> &[Day] {
    &self.days
  }

  #[must_use]
  pub fn day(
    &self,
    index: usize
  ) -> Option<&Day> {
    self.days.get(index)
  }

  #[must_use]
  pub fn weeks(&self) -> &[Week] {
    &self.weeks
  }

  #[must_use]
  pub fn first_date(&self) -> Option<NaiveDate> {
    self.days.first().map(|d| d.date)
  }

  #[must_use]
  pub fn last_date(&self) -> Option<NaiveDate> {
    self.days.last().map(|d| d.date)
  }

  /// Index of the day showing `date`.
  #[must_use]
  pub fn find_day(
    &self,
    date: NaiveDate
  ) -> Option<usize> {
    let first = self.first_date()?;
    let offset = (date - first).num_days();
    usize::try_from(offset)
      .ok()
      .filter(|idx| *idx < self.days.len())
  }

  /// `(day, unit)` of the time unit that
  /// contains `at`.
  #[must_use]
  pub fn time_unit_at(
    &self,
    at: NaiveDateTime
  ) -> Option<(usize, usize)> {
    let day = self.find_day(at.date())?;
    let unit = (minutes_of_day(at)
      / self.scale.minutes())
      as usize;
    self.days[day]
      .time_units
      .get(unit)
      .map(|_| (day, unit))
  }

  pub(crate) fn apply_highlights(
    &mut self,
    ranges: &[HighlightRange]
  ) {
    for day in &mut self.days {
      let midnight = day_start(day.date);
      for unit in &mut day.time_units {
        let at = midnight
          + Duration::minutes(i64::from(
            unit.minutes_of_day()
          ));
        unit.highlighted =
          is_highlighted(ranges, at);
      }
    }
  }
}
