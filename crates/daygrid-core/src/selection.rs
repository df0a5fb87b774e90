use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::datetime::day_start;
use crate::geometry::Rect;
use crate::grid::TimeGrid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize
)]
pub enum ElementKind {
  TimeUnit,
  DayTop,
  Day
}

/// A selectable grid element, addressed by
/// day index (and unit index for time
/// units).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize
)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementRef {
  TimeUnit { day: usize, unit: usize },
  DayTop { day: usize },
  Day { day: usize }
}

impl ElementRef {
  #[must_use]
  pub fn kind(&self) -> ElementKind {
    match self {
      | ElementRef::TimeUnit { .. } => {
        ElementKind::TimeUnit
      }
      | ElementRef::DayTop { .. } => {
        ElementKind::DayTop
      }
      | ElementRef::Day { .. } => ElementKind::Day
    }
  }

  #[must_use]
  pub fn day(&self) -> usize {
    match *self {
      | ElementRef::TimeUnit { day, .. }
      | ElementRef::DayTop { day }
      | ElementRef::Day { day } => day
    }
  }

  /// Start of the element, or `None` when it
  /// does not exist in `grid`.
  #[must_use]
  pub fn date(
    &self,
    grid: &TimeGrid
  ) -> Option<NaiveDateTime> {
    let day = grid.day(self.day())?;
    match *self {
      | ElementRef::TimeUnit { unit, .. } => {
        day.unit_date(unit)
      }
      | ElementRef::DayTop { .. }
      | ElementRef::Day { .. } => {
        Some(day_start(day.date()))
      }
    }
  }

  #[must_use]
  pub fn bounds(
    &self,
    grid: &TimeGrid
  ) -> Option<Rect> {
    let day = grid.day(self.day())?;
    match *self {
      | ElementRef::TimeUnit { unit, .. } => {
        day.time_units().get(unit).map(|u| u.bounds())
      }
      | ElementRef::DayTop { .. } => {
        Some(day.day_top().bounds())
      }
      | ElementRef::Day { .. } => Some(day.bounds())
    }
  }

  #[must_use]
  pub fn is_selected(
    &self,
    grid: &TimeGrid
  ) -> bool {
    let Some(day) = grid.day(self.day()) else {
      return false;
    };
    match *self {
      | ElementRef::TimeUnit { unit, .. } => {
        day
          .time_units()
          .get(unit)
          .is_some_and(|u| u.is_selected())
      }
      | ElementRef::DayTop { .. } => {
        day.day_top().is_selected()
      }
      | ElementRef::Day { .. } => day.is_selected()
    }
  }

  /// Orders by date; missing elements first.
  #[must_use]
  pub fn cmp_by_date(
    &self,
    other: &ElementRef,
    grid: &TimeGrid
  ) -> Ordering {
    self.date(grid).cmp(&other.date(grid))
  }

  fn set_selected(
    &self,
    grid: &mut TimeGrid,
    selected: bool
  ) {
    let Some(day) = grid.days.get_mut(self.day())
    else {
      return;
    };
    match *self {
      | ElementRef::TimeUnit { unit, .. } => {
        if let Some(u) = day.time_units.get_mut(unit) {
          u.selected = selected;
        }
      }
      | ElementRef::DayTop { .. } => {
        day.day_top.selected = selected;
      }
      | ElementRef::Day { .. } => {
        day.selected = selected;
      }
    }
  }
}

/// Selected run of elements between two
/// endpoints.
#[derive(Debug, Clone, Default)]
pub struct Selection {
  start:    Option<ElementRef>,
  end:      Option<ElementRef>,
  elements: Vec<ElementRef>,
  square:   Rect
}

impl Selection {
  #[must_use]
  pub fn start(&self) -> Option<ElementRef> {
    self.start
  }

  #[must_use]
  pub fn end(&self) -> Option<ElementRef> {
    self.end
  }

  /// Selected elements, earliest first.
  #[must_use]
  pub fn elements(&self) -> &[ElementRef] {
    &self.elements
  }

  /// Union of the selected elements' bounds.
  #[must_use]
  pub fn square(&self) -> Rect {
    self.square
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.elements.is_empty()
  }

  /// Sets both endpoints and returns the
  /// region to repaint.
  pub fn set_range(
    &mut self,
    grid: &mut TimeGrid,
    start: Option<ElementRef>,
    end: Option<ElementRef>
  ) -> Rect {
    self.start = start;
    self.end = end;
    self.update(grid)
  }

  pub fn set_start(
    &mut self,
    grid: &mut TimeGrid,
    start: Option<ElementRef>
  ) -> Rect {
    self.start = start;
    self.update(grid)
  }

  pub fn set_end(
    &mut self,
    grid: &mut TimeGrid,
    end: Option<ElementRef>
  ) -> Rect {
    self.end = end;
    self.update(grid)
  }

  pub fn clear(
    &mut self,
    grid: &mut TimeGrid
  ) -> Rect {
    self.set_range(grid, None, None)
  }

  /// Forgets everything without touching a
  /// grid. Used when the grid is replaced.
  pub(crate) fn reset(&mut self) {
    *self = Selection::default();
  }

  /// Recomputes the square after a layout
  /// pass moved element bounds.
  pub(crate) fn refresh_square(
    &mut self,
    grid: &TimeGrid
  ) {
    self.square = self
      .elements
      .iter()
      .filter_map(|e| e.bounds(grid))
      .fold(Rect::EMPTY, |acc, r| acc.union(&r));
  }

  #[tracing::instrument(skip(self, grid))]
  fn update(
    &mut self,
    grid: &mut TimeGrid
  ) -> Rect {
    let old_square = self.square;
    for element in self.elements.drain(..) {
      element.set_selected(grid, false);
    }

    self.elements = selected_run(
      grid, self.start, self.end
    );
    for element in &self.elements {
      element.set_selected(grid, true);
    }
    self.refresh_square(grid);

    debug!(
      selected = self.elements.len(),
      "selection updated"
    );
    old_square.union(&self.square)
  }
}

/// Elements between `start` and `end`
/// inclusive; empty for missing or mixed
/// endpoints.
fn selected_run(
  grid: &TimeGrid,
  start: Option<ElementRef>,
  end: Option<ElementRef>
) -> Vec<ElementRef> {
  let (Some(mut start), Some(mut end)) =
    (start, end)
  else {
    return vec![];
  };
  if start.date(grid).is_none()
    || end.date(grid).is_none()
  {
    return vec![];
  }
  if end.cmp_by_date(&start, grid).is_lt() {
    std::mem::swap(&mut start, &mut end);
  }

  match (start, end) {
    | (
      ElementRef::TimeUnit {
        day: first_day,
        unit: first_unit
      },
      ElementRef::TimeUnit {
        day: last_day,
        unit: last_unit
      }
    ) => {
      let mut run = vec![];
      for day in first_day..=last_day {
        let Some(d) = grid.day(day) else {
          break;
        };
        let from = if day == first_day {
          first_unit
        } else {
          0
        };
        let to = if day == last_day {
          last_unit
        } else {
          d.time_units().len().saturating_sub(1)
        };
        run.extend((from..=to).map(|unit| {
          ElementRef::TimeUnit { day, unit }
        }));
      }
      run
    }
    | (
      ElementRef::DayTop { day: first },
      ElementRef::DayTop { day: last }
    ) => {
      (first..=last)
        .map(|day| ElementRef::DayTop { day })
        .collect()
    }
    | (
      ElementRef::Day { day: first },
      ElementRef::Day { day: last }
    ) => {
      (first..=last)
        .map(|day| ElementRef::Day { day })
        .collect()
    }
    | _ => vec![]
  }
}
