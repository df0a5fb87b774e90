use chrono::{
  Duration,
  NaiveDate,
  NaiveDateTime,
  Weekday
};
use serde::Serialize;
use tracing::warn;

use crate::datetime::{
  day_end,
  day_start
};
use crate::error::ConfigError;
use crate::item::date_intersects;

pub const DEFAULT_MAX_VIEW_DAYS: u32 = 35;
pub const DEFAULT_MAX_FULL_DAYS: u32 = 8;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize
)]
pub enum DaysMode {
  /// Whole weeks of date cells.
  Short,
  /// A few days over a time-of-day grid.
  Expanded
}

/// Date range currently materialised into
/// days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewWindow {
  start:             NaiveDateTime,
  end:               NaiveDateTime,
  max_view_days:     u32,
  max_full_days:     u32,
  first_day_of_week: Weekday
}

impl ViewWindow {
  pub fn new(
    start: NaiveDate,
    end: NaiveDate
  ) -> Self {
    Self {
      start:             day_start(start),
      end:               day_end(
        end.max(start)
      ),
      max_view_days:     DEFAULT_MAX_VIEW_DAYS,
      max_full_days:     DEFAULT_MAX_FULL_DAYS,
      first_day_of_week: Weekday::Sun
    }
  }

  #[must_use]
  pub fn start(&self) -> NaiveDateTime {
    self.start
  }

  #[must_use]
  pub fn end(&self) -> NaiveDateTime {
    self.end
  }

  #[must_use]
  pub fn max_view_days(&self) -> u32 {
    self.max_view_days
  }

  #[must_use]
  pub fn max_full_days(&self) -> u32 {
    self.max_full_days
  }

  #[must_use]
  pub fn first_day_of_week(&self) -> Weekday {
    self.first_day_of_week
  }

  /// Start is truncated to midnight and end
  /// extended to 23:59:59. Span limits are
  /// enforced by the next grid build.
  pub fn set_range(
    &mut self,
    start: NaiveDateTime,
    end: NaiveDateTime
  ) {
    self.start = day_start(start.date());
    self.end = day_end(end.date());
  }

  pub fn set_max_view_days(
    &mut self,
    days: u32
  ) -> Result<(), ConfigError> {
    if days == 0 || days % 7 != 0 {
      return Err(ConfigError::MaxViewDays(
        days
      ));
    }
    self.max_view_days = days;
    Ok(())
  }

  pub fn set_max_full_days(
    &mut self,
    days: u32
  ) -> Result<(), ConfigError> {
    if days == 0 {
      return Err(ConfigError::MaxFullDays(
        days
      ));
    }
    self.max_full_days = days;
    Ok(())
  }

  pub fn set_first_day_of_week(
    &mut self,
    day: Weekday
  ) {
    self.first_day_of_week = day;
  }

  /// Inclusive day count of the range.
  #[must_use]
  pub fn span_days(&self) -> i64 {
    (self.end.date() - self.start.date())
      .num_days()
      + 1
  }

  #[must_use]
  pub fn mode(&self) -> DaysMode {
    if self.span_days()
      > i64::from(self.max_full_days)
    {
      DaysMode::Short
    } else {
      DaysMode::Expanded
    }
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

  pub fn shift_days(&mut self, days: i64) {
    self.start += Duration::days(days);
    self.end += Duration::days(days);
  }

  /// Pulls `end` back inside
  /// `[1, max_view_days]` days. Returns true
  /// when the window changed, in which case
  /// the current build pass is abandoned.
  pub(crate) fn clamp_span(&mut self) -> bool {
    let span = self.span_days();
    let max = i64::from(self.max_view_days);
    if (1..=max).contains(&span) {
      return false;
    }

    let keep = span.clamp(1, max);
    let end_date = self.start.date()
      + Duration::days(keep - 1);
    warn!(
      span,
      max_view_days = self.max_view_days,
      end = %end_date,
      "view span out of range; clamping end"
    );
    self.end = day_end(end_date);
    true
  }
}
