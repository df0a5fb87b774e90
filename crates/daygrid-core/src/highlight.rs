use chrono::{
  Datelike,
  NaiveDateTime,
  NaiveTime,
  Weekday
};
use serde::Serialize;

use crate::datetime::{
  parse_clock_time,
  parse_weekday_name
};
use crate::error::ConfigError;

/// Time-of-day span on one weekday whose
/// time units are drawn highlighted
/// (working hours).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize
)]
pub struct HighlightRange {
  pub day_of_week: Weekday,
  pub start_time:  NaiveTime,
  pub end_time:    NaiveTime
}

impl HighlightRange {
  pub fn new(
    day_of_week: Weekday,
    start_time: NaiveTime,
    end_time: NaiveTime
  ) -> Result<Self, ConfigError> {
    if end_time <= start_time {
      return Err(ConfigError::Highlight(
        format!(
          "{day_of_week} {start_time}-{end_time}"
        ),
        "end must be after start"
          .to_string()
      ));
    }
    Ok(Self {
      day_of_week,
      start_time,
      end_time
    })
  }

  pub fn parse(
    day: &str,
    start: &str,
    end: &str
  ) -> Result<Self, ConfigError> {
    let label =
      format!("{day} {start}-{end}");
    let day_of_week =
      parse_weekday_name(day).ok_or_else(
        || {
          ConfigError::Weekday(
            day.to_string()
          )
        }
      )?;
    let start_time = parse_clock_time(start)
      .ok_or_else(|| {
        ConfigError::Highlight(
          label.clone(),
          format!("bad start time {start:?}")
        )
      })?;
    let end_time = parse_clock_time(end)
      .ok_or_else(|| {
        ConfigError::Highlight(
          label.clone(),
          format!("bad end time {end:?}")
        )
      })?;
    Self::new(day_of_week, start_time, end_time)
  }

  #[must_use]
  pub fn contains(
    &self,
    at: NaiveDateTime
  ) -> bool {
    at.weekday() == self.day_of_week
      && at.time() >= self.start_time
      && at.time() < self.end_time
  }
}

#[must_use]
pub fn is_highlighted(
  ranges: &[HighlightRange],
  at: NaiveDateTime
) -> bool {
  ranges.iter().any(|r| r.contains(at))
}

/// Monday to Friday between `start` and
/// `end`.
pub fn work_week(
  start: NaiveTime,
  end: NaiveTime
) -> Result<Vec<HighlightRange>, ConfigError>
{
  [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri
  ]
  .into_iter()
  .map(|day| HighlightRange::new(day, start, end))
  .collect()
}
