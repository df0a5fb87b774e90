use std::sync::OnceLock;

use anyhow::anyhow;
use chrono::{
  Datelike,
  Duration,
  Local,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  Timelike,
  Weekday
};
use regex::Regex;

const SECONDS_PER_DAY: i64 = 86_400;

/// Midnight of `date`.
#[must_use]
pub fn day_start(
  date: NaiveDate
) -> NaiveDateTime {
  date.and_time(NaiveTime::default())
}

/// Last second of `date` (23:59:59).
#[must_use]
pub fn day_end(
  date: NaiveDate
) -> NaiveDateTime {
  day_start(date)
    + Duration::seconds(
      SECONDS_PER_DAY - 1
    )
}

#[must_use]
pub fn minutes_of_day(
  dt: NaiveDateTime
) -> u32 {
  dt.hour() * 60 + dt.minute()
}

/// Days between the most recent
/// `week_start` and `date` (0..=6).
#[must_use]
pub fn days_from_week_start(
  date: NaiveDate,
  week_start: Weekday
) -> u32 {
  let day_idx =
    date.weekday().num_days_from_monday();
  let start_idx =
    week_start.num_days_from_monday();
  (7 + day_idx - start_idx) % 7
}

#[must_use]
pub fn start_of_week(
  date: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let diff =
    days_from_week_start(date, week_start);
  date
    .checked_sub_signed(Duration::days(
      i64::from(diff)
    ))
    .unwrap_or(date)
}

/// Fractional days since 1899-12-30, the
/// OLE automation epoch.
#[must_use]
pub fn ole_day_count(
  dt: NaiveDateTime
) -> f64 {
  let epoch = NaiveDate::from_ymd_opt(
    1899, 12, 30
  )
  .map(day_start)
  .unwrap_or_default();
  let seconds =
    (dt - epoch).num_seconds() as f64;
  seconds / SECONDS_PER_DAY as f64
}

pub fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn clock_regex() -> Option<&'static Regex>
{
  static CLOCK_RE: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  CLOCK_RE
    .get_or_init(|| {
      Regex::new(
        r"(?i)^(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<ampm>[ap]m)?$",
      )
      .ok()
    })
    .as_ref()
}

/// Parses `HH:MM`, `H:MMam` or `H:MM pm`.
/// `24:00` is accepted as the end of a day
/// and maps to 23:59:59.
pub fn parse_clock_time(
  token: &str
) -> Option<NaiveTime> {
  let token = token.trim();
  if token == "24:00" {
    return NaiveTime::from_hms_opt(
      23, 59, 59
    );
  }

  let captures =
    clock_regex()?.captures(token)?;

  let raw_hour = captures
    .name("hour")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let minute = captures
    .name("minute")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  if minute > 59 {
    return None;
  }

  let hour = if let Some(ampm_match) =
    captures.name("ampm")
  {
    let ampm = ampm_match
      .as_str()
      .to_ascii_lowercase();
    if raw_hour == 0 || raw_hour > 12 {
      return None;
    }
    match ampm.as_str() {
      | "am" => {
        if raw_hour == 12 {
          0
        } else {
          raw_hour
        }
      }
      | "pm" => {
        if raw_hour == 12 {
          12
        } else {
          raw_hour + 12
        }
      }
      | _ => return None
    }
  } else {
    if raw_hour > 23 {
      return None;
    }
    raw_hour
  };

  NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Date arguments on the command line:
/// `today`, `tomorrow`, `yesterday` or
/// `YYYY-MM-DD`.
pub fn parse_date_arg(
  raw: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token =
    raw.trim().to_ascii_lowercase();
  match token.as_str() {
    | "today" => Ok(today),
    | "tomorrow" => Ok(today.succ_opt().unwrap_or(today)),
    | "yesterday" => Ok(today.pred_opt().unwrap_or(today)),
    | other => {
      NaiveDate::parse_from_str(
        other, "%Y-%m-%d"
      )
      .map_err(|err| {
        anyhow!(
          "invalid date {raw:?}: {err}"
        )
      })
    }
  }
}

#[must_use]
pub fn local_today() -> NaiveDate {
  Local::now().date_naive()
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    NaiveTime,
    Weekday
  };

  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn day_end_is_last_second() {
    let end = day_end(date(2026, 2, 17));
    assert_eq!(
      end.format("%Y-%m-%d %H:%M:%S")
        .to_string(),
      "2026-02-17 23:59:59"
    );
  }

  #[test]
  fn week_alignment_wraps() {
    // 2026-02-17 is a Tuesday.
    let tue = date(2026, 2, 17);
    assert_eq!(
      days_from_week_start(
        tue,
        Weekday::Mon
      ),
      1
    );
    assert_eq!(
      days_from_week_start(
        tue,
        Weekday::Wed
      ),
      6
    );
    assert_eq!(
      start_of_week(tue, Weekday::Sun),
      date(2026, 2, 15)
    );
  }

  #[test]
  fn parses_clock_times() {
    assert_eq!(
      parse_clock_time("08:30"),
      NaiveTime::from_hms_opt(8, 30, 0)
    );
    assert_eq!(
      parse_clock_time("3:23pm"),
      NaiveTime::from_hms_opt(15, 23, 0)
    );
    assert_eq!(
      parse_clock_time("24:00"),
      NaiveTime::from_hms_opt(23, 59, 59)
    );
    assert_eq!(
      parse_clock_time("25:00"),
      None
    );
  }

  #[test]
  fn parses_weekday_names() {
    assert_eq!(
      parse_weekday_name("Monday"),
      Some(Weekday::Mon)
    );
    assert_eq!(
      parse_weekday_name("thurs"),
      Some(Weekday::Thu)
    );
    assert_eq!(
      parse_weekday_name("someday"),
      None
    );
  }

  #[test]
  fn ole_epoch_is_zero() {
    assert_eq!(
      ole_day_count(day_start(date(
        1899, 12, 30
      ))),
      0.0
    );
    assert_eq!(
      ole_day_count(day_start(date(
        1900, 1, 1
      ))),
      2.0
    );
  }

  #[test]
  fn parses_relative_date_args() {
    let today = date(2026, 2, 17);
    assert_eq!(
      parse_date_arg("tomorrow", today)
        .expect("parse tomorrow"),
      date(2026, 2, 18)
    );
    assert_eq!(
      parse_date_arg("2026-03-01", today)
        .expect("parse iso date"),
      date(2026, 3, 1)
    );
    assert!(
      parse_date_arg("03/01", today)
        .is_err()
    );
  }
}
