use chrono::Duration;
use serde::{
  Deserialize,
  Serialize
};

use crate::error::ConfigError;

pub const MINUTES_PER_DAY: u32 = 1440;

/// Length of one time unit in the day body.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize
)]
#[serde(try_from = "u32", into = "u32")]
pub enum TimeScale {
  SixtyMinutes,
  #[default]
  ThirtyMinutes,
  FifteenMinutes,
  TenMinutes,
  SixMinutes,
  FiveMinutes
}

impl TimeScale {
  pub const ALL: [TimeScale; 6] = [
    TimeScale::SixtyMinutes,
    TimeScale::ThirtyMinutes,
    TimeScale::FifteenMinutes,
    TimeScale::TenMinutes,
    TimeScale::SixMinutes,
    TimeScale::FiveMinutes
  ];

  /// Accepts the six supported values.
  pub fn from_minutes(
    minutes: u32
  ) -> Result<Self, ConfigError> {
    match minutes {
      | 60 => Ok(Self::SixtyMinutes),
      | 30 => Ok(Self::ThirtyMinutes),
      | 15 => Ok(Self::FifteenMinutes),
      | 10 => Ok(Self::TenMinutes),
      | 6 => Ok(Self::SixMinutes),
      | 5 => Ok(Self::FiveMinutes),
      | other => {
        Err(ConfigError::UnsupportedScale(
          other
        ))
      }
    }
  }

  #[must_use]
  pub fn minutes(self) -> u32 {
    match self {
      | Self::SixtyMinutes => 60,
      | Self::ThirtyMinutes => 30,
      | Self::FifteenMinutes => 15,
      | Self::TenMinutes => 10,
      | Self::SixMinutes => 6,
      | Self::FiveMinutes => 5
    }
  }

  #[must_use]
  pub fn units_per_day(self) -> usize {
    (MINUTES_PER_DAY / self.minutes())
      as usize
  }

  #[must_use]
  pub fn duration(self) -> Duration {
    Duration::minutes(i64::from(
      self.minutes()
    ))
  }
}

impl TryFrom<u32> for TimeScale {
  type Error = ConfigError;

  fn try_from(
    minutes: u32
  ) -> Result<Self, Self::Error> {
    Self::from_minutes(minutes)
  }
}

impl From<TimeScale> for u32 {
  fn from(scale: TimeScale) -> Self {
    scale.minutes()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_scale_divides_the_day() {
    for scale in TimeScale::ALL {
      assert_eq!(
        scale.units_per_day() as u32
          * scale.minutes(),
        MINUTES_PER_DAY
      );
    }
  }

  #[test]
  fn rejects_unsupported_minutes() {
    assert_eq!(
      TimeScale::from_minutes(20),
      Err(ConfigError::UnsupportedScale(
        20
      ))
    );
    assert_eq!(
      TimeScale::from_minutes(0),
      Err(ConfigError::UnsupportedScale(0))
    );
  }
}
