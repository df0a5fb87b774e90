use thiserror::Error;

/// Configuration errors surface at the call
/// that set the bad value and are never
/// clamped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error(
    "unsupported time scale: {0} minutes \
     (expected 60, 30, 15, 10, 6 or 5)"
  )]
  UnsupportedScale(u32),

  #[error(
    "maximum view days must be a positive \
     multiple of 7, got {0}"
  )]
  MaxViewDays(u32),

  #[error(
    "maximum full days must be positive, \
     got {0}"
  )]
  MaxFullDays(u32),

  #[error("unknown weekday: {0}")]
  Weekday(String),

  #[error(
    "invalid highlight range {0}: {1}"
  )]
  Highlight(String, String),

  #[error("unknown config key: {0}")]
  UnknownKey(String),

  #[error(
    "invalid value for {key}: {value}"
  )]
  InvalidValue {
    key:   String,
    value: String
  }
}
