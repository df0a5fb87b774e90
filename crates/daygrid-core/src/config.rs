use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::Context;
use chrono::Weekday;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::calendar::ItemPolicy;
use crate::datetime::parse_weekday_name;
use crate::error::ConfigError;
use crate::highlight::HighlightRange;
use crate::layout::LayoutMetrics;
use crate::scale::TimeScale;
use crate::view::{
  DEFAULT_MAX_FULL_DAYS,
  DEFAULT_MAX_VIEW_DAYS
};

/// Environment variable naming a config
/// file. `/dev/null` disables loading.
pub const CONFIG_ENV: &str = "DAYGRID_CONFIG";

#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
pub struct ViewConfig {
  #[serde(default = "default_max_view_days")]
  pub max_view_days:     u32,
  #[serde(default = "default_max_full_days")]
  pub max_full_days:     u32,
  #[serde(
    default = "default_first_day_of_week"
  )]
  pub first_day_of_week: String,
  #[serde(default = "default_time_scale")]
  pub time_scale:        u32
}

impl Default for ViewConfig {
  fn default() -> Self {
    Self {
      max_view_days:     default_max_view_days(
      ),
      max_full_days:     default_max_full_days(
      ),
      first_day_of_week:
        default_first_day_of_week(),
      time_scale:        default_time_scale()
    }
  }
}

impl ViewConfig {
  pub fn first_day_of_week(
    &self
  ) -> Result<Weekday, ConfigError> {
    parse_weekday_name(&self.first_day_of_week)
      .ok_or_else(|| {
        ConfigError::Weekday(
          self.first_day_of_week.clone()
        )
      })
  }
}

fn default_max_view_days() -> u32 {
  DEFAULT_MAX_VIEW_DAYS
}

fn default_max_full_days() -> u32 {
  DEFAULT_MAX_FULL_DAYS
}

fn default_first_day_of_week() -> String {
  "sunday".to_string()
}

fn default_time_scale() -> u32 {
  TimeScale::default().minutes()
}

/// One `[[highlight]]` table.
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
pub struct HighlightConfig {
  pub day:   String,
  pub start: String,
  pub end:   String
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Serialize,
  Deserialize
)]
pub struct Config {
  #[serde(default)]
  pub view:         ViewConfig,
  #[serde(default)]
  pub layout:       LayoutMetrics,
  #[serde(default)]
  pub items:        ItemPolicy,
  #[serde(default)]
  pub highlight:    Vec<HighlightConfig>,
  #[serde(skip)]
  pub loaded_files: Vec<PathBuf>
}

impl Config {
  /// Loads the first config found: the
  /// explicit path, `DAYGRID_CONFIG`, then
  /// the per-user config directory.
  #[tracing::instrument(skip(
    override_path
  ))]
  pub fn load(
    override_path: Option<&Path>
  ) -> anyhow::Result<Self> {
    let path = resolve_config_path(
      override_path
    );
    let cfg = if let Some(path) = path {
      info!(config = %path.display(), "loading config");
      Self::from_file(&path)?
    } else {
      info!(
        "no config file found; using \
         defaults"
      );
      Self::default()
    };
    cfg.validate()?;
    Ok(cfg)
  }

  #[tracing::instrument]
  pub fn from_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let path = expand_tilde(path);
    let text = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;
    let mut cfg = Self::parse(&text)
      .with_context(|| {
        format!(
          "invalid config {}",
          path.display()
        )
      })?;
    cfg.loaded_files.push(path);
    Ok(cfg)
  }

  pub fn parse(
    text: &str
  ) -> anyhow::Result<Self> {
    let mut cfg: Config =
      toml::from_str(text)
        .context("failed to parse TOML")?;
    cfg.sanitize();
    trace!(?cfg, "parsed config");
    Ok(cfg)
  }

  /// Applies `section.key=value` pairs. A
  /// leading `rc.` is ignored.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> Result<(), ConfigError>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.set(&key, v.trim())?;
    }
    self.sanitize();
    Ok(())
  }

  fn set(
    &mut self,
    key: &str,
    value: &str
  ) -> Result<(), ConfigError> {
    let invalid = || {
      ConfigError::InvalidValue {
        key:   key.to_string(),
        value: value.to_string()
      }
    };
    let int = || {
      value
        .parse::<i32>()
        .map_err(|_| invalid())
    };
    let uint = || {
      value
        .parse::<u32>()
        .map_err(|_| invalid())
    };
    let flag = || {
      parse_bool(value).ok_or_else(invalid)
    };

    let layout = &mut self.layout;
    let items = &mut self.items;
    match key {
      | "view.max_view_days" => {
        self.view.max_view_days = uint()?;
      }
      | "view.max_full_days" => {
        self.view.max_full_days = uint()?;
      }
      | "view.first_day_of_week" => {
        self.view.first_day_of_week =
          value.to_string();
      }
      | "view.time_scale" => {
        self.view.time_scale = uint()?;
      }
      | "layout.width" => layout.width = int()?,
      | "layout.height" => {
        layout.height = int()?;
      }
      | "layout.time_scale_width" => {
        layout.time_scale_width = int()?;
      }
      | "layout.hide_time_scale" => {
        layout.hide_time_scale = flag()?;
      }
      | "layout.day_header_height" => {
        layout.day_header_height = int()?;
      }
      | "layout.day_name_headers_height" => {
        layout.day_name_headers_height =
          int()?;
      }
      | "layout.week_header_width" => {
        layout.week_header_width = int()?;
      }
      | "layout.time_unit_height" => {
        layout.time_unit_height = int()?;
      }
      | "layout.standard_item_height" => {
        layout.standard_item_height = int()?;
      }
      | "layout.items_padding" => {
        layout.items_padding = int()?;
      }
      | "layout.day_top_min_height" => {
        layout.day_top_min_height = int()?;
      }
      | "layout.maximum_day_top_height" => {
        layout.maximum_day_top_height =
          int()?;
      }
      | "layout.day_top_height_fixed" => {
        layout.day_top_height_fixed = flag()?;
      }
      | "items.show_reminders_as_all_day" => {
        items.show_reminders_as_all_day =
          flag()?;
      }
      | "items.allow_new" => {
        items.allow_new = flag()?;
      }
      | "items.allow_item_edit" => {
        items.allow_item_edit = flag()?;
      }
      | "items.allow_item_resize" => {
        items.allow_item_resize = flag()?;
      }
      | other => {
        return Err(ConfigError::UnknownKey(
          other.to_string()
        ));
      }
    }
    Ok(())
  }

  /// Values that cannot be repaired.
  pub fn validate(
    &self
  ) -> Result<(), ConfigError> {
    TimeScale::from_minutes(
      self.view.time_scale
    )?;
    if self.view.max_view_days == 0
      || self.view.max_view_days % 7 != 0
    {
      return Err(ConfigError::MaxViewDays(
        self.view.max_view_days
      ));
    }
    if self.view.max_full_days == 0 {
      return Err(ConfigError::MaxFullDays(
        self.view.max_full_days
      ));
    }
    self.view.first_day_of_week()?;
    self.highlight_ranges()?;
    Ok(())
  }

  pub fn highlight_ranges(
    &self
  ) -> Result<Vec<HighlightRange>, ConfigError>
  {
    self
      .highlight
      .iter()
      .map(|h| {
        HighlightRange::parse(
          &h.day, &h.start, &h.end
        )
      })
      .collect()
  }

  /// Resets out-of-range sizes to their
  /// defaults.
  fn sanitize(&mut self) {
    let defaults = LayoutMetrics::default();
    let layout = &mut self.layout;

    let positive = [
      (
        "width",
        &mut layout.width,
        defaults.width
      ),
      (
        "height",
        &mut layout.height,
        defaults.height
      ),
      (
        "time_unit_height",
        &mut layout.time_unit_height,
        defaults.time_unit_height
      ),
      (
        "standard_item_height",
        &mut layout.standard_item_height,
        defaults.standard_item_height
      )
    ];
    for (name, value, default) in positive {
      if *value <= 0 {
        warn!(
          key = name,
          value = *value,
          default,
          "layout size must be positive; \
           using default"
        );
        *value = default;
      }
    }

    let non_negative = [
      (
        "time_scale_width",
        &mut layout.time_scale_width,
        defaults.time_scale_width
      ),
      (
        "day_header_height",
        &mut layout.day_header_height,
        defaults.day_header_height
      ),
      (
        "day_name_headers_height",
        &mut layout.day_name_headers_height,
        defaults.day_name_headers_height
      ),
      (
        "week_header_width",
        &mut layout.week_header_width,
        defaults.week_header_width
      ),
      (
        "items_padding",
        &mut layout.items_padding,
        defaults.items_padding
      ),
      (
        "day_top_min_height",
        &mut layout.day_top_min_height,
        defaults.day_top_min_height
      ),
      (
        "maximum_day_top_height",
        &mut layout.maximum_day_top_height,
        defaults.maximum_day_top_height
      )
    ];
    for (name, value, default) in non_negative
    {
      if *value < 0 {
        warn!(
          key = name,
          value = *value,
          default,
          "layout size is negative; using \
           default"
        );
        *value = default;
      }
    }
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Ok(env_path) =
    std::env::var(CONFIG_ENV)
  {
    if env_path == "/dev/null" {
      return None;
    }
    return Some(PathBuf::from(env_path));
  }

  let candidate = dirs::config_dir()?
    .join("daygrid")
    .join("daygrid.toml");
  candidate.exists().then_some(candidate)
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on" | "true" => {
      Some(true)
    }
    | "0" | "n" | "no" | "off" | "false" => {
      Some(false)
    }
    | _ => None
  }
}
