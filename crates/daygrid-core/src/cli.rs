use std::ffi::OsString;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{ArgAction, Parser};
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::calendar::Calendar;
use crate::datetime::day_start;
use crate::item::ItemRecord;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "daygrid",
    version,
    about = "Lay out calendar items over a day grid and report the result"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// JSON file: an array of items, or an object with
    /// `appointments` and `reminders` arrays.
    #[arg(long = "items")]
    pub items: PathBuf,

    /// First day of the view (today, tomorrow, yesterday or YYYY-MM-DD).
    #[arg(long = "start")]
    pub start: Option<String>,

    /// Last day of the view; defaults to the start day.
    #[arg(long = "end")]
    pub end: Option<String>,

    /// Minutes per time unit.
    #[arg(long = "scale")]
    pub scale: Option<u32>,

    #[arg(long = "width")]
    pub width: Option<i32>,

    #[arg(long = "height")]
    pub height: Option<i32>,

    /// Select the elements between two points (YYYY-MM-DDTHH:MM).
    #[arg(long = "select", num_args = 2, value_names = ["START", "END"])]
    pub select: Vec<String>,

    #[arg(long = "json")]
    pub json: bool,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` overrides out of the argument list.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.")
            && let Some((k, v)) = rest.split_once('=')
        {
            debug!(key = %k, value = %v, "captured positional rc override");
            overrides.push((k.to_string(), v.to_string()));
            continue;
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

/// Contents of an `--items` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ItemSource {
    List(Vec<ItemRecord>),
    Sources {
        #[serde(default)]
        appointments: Vec<ItemRecord>,
        #[serde(default)]
        reminders: Vec<ItemRecord>,
    },
}

impl ItemSource {
    #[tracing::instrument(skip(self, calendar))]
    pub fn load_into(&self, calendar: &mut Calendar) {
        match self {
            ItemSource::List(records) => calendar.set_items(records),
            ItemSource::Sources {
                appointments,
                reminders,
            } => calendar.set_data_sources(appointments, reminders),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ItemSource::List(records) => records.len(),
            ItemSource::Sources {
                appointments,
                reminders,
            } => appointments.len() + reminders.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[tracing::instrument]
pub fn read_item_source(path: &Path) -> anyhow::Result<ItemSource> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let source: ItemSource = serde_json::from_str(&text)
        .with_context(|| format!("invalid items file {}", path.display()))?;
    info!(items = source.len(), file = %path.display(), "read items");
    Ok(source)
}

/// `YYYY-MM-DDTHH:MM`, `YYYY-MM-DD HH:MM` or a bare date (midnight).
pub fn parse_select_point(raw: &str) -> anyhow::Result<NaiveDateTime> {
    let raw = raw.trim();
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(at);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(day_start)
        .map_err(|err| anyhow!("invalid selection point {raw:?}: {err}"))
}
