pub mod calendar;
pub mod classify;
pub mod cli;
pub mod config;
pub mod datetime;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod highlight;
pub mod input;
pub mod item;
pub mod layout;
pub mod render;
pub mod scale;
pub mod selection;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Duration;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use calendar::{
  Calendar,
  ItemPolicy
};
pub use error::ConfigError;
pub use item::{
  Item,
  ItemId,
  ItemRecord
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting daygrid"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg
    .apply_overrides(
      pre.rc_overrides.into_iter().chain(
        cli
          .rc_overrides
          .iter()
          .map(|kv| {
            (kv.key.clone(), kv.value.clone())
          })
      )
    )
    .context("invalid rc override")?;

  let today = datetime::local_today();
  let start = match cli.start.as_deref() {
    | Some(raw) => {
      datetime::parse_date_arg(raw, today)?
    }
    | None => today
  };
  let end = match cli.end.as_deref() {
    | Some(raw) => {
      datetime::parse_date_arg(raw, today)?
    }
    | None => start
  };

  let mut calendar =
    Calendar::from_config(&cfg, start, end)
      .context("invalid configuration")?;

  if let Some(minutes) = cli.scale {
    calendar
      .set_time_scale(minutes)
      .context("invalid --scale")?;
  }
  if cli.width.is_some()
    || cli.height.is_some()
  {
    let metrics = *calendar.metrics();
    calendar.set_layout_size(
      cli.width.unwrap_or(metrics.width),
      cli.height.unwrap_or(metrics.height)
    );
  }

  let source =
    cli::read_item_source(&cli.items)?;
  source.load_into(&mut calendar);

  if let [first, last] = cli.select.as_slice()
  {
    let from = cli::parse_select_point(first)?;
    let to = cli::parse_select_point(last)?;
    let start_el = calendar
      .element_at_date(from)
      .with_context(|| {
        format!("{from} is outside the view")
      })?;
    // An end on a unit boundary closes the
    // previous unit.
    let end_el = calendar
      .element_at_date(
        (to - Duration::seconds(1)).max(from)
      )
      .with_context(|| {
        format!("{to} is outside the view")
      })?;
    calendar.set_selection_range(
      Some(start_el),
      Some(end_el)
    );
  }

  let report =
    render::Report::from_calendar(&calendar);
  if cli.json {
    render::print_json(&report)?;
  } else {
    render::Renderer::for_stdout()
      .print_report(&report)?;
  }

  info!(
    items = calendar.items().len(),
    days = calendar.grid().days().len(),
    "done"
  );
  Ok(())
}
