use chrono::{
  Duration,
  NaiveDate,
  NaiveDateTime,
  Weekday
};
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  info,
  trace
};

use crate::classify;
use crate::config::Config;
use crate::datetime::day_start;
use crate::error::ConfigError;
use crate::geometry::{
  Point,
  Rect
};
use crate::grid::TimeGrid;
use crate::highlight::HighlightRange;
use crate::hit_test::{
  Hit,
  hit_test
};
use crate::input::Interaction;
use crate::item::{
  Item,
  ItemId,
  ItemRecord,
  item_order
};
use crate::layout::{
  self,
  LayoutMetrics,
  LayoutPass
};
use crate::scale::TimeScale;
use crate::selection::{
  ElementRef,
  Selection
};
use crate::view::{
  DaysMode,
  ViewWindow
};

/// What the user may do to items through
/// the interaction layer.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize
)]
#[serde(default)]
pub struct ItemPolicy {
  pub show_reminders_as_all_day: bool,
  pub allow_new:                 bool,
  pub allow_item_edit:           bool,
  pub allow_item_resize:         bool
}

impl Default for ItemPolicy {
  fn default() -> Self {
    Self {
      show_reminders_as_all_day: true,
      allow_new:                 true,
      allow_item_edit:           true,
      allow_item_resize:         true
    }
  }
}

/// Engine state: view window, grid, item
/// arena and selection.
#[derive(Debug, Clone)]
pub struct Calendar {
  view:                   ViewWindow,
  scale:                  TimeScale,
  highlights:             Vec<HighlightRange>,
  metrics:                LayoutMetrics,
  policy:                 ItemPolicy,
  pub(crate) grid:        TimeGrid,
  pub(crate) items:       Vec<Item>,
  pub(crate) selection:   Selection,
  time_units_offset:      i32,
  pass:                   LayoutPass,
  pub(crate) interaction: Interaction
}

fn build_grid(
  view: &mut ViewWindow,
  scale: TimeScale,
  highlights: &[HighlightRange]
) -> TimeGrid {
  // A clamped pass leaves a valid span for
  // the next one.
  loop {
    if let Some(grid) =
      TimeGrid::build(view, scale, highlights)
    {
      return grid;
    }
  }
}

impl Calendar {
  pub fn new(
    start: NaiveDate,
    end: NaiveDate
  ) -> Self {
    Self::assemble(
      ViewWindow::new(start, end),
      TimeScale::default(),
      vec![],
      LayoutMetrics::default(),
      ItemPolicy::default()
    )
  }

  #[tracing::instrument(skip(config))]
  pub fn from_config(
    config: &Config,
    start: NaiveDate,
    end: NaiveDate
  ) -> Result<Self, ConfigError> {
    let mut view = ViewWindow::new(start, end);
    view.set_max_view_days(
      config.view.max_view_days
    )?;
    view.set_max_full_days(
      config.view.max_full_days
    )?;
    view.set_first_day_of_week(
      config.view.first_day_of_week()?
    );
    let scale = TimeScale::from_minutes(
      config.view.time_scale
    )?;
    let highlights = config.highlight_ranges()?;

    info!(
      scale = scale.minutes(),
      highlights = highlights.len(),
      "calendar configured"
    );
    Ok(Self::assemble(
      view,
      scale,
      highlights,
      config.layout,
      config.items
    ))
  }

  fn assemble(
    mut view: ViewWindow,
    scale: TimeScale,
    highlights: Vec<HighlightRange>,
    metrics: LayoutMetrics,
    policy: ItemPolicy
  ) -> Self {
    let grid =
      build_grid(&mut view, scale, &highlights);
    let mut calendar = Self {
      view,
      scale,
      highlights,
      metrics,
      policy,
      grid,
      items: vec![],
      selection: Selection::default(),
      time_units_offset: 0,
      pass: LayoutPass::default(),
      interaction: Interaction::default()
    };
    calendar.relayout();
    calendar
  }

  #[must_use]
  pub fn view(&self) -> &ViewWindow {
    &self.view
  }

  #[must_use]
  pub fn scale(&self) -> TimeScale {
    self.scale
  }

  #[must_use]
  pub fn mode(&self) -> DaysMode {
    self.grid.mode()
  }

  #[must_use]
  pub fn grid(&self) -> &TimeGrid {
    &self.grid
  }

  #[must_use]
  pub fn items(&self) -> &[Item] {
    &self.items
  }

  #[must_use]
  pub fn item(
    &self,
    id: ItemId
  ) -> Option<&Item> {
    self.items.get(id.0)
  }

  #[must_use]
  pub fn selection(&self) -> &Selection {
    &self.selection
  }

  #[must_use]
  pub fn metrics(&self) -> &LayoutMetrics {
    &self.metrics
  }

  #[must_use]
  pub fn policy(&self) -> &ItemPolicy {
    &self.policy
  }

  #[must_use]
  pub fn highlights(&self) -> &[HighlightRange] {
    &self.highlights
  }

  #[must_use]
  pub fn time_units_offset(&self) -> i32 {
    self.time_units_offset
  }

  #[must_use]
  pub fn day_top_height(&self) -> i32 {
    self.pass.day_top_height
  }

  /// Time units that fit in a day's body.
  #[must_use]
  pub fn visible_time_units(&self) -> usize {
    self.pass.visible_time_units
  }

  #[must_use]
  pub fn hit_test(
    &self,
    p: Point,
    ignore_items: bool
  ) -> Option<Hit> {
    hit_test(&self.grid, &self.items, p, ignore_items)
  }

  /// Element holding `at`: its time unit
  /// in Expanded mode, its day in Short.
  #[must_use]
  pub fn element_at_date(
    &self,
    at: NaiveDateTime
  ) -> Option<ElementRef> {
    match self.grid.mode() {
      | DaysMode::Expanded => {
        self.grid.time_unit_at(at).map(
          |(day, unit)| {
            ElementRef::TimeUnit { day, unit }
          }
        )
      }
      | DaysMode::Short => {
        self
          .grid
          .find_day(at.date())
          .map(|day| ElementRef::Day { day })
      }
    }
  }

  pub fn set_view_range(
    &mut self,
    start: NaiveDate,
    end: NaiveDate
  ) {
    self
      .view
      .set_range(day_start(start), day_start(end));
    self.rebuild();
  }

  pub fn set_time_scale(
    &mut self,
    minutes: u32
  ) -> Result<(), ConfigError> {
    let scale = TimeScale::from_minutes(minutes)?;
    if scale != self.scale {
      self.scale = scale;
      self.time_units_offset = 0;
      self.rebuild();
    }
    Ok(())
  }

  pub fn set_max_view_days(
    &mut self,
    days: u32
  ) -> Result<(), ConfigError> {
    self.view.set_max_view_days(days)?;
    self.rebuild();
    Ok(())
  }

  pub fn set_max_full_days(
    &mut self,
    days: u32
  ) -> Result<(), ConfigError> {
    self.view.set_max_full_days(days)?;
    self.rebuild();
    Ok(())
  }

  pub fn set_first_day_of_week(
    &mut self,
    day: Weekday
  ) {
    self.view.set_first_day_of_week(day);
    self.rebuild();
  }

  pub fn set_highlight_ranges(
    &mut self,
    ranges: Vec<HighlightRange>
  ) {
    self.highlights = ranges;
    self.grid.apply_highlights(&self.highlights);
  }

  pub fn set_policy(
    &mut self,
    policy: ItemPolicy
  ) {
    self.policy = policy;
  }

  pub fn set_layout_metrics(
    &mut self,
    metrics: LayoutMetrics
  ) {
    self.metrics = metrics;
    self.relayout();
  }

  pub fn set_layout_size(
    &mut self,
    width: i32,
    height: i32
  ) {
    self.metrics.width = width;
    self.metrics.height = height;
    self.relayout();
  }

  pub fn set_day_top_height_fixed(
    &mut self,
    fixed: bool
  ) {
    self.metrics.day_top_height_fixed = fixed;
    self.relayout();
  }

  pub fn set_maximum_day_top_height(
    &mut self,
    height: i32
  ) {
    self.metrics.maximum_day_top_height = height;
    self.relayout();
  }

  /// Replaces the item set. Duplicate
  /// identities keep their first record.
  #[tracing::instrument(skip(self, records))]
  pub fn set_items(
    &mut self,
    records: &[ItemRecord]
  ) {
    let items = records
      .iter()
      .map(Item::from_record)
      .collect();
    self.load_items(items);
  }

  /// Appointments and reminders from two
  /// sources; reminders become all-day items
  /// when the policy says so.
  #[tracing::instrument(skip(
    self,
    appointments,
    reminders
  ))]
  pub fn set_data_sources(
    &mut self,
    appointments: &[ItemRecord],
    reminders: &[ItemRecord]
  ) {
    let forced =
      self.policy.show_reminders_as_all_day;
    let items = appointments
      .iter()
      .map(Item::from_record)
      .chain(reminders.iter().map(|record| {
        let mut item = Item::from_record(record);
        item.all_day |= forced;
        item
      }))
      .collect();
    self.load_items(items);
  }

  fn load_items(&mut self, items: Vec<Item>) {
    let total = items.len();
    let mut unique: Vec<Item> =
      Vec::with_capacity(total);
    for item in items {
      let identity = item.identity();
      if unique.iter().any(|u| u.identity() == identity)
      {
        trace!(%identity, "dropping duplicate item");
        continue;
      }
      unique.push(item);
    }
    unique.sort_by(item_order);

    debug!(
      total,
      unique = unique.len(),
      "loaded items"
    );
    self.items = unique;
    self.interaction = Interaction::default();
    self.reclassify();
  }

  /// Moves an item. Reversed bounds are
  /// swapped. Unknown ids are ignored.
  pub fn set_item_dates(
    &mut self,
    id: ItemId,
    start: NaiveDateTime,
    end: NaiveDateTime
  ) -> bool {
    if id.0 >= self.items.len() {
      return false;
    }
    classify::detach(
      &mut self.grid,
      &mut self.items,
      id
    );
    self.items[id.0].set_dates(start, end);
    classify::attach(
      &mut self.grid,
      &mut self.items,
      id
    );
    self.relayout();
    true
  }

  pub fn set_selection_range(
    &mut self,
    start: Option<ElementRef>,
    end: Option<ElementRef>
  ) -> Rect {
    self.selection.set_range(
      &mut self.grid,
      start,
      end
    )
  }

  pub fn set_selection_start(
    &mut self,
    start: Option<ElementRef>
  ) -> Rect {
    self.selection.set_start(&mut self.grid, start)
  }

  pub fn set_selection_end(
    &mut self,
    end: Option<ElementRef>
  ) -> Rect {
    self.selection.set_end(&mut self.grid, end)
  }

  pub fn clear_selection(&mut self) -> Rect {
    self.selection.clear(&mut self.grid)
  }

  pub fn page_overflow(
    &mut self,
    day: usize,
    delta: i64
  ) -> bool {
    let paged = layout::page_overflow(
      &mut self.grid,
      day,
      delta
    );
    if paged {
      self.relayout();
    }
    paged
  }

  /// Expanded: scrolls the time units by
  /// one step per `delta` sign. Short:
  /// shifts the view by a week.
  pub fn scroll_view(
    &mut self,
    delta: i32
  ) -> bool {
    if delta == 0 {
      return false;
    }
    match self.grid.mode() {
      | DaysMode::Expanded => {
        let offset = (self.time_units_offset
          - delta.signum())
        .clamp(self.min_offset(), 0);
        if offset == self.time_units_offset {
          return false;
        }
        self.time_units_offset = offset;
        self.relayout();
        true
      }
      | DaysMode::Short => {
        self
          .view
          .shift_days(7 * i64::from(delta.signum()));
        self.rebuild();
        true
      }
    }
  }

  /// Scrolls so time unit `unit` is inside
  /// the visible body.
  pub fn ensure_visible(
    &mut self,
    unit: usize
  ) -> bool {
    if self.grid.mode() != DaysMode::Expanded {
      return false;
    }
    let visible = self.pass.visible_time_units;
    let unit = i32::try_from(unit).unwrap_or(i32::MAX);
    let first = -self.time_units_offset;
    let span = i32::try_from(visible).unwrap_or(0);

    let offset = if unit < first {
      -unit
    } else if unit >= first + span {
      -(unit + 1 - span)
    } else {
      return false;
    };
    let offset = offset.clamp(self.min_offset(), 0);
    if offset == self.time_units_offset {
      return false;
    }
    self.time_units_offset = offset;
    self.relayout();
    true
  }

  /// New item covering the current selection.
  pub fn create_item_on_selection(
    &mut self,
    text: impl Into<String>
  ) -> Option<ItemId> {
    if !self.policy.allow_new {
      return None;
    }
    let (start, end) = self.selection_dates()?;

    let mut item = Item::new(start, end, text);
    item.appointment_id = self
      .items
      .iter()
      .map(|i| i.appointment_id)
      .max()
      .map_or(1, |max| max + 1);

    self.clear_item_selection();
    item.selected = true;
    self.items.push(item);
    let id = ItemId(self.items.len() - 1);
    classify::attach(
      &mut self.grid,
      &mut self.items,
      id
    );
    self.relayout();
    debug!(?id, %start, %end, "created item on selection");
    Some(id)
  }

  /// Removes the selected items and returns
  /// them. Remaining items are renumbered.
  pub fn delete_selected_items(
    &mut self
  ) -> Vec<Item> {
    let (removed, kept): (Vec<Item>, Vec<Item>) =
      std::mem::take(&mut self.items)
        .into_iter()
        .partition(|item| item.selected);
    self.items = kept;
    if !removed.is_empty() {
      debug!(
        removed = removed.len(),
        "deleted selected items"
      );
      self.interaction = Interaction::default();
      self.reclassify();
    }
    removed
  }

  /// Time covered by the selection: a time
  /// unit ends one scale step after its
  /// start, a day or DayTop at 23:59:59.
  #[must_use]
  pub fn selection_dates(
    &self
  ) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let first = self.selection.elements().first()?;
    let last = self.selection.elements().last()?;
    let start = first.date(&self.grid)?;
    let last_date = last.date(&self.grid)?;
    let end = match last {
      | ElementRef::TimeUnit { .. } => {
        last_date + self.scale.duration()
      }
      | ElementRef::DayTop { .. }
      | ElementRef::Day { .. } => {
        last_date + Duration::seconds(86_399)
      }
    };
    Some((start, end))
  }

  #[must_use]
  pub fn selected_items(&self) -> Vec<ItemId> {
    self
      .items
      .iter()
      .enumerate()
      .filter(|(_, item)| item.selected)
      .map(|(idx, _)| ItemId(idx))
      .collect()
  }

  #[must_use]
  pub fn item_by_appointment_id(
    &self,
    appointment_id: i64
  ) -> Option<ItemId> {
    self
      .items
      .iter()
      .position(|item| {
        item.appointment_id == appointment_id
      })
      .map(ItemId)
  }

  /// Selects `id`, keeping the other
  /// selected items when `additive`.
  pub fn select_item(
    &mut self,
    id: ItemId,
    additive: bool
  ) -> bool {
    if id.0 >= self.items.len() {
      return false;
    }
    if !additive {
      self.clear_item_selection();
    }
    self.items[id.0].selected = true;
    true
  }

  pub fn clear_item_selection(&mut self) {
    for item in &mut self.items {
      item.selected = false;
    }
  }

  pub(crate) fn item_mut(
    &mut self,
    id: ItemId
  ) -> Option<&mut Item> {
    self.items.get_mut(id.0)
  }

  fn min_offset(&self) -> i32 {
    let units = i32::try_from(
      self.scale.units_per_day()
    )
    .unwrap_or(i32::MAX);
    let visible = i32::try_from(
      self.pass.visible_time_units
    )
    .unwrap_or(0);
    -(units - visible).max(0)
  }

  /// Builds a fresh grid for the current
  /// view and swaps it in.
  #[tracing::instrument(skip(self))]
  fn rebuild(&mut self) {
    self.grid = build_grid(
      &mut self.view,
      self.scale,
      &self.highlights
    );
    self.selection.reset();
    self.interaction = Interaction::default();
    self.reclassify();
  }

  fn reclassify(&mut self) {
    classify::detach_all(
      &mut self.grid,
      &mut self.items
    );
    classify::attach_all(
      &mut self.grid,
      &mut self.items
    );
    self.relayout();
  }

  fn relayout(&mut self) {
    for day in &mut self.grid.days {
      if day.item_index >= day.contained.len() {
        day.item_index = 0;
      }
    }
    self.pass = layout::layout(
      &mut self.grid,
      &mut self.items,
      &self.metrics,
      self.time_units_offset
    );
    let clamped = self
      .time_units_offset
      .clamp(self.min_offset(), 0);
    if clamped != self.time_units_offset {
      self.time_units_offset = clamped;
      self.pass = layout::layout(
        &mut self.grid,
        &mut self.items,
        &self.metrics,
        self.time_units_offset
      );
    }
    self.selection.refresh_square(&self.grid);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d)
      .expect("valid date")
  }

  fn at(
    d: u32,
    h: u32,
    m: u32
  ) -> NaiveDateTime {
    date(d)
      .and_hms_opt(h, m, 0)
      .expect("valid time")
  }

  fn record(
    id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime
  ) -> ItemRecord {
    ItemRecord {
      id,
      tag_id: 0,
      resource_id: 0,
      start,
      end,
      all_day: false,
      text: format!("item {id}"),
      background: None,
      foreground: None,
      image: None,
      locked: false
    }
  }

  #[test]
  fn duplicates_are_dropped_and_items_sorted() {
    let mut calendar = Calendar::new(date(2), date(3));
    calendar.set_items(&[
      record(1, at(2, 8, 0), at(2, 9, 0)),
      record(2, at(2, 10, 0), at(2, 11, 0)),
      record(1, at(2, 8, 0), at(2, 9, 0))
    ]);
    assert_eq!(calendar.items().len(), 2);
    assert_eq!(calendar.items()[0].appointment_id, 2);
  }

  #[test]
  fn reminders_become_all_day() {
    let mut calendar = Calendar::new(date(2), date(3));
    calendar.set_data_sources(
      &[record(1, at(2, 8, 0), at(2, 9, 0))],
      &[record(2, at(2, 12, 0), at(2, 12, 0))]
    );
    let reminder = calendar
      .item_by_appointment_id(2)
      .and_then(|id| calendar.item(id))
      .expect("reminder loaded");
    assert!(reminder.all_day);
    assert_eq!(reminder.passing_tops(), &[0]);
  }

  #[test]
  fn bad_settings_are_errors() {
    let mut calendar = Calendar::new(date(2), date(3));
    assert_eq!(
      calendar.set_time_scale(7),
      Err(ConfigError::UnsupportedScale(7))
    );
    assert_eq!(
      calendar.set_max_view_days(30),
      Err(ConfigError::MaxViewDays(30))
    );
    assert_eq!(calendar.scale(), TimeScale::ThirtyMinutes);
  }

  #[test]
  fn dates_map_to_elements_per_mode() {
    let calendar = Calendar::new(date(2), date(3));
    assert_eq!(
      calendar.element_at_date(at(3, 9, 45)),
      Some(ElementRef::TimeUnit { day: 1, unit: 19 })
    );
    assert_eq!(
      calendar.element_at_date(at(9, 9, 0)),
      None
    );

    let short = Calendar::new(date(2), date(20));
    assert_eq!(short.mode(), DaysMode::Short);
    let day = short
      .grid()
      .find_day(date(10))
      .expect("day in view");
    assert_eq!(
      short.element_at_date(at(10, 15, 0)),
      Some(ElementRef::Day { day })
    );
  }

  #[test]
  fn scale_change_rebuilds_units() {
    let mut calendar = Calendar::new(date(2), date(3));
    calendar
      .set_time_scale(15)
      .expect("supported scale");
    assert_eq!(calendar.grid().days()[0].time_units().len(), 96);
  }

  #[test]
  fn view_change_clears_selection() {
    let mut calendar = Calendar::new(date(2), date(3));
    calendar.set_selection_range(
      Some(ElementRef::TimeUnit { day: 0, unit: 10 }),
      Some(ElementRef::TimeUnit { day: 0, unit: 12 })
    );
    assert_eq!(calendar.selection().elements().len(), 3);

    calendar.set_view_range(date(9), date(10));
    assert!(calendar.selection().is_empty());
    assert_eq!(calendar.grid().first_date(), Some(date(9)));
  }

  #[test]
  fn moving_an_item_reclassifies_it() {
    let mut calendar = Calendar::new(date(2), date(3));
    calendar.set_items(&[record(1, at(2, 8, 0), at(2, 9, 0))]);
    let id = ItemId(0);
    assert!(calendar.set_item_dates(id, at(3, 14, 0), at(3, 13, 0)));

    let item = calendar.item(id).expect("item exists");
    assert_eq!(item.start(), at(3, 13, 0));
    assert_eq!(item.passing_units(), &[(1, 26), (1, 27)]);
    assert!(calendar.grid().days()[0].contained_items().is_empty());
    assert!(!calendar.set_item_dates(ItemId(9), at(3, 1, 0), at(3, 2, 0)));
  }

  #[test]
  fn create_and_delete_on_selection() {
    let mut calendar = Calendar::new(date(2), date(3));
    calendar.set_selection_range(
      Some(ElementRef::TimeUnit { day: 1, unit: 20 }),
      Some(ElementRef::TimeUnit { day: 1, unit: 21 })
    );
    let id = calendar
      .create_item_on_selection("lunch")
      .expect("item created");
    let item = calendar.item(id).expect("item exists");
    assert_eq!(item.start(), at(3, 10, 0));
    assert_eq!(item.end(), at(3, 11, 0));
    assert_eq!(calendar.selected_items(), vec![id]);

    let removed = calendar.delete_selected_items();
    assert_eq!(removed.len(), 1);
    assert!(calendar.items().is_empty());
    assert!(calendar.grid().days()[1].contained_items().is_empty());
  }

  #[test]
  fn day_selection_creates_whole_day_item() {
    let mut calendar = Calendar::new(date(2), date(4));
    calendar.set_selection_range(
      Some(ElementRef::DayTop { day: 0 }),
      Some(ElementRef::DayTop { day: 1 })
    );
    let id = calendar
      .create_item_on_selection("offsite")
      .expect("item created");
    let item = calendar.item(id).expect("item exists");
    assert_eq!(item.end(), at(3, 23, 59) + Duration::seconds(59));
    assert!(item.is_on_day_top());
    assert_eq!(item.passing_tops(), &[0, 1]);
  }

  #[test]
  fn scrolling_stays_in_range() {
    let mut calendar = Calendar::new(date(2), date(3));
    let metrics = LayoutMetrics {
      height: 19 + 19 + 10 * 15,
      ..LayoutMetrics::default()
    };
    calendar.set_layout_metrics(metrics);
    assert_eq!(calendar.visible_time_units(), 10);

    assert!(!calendar.scroll_view(-1));
    assert!(calendar.scroll_view(1));
    assert_eq!(calendar.time_units_offset(), -1);

    assert!(calendar.ensure_visible(47));
    assert_eq!(calendar.time_units_offset(), -38);
    assert!(!calendar.scroll_view(1));

    assert!(calendar.ensure_visible(0));
    assert_eq!(calendar.time_units_offset(), 0);
  }

  #[test]
  fn short_mode_scroll_moves_a_week() {
    let mut calendar = Calendar::new(date(2), date(15));
    assert_eq!(calendar.mode(), DaysMode::Short);
    assert!(calendar.scroll_view(1));
    assert_eq!(calendar.view().start(), day_start(date(9)));
  }
}
