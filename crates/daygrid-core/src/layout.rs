use chrono::Timelike;
use serde::{
  Deserialize,
  Serialize
};
use tracing::{
  debug,
  trace
};

use crate::geometry::Rect;
use crate::grid::{
  Day,
  TimeGrid
};
use crate::item::{
  Item,
  ItemId,
  item_order
};
use crate::view::DaysMode;

/// Side length of the overflow page buttons
/// drawn in a Short-mode day cell.
pub const OVERFLOW_BUTTON_SIZE: i32 = 12;

/// Renderer geometry the engine lays out
/// against.
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
pub struct LayoutMetrics {
  pub width:                   i32,
  pub height:                  i32,
  pub time_scale_width:        i32,
  pub hide_time_scale:         bool,
  pub day_header_height:       i32,
  pub day_name_headers_height: i32,
  pub week_header_width:       i32,
  pub time_unit_height:        i32,
  pub standard_item_height:    i32,
  pub items_padding:           i32,
  pub day_top_min_height:      i32,
  pub maximum_day_top_height:  i32,
  pub day_top_height_fixed:    bool
}

impl Default for LayoutMetrics {
  fn default() -> Self {
    Self {
      width:                   800,
      height:                  600,
      time_scale_width:        60,
      hide_time_scale:         false,
      day_header_height:       19,
      day_name_headers_height: 19,
      week_header_width:       19,
      time_unit_height:        15,
      standard_item_height:    19,
      items_padding:           5,
      day_top_min_height:      19,
      maximum_day_top_height:  29,
      day_top_height_fixed:    false
    }
  }
}

impl LayoutMetrics {
  #[must_use]
  pub fn time_scale_left(&self) -> i32 {
    if self.hide_time_scale {
      0
    } else {
      self.time_scale_width
    }
  }

  fn rows_in(&self, height: i32) -> usize {
    if self.standard_item_height <= 0 {
      return 0;
    }
    usize::try_from(
      height / self.standard_item_height
    )
    .unwrap_or(0)
  }
}

/// Values a layout pass hands back to the
/// calendar.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub struct LayoutPass {
  pub day_top_height:     i32,
  pub body_top:           i32,
  pub visible_time_units: usize
}

/// `start + total * part / parts`, so
/// consecutive cells share edges exactly.
fn split(
  start: i32,
  total: i32,
  part: usize,
  parts: usize
) -> i32 {
  if parts == 0 {
    return start;
  }
  let part = i64::try_from(part).unwrap_or(0);
  let parts =
    i64::try_from(parts).unwrap_or(1);
  start
    + i32::try_from(
      i64::from(total) * part / parts
    )
    .unwrap_or(0)
}

/// Lays out every attached item. Items must
/// already be classified against `grid`.
#[tracing::instrument(skip(
  grid, items, metrics
))]
pub fn layout(
  grid: &mut TimeGrid,
  items: &mut [Item],
  metrics: &LayoutMetrics,
  time_units_offset: i32
) -> LayoutPass {
  for item in items.iter_mut() {
    item.clear_bounds();
  }
  let pass = match grid.mode() {
    | DaysMode::Expanded => {
      layout_expanded(
        grid,
        items,
        metrics,
        time_units_offset
      )
    }
    | DaysMode::Short => {
      layout_short(grid, items, metrics)
    }
  };
  debug!(
    mode = ?grid.mode(),
    on_view = items
      .iter()
      .filter(|i| i.is_on_view())
      .count(),
    day_top_height = pass.day_top_height,
    visible_time_units = pass.visible_time_units,
    "layout pass"
  );
  pass
}

fn layout_expanded(
  grid: &mut TimeGrid,
  items: &mut [Item],
  metrics: &LayoutMetrics,
  time_units_offset: i32
) -> LayoutPass {
  let left = metrics.time_scale_left();
  let days = grid.days.len();
  let header = metrics.day_header_height;

  let lane_items = lane_candidates(grid, items, |day| {
    day.day_top.passing.clone()
  });
  let rows = pack_rows(&lane_items, days);
  let rows_needed = rows
    .iter()
    .map(|(_, row)| row + 1)
    .max()
    .unwrap_or(0);

  let day_top_height =
    if metrics.day_top_height_fixed {
      metrics.maximum_day_top_height
    } else {
      let needed = i32::try_from(rows_needed)
        .unwrap_or(i32::MAX)
        .saturating_mul(
          metrics.standard_item_height
        )
        .saturating_add(metrics.items_padding);
      needed.max(metrics.day_top_min_height)
    };
  let lane_capacity =
    if metrics.day_top_height_fixed {
      metrics.rows_in(
        day_top_height - metrics.items_padding
      )
    } else {
      rows_needed.max(1)
    };

  let body_top = header + day_top_height;
  let body_bottom = metrics.height;
  let unit_height = metrics.time_unit_height;

  for (idx, day) in grid.days.iter_mut().enumerate() {
    let x = split(left, metrics.width - left, idx, days);
    let right = split(
      left,
      metrics.width - left,
      idx + 1,
      days
    );
    day.bounds = Rect::from_ltrb(
      x,
      0,
      right,
      metrics.height
    );
    day.header_bounds =
      Rect::from_ltrb(x, 0, right, header);
    day.day_top.bounds = Rect::from_ltrb(
      x,
      header,
      right,
      body_top
    );
    day.capacity = lane_capacity;

    for unit in &mut day.time_units {
      let slot = i32::try_from(unit.index())
        .unwrap_or(i32::MAX)
        .saturating_add(time_units_offset);
      let y = body_top
        + slot.saturating_mul(unit_height);
      unit.bounds = Rect::from_ltrb(
        x,
        y,
        right,
        y.saturating_add(unit_height)
      );
      unit.visible = y < body_bottom
        && y.saturating_add(unit_height) > body_top;
    }
  }

  place_lane_rows(
    grid,
    items,
    &rows,
    metrics,
    |grid, day| {
      grid.days[day].day_top.bounds.top()
    }
  );
  set_overflow(grid, &rows);

  for day in 0..days {
    pack_time_grid(
      grid,
      items,
      day,
      metrics,
      Rect::from_ltrb(
        grid.days[day].bounds.left(),
        body_top,
        grid.days[day].bounds.right(),
        body_bottom
      )
    );
  }

  let visible_time_units = if unit_height > 0 {
    usize::try_from(
      (body_bottom - body_top) / unit_height
    )
    .unwrap_or(0)
  } else {
    0
  };

  LayoutPass {
    day_top_height,
    body_top,
    visible_time_units
  }
}

fn layout_short(
  grid: &mut TimeGrid,
  items: &mut [Item],
  metrics: &LayoutMetrics
) -> LayoutPass {
  let left = metrics.week_header_width;
  let top = metrics.day_name_headers_height;
  let weeks = grid.days.len() / 7;
  let width = metrics.width - left;
  let height = metrics.height - top;

  for (week_idx, week) in grid.weeks.iter_mut().enumerate() {
    week.bounds = Rect::from_ltrb(
      0,
      split(top, height, week_idx, weeks),
      metrics.width,
      split(top, height, week_idx + 1, weeks)
    );
  }

  for (idx, day) in grid.days.iter_mut().enumerate() {
    let (row, col) = (idx / 7, idx % 7);
    day.bounds = Rect::from_ltrb(
      split(left, width, col, 7),
      split(top, height, row, weeks),
      split(left, width, col + 1, 7),
      split(top, height, row + 1, weeks)
    );
    day.header_bounds = Rect::new(
      day.bounds.left(),
      day.bounds.top(),
      day.bounds.width,
      metrics.day_header_height
    );
    day.day_top.bounds = Rect::EMPTY;
    day.capacity = metrics.rows_in(
      day.bounds.height
        - metrics.day_header_height
        - metrics.items_padding
    );
    for unit in &mut day.time_units {
      unit.bounds = Rect::EMPTY;
      unit.visible = false;
    }
  }

  let mut rows = vec![];
  for week in 0..weeks {
    let first = week * 7;
    let candidates =
      lane_candidates(grid, items, |day| {
        if (first..first + 7).contains(&day.index()) {
          day.contained.clone()
        } else {
          vec![]
        }
      });
    rows.extend(pack_rows(&candidates, grid.days.len()));
  }

  place_lane_rows(
    grid,
    items,
    &rows,
    metrics,
    |grid, day| {
      grid.days[day].bounds.top()
        + metrics.day_header_height
    }
  );
  set_overflow(grid, &rows);

  LayoutPass {
    day_top_height: 0,
    body_top: top,
    visible_time_units: 0
  }
}

/// One packed row assignment: the item, the
/// days it covers in the lane, and its row.
type LaneRow = ((ItemId, Vec<usize>), usize);

/// Items picked by `pick` from each day,
/// with the days they cover, in stacking
/// order.
fn lane_candidates<F>(
  grid: &TimeGrid,
  items: &[Item],
  pick: F
) -> Vec<(ItemId, Vec<usize>)>
where
  F: Fn(&Day) -> Vec<ItemId>
{
  let mut found: Vec<(ItemId, Vec<usize>)> =
    vec![];
  for day in grid.days() {
    for id in pick(day) {
      match found.iter_mut().find(|(f, _)| *f == id) {
        | Some((_, days)) => days.push(day.index()),
        | None => found.push((id, vec![day.index()]))
      }
    }
  }
  found.sort_by(|(a, _), (b, _)| {
    item_order(&items[a.0], &items[b.0])
  });
  found
}

/// Lowest row free on every covered day.
fn pack_rows(
  candidates: &[(ItemId, Vec<usize>)],
  days: usize
) -> Vec<LaneRow> {
  let mut occupied: Vec<Vec<bool>> =
    vec![vec![]; days];
  let mut rows = vec![];
  for (id, covered) in candidates {
    let row = (0..)
      .find(|row| {
        covered.iter().all(|day| {
          !occupied[*day]
            .get(*row)
            .copied()
            .unwrap_or(false)
        })
      })
      .unwrap_or(0);
    for day in covered {
      let slots = &mut occupied[*day];
      if slots.len() <= row {
        slots.resize(row + 1, false);
      }
      slots[row] = true;
    }
    trace!(?id, row, "packed lane row");
    rows.push(((*id, covered.clone()), row));
  }
  rows
}

/// Emits one rectangle per run of
/// consecutive days on which the row is
/// paged in at the same display row.
fn place_lane_rows<F>(
  grid: &TimeGrid,
  items: &mut [Item],
  rows: &[LaneRow],
  metrics: &LayoutMetrics,
  lane_top: F
) where
  F: Fn(&TimeGrid, usize) -> i32
{
  let (Some(first), Some(last)) =
    (grid.first_date(), grid.last_date())
  else {
    return;
  };
  let item_height = metrics.standard_item_height;

  for ((id, covered), row) in rows {
    let mut runs: Vec<(usize, usize, usize)> =
      vec![];
    for day in covered {
      let d = &grid.days[*day];
      let Some(display) = row.checked_sub(d.item_index)
      else {
        continue;
      };
      if display >= d.capacity {
        continue;
      }
      match runs.last_mut() {
        | Some((_, end, shown))
          if *end + 1 == *day && *shown == display =>
        {
          *end = *day;
        }
        | _ => runs.push((*day, *day, display))
      }
    }

    let item = &mut items[id.0];
    for (from, to, display) in runs {
      let top = lane_top(grid, from)
        + i32::try_from(display)
          .unwrap_or(0)
          .saturating_mul(item_height);
      item.add_bounds(Rect::from_ltrb(
        grid.days[from].bounds.left(),
        top,
        grid.days[to].bounds.right(),
        top + item_height
      ));
    }
    item.gap_first_and_last(
      metrics.items_padding,
      item.is_open_start(first),
      item.is_open_end(last)
    );
  }
}

fn set_overflow(
  grid: &mut TimeGrid,
  rows: &[LaneRow]
) {
  for day in &mut grid.days {
    let index = day.index();
    let window_end =
      day.item_index + day.capacity;
    day.overflow_start = day.item_index > 0;
    day.overflow_end = rows.iter().any(
      |((_, covered), row)| {
        *row >= window_end
          && covered.contains(&index)
      }
    );
  }
}

/// Collision-clustered columns for the timed
/// items of one day.
fn pack_time_grid(
  grid: &TimeGrid,
  items: &mut [Item],
  day: usize,
  metrics: &LayoutMetrics,
  body: Rect
) {
  let d = &grid.days[day];
  let mut spans = d
    .contained
    .iter()
    .filter_map(|id| {
      let units = items[id.0]
        .passing
        .units
        .iter()
        .filter(|(owner, _)| *owner == day)
        .map(|(_, unit)| *unit)
        .collect::<Vec<_>>();
      let first = units.iter().min()?;
      let last = units.iter().max()?;
      Some((*id, *first, *last))
    })
    .collect::<Vec<_>>();
  spans.sort_by(|a, b| {
    a.1.cmp(&b.1).then_with(|| {
      item_order(&items[a.0.0], &items[b.0.0])
    })
  });

  let mut cluster: Vec<(ItemId, usize, usize, usize)> =
    vec![];
  let mut column_ends: Vec<usize> = vec![];
  let mut cluster_last = 0;
  for (id, first, last) in spans {
    if !cluster.is_empty() && first > cluster_last {
      place_cluster(
        grid, items, day, metrics, body, &cluster,
        column_ends.len()
      );
      cluster.clear();
      column_ends.clear();
    }
    let column = match column_ends
      .iter()
      .position(|end| *end < first)
    {
      | Some(free) => {
        column_ends[free] = last;
        free
      }
      | None => {
        column_ends.push(last);
        column_ends.len() - 1
      }
    };
    cluster_last = if cluster.is_empty() {
      last
    } else {
      cluster_last.max(last)
    };
    cluster.push((id, first, last, column));
  }
  if !cluster.is_empty() {
    place_cluster(
      grid, items, day, metrics, body, &cluster,
      column_ends.len()
    );
  }
}

fn place_cluster(
  grid: &TimeGrid,
  items: &mut [Item],
  day: usize,
  metrics: &LayoutMetrics,
  body: Rect,
  cluster: &[(ItemId, usize, usize, usize)],
  columns: usize
) {
  let d = &grid.days[day];
  let minutes = grid.scale().minutes();
  for (id, first, last, column) in cluster {
    let item = &mut items[id.0];
    item.column = *column;
    item.column_count = columns;

    let top = d.time_units[*first].bounds.top();
    let bottom = d.time_units[*last].bounds.bottom();
    let unit_height = metrics.time_unit_height;
    let offset_of = |unit: usize, minute: u32| {
      let into = minute
        .saturating_sub(d.time_units[unit].minutes_of_day())
        .min(minutes);
      d.time_units[unit].bounds.top()
        + i32::try_from(into).unwrap_or(0) * unit_height
          / i32::try_from(minutes).unwrap_or(1)
    };
    item.minute_start_top = offset_of(
      *first,
      item.start().hour() * 60 + item.start().minute()
    );
    item.minute_end_top = if item.end().date()
      == item.start().date()
    {
      offset_of(
        *last,
        item.end().hour() * 60 + item.end().minute()
      )
    } else {
      bottom
    };

    let left = split(
      d.bounds.left(),
      d.bounds.width,
      *column,
      columns
    );
    let right = split(
      d.bounds.left(),
      d.bounds.width,
      column + 1,
      columns
    );
    let inset = (right - left - 1)
      .min(metrics.items_padding)
      .max(0);
    let rect = Rect::from_ltrb(
      left,
      top,
      right - inset,
      bottom
    )
    .clip(&body);
    item.add_bounds(rect);
    trace!(
      ?id,
      column,
      columns,
      visible = !rect.is_empty(),
      "placed timed item"
    );
  }
}

/// Page-back button in the top right corner
/// of a Short-mode cell.
#[must_use]
pub fn overflow_start_button(day: &Day) -> Rect {
  if !day.overflow_start() {
    return Rect::EMPTY;
  }
  let b = day.bounds();
  Rect::new(
    b.right() - OVERFLOW_BUTTON_SIZE,
    b.top(),
    OVERFLOW_BUTTON_SIZE,
    OVERFLOW_BUTTON_SIZE
  )
}

/// Page-forward button in the bottom right
/// corner of a Short-mode cell.
#[must_use]
pub fn overflow_end_button(day: &Day) -> Rect {
  if !day.overflow_end() {
    return Rect::EMPTY;
  }
  let b = day.bounds();
  Rect::new(
    b.right() - OVERFLOW_BUTTON_SIZE,
    b.bottom() - OVERFLOW_BUTTON_SIZE,
    OVERFLOW_BUTTON_SIZE,
    OVERFLOW_BUTTON_SIZE
  )
}

/// Moves the first shown row of `day` by
/// `delta`. Forward paging needs hidden rows
/// below, backward paging hidden rows above.
/// Returns false when nothing moved.
pub fn page_overflow(
  grid: &mut TimeGrid,
  day: usize,
  delta: i64
) -> bool {
  let Some(day) = grid.days.get_mut(day) else {
    return false;
  };
  let pageable = match delta.signum() {
    | 1 => day.overflow_end,
    | -1 => day.item_index > 0,
    | _ => false
  };
  if !pageable {
    return false;
  }
  let Some(index) = i64::try_from(day.item_index)
    .ok()
    .map(|idx| idx + delta)
    .and_then(|idx| usize::try_from(idx).ok())
  else {
    return false;
  };
  if index >= day.contained.len() {
    return false;
  }
  day.item_index = index;
  true
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    NaiveDateTime
  };

  use super::*;
  use crate::classify::attach_all;
  use crate::scale::TimeScale;
  use crate::view::ViewWindow;

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

  fn laid_out(
    from: u32,
    to: u32,
    items: &mut [Item],
    metrics: &LayoutMetrics
  ) -> (TimeGrid, LayoutPass) {
    let mut view =
      ViewWindow::new(date(from), date(to));
    let mut grid = TimeGrid::build(
      &mut view,
      TimeScale::ThirtyMinutes,
      &[]
    )
    .or_else(|| {
      TimeGrid::build(
        &mut view,
        TimeScale::ThirtyMinutes,
        &[]
      )
    })
    .expect("grid builds");
    for item in items.iter_mut() {
      item.passing = Default::default();
    }
    attach_all(&mut grid, items);
    let pass = layout(&mut grid, items, metrics, 0);
    (grid, pass)
  }

  fn tall() -> LayoutMetrics {
    LayoutMetrics {
      height: 48 * 15 + 19 + 19,
      ..LayoutMetrics::default()
    }
  }

  #[test]
  fn identical_items_get_distinct_columns() {
    let mut items = (0..5)
      .map(|id| {
        let mut item = Item::new(
          at(2, 9, 0),
          at(2, 10, 0),
          "meeting"
        );
        item.appointment_id = id;
        item
      })
      .collect::<Vec<_>>();
    let (_, _) =
      laid_out(2, 2, &mut items, &tall());

    let mut columns = items
      .iter()
      .map(|i| i.column())
      .collect::<Vec<_>>();
    columns.sort_unstable();
    assert_eq!(columns, vec![0, 1, 2, 3, 4]);
    assert!(items.iter().all(|i| i.column_count() == 5));
    for (a, b) in [(0, 1), (1, 2), (3, 4)] {
      assert!(
        !items[a].bounds().intersects(&items[b].bounds())
      );
    }
  }

  #[test]
  fn clusters_do_not_share_columns() {
    let mut items = vec![
      Item::new(at(2, 8, 0), at(2, 10, 0), "a"),
      Item::new(at(2, 9, 0), at(2, 11, 0), "b"),
      Item::new(at(2, 14, 0), at(2, 15, 0), "c"),
    ];
    laid_out(2, 2, &mut items, &tall());
    assert_eq!(items[0].column_count(), 2);
    assert_eq!(items[1].column_count(), 2);
    assert_ne!(items[0].column(), items[1].column());
    assert_eq!(items[2].column_count(), 1);
    assert_eq!(items[2].column(), 0);
  }

  #[test]
  fn timed_item_spans_its_units() {
    let mut items =
      vec![Item::new(at(2, 8, 0), at(2, 9, 0), "a")];
    let (grid, pass) =
      laid_out(2, 3, &mut items, &tall());
    let day = &grid.days()[0];
    let bounds = items[0].bounds();
    assert_eq!(
      bounds.top(),
      day.time_units()[16].bounds().top()
    );
    assert_eq!(
      bounds.bottom(),
      day.time_units()[17].bounds().bottom()
    );
    assert_eq!(items[0].minute_tops().0, bounds.top());
    assert_eq!(pass.visible_time_units, 48);
  }

  #[test]
  fn scrolled_out_items_keep_membership() {
    let metrics = LayoutMetrics {
      height: 19 + 19 + 10 * 15,
      ..LayoutMetrics::default()
    };
    let mut items =
      vec![Item::new(at(2, 20, 0), at(2, 21, 0), "late")];
    let (grid, pass) =
      laid_out(2, 2, &mut items, &metrics);
    assert_eq!(pass.visible_time_units, 10);
    assert!(items[0].bounds().is_empty());
    assert!(!items[0].is_on_view());
    assert_eq!(
      grid.days()[0].contained_items(),
      &[ItemId(0)]
    );
  }

  #[test]
  fn day_top_lane_grows_unless_fixed() {
    let mut items = vec![
      Item::new(at(2, 22, 0), at(3, 2, 0), "a"),
      Item::new(at(2, 23, 0), at(3, 3, 0), "b"),
    ];
    let (_, pass) =
      laid_out(2, 3, &mut items, &tall());
    assert_eq!(pass.day_top_height, 2 * 19 + 5);
    assert!(
      !items[0].bounds().intersects(&items[1].bounds())
    );

    let fixed = LayoutMetrics {
      day_top_height_fixed: true,
      ..tall()
    };
    let (grid, pass) =
      laid_out(2, 3, &mut items, &fixed);
    assert_eq!(pass.day_top_height, 29);
    assert_eq!(grid.days()[0].capacity(), 1);
    assert!(grid.days()[0].overflow_end());
  }

  #[test]
  fn short_mode_splits_items_at_week_rows() {
    // 2026-03-05 is a Thursday; weeks start on Sunday.
    let mut items = vec![Item::new(
      at(6, 9, 0),
      at(9, 17, 0),
      "trip"
    )];
    let metrics = LayoutMetrics {
      width: 19 + 7 * 100,
      height: 19 + 2 * 100,
      ..LayoutMetrics::default()
    };
    let (grid, _) =
      laid_out(5, 14, &mut items, &metrics);
    assert_eq!(grid.mode(), DaysMode::Short);

    let rects = items[0].all_bounds();
    assert_eq!(rects.len(), 2);
    // Friday and Saturday, then Sunday and Monday.
    let fri = &grid.days()[5];
    let sun = &grid.days()[7];
    assert_eq!(rects[0].left(), fri.bounds().left() + 5);
    assert_eq!(rects[1].left(), sun.bounds().left());
    assert_eq!(rects[1].right(), grid.days()[8].bounds().right() - 5);
  }

  #[test]
  fn overflow_pages_through_rows() {
    let mut items = (0..6)
      .map(|id| {
        let mut item = Item::new(
          at(10, 8 + id as u32, 0),
          at(10, 9 + id as u32, 0),
          "busy"
        );
        item.appointment_id = id;
        item
      })
      .collect::<Vec<_>>();
    // Room for 4 rows: 19 header + 5 padding + 4 * 19.
    let metrics = LayoutMetrics {
      height: 19 + 2 * 100,
      ..LayoutMetrics::default()
    };
    let (mut grid, _) =
      laid_out(5, 14, &mut items, &metrics);
    let day = grid
      .find_day(date(10))
      .expect("day in view");
    assert_eq!(grid.days()[day].capacity(), 4);
    assert!(grid.days()[day].overflow_end());
    assert!(!grid.days()[day].overflow_start());
    assert_eq!(grid.days()[day].item_index(), 0);

    assert!(page_overflow(&mut grid, day, 1));
    assert!(page_overflow(&mut grid, day, 1));
    layout(&mut grid, &mut items, &metrics, 0);
    assert_eq!(grid.days()[day].item_index(), 2);
    assert!(grid.days()[day].overflow_start());
    assert!(!grid.days()[day].overflow_end());

    assert!(!page_overflow(&mut grid, day, 4));
    assert!(!page_overflow(&mut grid, day, -3));
    assert_eq!(grid.days()[day].item_index(), 2);
  }

  #[test]
  fn day_that_fits_does_not_page() {
    let mut items = (0..2)
      .map(|id| {
        let mut item = Item::new(
          at(10, 8 + id as u32, 0),
          at(10, 9 + id as u32, 0),
          "light"
        );
        item.appointment_id = id;
        item
      })
      .collect::<Vec<_>>();
    let metrics = LayoutMetrics {
      height: 19 + 2 * 100,
      ..LayoutMetrics::default()
    };
    let (mut grid, _) =
      laid_out(5, 14, &mut items, &metrics);
    let day = grid
      .find_day(date(10))
      .expect("day in view");
    assert_eq!(grid.days()[day].capacity(), 4);
    assert!(!grid.days()[day].overflow_end());

    assert!(!page_overflow(&mut grid, day, 1));
    assert!(!page_overflow(&mut grid, day, -1));
    layout(&mut grid, &mut items, &metrics, 0);
    assert_eq!(grid.days()[day].item_index(), 0);
    assert!(!grid.days()[day].overflow_start());
  }
}
