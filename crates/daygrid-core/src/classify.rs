use chrono::{
  Duration,
  NaiveDateTime
};
use tracing::{
  debug,
  trace
};

use crate::datetime::day_start;
use crate::grid::TimeGrid;
use crate::item::{
  Item,
  ItemId,
  item_order
};

/// Indices of the days `item` covers.
/// A zero-duration item covers the day of
/// its start.
fn spanned_days(
  grid: &TimeGrid,
  item: &Item
) -> Vec<usize> {
  grid
    .days()
    .iter()
    .filter(|day| {
      let from = day_start(day.date());
      let to = from + Duration::days(1);
      if item.duration().is_zero() {
        from <= item.start() && item.start() < to
      } else {
        item.start() < to && from < item.end()
      }
    })
    .map(|day| day.index())
    .collect()
}

/// Units of `day` overlapped by `item`.
fn overlapped_units(
  grid: &TimeGrid,
  day: usize,
  item: &Item
) -> Vec<usize> {
  let Some(day) = grid.day(day) else {
    return vec![];
  };
  let midnight = day_start(day.date());
  let unit_start = |minutes: u32| -> NaiveDateTime {
    midnight
      + Duration::minutes(i64::from(minutes))
  };

  day
    .time_units()
    .iter()
    .filter(|unit| {
      let from =
        unit_start(unit.minutes_of_day());
      let to = from + unit.duration();
      if item.duration().is_zero() {
        from <= item.start() && item.start() < to
      } else {
        item.start() < to && from < item.end()
      }
    })
    .map(|unit| unit.index())
    .collect()
}

/// Attaches one item to the elements it
/// passes through. Returns false when the
/// item is off the view, already attached,
/// or an item with the same identity is
/// already on one of its days.
#[tracing::instrument(skip(grid, items))]
pub fn attach(
  grid: &mut TimeGrid,
  items: &mut [Item],
  id: ItemId
) -> bool {
  let Some(item) = items.get(id.0) else {
    return false;
  };
  if !item.passing.is_empty() {
    return false;
  }
  let (Some(first), Some(last)) =
    (grid.first_date(), grid.last_date())
  else {
    return false;
  };
  if !item.is_on_view_date_range(first, last) {
    trace!(?id, "item off view");
    return false;
  }

  let days = spanned_days(grid, item);
  if days.is_empty() {
    trace!(?id, "item touches no day");
    return false;
  }
  let identity = item.identity();
  let duplicate = days.iter().any(|day| {
    grid.days[*day].contained.iter().any(
      |other| {
        items
          .get(other.0)
          .is_some_and(|o| o.identity() == identity)
      }
    )
  });
  if duplicate {
    trace!(?id, "identity already attached");
    return false;
  }

  let on_day_top = item.is_on_day_top();
  let mut tops = vec![];
  let mut units = vec![];
  if on_day_top {
    for day in &days {
      grid.days[*day]
        .day_top
        .add_passing_item(id);
      tops.push(*day);
    }
  } else if let Some(owner) = grid
    .find_day(item.start().date())
  {
    for unit in
      overlapped_units(grid, owner, item)
    {
      let slot =
        &mut grid.days[owner].time_units[unit];
      if !slot.passing.contains(&id) {
        slot.passing.push(id);
      }
      units.push((owner, unit));
    }
  }

  for day in &days {
    let contained =
      &mut grid.days[*day].contained;
    if !contained.contains(&id) {
      contained.push(id);
    }
    contained.sort_by(|a, b| {
      item_order(&items[a.0], &items[b.0])
    });
  }

  let item = &mut items[id.0];
  item.passing.days = days;
  item.passing.tops = tops;
  item.passing.units = units;
  trace!(
    ?id,
    on_day_top,
    days = item.passing.days.len(),
    units = item.passing.units.len(),
    "attached item"
  );
  true
}

/// Removes every grid reference to the item
/// and clears its layout.
pub fn detach(
  grid: &mut TimeGrid,
  items: &mut [Item],
  id: ItemId
) {
  let Some(item) = items.get_mut(id.0) else {
    return;
  };
  let passing = std::mem::take(&mut item.passing);
  item.clear_bounds();

  for (day, unit) in passing.units {
    if let Some(slot) = grid
      .days
      .get_mut(day)
      .and_then(|d| d.time_units.get_mut(unit))
    {
      slot.passing.retain(|p| *p != id);
    }
  }
  for day in passing.tops {
    if let Some(day) = grid.days.get_mut(day) {
      day.day_top.passing.retain(|p| *p != id);
    }
  }
  for day in passing.days {
    if let Some(day) = grid.days.get_mut(day) {
      day.contained.retain(|p| *p != id);
    }
  }
}

/// Attaches every item in arena order.
#[tracing::instrument(skip(grid, items))]
pub fn attach_all(
  grid: &mut TimeGrid,
  items: &mut [Item]
) -> usize {
  let attached = (0..items.len())
    .filter(|idx| {
      attach(grid, items, ItemId(*idx))
    })
    .count();
  debug!(
    attached,
    total = items.len(),
    "classified items"
  );
  attached
}

/// Drops every membership on both sides.
pub fn detach_all(
  grid: &mut TimeGrid,
  items: &mut [Item]
) {
  for item in items.iter_mut() {
    item.passing = Default::default();
    item.clear_bounds();
  }
  for day in &mut grid.days {
    day.contained.clear();
    day.day_top.passing.clear();
    for unit in &mut day.time_units {
      unit.passing.clear();
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;
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

  fn grid(
    from: u32,
    to: u32
  ) -> TimeGrid {
    let mut view =
      ViewWindow::new(date(from), date(to));
    TimeGrid::build(
      &mut view,
      TimeScale::ThirtyMinutes,
      &[]
    )
    .expect("grid builds")
  }

  fn references(
    grid: &TimeGrid,
    id: ItemId
  ) -> usize {
    grid
      .days()
      .iter()
      .map(|day| {
        let units = day
          .time_units()
          .iter()
          .filter(|u| {
            u.passing_items().contains(&id)
          })
          .count();
        let top = usize::from(
          day.day_top().passing_items().contains(&id)
        );
        let contained = usize::from(
          day.contained_items().contains(&id)
        );
        units + top + contained
      })
      .sum()
  }

  #[test]
  fn timed_item_takes_overlapped_units() {
    let mut grid = grid(2, 3);
    let mut items =
      vec![Item::new(at(2, 8, 0), at(2, 9, 0), "a")];
    assert!(attach(&mut grid, &mut items, ItemId(0)));

    assert_eq!(
      items[0].passing_units(),
      &[(0, 16), (0, 17)]
    );
    assert!(items[0].passing_tops().is_empty());
    assert_eq!(
      grid.days()[0].contained_items(),
      &[ItemId(0)]
    );
    assert!(
      grid.days()[1].contained_items().is_empty()
    );
  }

  #[test]
  fn zero_duration_item_takes_one_unit() {
    let mut grid = grid(2, 2);
    let mut items = vec![Item::new(
      at(2, 10, 15),
      at(2, 10, 15),
      "ping"
    )];
    assert!(attach(&mut grid, &mut items, ItemId(0)));
    assert_eq!(items[0].passing_units(), &[(0, 20)]);
  }

  #[test]
  fn overnight_item_goes_to_both_day_tops() {
    let mut grid = grid(2, 3);
    let mut items = vec![Item::new(
      at(2, 22, 0),
      at(3, 2, 0),
      "night"
    )];
    assert!(attach(&mut grid, &mut items, ItemId(0)));
    assert_eq!(items[0].passing_tops(), &[0, 1]);
    assert!(items[0].passing_units().is_empty());
    assert_eq!(
      grid.days()[1].day_top().passing_items(),
      &[ItemId(0)]
    );
  }

  #[test]
  fn attach_is_idempotent_by_identity() {
    let mut grid = grid(2, 2);
    let first =
      Item::new(at(2, 8, 0), at(2, 9, 0), "a");
    let mut items =
      vec![first.clone(), first.clone()];
    items[1].text = "copy".to_string();

    assert!(attach(&mut grid, &mut items, ItemId(0)));
    assert!(!attach(&mut grid, &mut items, ItemId(0)));
    assert!(!attach(&mut grid, &mut items, ItemId(1)));
    assert_eq!(
      grid.days()[0].contained_items().len(),
      1
    );
  }

  #[test]
  fn off_view_items_are_skipped() {
    let mut grid = grid(2, 3);
    let mut items = vec![Item::new(
      at(9, 8, 0),
      at(9, 9, 0),
      "later"
    )];
    assert!(!attach(&mut grid, &mut items, ItemId(0)));
    assert!(items[0].passing_days().is_empty());
  }

  #[test]
  fn item_ending_at_first_midnight_is_not_attached() {
    let mut grid = grid(2, 3);
    let mut items = vec![Item::new(
      at(1, 22, 0),
      at(2, 0, 0),
      "late"
    )];
    assert!(!attach(&mut grid, &mut items, ItemId(0)));
    assert_eq!(attach_all(&mut grid, &mut items), 0);
    assert!(items[0].passing_days().is_empty());
    assert!(
      grid
        .days()
        .iter()
        .all(|day| day.contained_items().is_empty())
    );
  }

  #[test]
  fn detach_leaves_no_references() {
    let mut grid = grid(2, 4);
    let mut items = vec![
      Item::new(at(2, 8, 0), at(2, 11, 0), "a"),
      Item::new(at(2, 20, 0), at(4, 3, 0), "b"),
    ];
    attach_all(&mut grid, &mut items);
    assert!(references(&grid, ItemId(0)) > 0);
    assert!(references(&grid, ItemId(1)) > 0);

    detach(&mut grid, &mut items, ItemId(0));
    detach(&mut grid, &mut items, ItemId(1));
    assert_eq!(references(&grid, ItemId(0)), 0);
    assert_eq!(references(&grid, ItemId(1)), 0);
    assert!(items[1].passing_days().is_empty());
  }

  #[test]
  fn contained_items_follow_stacking_order() {
    let mut grid = grid(2, 2);
    let mut items = vec![
      Item::new(at(2, 8, 0), at(2, 9, 0), "early"),
      Item::new(at(2, 14, 0), at(2, 15, 0), "late"),
    ];
    attach_all(&mut grid, &mut items);
    assert_eq!(
      grid.days()[0].contained_items(),
      &[ItemId(1), ItemId(0)]
    );
  }
}
