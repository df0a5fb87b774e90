use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use daygrid_core::classify::{attach_all, detach};
use daygrid_core::grid::TimeGrid;
use daygrid_core::item::{Item, ItemId, ItemRecord, item_order};
use daygrid_core::scale::TimeScale;
use daygrid_core::selection::ElementRef;
use daygrid_core::view::{DaysMode, ViewWindow};
use daygrid_core::Calendar;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).expect("valid date")
}

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    date(d).and_hms_opt(h, m, 0).expect("valid time")
}

fn record(id: i64, start: NaiveDateTime, end: NaiveDateTime) -> ItemRecord {
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
        locked: false,
    }
}

#[test]
fn hour_long_item_fills_two_half_hour_units() {
    let mut calendar = Calendar::new(date(2), date(3));
    calendar.set_items(&[record(1, at(2, 8, 0), at(2, 9, 0))]);

    assert_eq!(calendar.mode(), DaysMode::Expanded);
    assert_eq!(calendar.scale(), TimeScale::ThirtyMinutes);

    let item = calendar.item(ItemId(0)).expect("item loaded");
    assert!(!item.is_on_day_top());
    assert_eq!(item.passing_units(), &[(0, 16), (0, 17)]);

    let grid = calendar.grid();
    let on_day = |day: usize| {
        grid.days()[day]
            .time_units()
            .iter()
            .filter(|unit| !unit.passing_items().is_empty())
            .count()
    };
    assert_eq!(on_day(0), 2);
    assert_eq!(on_day(1), 0);
}

#[test]
fn overnight_item_sits_on_both_day_tops() {
    let mut calendar = Calendar::new(date(2), date(3));
    calendar.set_items(&[record(1, at(2, 22, 0), at(3, 2, 0))]);

    let item = calendar.item(ItemId(0)).expect("item loaded");
    assert!(item.is_on_day_top());
    assert_eq!(item.passing_tops(), &[0, 1]);
    for day in calendar.grid().days() {
        assert_eq!(day.day_top().passing_items(), &[ItemId(0)]);
        assert!(
            day.time_units()
                .iter()
                .all(|unit| unit.passing_items().is_empty())
        );
    }
    assert!(calendar.day_top_height() > 0);
}

#[test]
fn ten_day_view_switches_to_short_weeks() {
    let calendar = Calendar::new(date(5), date(14));
    assert_eq!(calendar.mode(), DaysMode::Short);

    let days = calendar.grid().days();
    assert_eq!(days.len() % 7, 0);
    assert!(days.len() >= 10);
    // Weeks start on Sunday; 2026-03-01 is one.
    assert_eq!(days[0].date(), date(1));
    assert_eq!(days.len(), 14);
    assert_eq!(calendar.grid().weeks().len(), 2);
}

#[test]
fn identical_items_take_five_columns() {
    let mut calendar = Calendar::new(date(2), date(2));
    let records = (1..=5)
        .map(|id| record(id, at(2, 9, 0), at(2, 10, 0)))
        .collect::<Vec<_>>();
    calendar.set_items(&records);

    let mut columns = calendar
        .items()
        .iter()
        .map(|item| {
            assert_eq!(item.column_count(), 5);
            item.column()
        })
        .collect::<Vec<_>>();
    columns.sort_unstable();
    assert_eq!(columns, vec![0, 1, 2, 3, 4]);
}

#[test]
fn crowded_day_overflows_and_pages() {
    let mut calendar = Calendar::new(date(5), date(14));
    // Two week rows of 100px: 19 header + 5 padding + 4 * 19.
    calendar.set_layout_size(800, 19 + 2 * 100);
    let records = (0..6)
        .map(|id| record(id, at(10, 8 + id as u32, 0), at(10, 9 + id as u32, 0)))
        .collect::<Vec<_>>();
    calendar.set_items(&records);

    let day = calendar.grid().find_day(date(10)).expect("day in view");
    let cell = &calendar.grid().days()[day];
    assert_eq!(cell.contained_items().len(), 6);
    assert_eq!(cell.capacity(), 4);
    assert!(cell.overflow_end());
    assert!(!cell.overflow_start());
    assert_eq!(cell.item_index(), 0);

    assert!(calendar.page_overflow(day, 1));
    assert!(calendar.page_overflow(day, 1));
    let cell = &calendar.grid().days()[day];
    assert_eq!(cell.item_index(), 2);
    assert!(cell.overflow_start());
    assert!(!cell.overflow_end());
}

#[test]
fn day_without_overflow_ignores_paging() {
    let mut calendar = Calendar::new(date(5), date(14));
    calendar.set_layout_size(800, 19 + 2 * 100);
    calendar.set_items(&[
        record(1, at(10, 8, 0), at(10, 9, 0)),
        record(2, at(10, 10, 0), at(10, 11, 0)),
    ]);

    let day = calendar.grid().find_day(date(10)).expect("day in view");
    let cell = &calendar.grid().days()[day];
    assert_eq!(cell.capacity(), 4);
    assert!(!cell.overflow_end());

    assert!(!calendar.page_overflow(day, 1));
    assert!(!calendar.page_overflow(day, -1));
    let cell = &calendar.grid().days()[day];
    assert_eq!(cell.item_index(), 0);
    assert!(!cell.overflow_start());
    assert!(calendar.items().iter().all(|item| item.is_on_view()));
}

#[test]
fn zero_minute_scale_is_rejected() {
    let mut calendar = Calendar::new(date(2), date(3));
    assert!(calendar.set_time_scale(0).is_err());
    assert_eq!(calendar.scale(), TimeScale::ThirtyMinutes);
}

#[test]
fn expanded_views_have_one_day_per_date() {
    for last in 1..=8 {
        let calendar = Calendar::new(date(2), date(1 + last));
        assert_eq!(calendar.mode(), DaysMode::Expanded);
        assert_eq!(calendar.grid().days().len(), last as usize);
    }
    for last in 9..=30 {
        let calendar = Calendar::new(date(1), date(last));
        assert_eq!(calendar.mode(), DaysMode::Short);
        let len = calendar.grid().days().len();
        assert!(len > 0 && len % 7 == 0, "{len} days for span {last}");
    }
}

#[test]
fn every_scale_covers_the_whole_day() {
    let mut calendar = Calendar::new(date(2), date(2));
    for minutes in [60, 30, 15, 10, 6, 5] {
        calendar.set_time_scale(minutes).expect("supported scale");
        let units = calendar.grid().days()[0].time_units().len();
        assert_eq!(units * minutes as usize, 1440, "scale {minutes}");
    }
}

#[test]
fn item_order_is_a_strict_total_order() {
    let mut items = vec![
        Item::new(at(2, 8, 0), at(2, 9, 0), "a"),
        Item::new(at(2, 8, 0), at(2, 10, 0), "b"),
        Item::new(at(2, 7, 0), at(2, 9, 0), "c"),
        Item::new(at(2, 8, 0), at(2, 9, 0), "d"),
        Item::new(at(3, 0, 0), at(4, 0, 0), "e"),
    ];
    for (idx, item) in items.iter_mut().enumerate() {
        item.appointment_id = idx as i64;
    }

    for a in &items {
        assert_eq!(item_order(a, a), Ordering::Equal);
        for b in &items {
            if a.appointment_id != b.appointment_id {
                assert_ne!(item_order(a, b), Ordering::Equal);
                assert_eq!(item_order(a, b), item_order(b, a).reverse());
            }
            for c in &items {
                if item_order(a, b) == Ordering::Less && item_order(b, c) == Ordering::Less {
                    assert_eq!(item_order(a, c), Ordering::Less);
                }
            }
        }
    }
}

#[test]
fn selection_ignores_repeats_and_endpoint_order() {
    let mut calendar = Calendar::new(date(2), date(4));
    let early = ElementRef::TimeUnit { day: 0, unit: 20 };
    let late = ElementRef::TimeUnit { day: 2, unit: 3 };

    calendar.set_selection_range(Some(early), Some(late));
    let forward = calendar.selection().elements().to_vec();
    let repeated = calendar.set_selection_range(Some(early), Some(late));
    assert_eq!(calendar.selection().elements(), forward.as_slice());
    assert_eq!(repeated, calendar.selection().square());

    calendar.set_selection_range(Some(late), Some(early));
    assert_eq!(calendar.selection().elements(), forward.as_slice());
    // 28 units left on day 0, all 48 on day 1, 4 on day 2.
    assert_eq!(forward.len(), 28 + 48 + 4);
}

#[test]
fn detaching_leaves_no_references() {
    let mut view = ViewWindow::new(date(2), date(4));
    let mut grid = TimeGrid::build(&mut view, TimeScale::FifteenMinutes, &[]).expect("grid builds");
    let mut items = vec![
        Item::new(at(2, 8, 0), at(2, 9, 30), "timed"),
        Item::new(at(2, 22, 0), at(4, 1, 0), "overnight"),
        Item::new(at(3, 12, 0), at(3, 12, 0), "instant"),
    ];
    assert_eq!(attach_all(&mut grid, &mut items), 3);

    for idx in 0..items.len() {
        detach(&mut grid, &mut items, ItemId(idx));
    }

    for day in grid.days() {
        assert!(day.contained_items().is_empty());
        assert!(day.day_top().passing_items().is_empty());
        assert!(
            day.time_units()
                .iter()
                .all(|unit| unit.passing_items().is_empty())
        );
    }
    for item in &items {
        assert!(item.passing_days().is_empty());
        assert!(item.passing_tops().is_empty());
        assert!(item.passing_units().is_empty());
    }
}
