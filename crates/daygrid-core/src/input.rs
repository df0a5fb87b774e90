use chrono::{
  Duration,
  NaiveDate,
  NaiveDateTime
};
use serde::Serialize;
use tracing::{
  debug,
  trace
};

use crate::calendar::Calendar;
use crate::datetime::day_start;
use crate::geometry::Point;
use crate::hit_test::Hit;
use crate::item::ItemId;
use crate::layout::{
  overflow_end_button,
  overflow_start_button
};
use crate::selection::ElementRef;
use crate::view::DaysMode;

/// Pointer travel before a pressed item
/// starts moving.
pub const DRAG_THRESHOLD: i32 = 3;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize,
)]
pub enum Key {
  Up,
  Down,
  Left,
  Right,
  Delete,
  Insert
}

/// Notifications produced by input handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CalendarEvent {
  SelectionChanged {
    start: Option<NaiveDateTime>,
    end:   Option<NaiveDateTime>
  },
  ItemSelected(ItemId),
  ItemDatesChanged {
    id:    ItemId,
    start: NaiveDateTime,
    end:   NaiveDateTime
  },
  ItemClick(ItemId),
  DayHeaderClick(NaiveDate),
  EmptyTimeClick {
    start: NaiveDateTime,
    end:   NaiveDateTime
  },
  OverflowPaged {
    day:        usize,
    item_index: usize
  },
  ItemsDeleted(Vec<i64>),
  ItemCreated(ItemId),
  ViewScrolled
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum InteractionState {
  #[default]
  Idle,
  DraggingTimeSelection,
  DraggingItem,
  ResizingItem
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
  Start,
  End
}

/// Pointer gesture in progress.
#[derive(Debug, Clone, Default)]
pub struct Interaction {
  state:    InteractionState,
  item:     Option<ItemId>,
  edge:     Option<Edge>,
  movable:  bool,
  origin:   Point,
  anchor:   Option<ElementRef>,
  original: Option<(NaiveDateTime, NaiveDateTime)>,
  moved:    bool
}

impl Interaction {
  #[must_use]
  pub fn state(&self) -> InteractionState {
    self.state
  }
}

/// Offset between two elements. Time units
/// move by exact time, anything else by
/// whole days.
fn drag_delta(
  calendar: &Calendar,
  from: ElementRef,
  to: ElementRef
) -> Option<Duration> {
  let grid = calendar.grid();
  let a = from.date(grid)?;
  let b = to.date(grid)?;
  match (from, to) {
    | (
      ElementRef::TimeUnit { .. },
      ElementRef::TimeUnit { .. }
    ) => Some(b - a),
    | _ => Some(Duration::days(
      (b.date() - a.date()).num_days()
    ))
  }
}

impl Calendar {
  #[must_use]
  pub fn interaction_state(
    &self
  ) -> InteractionState {
    self.interaction.state
  }

  fn selection_event(&self) -> CalendarEvent {
    let dates = self.selection_dates();
    CalendarEvent::SelectionChanged {
      start: dates.map(|(s, _)| s),
      end:   dates.map(|(_, e)| e)
    }
  }

  #[tracing::instrument(skip(self))]
  pub fn mouse_down(
    &mut self,
    p: Point,
    shift: bool
  ) -> Vec<CalendarEvent> {
    let mut events = vec![];
    self.interaction = Interaction {
      origin: p,
      ..Interaction::default()
    };

    if self.mode() == DaysMode::Short {
      let button = self.grid().days().iter().find_map(|day| {
        if overflow_end_button(day).contains(p) {
          Some((day.index(), 1))
        } else if overflow_start_button(day).contains(p) {
          Some((day.index(), -1))
        } else {
          None
        }
      });
      if let Some((day, delta)) = button {
        if self.page_overflow(day, delta) {
          let item_index = self
            .grid()
            .day(day)
            .map_or(0, |d| d.item_index());
          events.push(CalendarEvent::OverflowPaged {
            day,
            item_index
          });
        }
        return events;
      }
    }

    match self.hit_test(p, false) {
      | Some(Hit::Item(id)) => {
        self.select_item(id, shift);
        events.push(CalendarEvent::ItemSelected(id));
        self.begin_item_gesture(id, p);
      }
      | Some(Hit::Element(element)) => {
        self.clear_item_selection();
        let keep_start = shift
          && self.selection().start().is_some_and(|s| {
            s.kind() == element.kind()
          });
        if keep_start {
          self.set_selection_end(Some(element));
        } else {
          self.set_selection_range(
            Some(element),
            Some(element)
          );
        }
        self.interaction.state =
          InteractionState::DraggingTimeSelection;
        events.push(self.selection_event());
      }
      | None => {}
    }
    events
  }

  fn begin_item_gesture(
    &mut self,
    id: ItemId,
    p: Point
  ) {
    let policy = *self.policy();
    let horizontal = self.mode() == DaysMode::Short;
    let anchor = match self.hit_test(p, true) {
      | Some(Hit::Element(element)) => Some(element),
      | _ => None
    };
    let Some(item) = self.item(id) else {
      return;
    };
    let horizontal = horizontal || item.is_on_day_top();
    let editable = !item.locked;
    let original = (item.start(), item.end());

    let edge = if !(policy.allow_item_resize && editable) {
      None
    } else if item.resize_start_zone(p, horizontal) {
      Some(Edge::Start)
    } else if item.resize_end_zone(p, horizontal) {
      Some(Edge::End)
    } else {
      None
    };

    self.interaction.item = Some(id);
    self.interaction.anchor = anchor;
    self.interaction.original = Some(original);
    self.interaction.edge = edge;
    self.interaction.movable =
      edge.is_some() || (policy.allow_item_edit && editable);
    self.interaction.state = if edge.is_some() {
      InteractionState::ResizingItem
    } else {
      InteractionState::DraggingItem
    };

    if let Some(item) = self.item_mut(id) {
      item.drag.resizing_start = edge == Some(Edge::Start);
      item.drag.resizing_end = edge == Some(Edge::End);
    }
    trace!(?id, ?edge, "item gesture started");
  }

  #[tracing::instrument(skip(self))]
  pub fn mouse_move(
    &mut self,
    p: Point
  ) -> Vec<CalendarEvent> {
    let mut events = vec![];
    match self.interaction.state {
      | InteractionState::Idle => {}
      | InteractionState::DraggingTimeSelection => {
        if let Some(Hit::Element(element)) =
          self.hit_test(p, true)
          && self.selection().end() != Some(element)
        {
          self.set_selection_end(Some(element));
          events.push(self.selection_event());
        }
      }
      | InteractionState::DraggingItem => {
        self.drag_item(p);
      }
      | InteractionState::ResizingItem => {
        self.resize_item(p);
      }
    }
    events
  }

  fn drag_item(&mut self, p: Point) {
    let gesture = self.interaction.clone();
    let (Some(id), Some(anchor), Some((start, end))) =
      (gesture.item, gesture.anchor, gesture.original)
    else {
      return;
    };
    if !gesture.movable {
      return;
    }
    if !gesture.moved {
      let dy = (p.y - gesture.origin.y).abs();
      let dx = (p.x - gesture.origin.x).abs();
      let horizontal = self.mode() == DaysMode::Short
        || self.item(id).is_some_and(|i| i.is_on_day_top());
      if dy <= DRAG_THRESHOLD
        && !(horizontal && dx > DRAG_THRESHOLD)
      {
        return;
      }
      self.interaction.moved = true;
      if let Some(item) = self.item_mut(id) {
        item.drag.dragging = true;
      }
    }

    let Some(Hit::Element(target)) = self.hit_test(p, true)
    else {
      return;
    };
    let Some(delta) = drag_delta(self, anchor, target) else {
      return;
    };
    let (new_start, new_end) = (start + delta, end + delta);
    let current = self.item(id).map(|i| (i.start(), i.end()));
    if current != Some((new_start, new_end)) {
      self.set_item_dates(id, new_start, new_end);
      if let Some(item) = self.item_mut(id) {
        item.drag.dragging = true;
      }
    }
  }

  fn resize_item(&mut self, p: Point) {
    let (Some(id), Some(edge)) =
      (self.interaction.item, self.interaction.edge)
    else {
      return;
    };
    let Some(Hit::Element(target)) = self.hit_test(p, true)
    else {
      return;
    };
    let Some((start, end)) =
      self.item(id).map(|i| (i.start(), i.end()))
    else {
      return;
    };
    let Some(at) = target.date(self.grid()) else {
      return;
    };

    let (new_start, new_end) = match edge {
      | Edge::Start => {
        let at = match target {
          | ElementRef::TimeUnit { .. } => at,
          | _ => day_start(at.date())
        };
        (at, end)
      }
      | Edge::End => {
        let at = match target {
          | ElementRef::TimeUnit { .. } => {
            at + self.scale().duration()
          }
          | _ => at + Duration::seconds(86_399)
        };
        (start, at)
      }
    };
    if new_end <= new_start || (new_start, new_end) == (start, end) {
      return;
    }
    self.interaction.moved = true;
    self.set_item_dates(id, new_start, new_end);
    if let Some(item) = self.item_mut(id) {
      item.drag.resizing_start = edge == Edge::Start;
      item.drag.resizing_end = edge == Edge::End;
    }
  }

  #[tracing::instrument(skip(self))]
  pub fn mouse_up(
    &mut self,
    p: Point
  ) -> Vec<CalendarEvent> {
    let gesture = std::mem::take(&mut self.interaction);
    let mut events = vec![];
    match gesture.state {
      | InteractionState::Idle => {}
      | InteractionState::DraggingTimeSelection => {
        let single = self.selection().elements().len() == 1;
        let header = self
          .grid()
          .days()
          .iter()
          .find(|day| day.header_bounds().contains(p))
          .map(|day| day.date());
        match (single, header) {
          | (true, Some(date)) => {
            events.push(CalendarEvent::DayHeaderClick(date));
          }
          | (true, None) => {
            if let Some((start, end)) = self.selection_dates() {
              events.push(CalendarEvent::EmptyTimeClick {
                start,
                end
              });
            }
          }
          | (false, _) => {}
        }
      }
      | InteractionState::DraggingItem
      | InteractionState::ResizingItem => {
        let Some(id) = gesture.item else {
          return events;
        };
        if let Some(item) = self.item_mut(id) {
          item.drag = Default::default();
        }
        let now = self.item(id).map(|i| (i.start(), i.end()));
        match (now, gesture.original) {
          | (Some((start, end)), Some(original))
            if gesture.moved && (start, end) != original =>
          {
            debug!(?id, %start, %end, "item dates changed");
            events.push(CalendarEvent::ItemDatesChanged {
              id,
              start,
              end
            });
          }
          | _ => events.push(CalendarEvent::ItemClick(id))
        }
      }
    }
    events
  }

  #[tracing::instrument(skip(self))]
  pub fn key_down(
    &mut self,
    key: Key,
    shift: bool
  ) -> Vec<CalendarEvent> {
    match key {
      | Key::Delete => {
        if !self.policy().allow_item_edit {
          return vec![];
        }
        let removed = self.delete_selected_items();
        if removed.is_empty() {
          return vec![];
        }
        vec![CalendarEvent::ItemsDeleted(
          removed
            .iter()
            .map(|i| i.appointment_id)
            .collect()
        )]
      }
      | Key::Insert => {
        self
          .create_item_on_selection(String::new())
          .map(CalendarEvent::ItemCreated)
          .into_iter()
          .collect()
      }
      | Key::Up | Key::Down | Key::Left | Key::Right => {
        let Some(next) = self
          .selection()
          .end()
          .and_then(|end| self.step_element(end, key))
        else {
          return vec![];
        };
        if shift {
          self.set_selection_end(Some(next));
        } else {
          self.set_selection_range(Some(next), Some(next));
        }
        if let ElementRef::TimeUnit { unit, .. } = next {
          self.ensure_visible(unit);
        }
        vec![self.selection_event()]
      }
    }
  }

  /// Neighbour of `element` in the arrow
  /// direction, if it exists.
  fn step_element(
    &self,
    element: ElementRef,
    key: Key
  ) -> Option<ElementRef> {
    let days = self.grid().days().len();
    let shift = |value: usize, by: isize, len: usize| {
      value
        .checked_add_signed(by)
        .filter(|v| *v < len)
    };
    let by = match key {
      | Key::Up | Key::Left => -1,
      | _ => 1
    };

    match (key, element) {
      | (Key::Up | Key::Down, ElementRef::TimeUnit { day, unit }) => {
        let units = self.scale().units_per_day();
        shift(unit, by, units)
          .map(|unit| ElementRef::TimeUnit { day, unit })
      }
      | (Key::Up | Key::Down, ElementRef::Day { day })
        if self.mode() == DaysMode::Short =>
      {
        shift(day, by * 7, days).map(|day| ElementRef::Day { day })
      }
      | (Key::Up | Key::Down, _) => None,
      | (_, ElementRef::TimeUnit { day, unit }) => {
        shift(day, by, days)
          .map(|day| ElementRef::TimeUnit { day, unit })
      }
      | (_, ElementRef::DayTop { day }) => {
        shift(day, by, days).map(|day| ElementRef::DayTop { day })
      }
      | (_, ElementRef::Day { day }) => {
        shift(day, by, days).map(|day| ElementRef::Day { day })
      }
    }
  }

  /// Wheel up (positive) scrolls toward
  /// earlier times.
  pub fn mouse_wheel(
    &mut self,
    delta: i32
  ) -> Vec<CalendarEvent> {
    if self.scroll_view(-delta.signum()) {
      vec![CalendarEvent::ViewScrolled]
    } else {
      vec![]
    }
  }
}
