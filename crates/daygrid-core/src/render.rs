use std::io::{self, IsTerminal, Write};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::calendar::Calendar;
use crate::geometry::Rect;
use crate::selection::ElementKind;
use crate::view::DaysMode;

/// Snapshot of a laid-out calendar, printed as tables or JSON.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub mode: DaysMode,
    pub scale_minutes: u32,
    pub view_start: NaiveDateTime,
    pub view_end: NaiveDateTime,
    pub day_top_height: i32,
    pub visible_time_units: usize,
    pub time_units_offset: i32,
    pub days: Vec<DayRow>,
    pub items: Vec<ItemRow>,
    pub selection: Option<SelectionRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayRow {
    pub index: usize,
    pub date: NaiveDate,
    pub contained: usize,
    pub item_index: usize,
    pub capacity: usize,
    pub overflow_start: bool,
    pub overflow_end: bool,
    pub highlighted_units: usize,
    pub selected: bool,
    pub bounds: Rect,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemRow {
    pub id: usize,
    pub appointment_id: i64,
    pub text: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub on_day_top: bool,
    pub on_view: bool,
    pub selected: bool,
    pub column: usize,
    pub column_count: usize,
    pub bounds: Vec<Rect>,
    pub identity: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionRow {
    pub kind: ElementKind,
    pub elements: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub square: Rect,
}

impl Report {
    #[tracing::instrument(skip_all)]
    pub fn from_calendar(calendar: &Calendar) -> Self {
        let days = calendar
            .grid()
            .days()
            .iter()
            .map(|day| DayRow {
                index: day.index(),
                date: day.date(),
                contained: day.contained_items().len(),
                item_index: day.item_index(),
                capacity: day.capacity(),
                overflow_start: day.overflow_start(),
                overflow_end: day.overflow_end(),
                highlighted_units: day
                    .time_units()
                    .iter()
                    .filter(|unit| unit.is_highlighted())
                    .count(),
                selected: day.is_selected(),
                bounds: day.bounds(),
            })
            .collect();

        let items = calendar
            .items()
            .iter()
            .enumerate()
            .map(|(id, item)| ItemRow {
                id,
                appointment_id: item.appointment_id,
                text: item.text.clone(),
                start: item.start(),
                end: item.end(),
                on_day_top: item.is_on_day_top(),
                on_view: item.is_on_view(),
                selected: item.is_selected(),
                column: item.column(),
                column_count: item.column_count(),
                bounds: item.all_bounds(),
                identity: item.identity().to_string(),
            })
            .collect();

        let selection = calendar.selection().start().and_then(|first| {
            let (start, end) = calendar.selection_dates()?;
            Some(SelectionRow {
                kind: first.kind(),
                elements: calendar.selection().elements().len(),
                start,
                end,
                square: calendar.selection().square(),
            })
        });

        Self {
            mode: calendar.mode(),
            scale_minutes: calendar.scale().minutes(),
            view_start: calendar.view().start(),
            view_end: calendar.view().end(),
            day_top_height: calendar.day_top_height(),
            visible_time_units: calendar.visible_time_units(),
            time_units_offset: calendar.time_units_offset(),
            days,
            items,
            selection,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Colors only when stdout is a terminal.
    pub fn for_stdout() -> Self {
        Self::new(io::stdout().is_terminal())
    }

    #[tracing::instrument(skip(self, report))]
    pub fn print_report(&self, report: &Report) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_report(&mut out, report)
    }

    pub fn write_report<W: Write>(&self, mut writer: W, report: &Report) -> anyhow::Result<()> {
        writeln!(
            writer,
            "view      {} .. {}",
            report.view_start.format("%Y-%m-%d"),
            report.view_end.format("%Y-%m-%d")
        )?;
        writeln!(
            writer,
            "mode      {:?} ({} min, {} units visible, day top {}px)",
            report.mode, report.scale_minutes, report.visible_time_units, report.day_top_height
        )?;
        if let Some(selection) = &report.selection {
            writeln!(
                writer,
                "selection {:?} x{} {} .. {}",
                selection.kind,
                selection.elements,
                selection.start.format("%Y-%m-%d %H:%M"),
                selection.end.format("%Y-%m-%d %H:%M")
            )?;
        }
        writeln!(writer)?;

        self.write_days(&mut writer, &report.days)?;
        writeln!(writer)?;
        self.write_items(&mut writer, &report.items)?;
        Ok(())
    }

    fn write_days<W: Write>(&self, writer: W, days: &[DayRow]) -> anyhow::Result<()> {
        let headers = vec![
            "Day".to_string(),
            "Date".to_string(),
            "Items".to_string(),
            "Page".to_string(),
            "Overflow".to_string(),
            "Highlight".to_string(),
        ];

        let rows = days
            .iter()
            .map(|day| {
                let date = day.date.format("%a %Y-%m-%d").to_string();
                let date = if day.selected {
                    self.paint(&date, "7")
                } else {
                    date
                };

                let overflow = match (day.overflow_start, day.overflow_end) {
                    (true, true) => "^ v",
                    (true, false) => "^",
                    (false, true) => "v",
                    (false, false) => "",
                };

                vec![
                    day.index.to_string(),
                    date,
                    day.contained.to_string(),
                    format!("{}/{}", day.item_index, day.capacity),
                    self.paint(overflow, "33"),
                    day.highlighted_units.to_string(),
                ]
            })
            .collect();

        write_table(writer, headers, rows)
    }

    fn write_items<W: Write>(&self, writer: W, items: &[ItemRow]) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Start".to_string(),
            "End".to_string(),
            "Lane".to_string(),
            "Column".to_string(),
            "Text".to_string(),
        ];

        let rows = items
            .iter()
            .map(|item| {
                let id = self.paint(&item.appointment_id.to_string(), "33");
                let lane = if !item.on_view {
                    self.paint("hidden", "2")
                } else if item.on_day_top {
                    "top".to_string()
                } else {
                    "grid".to_string()
                };
                let text = if item.selected {
                    self.paint(&item.text, "1")
                } else {
                    item.text.clone()
                };

                vec![
                    id,
                    item.start.format("%Y-%m-%d %H:%M").to_string(),
                    item.end.format("%Y-%m-%d %H:%M").to_string(),
                    lane,
                    format!("{}/{}", item.column + 1, item.column_count.max(1)),
                    text,
                ]
            })
            .collect();

        write_table(writer, headers, rows)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || text.is_empty() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

pub fn print_json(report: &Report) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    Ok(())
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(widths.iter().copied()) {
        write!(writer, "{header:width$} ")?;
    }
    writeln!(writer)?;

    for width in widths.iter().copied() {
        write!(writer, "{:-<width$} ", "")?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(widths.iter().copied()) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
