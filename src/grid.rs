//! Weekly grid projection.
//!
//! Rows are one hour tall and split visually at the half hour. A block
//! lives in the row of its start hour; its `top_percent` is measured from
//! the top of that row (an on-the-hour start sits on the mid-row line, a
//! half-hour start on the top of the next row) and its `height_percent` is
//! relative to one row, so long sessions overflow into the rows below.

use crate::calendar::{day_label, day_number, format_iso_date, week_label, week_window};
use crate::model::{LessonStatus, Occurrence, Session, TimeOfDay, Weekday};
use crate::views::state_of;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotBlock {
    pub session_id: String,
    pub label: String,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub top_percent: f64,
    pub height_percent: f64,
    pub processed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlap {
    pub day: Weekday,
    pub first: String,
    pub second: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDay {
    pub day: Weekday,
    pub initial: String,
    pub date: String,
    pub label: String,
    pub day_of_month: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub day: Weekday,
    pub date: String,
    pub blocks: Vec<SlotBlock>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    pub hour: u16,
    pub label: String,
    pub cells: Vec<GridCell>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekGrid {
    pub offset: i64,
    pub label: String,
    pub days: Vec<GridDay>,
    pub rows: Vec<GridRow>,
    pub overlaps: Vec<Overlap>,
}

pub fn top_percent(start: TimeOfDay) -> f64 {
    50.0 + f64::from(start.minute()) / 60.0 * 100.0
}

pub fn height_percent(duration_minutes: i64) -> f64 {
    duration_minutes.max(0) as f64 / 60.0 * 100.0
}

fn sorted_for_day<'a>(sessions: &'a [Session], day: Weekday) -> Vec<&'a Session> {
    let mut out: Vec<&Session> = sessions.iter().filter(|s| s.day == day).collect();
    out.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.id.cmp(&b.id))
    });
    out
}

fn block_for(session: &Session) -> SlotBlock {
    SlotBlock {
        session_id: session.id.clone(),
        label: session.first_name().to_string(),
        start_time: session.start_time,
        end_time: session.end_time,
        top_percent: top_percent(session.start_time),
        height_percent: height_percent(session.duration_minutes()),
        processed: false,
    }
}

/// Half-hour-precise cell: sessions on `day` starting in `hour`.
/// Overlapping bookings are all returned.
pub fn project_cell(sessions: &[Session], day: Weekday, hour: u16) -> Vec<SlotBlock> {
    sorted_for_day(sessions, day)
        .into_iter()
        .filter(|s| s.start_time.hour() == hour)
        .map(block_for)
        .collect()
}

/// Hour-bucket variant: `start_hour <= hour < end_hour`.
pub fn occupies_hour(session: &Session, hour: u16) -> bool {
    session.start_time.hour() <= hour && hour < session.end_time.hour()
}

pub fn bucket_cell<'a>(sessions: &'a [Session], day: Weekday, hour: u16) -> Vec<&'a Session> {
    sorted_for_day(sessions, day)
        .into_iter()
        .filter(|s| occupies_hour(s, hour))
        .collect()
}

/// Same-day pairs whose [start, end) ranges intersect. Reported, not enforced.
pub fn find_overlaps(sessions: &[Session], day: Weekday) -> Vec<Overlap> {
    let same_day = sorted_for_day(sessions, day);
    let mut out = Vec::new();
    for (i, a) in same_day.iter().enumerate() {
        if a.duration_minutes() == 0 {
            continue;
        }
        for b in same_day.iter().skip(i + 1) {
            if b.duration_minutes() == 0 {
                continue;
            }
            if a.start_time < b.end_time && b.start_time < a.end_time {
                out.push(Overlap {
                    day,
                    first: a.id.clone(),
                    second: b.id.clone(),
                });
            }
        }
    }
    out
}

fn is_processed(history: &[Occurrence], session_id: &str, date: NaiveDate) -> bool {
    state_of(history, session_id, date) != LessonStatus::Scheduled
}

pub fn week_grid(
    sessions: &[Session],
    history: &[Occurrence],
    today: NaiveDate,
    offset: i64,
) -> WeekGrid {
    let dates = week_window(today, offset);
    let days: Vec<GridDay> = Weekday::ALL
        .iter()
        .zip(dates.iter())
        .map(|(day, date)| GridDay {
            day: *day,
            initial: day.initial().to_string(),
            date: format_iso_date(*date),
            label: day_label(*date),
            day_of_month: day_number(*date),
        })
        .collect();

    let rows = TimeOfDay::hour_rows()
        .into_iter()
        .map(|row| {
            let hour = row.hour();
            let cells = Weekday::ALL
                .iter()
                .zip(dates.iter())
                .map(|(day, date)| {
                    let blocks = project_cell(sessions, *day, hour)
                        .into_iter()
                        .map(|block| SlotBlock {
                            processed: is_processed(history, &block.session_id, *date),
                            ..block
                        })
                        .collect();
                    GridCell {
                        day: *day,
                        date: format_iso_date(*date),
                        blocks,
                    }
                })
                .collect();
            GridRow {
                hour,
                label: format!("{:02}", hour),
                cells,
            }
        })
        .collect();

    let overlaps = Weekday::ALL
        .iter()
        .flat_map(|day| find_overlaps(sessions, *day))
        .collect();

    WeekGrid {
        offset,
        label: week_label(today, offset),
        days,
        rows,
        overlaps,
    }
}
