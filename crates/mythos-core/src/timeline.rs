//! Serpentine timeline layout.
//!
//! Events that share an exact `(year, month, day)` collapse into one marker.
//! Markers are laid out in rows that alternate direction (left to right,
//! then right to left), joined by a single SVG path that turns with a
//! half-circle at each row end. Row capacity follows the viewport width.
//!
//! This is pure arithmetic over pixels; nothing here touches storage.

use std::{collections::BTreeMap, fmt::Write as _};

use serde::{Deserialize, Serialize};

use crate::world::Event;

/// Horizontal padding between the viewport edge and the outermost marker.
pub const MARGIN_X: f64 = 80.0;
/// Distance from the top edge to the first row, and below the last.
pub const MARGIN_Y: f64 = 80.0;
/// Vertical distance between rows; the turn arcs have half this radius.
pub const ROW_HEIGHT: f64 = 160.0;
/// Narrower viewports are laid out as if they were this wide.
pub const MIN_WIDTH: f64 = 320.0;

/// `(max width exclusive, markers per row)`; wider than the last → 6.
const BREAKPOINTS: [(f64, usize); 3] = [(640.0, 2), (1024.0, 3), (1440.0, 4)];
const WIDE_BUCKET: usize = 6;

// ─── Grouping ────────────────────────────────────────────────────────────────

/// A sortable event date. Missing month or day count as 0, so a bare year
/// sorts before any dated day in it.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EventDate {
  pub year:  i32,
  pub month: i32,
  pub day:   i32,
}

impl EventDate {
  /// `None` for events with no year; those stay off the timeline.
  pub fn of(event: &Event) -> Option<Self> {
    Some(Self {
      year:  event.year?,
      month: event.month.unwrap_or(0),
      day:   event.day.unwrap_or(0),
    })
  }
}

/// One marker on the timeline: every event on a single date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateGroup {
  pub date:   EventDate,
  pub count:  usize,
  /// In input order.
  pub events: Vec<Event>,
}

/// Group events by exact date, sorted by `(year, month, day)`.
pub fn group_events(events: &[Event]) -> Vec<DateGroup> {
  let mut by_date: BTreeMap<EventDate, Vec<Event>> = BTreeMap::new();
  for event in events {
    if let Some(date) = EventDate::of(event) {
      by_date.entry(date).or_default().push(event.clone());
    }
  }
  by_date
    .into_iter()
    .map(|(date, events)| DateGroup { date, count: events.len(), events })
    .collect()
}

// ─── Layout ──────────────────────────────────────────────────────────────────

/// Markers per row for a viewport `width` pixels wide.
pub fn bucket_size(width: f64) -> usize {
  BREAKPOINTS
    .iter()
    .find(|(max, _)| width < *max)
    .map_or(WIDE_BUCKET, |(_, n)| *n)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  LeftToRight,
  RightToLeft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineNode {
  pub row:       usize,
  /// Visual column, 0 at the left edge regardless of row direction.
  pub column:    usize,
  pub direction: Direction,
  pub x:         f64,
  pub y:         f64,
  pub group:     DateGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineLayout {
  pub width:   f64,
  pub height:  f64,
  pub per_row: usize,
  pub rows:    usize,
  pub nodes:   Vec<TimelineNode>,
  /// SVG path data through every node in chronological order.
  pub path:    String,
}

fn column_x(column: usize, per_row: usize, width: f64) -> f64 {
  if per_row <= 1 {
    return width / 2.0;
  }
  let span = width - 2.0 * MARGIN_X;
  MARGIN_X + span * column as f64 / (per_row - 1) as f64
}

/// Lay `groups` (already in chronological order) onto a serpentine path for
/// a viewport `width` pixels wide.
pub fn layout(groups: Vec<DateGroup>, width: f64) -> TimelineLayout {
  let width = width.max(MIN_WIDTH);
  let per_row = bucket_size(width);

  if groups.is_empty() {
    return TimelineLayout {
      width,
      height: 0.0,
      per_row,
      rows: 0,
      nodes: Vec::new(),
      path: String::new(),
    };
  }

  let rows = groups.len().div_ceil(per_row);
  let nodes: Vec<TimelineNode> = groups
    .into_iter()
    .enumerate()
    .map(|(i, group)| {
      let row = i / per_row;
      let step = i % per_row;
      let (direction, column) = if row % 2 == 0 {
        (Direction::LeftToRight, step)
      } else {
        (Direction::RightToLeft, per_row - 1 - step)
      };
      TimelineNode {
        row,
        column,
        direction,
        x: column_x(column, per_row, width),
        y: MARGIN_Y + row as f64 * ROW_HEIGHT,
        group,
      }
    })
    .collect();

  TimelineLayout {
    width,
    height: 2.0 * MARGIN_Y + (rows - 1) as f64 * ROW_HEIGHT,
    per_row,
    rows,
    path: svg_path(&nodes),
    nodes,
  }
}

/// Straight segments within a row; a half-circle turn between rows, bulging
/// right after a left-to-right row and left after a right-to-left one.
fn svg_path(nodes: &[TimelineNode]) -> String {
  let mut path = String::new();
  let Some(first) = nodes.first() else { return path };
  let radius = ROW_HEIGHT / 2.0;

  let _ = write!(path, "M {:.1} {:.1}", first.x, first.y);
  for pair in nodes.windows(2) {
    let (prev, next) = (&pair[0], &pair[1]);
    if next.row == prev.row {
      let _ = write!(path, " L {:.1} {:.1}", next.x, next.y);
    } else {
      let sweep = match prev.direction {
        Direction::LeftToRight => 1,
        Direction::RightToLeft => 0,
      };
      let _ = write!(
        path,
        " A {radius:.1} {radius:.1} 0 0 {sweep} {:.1} {:.1}",
        next.x, next.y
      );
    }
  }
  path
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;
  use crate::{entity::Entity, world::NewEvent};

  fn event(title: &str, date: Option<(i32, i32, i32)>) -> Event {
    let draft = match date {
      Some((y, m, d)) => NewEvent::dated(Uuid::nil(), title, y, m, d),
      None => NewEvent {
        year: None,
        month: None,
        day: None,
        ..NewEvent::dated(Uuid::nil(), title, 0, 0, 0)
      },
    };
    Event::from_draft(Uuid::new_v4(), draft, Utc::now())
  }

  fn groups(n: usize) -> Vec<DateGroup> {
    let events: Vec<Event> = (0..n).map(|i| event("e", Some((i as i32, 1, 1)))).collect();
    group_events(&events)
  }

  #[test]
  fn same_date_events_share_a_group() {
    let events = vec![
      event("Coronation", Some((1, 2, 15))),
      event("Riot", Some((1, 2, 15))),
      event("Flood", Some((1, 5, 3))),
    ];
    let groups = group_events(&events);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].count, 2);
    assert_eq!(groups[0].events[0].title, "Coronation");
    assert_eq!(groups[0].events[1].title, "Riot");
    assert_eq!(groups[1].count, 1);
  }

  #[test]
  fn groups_sort_lexicographically_and_skip_undated() {
    let events = vec![
      event("late", Some((12, 1, 1))),
      event("undated", None),
      event("negative", Some((-300, 6, 1))),
      event("early-month", Some((12, 0, 0))),
      event("mid", Some((2, 11, 30))),
    ];
    let order: Vec<_> = group_events(&events)
      .into_iter()
      .map(|g| g.events[0].title.clone())
      .collect();
    assert_eq!(order, vec!["negative", "mid", "early-month", "late"]);
  }

  #[test]
  fn bucket_size_follows_breakpoints() {
    assert_eq!(bucket_size(375.0), 2);
    assert_eq!(bucket_size(639.9), 2);
    assert_eq!(bucket_size(640.0), 3);
    assert_eq!(bucket_size(1280.0), 4);
    assert_eq!(bucket_size(1920.0), 6);
  }

  #[test]
  fn rows_alternate_direction() {
    // 1000px → 3 per row.
    let l = layout(groups(5), 1000.0);
    assert_eq!(l.per_row, 3);
    assert_eq!(l.rows, 2);

    let cols: Vec<_> = l.nodes.iter().map(|n| (n.row, n.column)).collect();
    assert_eq!(cols, vec![(0, 0), (0, 1), (0, 2), (1, 2), (1, 1)]);

    assert_eq!(l.nodes[0].x, MARGIN_X);
    assert_eq!(l.nodes[2].x, 1000.0 - MARGIN_X);
    assert_eq!(l.nodes[3].x, l.nodes[2].x);
    assert_eq!(l.nodes[3].y, MARGIN_Y + ROW_HEIGHT);
    assert_eq!(l.nodes[3].direction, Direction::RightToLeft);
    assert_eq!(l.height, 2.0 * MARGIN_Y + ROW_HEIGHT);
  }

  #[test]
  fn path_turns_at_row_ends() {
    let l = layout(groups(7), 700.0);
    // 3 per row: turns after nodes 2 and 5, right then left.
    assert!(l.path.starts_with("M 80.0 80.0 L 350.0 80.0 L 620.0 80.0 A 80.0 80.0 0 0 1 620.0 240.0"), "{}", l.path);
    assert!(l.path.contains("L 80.0 240.0 A 80.0 80.0 0 0 0 80.0 400.0"), "{}", l.path);
    assert_eq!(l.path.matches(" A ").count(), 2);
  }

  #[test]
  fn narrow_viewports_are_clamped() {
    let l = layout(groups(1), 100.0);
    assert_eq!(l.width, MIN_WIDTH);
    assert_eq!(l.nodes[0].x, MARGIN_X);
  }

  #[test]
  fn empty_input_renders_nothing() {
    let l = layout(Vec::new(), 1200.0);
    assert!(l.nodes.is_empty());
    assert!(l.path.is_empty());
    assert_eq!(l.rows, 0);
    assert_eq!(l.height, 0.0);
  }
}
