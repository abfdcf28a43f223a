//! Time windows for aggregation. Everything is UTC.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed time interval, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whole calendar days: `start` at 00:00:00.000 through `end` at 23:59:59.999.
    pub fn from_days(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start_of_day(start),
            end: end_of_day(end),
        }
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        *at >= self.start && *at <= self.end
    }

    /// Monday-start ISO week containing `day`. A Sunday closes its week.
    pub fn week_of(day: NaiveDate) -> Self {
        let monday = day - Duration::days(day.weekday().num_days_from_monday() as i64);
        Self::from_days(monday, monday + Duration::days(6))
    }

    /// Calendar month containing `day`.
    pub fn month_of(day: NaiveDate) -> Self {
        let first = day - Duration::days(day.day0() as i64);
        let last = first + Months::new(1) - Duration::days(1);
        Self::from_days(first, last)
    }
}

/// Start of a UTC day.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Last millisecond of a UTC day.
pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    start_of_day(day + Duration::days(1)) - Duration::milliseconds(1)
}

/// Named window presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Week,
    Month,
    All,
}

impl Window {
    pub fn name(&self) -> &'static str {
        match self {
            Window::Week => "week",
            Window::Month => "month",
            Window::All => "all",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "week" => Some(Window::Week),
            "month" => Some(Window::Month),
            "all" => Some(Window::All),
            _ => None,
        }
    }

    /// Resolve the preset relative to `now`.
    pub fn bounds(&self, now: DateTime<Utc>) -> DateWindow {
        let today = now.date_naive();
        match self {
            Window::Week => DateWindow::week_of(today),
            Window::Month => DateWindow::month_of(today),
            Window::All => DateWindow::new(DateTime::UNIX_EPOCH, now),
        }
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
