//! Per-metric aggregation over a date window.

use chrono::NaiveDate;

use super::CalculateError;
use crate::models::{ActivityRecord, DateWindow, Metric, MetricAggregate, Window};

/// Resolve a metric by wire name.
pub fn parse_metric(name: &str) -> Result<Metric, CalculateError> {
    Metric::from_name(name).ok_or_else(|| CalculateError::UnknownMetric(name.to_string()))
}

/// Resolve a window preset by name.
pub fn parse_window(name: &str) -> Result<Window, CalculateError> {
    Window::from_name(name).ok_or_else(|| CalculateError::UnknownWindow(name.to_string()))
}

/// Aggregate `metric` over records dated within `[start, end]`, whole UTC days
/// inclusive on both ends.
pub fn aggregate_metric(
    records: &[ActivityRecord],
    metric: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<MetricAggregate, CalculateError> {
    let metric = parse_metric(metric)?;
    Ok(aggregate_in_window(
        records,
        metric,
        &DateWindow::from_days(start, end),
    ))
}

/// Aggregate `metric` over records inside `window`.
///
/// Only records that carry the metric count as entries; a meal does not add
/// an entry to `workoutMinutes`.
pub fn aggregate_in_window(
    records: &[ActivityRecord],
    metric: Metric,
    window: &DateWindow,
) -> MetricAggregate {
    let mut aggregate = MetricAggregate::default();

    for record in records.iter().filter(|r| window.contains(&r.date)) {
        let Some(value) = metric.value_of(record) else {
            continue;
        };
        aggregate.total += value;
        aggregate.entries += 1;
        if aggregate.last_activity.map_or(true, |last| record.date > last) {
            aggregate.last_activity = Some(record.date);
        }
    }

    if aggregate.entries > 0 {
        aggregate.average = aggregate.total / aggregate.entries as f64;
    }

    aggregate
}
