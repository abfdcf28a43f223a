//! Logged workouts and meals, and the metrics read from them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActivityId, EntityId, UserId};

/// Kind of logged activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Workout,
    Meal,
}

/// A metric that can be aggregated over activity records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    Protein,
    Carbs,
    Fat,
    Calories,
    WorkoutMinutes,
    /// Number of workout records; each workout contributes 1
    WorkoutCount,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Protein,
        Metric::Carbs,
        Metric::Fat,
        Metric::Calories,
        Metric::WorkoutMinutes,
        Metric::WorkoutCount,
    ];

    /// Wire name, also the key used in `ActivityRecord::metric_values`.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Protein => "protein",
            Metric::Carbs => "carbs",
            Metric::Fat => "fat",
            Metric::Calories => "calories",
            Metric::WorkoutMinutes => "workoutMinutes",
            Metric::WorkoutCount => "workoutCount",
        }
    }

    /// Look up a metric by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Value this record contributes, or `None` if the record does not carry
    /// the metric at all.
    pub fn value_of(&self, record: &ActivityRecord) -> Option<f64> {
        match self {
            Metric::WorkoutCount => (record.kind == ActivityKind::Workout).then_some(1.0),
            other => record.metric_values.get(other.name()).copied(),
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A workout or meal entry. Immutable once logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: ActivityId,
    pub user_id: UserId,
    pub kind: ActivityKind,

    /// When the activity happened (UTC)
    pub date: DateTime<Utc>,

    /// Metric name -> value, e.g. `{"protein": 42.0, "calories": 610.0}`
    #[serde(default)]
    pub metric_values: BTreeMap<String, f64>,
}

impl ActivityRecord {
    /// Create a record with a fresh id and no metric values.
    pub fn new(user_id: UserId, kind: ActivityKind, date: DateTime<Utc>) -> Self {
        let prefix = match kind {
            ActivityKind::Workout => "workout",
            ActivityKind::Meal => "meal",
        };
        Self {
            id: EntityId::random(prefix),
            user_id,
            kind,
            date,
            metric_values: BTreeMap::new(),
        }
    }

    /// Builder method to set a metric value.
    pub fn with_value(mut self, metric: Metric, value: f64) -> Self {
        self.metric_values.insert(metric.name().to_string(), value);
        self
    }
}

/// The four tracked macros. Used for targets, totals and averages alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub calories: f64,
}

impl Macros {
    /// Apply `f` to each macro.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            protein: f(self.protein),
            carbs: f(self.carbs),
            fat: f(self.fat),
            calories: f(self.calories),
        }
    }

    /// Values in protein, carbs, fat, calories order.
    pub fn values(&self) -> [f64; 4] {
        [self.protein, self.carbs, self.fat, self.calories]
    }
}

/// Summed macros over a set of meals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    #[serde(flatten)]
    pub macros: Macros,
    /// Number of meals summed
    pub meals: u32,
}

impl MacroTotals {
    /// Add one meal record. Missing macros count as 0.
    pub fn add(&mut self, meal: &ActivityRecord) {
        let value = |m: Metric| m.value_of(meal).unwrap_or(0.0);
        self.macros.protein += value(Metric::Protein);
        self.macros.carbs += value(Metric::Carbs);
        self.macros.fat += value(Metric::Fat);
        self.macros.calories += value(Metric::Calories);
        self.meals += 1;
    }
}

/// Totals for one metric over a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricAggregate {
    pub total: f64,
    pub entries: u32,
    /// `total / entries`, or 0 when there are no entries
    pub average: f64,
    /// Latest included activity; `None` means no activity in the window
    pub last_activity: Option<DateTime<Utc>>,
}
