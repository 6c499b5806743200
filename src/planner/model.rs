//! Generated artifact models — daily plans and weekly reviews.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority of a scheduled activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

/// One scheduled activity within a daily plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub activity: String,
    #[serde(default)]
    pub priority: Priority,
}

impl TimeBlock {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// A generated daily plan. At most one per date; regeneration replaces.
///
/// The raw model response is retained for audit and diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPlan {
    pub date: NaiveDate,
    /// Time blocks ordered by start. Pairwise non-overlapping, total
    /// duration within `available_hours`.
    pub blocks: Vec<TimeBlock>,
    pub available_hours: f64,
    pub model: String,
    pub temperature: f32,
    pub raw_response: String,
    pub created_at: DateTime<Utc>,
}

impl DailyPlan {
    pub fn planned_minutes(&self) -> i64 {
        self.blocks.iter().map(TimeBlock::duration_minutes).sum()
    }
}

/// A generated weekly review. At most one per week-start; regeneration
/// replaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyReview {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    /// Dates of the daily plans this review covers.
    pub plan_dates: Vec<NaiveDate>,
    pub summary: String,
    pub recommendations: Vec<String>,
    pub model: String,
    pub temperature: f32,
    pub raw_response: String,
    pub created_at: DateTime<Utc>,
}
