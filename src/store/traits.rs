//! Backend-agnostic `Store` trait — single async interface for all
//! persistence.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::DatabaseError;
use crate::onboarding::model::UserProfile;
use crate::planner::model::{DailyPlan, WeeklyReview};

/// Aggregate counts for status displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub daily_plans: u32,
    pub weekly_reviews: u32,
    pub has_profile: bool,
}

/// Backend-agnostic storage trait covering the profile, plans, and reviews.
///
/// The profile is a singleton: saving replaces whatever was there. Plans are
/// keyed by date and reviews by week start, and saving either is an upsert.
#[async_trait]
pub trait Store: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Profile ─────────────────────────────────────────────────────

    /// Save the profile, replacing any existing one.
    async fn save_profile(&self, profile: &UserProfile) -> Result<(), DatabaseError>;

    /// Load the profile, if onboarding has completed.
    async fn load_profile(&self) -> Result<Option<UserProfile>, DatabaseError>;

    // ── Daily plans ─────────────────────────────────────────────────

    /// Save a daily plan, replacing any existing plan for the same date.
    async fn save_plan(&self, plan: &DailyPlan) -> Result<(), DatabaseError>;

    /// Get the plan for a specific date.
    async fn load_plan(&self, date: NaiveDate) -> Result<Option<DailyPlan>, DatabaseError>;

    /// List the most recent plans, newest first, up to `limit`.
    async fn list_plans(&self, limit: usize) -> Result<Vec<DailyPlan>, DatabaseError>;

    /// Get all plans with dates in `[start, end]`, oldest first.
    async fn plans_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPlan>, DatabaseError>;

    // ── Weekly reviews ──────────────────────────────────────────────

    /// Save a weekly review, replacing any existing review for the same
    /// week start.
    async fn save_review(&self, review: &WeeklyReview) -> Result<(), DatabaseError>;

    /// Get the review for the week beginning at `week_start`.
    async fn load_review(
        &self,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyReview>, DatabaseError>;

    /// List the most recent reviews, newest first, up to `limit`.
    async fn list_reviews(&self, limit: usize) -> Result<Vec<WeeklyReview>, DatabaseError>;

    // ── Stats ───────────────────────────────────────────────────────

    /// Aggregate counts for the status display.
    async fn stats(&self) -> Result<StoreStats, DatabaseError>;
}
