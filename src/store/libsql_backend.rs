//! libSQL backend — async `Store` trait implementation.
//!
//! Supports local file and in-memory databases. The profile is stored as a
//! single JSON document; plans and reviews keep their hot columns flat with
//! JSON for the nested collections.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::onboarding::model::UserProfile;
use crate::planner::model::{DailyPlan, TimeBlock, WeeklyReview};
use crate::store::migrations;
use crate::store::traits::{Store, StoreStats};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::Query(format!("Invalid date '{s}': {e}")))
}

/// Map a libsql Row to a DailyPlan.
///
/// Column order matches PLAN_COLUMNS:
/// 0:date, 1:blocks, 2:available_hours, 3:model, 4:temperature,
/// 5:raw_response, 6:created_at
fn row_to_plan(row: &libsql::Row) -> Result<DailyPlan, DatabaseError> {
    let date_str: String = row.get(0).map_err(row_err("daily_plans.date"))?;
    let blocks_json: String = row.get(1).map_err(row_err("daily_plans.blocks"))?;
    let available_hours: f64 = row.get(2).map_err(row_err("daily_plans.available_hours"))?;
    let model: String = row.get(3).map_err(row_err("daily_plans.model"))?;
    let temperature: f64 = row.get(4).map_err(row_err("daily_plans.temperature"))?;
    let raw_response: String = row.get(5).map_err(row_err("daily_plans.raw_response"))?;
    let created_str: String = row.get(6).map_err(row_err("daily_plans.created_at"))?;

    let blocks: Vec<TimeBlock> = serde_json::from_str(&blocks_json)
        .map_err(|e| DatabaseError::Serialization(format!("daily_plans.blocks: {e}")))?;

    Ok(DailyPlan {
        date: parse_date(&date_str)?,
        blocks,
        available_hours,
        model,
        temperature: temperature as f32,
        raw_response,
        created_at: parse_datetime(&created_str),
    })
}

/// Map a libsql Row to a WeeklyReview.
///
/// Column order matches REVIEW_COLUMNS:
/// 0:week_start, 1:week_end, 2:plan_dates, 3:summary, 4:recommendations,
/// 5:model, 6:temperature, 7:raw_response, 8:created_at
fn row_to_review(row: &libsql::Row) -> Result<WeeklyReview, DatabaseError> {
    let start_str: String = row.get(0).map_err(row_err("weekly_reviews.week_start"))?;
    let end_str: String = row.get(1).map_err(row_err("weekly_reviews.week_end"))?;
    let dates_json: String = row.get(2).map_err(row_err("weekly_reviews.plan_dates"))?;
    let summary: String = row.get(3).map_err(row_err("weekly_reviews.summary"))?;
    let recs_json: String = row.get(4).map_err(row_err("weekly_reviews.recommendations"))?;
    let model: String = row.get(5).map_err(row_err("weekly_reviews.model"))?;
    let temperature: f64 = row.get(6).map_err(row_err("weekly_reviews.temperature"))?;
    let raw_response: String = row.get(7).map_err(row_err("weekly_reviews.raw_response"))?;
    let created_str: String = row.get(8).map_err(row_err("weekly_reviews.created_at"))?;

    let plan_dates: Vec<NaiveDate> = serde_json::from_str(&dates_json)
        .map_err(|e| DatabaseError::Serialization(format!("weekly_reviews.plan_dates: {e}")))?;
    let recommendations: Vec<String> = serde_json::from_str(&recs_json).map_err(|e| {
        DatabaseError::Serialization(format!("weekly_reviews.recommendations: {e}"))
    })?;

    Ok(WeeklyReview {
        week_start: parse_date(&start_str)?,
        week_end: parse_date(&end_str)?,
        plan_dates,
        summary,
        recommendations,
        model,
        temperature: temperature as f32,
        raw_response,
        created_at: parse_datetime(&created_str),
    })
}

fn row_err(context: &'static str) -> impl Fn(libsql::Error) -> DatabaseError {
    move |e| DatabaseError::Query(format!("{context}: {e}"))
}

// ── Trait implementation ────────────────────────────────────────────

const PLAN_COLUMNS: &str =
    "date, blocks, available_hours, model, temperature, raw_response, created_at";

const REVIEW_COLUMNS: &str = "week_start, week_end, plan_dates, summary, recommendations, model, temperature, raw_response, created_at";

#[async_trait]
impl Store for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Profile ─────────────────────────────────────────────────────

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), DatabaseError> {
        let data = serde_json::to_string(profile)
            .map_err(|e| DatabaseError::Serialization(format!("profile: {e}")))?;

        self.conn()
            .execute(
                "INSERT INTO profile (id, data, created_at, updated_at)
                 VALUES (1, ?1, ?2, ?3)
                 ON CONFLICT (id) DO UPDATE SET data = ?1, updated_at = ?3",
                params![
                    data,
                    profile.created_at.to_rfc3339(),
                    profile.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_profile: {e}")))?;

        debug!("Profile saved");
        Ok(())
    }

    async fn load_profile(&self) -> Result<Option<UserProfile>, DatabaseError> {
        let mut rows = self
            .conn()
            .query("SELECT data FROM profile WHERE id = 1", ())
            .await
            .map_err(|e| DatabaseError::Query(format!("load_profile: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let data: String = row.get(0).map_err(row_err("profile.data"))?;
                let profile = serde_json::from_str(&data)
                    .map_err(|e| DatabaseError::Serialization(format!("profile: {e}")))?;
                Ok(Some(profile))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("load_profile: {e}"))),
        }
    }

    // ── Daily plans ─────────────────────────────────────────────────

    async fn save_plan(&self, plan: &DailyPlan) -> Result<(), DatabaseError> {
        let blocks = serde_json::to_string(&plan.blocks)
            .map_err(|e| DatabaseError::Serialization(format!("daily_plans.blocks: {e}")))?;

        self.conn()
            .execute(
                "INSERT INTO daily_plans (date, blocks, available_hours, model, temperature, raw_response, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (date) DO UPDATE SET
                     blocks = ?2, available_hours = ?3, model = ?4,
                     temperature = ?5, raw_response = ?6, created_at = ?7",
                params![
                    plan.date.to_string(),
                    blocks,
                    plan.available_hours,
                    plan.model.clone(),
                    plan.temperature as f64,
                    plan.raw_response.clone(),
                    plan.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_plan: {e}")))?;

        debug!(date = %plan.date, "Daily plan saved");
        Ok(())
    }

    async fn load_plan(&self, date: NaiveDate) -> Result<Option<DailyPlan>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PLAN_COLUMNS} FROM daily_plans WHERE date = ?1"),
                params![date.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("load_plan: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_plan(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("load_plan: {e}"))),
        }
    }

    async fn list_plans(&self, limit: usize) -> Result<Vec<DailyPlan>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {PLAN_COLUMNS} FROM daily_plans ORDER BY date DESC LIMIT ?1"),
                params![limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_plans: {e}")))?;

        let mut plans = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_plan(&row) {
                Ok(plan) => plans.push(plan),
                Err(e) => tracing::warn!("Skipping plan row: {e}"),
            }
        }
        Ok(plans)
    }

    async fn plans_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPlan>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {PLAN_COLUMNS} FROM daily_plans WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC"
                ),
                params![start.to_string(), end.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("plans_in_range: {e}")))?;

        let mut plans = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_plan(&row) {
                Ok(plan) => plans.push(plan),
                Err(e) => tracing::warn!("Skipping plan row: {e}"),
            }
        }
        Ok(plans)
    }

    // ── Weekly reviews ──────────────────────────────────────────────

    async fn save_review(&self, review: &WeeklyReview) -> Result<(), DatabaseError> {
        let plan_dates = serde_json::to_string(&review.plan_dates).map_err(|e| {
            DatabaseError::Serialization(format!("weekly_reviews.plan_dates: {e}"))
        })?;
        let recommendations = serde_json::to_string(&review.recommendations).map_err(|e| {
            DatabaseError::Serialization(format!("weekly_reviews.recommendations: {e}"))
        })?;

        self.conn()
            .execute(
                "INSERT INTO weekly_reviews (week_start, week_end, plan_dates, summary, recommendations, model, temperature, raw_response, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT (week_start) DO UPDATE SET
                     week_end = ?2, plan_dates = ?3, summary = ?4,
                     recommendations = ?5, model = ?6, temperature = ?7,
                     raw_response = ?8, created_at = ?9",
                params![
                    review.week_start.to_string(),
                    review.week_end.to_string(),
                    plan_dates,
                    review.summary.clone(),
                    recommendations,
                    review.model.clone(),
                    review.temperature as f64,
                    review.raw_response.clone(),
                    review.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_review: {e}")))?;

        debug!(week_start = %review.week_start, "Weekly review saved");
        Ok(())
    }

    async fn load_review(
        &self,
        week_start: NaiveDate,
    ) -> Result<Option<WeeklyReview>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {REVIEW_COLUMNS} FROM weekly_reviews WHERE week_start = ?1"),
                params![week_start.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("load_review: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_review(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("load_review: {e}"))),
        }
    }

    async fn list_reviews(&self, limit: usize) -> Result<Vec<WeeklyReview>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {REVIEW_COLUMNS} FROM weekly_reviews ORDER BY week_start DESC LIMIT ?1"
                ),
                params![limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_reviews: {e}")))?;

        let mut reviews = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_review(&row) {
                Ok(review) => reviews.push(review),
                Err(e) => tracing::warn!("Skipping review row: {e}"),
            }
        }
        Ok(reviews)
    }

    // ── Stats ───────────────────────────────────────────────────────

    async fn stats(&self) -> Result<StoreStats, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT
                    (SELECT COUNT(*) FROM daily_plans),
                    (SELECT COUNT(*) FROM weekly_reviews),
                    (SELECT COUNT(*) FROM profile)",
                (),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("stats: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let plans: i64 = row.get(0).unwrap_or(0);
                let reviews: i64 = row.get(1).unwrap_or(0);
                let profiles: i64 = row.get(2).unwrap_or(0);
                Ok(StoreStats {
                    daily_plans: plans as u32,
                    weekly_reviews: reviews as u32,
                    has_profile: profiles > 0,
                })
            }
            _ => Ok(StoreStats::default()),
        }
    }
}
