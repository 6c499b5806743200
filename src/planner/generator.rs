//! Generator — drives one generation request from prompt to stored
//! artifact.
//!
//! Each request walks a linear state machine:
//! Requested → Prompting → AwaitingResponse → Parsing → {Stored | Failed}.
//! The API call is retried exactly once with identical parameters; a second
//! failure surfaces a `GenerationError`. Nothing is persisted until the
//! artifact has parsed and validated, so a failed or abandoned request
//! never leaves partial state behind.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{FeatureKind, ModelConfig, ModelRegistry};
use crate::error::{Error, GenerationError, LlmError};
use crate::llm::{ChatMessage, CompletionClient, CompletionRequest, CompletionResponse};
use crate::onboarding::model::UserProfile;
use crate::planner::model::{DailyPlan, WeeklyReview};
use crate::planner::{parser, prompts};
use crate::store::Store;

/// Phases of one generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationPhase {
    Requested,
    Prompting,
    AwaitingResponse,
    Parsing,
    Stored,
    Failed,
}

impl GenerationPhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: GenerationPhase) -> bool {
        use GenerationPhase::*;
        matches!(
            (self, target),
            (Requested, Prompting)
                | (Prompting, AwaitingResponse)
                | (AwaitingResponse, Parsing)
                | (Parsing, Stored)
                // Any non-terminal phase may fail
                | (Prompting, Failed)
                | (AwaitingResponse, Failed)
                | (Parsing, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stored | Self::Failed)
    }
}

impl std::fmt::Display for GenerationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Requested => "requested",
            Self::Prompting => "prompting",
            Self::AwaitingResponse => "awaiting_response",
            Self::Parsing => "parsing",
            Self::Stored => "stored",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Tracks the phase of an in-flight request, logging each transition.
struct PhaseTracker {
    feature: FeatureKind,
    phase: GenerationPhase,
}

impl PhaseTracker {
    fn new(feature: FeatureKind) -> Self {
        debug!(feature = %feature, phase = %GenerationPhase::Requested, "Generation requested");
        Self {
            feature,
            phase: GenerationPhase::Requested,
        }
    }

    fn advance(&mut self, target: GenerationPhase) {
        debug_assert!(
            self.phase.can_transition_to(target),
            "invalid phase transition {} -> {}",
            self.phase,
            target
        );
        debug!(feature = %self.feature, from = %self.phase, to = %target, "Generation phase");
        self.phase = target;
    }

    fn fail(&mut self, cause: &dyn std::fmt::Display) {
        warn!(feature = %self.feature, phase = %self.phase, error = %cause, "Generation failed");
        self.phase = GenerationPhase::Failed;
    }
}

/// Drives generation requests: config lookup, prompt assembly, one API
/// call with a single retry, parsing, validation, persistence.
pub struct Generator {
    registry: ModelRegistry,
    client: Arc<dyn CompletionClient>,
    store: Arc<dyn Store>,
}

impl Generator {
    pub fn new(
        registry: ModelRegistry,
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            registry,
            client,
            store,
        }
    }

    /// Generate and store a daily plan for `date`. Replaces any existing
    /// plan for that date.
    pub async fn daily_plan(
        &self,
        profile: &UserProfile,
        date: NaiveDate,
        available_hours: f64,
        extra_context: Option<&str>,
    ) -> Result<DailyPlan, Error> {
        let mut tracker = PhaseTracker::new(FeatureKind::DailyPlan);
        let config = self.registry.get(FeatureKind::DailyPlan);

        tracker.advance(GenerationPhase::Prompting);
        let messages = vec![
            prompts::system_message(config, profile),
            prompts::daily_plan_request(profile, date, available_hours, extra_context),
        ];

        tracker.advance(GenerationPhase::AwaitingResponse);
        let response = match self.complete_with_retry(config, messages).await {
            Ok(response) => response,
            Err(e) => {
                tracker.fail(&e);
                return Err(e.into());
            }
        };

        tracker.advance(GenerationPhase::Parsing);
        let blocks = match parser::parse_plan(&response.content, available_hours) {
            Ok(blocks) => blocks,
            Err(e) => {
                tracker.fail(&e);
                return Err(e.into());
            }
        };

        let plan = DailyPlan {
            date,
            blocks,
            available_hours,
            model: config.model.clone(),
            temperature: config.temperature,
            raw_response: response.content,
            created_at: Utc::now(),
        };
        self.store.save_plan(&plan).await?;
        tracker.advance(GenerationPhase::Stored);
        info!(date = %date, blocks = plan.blocks.len(), "Daily plan stored");
        Ok(plan)
    }

    /// Generate and store a weekly review for the week beginning at
    /// `week_start` (normalized to Monday). Replaces any existing review
    /// for that week.
    pub async fn weekly_review(
        &self,
        profile: &UserProfile,
        week_start: NaiveDate,
        reflections: Option<&str>,
    ) -> Result<WeeklyReview, Error> {
        let mut tracker = PhaseTracker::new(FeatureKind::WeeklyReview);
        let config = self.registry.get(FeatureKind::WeeklyReview);

        let week_start = monday_of(week_start);
        let week_end = week_start + chrono::Days::new(6);

        // An empty week is refused before any API call is made.
        let plans = self.store.plans_in_range(week_start, week_end).await?;
        if plans.is_empty() {
            let e = GenerationError::EmptyWeek { week_start };
            tracker.fail(&e);
            return Err(e.into());
        }

        tracker.advance(GenerationPhase::Prompting);
        let messages = vec![
            prompts::system_message(config, profile),
            prompts::weekly_review_request(&plans, reflections),
        ];

        tracker.advance(GenerationPhase::AwaitingResponse);
        let response = match self.complete_with_retry(config, messages).await {
            Ok(response) => response,
            Err(e) => {
                tracker.fail(&e);
                return Err(e.into());
            }
        };

        tracker.advance(GenerationPhase::Parsing);
        let (summary, recommendations) = match parser::parse_review(&response.content) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracker.fail(&e);
                return Err(e.into());
            }
        };

        let review = WeeklyReview {
            week_start,
            week_end,
            plan_dates: plans.iter().map(|p| p.date).collect(),
            summary,
            recommendations,
            model: config.model.clone(),
            temperature: config.temperature,
            raw_response: response.content,
            created_at: Utc::now(),
        };
        self.store.save_review(&review).await?;
        tracker.advance(GenerationPhase::Stored);
        info!(week_start = %week_start, plans = review.plan_dates.len(), "Weekly review stored");
        Ok(review)
    }

    /// Answer a quick productivity question. Not persisted.
    pub async fn quick_task(
        &self,
        profile: &UserProfile,
        question: &str,
    ) -> Result<String, Error> {
        self.freeform(FeatureKind::QuickTask, profile, prompts::quick_task_request(question))
            .await
    }

    /// Generate a short motivational note. Not persisted.
    pub async fn motivational(&self, profile: &UserProfile) -> Result<String, Error> {
        self.freeform(
            FeatureKind::Motivational,
            profile,
            prompts::motivational_request(profile),
        )
        .await
    }

    /// Shared path for features whose output is structured text with no
    /// schema beyond being non-empty.
    async fn freeform(
        &self,
        feature: FeatureKind,
        profile: &UserProfile,
        request: ChatMessage,
    ) -> Result<String, Error> {
        let mut tracker = PhaseTracker::new(feature);
        let config = self.registry.get(feature);

        tracker.advance(GenerationPhase::Prompting);
        let messages = vec![prompts::system_message(config, profile), request];

        tracker.advance(GenerationPhase::AwaitingResponse);
        let response = match self.complete_with_retry(config, messages).await {
            Ok(response) => response,
            Err(e) => {
                tracker.fail(&e);
                return Err(e.into());
            }
        };

        tracker.advance(GenerationPhase::Parsing);
        let content = response.content.trim().to_string();
        if content.is_empty() {
            let e = crate::error::ParseError::EmptyResponse;
            tracker.fail(&e);
            return Err(e.into());
        }
        tracker.advance(GenerationPhase::Stored);
        Ok(content)
    }

    /// One API call, retried once with identical parameters on failure.
    async fn complete_with_retry(
        &self,
        config: &ModelConfig,
        messages: Vec<ChatMessage>,
    ) -> Result<CompletionResponse, GenerationError> {
        let request = CompletionRequest::new(config.model.clone(), messages)
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens);

        let first_error: LlmError = match self.client.complete(request.clone()).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };
        warn!(error = %first_error, "Completion attempt failed, retrying once");

        match self.client.complete(request).await {
            Ok(response) => Ok(response),
            Err(cause) => Err(GenerationError::ApiExhausted { attempts: 2, cause }),
        }
    }
}

/// The Monday of the week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - chrono::Days::new(date.weekday().num_days_from_monday() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_transitions_walk_the_happy_path() {
        use GenerationPhase::*;
        let path = [Requested, Prompting, AwaitingResponse, Parsing, Stored];
        for pair in path.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} should transition to {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn non_terminal_phases_can_fail() {
        use GenerationPhase::*;
        for phase in [Prompting, AwaitingResponse, Parsing] {
            assert!(phase.can_transition_to(Failed), "{phase} should be able to fail");
        }
    }

    #[test]
    fn terminal_phases_go_nowhere() {
        use GenerationPhase::*;
        for terminal in [Stored, Failed] {
            assert!(terminal.is_terminal());
            for target in [Requested, Prompting, AwaitingResponse, Parsing, Stored, Failed] {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn skipping_phases_is_invalid() {
        use GenerationPhase::*;
        assert!(!Requested.can_transition_to(AwaitingResponse));
        assert!(!Prompting.can_transition_to(Stored));
        // Requested has not started work, so it cannot fail
        assert!(!Requested.can_transition_to(Failed));
    }

    #[test]
    fn monday_normalization() {
        // 2025-01-08 is a Wednesday
        let wednesday = NaiveDate::from_ymd_opt(2025, 1, 8).unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(monday_of(wednesday), monday);
        assert_eq!(monday_of(monday), monday);
        // Sunday belongs to the week started the previous Monday
        let sunday = NaiveDate::from_ymd_opt(2025, 1, 12).unwrap();
        assert_eq!(monday_of(sunday), monday);
    }
}
