//! Profile synthesizer — turns a validated draft into persona text.
//!
//! Two strategies: deterministic template substitution (pure, always
//! succeeds) and an AI-assisted rewrite that falls back to the template
//! when the API call fails or returns empty content. The strategy that
//! actually produced the text is reported so it can be recorded with the
//! profile.

use std::sync::Arc;

use tracing::warn;

use crate::config::{FeatureKind, ModelRegistry};
use crate::llm::{ChatMessage, CompletionClient, CompletionRequest};
use crate::onboarding::model::{DraftProfile, SynthesisStrategy};

/// Builds persona text from a draft profile.
pub struct Synthesizer {
    strategy: SynthesisStrategy,
    client: Option<Arc<dyn CompletionClient>>,
    registry: ModelRegistry,
}

impl Synthesizer {
    /// Deterministic template substitution only.
    pub fn template() -> Self {
        Self {
            strategy: SynthesisStrategy::Template,
            client: None,
            registry: ModelRegistry::defaults(),
        }
    }

    /// AI-assisted rewrite with template fallback.
    pub fn ai_assisted(client: Arc<dyn CompletionClient>, registry: ModelRegistry) -> Self {
        Self {
            strategy: SynthesisStrategy::AiAssisted,
            client: Some(client),
            registry,
        }
    }

    /// Produce persona text and the strategy that actually produced it.
    pub async fn synthesize(&self, draft: &DraftProfile) -> (String, SynthesisStrategy) {
        match (self.strategy, &self.client) {
            (SynthesisStrategy::AiAssisted, Some(client)) => {
                match self.rewrite(client.as_ref(), draft).await {
                    Some(persona) => (persona, SynthesisStrategy::AiAssisted),
                    None => (template_persona(draft), SynthesisStrategy::Template),
                }
            }
            _ => (template_persona(draft), SynthesisStrategy::Template),
        }
    }

    /// One API call rewriting the draft into a natural persona description.
    /// Returns `None` on any failure so the caller falls back.
    async fn rewrite(&self, client: &dyn CompletionClient, draft: &DraftProfile) -> Option<String> {
        let config = self.registry.get(FeatureKind::Onboarding);
        let request = CompletionRequest::new(
            config.model.clone(),
            vec![
                ChatMessage::system(config.system_prompt),
                ChatMessage::user(rewrite_prompt(draft)),
            ],
        )
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens);

        match client.complete(request).await {
            Ok(response) => {
                let persona = strip_code_fences(&response.content).trim().to_string();
                if persona.is_empty() {
                    warn!("AI persona rewrite returned empty content, falling back to template");
                    None
                } else {
                    Some(persona)
                }
            }
            Err(e) => {
                warn!(error = %e, "AI persona rewrite failed, falling back to template");
                None
            }
        }
    }
}

/// Deterministic persona text. Identical drafts produce byte-identical
/// output.
pub fn template_persona(draft: &DraftProfile) -> String {
    format!(
        "You are coaching a {role}. They have about {hours} focused hours per day, \
         so respect that limited daily time and never over-schedule. Their goals, \
         in order of importance: {goals}. Emphasize these focus areas: {focus}. \
         They respond best to {motivation}; keep your tone {tone}. {language}",
        role = draft.role.label(),
        hours = format_hours(draft.hours_per_day),
        goals = draft.goals.join(", "),
        focus = draft.focus_areas.join(", "),
        motivation = draft.motivation.label(),
        tone = draft.coaching_style.label(),
        language = draft.language.ai_instruction(),
    )
}

/// User prompt for the AI-assisted rewrite.
fn rewrite_prompt(draft: &DraftProfile) -> String {
    format!(
        "USER INFORMATION:\n\
         - Language: {language}\n\
         - Role: {role}\n\
         - Goals: {goals}\n\
         - Focused hours per day: {hours}\n\
         - Motivation style: {motivation}\n\
         - Coaching style: {tone}\n\
         - Focus areas: {focus}\n\n\
         Write the persona description for this user's productivity coach. \
         It must mention their limited daily time ({hours} hours) and their \
         stated goals. {language_instruction}",
        language = draft.language.name(),
        role = draft.role.label(),
        goals = draft.goals.join(", "),
        hours = format_hours(draft.hours_per_day),
        motivation = draft.motivation.label(),
        tone = draft.coaching_style.label(),
        focus = draft.focus_areas.join(", "),
        language_instruction = draft.language.ai_instruction(),
    )
}

/// Trim whole-response markdown code fences some models insist on.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("text").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner)
}

fn format_hours(hours: f64) -> String {
    if hours.fract() == 0.0 {
        format!("{}", hours as i64)
    } else {
        format!("{hours:.1}")
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::LlmError;
    use crate::llm::CompletionResponse;
    use crate::onboarding::model::test_draft;

    struct FixedClient(&'static str);

    #[async_trait]
    impl CompletionClient for FixedClient {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: self.0.to_string(),
                input_tokens: 0,
                output_tokens: 0,
            })
        }
    }

    struct FailingClient;

    #[async_trait]
    impl CompletionClient for FailingClient {
        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::RateLimited)
        }
    }

    #[test]
    fn template_is_idempotent() {
        let draft = test_draft();
        assert_eq!(template_persona(&draft), template_persona(&draft));
    }

    #[test]
    fn template_mentions_time_and_goals() {
        let persona = template_persona(&test_draft());
        assert!(persona.contains("2 focused hours per day"));
        assert!(persona.contains("limited daily time"));
        assert!(persona.contains("quran"));
        assert!(persona.contains("career"));
        // Arabic draft carries the Arabic directive
        assert!(persona.contains("Arabic"));
    }

    #[tokio::test]
    async fn template_strategy_never_calls_api() {
        let (persona, strategy) = Synthesizer::template().synthesize(&test_draft()).await;
        assert_eq!(strategy, SynthesisStrategy::Template);
        assert!(!persona.is_empty());
    }

    #[tokio::test]
    async fn ai_assisted_uses_rewrite() {
        let synthesizer = Synthesizer::ai_assisted(
            Arc::new(FixedClient("A warm coach for a busy parent.")),
            ModelRegistry::defaults(),
        );
        let (persona, strategy) = synthesizer.synthesize(&test_draft()).await;
        assert_eq!(strategy, SynthesisStrategy::AiAssisted);
        assert_eq!(persona, "A warm coach for a busy parent.");
    }

    #[tokio::test]
    async fn ai_assisted_falls_back_on_error() {
        let synthesizer =
            Synthesizer::ai_assisted(Arc::new(FailingClient), ModelRegistry::defaults());
        let (persona, strategy) = synthesizer.synthesize(&test_draft()).await;
        assert_eq!(strategy, SynthesisStrategy::Template);
        assert_eq!(persona, template_persona(&test_draft()));
    }

    #[tokio::test]
    async fn ai_assisted_falls_back_on_empty_content() {
        let synthesizer =
            Synthesizer::ai_assisted(Arc::new(FixedClient("   ")), ModelRegistry::defaults());
        let (_, strategy) = synthesizer.synthesize(&test_draft()).await;
        assert_eq!(strategy, SynthesisStrategy::Template);
    }

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fences("```text\npersona\n```").trim(), "persona");
        assert_eq!(strip_code_fences("plain"), "plain");
    }
}
