//! Configuration — environment loading, supported languages, and the
//! per-feature model registry.
//!
//! The registry is an immutable value injected into the generator, so tests
//! can run with fixed configurations instead of ambient global state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable holding the inference API credential.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default chat-completions endpoint base.
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Supported output languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    De,
    Ar,
    Fr,
}

impl Language {
    /// All supported languages, in onboarding display order.
    pub const ALL: [Language; 4] = [Self::En, Self::De, Self::Ar, Self::Fr];

    /// ISO-style code used for persistence and env values.
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::De => "de",
            Self::Ar => "ar",
            Self::Fr => "fr",
        }
    }

    /// Human-readable name shown in the onboarding question.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::En => "English",
            Self::De => "Deutsch",
            Self::Ar => "العربية (Arabic)",
            Self::Fr => "Français",
        }
    }

    /// Directive appended to every system message so the model answers
    /// (and reasons) in the user's language.
    pub fn ai_instruction(&self) -> &'static str {
        match self {
            Self::En => "Respond in English.",
            Self::De => "Antworte auf Deutsch.",
            Self::Ar => "Respond in Arabic (العربية). Use proper Arabic script.",
            Self::Fr => "Répondez en français.",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::En
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    /// Accepts either the code ("de") or the display name ("Deutsch").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(trimmed) || l.name() == trimmed)
            .ok_or_else(|| format!("unsupported language: {trimmed}"))
    }
}

/// The features that issue generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    DailyPlan,
    WeeklyReview,
    QuickTask,
    Motivational,
    Onboarding,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 5] = [
        Self::DailyPlan,
        Self::WeeklyReview,
        Self::QuickTask,
        Self::Motivational,
        Self::Onboarding,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DailyPlan => "daily_plan",
            Self::WeeklyReview => "weekly_review",
            Self::QuickTask => "quick_task",
            Self::Motivational => "motivational",
            Self::Onboarding => "onboarding",
        }
    }

    /// Environment variable that overrides this feature's model id.
    fn model_env_var(&self) -> &'static str {
        match self {
            Self::DailyPlan => "COACH_MODEL_DAILY_PLAN",
            Self::WeeklyReview => "COACH_MODEL_WEEKLY_REVIEW",
            Self::QuickTask => "COACH_MODEL_QUICK_TASK",
            Self::Motivational => "COACH_MODEL_MOTIVATIONAL",
            Self::Onboarding => "COACH_MODEL_ONBOARDING",
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Model, sampling, and prompt settings for one feature.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: &'static str,
}

impl ModelConfig {
    /// Build a config, rejecting temperatures outside [0, 2].
    pub fn new(
        feature: FeatureKind,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
        system_prompt: &'static str,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: format!("temperature.{feature}"),
                message: format!("{temperature} is outside [0, 2]"),
            });
        }
        Ok(Self {
            model: model.into(),
            temperature,
            max_tokens,
            system_prompt,
        })
    }
}

const DAILY_PLAN_PROMPT: &str = "\
You are an Islamic productivity coach specializing in time management for busy individuals.

Your responses should:
- Create realistic, time-blocked schedules
- Prioritize spiritual growth (Quran, prayer times)
- Acknowledge real-world constraints
- Be encouraging and practical
- Format as a clear schedule with times, one block per line (e.g. 09:00-09:45 Activity)";

const WEEKLY_REVIEW_PROMPT: &str = "\
You are a reflective productivity coach analyzing weekly progress.

Your responses should:
- Start with a 'Summary' section celebrating wins (even small ones)
- Identify patterns in productivity
- End with a 'Recommendations' section of 2-3 specific adjustments for next week
- Be constructive and encouraging, never critical";

const QUICK_TASK_PROMPT: &str = "\
You are a helpful productivity assistant for quick questions.

Keep responses:
- Brief (2-3 sentences maximum)
- Immediately actionable
- Positive and encouraging";

const MOTIVATIONAL_PROMPT: &str = "\
You are an Islamic motivational speaker focused on productivity.

Provide:
- A relevant Quranic verse or Hadith (with translation)
- Brief reflection on its meaning for productivity
- One actionable reminder
- Keep total response under 100 words";

const ONBOARDING_PROMPT: &str = "\
You are an expert at writing personalized productivity coaching personas. \
Given a user's onboarding answers, write a short natural-language description \
of how their coach should address them. Respond with the persona text only, \
no markdown formatting.";

/// Immutable feature → model configuration table.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    configs: HashMap<FeatureKind, ModelConfig>,
}

impl ModelRegistry {
    /// Registry with the stock models, temperatures, and token budgets.
    pub fn defaults() -> Self {
        Self::with_overrides(|_| None).expect("default registry is valid")
    }

    /// Registry with defaults, honoring `COACH_MODEL_*` env overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::with_overrides(|feature| std::env::var(feature.model_env_var()).ok())
    }

    fn with_overrides(
        override_for: impl Fn(FeatureKind) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults: [(FeatureKind, &str, f32, u32, &'static str); 5] = [
            // Weekly review uses the long-context model for a week of plans;
            // onboarding uses the high-quality model for persona synthesis.
            (FeatureKind::DailyPlan, "llama-3.3-70b-versatile", 0.4, 500, DAILY_PLAN_PROMPT),
            (FeatureKind::WeeklyReview, "llama-3.1-70b-versatile", 0.8, 600, WEEKLY_REVIEW_PROMPT),
            (FeatureKind::QuickTask, "llama-3.1-8b-instant", 0.5, 150, QUICK_TASK_PROMPT),
            (FeatureKind::Motivational, "llama-3.1-8b-instant", 1.1, 200, MOTIVATIONAL_PROMPT),
            (FeatureKind::Onboarding, "llama-3.3-70b-versatile", 0.7, 800, ONBOARDING_PROMPT),
        ];

        let mut configs = HashMap::new();
        for (feature, model, temperature, max_tokens, prompt) in defaults {
            let model = override_for(feature).unwrap_or_else(|| model.to_string());
            configs.insert(
                feature,
                ModelConfig::new(feature, model, temperature, max_tokens, prompt)?,
            );
        }
        Ok(Self { configs })
    }

    /// Look up the configuration for a feature.
    pub fn get(&self, feature: FeatureKind) -> &ModelConfig {
        // Every FeatureKind is inserted at construction.
        &self.configs[&feature]
    }
}

/// Application configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: SecretString,
    pub api_base: String,
    pub db_path: PathBuf,
    pub request_timeout: Duration,
    pub default_language: Language,
    pub registry: ModelRegistry,
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// A missing `GROQ_API_KEY` is a fatal startup error, not a per-call
    /// error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| ConfigError::MissingEnvVar(API_KEY_ENV.to_string()))?;

        let api_base =
            std::env::var("COACH_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let db_path = std::env::var("COACH_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/productivity-coach.db"));

        let request_timeout = match std::env::var("COACH_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "COACH_TIMEOUT_SECS".to_string(),
                    message: format!("'{raw}' is not a number of seconds"),
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(30),
        };

        let default_language = match std::env::var("COACH_LANGUAGE") {
            Ok(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: "COACH_LANGUAGE".to_string(),
                message,
            })?,
            Err(_) => Language::default(),
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            api_base,
            db_path,
            request_timeout,
            default_language,
            registry: ModelRegistry::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_defaults_match_stock_table() {
        let registry = ModelRegistry::defaults();

        let daily = registry.get(FeatureKind::DailyPlan);
        assert_eq!(daily.model, "llama-3.3-70b-versatile");
        assert_eq!(daily.temperature, 0.4);
        assert_eq!(daily.max_tokens, 500);

        let review = registry.get(FeatureKind::WeeklyReview);
        assert_eq!(review.temperature, 0.8);
        assert_eq!(review.max_tokens, 600);

        let quick = registry.get(FeatureKind::QuickTask);
        assert_eq!(quick.model, "llama-3.1-8b-instant");
        assert_eq!(quick.max_tokens, 150);

        let motivational = registry.get(FeatureKind::Motivational);
        assert_eq!(motivational.temperature, 1.1);

        let onboarding = registry.get(FeatureKind::Onboarding);
        assert_eq!(onboarding.max_tokens, 800);
    }

    #[test]
    fn registry_honors_model_override() {
        let registry = ModelRegistry::with_overrides(|feature| {
            (feature == FeatureKind::DailyPlan).then(|| "mixtral-8x7b-32768".to_string())
        })
        .unwrap();
        assert_eq!(registry.get(FeatureKind::DailyPlan).model, "mixtral-8x7b-32768");
        // Others untouched
        assert_eq!(
            registry.get(FeatureKind::WeeklyReview).model,
            "llama-3.1-70b-versatile"
        );
    }

    #[test]
    fn temperature_out_of_range_is_rejected() {
        let err = ModelConfig::new(FeatureKind::QuickTask, "m", 2.5, 100, "p").unwrap_err();
        assert!(err.to_string().contains("outside [0, 2]"));
        assert!(ModelConfig::new(FeatureKind::QuickTask, "m", -0.1, 100, "p").is_err());
        assert!(ModelConfig::new(FeatureKind::QuickTask, "m", 0.0, 100, "p").is_ok());
        assert!(ModelConfig::new(FeatureKind::QuickTask, "m", 2.0, 100, "p").is_ok());
    }

    #[test]
    fn language_parses_code_and_name() {
        assert_eq!("de".parse::<Language>().unwrap(), Language::De);
        assert_eq!("Deutsch".parse::<Language>().unwrap(), Language::De);
        assert_eq!("AR".parse::<Language>().unwrap(), Language::Ar);
        assert!("klingon".parse::<Language>().is_err());
    }

    #[test]
    fn language_instruction_mentions_language() {
        assert!(Language::Ar.ai_instruction().contains("Arabic"));
        assert!(Language::De.ai_instruction().contains("Deutsch"));
        assert!(Language::Fr.ai_instruction().contains("français"));
    }

    #[test]
    fn feature_kind_display_is_snake_case() {
        assert_eq!(FeatureKind::DailyPlan.to_string(), "daily_plan");
        assert_eq!(FeatureKind::WeeklyReview.to_string(), "weekly_review");
    }
}
