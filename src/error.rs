//! Error types for the productivity coach.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Configuration-related errors. These are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Bad onboarding input. Always names the offending field so the caller
/// can re-prompt for exactly that answer.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Field '{field}': '{value}' is not one of the allowed answers")]
    NotInDomain { field: String, value: String },

    #[error("Field '{field}' must not be empty")]
    Empty { field: String },

    #[error("Field '{field}': expected a positive number of hours, got {value}")]
    NotPositiveHours { field: String, value: String },

    #[error("Field '{field}' was not answered")]
    Missing { field: String },
}

impl ValidationError {
    /// The name of the field that failed validation.
    pub fn field(&self) -> &str {
        match self {
            Self::NotInDomain { field, .. }
            | Self::Empty { field }
            | Self::NotPositiveHours { field, .. }
            | Self::Missing { field } => field,
        }
    }
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with key {key}")]
    NotFound { entity: String, key: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Inference API errors for a single request attempt.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited")]
    RateLimited,

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from API: {0}")]
    InvalidResponse(String),

    #[error("Empty completion in API response")]
    EmptyCompletion,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Generation failed after the retry budget was exhausted, or the
/// request could not be started at all. Nothing has been persisted.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Inference API failed after {attempts} attempts: {cause}")]
    ApiExhausted { attempts: u32, cause: LlmError },

    #[error("No daily plans stored for the week starting {week_start}")]
    EmptyWeek { week_start: chrono::NaiveDate },

    #[error("No active user profile — run onboarding first")]
    NoProfile,
}

/// The model response did not match the expected structure. The raw
/// response text is retained for diagnosis; the caller may regenerate.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("No recognizable time blocks in response")]
    NoTimeBlocks { raw: String },

    #[error("Time block '{activity}' has end {end} not after start {start}")]
    InvertedBlock {
        start: chrono::NaiveTime,
        end: chrono::NaiveTime,
        activity: String,
        raw: String,
    },

    #[error("Time blocks '{first}' and '{second}' overlap")]
    OverlappingBlocks {
        first: String,
        second: String,
        raw: String,
    },

    #[error("Plan totals {planned_hours:.1}h, over the {budget_hours:.1}h budget")]
    BudgetExceeded {
        planned_hours: f64,
        budget_hours: f64,
        raw: String,
    },

    #[error("No recognizable summary section in response")]
    NoSummary { raw: String },

    #[error("Empty response body")]
    EmptyResponse,
}

impl ParseError {
    /// The raw model response, retained for inspection.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::NoTimeBlocks { raw }
            | Self::InvertedBlock { raw, .. }
            | Self::OverlappingBlocks { raw, .. }
            | Self::BudgetExceeded { raw, .. }
            | Self::NoSummary { raw } => Some(raw),
            Self::EmptyResponse => None,
        }
    }
}

/// Result type alias for the coach.
pub type Result<T> = std::result::Result<T, Error>;
