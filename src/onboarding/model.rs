//! User profile and onboarding data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::Language;

/// What best describes the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Parent,
    Student,
    Professional,
    Entrepreneur,
    Homemaker,
    Other,
}

impl UserRole {
    /// Answer options in onboarding display order.
    pub const OPTIONS: [&'static str; 6] = [
        "Parent with young children",
        "Student",
        "Working professional",
        "Entrepreneur",
        "Homemaker",
        "Other",
    ];

    /// Label used in persona text and prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Parent => "parent with young children",
            Self::Student => "student",
            Self::Professional => "working professional",
            Self::Entrepreneur => "entrepreneur",
            Self::Homemaker => "homemaker",
            Self::Other => "individual",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    /// Accepts the full option label or a short slug ("parent").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "parent with young children" | "parent" => Ok(Self::Parent),
            "student" => Ok(Self::Student),
            "working professional" | "professional" => Ok(Self::Professional),
            "entrepreneur" => Ok(Self::Entrepreneur),
            "homemaker" => Ok(Self::Homemaker),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// What kind of coaching keeps the user going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotivationStyle {
    DataDriven,
    Encouragement,
    Accountability,
    Other,
}

impl MotivationStyle {
    pub const OPTIONS: [&'static str; 4] = [
        "Data-driven progress tracking",
        "Encouragement and positivity",
        "Accountability check-ins",
        "Other",
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::DataDriven => "data-driven progress tracking",
            Self::Encouragement => "encouragement and positivity",
            Self::Accountability => "accountability check-ins",
            Self::Other => "a mix of approaches",
        }
    }
}

impl FromStr for MotivationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "data-driven progress tracking" | "data-driven" | "data_driven" => Ok(Self::DataDriven),
            "encouragement and positivity" | "encouragement" => Ok(Self::Encouragement),
            "accountability check-ins" | "accountability" => Ok(Self::Accountability),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown motivation style: {other}")),
        }
    }
}

/// How the coach should come across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachingStyle {
    Gentle,
    Direct,
    Structured,
    Flexible,
}

impl CoachingStyle {
    pub const OPTIONS: [&'static str; 4] = [
        "Gentle and supportive",
        "Direct and to the point",
        "Structured and methodical",
        "Flexible and adaptive",
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Gentle => "gentle and supportive",
            Self::Direct => "direct and to the point",
            Self::Structured => "structured and methodical",
            Self::Flexible => "flexible and adaptive",
        }
    }
}

impl FromStr for CoachingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gentle and supportive" | "gentle" => Ok(Self::Gentle),
            "direct and to the point" | "direct" => Ok(Self::Direct),
            "structured and methodical" | "structured" => Ok(Self::Structured),
            "flexible and adaptive" | "flexible" => Ok(Self::Flexible),
            other => Err(format!("unknown coaching style: {other}")),
        }
    }
}

/// Which synthesis strategy produced the persona text. Recorded with the
/// profile so generation results stay reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisStrategy {
    Template,
    AiAssisted,
}

impl std::fmt::Display for SynthesisStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template => write!(f, "template"),
            Self::AiAssisted => write!(f, "ai_assisted"),
        }
    }
}

/// Validated onboarding answers, before persona synthesis.
///
/// Every field is populated — the collector never returns a draft with a
/// sentinel value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftProfile {
    pub language: Language,
    pub role: UserRole,
    /// Stated goals, in the order the user gave them. Never empty.
    pub goals: Vec<String>,
    /// Focused hours available per day. Always positive.
    pub hours_per_day: f64,
    pub motivation: MotivationStyle,
    pub coaching_style: CoachingStyle,
    /// Areas the coach should emphasize. Never empty.
    pub focus_areas: Vec<String>,
}

/// The active user profile: validated answers plus synthesized persona.
///
/// Exactly one active profile per installation; re-running onboarding
/// replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub draft: DraftProfile,
    /// Natural-language description of how the coach should address the
    /// user. Used as part of every generation system message.
    pub persona: String,
    pub synthesis_strategy: SynthesisStrategy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn from_draft(draft: DraftProfile, persona: String, strategy: SynthesisStrategy) -> Self {
        let now = Utc::now();
        Self {
            draft,
            persona,
            synthesis_strategy: strategy,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn language(&self) -> Language {
        self.draft.language
    }
}

#[cfg(test)]
pub(crate) fn test_draft() -> DraftProfile {
    DraftProfile {
        language: Language::Ar,
        role: UserRole::Parent,
        goals: vec!["quran".to_string(), "career".to_string()],
        hours_per_day: 2.0,
        motivation: MotivationStyle::Encouragement,
        coaching_style: CoachingStyle::Gentle,
        focus_areas: vec!["quran".to_string(), "career".to_string()],
    }
}
