//! Onboarding collector — validates answers into a `DraftProfile`.

use std::collections::HashMap;

use crate::config::Language;
use crate::error::ValidationError;
use crate::onboarding::model::{CoachingStyle, DraftProfile, MotivationStyle, UserRole};
use crate::onboarding::questions::{QuestionKind, QUESTIONS};

/// Raw answers keyed by question id. List answers are comma-separated.
#[derive(Debug, Clone, Default)]
pub struct AnswerSet {
    answers: HashMap<String, String>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, question_id: impl Into<String>, answer: impl Into<String>) {
        self.answers.insert(question_id.into(), answer.into());
    }

    pub fn with(mut self, question_id: impl Into<String>, answer: impl Into<String>) -> Self {
        self.set(question_id, answer);
        self
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }
}

/// Walks the fixed question sequence and validates each answer against its
/// declared domain. Returns a fully populated draft or the first
/// `ValidationError`, which names the offending field. No side effects.
pub struct Collector;

impl Collector {
    pub fn collect(answers: &AnswerSet) -> Result<DraftProfile, ValidationError> {
        // Validate in question order so the first error matches the first
        // unanswered or invalid question the user would see.
        for question in &QUESTIONS {
            let raw = answers
                .get(question.id)
                .ok_or_else(|| ValidationError::Missing {
                    field: question.id.to_string(),
                })?;
            validate_domain(question.id, question.kind, raw)?;
        }

        Ok(DraftProfile {
            language: parse_enum(answers, "language")?,
            role: parse_enum(answers, "role")?,
            goals: parse_list(answers.get("goals").unwrap_or_default()),
            hours_per_day: parse_hours(answers.get("hours_per_day").unwrap_or_default()),
            motivation: parse_enum(answers, "motivation_style")?,
            coaching_style: parse_enum(answers, "coaching_style")?,
            focus_areas: parse_list(answers.get("focus_areas").unwrap_or_default()),
        })
    }
}

fn validate_domain(field: &str, kind: QuestionKind, raw: &str) -> Result<(), ValidationError> {
    let trimmed = raw.trim();
    match kind {
        QuestionKind::Select(_) => {
            if trimmed.is_empty() {
                return Err(ValidationError::Empty {
                    field: field.to_string(),
                });
            }
            // Domain membership is enforced by the enum FromStr impls so
            // slugs ("parent") validate the same as full labels.
            let in_domain = match field {
                "language" => trimmed.parse::<Language>().is_ok(),
                "role" => trimmed.parse::<UserRole>().is_ok(),
                "motivation_style" => trimmed.parse::<MotivationStyle>().is_ok(),
                "coaching_style" => trimmed.parse::<CoachingStyle>().is_ok(),
                _ => false,
            };
            if !in_domain {
                return Err(ValidationError::NotInDomain {
                    field: field.to_string(),
                    value: trimmed.to_string(),
                });
            }
        }
        QuestionKind::List => {
            if parse_list(raw).is_empty() {
                return Err(ValidationError::Empty {
                    field: field.to_string(),
                });
            }
        }
        QuestionKind::Hours => {
            let hours: f64 = trimmed.parse().map_err(|_| ValidationError::NotPositiveHours {
                field: field.to_string(),
                value: trimmed.to_string(),
            })?;
            if !hours.is_finite() || hours <= 0.0 {
                return Err(ValidationError::NotPositiveHours {
                    field: field.to_string(),
                    value: trimmed.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn parse_enum<T>(answers: &AnswerSet, field: &str) -> Result<T, ValidationError>
where
    T: std::str::FromStr,
{
    let raw = answers.get(field).unwrap_or_default();
    raw.trim()
        .parse()
        .map_err(|_| ValidationError::NotInDomain {
            field: field.to_string(),
            value: raw.trim().to_string(),
        })
}

/// Split a comma-separated answer, preserving order and dropping blanks.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Precondition: already validated by `validate_domain`.
fn parse_hours(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_answers() -> AnswerSet {
        AnswerSet::new()
            .with("language", "العربية (Arabic)")
            .with("role", "Parent with young children")
            .with("goals", "quran, career")
            .with("hours_per_day", "2")
            .with("motivation_style", "Encouragement and positivity")
            .with("coaching_style", "Gentle and supportive")
            .with("focus_areas", "quran, career")
    }

    #[test]
    fn valid_answers_populate_every_field() {
        let draft = Collector::collect(&valid_answers()).unwrap();
        assert_eq!(draft.language, Language::Ar);
        assert_eq!(draft.role, UserRole::Parent);
        assert_eq!(draft.goals, vec!["quran", "career"]);
        assert_eq!(draft.hours_per_day, 2.0);
        assert_eq!(draft.motivation, MotivationStyle::Encouragement);
        assert_eq!(draft.coaching_style, CoachingStyle::Gentle);
        assert_eq!(draft.focus_areas, vec!["quran", "career"]);
    }

    #[test]
    fn slugs_are_accepted() {
        let mut answers = valid_answers();
        answers.set("language", "ar");
        answers.set("role", "parent");
        answers.set("motivation_style", "encouragement");
        answers.set("coaching_style", "gentle");
        let draft = Collector::collect(&answers).unwrap();
        assert_eq!(draft.role, UserRole::Parent);
    }

    #[test]
    fn out_of_domain_role_names_the_field() {
        let mut answers = valid_answers();
        answers.set("role", "astronaut");
        let err = Collector::collect(&answers).unwrap_err();
        assert_eq!(err.field(), "role");
    }

    #[test]
    fn missing_answer_names_the_field() {
        let mut answers = AnswerSet::new();
        answers.set("language", "en");
        let err = Collector::collect(&answers).unwrap_err();
        assert_eq!(err.field(), "role");
    }

    #[test]
    fn empty_goals_are_rejected() {
        let mut answers = valid_answers();
        answers.set("goals", " ,  , ");
        let err = Collector::collect(&answers).unwrap_err();
        assert_eq!(err.field(), "goals");
        assert!(matches!(err, ValidationError::Empty { .. }));
    }

    #[test]
    fn non_positive_hours_are_rejected() {
        for bad in ["0", "-1", "abc", ""] {
            let mut answers = valid_answers();
            answers.set("hours_per_day", bad);
            let err = Collector::collect(&answers).unwrap_err();
            assert_eq!(err.field(), "hours_per_day", "input: {bad:?}");
        }
    }

    #[test]
    fn fractional_hours_are_accepted() {
        let mut answers = valid_answers();
        answers.set("hours_per_day", "1.5");
        let draft = Collector::collect(&answers).unwrap();
        assert_eq!(draft.hours_per_day, 1.5);
    }

    #[test]
    fn goal_order_is_preserved() {
        let mut answers = valid_answers();
        answers.set("goals", "career, quran, family");
        let draft = Collector::collect(&answers).unwrap();
        assert_eq!(draft.goals, vec!["career", "quran", "family"]);
    }
}
