//! The fixed onboarding question sequence.
//!
//! Question ids double as answer keys in `AnswerSet` and as field names in
//! validation errors.

use crate::config::Language;
use crate::onboarding::model::{CoachingStyle, MotivationStyle, UserRole};

/// How an answer is validated.
#[derive(Debug, Clone, Copy)]
pub enum QuestionKind {
    /// Must match one of the listed options (or its short slug).
    Select(&'static [&'static str]),
    /// Comma-separated list; at least one non-empty entry.
    List,
    /// Positive number of hours.
    Hours,
}

/// One onboarding question.
#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    pub kind: QuestionKind,
}

const LANGUAGE_OPTIONS: [&str; 4] = [
    Language::En.name(),
    Language::De.name(),
    Language::Ar.name(),
    Language::Fr.name(),
];

/// The full question sequence, in the order it is asked.
pub const QUESTIONS: [Question; 7] = [
    Question {
        id: "language",
        prompt: "Which language would you like to use?",
        kind: QuestionKind::Select(&LANGUAGE_OPTIONS),
    },
    Question {
        id: "role",
        prompt: "What best describes you?",
        kind: QuestionKind::Select(&UserRole::OPTIONS),
    },
    Question {
        id: "goals",
        prompt: "What are your main goals? (comma-separated, in order of importance)",
        kind: QuestionKind::List,
    },
    Question {
        id: "hours_per_day",
        prompt: "How many focused hours do you typically have per day?",
        kind: QuestionKind::Hours,
    },
    Question {
        id: "motivation_style",
        prompt: "What motivates you most?",
        kind: QuestionKind::Select(&MotivationStyle::OPTIONS),
    },
    Question {
        id: "coaching_style",
        prompt: "How should your coach come across?",
        kind: QuestionKind::Select(&CoachingStyle::OPTIONS),
    },
    Question {
        id: "focus_areas",
        prompt: "Which areas should your plans emphasize? (comma-separated)",
        kind: QuestionKind::List,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_ids_are_unique() {
        let mut ids: Vec<_> = QUESTIONS.iter().map(|q| q.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), QUESTIONS.len());
    }

    #[test]
    fn language_is_asked_first() {
        assert_eq!(QUESTIONS[0].id, "language");
    }

    #[test]
    fn select_questions_have_options() {
        for q in QUESTIONS {
            if let QuestionKind::Select(options) = q.kind {
                assert!(!options.is_empty(), "{} has no options", q.id);
            }
        }
    }
}
