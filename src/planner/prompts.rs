//! Prompt assembly for generation requests.
//!
//! Every request is two messages: a system message (feature prompt +
//! persona + language directive) and a task-specific user message.

use chrono::NaiveDate;

use crate::config::ModelConfig;
use crate::llm::ChatMessage;
use crate::onboarding::model::UserProfile;
use crate::planner::model::DailyPlan;

/// System message: feature instructions, then the user's persona, then the
/// language directive. The directive is repeated verbatim so the model
/// answers in the user's language even when the persona was synthesized in
/// another one.
pub fn system_message(config: &ModelConfig, profile: &UserProfile) -> ChatMessage {
    ChatMessage::system(format!(
        "{base}\n\n# User Persona\n{persona}\n\nIMPORTANT: {language}",
        base = config.system_prompt,
        persona = profile.persona,
        language = profile.language().ai_instruction(),
    ))
}

/// User message for a daily plan request.
pub fn daily_plan_request(
    profile: &UserProfile,
    date: NaiveDate,
    available_hours: f64,
    extra_context: Option<&str>,
) -> ChatMessage {
    let mut request = format!(
        "I have {available_hours} hours available today ({date}).\n\n\
         My focus areas: {focus}\n",
        focus = profile.draft.focus_areas.join(", "),
    );
    if let Some(context) = extra_context.map(str::trim).filter(|c| !c.is_empty()) {
        request.push_str(&format!("\nAdditional context: {context}\n"));
    }
    request.push_str(
        "\nPlease create a realistic, time-blocked schedule for today. \
         One block per line, formatted as HH:MM-HH:MM Activity.",
    );
    ChatMessage::user(request)
}

/// User message for a weekly review request, summarizing that week's plans.
pub fn weekly_review_request(
    plans: &[DailyPlan],
    reflections: Option<&str>,
) -> ChatMessage {
    let plan_summaries = plans
        .iter()
        .map(|plan| {
            let blocks = plan
                .blocks
                .iter()
                .map(|b| format!("{}-{} {}", b.start.format("%H:%M"), b.end.format("%H:%M"), b.activity))
                .collect::<Vec<_>>()
                .join("; ");
            format!("**{}** ({}h): {}", plan.date, plan.available_hours, blocks)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut request = format!("Here are my daily plans from this week:\n\n{plan_summaries}\n");
    if let Some(reflections) = reflections.map(str::trim).filter(|r| !r.is_empty()) {
        request.push_str(&format!("\nMy reflections: {reflections}\n"));
    }
    request.push_str(
        "\nPlease provide:\n\
         1. Celebration of wins (even small ones)\n\
         2. Patterns you notice\n\
         3. 2-3 specific suggestions for next week\n\n\
         Structure your answer with a 'Summary' section and a \
         'Recommendations' section with one bullet per suggestion.",
    );
    ChatMessage::user(request)
}

/// User message for a quick-task question.
pub fn quick_task_request(question: &str) -> ChatMessage {
    ChatMessage::user(question.trim().to_string())
}

/// User message for a motivational note.
pub fn motivational_request(profile: &UserProfile) -> ChatMessage {
    ChatMessage::user(format!(
        "Share a short motivational reminder for someone working toward: {}.",
        profile.draft.goals.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeatureKind, ModelRegistry};
    use crate::llm::Role;
    use crate::onboarding::model::{test_draft, SynthesisStrategy, UserProfile};
    use crate::planner::model::{Priority, TimeBlock};

    fn profile() -> UserProfile {
        UserProfile::from_draft(
            test_draft(),
            "You coach a busy parent with 2 focused hours per day.".to_string(),
            SynthesisStrategy::Template,
        )
    }

    #[test]
    fn system_message_carries_persona_and_language() {
        let registry = ModelRegistry::defaults();
        let msg = system_message(registry.get(FeatureKind::DailyPlan), &profile());
        assert_eq!(msg.role, Role::System);
        assert!(msg.content.contains("busy parent"));
        // Arabic profile: output must be requested in Arabic
        assert!(msg.content.contains("Arabic"));
        assert!(msg.content.contains("IMPORTANT:"));
    }

    #[test]
    fn daily_plan_request_includes_budget_and_context() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let msg = daily_plan_request(&profile(), date, 2.0, Some("doctor at 2pm"));
        assert!(msg.content.contains("2 hours available today (2025-01-06)"));
        assert!(msg.content.contains("quran, career"));
        assert!(msg.content.contains("doctor at 2pm"));
    }

    #[test]
    fn daily_plan_request_omits_blank_context() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let msg = daily_plan_request(&profile(), date, 2.0, Some("  "));
        assert!(!msg.content.contains("Additional context"));
    }

    #[test]
    fn weekly_review_request_lists_plans() {
        let plan = DailyPlan {
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            blocks: vec![TimeBlock {
                start: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end: chrono::NaiveTime::from_hms_opt(9, 45, 0).unwrap(),
                activity: "Quran".to_string(),
                priority: Priority::High,
            }],
            available_hours: 2.0,
            model: "m".to_string(),
            temperature: 0.4,
            raw_response: String::new(),
            created_at: chrono::Utc::now(),
        };
        let msg = weekly_review_request(&[plan], Some("good week"));
        assert!(msg.content.contains("**2025-01-06** (2h): 09:00-09:45 Quran"));
        assert!(msg.content.contains("My reflections: good week"));
        assert!(msg.content.contains("'Summary'"));
    }
}
