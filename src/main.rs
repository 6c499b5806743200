use std::io::Write as _;
use std::sync::Arc;

use chrono::NaiveDate;
use productivity_coach::config::{AppConfig, Language};
use productivity_coach::llm::{CompletionClient, GroqClient};
use productivity_coach::onboarding::{AnswerSet, Collector, QUESTIONS, QuestionKind, Synthesizer, UserProfile};
use productivity_coach::planner::generator::{Generator, monday_of};
use productivity_coach::store::{LibSqlBackend, Store};

const USAGE: &str = "\
Usage: productivity-coach <command> [args]

Commands:
  onboard                        Set up (or redo) your profile
  plan [date] [hours] [context]  Generate a daily plan (default: today)
  review [date]                  Generate a review of that date's week
  quick <question>               Ask a quick productivity question
  motivate                       Get a short motivational note
  show plan <date>               Show a stored daily plan
  show review <date>             Show the stored review for that week
  status                         Show profile and stored counts
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export GROQ_API_KEY=gsk_...");
        std::process::exit(1);
    });

    let store: Arc<dyn Store> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {e}",
                    config.db_path.display()
                );
                std::process::exit(1);
            }),
    );

    let client: Arc<dyn CompletionClient> = Arc::new(GroqClient::new(
        config.api_key.clone(),
        config.api_base.clone(),
        config.request_timeout,
    )?);

    let generator = Generator::new(config.registry.clone(), Arc::clone(&client), Arc::clone(&store));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");

    match command {
        "onboard" => {
            let profile = run_onboarding(Arc::clone(&client), &config).await?;
            store.save_profile(&profile).await?;
            println!("\nProfile saved ({} persona).", profile.synthesis_strategy);
            println!("\n{}", profile.persona);
        }
        "plan" => {
            let profile = require_profile(&store).await?;
            let date = parse_date_arg(args.get(1))?;
            let hours = match args.get(2) {
                Some(h) => h.parse::<f64>().map_err(|_| format!("Invalid hours: {h}"))?,
                None => profile.draft.hours_per_day,
            };
            let context = args.get(3).map(String::as_str);

            let plan = generator.daily_plan(&profile, date, hours, context).await?;
            println!("Plan for {} ({} hours):\n", plan.date, plan.available_hours);
            print_plan(&plan);
        }
        "review" => {
            let profile = require_profile(&store).await?;
            let date = parse_date_arg(args.get(1))?;
            let review = generator.weekly_review(&profile, date, None).await?;
            print_review(&review);
        }
        "quick" => {
            let question = args[1..].join(" ");
            if question.trim().is_empty() {
                eprintln!("Usage: productivity-coach quick <question>");
                std::process::exit(2);
            }
            let profile = require_profile(&store).await?;
            let answer = generator.quick_task(&profile, &question).await?;
            println!("{answer}");
        }
        "motivate" => {
            let profile = require_profile(&store).await?;
            let note = generator.motivational(&profile).await?;
            println!("{note}");
        }
        "show" => match (args.get(1).map(String::as_str), args.get(2)) {
            (Some("plan"), Some(date)) => {
                let date = parse_date_arg(Some(date))?;
                match store.load_plan(date).await? {
                    Some(plan) => {
                        println!("Plan for {} ({} hours):\n", plan.date, plan.available_hours);
                        print_plan(&plan);
                    }
                    None => println!("No plan stored for {date}."),
                }
            }
            (Some("review"), Some(date)) => {
                let week_start = monday_of(parse_date_arg(Some(date))?);
                match store.load_review(week_start).await? {
                    Some(review) => print_review(&review),
                    None => println!("No review stored for the week of {week_start}."),
                }
            }
            _ => {
                eprintln!("Usage: productivity-coach show plan|review <date>");
                std::process::exit(2);
            }
        },
        "status" => {
            let stats = store.stats().await?;
            match store.load_profile().await? {
                Some(profile) => {
                    println!("Profile: {} ({} persona)", profile.draft.role.label(), profile.synthesis_strategy);
                    println!("Language: {}", profile.language().name());
                    println!("Hours per day: {}", profile.draft.hours_per_day);
                }
                None => println!("Profile: not set up (run `productivity-coach onboard`)"),
            }
            println!("Daily plans: {}", stats.daily_plans);
            println!("Weekly reviews: {}", stats.weekly_reviews);
        }
        "help" | "--help" | "-h" => print!("{USAGE}"),
        other => {
            eprintln!("Unknown command: {other}\n");
            eprint!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Interactive onboarding: ask every question, validate the answers, and
/// re-ask only the offending question until the draft is valid.
async fn run_onboarding(
    client: Arc<dyn CompletionClient>,
    config: &AppConfig,
) -> Result<UserProfile, Box<dyn std::error::Error>> {
    println!("Let's set up your profile.\n");

    let default_language = config.default_language;
    let mut answers = AnswerSet::new();
    for question in &QUESTIONS {
        let raw = ask(question, default_language)?;
        answers.set(question.id, fallback_language(question.id, raw, default_language));
    }

    let draft = loop {
        match Collector::collect(&answers) {
            Ok(draft) => break draft,
            Err(e) => {
                eprintln!("\n{e}");
                let question = QUESTIONS
                    .iter()
                    .find(|q| q.id == e.field())
                    .expect("validation names a known question");
                let raw = ask(question, default_language)?;
                answers.set(question.id, fallback_language(question.id, raw, default_language));
            }
        }
    };

    println!("\nWriting your persona...");
    let synthesizer = Synthesizer::ai_assisted(client, config.registry.clone());
    let (persona, strategy) = synthesizer.synthesize(&draft).await;
    Ok(UserProfile::from_draft(draft, persona, strategy))
}

fn ask(
    question: &productivity_coach::onboarding::Question,
    default_language: Language,
) -> std::io::Result<String> {
    println!("{}", question.prompt);
    match question.kind {
        QuestionKind::Select(options) => {
            for option in options {
                println!("  - {option}");
            }
            if question.id == "language" {
                println!("  (press Enter for {})", default_language.name());
            }
        }
        QuestionKind::List => println!("  (comma-separated)"),
        QuestionKind::Hours => println!("  (a number, e.g. 2.5)"),
    }
    print!("> ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    println!();
    Ok(line.trim().to_string())
}

/// `COACH_LANGUAGE` acts as the default for the language question: an
/// empty answer becomes the configured language's code. Other questions
/// pass through untouched.
fn fallback_language(question_id: &str, answer: String, default: Language) -> String {
    if question_id == "language" && answer.is_empty() {
        default.code().to_string()
    } else {
        answer
    }
}

async fn require_profile(
    store: &Arc<dyn Store>,
) -> Result<UserProfile, Box<dyn std::error::Error>> {
    match store.load_profile().await? {
        Some(profile) => Ok(profile),
        None => {
            eprintln!("{}", productivity_coach::error::GenerationError::NoProfile);
            std::process::exit(1);
        }
    }
}

fn parse_date_arg(arg: Option<&String>) -> Result<NaiveDate, String> {
    match arg {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date (expected YYYY-MM-DD): {s}")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn print_plan(plan: &productivity_coach::planner::DailyPlan) {
    for block in &plan.blocks {
        println!(
            "  {}-{}  {}  [{:?}]",
            block.start.format("%H:%M"),
            block.end.format("%H:%M"),
            block.activity,
            block.priority,
        );
    }
    println!(
        "\n  {} minutes planned of {} hours available",
        plan.planned_minutes(),
        plan.available_hours
    );
}

fn print_review(review: &productivity_coach::planner::WeeklyReview) {
    println!(
        "Week of {} — {} ({} plans)\n",
        review.week_start,
        review.week_end,
        review.plan_dates.len()
    );
    println!("{}\n", review.summary);
    if !review.recommendations.is_empty() {
        println!("Recommendations:");
        for rec in &review.recommendations {
            println!("  - {rec}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_language_answer_falls_back_to_configured_default() {
        let answer = fallback_language("language", String::new(), Language::De);
        assert_eq!(answer, "de");
    }

    #[test]
    fn explicit_language_answer_wins_over_the_default() {
        let answer = fallback_language("language", "fr".to_string(), Language::De);
        assert_eq!(answer, "fr");
    }

    #[test]
    fn other_questions_are_not_defaulted() {
        let answer = fallback_language("goals", String::new(), Language::De);
        assert_eq!(answer, "");
    }
}
