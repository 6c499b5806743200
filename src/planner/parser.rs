//! Tolerant parsers for model responses — one per artifact kind.
//!
//! Upstream models drift in formatting (bullet markers, dash styles,
//! markdown emphasis), so all of that tolerance is absorbed here. What the
//! parsers will not tolerate is a response with no recognizable structure:
//! that is a `ParseError`, with the raw text retained for diagnosis.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

use crate::error::ParseError;
use crate::planner::model::{Priority, TimeBlock};

/// Time range at the start of a schedule line, e.g. "9:00-10:30",
/// "09.00 – 10.00", "9:00 AM to 10:00 AM".
static TIME_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<sh>\d{1,2})[:.](?P<sm>\d{2})\s*(?P<sap>am|pm)?\s*(?:-|–|—|to|bis|à)\s*(?P<eh>\d{1,2})[:.](?P<em>\d{2})\s*(?P<eap>am|pm)?",
    )
    .expect("valid time range regex")
});

/// Leading bullet or numbering on a line. A list number must be followed
/// by whitespace so a dot-separated time ("9.30") is not mistaken for one.
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•‣>]|\d{1,2}[.)]\s)\s*").expect("valid bullet regex"));

/// Explicit priority marker inside an activity description.
static PRIORITY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:[\(\[](?P<level>high|medium|low)(?:\s+priority)?[\)\]]|(?P<bang>!{2,}))\s*$")
        .expect("valid priority regex")
});

/// Section heading, e.g. "## Summary", "**Recommendations:**", "Wins:".
static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#{1,4}\s*|\*{2})?\s*(?P<name>[^:*#]{2,40}?)\s*\*{0,2}\s*:?\s*\*{0,2}\s*$")
        .expect("valid heading regex")
});

static SUMMARY_NAMES: &[&str] = &[
    "summary",
    "overview",
    "wins",
    "this week",
    "zusammenfassung",
    "überblick",
    "erfolge",
    "résumé",
    "bilan",
    "ملخص",
    "المراجعة",
];

static RECOMMENDATION_NAMES: &[&str] = &[
    "recommendations",
    "suggestions",
    "adjustments",
    "next week",
    "empfehlungen",
    "vorschläge",
    "recommandations",
    "توصيات",
    "اقتراحات",
];

/// Parse a plan response into time blocks, validated against the plan
/// invariants: pairwise non-overlapping, total duration within the
/// available-hours budget. Blocks come back ordered by start time.
pub fn parse_plan(raw: &str, available_hours: f64) -> Result<Vec<TimeBlock>, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let mut blocks = Vec::new();
    for line in raw.lines() {
        let line = BULLET.replace(line, "");
        let Some(captures) = TIME_RANGE.captures(&line) else {
            continue;
        };

        let start = parse_time(&captures, "sh", "sm", "sap");
        let end = parse_time(&captures, "eh", "em", "eap");
        let (Some(start), Some(end)) = (start, end) else {
            continue;
        };

        let range_end = captures.get(0).map(|m| m.end()).unwrap_or(0);
        let (activity, priority) = parse_activity(&line[range_end..]);
        if activity.is_empty() {
            continue;
        }

        if end <= start {
            return Err(ParseError::InvertedBlock {
                start,
                end,
                activity,
                raw: raw.to_string(),
            });
        }

        blocks.push(TimeBlock {
            start,
            end,
            activity,
            priority,
        });
    }

    if blocks.is_empty() {
        return Err(ParseError::NoTimeBlocks {
            raw: raw.to_string(),
        });
    }

    blocks.sort_by_key(|b| b.start);

    for pair in blocks.windows(2) {
        if pair[1].start < pair[0].end {
            return Err(ParseError::OverlappingBlocks {
                first: pair[0].activity.clone(),
                second: pair[1].activity.clone(),
                raw: raw.to_string(),
            });
        }
    }

    let planned_minutes: i64 = blocks.iter().map(TimeBlock::duration_minutes).sum();
    let budget_minutes = (available_hours * 60.0).round() as i64;
    if planned_minutes > budget_minutes {
        return Err(ParseError::BudgetExceeded {
            planned_hours: planned_minutes as f64 / 60.0,
            budget_hours: available_hours,
            raw: raw.to_string(),
        });
    }

    Ok(blocks)
}

/// Parse a review response into (summary, recommendations).
///
/// Tolerates heading and bullet drift; fails with `ParseError::NoSummary`
/// when no summary section can be recognized.
pub fn parse_review(raw: &str) -> Result<(String, Vec<String>), ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let lines: Vec<&str> = raw.lines().collect();
    let summary_idx = find_heading(&lines, SUMMARY_NAMES);
    let rec_idx = find_heading(&lines, RECOMMENDATION_NAMES);

    let summary = match (summary_idx, rec_idx) {
        (Some(s), _) => {
            let end = next_heading_after(&lines, s);
            section_text(&lines[s + 1..end])
        }
        // No explicit summary heading — accept leading prose before a
        // recognized recommendations section.
        (None, Some(r)) => section_text(&lines[..r]),
        (None, None) => String::new(),
    };

    if summary.is_empty() {
        return Err(ParseError::NoSummary {
            raw: raw.to_string(),
        });
    }

    let recommendations = match rec_idx {
        Some(r) => {
            let end = next_heading_after(&lines, r);
            bullet_items(&lines[r + 1..end])
        }
        // No recommendations heading — take bullets after the summary
        // section, if any.
        None => {
            let after = summary_idx
                .map(|s| next_heading_after(&lines, s))
                .unwrap_or(0);
            bullet_items(&lines[after..])
        }
    };

    Ok((summary, recommendations))
}

fn parse_time(captures: &regex::Captures<'_>, hour: &str, minute: &str, ampm: &str) -> Option<NaiveTime> {
    let mut h: u32 = captures.name(hour)?.as_str().parse().ok()?;
    let m: u32 = captures.name(minute)?.as_str().parse().ok()?;
    if let Some(marker) = captures.name(ampm) {
        let pm = marker.as_str().eq_ignore_ascii_case("pm");
        if pm && h < 12 {
            h += 12;
        } else if !pm && h == 12 {
            h = 0;
        }
    }
    NaiveTime::from_hms_opt(h, m, 0)
}

/// Clean an activity description and extract an explicit priority marker.
fn parse_activity(rest: &str) -> (String, Priority) {
    let cleaned = rest
        .trim_matches(|c: char| matches!(c, '*' | ':' | '-' | '–' | '—') || c.is_whitespace());

    let mut priority = Priority::Medium;
    let activity = match PRIORITY_MARKER.captures(cleaned) {
        Some(captures) => {
            priority = match captures.name("level").map(|m| m.as_str().to_lowercase()) {
                Some(level) if level == "high" => Priority::High,
                Some(level) if level == "low" => Priority::Low,
                Some(_) => Priority::Medium,
                None if captures.name("bang").is_some() => Priority::High,
                None => Priority::Medium,
            };
            PRIORITY_MARKER.replace(cleaned, "").trim().to_string()
        }
        None => cleaned.to_string(),
    };

    (activity, priority)
}

fn is_heading(line: &str, names: &[&str]) -> bool {
    let Some(captures) = HEADING.captures(line) else {
        return false;
    };
    let name = captures
        .name("name")
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default();
    // Multi-word aliases ("next week") also occur in ordinary prose, so
    // they only count as headings with explicit heading punctuation.
    names
        .iter()
        .any(|n| name.starts_with(n) && (!n.contains(' ') || has_heading_marker(line)))
}

/// Markdown heading prefix, bold marker, or a trailing colon.
fn has_heading_marker(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('#')
        || trimmed.starts_with("**")
        || trimmed.trim_end_matches('*').trim_end().ends_with(':')
}

fn find_heading(lines: &[&str], names: &[&str]) -> Option<usize> {
    lines.iter().position(|line| is_heading(line, names))
}

/// Index of the next heading-looking line after `start`, or `lines.len()`.
fn next_heading_after(lines: &[&str], start: usize) -> usize {
    lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, line)| is_heading(line, SUMMARY_NAMES) || is_heading(line, RECOMMENDATION_NAMES))
        .map(|(i, _)| i)
        .unwrap_or(lines.len())
}

fn section_text(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|l| BULLET.replace(l, "").trim().to_string())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn bullet_items(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .filter(|l| BULLET.is_match(l))
        .map(|l| BULLET.replace(l, "").trim().trim_matches('*').trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_plain_schedule() {
        let raw = "09:00-09:45 Quran revision\n10:00-11:00 Deep work on project";
        let blocks = parse_plan(raw, 2.0).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].start, t(9, 0));
        assert_eq!(blocks[0].end, t(9, 45));
        assert_eq!(blocks[0].activity, "Quran revision");
        assert_eq!(blocks[1].activity, "Deep work on project");
    }

    #[test]
    fn tolerates_bullets_dashes_and_bold() {
        let raw = "\
Here is your plan:
- **9:00 - 9:30**: Morning review
* 9.30 – 10.00 — Emails
• 10:00 to 10:30: Planning
1. 10:30-11:00 Reading";
        let blocks = parse_plan(raw, 2.0).unwrap();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].activity, "Morning review");
        assert_eq!(blocks[1].activity, "Emails");
        assert_eq!(blocks[2].activity, "Planning");
        assert_eq!(blocks[3].activity, "Reading");
    }

    #[test]
    fn unbulleted_dot_times_are_kept() {
        let raw = "9.30 – 10.00 Emails\n10.00 – 10.30 Planning";
        let blocks = parse_plan(raw, 2.0).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].start, t(9, 30));
        assert_eq!(blocks[0].end, t(10, 0));
        assert_eq!(blocks[0].activity, "Emails");
        assert_eq!(blocks[1].activity, "Planning");
    }

    #[test]
    fn parses_am_pm_times() {
        let raw = "9:00 AM - 10:00 AM Writing\n12:30 pm - 1:00 pm Lunch walk";
        let blocks = parse_plan(raw, 2.0).unwrap();
        assert_eq!(blocks[0].start, t(9, 0));
        assert_eq!(blocks[1].start, t(12, 30));
        assert_eq!(blocks[1].end, t(13, 0));
    }

    #[test]
    fn extracts_priority_markers() {
        let raw = "09:00-09:30 Quran (high)\n09:30-10:00 Emails (low)\n10:00-10:30 Project!!";
        let blocks = parse_plan(raw, 2.0).unwrap();
        assert_eq!(blocks[0].priority, Priority::High);
        assert_eq!(blocks[0].activity, "Quran");
        assert_eq!(blocks[1].priority, Priority::Low);
        assert_eq!(blocks[2].priority, Priority::High);
        assert_eq!(blocks[2].activity, "Project");
    }

    #[test]
    fn blocks_come_back_sorted() {
        let raw = "10:00-10:30 Later\n09:00-09:30 Earlier";
        let blocks = parse_plan(raw, 1.0).unwrap();
        assert_eq!(blocks[0].activity, "Earlier");
        assert_eq!(blocks[1].activity, "Later");
    }

    #[test]
    fn no_time_blocks_is_a_parse_error_with_raw() {
        let raw = "Just do your best today, no schedule needed!";
        let err = parse_plan(raw, 2.0).unwrap_err();
        match err {
            ParseError::NoTimeBlocks { raw: retained } => assert_eq!(retained, raw),
            other => panic!("expected NoTimeBlocks, got {other:?}"),
        }
    }

    #[test]
    fn overlapping_blocks_are_rejected() {
        let raw = "09:00-10:00 First\n09:30-10:30 Second";
        let err = parse_plan(raw, 4.0).unwrap_err();
        assert!(matches!(err, ParseError::OverlappingBlocks { .. }));
    }

    #[test]
    fn touching_blocks_are_fine() {
        let raw = "09:00-10:00 First\n10:00-11:00 Second";
        assert!(parse_plan(raw, 2.0).is_ok());
    }

    #[test]
    fn budget_violation_is_rejected() {
        let raw = "09:00-10:30 First\n11:00-12:00 Second";
        let err = parse_plan(raw, 2.0).unwrap_err();
        match err {
            ParseError::BudgetExceeded {
                planned_hours,
                budget_hours,
                ..
            } => {
                assert_eq!(planned_hours, 2.5);
                assert_eq!(budget_hours, 2.0);
            }
            other => panic!("expected BudgetExceeded, got {other:?}"),
        }
    }

    #[test]
    fn inverted_block_is_rejected() {
        let raw = "10:00-09:00 Backwards";
        assert!(matches!(
            parse_plan(raw, 2.0).unwrap_err(),
            ParseError::InvertedBlock { .. }
        ));
    }

    #[test]
    fn empty_response_is_distinct() {
        assert!(matches!(
            parse_plan("  \n ", 2.0).unwrap_err(),
            ParseError::EmptyResponse
        ));
    }

    #[test]
    fn parses_review_with_headings() {
        let raw = "\
## Summary
You kept your Quran streak going 4 out of 5 days. Well done.

## Recommendations
- Move deep work earlier in the day
- Cap email time at 30 minutes
- Protect Friday afternoons";
        let (summary, recs) = parse_review(raw).unwrap();
        assert!(summary.contains("Quran streak"));
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0], "Move deep work earlier in the day");
    }

    #[test]
    fn tolerates_bold_headings_and_mixed_bullets() {
        let raw = "\
**Summary:**
A steady week overall.

**Suggestions**
* Start earlier
• Take real breaks";
        let (summary, recs) = parse_review(raw).unwrap();
        assert_eq!(summary, "A steady week overall.");
        assert_eq!(recs, vec!["Start earlier", "Take real breaks"]);
    }

    #[test]
    fn leading_prose_counts_as_summary_before_recommendations() {
        let raw = "\
You did well this week, especially on consistency.

Recommendations:
- Keep the morning routine";
        let (summary, recs) = parse_review(raw).unwrap();
        assert!(summary.contains("consistency"));
        assert_eq!(recs.len(), 1);
    }

    #[test]
    fn prose_mentioning_next_week_is_not_a_heading() {
        let raw = "\
Summary:
You did well on consistency.
Next week, focus on sleep.

Recommendations:
- Protect the morning block";
        let (summary, recs) = parse_review(raw).unwrap();
        assert!(summary.contains("consistency"));
        assert!(summary.contains("focus on sleep"));
        assert_eq!(recs, vec!["Protect the morning block"]);
    }

    #[test]
    fn next_week_heading_still_bounds_recommendations() {
        let raw = "\
## Summary
A good week.

## Next Week
- Start earlier";
        let (summary, recs) = parse_review(raw).unwrap();
        assert_eq!(summary, "A good week.");
        assert_eq!(recs, vec!["Start earlier"]);
    }

    #[test]
    fn review_without_summary_fails_with_raw_retained() {
        let raw = "- bullet one\n- bullet two";
        match parse_review(raw).unwrap_err() {
            ParseError::NoSummary { raw: retained } => assert_eq!(retained, raw),
            other => panic!("expected NoSummary, got {other:?}"),
        }
    }

    #[test]
    fn review_recommendations_may_be_empty() {
        let raw = "Summary\nA quiet week with little planned.";
        let (summary, recs) = parse_review(raw).unwrap();
        assert!(summary.contains("quiet week"));
        assert!(recs.is_empty());
    }

    #[test]
    fn german_review_headings_are_recognized() {
        let raw = "\
Zusammenfassung
Eine gute Woche.

Empfehlungen
- Früher anfangen";
        let (summary, recs) = parse_review(raw).unwrap();
        assert_eq!(summary, "Eine gute Woche.");
        assert_eq!(recs, vec!["Früher anfangen"]);
    }
}
