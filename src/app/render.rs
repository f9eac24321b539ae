use crate::app::*;

use chrono::{DateTime, Utc};
use poll_store::scoring::{MeterCategory, MeterReading};
use serde_json::json;
use serde_json::Value as JSValue;

const BAR_WIDTH: usize = 20;

fn bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn status(poll: &Poll, now: DateTime<Utc>) -> String {
    match poll.ends_at() {
        Some(end) if poll.is_active(now) => format!("open until {}", end.format("%Y-%m-%d")),
        Some(end) => format!("ended {}", end.format("%Y-%m-%d")),
        None => "open".to_string(),
    }
}

/// One line per poll, for the list view.
pub fn poll_line(poll: &Poll, voted: Option<usize>, now: DateTime<Utc>) -> String {
    let mark = if voted.is_some() { "✓" } else { " " };
    format!(
        "{} {} [{}] {} ({} votes, {})",
        mark,
        poll.id,
        poll.category,
        poll.title,
        poll.total_votes(),
        status(poll, now)
    )
}

/// The result breakdown of one poll, with percentage bars. Options are numbered from 1.
pub fn breakdown(poll: &Poll, voted: Option<usize>) -> String {
    let results = poll.results();
    let mut s = format!("{} [{}]\n", poll.title, poll.category);
    if let Some(d) = &poll.description {
        s.push_str(&format!("  {}\n", d));
    }
    for (idx, share) in results.options.iter().enumerate() {
        let mine = if voted == Some(idx) { " ← your vote" } else { "" };
        s.push_str(&format!(
            "  {}. {:<16} {} {:>5.1}% ({}){}\n",
            idx + 1,
            share.text,
            bar(share.percent),
            share.percent,
            share.votes,
            mine
        ));
    }
    s.push_str(&format!("  Total: {} votes\n", results.total_votes));
    s
}

pub fn poll_js(poll: &Poll, voted: Option<usize>, now: DateTime<Utc>) -> JSValue {
    json!({
        "poll": poll,
        "totalVotes": poll.total_votes(),
        "active": poll.is_active(now),
        "votedOption": voted,
    })
}

pub fn results_js(results: &PollResults, voted: Option<usize>) -> JSValue {
    json!({
        "results": results,
        "votedOption": voted,
    })
}

pub fn categories() -> String {
    let mut s = "Feeling meter categories:\n".to_string();
    for c in MeterCategory::ALL {
        let names = if c.needs_names() { " (needs --names A B)" } else { "" };
        s.push_str(&format!("  {:<12} {}{}\n", c.key(), c.display_name(), names));
    }
    s.push_str("Suggested poll categories:\n");
    for c in CATEGORY_PRESETS {
        s.push_str(&format!("  {}\n", c));
    }
    s
}

/// The questions of a category, as shown when the answers are missing.
pub fn questionnaire(category: MeterCategory) -> String {
    let mut s = format!("{} ({}):\n", category.display_name(), category.key());
    for (qi, q) in category.questions().iter().enumerate() {
        s.push_str(&format!("  Q{}. {}\n", qi + 1, q.text));
        for (oi, o) in q.options.iter().enumerate() {
            s.push_str(&format!("      {}. {}\n", oi + 1, o));
        }
    }
    s
}

pub fn meter_reading(reading: &MeterReading) -> String {
    let who = match &reading.names {
        Some((a, b)) => format!("{} & {}: ", a, b),
        None => String::new(),
    };
    format!(
        "{}{} {}%\n{} {} {}\n",
        who,
        reading.category.display_name(),
        reading.score,
        bar(reading.score as f64),
        reading.verdict.emoji,
        reading.verdict.text
    )
}
