use crate::config::{Poll, PollOption};

/// Category proposed by the admin form when nothing else is chosen.
pub const DEFAULT_CATEGORY: &str = "মজা";

pub const DEFAULT_DURATION_DAYS: u32 = 7;

/// Categories suggested to administrators. Any other non-empty label is accepted.
pub const CATEGORY_PRESETS: [&str; 5] = ["রাজনীতি", "সমাজ", "ট্রেন্ড", "মজা", "খাদ্য"];

fn seeded(text: &str, votes: u64) -> PollOption {
    PollOption {
        text: text.to_string(),
        votes,
    }
}

/// The polls installed on first run, so that the voting page is never empty.
pub fn default_polls(now_millis: i64) -> Vec<Poll> {
    vec![
        Poll {
            id: "poll1".to_string(),
            title: "আপনি কি মনে করেন বিএনপি এই নির্বাচনে জিতবে?".to_string(),
            description: None,
            category: "রাজনীতি".to_string(),
            options: vec![
                seeded("জামাত", 430),
                seeded("বিএনপি", 510),
                seeded("কেউ না", 60),
            ],
            created_at: now_millis,
            duration: 7,
        },
        Poll {
            id: "poll2".to_string(),
            title: "আপনার প্রিয় স্ট্রিট ফুড কোনটি?".to_string(),
            description: None,
            category: "খাদ্য".to_string(),
            options: vec![
                seeded("ফুচকা", 820),
                seeded("চটপটি", 650),
                seeded("ঝালমুড়ি", 430),
            ],
            created_at: now_millis,
            duration: 5,
        },
    ]
}
