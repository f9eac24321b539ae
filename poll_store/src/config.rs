// ********* Poll data structures ***********

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::storage::StorageError;

/// The smallest number of options a poll may carry.
pub const MIN_OPTIONS: usize = 2;
/// The largest number of options a poll may carry.
pub const MAX_OPTIONS: usize = 5;
/// The longest duration a poll may advertise, about a century.
pub const MAX_DURATION_DAYS: u32 = 36_500;

/// One answer of a poll, with its running tally.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub text: String,
    pub votes: u64,
}

impl PollOption {
    pub fn new(text: &str) -> PollOption {
        PollOption {
            text: text.to_string(),
            votes: 0,
        }
    }
}

/// A titled multiple-choice question with persistent vote tallies.
///
/// The serialized form uses the same field names as the browser
/// collection it replaces, so existing data can be read back as is.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub options: Vec<PollOption>,
    /// Creation time, in milliseconds since the epoch.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    /// Number of days the poll is considered open. Advisory only.
    #[serde(alias = "durationDays")]
    pub duration: u32,
}

impl Poll {
    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at).single()
    }

    /// `None` when the creation time is invalid or the end falls outside the calendar range.
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.created()
            .and_then(|c| c.checked_add_signed(Duration::days(i64::from(self.duration))))
    }

    /// Whether the advertised duration has not elapsed yet.
    ///
    /// Nothing in the store enforces this: votes on an ended poll are still accepted.
    /// A poll whose end cannot be represented never ends.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match (self.created(), self.ends_at()) {
            (Some(_), Some(end)) => now < end,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// The breakdown shown after voting.
    pub fn results(&self) -> PollResults {
        let total = self.total_votes();
        let options = self
            .options
            .iter()
            .map(|o| OptionShare {
                text: o.text.clone(),
                votes: o.votes,
                percent: share_percent(o.votes, total),
            })
            .collect();
        PollResults {
            poll_id: self.id.clone(),
            title: self.title.clone(),
            total_votes: total,
            options,
        }
    }
}

// Rounded to one decimal place.
fn share_percent(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = (votes as f64) * 100.0 / (total as f64);
    (raw * 10.0).round() / 10.0
}

/// The content of a new poll, as entered in the admin form.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PollDraft {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub options: Vec<String>,
    pub duration: u32,
}

impl PollDraft {
    /// Trims all the texts and checks the content rules shared by creation and edition.
    pub fn normalized(&self) -> PsResult<PollDraft> {
        let title = self.title.trim().to_string();
        ensure!(
            !title.is_empty(),
            ValidationSnafu {
                message: "the title is empty"
            }
        );
        let category = self.category.trim().to_string();
        ensure!(
            !category.is_empty(),
            ValidationSnafu {
                message: "the category is empty"
            }
        );
        ensure!(
            (MIN_OPTIONS..=MAX_OPTIONS).contains(&self.options.len()),
            ValidationSnafu {
                message: format!(
                    "a poll needs between {} and {} options, got {}",
                    MIN_OPTIONS,
                    MAX_OPTIONS,
                    self.options.len()
                )
            }
        );
        let mut options: Vec<String> = Vec::with_capacity(self.options.len());
        for (idx, text) in self.options.iter().enumerate() {
            let text = text.trim();
            ensure!(
                !text.is_empty(),
                ValidationSnafu {
                    message: format!("option {} is empty", idx + 1)
                }
            );
            options.push(text.to_string());
        }
        ensure!(
            self.duration > 0,
            ValidationSnafu {
                message: "the duration must be at least one day"
            }
        );
        ensure!(
            self.duration <= MAX_DURATION_DAYS,
            ValidationSnafu {
                message: format!("the duration cannot exceed {} days", MAX_DURATION_DAYS)
            }
        );
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(PollDraft {
            title,
            description,
            category,
            options,
            duration: self.duration,
        })
    }
}

/// Changes to an existing poll. Fields left to `None` keep their current value.
///
/// A description set to an empty string removes the description.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PollPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub options: Option<Vec<String>>,
    pub duration: Option<u32>,
}

impl PollPatch {
    pub(crate) fn apply_to(&self, poll: &Poll) -> PollDraft {
        PollDraft {
            title: self.title.clone().unwrap_or_else(|| poll.title.clone()),
            description: match &self.description {
                Some(d) => Some(d.clone()),
                None => poll.description.clone(),
            },
            category: self
                .category
                .clone()
                .unwrap_or_else(|| poll.category.clone()),
            options: self
                .options
                .clone()
                .unwrap_or_else(|| poll.options.iter().map(|o| o.text.clone()).collect()),
            duration: self.duration.unwrap_or(poll.duration),
        }
    }
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct OptionShare {
    pub text: String,
    pub votes: u64,
    /// Share of the total, in percent with one decimal.
    pub percent: f64,
}

#[derive(PartialEq, Debug, Clone, Serialize)]
pub struct PollResults {
    #[serde(rename = "pollId")]
    pub poll_id: String,
    pub title: String,
    #[serde(rename = "totalVotes")]
    pub total_votes: u64,
    pub options: Vec<OptionShare>,
}

// ******** Errors *********

/// Errors returned by the poll store. Apart from `BallotStuck`, none of them leaves the
/// stored state modified.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PollStoreError {
    #[snafu(display("Invalid poll: {message}"))]
    Validation { message: String },

    #[snafu(display("Poll {id} not found"))]
    NotFound { id: String },

    #[snafu(display("User {user_id} already voted on poll {poll_id}"))]
    AlreadyVoted { user_id: String, poll_id: String },

    #[snafu(display("Option {index} does not exist in poll {poll_id} ({len} options)"))]
    InvalidOption {
        poll_id: String,
        index: usize,
        len: usize,
    },

    #[snafu(display("Could not write the {key} collection"))]
    Storage { key: String, source: StorageError },

    /// The vote failed and its ballot could not be withdrawn: the user appears as having
    /// voted on the poll although the tally was not incremented.
    #[snafu(display(
        "The vote of {user_id} on poll {poll_id} failed and its ballot could not be withdrawn"
    ))]
    BallotStuck {
        user_id: String,
        poll_id: String,
        source: StorageError,
    },

    #[snafu(display("Could not encode the {key} collection"))]
    Encoding {
        key: String,
        source: serde_json::Error,
    },
}

pub type PsResult<T> = Result<T, PollStoreError>;
