mod config;
mod defaults;
use log::{debug, error, info, warn};

use std::collections::BTreeMap;

use chrono::Utc;
use snafu::prelude::*;
use uuid::Uuid;

pub use crate::config::*;
pub use crate::defaults::{default_polls, CATEGORY_PRESETS, DEFAULT_CATEGORY, DEFAULT_DURATION_DAYS};
pub use crate::storage::{FileStorage, KeyValueStore, MemoryStorage, StorageError};

pub mod builder;
pub mod manual;
pub mod scoring;
pub mod storage;

/// Key of the poll collection in the backing storage.
pub const POLLS_KEY: &str = "feelmeter_polls";
/// Key of the ballot collection in the backing storage.
pub const VOTES_KEY: &str = "feelmeter_votes";

// user id -> poll id -> chosen option
type BallotBook = BTreeMap<String, BTreeMap<String, usize>>;

/// The single owner of polls and ballots.
///
/// Every operation reads the collections from the backing storage, applies its change
/// and writes them back before returning, so the storage is always the source of truth.
/// Operations take `&mut self` and run to completion: two votes can never interleave.
///
/// The store performs no authorization. Only administrative callers should be wired
/// to [`PollStore::create_poll`], [`PollStore::update_poll`] and [`PollStore::delete_poll`].
pub struct PollStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> PollStore<S> {
    pub fn new(storage: S) -> PollStore<S> {
        PollStore { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// All the polls, most recently created first.
    ///
    /// On first use, the collection is seeded with the default polls.
    pub fn list_polls(&mut self) -> Vec<Poll> {
        self.load_polls()
    }

    pub fn get_poll(&mut self, id: &str) -> Option<Poll> {
        self.load_polls().into_iter().find(|p| p.id == id)
    }

    pub fn results(&mut self, id: &str) -> PsResult<PollResults> {
        let poll = self.get_poll(id).context(NotFoundSnafu { id })?;
        Ok(poll.results())
    }

    /// Creates a poll with all its counters at zero and puts it at the head of the collection.
    pub fn create_poll(&mut self, draft: &PollDraft) -> PsResult<Poll> {
        let draft = draft.normalized()?;
        let mut polls = self.load_polls();
        let id = fresh_id(&polls);
        let poll = Poll {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            options: draft.options.iter().map(|t| PollOption::new(t)).collect(),
            created_at: Utc::now().timestamp_millis(),
            duration: draft.duration,
        };
        polls.insert(0, poll.clone());
        self.save_polls(&polls)?;
        info!(
            "create_poll: created {} ({:?}) with {} options",
            poll.id,
            poll.title,
            poll.options.len()
        );
        Ok(poll)
    }

    /// Edits the content of a poll.
    ///
    /// An option keeps its counter only if its text at the same position is unchanged.
    /// Any other option (changed or added) starts again from zero.
    pub fn update_poll(&mut self, id: &str, patch: &PollPatch) -> PsResult<Poll> {
        let mut polls = self.load_polls();
        let idx = polls
            .iter()
            .position(|p| p.id == id)
            .context(NotFoundSnafu { id })?;
        let draft = patch.apply_to(&polls[idx]).normalized()?;

        let previous = &polls[idx];
        let options: Vec<PollOption> = draft
            .options
            .iter()
            .enumerate()
            .map(|(pos, text)| match previous.options.get(pos) {
                Some(old) if old.text == *text => old.clone(),
                _ => PollOption::new(text),
            })
            .collect();
        let updated = Poll {
            id: previous.id.clone(),
            title: draft.title,
            description: draft.description,
            category: draft.category,
            options,
            created_at: previous.created_at,
            duration: draft.duration,
        };
        debug!("update_poll: {:?} -> {:?}", previous, updated);
        polls[idx] = updated.clone();
        self.save_polls(&polls)?;
        info!("update_poll: updated {}", id);
        Ok(updated)
    }

    /// Removes a poll for good and returns it.
    ///
    /// Deleting an unknown id changes nothing and reports `NotFound`. Ballots cast on
    /// the removed poll stay in the ballot collection, where nothing reads them again.
    pub fn delete_poll(&mut self, id: &str) -> PsResult<Poll> {
        let mut polls = self.load_polls();
        let idx = polls
            .iter()
            .position(|p| p.id == id)
            .context(NotFoundSnafu { id })?;
        let removed = polls.remove(idx);
        self.save_polls(&polls)?;
        info!("delete_poll: deleted {} ({:?})", removed.id, removed.title);
        Ok(removed)
    }

    pub fn has_voted(&self, user_id: &str, poll_id: &str) -> bool {
        self.voted_option(user_id, poll_id).is_some()
    }

    /// The option the user picked on this poll, if they voted.
    pub fn voted_option(&self, user_id: &str, poll_id: &str) -> Option<usize> {
        self.load_ballots()
            .get(user_id)
            .and_then(|ballots| ballots.get(poll_id))
            .copied()
    }

    /// Records the ballot of `user_id` and adds one vote to the chosen option.
    ///
    /// The ballot is written before the tally. If the tally cannot be written, the
    /// previous ballot collection is put back, so a failed vote leaves no trace and
    /// can be retried.
    ///
    /// If putting the ballots back fails as well, the error is `BallotStuck`: the ballot
    /// stays recorded without its vote, and the user cannot vote again on this poll.
    pub fn cast_vote(&mut self, user_id: &str, poll_id: &str, option_index: usize) -> PsResult<Poll> {
        let mut polls = self.load_polls();
        let idx = polls
            .iter()
            .position(|p| p.id == poll_id)
            .context(NotFoundSnafu { id: poll_id })?;

        let mut book = self.load_ballots();
        if let Some(previous) = book.get(user_id).and_then(|b| b.get(poll_id)) {
            warn!(
                "cast_vote: user {} already voted {} on {}",
                user_id, previous, poll_id
            );
            return AlreadyVotedSnafu { user_id, poll_id }.fail();
        }

        let len = polls[idx].options.len();
        ensure!(
            option_index < len,
            InvalidOptionSnafu {
                poll_id,
                index: option_index,
                len
            }
        );

        let previous_book = self.storage.get(VOTES_KEY);
        book.entry(user_id.to_string())
            .or_default()
            .insert(poll_id.to_string(), option_index);
        self.save_ballots(&book)?;

        polls[idx].options[option_index].votes += 1;
        if let Err(e) = self.save_polls(&polls) {
            let restored = previous_book.unwrap_or_else(|| "{}".to_string());
            if let Err(e2) = self.storage.set(VOTES_KEY, &restored) {
                error!(
                    "cast_vote: could not roll back the ballot of {} on {} after {}: {}",
                    user_id, poll_id, e, e2
                );
                return Err(e2).context(BallotStuckSnafu { user_id, poll_id });
            }
            return Err(e);
        }
        info!(
            "cast_vote: user {} voted {} on {}",
            user_id, option_index, poll_id
        );
        Ok(polls.swap_remove(idx))
    }

    fn load_polls(&mut self) -> Vec<Poll> {
        let parsed = match self.storage.get(POLLS_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<Poll>>(&raw) {
                Ok(polls) => Some(polls),
                Err(e) => {
                    warn!("Stored polls are unreadable, reverting to the defaults: {}", e);
                    None
                }
            },
            None => {
                info!("No polls stored yet, installing the defaults");
                None
            }
        };
        if let Some(polls) = parsed {
            let stored = polls.len();
            let polls: Vec<Poll> = polls
                .into_iter()
                .filter(|p| {
                    let ok = (MIN_OPTIONS..=MAX_OPTIONS).contains(&p.options.len());
                    if !ok {
                        warn!(
                            "Dropping stored poll {} with {} options",
                            p.id,
                            p.options.len()
                        );
                    }
                    ok
                })
                .collect();
            if polls.len() != stored {
                if let Err(e) = self.save_polls(&polls) {
                    warn!("Could not persist the repaired polls: {}", e);
                }
            }
            debug!("load_polls: {} polls", polls.len());
            return polls;
        }
        let polls = default_polls(Utc::now().timestamp_millis());
        if let Err(e) = self.save_polls(&polls) {
            warn!("Could not persist the default polls: {}", e);
        }
        polls
    }

    fn save_polls(&mut self, polls: &[Poll]) -> PsResult<()> {
        let raw = serde_json::to_string(polls).context(EncodingSnafu { key: POLLS_KEY })?;
        self.storage
            .set(POLLS_KEY, &raw)
            .context(StorageSnafu { key: POLLS_KEY })
    }

    fn load_ballots(&self) -> BallotBook {
        match self.storage.get(VOTES_KEY) {
            Some(raw) => match serde_json::from_str::<BallotBook>(&raw) {
                Ok(book) => book,
                Err(e) => {
                    warn!("Stored ballots are unreadable, discarding them: {}", e);
                    BallotBook::new()
                }
            },
            None => BallotBook::new(),
        }
    }

    fn save_ballots(&mut self, book: &BallotBook) -> PsResult<()> {
        let raw = serde_json::to_string(book).context(EncodingSnafu { key: VOTES_KEY })?;
        self.storage
            .set(VOTES_KEY, &raw)
            .context(StorageSnafu { key: VOTES_KEY })
    }
}

fn fresh_id(polls: &[Poll]) -> String {
    loop {
        let id = format!("poll_{}", Uuid::new_v4().simple());
        if !polls.iter().any(|p| p.id == id) {
            return id;
        }
    }
}
