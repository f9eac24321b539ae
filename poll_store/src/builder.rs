pub use crate::config::*;
use crate::defaults::{DEFAULT_CATEGORY, DEFAULT_DURATION_DAYS};

use snafu::prelude::*;

/// A builder for assembling the content of a new poll.
///
/// The builder mirrors the admin form: the options are added one at a time,
/// and the form refuses to go beyond the maximum number of options.
///
/// ```
/// use poll_store::builder::PollBuilder;
/// use poll_store::{MemoryStorage, PollStore};
/// # use poll_store::PollStoreError;
///
/// let draft = PollBuilder::new("Favourite season?")
///     .category("সমাজ")
///     .option("Summer")?
///     .option("Monsoon")?
///     .duration_days(3)
///     .build()?;
///
/// let mut store = PollStore::new(MemoryStorage::new());
/// let poll = store.create_poll(&draft)?;
/// assert_eq!(poll.options.len(), 2);
///
/// # Ok::<(), PollStoreError>(())
/// ```
pub struct PollBuilder {
    pub(crate) _draft: PollDraft,
}

impl PollBuilder {
    pub fn new(title: &str) -> PollBuilder {
        PollBuilder {
            _draft: PollDraft {
                title: title.to_string(),
                description: None,
                category: DEFAULT_CATEGORY.to_string(),
                options: Vec::new(),
                duration: DEFAULT_DURATION_DAYS,
            },
        }
    }

    pub fn description(mut self, description: &str) -> PollBuilder {
        self._draft.description = Some(description.to_string());
        self
    }

    pub fn category(mut self, category: &str) -> PollBuilder {
        self._draft.category = category.to_string();
        self
    }

    pub fn duration_days(mut self, days: u32) -> PollBuilder {
        self._draft.duration = days;
        self
    }

    /// Adds an option at the end of the list.
    pub fn option(mut self, text: &str) -> PsResult<PollBuilder> {
        ensure!(
            self._draft.options.len() < MAX_OPTIONS,
            ValidationSnafu {
                message: format!("a poll cannot have more than {} options", MAX_OPTIONS)
            }
        );
        self._draft.options.push(text.to_string());
        Ok(self)
    }

    pub fn options(self, texts: &[String]) -> PsResult<PollBuilder> {
        texts.iter().try_fold(self, |b, t| b.option(t))
    }

    /// Checks the content and returns the normalized draft.
    pub fn build(self) -> PsResult<PollDraft> {
        self._draft.normalized()
    }
}
