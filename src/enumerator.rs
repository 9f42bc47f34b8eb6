use anyhow::Result;
use tracing::{debug, warn};

use crate::storage::Storage;
use crate::types::ObjectEntry;
use crate::types::error::is_access_denied_error;

/// One page produced by a [`KeyEnumerator`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub common_prefixes: Vec<String>,
    pub entries: Vec<ObjectEntry>,
    pub is_last: bool,
}

/// Result of advancing a [`KeyEnumerator`].
///
/// `Completed` and `NotAccessible` are terminal. `NotAccessible` means the walk
/// was cut short by a permission failure, so whatever was seen so far is not
/// the whole result.
#[derive(Debug, Clone, PartialEq)]
pub enum WalkStep {
    Page(Page),
    Completed,
    NotAccessible,
}

#[derive(Debug, Clone, PartialEq)]
enum WalkState {
    Start,
    Continue(String),
    Completed,
    NotAccessible,
}

/// Lazy, paginated walk over the keys under a prefix.
///
/// Each [`next_step`](Self::next_step) issues at most one listing call. Without
/// a delimiter every matching key is returned as an entry regardless of depth.
///
/// ```no_run
/// # async fn run(storage: s3tree_rs::storage::Storage) -> anyhow::Result<()> {
/// use s3tree_rs::enumerator::{KeyEnumerator, WalkStep};
///
/// let mut enumerator = KeyEnumerator::new(&storage, "demo", "docs/").delimiter("/");
/// while let WalkStep::Page(page) = enumerator.next_step().await? {
///     println!("{} entries", page.entries.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct KeyEnumerator<'a> {
    storage: &'a Storage,
    bucket: &'a str,
    prefix: &'a str,
    delimiter: Option<&'a str>,
    page_limit: Option<i32>,
    state: WalkState,
}

impl<'a> KeyEnumerator<'a> {
    pub fn new(storage: &'a Storage, bucket: &'a str, prefix: &'a str) -> Self {
        Self {
            storage,
            bucket,
            prefix,
            delimiter: None,
            page_limit: None,
            state: WalkState::Start,
        }
    }

    /// Group keys below the next `delimiter` into common prefixes.
    pub fn delimiter(mut self, delimiter: &'a str) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Bound the number of keys per page.
    pub fn page_limit(mut self, page_limit: i32) -> Self {
        self.page_limit = Some(page_limit);
        self
    }

    /// Fetch the next page.
    ///
    /// After a terminal step, the same terminal step is returned again without
    /// calling the store. Errors other than access-denied are returned as-is and
    /// leave the enumerator where it was.
    pub async fn next_step(&mut self) -> Result<WalkStep> {
        let continuation_token = match &self.state {
            WalkState::Start => None,
            WalkState::Continue(token) => Some(token.clone()),
            WalkState::Completed => return Ok(WalkStep::Completed),
            WalkState::NotAccessible => return Ok(WalkStep::NotAccessible),
        };

        let result = self
            .storage
            .list_objects_page(
                self.bucket,
                self.prefix,
                self.delimiter,
                continuation_token,
                self.page_limit,
            )
            .await;

        let list_page = match result {
            Ok(list_page) => list_page,
            Err(e) if is_access_denied_error(&e) => {
                warn!(
                    bucket = self.bucket,
                    prefix = self.prefix,
                    "listing aborted by access denied: {:#}",
                    e
                );
                self.state = WalkState::NotAccessible;
                return Ok(WalkStep::NotAccessible);
            }
            Err(e) => return Err(e),
        };

        debug!(
            bucket = self.bucket,
            prefix = self.prefix,
            common_prefixes = list_page.common_prefixes.len(),
            entries = list_page.entries.len(),
            "listed one page."
        );

        let is_last = list_page.next_continuation_token.is_none();
        self.state = match list_page.next_continuation_token {
            Some(token) => WalkState::Continue(token),
            None => WalkState::Completed,
        };

        Ok(WalkStep::Page(Page {
            common_prefixes: list_page.common_prefixes,
            entries: list_page.entries,
            is_last,
        }))
    }
}
