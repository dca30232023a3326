use crate::error::{backend_error, parse_ids, require_count, require_name};

use streamq_command::{Command, CommandResult};
use streamq_log::{Entry, EntryId, EntryRange, LogBackend, PendingEntry};

use futures::future::try_join_all;

const XACK: &str = "XACK";
const XPENDING: &str = "XPENDING";

/// A pending entry together with its data, if the data still exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingMessage {
    /// Delivery record.
    pub pending: PendingEntry,

    /// The entry itself. `None` once it was deleted from the log.
    pub entry: Option<Entry>,
}

/// Lists, returns, and acknowledges delivered but unacknowledged entries.
#[derive(Clone, Debug)]
pub struct PendingTracker<B>
where
    B: LogBackend,
{
    backend: B,
}

impl<B> PendingTracker<B>
where
    B: LogBackend,
{
    /// Creates a new `PendingTracker`.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Lists up to `max_count` pending entries of the group across all its
    /// consumers, oldest identifier first.
    ///
    /// # Errors
    ///
    /// Fails immediately if a name is empty or `max_count` is zero.
    pub fn list(
        &self,
        log: &str,
        group: &str,
        max_count: usize,
    ) -> CommandResult<Command<Vec<PendingMessage>>> {
        self.list_matching(log, group, None, max_count)
    }

    /// Like [`PendingTracker::list`] but restricted to one consumer.
    ///
    /// # Errors
    ///
    /// Fails immediately if a name is empty or `max_count` is zero.
    pub fn list_for(
        &self,
        log: &str,
        group: &str,
        consumer: &str,
        max_count: usize,
    ) -> CommandResult<Command<Vec<PendingMessage>>> {
        require_name("consumer", consumer)?;
        self.list_matching(log, group, Some(consumer), max_count)
    }

    /// Returns the data of up to `max_count` pending entries without changing
    /// their delivery state. Entries whose data was deleted are skipped and
    /// do not count towards `max_count`.
    ///
    /// # Errors
    ///
    /// Fails immediately if a name is empty or `max_count` is zero.
    pub fn pull(
        &self,
        log: &str,
        group: &str,
        max_count: usize,
    ) -> CommandResult<Command<Vec<Entry>>> {
        require_name("log", log)?;
        require_name("group", group)?;
        require_count(max_count)?;

        let backend = self.backend.clone();
        let log = log.to_string();
        let group = group.to_string();

        Ok(Command::from_future(XPENDING, async move {
            let mut entries = Vec::new();
            let mut start = EntryId::MIN;

            while entries.len() < max_count {
                let wanted = max_count - entries.len();
                let page = fetch(&backend, &log, &group, None, start, wanted).await?;
                let exhausted = page.len() < wanted;

                let next = page.last().and_then(|m| m.pending.id.successor());
                entries.extend(page.into_iter().filter_map(|m| m.entry));

                match next {
                    Some(next) if !exhausted => start = next,
                    _ => break,
                }
            }

            Ok(entries)
        }))
    }

    /// Acknowledges entries so they are no longer pending. Resolves to how
    /// many were pending; unknown identifiers are skipped.
    ///
    /// # Errors
    ///
    /// Fails immediately if a name is empty or an identifier is malformed.
    pub fn ack<S>(&self, log: &str, group: &str, ids: &[S]) -> CommandResult<Command<u64>>
    where
        S: AsRef<str>,
    {
        require_name("log", log)?;
        require_name("group", group)?;
        let ids = parse_ids(ids)?;

        let backend = self.backend.clone();
        let log = log.to_string();
        let group = group.to_string();

        Ok(Command::from_future(XACK, async move {
            backend
                .ack(&log, &group, &ids)
                .await
                .map_err(backend_error(XACK))
        }))
    }

    fn list_matching(
        &self,
        log: &str,
        group: &str,
        consumer: Option<&str>,
        max_count: usize,
    ) -> CommandResult<Command<Vec<PendingMessage>>> {
        require_name("log", log)?;
        require_name("group", group)?;
        require_count(max_count)?;

        let backend = self.backend.clone();
        let log = log.to_string();
        let group = group.to_string();
        let consumer = consumer.map(ToString::to_string);

        Ok(Command::from_future(XPENDING, async move {
            fetch(
                &backend,
                &log,
                &group,
                consumer.as_deref(),
                EntryId::MIN,
                max_count,
            )
            .await
        }))
    }
}

// Reads one page of pending records at or after `start` and joins each with
// its entry data.
async fn fetch<B>(
    backend: &B,
    log: &str,
    group: &str,
    consumer: Option<&str>,
    start: EntryId,
    count: usize,
) -> CommandResult<Vec<PendingMessage>>
where
    B: LogBackend,
{
    let pending = backend
        .pending(log, group, consumer, start, count)
        .await
        .map_err(backend_error(XPENDING))?;

    // The store only tracks identifiers; the data is a point read each.
    let reads = pending
        .iter()
        .map(|p| backend.range(log, EntryRange::all().from(p.id).to(p.id).limit(1)));
    let entries = try_join_all(reads).await.map_err(backend_error(XPENDING))?;

    Ok(pending
        .into_iter()
        .zip(entries)
        .map(|(pending, found)| PendingMessage {
            pending,
            entry: found.into_iter().next(),
        })
        .collect())
}
