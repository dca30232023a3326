use crate::error::{backend_error, parse_ids, require_name};

use streamq_command::{Command, CommandResult, Error};
use streamq_log::{Entry, EntryId, EntryRange, Fields, LogBackend, Order};

const XADD: &str = "XADD";
const XDEL: &str = "XDEL";
const XLEN: &str = "XLEN";
const XRANGE: &str = "XRANGE";
const XREVRANGE: &str = "XREVRANGE";
const XTRIM: &str = "XTRIM";

/// Append, scan, and delete operations on logs.
///
/// Entries are never modified after they are appended.
#[derive(Clone, Debug)]
pub struct LogStore<B>
where
    B: LogBackend,
{
    backend: B,
}

impl<B> LogStore<B>
where
    B: LogBackend,
{
    /// Creates a new `LogStore`.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Appends an entry and returns its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Fails immediately if the log name or the field map is empty.
    pub fn append(&self, log: &str, fields: Fields) -> CommandResult<Command<EntryId>> {
        require_name("log", log)?;
        if fields.is_empty() {
            return Err(Error::invalid_argument("an entry needs at least one field"));
        }

        let backend = self.backend.clone();
        let log = log.to_string();

        Ok(Command::from_future(XADD, async move {
            backend
                .append(&log, fields)
                .await
                .map_err(backend_error(XADD))
        }))
    }

    /// Returns the entries within the inclusive `range`.
    ///
    /// # Errors
    ///
    /// Fails immediately if the log name is empty or the limit is zero.
    pub fn range(&self, log: &str, range: EntryRange) -> CommandResult<Command<Vec<Entry>>> {
        require_name("log", log)?;
        if range.limit == Some(0) {
            return Err(Error::invalid_argument("range limit must be positive"));
        }

        let name = match range.order {
            Order::Ascending => XRANGE,
            Order::Descending => XREVRANGE,
        };
        let backend = self.backend.clone();
        let log = log.to_string();

        Ok(Command::from_future(name, async move {
            backend
                .range(&log, range)
                .await
                .map_err(backend_error(name))
        }))
    }

    /// Deletes entries and returns how many existed. Unknown identifiers are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Fails immediately if the log name is empty or an identifier is
    /// malformed.
    pub fn delete<S>(&self, log: &str, ids: &[S]) -> CommandResult<Command<u64>>
    where
        S: AsRef<str>,
    {
        require_name("log", log)?;
        let ids = parse_ids(ids)?;

        let backend = self.backend.clone();
        let log = log.to_string();

        Ok(Command::from_future(XDEL, async move {
            backend
                .delete(&log, &ids)
                .await
                .map_err(backend_error(XDEL))
        }))
    }

    /// Number of entries in the log.
    ///
    /// # Errors
    ///
    /// Fails immediately if the log name is empty.
    pub fn len(&self, log: &str) -> CommandResult<Command<u64>> {
        require_name("log", log)?;

        let backend = self.backend.clone();
        let log = log.to_string();

        Ok(Command::from_future(XLEN, async move {
            backend.len(&log).await.map_err(backend_error(XLEN))
        }))
    }

    /// Drops the oldest entries so that at most `max_len` remain, returning
    /// how many were dropped.
    ///
    /// # Errors
    ///
    /// Fails immediately if the log name is empty.
    pub fn trim(&self, log: &str, max_len: u64) -> CommandResult<Command<u64>> {
        require_name("log", log)?;

        let backend = self.backend.clone();
        let log = log.to_string();

        Ok(Command::from_future(XTRIM, async move {
            backend
                .trim(&log, max_len)
                .await
                .map_err(backend_error(XTRIM))
        }))
    }
}
