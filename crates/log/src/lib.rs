//! Append-only log abstraction with consumer groups.
//!
//! This crate defines the data model shared by the queue and its backends,
//! and the [`LogBackend`] trait: the operations the remote keyed store must
//! execute atomically on its side. The queue never keeps an authoritative
//! copy of a cursor or pending set; every state change goes through a
//! backend call.
//!
//! Key properties a backend must uphold:
//! - Entry identifiers are strictly increasing within a log, also across
//!   deletions and trims
//! - A group read advances the cursor and records pending entries in one
//!   atomic step, so competing consumers never receive the same new entry
//! - Creating an existing group fails with an `AlreadyExists` class error
//!   and leaves the group untouched
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod entry;
mod group;
mod id;

pub use entry::{Entry, EntryRange, Fields, Order};
pub use group::{GroupInfo, PendingEntry, ReadFrom, StartPosition};
pub use id::{EntryId, ParseEntryIdError};

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use streamq_command::ErrorKind;

/// Marker trait for backend errors.
pub trait LogBackendError: Clone + Debug + Error + Send + Sync + 'static {
    /// Classifies the error for callers of the queue.
    fn kind(&self) -> ErrorKind;
}

/// Server-side log and consumer group operations of the backing store.
#[async_trait]
pub trait LogBackend: Clone + Debug + Send + Sync + 'static {
    /// The error type for the backend.
    type Error: LogBackendError;

    /// Appends an entry with a store-assigned identifier, creating the log if
    /// it does not exist.
    async fn append(&self, log: &str, fields: Fields) -> Result<EntryId, Self::Error>;

    /// Returns the entries within `range`. A missing log is empty.
    async fn range(&self, log: &str, range: EntryRange) -> Result<Vec<Entry>, Self::Error>;

    /// Removes the given entries and returns how many existed.
    async fn delete(&self, log: &str, ids: &[EntryId]) -> Result<u64, Self::Error>;

    /// Number of entries currently in the log.
    async fn len(&self, log: &str) -> Result<u64, Self::Error>;

    /// Removes the oldest entries so that at most `max_len` remain, returning
    /// how many were removed.
    async fn trim(&self, log: &str, max_len: u64) -> Result<u64, Self::Error>;

    /// Creates a consumer group and replies with the store's acknowledgment
    /// code.
    ///
    /// When the log does not exist it is created empty if `create_log` is
    /// set, otherwise the call fails with a `NotFound` class error. An
    /// existing group fails with an `AlreadyExists` class error.
    async fn create_group(
        &self,
        log: &str,
        group: &str,
        start: StartPosition,
        create_log: bool,
    ) -> Result<String, Self::Error>;

    /// Destroys a group and its pending entries. Returns whether it existed.
    async fn destroy_group(&self, log: &str, group: &str) -> Result<bool, Self::Error>;

    /// Moves a group's cursor and replies with the store's acknowledgment
    /// code.
    async fn set_group_cursor(
        &self,
        log: &str,
        group: &str,
        position: StartPosition,
    ) -> Result<String, Self::Error>;

    /// Removes a consumer from a group together with its pending entries,
    /// returning how many entries were pending for it. An unknown consumer
    /// yields 0.
    async fn remove_consumer(
        &self,
        log: &str,
        group: &str,
        consumer: &str,
    ) -> Result<u64, Self::Error>;

    /// Lists the groups of a log.
    async fn groups(&self, log: &str) -> Result<Vec<GroupInfo>, Self::Error>;

    /// Reads entries for `consumer` through `group`.
    ///
    /// With [`ReadFrom::New`], returns up to `count` entries after the
    /// group's cursor, moves the cursor to the last one, and unless `no_ack`
    /// is set records each as pending for `consumer`. With
    /// [`ReadFrom::Pending`], returns up to `count` entries pending for
    /// `consumer`, refreshing their delivery time and count; `no_ack` is
    /// ignored.
    async fn read_group(
        &self,
        log: &str,
        group: &str,
        consumer: &str,
        from: ReadFrom,
        count: usize,
        no_ack: bool,
    ) -> Result<Vec<Entry>, Self::Error>;

    /// Lists up to `count` pending entries of a group with identifiers at or
    /// after `start`, in identifier order, optionally only those of one
    /// consumer.
    async fn pending(
        &self,
        log: &str,
        group: &str,
        consumer: Option<&str>,
        start: EntryId,
        count: usize,
    ) -> Result<Vec<PendingEntry>, Self::Error>;

    /// Acknowledges entries, returning how many were pending.
    async fn ack(&self, log: &str, group: &str, ids: &[EntryId]) -> Result<u64, Self::Error>;
}
