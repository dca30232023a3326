use crate::EntryId;

use std::time::{Duration, SystemTime};

/// Where a consumer group's cursor starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartPosition {
    /// Deliver every entry of the log, including those appended before the
    /// group was created.
    FromStart,

    /// Deliver only entries appended after the group was created.
    FromNow,

    /// Deliver entries with identifiers greater than the given one.
    After(EntryId),
}

/// Which entries a group read returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadFrom {
    /// Entries never delivered to the group, after its cursor.
    New,

    /// Entries already delivered to this consumer and still pending.
    Pending,
}

/// Snapshot of a consumer group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupInfo {
    /// Group name.
    pub name: String,

    /// Identifier of the last entry delivered to the group.
    pub last_delivered: EntryId,

    /// Number of entries delivered and not yet acknowledged.
    pub pending: u64,

    /// Number of consumers that have read from the group.
    pub consumers: u64,
}

/// An entry delivered to a consumer and not yet acknowledged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingEntry {
    /// Log the entry belongs to.
    pub log: String,

    /// Group the entry was delivered through.
    pub group: String,

    /// Consumer the entry was last delivered to.
    pub consumer: String,

    /// Identifier of the entry.
    pub id: EntryId,

    /// When the entry was last delivered.
    pub delivered_at: SystemTime,

    /// How many times the entry has been delivered.
    pub delivery_count: u64,
}

impl PendingEntry {
    /// Time since the entry was last delivered.
    #[must_use]
    pub fn idle(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.delivered_at)
            .unwrap_or_default()
    }
}
