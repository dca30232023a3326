use crate::EntryId;

use indexmap::IndexMap;

/// Field name to value mapping of an entry, in insertion order.
pub type Fields = IndexMap<String, String>;

/// An immutable entry of a log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// The identifier assigned when the entry was appended.
    pub id: EntryId,

    /// The entry's fields.
    pub fields: Fields,
}

impl Entry {
    /// Creates a new entry.
    #[must_use]
    pub const fn new(id: EntryId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Returns the value of a field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Direction of a range scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Order {
    /// Oldest first.
    #[default]
    Ascending,

    /// Newest first.
    Descending,
}

/// Inclusive bounds for a range scan over a log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryRange {
    /// Lowest identifier to include. `None` starts at the oldest entry.
    pub start: Option<EntryId>,

    /// Highest identifier to include. `None` ends at the newest entry.
    pub end: Option<EntryId>,

    /// Maximum number of entries to return.
    pub limit: Option<usize>,

    /// Scan direction.
    pub order: Order,
}

impl EntryRange {
    /// The whole log, oldest first.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: None,
            end: None,
            limit: None,
            order: Order::Ascending,
        }
    }

    /// Sets the lower bound.
    #[must_use]
    pub const fn from(mut self, start: EntryId) -> Self {
        self.start = Some(start);
        self
    }

    /// Sets the upper bound.
    #[must_use]
    pub const fn to(mut self, end: EntryId) -> Self {
        self.end = Some(end);
        self
    }

    /// Limits the number of entries returned.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Scans newest first.
    #[must_use]
    pub const fn rev(mut self) -> Self {
        self.order = Order::Descending;
        self
    }

    /// Whether `id` lies within the bounds.
    #[must_use]
    pub fn contains(&self, id: &EntryId) -> bool {
        self.start.is_none_or(|start| *id >= start) && self.end.is_none_or(|end| *id <= end)
    }
}
