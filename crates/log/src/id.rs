use std::fmt::{Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

/// Identifier of a log entry, rendered as `<millis>-<seq>`.
///
/// Identifiers are ordered first by their millisecond timestamp and then by
/// the sequence number that disambiguates entries appended within the same
/// millisecond.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId {
    millis: u64,
    seq: u64,
}

impl EntryId {
    /// The smallest identifier. A cursor at `MIN` has delivered nothing.
    pub const MIN: Self = Self::new(0, 0);

    /// The largest identifier.
    pub const MAX: Self = Self::new(u64::MAX, u64::MAX);

    /// Creates an identifier from its parts.
    #[must_use]
    pub const fn new(millis: u64, seq: u64) -> Self {
        Self { millis, seq }
    }

    /// Millisecond timestamp part.
    #[must_use]
    pub const fn millis(&self) -> u64 {
        self.millis
    }

    /// Sequence part.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// The smallest identifier greater than this one, if any.
    #[must_use]
    pub const fn successor(&self) -> Option<Self> {
        if self.seq < u64::MAX {
            Some(Self::new(self.millis, self.seq + 1))
        } else if self.millis < u64::MAX {
            Some(Self::new(self.millis + 1, 0))
        } else {
            None
        }
    }

    /// The identifier to assign to an entry appended at `now_millis` when
    /// `self` is the last identifier the log handed out.
    ///
    /// A clock that reads at or before the last timestamp keeps that
    /// timestamp and bumps the sequence, so identifiers never go backwards.
    #[must_use]
    pub const fn next_at(&self, now_millis: u64) -> Option<Self> {
        if now_millis > self.millis {
            Some(Self::new(now_millis, 0))
        } else {
            self.successor()
        }
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.millis, self.seq)
    }
}

/// Error returned when parsing an [`EntryId`] fails.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid entry id `{0}`, expected `<millis>-<seq>`")]
pub struct ParseEntryIdError(String);

impl FromStr for EntryId {
    type Err = ParseEntryIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseEntryIdError(s.to_string());
        let parse = |part: &str| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        };

        match s.split_once('-') {
            Some((millis, seq)) => Ok(Self::new(parse(millis)?, parse(seq)?)),
            None => Ok(Self::new(parse(s)?, 0)),
        }
    }
}

impl TryFrom<&str> for EntryId {
    type Error = ParseEntryIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}
