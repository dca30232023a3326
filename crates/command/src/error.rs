use std::time::Duration;

use thiserror::Error;

/// Result type returned by every command.
pub type CommandResult<T> = Result<T, Error>;

/// Classification of a command failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The store could not be reached.
    StoreUnavailable,

    /// The operation exceeded its deadline. Its remote effect is unknown.
    Timeout,

    /// A log or group the operation requires does not exist.
    NotFound,

    /// The target already exists.
    AlreadyExists,

    /// The caller passed a malformed argument.
    InvalidArgument,

    /// The store failed in a way that could not be classified.
    Unknown,
}

/// Errors that can occur while executing a command.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// Transport or connection failure.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The operation did not complete before the deadline.
    #[error("{command} timed out after {elapsed:?}")]
    Timeout {
        /// Name of the command that timed out.
        command: &'static str,

        /// The deadline that was exceeded.
        elapsed: Duration,
    },

    /// Referenced log or group is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Target already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Argument rejected before any remote call was attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unclassified failure.
    #[error("unknown store error: {0}")]
    Unknown(String),
}

impl Error {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Shorthand for an [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Builds an error of the given kind.
    ///
    /// `Timeout` errors built this way carry no deadline; the executor
    /// produces its own timeouts with the real one.
    pub fn from_kind(kind: ErrorKind, command: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::StoreUnavailable => Self::StoreUnavailable(message),
            ErrorKind::Timeout => Self::Timeout {
                command,
                elapsed: Duration::ZERO,
            },
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::AlreadyExists => Self::AlreadyExists(message),
            ErrorKind::InvalidArgument => Self::InvalidArgument(message),
            ErrorKind::Unknown => Self::Unknown(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_from_kind() {
        for kind in [
            ErrorKind::StoreUnavailable,
            ErrorKind::Timeout,
            ErrorKind::NotFound,
            ErrorKind::AlreadyExists,
            ErrorKind::InvalidArgument,
            ErrorKind::Unknown,
        ] {
            assert_eq!(Error::from_kind(kind, "test", "message").kind(), kind);
        }
    }

    #[test]
    fn test_timeout_display_names_command() {
        let error = Error::Timeout {
            command: "XADD",
            elapsed: Duration::from_millis(250),
        };

        assert_eq!(error.to_string(), "XADD timed out after 250ms");
    }
}
