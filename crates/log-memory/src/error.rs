use streamq_command::ErrorKind;
use streamq_log::LogBackendError;
use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The group to create already exists.
    #[error("BUSYGROUP consumer group `{group}` already exists on `{log}`")]
    BusyGroup {
        /// Log name.
        log: String,
        /// Group name.
        group: String,
    },

    /// The arguments were rejected by the store.
    #[error("ERR {0}")]
    InvalidArgument(String),

    /// The log cannot hand out any further identifiers.
    #[error("ERR log `{0}` has exhausted its identifier space")]
    IdSpaceExhausted(String),

    /// The log or group does not exist.
    #[error("NOGROUP no such log `{log}` or consumer group `{group}`")]
    NoGroup {
        /// Log name.
        log: String,
        /// Group name.
        group: String,
    },

    /// The log does not exist.
    #[error("ERR no such log `{0}`")]
    NoSuchLog(String),

    /// The store has been marked unavailable.
    #[error("connection to store refused")]
    Unavailable,
}

impl Error {
    pub(crate) fn no_group(log: &str, group: &str) -> Self {
        Self::NoGroup {
            log: log.to_string(),
            group: group.to_string(),
        }
    }
}

impl LogBackendError for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::BusyGroup { .. } => ErrorKind::AlreadyExists,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::IdSpaceExhausted(_) => ErrorKind::Unknown,
            Self::NoGroup { .. } | Self::NoSuchLog(_) => ErrorKind::NotFound,
            Self::Unavailable => ErrorKind::StoreUnavailable,
        }
    }
}
