use streamq_command::{CommandResult, Error};
use streamq_log::{EntryId, LogBackendError};

/// Converts a backend error into the façade error of the same kind.
pub fn backend_error<E>(command: &'static str) -> impl FnOnce(E) -> Error
where
    E: LogBackendError,
{
    move |e| Error::from_kind(e.kind(), command, e.to_string())
}

pub fn require_name(what: &str, name: &str) -> CommandResult<()> {
    if name.is_empty() {
        return Err(Error::invalid_argument(format!("{what} name must not be empty")));
    }
    Ok(())
}

pub fn require_count(count: usize) -> CommandResult<()> {
    if count == 0 {
        return Err(Error::invalid_argument("count must be positive"));
    }
    Ok(())
}

pub fn parse_ids<S>(ids: &[S]) -> CommandResult<Vec<EntryId>>
where
    S: AsRef<str>,
{
    if ids.is_empty() {
        return Err(Error::invalid_argument("at least one entry id is required"));
    }

    ids.iter()
        .map(|id| {
            id.as_ref()
                .parse::<EntryId>()
                .map_err(|e| Error::invalid_argument(e.to_string()))
        })
        .collect()
}
