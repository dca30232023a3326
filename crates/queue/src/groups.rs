use crate::error::{backend_error, require_name};

use streamq_command::{Command, CommandResult, ErrorKind, is_ok_reply};
use streamq_log::{GroupInfo, LogBackend, LogBackendError, StartPosition};
use tracing::debug;

const XGROUP_CREATE: &str = "XGROUP CREATE";
const XGROUP_DELCONSUMER: &str = "XGROUP DELCONSUMER";
const XGROUP_DESTROY: &str = "XGROUP DESTROY";
const XGROUP_SETID: &str = "XGROUP SETID";
const XINFO_GROUPS: &str = "XINFO GROUPS";

/// Creates, inspects, and removes consumer groups.
#[derive(Clone, Debug)]
pub struct GroupRegistry<B>
where
    B: LogBackend,
{
    auto_create_log: bool,
    backend: B,
}

impl<B> GroupRegistry<B>
where
    B: LogBackend,
{
    /// Creates a new `GroupRegistry`. With `auto_create_log` set, creating a
    /// group on a missing log creates the log.
    pub const fn new(backend: B, auto_create_log: bool) -> Self {
        Self {
            auto_create_log,
            backend,
        }
    }

    /// Creates a group, or does nothing if it already exists.
    ///
    /// Resolves to `true` when the group was created or already existed; an
    /// existing group keeps its cursor.
    ///
    /// # Errors
    ///
    /// Fails immediately if a name is empty.
    pub fn create(
        &self,
        log: &str,
        group: &str,
        start: StartPosition,
    ) -> CommandResult<Command<bool>> {
        require_name("log", log)?;
        require_name("group", group)?;

        let backend = self.backend.clone();
        let create_log = self.auto_create_log;
        let log = log.to_string();
        let group = group.to_string();

        Ok(Command::new(
            XGROUP_CREATE,
            async move {
                match backend.create_group(&log, &group, start, create_log).await {
                    Ok(reply) => Ok(Some(reply)),
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                        debug!("Group {group} already exists on {log}");
                        Ok(None)
                    }
                    Err(e) => Err(backend_error(XGROUP_CREATE)(e)),
                }
            },
            |reply: Option<String>| Ok(reply.is_none_or(|code| is_ok_reply(&code))),
        ))
    }

    /// Removes a group and its pending entries. Resolves to whether the
    /// group existed.
    ///
    /// # Errors
    ///
    /// Fails immediately if a name is empty.
    pub fn destroy(&self, log: &str, group: &str) -> CommandResult<Command<bool>> {
        require_name("log", log)?;
        require_name("group", group)?;

        let backend = self.backend.clone();
        let log = log.to_string();
        let group = group.to_string();

        Ok(Command::from_future(XGROUP_DESTROY, async move {
            backend
                .destroy_group(&log, &group)
                .await
                .map_err(backend_error(XGROUP_DESTROY))
        }))
    }

    /// Repositions a group's cursor. This is the only way a cursor moves
    /// backwards.
    ///
    /// # Errors
    ///
    /// Fails immediately if a name is empty.
    pub fn set_cursor(
        &self,
        log: &str,
        group: &str,
        position: StartPosition,
    ) -> CommandResult<Command<bool>> {
        require_name("log", log)?;
        require_name("group", group)?;

        let backend = self.backend.clone();
        let log = log.to_string();
        let group = group.to_string();

        Ok(Command::new(
            XGROUP_SETID,
            async move {
                backend
                    .set_group_cursor(&log, &group, position)
                    .await
                    .map_err(backend_error(XGROUP_SETID))
            },
            |reply: String| Ok(is_ok_reply(&reply)),
        ))
    }

    /// Forgets a consumer and discards the entries pending for it. Resolves
    /// to how many entries were pending; those are not delivered again.
    ///
    /// # Errors
    ///
    /// Fails immediately if a name is empty.
    pub fn remove_consumer(
        &self,
        log: &str,
        group: &str,
        consumer: &str,
    ) -> CommandResult<Command<u64>> {
        require_name("log", log)?;
        require_name("group", group)?;
        require_name("consumer", consumer)?;

        let backend = self.backend.clone();
        let log = log.to_string();
        let group = group.to_string();
        let consumer = consumer.to_string();

        Ok(Command::from_future(XGROUP_DELCONSUMER, async move {
            backend
                .remove_consumer(&log, &group, &consumer)
                .await
                .map_err(backend_error(XGROUP_DELCONSUMER))
        }))
    }

    /// Lists the groups of a log.
    ///
    /// # Errors
    ///
    /// Fails immediately if the log name is empty.
    pub fn list(&self, log: &str) -> CommandResult<Command<Vec<GroupInfo>>> {
        require_name("log", log)?;

        let backend = self.backend.clone();
        let log = log.to_string();

        Ok(Command::from_future(XINFO_GROUPS, async move {
            backend
                .groups(&log)
                .await
                .map_err(backend_error(XINFO_GROUPS))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use assert_matches::assert_matches;
    use streamq_command::{Error, Executor};
    use streamq_log::{EntryId, Fields, ReadFrom};
    use streamq_log_memory::MemoryLog;
    use tokio::runtime::Handle;

    fn executor() -> Executor {
        Executor::with_handle(Handle::current(), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_create_is_idempotent_and_keeps_cursor() {
        let backend = MemoryLog::default();
        let registry = GroupRegistry::new(backend.clone(), true);
        let executor = executor();

        assert!(
            executor
                .call(registry.create("log", "g", StartPosition::FromStart).unwrap())
                .await
                .unwrap()
        );
        let id = backend
            .append("log", Fields::from([("k".to_string(), "v".to_string())]))
            .await
            .unwrap();
        backend
            .read_group("log", "g", "c1", ReadFrom::New, 10, true)
            .await
            .unwrap();

        assert!(
            executor
                .call(registry.create("log", "g", StartPosition::FromStart).unwrap())
                .await
                .unwrap()
        );
        let groups = executor.call(registry.list("log").unwrap()).await.unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].last_delivered, id);
    }

    #[tokio::test]
    async fn test_create_without_auto_create_requires_log() {
        let registry = GroupRegistry::new(MemoryLog::default(), false);

        let result = executor()
            .call(registry.create("log", "g", StartPosition::FromNow).unwrap())
            .await;

        assert_matches!(result, Err(Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_destroy() {
        let registry = GroupRegistry::new(MemoryLog::default(), true);
        let executor = executor();
        executor
            .call(registry.create("log", "g", StartPosition::FromStart).unwrap())
            .await
            .unwrap();

        assert!(executor.call(registry.destroy("log", "g").unwrap()).await.unwrap());
        assert!(!executor.call(registry.destroy("log", "g").unwrap()).await.unwrap());
        assert!(executor.call(registry.list("log").unwrap()).await.unwrap().is_empty());
        assert_matches!(
            executor.call(registry.destroy("other", "g").unwrap()).await,
            Err(Error::NotFound(_))
        );
    }

    #[tokio::test]
    async fn test_set_cursor() {
        let registry = GroupRegistry::new(MemoryLog::default(), true);
        let executor = executor();
        executor
            .call(registry.create("log", "g", StartPosition::FromStart).unwrap())
            .await
            .unwrap();
        let target = EntryId::new(42, 7);

        assert!(
            executor
                .call(registry.set_cursor("log", "g", StartPosition::After(target)).unwrap())
                .await
                .unwrap()
        );
        let groups = executor.call(registry.list("log").unwrap()).await.unwrap();

        assert_eq!(groups[0].last_delivered, target);
        assert_matches!(
            executor
                .call(registry.set_cursor("log", "missing", StartPosition::FromNow).unwrap())
                .await,
            Err(Error::NotFound(_))
        );
    }

    #[tokio::test]
    async fn test_remove_consumer() {
        let backend = MemoryLog::default();
        let registry = GroupRegistry::new(backend.clone(), true);
        let executor = executor();
        executor
            .call(registry.create("log", "g", StartPosition::FromStart).unwrap())
            .await
            .unwrap();
        for value in ["a", "b"] {
            backend
                .append("log", Fields::from([("k".to_string(), value.to_string())]))
                .await
                .unwrap();
        }
        backend
            .read_group("log", "g", "c1", ReadFrom::New, 10, false)
            .await
            .unwrap();

        let removed = executor
            .call(registry.remove_consumer("log", "g", "c1").unwrap())
            .await
            .unwrap();
        let groups = executor.call(registry.list("log").unwrap()).await.unwrap();

        assert_eq!(removed, 2);
        assert_eq!(groups[0].consumers, 0);
        assert_eq!(groups[0].pending, 0);
        assert_matches!(
            executor
                .call(registry.remove_consumer("log", "missing", "c1").unwrap())
                .await,
            Err(Error::NotFound(_))
        );
    }

    #[tokio::test]
    async fn test_empty_names_rejected() {
        let registry = GroupRegistry::new(MemoryLog::default(), true);

        assert_matches!(
            registry.create("log", "", StartPosition::FromStart),
            Err(Error::InvalidArgument(_))
        );
        assert_matches!(registry.destroy("", "g"), Err(Error::InvalidArgument(_)));
    }
}
