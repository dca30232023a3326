//! In-memory (single node) implementation of the log backend for local
//! development and tests.
//!
//! Every operation runs under one lock, which gives it the same atomicity the
//! remote store provides server-side. The backend can be marked unavailable
//! and given an artificial round-trip latency to exercise failure handling.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod state;

pub use error::Error;

use state::LogState;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use streamq_command::OK_REPLY;
use streamq_log::{
    Entry, EntryId, EntryRange, Fields, GroupInfo, LogBackend, PendingEntry, ReadFrom,
    StartPosition,
};
use tokio::sync::Mutex;
use tracing::debug;

/// Options for the in-memory log backend.
#[derive(Clone, Debug, Default)]
pub struct MemoryLogOptions {
    /// Delay applied before every operation, simulating a network round trip.
    pub latency: Option<Duration>,
}

/// In-memory log backend.
#[derive(Clone, Debug)]
pub struct MemoryLog {
    available: Arc<AtomicBool>,
    logs: Arc<Mutex<HashMap<String, LogState>>>,
    options: MemoryLogOptions,
}

impl MemoryLog {
    /// Creates a new `MemoryLog`.
    #[must_use]
    pub fn new(options: MemoryLogOptions) -> Self {
        Self {
            available: Arc::new(AtomicBool::new(true)),
            logs: Arc::new(Mutex::new(HashMap::new())),
            options,
        }
    }

    /// Marks the store reachable or unreachable. While unreachable every
    /// operation fails with [`Error::Unavailable`] and has no effect.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    async fn round_trip(&self) -> Result<(), Error> {
        if let Some(latency) = self.options.latency {
            tokio::time::sleep(latency).await;
        }

        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Unavailable)
        }
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new(MemoryLogOptions::default())
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

#[async_trait]
impl LogBackend for MemoryLog {
    type Error = Error;

    async fn append(&self, log: &str, fields: Fields) -> Result<EntryId, Self::Error> {
        self.round_trip().await?;

        if fields.is_empty() {
            return Err(Error::InvalidArgument(
                "an entry needs at least one field".to_string(),
            ));
        }

        let mut logs = self.logs.lock().await;
        let id = logs
            .entry(log.to_string())
            .or_default()
            .append(fields, now_millis())
            .ok_or_else(|| Error::IdSpaceExhausted(log.to_string()))?;
        drop(logs);

        debug!("Appended {id} to {log}");

        Ok(id)
    }

    async fn range(&self, log: &str, range: EntryRange) -> Result<Vec<Entry>, Self::Error> {
        self.round_trip().await?;

        let logs = self.logs.lock().await;
        Ok(logs
            .get(log)
            .map(|state| state.range(&range))
            .unwrap_or_default())
    }

    async fn delete(&self, log: &str, ids: &[EntryId]) -> Result<u64, Self::Error> {
        self.round_trip().await?;

        let mut logs = self.logs.lock().await;
        Ok(logs.get_mut(log).map_or(0, |state| state.delete(ids)))
    }

    async fn len(&self, log: &str) -> Result<u64, Self::Error> {
        self.round_trip().await?;

        let logs = self.logs.lock().await;
        Ok(logs.get(log).map_or(0, LogState::len))
    }

    async fn trim(&self, log: &str, max_len: u64) -> Result<u64, Self::Error> {
        self.round_trip().await?;

        let mut logs = self.logs.lock().await;
        Ok(logs.get_mut(log).map_or(0, |state| state.trim(max_len)))
    }

    async fn create_group(
        &self,
        log: &str,
        group: &str,
        start: StartPosition,
        create_log: bool,
    ) -> Result<String, Self::Error> {
        self.round_trip().await?;

        let mut logs = self.logs.lock().await;
        let state = if create_log {
            logs.entry(log.to_string()).or_default()
        } else {
            logs.get_mut(log)
                .ok_or_else(|| Error::NoSuchLog(log.to_string()))?
        };

        if !state.create_group(group, start) {
            return Err(Error::BusyGroup {
                log: log.to_string(),
                group: group.to_string(),
            });
        }
        drop(logs);

        debug!("Created group {group} on {log} at {start:?}");

        Ok(OK_REPLY.to_string())
    }

    async fn destroy_group(&self, log: &str, group: &str) -> Result<bool, Self::Error> {
        self.round_trip().await?;

        let mut logs = self.logs.lock().await;
        logs.get_mut(log)
            .map(|state| state.destroy_group(group))
            .ok_or_else(|| Error::NoSuchLog(log.to_string()))
    }

    async fn set_group_cursor(
        &self,
        log: &str,
        group: &str,
        position: StartPosition,
    ) -> Result<String, Self::Error> {
        self.round_trip().await?;

        let mut logs = self.logs.lock().await;
        let state = logs
            .get_mut(log)
            .ok_or_else(|| Error::NoSuchLog(log.to_string()))?;

        if state.set_group_cursor(group, position) {
            Ok(OK_REPLY.to_string())
        } else {
            Err(Error::no_group(log, group))
        }
    }

    async fn remove_consumer(
        &self,
        log: &str,
        group: &str,
        consumer: &str,
    ) -> Result<u64, Self::Error> {
        self.round_trip().await?;

        let mut logs = self.logs.lock().await;
        let removed = logs
            .get_mut(log)
            .and_then(|state| state.remove_consumer(group, consumer))
            .ok_or_else(|| Error::no_group(log, group))?;
        drop(logs);

        debug!("Removed consumer {consumer} from {group} on {log} with {removed} pending");

        Ok(removed)
    }

    async fn groups(&self, log: &str) -> Result<Vec<GroupInfo>, Self::Error> {
        self.round_trip().await?;

        let logs = self.logs.lock().await;
        logs.get(log)
            .map(LogState::groups)
            .ok_or_else(|| Error::NoSuchLog(log.to_string()))
    }

    async fn read_group(
        &self,
        log: &str,
        group: &str,
        consumer: &str,
        from: ReadFrom,
        count: usize,
        no_ack: bool,
    ) -> Result<Vec<Entry>, Self::Error> {
        self.round_trip().await?;

        let mut logs = self.logs.lock().await;
        let state = logs
            .get_mut(log)
            .filter(|state| state.has_group(group))
            .ok_or_else(|| Error::no_group(log, group))?;

        let now = SystemTime::now();
        Ok(match from {
            ReadFrom::New => state.read_new(group, consumer, count, no_ack, now),
            ReadFrom::Pending => state.read_pending(group, consumer, count, now),
        })
    }

    async fn pending(
        &self,
        log: &str,
        group: &str,
        consumer: Option<&str>,
        start: EntryId,
        count: usize,
    ) -> Result<Vec<PendingEntry>, Self::Error> {
        self.round_trip().await?;

        let logs = self.logs.lock().await;
        logs.get(log)
            .filter(|state| state.has_group(group))
            .map(|state| state.pending(log, group, consumer, start, count))
            .ok_or_else(|| Error::no_group(log, group))
    }

    async fn ack(&self, log: &str, group: &str, ids: &[EntryId]) -> Result<u64, Self::Error> {
        self.round_trip().await?;

        let mut logs = self.logs.lock().await;
        Ok(logs.get_mut(log).map_or(0, |state| state.ack(group, ids)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use streamq_command::ErrorKind;
    use streamq_log::LogBackendError;

    fn fields(value: &str) -> Fields {
        let mut fields = Fields::new();
        fields.insert("value".to_string(), value.to_string());
        fields
    }

    #[tokio::test]
    async fn test_append_and_range() {
        let backend = MemoryLog::default();

        let first = backend.append("orders", fields("a")).await.unwrap();
        let second = backend.append("orders", fields("b")).await.unwrap();
        let entries = backend.range("orders", EntryRange::all()).await.unwrap();

        assert!(first < second);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, first);
        assert_eq!(entries[1].field("value"), Some("b"));
    }

    #[tokio::test]
    async fn test_append_rejects_empty_fields() {
        let backend = MemoryLog::default();

        let result = backend.append("orders", Fields::new()).await;

        assert_matches!(result, Err(Error::InvalidArgument(_)));
        assert_eq!(backend.len("orders").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_log_reads_as_empty() {
        let backend = MemoryLog::default();

        assert!(backend.range("missing", EntryRange::all()).await.unwrap().is_empty());
        assert_eq!(backend.delete("missing", &[EntryId::MIN]).await.unwrap(), 0);
        assert_eq!(backend.len("missing").await.unwrap(), 0);
        assert_eq!(backend.trim("missing", 0).await.unwrap(), 0);
        assert_eq!(backend.ack("missing", "g", &[EntryId::MIN]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_group_twice_is_busy() {
        let backend = MemoryLog::default();

        let reply = backend
            .create_group("orders", "g", StartPosition::FromStart, true)
            .await
            .unwrap();
        let again = backend
            .create_group("orders", "g", StartPosition::FromStart, true)
            .await;

        assert_eq!(reply, OK_REPLY);
        assert_matches!(again, Err(ref e @ Error::BusyGroup { .. }) if e.kind() == ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn test_create_group_without_log_creation() {
        let backend = MemoryLog::default();

        let result = backend
            .create_group("orders", "g", StartPosition::FromStart, false)
            .await;

        assert_matches!(result, Err(Error::NoSuchLog(_)));
    }

    #[tokio::test]
    async fn test_read_group_requires_group() {
        let backend = MemoryLog::default();
        backend.append("orders", fields("a")).await.unwrap();

        let result = backend
            .read_group("orders", "g", "c1", ReadFrom::New, 1, false)
            .await;

        assert_matches!(result, Err(ref e) if e.kind() == ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_destroy_group_discards_pending() {
        let backend = MemoryLog::default();
        backend.append("orders", fields("a")).await.unwrap();
        backend
            .create_group("orders", "g", StartPosition::FromStart, true)
            .await
            .unwrap();
        backend
            .read_group("orders", "g", "c1", ReadFrom::New, 10, false)
            .await
            .unwrap();

        assert!(backend.destroy_group("orders", "g").await.unwrap());
        assert!(!backend.destroy_group("orders", "g").await.unwrap());
        assert_matches!(
            backend.pending("orders", "g", None, EntryId::MIN, 10).await,
            Err(Error::NoGroup { .. })
        );
    }

    #[tokio::test]
    async fn test_remove_consumer() {
        let backend = MemoryLog::default();
        backend.append("orders", fields("a")).await.unwrap();
        backend
            .create_group("orders", "g", StartPosition::FromStart, true)
            .await
            .unwrap();
        backend
            .read_group("orders", "g", "c1", ReadFrom::New, 10, false)
            .await
            .unwrap();

        assert_eq!(backend.remove_consumer("orders", "g", "c1").await.unwrap(), 1);
        assert!(
            backend
                .pending("orders", "g", None, EntryId::MIN, 10)
                .await
                .unwrap()
                .is_empty()
        );
        assert_matches!(
            backend.remove_consumer("orders", "missing", "c1").await,
            Err(Error::NoGroup { .. })
        );
    }

    #[tokio::test]
    async fn test_unavailable_store_has_no_effect() {
        let backend = MemoryLog::default();
        backend.set_available(false);

        let result = backend.append("orders", fields("a")).await;
        backend.set_available(true);

        assert_matches!(result, Err(ref e) if e.kind() == ErrorKind::StoreUnavailable);
        assert_eq!(backend.len("orders").await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_competing_reads_never_share_an_entry() {
        let backend = MemoryLog::default();
        backend
            .create_group("orders", "g", StartPosition::FromStart, true)
            .await
            .unwrap();
        for i in 0..100 {
            backend.append("orders", fields(&i.to_string())).await.unwrap();
        }

        let mut tasks = Vec::new();
        for consumer in ["c1", "c2", "c3", "c4"] {
            let backend = backend.clone();
            tasks.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                loop {
                    let batch = backend
                        .read_group("orders", "g", consumer, ReadFrom::New, 3, false)
                        .await
                        .unwrap();
                    if batch.is_empty() {
                        break seen;
                    }
                    seen.extend(batch.into_iter().map(|entry| entry.id));
                }
            }));
        }

        let mut all = Vec::new();
        for task in tasks {
            all.extend(task.await.unwrap());
        }
        assert_eq!(all.len(), 100);
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 100);
        assert_eq!(backend.pending("orders", "g", None, EntryId::MIN, 1_000).await.unwrap().len(), 100);
    }
}
