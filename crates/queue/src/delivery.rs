use crate::error::{backend_error, require_count, require_name};

use streamq_command::{Command, CommandResult};
use streamq_log::{Entry, LogBackend, ReadFrom};

const XREADGROUP: &str = "XREADGROUP";

/// Hands entries to consumers through their group.
#[derive(Clone, Debug)]
pub struct DeliveryEngine<B>
where
    B: LogBackend,
{
    backend: B,
}

impl<B> DeliveryEngine<B>
where
    B: LogBackend,
{
    /// Creates a new `DeliveryEngine`.
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Claims up to `max_count` entries no consumer of the group has received
    /// yet.
    ///
    /// With `auto_ack` the entries are never recorded as pending, so a crash
    /// while handling them loses them. Otherwise each stays pending for
    /// `consumer` until acknowledged. An empty result means nothing new.
    ///
    /// # Errors
    ///
    /// Fails immediately if a name is empty or `max_count` is zero.
    pub fn pull(
        &self,
        log: &str,
        group: &str,
        consumer: &str,
        auto_ack: bool,
        max_count: usize,
    ) -> CommandResult<Command<Vec<Entry>>> {
        self.read(log, group, consumer, ReadFrom::New, auto_ack, max_count)
    }

    /// Hands `consumer` its own unacknowledged entries again, refreshing
    /// their delivery time and count.
    ///
    /// Entries whose data was deleted stay pending but are not returned.
    ///
    /// # Errors
    ///
    /// Fails immediately if a name is empty or `max_count` is zero.
    pub fn redeliver(
        &self,
        log: &str,
        group: &str,
        consumer: &str,
        max_count: usize,
    ) -> CommandResult<Command<Vec<Entry>>> {
        self.read(log, group, consumer, ReadFrom::Pending, false, max_count)
    }

    fn read(
        &self,
        log: &str,
        group: &str,
        consumer: &str,
        from: ReadFrom,
        no_ack: bool,
        max_count: usize,
    ) -> CommandResult<Command<Vec<Entry>>> {
        require_name("log", log)?;
        require_name("group", group)?;
        require_name("consumer", consumer)?;
        require_count(max_count)?;

        let backend = self.backend.clone();
        let log = log.to_string();
        let group = group.to_string();
        let consumer = consumer.to_string();

        Ok(Command::from_future(XREADGROUP, async move {
            backend
                .read_group(&log, &group, &consumer, from, max_count, no_ack)
                .await
                .map_err(backend_error(XREADGROUP))
        }))
    }
}
