//! Durable message queue over an append-only log with consumer groups.
//!
//! Producers append entries to a named log; consumers in a named group pull
//! disjoint batches of entries they have not seen yet. In manual-ack mode
//! every delivered entry stays pending for its consumer until acknowledged,
//! giving at-least-once delivery. All state lives in the backing store; this
//! crate only validates arguments, issues commands, and maps replies.
//!
//! Every operation comes in a blocking form and in an `_async` form taking a
//! continuation. Callers already inside a runtime can instead build the
//! command through a component accessor and await it with
//! [`Executor::call`].
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod delivery;
mod error;
mod groups;
mod log_store;
mod options;
mod pending;

pub use delivery::DeliveryEngine;
pub use groups::GroupRegistry;
pub use log_store::LogStore;
pub use options::QueueOptions;
pub use pending::{PendingMessage, PendingTracker};

pub use streamq_command::{
    CommandHandle, CommandResult, Error, ErrorKind, Executor, ExecutorOptions,
};
pub use streamq_log::{
    Entry, EntryId, EntryRange, Fields, GroupInfo, LogBackend, Order, PendingEntry,
    StartPosition,
};

macro_rules! queue_operation {
    (
        $(#[$doc:meta])*
        fn $name:ident $(<$g:ident: $bound:path>)? ($($arg:ident: $ty:ty),*) -> $ret:ty
            => $component:ident.$method:ident
    ) => {
        paste::paste! {
            $(#[$doc])*
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidArgument`] for malformed arguments
            /// without contacting the store, [`Error::Timeout`] if the store
            /// did not answer in time, or the store's error otherwise.
            ///
            /// # Panics
            ///
            /// Panics if called from within an async context.
            pub fn $name $(<$g: $bound>)? (&self, $($arg: $ty),*) -> CommandResult<$ret> {
                let command = self.$component.$method($($arg),*)?;
                self.executor.execute(command)
            }

            #[doc = "Non-blocking form of [`MessageQueue::" $name "`]."]
            ///
            /// `on_complete` receives the result exactly once, on an executor
            /// thread.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidArgument`] for malformed arguments, in
            /// which case nothing is started and `on_complete` is never
            /// called.
            pub fn [<$name _async>]<$($g: $bound,)? C>(
                &self,
                $($arg: $ty,)*
                on_complete: C,
            ) -> CommandResult<CommandHandle>
            where
                C: FnOnce(CommandResult<$ret>) + Send + 'static,
            {
                let command = self.$component.$method($($arg),*)?;
                Ok(self.executor.execute_async(command, on_complete))
            }
        }
    };
}

/// Queue API over a log backend.
#[derive(Clone, Debug)]
pub struct MessageQueue<B>
where
    B: LogBackend,
{
    delivery: DeliveryEngine<B>,
    executor: Executor,
    groups: GroupRegistry<B>,
    log_store: LogStore<B>,
    pending: PendingTracker<B>,
}

impl<B> MessageQueue<B>
where
    B: LogBackend,
{
    /// Creates a new `MessageQueue`.
    pub fn new(backend: B, executor: Executor, options: QueueOptions) -> Self {
        Self {
            delivery: DeliveryEngine::new(backend.clone()),
            executor,
            groups: GroupRegistry::new(backend.clone(), options.auto_create_log),
            log_store: LogStore::new(backend.clone()),
            pending: PendingTracker::new(backend),
        }
    }

    /// The executor running this queue's commands.
    pub const fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Append, scan, and delete commands.
    pub const fn log_store(&self) -> &LogStore<B> {
        &self.log_store
    }

    /// Consumer group commands.
    pub const fn group_registry(&self) -> &GroupRegistry<B> {
        &self.groups
    }

    /// Group read commands.
    pub const fn delivery(&self) -> &DeliveryEngine<B> {
        &self.delivery
    }

    /// Pending entry commands.
    pub const fn pending_tracker(&self) -> &PendingTracker<B> {
        &self.pending
    }

    queue_operation! {
        /// Creates a consumer group, creating the log first if it is missing
        /// and auto-creation is enabled. An existing group is left untouched
        /// and reported as success.
        fn create_group(log: &str, group: &str, start: StartPosition) -> bool
            => groups.create
    }

    queue_operation! {
        /// Removes a group with all its pending entries. Returns `false` if
        /// there was no such group.
        fn drop_group(log: &str, group: &str) -> bool => groups.destroy
    }

    queue_operation! {
        /// Lists the groups of a log with their cursors.
        fn groups(log: &str) -> Vec<GroupInfo> => groups.list
    }

    queue_operation! {
        /// Forgets a consumer of a group and discards its pending entries.
        /// Returns how many entries were pending for it.
        fn remove_consumer(log: &str, group: &str, consumer: &str) -> u64
            => groups.remove_consumer
    }

    queue_operation! {
        /// Moves a group's cursor, also backwards.
        fn set_cursor(log: &str, group: &str, position: StartPosition) -> bool
            => groups.set_cursor
    }

    queue_operation! {
        /// Appends an entry and returns its identifier.
        fn push(log: &str, fields: Fields) -> EntryId => log_store.append
    }

    queue_operation! {
        /// Reads the entries within a range, in either direction.
        fn range(log: &str, range: EntryRange) -> Vec<Entry> => log_store.range
    }

    queue_operation! {
        /// Deletes entries by identifier and returns how many existed. Their
        /// pending records, if any, stay until acknowledged.
        fn delete_entries<S: AsRef<str>>(log: &str, ids: &[S]) -> u64 => log_store.delete
    }

    queue_operation! {
        /// Drops the oldest entries so that at most `max_len` remain.
        fn trim(log: &str, max_len: u64) -> u64 => log_store.trim
    }

    queue_operation! {
        /// Number of entries in a log.
        fn len(log: &str) -> u64 => log_store.len
    }

    queue_operation! {
        /// Claims up to `max_count` entries the group has not delivered yet.
        /// Unless `auto_ack` is set each stays pending for `consumer` until
        /// acknowledged.
        fn pull(
            log: &str,
            group: &str,
            consumer: &str,
            auto_ack: bool,
            max_count: usize
        ) -> Vec<Entry> => delivery.pull
    }

    queue_operation! {
        /// Hands `consumer` its unacknowledged entries again.
        fn redeliver(log: &str, group: &str, consumer: &str, max_count: usize) -> Vec<Entry>
            => delivery.redeliver
    }

    queue_operation! {
        /// Returns the data of the group's pending entries, oldest first,
        /// without changing their delivery state.
        fn pull_pending(log: &str, group: &str, max_count: usize) -> Vec<Entry>
            => pending.pull
    }

    queue_operation! {
        /// Lists the group's pending entries with their delivery records.
        fn list_pending(log: &str, group: &str, max_count: usize) -> Vec<PendingMessage>
            => pending.list
    }

    queue_operation! {
        /// Lists the pending entries of one consumer.
        fn list_pending_for(
            log: &str,
            group: &str,
            consumer: &str,
            max_count: usize
        ) -> Vec<PendingMessage> => pending.list_for
    }

    queue_operation! {
        /// Acknowledges entries and returns how many were pending.
        fn ack<S: AsRef<str>>(log: &str, group: &str, ids: &[S]) -> u64 => pending.ack
    }
}
