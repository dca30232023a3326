use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

use streamq_log::{
    Entry, EntryId, EntryRange, Fields, GroupInfo, Order, PendingEntry, StartPosition,
};

/// State of a single log: entries ordered by identifier plus its groups.
#[derive(Debug, Default)]
pub struct LogState {
    entries: BTreeMap<EntryId, Fields>,
    // Highest identifier ever assigned, kept across deletes and trims.
    last_id: EntryId,
    groups: BTreeMap<String, GroupState>,
}

#[derive(Debug)]
struct GroupState {
    last_delivered: EntryId,
    pending: BTreeMap<EntryId, PendingRecord>,
    consumers: BTreeSet<String>,
}

#[derive(Debug)]
struct PendingRecord {
    consumer: String,
    delivered_at: SystemTime,
    delivery_count: u64,
}

impl LogState {
    pub fn append(&mut self, fields: Fields, now_millis: u64) -> Option<EntryId> {
        let id = self.last_id.next_at(now_millis)?;
        self.entries.insert(id, fields);
        self.last_id = id;
        Some(id)
    }

    pub fn range(&self, range: &EntryRange) -> Vec<Entry> {
        let start = range.start.unwrap_or(EntryId::MIN);
        let end = range.end.unwrap_or(EntryId::MAX);
        if start > end {
            return Vec::new();
        }

        let limit = range.limit.unwrap_or(usize::MAX);
        let to_entry = |(id, fields): (&EntryId, &Fields)| Entry::new(*id, fields.clone());
        let scan = self.entries.range(start..=end);

        match range.order {
            Order::Ascending => scan.take(limit).map(to_entry).collect(),
            Order::Descending => scan.rev().take(limit).map(to_entry).collect(),
        }
    }

    pub fn delete(&mut self, ids: &[EntryId]) -> u64 {
        let mut removed = 0;
        for id in ids {
            if self.entries.remove(id).is_some() {
                removed += 1;
            }
        }
        removed
    }

    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn trim(&mut self, max_len: u64) -> u64 {
        let mut removed = 0;
        while self.len() > max_len {
            if self.entries.pop_first().is_none() {
                break;
            }
            removed += 1;
        }
        removed
    }

    /// Returns `false` if the group already exists.
    pub fn create_group(&mut self, group: &str, start: StartPosition) -> bool {
        if self.groups.contains_key(group) {
            return false;
        }

        let last_delivered = self.resolve(start);
        self.groups.insert(
            group.to_string(),
            GroupState {
                last_delivered,
                pending: BTreeMap::new(),
                consumers: BTreeSet::new(),
            },
        );
        true
    }

    pub fn destroy_group(&mut self, group: &str) -> bool {
        self.groups.remove(group).is_some()
    }

    /// Returns `false` if the group does not exist.
    pub fn set_group_cursor(&mut self, group: &str, position: StartPosition) -> bool {
        let cursor = self.resolve(position);
        match self.groups.get_mut(group) {
            Some(state) => {
                state.last_delivered = cursor;
                true
            }
            None => false,
        }
    }

    /// Returns `None` if the group does not exist.
    pub fn remove_consumer(&mut self, group: &str, consumer: &str) -> Option<u64> {
        let state = self.groups.get_mut(group)?;
        if !state.consumers.remove(consumer) {
            return Some(0);
        }

        let before = state.pending.len();
        state.pending.retain(|_, record| record.consumer != consumer);
        Some((before - state.pending.len()) as u64)
    }

    pub fn groups(&self) -> Vec<GroupInfo> {
        self.groups
            .iter()
            .map(|(name, state)| GroupInfo {
                name: name.clone(),
                last_delivered: state.last_delivered,
                pending: state.pending.len() as u64,
                consumers: state.consumers.len() as u64,
            })
            .collect()
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.contains_key(group)
    }

    /// Delivers up to `count` entries after the group's cursor.
    ///
    /// The caller must have checked that the group exists.
    pub fn read_new(
        &mut self,
        group: &str,
        consumer: &str,
        count: usize,
        no_ack: bool,
        now: SystemTime,
    ) -> Vec<Entry> {
        let Some(state) = self.groups.get_mut(group) else {
            return Vec::new();
        };
        state.consumers.insert(consumer.to_string());

        let Some(first) = state.last_delivered.successor() else {
            return Vec::new();
        };
        let delivered: Vec<Entry> = self
            .entries
            .range(first..)
            .take(count)
            .map(|(id, fields)| Entry::new(*id, fields.clone()))
            .collect();

        if let Some(last) = delivered.last() {
            state.last_delivered = last.id;
        }

        if !no_ack {
            for entry in &delivered {
                state.pending.insert(
                    entry.id,
                    PendingRecord {
                        consumer: consumer.to_string(),
                        delivered_at: now,
                        delivery_count: 1,
                    },
                );
            }
        }

        delivered
    }

    /// Redelivers up to `count` entries pending for `consumer`.
    ///
    /// Pending entries whose data was deleted are refreshed but neither
    /// returned nor counted.
    pub fn read_pending(
        &mut self,
        group: &str,
        consumer: &str,
        count: usize,
        now: SystemTime,
    ) -> Vec<Entry> {
        let Some(state) = self.groups.get_mut(group) else {
            return Vec::new();
        };
        state.consumers.insert(consumer.to_string());

        let mut redelivered = Vec::new();
        for (id, record) in state
            .pending
            .iter_mut()
            .filter(|(_, record)| record.consumer == consumer)
        {
            if redelivered.len() == count {
                break;
            }
            record.delivered_at = now;
            record.delivery_count += 1;

            if let Some(fields) = self.entries.get(id) {
                redelivered.push(Entry::new(*id, fields.clone()));
            }
        }
        redelivered
    }

    pub fn pending(
        &self,
        log: &str,
        group: &str,
        consumer: Option<&str>,
        start: EntryId,
        count: usize,
    ) -> Vec<PendingEntry> {
        let Some(state) = self.groups.get(group) else {
            return Vec::new();
        };

        state
            .pending
            .range(start..)
            .filter(|(_, record)| consumer.is_none_or(|consumer| record.consumer == consumer))
            .take(count)
            .map(|(id, record)| PendingEntry {
                log: log.to_string(),
                group: group.to_string(),
                consumer: record.consumer.clone(),
                id: *id,
                delivered_at: record.delivered_at,
                delivery_count: record.delivery_count,
            })
            .collect()
    }

    pub fn ack(&mut self, group: &str, ids: &[EntryId]) -> u64 {
        let Some(state) = self.groups.get_mut(group) else {
            return 0;
        };

        let mut acknowledged = 0;
        for id in ids {
            if state.pending.remove(id).is_some() {
                acknowledged += 1;
            }
        }
        acknowledged
    }

    const fn resolve(&self, position: StartPosition) -> EntryId {
        match position {
            StartPosition::FromStart => EntryId::MIN,
            StartPosition::FromNow => self.last_id,
            StartPosition::After(id) => id,
        }
    }
}
