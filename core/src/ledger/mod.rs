//! Engagement ledger
//!
//! Maps each tracked subject to its [`TagRecord`] and exposes the record
//! operations keyed by subject id.
//!
//! # Locking
//!
//! ```text
//!   records: RwLock<HashMap<subject, Mutex<TagRecord>>>
//!
//!   query / add to existing record   read lock  -> record mutex
//!   first tag for a subject          write lock
//!   untag / eviction                 write lock
//! ```
//!
//! Every record operation holds the registry read lock while it works, so a
//! record cannot be evicted out from under a concurrent writer.
//!
//! Each public call samples the clock once. A subject without a record
//! answers every query exactly like a subject whose record is empty.

mod record;
mod snapshot;


use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use engage_types::TagType;
use hashbrown::HashMap;

use crate::clock::{Clock, SystemClock, Timestamp};
use crate::config::LedgerConfig;
use crate::error::TagError;
use crate::tag::{EngagementTag, EntityId};

pub use record::TagRecord;
pub use snapshot::{EngagementSnapshot, TagView};

type Records = HashMap<EntityId, Mutex<TagRecord>>;

fn lock(record: &Mutex<TagRecord>) -> MutexGuard<'_, TagRecord> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lock_mut(record: &mut Mutex<TagRecord>) -> &mut TagRecord {
    record.get_mut().unwrap_or_else(PoisonError::into_inner)
}

pub struct EngagementLedger {
    records: RwLock<Records>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl std::fmt::Debug for EngagementLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngagementLedger")
            .field("subjects", &self.read_records().len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for EngagementLedger {
    fn default() -> Self {
        Self::with_system_clock(LedgerConfig::default())
    }
}

impl EngagementLedger {
    pub fn new(config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            clock,
            config,
        }
    }

    pub fn with_system_clock(config: LedgerConfig) -> Self {
        Self::new(config, Arc::new(SystemClock))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Number of subjects with a record, empty or not.
    pub fn tracked_len(&self) -> usize {
        self.read_records().len()
    }

    fn read_records(&self) -> RwLockReadGuard<'_, Records> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_records(&self) -> RwLockWriteGuard<'_, Records> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the subject's record, or return `None` if it has none.
    fn with_record<R>(&self, subject: &EntityId, f: impl FnOnce(&mut TagRecord) -> R) -> Option<R> {
        let records = self.read_records();
        let record = records.get(subject)?;
        let mut guard = lock(record);
        Some(f(&mut guard))
    }

    // ─── Mutation ────────────────────────────────────────────────────────────

    /// Add a tag for `subject`, creating its record on first use.
    pub fn add_tag(&self, subject: EntityId, tag: EngagementTag) -> Result<(), TagError> {
        let now = self.clock.now();
        self.insert(subject, tag, now)
    }

    /// Tag `subject` for the configured default duration starting now.
    /// Returns the stored tag.
    pub fn tag(
        &self,
        subject: EntityId,
        opponent: Option<EntityId>,
        tag_type: TagType,
    ) -> Result<EngagementTag, TagError> {
        let now = self.clock.now();
        let tag = EngagementTag::lasting(opponent, tag_type, now, self.config.tag_duration())?;
        self.insert(subject, tag.clone(), now)?;
        Ok(tag)
    }

    fn insert(
        &self,
        subject: EntityId,
        tag: EngagementTag,
        now: Timestamp,
    ) -> Result<(), TagError> {
        // Checked up front so a rejected first tag never creates a record.
        if tag.is_expired(now) {
            let err = TagError::Expired {
                expire_at: tag.expire_at(),
                now,
            };
            tracing::warn!(subject = %subject, error = %err, "Rejected engagement tag");
            return Err(err);
        }

        let tag_id = tag.id();
        let opponent = tag.opponent();

        let result = {
            let records = self.read_records();
            match records.get(&subject) {
                Some(record) => lock(record).add_tag(tag, now),
                None => {
                    drop(records);
                    let mut records = self.write_records();
                    let record = records
                        .entry(subject)
                        .or_insert_with(|| Mutex::new(TagRecord::new(subject)));
                    lock_mut(record).add_tag(tag, now)
                }
            }
        };

        match &result {
            Ok(()) => {
                tracing::debug!(
                    subject = %subject,
                    tag = %tag_id,
                    ?opponent,
                    "Added engagement tag"
                )
            }
            Err(err) => {
                tracing::warn!(subject = %subject, error = %err, "Rejected engagement tag")
            }
        }
        result
    }

    /// Drop every tag `subject` holds against `opponent`. Returns how many.
    pub fn remove_opponent(&self, subject: &EntityId, opponent: &EntityId) -> usize {
        let removed = self
            .with_record(subject, |record| record.remove_opponent(opponent))
            .unwrap_or(0);
        if removed > 0 {
            tracing::debug!(subject = %subject, opponent = %opponent, removed, "Removed opponent");
        }
        removed
    }

    /// Forget `subject` entirely. Returns whether it had a record.
    pub fn untag(&self, subject: &EntityId) -> bool {
        let removed = self.write_records().remove(subject).is_some();
        if removed {
            tracing::debug!(subject = %subject, "Untagged subject");
        }
        removed
    }

    /// Prune every record and drop the ones left empty. Returns how many were dropped.
    pub fn evict_idle(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.write_records();
        let before = records.len();
        records.retain(|_, record| !lock_mut(record).is_expired(now));
        let evicted = before - records.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = records.len(), "Evicted idle subjects");
        }
        evicted
    }

    fn evict_if_empty(&self, subject: &EntityId, now: Timestamp) {
        let mut records = self.write_records();
        let empty = records
            .get_mut(subject)
            .is_some_and(|record| lock_mut(record).is_expired(now));
        if empty {
            records.remove(subject);
            tracing::trace!(subject = %subject, "Evicted empty record");
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    /// Live tags of `subject`, longest-remaining first.
    pub fn tags(&self, subject: &EntityId) -> Vec<EngagementTag> {
        let now = self.clock.now();
        self.with_record(subject, |record| record.tags(now))
            .unwrap_or_default()
    }

    pub fn opponent_ids(&self, subject: &EntityId) -> Vec<EntityId> {
        let now = self.clock.now();
        self.with_record(subject, |record| record.opponent_ids(now))
            .unwrap_or_default()
    }

    /// Resolve live opponents through `resolve`.
    ///
    /// The resolver runs after the record lock is released, so it may call
    /// back into the ledger.
    pub fn opponents<T>(
        &self,
        subject: &EntityId,
        resolve: impl FnMut(EntityId) -> Option<T>,
    ) -> Vec<T> {
        self.opponent_ids(subject)
            .into_iter()
            .filter_map(resolve)
            .collect()
    }

    pub fn current_opponent<T>(
        &self,
        subject: &EntityId,
        resolve: impl FnMut(EntityId) -> Option<T>,
    ) -> Option<T> {
        self.opponent_ids(subject).into_iter().find_map(resolve)
    }

    pub fn is_opponent(&self, subject: &EntityId, opponent: &EntityId) -> bool {
        let now = self.clock.now();
        self.with_record(subject, |record| record.is_opponent(opponent, now))
            .unwrap_or(false)
    }

    pub fn tag_for(&self, subject: &EntityId, opponent: &EntityId) -> Option<EngagementTag> {
        let now = self.clock.now();
        self.with_record(subject, |record| record.tag_for(opponent, now))
            .flatten()
    }

    pub fn combined_expire_at(&self, subject: &EntityId) -> Option<Timestamp> {
        let now = self.clock.now();
        self.with_record(subject, |record| record.combined_expire_at(now))
            .flatten()
    }

    pub fn remaining_combined(&self, subject: &EntityId) -> Duration {
        let now = self.clock.now();
        self.with_record(subject, |record| record.remaining_combined(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Prune `subject`'s record and report whether it is out of combat.
    ///
    /// With `evict_empty_records` set, an empty record is also dropped.
    pub fn is_expired(&self, subject: &EntityId) -> bool {
        let now = self.clock.now();
        let expired = self
            .with_record(subject, |record| record.is_expired(now))
            .unwrap_or(true);
        if expired && self.config.evict_empty_records {
            self.evict_if_empty(subject, now);
        }
        expired
    }

    /// Convenience inverse of [`is_expired`](Self::is_expired).
    pub fn in_combat(&self, subject: &EntityId) -> bool {
        !self.is_expired(subject)
    }

    pub fn tag_types(&self, subject: &EntityId) -> Vec<TagType> {
        let now = self.clock.now();
        self.with_record(subject, |record| record.tag_types(now))
            .unwrap_or_default()
    }

    pub fn current_tag_type(&self, subject: &EntityId) -> TagType {
        let now = self.clock.now();
        self.with_record(subject, |record| record.current_tag_type(now))
            .unwrap_or_default()
    }

    pub fn tag_count(&self, subject: &EntityId) -> usize {
        let now = self.clock.now();
        self.with_record(subject, |record| record.tag_count(now))
            .unwrap_or(0)
    }

    pub fn remaining_at(&self, subject: &EntityId, index: usize) -> Duration {
        let now = self.clock.now();
        self.with_record(subject, |record| record.remaining_at(index, now))
            .unwrap_or(Duration::ZERO)
    }

    pub fn snapshot(&self, subject: &EntityId) -> EngagementSnapshot {
        let now = self.clock.now();
        self.with_record(subject, |record| record.snapshot(now))
            .unwrap_or_else(|| EngagementSnapshot::idle(*subject, now))
    }

    /// Subjects with at least one live tag, sorted by id.
    pub fn engaged_subjects(&self) -> Vec<EntityId> {
        let now = self.clock.now();
        let records = self.read_records();
        let mut engaged: Vec<EntityId> = records
            .iter()
            .filter(|(_, record)| !lock(record).is_expired(now))
            .map(|(subject, _)| *subject)
            .collect();
        engaged.sort();
        engaged
    }
}
