//! Per-subject engagement record
//!
//! Holds the unordered tags of one subject. Ordering is computed on every
//! read and never stored. Expired tags linger until a query that checks
//! liveness prunes them; every public query here does.

use std::time::Duration;

use engage_types::TagType;

use crate::clock::Timestamp;
use crate::error::TagError;
use crate::tag::{EngagementTag, EntityId, remaining_until};

use super::snapshot::EngagementSnapshot;

/// Engagement state of one tracked subject.
///
/// Not synchronised on its own; [`EngagementLedger`](super::EngagementLedger)
/// serialises access per subject.
#[derive(Debug, Clone)]
pub struct TagRecord {
    subject: EntityId,
    tags: Vec<EngagementTag>,
}

impl TagRecord {
    pub fn new(subject: EntityId) -> Self {
        Self {
            subject,
            tags: Vec::new(),
        }
    }

    pub fn subject(&self) -> EntityId {
        self.subject
    }

    /// Number of stored tags, including ones that have lapsed but not yet
    /// been pruned.
    pub fn stored_len(&self) -> usize {
        self.tags.len()
    }

    // ─── Mutation ────────────────────────────────────────────────────────────

    /// Store `tag`, superseding any tag for the same opponent.
    ///
    /// Rejected tags leave the record untouched.
    pub fn add_tag(&mut self, tag: EngagementTag, now: Timestamp) -> Result<(), TagError> {
        if tag.is_expired(now) {
            return Err(TagError::Expired {
                expire_at: tag.expire_at(),
                now,
            });
        }
        if self.tags.contains(&tag) {
            return Err(TagError::Duplicate { id: tag.id() });
        }

        if let Some(opponent) = tag.opponent() {
            let before = self.tags.len();
            self.tags.retain(|existing| !existing.opponent_matches(&opponent));
            let superseded = before - self.tags.len();
            if superseded > 0 {
                tracing::debug!(
                    subject = %self.subject,
                    opponent = %opponent,
                    superseded,
                    "Superseded engagement tag"
                );
            }
        }

        self.tags.push(tag);
        Ok(())
    }

    /// Drop every tag naming `opponent`. Returns how many were removed.
    pub fn remove_opponent(&mut self, opponent: &EntityId) -> usize {
        let before = self.tags.len();
        self.tags.retain(|tag| !tag.opponent_matches(opponent));
        before - self.tags.len()
    }

    /// Remove every tag that has lapsed at `now`. Returns how many were removed.
    pub(crate) fn prune(&mut self, now: Timestamp) -> usize {
        let before = self.tags.len();
        self.tags.retain(|tag| !tag.is_expired(now));
        let pruned = before - self.tags.len();
        if pruned > 0 {
            tracing::trace!(subject = %self.subject, pruned, "Pruned expired engagement tags");
        }
        pruned
    }

    // ─── Canonical query ─────────────────────────────────────────────────────

    /// Live tags, longest-remaining first. Prunes as a side effect.
    pub fn tags(&mut self, now: Timestamp) -> Vec<EngagementTag> {
        self.prune(now);
        let mut tags = self.tags.clone();
        tags.sort();
        tags
    }

    // ─── Derived queries ─────────────────────────────────────────────────────
    // All of these go through `tags`, so they see post-pruning state.

    pub fn opponent_ids(&mut self, now: Timestamp) -> Vec<EntityId> {
        self.tags(now)
            .iter()
            .filter_map(EngagementTag::opponent)
            .collect()
    }

    /// Resolve opponents through `resolve`, skipping absent or unresolvable ones.
    pub fn opponents<T>(
        &mut self,
        now: Timestamp,
        resolve: impl FnMut(EntityId) -> Option<T>,
    ) -> Vec<T> {
        self.opponent_ids(now).into_iter().filter_map(resolve).collect()
    }

    pub fn is_opponent(&mut self, entity: &EntityId, now: Timestamp) -> bool {
        self.tags(now).iter().any(|tag| tag.opponent_matches(entity))
    }

    pub fn tag_for(&mut self, entity: &EntityId, now: Timestamp) -> Option<EngagementTag> {
        self.tags(now)
            .into_iter()
            .find(|tag| tag.opponent_matches(entity))
    }

    /// Latest expiry among live tags. The subject stays engaged until then.
    pub fn combined_expire_at(&mut self, now: Timestamp) -> Option<Timestamp> {
        self.tags(now).first().map(EngagementTag::expire_at)
    }

    pub fn remaining_combined(&mut self, now: Timestamp) -> Duration {
        self.combined_expire_at(now)
            .map(|expire_at| remaining_until(expire_at, now))
            .unwrap_or(Duration::ZERO)
    }

    /// Prune, then report whether nothing is left.
    pub fn is_expired(&mut self, now: Timestamp) -> bool {
        self.prune(now);
        self.tags.is_empty()
    }

    pub fn tag_types(&mut self, now: Timestamp) -> Vec<TagType> {
        self.tags(now).iter().map(EngagementTag::tag_type).collect()
    }

    pub fn current_tag_type(&mut self, now: Timestamp) -> TagType {
        self.tag_types(now).first().copied().unwrap_or_default()
    }

    pub fn current_opponent<T>(
        &mut self,
        now: Timestamp,
        resolve: impl FnMut(EntityId) -> Option<T>,
    ) -> Option<T> {
        self.opponents(now, resolve).into_iter().next()
    }

    pub fn tag_count(&mut self, now: Timestamp) -> usize {
        self.prune(now);
        self.tags.len()
    }

    /// Remaining time of the `index`-th live tag (0-based, descending expiry).
    /// Zero when there is no such tag.
    pub fn remaining_at(&mut self, index: usize, now: Timestamp) -> Duration {
        self.tags(now)
            .get(index)
            .map(|tag| tag.remaining(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Everything a display needs, computed from a single prune at `now`.
    pub fn snapshot(&mut self, now: Timestamp) -> EngagementSnapshot {
        let tags = self.tags(now);
        EngagementSnapshot::from_tags(self.subject, &tags, now)
    }
}
