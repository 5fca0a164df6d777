//! Engagement tags
//!
//! An [`EngagementTag`] is one time-bounded record of hostility between a
//! tracked subject and an opponent. Tags are immutable once built; refreshing
//! an engagement means building a new tag and letting the record supersede
//! the old one.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use chrono::TimeDelta;
use engage_types::TagType;
use serde::Serialize;
use uuid::Uuid;

use crate::clock::Timestamp;
use crate::error::TagError;

/// Stable identity of a subject or opponent.
pub type EntityId = Uuid;

static NEXT_TAG_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique tag identity. Clones of a tag share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TagId(u64);

impl TagId {
    fn next() -> Self {
        TagId(NEXT_TAG_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One engagement with (optionally) a known opponent.
///
/// Equality is identity: two tags built separately are never equal even with
/// identical fields, while a clone equals its original.
///
/// `Ord` sorts by *descending* expiry, so the longest-remaining engagement
/// comes first. Ties fall back to the tag id to keep the order total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EngagementTag {
    id: TagId,
    opponent: Option<EntityId>,
    expire_at: Timestamp,
    tag_type: TagType,
}

impl EngagementTag {
    /// Build a tag expiring at `expire_at`, which must lie strictly after `now`.
    pub fn new(
        opponent: Option<EntityId>,
        tag_type: TagType,
        expire_at: Timestamp,
        now: Timestamp,
    ) -> Result<Self, TagError> {
        if expire_at <= now {
            return Err(TagError::Invalid { expire_at, now });
        }
        Ok(Self {
            id: TagId::next(),
            opponent,
            expire_at,
            tag_type,
        })
    }

    /// Build a tag that lasts `duration` from `now`.
    pub fn lasting(
        opponent: Option<EntityId>,
        tag_type: TagType,
        now: Timestamp,
        duration: Duration,
    ) -> Result<Self, TagError> {
        let expire_at = TimeDelta::from_std(duration)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or(TagError::DurationOutOfRange { duration })?;
        Self::new(opponent, tag_type, expire_at, now)
    }

    pub fn id(&self) -> TagId {
        self.id
    }

    pub fn opponent(&self) -> Option<EntityId> {
        self.opponent
    }

    pub fn expire_at(&self) -> Timestamp {
        self.expire_at
    }

    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expire_at
    }

    /// True only when this tag names an opponent and it is `entity`.
    pub fn opponent_matches(&self, entity: &EntityId) -> bool {
        self.opponent.as_ref() == Some(entity)
    }

    /// Time until expiry, clamped at zero.
    pub fn remaining(&self, now: Timestamp) -> Duration {
        remaining_until(self.expire_at, now)
    }
}

impl Ord for EngagementTag {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .expire_at
            .cmp(&self.expire_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for EngagementTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `max(0, expire_at - now)`
pub(crate) fn remaining_until(expire_at: Timestamp, now: Timestamp) -> Duration {
    (expire_at - now).to_std().unwrap_or(Duration::ZERO)
}
