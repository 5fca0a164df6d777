//! Serialisable view of one subject's engagement state.

use std::time::Duration;

use engage_types::TagType;
use serde::Serialize;

use crate::clock::Timestamp;
use crate::tag::{EngagementTag, EntityId, remaining_until};

/// One live tag as seen at the snapshot instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagView {
    pub opponent: Option<EntityId>,
    pub tag_type: TagType,
    pub expire_at: Timestamp,
    pub remaining_ms: u64,
}

/// Consistent view of a subject, taken under one lock at one instant.
///
/// `tags` is ordered longest-remaining first, like every other tag list the
/// ledger hands out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngagementSnapshot {
    pub subject: EntityId,
    pub taken_at: Timestamp,
    pub in_combat: bool,
    pub tag_count: usize,
    /// Tags with a known opponent. Environmental tags are not counted.
    pub opponent_count: usize,
    pub current_tag_type: TagType,
    pub combined_expire_at: Option<Timestamp>,
    pub remaining_ms: u64,
    pub tags: Vec<TagView>,
}

impl EngagementSnapshot {
    pub(crate) fn from_tags(subject: EntityId, tags: &[EngagementTag], now: Timestamp) -> Self {
        let combined_expire_at = tags.first().map(EngagementTag::expire_at);
        let remaining = combined_expire_at
            .map(|expire_at| remaining_until(expire_at, now))
            .unwrap_or(Duration::ZERO);

        Self {
            subject,
            taken_at: now,
            in_combat: !tags.is_empty(),
            tag_count: tags.len(),
            opponent_count: tags.iter().filter(|tag| tag.opponent().is_some()).count(),
            current_tag_type: tags.first().map(EngagementTag::tag_type).unwrap_or_default(),
            combined_expire_at,
            remaining_ms: duration_ms(remaining),
            tags: tags
                .iter()
                .map(|tag| TagView {
                    opponent: tag.opponent(),
                    tag_type: tag.tag_type(),
                    expire_at: tag.expire_at(),
                    remaining_ms: duration_ms(tag.remaining(now)),
                })
                .collect(),
        }
    }

    /// Snapshot of a subject with no live engagements.
    pub(crate) fn idle(subject: EntityId, now: Timestamp) -> Self {
        Self::from_tags(subject, &[], now)
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_millis(self.remaining_ms)
    }

    /// Remaining time of the `index`-th tag (0-based), zero when out of range.
    pub fn remaining_at(&self, index: usize) -> Duration {
        self.tags
            .get(index)
            .map(|view| Duration::from_millis(view.remaining_ms))
            .unwrap_or(Duration::ZERO)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
