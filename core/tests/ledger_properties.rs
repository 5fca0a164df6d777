//! Property-based tests for the engagement ledger.
//!
//! Verifies invariants over arbitrary sequences of adds and clock advances:
//! - at most one tag per opponent, and it is the last one added
//! - tag lists are sorted by non-increasing expiry
//! - a lapsed tag never resurfaces
//! - combined expiry is the maximum live expiry
//! - remaining times are never negative

use std::collections::HashMap;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use engage_core::{EngagementTag, EntityId, TagRecord, TagType, Timestamp};

// =============================================================================
// Strategies
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    /// Add a tag for opponent slot `opponent` (None = environmental) lasting `ttl_ms`
    Add { opponent: Option<usize>, ttl_ms: i64 },
    /// Advance the clock
    Advance { ms: i64 },
    /// Remove opponent slot
    Remove { opponent: usize },
}

const OPPONENT_SLOTS: usize = 4;

fn arb_tag_type() -> impl Strategy<Value = TagType> {
    prop_oneof![
        Just(TagType::Unknown),
        Just(TagType::Player),
        Just(TagType::Mob),
        Just(TagType::Damage),
        Just(TagType::AreaEffect),
        Just(TagType::Environment),
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (proptest::option::of(0..OPPONENT_SLOTS), 1i64..20_000)
            .prop_map(|(opponent, ttl_ms)| Op::Add { opponent, ttl_ms }),
        2 => (0i64..8_000).prop_map(|ms| Op::Advance { ms }),
        1 => (0..OPPONENT_SLOTS).prop_map(|opponent| Op::Remove { opponent }),
    ]
}

struct Harness {
    now: Timestamp,
    opponents: Vec<EntityId>,
    record: TagRecord,
    /// Last successfully added tag per opponent slot
    last_added: HashMap<usize, EngagementTag>,
}

impl Harness {
    fn new() -> Self {
        Self {
            now: Utc::now(),
            opponents: (0..OPPONENT_SLOTS).map(|_| Uuid::new_v4()).collect(),
            record: TagRecord::new(Uuid::new_v4()),
            last_added: HashMap::new(),
        }
    }

    fn apply(&mut self, op: &Op, tag_type: TagType) {
        match *op {
            Op::Add { opponent, ttl_ms } => {
                let id = opponent.map(|slot| self.opponents[slot]);
                let tag = EngagementTag::new(
                    id,
                    tag_type,
                    self.now + TimeDelta::milliseconds(ttl_ms),
                    self.now,
                )
                .unwrap();
                self.record.add_tag(tag.clone(), self.now).unwrap();
                if let Some(slot) = opponent {
                    self.last_added.insert(slot, tag);
                }
            }
            Op::Advance { ms } => self.now += TimeDelta::milliseconds(ms),
            Op::Remove { opponent } => {
                self.record.remove_opponent(&self.opponents[opponent]);
                self.last_added.remove(&opponent);
            }
        }
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_one_tag_per_opponent_and_latest_wins(
        ops in prop::collection::vec(arb_op(), 1..60),
        tag_type in arb_tag_type(),
    ) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op, tag_type);

            let tags = h.record.tags(h.now);
            for (slot, opponent) in h.opponents.iter().enumerate() {
                let matching: Vec<_> = tags
                    .iter()
                    .filter(|t| t.opponent_matches(opponent))
                    .collect();
                prop_assert!(matching.len() <= 1);
                if let Some(tag) = matching.first() {
                    prop_assert_eq!(Some(*tag), h.last_added.get(&slot));
                }
            }
        }
    }

    #[test]
    fn prop_tags_sorted_descending(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op, TagType::Damage);
            let tags = h.record.tags(h.now);
            for pair in tags.windows(2) {
                prop_assert!(pair[0].expire_at() >= pair[1].expire_at());
            }
        }
    }

    #[test]
    fn prop_lapsed_tags_never_resurface(
        ops in prop::collection::vec(arb_op(), 1..60),
        probes in prop::collection::vec(0i64..5_000, 1..10),
    ) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op, TagType::Mob);
        }

        let mut now = h.now;
        let mut seen: Vec<EngagementTag> = Vec::new();
        for step in probes {
            now += TimeDelta::milliseconds(step);
            let tags = h.record.tags(now);
            for tag in &tags {
                prop_assert!(!tag.is_expired(now));
            }
            for old in seen.iter().filter(|t| t.is_expired(now)) {
                prop_assert!(!tags.contains(old));
            }
            if h.record.is_expired(now) {
                prop_assert!(h.record.tags(now).is_empty());
            }
            seen.extend(tags);
        }
    }

    #[test]
    fn prop_combined_expiry_is_max_live_expiry(
        ops in prop::collection::vec(arb_op(), 1..60),
        probe_ms in 0i64..25_000,
    ) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op, TagType::Player);
        }

        // Everything stored before any pruning at the probe instant
        let stored = h.record.tags(h.now);
        let probe = h.now + TimeDelta::milliseconds(probe_ms);
        let expected = stored
            .iter()
            .map(EngagementTag::expire_at)
            .filter(|expire_at| *expire_at > probe)
            .max();

        prop_assert_eq!(h.record.combined_expire_at(probe), expected);
    }

    #[test]
    fn prop_remaining_never_negative(
        ops in prop::collection::vec(arb_op(), 1..40),
        probe_ms in 0i64..40_000,
    ) {
        let mut h = Harness::new();
        for op in &ops {
            h.apply(op, TagType::Unknown);
        }
        let stored = h.record.tags(h.now);
        let probe = h.now + TimeDelta::milliseconds(probe_ms);

        for tag in &stored {
            let remaining = tag.remaining(probe);
            if tag.is_expired(probe) {
                prop_assert_eq!(remaining, Duration::ZERO);
            } else {
                prop_assert!(remaining > Duration::ZERO);
            }
        }
        let combined = h.record.remaining_combined(probe);
        prop_assert!(combined <= Duration::from_millis(20_000));
        if h.record.is_expired(probe) {
            prop_assert_eq!(combined, Duration::ZERO);
        }
    }
}
