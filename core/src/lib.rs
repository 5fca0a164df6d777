//! Engagement ledger core
//!
//! Tracks, per subject, the time-bounded engagement tags created when the
//! subject fights an opponent, and answers who the subject is fighting and
//! for how much longer.
//!
//! ```text
//!   gameplay detection ──add_tag──▶ EngagementLedger ◀──queries── rendering
//!                                        │
//!                              subject ─▶ TagRecord ─▶ [EngagementTag]
//! ```
//!
//! Expiry is lazy: nothing sweeps in the background, and every query that
//! checks liveness prunes lapsed tags before answering.

pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod tag;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{ConfigError, LedgerConfig};
pub use engage_types::TagType;
pub use error::TagError;
pub use ledger::{EngagementLedger, EngagementSnapshot, TagRecord, TagView};
pub use tag::{EngagementTag, EntityId, TagId};
