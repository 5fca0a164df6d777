use std::time::Duration;

use thiserror::Error;

use crate::clock::Timestamp;
use crate::tag::TagId;

/// Reasons a tag is refused. Only tag construction and insertion can fail;
/// every query is total.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// Tag had already lapsed when it was handed to a record.
    #[error("engagement tag expired at {expire_at}, insertion attempted at {now}")]
    Expired { expire_at: Timestamp, now: Timestamp },

    /// The very same tag (or a clone of it) is already stored.
    #[error("engagement tag {id} is already stored for this subject")]
    Duplicate { id: TagId },

    /// Expiry is not strictly after the construction instant.
    #[error("engagement tag expiry {expire_at} is not after {now}")]
    Invalid { expire_at: Timestamp, now: Timestamp },

    /// Duration too large to add to the construction instant.
    #[error("tag duration {duration:?} is out of range")]
    DurationOutOfRange { duration: Duration },
}
