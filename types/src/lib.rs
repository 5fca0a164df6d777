//! Shared types for the engagement ledger.
//!
//! Kept dependency-light so rendering layers can use them without pulling in
//! the ledger itself.

pub mod formatting;
mod tag_type;

pub use tag_type::TagType;
