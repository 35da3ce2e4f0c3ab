//! # Storage Traits
//!
//! Storage abstraction for the roster, allowing different persistence
//! backends to be used interchangeably by the domain layer.

use anyhow::Result;

use crate::domain::models::member::Member;

/// Trait defining the interface for roster persistence.
///
/// The member store owns the in-memory collection; an implementation of this
/// trait owns the serialized copy and is the source of truth only at load
/// time. Every mutating store operation writes the full collection back
/// through `save_members`.
pub trait MemberStorage: Send + Sync {
    /// Load the persisted roster. Implementations fail open: a missing or
    /// undecodable serialized copy yields an empty roster, not an error.
    fn load_members(&self) -> Result<Vec<Member>>;

    /// Persist the full roster, replacing the previous serialized copy.
    fn save_members(&self, members: &[Member]) -> Result<()>;
}
