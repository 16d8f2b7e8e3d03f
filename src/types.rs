//! Shared identifiers and the party model used across the system.

use std::time::Duration;

/// Unique identifier for a queued party.
pub type PartyId = u64;
/// Zero-based index of a dungeon instance slot.
pub type InstanceId = usize;

/// Unit of work consumed by dungeon instances.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Party {
    /// Stable party identifier for logging and validation.
    pub id: PartyId,
    /// How long the dungeon run takes once the party is admitted.
    pub duration: Duration,
}

impl Party {
    /// Construct a new party with the provided id and run duration.
    pub fn new(id: PartyId, duration: Duration) -> Self {
        Self { id, duration }
    }
}

/// Occupancy state of a single instance slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstanceStatus {
    Idle,
    Busy,
}

impl InstanceStatus {
    pub fn is_idle(self) -> bool {
        matches!(self, InstanceStatus::Idle)
    }
}
