use serde::{Deserialize, Serialize};

use crate::suspicion::Suspect;

/// Lifecycle state of a member as seen by this node.
///
/// Variants are declared in override order: for two claims about the same
/// member at the same incarnation, the later variant wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberStatus {
    Alive,
    Suspect,
    Faulty,
    Leave,
}

/// Represents a single member in the cluster.
///
/// The `incarnation` field is a logical clock used to order updates and resolve conflicts
/// (e.g., refuting a false "Suspect" claim).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub address: String,
    pub status: MemberStatus,
    pub incarnation: u64,
}

impl Member {
    pub fn new(address: impl Into<String>, status: MemberStatus, incarnation: u64) -> Self {
        Self {
            address: address.into(),
            status,
            incarnation,
        }
    }

    pub fn alive(address: impl Into<String>, incarnation: u64) -> Self {
        Self::new(address, MemberStatus::Alive, incarnation)
    }

    /// Whether a claim `(status, incarnation)` about this member should replace it.
    ///
    /// Higher incarnations always win; at equal incarnation the stronger status wins.
    pub fn is_overridden_by(&self, status: MemberStatus, incarnation: u64) -> bool {
        incarnation > self.incarnation || (incarnation == self.incarnation && status > self.status)
    }
}

impl Suspect for Member {
    fn address(&self) -> &str {
        &self.address
    }

    fn incarnation(&self) -> u64 {
        self.incarnation
    }
}

/// Result of applying a claim to the member table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The claim was stale or redundant.
    Ignored,
    /// The member was not known before.
    Added,
    Updated { previous: Member },
    /// The claim targeted the local member and was answered with a fresh
    /// incarnation that should be gossiped back.
    Refuted { local: Member },
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, UpdateOutcome::Ignored)
    }
}
