use std::time::Duration;
use tokio::time::Instant;

/// A member that has been reported as suspect by the gossip layer.
///
/// The `incarnation` is a logical clock owned by the member itself. It only
/// ever grows, and is bumped whenever the member refutes a suspicion or rejoins,
/// so a higher value always wins over a lower one.
pub trait Suspect {
    fn address(&self) -> &str;
    fn incarnation(&self) -> u64;
}

/// Plain `(address, incarnation)` pair, for callers that don't hold a full member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuspectRef {
    pub address: String,
    pub incarnation: u64,
}

impl SuspectRef {
    pub fn new(address: impl Into<String>, incarnation: u64) -> Self {
        Self {
            address: address.into(),
            incarnation,
        }
    }
}

impl Suspect for SuspectRef {
    fn address(&self) -> &str {
        &self.address
    }

    fn incarnation(&self) -> u64 {
        self.incarnation
    }
}

/// The membership table the suspicion timers report into.
///
/// Implementations must accept stale or duplicate `(address, incarnation)`
/// pairs and validate them before touching membership state.
pub trait MembershipOracle: Send + Sync {
    fn make_faulty(&self, address: &str, incarnation: u64);
}

/// Identifies one armed suspicion timer.
///
/// Two handles compare equal only if they refer to the same arming; a timer
/// that is stopped and started again for the same address gets a new handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    pub(crate) id: u64,
    pub(crate) deadline: Instant,
}

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Instant at which the timer fires unless stopped.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Time left until the deadline, zero if it already passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
