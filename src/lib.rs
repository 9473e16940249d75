//! SWIM Suspicion Library
//!
//! The timing core of a SWIM-style failure detector: members reported as suspect are
//! declared faulty after a fixed grace period unless the suspicion is refuted first.
//!
//! ## Modules
//! - **`suspicion`**: The `SuspicionManager` and the traits it talks through (`Suspect`,
//!   `MembershipOracle`). One timer per suspect, cancelled on refutation.
//! - **`membership`**: A node-local member table with incarnation-based conflict resolution,
//!   and the service that feeds gossip claims into it and into the suspicion timers.
//! - **`config`**: Node and suspicion settings with serde support.

pub mod config;
pub mod membership;
pub mod suspicion;
