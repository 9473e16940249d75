//! Suspicion Sub-protocol
//!
//! Decides when a member reported as "suspect" by gossip is escalated to "faulty".
//! Each suspect gets a single one-shot timer. Refutations cancel it; if it expires,
//! the member is handed to the [`MembershipOracle`] as faulty.
//!
//! ## Guarantees
//! - **One timer per address**: repeated suspect reports for the same member are ignored.
//! - **Never self-suspect**: the local address is rejected outright.
//! - **Disable is total**: `disable` clears every timer under the same lock that flips the flag.
//! - **No late declarations**: an expiring timer re-checks that it is still the armed one
//!   before reporting, so a `stop` that wins the lock always suppresses the report.

pub mod manager;
pub mod types;

pub use manager::SuspicionManager;
pub use types::{MembershipOracle, Suspect, SuspectRef, TimerHandle};
