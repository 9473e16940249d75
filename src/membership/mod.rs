//! Membership Module
//!
//! The node-local side of the gossip membership protocol (SWIM-like), without any transport.
//! Peers' claims arrive through [`service::MembershipService`], are applied to the
//! [`memberlist::Memberlist`], and drive the suspicion timers.
//!
//! ## Core Mechanisms
//! - **Incarnation Numbers**: Higher incarnations win; at equal incarnation the stronger status
//!   wins (Alive < Suspect < Faulty < Leave).
//! - **Failure Detection**: "Suspect" -> "Faulty" after the suspicion timeout unless refuted.
//! - **Refutation**: A claim against the local member is answered by bumping its incarnation.

pub mod memberlist;
pub mod service;
pub mod types;
