//! In-memory member table
//!
//! Holds this node's view of the cluster and applies status claims using the
//! incarnation/override rules from [`Member::is_overridden_by`]. It is the
//! [`MembershipOracle`] suspicion timers report into, so every claim is
//! validated here: stale, duplicate or self-targeted faulty reports are dropped.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

use super::types::{Member, MemberStatus, UpdateOutcome};
use crate::suspicion::MembershipOracle;

pub struct Memberlist {
    local_address: String,
    members: DashMap<String, Member>,
}

impl Memberlist {
    /// Creates a member table containing only the local member, alive.
    pub fn new(local_address: impl Into<String>, local_incarnation: u64) -> Arc<Self> {
        let local_address = local_address.into();
        let members = DashMap::new();
        members.insert(
            local_address.clone(),
            Member::alive(local_address.clone(), local_incarnation),
        );

        Arc::new(Self {
            local_address,
            members,
        })
    }

    pub fn local_address(&self) -> &str {
        &self.local_address
    }

    pub fn local_member(&self) -> Option<Member> {
        self.get(&self.local_address)
    }

    pub fn get(&self, address: &str) -> Option<Member> {
        self.members.get(address).map(|entry| entry.value().clone())
    }

    pub fn members(&self) -> Vec<Member> {
        self.members
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn get_alive_members(&self) -> Vec<Member> {
        self.members
            .iter()
            .filter(|entry| entry.value().status == MemberStatus::Alive)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Applies a claim about a remote member.
    ///
    /// Unknown members are added as-is. Claims about the local member are
    /// never applied here; see [`refute`](Self::refute).
    pub fn apply(&self, update: &Member) -> UpdateOutcome {
        if update.address == self.local_address {
            return UpdateOutcome::Ignored;
        }

        match self.members.entry(update.address.clone()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                if !existing.is_overridden_by(update.status, update.incarnation) {
                    tracing::trace!(
                        member = %update.address,
                        status = ?update.status,
                        incarnation = update.incarnation,
                        "ignored non-overriding update"
                    );
                    return UpdateOutcome::Ignored;
                }

                let previous = existing.clone();
                existing.status = update.status;
                existing.incarnation = update.incarnation;

                tracing::debug!(
                    member = %update.address,
                    from = ?previous.status,
                    to = ?update.status,
                    incarnation = update.incarnation,
                    "member updated"
                );
                UpdateOutcome::Updated { previous }
            }
            Entry::Vacant(entry) => {
                tracing::info!(
                    member = %update.address,
                    status = ?update.status,
                    incarnation = update.incarnation,
                    "discovered new member"
                );
                entry.insert(update.clone());
                UpdateOutcome::Added
            }
        }
    }

    /// Answers a claim against the local member.
    ///
    /// If the claim would override the local entry, the local incarnation is
    /// bumped past it and the member stays alive. Returns the new local member
    /// in that case, for the gossip layer to disseminate.
    pub fn refute(&self, incarnation: u64, status: MemberStatus) -> Option<Member> {
        let mut local = self.members.get_mut(&self.local_address)?;

        if local.status == MemberStatus::Leave || !local.is_overridden_by(status, incarnation) {
            return None;
        }

        let next = incarnation.max(local.incarnation) + 1;
        local.incarnation = next;
        local.status = MemberStatus::Alive;

        tracing::info!(
            local = %self.local_address,
            incarnation = local.incarnation,
            "refuted claim against local member"
        );
        Some(local.clone())
    }

    /// Sets the local member's status and bumps its incarnation.
    pub fn set_local_status(&self, status: MemberStatus) -> Option<Member> {
        let mut local = self.members.get_mut(&self.local_address)?;
        local.status = status;
        local.incarnation += 1;
        Some(local.clone())
    }
}

impl MembershipOracle for Memberlist {
    fn make_faulty(&self, address: &str, incarnation: u64) {
        if address == self.local_address {
            tracing::warn!(local = %self.local_address, "refusing to mark local member faulty");
            return;
        }

        let Some(mut member) = self.members.get_mut(address) else {
            tracing::debug!(member = %address, "faulty report for unknown member ignored");
            return;
        };

        if !member.is_overridden_by(MemberStatus::Faulty, incarnation) {
            tracing::debug!(
                member = %address,
                incarnation,
                current_incarnation = member.incarnation,
                status = ?member.status,
                "stale faulty report ignored"
            );
            return;
        }

        member.status = MemberStatus::Faulty;
        member.incarnation = incarnation;

        tracing::info!(member = %address, incarnation, "member marked faulty");
    }
}
