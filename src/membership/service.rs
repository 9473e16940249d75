use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::memberlist::Memberlist;
use super::types::{Member, MemberStatus, UpdateOutcome};
use crate::config::NodeConfig;
use crate::suspicion::SuspicionManager;

/// Gossip-side entry point of a node.
///
/// Applies membership claims received from peers to the local [`Memberlist`]
/// and keeps the suspicion timers in step with them: a new suspect arms a
/// timer, anything that supersedes the suspicion cancels it.
pub struct MembershipService {
    pub local_address: String,
    pub memberlist: Arc<Memberlist>,
    suspicion: SuspicionManager,
    /// Held across a member-table change and the timer change that follows it,
    /// so concurrent claims about one member cannot interleave the two steps.
    updates: Mutex<()>,
}

impl MembershipService {
    /// Must be called inside a Tokio runtime.
    pub fn new(config: &NodeConfig) -> Result<Arc<Self>> {
        config.validate()?;

        let memberlist = Memberlist::new(config.local_address.clone(), now_ms());
        let suspicion = SuspicionManager::from_config(config, memberlist.clone())?;

        tracing::info!(
            local = %config.local_address,
            timeout_ms = config.suspicion.timeout.as_millis() as u64,
            "membership service created"
        );

        Ok(Arc::new(Self {
            local_address: config.local_address.clone(),
            memberlist,
            suspicion,
            updates: Mutex::new(()),
        }))
    }

    pub fn suspicion(&self) -> &SuspicionManager {
        &self.suspicion
    }

    pub fn get_member(&self, address: &str) -> Option<Member> {
        self.memberlist.get(address)
    }

    pub fn get_alive_members(&self) -> Vec<Member> {
        self.memberlist.get_alive_members()
    }

    /// Applies one membership claim received through gossip.
    pub fn handle_update(&self, update: &Member) -> UpdateOutcome {
        let _guard = self.updates.lock();

        if update.address == self.local_address {
            return match self.memberlist.refute(update.incarnation, update.status) {
                Some(local) => UpdateOutcome::Refuted { local },
                None => UpdateOutcome::Ignored,
            };
        }

        let outcome = self.memberlist.apply(update);

        match (&outcome, update.status) {
            (UpdateOutcome::Ignored, _) | (UpdateOutcome::Refuted { .. }, _) => {}
            (UpdateOutcome::Updated { previous }, MemberStatus::Suspect) => {
                // Re-suspected at a newer incarnation: the armed timer would
                // report the old one, which the memberlist now rejects.
                if previous.status == MemberStatus::Suspect {
                    self.suspicion.stop(update);
                }
                self.suspicion.start(update);
            }
            (UpdateOutcome::Added, MemberStatus::Suspect) => {
                self.suspicion.start(update);
            }
            (_, MemberStatus::Alive | MemberStatus::Faulty | MemberStatus::Leave) => {
                self.suspicion.stop(update);
            }
        }

        outcome
    }

    pub fn handle_join(&self, address: &str, incarnation: u64) -> UpdateOutcome {
        self.handle_update(&Member::alive(address, incarnation))
    }

    pub fn handle_suspect(&self, address: &str, incarnation: u64) -> UpdateOutcome {
        self.handle_update(&Member::new(address, MemberStatus::Suspect, incarnation))
    }

    pub fn handle_alive(&self, address: &str, incarnation: u64) -> UpdateOutcome {
        self.handle_update(&Member::alive(address, incarnation))
    }

    pub fn handle_faulty(&self, address: &str, incarnation: u64) -> UpdateOutcome {
        self.handle_update(&Member::new(address, MemberStatus::Faulty, incarnation))
    }

    /// Leaves the cluster: marks the local member as leaving and halts suspicion.
    pub fn leave(&self) -> Option<Member> {
        let _guard = self.updates.lock();
        let local = self.memberlist.set_local_status(MemberStatus::Leave)?;
        self.suspicion.disable();

        tracing::info!(local = %self.local_address, incarnation = local.incarnation, "left cluster");
        Some(local)
    }

    /// Rejoins after [`leave`](Self::leave). Suspects must be reported again.
    pub fn rejoin(&self) -> Option<Member> {
        let _guard = self.updates.lock();
        let local = self.memberlist.set_local_status(MemberStatus::Alive)?;
        self.suspicion.reenable();

        tracing::info!(local = %self.local_address, incarnation = local.incarnation, "rejoined cluster");
        Some(local)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
