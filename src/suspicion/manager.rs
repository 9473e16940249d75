use super::types::{MembershipOracle, Suspect, TimerHandle};
use crate::config::NodeConfig;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct TimerEntry {
    handle: TimerHandle,
    task: JoinHandle<()>,
}

struct SuspicionState {
    enabled: bool,
    entries: HashMap<String, TimerEntry>,
    next_id: u64,
}

/// Drives the suspect -> faulty transition for remote members.
///
/// Every suspect gets one timer. If nobody calls [`stop`](Self::stop) before it
/// expires, the member is reported to the [`MembershipOracle`] as faulty with
/// the incarnation it was suspected at.
pub struct SuspicionManager {
    local_address: String,
    timeout: Duration,
    oracle: Arc<dyn MembershipOracle>,
    state: Arc<Mutex<SuspicionState>>,
    runtime: Handle,
}

impl SuspicionManager {
    /// Creates an enabled manager with no armed timers.
    ///
    /// Must be called from within a Tokio runtime; timers are spawned on it.
    pub fn new(
        local_address: impl Into<String>,
        timeout: Duration,
        oracle: Arc<dyn MembershipOracle>,
    ) -> Result<Self> {
        anyhow::ensure!(!timeout.is_zero(), "suspicion timeout must be non-zero");

        let runtime = Handle::try_current()
            .context("suspicion manager must be created inside a tokio runtime")?;

        Ok(Self {
            local_address: local_address.into(),
            timeout,
            oracle,
            state: Arc::new(Mutex::new(SuspicionState {
                enabled: true,
                entries: HashMap::new(),
                next_id: 0,
            })),
            runtime,
        })
    }

    pub fn from_config(config: &NodeConfig, oracle: Arc<dyn MembershipOracle>) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.local_address.clone(),
            config.suspicion.timeout,
            oracle,
        )
    }

    /// Starts the suspect period for `suspect`.
    ///
    /// Ignored (with a warning) while disabled, for the local member, and when a
    /// timer is already armed for the address. Several peers usually report the
    /// same suspect, so the last case is routine.
    pub fn start<S: Suspect + ?Sized>(&self, suspect: &S) {
        let address = suspect.address();
        let mut state = self.state.lock();

        if !state.enabled {
            tracing::warn!(
                local = %self.local_address,
                suspect = %address,
                "cannot start suspect period while disabled"
            );
            return;
        }

        if address == self.local_address {
            tracing::warn!(
                local = %self.local_address,
                "cannot start suspect period for local member"
            );
            return;
        }

        if state.entries.contains_key(address) {
            tracing::warn!(
                local = %self.local_address,
                suspect = %address,
                "redundant call to start suspect ignored"
            );
            return;
        }

        state.next_id += 1;
        let handle = TimerHandle {
            id: state.next_id,
            deadline: Instant::now() + self.timeout,
        };

        // Spawned while holding the lock: the fire path has to take the same
        // lock, so the entry is always in place before it can be looked up.
        let task = self.runtime.spawn(expire(
            self.state.clone(),
            self.oracle.clone(),
            self.local_address.clone(),
            address.to_string(),
            suspect.incarnation(),
            handle,
        ));

        state
            .entries
            .insert(address.to_string(), TimerEntry { handle, task });

        tracing::debug!(
            local = %self.local_address,
            suspect = %address,
            incarnation = suspect.incarnation(),
            timeout_ms = self.timeout.as_millis() as u64,
            "started member suspect period"
        );
    }

    /// Cancels the suspect period for `suspect`, if one is armed.
    pub fn stop<S: Suspect + ?Sized>(&self, suspect: &S) {
        let address = suspect.address();
        let mut state = self.state.lock();

        if let Some(entry) = state.entries.remove(address) {
            entry.task.abort();
            tracing::debug!(
                local = %self.local_address,
                suspect = %address,
                "stopped member suspect period"
            );
        }
    }

    /// Resumes the protocol after [`disable`](Self::disable).
    ///
    /// Timers cancelled by `disable` stay cancelled; suspects have to be
    /// reported again.
    pub fn reenable(&self) {
        let mut state = self.state.lock();

        if state.enabled {
            tracing::warn!(local = %self.local_address, "suspicion already enabled");
            return;
        }

        state.enabled = true;
        drop(state);

        tracing::info!(local = %self.local_address, "reenabled suspicion protocol");
    }

    /// Stops every armed timer and rejects new suspects until reenabled.
    pub fn disable(&self) {
        let mut state = self.state.lock();

        if !state.enabled {
            tracing::warn!(local = %self.local_address, "suspicion already disabled");
            return;
        }

        state.enabled = false;

        let timers_stopped = state.entries.len();
        for (_, entry) in state.entries.drain() {
            entry.task.abort();
        }
        drop(state);

        tracing::info!(
            local = %self.local_address,
            timers_stopped,
            "disabled suspicion protocol"
        );
    }

    /// Handle of the timer currently armed for `address`.
    pub fn timer(&self, address: &str) -> Option<TimerHandle> {
        self.state
            .lock()
            .entries
            .get(address)
            .map(|entry| entry.handle)
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Number of timers currently armed.
    pub fn armed_count(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn local_address(&self) -> &str {
        &self.local_address
    }
}

impl Drop for SuspicionManager {
    fn drop(&mut self) {
        for (_, entry) in self.state.lock().entries.drain() {
            entry.task.abort();
        }
    }
}

/// Body of a suspicion timer.
///
/// On wake-up the entry is only claimed if it still carries this timer's id.
/// A `stop` or `disable` that took the lock first has already removed it, and
/// the member must not be declared faulty.
async fn expire(
    state: Arc<Mutex<SuspicionState>>,
    oracle: Arc<dyn MembershipOracle>,
    local_address: String,
    address: String,
    incarnation: u64,
    handle: TimerHandle,
) {
    tokio::time::sleep_until(handle.deadline).await;

    let claimed = {
        let mut state = state.lock();
        match state.entries.get(&address) {
            Some(entry) if entry.handle.id == handle.id => {
                state.entries.remove(&address);
                true
            }
            _ => false,
        }
    };

    if !claimed {
        tracing::debug!(
            local = %local_address,
            suspect = %address,
            "suspect period ended before timer fired"
        );
        return;
    }

    tracing::info!(
        local = %local_address,
        faulty = %address,
        incarnation,
        "member declared faulty"
    );
    oracle.make_faulty(&address, incarnation);
}
