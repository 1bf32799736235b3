//! The entitlement state cell and its mutation operations.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::{StoreApi, TokenStatus};

/// Snapshot of what the current device may consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementState {
    pub total_tokens: u32,
    pub used_tokens: u32,
    pub remaining_tokens: u32,
    pub free_trial_available: bool,
    pub free_trial_used: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    /// When the last successful full fetch was applied.
    pub last_synced: Option<DateTime<Utc>>,
}

impl Default for EntitlementState {
    /// A fresh session: no tokens, trial not yet known to be spent.
    fn default() -> Self {
        Self {
            total_tokens: 0,
            used_tokens: 0,
            remaining_tokens: 0,
            free_trial_available: true,
            free_trial_used: false,
            is_loading: false,
            error: None,
            last_synced: None,
        }
    }
}

impl EntitlementState {
    /// Whether a metered action may be attempted.
    pub fn can_consume(&self) -> bool {
        self.free_trial_available || self.remaining_tokens > 0
    }

    /// Warning for callers that carry on after a failed fetch.
    pub fn sync_warning(&self) -> Option<String> {
        self.error.as_ref().map(|e| {
            format!("Could not load token balance ({e}); continuing with the last known balance")
        })
    }
}

fn clamp_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Owns the session's [`EntitlementState`].
///
/// Two write paths feed the cell: local optimistic edits and full
/// overwrites from the service. A full overwrite always replaces every
/// balance and trial field; nothing is merged.
#[derive(Debug, Default)]
pub struct EntitlementStore {
    state: RwLock<EntitlementState>,
}

impl EntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a known state.
    pub fn with_state(state: EntitlementState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the current state. Stale as soon as it is returned.
    pub fn snapshot(&self) -> EntitlementState {
        self.state.read().clone()
    }

    pub fn can_consume(&self) -> bool {
        self.state.read().can_consume()
    }

    /// Fetch authoritative status and overwrite local state.
    ///
    /// On failure the balance and trial fields keep their last known
    /// values and `error` carries the failure message. The lock is not held
    /// while the request is in flight.
    pub fn fetch_status<A: StoreApi + ?Sized>(&self, api: &A, device_id: &str) -> EntitlementState {
        {
            let mut state = self.state.write();
            state.is_loading = true;
            state.error = None;
        }

        let result = api.entitlement_status(device_id);

        let mut state = self.state.write();
        match result {
            Ok(status) => {
                apply_status(&mut state, &status);
                debug!(
                    remaining = state.remaining_tokens,
                    trial = state.free_trial_available,
                    "entitlement status synced"
                );
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch entitlement status");
                state.is_loading = false;
                state.error = Some(e.to_string());
            }
        }

        state.clone()
    }

    /// Optimistically record one consumed token.
    pub fn decrement_token(&self) {
        let mut state = self.state.write();
        state.used_tokens = state.used_tokens.saturating_add(1);
        state.remaining_tokens = state.remaining_tokens.saturating_sub(1);
        debug!(remaining = state.remaining_tokens, "token decremented locally");
    }

    /// Optimistically record that the free trial was consumed.
    pub fn mark_free_trial_consumed(&self) {
        let mut state = self.state.write();
        if state.free_trial_available {
            info!("free trial consumed");
        }
        state.free_trial_available = false;
        state.free_trial_used = true;
    }
}

fn apply_status(state: &mut EntitlementState, status: &TokenStatus) {
    if status.free_trial_available && status.free_trial_used {
        warn!("service reported the free trial as both available and used");
    }

    state.total_tokens = clamp_count(status.total_tokens);
    state.used_tokens = clamp_count(status.used_tokens);
    state.remaining_tokens = clamp_count(status.remaining_tokens);
    state.free_trial_used = status.free_trial_used;
    state.free_trial_available = status.free_trial_available && !status.free_trial_used;
    state.is_loading = false;
    state.error = None;
    state.last_synced = Some(Utc::now());
}
