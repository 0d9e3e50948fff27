//! Per-resource fallback tracking.
//!
//! Purely informational: results never change shape depending on the source.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Connectivity state of one API resource as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// Served by the API.
    Online,
    /// A transport failure occurred; the local store answered at least once.
    Offline,
}

/// Records which resources have entered local-store mode.
///
/// There is no way back to `Online`: the local store is never reconciled
/// with the backend once it has diverged.
#[derive(Debug, Default)]
pub struct OfflineMode {
    resources: RwLock<HashMap<&'static str, ConnectivityState>>,
}

impl OfflineMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, resource: &str) -> ConnectivityState {
        let map = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        map.get(resource).copied().unwrap_or(ConnectivityState::Online)
    }

    pub fn is_offline(&self, resource: &str) -> bool {
        self.state(resource) == ConnectivityState::Offline
    }

    /// Mark a resource as served locally.
    pub fn set_offline(&self, resource: &'static str) {
        let mut map = self.resources.write().unwrap_or_else(PoisonError::into_inner);
        if map.insert(resource, ConnectivityState::Offline) != Some(ConnectivityState::Offline) {
            tracing::info!(resource, "resource entered local-store mode");
        }
    }

    pub fn offline_resources(&self) -> Vec<&'static str> {
        let map = self.resources.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<&'static str> = map
            .iter()
            .filter(|(_, s)| **s == ConnectivityState::Offline)
            .map(|(r, _)| *r)
            .collect();
        out.sort_unstable();
        out
    }
}
