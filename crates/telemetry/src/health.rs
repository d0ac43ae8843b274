//! Store health recorded before a run.
//!
//! Only the stores a command touches are checked. An unchecked store is
//! left out of the report instead of counting as down.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

const UNCHECKED: u8 = 0;
const UP: u8 = 1;
const DOWN: u8 = 2;

/// Health status for a set of stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Health of one store.
#[derive(Debug)]
pub struct StoreHealth {
    name: &'static str,
    state: AtomicU8,
    message: parking_lot::RwLock<Option<String>>,
}

impl StoreHealth {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: AtomicU8::new(UNCHECKED),
            message: parking_lot::RwLock::new(None),
        }
    }

    pub fn set_healthy(&self) {
        self.state.store(UP, Ordering::Relaxed);
        *self.message.write() = None;
    }

    pub fn set_unhealthy(&self, msg: impl Into<String>) {
        self.state.store(DOWN, Ordering::Relaxed);
        *self.message.write() = Some(msg.into());
    }

    pub fn is_checked(&self) -> bool {
        self.state.load(Ordering::Relaxed) != UNCHECKED
    }

    pub fn is_healthy(&self) -> bool {
        self.state.load(Ordering::Relaxed) == UP
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn message(&self) -> Option<String> {
        self.message.read().clone()
    }
}

/// Aggregated health of the checked stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub stores: Vec<StoreHealthReport>,
}

impl HealthReport {
    /// Names of checked stores that are down.
    pub fn unhealthy(&self) -> Vec<&str> {
        self.stores
            .iter()
            .filter(|s| !s.healthy)
            .map(|s| s.name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreHealthReport {
    pub name: String,
    pub healthy: bool,
    pub message: Option<String>,
}

/// Health of the source database and the warehouse.
pub struct HealthRegistry {
    pub source: StoreHealth,
    pub warehouse: StoreHealth,
}

impl HealthRegistry {
    pub const fn new() -> Self {
        Self {
            source: StoreHealth::new("source"),
            warehouse: StoreHealth::new("warehouse"),
        }
    }

    /// Report over the checked stores. Healthy when nothing was checked.
    pub fn report(&self) -> HealthReport {
        let stores = [&self.source, &self.warehouse]
            .into_iter()
            .filter(|s| s.is_checked())
            .map(|s| StoreHealthReport {
                name: s.name().to_string(),
                healthy: s.is_healthy(),
                message: s.message(),
            })
            .collect::<Vec<_>>();

        let up = stores.iter().filter(|s| s.healthy).count();
        let status = if up == stores.len() {
            HealthStatus::Healthy
        } else if up > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        };

        HealthReport { status, stores }
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global health registry.
pub static HEALTH: std::sync::LazyLock<HealthRegistry> =
    std::sync::LazyLock::new(HealthRegistry::new);

/// Get the global health registry.
pub fn health() -> &'static HealthRegistry {
    &HEALTH
}
