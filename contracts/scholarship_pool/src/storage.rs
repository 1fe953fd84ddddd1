//! # Storage
//!
//! [`PoolStore`] is the explicit state handle the engine operates on. It
//! replaces ambient contract storage with one owned value:
//!
//! | Field            | Type                                    | Description                          |
//! |------------------|-----------------------------------------|--------------------------------------|
//! | `pool`           | `Option<Pool>`                          | The singleton pool, once initialised |
//! | `applications`   | `BTreeMap<Address, StudentApplication>` | Application ledger                   |
//! | `donors`         | `BTreeMap<Address, Donor>`              | Donor ledger                         |
//! | `pool_counter`   | `u32`                                   | Last issued pool id                  |
//! | `distributed_at` | `Option<u64>`                           | Time of the first distribution       |
//! | `events`         | `Vec<PoolEvent>`                        | Events not yet drained by the host   |
//!
//! Both ledgers are ordered maps so that iteration (and therefore approval
//! and payout order) is deterministic.
//!
//! The whole store is serialisable: a host snapshots it after each committed
//! operation and restores it on restart.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::events::PoolEvent;
use crate::types::{Address, Donor, Pool, PoolStats, StudentApplication};
use crate::PoolError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStore {
    pool: Option<Pool>,
    applications: BTreeMap<Address, StudentApplication>,
    donors: BTreeMap<Address, Donor>,
    pool_counter: u32,
    distributed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    events: Vec<PoolEvent>,
}

impl PoolStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Pool ─────────────────────────────────────────────────────────

    pub fn has_pool(&self) -> bool {
        self.pool.is_some()
    }

    pub fn pool(&self) -> Option<&Pool> {
        self.pool.as_ref()
    }

    /// Load the pool or fail with `PoolNotInitialized`.
    pub fn load_pool(&self) -> Result<&Pool, PoolError> {
        self.pool.as_ref().ok_or(PoolError::PoolNotInitialized)
    }

    pub fn save_pool(&mut self, pool: Pool) {
        self.pool = Some(pool);
    }

    /// Increments and returns the pool counter. The first id handed out is `1`.
    pub fn next_pool_id(&mut self) -> u32 {
        self.pool_counter += 1;
        self.pool_counter
    }

    pub fn distributed_at(&self) -> Option<u64> {
        self.distributed_at
    }

    pub fn mark_distributed(&mut self, at: u64) {
        self.distributed_at.get_or_insert(at);
    }

    // ── Applications ─────────────────────────────────────────────────

    pub fn application(&self, student: &Address) -> Option<&StudentApplication> {
        self.applications.get(student)
    }

    pub fn applications(&self) -> impl Iterator<Item = &StudentApplication> {
        self.applications.values()
    }

    pub fn save_application(&mut self, application: StudentApplication) {
        self.applications
            .insert(application.student_address.clone(), application);
    }

    // ── Donors ───────────────────────────────────────────────────────

    pub fn donor(&self, address: &Address) -> Option<&Donor> {
        self.donors.get(address)
    }

    pub fn donors(&self) -> impl Iterator<Item = &Donor> {
        self.donors.values()
    }

    pub fn save_donor(&mut self, donor: Donor) {
        self.donors.insert(donor.address.clone(), donor);
    }

    // ── Events ───────────────────────────────────────────────────────

    pub fn publish(&mut self, event: PoolEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Derived ──────────────────────────────────────────────────────

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_applications: self.applications.len() as u32,
            approved_applications: self.applications.values().filter(|a| a.is_approved).count()
                as u32,
            total_donors: self.donors.len() as u32,
        }
    }

    /// Awards that have been approved but not paid yet. `None` if they do
    /// not fit in an `i128`, which only a hand-edited store can produce.
    pub fn committed_awards(&self) -> Option<i128> {
        self.applications
            .values()
            .filter(|a| a.is_approved && !a.is_paid)
            .try_fold(0i128, |acc, a| acc.checked_add(a.scholarship_amount))
    }
}
