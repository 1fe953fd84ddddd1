//! # Types
//!
//! Shared data structures used across all modules of the scholarship pool.
//!
//! ## Design decisions
//!
//! ### One pool, two ledgers
//!
//! A deployment holds exactly one [`Pool`] plus two keyed ledgers:
//!
//! - [`Donor`] records keyed by donor address, created on first donation.
//! - [`StudentApplication`] records keyed by student address, created on
//!   submission and mutated once by approval and once by payout.
//!
//! ### Phase as a Finite-State Machine
//!
//! [`PoolPhase`] is derived from the clock and the store, never stored:
//!
//! ```text
//! Uninitialized ──► Open ──► ApplicationsClosed ──► Distributed
//! ```
//!
//! `Pool::is_active` is orthogonal: it only gates donations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Account identity (e.g. a Stellar `G...` public key).
///
/// The engine compares identities for equality only; signature checks belong
/// to the signer in front of it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle phase of the pool at a given instant.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolPhase {
    /// `init_pool` has not succeeded yet.
    Uninitialized,
    /// Before the application deadline; applications accepted.
    Open,
    /// Application deadline passed; approval allowed, nothing paid yet.
    ApplicationsClosed,
    /// At least one distribution has run.
    Distributed,
}

/// Parameters of `init_pool`, all amounts in stroops and timestamps in
/// seconds since epoch.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PoolTerms {
    pub creator: Address,
    pub token: Address,
    pub total_goal: i128,
    pub max_scholarship_amount: i128,
    pub min_scholarship_amount: i128,
    pub application_deadline: u64,
    pub distribution_deadline: u64,
}

/// The funding campaign record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    /// Account that initialised the pool; only it may approve and distribute.
    pub creator: Address,
    /// Asset accepted for donations.
    pub token: Address,
    /// Target balance.
    pub total_goal: i128,
    /// Donations received minus amounts distributed.
    pub current_balance: i128,
    /// Donations are accepted only while `true`.
    pub is_active: bool,
    pub max_scholarship_amount: i128,
    pub min_scholarship_amount: i128,
    /// Applications are accepted strictly before this timestamp.
    pub application_deadline: u64,
    /// Distribution is permitted at or after this timestamp.
    pub distribution_deadline: u64,
}

/// Applicant-supplied fields of a scholarship application.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ApplicationForm {
    pub name: String,
    /// e.g. "Undergraduate", "Graduate"
    pub academic_level: String,
    /// e.g. "Computer Science", "Medicine"
    pub field_of_study: String,
    /// GPA × 100 (350 means 3.50).
    pub gpa: i128,
    /// 1–100, higher means greater need.
    pub financial_need_score: i128,
    /// Content reference of the essay (e.g. an IPFS CID).
    pub essay_hash: String,
}

/// A student's request for funding.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StudentApplication {
    pub student_address: Address,
    pub name: String,
    pub academic_level: String,
    pub field_of_study: String,
    pub gpa: i128,
    pub financial_need_score: i128,
    pub essay_hash: String,
    pub is_approved: bool,
    /// Zero until approved, then fixed.
    pub scholarship_amount: i128,
    /// Set once the award has been paid out.
    pub is_paid: bool,
    pub application_timestamp: u64,
}

/// Cumulative contributions of one donor.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub address: Address,
    pub total_contributed: i128,
    pub contribution_count: u32,
}

/// Counts derived from the ledgers at read time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_applications: u32,
    pub approved_applications: u32,
    pub total_donors: u32,
}

/// A single transfer the transport layer must execute during distribution.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub student: Address,
    pub amount: i128,
}
