//! Events emitted by the engine on successful state transitions.
//!
//! Every event has a short topic, like a contract event, so hosts can index
//! them without matching on the full payload.

use serde::{Deserialize, Serialize};

use crate::types::Address;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolEvent {
    PoolInitialized {
        pool_id: u32,
        creator: Address,
        token: Address,
        total_goal: i128,
        timestamp: u64,
    },
    DonationReceived {
        donor: Address,
        amount: i128,
        new_balance: i128,
        timestamp: u64,
    },
    ApplicationSubmitted {
        student: Address,
        timestamp: u64,
    },
    ScholarshipApproved {
        student: Address,
        amount: i128,
        timestamp: u64,
    },
    ScholarshipPaid {
        student: Address,
        amount: i128,
        timestamp: u64,
    },
    /// Donations closed after a distribution.
    PoolClosed {
        total_distributed: i128,
        remaining_balance: i128,
        timestamp: u64,
    },
}

impl PoolEvent {
    pub fn topic(&self) -> &'static str {
        match self {
            Self::PoolInitialized { .. } => "init",
            Self::DonationReceived { .. } => "donated",
            Self::ApplicationSubmitted { .. } => "applied",
            Self::ScholarshipApproved { .. } => "approved",
            Self::ScholarshipPaid { .. } => "paid",
            Self::PoolClosed { .. } => "closed",
        }
    }

    /// The account the event is about, if any.
    pub fn actor(&self) -> Option<&Address> {
        match self {
            Self::PoolInitialized { creator, .. } => Some(creator),
            Self::DonationReceived { donor, .. } => Some(donor),
            Self::ApplicationSubmitted { student, .. }
            | Self::ScholarshipApproved { student, .. }
            | Self::ScholarshipPaid { student, .. } => Some(student),
            Self::PoolClosed { .. } => None,
        }
    }

    pub fn amount(&self) -> Option<i128> {
        match self {
            Self::PoolInitialized { total_goal, .. } => Some(*total_goal),
            Self::DonationReceived { amount, .. }
            | Self::ScholarshipApproved { amount, .. }
            | Self::ScholarshipPaid { amount, .. } => Some(*amount),
            Self::PoolClosed {
                total_distributed, ..
            } => Some(*total_distributed),
            Self::ApplicationSubmitted { .. } => None,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Self::PoolInitialized { timestamp, .. }
            | Self::DonationReceived { timestamp, .. }
            | Self::ApplicationSubmitted { timestamp, .. }
            | Self::ScholarshipApproved { timestamp, .. }
            | Self::ScholarshipPaid { timestamp, .. }
            | Self::PoolClosed { timestamp, .. } => *timestamp,
        }
    }
}
