//! # Scholarship Pool Engine
//!
//! The donation-and-scholarship protocol as a standalone state machine. One
//! [`ScholarshipPool`] instance owns one pool, its donor ledger and its
//! application ledger. Entry points cover the full lifecycle:
//!
//! | Phase        | Entry Point(s)                                        |
//! |--------------|-------------------------------------------------------|
//! | Bootstrap    | [`ScholarshipPool::init_pool`]                        |
//! | Funding      | [`ScholarshipPool::donate`]                           |
//! | Intake       | [`ScholarshipPool::apply_for_scholarship`]            |
//! | Approval     | [`ScholarshipPool::approve_scholarships`]             |
//! | Distribution | [`ScholarshipPool::distribute_scholarships`]          |
//! | Queries      | `get_pool`, `get_pool_opt`, `get_application`, `get_all_applications`, `get_donor`, `get_pool_stats` |
//!
//! ## Architecture
//!
//! State lives in an explicit [`PoolStore`] behind one lock, so `donate` and
//! `distribute_scholarships` never interleave their balance updates. Every
//! mutating call validates first and writes last: an error leaves the store
//! untouched. Award selection is delegated to [`approval`].
//!
//! The engine trusts the caller identity it is handed. Signing, submission
//! and asset transfers belong to the collaborators in [`transport`].

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub mod approval;
pub mod clock;
pub mod events;
pub mod storage;
pub mod stroops;
pub mod transport;
mod types;

#[cfg(test)]
mod test_approval;
#[cfg(test)]
mod test_distribution;
#[cfg(test)]
mod test_events;

pub use clock::{Clock, ManualClock, SystemClock};
pub use events::PoolEvent;
pub use storage::PoolStore;
pub use transport::{Operation, OperationOutput};
pub use types::{
    Address, ApplicationForm, Donor, Payout, Pool, PoolPhase, PoolStats, PoolTerms,
    StudentApplication,
};

/// Highest accepted GPA (4.00 scaled by 100).
pub const MAX_GPA: i128 = 400;
pub const MIN_NEED_SCORE: i128 = 1;
pub const MAX_NEED_SCORE: i128 = 100;

/// Business-rule rejections. Codes 1–11 follow the deployed contract.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord, Hash, Serialize, Deserialize, thiserror::Error,
)]
#[repr(u32)]
pub enum PoolError {
    #[error("amount must be positive")]
    InvalidAmount = 1,
    #[error("scholarship bounds must be positive with min <= max")]
    InvalidScholarshipRange = 2,
    #[error("deadlines must be in the future and distribution after applications")]
    InvalidDeadline = 3,
    #[error("pool is not accepting donations")]
    PoolNotActive = 4,
    #[error("application deadline has passed")]
    ApplicationDeadlinePassed = 5,
    #[error("application data is incomplete or out of range")]
    InvalidApplicationData = 6,
    #[error("student has already applied")]
    AlreadyApplied = 7,
    #[error("caller is not authorized")]
    Unauthorized = 8,
    #[error("applications are still open")]
    ApplicationsStillOpen = 9,
    #[error("distribution deadline has not been reached")]
    DistributionNotReady = 10,
    #[error("pool has not been initialized")]
    PoolNotInitialized = 11,
    #[error("pool has already been initialized")]
    AlreadyInitialized = 12,
    #[error("approved awards exceed the pool balance")]
    InsufficientBalance = 13,
}

impl PoolError {
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Stable snake_case name, suitable for API payloads.
    pub fn name(self) -> &'static str {
        match self {
            Self::InvalidAmount => "invalid_amount",
            Self::InvalidScholarshipRange => "invalid_scholarship_range",
            Self::InvalidDeadline => "invalid_deadline",
            Self::PoolNotActive => "pool_not_active",
            Self::ApplicationDeadlinePassed => "application_deadline_passed",
            Self::InvalidApplicationData => "invalid_application_data",
            Self::AlreadyApplied => "already_applied",
            Self::Unauthorized => "unauthorized",
            Self::ApplicationsStillOpen => "applications_still_open",
            Self::DistributionNotReady => "distribution_not_ready",
            Self::PoolNotInitialized => "pool_not_initialized",
            Self::AlreadyInitialized => "already_initialized",
            Self::InsufficientBalance => "insufficient_balance",
        }
    }
}

impl PoolTerms {
    /// The seed pool shipped with the demo deployment: a 10,000 XLM goal,
    /// awards between 10 and 100 XLM, applications open for 30 days and
    /// distribution a week after they close.
    pub fn demo(creator: Address, token: Address, now: u64) -> Self {
        let application_deadline = now + stroops::MONTH_IN_SECONDS;
        Self {
            creator,
            token,
            total_goal: stroops::xlm(10_000),
            max_scholarship_amount: stroops::xlm(100),
            min_scholarship_amount: stroops::xlm(10),
            application_deadline,
            distribution_deadline: application_deadline + stroops::WEEK_IN_SECONDS,
        }
    }
}

/// The engine: one pool, its ledgers, and a clock.
pub struct ScholarshipPool<C: Clock = SystemClock> {
    clock: C,
    store: RwLock<PoolStore>,
}

impl ScholarshipPool<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for ScholarshipPool<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ScholarshipPool<C> {
    pub fn with_clock(clock: C) -> Self {
        Self::from_store(clock, PoolStore::new())
    }

    /// Resume from a previously taken [`snapshot`](Self::snapshot).
    pub fn from_store(clock: C, store: PoolStore) -> Self {
        Self {
            clock,
            store: RwLock::new(store),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // Operations never panic between validation and write, so a poisoned
    // lock still guards a consistent store.
    fn read(&self) -> RwLockReadGuard<'_, PoolStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PoolStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ─────────────────────────────────────────────────────────
    // Bootstrap
    // ─────────────────────────────────────────────────────────

    /// Create the pool. Returns the pool id (`1` for the first pool).
    ///
    /// - `caller` must be `terms.creator`.
    /// - A second call fails with `AlreadyInitialized`.
    pub fn init_pool(&self, caller: &Address, terms: PoolTerms) -> Result<u32, PoolError> {
        let now = self.clock.now();
        let mut store = self.write();

        if store.has_pool() {
            return Err(PoolError::AlreadyInitialized);
        }
        if *caller != terms.creator {
            return Err(PoolError::Unauthorized);
        }
        if terms.total_goal <= 0 {
            return Err(PoolError::InvalidAmount);
        }
        if terms.min_scholarship_amount <= 0
            || terms.max_scholarship_amount <= 0
            || terms.min_scholarship_amount > terms.max_scholarship_amount
        {
            return Err(PoolError::InvalidScholarshipRange);
        }
        if terms.application_deadline <= now
            || terms.distribution_deadline <= terms.application_deadline
        {
            return Err(PoolError::InvalidDeadline);
        }

        let pool_id = store.next_pool_id();
        let pool = Pool {
            creator: terms.creator,
            token: terms.token,
            total_goal: terms.total_goal,
            current_balance: 0,
            is_active: true,
            max_scholarship_amount: terms.max_scholarship_amount,
            min_scholarship_amount: terms.min_scholarship_amount,
            application_deadline: terms.application_deadline,
            distribution_deadline: terms.distribution_deadline,
        };

        info!(
            pool_id,
            creator = %pool.creator,
            goal = %stroops::format_xlm(pool.total_goal),
            "scholarship pool initialized"
        );
        store.publish(PoolEvent::PoolInitialized {
            pool_id,
            creator: pool.creator.clone(),
            token: pool.token.clone(),
            total_goal: pool.total_goal,
            timestamp: now,
        });
        store.save_pool(pool);
        Ok(pool_id)
    }

    // ─────────────────────────────────────────────────────────
    // Funding
    // ─────────────────────────────────────────────────────────

    /// Record a confirmed donation of `amount` stroops from `from`.
    ///
    /// Donations are accepted whenever the pool is active, independent of
    /// the application window.
    pub fn donate(&self, from: &Address, amount: i128) -> Result<(), PoolError> {
        let now = self.clock.now();
        let mut store = self.write();

        let mut pool = store.load_pool()?.clone();
        if amount <= 0 {
            return Err(PoolError::InvalidAmount);
        }
        if !pool.is_active {
            return Err(PoolError::PoolNotActive);
        }

        let mut donor = store.donor(from).cloned().unwrap_or(Donor {
            address: from.clone(),
            total_contributed: 0,
            contribution_count: 0,
        });

        pool.current_balance = pool
            .current_balance
            .checked_add(amount)
            .ok_or(PoolError::InvalidAmount)?;
        donor.total_contributed = donor
            .total_contributed
            .checked_add(amount)
            .ok_or(PoolError::InvalidAmount)?;
        donor.contribution_count = donor.contribution_count.saturating_add(1);

        debug!(donor = %from, amount, balance = pool.current_balance, "donation recorded");
        store.publish(PoolEvent::DonationReceived {
            donor: from.clone(),
            amount,
            new_balance: pool.current_balance,
            timestamp: now,
        });
        store.save_donor(donor);
        store.save_pool(pool);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Intake
    // ─────────────────────────────────────────────────────────

    /// Submit `student`'s application. One application per student.
    pub fn apply_for_scholarship(
        &self,
        student: &Address,
        form: ApplicationForm,
    ) -> Result<(), PoolError> {
        let now = self.clock.now();
        let mut store = self.write();

        let pool = store.load_pool()?;
        if now >= pool.application_deadline {
            return Err(PoolError::ApplicationDeadlinePassed);
        }
        validate_form(&form)?;
        if store.application(student).is_some() {
            return Err(PoolError::AlreadyApplied);
        }

        let application = StudentApplication {
            student_address: student.clone(),
            name: form.name,
            academic_level: form.academic_level,
            field_of_study: form.field_of_study,
            gpa: form.gpa,
            financial_need_score: form.financial_need_score,
            essay_hash: form.essay_hash,
            is_approved: false,
            scholarship_amount: 0,
            is_paid: false,
            application_timestamp: now,
        };

        debug!(student = %student, "application submitted");
        store.publish(PoolEvent::ApplicationSubmitted {
            student: student.clone(),
            timestamp: now,
        });
        store.save_application(application);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Approval
    // ─────────────────────────────────────────────────────────

    /// Run an approval pass over every unapproved application.
    ///
    /// Already-approved applications are never revisited; a later pass only
    /// considers applications left pending by earlier ones. Awards are capped
    /// by the balance not already committed to unpaid awards; if that amount
    /// cannot even be computed the pass fails with `InsufficientBalance`.
    pub fn approve_scholarships(&self, caller: &Address) -> Result<(), PoolError> {
        let now = self.clock.now();
        let mut store = self.write();

        let pool = store.load_pool()?.clone();
        if *caller != pool.creator {
            return Err(PoolError::Unauthorized);
        }
        if now < pool.application_deadline {
            return Err(PoolError::ApplicationsStillOpen);
        }

        let available = store
            .committed_awards()
            .and_then(|committed| pool.current_balance.checked_sub(committed))
            .ok_or(PoolError::InsufficientBalance)?;
        let awards = {
            let pending: Vec<&StudentApplication> =
                store.applications().filter(|a| !a.is_approved).collect();
            approval::plan_awards(
                &pending,
                available,
                pool.min_scholarship_amount,
                pool.max_scholarship_amount,
            )
        };

        let mut approved = Vec::with_capacity(awards.len());
        for (student, amount) in awards {
            if let Some(application) = store.application(&student) {
                let mut application = application.clone();
                application.is_approved = true;
                application.scholarship_amount = amount;
                approved.push(application);
            }
        }

        info!(
            approved = approved.len(),
            available = %stroops::format_xlm(available),
            "approval pass complete"
        );
        for application in approved {
            store.publish(PoolEvent::ScholarshipApproved {
                student: application.student_address.clone(),
                amount: application.scholarship_amount,
                timestamp: now,
            });
            store.save_application(application);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Distribution
    // ─────────────────────────────────────────────────────────

    /// Pay every approved, unpaid award and close the pool to donations.
    ///
    /// Either every pending payout is recorded or none is: if the awards
    /// exceed the balance the call fails with `InsufficientBalance`.
    pub fn distribute_scholarships(&self, caller: &Address) -> Result<(), PoolError> {
        let now = self.clock.now();
        let mut store = self.write();

        let mut pool = store.load_pool()?.clone();
        if *caller != pool.creator {
            return Err(PoolError::Unauthorized);
        }
        if now < pool.distribution_deadline {
            return Err(PoolError::DistributionNotReady);
        }

        let payouts = collect_payouts(&store);
        let total = payouts
            .iter()
            .try_fold(0i128, |acc, p| acc.checked_add(p.amount))
            .ok_or(PoolError::InsufficientBalance)?;
        if total > pool.current_balance {
            warn!(
                owed = total,
                balance = pool.current_balance,
                "distribution refused: awards exceed balance"
            );
            return Err(PoolError::InsufficientBalance);
        }

        let mut paid = Vec::with_capacity(payouts.len());
        for payout in &payouts {
            if let Some(application) = store.application(&payout.student) {
                let mut application = application.clone();
                application.is_paid = true;
                paid.push(application);
            }
        }

        let closing = pool.is_active;
        pool.current_balance -= total;
        pool.is_active = false;

        info!(
            payouts = payouts.len(),
            total = %stroops::format_xlm(total),
            remaining = %stroops::format_xlm(pool.current_balance),
            "scholarships distributed"
        );
        for payout in payouts {
            store.publish(PoolEvent::ScholarshipPaid {
                student: payout.student,
                amount: payout.amount,
                timestamp: now,
            });
        }
        if closing {
            store.publish(PoolEvent::PoolClosed {
                total_distributed: total,
                remaining_balance: pool.current_balance,
                timestamp: now,
            });
        }
        for application in paid {
            store.save_application(application);
        }
        store.save_pool(pool);
        store.mark_distributed(now);
        Ok(())
    }

    /// Dispatch a serialised [`Operation`] from `caller`.
    pub fn apply(&self, caller: &Address, operation: Operation) -> Result<OperationOutput, PoolError> {
        match operation {
            Operation::InitPool(terms) => self.init_pool(caller, terms).map(OperationOutput::PoolId),
            Operation::Donate { amount } => self.donate(caller, amount).map(|()| OperationOutput::Done),
            Operation::Apply(form) => self
                .apply_for_scholarship(caller, form)
                .map(|()| OperationOutput::Done),
            Operation::Approve => self.approve_scholarships(caller).map(|()| OperationOutput::Done),
            Operation::Distribute => self
                .distribute_scholarships(caller)
                .map(|()| OperationOutput::Done),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_pool(&self) -> Result<Pool, PoolError> {
        self.read().load_pool().cloned()
    }

    pub fn get_pool_opt(&self) -> Option<Pool> {
        self.read().pool().cloned()
    }

    pub fn get_application(&self, student: &Address) -> Option<StudentApplication> {
        self.read().application(student).cloned()
    }

    /// All applications, ordered by student address.
    pub fn get_all_applications(&self) -> Vec<StudentApplication> {
        self.read().applications().cloned().collect()
    }

    pub fn get_donor(&self, donor: &Address) -> Option<Donor> {
        self.read().donor(donor).cloned()
    }

    pub fn get_pool_stats(&self) -> PoolStats {
        self.read().stats()
    }

    pub fn phase(&self) -> PoolPhase {
        let now = self.clock.now();
        let store = self.read();
        match store.pool() {
            None => PoolPhase::Uninitialized,
            Some(_) if store.distributed_at().is_some() => PoolPhase::Distributed,
            Some(pool) if now < pool.application_deadline => PoolPhase::Open,
            Some(_) => PoolPhase::ApplicationsClosed,
        }
    }

    /// The transfers the next distribution would record.
    pub fn pending_payouts(&self) -> Vec<Payout> {
        collect_payouts(&self.read())
    }

    pub fn snapshot(&self) -> PoolStore {
        self.read().clone()
    }

    /// Replace the whole store, e.g. to roll back to a [`snapshot`](Self::snapshot)
    /// when the host failed to persist an operation.
    pub fn restore(&self, store: PoolStore) {
        *self.write() = store;
    }

    /// Hand over every event emitted since the previous drain.
    pub fn drain_events(&self) -> Vec<PoolEvent> {
        self.write().take_events()
    }
}

fn validate_form(form: &ApplicationForm) -> Result<(), PoolError> {
    let blank = [
        &form.name,
        &form.academic_level,
        &form.field_of_study,
        &form.essay_hash,
    ]
    .iter()
    .any(|field| field.trim().is_empty());

    if blank
        || !(0..=MAX_GPA).contains(&form.gpa)
        || !(MIN_NEED_SCORE..=MAX_NEED_SCORE).contains(&form.financial_need_score)
    {
        return Err(PoolError::InvalidApplicationData);
    }
    Ok(())
}

fn collect_payouts(store: &PoolStore) -> Vec<Payout> {
    store
        .applications()
        .filter(|a| a.is_approved && !a.is_paid && a.scholarship_amount > 0)
        .map(|a| Payout {
            student: a.student_address.clone(),
            amount: a.scholarship_amount,
        })
        .collect()
}

/// Serialisable error payload for hosts that expose the engine remotely.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u32,
    pub kind: String,
}

impl From<PoolError> for ErrorBody {
    fn from(err: PoolError) -> Self {
        Self {
            error: err.to_string(),
            code: err.code(),
            kind: err.name().to_string(),
        }
    }
}
