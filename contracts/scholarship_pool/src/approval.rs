//! # Approval policy
//!
//! Decides which pending applications an approval pass funds, and with how
//! much. The policy is a pure function of the pending set, the uncommitted
//! balance and the pool's award bounds:
//!
//! 1. Rank by financial need (desc), GPA (desc), submission time (asc),
//!    student address (asc).
//! 2. With `n` pending applicants and `available` funds:
//!    - `available >= max * n`: everyone gets `max`;
//!    - `available >= min * n`: everyone gets `available / n`;
//!    - otherwise the top `k = available / min` get `min(max, available / k)`
//!      each and the rest stay pending.
//!
//! The total awarded never exceeds `available`, and each award lies in
//! `[min, max]`.

use std::cmp::Ordering;

use crate::types::{Address, StudentApplication};

/// Ranking order used by approval passes.
pub fn rank(a: &StudentApplication, b: &StudentApplication) -> Ordering {
    b.financial_need_score
        .cmp(&a.financial_need_score)
        .then_with(|| b.gpa.cmp(&a.gpa))
        .then_with(|| a.application_timestamp.cmp(&b.application_timestamp))
        .then_with(|| a.student_address.cmp(&b.student_address))
}

/// Plan the awards of one approval pass.
///
/// `pending` holds only unapproved applications; their order does not
/// matter. Returns `(student, amount)` pairs in ranking order.
pub fn plan_awards(
    pending: &[&StudentApplication],
    available: i128,
    min_amount: i128,
    max_amount: i128,
) -> Vec<(Address, i128)> {
    if pending.is_empty() || available < min_amount || min_amount <= 0 {
        return Vec::new();
    }

    let mut ranked = pending.to_vec();
    ranked.sort_by(|a, b| rank(a, b));

    let n = ranked.len() as i128;
    let (funded, amount) = if fits(max_amount, n, available) {
        (ranked.len(), max_amount)
    } else if fits(min_amount, n, available) {
        (ranked.len(), available / n)
    } else {
        // available < min * n, so k < n and k >= 1 (available >= min).
        let k = available / min_amount;
        (k as usize, (available / k).min(max_amount))
    };

    ranked
        .into_iter()
        .take(funded)
        .map(|app| (app.student_address.clone(), amount))
        .collect()
}

/// `amount * n <= available`, treating overflow as "does not fit".
fn fits(amount: i128, n: i128, available: i128) -> bool {
    amount
        .checked_mul(n)
        .map(|total| total <= available)
        .unwrap_or(false)
}
