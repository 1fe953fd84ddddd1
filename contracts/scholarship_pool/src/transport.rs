//! # Transport
//!
//! Collaborator seams between a wallet, a ledger and the engine.
//!
//! - A [`Signer`] turns a prepared [`Operation`] into a [`SignedOperation`]
//!   that names the signer's identity.
//! - A [`Submitter`] commits a signed operation and returns the engine's
//!   verdict inside [`Committed`], or a [`TransportError`] when the request
//!   never reached the engine.
//!
//! A business rejection is `Ok(Committed { result: Err(PoolError) })`; only
//! transport problems use the outer `Err`. Callers can always tell "the pool
//! said no" from "nobody answered".
//!
//! [`LocalLedger`] and [`StaticSigner`] are in-process implementations for
//! tests, demos and off-chain mirrors. They do no cryptography.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Address, ApplicationForm, PoolTerms};
use crate::{Clock, PoolError, ScholarshipPool};

/// A mutating engine call, ready to be signed and submitted.
///
/// Externally tagged (`{"donate":{"amount":42}}`, `"approve"`) so amounts
/// decode straight into `i128` whatever the key order of the envelope.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    InitPool(PoolTerms),
    Donate { amount: i128 },
    Apply(ApplicationForm),
    Approve,
    Distribute,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitPool(_) => "init_pool",
            Self::Donate { .. } => "donate",
            Self::Apply(_) => "apply_for_scholarship",
            Self::Approve => "approve_scholarships",
            Self::Distribute => "distribute_scholarships",
        }
    }
}

/// What a committed operation returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutput {
    /// `init_pool` succeeded with this pool id.
    PoolId(u32),
    Done,
}

/// An operation plus the identity that authorised it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SignedOperation {
    pub signer: Address,
    /// Unique per signer; lets a submitter refuse replays.
    pub nonce: u64,
    pub operation: Operation,
    /// Opaque signature bytes, checked by whoever holds the keys.
    #[serde(default)]
    pub signature: Vec<u8>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Committed {
    pub signer: Address,
    pub nonce: u64,
    pub result: Result<OperationOutput, PoolError>,
}

/// Failures outside the engine: the operation was not applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("signer rejected the operation: {0}")]
    SignatureRejected(String),

    #[error("operation from {signer} with nonce {nonce} is not newer than nonce {last}")]
    Replayed { signer: Address, nonce: u64, last: u64 },

    #[error("ledger unreachable: {0}")]
    Unreachable(String),

    #[error("submission timed out")]
    Timeout,
}

pub trait Signer {
    fn sign(&self, operation: Operation) -> Result<SignedOperation, TransportError>;
}

pub trait Submitter {
    fn submit(&self, signed: SignedOperation) -> Result<Committed, TransportError>;
}

/// Signs every operation as a fixed identity with increasing nonces.
#[derive(Debug)]
pub struct StaticSigner {
    identity: Address,
    next_nonce: AtomicU64,
}

impl StaticSigner {
    pub fn new(identity: Address) -> Self {
        Self {
            identity,
            next_nonce: AtomicU64::new(1),
        }
    }

    pub fn identity(&self) -> &Address {
        &self.identity
    }
}

impl Signer for StaticSigner {
    fn sign(&self, operation: Operation) -> Result<SignedOperation, TransportError> {
        Ok(SignedOperation {
            signer: self.identity.clone(),
            nonce: self.next_nonce.fetch_add(1, Ordering::SeqCst),
            operation,
            signature: Vec::new(),
        })
    }
}

/// Applies signed operations directly to an in-process engine, at most once
/// per `(signer, nonce)`.
///
/// Only the highest accepted nonce of each signer is kept; anything at or
/// below it is refused, which also rejects a delayed older operation.
pub struct LocalLedger<C: Clock> {
    engine: Arc<ScholarshipPool<C>>,
    last_nonce: Mutex<HashMap<Address, u64>>,
}

impl<C: Clock> LocalLedger<C> {
    pub fn new(engine: Arc<ScholarshipPool<C>>) -> Self {
        Self {
            engine,
            last_nonce: Mutex::new(HashMap::new()),
        }
    }

    pub fn engine(&self) -> &ScholarshipPool<C> {
        &self.engine
    }
}

impl<C: Clock> Submitter for LocalLedger<C> {
    fn submit(&self, signed: SignedOperation) -> Result<Committed, TransportError> {
        let mut last_nonce = self.last_nonce.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&last) = last_nonce.get(&signed.signer) {
            if signed.nonce <= last {
                return Err(TransportError::Replayed {
                    signer: signed.signer,
                    nonce: signed.nonce,
                    last,
                });
            }
        }
        last_nonce.insert(signed.signer.clone(), signed.nonce);

        debug!(op = signed.operation.name(), signer = %signed.signer, nonce = signed.nonce, "submitting");
        let result = self.engine.apply(&signed.signer, signed.operation);
        Ok(Committed {
            signer: signed.signer,
            nonce: signed.nonce,
            result,
        })
    }
}
