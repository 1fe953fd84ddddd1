//! Stored form of the events emitted by the pool engine.

use scholarship_pool::PoolEvent;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// A decoded pool event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub topic: String,
    pub actor: Option<String>,
    /// Stroops as a decimal string; i128 does not fit SQLite integers.
    pub amount: Option<String>,
    pub timestamp: i64,
    pub payload: String,
}

impl NewEvent {
    pub fn from_pool_event(event: &PoolEvent) -> Result<Self> {
        Ok(Self {
            topic: event.topic().to_string(),
            actor: event.actor().map(|a| a.to_string()),
            amount: event.amount().map(|a| a.to_string()),
            timestamp: event.timestamp() as i64,
            payload: serde_json::to_string(event)?,
        })
    }
}

/// An event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub topic: String,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub timestamp: i64,
    pub payload: String,
    pub created_at: i64,
}
