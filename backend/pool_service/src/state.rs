//! Shared service state and the commit path for mutating operations.

use std::sync::Arc;

use reqwest::Client;
use scholarship_pool::{
    Address, Clock, Operation, OperationOutput, PoolTerms, ScholarshipPool, SystemClock,
};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::{Config, SeedPool};
use crate::db;
use crate::errors::Result;
use crate::events::NewEvent;

pub struct AppState {
    pub engine: ScholarshipPool<SystemClock>,
    pub pool: SqlitePool,
    pub config: Config,
    pub client: Client,
    /// Serialises engine call + persistence so snapshots and events land in
    /// operation order.
    commit_lock: Mutex<()>,
}

impl AppState {
    /// Restore the engine from the last snapshot, seeding the demo pool when
    /// configured and nothing has been stored yet.
    pub async fn load(pool: SqlitePool, config: Config, client: Client) -> Result<Arc<Self>> {
        let engine = match db::load_snapshot(&pool).await? {
            Some(store) => {
                info!(
                    initialized = store.has_pool(),
                    applications = store.stats().total_applications,
                    donors = store.stats().total_donors,
                    "Restored pool snapshot"
                );
                ScholarshipPool::from_store(SystemClock, store)
            }
            None => ScholarshipPool::new(),
        };

        let state = Arc::new(Self {
            engine,
            pool,
            config,
            client,
            commit_lock: Mutex::new(()),
        });

        if let Some(seed) = state.config.seed.clone() {
            if state.engine.get_pool_opt().is_none() {
                state.seed(seed).await?;
            }
        }
        Ok(state)
    }

    async fn seed(&self, seed: SeedPool) -> Result<()> {
        let now = self.engine.clock().now();
        let terms = PoolTerms::demo(seed.creator.clone(), seed.token, now);
        let output = self.execute(&seed.creator, Operation::InitPool(terms)).await?;
        info!(?output, creator = %seed.creator, "Seeded demo scholarship pool");
        Ok(())
    }

    /// Apply `operation` as `caller` and persist the outcome.
    ///
    /// Business rejections come back as `ServiceError::Pool` and leave both
    /// the engine and the database untouched. If persisting fails the engine
    /// is rolled back too, so a retry is applied exactly once.
    pub async fn execute(&self, caller: &Address, operation: Operation) -> Result<OperationOutput> {
        let _guard = self.commit_lock.lock().await;
        let name = operation.name();

        let before = self.engine.snapshot();
        let output = self.engine.apply(caller, operation)?;

        match self.persist().await {
            Ok(written) => {
                info!(op = name, caller = %caller, events = written, "Operation committed");
                Ok(output)
            }
            Err(e) => {
                error!(op = name, "Failed to persist operation, rolling back: {e}");
                self.engine.restore(before);
                Err(e)
            }
        }
    }

    async fn persist(&self) -> Result<usize> {
        let events = self
            .engine
            .drain_events()
            .iter()
            .map(NewEvent::from_pool_event)
            .collect::<Result<Vec<_>>>()?;
        db::commit(&self.pool, &self.engine.snapshot(), &events).await
    }
}
