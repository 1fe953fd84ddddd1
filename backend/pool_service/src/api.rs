//! Axum REST API handlers.
//!
//! Mutating endpoints take the caller's identity in the request body. The
//! wallet/signer in front of this service is responsible for proving it.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use scholarship_pool::{
    Address, ApplicationForm, Donor, Operation, OperationOutput, Payout, Pool, PoolPhase,
    PoolStats, PoolTerms, StudentApplication,
};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::errors::{Result, ServiceError};
use crate::events::EventRecord;
use crate::rpc::{self, NetworkReport};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/pool", get(get_pool).post(init_pool))
        .route("/pool/phase", get(get_phase))
        .route("/donations", post(donate))
        .route("/donors/:address", get(get_donor))
        .route("/applications", get(get_all_applications).post(apply))
        .route("/applications/:student", get(get_application))
        .route("/approvals", post(approve))
        .route("/distributions", post(distribute))
        .route("/payouts", get(get_payouts))
        .route("/stats", get(get_stats))
        .route("/events", get(get_all_events))
        .route("/events/:actor", get(get_actor_events))
        .route("/network", get(get_network))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Request / response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InitPoolRequest {
    pub caller: Address,
    pub terms: PoolTerms,
}

#[derive(Debug, Deserialize)]
pub struct DonateRequest {
    pub caller: Address,
    pub amount: i128,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub caller: Address,
    pub form: ApplicationForm,
}

#[derive(Debug, Deserialize)]
pub struct CreatorRequest {
    pub caller: Address,
}

#[derive(Serialize)]
pub struct OperationResponse {
    pub status: &'static str,
    pub output: OperationOutput,
}

#[derive(Serialize)]
pub struct PhaseResponse {
    pub phase: PoolPhase,
}

#[derive(Serialize)]
pub struct ApplicationsResponse {
    pub count: usize,
    pub applications: Vec<StudentApplication>,
}

#[derive(Serialize)]
pub struct PayoutsResponse {
    pub count: usize,
    pub total: i128,
    pub payouts: Vec<Payout>,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn run(state: &AppState, caller: &Address, operation: Operation) -> Result<Json<OperationResponse>> {
    let output = state.execute(caller, operation).await?;
    Ok(Json(OperationResponse {
        status: "committed",
        output,
    }))
}

/// `POST /pool`
pub async fn init_pool(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitPoolRequest>,
) -> Result<(StatusCode, Json<OperationResponse>)> {
    let response = run(&state, &req.caller, Operation::InitPool(req.terms)).await?;
    Ok((StatusCode::CREATED, response))
}

/// `GET /pool`
///
/// 404 with `pool_not_initialized` until the pool exists.
pub async fn get_pool(State(state): State<Arc<AppState>>) -> Result<Json<Pool>> {
    Ok(Json(state.engine.get_pool()?))
}

/// `GET /pool/phase`
pub async fn get_phase(State(state): State<Arc<AppState>>) -> Json<PhaseResponse> {
    Json(PhaseResponse {
        phase: state.engine.phase(),
    })
}

/// `POST /donations`
///
/// Records a donation whose asset transfer the ledger already confirmed.
pub async fn donate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DonateRequest>,
) -> Result<Json<OperationResponse>> {
    run(&state, &req.caller, Operation::Donate { amount: req.amount }).await
}

/// `GET /donors/:address`
pub async fn get_donor(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<Donor>> {
    state
        .engine
        .get_donor(&Address::new(address.clone()))
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound(format!("donor {address}")))
}

/// `POST /applications`
pub async fn apply(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<OperationResponse>)> {
    let response = run(&state, &req.caller, Operation::Apply(req.form)).await?;
    Ok((StatusCode::CREATED, response))
}

/// `GET /applications`
pub async fn get_all_applications(State(state): State<Arc<AppState>>) -> Json<ApplicationsResponse> {
    let applications = state.engine.get_all_applications();
    Json(ApplicationsResponse {
        count: applications.len(),
        applications,
    })
}

/// `GET /applications/:student`
pub async fn get_application(
    State(state): State<Arc<AppState>>,
    Path(student): Path<String>,
) -> Result<Json<StudentApplication>> {
    state
        .engine
        .get_application(&Address::new(student.clone()))
        .map(Json)
        .ok_or_else(|| ServiceError::NotFound(format!("application for {student}")))
}

/// `POST /approvals`
pub async fn approve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatorRequest>,
) -> Result<Json<OperationResponse>> {
    run(&state, &req.caller, Operation::Approve).await
}

/// `POST /distributions`
pub async fn distribute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatorRequest>,
) -> Result<Json<OperationResponse>> {
    run(&state, &req.caller, Operation::Distribute).await
}

/// `GET /payouts`
///
/// Transfers the next distribution would record.
pub async fn get_payouts(State(state): State<Arc<AppState>>) -> Json<PayoutsResponse> {
    let payouts = state.engine.pending_payouts();
    Json(PayoutsResponse {
        count: payouts.len(),
        total: payouts
            .iter()
            .fold(0i128, |acc, p| acc.saturating_add(p.amount)),
        payouts,
    })
}

/// `GET /stats`
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<PoolStats> {
    Json(state.engine.get_pool_stats())
}

/// `GET /events`
pub async fn get_all_events(State(state): State<Arc<AppState>>) -> Result<Json<EventsResponse>> {
    let events = db::get_all_events(&state.pool).await?;
    Ok(Json(EventsResponse {
        count: events.len(),
        events,
    }))
}

/// `GET /events/:actor`
pub async fn get_actor_events(
    State(state): State<Arc<AppState>>,
    Path(actor): Path<String>,
) -> Result<Json<EventsResponse>> {
    let events = db::get_events_for_actor(&state.pool, &actor).await?;
    Ok(Json(EventsResponse {
        count: events.len(),
        events,
    }))
}

/// `GET /network`
pub async fn get_network(State(state): State<Arc<AppState>>) -> Json<NetworkReport> {
    Json(
        rpc::probe(
            &state.client,
            &state.config.rpc_urls,
            &state.config.network_passphrase,
        )
        .await,
    )
}
