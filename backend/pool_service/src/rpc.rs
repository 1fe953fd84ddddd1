//! Soroban RPC probe. Finds the first healthy endpoint among the
//! configured ones.
//!
//! Each URL gets one `getHealth` JSON-RPC call. A URL counts as healthy when
//! the call succeeds and reports `"status": "healthy"`; anything else is
//! recorded with the reason and the next URL is tried.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::Result;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<HealthResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthResult {
    pub status: String,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

// ─────────────────────────────────────────────────────────
// Probe report
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
    Unreachable,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub url: String,
    pub status: ProbeStatus,
    pub message: String,
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkReport {
    pub network_passphrase: String,
    pub working_url: Option<String>,
    pub results: Vec<ProbeResult>,
}

pub fn build_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Probe `urls` in order, stopping at the first healthy one.
pub async fn probe(client: &Client, urls: &[String], network_passphrase: &str) -> NetworkReport {
    let mut results = Vec::with_capacity(urls.len());
    let mut working_url = None;

    for url in urls {
        let result = probe_one(client, url).await;
        let healthy = result.status == ProbeStatus::Healthy;
        results.push(result);
        if healthy {
            working_url = Some(url.clone());
            break;
        }
    }

    if working_url.is_none() {
        warn!("No healthy Soroban RPC endpoint among {} candidates", urls.len());
    }

    NetworkReport {
        network_passphrase: network_passphrase.to_string(),
        working_url,
        results,
    }
}

async fn probe_one(client: &Client, url: &str) -> ProbeResult {
    let response = client
        .post(url)
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getHealth",
        }))
        .send()
        .await;

    let resp = match response {
        Ok(resp) => resp,
        Err(e) => {
            debug!("RPC probe of {url} failed: {e}");
            return ProbeResult {
                url: url.to_string(),
                status: ProbeStatus::Unreachable,
                message: format!("Failed: {e}"),
                latest_ledger: None,
            };
        }
    };

    let status = resp.status();
    if !status.is_success() {
        return ProbeResult {
            url: url.to_string(),
            status: ProbeStatus::Unhealthy,
            message: format!("HTTP {}", status.as_u16()),
            latest_ledger: None,
        };
    }

    match resp.json::<RpcResponse>().await {
        Ok(body) => classify(url, body),
        Err(e) => ProbeResult {
            url: url.to_string(),
            status: ProbeStatus::Unhealthy,
            message: format!("Malformed response: {e}"),
            latest_ledger: None,
        },
    }
}

/// Turn a decoded `getHealth` response into a probe result.
fn classify(url: &str, body: RpcResponse) -> ProbeResult {
    if let Some(err) = body.error {
        return ProbeResult {
            url: url.to_string(),
            status: ProbeStatus::Unhealthy,
            message: format!("RPC error {}: {}", err.code, err.message),
            latest_ledger: None,
        };
    }

    match body.result {
        Some(health) if health.status == "healthy" => ProbeResult {
            url: url.to_string(),
            status: ProbeStatus::Healthy,
            message: "Connected".to_string(),
            latest_ledger: health.latest_ledger,
        },
        Some(health) => ProbeResult {
            url: url.to_string(),
            status: ProbeStatus::Unhealthy,
            message: format!("Reported status {}", health.status),
            latest_ledger: health.latest_ledger,
        },
        None => ProbeResult {
            url: url.to_string(),
            status: ProbeStatus::Unhealthy,
            message: "Empty result from getHealth".to_string(),
            latest_ledger: None,
        },
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
