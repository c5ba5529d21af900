use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use crate::address::similarity;
use crate::alert::SecurityAlert;
use crate::engine::types::{AnalysisResult, TransactionIntent};
use crate::registry::store::{MaliciousAddressEntry, RiskLevel};

use super::types::*;
use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: msg.into(),
        }),
    )
}

fn require_address(address: &str) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if address.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "address must not be empty"));
    }
    Ok(())
}

// ============================================================
// Health & Stats
// ============================================================

pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        cached_addresses: state.shield.registry.cached_count().await,
        own_address_configured: state.shield.engine.own_address().is_some(),
        risk_threshold: state.shield.engine.risk_threshold(),
    }))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> ApiResult<StatsResponse> {
    let stats = state.shield.registry.stats().await;
    Ok(Json(StatsResponse {
        total_reported: stats.total_reported,
        reports_today: stats.reports_today,
        top_threats: stats.top_threats,
        cached_addresses: state.shield.registry.cached_count().await,
    }))
}

// ============================================================
// Transfer checks
// ============================================================

pub async fn check_send(
    State(state): State<Arc<AppState>>,
    Json(intent): Json<TransactionIntent>,
) -> ApiResult<CheckResponse> {
    Ok(Json(state.shield.check_send(&intent).await.into()))
}

pub async fn check_receive(
    State(state): State<Arc<AppState>>,
    Json(intent): Json<TransactionIntent>,
) -> ApiResult<CheckResponse> {
    Ok(Json(state.shield.check_receive(&intent).await.into()))
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(intent): Json<TransactionIntent>,
) -> ApiResult<AnalysisResult> {
    Ok(Json(state.shield.analyze(&intent).await))
}

// ============================================================
// Similarity & Phishing
// ============================================================

pub async fn compare(Query(params): Query<SimilarityParams>) -> ApiResult<SimilarityResponse> {
    Ok(Json(SimilarityResponse {
        a: similarity::format_for_comparison(&params.a),
        b: similarity::format_for_comparison(&params.b),
        similar: similarity::is_similar(&params.a, &params.b),
        report: similarity::similarity_report(&params.a, &params.b),
    }))
}

pub async fn phishing(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> ApiResult<Option<SecurityAlert>> {
    Ok(Json(state.shield.phishing_check(&address).await))
}

// ============================================================
// Malicious address registry
// ============================================================

pub async fn report(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReportRequest>,
) -> ApiResult<ReportResponse> {
    require_address(&req.address)?;
    let risk_level = match req.risk_level {
        Some(level) => RiskLevel::new(level)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?,
        None => RiskLevel::default(),
    };
    let reason = req
        .reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| "Reported by user".to_string());

    let persisted = state
        .shield
        .report(&req.address, &reason, risk_level, req.evidence)
        .await;

    Ok(Json(ReportResponse {
        address: req.address.to_lowercase(),
        persisted,
    }))
}

pub async fn list_malicious(State(state): State<Arc<AppState>>) -> ApiResult<MaliciousListResponse> {
    let addresses = state.shield.registry.fetch_all().await;
    Ok(Json(MaliciousListResponse {
        count: addresses.len(),
        addresses,
    }))
}

pub async fn malicious_by_address(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> ApiResult<MaliciousAddressEntry> {
    state
        .shield
        .registry
        .lookup(&address)
        .await
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Address not reported"))
}

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> ApiResult<CacheClearedResponse> {
    state.shield.registry.clear_cache().await;
    Ok(Json(CacheClearedResponse { cleared: true }))
}
