use serde::{Deserialize, Serialize};

use crate::address::similarity::SimilarityReport;
use crate::alert::SecurityAlert;
use crate::registry::store::MaliciousAddressEntry;

// ============================================================
// Request types
// ============================================================

#[derive(Debug, Deserialize)]
pub struct SimilarityParams {
    pub a: String,
    pub b: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub address: String,
    pub reason: Option<String>,
    pub risk_level: Option<u8>,
    pub evidence: Option<String>,
}

// ============================================================
// Response types
// ============================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub cached_addresses: usize,
    pub own_address_configured: bool,
    pub risk_threshold: u8,
}

/// Decision for one transfer. `allowed` is false only when the alert blocks.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub allowed: bool,
    pub alert: Option<SecurityAlert>,
}

impl From<Option<SecurityAlert>> for CheckResponse {
    fn from(alert: Option<SecurityAlert>) -> Self {
        Self {
            allowed: !alert.as_ref().is_some_and(|a| a.blocked),
            alert,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityResponse {
    pub a: String,
    pub b: String,
    pub similar: bool,
    #[serde(flatten)]
    pub report: SimilarityReport,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub address: String,
    pub persisted: bool,
}

#[derive(Debug, Serialize)]
pub struct MaliciousListResponse {
    pub count: usize,
    pub addresses: Vec<MaliciousAddressEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_reported: usize,
    pub reports_today: usize,
    pub top_threats: Vec<String>,
    pub cached_addresses: usize,
}

#[derive(Debug, Serialize)]
pub struct CacheClearedResponse {
    pub cleared: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
