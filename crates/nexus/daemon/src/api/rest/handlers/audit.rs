//! Audit log and manual anomaly handlers

use super::LimitQuery;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use nexus_governance::parse_penalty;
use nexus_types::{AuditEntry, WorkerId};
use serde::Deserialize;

/// Audit entries, most recent first
pub async fn list_audit(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<AuditEntry>> {
    Json(state.nexus.audit(query.limit).await)
}

/// Penalty as typed by an operator: a number or free text
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PenaltyInput {
    Amount(u64),
    Text(String),
}

impl PenaltyInput {
    fn resolve(&self) -> u64 {
        match self {
            PenaltyInput::Amount(amount) => parse_penalty(&amount.to_string()),
            PenaltyInput::Text(text) => parse_penalty(text),
        }
    }
}

impl Default for PenaltyInput {
    fn default() -> Self {
        PenaltyInput::Text(String::new())
    }
}

/// Manual anomaly report
#[derive(Debug, Deserialize)]
pub struct AnomalyRequest {
    pub worker_id: String,
    pub violation: String,
    #[serde(default)]
    pub penalty: PenaltyInput,
}

/// Record a manual audit against a worker
pub async fn report_anomaly(
    State(state): State<AppState>,
    Json(request): Json<AnomalyRequest>,
) -> ApiResult<(StatusCode, Json<AuditEntry>)> {
    let worker_id = request.worker_id.trim();
    if worker_id.is_empty() {
        return Err(ApiError::BadRequest("worker_id is required".to_string()));
    }
    let violation = request.violation.trim();
    if violation.is_empty() {
        return Err(ApiError::BadRequest("violation is required".to_string()));
    }

    let penalty = request.penalty.resolve();
    let entry = state
        .nexus
        .report_anomaly(&WorkerId::new(worker_id), violation, penalty)
        .await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_input_forms() {
        let parse = |raw: &str| -> u64 {
            serde_json::from_str::<PenaltyInput>(raw).unwrap().resolve()
        };
        assert_eq!(parse("1000"), 1000);
        assert_eq!(parse(r#""1,500 SP""#), 1500);
        assert_eq!(parse(r#""heavy""#), 500);
        assert_eq!(parse("0"), 500);
        assert_eq!(parse("18446744073709551615"), 500);
        assert_eq!(parse("9223372036854775807"), 9223372036854775807);
        assert_eq!(PenaltyInput::default().resolve(), 500);
    }
}
