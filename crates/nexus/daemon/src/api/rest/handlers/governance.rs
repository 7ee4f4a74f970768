//! Governance state and loop control handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{extract::State, Json};
use nexus_governance::{CycleOutcome, LoopStatus, TickerMessage};
use nexus_types::Worker;
use serde::Serialize;

/// System state, activation, cooldown, and the current thought
pub async fn get_state(State(state): State<AppState>) -> Json<LoopStatus> {
    Json(state.nexus.status().await)
}

pub async fn list_workers(State(state): State<AppState>) -> Json<Vec<Worker>> {
    Json(state.nexus.workers().await)
}

pub async fn get_ticker(State(state): State<AppState>) -> ApiResult<Json<TickerMessage>> {
    state
        .nexus
        .ticker()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no ticker messages configured".to_string()))
}

/// Loop control response
#[derive(Debug, Serialize)]
pub struct LoopControlResponse {
    pub active: bool,
    /// `false` when the loop was already in the requested state.
    pub changed: bool,
}

pub async fn activate_loop(State(state): State<AppState>) -> Json<LoopControlResponse> {
    let changed = state.nexus.activate().await;
    Json(LoopControlResponse {
        active: true,
        changed,
    })
}

pub async fn deactivate_loop(State(state): State<AppState>) -> Json<LoopControlResponse> {
    let changed = state.nexus.deactivate().await;
    Json(LoopControlResponse {
        active: false,
        changed,
    })
}

/// Run one decision cycle now and report what it did.
pub async fn trigger_cycle(State(state): State<AppState>) -> Json<CycleOutcome> {
    let outcome = state.nexus.run_cycle().await;
    tracing::info!(outcome = ?outcome, "Manual cycle trigger");
    Json(outcome)
}
