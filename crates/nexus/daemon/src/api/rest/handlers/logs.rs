//! Log feed handlers

use super::LimitQuery;
use crate::api::rest::state::AppState;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::{self, Stream};
use nexus_types::LogEntry;
use std::convert::Infallible;
use std::time::Duration;

/// Log feed, most recent first
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<LogEntry>> {
    Json(state.nexus.logs().recent(query.limit))
}

/// Stream new log entries via SSE
pub async fn stream_logs(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.nexus.subscribe_logs();

    let stream = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(entry) => {
                let json = serde_json::to_string(&entry).unwrap_or_default();
                let sse_event = Event::default().event("log").data(json);
                Some((Ok(sse_event), rx))
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => Some((
                Ok(Event::default().comment(format!("lagged {}", skipped))),
                rx,
            )),
            Err(tokio::sync::broadcast::error::RecvError::Closed) => None,
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
