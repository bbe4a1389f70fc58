use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use estoque_store::RecordStore;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    store: Arc<dyn RecordStore>,
    entries_table: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub record_store: HealthCheck,
    pub checked_at: String,
}

pub fn router(store: Arc<dyn RecordStore>, entries_table: String) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { store, entries_table })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let record_store = store_check(&state).await;
    let ready = record_store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "estoque-server runtime initialized".to_string(),
        },
        record_store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn store_check(state: &HealthState) -> HealthCheck {
    match state.store.read_table(&state.entries_table).await {
        Ok(Some(table)) => HealthCheck {
            status: "ready",
            detail: format!("table `{}` read with {} rows", state.entries_table, table.rows.len()),
        },
        // An absent table is the recovered missing-table condition, not an
        // outage: it materializes on the first save.
        Ok(None) => HealthCheck {
            status: "ready",
            detail: format!("table `{}` absent; created on first save", state.entries_table),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("record store read failed: {error}"),
        },
    }
}
