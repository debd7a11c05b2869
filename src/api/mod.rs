//! Read-only HTTP API over the latest JSON snapshot.
//!
//! The snapshot is re-read on every request, so a finished scrape is
//! visible without restarting the server.

use crate::extract::MaterialRecord;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<PathBuf>,
}

impl AppState {
    pub fn new(snapshot: impl Into<PathBuf>) -> Self {
        Self { snapshot: Arc::new(snapshot.into()) }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub supplier: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/materials", get(list_materials))
        .route("/materials/{category}", get(list_by_category))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthData> {
    Json(HealthData { status: "ok" })
}

async fn list_materials(State(state): State<AppState>) -> Json<Vec<MaterialRecord>> {
    Json(load_snapshot(&state.snapshot).await)
}

async fn list_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<CategoryQuery>,
) -> Json<Vec<MaterialRecord>> {
    let records = load_snapshot(&state.snapshot).await;
    Json(filter_records(records, &category, query.supplier.as_deref()))
}

/// Reads the snapshot; a missing or unreadable file serves as empty.
pub async fn load_snapshot(path: &std::path::Path) -> Vec<MaterialRecord> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No snapshot at {}", path.display());
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "failed to read snapshot {}", path.display());
            return Vec::new();
        }
    };

    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(error = %e, "failed to parse snapshot {}", path.display());
        Vec::new()
    })
}

/// Exact category match, then exact supplier match when one is given.
/// An empty supplier filter is ignored.
pub fn filter_records(
    records: Vec<MaterialRecord>,
    category: &str,
    supplier: Option<&str>,
) -> Vec<MaterialRecord> {
    let supplier = supplier.filter(|s| !s.is_empty());
    records
        .into_iter()
        .filter(|r| r.category == category)
        .filter(|r| supplier.is_none_or(|s| r.supplier == s))
        .collect()
}
