//! Report endpoints.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use toolyard_common::AppResult;

use super::tools::StatusChangeResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::CsvFile};

/// Inventory summary response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub total: u64,
    pub red: u64,
    pub yellow: u64,
    pub green: u64,
    pub white: u64,
    pub recent_changes: Vec<StatusChangeResponse>,
}

/// Inventory counts per condition tag plus the latest transitions.
async fn summary(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<SummaryResponse>> {
    let summary = state.report_service.summary().await?;

    Ok(Json(SummaryResponse {
        total: summary.total,
        red: summary.red,
        yellow: summary.yellow,
        green: summary.green,
        white: summary.white,
        recent_changes: summary
            .recent_changes
            .into_iter()
            .map(Into::into)
            .collect(),
    }))
}

/// The current inventory as a CSV download.
async fn export(AuthUser(user): AuthUser, State(state): State<AppState>) -> AppResult<CsvFile> {
    let content = state.report_service.export_csv(&user.id).await?;

    Ok(CsvFile {
        filename: "toolyard-inventory.csv".to_string(),
        content,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(summary))
        .route("/export", get(export))
}
