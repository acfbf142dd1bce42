use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};

use lc_cost::{CostSummary, CostWarning, JobOverrides, NestingResult, compute_cost_summary};

use crate::error::ServerError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CostRequest {
    pub nesting_result: NestingResult,
    #[serde(default)]
    pub job_overrides: Option<JobOverrides>,
}

#[derive(Debug, Serialize)]
pub struct CostResponse {
    pub summary: CostSummary,
    pub warnings: Vec<String>,
}

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/cost", post(cost_handler))
}

async fn cost_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CostRequest>,
) -> Result<Json<CostResponse>, ServerError> {
    let overrides = request.job_overrides.unwrap_or_else(|| JobOverrides {
        source_type: request.nesting_result.source_type,
        source_id: request.nesting_result.source_id.clone(),
        ..Default::default()
    });

    let (summary, warnings) = compute_cost_summary(
        &request.nesting_result,
        &overrides,
        &state.rate_book,
        &state.machine_profile,
    )?;

    Ok(Json(CostResponse {
        summary,
        warnings: warnings_to_strings(&warnings),
    }))
}

fn warnings_to_strings(warnings: &[CostWarning]) -> Vec<String> {
    warnings.iter().map(|w| w.to_string()).collect()
}
