use axum::{
    routing::{get, post},
    Router,
    extract::{Json, Path, State},
    response::{IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use chrono::Utc;
use tracing::info;

use crate::error::Result;
use crate::api::models::{
    HealthResponse, JobList, MessageResponse, ScrapeRequest, ScrapeResponse, ServiceInfo,
};
use crate::api::response;
use crate::job::JobStatus;
use crate::orchestrator::SubmitOptions;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/scrape", post(scrape_handler))
        .route("/jobs", get(list_jobs_handler))
        .route("/job/:job_id", get(job_status_handler).delete(delete_job_handler))
        .route("/job/:job_id/result", get(job_result_handler))
        .route("/job/:job_id/mindmaps", get(job_mindmaps_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn root_handler() -> impl IntoResponse {
    response::success(ServiceInfo {
        message: "Website Scraper & Mind Map Generator API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: [
            "POST /scrape - Start scraping job",
            "GET /job/{job_id} - Get job status",
            "GET /job/{job_id}/result - Get completed result",
            "GET /job/{job_id}/mindmaps - Get mind maps of a completed job",
            "DELETE /job/{job_id} - Delete a job",
            "GET /jobs - List all jobs",
            "GET /health - Health check",
        ]
        .iter()
        .map(|e| e.to_string())
        .collect(),
    })
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    response::success(HealthResponse {
        status: "healthy".to_string(),
        ai_configured: state.config.openrouter_api_key.is_some(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn scrape_handler(
    State(state): State<AppState>,
    Json(req): Json<ScrapeRequest>,
) -> Result<impl IntoResponse> {
    let options = SubmitOptions {
        api_key: req.api_key,
        summary_length: req.summary_length,
    };
    let job_id = state.orchestrator.submit(&req.url, options)?;
    info!(job_id = job_id.as_str(), url = req.url.as_str(), "scrape job accepted");

    Ok(response::accepted(ScrapeResponse {
        job_id,
        status: JobStatus::Queued,
        message: "Scraping job started successfully".to_string(),
    }))
}

async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response> {
    let job = state.orchestrator.status(&job_id)?;
    Ok(response::success(job.as_ref()).into_response())
}

async fn list_jobs_handler(State(state): State<AppState>) -> impl IntoResponse {
    let jobs = state.orchestrator.list();
    response::success(JobList {
        total: jobs.len(),
        jobs,
    })
}

async fn job_result_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse> {
    let result = state.orchestrator.result(&job_id)?;
    Ok(response::success(result))
}

async fn job_mindmaps_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse> {
    let mind_maps = state.orchestrator.mind_maps(&job_id)?;
    Ok(response::success(mind_maps))
}

async fn delete_job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse> {
    state.orchestrator.delete(&job_id)?;
    Ok(response::success(MessageResponse {
        message: format!("Job {} deleted successfully", job_id),
    }))
}
