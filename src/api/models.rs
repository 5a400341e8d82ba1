use serde::{Deserialize, Serialize};

use crate::job::{JobId, JobStatus, JobSummary};

#[derive(Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub summary_length: Option<usize>,
}

#[derive(Serialize)]
pub struct ScrapeResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub message: String,
}

#[derive(Serialize)]
pub struct JobList {
    pub total: usize,
    pub jobs: Vec<JobSummary>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub ai_configured: bool,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub endpoints: Vec<String>,
}
