use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::mindmap::MindMapSet;
use crate::scraper::ScrapedDocument;
use crate::summarizer::SummaryResult;

pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteResult {
    pub scraped_content: ScrapedDocument,
    pub summary: SummaryResult,
    pub mind_maps: MindMapSet,
}

/// One snapshot of a job. Transitions build a new snapshot instead of mutating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CompleteResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Everything but the result payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub enum JobEvent {
    Started,
    Progress(u8),
    Completed(Box<CompleteResult>),
    Failed(String),
}

impl Job {
    pub fn queued() -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: JobStatus::Queued,
            progress: 0,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Returns the snapshot that follows `event`, or `InvalidState` when the
    /// event is not allowed from the current status.
    pub fn apply(&self, event: JobEvent, now: DateTime<Utc>) -> Result<Job> {
        let mut next = self.clone();
        match (self.status, event) {
            (JobStatus::Queued, JobEvent::Started) => {
                next.status = JobStatus::Processing;
            }
            (JobStatus::Processing, JobEvent::Progress(progress)) => {
                // 100 is reserved for completion.
                next.progress = self.progress.max(progress.min(99));
            }
            (JobStatus::Processing, JobEvent::Completed(result)) => {
                next.status = JobStatus::Completed;
                next.progress = 100;
                next.result = Some(*result);
                next.completed_at = Some(now);
            }
            (JobStatus::Queued | JobStatus::Processing, JobEvent::Failed(error)) => {
                next.status = JobStatus::Failed;
                next.error = Some(error);
                next.completed_at = Some(now);
            }
            (status, event) => {
                return Err(AppError::InvalidState(format!(
                    "Cannot apply {} to a job that is {}",
                    event.name(),
                    status
                )));
            }
        }
        Ok(next)
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            job_id: self.job_id.clone(),
            status: self.status,
            progress: self.progress,
            created_at: self.created_at,
            completed_at: self.completed_at,
        }
    }
}

impl JobEvent {
    fn name(&self) -> &'static str {
        match self {
            JobEvent::Started => "start",
            JobEvent::Progress(_) => "progress",
            JobEvent::Completed(_) => "completion",
            JobEvent::Failed(_) => "failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mindmap;
    use crate::summarizer::SummaryMethod;

    fn sample_result() -> CompleteResult {
        CompleteResult {
            scraped_content: ScrapedDocument {
                url: "https://example.com".into(),
                title: "Example".into(),
                sections: Vec::new(),
                full_text: "Example".into(),
                word_count: 1,
            },
            summary: SummaryResult {
                summary: "Example summary".into(),
                key_concepts: vec!["Example".into()],
                method: SummaryMethod::Extractive,
            },
            mind_maps: mindmap::render("Example", "Example summary", &["Example".to_string()]),
        }
    }

    fn processing() -> Job {
        Job::queued().apply(JobEvent::Started, Utc::now()).unwrap()
    }

    #[test]
    fn new_jobs_are_queued_at_zero() {
        let job = Job::queued();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0);
        assert!(job.result.is_none() && job.error.is_none() && job.completed_at.is_none());
    }

    #[test]
    fn progress_never_goes_backwards_or_reaches_100_early() {
        let job = processing();
        let job = job.apply(JobEvent::Progress(60), Utc::now()).unwrap();
        let job = job.apply(JobEvent::Progress(30), Utc::now()).unwrap();
        assert_eq!(job.progress, 60);
        let job = job.apply(JobEvent::Progress(100), Utc::now()).unwrap();
        assert_eq!(job.progress, 99);
    }

    #[test]
    fn completion_attaches_result_and_stamps_time() {
        let now = Utc::now();
        let job = processing()
            .apply(JobEvent::Completed(Box::new(sample_result())), now)
            .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.completed_at, Some(now));
        assert!(job.result.is_some());
        assert!(job.error.is_none());
    }

    #[test]
    fn failure_keeps_progress_and_has_no_result() {
        let job = processing().apply(JobEvent::Progress(30), Utc::now()).unwrap();
        let job = job.apply(JobEvent::Failed("boom".into()), Utc::now()).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 30);
        assert_eq!(job.error.as_deref(), Some("boom"));
        assert!(job.result.is_none());
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn terminal_states_reject_further_events() {
        let done = processing()
            .apply(JobEvent::Completed(Box::new(sample_result())), Utc::now())
            .unwrap();
        assert!(matches!(
            done.apply(JobEvent::Failed("late".into()), Utc::now()),
            Err(AppError::InvalidState(_))
        ));

        let failed = processing().apply(JobEvent::Failed("x".into()), Utc::now()).unwrap();
        assert!(failed.apply(JobEvent::Started, Utc::now()).is_err());
        assert!(failed.apply(JobEvent::Progress(50), Utc::now()).is_err());
    }

    #[test]
    fn queued_jobs_cannot_complete_directly() {
        let job = Job::queued();
        assert!(job
            .apply(JobEvent::Completed(Box::new(sample_result())), Utc::now())
            .is_err());
    }

    #[test]
    fn serialized_status_is_lowercase() {
        let json = serde_json::to_value(Job::queued()).unwrap();
        assert_eq!(json["status"], "queued");
        assert!(json.get("result").is_none());
        assert!(json["completed_at"].is_null());
    }
}
