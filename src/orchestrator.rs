use chrono::Utc;
use reqwest::Url;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_SUMMARY_LENGTH;
use crate::error::{AppError, Result};
use crate::job::{CompleteResult, Job, JobEvent, JobId, JobStatus, JobSummary};
use crate::llm::AiProvider;
use crate::mindmap::{self, MindMapSet};
use crate::persist;
use crate::scraper::{self, Fetcher};
use crate::store::JobStore;
use crate::summarizer::{ConceptVocabulary, Summarizer, SummaryMethod};

pub const PROGRESS_STARTED: u8 = 10;
pub const PROGRESS_FETCHED: u8 = 30;
pub const PROGRESS_SUMMARIZED: u8 = 60;
pub const PROGRESS_RENDERED: u8 = 80;

#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Overrides the configured AI key for this job.
    pub api_key: Option<String>,
    pub summary_length: Option<usize>,
}

pub struct OrchestratorSettings {
    pub output_dir: Option<PathBuf>,
    pub default_summary_length: usize,
    pub vocabulary: ConceptVocabulary,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            output_dir: None,
            default_summary_length: DEFAULT_SUMMARY_LENGTH,
            vocabulary: ConceptVocabulary::default(),
        }
    }
}

/// Runs scrape jobs in the background and answers queries about them.
#[derive(Clone)]
pub struct JobOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    store: JobStore,
    fetcher: Arc<dyn Fetcher>,
    ai: Arc<dyn AiProvider>,
    settings: OrchestratorSettings,
    tasks: Mutex<HashMap<JobId, JoinHandle<()>>>,
}

impl JobOrchestrator {
    pub fn new(
        store: JobStore,
        fetcher: Arc<dyn Fetcher>,
        ai: Arc<dyn AiProvider>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                fetcher,
                ai,
                settings,
                tasks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Records a queued job and schedules its pipeline. Must be called from
    /// within a tokio runtime.
    pub fn submit(&self, url: &str, options: SubmitOptions) -> Result<JobId> {
        let url = validate_url(url)?;
        let job = self.inner.store.insert(Job::queued());
        let job_id = job.job_id.clone();
        info!(job_id = job_id.as_str(), url = url.as_str(), "job queued");

        let inner = self.inner.clone();
        let handle = tokio::spawn(inner.run(job_id.clone(), url, options));

        let mut tasks = self.inner.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|_, task| !task.is_finished());
        tasks.insert(job_id.clone(), handle);

        Ok(job_id)
    }

    pub fn status(&self, job_id: &str) -> Result<Arc<Job>> {
        self.inner
            .store
            .get(job_id)
            .ok_or_else(|| AppError::NotFound(job_id.to_string()))
    }

    pub fn list(&self) -> Vec<JobSummary> {
        self.inner.store.list().iter().map(|job| job.summary()).collect()
    }

    pub fn result(&self, job_id: &str) -> Result<CompleteResult> {
        let job = self.status(job_id)?;
        match (&job.status, &job.result) {
            (JobStatus::Completed, Some(result)) => Ok(result.clone()),
            (status, _) => Err(AppError::InvalidState(format!(
                "Job is not completed. Current status: {}",
                status
            ))),
        }
    }

    pub fn mind_maps(&self, job_id: &str) -> Result<MindMapSet> {
        self.result(job_id).map(|result| result.mind_maps)
    }

    /// Forgets the job. A pipeline still running for it keeps going but its
    /// updates are dropped.
    pub fn delete(&self, job_id: &str) -> Result<()> {
        self.inner
            .store
            .remove(job_id)
            .ok_or_else(|| AppError::NotFound(job_id.to_string()))?;
        info!(job_id, "job deleted");
        Ok(())
    }

    /// Waits for the background task of `job_id`. Returns false when no task
    /// is tracked for it (already awaited, pruned after finishing, or unknown).
    pub async fn wait(&self, job_id: &str) -> bool {
        let handle = self
            .inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(job_id);
        match handle {
            Some(handle) => {
                if let Err(e) = handle.await {
                    error!(job_id, error = %e, "job task did not finish cleanly");
                }
                true
            }
            None => false,
        }
    }
}

impl Inner {
    async fn run(self: Arc<Self>, job_id: JobId, url: Url, options: SubmitOptions) {
        let started = Instant::now();
        self.transition(&job_id, JobEvent::Started);

        // The pipeline gets its own task so that a panic in any stage still
        // ends in a failed job.
        let pipeline = tokio::spawn(self.clone().pipeline(job_id.clone(), url, options));
        let outcome = match pipeline.await {
            Ok(outcome) => outcome,
            Err(e) => Err(AppError::PipelineError(format!("pipeline task aborted: {}", e))),
        };

        match outcome {
            Ok(result) => {
                self.transition(&job_id, JobEvent::Completed(Box::new(result)));
                info!(job_id = job_id.as_str(), elapsed = ?started.elapsed(), "job completed");
            }
            Err(e) => {
                error!(job_id = job_id.as_str(), error = %e, "job failed");
                self.transition(&job_id, JobEvent::Failed(e.to_string()));
            }
        }
    }

    async fn pipeline(
        self: Arc<Self>,
        job_id: JobId,
        url: Url,
        options: SubmitOptions,
    ) -> Result<CompleteResult> {
        let url = url.as_str();
        self.transition(&job_id, JobEvent::Progress(PROGRESS_STARTED));

        info!(job_id = job_id.as_str(), url, "scraping content");
        let html = self.fetcher.fetch_html(url).await?;
        let document = scraper::extract(&html, url);
        debug!(
            job_id = job_id.as_str(),
            sections = document.sections.len(),
            words = document.word_count,
            "content extracted"
        );
        self.transition(&job_id, JobEvent::Progress(PROGRESS_FETCHED));

        info!(job_id = job_id.as_str(), "generating summary");
        let max_words = options
            .summary_length
            .unwrap_or(self.settings.default_summary_length);
        let summarizer = Summarizer::new(self.settings.vocabulary.clone())
            .with_ai(self.ai.client_for(options.api_key.as_deref()));
        let summary = summarizer.summarize(&document, max_words).await;

        let mut document = document;
        if summary.method == SummaryMethod::Extractive {
            for section in &mut document.sections {
                section.keywords = summarizer.section_keywords(section);
            }
        }
        self.transition(&job_id, JobEvent::Progress(PROGRESS_SUMMARIZED));

        info!(job_id = job_id.as_str(), "creating mind maps");
        let mind_maps = mindmap::render(&document.title, &summary.summary, &summary.key_concepts);
        self.transition(&job_id, JobEvent::Progress(PROGRESS_RENDERED));

        let result = CompleteResult {
            scraped_content: document,
            summary,
            mind_maps,
        };

        if let Some(dir) = &self.settings.output_dir {
            persist::save_result(dir, url, &result).await?;
        }

        Ok(result)
    }

    /// Applies `event` to the stored job. Deleted jobs and rejected
    /// transitions are logged and otherwise ignored.
    fn transition(&self, job_id: &str, event: JobEvent) {
        match self.store.update(job_id, |job| job.apply(event, Utc::now())) {
            Ok(Some(job)) => {
                debug!(job_id, status = %job.status, progress = job.progress, "job updated");
                if job.status.is_terminal() {
                    self.prune_finished_tasks();
                }
            }
            Ok(None) => debug!(job_id, "job was deleted; dropping update"),
            Err(e) => warn!(job_id, error = %e, "ignored job transition"),
        }
    }

    fn prune_finished_tasks(&self) {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, task| !task.is_finished());
    }
}

fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| AppError::InvalidUrl(format!("{}: {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::InvalidUrl(format!("unsupported scheme '{}' in {}", other, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https_only() {
        assert!(validate_url("https://example.com/page").is_ok());
        assert!(validate_url(" http://example.com ").is_ok());
        assert!(matches!(validate_url("ftp://example.com"), Err(AppError::InvalidUrl(_))));
        assert!(matches!(validate_url("not a url"), Err(AppError::InvalidUrl(_))));
    }
}
