use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{AppError, Result};

/// Character budget of page text sent with the summary request.
pub const SUMMARY_TEXT_BUDGET: usize = 8000;
/// Character budget of page text sent with the concept request.
pub const CONCEPT_TEXT_BUDGET: usize = 6000;
pub const MAX_AI_CONCEPTS: usize = 12;

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiSummary {
    pub summary: String,
    pub key_concepts: Vec<String>,
}

#[async_trait]
pub trait AiSummarizer: Send + Sync {
    async fn summarize(&self, title: &str, text: &str, max_words: usize) -> Result<AiSummary>;
}

/// Hands out a summarizer for a job, or `None` when no key is available.
pub trait AiProvider: Send + Sync {
    fn client_for(&self, api_key: Option<&str>) -> Option<Arc<dyn AiSummarizer>>;
}

/// Provider for deployments without any AI backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAi;

impl AiProvider for NoAi {
    fn client_for(&self, _api_key: Option<&str>) -> Option<Arc<dyn AiSummarizer>> {
        None
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    /// Tried in order until one answers.
    pub models: Vec<String>,
    pub timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            models: vec![
                "deepseek/deepseek-chat-v3-0324".to_string(),
                "google/gemini-flash-1.5".to_string(),
            ],
            timeout: Duration::from_secs(60),
        }
    }
}

pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    settings: LlmSettings,
}

impl OpenRouterClient {
    pub fn new(api_key: &str, settings: LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AppError::LlmError(format!("Failed to build LLM client: {}", e)))?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            settings,
        })
    }

    /// Sends `prompt` to each configured model in turn and returns the first reply.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let mut last_error = AppError::LlmError("No LLM models configured".to_string());
        for model in &self.settings.models {
            match self.call_model(model, prompt).await {
                Ok(reply) => {
                    debug!(model = model.as_str(), "LLM call succeeded");
                    return Ok(reply);
                }
                Err(e) => {
                    warn!(model = model.as_str(), error = %e, "LLM call failed, trying next model");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn call_model(&self, model: &str, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: model.into(),
            messages: vec![Message {
                role: "user".into(),
                content: prompt.into(),
            }],
        };

        let url = format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'));
        let res = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AppError::LlmError(e.to_string()))?;

        let json: serde_json::Value = res
            .json()
            .await
            .map_err(|e| AppError::LlmError(e.to_string()))?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AppError::LlmError("Invalid response format from LLM".to_string()))?
            .trim()
            .to_string();

        if reply.is_empty() {
            return Err(AppError::LlmError("Empty response from LLM".to_string()));
        }
        Ok(reply)
    }
}

#[async_trait]
impl AiSummarizer for OpenRouterClient {
    async fn summarize(&self, title: &str, text: &str, max_words: usize) -> Result<AiSummary> {
        let summary = self.complete(&summary_prompt(title, text, max_words)).await?;

        // A failed concept request still leaves a usable summary.
        let key_concepts = match self.complete(&concept_prompt(text)).await {
            Ok(reply) => parse_concepts(&reply),
            Err(e) => {
                warn!(error = %e, "key concept extraction failed");
                Vec::new()
            }
        };

        Ok(AiSummary {
            summary,
            key_concepts,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    default_api_key: Option<String>,
    settings: LlmSettings,
}

impl OpenRouterProvider {
    pub fn new(default_api_key: Option<String>, settings: LlmSettings) -> Self {
        Self {
            default_api_key,
            settings,
        }
    }
}

impl AiProvider for OpenRouterProvider {
    fn client_for(&self, api_key: Option<&str>) -> Option<Arc<dyn AiSummarizer>> {
        let key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or(self.default_api_key.as_deref())?;

        match OpenRouterClient::new(key, self.settings.clone()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!(error = %e, "AI summarization disabled for this job");
                None
            }
        }
    }
}

pub fn summary_prompt(title: &str, text: &str, max_words: usize) -> String {
    let content = truncate_chars(text, SUMMARY_TEXT_BUDGET);
    let mut result = String::with_capacity(content.len() + 400);
    result.push_str("You are a helpful assistant that creates concise summaries and identifies key concepts.\n");
    result.push_str(&format!(
        "Summarize the following content in {} words or less, and identify 5-10 key concepts or topics.\n\n",
        max_words
    ));
    result.push_str(&format!("Title: {}\n\nContent: {}\n\n", title, content));
    result.push_str("Please provide:\n1. A concise summary\n2. Key concepts (comma-separated list)\n");
    result
}

pub fn concept_prompt(text: &str) -> String {
    let content = truncate_chars(text, CONCEPT_TEXT_BUDGET);
    let mut result = String::with_capacity(content.len() + 150);
    result.push_str("Extract 8-12 key concepts or topics from the following text.\n");
    result.push_str("Return only a comma-separated list of concepts, no other text.\n\n");
    result.push_str("Text: ");
    result.push_str(content);
    result
}

/// Splits a comma-separated reply into at most [`MAX_AI_CONCEPTS`] distinct concepts.
pub fn parse_concepts(reply: &str) -> Vec<String> {
    let mut concepts: Vec<String> = Vec::new();
    for concept in reply.split(',').map(str::trim) {
        if concept.chars().count() > 2 && !concepts.iter().any(|c| c == concept) {
            concepts.push(concept.to_string());
        }
        if concepts.len() == MAX_AI_CONCEPTS {
            break;
        }
    }
    concepts
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
