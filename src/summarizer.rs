use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::llm::AiSummarizer;
use crate::scraper::{ScrapedDocument, Section};

pub const PLACEHOLDER_SUMMARY: &str = "Content overview available in full text.";
pub const MAX_EXTRACTIVE_CONCEPTS: usize = 10;

const SUMMARY_SECTIONS: usize = 5;
const MIN_SENTENCE_CHARS: usize = 20;
const CONCEPTS_PER_FIELD: usize = 2;
const TECH_TERM_LIMIT: usize = 5;
const FALLBACK_CONCEPT_LIMIT: usize = 8;

pub const DEFAULT_STOP_WORDS: &[&str] = &["the", "and", "for", "are", "with"];

pub const DEFAULT_TECH_TERMS: &[&str] = &[
    "cloud",
    "platform",
    "service",
    "api",
    "infrastructure",
    "computing",
    "data",
    "security",
    "network",
    "database",
    "server",
    "application",
    "software",
    "technology",
    "development",
    "deployment",
    "management",
    "system",
];

static CAPITALIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-zA-Z]+\b").expect("Failed to compile capitalized pattern"));

static LONG_CAPITALIZED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-zA-Z]{3,}\b").expect("Failed to compile long capitalized pattern")
});

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("Failed to compile sentence pattern"));

static DEFAULT_TECH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    tech_pattern(DEFAULT_TECH_TERMS).expect("Failed to compile technology vocabulary")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryMethod {
    AiPowered,
    Extractive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub key_concepts: Vec<String>,
    pub method: SummaryMethod,
}

/// Word lists that steer concept mining.
#[derive(Debug, Clone)]
pub struct ConceptVocabulary {
    stop_words: HashSet<String>,
    tech_pattern: Option<Regex>,
}

impl ConceptVocabulary {
    pub fn new<S: AsRef<str>>(stop_words: &[S], tech_terms: &[S]) -> Result<Self> {
        let stop_words = stop_words
            .iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        let tech_pattern = if tech_terms.iter().all(|t| t.as_ref().trim().is_empty()) {
            None
        } else {
            Some(tech_pattern(tech_terms)?)
        };
        Ok(Self {
            stop_words,
            tech_pattern,
        })
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(&word.to_lowercase())
    }

    /// A concept survives when it is longer than two characters and not a stop word.
    pub fn accepts(&self, concept: &str) -> bool {
        concept.chars().count() > 2 && !self.is_stop_word(concept)
    }
}

impl Default for ConceptVocabulary {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            tech_pattern: Some(DEFAULT_TECH_PATTERN.clone()),
        }
    }
}

fn tech_pattern<S: AsRef<str>>(terms: &[S]) -> Result<Regex> {
    let alternatives: Vec<String> = terms
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .map(|t| regex::escape(&t))
        .collect();
    Regex::new(&format!(r"\b(?:{})\w*\b", alternatives.join("|")))
        .map_err(|e| AppError::ConfigError(format!("Invalid technology vocabulary: {}", e)))
}

#[derive(Clone, Default)]
pub struct Summarizer {
    ai: Option<Arc<dyn AiSummarizer>>,
    vocabulary: ConceptVocabulary,
}

impl Summarizer {
    pub fn new(vocabulary: ConceptVocabulary) -> Self {
        Self {
            ai: None,
            vocabulary,
        }
    }

    pub fn with_ai(mut self, ai: Option<Arc<dyn AiSummarizer>>) -> Self {
        self.ai = ai;
        self
    }

    /// AI-assisted when a backend is present; any backend failure degrades to
    /// the extractive path.
    pub async fn summarize(&self, doc: &ScrapedDocument, max_words: usize) -> SummaryResult {
        let Some(ai) = &self.ai else {
            return self.extractive(doc, max_words);
        };

        match ai.summarize(&doc.title, &doc.full_text, max_words).await {
            Ok(reply) => {
                debug!(concepts = reply.key_concepts.len(), "AI summary ready");
                let mut key_concepts = ConceptSet::default();
                for concept in reply.key_concepts {
                    if self.vocabulary.accepts(&concept) {
                        key_concepts.insert(concept);
                    }
                }
                SummaryResult {
                    summary: reply.summary,
                    key_concepts: key_concepts.into_vec(),
                    method: SummaryMethod::AiPowered,
                }
            }
            Err(e) => {
                warn!(error = %e, "AI summarization failed, using extractive summary");
                self.extractive(doc, max_words)
            }
        }
    }

    pub fn extractive(&self, doc: &ScrapedDocument, max_words: usize) -> SummaryResult {
        let mut sentences = Vec::new();
        let mut concepts = ConceptSet::default();

        for section in doc.sections.iter().take(SUMMARY_SECTIONS) {
            let text = section.content.trim();
            if text.is_empty() {
                continue;
            }
            if let Some(first) = SENTENCE_END.split(text).next().map(str::trim) {
                if first.chars().count() > MIN_SENTENCE_CHARS {
                    sentences.push(first);
                }
            }
            concepts.extend(capitalized(&section.title, CONCEPTS_PER_FIELD));
            concepts.extend(capitalized(text, CONCEPTS_PER_FIELD));
        }

        concepts.extend(capitalized(&doc.title, usize::MAX));

        if let Some(pattern) = &self.vocabulary.tech_pattern {
            let lowered = doc.full_text.to_lowercase();
            concepts.extend(
                pattern
                    .find_iter(&lowered)
                    .take(TECH_TERM_LIMIT)
                    .map(|m| title_case(m.as_str())),
            );
        }

        if concepts.is_empty() {
            concepts.extend(
                LONG_CAPITALIZED
                    .find_iter(&doc.full_text)
                    .take(FALLBACK_CONCEPT_LIMIT)
                    .map(|m| m.as_str().to_string()),
            );
        }

        let mut key_concepts: Vec<String> = concepts
            .into_vec()
            .into_iter()
            .filter(|c| self.vocabulary.accepts(c))
            .collect();
        key_concepts.truncate(MAX_EXTRACTIVE_CONCEPTS);

        let summary = if sentences.is_empty() {
            PLACEHOLDER_SUMMARY.to_string()
        } else {
            limit_words(&sentences.join(". "), max_words)
        };

        SummaryResult {
            summary,
            key_concepts,
            method: SummaryMethod::Extractive,
        }
    }

    /// Capitalized words of a section's title and content, filtered like key concepts.
    pub fn section_keywords(&self, section: &Section) -> Vec<String> {
        let mut keywords = ConceptSet::default();
        keywords.extend(capitalized(&section.title, CONCEPTS_PER_FIELD));
        keywords.extend(capitalized(&section.content, CONCEPTS_PER_FIELD));
        keywords
            .into_vec()
            .into_iter()
            .filter(|k| self.vocabulary.accepts(k))
            .collect()
    }
}

/// Insertion-ordered set of concepts.
#[derive(Default)]
struct ConceptSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl ConceptSet {
    fn insert(&mut self, concept: String) {
        if self.seen.insert(concept.clone()) {
            self.ordered.push(concept);
        }
    }

    fn extend(&mut self, concepts: impl IntoIterator<Item = String>) {
        for concept in concepts {
            self.insert(concept);
        }
    }

    fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

fn capitalized(text: &str, limit: usize) -> impl Iterator<Item = String> + '_ {
    CAPITALIZED
        .find_iter(text)
        .take(limit)
        .map(|m| m.as_str().to_string())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn limit_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}...", words[..max_words].join(" "))
    } else {
        text.to_string()
    }
}
