use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, Result};

pub const NO_TITLE: &str = "No Title";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Elements whose text never reaches sections or the full text.
const STRIPPED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside", "noscript"];

/// Tried in order; the first match becomes the main content region.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=\"main\"]",
    ".content",
    ".main-content",
    "#content",
    ".post-content",
];

// Create static selectors to avoid recompiling them each time
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("Failed to parse title selector"));

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Failed to parse body selector"));

static BLOCK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, p").expect("Failed to parse block selector")
});

static CONTENT_SELECTOR_LIST: Lazy<Vec<Selector>> = Lazy::new(|| {
    CONTENT_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("Failed to parse content selector"))
        .collect()
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedDocument {
    pub url: String,
    pub title: String,
    pub sections: Vec<Section>,
    pub full_text: String,
    pub word_count: usize,
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the raw markup behind `url`.
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::FetchError(format!("Error scraping {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::FetchError(format!(
                "Error scraping {}: HTTP status {}",
                url, status
            )));
        }

        let html = response.text().await.map_err(|e| {
            AppError::ParseError(format!("Error processing content from {}: {}", url, e))
        })?;
        debug!(url, bytes = html.len(), "fetched page");
        Ok(html)
    }
}

/// Builds the structured document for `html` fetched from `url`.
pub fn extract(html: &str, url: &str) -> ScrapedDocument {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .find(|el| !is_stripped(*el))
        .map(|element| collapse_whitespace(&visible_text(element)))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let sections = match main_region(&document) {
        Some(region) => collect_sections(region, &title),
        None => Vec::new(),
    };

    let full_text = collapse_whitespace(&visible_text(document.root_element()));
    let word_count = full_text.split_whitespace().count();

    ScrapedDocument {
        url: url.to_string(),
        title,
        sections,
        full_text,
        word_count,
    }
}

fn main_region(document: &Html) -> Option<ElementRef<'_>> {
    CONTENT_SELECTOR_LIST
        .iter()
        .find_map(|selector| document.select(selector).find(|el| !is_stripped(*el)))
        .or_else(|| document.select(&BODY_SELECTOR).next())
}

fn collect_sections(region: ElementRef<'_>, document_title: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current = Section {
        title: document_title.to_string(),
        content: String::new(),
        keywords: Vec::new(),
    };

    for element in region.select(&BLOCK_SELECTOR) {
        if is_stripped(element) {
            continue;
        }

        let text = collapse_whitespace(&visible_text(element));
        if element.value().name() == "p" {
            if text.is_empty() {
                continue;
            }
            if !current.content.is_empty() {
                current.content.push(' ');
            }
            current.content.push_str(&text);
        } else {
            let next = Section {
                title: text,
                content: String::new(),
                keywords: Vec::new(),
            };
            let finished = std::mem::replace(&mut current, next);
            if !finished.content.trim().is_empty() {
                sections.push(finished);
            }
        }
    }

    if !current.content.trim().is_empty() {
        sections.push(current);
    }

    sections
}

/// True when the element or one of its ancestors is a non-content tag.
fn is_stripped(element: ElementRef<'_>) -> bool {
    let node = *element;
    std::iter::once(node)
        .chain(node.ancestors())
        .filter_map(|node| node.value().as_element())
        .any(|el| STRIPPED_TAGS.contains(&el.name()))
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(ElementRef::wrap)
            .is_some_and(is_stripped);
        if !hidden {
            text.push_str(chunk);
        }
    }
    text
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"
        <html>
          <head><title>  Cloud Guide </title><style>.x { color: red }</style></head>
          <body>
            <header><p>Site header text</p></header>
            <nav><a href="/">Home</a></nav>
            <main>
              <p>Intro paragraph   spanning
                 lines.</p>
              <h2>Setup</h2>
              <p>First step.</p>
              <p>Second step.</p>
              <h2>Empty</h2>
              <h3>Usage</h3>
              <p>Run it.<script>var hidden = 1;</script></p>
            </main>
            <footer><p>Copyright</p></footer>
          </body>
        </html>
    "#;

    #[test]
    fn sections_follow_headings_and_drop_empty_ones() {
        let doc = extract(PAGE, "https://example.com");
        assert_eq!(doc.title, "Cloud Guide");

        let titles: Vec<&str> = doc.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Cloud Guide", "Setup", "Usage"]);
        assert_eq!(doc.sections[0].content, "Intro paragraph spanning lines.");
        assert_eq!(doc.sections[1].content, "First step. Second step.");
        assert_eq!(doc.sections[2].content, "Run it.");
        assert!(doc.sections.iter().all(|s| s.keywords.is_empty()));
    }

    #[test]
    fn full_text_skips_non_content_elements() {
        let doc = extract(PAGE, "https://example.com");
        assert!(!doc.full_text.contains("Site header text"));
        assert!(!doc.full_text.contains("Copyright"));
        assert!(!doc.full_text.contains("hidden"));
        assert!(!doc.full_text.contains("color"));
        assert!(doc.full_text.starts_with("Cloud Guide"));
        assert!(!doc.full_text.contains("  "));
        assert_eq!(doc.word_count, doc.full_text.split_whitespace().count());
    }

    #[test]
    fn missing_title_defaults() {
        let doc = extract("<html><body><p>Just text here.</p></body></html>", "u");
        assert_eq!(doc.title, NO_TITLE);
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, NO_TITLE);
    }

    #[test]
    fn title_inside_header_is_ignored() {
        let html = "<html><body><header><svg><title>Site Logo</title></svg></header>\
                    <main><p>Body paragraph text here.</p></main></body></html>";
        let doc = extract(html, "u");
        assert_eq!(doc.title, NO_TITLE);
        assert_eq!(doc.sections[0].title, NO_TITLE);
    }

    #[test]
    fn article_wins_over_body_and_content_class() {
        let html = r#"<html><body>
            <div class="content"><p>From content class.</p></div>
            <article><p>From article.</p></article>
        </body></html>"#;
        let doc = extract(html, "u");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].content, "From article.");
    }

    #[test]
    fn falls_back_to_body() {
        let html = "<html><body><h1>Only</h1><p>Body text.</p></body></html>";
        let doc = extract(html, "u");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "Only");
        assert_eq!(doc.sections[0].content, "Body text.");
    }

    #[test]
    fn empty_document() {
        let doc = extract("", "u");
        assert_eq!(doc.title, NO_TITLE);
        assert!(doc.sections.is_empty());
        assert_eq!(doc.full_text, "");
        assert_eq!(doc.word_count, 0);
    }
}
