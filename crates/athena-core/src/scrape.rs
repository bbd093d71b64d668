//! Scrape request construction.
//!
//! The user pastes one source per line; each line is turned into the
//! descriptor shape the scraper expects for that question bank.

use std::collections::BTreeMap;

use serde::Serialize;

use tracing::{info, instrument};

use crate::error::{ScrapeError, ValidationError};
use crate::traits::{QuizBackend, ScrapeResponse};

/// One source to scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SourceDescriptor {
    /// Sources the scraper recognizes from the URL alone.
    Raw(String),
    Examveda(ExamvedaSource),
    /// `base_url, start_url, end_url`
    Range {
        base_url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        start_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        end_url: Option<String>,
    },
}

/// Examveda listing, with optional `key=value` page parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamvedaSource {
    pub base_url: String,
    #[serde(flatten)]
    pub params: BTreeMap<String, String>,
}

const RAW_SOURCES: [&str; 3] = ["sanfoundry.com", "pinoybix", "web.archive.org"];

impl SourceDescriptor {
    /// Parse one non-empty, trimmed input line.
    pub fn parse(line: &str) -> Self {
        if line.contains("examveda") {
            if !line.contains(',') {
                return SourceDescriptor::Examveda(ExamvedaSource {
                    base_url: line.to_string(),
                    params: BTreeMap::new(),
                });
            }
            let mut parts = line.split(',').map(str::trim);
            let base_url = parts.next().unwrap_or_default().to_string();
            let params = parts
                .filter_map(|part| part.split_once('='))
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .collect();
            return SourceDescriptor::Examveda(ExamvedaSource { base_url, params });
        }

        if RAW_SOURCES.iter().any(|source| line.contains(source)) {
            return SourceDescriptor::Raw(line.to_string());
        }

        let mut parts = line.split(',').map(|s| s.trim().to_string());
        SourceDescriptor::Range {
            base_url: parts.next().unwrap_or_default(),
            start_url: parts.next(),
            end_url: parts.next(),
        }
    }
}

/// Turn pasted input into descriptors, one per non-blank line.
pub fn parse_sources(input: &str) -> Vec<SourceDescriptor> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(SourceDescriptor::parse)
        .collect()
}

/// Body of `startScraping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeRequest {
    pub title: String,
    pub urls: Vec<SourceDescriptor>,
}

impl ScrapeRequest {
    /// Validate the title and parse the source lines.
    pub fn new(title: &str, input: &str) -> Result<Self, ValidationError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let urls = parse_sources(input);
        if urls.is_empty() {
            return Err(ValidationError::NoUrls);
        }
        Ok(Self {
            title: title.to_string(),
            urls,
        })
    }
}

/// Validate the input and ask the backend to scrape it into a new quiz set.
///
/// Nothing is sent when validation fails.
#[instrument(skip(backend, input))]
pub async fn start_scraping(
    backend: &dyn QuizBackend,
    title: &str,
    input: &str,
) -> Result<ScrapeResponse, ScrapeError> {
    let request = ScrapeRequest::new(title, input)?;
    let response = backend.start_scraping(&request).await?;
    info!(quiz_set = %response.quiz_set_id, sources = request.urls.len(), "scraping started");
    Ok(response)
}
