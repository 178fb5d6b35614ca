// Roster data sources: a local JSON file or an HTTP(S) document.
//
// Either way the document must be a JSON array of raw player records. A load
// failure is reported distinctly from an empty roster.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("roster source {location} is unavailable: {reason}")]
    Unavailable { location: String, reason: String },

    #[error("roster document at {location} is not a JSON array")]
    NotAList { location: String },
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Anything that can produce the raw roster records.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Human-readable location, for logs and error messages.
    fn location(&self) -> &str;

    async fn load_roster(&self) -> Result<Vec<Value>, SourceError>;
}

/// Pick a source for `location`: `http://` and `https://` go over the
/// network, everything else is a file path.
pub fn source_for(location: &str) -> Box<dyn RosterSource> {
    let trimmed = location.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Box::new(HttpSource::new(trimmed))
    } else {
        Box::new(FileSource::new(trimmed))
    }
}

fn into_records(location: &str, document: Value) -> Result<Vec<Value>, SourceError> {
    match document {
        Value::Array(records) => Ok(records),
        _ => Err(SourceError::NotAList {
            location: location.to_string(),
        }),
    }
}

fn parse_document(location: &str, text: &str) -> Result<Vec<Value>, SourceError> {
    let document: Value = serde_json::from_str(text).map_err(|e| SourceError::Unavailable {
        location: location.to_string(),
        reason: format!("invalid JSON: {e}"),
    })?;
    into_records(location, document)
}

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FileSource {
    path: String,
}

impl FileSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RosterSource for FileSource {
    fn location(&self) -> &str {
        &self.path
    }

    async fn load_roster(&self) -> Result<Vec<Value>, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Unavailable {
                location: self.path.clone(),
                reason: e.to_string(),
            })?;
        let records = parse_document(&self.path, &text)?;
        info!("loaded {} roster records from {}", records.len(), self.path);
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// HttpSource
// ---------------------------------------------------------------------------

/// Fetches the roster over HTTP, bypassing intermediate caches with a
/// `nocache` query parameter.
pub struct HttpSource {
    http: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// The URL actually requested for a given cache-busting stamp.
    pub fn request_url(&self, stamp: i64) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}nocache={}", self.url, separator, stamp)
    }
}

#[async_trait]
impl RosterSource for HttpSource {
    fn location(&self) -> &str {
        &self.url
    }

    async fn load_roster(&self) -> Result<Vec<Value>, SourceError> {
        let url = self.request_url(chrono::Utc::now().timestamp_millis());
        debug!("fetching roster from {}", url);

        let unavailable = |reason: String| SourceError::Unavailable {
            location: self.url.clone(),
            reason,
        };

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("HTTP {status}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read body: {e}")))?;
        let records = parse_document(&self.url, &text)?;
        info!("fetched {} roster records from {}", records.len(), self.url);
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
