//! Content source port.
//!
//! The provider (a Notion database or local markdown collections) is an
//! external collaborator; the application only ever asks it for the full
//! post collection.

use std::time::Instant;

use async_trait::async_trait;
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, error};

use crate::domain::entities::PostRecord;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("content request failed: {0}")]
    Http(String),
    #[error("content provider answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode provider response: {0}")]
    Decode(String),
    #[error("io error reading `{path}`: {message}")]
    Io { path: String, message: String },
    #[error("invalid front matter in `{path}`: {message}")]
    FrontMatter { path: String, message: String },
    #[error("content source misconfigured: {0}")]
    Configuration(String),
}

impl SourceError {
    pub fn io(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Fetches the current post collection from the provider.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Every published post, in provider order.
    async fn fetch_posts(&self) -> Result<Vec<PostRecord>, SourceError>;

    /// Short label used in logs.
    fn kind(&self) -> &'static str;
}

/// Fetch the post collection for `endpoint`, logging and counting failures.
///
/// `None` tells the caller to serve its fallback document.
pub async fn fetch_or_fallback(
    source: &dyn ContentSource,
    endpoint: &'static str,
) -> Option<Vec<PostRecord>> {
    let started = Instant::now();
    let result = source.fetch_posts().await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    histogram!("blogfront_content_fetch_ms", "source" => source.kind()).record(elapsed_ms);

    match result {
        Ok(posts) => {
            debug!(
                target = "blogfront::content",
                source = source.kind(),
                endpoint,
                posts = posts.len(),
                elapsed_ms,
                "fetched posts"
            );
            Some(posts)
        }
        Err(err) => {
            counter!("blogfront_content_fallback_total", "endpoint" => endpoint).increment(1);
            error!(
                target = "blogfront::content",
                source = source.kind(),
                endpoint,
                error = %err,
                elapsed_ms,
                "content fetch failed; serving fallback document"
            );
            None
        }
    }
}
