//! Domain entities observed from the content provider.

use time::OffsetDateTime;

/// Title rendered for posts whose provider record carries no title text.
pub const UNTITLED: &str = "Untitled";

/// A single blog entry as reported by the content source.
///
/// Records are read-only snapshots; the provider owns their lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<OffsetDateTime>,
    pub last_edited_at: OffsetDateTime,
    pub tags: Vec<String>,
}

impl PostRecord {
    /// Title with the `Untitled` fallback applied.
    pub fn display_title(&self) -> &str {
        let trimmed = self.title.trim();
        if trimmed.is_empty() { UNTITLED } else { trimmed }
    }

    /// Description text, empty when the provider omits it.
    pub fn display_description(&self) -> &str {
        self.description.as_deref().map(str::trim).unwrap_or("")
    }

    /// Publish time, or `now` when the provider omits it.
    pub fn published_or(&self, now: OffsetDateTime) -> OffsetDateTime {
        self.published_at.unwrap_or(now)
    }
}
