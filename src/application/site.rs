//! Site identity shared by the feed and sitemap generators.

use std::num::NonZeroUsize;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use time::{
    OffsetDateTime,
    format_description::well_known::{Rfc2822, Rfc3339},
};

use crate::util::timezone::SiteTimezone;

/// Characters escaped when a post id is placed in a URL path. `/` is kept so
/// collection-prefixed ids (`en/slug`) stay readable.
const POST_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Public identity of the site plus its timestamp policy.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    base_url: String,
    pub title: String,
    pub description: String,
    pub language: String,
    pub author: String,
    pub timezone: SiteTimezone,
    pub feed_max_items: Option<NonZeroUsize>,
}

impl SiteProfile {
    pub fn new(base_url: &str, title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            author: title.clone(),
            title,
            description: String::new(),
            language: "en".to_string(),
            timezone: SiteTimezone::Utc,
            feed_max_items: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_timezone(mut self, timezone: SiteTimezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_feed_max_items(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.feed_max_items = limit;
        self
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn root_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    /// Absolute URL for a site path such as `/rss.xml`.
    pub fn absolute(&self, path: &str) -> String {
        let trimmed = path.trim_start_matches('/');
        format!("{}/{trimmed}", self.base_url)
    }

    /// Canonical post URL: `{base_url}/post/{id}`.
    pub fn post_url(&self, id: &str) -> String {
        format!(
            "{}/post/{}",
            self.base_url,
            utf8_percent_encode(id, POST_PATH)
        )
    }

    pub fn rfc2822(&self, instant: OffsetDateTime) -> String {
        let local = self.timezone.localize(instant);
        local.format(&Rfc2822).unwrap_or_else(|_| local.to_string())
    }

    pub fn rfc3339(&self, instant: OffsetDateTime) -> String {
        let local = self.timezone.localize(instant);
        local.format(&Rfc3339).unwrap_or_else(|_| local.to_string())
    }
}

/// Escape markup and drop characters XML 1.0 does not allow.
pub(crate) fn xml_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            ch if is_xml_char(ch) => escaped.push(ch),
            _ => {}
        }
    }
    escaped
}

fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..
    )
}
