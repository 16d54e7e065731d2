//! Notion database content source.
//!
//! Posts live as pages of a Notion database with the properties `title`
//! (title), `description` (rich text), `post_date` (date) and, optionally,
//! `tags` (multi-select). The database is queried newest first and every
//! result page is followed until `has_more` is false.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::source::{ContentSource, SourceError};
use crate::config::NotionSettings;
use crate::domain::entities::PostRecord;
use crate::util::timezone::SiteTimezone;

const TITLE_PROPERTY: &str = "title";
const DESCRIPTION_PROPERTY: &str = "description";
const DATE_PROPERTY: &str = "post_date";
const TAGS_PROPERTY: &str = "tags";
const MAX_ERROR_BODY: usize = 512;

pub struct NotionSource {
    client: Client,
    query_url: String,
    token: String,
    version: String,
    page_size: u32,
    timezone: SiteTimezone,
}

impl NotionSource {
    pub fn new(settings: &NotionSettings, timezone: SiteTimezone) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(concat!("blogfront/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .connect_timeout(Duration::from_secs(5).min(settings.timeout))
            .build()
            .map_err(|err| SourceError::Configuration(err.to_string()))?;

        let query_url = format!(
            "{}/databases/{}/query",
            settings.api_base.as_str().trim_end_matches('/'),
            settings.database_id
        );

        Ok(Self {
            client,
            query_url,
            token: settings.token.clone(),
            version: settings.version.clone(),
            page_size: settings.page_size,
            timezone,
        })
    }

    async fn query(&self, start_cursor: Option<&str>) -> Result<QueryResponse, SourceError> {
        let body = QueryRequest {
            page_size: self.page_size,
            start_cursor,
            sorts: [QuerySort {
                property: DATE_PROPERTY,
                direction: "descending",
            }],
        };

        let response = self
            .client
            .post(&self.query_url)
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
            .json(&body)
            .send()
            .await
            .map_err(|err| SourceError::Http(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let mut text = response.text().await.unwrap_or_default();
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        response
            .json::<QueryResponse>()
            .await
            .map_err(|err| SourceError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ContentSource for NotionSource {
    async fn fetch_posts(&self) -> Result<Vec<PostRecord>, SourceError> {
        let mut posts = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.query(cursor.as_deref()).await?;
            debug!(
                target = "blogfront::content::notion",
                results = page.results.len(),
                has_more = page.has_more,
                "queried database page"
            );

            for result in page.results {
                posts.push(result.into_record(self.timezone)?);
            }

            cursor = match (page.has_more, page.next_cursor) {
                (true, Some(next)) => Some(next),
                _ => break,
            };
        }

        Ok(posts)
    }

    fn kind(&self) -> &'static str {
        "notion"
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
    sorts: [QuerySort; 1],
}

#[derive(Debug, Serialize)]
struct QuerySort {
    property: &'static str,
    direction: &'static str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<NotionPage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotionPage {
    id: String,
    last_edited_time: String,
    #[serde(default)]
    properties: HashMap<String, NotionProperty>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum NotionProperty {
    Title {
        title: Vec<RichText>,
    },
    RichText {
        rich_text: Vec<RichText>,
    },
    Date {
        date: Option<DateValue>,
    },
    MultiSelect {
        multi_select: Vec<SelectOption>,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct RichText {
    #[serde(default)]
    plain_text: String,
}

#[derive(Debug, Deserialize)]
struct DateValue {
    start: String,
}

#[derive(Debug, Deserialize)]
struct SelectOption {
    name: String,
}

impl NotionPage {
    fn into_record(mut self, timezone: SiteTimezone) -> Result<PostRecord, SourceError> {
        let last_edited_at = timezone
            .parse_timestamp(&self.last_edited_time)
            .ok_or_else(|| {
                SourceError::Decode(format!(
                    "page `{}` has unreadable last_edited_time `{}`",
                    self.id, self.last_edited_time
                ))
            })?;

        let title = match self.properties.remove(TITLE_PROPERTY) {
            Some(NotionProperty::Title { title }) => plain_text(&title),
            _ => String::new(),
        };
        let description = match self.properties.remove(DESCRIPTION_PROPERTY) {
            Some(NotionProperty::RichText { rich_text }) => {
                Some(plain_text(&rich_text)).filter(|text| !text.trim().is_empty())
            }
            _ => None,
        };
        let published_at = match self.properties.remove(DATE_PROPERTY) {
            Some(NotionProperty::Date { date: Some(date) }) => timezone.parse_timestamp(&date.start),
            _ => None,
        };
        let tags = match self.properties.remove(TAGS_PROPERTY) {
            Some(NotionProperty::MultiSelect { multi_select }) => {
                multi_select.into_iter().map(|option| option.name).collect()
            }
            _ => Vec::new(),
        };

        Ok(PostRecord {
            id: self.id,
            title,
            description,
            published_at,
            last_edited_at,
            tags,
        })
    }
}

fn plain_text(fragments: &[RichText]) -> String {
    fragments
        .iter()
        .map(|fragment| fragment.plain_text.as_str())
        .collect()
}
