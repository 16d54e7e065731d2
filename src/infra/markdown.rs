//! Local markdown collections as a content source.
//!
//! Each configured collection is a directory of `.md`/`.mdx` files with YAML
//! front matter:
//!
//! ```text
//! ---
//! title: Writing Functions in Python
//! description: Notes on docstrings and context managers
//! pubDate: 2021-09-16
//! updatedDate: 2024-02-01
//! tags: [python]
//! ---
//! ```
//!
//! The post id is the file stem, prefixed by the collection's `id_prefix`
//! when one is configured (`en/writing-functions-in-python`).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::fs;
use tracing::warn;

use crate::application::source::{ContentSource, SourceError};
use crate::config::MarkdownCollection;
use crate::domain::entities::PostRecord;
use crate::util::timezone::SiteTimezone;

const EXTENSIONS: [&str; 2] = ["md", "mdx"];

pub struct MarkdownSource {
    collections: Vec<MarkdownCollection>,
    timezone: SiteTimezone,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FrontMatter {
    title: String,
    description: Option<String>,
    pub_date: Option<String>,
    updated_date: Option<String>,
    tags: Vec<String>,
    draft: bool,
}

impl MarkdownSource {
    pub fn new(collections: Vec<MarkdownCollection>, timezone: SiteTimezone) -> Self {
        Self {
            collections,
            timezone,
        }
    }

    async fn load_collection(
        &self,
        collection: &MarkdownCollection,
        posts: &mut Vec<PostRecord>,
    ) -> Result<(), SourceError> {
        let mut files = list_markdown_files(&collection.path).await?;
        files.sort();

        for path in files {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with('_') {
                continue;
            }
            let id = match collection.id_prefix.as_deref() {
                Some(prefix) if !prefix.is_empty() => {
                    format!("{}/{stem}", prefix.trim_end_matches('/'))
                }
                _ => stem.to_string(),
            };

            let raw = fs::read_to_string(&path)
                .await
                .map_err(|err| SourceError::io(path.display().to_string(), err))?;
            let front = parse_front_matter(&raw)
                .map_err(|message| SourceError::FrontMatter {
                    path: path.display().to_string(),
                    message,
                })?
                .unwrap_or_default();

            if front.draft {
                continue;
            }

            let published_at = self.timestamp(&path, "pubDate", front.pub_date.as_deref());
            let updated_at = self.timestamp(&path, "updatedDate", front.updated_date.as_deref());
            let last_edited_at = match updated_at.or(published_at) {
                Some(at) => at,
                None => modified_time(&path).await,
            };

            posts.push(PostRecord {
                id,
                title: front.title,
                description: front.description.filter(|text| !text.trim().is_empty()),
                published_at,
                last_edited_at,
                tags: front.tags,
            });
        }

        Ok(())
    }

    fn timestamp(&self, path: &Path, field: &str, raw: Option<&str>) -> Option<OffsetDateTime> {
        let raw = raw?;
        let parsed = self.timezone.parse_timestamp(raw);
        if parsed.is_none() {
            warn!(
                target = "blogfront::content::markdown",
                path = %path.display(),
                field,
                value = raw,
                "ignoring unreadable date"
            );
        }
        parsed
    }
}

#[async_trait]
impl ContentSource for MarkdownSource {
    async fn fetch_posts(&self) -> Result<Vec<PostRecord>, SourceError> {
        let mut posts = Vec::new();
        for collection in &self.collections {
            self.load_collection(collection, &mut posts).await?;
        }
        Ok(posts)
    }

    fn kind(&self) -> &'static str {
        "markdown"
    }
}

async fn list_markdown_files(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|err| SourceError::io(dir.display().to_string(), err))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| SourceError::io(dir.display().to_string(), err))?
    {
        let path = entry.path();
        let is_markdown = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| EXTENSIONS.contains(&ext));
        if is_markdown {
            files.push(path);
        }
    }
    Ok(files)
}

async fn modified_time(path: &Path) -> OffsetDateTime {
    fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .map(OffsetDateTime::from)
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Split `---` delimited YAML front matter off the document and decode it.
fn parse_front_matter(content: &str) -> Result<Option<FrontMatter>, String> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let Some(rest) = trimmed.strip_prefix("---") else {
        return Ok(None);
    };
    let Some(end) = rest.find("\n---") else {
        return Ok(None);
    };
    let yaml = rest[..end].trim();
    if yaml.is_empty() {
        return Ok(Some(FrontMatter::default()));
    }
    serde_yaml::from_str(yaml)
        .map(Some)
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_astro_front_matter() {
        let doc = "---\ntitle: 'Data Processing in Shell'\ndescription: curl and csvkit\npubDate: 2021-10-07\ntags:\n  - shell\n  - data\n---\n\nBody text\n";
        let front = parse_front_matter(doc).expect("parse").expect("front matter");
        assert_eq!(front.title, "Data Processing in Shell");
        assert_eq!(front.description.as_deref(), Some("curl and csvkit"));
        assert_eq!(front.pub_date.as_deref(), Some("2021-10-07"));
        assert_eq!(front.tags, vec!["shell".to_string(), "data".to_string()]);
        assert!(!front.draft);
    }

    #[test]
    fn documents_without_front_matter_yield_none() {
        assert!(parse_front_matter("# Just a heading\n").expect("parse").is_none());
        assert!(parse_front_matter("---\nunterminated").expect("parse").is_none());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(parse_front_matter("---\ntitle: [unclosed\n---\n").is_err());
    }

    #[tokio::test]
    async fn loads_collections_with_prefix() {
        let ko = tempfile::tempdir().expect("tempdir");
        let en = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            ko.path().join("pandas.md"),
            "---\ntitle: Pandas\npubDate: 2021-09-07\nupdatedDate: 2024-01-05T10:00:00Z\n---\n",
        )
        .expect("write");
        std::fs::write(
            ko.path().join("draft.md"),
            "---\ntitle: Draft\ndraft: true\n---\n",
        )
        .expect("write");
        std::fs::write(ko.path().join("notes.txt"), "ignored").expect("write");
        std::fs::write(
            en.path().join("scala.mdx"),
            "---\ntitle: Scala\ndescription: ''\npubDate: 2022-02-03\n---\n",
        )
        .expect("write");

        let source = MarkdownSource::new(
            vec![
                MarkdownCollection {
                    path: ko.path().to_path_buf(),
                    id_prefix: None,
                },
                MarkdownCollection {
                    path: en.path().to_path_buf(),
                    id_prefix: Some("en".to_string()),
                },
            ],
            SiteTimezone::Utc,
        );

        let posts = source.fetch_posts().await.expect("fetch");
        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["pandas", "en/scala"]);

        assert_eq!(posts[0].published_at, Some(datetime!(2021-09-07 00:00 UTC)));
        assert_eq!(posts[0].last_edited_at, datetime!(2024-01-05 10:00 UTC));
        assert_eq!(posts[1].description, None);
        assert_eq!(posts[1].last_edited_at, datetime!(2022-02-03 00:00 UTC));
    }

    #[tokio::test]
    async fn missing_directory_is_a_source_error() {
        let source = MarkdownSource::new(
            vec![MarkdownCollection {
                path: PathBuf::from("/nonexistent/blogfront-posts"),
                id_prefix: None,
            }],
            SiteTimezone::Utc,
        );
        assert!(matches!(
            source.fetch_posts().await,
            Err(SourceError::Io { .. })
        ));
    }
}
