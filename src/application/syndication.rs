//! Syndication service for RSS and Atom feed generation.
//!
//! Feeds are rebuilt from the content source on every request. When the
//! source fails, the channel is still emitted with zero items so readers
//! never receive malformed XML.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::application::site::{SiteProfile, xml_escape};
use crate::application::source::{ContentSource, fetch_or_fallback};
use crate::domain::entities::PostRecord;

/// Generated XML body and whether it is the degraded fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub body: String,
    pub degraded: bool,
}

/// Service for generating RSS and Atom feeds.
#[derive(Clone)]
pub struct SyndicationService {
    source: Arc<dyn ContentSource>,
    site: Arc<SiteProfile>,
}

impl SyndicationService {
    pub fn new(source: Arc<dyn ContentSource>, site: Arc<SiteProfile>) -> Self {
        Self { source, site }
    }

    /// Generate RSS 2.0 feed XML.
    pub async fn rss_feed(&self) -> XmlDocument {
        let now = OffsetDateTime::now_utc();
        match fetch_or_fallback(self.source.as_ref(), "rss").await {
            Some(posts) => XmlDocument {
                body: render_rss(&self.site, &posts, now),
                degraded: false,
            },
            None => XmlDocument {
                body: render_rss(&self.site, &[], now),
                degraded: true,
            },
        }
    }

    /// Generate Atom 1.0 feed XML.
    pub async fn atom_feed(&self) -> XmlDocument {
        let now = OffsetDateTime::now_utc();
        match fetch_or_fallback(self.source.as_ref(), "atom").await {
            Some(posts) => XmlDocument {
                body: render_atom(&self.site, &posts, now),
                degraded: false,
            },
            None => XmlDocument {
                body: render_atom(&self.site, &[], now),
                degraded: true,
            },
        }
    }
}

/// Posts newest first by publish date (missing dates count as `now`),
/// truncated to the configured item limit.
fn feed_items<'a>(
    site: &SiteProfile,
    posts: &'a [PostRecord],
    now: OffsetDateTime,
) -> Vec<&'a PostRecord> {
    let mut items: Vec<&PostRecord> = posts.iter().collect();
    items.sort_by(|a, b| b.published_or(now).cmp(&a.published_or(now)));
    if let Some(limit) = site.feed_max_items {
        items.truncate(limit.get());
    }
    items
}

pub fn render_rss(site: &SiteProfile, posts: &[PostRecord], now: OffsetDateTime) -> String {
    let year = site.timezone.localize(now).year();

    let mut items = String::new();
    for post in feed_items(site, posts, now) {
        let link = site.post_url(&post.id);
        items.push_str(&format!(
            "    <item>\n      <title>{}</title>\n      <link>{}</link>\n      <guid isPermaLink=\"false\">{}</guid>\n      <description>{}</description>\n      <pubDate>{}</pubDate>\n      <dc:creator>{}</dc:creator>\n",
            xml_escape(post.display_title()),
            xml_escape(&link),
            xml_escape(&post.id),
            xml_escape(post.display_description()),
            site.rfc2822(post.published_or(now)),
            xml_escape(&site.author),
        ));
        for tag in &post.tags {
            items.push_str(&format!("      <category>{}</category>\n", xml_escape(tag)));
        }
        items.push_str("    </item>\n");
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n  <channel>\n    <title>{}</title>\n    <link>{}</link>\n    <description>{}</description>\n    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n    <language>{}</language>\n    <copyright>All rights reserved {}, {}</copyright>\n    <lastBuildDate>{}</lastBuildDate>\n{}  </channel>\n</rss>\n",
        xml_escape(&site.title),
        xml_escape(&site.root_url()),
        xml_escape(&site.description),
        xml_escape(&site.absolute("/rss.xml")),
        xml_escape(&site.language),
        year,
        xml_escape(&site.author),
        site.rfc2822(now),
        items
    )
}

pub fn render_atom(site: &SiteProfile, posts: &[PostRecord], now: OffsetDateTime) -> String {
    let updated = posts
        .iter()
        .map(|post| post.last_edited_at)
        .max()
        .unwrap_or(now);

    let mut entries = String::new();
    for post in feed_items(site, posts, now) {
        let link = xml_escape(&site.post_url(&post.id));
        entries.push_str(&format!(
            "  <entry>\n    <title>{}</title>\n    <link href=\"{}\"/>\n    <id>{}</id>\n    <published>{}</published>\n    <updated>{}</updated>\n    <summary>{}</summary>\n",
            xml_escape(post.display_title()),
            link,
            link,
            site.rfc3339(post.published_or(now)),
            site.rfc3339(post.last_edited_at),
            xml_escape(post.display_description()),
        ));
        for tag in &post.tags {
            entries.push_str(&format!("    <category term=\"{}\"/>\n", xml_escape(tag)));
        }
        entries.push_str("  </entry>\n");
    }

    let root = xml_escape(&site.root_url());
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<feed xmlns=\"http://www.w3.org/2005/Atom\" xml:lang=\"{}\">\n  <title>{}</title>\n  <subtitle>{}</subtitle>\n  <id>{}</id>\n  <link href=\"{}\"/>\n  <link href=\"{}\" rel=\"self\"/>\n  <updated>{}</updated>\n  <author>\n    <name>{}</name>\n  </author>\n{}</feed>\n",
        xml_escape(&site.language),
        xml_escape(&site.title),
        xml_escape(&site.description),
        root,
        root,
        xml_escape(&site.absolute("/atom.xml")),
        site.rfc3339(updated),
        xml_escape(&site.author),
        entries
    )
}
