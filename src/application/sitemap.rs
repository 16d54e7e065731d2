//! Sitemap service for sitemap.xml and robots.txt generation.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::application::site::{SiteProfile, xml_escape};
use crate::application::source::{ContentSource, fetch_or_fallback};
use crate::application::syndication::XmlDocument;
use crate::domain::entities::PostRecord;

const ROOT_CHANGEFREQ: &str = "daily";
const ROOT_PRIORITY: &str = "1.0";
const POST_CHANGEFREQ: &str = "weekly";
const POST_PRIORITY: &str = "0.7";

/// Service for generating sitemap.xml and robots.txt.
#[derive(Clone)]
pub struct SitemapService {
    source: Arc<dyn ContentSource>,
    site: Arc<SiteProfile>,
}

impl SitemapService {
    pub fn new(source: Arc<dyn ContentSource>, site: Arc<SiteProfile>) -> Self {
        Self { source, site }
    }

    /// Generate sitemap.xml content; falls back to the site root alone.
    pub async fn sitemap_xml(&self) -> XmlDocument {
        let now = OffsetDateTime::now_utc();
        match fetch_or_fallback(self.source.as_ref(), "sitemap").await {
            Some(posts) => XmlDocument {
                body: render_sitemap(&self.site, &posts, now),
                degraded: false,
            },
            None => XmlDocument {
                body: render_sitemap(&self.site, &[], now),
                degraded: true,
            },
        }
    }

    /// Generate robots.txt content.
    pub fn robots_txt(&self) -> String {
        render_robots(&self.site)
    }
}

pub fn render_sitemap(site: &SiteProfile, posts: &[PostRecord], now: OffsetDateTime) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    xml.push_str(&sitemap_entry(
        &site.root_url(),
        &site.rfc3339(now),
        ROOT_CHANGEFREQ,
        ROOT_PRIORITY,
    ));
    for post in posts {
        xml.push_str(&sitemap_entry(
            &site.post_url(&post.id),
            &site.rfc3339(post.last_edited_at),
            POST_CHANGEFREQ,
            POST_PRIORITY,
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

pub fn render_robots(site: &SiteProfile) -> String {
    format!(
        "User-agent: *\nAllow: /\nSitemap: {}\n",
        site.absolute("/sitemap.xml")
    )
}

fn sitemap_entry(loc: &str, lastmod: &str, changefreq: &str, priority: &str) -> String {
    format!(
        "  <url>\n    <loc>{}</loc>\n    <lastmod>{lastmod}</lastmod>\n    <changefreq>{changefreq}</changefreq>\n    <priority>{priority}</priority>\n  </url>\n",
        xml_escape(loc)
    )
}
