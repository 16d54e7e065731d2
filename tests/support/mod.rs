#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request, response::Response};
use http_body_util::BodyExt;
use time::{OffsetDateTime, macros::datetime};
use tower::ServiceExt;

use blogfront::{
    application::{
        site::SiteProfile,
        sitemap::SitemapService,
        source::{ContentSource, SourceError},
        syndication::SyndicationService,
    },
    domain::{entities::PostRecord, redirects::RedirectTable},
    infra::http::{HttpState, build_router},
};

pub const BASE_URL: &str = "https://blog.example.dev";

/// Serves a fixed post collection and counts fetches.
pub struct StaticSource {
    posts: Vec<PostRecord>,
    pub fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new(posts: Vec<PostRecord>) -> Self {
        Self {
            posts,
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentSource for StaticSource {
    async fn fetch_posts(&self) -> Result<Vec<PostRecord>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.posts.clone())
    }

    fn kind(&self) -> &'static str {
        "static"
    }
}

/// Always fails the way an unreachable provider does.
pub struct FailingSource;

#[async_trait]
impl ContentSource for FailingSource {
    async fn fetch_posts(&self) -> Result<Vec<PostRecord>, SourceError> {
        Err(SourceError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }

    fn kind(&self) -> &'static str {
        "failing"
    }
}

pub fn hello_post() -> PostRecord {
    PostRecord {
        id: "abc123".to_string(),
        title: "Hello".to_string(),
        description: Some("World".to_string()),
        published_at: Some(datetime!(2024-01-01 00:00 UTC)),
        last_edited_at: datetime!(2024-01-02 03:04 UTC),
        tags: vec!["gke".to_string()],
    }
}

pub fn site() -> SiteProfile {
    SiteProfile::new(BASE_URL, "Example Blog").with_description("Notes & essays")
}

pub fn router_with(source: Arc<dyn ContentSource>) -> Router {
    let site = Arc::new(site());
    let redirects = RedirectTable::builtin().expect("builtin redirect table is valid");
    build_router(HttpState {
        syndication: Arc::new(SyndicationService::new(source.clone(), site.clone())),
        sitemap: Arc::new(SitemapService::new(source, site)),
        redirects: Arc::new(redirects),
    })
}

pub async fn get(router: Router, uri: &str) -> Response {
    router
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router is infallible")
}

pub async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn header<'a>(response: &'a Response, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

pub fn fixed_now() -> OffsetDateTime {
    datetime!(2024-06-01 12:00 UTC)
}
