use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    application::{
        error::HttpError,
        sitemap::SitemapService,
        syndication::{SyndicationService, XmlDocument},
    },
    domain::redirects::RedirectTable,
};

use super::middleware::{log_responses, redirect_legacy_paths, set_request_context};

const CACHE_NORMAL: &str = "public, max-age=3600";
const CACHE_DEGRADED: &str = "no-cache";

#[derive(Clone)]
pub struct HttpState {
    pub syndication: Arc<SyndicationService>,
    pub sitemap: Arc<SitemapService>,
    pub redirects: Arc<RedirectTable>,
}

pub fn build_router(state: HttpState) -> Router {
    let redirects = state.redirects.clone();

    Router::new()
        .route("/rss.xml", get(rss_feed))
        .route("/atom.xml", get(atom_feed))
        .route("/sitemap.xml", get(sitemap))
        .route("/robots.txt", get(robots_txt))
        .route("/_health", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            redirects,
            redirect_legacy_paths,
        ))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn rss_feed(State(state): State<HttpState>) -> Response {
    xml_response(state.syndication.rss_feed().await, "application/rss+xml")
}

async fn atom_feed(State(state): State<HttpState>) -> Response {
    xml_response(state.syndication.atom_feed().await, "application/atom+xml")
}

async fn sitemap(State(state): State<HttpState>) -> Response {
    xml_response(state.sitemap.sitemap_xml().await, "application/xml")
}

async fn robots_txt(State(state): State<HttpState>) -> Response {
    plain_response(state.sitemap.robots_txt())
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn not_found() -> HttpError {
    HttpError::new(
        "infra::http::public::not_found",
        StatusCode::NOT_FOUND,
        "Not Found",
        "no route or redirect matched",
    )
}

fn xml_response(document: XmlDocument, content_type: &str) -> Response {
    let cache_control = if document.degraded {
        CACHE_DEGRADED
    } else {
        CACHE_NORMAL
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, format!("{content_type}; charset=utf-8"))
        .header(CACHE_CONTROL, HeaderValue::from_static(cache_control))
        .body(Body::from(document.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn plain_response(body: String) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CACHE_CONTROL, HeaderValue::from_static(CACHE_NORMAL))
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
