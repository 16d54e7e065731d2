use std::{sync::Arc, time::Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header::LOCATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use percent_encoding::percent_decode_str;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{
    application::error::ErrorReport,
    domain::redirects::RedirectTable,
};

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Answer listed legacy paths with `301 Moved Permanently` before routing.
///
/// The raw path is looked up first, then its percent-decoded form.
pub async fn redirect_legacy_paths(
    State(table): State<Arc<RedirectTable>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let uri = request.uri();
    let raw_path = uri.path();

    let target = table.resolve(raw_path).or_else(|| {
        let decoded = percent_decode_str(raw_path).decode_utf8().ok()?;
        if decoded == raw_path {
            None
        } else {
            table.resolve(&decoded)
        }
    });

    let Some(target) = target else {
        return next.run(request).await;
    };

    let location = match uri.query() {
        Some(query) => format!("{target}?{query}"),
        None => target.to_string(),
    };

    match HeaderValue::try_from(location.as_str()) {
        Ok(value) => {
            counter!("blogfront_redirect_total").increment(1);
            debug!(
                target = "blogfront::http::redirect",
                from = raw_path,
                to = %location,
                "legacy path redirected"
            );
            (StatusCode::MOVED_PERMANENTLY, [(LOCATION, value)]).into_response()
        }
        Err(err) => {
            let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
            ErrorReport::from_error(
                "infra::http::middleware::redirect",
                StatusCode::INTERNAL_SERVER_ERROR,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "blogfront::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "request failed",
            );
        } else {
            warn!(
                target = "blogfront::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                "client request error",
            );
        }
    }

    response
}
