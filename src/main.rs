use std::{process, sync::Arc, time::Duration};

use blogfront::{
    application::{
        error::AppError,
        site::SiteProfile,
        sitemap::SitemapService,
        source::ContentSource,
        syndication::SyndicationService,
    },
    config::{self, ContentSettings},
    domain::{error::DomainError, redirects::RedirectTable},
    infra::{
        error::InfraError,
        http::{self, HttpState},
        markdown::MarkdownSource,
        notion::NotionSource,
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Redirects => run_redirects(&settings),
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let redirects = build_redirect_table(&settings)?;
    let site = Arc::new(build_site_profile(&settings));
    let source = build_content_source(&settings)?;

    info!(
        target = "blogfront::startup",
        source = source.kind(),
        base_url = site.base_url(),
        timezone = %site.timezone,
        redirects = redirects.len(),
        "content front-end configured"
    );

    let state = HttpState {
        syndication: Arc::new(SyndicationService::new(source.clone(), site.clone())),
        sitemap: Arc::new(SitemapService::new(source, site)),
        redirects: Arc::new(redirects),
    };

    serve_http(&settings, state).await
}

fn run_redirects(settings: &config::Settings) -> Result<(), AppError> {
    let table = build_redirect_table(settings)?;
    for (from, to) in table.sorted() {
        println!("{from}\t{to}");
    }
    info!(
        target = "blogfront::redirects",
        entries = table.len(),
        "redirect table is valid"
    );
    Ok(())
}

fn build_redirect_table(settings: &config::Settings) -> Result<RedirectTable, AppError> {
    RedirectTable::with_extra(settings.redirects.extra.iter().cloned())
        .map_err(|err| AppError::from(DomainError::from(err)))
}

fn build_site_profile(settings: &config::Settings) -> SiteProfile {
    let site = &settings.site;
    let profile = SiteProfile::new(site.base_url.as_str(), site.title.clone())
        .with_description(site.description.clone())
        .with_language(site.language.clone())
        .with_timezone(site.timezone)
        .with_feed_max_items(settings.feed.max_items);

    match site.author.as_ref() {
        Some(author) => profile.with_author(author.clone()),
        None => profile,
    }
}

fn build_content_source(settings: &config::Settings) -> Result<Arc<dyn ContentSource>, AppError> {
    let timezone = settings.site.timezone;
    let source: Arc<dyn ContentSource> = match &settings.content {
        ContentSettings::Notion(notion) => Arc::new(NotionSource::new(notion, timezone)?),
        ContentSettings::Markdown(markdown) => Arc::new(MarkdownSource::new(
            markdown.collections.clone(),
            timezone,
        )),
    };
    Ok(source)
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "blogfront::startup",
        addr = %settings.server.addr,
        "listening"
    );

    let draining = Arc::new(Notify::new());
    let signal_draining = draining.clone();
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            signal_draining.notify_one();
        },
    );

    let grace = settings.server.graceful_shutdown;
    tokio::select! {
        result = server.into_future() => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(&draining, grace) => {
            warn!(
                target = "blogfront::shutdown",
                grace_seconds = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
        }
    }

    info!(target = "blogfront::shutdown", "server stopped");
    Ok(())
}

async fn drain_deadline(draining: &Notify, grace: Duration) {
    draining.notified().await;
    tokio::time::sleep(grace).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "blogfront::shutdown", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "blogfront::shutdown", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(target = "blogfront::shutdown", "shutdown signal received; draining connections");
}
