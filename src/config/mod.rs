//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::NonZeroUsize,
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::redirects::RedirectEntry;
use crate::util::timezone::SiteTimezone;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "blogfront";
const ENV_PREFIX: &str = "BLOGFRONT";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_SITE_TITLE: &str = "Blog";
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_MARKDOWN_DIR: &str = "content/posts";
const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1";
const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_NOTION_PAGE_SIZE: u32 = 100;
const MAX_NOTION_PAGE_SIZE: u32 = 100;
const DEFAULT_NOTION_TIMEOUT_SECS: u64 = 10;

/// Command-line arguments for the blogfront binary.
#[derive(Debug, Parser)]
#[command(name = "blogfront", version, about = "Blog feeds, sitemap and legacy redirects")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BLOGFRONT_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve feeds, sitemap and redirects over HTTP.
    Serve(Box<ServeArgs>),
    /// Validate the redirect table and print it.
    Redirects,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the public base URL used in feed and sitemap links.
    #[arg(long = "site-base-url", value_name = "URL")]
    pub site_base_url: Option<String>,

    /// Override the site timezone (UTC, +09:00 or an IANA name).
    #[arg(long = "site-timezone", value_name = "ZONE")]
    pub site_timezone: Option<String>,

    /// Override the content source (notion|markdown).
    #[arg(long = "content-source", value_name = "SOURCE")]
    pub content_source: Option<String>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub feed: FeedSettings,
    pub content: ContentSettings,
    pub redirects: RedirectSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub base_url: Url,
    pub title: String,
    pub description: String,
    pub language: String,
    pub author: Option<String>,
    pub timezone: SiteTimezone,
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub max_items: Option<NonZeroUsize>,
}

#[derive(Debug, Clone)]
pub enum ContentSettings {
    Notion(NotionSettings),
    Markdown(MarkdownSettings),
}

#[derive(Debug, Clone)]
pub struct NotionSettings {
    pub api_base: Url,
    pub token: String,
    pub database_id: String,
    pub version: String,
    pub page_size: u32,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct MarkdownSettings {
    pub collections: Vec<MarkdownCollection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkdownCollection {
    pub path: PathBuf,
    #[serde(default)]
    pub id_prefix: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RedirectSettings {
    pub extra: Vec<RedirectEntry>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    resolve(builder, cli)
}

fn resolve(builder: ConfigBuilder<DefaultState>, cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Redirects) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    site: RawSiteSettings,
    feed: RawFeedSettings,
    content: RawContentSettings,
    redirects: RawRedirectSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.site_base_url.as_ref() {
            self.site.base_url = Some(url.clone());
        }
        if let Some(zone) = overrides.site_timezone.as_ref() {
            self.site.timezone = Some(zone.clone());
        }
        if let Some(source) = overrides.content_source.as_ref() {
            self.content.source = Some(source.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            site,
            feed,
            content,
            redirects,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let site = build_site_settings(site)?;
        let feed = build_feed_settings(feed)?;
        let content = build_content_settings(content)?;
        let redirects = RedirectSettings {
            extra: redirects.extra,
        };

        Ok(Self {
            server,
            logging,
            site,
            feed,
            content,
            redirects,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let raw_url = non_empty(site.base_url)
        .ok_or_else(|| LoadError::invalid("site.base_url", "a public base URL is required"))?;
    let base_url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("site.base_url", format!("`{raw_url}`: {err}")))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "site.base_url",
            "scheme must be http or https",
        ));
    }
    if base_url.query().is_some() || base_url.fragment().is_some() {
        return Err(LoadError::invalid(
            "site.base_url",
            "must not carry a query or fragment",
        ));
    }

    let timezone = match non_empty(site.timezone) {
        Some(zone) => SiteTimezone::from_str(&zone)
            .map_err(|err| LoadError::invalid("site.timezone", err.to_string()))?,
        None => SiteTimezone::Utc,
    };

    Ok(SiteSettings {
        base_url,
        title: non_empty(site.title).unwrap_or_else(|| DEFAULT_SITE_TITLE.to_string()),
        description: site.description.unwrap_or_default().trim().to_string(),
        language: non_empty(site.language).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        author: non_empty(site.author),
        timezone,
    })
}

fn build_feed_settings(feed: RawFeedSettings) -> Result<FeedSettings, LoadError> {
    let max_items = match feed.max_items {
        Some(0) => {
            return Err(LoadError::invalid(
                "feed.max_items",
                "must be greater than zero; omit it to include every post",
            ));
        }
        Some(value) => {
            let value = usize::try_from(value).map_err(|_| {
                LoadError::invalid("feed.max_items", "value exceeds supported range for usize")
            })?;
            NonZeroUsize::new(value)
        }
        None => None,
    };

    Ok(FeedSettings { max_items })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let source = non_empty(content.source).unwrap_or_else(|| "markdown".to_string());
    match source.to_ascii_lowercase().as_str() {
        "notion" => build_notion_settings(content.notion).map(ContentSettings::Notion),
        "markdown" => Ok(ContentSettings::Markdown(build_markdown_settings(
            content.markdown,
        )?)),
        other => Err(LoadError::invalid(
            "content.source",
            format!("unknown source `{other}` (expected notion or markdown)"),
        )),
    }
}

fn build_notion_settings(notion: RawNotionSettings) -> Result<NotionSettings, LoadError> {
    let token = non_empty(notion.token).ok_or_else(|| {
        LoadError::invalid(
            "content.notion.token",
            "an integration token is required (BLOGFRONT__CONTENT__NOTION__TOKEN)",
        )
    })?;
    let database_id = non_empty(notion.database_id).ok_or_else(|| {
        LoadError::invalid("content.notion.database_id", "a database id is required")
    })?;

    let raw_base = non_empty(notion.api_base).unwrap_or_else(|| DEFAULT_NOTION_API_BASE.into());
    let api_base = Url::parse(&raw_base)
        .map_err(|err| LoadError::invalid("content.notion.api_base", err.to_string()))?;

    let page_size = notion.page_size.unwrap_or(DEFAULT_NOTION_PAGE_SIZE);
    if page_size == 0 || page_size > MAX_NOTION_PAGE_SIZE {
        return Err(LoadError::invalid(
            "content.notion.page_size",
            format!("must be between 1 and {MAX_NOTION_PAGE_SIZE}"),
        ));
    }

    let timeout_secs = notion
        .timeout_seconds
        .unwrap_or(DEFAULT_NOTION_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "content.notion.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(NotionSettings {
        api_base,
        token,
        database_id,
        version: non_empty(notion.version).unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
        page_size,
        timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_markdown_settings(markdown: RawMarkdownSettings) -> Result<MarkdownSettings, LoadError> {
    let collections = if markdown.collections.is_empty() {
        vec![MarkdownCollection {
            path: PathBuf::from(DEFAULT_MARKDOWN_DIR),
            id_prefix: None,
        }]
    } else {
        markdown.collections
    };

    if collections
        .iter()
        .any(|collection| collection.path.as_os_str().is_empty())
    {
        return Err(LoadError::invalid(
            "content.markdown.collections",
            "path must not be empty",
        ));
    }

    Ok(MarkdownSettings { collections })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    base_url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    language: Option<String>,
    author: Option<String>,
    timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFeedSettings {
    max_items: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    source: Option<String>,
    notion: RawNotionSettings,
    markdown: RawMarkdownSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNotionSettings {
    api_base: Option<String>,
    token: Option<String>,
    database_id: Option<String>,
    version: Option<String>,
    page_size: Option<u32>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawMarkdownSettings {
    collections: Vec<MarkdownCollection>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRedirectSettings {
    extra: Vec<RedirectEntry>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests;
