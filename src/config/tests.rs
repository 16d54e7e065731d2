use super::*;
use config::FileFormat;

const BASE: &str = r#"
[site]
base_url = "https://blog.example.dev"
title = "Example"
"#;

fn builder(file: &str, env: &[(&str, &str)]) -> ConfigBuilder<DefaultState> {
    let env_map: config::Map<String, String> = env
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    Config::builder()
        .add_source(File::from_str(file, FileFormat::Toml))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .source(Some(env_map)),
        )
}

fn raw_with_site() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.site.base_url = Some("https://blog.example.dev".to_string());
    raw
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_site();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn environment_beats_file_and_cli_beats_environment() {
    let file = format!("{BASE}\n[server]\nport = 4000\nhost = \"0.0.0.0\"\n");
    let env = [
        ("BLOGFRONT__SERVER__PORT", "5000"),
        ("BLOGFRONT__SITE__TITLE", "From env"),
    ];

    let cli = CliArgs::parse_from(["blogfront"]);
    let settings = resolve(builder(&file, &env), &cli).expect("settings");
    assert_eq!(settings.server.addr.port(), 5000);
    assert_eq!(settings.server.addr.ip().to_string(), "0.0.0.0");
    assert_eq!(settings.site.title, "From env");

    let cli = CliArgs::parse_from(["blogfront", "serve", "--server-port", "6000"]);
    let settings = resolve(builder(&file, &env), &cli).expect("settings");
    assert_eq!(settings.server.addr.port(), 6000);
}

#[test]
fn notion_token_can_come_from_environment() {
    let file = format!(
        "{BASE}\n[content]\nsource = \"notion\"\n[content.notion]\ndatabase_id = \"db-1\"\n"
    );
    let env = [("BLOGFRONT__CONTENT__NOTION__TOKEN", "secret_abc")];

    let cli = CliArgs::parse_from(["blogfront"]);
    let settings = resolve(builder(&file, &env), &cli).expect("settings");
    match settings.content {
        ContentSettings::Notion(notion) => {
            assert_eq!(notion.token, "secret_abc");
            assert_eq!(notion.database_id, "db-1");
            assert_eq!(notion.api_base.as_str(), "https://api.notion.com/v1");
            assert_eq!(notion.page_size, DEFAULT_NOTION_PAGE_SIZE);
            assert_eq!(notion.timeout, Duration::from_secs(DEFAULT_NOTION_TIMEOUT_SECS));
        }
        other => panic!("expected notion settings, got {other:?}"),
    }
}

#[test]
fn notion_requires_token() {
    let file = format!(
        "{BASE}\n[content]\nsource = \"notion\"\n[content.notion]\ndatabase_id = \"db-1\"\n"
    );
    let cli = CliArgs::parse_from(["blogfront"]);
    let err = resolve(builder(&file, &[]), &cli).expect_err("missing token");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "content.notion.token",
            ..
        }
    ));
}

#[test]
fn defaults_resolve_to_markdown_and_utc() {
    let settings = Settings::from_raw(raw_with_site()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(
        settings.server.graceful_shutdown,
        Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_SECS)
    );
    assert_eq!(settings.site.timezone, SiteTimezone::Utc);
    assert_eq!(settings.site.language, "en");
    assert!(settings.feed.max_items.is_none());
    assert!(settings.redirects.extra.is_empty());
    match settings.content {
        ContentSettings::Markdown(markdown) => {
            assert_eq!(markdown.collections.len(), 1);
            assert_eq!(markdown.collections[0].path, PathBuf::from(DEFAULT_MARKDOWN_DIR));
        }
        other => panic!("expected markdown settings, got {other:?}"),
    }
}

#[test]
fn base_url_is_required() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("missing base url");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "site.base_url",
            ..
        }
    ));
}

#[test]
fn rejects_unknown_timezone() {
    let mut raw = raw_with_site();
    raw.site.timezone = Some("Mars/Olympus_Mons".to_string());
    let err = Settings::from_raw(raw).expect_err("bad zone");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "site.timezone",
            ..
        }
    ));
}

#[test]
fn accepts_offset_and_named_timezones() {
    let mut raw = raw_with_site();
    raw.site.timezone = Some("+09:00".to_string());
    let settings = Settings::from_raw(raw).expect("offset zone");
    assert_eq!(settings.site.timezone.to_string(), "+09:00");

    let mut raw = raw_with_site();
    raw.site.timezone = Some("Asia/Seoul".to_string());
    let settings = Settings::from_raw(raw).expect("named zone");
    assert_eq!(settings.site.timezone.to_string(), "Asia/Seoul");
}

#[test]
fn rejects_zero_feed_limit_and_unknown_source() {
    let mut raw = raw_with_site();
    raw.feed.max_items = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = raw_with_site();
    raw.content.source = Some("wordpress".to_string());
    let err = Settings::from_raw(raw).expect_err("unknown source");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "content.source",
            ..
        }
    ));
}

#[test]
fn reads_markdown_collections_and_extra_redirects() {
    let file = format!(
        r#"{BASE}
[feed]
max_items = 20

[[content.markdown.collections]]
path = "src/content/blog"

[[content.markdown.collections]]
path = "src/content/blog-en"
id_prefix = "en"

[[redirects.extra]]
from = "/old-about/"
to = "/about/"
"#
    );

    let cli = CliArgs::parse_from(["blogfront", "redirects"]);
    let settings = resolve(builder(&file, &[]), &cli).expect("settings");

    assert_eq!(settings.feed.max_items.map(NonZeroUsize::get), Some(20));
    match &settings.content {
        ContentSettings::Markdown(markdown) => {
            assert_eq!(markdown.collections.len(), 2);
            assert_eq!(markdown.collections[1].id_prefix.as_deref(), Some("en"));
        }
        other => panic!("expected markdown settings, got {other:?}"),
    }
    assert_eq!(
        settings.redirects.extra,
        vec![RedirectEntry::new("/old-about/", "/about/")]
    );
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = raw_with_site();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["blogfront"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "blogfront",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--site-timezone",
        "Asia/Seoul",
        "--log-json",
        "true",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(serve.overrides.site_timezone.as_deref(), Some("Asia/Seoul"));
            assert_eq!(serve.overrides.log_json, Some(true));
        }
        other => panic!("wrong command parsed: {other:?}"),
    }
}
