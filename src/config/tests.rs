use clap::Parser;
use serial_test::serial;

use super::*;

#[test]
#[serial]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.api.base_url.as_str(), DEFAULT_BASE_URL);
    assert_eq!(settings.api.timeout, Duration::from_secs(30));
    assert_eq!(settings.api.page_size.get(), 20);
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.stale_after, Duration::from_secs(60));
    assert_eq!(settings.cache.max_entries.get(), 256);
    assert_eq!(settings.logging.level, LevelFilter::WARN);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.session.credentials_file.ends_with(CREDENTIALS_FILE));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.api.base_url = Some("http://file.example/api/".to_string());
    raw.logging.level = Some("info".to_string());

    let overrides = Overrides {
        api_url: Some("https://cli.example/v1".to_string()),
        log_level: Some("debug".to_string()),
        credentials_file: Some(PathBuf::from("/tmp/creds.json")),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.api.base_url.as_str(), "https://cli.example/v1/");
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(
        settings.session.credentials_file,
        PathBuf::from("/tmp/creds.json")
    );
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = Overrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn base_url_gains_trailing_slash() {
    let mut raw = RawSettings::default();
    raw.api.base_url = Some("http://localhost:9000/api".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.api.base_url.as_str(), "http://localhost:9000/api/");
    assert_eq!(
        settings.api.base_url.join("auth/me/").expect("join").as_str(),
        "http://localhost:9000/api/auth/me/"
    );
}

#[test]
fn rejects_non_http_base_url() {
    let mut raw = RawSettings::default();
    raw.api.base_url = Some("ftp://example.com/".to_string());
    let err = Settings::from_raw(raw).expect_err("ftp is rejected");
    assert!(matches!(err, LoadError::Invalid { key: "api.base_url", .. }));
}

#[test]
fn rejects_zero_page_size() {
    let mut raw = RawSettings::default();
    raw.api.page_size = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero page size");
    assert!(matches!(err, LoadError::Invalid { key: "api.page_size", .. }));
}

#[test]
fn rejects_zero_cache_capacity() {
    let mut raw = RawSettings::default();
    raw.cache.max_entries = Some(0);
    let err = Settings::from_raw(raw).expect_err("zero capacity");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.max_entries",
            ..
        }
    ));
}

#[test]
fn rejects_unknown_log_level() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("chatty".to_string());
    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn parse_expense_list_arguments() {
    let args = CliArgs::parse_from([
        "spendwise-cli",
        "expenses",
        "list",
        "--page",
        "3",
        "--category",
        "food",
        "--api-url",
        "http://localhost:1234/api/",
    ]);

    assert_eq!(
        args.overrides.api_url.as_deref(),
        Some("http://localhost:1234/api/")
    );
    match args.command {
        Command::Expenses(ExpensesCommand::List { page, category, .. }) => {
            assert_eq!(page, 3);
            assert_eq!(category.as_deref(), Some("food"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_theme_toggle() {
    let args = CliArgs::parse_from(["spendwise-cli", "--log-json", "true", "auth", "theme", "toggle"]);
    assert_eq!(args.overrides.log_json, Some(true));
    assert!(matches!(
        args.command,
        Command::Auth(AuthCommand::Theme {
            theme: ThemeArg::Toggle
        })
    ));
}

#[test]
#[serial]
fn environment_overrides_defaults_but_not_cli() {
    // SAFETY: env mutation is serialized across tests with #[serial].
    unsafe {
        std::env::set_var("SPENDWISE__API__BASE_URL", "http://env.example/api");
        std::env::set_var("SPENDWISE__LOGGING__LEVEL", "info");
    }

    let args = CliArgs::parse_from(["spendwise-cli", "--log-level", "trace", "budgets", "list"]);
    let result = load(&args);

    unsafe {
        std::env::remove_var("SPENDWISE__API__BASE_URL");
        std::env::remove_var("SPENDWISE__LOGGING__LEVEL");
    }

    let settings = result.expect("valid settings");
    assert_eq!(settings.api.base_url.as_str(), "http://env.example/api/");
    assert_eq!(settings.logging.level, LevelFilter::TRACE);
}

#[test]
#[serial]
fn credentials_default_under_xdg_config_home() {
    let previous = std::env::var_os("XDG_CONFIG_HOME");
    // SAFETY: env mutation is serialized across tests with #[serial].
    unsafe { std::env::set_var("XDG_CONFIG_HOME", "/tmp/xdg-test") };

    let path = default_credentials_file();

    unsafe {
        match previous {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    assert_eq!(
        path,
        PathBuf::from("/tmp/xdg-test")
            .join(CREDENTIALS_DIR)
            .join(CREDENTIALS_FILE)
    );
}
