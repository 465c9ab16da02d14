//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::*;

use std::{num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::infra::akismet::DEFAULT_ENDPOINT as DEFAULT_SPAM_ENDPOINT;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tessera";
const ENV_PREFIX: &str = "TESSERA";
const DEFAULT_DB_KIND: &str = "postgres";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_USERNAME: &str = "tessera";
const DEFAULT_DB_NAME: &str = "tessera";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 1;
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_SITE_URL: &str = "http://localhost/";
const DEFAULT_SPAM_TIMEOUT_SECS: u64 = 10;
const SUPPORTED_DB_KINDS: [&str; 3] = ["postgres", "postgresql", "pgsql"];

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub site: SiteSettings,
    pub spam: SpamSettings,
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
pub struct DatabaseSettings {
    pub target: DatabaseTarget,
    pub max_connections: NonZeroU32,
}

/// Where the store lives: a full connection URL, or discrete parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Url(String),
    Parts {
        host: String,
        port: u16,
        username: String,
        password: Option<String>,
        name: String,
    },
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Content language pages are selected in.
    pub language: String,
    /// Public site URL, sent to the spam provider as the blog address.
    pub url: Url,
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct SpamSettings {
    pub endpoint: Url,
    pub timeout: Duration,
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

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    site: RawSiteSettings,
    spam: RawSpamSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(language) = overrides.language.as_ref() {
            self.site.language = Some(language.clone());
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(debug) = overrides.debug {
            self.site.debug = Some(debug);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            database,
            site,
            spam,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            site: build_site_settings(site)?,
            spam: build_spam_settings(spam)?,
        })
    }
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

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    if let Some(url) = non_blank(database.url) {
        return Ok(DatabaseSettings {
            target: DatabaseTarget::Url(url),
            max_connections,
        });
    }

    let kind = non_blank(database.kind).unwrap_or_else(|| DEFAULT_DB_KIND.to_string());
    if !SUPPORTED_DB_KINDS.contains(&kind.to_ascii_lowercase().as_str()) {
        return Err(LoadError::invalid(
            "database.kind",
            format!("unsupported store `{kind}`; expected postgres"),
        ));
    }

    let port = database.port.unwrap_or(DEFAULT_DB_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "database.port",
            "port must be greater than zero",
        ));
    }

    let target = DatabaseTarget::Parts {
        host: non_blank(database.host).unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
        port,
        username: non_blank(database.username).unwrap_or_else(|| DEFAULT_DB_USERNAME.to_string()),
        password: database.password.filter(|value| !value.is_empty()),
        name: non_blank(database.name).unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
    };

    Ok(DatabaseSettings {
        target,
        max_connections,
    })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let language = match site.language {
        Some(language) => non_blank(Some(language))
            .ok_or_else(|| LoadError::invalid("site.language", "must not be empty"))?,
        None => DEFAULT_LANGUAGE.to_string(),
    };

    let url = site.url.unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
    let url = Url::parse(url.trim())
        .map_err(|err| LoadError::invalid("site.url", format!("invalid url `{url}`: {err}")))?;

    Ok(SiteSettings {
        language,
        url,
        debug: site.debug.unwrap_or(false),
    })
}

fn build_spam_settings(spam: RawSpamSettings) -> Result<SpamSettings, LoadError> {
    let endpoint = spam
        .endpoint
        .unwrap_or_else(|| DEFAULT_SPAM_ENDPOINT.to_string());
    let endpoint = Url::parse(endpoint.trim()).map_err(|err| {
        LoadError::invalid("spam.endpoint", format!("invalid url `{endpoint}`: {err}"))
    })?;

    let timeout_secs = spam.timeout_seconds.unwrap_or(DEFAULT_SPAM_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "spam.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(SpamSettings {
        endpoint,
        timeout: Duration::from_secs(timeout_secs),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    kind: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    name: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    language: Option<String>,
    url: Option<String>,
    debug: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSpamSettings {
    endpoint: Option<String>,
    timeout_seconds: Option<u64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
