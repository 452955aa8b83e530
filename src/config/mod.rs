//! Configuration layer: typed settings with layered precedence (file → env →
//! CLI). Everything downstream receives finished structs; nothing reads the
//! environment after startup.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueHint};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const ENV_PREFIX: &str = "PLINTH";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_UPLOAD_PREFIX: &str = "/uploads";
const DEFAULT_STATS_FRESHNESS_SECS: u64 = 15 * 60;
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 8;
const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;

/// Command-line arguments for the Plinth binary.
#[derive(Debug, Parser)]
#[command(name = "plinth", version, about = "Plinth portfolio API server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "PLINTH_CONFIG_FILE", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service (the default).
    Serve(ServeArgs),
    /// Apply pending database migrations and exit.
    Migrate,
}

#[derive(Debug, Args, Clone, Default)]
pub struct ServeArgs {
    /// Bind host override.
    #[arg(long, env = "PLINTH_HOST")]
    pub host: Option<String>,

    /// Bind port override.
    #[arg(long, env = "PLINTH_PORT")]
    pub port: Option<u16>,

    /// Database URL override.
    #[arg(long = "database-url", env = "PLINTH_DATABASE__URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
    #[error("invalid setting `{key}`: {problem}")]
    Invalid { key: &'static str, problem: String },
}

impl ConfigError {
    fn invalid(key: &'static str, problem: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            problem: problem.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub dir: PathBuf,
    pub public_prefix: String,
}

#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub token: Option<String>,
    /// Username served when the request does not name one.
    pub username: String,
    pub freshness: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub admin_email: String,
}

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub endpoint: String,
    pub token: String,
    pub from: String,
    pub admin_recipient: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub uploads: UploadSettings,
    pub github: GithubSettings,
    pub auth: AuthSettings,
    /// Exact `Origin` values admitted by the API CORS layer.
    pub allowed_origins: Vec<String>,
    /// `None` disables outbound mail entirely.
    pub mail: Option<MailSettings>,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings with layered precedence: packaged defaults file, then an
    /// optional explicit file, then `PLINTH_*` environment variables, then
    /// CLI overrides.
    pub fn load(config_file: Option<&PathBuf>, serve: &ServeArgs) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path.clone()));
        }

        let raw: RawSettings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        raw.finish(serve)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    database: RawDatabase,
    #[serde(default)]
    uploads: RawUploads,
    #[serde(default)]
    github: RawGithub,
    #[serde(default)]
    auth: RawAuth,
    #[serde(default)]
    cors: RawCors,
    mail: Option<RawMail>,
    #[serde(default)]
    logging: RawLogging,
}

#[derive(Debug, Default, Deserialize)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDatabase {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUploads {
    dir: Option<PathBuf>,
    public_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGithub {
    token: Option<String>,
    username: Option<String>,
    freshness_secs: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAuth {
    jwt_secret: Option<String>,
    token_ttl_secs: Option<u64>,
    admin_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCors {
    #[serde(default)]
    allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawMail {
    endpoint: String,
    token: String,
    from: String,
    admin_recipient: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLogging {
    level: Option<String>,
    format: Option<String>,
}

impl RawSettings {
    fn finish(self, serve: &ServeArgs) -> Result<Settings, ConfigError> {
        let host = serve
            .host
            .clone()
            .or(self.server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host
            .parse()
            .map_err(|_| ConfigError::invalid("server.host", format!("`{host}` is not an IP address")))?;
        let port = serve.port.or(self.server.port).unwrap_or(DEFAULT_PORT);

        let database_url = serve
            .database_url
            .clone()
            .or(self.database.url)
            .ok_or_else(|| ConfigError::invalid("database.url", "is required"))?;

        let jwt_secret = self
            .auth
            .jwt_secret
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| ConfigError::invalid("auth.jwt_secret", "is required"))?;

        let username = self
            .github
            .username
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ConfigError::invalid("github.username", "is required"))?;

        let freshness_secs = self
            .github
            .freshness_secs
            .unwrap_or(DEFAULT_STATS_FRESHNESS_SECS);
        if freshness_secs == 0 {
            return Err(ConfigError::invalid(
                "github.freshness_secs",
                "must be greater than zero",
            ));
        }

        let mut allowed_origins = Vec::with_capacity(self.cors.allowed_origins.len());
        for origin in self.cors.allowed_origins {
            let parsed = Url::parse(&origin).map_err(|err| {
                ConfigError::invalid("cors.allowed_origins", format!("`{origin}`: {err}"))
            })?;
            // Normalize to scheme://host[:port] with no trailing slash, the
            // exact form browsers put in the Origin header.
            let normalized = parsed.origin().ascii_serialization();
            allowed_origins.push(normalized);
        }

        let mail = match self.mail {
            Some(raw) => Some(MailSettings {
                endpoint: raw.endpoint,
                token: raw.token,
                from: raw.from,
                admin_recipient: raw.admin_recipient,
                timeout: Duration::from_secs(
                    raw.timeout_secs.unwrap_or(DEFAULT_MAIL_TIMEOUT_SECS),
                ),
            }),
            None => None,
        };

        Ok(Settings {
            server: ServerSettings {
                bind: SocketAddr::new(host, port),
            },
            database: DatabaseSettings {
                url: database_url,
                max_connections: self
                    .database
                    .max_connections
                    .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
                    .max(1),
            },
            uploads: UploadSettings {
                dir: self
                    .uploads
                    .dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
                public_prefix: self
                    .uploads
                    .public_prefix
                    .unwrap_or_else(|| DEFAULT_UPLOAD_PREFIX.to_string()),
            },
            github: GithubSettings {
                token: self.github.token.filter(|token| !token.is_empty()),
                username,
                freshness: Duration::from_secs(freshness_secs),
                timeout: Duration::from_secs(
                    self.github
                        .timeout_secs
                        .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS)
                        .clamp(1, 30),
                ),
            },
            auth: AuthSettings {
                jwt_secret,
                token_ttl: Duration::from_secs(
                    self.auth.token_ttl_secs.unwrap_or(DEFAULT_TOKEN_TTL_SECS),
                ),
                admin_email: self.auth.admin_email.unwrap_or_default(),
            },
            allowed_origins,
            mail,
            logging: LoggingSettings {
                level: parse_level(self.logging.level.as_deref())?,
                format: parse_format(self.logging.format.as_deref())?,
            },
        })
    }
}

fn parse_level(raw: Option<&str>) -> Result<LevelFilter, ConfigError> {
    match raw {
        None => Ok(LevelFilter::INFO),
        Some(value) => LevelFilter::from_str(value)
            .map_err(|_| ConfigError::invalid("logging.level", format!("`{value}` is not a level"))),
    }
}

fn parse_format(raw: Option<&str>) -> Result<LogFormat, ConfigError> {
    match raw {
        None => Ok(LogFormat::Compact),
        Some("compact") => Ok(LogFormat::Compact),
        Some("json") => Ok(LogFormat::Json),
        Some(other) => Err(ConfigError::invalid(
            "logging.format",
            format!("`{other}` is neither `compact` nor `json`"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with_required() -> RawSettings {
        RawSettings {
            database: RawDatabase {
                url: Some("postgres://localhost/plinth".into()),
                max_connections: None,
            },
            auth: RawAuth {
                jwt_secret: Some("secret".into()),
                token_ttl_secs: None,
                admin_email: Some("owner@example.com".into()),
            },
            github: RawGithub {
                username: Some("octocat".into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn defaults_fill_in_around_required_values() {
        let settings = raw_with_required().finish(&ServeArgs::default()).unwrap();
        assert_eq!(settings.server.bind.port(), DEFAULT_PORT);
        assert_eq!(settings.github.freshness, Duration::from_secs(900));
        assert_eq!(settings.uploads.public_prefix, "/uploads");
        assert!(settings.mail.is_none());
        assert_eq!(settings.logging.level, LevelFilter::INFO);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let mut raw = raw_with_required();
        raw.database.url = None;
        let err = raw.finish(&ServeArgs::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "database.url", .. }));
    }

    #[test]
    fn cli_overrides_win_over_file_values() {
        let mut raw = raw_with_required();
        raw.server.port = Some(4000);
        let serve = ServeArgs {
            port: Some(5000),
            ..Default::default()
        };
        let settings = raw.finish(&serve).unwrap();
        assert_eq!(settings.server.bind.port(), 5000);
    }

    #[test]
    fn origins_are_normalized_and_validated() {
        let mut raw = raw_with_required();
        raw.cors.allowed_origins = vec!["https://example.com/".into()];
        let settings = raw.finish(&ServeArgs::default()).unwrap();
        assert_eq!(settings.allowed_origins, vec!["https://example.com"]);

        let mut raw = raw_with_required();
        raw.cors.allowed_origins = vec!["not a url".into()];
        assert!(raw.finish(&ServeArgs::default()).is_err());
    }

    #[test]
    fn zero_freshness_is_rejected() {
        let mut raw = raw_with_required();
        raw.github.freshness_secs = Some(0);
        assert!(raw.finish(&ServeArgs::default()).is_err());
    }
}
