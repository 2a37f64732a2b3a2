//! Unified configuration for Planboard.
//!
//! Settings are layered: built-in defaults → `.planboard/planboard.toml` (or
//! the file passed with `--config`) → environment variables → CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3141
//! public_url = "http://localhost:3141"
//! dev_mode = false
//!
//! [database]
//! path = ".planboard/planboard.db"
//!
//! [auth]
//! session_ttl_hours = 720
//! cookie_name = "planboard-session"
//! secure_cookie = false
//!
//! [invite]
//! code_length = 10
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! directory = ".planboard/logs"
//! ```
//!
//! Environment overrides (a `.env` file in the working directory is loaded
//! first): `PLANBOARD_HOST`, `PLANBOARD_PORT`, `PLANBOARD_DB_PATH`,
//! `PLANBOARD_PUBLIC_URL`, `PLANBOARD_LOG_LEVEL`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the config file, database and logs by default.
pub const PLANBOARD_DIR: &str = ".planboard";
pub const CONFIG_FILE_NAME: &str = "planboard.toml";

/// Shortest invite code we accept; anything shorter is guessable.
pub const MIN_INVITE_CODE_LENGTH: usize = 6;
/// Longest invite code; it has to fit in a shareable link.
pub const MAX_INVITE_CODE_LENGTH: usize = 64;
/// Ten years. Larger values overflow session expiry arithmetic.
pub const MAX_SESSION_TTL_HOURS: u32 = 24 * 365 * 10;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, colored when attached to a terminal
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format '{}'. Valid values: pretty, json", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL used when building invite links. Derived from host/port
    /// when unset.
    #[serde(default)]
    pub public_url: Option<String>,
    /// Permissive CORS for a front end served from another origin.
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            dev_mode: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    Path::new(PLANBOARD_DIR).join("planboard.db")
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Mark the session cookie `Secure` (HTTPS only).
    #[serde(default)]
    pub secure_cookie: bool,
}

fn default_session_ttl_hours() -> u32 {
    24 * 30
}

fn default_cookie_name() -> String {
    "planboard-session".to_string()
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
            cookie_name: default_cookie_name(),
            secure_cookie: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteSection {
    #[serde(default = "default_code_length")]
    pub code_length: usize,
}

fn default_code_length() -> usize {
    10
}

impl Default for InviteSection {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// When set, logs are also written to a daily-rotated file here.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            directory: None,
        }
    }
}

/// Root of `planboard.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanboardToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub invite: InviteSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Flags from the command line that override file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
    pub dev_mode: bool,
    pub verbose: bool,
}

impl PlanboardToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse planboard.toml")
    }

    /// Load `planboard.toml` from `dir`, or defaults when the file is absent.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize planboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply `PLANBOARD_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("PLANBOARD_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PLANBOARD_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PLANBOARD_PORT '{}'", port))?;
        }
        if let Some(path) = lookup("PLANBOARD_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(url) = lookup("PLANBOARD_PUBLIC_URL") {
            self.server.public_url = Some(url);
        }
        if let Some(level) = lookup("PLANBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(ref host) = cli.host {
            self.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(ref path) = cli.db_path {
            self.database.path = path.clone();
        }
        if cli.dev_mode {
            self.server.dev_mode = true;
        }
        if cli.verbose {
            self.logging.level = "debug".to_string();
        }
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Invalid server.port 0: choose a port between 1 and 65535");
        }
        if self.invite.code_length < MIN_INVITE_CODE_LENGTH {
            anyhow::bail!(
                "Invalid invite.code_length {}: must be at least {}",
                self.invite.code_length,
                MIN_INVITE_CODE_LENGTH
            );
        }
        if self.invite.code_length > MAX_INVITE_CODE_LENGTH {
            anyhow::bail!(
                "Invalid invite.code_length {}: must be at most {}",
                self.invite.code_length,
                MAX_INVITE_CODE_LENGTH
            );
        }
        if self.auth.session_ttl_hours == 0 {
            anyhow::bail!("Invalid auth.session_ttl_hours 0: sessions would expire immediately");
        }
        if self.auth.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            anyhow::bail!(
                "Invalid auth.session_ttl_hours {}: must be at most {}",
                self.auth.session_ttl_hours,
                MAX_SESSION_TTL_HOURS
            );
        }
        if self.auth.cookie_name.trim().is_empty() {
            anyhow::bail!("Invalid auth.cookie_name: must not be empty");
        }
        if let Some(ref url) = self.server.public_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            anyhow::bail!(
                "Invalid server.public_url '{}': must start with http:// or https://",
                url
            );
        }
        crate::logging::check_level(&self.logging.level)
            .with_context(|| format!("Invalid logging.level '{}'", self.logging.level))?;
        Ok(())
    }

    /// Base URL for invite links, without a trailing slash.
    pub fn public_url(&self) -> String {
        match self.server.public_url {
            Some(ref url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.server.host, self.server.port),
        }
    }
}

/// Effective configuration after all layers are applied.
#[derive(Debug, Clone)]
pub struct PlanboardConfig {
    /// File the settings were read from, if any.
    pub source: Option<PathBuf>,
    pub toml: PlanboardToml,
}

impl PlanboardConfig {
    /// Resolve the configuration for a run.
    ///
    /// `config_path` is an explicit `--config`; a missing explicit file is an
    /// error, while a missing default file just means defaults.
    pub fn resolve(config_path: Option<&Path>, cli: &CliOverrides) -> Result<Self> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();
        Self::resolve_with_env(config_path, cli, |key| std::env::var(key).ok())
    }

    pub fn resolve_with_env<F>(
        config_path: Option<&Path>,
        cli: &CliOverrides,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (source, mut toml) = match config_path {
            Some(path) => (Some(path.to_path_buf()), PlanboardToml::load(path)?),
            None => {
                let default_path = Path::new(PLANBOARD_DIR).join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    let toml = PlanboardToml::load(&default_path)?;
                    (Some(default_path), toml)
                } else {
                    (None, PlanboardToml::default())
                }
            }
        };
        toml.apply_env(lookup)?;
        toml.apply_cli(cli);
        toml.validate()?;
        Ok(Self { source, toml })
    }

    pub fn public_url(&self) -> String {
        self.toml.public_url()
    }

    pub fn db_path(&self) -> &Path {
        &self.toml.database.path
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(&self.toml).context("Failed to serialize configuration")
    }
}
