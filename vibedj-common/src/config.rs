//! Bootstrap configuration loading
//!
//! Configuration is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `VIBEDJ_CONFIG` environment variable
//! 3. Platform TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is never fatal: a warning is logged and compiled
//! defaults are used. A config file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VIBEDJ_CONFIG";

/// Default HTTP port for vibedj-dj
pub const DEFAULT_PORT: u16 = 5730;

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime. The service must restart
/// to pick up changes to the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Overall deadline for one recommendation request (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of tracks requested when the caller does not ask for a specific count
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Upper bound on caller-supplied track counts
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Upper bound on concurrently open playback sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// API authentication (optional)
    #[serde(default)]
    pub auth: AuthConfig,

    /// Generation service used to translate vibes into search queries
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Media search backend
    #[serde(default)]
    pub search: SearchConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// API authentication configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for timestamp + hash authentication; 0 disables checking
    #[serde(default)]
    pub shared_secret: i64,
}

/// Which generation provider backs the query translator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProvider {
    /// Google Generative Language API (generateContent)
    Gemini,
    /// OpenAI-compatible chat completions API
    ChatCompletion,
    /// No provider: vibes are used verbatim as search queries
    None,
}

impl fmt::Display for GenerationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationProvider::Gemini => write!(f, "gemini"),
            GenerationProvider::ChatCompletion => write!(f, "chat_completion"),
            GenerationProvider::None => write!(f, "none"),
        }
    }
}

/// Generation service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: GenerationProvider,

    /// Model name; provider default when omitted
    #[serde(default)]
    pub model: Option<String>,

    /// API key; falls back to the provider's environment variable
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL override (self-hosted or proxied endpoints)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-call timeout (seconds)
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

/// Media search backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Path or name of the yt-dlp executable
    #[serde(default = "default_search_binary")]
    pub binary: PathBuf,

    /// Per-invocation timeout (seconds)
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra arguments passed before the search directive
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_limit() -> usize {
    5
}

fn default_max_limit() -> usize {
    25
}

fn default_max_sessions() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider() -> GenerationProvider {
    GenerationProvider::Gemini
}

fn default_generation_timeout_secs() -> u64 {
    10
}

fn default_search_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_search_timeout_secs() -> u64 {
    20
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            max_sessions: default_max_sessions(),
            logging: LoggingConfig::default(),
            auth: AuthConfig::default(),
            generation: GenerationConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            api_key: None,
            base_url: None,
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            binary: default_search_binary(),
            timeout_secs: default_search_timeout_secs(),
            extra_args: Vec::new(),
        }
    }
}

impl TomlConfig {
    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.default_limit == 0 {
            return Err(Error::Config("default_limit must be at least 1".to_string()));
        }
        if self.max_limit < self.default_limit {
            return Err(Error::Config(format!(
                "max_limit ({}) must not be below default_limit ({})",
                self.max_limit, self.default_limit
            )));
        }
        if self.max_sessions == 0 {
            return Err(Error::Config("max_sessions must be at least 1".to_string()));
        }
        if self.search.timeout_secs == 0 {
            return Err(Error::Config(
                "search.timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Overall recommendation deadline
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl GenerationConfig {
    /// Environment variable consulted when `api_key` is absent
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self.provider {
            GenerationProvider::Gemini => Some("GEMINI_API_KEY"),
            GenerationProvider::ChatCompletion => Some("OPENAI_API_KEY"),
            GenerationProvider::None => None,
        }
    }

    /// API key from the config file, else from the provider's environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                self.api_key_env_var()
                    .and_then(|name| std::env::var(name).ok())
                    .filter(|key| !key.trim().is_empty())
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    PlatformFile(PathBuf),
    CompiledDefaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::CommandLine(path) => write!(f, "command line ({})", path.display()),
            ConfigSource::Environment(path) => {
                write!(f, "{} ({})", CONFIG_ENV_VAR, path.display())
            }
            ConfigSource::PlatformFile(path) => write!(f, "config file ({})", path.display()),
            ConfigSource::CompiledDefaults => write!(f, "compiled defaults"),
        }
    }
}

/// Resolves which config file to load following the priority order
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Determine the config source without reading it
    pub fn resolve(&self) -> ConfigSource {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return ConfigSource::CommandLine(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config file
        if let Some(path) = platform_config_file() {
            return ConfigSource::PlatformFile(path);
        }

        // Priority 4: Compiled defaults
        ConfigSource::CompiledDefaults
    }

    /// Load configuration from the resolved source
    ///
    /// Missing files degrade to compiled defaults with a warning.
    pub fn load(&self) -> Result<(TomlConfig, ConfigSource)> {
        let source = self.resolve();
        let path = match &source {
            ConfigSource::CommandLine(path)
            | ConfigSource::Environment(path)
            | ConfigSource::PlatformFile(path) => path.clone(),
            ConfigSource::CompiledDefaults => {
                info!("No config file found, using compiled defaults");
                return Ok((TomlConfig::default(), source));
            }
        };

        if !path.exists() {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            return Ok((TomlConfig::default(), ConfigSource::CompiledDefaults));
        }

        let config = TomlConfig::load(&path)?;
        Ok((config, source))
    }
}

/// First existing platform config file, if any
fn platform_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("vibedj").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/vibedj/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
