//! Handler configuration
//!
//! All settings are read once at startup into a [`HandlerConfig`] which is then
//! passed to the components that need it. Nothing downstream reads the
//! process environment.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Environment variable holding the session bucket name
pub const BUCKET_ENV: &str = "S3_BUCKET_NAME";

/// Key prefix under which sessions are stored
pub const DEFAULT_SESSION_PREFIX: &str = "agent_sessions";

/// System instruction given to every agent
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const DEFAULT_CACHE_MAX_ENTRIES: usize = 256;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_STORAGE_ROOT: &str = "/tmp/agent-storage";
const DEFAULT_MODEL: &str = "claude-haiku-4-5";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Configuration errors
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Bounds for the agent cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of live agents (0 = unbounded)
    pub max_entries: usize,
    /// Idle time after which an agent is dropped (None = never)
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            ttl: Some(Duration::from_secs(DEFAULT_CACHE_TTL_SECS)),
        }
    }
}

/// Which object store backs session history
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    /// Local directory; each bucket is a sub-directory
    Fs { root: PathBuf },
    /// S3-compatible path-style REST endpoint
    Http {
        endpoint: String,
        token: Option<String>,
    },
    /// Process memory (lost on teardown)
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Fs {
            root: PathBuf::from(DEFAULT_STORAGE_ROOT),
        }
    }
}

/// Settings for the Anthropic provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    /// Full Messages API URL override
    pub api_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_url: None,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Complete handler configuration
///
/// ```ignore
/// let config = HandlerConfig::new("my-bucket")
///     .with_agent_timeout(Duration::from_secs(30))
///     .with_cache(CacheConfig { max_entries: 16, ttl: None });
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerConfig {
    /// Bucket holding session history. Checked per request as well as at startup.
    pub bucket_name: Option<String>,
    pub session_prefix: String,
    pub system_prompt: String,
    /// Upper bound on a single model call
    pub agent_timeout: Option<Duration>,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
    pub provider: ProviderConfig,
    pub log_format: LogFormat,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            bucket_name: None,
            session_prefix: DEFAULT_SESSION_PREFIX.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            agent_timeout: None,
            cache: CacheConfig::default(),
            storage: StorageConfig::default(),
            provider: ProviderConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl HandlerConfig {
    /// Create a configuration with defaults and the given bucket
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: Some(bucket_name.into()),
            ..Self::default()
        }
    }

    /// Set the model call timeout
    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = Some(timeout);
        self
    }

    /// Set the cache bounds
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from a map (used by tests and embedders)
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let cache = CacheConfig {
            max_entries: parse_or(&get, "AGENT_CACHE_MAX_ENTRIES", DEFAULT_CACHE_MAX_ENTRIES)?,
            ttl: match parse_or(&get, "AGENT_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        };

        let storage = match get("STORAGE_BACKEND").as_deref() {
            None | Some("fs") => StorageConfig::Fs {
                root: PathBuf::from(
                    get("STORAGE_ROOT").unwrap_or_else(|| DEFAULT_STORAGE_ROOT.to_string()),
                ),
            },
            Some("http") => StorageConfig::Http {
                endpoint: get("STORAGE_ENDPOINT").ok_or(ConfigError::Missing("STORAGE_ENDPOINT"))?,
                token: get("STORAGE_TOKEN"),
            },
            Some("memory") => StorageConfig::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let provider = ProviderConfig {
            api_key: get("ANTHROPIC_API_KEY"),
            model: get("ANTHROPIC_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: parse_or(&get, "ANTHROPIC_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            api_url: get("ANTHROPIC_BASE_URL"),
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let agent_timeout = get("AGENT_TIMEOUT_SECS")
            .map(|raw| parse_value::<u64>("AGENT_TIMEOUT_SECS", raw))
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self {
            bucket_name: get(BUCKET_ENV),
            session_prefix: get("SESSION_PREFIX")
                .unwrap_or_else(|| DEFAULT_SESSION_PREFIX.to_string()),
            system_prompt: get("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            agent_timeout,
            cache,
            storage,
            provider,
            log_format,
        })
    }

    /// Check settings the service cannot run without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_name.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Missing(BUCKET_ENV));
        }
        if self.session_prefix.trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid {
                name: "SESSION_PREFIX",
                value: self.session_prefix.clone(),
            });
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value: raw })
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => parse_value(name, raw),
        None => Ok(default),
    }
}
