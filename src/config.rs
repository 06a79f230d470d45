//! Layered configuration.
//!
//! Precedence, lowest to highest: built-in defaults, a TOML file, `QUAY_*`
//! environment variables. Every layer is a [`QuayConfigLayer`] of optional
//! fields; [`QuayConfig::load`] merges them and validates the result.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use quay_constants::naming::DEFAULT_CACHE_PREFIX;
use quay_constants::paging::DEFAULT_PAGE_SIZE;
use quay_constants::paging::MAX_PAGE_SIZE;
use quay_constants::paging::MIN_PAGE_SIZE;
use quay_constants::stats::STATS_SNAPSHOT_INTERVAL_MS;
use quay_queue::CodecKind;
use quay_queue::QueueConfig;
use serde::Deserialize;
use serde::Serialize;
use snafu::ResultExt;
use snafu::Snafu;
use tracing::info;

/// Configuration errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[snafu(display("failed to read config file {}: {source}", path.display()))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[snafu(display("failed to parse config file {}: {source}", path.display()))]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A value is out of range or malformed.
    #[snafu(display("invalid configuration for {key}: '{value}' ({reason})"))]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Effective configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuayConfig {
    /// Page size hint for traversals.
    pub page_size: u32,
    /// Address random sentinels inside the head/tail windows.
    pub randomize_positions: bool,
    /// Prefix mapping logical queue names to cache names.
    pub cache_prefix: String,
    /// Serialization of typed queues.
    pub codec: CodecKind,
    /// Minimum interval between histogram snapshot recomputations.
    pub stats_snapshot_interval_ms: u64,
}

impl Default for QuayConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            randomize_positions: false,
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            codec: CodecKind::default(),
            stats_snapshot_interval_ms: STATS_SNAPSHOT_INTERVAL_MS,
        }
    }
}

/// One configuration layer. Unset fields fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuayConfigLayer {
    pub page_size: Option<u32>,
    pub randomize_positions: Option<bool>,
    pub cache_prefix: Option<String>,
    pub codec: Option<CodecKind>,
    pub stats_snapshot_interval_ms: Option<u64>,
}

impl QuayConfigLayer {
    /// Parse a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
        toml::from_str(&contents).context(ParseFileSnafu { path })
    }

    /// Read `QUAY_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read `QUAY_*` variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            page_size: parse_var(&lookup, "QUAY_PAGE_SIZE")?,
            randomize_positions: parse_var(&lookup, "QUAY_RANDOMIZE_POSITIONS")?,
            cache_prefix: lookup("QUAY_CACHE_PREFIX"),
            codec: lookup("QUAY_CODEC").map(|value| parse_codec(&value)).transpose()?,
            stats_snapshot_interval_ms: parse_var(&lookup, "QUAY_STATS_SNAPSHOT_INTERVAL_MS")?,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    value.trim().parse().map(Some).map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.clone(),
        reason: e.to_string(),
    })
}

fn parse_codec(value: &str) -> Result<CodecKind, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(CodecKind::Json),
        "postcard" => Ok(CodecKind::Postcard),
        _ => Err(ConfigError::InvalidValue {
            key: "QUAY_CODEC".to_string(),
            value: value.to_string(),
            reason: "expected 'json' or 'postcard'".to_string(),
        }),
    }
}

impl QuayConfig {
    /// Defaults, then `file` if given, then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = file {
            info!(path = %path.display(), "loading configuration file");
            config.merge(QuayConfigLayer::from_toml_file(path)?);
        }
        config.merge(QuayConfigLayer::from_env()?);
        config.validate()?;
        Ok(config)
    }

    /// Overwrite every field `layer` sets.
    pub fn merge(&mut self, layer: QuayConfigLayer) {
        if let Some(page_size) = layer.page_size {
            self.page_size = page_size;
        }
        if let Some(randomize_positions) = layer.randomize_positions {
            self.randomize_positions = randomize_positions;
        }
        if let Some(cache_prefix) = layer.cache_prefix {
            self.cache_prefix = cache_prefix;
        }
        if let Some(codec) = layer.codec {
            self.codec = codec;
        }
        if let Some(interval) = layer.stats_snapshot_interval_ms {
            self.stats_snapshot_interval_ms = interval;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(ConfigError::InvalidValue {
                key: "page_size".to_string(),
                value: self.page_size.to_string(),
                reason: format!("must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}"),
            });
        }
        if self.cache_prefix.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "cache_prefix".to_string(),
                value: String::new(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.stats_snapshot_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "stats_snapshot_interval_ms".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Builder settings for this configuration.
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            page_size: self.page_size,
            randomize_positions: self.randomize_positions,
            cache_prefix: self.cache_prefix.clone(),
            codec: self.codec,
            stats_snapshot_interval: Duration::from_millis(self.stats_snapshot_interval_ms),
        }
    }
}
