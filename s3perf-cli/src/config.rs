//! Settings for the benchmark binary.
//!
//! The connection parameters of a run are passed as command line flags. Everything else is a
//! setting, loaded from multiple sources with the following precedence (highest to lowest):
//!
//! 1. Environment variables (prefixed with `S3PERF__`)
//! 2. YAML settings file (specified via `-c` or `--config` flag)
//! 3. Defaults
//!
//! # Environment Variables
//!
//! Environment variables use `S3PERF__` as a prefix and double underscores (`__`) to denote nested
//! structures. For example:
//!
//! - `S3PERF__CONCURRENCY=8` runs eight storage operations at a time
//! - `S3PERF__LOGGING__FORMAT=json` switches log output to JSON
//!
//! # YAML Settings File
//!
//! ```yaml
//! concurrency: 8
//! request_timeout: 30s
//!
//! logging:
//!   level: debug
//!   format: json
//! ```

use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Environment variable prefix for all settings.
const ENV_PREFIX: &str = "S3PERF__";

/// Log output format.
///
/// Used in: [`Logging::format`]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty output when attached to a terminal, otherwise simplified.
    Auto,
    /// Multi-line, human readable output with colors.
    Pretty,
    /// Compact single-line output without timestamps.
    Simplified,
    /// One JSON object per line.
    Json,
}

/// Reads a [`LevelFilter`] from its name, such as `debug` or `off`.
mod level_filter {
    use std::borrow::Cow;

    use serde::de::{self, Unexpected};
    use serde::{Deserialize, Deserializer, Serializer};
    use tracing::level_filters::LevelFilter;

    pub fn serialize<S: Serializer>(level: &LevelFilter, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(level)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = Cow::<'de, str>::deserialize(deserializer)?;
        name.parse().map_err(|_| {
            de::Error::invalid_value(
                Unexpected::Str(&name),
                &"one of off, error, warn, info, debug, trace",
            )
        })
    }
}

/// Logging configuration.
///
/// Used in: [`Settings::logging`]
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Minimum log level for our own crates.
    ///
    /// A plain level in `RUST_LOG` takes precedence, a full filter directive in `RUST_LOG` is used
    /// literally instead.
    ///
    /// # Default
    ///
    /// `info`
    ///
    /// # Environment Variable
    ///
    /// `S3PERF__LOGGING__LEVEL`
    #[serde(with = "level_filter")]
    pub level: LevelFilter,

    /// Output format, one of `auto`, `pretty`, `simplified`, `json`.
    ///
    /// # Default
    ///
    /// `auto`
    ///
    /// # Environment Variable
    ///
    /// `S3PERF__LOGGING__FORMAT`
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// Settings of the benchmark binary.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Logging configuration.
    pub logging: Logging,

    /// Maximum number of storage operations in flight.
    ///
    /// # Default
    ///
    /// `1`, which issues every operation strictly after the previous one completed.
    ///
    /// # Environment Variable
    ///
    /// `S3PERF__CONCURRENCY`
    pub concurrency: NonZeroUsize,

    /// Signing region for the S3 endpoint.
    ///
    /// # Default
    ///
    /// `us-east-1`
    ///
    /// # Environment Variable
    ///
    /// `S3PERF__REGION`
    pub region: String,

    /// Whether buckets are addressed as `endpoint/bucket` instead of `bucket.endpoint`.
    ///
    /// Most self-hosted S3-compatible services require this.
    ///
    /// # Default
    ///
    /// `true`
    ///
    /// # Environment Variable
    ///
    /// `S3PERF__PATH_STYLE`
    pub path_style: bool,

    /// Timeout for every request to the storage endpoint and the index cluster, such as `30s`.
    ///
    /// # Default
    ///
    /// `None` (requests can block indefinitely)
    ///
    /// # Environment Variable
    ///
    /// `S3PERF__REQUEST_TIMEOUT`
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,

    /// Host identity attached to every record.
    ///
    /// # Default
    ///
    /// `None` (the hostname of the machine)
    ///
    /// # Environment Variable
    ///
    /// `S3PERF__SOURCE`
    pub source: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: Logging::default(),
            concurrency: NonZeroUsize::MIN,
            region: "us-east-1".to_owned(),
            path_style: true,
            request_timeout: None,
            source: None,
        }
    }
}

impl Settings {
    /// Loads settings from defaults, an optional YAML file, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let settings = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(settings)
    }
}
