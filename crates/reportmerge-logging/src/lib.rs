//! Logging configuration and subscriber setup for reportmerge.
//!
//! Library crates only emit `tracing` events. The binary calls [`init`] once
//! to install a formatter on stderr:
//! - `RUST_LOG` overrides the configured levels when set
//! - JSON output when the config asks for it or `RUST_LOG_FORMAT=json`
//! - human-readable output otherwise

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Prefix shared by every reportmerge crate's tracing target.
const TARGET_PREFIX: &str = "reportmerge";

/// Log level for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(LogFormat::Plain),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format `{other}` (expected plain, json or compact)")),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level for reportmerge crates; everything else logs at `warn`.
    pub level: LogLevel,
    pub format: LogFormat,
    #[serde(default = "default_true")]
    pub timestamps: bool,
    /// ANSI colors in plain and compact output.
    #[serde(default = "default_true")]
    pub colors: bool,
    /// Per-crate overrides keyed by the crate suffix (`merge`, `engine`, ...).
    #[serde(default)]
    pub component_levels: BTreeMap<String, LogLevel>,
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Plain,
            timestamps: true,
            colors: true,
            component_levels: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_component_level(mut self, component: impl Into<String>, level: LogLevel) -> Self {
        self.component_levels.insert(component.into(), level);
        self
    }

    /// The config the CLI's `--debug` flag maps to.
    pub fn for_debug(debug: bool) -> Self {
        let level = if debug { LogLevel::Debug } else { LogLevel::Info };
        Self::default().with_level(level)
    }

    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    pub fn filter_directives(&self) -> String {
        let mut directives = format!("warn,{TARGET_PREFIX}={}", self.level);
        for (component, level) in &self.component_levels {
            directives.push_str(&format!(",{TARGET_PREFIX}_{component}={level}"));
        }
        directives
    }

    /// Configured format, unless `RUST_LOG_FORMAT` asks for JSON.
    pub fn effective_format(&self, env_format: Option<&str>) -> LogFormat {
        match env_format {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => self.format,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Returns `false` when a subscriber was already installed; later calls are
/// no-ops.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));
    let env_format = std::env::var("RUST_LOG_FORMAT").ok();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(config.colors);

    let result = match (config.effective_format(env_format.as_deref()), config.timestamps) {
        (LogFormat::Json, true) => builder.json().try_init(),
        (LogFormat::Json, false) => builder.json().without_time().try_init(),
        (LogFormat::Compact, true) => builder.compact().try_init(),
        (LogFormat::Compact, false) => builder.compact().without_time().try_init(),
        (LogFormat::Plain, true) => builder.try_init(),
        (LogFormat::Plain, false) => builder.without_time().try_init(),
    };
    result.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_renders_as_directive() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Error.as_str(), "error");
        let level = LoggingConfig::new().with_level(LogLevel::Debug).level;
        assert_eq!(format!("{level}"), "debug");
    }

    #[test]
    fn logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Plain);
        assert_eq!(config.filter_directives(), "warn,reportmerge=info");
    }

    #[test]
    fn debug_flag_raises_level() {
        assert_eq!(LoggingConfig::for_debug(true).level, LogLevel::Debug);
        assert_eq!(LoggingConfig::for_debug(false).level, LogLevel::Info);
    }

    #[test]
    fn component_levels_become_directives() {
        let config = LoggingConfig::new()
            .with_level(LogLevel::Warn)
            .with_component_level("merge", LogLevel::Trace);
        assert_eq!(
            config.filter_directives(),
            "warn,reportmerge=warn,reportmerge_merge=trace"
        );
        assert!(EnvFilter::try_new(config.filter_directives()).is_ok());
    }

    #[test]
    fn env_format_overrides_to_json() {
        let config = LoggingConfig::new().with_format(LogFormat::Compact);
        assert_eq!(config.effective_format(Some("JSON")), LogFormat::Json);
        assert_eq!(config.effective_format(Some("plain")), LogFormat::Compact);
        assert_eq!(config.effective_format(None), LogFormat::Compact);
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{"level":"debug","format":"json"}"#).unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.timestamps);
        assert!(config.component_levels.is_empty());
    }

    #[test]
    fn init_is_idempotent() {
        init(&LoggingConfig::default());
        assert!(!init(&LoggingConfig::default()));
    }
}
