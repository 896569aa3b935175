// File based configuration for the logger registry.
//
// At bootstrap the registry is configured from the JSON file named by
// RULE_INTROSPECT_LOG_CONFIG when that variable is set, and from the bundled
// defaults otherwise. A file that cannot be read or parsed is reported as a
// warning and the defaults are used instead.
//
// Example:
//   {
//     "root_level": "warn",
//     "console": true,
//     "loggers": {
//       "rule_introspect.marker": {"level": "debug", "use_parent_handlers": false, "console": true}
//     }
//   }

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};
use crate::logging::{ConsoleHandler, LoggerRegistry};
use crate::validation::parse_json_object;

/// Environment variable naming a logging configuration file.
pub const LOG_CONFIG_ENV: &str = "RULE_INTROSPECT_LOG_CONFIG";

/// Per-logger settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Level for this logger, inherited from the parent when absent
    pub level: Option<String>,
    /// Whether records are also handed to the parent's handlers
    pub use_parent_handlers: bool,
    /// Attach a console handler directly to this logger
    pub console: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: None,
            use_parent_handlers: true,
            console: false,
        }
    }
}

/// Logging configuration applied to a [`LoggerRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level of the root logger
    pub root_level: String,
    /// Attach a console handler to the root logger
    pub console: bool,
    /// Settings for individual loggers, keyed by dotted name
    pub loggers: BTreeMap<String, LoggerConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            root_level: "info".to_string(),
            console: true,
            loggers: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        parse_json_object(json)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Applies this configuration. Every level is parsed before the
    /// registry is touched, so an invalid level leaves it unchanged.
    pub fn apply(&self, registry: &LoggerRegistry) -> Result<()> {
        let root_level = parse_level(&self.root_level)?;
        let levels = self
            .loggers
            .iter()
            .map(|(name, config)| {
                let level = config.level.as_deref().map(parse_level).transpose()?;
                Ok((name.as_str(), config, level))
            })
            .collect::<Result<Vec<_>>>()?;

        let root = registry.root();
        root.set_level(Some(root_level));
        root.clear_handlers();
        if self.console {
            root.add_handler(Arc::new(ConsoleHandler));
        }

        for (name, config, level) in levels {
            let logger = registry.logger(name);
            logger.set_level(level);
            logger.set_use_parent_handlers(config.use_parent_handlers);
            logger.clear_handlers();
            if config.console {
                logger.add_handler(Arc::new(ConsoleHandler));
            }
        }
        Ok(())
    }
}

fn parse_level(level: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level)
        .map_err(|_| RuleError::ConfigParse(format!("Unknown log level: {}", level)))
}

/// Configures the registry from `RULE_INTROSPECT_LOG_CONFIG` or the defaults.
pub fn bootstrap_logging(registry: &LoggerRegistry) {
    let path = std::env::var_os(LOG_CONFIG_ENV);
    bootstrap_logging_from(registry, path.as_ref().map(Path::new));
}

/// Configures the registry from the given file, or the defaults when `None`.
pub fn bootstrap_logging_from(registry: &LoggerRegistry, path: Option<&Path>) {
    let config = match path {
        Some(path) => LoggingConfig::from_file(path).unwrap_or_else(|e| {
            warn!("Unable to load logging configuration file {}: {}", path.display(), e);
            LoggingConfig::default()
        }),
        None => LoggingConfig::default(),
    };

    if let Err(e) = config.apply(registry) {
        warn!("Invalid logging configuration, using defaults: {}", e);
        if let Err(e) = LoggingConfig::default().apply(registry) {
            warn!("Unable to apply default logging configuration: {}", e);
        }
    }
}
