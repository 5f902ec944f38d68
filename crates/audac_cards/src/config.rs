//! Dashboard file configuration.
//!
//! A dashboard is a TOML file with an optional `[logging]` section and a
//! list of `[[cards]]` tables. Card tables are kept opaque here and handed to
//! the card validators as JSON.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Raw card configs, validated when mounted.
    #[serde(default)]
    pub cards: Vec<toml::Value>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(ConfigError::Parse)
    }

    /// Convert the opaque card tables to JSON for the card validators
    pub fn cards_json(&self) -> Result<Vec<serde_json::Value>, ConfigError> {
        self.cards
            .iter()
            .map(|card| serde_json::to_value(card).map_err(ConfigError::JsonConversion))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to convert config to JSON: {0}")]
    JsonConversion(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.cards.is_empty());
    }

    #[test]
    fn test_parse_cards() {
        let toml = r#"
            [logging]
            level = "debug"

            [[cards]]
            type = "custom:audac-zone-card"
            name = "Lobby"
            volume_entity = "number.zone_1_volume"
            style = "bubble"

            [[cards]]
            type = "custom:audac-event-button-card"
            entry_id = "01HXYZ"
            slot = 4
            event = 12
        "#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(LevelFilter::from(config.logging.level), LevelFilter::DEBUG);

        let cards = config.cards_json().unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0]["volume_entity"], "number.zone_1_volume");
        assert_eq!(cards[1]["slot"], 4);
    }

    #[test]
    fn test_invalid_level() {
        let err = Config::parse("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
