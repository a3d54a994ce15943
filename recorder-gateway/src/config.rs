//! Configuration file format and resolved runtime settings.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use crate::backend::CardInfo;
use crate::error::ConfigError;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "recorder-gateway.toml";

/// Configuration file format.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub recorder: RecorderSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default)]
    pub cards: Vec<CardSection>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ServerSection {
    pub listen: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RecorderSection {
    pub name: Option<String>,
    pub keep_alive_timeout_secs: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
    pub drain_timeout_secs: Option<u64>,
    #[serde(default)]
    pub recording_shares: Vec<String>,
    #[serde(default)]
    pub timeshift_shares: Vec<String>,
    #[serde(default)]
    pub mac_addresses: Vec<String>,
    pub rtsp_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoggingSection {
    pub log_dir: Option<String>,
    pub retention_days: Option<u64>,
    pub level: Option<String>,
}

/// A simulated tuner card.
#[derive(Debug, Deserialize, Clone)]
pub struct CardSection {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub channels: Vec<Uuid>,
}

impl From<&CardSection> for CardInfo {
    fn from(card: &CardSection) -> Self {
        CardInfo {
            card_id: card.id.clone(),
            name: card.name.clone().unwrap_or_else(|| card.id.clone()),
            priority: card.priority,
            channels: card.channels.clone(),
        }
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse TOML config contents.
pub fn parse_config(contents: &str) -> Result<ConfigFile, ConfigError> {
    let config: ConfigFile = toml::from_str(contents)?;

    let mut seen = std::collections::HashSet::new();
    for card in &config.cards {
        if !seen.insert(card.id.as_str()) {
            return Err(ConfigError::Invalid(format!("duplicate card id '{}'", card.id)));
        }
    }
    if config.recorder.keep_alive_timeout_secs == Some(0) {
        return Err(ConfigError::Invalid("keep_alive_timeout_secs must be positive".to_string()));
    }
    if config.recorder.sweep_interval_secs == Some(0) {
        return Err(ConfigError::Invalid("sweep_interval_secs must be positive".to_string()));
    }

    Ok(config)
}

/// Resolved gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Name reported to the scheduler on registration.
    pub recorder_name: String,
    /// A live stream without keep-alive for longer than this is torn down.
    pub keep_alive_timeout: Duration,
    /// Period of the expiry/recording-end sweep.
    pub sweep_interval: Duration,
    /// Upper bound on waiting for queued hardware operations at shutdown.
    pub drain_timeout: Duration,
    pub recording_shares: Vec<String>,
    pub timeshift_shares: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            recorder_name: "Recorder Gateway".to_string(),
            keep_alive_timeout: Duration::from_secs(90),
            sweep_interval: Duration::from_secs(10),
            drain_timeout: Duration::from_secs(10),
            recording_shares: Vec::new(),
            timeshift_shares: Vec::new(),
        }
    }
}

impl From<&RecorderSection> for GatewayConfig {
    fn from(section: &RecorderSection) -> Self {
        let defaults = GatewayConfig::default();
        Self {
            recorder_name: section.name.clone().unwrap_or(defaults.recorder_name),
            keep_alive_timeout: section
                .keep_alive_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.keep_alive_timeout),
            sweep_interval: section
                .sweep_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            drain_timeout: section
                .drain_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.drain_timeout),
            recording_shares: section.recording_shares.clone(),
            timeshift_shares: section.timeshift_shares.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [server]
            listen = "127.0.0.1:49943"

            [recorder]
            name = "Living room"
            keep_alive_timeout_secs = 30
            recording_shares = ["\\\\server\\recordings"]
            mac_addresses = ["A1B2C3D4E5F6"]

            [logging]
            level = "debug"

            [[cards]]
            id = "A"
            priority = 10

            [[cards]]
            id = "B"
            name = "Second tuner"
            channels = ["00000000-0000-0000-0000-000000000001"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen.as_deref(), Some("127.0.0.1:49943"));
        assert_eq!(config.cards.len(), 2);
        assert_eq!(config.recorder.mac_addresses, vec!["A1B2C3D4E5F6".to_string()]);

        let card_b = CardInfo::from(&config.cards[1]);
        assert_eq!(card_b.name, "Second tuner");
        assert!(card_b.can_tune(&Uuid::from_u128(1)));
        assert!(!card_b.can_tune(&Uuid::from_u128(2)));

        let gateway = GatewayConfig::from(&config.recorder);
        assert_eq!(gateway.recorder_name, "Living room");
        assert_eq!(gateway.keep_alive_timeout, Duration::from_secs(30));
        assert_eq!(gateway.sweep_interval, Duration::from_secs(10));
        assert_eq!(gateway.recording_shares, vec!["\\\\server\\recordings".to_string()]);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert!(config.cards.is_empty());
        let gateway = GatewayConfig::from(&config.recorder);
        assert_eq!(gateway.keep_alive_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_rejects_duplicate_cards() {
        let result = parse_config(
            r#"
            [[cards]]
            id = "A"
            [[cards]]
            id = "A"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = parse_config("[recorder]\nkeep_alive_timeout_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
