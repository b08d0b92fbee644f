use serde::Deserialize;
use std::path::{Path, PathBuf};
use tidepool_events::N_SYMBOLS;

#[derive(Deserialize, Debug)]
pub struct EngineConfig {
    #[serde(default = "defaults::queue_capacity")]
    pub queue_capacity: usize,

    pub symbols: Vec<String>,

    pub transport_urls: Vec<String>,

    #[serde(default = "defaults::log_dir")]
    pub log_dir: PathBuf,

    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("symbols list must have exactly {expected} entries, found {actual}")]
    SymbolCount { expected: usize, actual: usize },

    #[error("transport_urls must not be empty")]
    NoTransportUrls,

    #[error("queue_capacity must be greater than zero")]
    ZeroQueueCapacity,
}

mod defaults {
    use std::path::PathBuf;

    pub fn queue_capacity() -> usize {
        1024
    }

    pub fn log_dir() -> PathBuf {
        PathBuf::from("/tmp/tidepool")
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: EngineConfig = toml::from_str(&toml_str)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.len() != N_SYMBOLS {
            return Err(ConfigError::SymbolCount {
                expected: N_SYMBOLS,
                actual: self.symbols.len(),
            });
        }
        if self.transport_urls.is_empty() {
            return Err(ConfigError::NoTransportUrls);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_toml() -> String {
        r#"
            symbols = ["BTCUSDT", "ETHUSDT", "SOLUSDT", "BNBUSDT", "XRPUSDT", "ADAUSDT", "DOGEUSDT", "AVAXUSDT"]
            transport_urls = ["wss://example.invalid/stream"]
        "#
        .to_string()
    }

    #[test]
    fn applies_defaults_when_fields_absent() {
        let config: EngineConfig = toml::from_str(&base_toml()).unwrap();
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.log_level, "info");
        config.validate().unwrap();
    }

    #[test]
    fn rejects_wrong_symbol_count() {
        let toml_str = r#"
            symbols = ["BTCUSDT"]
            transport_urls = ["wss://example.invalid/stream"]
        "#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SymbolCount {
                expected: 8,
                actual: 1
            })
        ));
    }

    #[test]
    fn rejects_empty_transport_urls() {
        let toml_str = r#"
            symbols = ["BTCUSDT", "ETHUSDT", "SOLUSDT", "BNBUSDT", "XRPUSDT", "ADAUSDT", "DOGEUSDT", "AVAXUSDT"]
            transport_urls = []
        "#;
        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::NoTransportUrls)));
    }

    #[test]
    fn missing_file_yields_read_error() {
        let result = EngineConfig::load("/nonexistent/tidepool.toml".to_string());
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
