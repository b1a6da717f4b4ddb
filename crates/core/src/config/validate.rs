use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Source URL and catalog User-Agent are not empty
/// - Poll tick interval and stability threshold are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.source.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "source.url cannot be empty".to_string(),
        ));
    }

    if config.catalog.user_agent.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.user_agent cannot be empty".to_string(),
        ));
    }

    if config.poll.tick_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "poll.tick_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.poll.stability_threshold == 0 {
        return Err(ConfigError::ValidationError(
            "poll.stability_threshold cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CatalogConfig, FilterDefaults, OutputConfig, PollConfig, SourceConfig,
    };

    fn config() -> Config {
        Config {
            catalog: CatalogConfig::default(),
            source: SourceConfig {
                url: "http://localhost:5030".to_string(),
                api_key: String::new(),
                timeout_secs: 30,
            },
            poll: PollConfig::default(),
            filters: FilterDefaults::default(),
            output: OutputConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&config()).is_ok());
    }

    #[test]
    fn test_validate_empty_source_url_fails() {
        let mut config = config();
        config.source.url = "  ".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_tick_interval_fails() {
        let mut config = config();
        config.poll.tick_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_stability_threshold_fails() {
        let mut config = config();
        config.poll.stability_threshold = 0;
        assert!(validate_config(&config).is_err());
    }
}
