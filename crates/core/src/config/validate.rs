use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Backend URL parses and timeouts are non-zero
/// - Default captioning settings are in range
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Backend validation
    if let Err(e) = reqwest::Url::parse(&config.backend.base_url) {
        return Err(ConfigError::ValidationError(format!(
            "backend.base_url is not a valid URL: {}",
            e
        )));
    }
    if config.backend.timeout_secs == 0 || config.backend.load_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "backend timeouts cannot be 0".to_string(),
        ));
    }

    config
        .settings
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("settings: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_bad_backend_url() {
        let mut config = Config::default();
        config.backend.base_url = "not a url".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("backend.base_url"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.backend.load_timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_out_of_range_settings() {
        let mut config = Config::default();
        config.settings.max_frames = 500;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_frames"));
    }
}
