use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

const ENV_PREFIX: &str = "VIDCAP_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// `VIDCAP_BACKEND__BASE_URL` maps to `backend.base_url`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX)
        .ignore(&["CONFIG"])
        .split("__")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Device;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000

[backend]
base_url = "http://gpu-box:8765"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.backend.base_url, "http://gpu-box:8765");
        assert_eq!(config.backend.timeout_secs, 600);
    }

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.library.video_dir.is_none());
        assert_eq!(config.settings.max_frames, 16);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[server]
port = "eighty"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[library]
video_dir = "/srv/videos"
recursive = true

[settings]
device = "cpu"
max_frames = 32
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(
            config.library.video_dir.as_deref(),
            Some(Path::new("/srv/videos"))
        );
        assert!(config.library.recursive);
        assert_eq!(config.settings.device, Device::Cpu);
        assert_eq!(config.settings.max_frames, 32);
        assert_eq!(config.settings.frame_size, 336);
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[server]\nport = 3000\n")?;
            jail.set_env("VIDCAP_SERVER__PORT", "4000");
            jail.set_env("VIDCAP_BACKEND__TIMEOUT_SECS", "42");

            let config = load_config(Path::new("config.toml")).unwrap();
            assert_eq!(config.server.port, 4000);
            assert_eq!(config.backend.timeout_secs, 42);
            Ok(())
        });
    }

    #[test]
    fn test_env_only_config() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("VIDCAP_CONFIG", "/does/not/matter.toml");
            jail.set_env("VIDCAP_LIBRARY__VIDEO_DIR", "/data/clips");

            let config = load_config_from_env().unwrap();
            assert_eq!(
                config.library.video_dir.as_deref(),
                Some(Path::new("/data/clips"))
            );
            assert_eq!(config.server.port, 8080);
            Ok(())
        });
    }
}
