use std::{env, fs};
use std::net::IpAddr;
use std::time::Duration;

use log::{debug, error};
use serde_derive::Deserialize;
use thiserror::Error;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub app: AppConf,
    pub server: ServerConf,
    pub log: LogConf,
    pub database: DatabaseConf,
    pub qr: QrConf,
    pub camera: CameraConf,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LogConf {
    pub file: String,
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppConf {
    pub environment: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConf {
    pub address: IpAddr,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseConf {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Where QR artifacts are written and the URL prefix they are served under.
#[derive(Deserialize, Debug, Clone)]
pub struct QrConf {
    pub directory: String,
    pub url_prefix: String,
}

impl QrConf {
    /// `url_prefix` without trailing slashes, as mounted on the router.
    pub fn mount_path(&self) -> &str {
        self.url_prefix.trim_end_matches('/')
    }
}

/// Capture command run once per polled frame. `{device}` in `args` is
/// replaced with `device`; the command must write a single PNG to stdout.
#[derive(Deserialize, Debug, Clone)]
pub struct CameraConf {
    pub device: String,
    #[serde(default = "default_camera_program")]
    pub program: String,
    #[serde(default = "default_camera_args")]
    pub args: Vec<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_capture_timeout_ms")]
    pub capture_timeout_ms: u64,
}

impl CameraConf {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// How long one run of the capture command may take before it is killed.
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_pool_size() -> u32 {
    4
}

fn default_camera_program() -> String {
    "ffmpeg".to_string()
}

fn default_camera_args() -> Vec<String> {
    [
        "-hide_banner", "-loglevel", "error",
        "-f", "v4l2", "-i", "{device}",
        "-frames:v", "1",
        "-f", "image2pipe", "-vcodec", "png", "-",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_capture_timeout_ms() -> u64 {
    5000
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config File could not be found")]
    ConfigNotFound(std::io::Error),

    #[error("Config File could not be parsed: {0}")]
    ParsingError(toml::de::Error),

    #[error("Env variable could not be found")]
    EnvVarNotFound(std::env::VarError),

    #[error("Config value is invalid: {0}")]
    Invalid(String),
}

impl Config {
    pub fn from_any() -> Result<Self, ConfigError> {
        //Try to read from path env var
        match Self::from_env_path() {
            Ok(config) => {
                debug!("Loaded config from env path");
                return Ok(config);
            }
            Err(error) => {
                debug!("Could not load config from env path: {}", error);
            }
        }

        //Try to read default path
        match Self::from_default_path() {
            Ok(config) => {
                debug!("Loaded config from default path");
                Ok(config)
            }
            Err(error) => {
                error!("Could not load config: {}", error);
                Err(error)
            }
        }
    }

    // Read Config from default path
    pub fn from_default_path() -> Result<Self, ConfigError> {
        Self::from_file_path("config.toml")
    }

    // Read Config from path in CONFIG_LOCATION env variable
    pub fn from_env_path() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_LOCATION")
            .map_err(ConfigError::EnvVarNotFound)?;
        Self::from_file_path(&path)
    }

    // Read and Parse Config from path
    pub fn from_file_path(path: &str) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)
            .map_err(ConfigError::ConfigNotFound)?;

        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(data)
            .map_err(ConfigError::ParsingError)?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mount_path = self.qr.mount_path();
        if !mount_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "qr.url_prefix must be a path below the root such as \"/static/qr_codes\", got {:?}",
                self.qr.url_prefix
            )));
        }
        if self.camera.capture_timeout_ms == 0 {
            return Err(ConfigError::Invalid("camera.capture_timeout_ms must be greater than zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [app]
        environment = "test"

        [server]
        address = "127.0.0.1"
        port = 5000

        [log]
        file = "attendance.log"

        [database]
        url = "attendance.db"

        [qr]
        directory = "static/qr_codes"
        url_prefix = "/static/qr_codes"

        [camera]
        device = "/dev/video0"
    "#;

    #[test]
    fn test_defaults_fill_optional_fields() {
        let conf = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(conf.server.port, 5000);
        assert_eq!(conf.log.level, "debug");
        assert_eq!(conf.database.pool_size, 4);
        assert_eq!(conf.camera.program, "ffmpeg");
        assert!(conf.camera.args.iter().any(|arg| arg == "{device}"));
        assert_eq!(conf.camera.poll_interval(), Duration::from_millis(100));
        assert_eq!(conf.camera.capture_timeout(), Duration::from_secs(5));
        assert_eq!(conf.qr.mount_path(), "/static/qr_codes");
    }

    #[test]
    fn test_trailing_slash_is_trimmed_from_prefix() {
        let data = MINIMAL.replace("url_prefix = \"/static/qr_codes\"", "url_prefix = \"/static/qr_codes/\"");
        let conf = Config::from_toml(&data).unwrap();
        assert_eq!(conf.qr.mount_path(), "/static/qr_codes");
    }

    #[test]
    fn test_root_or_relative_prefix_is_rejected() {
        for prefix in ["/", "//", "", "static/qr_codes"] {
            let data = MINIMAL.replace("\"/static/qr_codes\"\n", &format!("{:?}\n", prefix));
            let result = Config::from_toml(&data);
            assert!(matches!(result, Err(ConfigError::Invalid(_))), "prefix {:?} was accepted", prefix);
        }
    }

    #[test]
    fn test_missing_section_is_parsing_error() {
        let result = Config::from_toml("[app]\nenvironment = \"test\"\n");
        assert!(matches!(result, Err(ConfigError::ParsingError(_))));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = Config::from_file_path("/nonexistent/config.toml");
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}
