//! Configuration using Figment
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. built-in defaults
//! 2. `config/cube.toml` (or the file given with `--config`)
//! 3. environment variables prefixed with `RUST_CUBE_`, with `__` between
//!    nesting levels (e.g. `RUST_CUBE_DEVICE__ADDRESS=10.0.0.5`)
//! 4. the legacy variables `YEELIGHT_ADDR` and `YEELIGHT_SCRIPTS`
//!
//! # Example
//! ```no_run
//! use rust_cube::config::CubeConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CubeConfig::load(None)?;
//! println!("lamp at {}", config.device.address);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use cube_core::{CompileOptions, CubeError, CubeResult};
use cube_driver_yeelight::YeelightConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::logging::{self, OutputFormat};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/cube.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "RUST_CUBE_";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeConfig {
    /// Logging
    pub application: ApplicationConfig,
    /// The lamp to drive
    pub device: YeelightConfig,
    /// Script library location
    pub scripts: ScriptsConfig,
    /// Defaults for `run`
    pub playback: PlaybackConfig,
    /// Compiler switches for rotation and rectangle bounds
    pub render: CompileOptions,
}

/// Application-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log line format (pretty, compact, json)
    pub log_format: OutputFormat,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: OutputFormat::default(),
        }
    }
}

/// Where scripts live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// Directory searched for scripts
    pub dir: PathBuf,
    /// File extension without the dot
    pub extension: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./scripts"),
            extension: "txt".to_string(),
        }
    }
}

/// Defaults for `rust-cube run`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Time between frames; 0 shows the first frame only
    pub interval_ms: u64,
    /// Session length; 0 plays until stopped
    pub timeout_secs: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            timeout_secs: 0,
        }
    }
}

impl PlaybackConfig {
    /// `interval_ms` as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// `timeout_secs` as a `Duration`; zero means none.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CubeConfig {
    /// All configuration sources, in precedence order.
    pub fn figment(path: Option<&Path>) -> Figment {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        Figment::from(Serialized::defaults(CubeConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(legacy_env())
    }

    /// Load configuration from `path` (or the default file) and the environment.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load(path: Option<&Path>) -> CubeResult<Self> {
        Self::figment(path)
            .extract()
            .map_err(|e| CubeError::config(e.to_string()))
    }

    /// Validate configuration after loading.
    ///
    /// The device section is only checked when a real lamp will be driven.
    pub fn validate(&self, require_device: bool) -> CubeResult<()> {
        logging::parse_log_level(&self.application.log_level)?;

        let extension = &self.scripts.extension;
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CubeError::config(format!(
                "invalid scripts.extension '{}', expected letters and digits without a dot",
                extension
            )));
        }

        if require_device {
            self.device
                .validate()
                .map_err(|e| CubeError::config(format!("device: {}", e)))?;
        }
        Ok(())
    }
}

/// `YEELIGHT_ADDR` and `YEELIGHT_SCRIPTS`, as read by earlier releases.
fn legacy_env() -> Env {
    Env::raw()
        .only(&["YEELIGHT_ADDR", "YEELIGHT_SCRIPTS"])
        .map(|key| {
            if key.as_str().eq_ignore_ascii_case("YEELIGHT_ADDR") {
                "device.address".into()
            } else if key.as_str().eq_ignore_ascii_case("YEELIGHT_SCRIPTS") {
                "scripts.dir".into()
            } else {
                key.as_str().to_string().into()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cube_core::RotationMapping;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = CubeConfig::default();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.scripts.dir, PathBuf::from("./scripts"));
        assert_eq!(config.playback.interval(), Duration::from_millis(500));
        assert_eq!(config.playback.timeout(), Duration::ZERO);
        assert_eq!(config.device.response_timeout_ms, 500);
        assert_eq!(config.render.rotation, RotationMapping::Mirrored);
        assert!(config.validate(false).is_ok());
    }

    #[test]
    fn test_device_required_for_the_real_lamp() {
        let mut config = CubeConfig::default();
        assert!(config.validate(true).is_err());

        config.device.address = "10.0.0.5".to_string();
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = CubeConfig::default();
        config.application.log_level = "loud".to_string();
        assert!(config.validate(false).is_err());

        let mut config = CubeConfig::default();
        config.scripts.extension = ".txt".to_string();
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_toml_file_then_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "cube.toml",
                r#"
                [application]
                log_format = "json"

                [device]
                address = "192.168.1.20"
                persistent = true

                [playback]
                interval_ms = 250

                [render]
                rotation = "clipped"
                rect_bounds = "normalized"
                "#,
            )?;
            jail.set_env("RUST_CUBE_PLAYBACK__TIMEOUT_SECS", "30");

            let config = CubeConfig::load(Some(Path::new("cube.toml"))).unwrap();
            assert_eq!(config.application.log_format, OutputFormat::Json);
            assert_eq!(config.device.address, "192.168.1.20");
            assert!(config.device.persistent);
            assert_eq!(config.device.smooth_ms, 200);
            assert_eq!(config.playback.interval_ms, 250);
            assert_eq!(config.playback.timeout_secs, 30);
            assert_eq!(config.render.rotation, RotationMapping::Clipped);
            Ok(())
        });
    }

    #[test]
    fn test_legacy_variables() {
        Jail::expect_with(|jail| {
            jail.set_env("YEELIGHT_ADDR", "lamp.local:55443");
            jail.set_env("YEELIGHT_SCRIPTS", "/srv/cube");

            let config = CubeConfig::load(Some(Path::new("missing.toml"))).unwrap();
            assert_eq!(config.device.address, "lamp.local:55443");
            assert_eq!(config.scripts.dir, PathBuf::from("/srv/cube"));
            Ok(())
        });
    }
}
