//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use crate::port::OpenMode;
use crate::settings::BaudRate;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIALCTL";

const CONFIG_FILE_NAME: &str = "serialctl.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIALCTL_CONFIG";

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using the standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIALCTL_CONFIG` environment variable (explicit path)
    /// 2. `./serialctl.toml` (current directory)
    /// 3. `serialctl.toml` in the platform config directory
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values in every case.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };
        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Defaults plus environment overrides; malformed overrides are ignored.
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        if let Err(e) = apply_env_overrides(&mut config) {
            debug!("Ignoring environment override: {}", e);
        }

        Self {
            config_path: None,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        debug!("{} points to missing file {}", CONFIG_PATH_ENV, path.display());
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Platform config directory for serialctl, e.g. `~/.config/serialctl`.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "serialctl").map(|dirs| dirs.config_dir().to_path_buf())
}

pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!("Loading configuration from {}", path.display());
    toml::from_str(&content).map_err(ConfigError::ParseError)
}

fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn env_var(key: &str) -> Option<(String, String)> {
    let name = format!("{}_{}", ENV_PREFIX, key);
    std::env::var(&name).ok().map(|value| (name, value))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Variables follow the pattern `SERIALCTL_<SECTION>_<KEY>`, e.g.
/// `SERIALCTL_SERIAL_DEVICE=/dev/ttyUSB0` or `SERIALCTL_LOGGING_LEVEL=debug`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    if let Some((_, val)) = env_var("SERIAL_DEVICE") {
        config.serial.device = Some(val);
    }
    if let Some((var, val)) = env_var("SERIAL_BAUD_RATE") {
        let rate = val
            .parse::<u32>()
            .ok()
            .and_then(|rate| BaudRate::new(rate).ok())
            .ok_or_else(|| ConfigError::env_parse(var, "Invalid or unsupported baud rate"))?;
        config.serial.line.baud_rate = Some(rate);
    }
    if let Some((var, val)) = env_var("SERIAL_AUTO_FLUSH") {
        config.serial.auto_flush =
            parse_bool(&val).ok_or_else(|| ConfigError::env_parse(var, "Expected true or false"))?;
    }
    if let Some((var, val)) = env_var("SERIAL_REPLY_WAIT_MS") {
        config.serial.reply_wait_ms = val
            .parse()
            .map_err(|_| ConfigError::env_parse(var, "Invalid wait in milliseconds"))?;
    }
    if let Some((var, val)) = env_var("SERIAL_LINE_TIMEOUT_MS") {
        config.serial.line_timeout_ms = Some(
            val.parse()
                .map_err(|_| ConfigError::env_parse(var, "Invalid timeout in milliseconds"))?,
        );
    }

    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some((var, val)) = env_var("LOGGING_FORMAT") {
        config.logging.format = val.parse().map_err(|e: String| ConfigError::env_parse(var, e))?;
    }

    Ok(())
}

fn validate(config: &Config) -> ConfigResult<()> {
    OpenMode::parse(&config.serial.open_mode)
        .map_err(|e| ConfigError::validation("serial.open_mode", e.to_string()))?;

    if config.serial.line_timeout_ms == Some(0) {
        return Err(ConfigError::validation(
            "serial.line_timeout_ms",
            "must be greater than zero",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use serial_test::serial;
    use std::env;
    use std::io::Write;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert!(loader.config_path.is_none());
        assert_eq!(loader.config().serial.reply_wait_ms, 100);
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("SERIALCTL_SERIAL_DEVICE", "/dev/ttyACM0");
        env::set_var("SERIALCTL_SERIAL_BAUD_RATE", "57600");
        env::set_var("SERIALCTL_LOGGING_FORMAT", "compact");

        let loader = ConfigLoader::with_defaults();
        let config = loader.config();
        assert_eq!(config.serial.device.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.serial.line.baud_rate.map(|b| b.get()), Some(57600));
        assert_eq!(config.logging.format, LogFormat::Compact);

        env::remove_var("SERIALCTL_SERIAL_DEVICE");
        env::remove_var("SERIALCTL_SERIAL_BAUD_RATE");
        env::remove_var("SERIALCTL_LOGGING_FORMAT");
    }

    #[test]
    #[serial]
    fn test_bad_env_override_is_an_error() {
        env::set_var("SERIALCTL_SERIAL_BAUD_RATE", "12345");
        let mut config = Config::default();
        let result = apply_env_overrides(&mut config);
        env::remove_var("SERIALCTL_SERIAL_BAUD_RATE");

        assert!(matches!(result, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[serial]
device = "modem"
reply_wait_ms = 250

[serial.port_aliases]
modem = "/dev/ttyUSB1"
"#
        )
        .unwrap();

        let loader = ConfigLoader::load_from(file.path()).unwrap();
        assert_eq!(loader.config_path.as_deref(), Some(file.path()));
        assert_eq!(loader.config().serial.reply_wait_ms, 250);
        assert_eq!(
            loader.config().serial.default_device().as_deref(),
            Some("/dev/ttyUSB1")
        );
    }

    #[test]
    #[serial]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::load_from(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    #[serial]
    fn test_invalid_open_mode_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[serial]\nopen_mode = \"rw\"").unwrap();

        let result = ConfigLoader::load_from(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    #[serial]
    fn test_explicit_path_env_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();

        env::set_var(CONFIG_PATH_ENV, &path);
        let loader = ConfigLoader::load();
        env::remove_var(CONFIG_PATH_ENV);

        let loader = loader.unwrap();
        assert_eq!(loader.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(loader.config().logging.level, "debug");
    }

    #[test]
    #[serial]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut loader = ConfigLoader::with_defaults();
        loader.config.serial.open_mode = "w".to_string();
        loader.save_to(&path).unwrap();

        let reloaded = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(reloaded.config().serial.open_mode, "w");
    }
}
