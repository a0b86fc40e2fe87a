//! Layered configuration loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;

use super::Config;
use crate::error::{CardgenError, Result};

/// Environment tag used when neither the caller nor `APP_ENV` supplies one.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// Directory searched for configuration files when `CONFIG_DIR` is unset.
pub const DEFAULT_CONFIG_DIR: &str = "./config";

const CONFIG_FILE_SUFFIX: &str = "toml";

/// Source of environment variables.
pub trait EnvSource {
    /// Value of `key`, or `None` when it is unset.
    fn var(&self, key: &str) -> Option<String>;

    /// Value of `key` when it is set to something other than whitespace.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key).filter(|value| !value.trim().is_empty())
    }

    /// Value of `key` when it parses as a strictly positive integer.
    fn positive<T>(&self, key: &str) -> Option<T>
    where
        T: FromStr + PartialOrd + Default,
    {
        self.non_empty(key)
            .and_then(|value| value.trim().parse::<T>().ok())
            .filter(|value| *value > T::default())
    }
}

/// Reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl EnvSource for HashMap<&str, &str> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).map(|value| value.to_string())
    }
}

/// Builds a [`Config`] from defaults, an optional TOML file and environment
/// overrides, then validates it.
///
/// The file is looked up at `<CONFIG_DIR>/config.<env>.toml`.
#[derive(Debug, Clone)]
pub struct ConfigLoader<E: EnvSource = ProcessEnv> {
    env: E,
}

impl<E: EnvSource> ConfigLoader<E> {
    pub fn new(env: E) -> Self {
        Self { env }
    }

    /// Load and validate the configuration for `environment`.
    ///
    /// When `environment` is `None`, `APP_ENV` is consulted, then
    /// [`DEFAULT_ENVIRONMENT`].
    ///
    /// # Errors
    ///
    /// Returns `CardgenError::ConfigFileInvalid` if the file exists but cannot
    /// be read or parsed, and `CardgenError::ConfigInvalid` if the merged
    /// configuration violates a constraint.
    pub fn load(&self, environment: Option<&str>) -> Result<Config> {
        let mut config = Config::default();

        let path = self.config_path(environment);
        if path.is_file() {
            debug!("loading config file {}", path.display());
            config = merge_file(&config, &path)?;
        } else {
            debug!("no config file at {}, using defaults", path.display());
        }

        self.apply_environment(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Location of the configuration file for `environment`.
    pub fn config_path(&self, environment: Option<&str>) -> PathBuf {
        let environment = environment
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.env.non_empty("APP_ENV"))
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        let dir = self
            .env
            .non_empty("CONFIG_DIR")
            .unwrap_or_else(|| DEFAULT_CONFIG_DIR.to_string());
        PathBuf::from(dir).join(format!("config.{}.{}", environment, CONFIG_FILE_SUFFIX))
    }

    fn apply_environment(&self, config: &mut Config) -> Result<()> {
        let env = &self.env;

        // Server
        if let Some(port) = env.positive("SERVER_PORT") {
            config.server.port = port;
        }
        if let Some(host) = env.non_empty("SERVER_HOST") {
            config.server.host = host;
        }
        if let Some(app_env) = env.non_empty("APP_ENV") {
            config.server.environment = app_env;
        }

        // Database
        if let Some(db_type) = self.enumerated("DB_TYPE", "database.type")? {
            config.database.db_type = db_type;
        }
        if let Some(host) = env.non_empty("DB_HOST") {
            config.database.host = host;
        }
        if let Some(port) = env.positive("DB_PORT") {
            config.database.port = port;
        }
        if let Some(name) = env.non_empty("DB_NAME") {
            config.database.name = name;
        }
        if let Some(user) = env.non_empty("DB_USER") {
            config.database.user = user;
        }
        if let Some(password) = env.non_empty("DB_PASSWORD") {
            config.database.password = password;
        }
        if let Some(ssl_mode) = env.non_empty("DB_SSL_MODE") {
            config.database.ssl_mode = ssl_mode;
        }

        // Storage
        if let Some(storage_type) = self.enumerated("STORAGE_TYPE", "storage.type")? {
            config.storage.storage_type = storage_type;
        }
        if let Some(path) = env.non_empty("STORAGE_BASE_PATH") {
            config.storage.base_path = PathBuf::from(path);
        }
        if let Some(path) = env.non_empty("OUTPUT_DIR") {
            config.storage.output_dir = PathBuf::from(path);
        }
        if let Some(path) = env.non_empty("IMAGE_DIR") {
            config.storage.image_dir = PathBuf::from(path);
        }

        // Generator
        if let Some(width) = env.positive("GENERATOR_IMAGE_WIDTH") {
            config.generator.image_width = width;
        }
        if let Some(height) = env.positive("GENERATOR_IMAGE_HEIGHT") {
            config.generator.image_height = height;
        }
        if let Some(format) = env.non_empty("GENERATOR_FORMAT") {
            config.generator.format = format;
        }
        if let Some(path) = env.non_empty("TEMPLATES_PATH") {
            config.generator.templates_path = PathBuf::from(path);
        }
        if let Some(path) = env.non_empty("FONTS_PATH") {
            config.generator.fonts_path = PathBuf::from(path);
        }

        // Logging
        if let Some(level) = self.enumerated("LOG_LEVEL", "logging.level")? {
            config.logging.level = level;
        }
        if let Some(format) = env.non_empty("LOG_FORMAT") {
            config.logging.format = format;
        }
        if let Some(output) = env.non_empty("LOG_OUTPUT") {
            config.logging.output = output;
        }

        Ok(())
    }

    fn enumerated<T>(&self, key: &str, field: &str) -> Result<Option<T>>
    where
        T: FromStr<Err = String>,
    {
        match self.env.non_empty(key) {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|reason| CardgenError::config_invalid(field, reason)),
            None => Ok(None),
        }
    }
}

impl Default for ConfigLoader<ProcessEnv> {
    fn default() -> Self {
        Self::new(ProcessEnv)
    }
}

/// Overlay the fields present in the TOML file at `path` onto `base`.
fn merge_file(base: &Config, path: &Path) -> Result<Config> {
    let file_error = |reason: String| CardgenError::ConfigFileInvalid {
        path: path.display().to_string(),
        reason,
    };

    let contents = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    let overlay: toml::Table = toml::from_str(&contents).map_err(|e| file_error(e.to_string()))?;

    let mut merged = match toml::Value::try_from(base).map_err(|e| file_error(e.to_string()))? {
        toml::Value::Table(table) => table,
        other => {
            return Err(file_error(format!(
                "expected defaults to form a table, found {}",
                other.type_str()
            )))
        }
    };
    merge_tables(&mut merged, overlay);

    toml::Value::Table(merged)
        .try_into::<Config>()
        .map_err(|e| file_error(e.to_string()))
}

/// Recursively copy every key of `overlay` into `base`; nested tables are
/// merged key by key rather than replaced.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
