//! Application configuration.
//!
//! A [`Config`] is assembled in three layers of ascending priority:
//! built-in defaults, an optional TOML file and environment overrides.
//! Priority is resolved per field: a field only present in the file keeps
//! its file value even when sibling fields are overridden by the
//! environment. See [`ConfigLoader`] for the loading algorithm.

mod loader;

pub use loader::{ConfigLoader, EnvSource, ProcessEnv, DEFAULT_CONFIG_DIR, DEFAULT_ENVIRONMENT};

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CardgenError, Result};

/// Declares a closed set of lowercase configuration values.
macro_rules! config_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every permitted value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The configuration spelling of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
                $(
                    if value.trim().eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                let allowed: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                Err(format!("'{}' is not one of {}", value, allowed.join(", ")))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

config_enum! {
    /// Database backend kinds.
    DatabaseType {
        Memory => "memory",
        Postgres => "postgres",
        Sqlite => "sqlite",
        File => "file",
    }
}

config_enum! {
    /// Card storage backend kinds.
    StorageType {
        Memory => "memory",
        File => "file",
        S3 => "s3",
        Gcs => "gcs",
    }
}

config_enum! {
    /// Minimum severity that is logged.
    LogLevel {
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

impl LogLevel {
    /// Convert to the `log` crate's filter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub generator: GeneratorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u32,
    pub host: String,
    /// Seconds
    pub read_timeout: u64,
    /// Seconds
    pub write_timeout: u64,
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "localhost".to_string(),
            read_timeout: 30,
            write_timeout: 30,
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub db_type: DatabaseType,
    pub host: String,
    pub port: u32,
    pub name: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: String,
    pub max_conns: u32,
    pub max_idle: u32,
    /// Seconds
    pub max_lifetime: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::Memory,
            host: "localhost".to_string(),
            port: 5432,
            name: "cardgen".to_string(),
            user: "cardgen".to_string(),
            password: String::new(),
            ssl_mode: "disable".to_string(),
            max_conns: 10,
            max_idle: 5,
            max_lifetime: 300,
        }
    }
}

impl DatabaseConfig {
    /// Backend-specific connection string.
    ///
    /// Empty for backends that do not take one.
    pub fn connection_string(&self) -> String {
        match self.db_type {
            DatabaseType::Postgres => format!(
                "host={} port={} user={} password={} dbname={} sslmode={}",
                self.host, self.port, self.user, self.password, self.name, self.ssl_mode
            ),
            DatabaseType::Sqlite => format!("file:{}?cache=shared&mode=rwc", self.name),
            DatabaseType::Memory | DatabaseType::File => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    pub base_path: PathBuf,
    pub output_dir: PathBuf,
    pub image_dir: PathBuf,
    pub temp_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::File,
            base_path: PathBuf::from("./data"),
            output_dir: PathBuf::from("./output"),
            image_dir: PathBuf::from("./output/images"),
            temp_dir: PathBuf::from("./tmp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub image_width: u32,
    pub image_height: u32,
    pub dpi: u32,
    pub quality: u32,
    pub format: String,
    pub templates_path: PathBuf,
    pub fonts_path: PathBuf,
    pub default_font: String,
    pub parallel_jobs: u32,
    pub enable_caching: bool,
    pub cache_directory: PathBuf,
    pub text_rendering: TextRenderingConfig,
    pub art_processing: ArtProcessingConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            image_width: 750,
            image_height: 1050,
            dpi: 300,
            quality: 95,
            format: "png".to_string(),
            templates_path: PathBuf::from("./templates"),
            fonts_path: PathBuf::from("./fonts"),
            default_font: "arial.ttf".to_string(),
            parallel_jobs: 4,
            enable_caching: true,
            cache_directory: PathBuf::from("./cache"),
            text_rendering: TextRenderingConfig::default(),
            art_processing: ArtProcessingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRenderingConfig {
    pub default_font_size: f64,
    pub line_spacing: f64,
    pub default_color: String,
    pub anti_aliasing: bool,
    pub font_cache: bool,
    pub custom_fonts: BTreeMap<String, String>,
}

impl Default for TextRenderingConfig {
    fn default() -> Self {
        Self {
            default_font_size: 12.0,
            line_spacing: 1.2,
            default_color: "#000000".to_string(),
            anti_aliasing: true,
            font_cache: true,
            custom_fonts: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtProcessingConfig {
    pub enable_placeholder: bool,
    pub placeholder_color: String,
    pub resize_algorithm: String,
    pub enable_filters: bool,
    pub default_filter: String,
    /// Bytes
    pub max_image_size: u64,
}

impl Default for ArtProcessingConfig {
    fn default() -> Self {
        Self {
            enable_placeholder: true,
            placeholder_color: "#CCCCCC".to_string(),
            resize_algorithm: "lanczos".to_string(),
            enable_filters: false,
            default_filter: "none".to_string(),
            max_image_size: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// `json` or `text`
    pub format: String,
    /// `stdout`, `stderr` or `file`
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    /// Megabytes
    pub max_size: u32,
    pub max_backups: u32,
    /// Days
    pub max_age: u32,
    pub compress: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: "json".to_string(),
            output: "stdout".to_string(),
            file_path: None,
            max_size: 100,
            max_backups: 3,
            max_age: 28,
            compress: true,
        }
    }
}

impl Config {
    /// Load configuration for `environment` from the process environment.
    ///
    /// Shorthand for `ConfigLoader::new(ProcessEnv).load(environment)`.
    pub fn load(environment: Option<&str>) -> Result<Self> {
        ConfigLoader::new(ProcessEnv).load(environment)
    }

    /// Check every constraint a loaded configuration must satisfy.
    ///
    /// # Errors
    ///
    /// Returns `CardgenError::ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 || self.server.port > 65535 {
            return Err(CardgenError::config_invalid(
                "server.port",
                format!("{} is outside 1..65535", self.server.port),
            ));
        }
        if self.server.host.trim().is_empty() {
            return Err(CardgenError::config_invalid(
                "server.host",
                "cannot be empty",
            ));
        }
        if self.generator.image_width == 0 {
            return Err(CardgenError::config_invalid(
                "generator.image_width",
                "must be greater than 0",
            ));
        }
        if self.generator.image_height == 0 {
            return Err(CardgenError::config_invalid(
                "generator.image_height",
                "must be greater than 0",
            ));
        }
        if self.generator.parallel_jobs == 0 {
            return Err(CardgenError::config_invalid(
                "generator.parallel_jobs",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Render the configuration as a TOML document.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CardgenError::config_invalid("config", format!("TOML error: {}", e)))
    }
}
