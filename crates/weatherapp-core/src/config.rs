use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Default cache time-to-live in minutes
pub const DEFAULT_CACHING_TIME: u32 = 60;

/// Default network request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// How finished records are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    #[default]
    Table,
    Plain,
}

impl std::str::FromStr for DisplayKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "plain" => Ok(Self::Plain),
            other => Err(ConfigError::Invalid(format!("unknown display type '{other}'"))),
        }
    }
}

/// Application-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Directory holding cached pages
    pub cache_path: PathBuf,

    /// Default output format
    #[serde(default)]
    pub display: DisplayKind,

    /// Network request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("weatherapp"))
        .unwrap_or_else(|| PathBuf::from("Cache"))
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            display: DisplayKind::Table,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Persisted per-source state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Display title, also the lookup key
    pub title: String,

    /// Current conditions page
    pub url: String,

    /// Hourly forecast page
    pub url_hourly: String,

    /// Next-day forecast page
    pub url_next_day: String,

    /// Human-readable location name
    pub location: String,

    /// Root of the location listing used for browsing
    pub url_locations: String,

    /// Cache time-to-live in minutes
    #[serde(default = "default_caching_time")]
    pub caching_time: u32,
}

fn default_caching_time() -> u32 {
    DEFAULT_CACHING_TIME
}

/// Which views a provider shows when no flags are given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOptions {
    pub show: bool,
    pub next_day: bool,
    pub next_hours: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            show: true,
            next_day: false,
            next_hours: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    #[serde(default)]
    pub app: AppSettings,

    /// Source settings keyed by title
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Display options keyed by title
    #[serde(default = "default_options")]
    pub options: BTreeMap<String, ProviderOptions>,
}

fn default_providers() -> BTreeMap<String, ProviderConfig> {
    let rp5_url = "http://rp5.ua/%D0%9F%D0%BE%D0%B3%D0%BE%D0%B4%D0%B0_%D0%B2_%D0%9A%D0%B8%D1%94%D0%B2%D1%96";
    let sinoptik_url = "https://ua.sinoptik.ua/%D0%BF%D0%BE%D0%B3%D0%BE%D0%B4%D0%B0-%D0%BA%D0%B8%D1%97%D0%B2";

    let providers = [
        ProviderConfig {
            title: "Accuweather".to_string(),
            url: "https://www.accuweather.com/uk/ua/kyiv/324505/weather-forecast/324505"
                .to_string(),
            url_hourly:
                "https://www.accuweather.com/uk/ua/kyiv/324505/hourly-weather-forecast/324505"
                    .to_string(),
            url_next_day:
                "https://www.accuweather.com/uk/ua/kyiv/324505/daily-weather-forecast/324505?day=2"
                    .to_string(),
            location: "Київ".to_string(),
            url_locations: "https://www.accuweather.com/uk/browse-locations".to_string(),
            caching_time: DEFAULT_CACHING_TIME,
        },
        ProviderConfig {
            title: "RP5".to_string(),
            url: rp5_url.to_string(),
            url_hourly: rp5_url.to_string(),
            url_next_day: rp5_url.to_string(),
            location: "Київ".to_string(),
            url_locations:
                "http://rp5.ua/%D0%9F%D0%BE%D0%B3%D0%BE%D0%B4%D0%B0_%D0%B2_%D1%81%D0%B2%D1%96%D1%82%D1%96"
                    .to_string(),
            caching_time: DEFAULT_CACHING_TIME,
        },
        ProviderConfig {
            title: "Sinoptik".to_string(),
            url: sinoptik_url.to_string(),
            url_hourly: sinoptik_url.to_string(),
            url_next_day: sinoptik_url.to_string(),
            location: "Київ".to_string(),
            url_locations:
                "https://ua.sinoptik.ua/%D0%BF%D0%BE%D0%B3%D0%BE%D0%B4%D0%B0-%D1%94%D0%B2%D1%80%D0%BE%D0%BF%D0%B0"
                    .to_string(),
            caching_time: DEFAULT_CACHING_TIME,
        },
    ];

    providers
        .into_iter()
        .map(|p| (p.title.clone(), p))
        .collect()
}

fn default_options() -> BTreeMap<String, ProviderOptions> {
    default_providers()
        .into_keys()
        .map(|title| (title, ProviderOptions::default()))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppSettings::default(),
            providers: default_providers(),
            options: default_options(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        Self::load_from(path)
    }

    /// Load configuration from an existing file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_or_create(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create config directory")?;
            }
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the default path to the configuration file
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("weatherapp");

        Ok(config_dir.join("config.toml"))
    }

    /// Look up a provider's settings by title (case-insensitive)
    pub fn provider_config(&self, title: &str) -> Result<&ProviderConfig, ConfigError> {
        self.providers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(title))
            .map(|(_, cfg)| cfg)
            .ok_or_else(|| ConfigError::UnknownProvider(title.to_string()))
    }

    /// Replace a provider's settings
    pub fn set_provider_config(&mut self, title: &str, config: ProviderConfig) {
        let key = self
            .providers
            .keys()
            .find(|key| key.eq_ignore_ascii_case(title))
            .cloned()
            .unwrap_or_else(|| title.to_string());
        self.providers.insert(key, config);
    }

    /// Display options for a provider, defaulting when none are stored
    pub fn provider_options(&self, title: &str) -> ProviderOptions {
        self.options
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(title))
            .map(|(_, opts)| *opts)
            .unwrap_or_default()
    }

    /// Set one TTL for every provider
    pub fn set_caching_time(&mut self, minutes: u32) {
        for provider in self.providers.values_mut() {
            provider.caching_time = minutes;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.app.cache_path.as_os_str().is_empty() {
            result.add_error("app.cache_path", "Cache path must not be empty");
        }

        if self.app.request_timeout_secs == 0 {
            result.add_error(
                "app.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.providers.is_empty() {
            result.add_error("providers", "No providers configured");
        }

        for (key, provider) in &self.providers {
            let field = |name: &str| format!("providers.{key}.{name}");

            if provider.title.trim().is_empty() {
                result.add_error(field("title"), "Title must not be empty");
            }
            if provider.location.trim().is_empty() {
                result.add_error(field("location"), "Location must not be empty");
            }

            self.validate_url(&provider.url, &field("url"), &mut result);
            self.validate_url(&provider.url_hourly, &field("url_hourly"), &mut result);
            self.validate_url(&provider.url_next_day, &field("url_next_day"), &mut result);
            self.validate_url(&provider.url_locations, &field("url_locations"), &mut result);

            if provider.caching_time == 0 {
                result.add_warning(field("caching_time"), "Caching disabled (0 minutes)");
            } else if provider.caching_time > 1440 {
                result.add_warning(field("caching_time"), "Caching time is more than 24 hours");
            }
        }

        for title in self.options.keys() {
            if !self.providers.contains_key(title) {
                result.add_warning(
                    format!("options.{title}"),
                    "Options set for a provider that is not configured",
                );
            }
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }
}

/// Owns the configuration together with the file it persists to.
///
/// This is the load/save pair the engine uses for provider settings.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: Config,
}

impl ConfigStore {
    pub fn new(path: PathBuf, config: Config) -> Self {
        Self { path, config }
    }

    /// Open the store at `path`, creating a default config file if needed
    pub fn open(path: PathBuf) -> Result<Self> {
        let (config, _) = Config::load_validated(&path)?;
        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn load_provider_config(&self, title: &str) -> Result<ProviderConfig, ConfigError> {
        self.config.provider_config(title).cloned()
    }

    /// Store a provider's settings and write the whole config to disk
    pub fn save_provider_config(&mut self, title: &str, config: ProviderConfig) -> Result<()> {
        self.config.set_provider_config(title, config);
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        self.config.save_to(&self.path)?;
        tracing::debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}
