//! Concrete weather sources and the registry that builds them from configuration.

pub mod accuweather;
mod html;
pub mod rp5;
pub mod sinoptik;

use std::fmt;
use std::str::FromStr;

use weatherapp_core::{Config, ConfigError, ConfigStore, ProviderConfig};
use weatherapp_engine::WeatherProvider;

pub use accuweather::Accuweather;
pub use rp5::Rp5;
pub use sinoptik::Sinoptik;

/// The supported sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderKind {
    Accuweather,
    Rp5,
    Sinoptik,
}

impl ProviderKind {
    /// All sources in title order
    pub const ALL: [ProviderKind; 3] = [Self::Accuweather, Self::Rp5, Self::Sinoptik];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Accuweather => accuweather::TITLE,
            Self::Rp5 => rp5::TITLE,
            Self::Sinoptik => sinoptik::TITLE,
        }
    }

    /// Case-insensitive lookup by title
    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.title().eq_ignore_ascii_case(title.trim()))
    }

    pub fn build(&self, config: ProviderConfig) -> Box<dyn WeatherProvider> {
        match self {
            Self::Accuweather => Box::new(Accuweather::new(config)),
            Self::Rp5 => Box::new(Rp5::new(config)),
            Self::Sinoptik => Box::new(Sinoptik::new(config)),
        }
    }

    /// Built-in settings for this source
    pub fn default_config(&self) -> Result<ProviderConfig, ConfigError> {
        Config::default().provider_config(self.title()).cloned()
    }

    /// Build from the settings held by `store`, falling back to the built-in ones
    pub fn from_store(&self, store: &ConfigStore) -> Result<Box<dyn WeatherProvider>, ConfigError> {
        let settings = match store.load_provider_config(self.title()) {
            Ok(settings) => settings,
            Err(ConfigError::UnknownProvider(_)) => {
                tracing::warn!("No settings stored for {}, using defaults", self.title());
                self.default_config()?
            }
            Err(e) => return Err(e),
        };
        Ok(self.build(settings))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_title(s).ok_or_else(|| ConfigError::UnknownProvider(s.to_string()))
    }
}
