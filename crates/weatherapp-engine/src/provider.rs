use weatherapp_core::{AppError, ParseError, ProviderConfig};

use crate::browse::{Choices, LocationBrowser};
use crate::types::{LocationDescriptor, Page, WeatherRecord};

/// Capability set every weather source implements.
///
/// Extraction methods work on an already fetched page and fail with a
/// `ParseError` naming the missing landmark rather than inventing values.
pub trait WeatherProvider {
    /// Display title, also the configuration key
    fn title(&self) -> &str;

    fn config(&self) -> &ProviderConfig;

    fn config_mut(&mut self) -> &mut ProviderConfig;

    /// Current temperature, condition and real-feel
    fn current(&self, page: &Page) -> Result<WeatherRecord, ParseError>;

    /// Max, min and average over the page's hourly window plus its length
    fn hourly(&self, page: &Page) -> Result<WeatherRecord, ParseError>;

    /// Next day (and night, where the source has it) forecast
    fn next_day(&self, page: &Page) -> Result<WeatherRecord, ParseError>;

    /// Labels of the location hierarchy levels, root first.
    /// The last level is terminal.
    fn location_levels(&self) -> &'static [&'static str];

    /// Map of displayed label to child URL on a listing page at `level`
    fn location_choices(&self, level: usize, page: &Page) -> Result<Choices, ParseError>;

    /// Build the descriptor for a terminal selection without further fetches
    fn resolve_location(&self, url: &str, label: &str) -> LocationDescriptor;

    /// Walk the hierarchy from `level`, starting at the listing `start_url`
    fn browse_location(
        &self,
        browser: &mut LocationBrowser<'_>,
        level: usize,
        start_url: &str,
    ) -> Result<LocationDescriptor, AppError> {
        browser.browse(self, level, start_url)
    }

    /// Replace the active URLs and location name
    fn set_location(&mut self, descriptor: LocationDescriptor) {
        let config = self.config_mut();
        config.url = descriptor.url;
        config.url_hourly = descriptor.url_hourly;
        config.url_next_day = descriptor.url_next_day;
        config.location = descriptor.location;
    }
}
