//! accuweather.com

use scraper::Html;

use weatherapp_core::{PageKind, ParseError, ProviderConfig};
use weatherapp_engine::{
    Choices, LocationDescriptor, Page, WeatherField, WeatherProvider, WeatherRecord,
};

use crate::html::{self, Lookup};

pub const TITLE: &str = "Accuweather";

const LEVELS: &[&str] = &["continent", "country", "region", "city"];

/// Hours summarized from the hourly table
pub const HOURLY_WINDOW: usize = 8;

pub struct Accuweather {
    config: ProviderConfig,
}

impl Accuweather {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

impl WeatherProvider for Accuweather {
    fn title(&self) -> &str {
        TITLE
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ProviderConfig {
        &mut self.config
    }

    fn current(&self, page: &Page) -> Result<WeatherRecord, ParseError> {
        let lookup = Lookup::new(TITLE, PageKind::Current);
        let doc = Html::parse_document(&page.body);
        let panel = lookup.find(doc.root_element(), "div#feed-tabs.cityforecast")?;

        let temp_span = lookup.find(panel, "span.large-temp")?;
        let temperature = lookup.integer(temp_span, "span.large-temp")?;
        let condition = html::text(lookup.find(panel, "span.cond")?);

        let mut record = WeatherRecord::new()
            .with(WeatherField::Temperature, temperature)
            .with(WeatherField::Condition, condition);
        html::set_optional(
            &mut record,
            WeatherField::RealFeel,
            Some(lookup.find(panel, "span.realfeel")?),
        );
        Ok(record)
    }

    fn hourly(&self, page: &Page) -> Result<WeatherRecord, ParseError> {
        let lookup = Lookup::new(TITLE, PageKind::Hourly);
        let doc = Html::parse_document(&page.body);
        let table = lookup.find(doc.root_element(), "div.hourly-table.overview-hourly")?;

        let cells = lookup.find_all(table, "tbody tr span")?;
        // The window is always the full eight hours
        if cells.len() < HOURLY_WINDOW {
            return Err(lookup.missing("tbody tr span"));
        }
        let window: Vec<_> = cells.into_iter().take(HOURLY_WINDOW).collect();
        let temperatures = lookup.integers(&window, "tbody tr span")?;
        lookup.summarize(&temperatures, "tbody tr span")
    }

    fn next_day(&self, page: &Page) -> Result<WeatherRecord, ParseError> {
        let lookup = Lookup::new(TITLE, PageKind::NextDay);
        let doc = Html::parse_document(&page.body);
        let panel = lookup.find(doc.root_element(), "div#detail-day-night")?;
        let day = lookup.find(panel, "div.day")?;
        let night = lookup.find(panel, "div.night")?;

        let mut record = WeatherRecord::new()
            .with(
                WeatherField::NextDayTemp,
                lookup.integer(lookup.find(day, "span.large-temp")?, "day span.large-temp")?,
            )
            .with(WeatherField::NextDayCondition, html::text(lookup.find(day, "div.cond")?))
            .with(
                WeatherField::NextNightTemp,
                lookup.integer(lookup.find(night, "span.large-temp")?, "night span.large-temp")?,
            )
            .with(WeatherField::NextNightCondition, html::text(lookup.find(night, "div.cond")?));

        html::set_optional(
            &mut record,
            WeatherField::NextDayRealFeel,
            Some(lookup.find(day, "span.realfeel")?),
        );
        html::set_optional(
            &mut record,
            WeatherField::NextNightRealFeel,
            Some(lookup.find(night, "span.realfeel")?),
        );
        Ok(record)
    }

    fn location_levels(&self) -> &'static [&'static str] {
        LEVELS
    }

    fn location_choices(&self, level: usize, page: &Page) -> Result<Choices, ParseError> {
        let lookup = Lookup::new(TITLE, PageKind::Locations(level));
        let doc = Html::parse_document(&page.body);
        let list = lookup.find(doc.root_element(), "ul.articles")?;

        let mut choices = Choices::new();
        for link in lookup.find_all(list, "a")? {
            if let Some(href) = link.value().attr("href") {
                choices.insert(html::text(link), html::quote_href(href));
            }
        }
        Ok(choices)
    }

    /// Sibling views are derived from the city URL without fetching.
    fn resolve_location(&self, url: &str, label: &str) -> LocationDescriptor {
        LocationDescriptor {
            url: url.to_string(),
            url_hourly: url.replace("weather-forecast", "hourly-weather-forecast"),
            url_next_day: format!(
                "{}?day=2",
                url.replace("weather-forecast", "daily-weather-forecast")
            ),
            location: label.to_string(),
        }
    }
}
