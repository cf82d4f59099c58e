//! rp5.ua
//!
//! Current, hourly and next-day data all live on one city page.

use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::OnceLock;

use weatherapp_core::{PageKind, ParseError, ProviderConfig};
use weatherapp_engine::{
    Choices, LocationDescriptor, Page, WeatherField, WeatherProvider, WeatherRecord,
};

use crate::html::{self, Lookup};

pub const TITLE: &str = "RP5";

pub const BASE_URL: &str = "http://rp5.ua";

const LEVELS: &[&str] = &["country", "region", "city"];

const FORECAST_TABLE: &str = "table#forecastTable_1";

static TOMORROW: OnceLock<Regex> = OnceLock::new();
static TOMORROW_CONDITION: OnceLock<Regex> = OnceLock::new();
static BOLD: OnceLock<Regex> = OnceLock::new();

pub struct Rp5 {
    config: ProviderConfig,
}

impl Rp5 {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

/// Absolute URL for a site-relative href
fn absolute(href: &str) -> String {
    let quoted = html::quote_href(href);
    if quoted.starts_with("http://") || quoted.starts_with("https://") {
        quoted
    } else if quoted.starts_with('/') {
        format!("{BASE_URL}{quoted}")
    } else {
        format!("{BASE_URL}/{quoted}")
    }
}

/// Row of the forecast table holding the link with `anchor_id`
fn forecast_row<'a>(
    lookup: &Lookup<'_>,
    root: ElementRef<'a>,
    anchor_id: &str,
) -> Result<ElementRef<'a>, ParseError> {
    let table = lookup.find(root, FORECAST_TABLE)?;
    let anchor = format!("a#{anchor_id}");
    for row in lookup.find_all(table, "tr")? {
        if lookup.find(row, &anchor).is_ok() {
            return Ok(row);
        }
    }
    Err(lookup.missing(&format!("{FORECAST_TABLE} {anchor}")))
}

/// Condition from the forecast table's third row, second cell.
///
/// The description sits in bold inside a tooltip attribute; plain cell
/// text is used when there is no tooltip.
fn condition(lookup: &Lookup<'_>, root: ElementRef<'_>) -> Result<String, ParseError> {
    let table = lookup.find(root, FORECAST_TABLE)?;
    let rows = lookup.find_all(table, "tr")?;
    let landmark = "forecast table condition cell";
    let cell = rows
        .get(2)
        .and_then(|row| row.children().filter_map(ElementRef::wrap).nth(1))
        .ok_or_else(|| lookup.missing(landmark))?;

    let tooltip = lookup
        .find_all(cell, "[onmouseover]")?
        .into_iter()
        .filter_map(|el| el.value().attr("onmouseover"))
        .find_map(|attr| {
            html::compiled(&BOLD, r"(?s)<b>(.*?)</b>")
                .captures(attr)
                .map(|c| c[1].trim().to_string())
        });

    match tooltip {
        Some(text) if !text.is_empty() => Ok(text),
        _ => {
            let text = html::text(cell);
            if text.is_empty() {
                Err(lookup.missing(landmark))
            } else {
                Ok(text)
            }
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl WeatherProvider for Rp5 {
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
        let root = doc.root_element();

        let temperature = lookup.integer(
            lookup.find(root, "div#ArchTemp span.t_0")?,
            "div#ArchTemp span.t_0",
        )?;

        let mut record = WeatherRecord::new()
            .with(WeatherField::Temperature, temperature)
            .with(WeatherField::Condition, condition(&lookup, root)?);

        let feel_row = forecast_row(&lookup, root, "f_temperature")?;
        let feel_cell = feel_row.children().filter_map(ElementRef::wrap).nth(1);
        let feel = feel_cell.map(|cell| lookup.find(cell, ".t_0").unwrap_or(cell));
        html::set_optional(&mut record, WeatherField::RealFeel, feel);

        Ok(record)
    }

    fn hourly(&self, page: &Page) -> Result<WeatherRecord, ParseError> {
        let lookup = Lookup::new(TITLE, PageKind::Hourly);
        let doc = Html::parse_document(&page.body);
        let row = forecast_row(&lookup, doc.root_element(), "t_temperature")?;

        let cells = lookup.find_all(row, "td div.t_0")?;
        let temperatures = lookup.integers(&cells, "td div.t_0")?;
        lookup.summarize(&temperatures, "td div.t_0")
    }

    /// Tomorrow's max, min and condition from the short text forecast
    fn next_day(&self, page: &Page) -> Result<WeatherRecord, ParseError> {
        let lookup = Lookup::new(TITLE, PageKind::NextDay);
        let doc = Html::parse_document(&page.body);
        let forecast = html::text(lookup.find(doc.root_element(), "div#forecastShort-content")?);

        let sentence = html::compiled(&TOMORROW, r"Завтра.*?\.(\s|$)")
            .find(&forecast)
            .map(|m| m.as_str().trim())
            .ok_or_else(|| lookup.missing("Завтра"))?;

        let numbers: Vec<i64> = sentence
            .split(|c: char| !(c.is_ascii_digit() || c == '+' || c == '-' || c == '−'))
            .filter_map(html::first_integer)
            .collect();
        let [max, min, ..] = numbers[..] else {
            return Err(lookup.missing("tomorrow temperatures"));
        };

        let condition = html::compiled(&TOMORROW_CONDITION, r"°\s*[CF]\s*,\s*(.+?)\.?$")
            .captures(sentence)
            .map(|c| capitalize(c[1].trim()))
            .filter(|c| !c.is_empty())
            .ok_or_else(|| lookup.missing("tomorrow condition"))?;

        Ok(WeatherRecord::new()
            .with(WeatherField::NextDayTempMax, max)
            .with(WeatherField::NextDayTempMin, min)
            .with(WeatherField::NextDayCondition, condition))
    }

    fn location_levels(&self) -> &'static [&'static str] {
        LEVELS
    }

    /// Countries are labelled by link text, regions by link title, cities by link text.
    fn location_choices(&self, level: usize, page: &Page) -> Result<Choices, ParseError> {
        let lookup = Lookup::new(TITLE, PageKind::Locations(level));
        let doc = Html::parse_document(&page.body);
        let map = lookup.find(doc.root_element(), "div.countryMap")?;

        let (css, label_from_title) = match level {
            0 => ("div.country_map_links a", false),
            1 => ("a.href12", true),
            _ => ("a", false),
        };

        let mut choices = Choices::new();
        for link in lookup.find_all(map, css)? {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let label = if label_from_title {
                link.value().attr("title").map(str::trim).unwrap_or_default().to_string()
            } else {
                html::text(link)
            };
            if !label.is_empty() {
                choices.insert(label, absolute(href));
            }
        }
        Ok(choices)
    }

    fn resolve_location(&self, url: &str, label: &str) -> LocationDescriptor {
        LocationDescriptor::single_page(url, label)
    }
}
