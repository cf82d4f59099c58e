//! sinoptik.ua

use scraper::{ElementRef, Html};

use weatherapp_core::{PageKind, ParseError, ProviderConfig};
use weatherapp_engine::{
    Choices, LocationDescriptor, Page, WeatherField, WeatherProvider, WeatherRecord,
};

use crate::html::{self, Lookup};

pub const TITLE: &str = "Sinoptik";

const LEVELS: &[&str] = &["continent", "country", "region", "city"];

pub struct Sinoptik {
    config: ProviderConfig,
}

impl Sinoptik {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

/// Links are protocol-relative
fn absolute(href: &str) -> String {
    let quoted = html::quote_href(href);
    if quoted.starts_with("http://") || quoted.starts_with("https://") {
        quoted
    } else {
        format!("https:{quoted}")
    }
}

/// Element holding the links of a listing level
fn listing<'a>(
    lookup: &Lookup<'_>,
    root: ElementRef<'a>,
    level: usize,
) -> Result<ElementRef<'a>, ParseError> {
    match level {
        0 => lookup.find(lookup.find(root, "div.mapRightCol")?, "div"),
        1 | 2 => lookup.find(lookup.find(root, "div.maxHeight")?, "div"),
        _ => lookup.find(root, "div.mapBotCol div.clearfix"),
    }
}

impl WeatherProvider for Sinoptik {
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
        let left = lookup.find(root, "div.lSide")?;

        let icon = lookup.find(left, "div.img img")?;
        let condition = lookup.attr(icon, "alt")?.trim().to_string();
        let temperature = lookup.integer(lookup.find(left, "p.today-temp")?, "p.today-temp")?;

        let mut record = WeatherRecord::new()
            .with(WeatherField::Temperature, temperature)
            .with(WeatherField::Condition, condition);

        let feel = lookup.find(root, "div.rSide tr.temperatureSens td.p1")?;
        html::set_optional(&mut record, WeatherField::RealFeel, Some(feel));
        Ok(record)
    }

    fn hourly(&self, page: &Page) -> Result<WeatherRecord, ParseError> {
        let lookup = Lookup::new(TITLE, PageKind::Hourly);
        let doc = Html::parse_document(&page.body);
        let row = lookup.find(doc.root_element(), "table.weatherDetails tr.temperature")?;

        let cells = lookup.find_all(row, "td")?;
        let temperatures = lookup.integers(&cells, "tr.temperature td")?;
        lookup.summarize(&temperatures, "tr.temperature td")
    }

    fn next_day(&self, page: &Page) -> Result<WeatherRecord, ParseError> {
        let lookup = Lookup::new(TITLE, PageKind::NextDay);
        let doc = Html::parse_document(&page.body);
        let block = lookup.find(doc.root_element(), "div#bd2")?;

        let icon = lookup.find(block, r#"div[class*="weatherIco"]"#)?;
        let condition = lookup.attr(icon, "title")?.trim().to_string();
        let max = lookup.integer(lookup.find(block, "div.max span")?, "div.max span")?;
        let min = lookup.integer(lookup.find(block, "div.min span")?, "div.min span")?;

        Ok(WeatherRecord::new()
            .with(WeatherField::NextDayTempMax, max)
            .with(WeatherField::NextDayTempMin, min)
            .with(WeatherField::NextDayCondition, condition))
    }

    fn location_levels(&self) -> &'static [&'static str] {
        LEVELS
    }

    fn location_choices(&self, level: usize, page: &Page) -> Result<Choices, ParseError> {
        let lookup = Lookup::new(TITLE, PageKind::Locations(level));
        let doc = Html::parse_document(&page.body);
        let list = listing(&lookup, doc.root_element(), level)?;

        let mut choices = Choices::new();
        for link in lookup.find_all(list, "a")? {
            if let Some(href) = link.value().attr("href") {
                choices.insert(html::text(link), absolute(href));
            }
        }
        Ok(choices)
    }

    fn resolve_location(&self, url: &str, label: &str) -> LocationDescriptor {
        LocationDescriptor::single_page(url, label)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use weatherapp_engine::FieldValue;

    fn provider() -> Sinoptik {
        Sinoptik::new(weatherapp_core::Config::default().providers["Sinoptik"].clone())
    }

    const CITY: &str = r#"
        <div id="bd2" class="main">
          <p class="day-link">Вівторок</p>
          <div class="weatherIco d300" title="Хмарно, невеликий дощ"></div>
          <div class="temperature">
            <div class="min">мін. <span>+2°</span></div>
            <div class="max">макс. <span>+9°</span></div>
          </div>
        </div>
        <div class="lSide">
          <div class="img"> <img src="//sinst.fwdcdn.com/img/d300.gif" alt="Хмарно"> </div>
          <p class="today-temp">+6°C</p>
        </div>
        <div class="rSide">
          <table class="weatherDetails">
            <tr class="temperature"><td class="p1">+5°</td><td class="p2">+7°</td><td class="p3">+6°</td><td class="p4">+3°</td></tr>
            <tr class="temperatureSens"><td class="p1">+2°</td><td class="p2">+4°</td></tr>
          </table>
        </div>"#;

    #[test]
    fn test_current_conditions() {
        let record = provider().current(&Page::new("u", CITY)).unwrap();
        assert_eq!(record.get(WeatherField::Temperature), Some(&FieldValue::Integer(6)));
        assert_eq!(record.get(WeatherField::RealFeel), Some(&FieldValue::Integer(2)));
        assert_eq!(
            record.get(WeatherField::Condition),
            Some(&FieldValue::Text("Хмарно".to_string()))
        );
    }

    #[test]
    fn test_hourly_uses_every_column() {
        let record = provider().hourly(&Page::new("u", CITY)).unwrap();
        assert_eq!(record.get(WeatherField::HourlyMax), Some(&FieldValue::Integer(7)));
        assert_eq!(record.get(WeatherField::HourlyMin), Some(&FieldValue::Integer(3)));
        assert_eq!(record.get(WeatherField::HourlyAverage), Some(&FieldValue::Decimal(5.25)));
        assert_eq!(record.get(WeatherField::HorizonHours), Some(&FieldValue::Integer(4)));
    }

    #[test]
    fn test_next_day() {
        let record = provider().next_day(&Page::new("u", CITY)).unwrap();
        assert_eq!(record.get(WeatherField::NextDayTempMax), Some(&FieldValue::Integer(9)));
        assert_eq!(record.get(WeatherField::NextDayTempMin), Some(&FieldValue::Integer(2)));
        assert_eq!(
            record.get(WeatherField::NextDayCondition),
            Some(&FieldValue::Text("Хмарно, невеликий дощ".to_string()))
        );
    }

    #[test]
    fn test_next_day_without_block_names_landmark() {
        let err = provider().next_day(&Page::new("u", "<div id=\"bd1\"></div>")).unwrap_err();
        assert_eq!(err.landmark, "div#bd2");
        assert_eq!(err.page, PageKind::NextDay);
    }

    #[test]
    fn test_listing_containers_per_level() {
        let continents = r#"<div class="mapRightCol"><div>
            <a href="//ua.sinoptik.ua/погода-європа">Європа</a>
            <a href="//ua.sinoptik.ua/погода-азія">Азія</a></div><div><a href="/x">Інше</a></div></div>"#;
        let choices = provider().location_choices(0, &Page::new("u", continents)).unwrap();
        assert_eq!(choices.labels().collect::<Vec<_>>(), vec!["Європа", "Азія"]);
        assert!(choices.get("Європа").unwrap().starts_with("https://ua.sinoptik.ua/%D0%BF"));

        let regions = r#"<div class="maxHeight"><div><a href="//ua.sinoptik.ua/погода-київська-область">Київська область</a></div></div>"#;
        let choices = provider().location_choices(2, &Page::new("u", regions)).unwrap();
        assert_eq!(choices.len(), 1);

        let cities = r#"<div class="mapBotCol"><div class="clearfix">
            <a href="//ua.sinoptik.ua/погода-київ">Київ</a></div></div>"#;
        let choices = provider().location_choices(3, &Page::new("u", cities)).unwrap();
        assert_eq!(
            choices.get("Київ"),
            Some(weatherapp_core::Config::default().providers["Sinoptik"].url.as_str())
        );
    }
}
