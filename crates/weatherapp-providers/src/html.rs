//! Extraction helpers shared by the scrapers.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;

use weatherapp_core::{PageKind, ParseError};
use weatherapp_engine::{WeatherField, WeatherRecord};

/// Characters escaped in scraped hrefs besides non-ASCII bytes.
/// Reserved URL characters and `%` are kept so absolute and already
/// encoded links survive.
const HREF: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

static INTEGER: OnceLock<Regex> = OnceLock::new();

/// Compile `pattern` into `cell` on first use.
///
/// Patterns are string literals in this crate; one that fails to compile is a
/// bug, not a page problem.
#[allow(clippy::expect_used)]
pub(crate) fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("built-in pattern must compile"))
}

/// Where a lookup runs, so a missing landmark can be reported precisely.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lookup<'p> {
    provider: &'p str,
    page: PageKind,
}

impl<'p> Lookup<'p> {
    pub(crate) fn new(provider: &'p str, page: PageKind) -> Self {
        Self { provider, page }
    }

    pub(crate) fn missing(&self, landmark: &str) -> ParseError {
        ParseError::new(self.provider, self.page, landmark)
    }

    fn selector(&self, css: &str) -> Result<Selector, ParseError> {
        Selector::parse(css).map_err(|_| self.missing(css))
    }

    /// First element under `scope` matching `css`
    pub(crate) fn find<'a>(
        &self,
        scope: ElementRef<'a>,
        css: &str,
    ) -> Result<ElementRef<'a>, ParseError> {
        let selector = self.selector(css)?;
        scope.select(&selector).next().ok_or_else(|| self.missing(css))
    }

    /// Every element under `scope` matching `css`, possibly none
    pub(crate) fn find_all<'a>(
        &self,
        scope: ElementRef<'a>,
        css: &str,
    ) -> Result<Vec<ElementRef<'a>>, ParseError> {
        let selector = self.selector(css)?;
        Ok(scope.select(&selector).collect())
    }

    pub(crate) fn attr<'a>(
        &self,
        element: ElementRef<'a>,
        name: &str,
    ) -> Result<&'a str, ParseError> {
        element
            .value()
            .attr(name)
            .ok_or_else(|| self.missing(&format!("{} attribute", name)))
    }

    /// First signed integer in the element's text
    pub(crate) fn integer(
        &self,
        element: ElementRef<'_>,
        landmark: &str,
    ) -> Result<i64, ParseError> {
        first_integer(&text(element)).ok_or_else(|| self.missing(landmark))
    }

    /// Integer from each element; every one must hold a number
    pub(crate) fn integers(
        &self,
        elements: &[ElementRef<'_>],
        landmark: &str,
    ) -> Result<Vec<i64>, ParseError> {
        elements.iter().map(|el| self.integer(*el, landmark)).collect()
    }

    /// Max, min, average and window length of an hourly series
    pub(crate) fn summarize(
        &self,
        temperatures: &[i64],
        landmark: &str,
    ) -> Result<WeatherRecord, ParseError> {
        let (Some(max), Some(min)) = (temperatures.iter().max(), temperatures.iter().min()) else {
            return Err(self.missing(landmark));
        };
        let sum: i64 = temperatures.iter().sum();
        #[allow(clippy::cast_precision_loss)]
        let average = sum as f64 / temperatures.len() as f64;

        Ok(WeatherRecord::new()
            .with(WeatherField::HourlyMax, *max)
            .with(WeatherField::HourlyMin, *min)
            .with(WeatherField::HourlyAverage, average)
            .with(WeatherField::HorizonHours, temperatures.len()))
    }
}

/// Element text with whitespace runs collapsed to single spaces
pub(crate) fn text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First signed integer in `text`, accepting `+`, `-` and the typographic minus.
///
/// Unit suffixes and leading words are ignored: `"RealFeel® -3°"` gives -3.
pub(crate) fn first_integer(text: &str) -> Option<i64> {
    let found = compiled(&INTEGER, r"[+\-−]?\d+").find(text)?.as_str();
    let normalized = found.replacen('−', "-", 1).replacen('+', "", 1);
    normalized.parse().ok()
}

/// Percent-encode a scraped href
pub(crate) fn quote_href(href: &str) -> String {
    utf8_percent_encode(href.trim(), HREF).to_string()
}

/// Add a real-feel field when the source gives a number; a blank value is skipped.
pub(crate) fn set_optional(
    record: &mut WeatherRecord,
    field: WeatherField,
    element: Option<ElementRef<'_>>,
) {
    if let Some(value) = element.map(text).as_deref().and_then(first_integer) {
        record.set(field, value);
    }
}
