//! In-memory doubles for the network, the terminal and a source.
//!
//! Used by the test suites of this workspace; nothing here touches the
//! network or stdin.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::io;

use weatherapp_core::{NetworkError, PageKind, ParseError, ProviderConfig};

use crate::browse::{Choices, LocationNode};
use crate::fetch::Fetcher;
use crate::prompt::Prompt;
use crate::provider::WeatherProvider;
use crate::types::{FieldValue, LocationDescriptor, Page, WeatherField, WeatherRecord};

/// Fetcher that counts requests.
///
/// URLs registered with `with_page` return their canned body; any other URL
/// returns `"<url>#<n>"` where `n` is the 1-based request number.
#[derive(Debug, Default)]
pub struct CountingFetcher {
    pages: HashMap<String, String>,
    failing: bool,
    requested: Mutex<Vec<String>>,
}

impl CountingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request fails with a connection error
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().len()
    }

    /// Requested URLs in order
    pub fn urls(&self) -> Vec<String> {
        self.requested.lock().clone()
    }

    /// Body returned for the `n`-th request when `url` has no canned page
    pub fn body_for(&self, url: &str, n: usize) -> Vec<u8> {
        format!("{url}#{n}").into_bytes()
    }
}

impl Fetcher for CountingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let n = {
            let mut requested = self.requested.lock();
            requested.push(url.to_string());
            requested.len()
        };

        if self.failing {
            return Err(NetworkError::ConnectionFailed {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        Ok(match self.pages.get(url) {
            Some(body) => body.clone().into_bytes(),
            None => self.body_for(url, n),
        })
    }
}

/// Prompt answering from a fixed script.
///
/// Running out of answers behaves like closed input.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    shown: Vec<LocationNode>,
    messages: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Levels presented through `choose`
    pub fn shown(&self) -> &[LocationNode] {
        &self.shown
    }

    /// Questions and messages written, in order
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    fn next_answer(&mut self) -> io::Result<String> {
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted answer left")
        })
    }
}

impl Prompt for ScriptedPrompt {
    fn choose(&mut self, node: &LocationNode) -> io::Result<String> {
        self.shown.push(node.clone());
        self.next_answer()
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        self.messages.push(question.to_string());
        Ok(self.next_answer()?.eq_ignore_ascii_case("y"))
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        self.messages.push(question.to_string());
        self.next_answer()
    }

    fn say(&mut self, message: &str) -> io::Result<()> {
        self.messages.push(message.to_string());
        Ok(())
    }
}

/// Source over a plain-text page format.
///
/// Weather pages hold `Field=value` pairs separated by `;` where `Field` is
/// the `WeatherField` variant name. Listing pages hold `label=url` pairs.
/// A page containing `broken` fails extraction.
#[derive(Debug, Clone)]
pub struct FakeProvider {
    config: ProviderConfig,
    levels: &'static [&'static str],
}

impl FakeProvider {
    pub fn new(levels: &'static [&'static str]) -> Self {
        Self::titled("Fake", levels)
    }

    pub fn titled(title: &str, levels: &'static [&'static str]) -> Self {
        let slug = title.to_lowercase();
        Self {
            config: ProviderConfig {
                title: title.to_string(),
                url: format!("{slug}/current"),
                url_hourly: format!("{slug}/hourly"),
                url_next_day: format!("{slug}/next"),
                location: "Kyiv".to_string(),
                url_locations: format!("{slug}/browse"),
                caching_time: 60,
            },
            levels,
        }
    }

    fn record(&self, page: &Page, kind: PageKind) -> Result<WeatherRecord, ParseError> {
        if page.body.contains("broken") {
            return Err(ParseError::new(self.title(), kind, "weather block"));
        }
        Ok(pairs(&page.body)
            .filter_map(|(name, value)| {
                let field = WeatherField::ALL
                    .into_iter()
                    .find(|field| format!("{field:?}") == name)?;
                let value = match value.parse::<i64>() {
                    Ok(number) => FieldValue::Integer(number),
                    Err(_) => FieldValue::Text(value.to_string()),
                };
                Some((field, value))
            })
            .collect())
    }
}

fn pairs(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
}

impl WeatherProvider for FakeProvider {
    fn title(&self) -> &str {
        &self.config.title
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ProviderConfig {
        &mut self.config
    }

    fn current(&self, page: &Page) -> Result<WeatherRecord, ParseError> {
        self.record(page, PageKind::Current)
    }

    fn hourly(&self, page: &Page) -> Result<WeatherRecord, ParseError> {
        self.record(page, PageKind::Hourly)
    }

    fn next_day(&self, page: &Page) -> Result<WeatherRecord, ParseError> {
        self.record(page, PageKind::NextDay)
    }

    fn location_levels(&self) -> &'static [&'static str] {
        self.levels
    }

    fn location_choices(&self, level: usize, page: &Page) -> Result<Choices, ParseError> {
        if page.body.contains("broken") {
            return Err(ParseError::new(self.title(), PageKind::Locations(level), "list"));
        }
        Ok(pairs(&page.body)
            .map(|(label, url)| (label.to_string(), url.to_string()))
            .collect())
    }

    fn resolve_location(&self, url: &str, label: &str) -> LocationDescriptor {
        LocationDescriptor::single_page(url, label)
    }
}
