//! Recursive descent through a source's location hierarchy.
//!
//! Each level fetches one listing page, asks for one selection and either
//! descends with the selected URL or, at the terminal level, resolves the
//! location descriptor. Depth is fixed per source so recursion always ends.

use weatherapp_core::{AppError, NavigationError};

use crate::cache::PageCache;
use crate::prompt::Prompt;
use crate::provider::WeatherProvider;
use crate::types::LocationDescriptor;

/// Ordered label to URL mapping shown at one level.
///
/// Page order is kept; a repeated label keeps its first position and the
/// last URL seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Choices {
    entries: Vec<(String, String)>,
}

impl Choices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, url: impl Into<String>) {
        let label = label.into();
        let url = url.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == label) {
            Some(entry) => entry.1 = url,
            None => self.entries.push((label, url)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, url)| url.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(label, url)| (label.as_str(), url.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Choices {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut choices = Self::new();
        for (label, url) in iter {
            choices.insert(label, url);
        }
        choices
    }
}

/// One level of the hierarchy as presented to the user
#[derive(Debug, Clone)]
pub struct LocationNode {
    pub level: usize,
    /// What the level holds, e.g. "country"
    pub label: String,
    /// Listing page the choices came from
    pub url: String,
    pub choices: Choices,
}

pub struct LocationBrowser<'a> {
    cache: &'a PageCache,
    prompt: &'a mut dyn Prompt,
    fetches: usize,
}

impl<'a> LocationBrowser<'a> {
    pub fn new(cache: &'a PageCache, prompt: &'a mut dyn Prompt) -> Self {
        Self {
            cache,
            prompt,
            fetches: 0,
        }
    }

    /// Listing pages loaded so far in this session
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Browse from `level` using the listing at `url`.
    ///
    /// A selection missing from the level's choices ends the session with
    /// `NavigationError::UnknownChoice`; nothing further is fetched.
    pub fn browse<P>(
        &mut self,
        provider: &P,
        level: usize,
        url: &str,
    ) -> Result<LocationDescriptor, AppError>
    where
        P: WeatherProvider + ?Sized,
    {
        let levels = provider.location_levels();
        let Some(level_label) = levels.get(level) else {
            return Err(NavigationError::LevelOutOfRange {
                level,
                depth: levels.len(),
            }
            .into());
        };

        tracing::debug!("{}: browsing {} list at {}", provider.title(), level_label, url);

        let page = self
            .cache
            .with_ttl_minutes(provider.config().caching_time)
            .load_page(url, false)?;
        self.fetches += 1;

        let choices = provider.location_choices(level, &page)?;
        if choices.is_empty() {
            return Err(NavigationError::EmptyLevel {
                level_label: level_label.to_string(),
                url: url.to_string(),
            }
            .into());
        }

        let node = LocationNode {
            level,
            label: level_label.to_string(),
            url: url.to_string(),
            choices,
        };

        let selection = self.prompt.choose(&node).map_err(NavigationError::Input)?;
        let Some(child_url) = node.choices.get(&selection) else {
            tracing::error!("{}: wrong {} name '{}'", provider.title(), level_label, selection);
            return Err(NavigationError::UnknownChoice {
                level_label: level_label.to_string(),
                choice: selection,
            }
            .into());
        };

        if level + 1 < levels.len() {
            return self.browse(provider, level + 1, child_url);
        }

        let descriptor = provider.resolve_location(child_url, &selection);
        tracing::info!(
            "{}: resolved location {} ({})",
            provider.title(),
            descriptor.location,
            descriptor.url
        );
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::testing::{CountingFetcher, FakeProvider, ScriptedPrompt};
    use std::sync::Arc;

    fn three_level_site() -> Arc<CountingFetcher> {
        Arc::new(
            CountingFetcher::new()
                .with_page("root", "Ukraine=url1;Poland=urlP")
                .with_page("url1", "Kyiv region=url2;Lviv region=urlL")
                .with_page("url2", "Kyiv=url3;Bila Tserkva=url4"),
        )
    }

    #[test]
    fn test_three_level_scenario_resolves_after_three_fetches() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = three_level_site();
        let cache = PageCache::new(dir.path(), fetcher.clone());
        let provider = FakeProvider::new(&["country", "region", "city"]);
        let mut prompt = ScriptedPrompt::new(["Ukraine", "Kyiv region", "Kyiv"]);

        let mut browser = LocationBrowser::new(&cache, &mut prompt);
        let descriptor = provider.browse_location(&mut browser, 0, "root").unwrap();

        assert_eq!(descriptor.location, "Kyiv");
        assert_eq!(descriptor.url, "url3");
        assert_eq!(browser.fetch_count(), 3);
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(fetcher.urls(), vec!["root", "url1", "url2"]);
    }

    #[test]
    fn test_levels_are_labelled_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PageCache::new(dir.path(), three_level_site());
        let provider = FakeProvider::new(&["country", "region", "city"]);
        let mut prompt = ScriptedPrompt::new(["Poland"]);

        let mut browser = LocationBrowser::new(&cache, &mut prompt);
        let _ = provider.browse_location(&mut browser, 0, "root");

        let shown = prompt.shown();
        assert_eq!(shown[0].label, "country");
        assert_eq!(shown[0].choices.labels().collect::<Vec<_>>(), vec!["Ukraine", "Poland"]);
    }

    #[test]
    fn test_unknown_choice_fails_without_further_fetches() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = three_level_site();
        let cache = PageCache::new(dir.path(), fetcher.clone());
        let provider = FakeProvider::new(&["country", "region", "city"]);
        let mut prompt = ScriptedPrompt::new(["Ukraine", "Crimea", "Kyiv"]);

        let mut browser = LocationBrowser::new(&cache, &mut prompt);
        let err = provider.browse_location(&mut browser, 0, "root").unwrap_err();

        match err {
            AppError::Navigation(NavigationError::UnknownChoice { level_label, choice }) => {
                assert_eq!(level_label, "region");
                assert_eq!(choice, "Crimea");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(browser.fetch_count(), 2);
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_browse_can_start_mid_hierarchy() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = three_level_site();
        let cache = PageCache::new(dir.path(), fetcher.clone());
        let provider = FakeProvider::new(&["country", "region", "city"]);
        let mut prompt = ScriptedPrompt::new(["Bila Tserkva"]);

        let mut browser = LocationBrowser::new(&cache, &mut prompt);
        let descriptor = provider.browse_location(&mut browser, 2, "url2").unwrap();

        assert_eq!(descriptor.location, "Bila Tserkva");
        assert_eq!(descriptor.url, "url4");
        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_level_beyond_depth_is_rejected_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = three_level_site();
        let cache = PageCache::new(dir.path(), fetcher.clone());
        let provider = FakeProvider::new(&["country", "region", "city"]);
        let mut prompt = ScriptedPrompt::new(Vec::<&str>::new());

        let mut browser = LocationBrowser::new(&cache, &mut prompt);
        let err = provider.browse_location(&mut browser, 3, "url3").unwrap_err();

        assert!(matches!(
            err,
            AppError::Navigation(NavigationError::LevelOutOfRange { level: 3, depth: 3 })
        ));
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn test_empty_listing_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(CountingFetcher::new().with_page("root", ""));
        let cache = PageCache::new(dir.path(), fetcher);
        let provider = FakeProvider::new(&["country", "city"]);
        let mut prompt = ScriptedPrompt::new(["Ukraine"]);

        let mut browser = LocationBrowser::new(&cache, &mut prompt);
        let err = provider.browse_location(&mut browser, 0, "root").unwrap_err();
        assert!(matches!(
            err,
            AppError::Navigation(NavigationError::EmptyLevel { .. })
        ));
    }

    #[test]
    fn test_listing_pages_are_cached_between_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = three_level_site();
        let cache = PageCache::new(dir.path(), fetcher.clone());
        let provider = FakeProvider::new(&["country", "region", "city"]);

        for _ in 0..2 {
            let mut prompt = ScriptedPrompt::new(["Ukraine", "Kyiv region", "Kyiv"]);
            let mut browser = LocationBrowser::new(&cache, &mut prompt);
            provider.browse_location(&mut browser, 0, "root").unwrap();
            assert_eq!(browser.fetch_count(), 3);
        }
        assert_eq!(fetcher.calls(), 3);
    }

    #[test]
    fn test_choices_keep_first_position_and_last_url() {
        let choices = Choices::from_iter([
            ("A".to_string(), "1".to_string()),
            ("B".to_string(), "2".to_string()),
            ("A".to_string(), "3".to_string()),
        ]);
        assert_eq!(choices.len(), 2);
        assert_eq!(choices.get("A"), Some("3"));
        assert_eq!(choices.labels().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
