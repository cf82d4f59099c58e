use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use weatherapp_core::{
    Config, ConfigError, ConfigStore, DisplayKind, Operation, ProviderFailure, ProviderOptions,
};
use weatherapp_engine::{
    ClearReport, Fetcher, HttpFetcher, LocationBrowser, Orchestrator, PageCache, Prompt,
    RunTables, WeatherProvider,
};
use weatherapp_providers::ProviderKind;

use crate::cli::ShowArgs;

/// Configuration and page cache shared by every command
pub struct AppContext {
    store: ConfigStore,
    cache: PageCache,
}

impl AppContext {
    pub fn new(store: ConfigStore, fetcher: Arc<dyn Fetcher>) -> Self {
        let cache = PageCache::new(store.config().app.cache_path.clone(), fetcher);
        Self { store, cache }
    }

    /// Load the config at `config_path` (or the default path) and set up HTTP fetching
    pub fn open(config_path: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(path) => path,
            None => Config::default_path()?,
        };
        tracing::info!("Using config {}", path.display());

        let store = ConfigStore::open(path)?;
        let timeout = Duration::from_secs(store.config().app.request_timeout_secs);
        let fetcher = HttpFetcher::new(timeout)?;

        let app = Self::new(store, Arc::new(fetcher));
        tracing::debug!("Page cache at {}", app.cache.root().display());
        Ok(app)
    }

    pub fn config(&self) -> &Config {
        self.store.config()
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    pub fn build_provider(&self, title: &str) -> Result<Box<dyn WeatherProvider>, ConfigError> {
        let kind: ProviderKind = title.parse()?;
        kind.from_store(&self.store)
    }

    /// The named provider, or every provider (optionally only the shown ones)
    fn selected(
        &self,
        title: Option<&str>,
        shown_only: bool,
    ) -> Result<Vec<ProviderKind>, ConfigError> {
        match title {
            Some(title) => Ok(vec![title.parse()?]),
            None => Ok(ProviderKind::ALL
                .into_iter()
                .filter(|kind| !shown_only || self.config().provider_options(kind.title()).show)
                .collect()),
        }
    }

    /// Run the selected providers and collect their records
    pub fn show(&self, args: &ShowArgs) -> Result<RunTables> {
        let kinds = self.selected(args.provider.as_deref(), true)?;
        if kinds.is_empty() {
            tracing::warn!("No providers are marked as shown");
        }

        let mut providers = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let options = args.run_options(&self.config().provider_options(kind.title()));
            providers.push((kind.from_store(&self.store)?, options));
        }

        let tables = Orchestrator::new(&self.cache)
            .run_all(providers.iter().map(|(provider, options)| (provider.as_ref(), *options)));
        tracing::info!(
            "Run finished: {} records, {} failures",
            tables.reports().len(),
            tables.failures().len()
        );
        Ok(tables)
    }

    /// Browse the provider's location listing and store the chosen location
    pub fn configure_location(&mut self, title: &str, prompt: &mut dyn Prompt) -> Result<String> {
        let mut provider = self.build_provider(title)?;
        prompt.say(&format!(
            "{}: current location is {}",
            provider.title(),
            provider.config().location
        ))?;

        let start = provider.config().url_locations.clone();
        let descriptor = {
            let mut browser = LocationBrowser::new(&self.cache, &mut *prompt);
            let descriptor = provider
                .browse_location(&mut browser, 0, &start)
                .map_err(|e| ProviderFailure::new(provider.title(), Operation::BrowseLocation, e))?;
            tracing::debug!("Browsing took {} page loads", browser.fetch_count());
            descriptor
        };
        provider.set_location(descriptor);

        let location = provider.config().location.clone();
        self.store
            .save_provider_config(provider.title(), provider.config().clone())?;
        prompt.say(&format!("{}: location set to {}", provider.title(), location))?;
        tracing::info!("{} location set to {}", provider.title(), location);
        Ok(location)
    }

    /// Providers to browse locations for: the named one, or every shown one
    pub fn location_titles(&self, title: Option<&str>) -> Result<Vec<&'static str>> {
        Ok(self
            .selected(title, true)?
            .into_iter()
            .map(|kind| kind.title())
            .collect())
    }

    /// Ask which views each provider shows by default
    pub fn configure_options(
        &mut self,
        title: Option<&str>,
        prompt: &mut dyn Prompt,
    ) -> Result<()> {
        for kind in self.selected(title, false)? {
            let title = kind.title();
            let mut options = self.config().provider_options(title);
            options.show = ask_flag(prompt, &format!("Show {title}?"), options.show)?;
            options.next_day = ask_flag(
                prompt,
                &format!("Show the next-day forecast for {title}?"),
                options.next_day,
            )?;
            options.next_hours = ask_flag(
                prompt,
                &format!("Add the hourly forecast for {title}?"),
                options.next_hours,
            )?;
            set_options(self.store.config_mut(), title, options);
        }
        self.store.save()
    }

    /// Shown providers, one caching time for all of them, and the display type
    pub fn configure_app(&mut self, prompt: &mut dyn Prompt) -> Result<()> {
        for (n, kind) in ProviderKind::ALL.iter().enumerate() {
            let shown = self.config().provider_options(kind.title()).show;
            prompt.say(&format!(
                "{}. {}{}",
                n + 1,
                kind.title(),
                if shown { " (shown)" } else { "" }
            ))?;
        }
        let answer = prompt.ask("Enter the numbers of the providers to show, or S to skip:")?;
        match parse_selection(&answer, ProviderKind::ALL.len()) {
            Some(selected) => {
                for (n, kind) in ProviderKind::ALL.iter().enumerate() {
                    let mut options = self.config().provider_options(kind.title());
                    options.show = selected.contains(&(n + 1));
                    set_options(self.store.config_mut(), kind.title(), options);
                }
            }
            None => prompt.say("Shown providers unchanged")?,
        }

        let answer = prompt.ask("Cache time in minutes for all providers:")?;
        match answer.trim().parse::<u32>() {
            Ok(minutes) => self.store.config_mut().set_caching_time(minutes),
            Err(_) => prompt.say("Cache time unchanged")?,
        }

        let answer = prompt.ask("Display type: 1 - table, 2 - plain:")?;
        match answer.trim() {
            "1" => self.store.config_mut().app.display = DisplayKind::Table,
            "2" => self.store.config_mut().app.display = DisplayKind::Plain,
            _ => prompt.say("Display type unchanged")?,
        }

        self.store.save()?;
        tracing::info!("Application settings saved to {}", self.store.path().display());
        Ok(())
    }

    /// Remove the cache after confirmation
    pub fn clear_cache(&self, prompt: &mut dyn Prompt) -> Result<Option<ClearReport>> {
        Ok(self.cache.clear_confirmed(prompt)?)
    }

    /// One line per provider with its location and whether it is shown
    pub fn provider_lines(&self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for kind in ProviderKind::ALL {
            let provider = kind.from_store(&self.store)?;
            let options = self.config().provider_options(kind.title());
            lines.push(format!(
                "{}: {}{}",
                kind.title(),
                provider.config().location,
                if options.show { "" } else { " (hidden)" }
            ));
        }
        Ok(lines)
    }
}

/// 'y' sets, 'n' clears, anything else keeps `current`
fn ask_flag(prompt: &mut dyn Prompt, question: &str, current: bool) -> Result<bool> {
    let keep = if current { "y" } else { "n" };
    let answer = prompt.ask(&format!("{question} y/n, anything else keeps {keep}"))?;
    Ok(match answer.trim().to_ascii_lowercase().as_str() {
        "y" => true,
        "n" => false,
        _ => current,
    })
}

/// 1-based numbers separated by spaces or commas. `None` for a skip or bad input.
fn parse_selection(answer: &str, count: usize) -> Option<Vec<usize>> {
    let answer = answer.trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case("s") {
        return None;
    }
    answer
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<usize>().ok().filter(|n| (1..=count).contains(n)))
        .collect()
}

fn set_options(config: &mut Config, title: &str, options: ProviderOptions) {
    config.options.retain(|key, _| !key.eq_ignore_ascii_case(title));
    config.options.insert(title.to_string(), options);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use weatherapp_engine::testing::{CountingFetcher, ScriptedPrompt};

    const ROOT: &str = "https://www.accuweather.com/uk/browse-locations";
    const EUROPE: &str = "https://www.accuweather.com/uk/browse-locations/eur";
    const UKRAINE: &str = "https://www.accuweather.com/uk/browse-locations/eur/ua";
    const LVIV_REGION: &str = "https://www.accuweather.com/uk/browse-locations/eur/ua/46";
    const LVIV: &str = "https://www.accuweather.com/uk/ua/lviv/324561/weather-forecast/324561";

    fn listing(label: &str, href: &str) -> String {
        format!(r#"<ul class="articles"><li><a href="{href}"><em>{label}</em></a></li></ul>"#)
    }

    fn context(dir: &std::path::Path, fetcher: Arc<CountingFetcher>) -> AppContext {
        let mut config = Config::default();
        config.app.cache_path = dir.join("cache");
        AppContext::new(ConfigStore::new(dir.join("config.toml"), config), fetcher)
    }

    #[test]
    fn test_show_runs_only_shown_providers() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(CountingFetcher::new());
        let mut app = context(dir.path(), fetcher);
        set_options(
            app.store.config_mut(),
            "Sinoptik",
            ProviderOptions {
                show: false,
                ..ProviderOptions::default()
            },
        );

        // canned bodies are not HTML, so every run fails, but in order
        let tables = app.show(&ShowArgs::default()).unwrap();
        let failed: Vec<_> = tables.failures().iter().map(|f| f.provider.as_str()).collect();
        assert_eq!(failed, vec!["Accuweather", "RP5"]);

        let args = ShowArgs {
            provider: Some("sinoptik".to_string()),
            ..ShowArgs::default()
        };
        let tables = app.show(&args).unwrap();
        assert_eq!(tables.failures().len(), 1);
        assert_eq!(tables.failures()[0].provider, "Sinoptik");
    }

    #[test]
    fn test_show_rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let app = context(dir.path(), Arc::new(CountingFetcher::new()));
        let args = ShowArgs {
            provider: Some("gismeteo".to_string()),
            ..ShowArgs::default()
        };
        let err = app.show(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_configure_location_persists_choice() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(
            CountingFetcher::new()
                .with_page(ROOT, listing("Європа", EUROPE))
                .with_page(EUROPE, listing("Україна", UKRAINE))
                .with_page(UKRAINE, listing("Львівська область", LVIV_REGION))
                .with_page(LVIV_REGION, listing("Львів", LVIV)),
        );
        let mut app = context(dir.path(), fetcher.clone());
        let mut prompt = ScriptedPrompt::new(["Європа", "Україна", "Львівська область", "Львів"]);

        let location = app.configure_location("accuweather", &mut prompt).unwrap();

        assert_eq!(location, "Львів");
        assert_eq!(fetcher.calls(), 4);
        assert_eq!(prompt.messages()[0], "Accuweather: current location is Київ");

        let saved = Config::load_from(&dir.path().join("config.toml")).unwrap();
        let accuweather = saved.provider_config("Accuweather").unwrap();
        assert_eq!(accuweather.location, "Львів");
        assert_eq!(accuweather.url, LVIV);
        assert_eq!(saved.provider_config("RP5").unwrap().location, "Київ");
    }

    #[test]
    fn test_failed_browse_keeps_stored_location() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(CountingFetcher::new().with_page(ROOT, listing("Європа", EUROPE)));
        let mut app = context(dir.path(), fetcher);
        let mut prompt = ScriptedPrompt::new(["Атлантида"]);

        let err = app.configure_location("Accuweather", &mut prompt).unwrap_err();

        let failure = err.downcast_ref::<ProviderFailure>().unwrap();
        assert_eq!(failure.operation, Operation::BrowseLocation);
        assert!(!dir.path().join("config.toml").exists());
        assert_eq!(app.config().provider_config("Accuweather").unwrap().location, "Київ");
    }

    #[test]
    fn test_configure_options_answers() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = context(dir.path(), Arc::new(CountingFetcher::new()));
        let mut prompt = ScriptedPrompt::new(["n", "Y", "?"]);

        app.configure_options(Some("rp5"), &mut prompt).unwrap();

        let options = app.config().provider_options("RP5");
        assert!(!options.show);
        assert!(options.next_day);
        assert!(options.next_hours, "unrecognised answer keeps the stored value");
        assert!(dir.path().join("config.toml").exists());
    }

    #[test]
    fn test_configure_app() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = context(dir.path(), Arc::new(CountingFetcher::new()));
        let mut prompt = ScriptedPrompt::new(["1, 3", "15", "2"]);

        app.configure_app(&mut prompt).unwrap();

        let config = app.config();
        assert!(config.provider_options("Accuweather").show);
        assert!(!config.provider_options("RP5").show);
        assert!(config.provider_options("Sinoptik").show);
        assert!(config.providers.values().all(|p| p.caching_time == 15));
        assert_eq!(config.app.display, DisplayKind::Plain);
    }

    #[test]
    fn test_configure_app_skips_bad_answers() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = context(dir.path(), Arc::new(CountingFetcher::new()));
        let mut prompt = ScriptedPrompt::new(["S", "soon", "table"]);

        app.configure_app(&mut prompt).unwrap();

        let config = app.config();
        assert!(ProviderKind::ALL
            .iter()
            .all(|kind| config.provider_options(kind.title()).show));
        assert!(config.providers.values().all(|p| p.caching_time == 60));
        assert_eq!(config.app.display, DisplayKind::Table);
        assert!(prompt.messages().contains(&"Cache time unchanged".to_string()));
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("1 3", 3), Some(vec![1, 3]));
        assert_eq!(parse_selection("2,", 3), Some(vec![2]));
        assert_eq!(parse_selection("s", 3), None);
        assert_eq!(parse_selection("4", 3), None);
        assert_eq!(parse_selection("one", 3), None);
    }

    #[test]
    fn test_clear_cache_after_show() {
        let dir = tempfile::tempdir().unwrap();
        let app = context(dir.path(), Arc::new(CountingFetcher::new()));
        app.show(&ShowArgs::default()).unwrap();
        assert!(app.cache().root().exists());

        let report = app
            .clear_cache(&mut ScriptedPrompt::new(["y"]))
            .unwrap()
            .unwrap();
        assert_eq!(report.files_removed, 3);
        assert!(!app.cache().root().exists());
    }

    #[test]
    fn test_provider_lines() {
        let dir = tempfile::tempdir().unwrap();
        let app = context(dir.path(), Arc::new(CountingFetcher::new()));
        assert_eq!(
            app.provider_lines().unwrap(),
            vec!["Accuweather: Київ", "RP5: Київ", "Sinoptik: Київ"]
        );
    }

    #[test]
    fn test_built_provider_reads_stored_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = context(dir.path(), Arc::new(CountingFetcher::new()));
        let mut rp5 = app.store.load_provider_config("RP5").unwrap();
        rp5.url = "http://rp5.ua/lviv".to_string();
        app.store.save_provider_config("RP5", rp5).unwrap();

        let provider = app.build_provider("rp5").unwrap();
        assert_eq!(provider.config().url, "http://rp5.ua/lviv");

        let fetcher = Arc::new(CountingFetcher::new());
        let mut app = context(dir.path(), fetcher.clone());
        app.store = ConfigStore::open(dir.path().join("config.toml")).unwrap();
        let args = ShowArgs {
            provider: Some("RP5".to_string()),
            no_forecast: true,
            ..ShowArgs::default()
        };
        app.show(&args).unwrap();
        assert_eq!(fetcher.urls(), vec!["http://rp5.ua/lviv"]);
    }

    #[test]
    fn test_location_titles() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = context(dir.path(), Arc::new(CountingFetcher::new()));
        set_options(
            app.store.config_mut(),
            "RP5",
            ProviderOptions {
                show: false,
                ..ProviderOptions::default()
            },
        );
        assert_eq!(app.location_titles(None).unwrap(), vec!["Accuweather", "Sinoptik"]);
        assert_eq!(app.location_titles(Some("rp5")).unwrap(), vec!["RP5"]);
        assert!(app.location_titles(Some("meteo")).is_err());
    }
}
