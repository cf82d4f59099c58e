//! Drives one provider from fetch to finished record.

use serde::Serialize;

use weatherapp_core::{AppError, Operation, ProviderFailure, ProviderOptions};

use crate::cache::PageCache;
use crate::provider::WeatherProvider;
use crate::types::WeatherRecord;

/// What to retrieve for one provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub next_day: bool,
    pub hourly: bool,
    pub force_refresh: bool,
}

impl RunOptions {
    /// Options persisted for a provider, used when the command line is silent
    pub fn from_provider_options(options: &ProviderOptions, force_refresh: bool) -> Self {
        Self {
            next_day: options.next_day,
            hourly: options.next_hours,
            force_refresh,
        }
    }
}

/// A finished record with its display title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub provider: String,
    pub title: String,
    pub record: WeatherRecord,
}

/// Records and failures collected during one run, in run order.
#[derive(Debug, Default)]
pub struct RunTables {
    reports: Vec<Report>,
    failures: Vec<ProviderFailure>,
}

impl RunTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a report; one with the same title replaces the earlier one
    pub fn insert(&mut self, report: Report) {
        match self.reports.iter_mut().find(|r| r.title == report.title) {
            Some(existing) => *existing = report,
            None => self.reports.push(report),
        }
    }

    pub fn record(&mut self, outcome: Result<Report, ProviderFailure>) {
        match outcome {
            Ok(report) => self.insert(report),
            Err(failure) => self.failures.push(failure),
        }
    }

    pub fn get(&self, title: &str) -> Option<&WeatherRecord> {
        self.reports
            .iter()
            .find(|r| r.title == title)
            .map(|r| &r.record)
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn failures(&self) -> &[ProviderFailure] {
        &self.failures
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

pub struct Orchestrator<'a> {
    cache: &'a PageCache,
}

impl<'a> Orchestrator<'a> {
    pub fn new(cache: &'a PageCache) -> Self {
        Self { cache }
    }

    /// Fetch, extract and merge for one provider.
    ///
    /// With `next_day` only the next-day page is used. Otherwise the current
    /// page seeds the record and, with `hourly`, the hourly summary is merged in.
    pub fn run<P>(&self, provider: &P, options: RunOptions) -> Result<Report, ProviderFailure>
    where
        P: WeatherProvider + ?Sized,
    {
        let config = provider.config();
        let cache = self.cache.with_ttl_minutes(config.caching_time);
        let fail = |operation: Operation, err: AppError| {
            ProviderFailure::new(provider.title(), operation, err)
        };

        let (title, record) = if options.next_day {
            tracing::debug!("{}: next-day forecast from {}", provider.title(), config.url_next_day);
            let page = cache
                .load_page(&config.url_next_day, options.force_refresh)
                .map_err(|e| fail(Operation::NextDay, e))?;
            let record = provider
                .next_day(&page)
                .map_err(|e| fail(Operation::NextDay, e.into()))?;
            (
                format!("{}, next-day forecast, {}", provider.title(), config.location),
                record,
            )
        } else {
            tracing::debug!("{}: current weather from {}", provider.title(), config.url);
            let page = cache
                .load_page(&config.url, options.force_refresh)
                .map_err(|e| fail(Operation::Current, e))?;
            let mut record = provider
                .current(&page)
                .map_err(|e| fail(Operation::Current, e.into()))?;

            if options.hourly {
                tracing::debug!("{}: hourly forecast from {}", provider.title(), config.url_hourly);
                let page = cache
                    .load_page(&config.url_hourly, options.force_refresh)
                    .map_err(|e| fail(Operation::Hourly, e))?;
                let hourly = provider
                    .hourly(&page)
                    .map_err(|e| fail(Operation::Hourly, e.into()))?;
                let added = record.merge(hourly);
                tracing::debug!("{}: merged {} hourly fields", provider.title(), added);
            }

            (
                format!("{}, current weather, {}", provider.title(), config.location),
                record,
            )
        };

        tracing::info!("{}: {} fields", title, record.len());
        Ok(Report {
            provider: provider.title().to_string(),
            title,
            record,
        })
    }

    /// Run every provider in turn; one failing does not stop the others.
    pub fn run_all<'p, P, I>(&self, providers: I) -> RunTables
    where
        P: WeatherProvider + ?Sized + 'p,
        I: IntoIterator<Item = (&'p P, RunOptions)>,
    {
        let mut tables = RunTables::new();
        for (provider, options) in providers {
            let outcome = self.run(provider, options);
            if let Err(failure) = &outcome {
                tracing::error!("{}", failure);
            }
            tables.record(outcome);
        }
        tables
    }
}
