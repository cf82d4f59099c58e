//! Page cache, provider contract, location browsing and orchestration.

pub mod browse;
pub mod cache;
pub mod fetch;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod types;

pub use browse::{Choices, LocationBrowser, LocationNode};
pub use cache::{CacheEntry, ClearReport, PageCache};
pub use fetch::{Fetcher, HttpFetcher};
pub use orchestrator::{Orchestrator, Report, RunOptions, RunTables};
pub use prompt::{Prompt, StdioPrompt};
pub use provider::WeatherProvider;
pub use types::{FieldValue, LocationDescriptor, Page, WeatherField, WeatherRecord};
