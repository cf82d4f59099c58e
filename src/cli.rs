use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use weatherapp_core::{DisplayKind, ProviderOptions};
use weatherapp_engine::RunOptions;

/// Current weather and forecasts from several weather sites
#[derive(Parser, Debug)]
#[command(name = "weatherapp", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file to use instead of the default one
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Remove cache files and directory, then exit
    #[arg(long)]
    pub clear_cache: bool,

    /// Print the full error chain when a command fails
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show weather from one provider, or every shown provider
    Show(ShowArgs),

    /// Set a provider's location or forecast options
    Configure {
        /// Provider title; every provider when omitted
        provider: Option<String>,

        /// Browse for a new location instead of setting options
        #[arg(long)]
        location: bool,
    },

    /// Choose shown providers, cache time and display type
    ConfigureApp,

    /// List available providers and their locations
    Providers,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ShowArgs {
    /// Provider title; every provider marked as shown when omitted
    pub provider: Option<String>,

    /// Next-day forecast instead of current weather
    #[arg(long)]
    pub next: bool,

    /// Add the hourly forecast to current weather
    #[arg(short = 'f', long, conflicts_with = "no_forecast")]
    pub forecast: bool,

    /// Current weather only
    #[arg(long)]
    pub no_forecast: bool,

    /// Ignore cached pages
    #[arg(long)]
    pub refresh: bool,

    /// Output format, overriding the configured one
    #[arg(short, long, value_name = "table|plain")]
    pub display: Option<DisplayKind>,

    /// Also write the records as CSV
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Also write the rendered output as text
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,
}

impl ShowArgs {
    fn has_forecast_flags(&self) -> bool {
        self.next || self.forecast || self.no_forecast
    }

    /// Flags from the command line, or the provider's stored options when none are given
    pub fn run_options(&self, stored: &ProviderOptions) -> RunOptions {
        if self.has_forecast_flags() {
            RunOptions {
                next_day: self.next,
                hourly: self.forecast,
                force_refresh: self.refresh,
            }
        } else {
            RunOptions::from_provider_options(stored, self.refresh)
        }
    }
}
