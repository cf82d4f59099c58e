mod app;
mod cli;
mod export;
mod render;

use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;

use weatherapp_engine::StdioPrompt;

use app::AppContext;
use cli::{Cli, Command, ShowArgs};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let debug = cli.debug;
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", error_report(&err, debug));
            ExitCode::FAILURE
        }
    }
}

/// One line naming the failure, or the whole cause chain with `--debug`
fn error_report(err: &anyhow::Error, debug: bool) -> String {
    if debug {
        format!("Error: {err:?}")
    } else {
        format!("Error: {err}")
    }
}

fn run(cli: Cli) -> Result<()> {
    weatherapp_core::init(cli.verbose)?;

    let mut app = AppContext::open(cli.config.clone())?;
    let mut prompt = StdioPrompt::stdio();

    if cli.clear_cache {
        if let Some(report) = app.clear_cache(&mut prompt)? {
            println!(
                "Removed {} cache files and {}",
                report.files_removed,
                app.cache().root().display()
            );
        }
        return Ok(());
    }

    match cli.command {
        None => show(&app, &ShowArgs::default()),
        Some(Command::Show(args)) => show(&app, &args),
        Some(Command::Configure { provider, location }) => {
            if location {
                for title in app.location_titles(provider.as_deref())? {
                    app.configure_location(title, &mut prompt)?;
                }
                Ok(())
            } else {
                app.configure_options(provider.as_deref(), &mut prompt)
            }
        }
        Some(Command::ConfigureApp) => app.configure_app(&mut prompt),
        Some(Command::Providers) => {
            for line in app.provider_lines()? {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn show(app: &AppContext, args: &ShowArgs) -> Result<()> {
    let tables = app.show(args)?;
    let display = args.display.unwrap_or(app.config().app.display);

    for report in tables.reports() {
        println!("{}", render::render(display, &report.title, &report.record));
    }
    for failure in tables.failures() {
        eprintln!("{}: {}", failure.provider, failure.user_message());
    }

    if let Some(path) = &args.csv {
        let saved = export::save_csv(&tables, path)?;
        println!("Saved to {}", saved.display());
    }
    if let Some(path) = &args.save {
        let saved = export::save_text(&tables, display, path)?;
        println!("Saved to {}", saved.display());
    }

    if tables.is_empty() && !tables.failures().is_empty() {
        bail!("No weather could be retrieved");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use anyhow::Context;

    fn failure() -> anyhow::Error {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        Err::<(), _>(io).context("Could not save config").unwrap_err()
    }

    #[test]
    fn test_error_report_without_debug_is_one_line() {
        assert_eq!(error_report(&failure(), false), "Error: Could not save config");
    }

    #[test]
    fn test_debug_error_report_shows_causes() {
        let report = error_report(&failure(), true);
        assert!(report.starts_with("Error: Could not save config"));
        assert!(report.contains("Caused by:"));
        assert!(report.contains("access denied"));
    }
}
