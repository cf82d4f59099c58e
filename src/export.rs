//! Saving a run's records to files.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use weatherapp_core::DisplayKind;
use weatherapp_engine::RunTables;

use crate::render;

/// `path` with `extension` added when it has none
fn with_default_extension(path: &Path, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(extension)
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One `title, ,` header row per record followed by its `field,value` rows
pub fn to_csv(tables: &RunTables) -> String {
    let mut out = String::new();
    for report in tables.reports() {
        out.push_str(&format!("{}, ,\n", csv_field(&report.title)));
        for (field, value) in report.record.iter() {
            out.push_str(&format!(
                "{},{}\n",
                csv_field(field.label()),
                csv_field(&value.to_string())
            ));
        }
    }
    out
}

/// Rendered text of every record, one block per record
pub fn to_text(tables: &RunTables, display: DisplayKind) -> String {
    tables
        .reports()
        .iter()
        .map(|report| format!("{}\n", render::render(display, &report.title, &report.record)))
        .collect()
}

pub fn save_csv(tables: &RunTables, path: &Path) -> Result<PathBuf> {
    let path = with_default_extension(path, "csv");
    fs::write(&path, to_csv(tables))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Saved {} records to {}", tables.reports().len(), path.display());
    Ok(path)
}

pub fn save_text(tables: &RunTables, display: DisplayKind, path: &Path) -> Result<PathBuf> {
    let path = with_default_extension(path, "txt");
    fs::write(&path, to_text(tables, display))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Saved {} records to {}", tables.reports().len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use weatherapp_engine::{Report, WeatherField, WeatherRecord};

    fn tables() -> RunTables {
        let mut tables = RunTables::new();
        tables.insert(Report {
            provider: "RP5".to_string(),
            title: "RP5, current weather, Київ".to_string(),
            record: WeatherRecord::new()
                .with(WeatherField::Temperature, 3)
                .with(WeatherField::Condition, "Хмарно, дощ"),
        });
        tables.insert(Report {
            provider: "Sinoptik".to_string(),
            title: "Sinoptik, next-day forecast, Київ".to_string(),
            record: WeatherRecord::new().with(WeatherField::NextDayTempMax, 9),
        });
        tables
    }

    #[test]
    fn test_csv_layout() {
        assert_eq!(
            to_csv(&tables()),
            "\"RP5, current weather, Київ\", ,\n\
             Температура,3\n\
             На небі,\"Хмарно, дощ\"\n\
             \"Sinoptik, next-day forecast, Київ\", ,\n\
             Максимальна вдень,9\n"
        );
    }

    #[test]
    fn test_save_adds_extensions() {
        let dir = tempfile::tempdir().unwrap();

        let csv = save_csv(&tables(), &dir.path().join("weather")).unwrap();
        assert_eq!(csv.extension().unwrap(), "csv");
        assert_eq!(fs::read_to_string(&csv).unwrap(), to_csv(&tables()));

        let txt =
            save_text(&tables(), DisplayKind::Plain, &dir.path().join("weather.out")).unwrap();
        assert_eq!(txt.extension().unwrap(), "out");
        let text = fs::read_to_string(&txt).unwrap();
        assert!(text.contains("На небі: Хмарно, дощ"));
        assert!(text.contains("Sinoptik, next-day forecast, Київ"));
    }
}
