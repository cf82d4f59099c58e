//! Terminal rendering of finished records.

use weatherapp_core::DisplayKind;
use weatherapp_engine::{FieldValue, WeatherField, WeatherRecord};

const DEGREES: &str = "°C";

/// Label and printable value for every present field, in print order.
///
/// Blank text values are skipped.
pub fn printable(record: &WeatherRecord) -> Vec<(&'static str, String)> {
    record
        .iter()
        .filter(|(_, value)| !matches!(value, FieldValue::Text(text) if text.trim().is_empty()))
        .map(|(field, value)| (field.label(), format_value(field, value)))
        .collect()
}

fn format_value(field: WeatherField, value: &FieldValue) -> String {
    if field.is_temperature() {
        format!("{value} {DEGREES}")
    } else {
        value.to_string()
    }
}

pub fn render(kind: DisplayKind, title: &str, record: &WeatherRecord) -> String {
    match kind {
        DisplayKind::Table => table(title, record),
        DisplayKind::Plain => plain(title, record),
    }
}

/// Boxed two-column table with the title centred on top
pub fn table(title: &str, record: &WeatherRecord) -> String {
    let rows = printable(record);

    let width_of = |s: &str| s.chars().count();
    let left = rows.iter().map(|(label, _)| width_of(label)).max().unwrap_or(0) + 2;
    let mut right = rows.iter().map(|(_, value)| width_of(value)).max().unwrap_or(0) + 2;
    let title_len = width_of(title);
    if title_len > left + right {
        right = title_len - left;
    }
    let width = left + right + 1;

    let rule = format!("+{}+{}+\n", "-".repeat(left), "-".repeat(right));
    let mut out = String::new();
    out.push_str(&format!("+{}+\n", "-".repeat(width)));
    out.push_str(&format!("|{:^width$}|\n", title));
    out.push_str(&rule);
    for (label, value) in &rows {
        out.push_str(&format!(
            "| {:<lw$}| {:<rw$}|\n",
            label,
            value,
            lw = left - 1,
            rw = right - 1
        ));
    }
    out.push_str(&rule);
    out
}

/// Title followed by one `label: value` line per field
pub fn plain(title: &str, record: &WeatherRecord) -> String {
    let mut out = format!("\n{title}\n");
    for (label, value) in printable(record) {
        out.push_str(&format!("\n{label}: {value}"));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    fn record() -> WeatherRecord {
        WeatherRecord::new()
            .with(WeatherField::Condition, "Хмарно")
            .with(WeatherField::Temperature, 12)
            .with(WeatherField::HourlyAverage, 11.75)
    }

    #[test]
    fn test_printable_follows_print_order_and_units() {
        let rows = printable(&record());
        assert_eq!(
            rows,
            vec![
                ("Температура", "12 °C".to_string()),
                ("На небі", "Хмарно".to_string()),
                ("Середня", "11.8 °C".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_text_is_skipped() {
        let record = WeatherRecord::new()
            .with(WeatherField::Temperature, 1)
            .with(WeatherField::Condition, "  ");
        assert_eq!(printable(&record).len(), 1);
    }

    #[test]
    fn test_table_lines_have_equal_width() {
        let out = table("RP5, current weather, Київ", &record());
        let widths: Vec<_> = out.lines().map(|line| line.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{out}");
        assert!(out.lines().nth(1).unwrap().contains("RP5, current weather, Київ"));
        assert!(out.contains("| Температура "));
    }

    #[test]
    fn test_table_widens_for_long_title() {
        let title = "A very long title that is wider than both columns together";
        let out = table(title, &WeatherRecord::new().with(WeatherField::Temperature, 1));
        let first = out.lines().next().unwrap();
        // one column of padding on top of the title, plus the borders
        assert_eq!(first.chars().count(), title.chars().count() + 3);
    }

    #[test]
    fn test_plain_output() {
        let out = plain("Sinoptik, current weather, Київ", &record());
        assert_eq!(
            out,
            "\nSinoptik, current weather, Київ\n\n\
             Температура: 12 °C\nНа небі: Хмарно\nСередня: 11.8 °C\n"
        );
    }
}
