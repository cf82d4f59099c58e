use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Fixed vocabulary of weather record fields.
///
/// Variant order is the print order used by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherField {
    Temperature,
    RealFeel,
    Condition,
    HorizonHours,
    HourlyMax,
    HourlyMin,
    HourlyAverage,
    NextDayTemp,
    NextDayTempMax,
    NextDayTempMin,
    NextDayRealFeel,
    NextDayCondition,
    NextNightTemp,
    NextNightRealFeel,
    NextNightCondition,
}

impl WeatherField {
    pub const ALL: [WeatherField; 15] = [
        Self::Temperature,
        Self::RealFeel,
        Self::Condition,
        Self::HorizonHours,
        Self::HourlyMax,
        Self::HourlyMin,
        Self::HourlyAverage,
        Self::NextDayTemp,
        Self::NextDayTempMax,
        Self::NextDayTempMin,
        Self::NextDayRealFeel,
        Self::NextDayCondition,
        Self::NextNightTemp,
        Self::NextNightRealFeel,
        Self::NextNightCondition,
    ];

    /// Label printed next to the value, in Ukrainian like the sites themselves
    pub fn label(&self) -> &'static str {
        match self {
            Self::Temperature => "Температура",
            Self::RealFeel => "Відчувається як",
            Self::Condition => "На небі",
            Self::HorizonHours => "Прогноз на, годин",
            Self::HourlyMax => "Максимальна",
            Self::HourlyMin => "Мінімальна",
            Self::HourlyAverage => "Середня",
            Self::NextDayTemp | Self::NextDayTempMax => "Максимальна вдень",
            Self::NextDayTempMin => "Мінімальна вдень",
            Self::NextDayRealFeel => "Відчуватиметься вдень як",
            Self::NextDayCondition => "На небі вдень буде",
            Self::NextNightTemp => "Мінімальна вночі",
            Self::NextNightRealFeel => "Відчуватиметься вночі як",
            Self::NextNightCondition => "На небі вночі буде",
        }
    }

    /// Whether values of this field are temperatures in degrees
    pub fn is_temperature(&self) -> bool {
        !matches!(
            self,
            Self::Condition | Self::HorizonHours | Self::NextDayCondition | Self::NextNightCondition
        )
    }
}

/// A single field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v:.1}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        Self::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Decimal(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// Weather data for one source, built up from partial records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WeatherRecord {
    fields: BTreeMap<WeatherField, FieldValue>,
}

impl WeatherRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter used while a provider assembles a partial record
    pub fn with(mut self, field: WeatherField, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: WeatherField, value: impl Into<FieldValue>) {
        self.fields.insert(field, value.into());
    }

    pub fn get(&self, field: WeatherField) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn contains(&self, field: WeatherField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields in print order
    pub fn iter(&self) -> impl Iterator<Item = (WeatherField, &FieldValue)> {
        self.fields.iter().map(|(field, value)| (*field, value))
    }

    /// Merge a partial record into this one.
    ///
    /// Only fields not already present are added; existing values are kept.
    /// Returns the number of fields added.
    pub fn merge(&mut self, partial: WeatherRecord) -> usize {
        let mut added = 0;
        for (field, value) in partial.fields {
            if let Some(existing) = self.fields.get(&field) {
                if existing != &value {
                    tracing::warn!(
                        "Ignoring {:?} = {} from merge, already set to {}",
                        field,
                        value,
                        existing
                    );
                }
                continue;
            }
            self.fields.insert(field, value);
            added += 1;
        }
        added
    }
}

impl FromIterator<(WeatherField, FieldValue)> for WeatherRecord {
    fn from_iter<I: IntoIterator<Item = (WeatherField, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Resolved location produced by browsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationDescriptor {
    pub url: String,
    pub url_hourly: String,
    pub url_next_day: String,
    pub location: String,
}

impl LocationDescriptor {
    /// Descriptor for sources that serve every view from one page
    pub fn single_page(url: impl Into<String>, location: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url_hourly: url.clone(),
            url_next_day: url.clone(),
            url,
            location: location.into(),
        }
    }
}

/// A fetched page ready for extraction
#[derive(Debug, Clone)]
pub struct Page {
    pub url: String,
    pub body: String,
}

impl Page {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }

    /// Decode raw bytes as UTF-8, replacing invalid sequences
    pub fn from_bytes(url: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(url, String::from_utf8_lossy(bytes).into_owned())
    }
}
