use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::QueryError;

/// Subject of a weather lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryTarget {
    ByCity(String),
    ByCoordinates { lat: f64, lon: f64 },
}

impl QueryTarget {
    /// Build a city target from user input. Blank input yields `None`.
    pub fn city(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(QueryTarget::ByCity(trimmed.to_string()))
        }
    }

    pub fn coordinates(lat: f64, lon: f64) -> Self {
        QueryTarget::ByCoordinates { lat, lon }
    }

    pub fn origin(&self) -> QueryOrigin {
        match self {
            QueryTarget::ByCity(_) => QueryOrigin::City,
            QueryTarget::ByCoordinates { .. } => QueryOrigin::Coordinates,
        }
    }

    /// Location part of the provider query string.
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            QueryTarget::ByCity(name) => vec![("q", name.clone())],
            QueryTarget::ByCoordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        }
    }
}

impl fmt::Display for QueryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryTarget::ByCity(name) => f.write_str(name),
            QueryTarget::ByCoordinates { lat, lon } => write!(f, "{lat:.4}, {lon:.4}"),
        }
    }
}

/// Which kind of lookup produced a result or error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOrigin {
    City,
    Coordinates,
}

impl QueryOrigin {
    /// Whether a failed lookup of this origin drops the report currently held.
    /// Coordinate failures leave it in place.
    pub fn clears_on_failure(self) -> bool {
        matches!(self, QueryOrigin::City)
    }
}

impl fmt::Display for QueryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryOrigin::City => "city",
            QueryOrigin::Coordinates => "coordinate",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Value of the provider's `units` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Metric => UnitSystem::Imperial,
            UnitSystem::Imperial => UnitSystem::Metric,
        }
    }

    pub fn temperature_symbol(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "°C",
            UnitSystem::Imperial => "°F",
        }
    }

    pub fn speed_unit(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "m/s",
            UnitSystem::Imperial => "mph",
        }
    }

    /// Rounded temperature with unit symbol, e.g. `18°C`.
    pub fn format_temperature(&self, value: f64) -> String {
        format!("{}{}", round_half_up(value), self.temperature_symbol())
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown unit system '{0}'. Supported: metric, imperial.")]
pub struct ParseUnitError(String);

impl FromStr for UnitSystem {
    type Err = ParseUnitError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "metric" | "c" | "celsius" => Ok(UnitSystem::Metric),
            "imperial" | "f" | "fahrenheit" => Ok(UnitSystem::Imperial),
            _ => Err(ParseUnitError(value.to_string())),
        }
    }
}

/// Rounds halves towards positive infinity, so `-2.5` becomes `-2`.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Provider category such as `Rain` or `Clouds`.
    pub category: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub place_name: String,
    pub country: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    /// hPa
    pub pressure: f64,
    /// Metres. Not every station reports it.
    pub visibility_m: Option<u32>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub condition: Condition,
}

/// Current conditions and forecast produced together by one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub target: QueryTarget,
    pub unit: UnitSystem,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastEntry>,
}

impl WeatherReport {
    /// `Paris, FR`, or just the place when no country is reported. A report
    /// whose place has no name is labelled with the queried target.
    pub fn location_label(&self) -> String {
        let place = match self.current.place_name.trim() {
            "" => self.target.to_string(),
            name => name.to_string(),
        };

        match self.current.country.as_deref() {
            Some(country) if !country.is_empty() => format!("{place}, {country}"),
            _ => place,
        }
    }
}

pub type QueryResult = Result<WeatherReport, QueryError>;
