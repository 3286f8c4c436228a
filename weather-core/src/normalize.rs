//! Mapping of raw OpenWeatherMap payloads onto the internal model.
//!
//! Nothing here performs I/O. The only failure is a body that does not match
//! the expected shape.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{Condition, CurrentConditions, ForecastEntry};

/// Number of forecast periods kept from the provider's list.
pub const FORECAST_LIMIT: usize = 5;

const FALLBACK_ICON: &str = "🌈";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct NormalizeError(String);

/// Symbol for a provider condition category. Unknown categories get a fallback.
pub fn icon_for(category: &str) -> &'static str {
    match category {
        "Clear" => "☀️",
        "Clouds" => "☁️",
        "Rain" => "🌧️",
        "Drizzle" => "🌦️",
        "Thunderstorm" => "⛈️",
        "Snow" => "❄️",
        "Mist" => "🌫️",
        "Fog" => "🌁",
        _ => FALLBACK_ICON,
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    pressure: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    #[serde(default)]
    country: Option<String>,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
    #[serde(default)]
    visibility: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

/// Entries stay raw until truncation; periods past the limit are never inspected.
#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<serde_json::Value>,
}

/// Parse a current-conditions body.
pub fn parse_current(body: &str) -> Result<CurrentConditions, NormalizeError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|e| NormalizeError(format!("current conditions: {e}")))?;

    let condition = primary_condition(&parsed.weather, "current conditions")?;

    Ok(CurrentConditions {
        place_name: parsed.name,
        country: parsed.sys.country,
        observed_at: timestamp(parsed.dt, "dt")?,
        temperature: parsed.main.temp,
        feels_like: parsed.main.feels_like,
        humidity_pct: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
        pressure: parsed.main.pressure,
        visibility_m: parsed.visibility,
        sunrise: timestamp(parsed.sys.sunrise, "sys.sunrise")?,
        sunset: timestamp(parsed.sys.sunset, "sys.sunset")?,
        temp_min: parsed.main.temp_min,
        temp_max: parsed.main.temp_max,
        condition,
    })
}

/// Parse a forecast body, keeping the first [`FORECAST_LIMIT`] periods in
/// provider order.
pub fn parse_forecast(body: &str) -> Result<Vec<ForecastEntry>, NormalizeError> {
    let parsed: OwForecastResponse =
        serde_json::from_str(body).map_err(|e| NormalizeError(format!("forecast: {e}")))?;

    parsed
        .list
        .into_iter()
        .take(FORECAST_LIMIT)
        .enumerate()
        .map(|(i, raw)| {
            let entry: OwForecastEntry = serde_json::from_value(raw)
                .map_err(|e| NormalizeError(format!("forecast: list[{i}]: {e}")))?;

            Ok(ForecastEntry {
                time: timestamp(entry.dt, "list[].dt")?,
                temperature: entry.main.temp,
                condition: primary_condition(&entry.weather, "forecast")?,
            })
        })
        .collect()
}

fn primary_condition(weather: &[OwWeather], what: &str) -> Result<Condition, NormalizeError> {
    weather
        .first()
        .map(|w| Condition { category: w.main.clone(), description: w.description.clone() })
        .ok_or_else(|| NormalizeError(format!("{what}: empty `weather` array")))
}

fn timestamp(ts: i64, field: &str) -> Result<DateTime<Utc>, NormalizeError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| NormalizeError(format!("`{field}` is out of range: {ts}")))
}
