//! Text rendering of session snapshots.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;
use weather_core::{QueryState, WeatherReport, icon_for, model::round_half_up};

pub const LOADING_LINE: &str = "Scanning atmospheric data...";

/// `3:04 PM` style clock time in `tz`.
pub fn format_time<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format("%-I:%M %p").to_string()
}

pub fn render_state<Tz>(state: &QueryState, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match state {
        QueryState::Idle => "Enter any city worldwide to get started.".to_string(),
        QueryState::Loading { .. } => LOADING_LINE.to_string(),
        QueryState::Success(report) => render_report(report, tz),
        QueryState::Failure { error, retained: None } => format!("⚠️  {}", error.user_message()),
        QueryState::Failure { error, retained: Some(report) } => {
            format!("⚠️  {}\n\n{}", error.user_message(), render_report(report, tz))
        }
    }
}

pub fn render_report<Tz>(report: &WeatherReport, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let current = &report.current;
    let unit = report.unit;

    let mut lines = vec![
        report.location_label(),
        format!("Updated: {}", format_time(current.observed_at, tz)),
        format!(
            "{}  {} {}",
            unit.format_temperature(current.temperature),
            icon_for(&current.condition.category),
            current.condition.description,
        ),
        format!("  Feels Like   {}°", round_half_up(current.feels_like)),
        format!("  Humidity     {}%", current.humidity_pct),
        format!("  Wind Speed   {} {}", current.wind_speed, unit.speed_unit()),
        format!("  Pressure     {:.0} hPa", current.pressure),
    ];

    if !report.forecast.is_empty() {
        lines.push(String::new());
        lines.push("Upcoming Forecast".to_string());
        lines.extend(report.forecast.iter().map(|entry| {
            format!(
                "  {:>8}  {}  {:>4}°  {}",
                format_time(entry.time, tz),
                icon_for(&entry.condition.category),
                round_half_up(entry.temperature),
                entry.condition.description,
            )
        }));
    }

    lines.push(String::new());
    lines.push(format!(
        "Sunrise: {}   Sunset: {}",
        format_time(current.sunrise, tz),
        format_time(current.sunset, tz)
    ));
    if let Some(visibility) = current.visibility_m {
        lines.push(format!("Visibility: {:.1} km", f64::from(visibility) / 1000.0));
    }
    lines.push(format!(
        "Min: {}°   Max: {}°",
        round_half_up(current.temp_min),
        round_half_up(current.temp_max)
    ));

    lines.join("\n")
}
