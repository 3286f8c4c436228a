use async_trait::async_trait;
use std::fmt::Debug;

use crate::model::{QueryResult, QueryTarget, UnitSystem};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Source of paired current-conditions and forecast data.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch current conditions and forecast for `target` in `unit`.
    ///
    /// Either both halves succeed and a report is returned, or the whole query
    /// fails.
    async fn fetch_weather(&self, target: &QueryTarget, unit: UnitSystem) -> QueryResult;
}
