use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::{
    config::{ApiKey, ClientSettings},
    error::{ErrorKind, QueryError},
    model::{QueryResult, QueryTarget, UnitSystem, WeatherReport},
    normalize,
};

use super::WeatherProvider;

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Current => "/data/2.5/weather",
            Endpoint::Forecast => "/data/2.5/forecast",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Endpoint::Current => "current weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

/// OpenWeatherMap client issuing the current-weather and 5-day forecast
/// requests for one query.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: ApiKey,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(settings: ClientSettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { api_key: settings.api_key, base_url: settings.base_url, http })
    }

    async fn fetch_body(
        &self,
        endpoint: Endpoint,
        target: &QueryTarget,
        unit: UnitSystem,
    ) -> Result<String, QueryError> {
        let origin = target.origin();
        let url = format!("{}{}", self.base_url, endpoint.path());

        let mut query = target.query_pairs();
        query.push(("units", unit.as_str().to_string()));
        query.push(("appid", self.api_key.expose().to_string()));

        debug!(endpoint = endpoint.label(), %target, %unit, "Requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| QueryError::from_transport(origin, &e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| QueryError::from_transport(origin, &e))?;

        if !status.is_success() {
            return Err(QueryError::new(
                ErrorKind::NotFound,
                origin,
                format!(
                    "OpenWeather {} request failed with status {}: {}",
                    endpoint.label(),
                    status,
                    truncate_body(&body),
                ),
            ));
        }

        Ok(body)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch_weather(&self, target: &QueryTarget, unit: UnitSystem) -> QueryResult {
        let (current, forecast) = tokio::join!(
            self.fetch_body(Endpoint::Current, target, unit),
            self.fetch_body(Endpoint::Forecast, target, unit),
        );

        let outcome = match (current, forecast) {
            (Ok(current), Ok(forecast)) => build_report(target, unit, &current, &forecast),
            (Err(err), _) | (_, Err(err)) => Err(err),
        };

        match &outcome {
            Ok(report) => info!(
                %target,
                place = %report.current.place_name,
                periods = report.forecast.len(),
                "Weather query settled"
            ),
            Err(err) => warn!(%target, kind = %err.kind, detail = %err.detail, "Weather query failed"),
        }

        outcome
    }
}

fn build_report(
    target: &QueryTarget,
    unit: UnitSystem,
    current: &str,
    forecast: &str,
) -> QueryResult {
    let malformed = |e: normalize::NormalizeError| {
        QueryError::new(ErrorKind::MalformedResponse, target.origin(), e.to_string())
    };

    Ok(WeatherReport {
        target: target.clone(),
        unit,
        current: normalize::parse_current(current).map_err(malformed)?,
        forecast: normalize::parse_forecast(forecast).map_err(malformed)?,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
