use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Select};
use std::sync::Arc;
use weather_core::{
    Config, Coordinates, FixedPosition, LocationResolver, NoGeolocation, OpenWeatherClient,
    UnitSystem, WeatherSession, config::ApiKey,
};

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather and a short forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeatherMap API key and default unit system.
    Configure,

    /// Show weather once for a city or a coordinate pair.
    Show {
        /// City name, e.g. "Paris" or "Paris,FR".
        #[arg(conflicts_with = "lat")]
        city: Option<String>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Look up cities interactively. `:u` toggles units, `:q` quits.
    Interactive {
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Latitude of the device position.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the device position.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Unit system: metric or imperial. Overrides the configured default.
    #[arg(long)]
    pub units: Option<UnitSystem>,
}

impl QueryArgs {
    fn position(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, query } => show(city, query).await,
            Command::Interactive { query } => {
                let config = Config::load()?.with_env()?;
                let session = session_for(&config, &query)?;

                let position = query.position().or_else(|| {
                    config.home.map(|home| Coordinates { lat: home.lat, lon: home.lon })
                });
                let resolver = match position {
                    Some(position) => LocationResolver::new(Box::new(FixedPosition(position))),
                    None => LocationResolver::new(Box::new(NoGeolocation)),
                };

                interactive::run(&session, &resolver).await
            }
        }
    }
}

fn session_for(config: &Config, query: &QueryArgs) -> anyhow::Result<WeatherSession> {
    let client = OpenWeatherClient::new(config.client_settings()?)?;
    let unit = query.units.unwrap_or_else(|| config.units());
    Ok(WeatherSession::new(Arc::new(client), unit))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let raw = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let key = ApiKey::parse(&raw)?;

    let units = Select::new("Default units:", vec![UnitSystem::Metric, UnitSystem::Imperial])
        .with_starting_cursor(match config.units() {
            UnitSystem::Metric => 0,
            UnitSystem::Imperial => 1,
        })
        .prompt()
        .context("Failed to read unit system")?;

    config.set_api_key(key.expose().to_string());
    config.units = Some(units);
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(city: Option<String>, query: QueryArgs) -> anyhow::Result<()> {
    let config = Config::load()?.with_env()?;
    let session = session_for(&config, &query)?;

    match (city, query.position()) {
        (Some(city), _) => {
            if session.submit_city(&city).await.is_none() {
                bail!("City name is empty");
            }
        }
        (None, Some(Coordinates { lat, lon })) => {
            session.geolocation_result(lat, lon).await;
        }
        (None, None) => bail!("Provide a city name or --lat/--lon"),
    }

    let snapshot = session.snapshot();
    if let Some(error) = snapshot.error() {
        tracing::debug!(%error, "Lookup failed");
        bail!("{}", error.user_message());
    }

    println!("{}", render::render_state(&snapshot.state, &chrono::Local));
    Ok(())
}
