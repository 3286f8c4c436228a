//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeatherMap client and the normalization of its payloads
//! - Location resolution for a query (device position or typed city)
//! - `WeatherSession`, the query state a front end renders from
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod session;

pub use config::{ClientSettings, Config};
pub use error::{ErrorKind, QueryError};
pub use location::{Coordinates, FixedPosition, GeolocationSource, LocationResolver, NoGeolocation};
pub use model::{
    Condition, CurrentConditions, ForecastEntry, QueryOrigin, QueryResult, QueryTarget,
    UnitSystem, WeatherReport,
};
pub use normalize::icon_for;
pub use provider::{OpenWeatherClient, WeatherProvider};
pub use session::{QueryState, Settlement, Snapshot, WeatherSession};
