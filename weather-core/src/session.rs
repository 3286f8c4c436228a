//! Query state owned on behalf of a presentation layer.
//!
//! A [`WeatherSession`] accepts the inbound events (startup geolocation,
//! submitted city, unit toggle), runs queries through a [`WeatherProvider`] and
//! publishes every transition as a [`Snapshot`] on a `watch` channel.
//!
//! Each query is tagged with a generation number when it starts. A settlement
//! is applied only if no newer query has started since; otherwise it is
//! dropped and reported as [`Settlement::Stale`].

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    error::QueryError,
    location::LocationResolver,
    model::{QueryTarget, UnitSystem, WeatherReport},
    provider::WeatherProvider,
};

#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    Idle,
    Loading {
        target: QueryTarget,
        /// Report held when the query started.
        previous: Option<Arc<WeatherReport>>,
    },
    Success(Arc<WeatherReport>),
    Failure {
        error: QueryError,
        /// Report kept across a failure whose origin does not clear it.
        retained: Option<Arc<WeatherReport>>,
    },
}

impl QueryState {
    /// The report currently held, whatever the phase.
    pub fn report(&self) -> Option<&Arc<WeatherReport>> {
        match self {
            QueryState::Idle => None,
            QueryState::Loading { previous, .. } => previous.as_ref(),
            QueryState::Success(report) => Some(report),
            QueryState::Failure { retained, .. } => retained.as_ref(),
        }
    }
}

/// What the presentation layer sees after each transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub unit: UnitSystem,
    pub state: QueryState,
    generation: u64,
}

impl Snapshot {
    pub fn is_loading(&self) -> bool {
        matches!(self.state, QueryState::Loading { .. })
    }

    pub fn report(&self) -> Option<&Arc<WeatherReport>> {
        self.state.report()
    }

    pub fn error(&self) -> Option<&QueryError> {
        match &self.state {
            QueryState::Failure { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// How a finished query was treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The outcome replaced the published state.
    Applied,
    /// A newer query started meanwhile; the outcome was dropped.
    Stale,
}

pub struct WeatherSession {
    provider: Arc<dyn WeatherProvider>,
    state: watch::Sender<Snapshot>,
}

impl WeatherSession {
    pub fn new(provider: Arc<dyn WeatherProvider>, unit: UnitSystem) -> Self {
        let (state, _) = watch::channel(Snapshot { unit, state: QueryState::Idle, generation: 0 });
        Self { provider, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    /// Startup: try device geolocation once and query it if granted.
    pub async fn start(&self, resolver: &LocationResolver) -> Option<Settlement> {
        match resolver.resolve_startup().await {
            Some(target) => Some(self.query(target).await),
            None => {
                self.geolocation_denied();
                None
            }
        }
    }

    pub async fn geolocation_result(&self, lat: f64, lon: f64) -> Settlement {
        self.query(QueryTarget::coordinates(lat, lon)).await
    }

    /// No state change; the session waits for a city instead.
    pub fn geolocation_denied(&self) {
        debug!("Geolocation unavailable, nothing to query");
    }

    /// Query a typed city. Blank input issues nothing and returns `None`.
    pub async fn submit_city(&self, input: &str) -> Option<Settlement> {
        let target = LocationResolver::from_submission(input)?;
        Some(self.query(target).await)
    }

    /// Flip the unit system and re-query under the new unit.
    ///
    /// A query in flight is restarted for the same target. Otherwise the held
    /// report's place is queried by name, or by its original target when the
    /// provider gave no name. With nothing held or loading, only the unit changes.
    pub async fn toggle_unit(&self) -> Option<Settlement> {
        let mut requery = None;
        self.state.send_modify(|s| {
            s.unit = s.unit.toggled();
            requery = match &s.state {
                QueryState::Loading { target, .. } => Some(target.clone()),
                state => state.report().map(|r| {
                    QueryTarget::city(&r.current.place_name).unwrap_or_else(|| r.target.clone())
                }),
            };
        });

        info!(unit = %self.state.borrow().unit, "Unit system toggled");

        Some(self.query(requery?).await)
    }

    async fn query(&self, target: QueryTarget) -> Settlement {
        let mut ticket = (0, UnitSystem::default(), QueryState::Idle);
        self.state.send_modify(|s| {
            s.generation += 1;
            let previous = s.state.report().cloned();
            let prior = std::mem::replace(
                &mut s.state,
                QueryState::Loading { target: target.clone(), previous },
            );
            ticket = (s.generation, s.unit, prior);
        });
        let (generation, unit, prior) = ticket;

        let mut pending = PendingQuery { state: &self.state, generation, restore: Some(prior) };
        let result = self.provider.fetch_weather(&target, unit).await;
        pending.settle();

        let origin = target.origin();

        let applied = self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }

            let held = s.state.report().cloned();
            s.state = match result {
                Ok(report) => QueryState::Success(Arc::new(report)),
                Err(error) => QueryState::Failure {
                    error,
                    retained: if origin.clears_on_failure() { None } else { held },
                },
            };
            true
        });

        if applied {
            Settlement::Applied
        } else {
            warn!(%target, generation, "Discarding stale weather result");
            Settlement::Stale
        }
    }
}

/// Puts the pre-query state back if a query future is dropped before it
/// settles, unless a newer query has taken over.
struct PendingQuery<'a> {
    state: &'a watch::Sender<Snapshot>,
    generation: u64,
    restore: Option<QueryState>,
}

impl PendingQuery<'_> {
    fn settle(&mut self) {
        self.restore = None;
    }
}

impl Drop for PendingQuery<'_> {
    fn drop(&mut self) {
        let Some(prior) = self.restore.take() else {
            return;
        };

        // The prior state may itself be an older query's `Loading`; that query
        // is stale now and would never clear it.
        let prior = match prior {
            QueryState::Loading { previous: Some(report), .. } => QueryState::Success(report),
            QueryState::Loading { previous: None, .. } => QueryState::Idle,
            settled => settled,
        };

        let generation = self.generation;
        let restored = self.state.send_if_modified(|s| {
            if s.generation != generation {
                return false;
            }
            s.state = prior;
            true
        });

        if restored {
            debug!(generation, "Weather query cancelled, previous state restored");
        }
    }
}
