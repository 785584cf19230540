mod clock;
mod error;
mod horizon;
mod lifecycle;
mod materialize;
mod occurrence;
mod overlap;
mod queries;
mod store;

pub use clock::{Clock, FixedClock, SystemClock, local_day};
pub use error::{EngineError, OverlapInfo};
pub use lifecycle::{
    CreateOutcome, FixedReservationUpdate, NewFixedReservation, ToggleOutcome, UpdateOutcome,
};
pub use materialize::instance_price;
pub use occurrence::project_occurrences;
pub use overlap::detect_overlap;
pub use store::{InstanceReprice, MemoryStore, Store, StoreError, StoreResult};

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::config::Config;

/// The recurring-reservation engine: conflict validation, instance
/// materialization, and fixed-reservation lifecycle over an injected store
/// and clock.
pub struct Engine {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    config: Config,
    /// Advisory locks keyed by court. Held across check-then-write so two
    /// concurrent creates/activations for the same court serialize instead
    /// of double-booking.
    court_locks: DashMap<Ulid, Arc<Mutex<()>>>,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, config: Config) -> Self {
        Self {
            store,
            clock,
            config,
            court_locks: DashMap::new(),
        }
    }

    /// Engine on the system clock with default configuration.
    pub fn with_defaults(store: Arc<dyn Store>) -> Self {
        Self::new(store, Arc::new(SystemClock), Config::default())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The facility's current calendar day.
    pub fn today(&self) -> NaiveDate {
        local_day(self.clock.now_utc(), self.config.timezone)
    }

    fn court_lock(&self, court_id: Ulid) -> Arc<Mutex<()>> {
        self.court_locks
            .entry(court_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
