//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::PhaseController;
use crate::store::{MatchStore, MemoryMatchStore};
use crate::util::rng::{ChaChaSource, RandomSource};
use crate::util::time::{Clock, SystemClock};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn MatchStore>,
    pub controller: Arc<PhaseController>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store: Arc<dyn MatchStore> = Arc::new(MemoryMatchStore::new(clock.clone()));

        let rng: Box<dyn RandomSource> = match config.rng_seed {
            Some(seed) => Box::new(ChaChaSource::from_seed(seed)),
            None => Box::new(ChaChaSource::from_entropy()),
        };

        Self::with_parts(config, store, clock, rng)
    }

    /// Assemble state around caller-supplied seams (tests use a manual clock
    /// and a scripted random source)
    pub fn with_parts(
        config: Config,
        store: Arc<dyn MatchStore>,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let controller = Arc::new(PhaseController::new(store.clone(), clock, rng));

        Self {
            config: Arc::new(config),
            store,
            controller,
        }
    }
}
