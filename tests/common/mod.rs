#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use noonday_server::game::{GameSettings, Match, PhaseController, Player, PlayerId, Role};
use noonday_server::store::{MatchStore, MemoryMatchStore};
use noonday_server::util::rng::ScriptedSource;
use noonday_server::util::time::{Clock, ManualClock};

pub const CODE: &str = "NOON";
pub const HOST: &str = "p1";

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryMatchStore>,
    pub controller: Arc<PhaseController>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryMatchStore::new(clock.clone() as Arc<dyn Clock>));
        let controller = Arc::new(PhaseController::new(
            store.clone() as Arc<dyn MatchStore>,
            clock.clone() as Arc<dyn Clock>,
            Box::new(ScriptedSource::default()),
        ));
        Self {
            clock,
            store,
            controller,
        }
    }

    /// A five-seat lobby: Doctor, Sheriff, two Villagers and a Gunman
    pub fn with_lobby(settings: GameSettings) -> Self {
        let harness = Self::new();
        let players = (1..=5)
            .map(|n| Player::new(format!("p{}", n), format!("Player {}", n)))
            .collect();
        let roles = BTreeMap::from([
            (Role::Doctor, 1),
            (Role::Sheriff, 1),
            (Role::Villager, 2),
            (Role::Gunman, 1),
        ]);
        harness
            .store
            .insert(Match::lobby(CODE, HOST, players, roles, settings))
            .unwrap();
        harness
    }

    pub fn record(&self) -> Match {
        self.store.get(CODE).unwrap()
    }

    /// Id of the first player dealt `role`
    pub fn holder(&self, role: Role) -> PlayerId {
        self.record()
            .players
            .iter()
            .find(|p| p.holds(role))
            .map(|p| p.id.clone())
            .unwrap()
    }

    /// Ids of every player dealt `role`
    pub fn holders(&self, role: Role) -> Vec<PlayerId> {
        self.record()
            .players
            .iter()
            .filter(|p| p.holds(role))
            .map(|p| p.id.clone())
            .collect()
    }

    /// Start the game and move past role reveal into the first night
    pub fn start_into_night(&self) {
        self.controller.start_game(CODE, HOST).unwrap();
        self.controller.advance_phase(CODE, HOST).unwrap();
    }

    /// Let the current phase run out
    pub fn expire(&self) {
        let limit = self.record().phase_time_limit_ms;
        self.clock.advance_ms(limit);
    }
}
