//! In-memory match store backed by a sharded concurrent map

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::game::r#match::{normalize_code, Match, MatchStatus};
use crate::util::time::Clock;

use super::{MatchStore, MatchUpdate, Precondition, StoreError};

/// Each entry's shard lock serializes writers to the same match
pub struct MemoryMatchStore {
    matches: DashMap<String, Match>,
    clock: Arc<dyn Clock>,
}

impl MemoryMatchStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            matches: DashMap::new(),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

impl MatchStore for MemoryMatchStore {
    fn get(&self, code: &str) -> Result<Match, StoreError> {
        let code = normalize_code(code);
        self.matches
            .get(&code)
            .map(|m| m.value().clone())
            .ok_or(StoreError::NotFound(code))
    }

    fn update(
        &self,
        code: &str,
        update: MatchUpdate,
        precondition: Option<&Precondition>,
    ) -> Result<Match, StoreError> {
        let code = normalize_code(code);
        let mut entry = self
            .matches
            .get_mut(&code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;

        if let Some(expected) = precondition {
            if !expected.holds(entry.value()) {
                debug!(match_code = %code, "Precondition failed, write rejected");
                return Err(StoreError::Conflict);
            }
        }

        update.apply_to(entry.value_mut(), self.clock.now());
        Ok(entry.value().clone())
    }

    fn insert(&self, record: Match) -> Result<(), StoreError> {
        match self.matches.entry(record.code.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn remove(&self, code: &str) -> Result<Match, StoreError> {
        let code = normalize_code(code);
        self.matches
            .remove(&code)
            .map(|(_, m)| m)
            .ok_or(StoreError::NotFound(code))
    }

    fn active_codes(&self) -> Vec<String> {
        self.matches
            .iter()
            .filter(|m| m.value().status == MatchStatus::Started)
            .map(|m| m.key().clone())
            .collect()
    }
}
