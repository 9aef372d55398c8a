//! Match storage seam: atomic partial updates with an optional precondition

pub mod memory;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::game::night::PrivateOutcome;
use crate::game::player::{Player, PlayerId};
use crate::game::r#match::{GameState, Match, MatchStatus, RoleSubmission, SubmissionTable};
use crate::game::vote::VoteTally;
use crate::game::win::WinVerdict;

pub use memory::MemoryMatchStore;

/// Timestamp written into a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Assigned by the store at commit time
    Server,
    At(DateTime<Utc>),
}

/// A single field-scoped write
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Status(MatchStatus),
    GameState(GameState),
    DayCount(u32),
    PhaseTimeLimit(u64),
    PhaseStartedAt(Timestamp),
    Players(Vec<Player>),
    /// Replaces the whole ballot
    Votes(BTreeMap<PlayerId, PlayerId>),
    /// Touches one voter's entry only; `None` retracts
    Vote {
        voter_id: PlayerId,
        target_id: Option<PlayerId>,
    },
    /// Replaces the whole submission table
    RoleData(SubmissionTable),
    /// Touches one actor's entry only
    Submission(RoleSubmission),
    NightEvents(Vec<String>),
    PrivateEvents(BTreeMap<PlayerId, PrivateOutcome>),
    LastDayResult(Option<VoteTally>),
    WinCondition(Option<WinVerdict>),
}

/// Partial update applied atomically to one match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchUpdate {
    fields: Vec<FieldUpdate>,
}

impl MatchUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: FieldUpdate) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push(&mut self, field: FieldUpdate) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[FieldUpdate] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Applies every field in order; `now` resolves `Timestamp::Server`
    pub fn apply_to(self, record: &mut Match, now: DateTime<Utc>) {
        for field in self.fields {
            match field {
                FieldUpdate::Status(status) => record.status = status,
                FieldUpdate::GameState(state) => record.game_state = state,
                FieldUpdate::DayCount(day) => record.day_count = day,
                FieldUpdate::PhaseTimeLimit(ms) => record.phase_time_limit_ms = ms,
                FieldUpdate::PhaseStartedAt(Timestamp::Server) => {
                    record.phase_started_at = Some(now)
                }
                FieldUpdate::PhaseStartedAt(Timestamp::At(at)) => {
                    record.phase_started_at = Some(at)
                }
                FieldUpdate::Players(players) => record.players = players,
                FieldUpdate::Votes(votes) => record.votes = votes,
                FieldUpdate::Vote {
                    voter_id,
                    target_id: Some(target_id),
                } => {
                    record.votes.insert(voter_id, target_id);
                }
                FieldUpdate::Vote {
                    voter_id,
                    target_id: None,
                } => {
                    record.votes.remove(&voter_id);
                }
                FieldUpdate::RoleData(table) => record.role_data = table,
                FieldUpdate::Submission(submission) => record.role_data.record(submission),
                FieldUpdate::NightEvents(events) => record.night_events = events,
                FieldUpdate::PrivateEvents(events) => record.private_events = events,
                FieldUpdate::LastDayResult(result) => record.last_day_result = result,
                FieldUpdate::WinCondition(verdict) => record.win_condition = verdict,
            }
        }
    }
}

/// Compare-and-swap guard: the write lands only if the phase is unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precondition {
    pub game_state: GameState,
    pub phase_started_at: Option<DateTime<Utc>>,
}

impl Precondition {
    pub fn of(record: &Match) -> Self {
        Self {
            game_state: record.game_state,
            phase_started_at: record.phase_started_at,
        }
    }

    pub fn holds(&self, record: &Match) -> bool {
        record.game_state == self.game_state && record.phase_started_at == self.phase_started_at
    }
}

/// Storage errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Match {0} not found")]
    NotFound(String),

    #[error("Precondition failed")]
    Conflict,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence for match records
pub trait MatchStore: Send + Sync {
    fn get(&self, code: &str) -> Result<Match, StoreError>;

    /// Applies `update` atomically and returns the committed record
    fn update(
        &self,
        code: &str,
        update: MatchUpdate,
        precondition: Option<&Precondition>,
    ) -> Result<Match, StoreError>;

    /// Fails with `Conflict` if the code is already taken
    fn insert(&self, record: Match) -> Result<(), StoreError>;

    fn remove(&self, code: &str) -> Result<Match, StoreError>;

    /// Codes of matches that are currently running
    fn active_codes(&self) -> Vec<String>;
}
