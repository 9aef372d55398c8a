//! Match aggregate: the single mutable record kept per game

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::night::PrivateOutcome;
use super::player::{self, Player, PlayerId};
use super::role::Role;
use super::vote::VoteTally;
use super::win::WinVerdict;

/// Lifecycle status of a match record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Lobby,
    Started,
    Ended,
}

/// Coarse day/night phase shown to players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Night,
    Day,
    Ended,
}

/// Fine-grained sub-phase driven by the phase controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Not started yet
    Lobby,
    RoleReveal,
    NightPhase,
    NightOutcome,
    EventSharing,
    DiscussionPhase,
    VotingPhase,
    VotingOutcome,
    GameOver,
}

impl GameState {
    pub fn phase(self) -> Phase {
        match self {
            GameState::Lobby | GameState::RoleReveal | GameState::NightPhase => Phase::Night,
            GameState::NightOutcome
            | GameState::EventSharing
            | GameState::DiscussionPhase
            | GameState::VotingPhase
            | GameState::VotingOutcome => Phase::Day,
            GameState::GameOver => Phase::Ended,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameState::Lobby => "lobby",
            GameState::RoleReveal => "role_reveal",
            GameState::NightPhase => "night_phase",
            GameState::NightOutcome => "night_outcome",
            GameState::EventSharing => "event_sharing",
            GameState::DiscussionPhase => "discussion_phase",
            GameState::VotingPhase => "voting_phase",
            GameState::VotingOutcome => "voting_outcome",
            GameState::GameOver => "game_over",
        }
    }
}

/// Host-chosen settings, resolved before the match reaches this service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub night_duration_secs: u64,
    pub discussion_duration_secs: u64,
    pub voting_duration_secs: u64,
    pub allow_first_night_kill: bool,
    /// Test matches never end from the win evaluator
    pub disable_win_conditions: bool,
    /// Timer pollers never advance; only the host does
    pub manual_phase_control: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            night_duration_secs: 30,
            discussion_duration_secs: 120,
            voting_duration_secs: 30,
            allow_first_night_kill: true,
            disable_win_conditions: false,
            manual_phase_control: false,
        }
    }
}

/// One role-holder's choice for the current night
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSubmission {
    pub actor_id: PlayerId,
    pub role: Role,
    pub target_id: Option<PlayerId>,
}

impl RoleSubmission {
    pub fn new(actor_id: impl Into<PlayerId>, role: Role, target_id: Option<PlayerId>) -> Self {
        Self {
            actor_id: actor_id.into(),
            role,
            target_id,
        }
    }
}

/// Night submissions keyed by actor id, each tagged with its role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionTable(BTreeMap<PlayerId, RoleSubmission>);

impl SubmissionTable {
    /// Blank entries for every alive player whose role acts at night
    pub fn fresh(players: &[Player]) -> Self {
        let entries = players
            .iter()
            .filter(|p| p.is_alive)
            .filter_map(|p| {
                let role = p.role?;
                role.night_ability()?;
                Some((p.id.clone(), RoleSubmission::new(p.id.clone(), role, None)))
            })
            .collect();
        Self(entries)
    }

    /// Overwrites any earlier entry for the same actor
    pub fn record(&mut self, submission: RoleSubmission) {
        self.0.insert(submission.actor_id.clone(), submission);
    }

    pub fn get(&self, actor_id: &str) -> Option<&RoleSubmission> {
        self.0.get(actor_id)
    }

    pub fn target_of(&self, actor_id: &str) -> Option<&str> {
        self.0.get(actor_id).and_then(|s| s.target_id.as_deref())
    }

    /// Submissions that actually name a target, in actor-id order
    pub fn targeted(&self) -> impl Iterator<Item = &RoleSubmission> {
        self.0.values().filter(|s| s.target_id.is_some())
    }

    pub fn by_role(&self, role: Role) -> impl Iterator<Item = &RoleSubmission> {
        self.targeted().filter(move |s| s.role == role)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleSubmission> {
        self.0.values()
    }
}

/// The per-match record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    pub code: String,
    pub host_id: PlayerId,
    pub status: MatchStatus,
    pub game_state: GameState,
    pub day_count: u32,
    pub phase_started_at: Option<DateTime<Utc>>,
    pub phase_time_limit_ms: u64,
    pub players: Vec<Player>,
    /// Lobby role configuration dealt out at game start
    pub role_counts: BTreeMap<Role, usize>,
    /// voter id -> target id
    pub votes: BTreeMap<PlayerId, PlayerId>,
    pub role_data: SubmissionTable,
    pub night_events: Vec<String>,
    pub private_events: BTreeMap<PlayerId, PrivateOutcome>,
    pub last_day_result: Option<VoteTally>,
    pub win_condition: Option<WinVerdict>,
    pub game_settings: GameSettings,
}

impl Match {
    /// A match waiting in its lobby, as handed over by lobby management
    pub fn lobby(
        code: impl Into<String>,
        host_id: impl Into<PlayerId>,
        players: Vec<Player>,
        role_counts: BTreeMap<Role, usize>,
        game_settings: GameSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: normalize_code(&code.into()),
            host_id: host_id.into(),
            status: MatchStatus::Lobby,
            game_state: GameState::Lobby,
            day_count: 0,
            phase_started_at: None,
            phase_time_limit_ms: 0,
            players,
            role_counts,
            votes: BTreeMap::new(),
            role_data: SubmissionTable::default(),
            night_events: Vec::new(),
            private_events: BTreeMap::new(),
            last_day_result: None,
            win_condition: None,
            game_settings,
        }
    }

    pub fn phase(&self) -> Phase {
        self.game_state.phase()
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        player::find(&self.players, id)
    }

    pub fn is_host(&self, caller_id: &str) -> bool {
        self.host_id == caller_id
    }

    /// Milliseconds since the current phase started; zero if never started
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        self.phase_started_at
            .map(|start| (now - start).num_milliseconds().max(0) as u64)
            .unwrap_or(0)
    }

    pub fn time_remaining_ms(&self, now: DateTime<Utc>) -> u64 {
        self.phase_time_limit_ms
            .saturating_sub(self.elapsed_ms(now))
    }

    /// Late polls are tolerated: anything at or past the limit counts
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.phase_started_at.is_some() && self.elapsed_ms(now) >= self.phase_time_limit_ms
    }
}

/// Match codes are case-insensitive and stored upper-case
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
