//! Phase controller - the only entry point that mutates matches
//!
//! Every write is one atomic store update. Phase transitions carry a
//! precondition on `(game_state, phase_started_at)`, so concurrent timer
//! pollers and the host can race freely: the first commit wins and the rest
//! observe the new phase.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GameError, GameResult};
use crate::store::{FieldUpdate, MatchStore, MatchUpdate, Precondition, StoreError, Timestamp};
use crate::util::rng::{shuffle_with, RandomSource};
use crate::util::time::Clock;

use super::night::PrivateOutcome;
use super::phase::{self, PhaseReport, Transition, ROLE_REVEAL_MS};
use super::player::{DeathCause, Player, PlayerId};
use super::r#match::{GameState, Match, MatchStatus, Phase, SubmissionTable};
use super::role::{Faction, Role};
use super::submission;
use super::vote::VoteTally;
use super::win::WinVerdict;

/// What a timer poll did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AutoAdvance {
    /// This call performed the transition
    Advanced(PhaseReport),
    NotExpired { remaining_ms: u64 },
    /// Only the host moves this match forward
    ManualControl,
    /// Another caller got there first
    AlreadyAdvanced(PhaseReport),
    GameOver,
}

/// A player as shown to one viewer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    /// Hidden unless it is the viewer, the player is dead, or the game is over
    pub role: Option<Role>,
    pub is_alive: bool,
    pub killed_by: Option<DeathCause>,
    pub eliminated_by: Option<String>,
}

/// Read-only snapshot returned by `get_state`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchView {
    pub code: String,
    pub status: MatchStatus,
    pub phase: Phase,
    pub game_state: GameState,
    pub day_count: u32,
    pub phase_time_limit_ms: u64,
    pub time_remaining_ms: u64,
    pub players: Vec<PlayerView>,
    pub votes: BTreeMap<PlayerId, PlayerId>,
    pub night_events: Vec<String>,
    pub last_day_result: Option<VoteTally>,
    pub win_condition: Option<WinVerdict>,
    /// Only the viewer's own outcome, never anyone else's
    pub private_outcome: Option<PrivateOutcome>,
}

/// Reference card for one role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleInfo {
    pub role: Role,
    pub faction: Faction,
    pub has_night_action: bool,
    pub description: &'static str,
}

impl From<Role> for RoleInfo {
    fn from(role: Role) -> Self {
        Self {
            role,
            faction: role.faction(),
            has_night_action: role.night_ability().is_some(),
            description: role.description(),
        }
    }
}

/// Drives matches through their phases
pub struct PhaseController {
    store: Arc<dyn MatchStore>,
    clock: Arc<dyn Clock>,
    rng: Mutex<Box<dyn RandomSource>>,
}

impl PhaseController {
    pub fn new(
        store: Arc<dyn MatchStore>,
        clock: Arc<dyn Clock>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            store,
            clock,
            rng: Mutex::new(rng),
        }
    }

    pub fn store(&self) -> &Arc<dyn MatchStore> {
        &self.store
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Deal roles and open the role reveal window
    pub fn start_game(&self, code: &str, caller_id: &str) -> GameResult<PhaseReport> {
        let record = self.store.get(code)?;

        if record.status != MatchStatus::Lobby {
            return Err(GameError::conflict("The game has already started"));
        }
        if !record.is_host(caller_id) {
            warn!(match_code = %record.code, caller = %caller_id, "Non-host tried to start the game");
            return Err(GameError::forbidden("Only the host can start the game"));
        }

        let mut pool: Vec<Role> = record
            .role_counts
            .iter()
            .flat_map(|(role, count)| std::iter::repeat(*role).take(*count))
            .collect();
        if pool.len() != record.players.len() {
            return Err(GameError::validation(format!(
                "Role count ({}) must match player count ({})",
                pool.len(),
                record.players.len()
            )));
        }

        {
            let mut rng = self.rng.lock();
            shuffle_with(&mut **rng, &mut pool);
        }

        let players: Vec<Player> = record
            .players
            .iter()
            .zip(pool)
            .map(|(p, role)| Player::new(p.id.clone(), p.name.clone()).with_role(role))
            .collect();

        let update = MatchUpdate::new()
            .set(FieldUpdate::Players(players))
            .set(FieldUpdate::Status(MatchStatus::Started))
            .set(FieldUpdate::GameState(GameState::RoleReveal))
            .set(FieldUpdate::DayCount(1))
            .set(FieldUpdate::PhaseTimeLimit(ROLE_REVEAL_MS))
            .set(FieldUpdate::PhaseStartedAt(Timestamp::Server))
            .set(FieldUpdate::Votes(BTreeMap::new()))
            .set(FieldUpdate::RoleData(SubmissionTable::default()))
            .set(FieldUpdate::NightEvents(Vec::new()))
            .set(FieldUpdate::PrivateEvents(BTreeMap::new()))
            .set(FieldUpdate::LastDayResult(None))
            .set(FieldUpdate::WinCondition(None));

        let committed = self
            .store
            .update(&record.code, update, Some(&Precondition::of(&record)))?;

        info!(
            match_code = %committed.code,
            player_count = committed.players.len(),
            "Game started"
        );

        Ok(PhaseReport::of(&committed))
    }

    /// Host-only advance, regardless of the timer
    pub fn advance_phase(&self, code: &str, caller_id: &str) -> GameResult<PhaseReport> {
        let record = self.store.get(code)?;

        if !record.is_host(caller_id) {
            warn!(match_code = %record.code, caller = %caller_id, "Non-host tried to advance the phase");
            return Err(GameError::forbidden("Only the host can advance the phase"));
        }

        let step = self.next_step(&record)?;
        let committed = self.store.update(
            &record.code,
            step.update.clone(),
            Some(&Precondition::of(&record)),
        )?;
        log_transition(&committed.code, &step, "host");

        Ok(PhaseReport::of(&committed))
    }

    /// Timer poll using the controller's clock
    pub fn try_auto_advance(&self, code: &str) -> GameResult<AutoAdvance> {
        self.try_auto_advance_at(code, self.clock.now())
    }

    /// Safe to call redundantly: only the first caller past the deadline
    /// commits the transition
    pub fn try_auto_advance_at(&self, code: &str, now: DateTime<Utc>) -> GameResult<AutoAdvance> {
        let record = self.store.get(code)?;

        match record.game_state {
            GameState::GameOver => return Ok(AutoAdvance::GameOver),
            GameState::Lobby => return Err(GameError::conflict("The game has not started yet")),
            _ => {}
        }
        if record.game_settings.manual_phase_control {
            return Ok(AutoAdvance::ManualControl);
        }
        if !record.is_expired(now) {
            return Ok(AutoAdvance::NotExpired {
                remaining_ms: record.time_remaining_ms(now),
            });
        }

        let step = self.next_step(&record)?;
        match self.store.update(
            &record.code,
            step.update.clone(),
            Some(&Precondition::of(&record)),
        ) {
            Ok(committed) => {
                log_transition(&committed.code, &step, "timer");
                Ok(AutoAdvance::Advanced(PhaseReport::of(&committed)))
            }
            Err(StoreError::Conflict) => {
                debug!(match_code = %record.code, "Phase already advanced by another caller");
                let current = self.store.get(code)?;
                Ok(AutoAdvance::AlreadyAdvanced(PhaseReport::of(&current)))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn next_step(&self, record: &Match) -> GameResult<Transition> {
        let mut rng = self.rng.lock();
        phase::transition(record, &mut **rng)
    }

    // ========================================================================
    // Submissions
    // ========================================================================

    /// Record (or retract, with `None`) one role-holder's night target
    pub fn submit_role_action(
        &self,
        code: &str,
        role: Role,
        actor_id: &str,
        target_id: Option<&str>,
    ) -> GameResult<()> {
        let record = self.store.get(code)?;
        let field = submission::role_action(&record, role, actor_id, target_id)?;

        self.store.update(
            &record.code,
            MatchUpdate::new().set(field),
            Some(&Precondition::of(&record)),
        )?;

        debug!(
            match_code = %record.code,
            actor = %actor_id,
            role = %role,
            retracted = target_id.is_none(),
            "Night action recorded"
        );
        Ok(())
    }

    /// Record (or retract, with `None`) one day vote
    pub fn submit_vote(&self, code: &str, voter_id: &str, target_id: Option<&str>) -> GameResult<()> {
        let record = self.store.get(code)?;
        let field = submission::vote(&record, voter_id, target_id)?;

        self.store.update(
            &record.code,
            MatchUpdate::new().set(field),
            Some(&Precondition::of(&record)),
        )?;

        debug!(match_code = %record.code, voter = %voter_id, "Vote recorded");
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn get_state(&self, code: &str, viewer_id: Option<&str>) -> GameResult<MatchView> {
        let record = self.store.get(code)?;
        let now = self.clock.now();
        let reveal_all = record.game_state == GameState::GameOver;

        let players = record
            .players
            .iter()
            .map(|p| {
                let visible = reveal_all || !p.is_alive || viewer_id == Some(p.id.as_str());
                PlayerView {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    role: p.role.filter(|_| visible),
                    is_alive: p.is_alive,
                    killed_by: p.killed_by,
                    eliminated_by: p.eliminated_by.clone(),
                }
            })
            .collect();

        let private_outcome = viewer_id.and_then(|id| record.private_events.get(id).cloned());

        Ok(MatchView {
            phase: record.phase(),
            time_remaining_ms: record.time_remaining_ms(now),
            code: record.code,
            status: record.status,
            game_state: record.game_state,
            day_count: record.day_count,
            phase_time_limit_ms: record.phase_time_limit_ms,
            players,
            votes: record.votes,
            night_events: record.night_events,
            last_day_result: record.last_day_result,
            win_condition: record.win_condition,
            private_outcome,
        })
    }

    /// All roles, or one role by name
    pub fn role_info(&self, name: Option<&str>) -> GameResult<Vec<RoleInfo>> {
        match name {
            None => Ok(Role::ALL.into_iter().map(RoleInfo::from).collect()),
            Some(name) => {
                let role: Role = name
                    .parse()
                    .map_err(|_| GameError::NotFound(format!("Unknown role {}", name)))?;
                Ok(vec![RoleInfo::from(role)])
            }
        }
    }

    // ========================================================================
    // Timer poller
    // ========================================================================

    /// Poll every running match on a fixed interval
    pub async fn run_auto_advance(self: Arc<Self>, poll_interval: Duration) {
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(interval_ms = poll_interval.as_millis() as u64, "Phase poller started");

        loop {
            interval.tick().await;

            for code in self.store.active_codes() {
                match self.try_auto_advance(&code) {
                    Ok(AutoAdvance::Advanced(_)) => {}
                    Ok(outcome) => {
                        debug!(match_code = %code, outcome = ?outcome, "Auto-advance skipped");
                    }
                    Err(GameError::NotFound(_)) => {
                        debug!(match_code = %code, "Match vanished before poll");
                    }
                    Err(err) => {
                        warn!(match_code = %code, error = %err, "Auto-advance failed");
                    }
                }
            }
        }
    }
}

fn log_transition(code: &str, step: &Transition, trigger: &str) {
    info!(
        match_code = %code,
        from = step.from.as_str(),
        to = step.next_state.as_str(),
        day = step.day_count,
        trigger,
        "Phase advanced"
    );

    if step.is_game_over() {
        if let Some(verdict) = &step.verdict {
            info!(
                match_code = %code,
                winner = ?verdict.winner,
                win_type = ?verdict.win_type,
                "Game over"
            );
        }
    }
}
