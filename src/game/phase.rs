//! Phase state machine
//!
//! `transition` is pure: it reads a match snapshot and returns the next
//! sub-phase together with the partial update that gets there. The host's
//! manual advance and the timer poller both call it, so the two paths
//! cannot drift apart.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{GameError, GameResult};
use crate::store::{FieldUpdate, MatchUpdate, Timestamp};
use crate::util::rng::RandomSource;

use super::night::{self, NightMode};
use super::player::{self, DeathCause};
use super::r#match::{GameState, Match, MatchStatus, Phase, SubmissionTable};
use super::vote;
use super::win::{self, WinVerdict};

pub const ROLE_REVEAL_MS: u64 = 10_000;
pub const NIGHT_OUTCOME_MS: u64 = 5_000;
pub const VOTING_OUTCOME_MS: u64 = 5_000;
pub const EVENT_SHARING_BASE_MS: u64 = 5_000;
pub const EVENT_SHARING_PER_EVENT_MS: u64 = 5_000;

/// Reading time grows with the number of public events
pub fn event_sharing_ms(event_count: usize) -> u64 {
    EVENT_SHARING_BASE_MS + EVENT_SHARING_PER_EVENT_MS * event_count as u64
}

/// Summary of where a transition landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub game_state: GameState,
    pub phase: Phase,
    pub day_count: u32,
    pub phase_time_limit_ms: u64,
}

impl PhaseReport {
    pub fn of(record: &Match) -> Self {
        Self {
            game_state: record.game_state,
            phase: record.phase(),
            day_count: record.day_count,
            phase_time_limit_ms: record.phase_time_limit_ms,
        }
    }
}

/// The outcome of one step of the state machine, not yet written
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: GameState,
    pub next_state: GameState,
    pub day_count: u32,
    pub time_limit_ms: u64,
    pub update: MatchUpdate,
    /// Set whenever the win evaluator ran during this step
    pub verdict: Option<WinVerdict>,
}

impl Transition {
    fn to(record: &Match, next_state: GameState, time_limit_ms: u64) -> Self {
        let update = MatchUpdate::new()
            .set(FieldUpdate::GameState(next_state))
            .set(FieldUpdate::PhaseTimeLimit(time_limit_ms))
            .set(FieldUpdate::PhaseStartedAt(Timestamp::Server));
        Self {
            from: record.game_state,
            next_state,
            day_count: record.day_count,
            time_limit_ms,
            update,
            verdict: None,
        }
    }

    fn with(mut self, field: FieldUpdate) -> Self {
        self.update.push(field);
        self
    }

    pub fn is_game_over(&self) -> bool {
        self.next_state == GameState::GameOver
    }
}

/// Compute the step out of the match's current sub-phase
pub fn transition(
    record: &Match,
    rng: &mut (impl RandomSource + ?Sized),
) -> GameResult<Transition> {
    let settings = &record.game_settings;

    let step = match record.game_state {
        GameState::Lobby => {
            return Err(GameError::conflict("The game has not started yet"));
        }
        GameState::GameOver => {
            return Err(GameError::conflict("The game is already over"));
        }

        GameState::RoleReveal => enter_night(record, record.day_count),

        GameState::NightPhase => {
            let mode = if record.day_count == 1 && !settings.allow_first_night_kill {
                NightMode::InformationOnly
            } else {
                NightMode::Full
            };
            let resolution = night::resolve(&record.players, &record.role_data, mode, rng);
            let verdict = evaluate(record, &resolution.players);

            let mut step = Transition::to(record, GameState::NightOutcome, NIGHT_OUTCOME_MS)
                .with(FieldUpdate::Players(resolution.players))
                .with(FieldUpdate::NightEvents(resolution.night_events))
                .with(FieldUpdate::PrivateEvents(resolution.private_events))
                .with(FieldUpdate::RoleData(resolution.role_data));
            if let Some(verdict) = verdict {
                step = step.with(FieldUpdate::WinCondition(Some(verdict)));
            }
            step.verdict = verdict;
            step
        }

        GameState::NightOutcome => match finished(record) {
            Some(_) => end_game(record),
            None => Transition::to(
                record,
                GameState::EventSharing,
                event_sharing_ms(record.night_events.len()),
            ),
        },

        GameState::EventSharing => Transition::to(
            record,
            GameState::DiscussionPhase,
            settings.discussion_duration_secs * 1000,
        ),

        GameState::DiscussionPhase => Transition::to(
            record,
            GameState::VotingPhase,
            settings.voting_duration_secs * 1000,
        )
        .with(FieldUpdate::Votes(BTreeMap::new())),

        GameState::VotingPhase => {
            let result = vote::tally(&record.votes, &record.players);
            let mut players = record.players.clone();
            let mut verdict = None;
            if let Some(eliminated) = &result.eliminated {
                if let Some(p) = player::find_mut(&mut players, &eliminated.id) {
                    p.kill(DeathCause::Vote, "vote");
                }
                verdict = evaluate(record, &players);
            }

            let mut step = Transition::to(record, GameState::VotingOutcome, VOTING_OUTCOME_MS)
                .with(FieldUpdate::Players(players))
                .with(FieldUpdate::LastDayResult(Some(result)))
                .with(FieldUpdate::Votes(BTreeMap::new()));
            if let Some(verdict) = verdict {
                step = step.with(FieldUpdate::WinCondition(Some(verdict)));
            }
            step.verdict = verdict;
            step
        }

        GameState::VotingOutcome => match finished(record) {
            Some(_) => end_game(record),
            None => enter_night(record, record.day_count + 1),
        },
    };

    Ok(step)
}

/// `None` when win conditions are switched off for this match
fn evaluate(record: &Match, players: &[player::Player]) -> Option<WinVerdict> {
    if record.game_settings.disable_win_conditions {
        None
    } else {
        Some(win::evaluate(players))
    }
}

fn finished(record: &Match) -> Option<&WinVerdict> {
    record.win_condition.as_ref().filter(|v| v.game_over)
}

fn enter_night(record: &Match, day_count: u32) -> Transition {
    let mut step = Transition::to(
        record,
        GameState::NightPhase,
        record.game_settings.night_duration_secs * 1000,
    )
    .with(FieldUpdate::DayCount(day_count))
    .with(FieldUpdate::RoleData(SubmissionTable::fresh(&record.players)))
    .with(FieldUpdate::NightEvents(Vec::new()))
    .with(FieldUpdate::PrivateEvents(BTreeMap::new()));
    step.day_count = day_count;
    step
}

fn end_game(record: &Match) -> Transition {
    let mut step = Transition::to(record, GameState::GameOver, 0)
        .with(FieldUpdate::Status(MatchStatus::Ended));
    step.verdict = record.win_condition;
    step
}
