//! Validation of night submissions and day votes
//!
//! Both checks run against a snapshot of the match and produce a single
//! field-scoped write, so concurrent submitters never overwrite each other.

use crate::error::{GameError, GameResult};
use crate::store::FieldUpdate;

use super::player::{self, Player};
use super::r#match::{GameState, Match, RoleSubmission};
use super::role::{Faction, Role, GUNSLINGER_BULLETS};

/// Validate a night action; `None` as the target retracts an earlier choice
pub fn role_action(
    record: &Match,
    role: Role,
    actor_id: &str,
    target_id: Option<&str>,
) -> GameResult<FieldUpdate> {
    if record.game_state != GameState::NightPhase {
        return Err(GameError::conflict(format!(
            "Night actions are only accepted during night_phase, not {}",
            record.game_state.as_str()
        )));
    }

    if role.night_ability().is_none() {
        return Err(GameError::validation(format!("{} has no night action", role)));
    }

    let actor = record
        .player(actor_id)
        .ok_or_else(|| GameError::forbidden(format!("{} is not in this match", actor_id)))?;
    if !actor.is_alive {
        return Err(GameError::forbidden("Dead players cannot act"));
    }
    if !actor.holds(role) {
        return Err(GameError::forbidden(format!("You are not the {}", role)));
    }
    if role == Role::Gunman && player::any_alive(&record.players, Role::Chieftain) {
        return Err(GameError::forbidden(
            "The Chieftain is alive; wait for their orders",
        ));
    }

    let Some(target_id) = target_id else {
        return Ok(FieldUpdate::Submission(RoleSubmission::new(
            actor_id, role, None,
        )));
    };

    let target = target_for(&record.players, target_id)?;
    check_target(role, actor, target)?;

    Ok(FieldUpdate::Submission(RoleSubmission::new(
        actor_id,
        role,
        Some(target.id.clone()),
    )))
}

/// Validate a day vote; `None` as the target retracts the voter's ballot
pub fn vote(record: &Match, voter_id: &str, target_id: Option<&str>) -> GameResult<FieldUpdate> {
    if record.game_state != GameState::VotingPhase {
        return Err(GameError::conflict(format!(
            "Votes are only accepted during voting_phase, not {}",
            record.game_state.as_str()
        )));
    }

    let voter = record
        .player(voter_id)
        .ok_or_else(|| GameError::forbidden(format!("{} is not in this match", voter_id)))?;
    if !voter.is_alive {
        return Err(GameError::forbidden("Dead players cannot vote"));
    }

    let target_id = match target_id {
        Some(id) => Some(target_for(&record.players, id)?.id.clone()),
        None => None,
    };

    Ok(FieldUpdate::Vote {
        voter_id: voter.id.clone(),
        target_id,
    })
}

fn target_for<'a>(players: &'a [Player], target_id: &str) -> GameResult<&'a Player> {
    if target_id.trim().is_empty() {
        return Err(GameError::validation("Target id is empty"));
    }
    let target = player::find(players, target_id)
        .ok_or_else(|| GameError::NotFound(format!("Player {} not found", target_id)))?;
    if !target.is_alive {
        return Err(GameError::validation(format!("{} is already dead", target.name)));
    }
    Ok(target)
}

fn check_target(role: Role, actor: &Player, target: &Player) -> GameResult<()> {
    if actor.id == target.id {
        if !role.may_self_target() {
            return Err(GameError::validation(format!(
                "The {} cannot target themselves",
                role
            )));
        }
        if role == Role::Doctor && actor.self_protection_used {
            return Err(GameError::validation(
                "You have already protected yourself once this game",
            ));
        }
    }

    match role {
        Role::Chieftain if target.faction() == Some(Faction::Bandit) => Err(
            GameError::validation("You cannot order a kill on a fellow Bandit"),
        ),
        Role::Gunslinger if actor.bullets_used >= GUNSLINGER_BULLETS => {
            Err(GameError::validation("You have no bullets left"))
        }
        _ => Ok(()),
    }
}
