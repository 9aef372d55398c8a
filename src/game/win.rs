//! Win condition evaluation

use serde::{Deserialize, Serialize};

use super::player::{DeathCause, Player};
use super::role::{Faction, Role};

/// Living players per faction at evaluation time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliveCount {
    pub town: usize,
    pub bandit: usize,
    pub neutral: usize,
    pub total: usize,
}

impl AliveCount {
    pub fn of(players: &[Player]) -> Self {
        let mut count = AliveCount::default();
        for player in players.iter().filter(|p| p.is_alive) {
            count.total += 1;
            match player.faction() {
                Some(Faction::Town) => count.town += 1,
                Some(Faction::Bandit) => count.bandit += 1,
                Some(Faction::Neutral) => count.neutral += 1,
                None => {}
            }
        }
        count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Winner {
    Faction(Faction),
    /// A solo role wins on its own
    Role(Role),
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinType {
    /// Every Bandit is gone
    Elimination,
    /// Bandits outnumber or match the Town
    Parity,
    /// The Jester got itself voted out
    VotedOut,
    /// The last neutral player alive
    LastStanding,
    /// Nobody survived
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinVerdict {
    pub game_over: bool,
    pub winner: Option<Winner>,
    pub win_type: Option<WinType>,
    pub alive_count: AliveCount,
}

impl WinVerdict {
    fn ongoing(alive_count: AliveCount) -> Self {
        Self {
            game_over: false,
            winner: None,
            win_type: None,
            alive_count,
        }
    }

    fn won(winner: Winner, win_type: WinType, alive_count: AliveCount) -> Self {
        Self {
            game_over: true,
            winner: Some(winner),
            win_type: Some(win_type),
            alive_count,
        }
    }
}

/// The role whose survival denies the Bandits a parity win
pub const NEUTRALIZER: Role = Role::Gunslinger;
/// The role that wins by being voted out
pub const VOTE_SEEKER: Role = Role::Jester;

/// Later rules override earlier ones within a single pass
pub fn evaluate(players: &[Player]) -> WinVerdict {
    let alive = AliveCount::of(players);
    let mut verdict = WinVerdict::ongoing(alive);

    if alive.bandit == 0 && alive.town > 0 {
        verdict = WinVerdict::won(Winner::Faction(Faction::Town), WinType::Elimination, alive);
    } else if alive.bandit > 0 {
        let neutralizer_alive = players
            .iter()
            .any(|p| p.is_alive && p.holds(NEUTRALIZER));
        if alive.bandit > alive.town || (alive.bandit == alive.town && !neutralizer_alive) {
            verdict = WinVerdict::won(Winner::Faction(Faction::Bandit), WinType::Parity, alive);
        }
    }

    let voted_out = players
        .iter()
        .any(|p| p.holds(VOTE_SEEKER) && !p.is_alive && p.killed_by == Some(DeathCause::Vote));
    if voted_out {
        verdict = WinVerdict::won(Winner::Role(VOTE_SEEKER), WinType::VotedOut, alive);
    }

    if alive.town == 0 && alive.bandit == 0 && alive.neutral == 1 {
        if let Some(role) = players
            .iter()
            .find(|p| p.is_alive && p.faction() == Some(Faction::Neutral))
            .and_then(|p| p.role)
        {
            verdict = WinVerdict::won(Winner::Role(role), WinType::LastStanding, alive);
        }
    }

    if alive.total == 0 {
        verdict = WinVerdict::won(Winner::Draw, WinType::Draw, alive);
    }

    verdict
}
