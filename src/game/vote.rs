//! Day vote tally

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::player::{self, Player, PlayerId};
use super::role::Role;

/// The player removed by the town
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eliminated {
    pub id: PlayerId,
    pub name: String,
    pub role: Option<Role>,
    pub vote_count: usize,
}

/// Outcome of one day's vote, kept as `last_day_result`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub eliminated: Option<Eliminated>,
    pub vote_counts: BTreeMap<PlayerId, usize>,
    pub required_votes: usize,
    pub total_alive_players: usize,
}

/// Majority of the living, rounded up
pub fn required_votes(alive: usize) -> usize {
    alive.div_ceil(2)
}

/// A single leader at or above the threshold is eliminated; any tie saves everyone
pub fn tally(votes: &BTreeMap<PlayerId, PlayerId>, players: &[Player]) -> VoteTally {
    let total_alive_players = player::alive_count(players);
    let required_votes = required_votes(total_alive_players);

    let mut vote_counts: BTreeMap<PlayerId, usize> = BTreeMap::new();
    for target in votes.values() {
        *vote_counts.entry(target.clone()).or_default() += 1;
    }

    let max = vote_counts.values().copied().max().unwrap_or(0);
    let leaders: Vec<&PlayerId> = vote_counts
        .iter()
        .filter(|(_, count)| **count == max)
        .map(|(id, _)| id)
        .collect();

    let eliminated = match leaders.as_slice() {
        [only] if max >= required_votes && max > 0 => {
            player::find(players, only).map(|p| Eliminated {
                id: p.id.clone(),
                name: p.name.clone(),
                role: p.role,
                vote_count: max,
            })
        }
        _ => None,
    };

    VoteTally {
        eliminated,
        vote_counts,
        required_votes,
        total_alive_players,
    }
}
