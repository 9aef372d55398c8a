//! Role roster, faction membership and read-only role reference data

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Teams a role can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    /// Wins by eliminating every Bandit
    Town,
    /// Wins by reaching parity with the Town
    Bandit,
    /// Solo roles with their own win conditions
    Neutral,
}

/// Every role a player can be dealt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Villager,
    Doctor,
    Sheriff,
    Escort,
    Peeper,
    Gunslinger,
    Gunman,
    Chieftain,
    Jester,
}

/// What a role does with its night submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightAbility {
    Protect,
    Investigate,
    Block,
    Watch,
    Shoot,
    Kill,
    Order,
}

/// How an investigated player appears to the Sheriff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Appearance {
    Suspicious,
    Innocent,
}

/// Total bullets a Gunslinger gets per game
pub const GUNSLINGER_BULLETS: u32 = 1;

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Villager,
        Role::Doctor,
        Role::Sheriff,
        Role::Escort,
        Role::Peeper,
        Role::Gunslinger,
        Role::Gunman,
        Role::Chieftain,
        Role::Jester,
    ];

    pub fn faction(self) -> Faction {
        match self {
            Role::Villager
            | Role::Doctor
            | Role::Sheriff
            | Role::Escort
            | Role::Peeper
            | Role::Gunslinger => Faction::Town,
            Role::Gunman | Role::Chieftain => Faction::Bandit,
            Role::Jester => Faction::Neutral,
        }
    }

    pub fn night_ability(self) -> Option<NightAbility> {
        match self {
            Role::Doctor => Some(NightAbility::Protect),
            Role::Sheriff => Some(NightAbility::Investigate),
            Role::Escort => Some(NightAbility::Block),
            Role::Peeper => Some(NightAbility::Watch),
            Role::Gunslinger => Some(NightAbility::Shoot),
            Role::Gunman => Some(NightAbility::Kill),
            Role::Chieftain => Some(NightAbility::Order),
            Role::Villager | Role::Jester => None,
        }
    }

    /// Kill and order submissions are suppressed on a protected first night
    pub fn is_lethal(self) -> bool {
        matches!(
            self.night_ability(),
            Some(NightAbility::Shoot | NightAbility::Kill | NightAbility::Order)
        )
    }

    /// Whether this role may name itself as its night target
    pub fn may_self_target(self) -> bool {
        matches!(self, Role::Doctor | Role::Sheriff)
    }

    /// Sheriff classification; the Chieftain always reads as innocent
    pub fn appearance(self) -> Appearance {
        match self {
            Role::Gunman => Appearance::Suspicious,
            _ => Appearance::Innocent,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Role::Villager => "You have no night ability. Find the Bandits and vote them out. Town team.",
            Role::Doctor => "You can protect one player each night from being killed. You can only self-protect once per game. Town team.",
            Role::Sheriff => "You investigate players at night to determine if they are suspicious or innocent. Chieftain appears innocent despite being a Bandit. Town team.",
            Role::Escort => "You block another player from using their night ability. Target's role action won't be processed that night. Town team.",
            Role::Peeper => "You watch a player at night and see who visits them. You don't learn the roles of visitors, just that they visited. Town team.",
            Role::Gunslinger => "You have a single bullet for the whole game. Your shot cannot be stopped by the Doctor, but it reveals you to everyone. While you live, the Bandits cannot win by parity. Town team.",
            Role::Gunman => "You can kill one player each night. While the Chieftain lives, you carry out the Chieftain's orders instead of choosing. Bandit team.",
            Role::Chieftain => "You issue kill orders to a Gunman. You appear innocent to Sheriff investigations. If no Gunman remains, you take over killing. Bandit team.",
            Role::Jester => "You have no night ability. You win if voted out by the town during day phase. Neutral team.",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Villager => "Villager",
            Role::Doctor => "Doctor",
            Role::Sheriff => "Sheriff",
            Role::Escort => "Escort",
            Role::Peeper => "Peeper",
            Role::Gunslinger => "Gunslinger",
            Role::Gunman => "Gunman",
            Role::Chieftain => "Chieftain",
            Role::Jester => "Jester",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
