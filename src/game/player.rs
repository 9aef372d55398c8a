//! Player roster entries

use serde::{Deserialize, Serialize};

use super::role::{Faction, Role};

pub type PlayerId = String;

/// Category of whatever removed a player from the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Faction kill carried out by a Gunman or Chieftain
    Bandits,
    /// The Gunslinger's single shot
    Gunslinger,
    /// Day vote
    Vote,
}

/// Authoritative player state inside a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// `None` until the game starts and roles are dealt
    pub role: Option<Role>,
    pub is_alive: bool,
    pub killed_by: Option<DeathCause>,
    /// Name of the executing actor, or "vote"
    pub eliminated_by: Option<String>,
    #[serde(default)]
    pub self_protection_used: bool,
    #[serde(default)]
    pub bullets_used: u32,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: None,
            is_alive: true,
            killed_by: None,
            eliminated_by: None,
            self_protection_used: false,
            bullets_used: 0,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn faction(&self) -> Option<Faction> {
        self.role.map(Role::faction)
    }

    pub fn holds(&self, role: Role) -> bool {
        self.role == Some(role)
    }

    pub fn kill(&mut self, cause: DeathCause, by: impl Into<String>) {
        self.is_alive = false;
        self.killed_by = Some(cause);
        self.eliminated_by = Some(by.into());
    }
}

/// Find a player by id
pub fn find<'a>(players: &'a [Player], id: &str) -> Option<&'a Player> {
    players.iter().find(|p| p.id == id)
}

pub fn find_mut<'a>(players: &'a mut [Player], id: &str) -> Option<&'a mut Player> {
    players.iter_mut().find(|p| p.id == id)
}

pub fn alive_count(players: &[Player]) -> usize {
    players.iter().filter(|p| p.is_alive).count()
}

/// Whether any alive player holds `role`
pub fn any_alive(players: &[Player], role: Role) -> bool {
    players.iter().any(|p| p.is_alive && p.holds(role))
}
