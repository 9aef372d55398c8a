//! Game rules: roles, night resolution, voting, win conditions and the
//! phase controller that ties them together

pub mod controller;
pub mod r#match;
pub mod night;
pub mod phase;
pub mod player;
pub mod role;
pub mod submission;
pub mod vote;
pub mod win;

pub use controller::{AutoAdvance, MatchView, PhaseController, RoleInfo};
pub use r#match::{GameSettings, GameState, Match, MatchStatus, Phase};
pub use phase::PhaseReport;
pub use player::{Player, PlayerId};
pub use role::{Faction, Role};
