//! Noonday - authoritative rules engine for a hidden-role party game
//!
//! Matches cycle through night and day sub-phases. Night submissions are
//! resolved in a fixed precedence, days end in a majority vote, and a win
//! evaluator closes each cycle. The phase controller is the only writer.

pub mod app;
pub mod config;
pub mod error;
pub mod game;
pub mod http;
pub mod store;
pub mod util;

pub use error::{GameError, GameResult};
