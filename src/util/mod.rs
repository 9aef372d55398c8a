//! Shared utilities

pub mod rng;
pub mod time;

pub use rng::{ChaChaSource, RandomSource, ScriptedSource};
pub use time::{Clock, ManualClock, SystemClock};
