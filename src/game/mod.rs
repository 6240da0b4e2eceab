// src/game/mod.rs
pub mod events;
pub mod manager;
pub mod state;

pub use events::{ErrorMessage, ServerEvent};
pub use manager::{GameManager, GameSettings, TurnOutcome};
pub use state::GameState;
