// Sugoroku Server Library
//
// A board-track session server: clients connect over WebSocket, the hub fans
// game events out to every session, and the turn engine walks players along a
// tile graph applying each tile's effect.

// Board data and tile effects
pub mod board;
pub mod dice;
pub mod effects;
pub mod player;

// Turn engine
pub mod actions;
pub mod game;

// Server implementation
pub mod application;
pub mod config;
pub mod hub;
pub mod identity;
pub mod results;
pub mod websocket;

pub mod errors;

// Re-export common types for convenient access
pub use crate::actions::ClientRequest;
pub use crate::board::{load_board, parse_board, QuizBank, TileGraph};
pub use crate::config::ServerConfig;
pub use crate::errors::{SugorokuError, SugorokuResult};
pub use crate::game::{GameManager, GameSettings, ServerEvent, TurnOutcome};
pub use crate::hub::{ConnectionHub, SessionHandle};
pub use crate::player::{Player, PlayerSnapshot};

// Common types used throughout the application
pub type PlayerId = String;
pub type TileId = u32;
pub type QuizId = u32;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
