use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PlayerId, TileId};

/// Top-level error type for the whole session server
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum SugorokuError {
    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Board error: {0}")]
    Board(#[from] BoardError),

    #[error("Infrastructure error: {0}")]
    Infrastructure(#[from] InfrastructureError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Turn and effect errors. All of them are local to the requesting client.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameError {
    #[error("No choice is pending for player {player_id}")]
    NoPendingChoice { player_id: PlayerId },

    #[error("Player {player_id} must answer the pending {pending} first")]
    ChoicePending { player_id: PlayerId, pending: String },

    #[error("Expected a {expected} choice, got {got}")]
    ChoiceMismatch { expected: String, got: String },

    #[error("Effect on tile {tile_id} needs a choice")]
    MissingChoice { tile_id: TileId },

    #[error("Tile {target} is not reachable from tile {tile_id}")]
    InvalidBranchTarget { tile_id: TileId, target: TileId },

    #[error("Unknown quiz: {quiz_id}")]
    UnknownQuiz { quiz_id: u32 },

    #[error("Invalid wager: {details}")]
    InvalidWager { details: String },

    #[error("Negative amount rejected: {amount}")]
    NegativeAmount { amount: i64 },

    #[error("Tile not found: {tile_id}")]
    TileNotFound { tile_id: TileId },
}

/// Player registry errors
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerError {
    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: PlayerId },

    #[error("Player already exists: {player_id}")]
    PlayerAlreadyExists { player_id: PlayerId },

    #[error("Player authentication failed: {details}")]
    AuthenticationFailed { details: String },
}

/// Network/WebSocket errors
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetworkError {
    #[error("Recipient not found: {player_id}")]
    RecipientNotFound { player_id: PlayerId },

    #[error("Outbound queue full for {player_id}, message dropped")]
    QueueFull { player_id: PlayerId },

    #[error("Message serialization failed: {details}")]
    SerializationFailed { details: String },

    #[error("Message deserialization failed: {details}")]
    DeserializationFailed { details: String },

    #[error("Invalid payload for {request}: {details}")]
    InvalidPayload { request: String, details: String },

    #[error("Unknown request type: {request}")]
    UnknownRequest { request: String },

    #[error("Connection closed unexpectedly: {details}")]
    ConnectionClosed { details: String },
}

/// Board definition errors. These are fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoardError {
    #[error("Could not read {path}: {details}")]
    Read { path: String, details: String },

    #[error("Malformed board definition: {details}")]
    Parse { details: String },

    #[error("Duplicate tile id: {tile_id}")]
    DuplicateTile { tile_id: TileId },

    #[error("Tile {tile_id} references unknown tile {reference}")]
    UnknownReference { tile_id: TileId, reference: TileId },

    #[error("Start tile {tile_id} does not exist")]
    MissingStart { tile_id: TileId },

    #[error("Invalid effect on tile {tile_id}: {details}")]
    InvalidEffect { tile_id: TileId, details: String },

    #[error("Tile {tile_id} has {nexts} outgoing edges but no branch effect")]
    UnresolvableFork { tile_id: TileId, nexts: usize },

    #[error("Malformed quiz file: {details}")]
    Quiz { details: String },
}

/// Infrastructure errors (results persistence, configuration)
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InfrastructureError {
    #[error("Results store error: {details}")]
    ResultsStore { details: String },

    #[error("Configuration error: {details}")]
    Configuration { details: String },
}

/// Result type aliases for convenience
pub type SugorokuResult<T> = Result<T, SugorokuError>;
pub type GameResult<T> = Result<T, GameError>;
pub type BoardResult<T> = Result<T, BoardError>;
pub type NetworkResult<T> = Result<T, NetworkError>;

impl SugorokuError {
    /// Stable machine-readable code sent to clients in `error` events.
    pub fn code(&self) -> &'static str {
        match self {
            SugorokuError::Game(GameError::NoPendingChoice { .. }) => "no_pending_choice",
            SugorokuError::Game(GameError::ChoicePending { .. }) => "choice_pending",
            SugorokuError::Game(GameError::UnknownQuiz { .. }) => "unknown_quiz",
            SugorokuError::Game(GameError::TileNotFound { .. }) => "tile_not_found",
            SugorokuError::Game(_) => "invalid_choice",
            SugorokuError::Player(PlayerError::PlayerNotFound { .. }) => "player_not_found",
            SugorokuError::Player(_) => "player_error",
            SugorokuError::Network(NetworkError::UnknownRequest { .. }) => "unknown_request",
            SugorokuError::Network(NetworkError::DeserializationFailed { .. }) => "invalid_json",
            SugorokuError::Network(NetworkError::InvalidPayload { .. }) => "invalid_payload",
            SugorokuError::Network(NetworkError::RecipientNotFound { .. }) => "recipient_not_found",
            SugorokuError::Network(_) => "network_error",
            SugorokuError::Board(_) => "board_error",
            SugorokuError::Infrastructure(_) => "infrastructure_error",
            SugorokuError::Validation(_) => "validation_error",
            SugorokuError::Internal(_) => "internal_error",
        }
    }
}

/// Helper methods for creating common errors
impl GameError {
    pub fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::ChoiceMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn invalid_wager(details: impl Into<String>) -> Self {
        Self::InvalidWager {
            details: details.into(),
        }
    }
}

impl PlayerError {
    pub fn not_found(player_id: impl Into<PlayerId>) -> Self {
        Self::PlayerNotFound {
            player_id: player_id.into(),
        }
    }
}

impl NetworkError {
    pub fn serialization_failed(details: impl Into<String>) -> Self {
        Self::SerializationFailed {
            details: details.into(),
        }
    }

    pub fn invalid_payload(request: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidPayload {
            request: request.into(),
            details: details.into(),
        }
    }
}

impl BoardError {
    pub fn parse(details: impl Into<String>) -> Self {
        Self::Parse {
            details: details.into(),
        }
    }

    pub fn invalid_effect(tile_id: TileId, details: impl Into<String>) -> Self {
        Self::InvalidEffect {
            tile_id,
            details: details.into(),
        }
    }
}

/// Convert from string to SugorokuError for backwards compatibility
impl From<String> for SugorokuError {
    fn from(msg: String) -> Self {
        SugorokuError::Internal(msg)
    }
}

impl From<&str> for SugorokuError {
    fn from(msg: &str) -> Self {
        SugorokuError::Internal(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_for_client_errors() {
        let unknown: SugorokuError = NetworkError::UnknownRequest {
            request: "DANCE".to_string(),
        }
        .into();
        assert_eq!(unknown.code(), "unknown_request");

        let branch: SugorokuError = GameError::InvalidBranchTarget {
            tile_id: 2,
            target: 9,
        }
        .into();
        assert_eq!(branch.code(), "invalid_choice");
        assert_eq!(
            branch.to_string(),
            "Game error: Tile 9 is not reachable from tile 2"
        );

        let missing: SugorokuError = PlayerError::not_found("p1").into();
        assert_eq!(missing.code(), "player_not_found");
    }
}
