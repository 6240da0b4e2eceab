use serde::Serialize;
use serde_json::Value;

use crate::board::{QuizPrompt, TileRecord};
use crate::effects::StatusKey;
use crate::errors::SugorokuError;
use crate::{PlayerId, TileId};

/// Outbound events, serialized as `{"type": "...", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerEvent {
    DiceResult {
        #[serde(rename = "userID")]
        user_id: PlayerId,
        #[serde(rename = "diceResult")]
        dice_result: u8,
    },
    PlayerMoved {
        #[serde(rename = "userID")]
        user_id: PlayerId,
        #[serde(rename = "newPosition")]
        new_position: TileId,
    },
    MoneyChanged {
        #[serde(rename = "userID")]
        user_id: PlayerId,
        #[serde(rename = "newMoney")]
        new_money: i64,
    },
    PlayerStatusChanged {
        #[serde(rename = "userID")]
        user_id: PlayerId,
        status: StatusKey,
        value: Value,
    },
    BranchChoiceRequired {
        #[serde(rename = "tileID")]
        tile_id: TileId,
        options: Vec<TileId>,
    },
    QuizRequired {
        #[serde(rename = "tileID")]
        tile_id: TileId,
        #[serde(rename = "quizData")]
        quiz_data: QuizPrompt,
    },
    GambleRequired {
        #[serde(rename = "tileID")]
        tile_id: TileId,
        #[serde(rename = "referenceValue")]
        reference_value: u8,
    },
    GambleResult {
        #[serde(rename = "userID")]
        user_id: PlayerId,
        #[serde(rename = "diceResult")]
        dice_result: u8,
        choice: String,
        won: bool,
        amount: i64,
        #[serde(rename = "newMoney")]
        new_money: i64,
    },
    PlayerFinished {
        #[serde(rename = "userID")]
        user_id: PlayerId,
        #[serde(rename = "finalMoney")]
        final_money: i64,
    },
    Tiles {
        tiles: Vec<TileRecord>,
    },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::DiceResult { .. } => "DICE_RESULT",
            ServerEvent::PlayerMoved { .. } => "PLAYER_MOVED",
            ServerEvent::MoneyChanged { .. } => "MONEY_CHANGED",
            ServerEvent::PlayerStatusChanged { .. } => "PLAYER_STATUS_CHANGED",
            ServerEvent::BranchChoiceRequired { .. } => "BRANCH_CHOICE_REQUIRED",
            ServerEvent::QuizRequired { .. } => "QUIZ_REQUIRED",
            ServerEvent::GambleRequired { .. } => "GAMBLE_REQUIRED",
            ServerEvent::GambleResult { .. } => "GAMBLE_RESULT",
            ServerEvent::PlayerFinished { .. } => "PLAYER_FINISHED",
            ServerEvent::Tiles { .. } => "TILES",
        }
    }
}

/// Error reply sent to the originating client only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "error")]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
}

impl ErrorMessage {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&SugorokuError> for ErrorMessage {
    fn from(error: &SugorokuError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_shape() {
        let moved = ServerEvent::PlayerMoved {
            user_id: "u1".to_string(),
            new_position: 4,
        };
        assert_eq!(
            serde_json::to_value(&moved).unwrap(),
            json!({"type": "PLAYER_MOVED", "payload": {"userID": "u1", "newPosition": 4}})
        );

        let status = ServerEvent::PlayerStatusChanged {
            user_id: "u1".to_string(),
            status: StatusKey::Married,
            value: json!(true),
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"type": "PLAYER_STATUS_CHANGED", "payload": {"userID": "u1", "status": "isMarried", "value": true}})
        );
    }

    #[test]
    fn test_prompt_events() {
        let quiz = ServerEvent::QuizRequired {
            tile_id: 7,
            quiz_data: QuizPrompt {
                question: "q".to_string(),
                options: vec!["a".to_string()],
            },
        };
        assert_eq!(
            serde_json::to_value(&quiz).unwrap(),
            json!({"type": "QUIZ_REQUIRED", "payload": {"tileID": 7, "quizData": {"question": "q", "options": ["a"]}}})
        );
        let gamble = ServerEvent::GambleRequired {
            tile_id: 8,
            reference_value: 3,
        };
        assert_eq!(gamble.name(), "GAMBLE_REQUIRED");
        assert_eq!(
            serde_json::to_value(&gamble).unwrap()["payload"]["referenceValue"],
            json!(3)
        );
    }

    #[test]
    fn test_error_message_shape() {
        let error = ErrorMessage::new("unknown_request", "Unknown request type: DANCE");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"type": "error", "code": "unknown_request", "message": "Unknown request type: DANCE"})
        );
    }
}
