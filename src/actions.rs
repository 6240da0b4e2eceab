use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::effects::{Choice, WagerRequest};
use crate::errors::{NetworkError, NetworkResult};
use crate::TileId;

/// Raw inbound envelope: `{"type": "...", "payload": {...}}`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct Selection<T> {
    selection: T,
}

/// Requests a connected client can make
#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    RollDice,
    SubmitChoice(TileId),
    SubmitQuiz(usize),
    SubmitGamble(WagerRequest),
    GetTiles,
}

impl ClientRequest {
    /// Decodes one text frame. Undecodable JSON, unknown types and bad payloads
    /// map to distinct errors so the client can tell them apart.
    pub fn parse(text: &str) -> NetworkResult<Self> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| NetworkError::DeserializationFailed {
                details: e.to_string(),
            })?;

        match envelope.kind.as_str() {
            "ROLL_DICE" => Ok(ClientRequest::RollDice),
            "SUBMIT_CHOICE" | "SUBMIT_BRANCH" => {
                let Selection { selection } = payload(&envelope)?;
                Ok(ClientRequest::SubmitChoice(selection))
            }
            "SUBMIT_QUIZ" => {
                let Selection { selection } = payload(&envelope)?;
                Ok(ClientRequest::SubmitQuiz(selection))
            }
            "SUBMIT_GAMBLE" => Ok(ClientRequest::SubmitGamble(payload(&envelope)?)),
            "GET_TILES" => Ok(ClientRequest::GetTiles),
            other => Err(NetworkError::UnknownRequest {
                request: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientRequest::RollDice => "ROLL_DICE",
            ClientRequest::SubmitChoice(_) => "SUBMIT_CHOICE",
            ClientRequest::SubmitQuiz(_) => "SUBMIT_QUIZ",
            ClientRequest::SubmitGamble(_) => "SUBMIT_GAMBLE",
            ClientRequest::GetTiles => "GET_TILES",
        }
    }

    /// The answer carried by a submit request, if any.
    pub fn into_choice(self) -> Option<Choice> {
        match self {
            ClientRequest::SubmitChoice(tile) => Some(Choice::Branch(tile)),
            ClientRequest::SubmitQuiz(index) => Some(Choice::Quiz(index)),
            ClientRequest::SubmitGamble(wager) => Some(Choice::Gamble(wager)),
            ClientRequest::RollDice | ClientRequest::GetTiles => None,
        }
    }
}

fn payload<T: DeserializeOwned>(envelope: &Envelope) -> NetworkResult<T> {
    T::deserialize(&envelope.payload)
        .map_err(|e| NetworkError::invalid_payload(envelope.kind.clone(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_requests() {
        assert_eq!(
            ClientRequest::parse(r#"{"type": "ROLL_DICE"}"#).unwrap(),
            ClientRequest::RollDice
        );
        assert_eq!(
            ClientRequest::parse(r#"{"type": "SUBMIT_BRANCH", "payload": {"selection": 4}}"#).unwrap(),
            ClientRequest::SubmitChoice(4)
        );
        assert_eq!(
            ClientRequest::parse(r#"{"type": "SUBMIT_QUIZ", "payload": {"selection": 2}}"#).unwrap(),
            ClientRequest::SubmitQuiz(2)
        );
        assert_eq!(
            ClientRequest::parse(r#"{"type": "SUBMIT_GAMBLE", "payload": {"bet": 500, "choice": "High"}}"#)
                .unwrap(),
            ClientRequest::SubmitGamble(WagerRequest {
                bet: 500,
                choice: "High".to_string()
            })
        );
        assert_eq!(
            ClientRequest::parse(r#"{"type": "SUBMIT_GAMBLE", "payload": {"bet": 100.0, "choice": "Low"}}"#)
                .unwrap(),
            ClientRequest::SubmitGamble(WagerRequest {
                bet: 100,
                choice: "Low".to_string()
            })
        );
        assert_eq!(
            ClientRequest::parse(r#"{"type": "GET_TILES", "payload": {}}"#).unwrap(),
            ClientRequest::GetTiles
        );
    }

    #[test]
    fn test_parse_errors_are_distinguished() {
        assert!(matches!(
            ClientRequest::parse("not json"),
            Err(NetworkError::DeserializationFailed { .. })
        ));
        assert_eq!(
            ClientRequest::parse(r#"{"type": "DANCE"}"#),
            Err(NetworkError::UnknownRequest {
                request: "DANCE".to_string()
            })
        );
        assert!(matches!(
            ClientRequest::parse(r#"{"type": "SUBMIT_QUIZ", "payload": {"selection": "two"}}"#),
            Err(NetworkError::InvalidPayload { .. })
        ));
        assert!(matches!(
            ClientRequest::parse(r#"{"type": "SUBMIT_CHOICE"}"#),
            Err(NetworkError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn test_into_choice() {
        assert_eq!(ClientRequest::SubmitChoice(3).into_choice(), Some(Choice::Branch(3)));
        assert_eq!(ClientRequest::RollDice.into_choice(), None);
    }
}
