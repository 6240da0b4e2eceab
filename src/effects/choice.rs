use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{GameError, GameResult};
use crate::TileId;

/// The kind of player input a suspended turn is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Branch,
    Quiz,
    Gamble,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Branch => write!(f, "branch"),
            InputKind::Quiz => write!(f, "quiz"),
            InputKind::Gamble => write!(f, "gamble"),
        }
    }
}

/// A player's answer to a pending prompt, as decoded from the inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Choice {
    Branch(TileId),
    Quiz(usize),
    Gamble(WagerRequest),
}

impl Choice {
    pub fn kind(&self) -> InputKind {
        match self {
            Choice::Branch(_) => InputKind::Branch,
            Choice::Quiz(_) => InputKind::Quiz,
            Choice::Gamble(_) => InputKind::Gamble,
        }
    }
}

/// Unvalidated wager exactly as the client sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerRequest {
    #[serde(deserialize_with = "whole_bet")]
    pub bet: i64,
    pub choice: String,
}

/// Clients may send any JSON number; fractions are truncated toward zero.
fn whole_bet<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(bet) = number.as_i64() {
        return Ok(bet);
    }
    match number.as_f64() {
        Some(bet) if bet.is_finite() && bet.abs() < i64::MAX as f64 => Ok(bet.trunc() as i64),
        _ => Err(D::Error::custom(format!("bet {number} is out of range"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GambleCall {
    High,
    Low,
}

impl GambleCall {
    pub fn as_str(&self) -> &'static str {
        match self {
            GambleCall::High => "High",
            GambleCall::Low => "Low",
        }
    }
}

/// A validated wager. Resolution and payout belong to the turn engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wager {
    pub bet: i64,
    pub call: GambleCall,
}

impl WagerRequest {
    pub fn validate(&self) -> GameResult<Wager> {
        if self.bet <= 0 {
            return Err(GameError::invalid_wager(format!(
                "bet must be positive, got {}",
                self.bet
            )));
        }
        let call = match self.choice.as_str() {
            "High" => GambleCall::High,
            "Low" => GambleCall::Low,
            other => {
                return Err(GameError::invalid_wager(format!(
                    "choice must be High or Low, got {other:?}"
                )))
            }
        };
        Ok(Wager {
            bet: self.bet,
            call,
        })
    }
}

impl Wager {
    /// A roll at or above the reference value counts as High.
    pub fn wins(&self, roll: u8, reference: u8) -> bool {
        let high = roll >= reference;
        match self.call {
            GambleCall::High => high,
            GambleCall::Low => !high,
        }
    }
}

pub(crate) fn expect_kind(
    choice: Option<&Choice>,
    expected: InputKind,
    tile_id: TileId,
) -> GameResult<&Choice> {
    let choice = choice.ok_or(GameError::MissingChoice { tile_id })?;
    if choice.kind() != expected {
        return Err(GameError::mismatch(expected.to_string(), choice.kind().to_string()));
    }
    Ok(choice)
}
