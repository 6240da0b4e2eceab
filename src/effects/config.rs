use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::money::MoneyFlow;
use super::status::{Condition, StatusChange, StatusKey};
use super::Effect;
use crate::errors::{BoardError, BoardResult};
use crate::{QuizId, TileId};

/// Tagged-union effect payload as written in the board file.
///
/// The `type` discriminator selects the variant; a missing or unknown
/// discriminator fails deserialization, which the loader treats as fatal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EffectConfig {
    Profit {
        amount: i64,
    },
    Loss {
        amount: i64,
    },
    Quiz {
        quiz_id: QuizId,
        amount: i64,
    },
    Branch,
    Overall {
        #[serde(default)]
        profit_amount: i64,
        #[serde(default)]
        loss_amount: i64,
    },
    Neighbor {
        #[serde(default)]
        profit_amount: i64,
        #[serde(default)]
        loss_amount: i64,
    },
    Require {
        require_value: i64,
    },
    Gamble,
    Conditional {
        condition: Condition,
        true_effect: Box<EffectConfig>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        else_effect: Option<Box<EffectConfig>>,
    },
    SetStatus {
        status: StatusKey,
        value: Value,
    },
    ChildBonus {
        #[serde(default)]
        profit_amount_per_child: i64,
        #[serde(default)]
        loss_amount_per_child: i64,
    },
    Goal,
    NoEffect,
}

impl EffectConfig {
    /// Validates the payload and builds the immutable effect for `tile_id`.
    pub fn build(&self, tile_id: TileId) -> BoardResult<Effect> {
        self.build_inner(tile_id, false)
    }

    fn build_inner(&self, tile_id: TileId, nested: bool) -> BoardResult<Effect> {
        let effect = match self {
            EffectConfig::Profit { amount } => Effect::Profit {
                amount: non_negative(tile_id, "amount", *amount)?,
            },
            EffectConfig::Loss { amount } => Effect::Loss {
                amount: non_negative(tile_id, "amount", *amount)?,
            },
            EffectConfig::Quiz { quiz_id, amount } => Effect::Quiz {
                quiz_id: *quiz_id,
                amount: non_negative(tile_id, "amount", *amount)?,
            },
            EffectConfig::Branch if nested => {
                return Err(BoardError::invalid_effect(
                    tile_id,
                    "branch cannot be the outcome of a condition",
                ))
            }
            EffectConfig::Branch => Effect::Branch,
            EffectConfig::Overall {
                profit_amount,
                loss_amount,
            } => Effect::Overall(flow(tile_id, *profit_amount, *loss_amount)?),
            EffectConfig::Neighbor {
                profit_amount,
                loss_amount,
            } => Effect::Neighbor(flow(tile_id, *profit_amount, *loss_amount)?),
            EffectConfig::Require { require_value } => Effect::Require {
                require_value: *require_value,
            },
            EffectConfig::Gamble => Effect::Gamble,
            EffectConfig::Conditional {
                condition,
                true_effect,
                else_effect,
            } => Effect::Conditional {
                condition: condition.clone(),
                then: Box::new(true_effect.build_inner(tile_id, true)?),
                otherwise: Box::new(match else_effect {
                    Some(config) => config.build_inner(tile_id, true)?,
                    None => Effect::NoEffect,
                }),
            },
            EffectConfig::SetStatus { status, value } => Effect::SetStatus(
                StatusChange::from_config(*status, value)
                    .map_err(|details| BoardError::invalid_effect(tile_id, details))?,
            ),
            EffectConfig::ChildBonus {
                profit_amount_per_child,
                loss_amount_per_child,
            } => Effect::ChildBonus(flow(
                tile_id,
                *profit_amount_per_child,
                *loss_amount_per_child,
            )?),
            EffectConfig::Goal => Effect::Goal,
            EffectConfig::NoEffect => Effect::NoEffect,
        };
        Ok(effect)
    }
}

fn non_negative(tile_id: TileId, field: &str, amount: i64) -> BoardResult<i64> {
    if amount < 0 {
        return Err(BoardError::invalid_effect(
            tile_id,
            format!("{field} must not be negative, got {amount}"),
        ));
    }
    Ok(amount)
}

fn flow(tile_id: TileId, profit: i64, loss: i64) -> BoardResult<MoneyFlow> {
    MoneyFlow::from_amounts(profit, loss).map_err(|details| BoardError::invalid_effect(tile_id, details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<EffectConfig, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_discriminator_selects_variant() {
        assert_eq!(
            parse(json!({"type": "profit", "amount": 500})).unwrap(),
            EffectConfig::Profit { amount: 500 }
        );
        assert_eq!(
            parse(json!({"type": "quiz", "quizId": 2, "amount": 100})).unwrap(),
            EffectConfig::Quiz {
                quiz_id: 2,
                amount: 100
            }
        );
        assert_eq!(parse(json!({"type": "branch"})).unwrap(), EffectConfig::Branch);
        assert_eq!(
            parse(json!({"type": "overall", "profitAmount": 100})).unwrap(),
            EffectConfig::Overall {
                profit_amount: 100,
                loss_amount: 0
            }
        );
    }

    #[test]
    fn test_missing_or_unknown_discriminator_fails() {
        assert!(parse(json!({"amount": 5})).is_err());
        assert!(parse(json!({"type": "teleport"})).is_err());
    }

    #[test]
    fn test_build_rejects_negative_amounts() {
        let err = EffectConfig::Loss { amount: -1 }.build(4).unwrap_err();
        assert!(matches!(err, BoardError::InvalidEffect { tile_id: 4, .. }));
    }

    #[test]
    fn test_build_requires_exactly_one_direction() {
        let both = EffectConfig::Neighbor {
            profit_amount: 10,
            loss_amount: 10,
        };
        assert!(both.build(1).is_err());
        let neither = EffectConfig::ChildBonus {
            profit_amount_per_child: 0,
            loss_amount_per_child: 0,
        };
        assert!(neither.build(1).is_err());
    }

    #[test]
    fn test_conditional_defaults_else_to_no_effect() {
        let config = parse(json!({
            "type": "conditional",
            "condition": "isMarried",
            "trueEffect": {"type": "profit", "amount": 300}
        }))
        .unwrap();
        let effect = config.build(9).unwrap();
        assert_eq!(
            effect,
            Effect::Conditional {
                condition: Condition::IsMarried,
                then: Box::new(Effect::Profit { amount: 300 }),
                otherwise: Box::new(Effect::NoEffect),
            }
        );
    }

    #[test]
    fn test_conditional_rejects_nested_branch() {
        let config = parse(json!({
            "type": "conditional",
            "condition": "hasChildren",
            "trueEffect": {"type": "branch"}
        }))
        .unwrap();
        assert!(config.build(3).is_err());
    }

    #[test]
    fn test_set_status_value_checked() {
        let ok = parse(json!({"type": "setStatus", "status": "job", "value": "professor"})).unwrap();
        assert_eq!(
            ok.build(1).unwrap(),
            Effect::SetStatus(StatusChange::Job(Some("professor".to_string())))
        );
        let bad = parse(json!({"type": "setStatus", "status": "isMarried", "value": 1})).unwrap();
        assert!(bad.build(1).is_err());
    }
}
