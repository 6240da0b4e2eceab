// Effects module - the closed set of tile effects and their dispatch
//
// Every tile carries exactly one `Effect`. Effects are built once from the
// board file (see `config`) and never change; all mutation goes through the
// `GameState` handed to `Effect::apply`.

pub mod choice;
pub mod config;
pub mod money;
pub mod status;

pub use choice::{Choice, GambleCall, InputKind, Wager, WagerRequest};
pub use config::EffectConfig;
pub use money::{share, MoneyFlow};
pub use status::{Condition, StatusChange, StatusKey};

use crate::board::{QuizBank, QuizPrompt, TileGraph};
use crate::errors::{GameError, GameResult, SugorokuError, SugorokuResult};
use crate::game::GameState;
use crate::player::Player;
use crate::{QuizId, TileId};

use choice::expect_kind;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    NoEffect,
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
    Overall(MoneyFlow),
    Neighbor(MoneyFlow),
    Require {
        require_value: i64,
    },
    Gamble,
    Conditional {
        condition: Condition,
        then: Box<Effect>,
        otherwise: Box<Effect>,
    },
    SetStatus(StatusChange),
    ChildBonus(MoneyFlow),
    Goal,
}

/// What the engine has to do after an effect was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Settled,
    /// The player was moved and the new tile must be settled in turn.
    Moved { to: TileId },
    /// A validated bet is waiting for the engine's die.
    Wager(Wager),
}

/// Prompt data sent along with a `*_REQUIRED` event.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectOptions {
    Branch(Vec<TileId>),
    Quiz(QuizPrompt),
    Gamble { reference_value: u8 },
}

/// Read-only collaborators an effect may consult while it resolves.
#[derive(Clone, Copy)]
pub struct EffectContext<'a> {
    pub board: &'a TileGraph,
    pub quizzes: &'a QuizBank,
    pub gamble_reference: u8,
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::NoEffect => "noEffect",
            Effect::Profit { .. } => "profit",
            Effect::Loss { .. } => "loss",
            Effect::Quiz { .. } => "quiz",
            Effect::Branch => "branch",
            Effect::Overall(_) => "overall",
            Effect::Neighbor(_) => "neighbor",
            Effect::Require { .. } => "require",
            Effect::Gamble => "gamble",
            Effect::Conditional { .. } => "conditional",
            Effect::SetStatus(_) => "setStatus",
            Effect::ChildBonus(_) => "childBonus",
            Effect::Goal => "goal",
        }
    }

    /// Input needed by this exact effect. A conditional asks for nothing
    /// itself; resolve it with [`Effect::active_for`] first.
    pub fn input_kind(&self) -> Option<InputKind> {
        match self {
            Effect::Branch => Some(InputKind::Branch),
            Effect::Quiz { .. } => Some(InputKind::Quiz),
            Effect::Gamble => Some(InputKind::Gamble),
            _ => None,
        }
    }

    pub fn requires_user_input(&self) -> bool {
        self.input_kind().is_some()
    }

    pub fn is_goal(&self) -> bool {
        matches!(self, Effect::Goal)
    }

    /// Follows conditionals down to the effect that applies to `player`.
    pub fn active_for(&self, player: &Player) -> &Effect {
        let mut effect = self;
        while let Effect::Conditional {
            condition,
            then,
            otherwise,
        } = effect
        {
            effect = if condition.holds(player) { &**then } else { &**otherwise };
        }
        effect
    }

    /// Prompt for the input this effect needs from `player` on their current tile.
    pub fn options(&self, player: &Player, ctx: &EffectContext<'_>) -> GameResult<EffectOptions> {
        let tile_id = player.position();
        match self.active_for(player) {
            Effect::Branch => Ok(EffectOptions::Branch(ctx.board.next_ids(tile_id))),
            Effect::Quiz { quiz_id, .. } => ctx
                .quizzes
                .prompt(*quiz_id)
                .map(EffectOptions::Quiz)
                .ok_or(GameError::UnknownQuiz { quiz_id: *quiz_id }),
            Effect::Gamble => Ok(EffectOptions::Gamble {
                reference_value: ctx.gamble_reference,
            }),
            _ => Err(GameError::MissingChoice { tile_id }),
        }
    }

    /// Applies the effect of the actor's current tile. Nothing is mutated
    /// when an error is returned.
    pub fn apply(
        &self,
        actor: &str,
        state: &mut GameState,
        ctx: &EffectContext<'_>,
        choice: Option<&Choice>,
    ) -> SugorokuResult<Resolution> {
        let player = state.player(actor)?;
        let tile_id = player.position();
        let effect = self.active_for(player);
        log::debug!("🎯 {} triggers {} on tile {}", actor, effect.name(), tile_id);
        effect.apply_resolved(actor, tile_id, state, ctx, choice)
    }

    fn apply_resolved(
        &self,
        actor: &str,
        tile_id: TileId,
        state: &mut GameState,
        ctx: &EffectContext<'_>,
        choice: Option<&Choice>,
    ) -> SugorokuResult<Resolution> {
        match self {
            Effect::NoEffect | Effect::Goal => {}
            Effect::Profit { amount } => state.player_mut(actor)?.profit(*amount)?,
            Effect::Loss { amount } => state.player_mut(actor)?.loss(*amount)?,
            Effect::Quiz { quiz_id, amount } => {
                let Choice::Quiz(selection) = expect_kind(choice, InputKind::Quiz, tile_id)? else {
                    return Err(GameError::MissingChoice { tile_id }.into());
                };
                let quiz = ctx
                    .quizzes
                    .get(*quiz_id)
                    .ok_or(GameError::UnknownQuiz { quiz_id: *quiz_id })?;
                let player = state.player_mut(actor)?;
                if quiz.is_correct(*selection) {
                    player.profit(*amount)?;
                } else {
                    player.loss(*amount)?;
                }
            }
            Effect::Branch => {
                let Choice::Branch(target) = expect_kind(choice, InputKind::Branch, tile_id)? else {
                    return Err(GameError::MissingChoice { tile_id }.into());
                };
                if !ctx.board.next_ids(tile_id).contains(target) {
                    return Err(GameError::InvalidBranchTarget {
                        tile_id,
                        target: *target,
                    }
                    .into());
                }
                state.player_mut(actor)?.move_to(*target);
                return Ok(Resolution::Moved { to: *target });
            }
            Effect::Overall(flow) => {
                let targets = state.other_ids(actor);
                flow.redistribute(actor, &targets, state)?;
            }
            Effect::Neighbor(flow) => {
                let targets = state.neighbor_ids(actor, ctx.board);
                flow.redistribute(actor, &targets, state)?;
            }
            Effect::Require { require_value } => {
                // No-op gate: the board format does not define what the value is compared against
                log::info!(
                    "🚧 {} reached a requirement gate on tile {} (value {})",
                    actor,
                    tile_id,
                    require_value
                );
            }
            Effect::Gamble => {
                let Choice::Gamble(request) = expect_kind(choice, InputKind::Gamble, tile_id)? else {
                    return Err(GameError::MissingChoice { tile_id }.into());
                };
                return Ok(Resolution::Wager(request.validate()?));
            }
            Effect::SetStatus(change) => change.apply(state.player_mut(actor)?),
            Effect::ChildBonus(flow) => {
                let player = state.player_mut(actor)?;
                flow.scaled(player.children()).apply_to(player)?;
            }
            Effect::Conditional { .. } => {
                return Err(SugorokuError::Internal(format!(
                    "conditional on tile {tile_id} was not resolved before applying"
                )))
            }
        }
        Ok(Resolution::Settled)
    }
}
