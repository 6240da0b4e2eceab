use crate::errors::{GameError, GameResult, PlayerError, SugorokuResult};
use crate::game::GameState;
use crate::player::Player;
use crate::PlayerId;

/// A money movement where exactly one direction is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoneyFlow {
    Profit(i64),
    Loss(i64),
}

impl MoneyFlow {
    /// Exactly one of the two amounts must be positive and the other zero.
    pub fn from_amounts(profit: i64, loss: i64) -> Result<Self, String> {
        match (profit, loss) {
            (p, l) if p < 0 || l < 0 => Err(format!("amounts must not be negative (profit {p}, loss {l})")),
            (p, 0) if p > 0 => Ok(MoneyFlow::Profit(p)),
            (0, l) if l > 0 => Ok(MoneyFlow::Loss(l)),
            (0, 0) => Err("one of profit or loss must be positive".to_string()),
            (p, l) => Err(format!("only one of profit or loss may be set (profit {p}, loss {l})")),
        }
    }

    pub fn amount(&self) -> i64 {
        match self {
            MoneyFlow::Profit(amount) | MoneyFlow::Loss(amount) => *amount,
        }
    }

    pub fn scaled(&self, factor: u32) -> Self {
        let factor = i64::from(factor);
        match self {
            MoneyFlow::Profit(amount) => MoneyFlow::Profit(amount.saturating_mul(factor)),
            MoneyFlow::Loss(amount) => MoneyFlow::Loss(amount.saturating_mul(factor)),
        }
    }

    pub(crate) fn apply_to(&self, player: &mut Player) -> GameResult<()> {
        match self {
            MoneyFlow::Profit(amount) => player.profit(*amount),
            MoneyFlow::Loss(amount) => player.loss(*amount),
        }
    }

    /// The actor receives the full amount in the flow's direction and every
    /// target pays (or receives) an even integer share of it.
    pub(crate) fn redistribute(
        &self,
        actor: &str,
        targets: &[PlayerId],
        state: &mut GameState,
    ) -> SugorokuResult<()> {
        let amount = self.amount();
        if amount < 0 {
            return Err(GameError::NegativeAmount { amount }.into());
        }
        if let Some(missing) = targets.iter().find(|id| !state.contains(id)) {
            return Err(PlayerError::not_found(missing.clone()).into());
        }

        let portion = share(amount, targets.len());
        self.apply_to(state.player_mut(actor)?)?;
        for target in targets.iter().filter(|id| id.as_str() != actor) {
            let player = state.player_mut(target)?;
            match self {
                MoneyFlow::Profit(_) => player.loss(portion)?,
                MoneyFlow::Loss(_) => player.profit(portion)?,
            }
        }
        Ok(())
    }
}

/// Even split with the remainder dropped. Nobody to split with means nothing to pay.
pub fn share(amount: i64, recipients: usize) -> i64 {
    match i64::try_from(recipients) {
        Ok(0) | Err(_) => 0,
        Ok(n) => amount / n,
    }
}
