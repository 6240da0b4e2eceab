// Player module - live player records and their money/status mutations
//
// Players are owned by the registry in `game::state`; everything here is only
// reachable through the registry or the turn engine.

use serde::{Deserialize, Serialize};

use crate::effects::InputKind;
use crate::errors::{GameError, GameResult};
use crate::{PlayerId, TileId};

pub const JOB_PROFESSOR: &str = "professor";
pub const JOB_LECTURER: &str = "lecturer";

/// Where a player is in their turn between inbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TurnPhase {
    #[default]
    Idle,
    AwaitingInput(InputKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    id: PlayerId,
    position: TileId,
    money: i64,
    is_married: bool,
    children: u32,
    job: Option<String>,
    #[serde(skip)]
    phase: TurnPhase,
}

/// Observable attributes, compared before and after an effect is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub position: TileId,
    pub money: i64,
    pub is_married: bool,
    pub children: u32,
    pub job: Option<String>,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, position: TileId, money: i64) -> Self {
        Self {
            id: id.into(),
            position,
            money,
            is_married: false,
            children: 0,
            job: None,
            phase: TurnPhase::Idle,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn position(&self) -> TileId {
        self.position
    }

    pub fn money(&self) -> i64 {
        self.money
    }

    pub fn is_married(&self) -> bool {
        self.is_married
    }

    pub fn children(&self) -> u32 {
        self.children
    }

    pub fn has_children(&self) -> bool {
        self.children > 0
    }

    pub fn job(&self) -> Option<&str> {
        self.job.as_deref()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn pending_input(&self) -> Option<InputKind> {
        match self.phase {
            TurnPhase::AwaitingInput(kind) => Some(kind),
            TurnPhase::Idle => None,
        }
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            position: self.position,
            money: self.money,
            is_married: self.is_married,
            children: self.children,
            job: self.job.clone(),
        }
    }

    /// Adds `amount` to the wallet. Negative deltas are rejected.
    pub(crate) fn profit(&mut self, amount: i64) -> GameResult<()> {
        if amount < 0 {
            return Err(GameError::NegativeAmount { amount });
        }
        self.money = self.money.saturating_add(amount);
        log::debug!("💰 {} earned {}, wallet {}", self.id, amount, self.money);
        Ok(())
    }

    /// Removes `amount` from the wallet. The wallet may go negative; the delta may not.
    pub(crate) fn loss(&mut self, amount: i64) -> GameResult<()> {
        if amount < 0 {
            return Err(GameError::NegativeAmount { amount });
        }
        self.money = self.money.saturating_sub(amount);
        log::debug!("💸 {} lost {}, wallet {}", self.id, amount, self.money);
        Ok(())
    }

    pub(crate) fn move_to(&mut self, tile: TileId) {
        self.position = tile;
    }

    pub(crate) fn set_married(&mut self, married: bool) {
        self.is_married = married;
    }

    pub(crate) fn set_children(&mut self, children: u32) {
        self.children = children;
    }

    pub(crate) fn set_job(&mut self, job: Option<String>) {
        self.job = job;
    }

    pub(crate) fn set_phase(&mut self, phase: TurnPhase) {
        self.phase = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_defaults() {
        let player = Player::new("alice", 1, 1_000);
        assert_eq!(player.id(), "alice");
        assert_eq!(player.position(), 1);
        assert_eq!(player.money(), 1_000);
        assert!(!player.is_married());
        assert!(!player.has_children());
        assert_eq!(player.job(), None);
        assert_eq!(player.phase(), TurnPhase::Idle);
    }

    #[test]
    fn test_profit_and_loss() {
        let mut player = Player::new("alice", 1, 0);
        player.profit(100).unwrap();
        assert_eq!(player.money(), 100);
        player.loss(30).unwrap();
        assert_eq!(player.money(), 70);

        // Wallets can go below zero
        player.loss(100).unwrap();
        assert_eq!(player.money(), -30);
    }

    #[test]
    fn test_negative_deltas_rejected() {
        let mut player = Player::new("alice", 1, 50);
        assert_eq!(
            player.profit(-10),
            Err(GameError::NegativeAmount { amount: -10 })
        );
        assert!(player.loss(-10).is_err());
        assert_eq!(player.money(), 50);
    }

    #[test]
    fn test_snapshot_tracks_status() {
        let mut player = Player::new("bob", 3, 10);
        let before = player.snapshot();
        player.set_married(true);
        player.set_job(Some(JOB_LECTURER.to_string()));
        let after = player.snapshot();
        assert_ne!(before, after);
        assert!(after.is_married);
        assert_eq!(after.job.as_deref(), Some("lecturer"));
    }
}
