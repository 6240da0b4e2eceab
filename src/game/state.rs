use std::collections::HashMap;

use crate::board::TileGraph;
use crate::errors::PlayerError;
use crate::player::{Player, PlayerSnapshot};
use crate::{PlayerId, TileId};

/// Registry of live players, keyed by player id.
#[derive(Debug, Clone)]
pub struct GameState {
    players: HashMap<PlayerId, Player>,
    start_tile: TileId,
    initial_money: i64,
}

impl GameState {
    pub fn new(start_tile: TileId, initial_money: i64) -> Self {
        Self {
            players: HashMap::new(),
            start_tile,
            initial_money,
        }
    }

    pub fn add_player(&mut self, id: &str) -> Result<&Player, PlayerError> {
        if self.players.contains_key(id) {
            return Err(PlayerError::PlayerAlreadyExists {
                player_id: id.to_string(),
            });
        }
        Ok(self.ensure_player(id))
    }

    /// Returns the existing record or creates a fresh one on the start tile.
    pub fn ensure_player(&mut self, id: &str) -> &Player {
        let (start, money) = (self.start_tile, self.initial_money);
        self.players
            .entry(id.to_string())
            .or_insert_with(|| Player::new(id, start, money))
    }

    pub fn remove_player(&mut self, id: &str) -> Option<Player> {
        self.players.remove(id)
    }

    pub fn player(&self, id: &str) -> Result<&Player, PlayerError> {
        self.players.get(id).ok_or_else(|| PlayerError::not_found(id))
    }

    pub fn player_mut(&mut self, id: &str) -> Result<&mut Player, PlayerError> {
        self.players
            .get_mut(id)
            .ok_or_else(|| PlayerError::not_found(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Every player except `id`, sorted.
    pub fn other_ids(&self, id: &str) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .players
            .keys()
            .filter(|other| other.as_str() != id)
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Players standing on `id`'s tile or on a tile directly before or after it.
    pub fn neighbor_ids(&self, id: &str, board: &TileGraph) -> Vec<PlayerId> {
        let Some(actor) = self.players.get(id) else {
            return Vec::new();
        };
        let here = actor.position();
        let mut around = board.prev_ids(here);
        around.extend(board.next_ids(here));
        around.push(here);

        let mut ids: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| p.id() != id && around.contains(&p.position()))
            .map(|p| p.id().to_string())
            .collect();
        ids.sort();
        ids
    }

    pub fn snapshot(&self) -> HashMap<PlayerId, PlayerSnapshot> {
        self.players
            .iter()
            .map(|(id, player)| (id.clone(), player.snapshot()))
            .collect()
    }

    pub fn start_tile(&self) -> TileId {
        self.start_tile
    }

    pub fn initial_money(&self) -> i64 {
        self.initial_money
    }
}
