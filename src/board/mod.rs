// Board module - the immutable tile graph every game is played on
//
// Tiles live in a single arena (`Vec<Tile>`); adjacency is stored as arena
// indices and resolved back to tile ids through the graph.

pub mod loader;
pub mod quiz;

pub use loader::{load_board, parse_board, TileRecord};
pub use quiz::{Quiz, QuizBank, QuizPrompt};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::effects::Effect;
use crate::errors::{GameError, GameResult};
use crate::TileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileKind {
    Start,
    Normal,
    Profit,
    Loss,
    Quiz,
    Branch,
    Overall,
    Neighbor,
    Require,
    Gamble,
    Conditional,
    SetStatus,
    ChildBonus,
    Goal,
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub(crate) id: TileId,
    pub(crate) kind: TileKind,
    pub(crate) effect: Effect,
    pub(crate) detail: String,
    pub(crate) prevs: Vec<usize>,
    pub(crate) nexts: Vec<usize>,
}

impl Tile {
    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn out_degree(&self) -> usize {
        self.nexts.len()
    }

    /// Movement always stops on a branch point.
    pub fn is_branch_point(&self) -> bool {
        self.kind == TileKind::Branch || self.nexts.len() > 1
    }

    pub fn is_goal(&self) -> bool {
        self.kind == TileKind::Goal || self.effect.is_goal()
    }
}

#[derive(Debug, Clone)]
pub struct TileGraph {
    pub(crate) tiles: Vec<Tile>,
    pub(crate) index: HashMap<TileId, usize>,
    pub(crate) start: usize,
    pub(crate) records: Vec<TileRecord>,
}

impl TileGraph {
    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.index.get(&id).map(|&i| &self.tiles[i])
    }

    pub fn tile(&self, id: TileId) -> GameResult<&Tile> {
        self.get(id).ok_or(GameError::TileNotFound { tile_id: id })
    }

    pub fn start_tile(&self) -> &Tile {
        &self.tiles[self.start]
    }

    /// Outgoing tile ids in board-file order. Unknown ids have none.
    pub fn next_ids(&self, id: TileId) -> Vec<TileId> {
        self.get(id)
            .map(|tile| self.ids(&tile.nexts))
            .unwrap_or_default()
    }

    pub fn prev_ids(&self, id: TileId) -> Vec<TileId> {
        self.get(id)
            .map(|tile| self.ids(&tile.prevs))
            .unwrap_or_default()
    }

    /// The only forward neighbour, if the tile has exactly one.
    pub fn single_next(&self, tile: &Tile) -> Option<&Tile> {
        match tile.nexts.as_slice() {
            [only] => self.tiles.get(*only),
            _ => None,
        }
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// The board as loaded, for clients that draw it.
    pub fn records(&self) -> &[TileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    fn ids(&self, indices: &[usize]) -> Vec<TileId> {
        indices
            .iter()
            .filter_map(|&i| self.tiles.get(i))
            .map(|tile| tile.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD: &str = r#"[
        {"id": 10, "kind": "start", "detail": "", "prev_ids": [], "next_ids": [11]},
        {"id": 11, "kind": "normal", "detail": "", "prev_ids": [10], "next_ids": [12, 13], "effect": {"type": "branch"}},
        {"id": 12, "kind": "profit", "detail": "", "effect": {"type": "profit", "amount": 5}, "prev_ids": [11], "next_ids": [14]},
        {"id": 13, "kind": "loss", "detail": "", "effect": {"type": "loss", "amount": 5}, "prev_ids": [11], "next_ids": [14]},
        {"id": 14, "kind": "goal", "detail": "", "prev_ids": [12, 13], "next_ids": []}
    ]"#;

    #[test]
    fn test_adjacency_by_id() {
        let graph = parse_board(BOARD, 10).unwrap();
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.start_tile().id(), 10);
        assert_eq!(graph.next_ids(11), vec![12, 13]);
        assert_eq!(graph.prev_ids(14), vec![12, 13]);
        assert!(graph.next_ids(99).is_empty());
        assert_eq!(graph.tile(99).unwrap_err(), GameError::TileNotFound { tile_id: 99 });
    }

    #[test]
    fn test_branch_points_and_goals() {
        let graph = parse_board(BOARD, 10).unwrap();
        // A fork is a branch point even when its kind says otherwise
        assert!(graph.tile(11).unwrap().is_branch_point());
        assert!(!graph.tile(12).unwrap().is_branch_point());
        assert!(graph.tile(14).unwrap().is_goal());
        assert!(!graph.tile(13).unwrap().is_goal());
    }

    #[test]
    fn test_single_next() {
        let graph = parse_board(BOARD, 10).unwrap();
        let start = graph.start_tile();
        assert_eq!(graph.single_next(start).map(Tile::id), Some(11));
        assert!(graph.single_next(graph.tile(11).unwrap()).is_none());
        assert!(graph.single_next(graph.tile(14).unwrap()).is_none());
    }
}
