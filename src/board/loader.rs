use std::collections::HashMap;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::{Tile, TileGraph, TileKind};
use crate::effects::{Effect, EffectConfig};
use crate::errors::{BoardError, BoardResult};
use crate::TileId;

/// One entry of the board file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    pub id: TileId,
    pub kind: TileKind,
    #[serde(default)]
    pub detail: String,
    #[serde(default, deserialize_with = "effect_or_none")]
    pub effect: Option<EffectConfig>,
    #[serde(default)]
    pub prev_ids: Vec<TileId>,
    #[serde(default)]
    pub next_ids: Vec<TileId>,
}

/// `null`, a missing key and `{}` all mean the tile has no effect.
fn effect_or_none<'de, D>(deserializer: D) -> Result<Option<EffectConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) if map.is_empty() => Ok(None),
        Some(value) => EffectConfig::deserialize(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

pub fn load_board(path: impl AsRef<Path>, start: TileId) -> BoardResult<TileGraph> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| BoardError::Read {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;
    let graph = parse_board(&raw, start)?;
    log::info!("🗺️ Loaded {} tiles from {}", graph.len(), path.display());
    Ok(graph)
}

/// Builds the graph from board JSON in two passes: allocate every tile, then
/// wire up adjacency. Any inconsistency is an error.
pub fn parse_board(raw: &str, start: TileId) -> BoardResult<TileGraph> {
    let records: Vec<TileRecord> =
        serde_json::from_str(raw).map_err(|e| BoardError::parse(e.to_string()))?;
    build_graph(records, start)
}

pub fn build_graph(records: Vec<TileRecord>, start: TileId) -> BoardResult<TileGraph> {
    if let Some(tile_id) = records.iter().map(|r| r.id).duplicates().next() {
        return Err(BoardError::DuplicateTile { tile_id });
    }

    // Pass 1: arena slots and effects
    let mut tiles = Vec::with_capacity(records.len());
    let mut index = HashMap::with_capacity(records.len());
    for (slot, record) in records.iter().enumerate() {
        let effect = match (&record.effect, record.kind) {
            (Some(config), _) => config.build(record.id)?,
            (None, TileKind::Branch) => Effect::Branch,
            (None, TileKind::Goal) => Effect::Goal,
            (None, _) => Effect::NoEffect,
        };
        tiles.push(Tile {
            id: record.id,
            kind: record.kind,
            effect,
            detail: record.detail.clone(),
            prevs: Vec::new(),
            nexts: Vec::new(),
        });
        index.insert(record.id, slot);
    }

    // Pass 2: adjacency
    let resolve = |tile_id: TileId, ids: &[TileId]| -> BoardResult<Vec<usize>> {
        ids.iter()
            .map(|reference| {
                index
                    .get(reference)
                    .copied()
                    .ok_or(BoardError::UnknownReference {
                        tile_id,
                        reference: *reference,
                    })
            })
            .collect()
    };
    for (slot, record) in records.iter().enumerate() {
        let prevs = resolve(record.id, &record.prev_ids)?;
        let nexts = resolve(record.id, &record.next_ids)?;
        tiles[slot].prevs = prevs;
        tiles[slot].nexts = nexts;
    }

    let start = *index
        .get(&start)
        .ok_or(BoardError::MissingStart { tile_id: start })?;

    for tile in &tiles {
        let branches = matches!(tile.effect, Effect::Branch);
        if tile.nexts.len() > 1 && !branches {
            return Err(BoardError::UnresolvableFork {
                tile_id: tile.id,
                nexts: tile.nexts.len(),
            });
        }
        if branches && tile.nexts.is_empty() {
            return Err(BoardError::invalid_effect(tile.id, "branch has no outgoing tiles"));
        }
        if tile.nexts.is_empty() && !tile.is_goal() {
            log::warn!("⚠️ Tile {} is a dead end that is not a goal", tile.id);
        }
    }

    Ok(TileGraph {
        tiles,
        index,
        start,
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(id: TileId, kind: &str, effect: &str, prevs: &str, nexts: &str) -> String {
        format!(
            r#"{{"id": {id}, "kind": "{kind}", "detail": "t{id}", "effect": {effect}, "prev_ids": {prevs}, "next_ids": {nexts}}}"#
        )
    }

    fn board(tiles: &[String]) -> String {
        format!("[{}]", tiles.join(","))
    }

    #[test]
    fn test_two_pass_resolves_forward_references() {
        // Tile 1 points at tile 3 before tile 3 is declared
        let raw = board(&[
            tile(1, "start", "null", "[]", "[3]"),
            tile(3, "goal", r#"{"type": "goal"}"#, "[1]", "[]"),
        ]);
        let graph = parse_board(&raw, 1).unwrap();
        assert_eq!(graph.next_ids(1), vec![3]);
        assert_eq!(graph.prev_ids(3), vec![1]);
        assert_eq!(graph.records().len(), 2);
    }

    #[test]
    fn test_empty_and_absent_effects_are_no_effect() {
        let raw = r#"[
            {"id": 1, "kind": "start", "next_ids": [2]},
            {"id": 2, "kind": "normal", "effect": {}, "prev_ids": [1], "next_ids": [3]},
            {"id": 3, "kind": "goal", "effect": null, "prev_ids": [2]}
        ]"#;
        let graph = parse_board(raw, 1).unwrap();
        assert_eq!(graph.tile(1).unwrap().effect(), &Effect::NoEffect);
        assert_eq!(graph.tile(2).unwrap().effect(), &Effect::NoEffect);
        assert_eq!(graph.tile(3).unwrap().effect(), &Effect::Goal);
    }

    #[test]
    fn test_unknown_kind_or_discriminator_is_fatal() {
        let bad_kind = board(&[tile(1, "warp", "null", "[]", "[]")]);
        assert!(matches!(parse_board(&bad_kind, 1), Err(BoardError::Parse { .. })));

        let bad_effect = board(&[tile(1, "start", r#"{"type": "warp"}"#, "[]", "[]")]);
        assert!(matches!(parse_board(&bad_effect, 1), Err(BoardError::Parse { .. })));

        let untagged = board(&[tile(1, "profit", r#"{"amount": 10}"#, "[]", "[]")]);
        assert!(matches!(parse_board(&untagged, 1), Err(BoardError::Parse { .. })));
    }

    #[test]
    fn test_topology_errors() {
        let duplicate = board(&[
            tile(1, "start", "null", "[]", "[]"),
            tile(1, "goal", "null", "[]", "[]"),
        ]);
        assert_eq!(
            parse_board(&duplicate, 1).unwrap_err(),
            BoardError::DuplicateTile { tile_id: 1 }
        );

        let dangling = board(&[tile(1, "start", "null", "[]", "[7]")]);
        assert_eq!(
            parse_board(&dangling, 1).unwrap_err(),
            BoardError::UnknownReference {
                tile_id: 1,
                reference: 7
            }
        );

        let no_start = board(&[tile(1, "goal", "null", "[]", "[]")]);
        assert_eq!(
            parse_board(&no_start, 5).unwrap_err(),
            BoardError::MissingStart { tile_id: 5 }
        );

        assert!(matches!(parse_board("{not json", 1), Err(BoardError::Parse { .. })));
    }

    #[test]
    fn test_fork_needs_branch_effect() {
        let fork = board(&[
            tile(1, "start", "null", "[]", "[2, 3]"),
            tile(2, "goal", "null", "[1]", "[]"),
            tile(3, "goal", "null", "[1]", "[]"),
        ]);
        assert_eq!(
            parse_board(&fork, 1).unwrap_err(),
            BoardError::UnresolvableFork {
                tile_id: 1,
                nexts: 2
            }
        );

        let branch_kind = board(&[
            tile(1, "branch", "null", "[]", "[2, 3]"),
            tile(2, "goal", "null", "[1]", "[]"),
            tile(3, "goal", "null", "[1]", "[]"),
        ]);
        let graph = parse_board(&branch_kind, 1).unwrap();
        assert_eq!(graph.tile(1).unwrap().effect(), &Effect::Branch);
    }

    #[test]
    fn test_invalid_effect_config_is_fatal() {
        let raw = board(&[tile(
            1,
            "overall",
            r#"{"type": "overall", "profitAmount": 10, "lossAmount": 10}"#,
            "[]",
            "[]",
        )]);
        assert!(matches!(
            parse_board(&raw, 1),
            Err(BoardError::InvalidEffect { tile_id: 1, .. })
        ));
    }

    #[test]
    fn test_bundled_board_loads() {
        let graph = parse_board(include_str!("../../tiles.json"), 1).unwrap();
        let quizzes = crate::board::QuizBank::parse(include_str!("../../quizzes.json")).unwrap();

        assert_eq!(graph.start_tile().id(), 1);
        assert!(graph.tiles().any(|tile| tile.is_goal()));
        for tile in graph.tiles() {
            if let Effect::Quiz { quiz_id, .. } = tile.effect() {
                assert!(quizzes.get(*quiz_id).is_some(), "tile {} uses quiz {}", tile.id(), quiz_id);
            }
        }
    }
}
