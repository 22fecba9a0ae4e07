use engine::Vec2;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::content::World;
use super::puzzles::{PuzzleRestoreError, PuzzleState};
use super::types::{Player, RegionId};

pub(crate) const SAVE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct SavedCratePosition {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

/// The unit exchanged with persistence. Arrays are positional: outer index is
/// the region ordinal, inner index is the content-generation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SessionSnapshot {
    pub(crate) player_name: String,
    pub(crate) region: RegionId,
    pub(crate) pos_x: f32,
    pub(crate) pos_y: f32,
    /// Elapsed game time in seconds.
    pub(crate) game_time: f64,
    #[serde(default)]
    pub(crate) seeds: Vec<Vec<bool>>,
    #[serde(default)]
    pub(crate) crates: Vec<Vec<SavedCratePosition>>,
    #[serde(default)]
    pub(crate) puzzles: Vec<PuzzleState>,
    #[serde(default)]
    pub(crate) save_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) layout_digest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum RestoreIssue {
    #[error("save_version {found} is newer than supported {supported}")]
    NewerSaveVersion { found: u32, supported: u32 },
    #[error("layout digest differs from current content; restoring by position anyway")]
    LayoutDigestMismatch,
    #[error("region {region} does not exist; starting in region {fallback}")]
    UnknownRegion { region: RegionId, fallback: RegionId },
    #[error("player position ({x}, {y}) is not finite; using start position")]
    InvalidPosition { x: f32, y: f32 },
    #[error("game_time {0} is invalid; resetting to zero")]
    InvalidGameTime(f64),
    #[error("{field} has {actual} regions, expected {expected}")]
    RegionCountMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{field}[{region}] has {actual} entries, expected {expected}; skipped")]
    EntryCountMismatch {
        field: &'static str,
        region: RegionId,
        expected: usize,
        actual: usize,
    },
    #[error("crates[{region}] contains a non-finite position; skipped")]
    InvalidCratePosition { region: RegionId },
    #[error("puzzles[{region}]: {source}")]
    PuzzleState {
        region: RegionId,
        #[source]
        source: PuzzleRestoreError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RestoredSession {
    pub(crate) region: RegionId,
    pub(crate) game_time: f64,
    pub(crate) issues: Vec<RestoreIssue>,
}

impl SessionSnapshot {
    pub(crate) fn capture(
        world: &World,
        player: &Player,
        current_region: RegionId,
        game_time: f64,
    ) -> Self {
        Self {
            player_name: player.name.clone(),
            region: current_region,
            pos_x: player.position.x,
            pos_y: player.position.y,
            game_time,
            seeds: world
                .regions
                .iter()
                .map(|region| {
                    region
                        .collectibles
                        .iter()
                        .map(|collectible| collectible.collected)
                        .collect()
                })
                .collect(),
            crates: world
                .regions
                .iter()
                .map(|region| {
                    region
                        .crates
                        .iter()
                        .map(|crate_box| SavedCratePosition {
                            x: crate_box.position.x,
                            y: crate_box.position.y,
                        })
                        .collect()
                })
                .collect(),
            puzzles: world
                .regions
                .iter()
                .map(|region| {
                    region
                        .puzzle
                        .as_ref()
                        .map_or_else(PuzzleState::unsolved, |puzzle| puzzle.snapshot())
                })
                .collect(),
            save_version: SAVE_VERSION,
            layout_digest: Some(layout_digest(world)),
        }
    }

    /// Writes the snapshot into freshly generated content. Each sub-array is
    /// restored independently; anything that does not line up with the
    /// content is skipped and reported instead of failing the whole load.
    pub(crate) fn restore_into(&self, world: &mut World, player: &mut Player) -> RestoredSession {
        let mut issues = Vec::new();

        if self.save_version > SAVE_VERSION {
            issues.push(RestoreIssue::NewerSaveVersion {
                found: self.save_version,
                supported: SAVE_VERSION,
            });
        }
        if let Some(saved_digest) = &self.layout_digest {
            if *saved_digest != layout_digest(world) {
                issues.push(RestoreIssue::LayoutDigestMismatch);
            }
        }

        let region_count = world.regions.len();
        let region = if self.region < region_count {
            self.region
        } else {
            issues.push(RestoreIssue::UnknownRegion {
                region: self.region,
                fallback: world.start_region,
            });
            world.start_region
        };

        let position = Vec2 {
            x: self.pos_x,
            y: self.pos_y,
        };
        if region == self.region && position.is_finite() {
            player.position = position;
        } else {
            if !position.is_finite() {
                issues.push(RestoreIssue::InvalidPosition {
                    x: self.pos_x,
                    y: self.pos_y,
                });
            }
            player.position = world.start_position;
        }

        let game_time = if self.game_time.is_finite() && self.game_time >= 0.0 {
            self.game_time
        } else {
            issues.push(RestoreIssue::InvalidGameTime(self.game_time));
            0.0
        };

        self.restore_seeds(world, &mut issues);
        self.restore_crates(world, &mut issues);
        self.restore_puzzles(world, &mut issues);
        world.sync_gates();

        RestoredSession {
            region,
            game_time,
            issues,
        }
    }

    fn restore_seeds(&self, world: &mut World, issues: &mut Vec<RestoreIssue>) {
        check_region_count("seeds", world.regions.len(), self.seeds.len(), issues);
        for (region, saved) in world.regions.iter_mut().zip(&self.seeds) {
            if saved.len() != region.collectibles.len() {
                issues.push(RestoreIssue::EntryCountMismatch {
                    field: "seeds",
                    region: region.id,
                    expected: region.collectibles.len(),
                    actual: saved.len(),
                });
                continue;
            }
            for (collectible, collected) in region.collectibles.iter_mut().zip(saved) {
                collectible.collected = *collected;
            }
        }
    }

    fn restore_crates(&self, world: &mut World, issues: &mut Vec<RestoreIssue>) {
        check_region_count("crates", world.regions.len(), self.crates.len(), issues);
        for (region, saved) in world.regions.iter_mut().zip(&self.crates) {
            if saved.len() != region.crates.len() {
                issues.push(RestoreIssue::EntryCountMismatch {
                    field: "crates",
                    region: region.id,
                    expected: region.crates.len(),
                    actual: saved.len(),
                });
                continue;
            }
            if saved
                .iter()
                .any(|position| !position.x.is_finite() || !position.y.is_finite())
            {
                issues.push(RestoreIssue::InvalidCratePosition { region: region.id });
                continue;
            }
            for (crate_box, position) in region.crates.iter_mut().zip(saved) {
                crate_box.position = Vec2 {
                    x: position.x,
                    y: position.y,
                };
            }
        }
    }

    fn restore_puzzles(&self, world: &mut World, issues: &mut Vec<RestoreIssue>) {
        check_region_count("puzzles", world.regions.len(), self.puzzles.len(), issues);
        for (region, state) in world.regions.iter_mut().zip(&self.puzzles) {
            let Some(puzzle) = region.puzzle.as_mut() else {
                continue;
            };
            if let Err(source) = puzzle.restore(state) {
                issues.push(RestoreIssue::PuzzleState {
                    region: region.id,
                    source,
                });
            }
        }
    }
}

fn check_region_count(
    field: &'static str,
    expected: usize,
    actual: usize,
    issues: &mut Vec<RestoreIssue>,
) {
    if expected != actual {
        issues.push(RestoreIssue::RegionCountMismatch {
            field,
            expected,
            actual,
        });
    }
}

/// Fingerprint of the entity layout a snapshot's positional arrays refer to.
pub(crate) fn layout_digest(world: &World) -> String {
    let mut hasher = Sha256::new();
    hasher.update((world.regions.len() as u64).to_le_bytes());
    for region in &world.regions {
        hasher.update(region.name.as_bytes());
        hasher.update([0u8]);
        hasher.update((region.collectibles.len() as u64).to_le_bytes());
        hasher.update((region.crates.len() as u64).to_le_bytes());
        match &region.puzzle {
            Some(puzzle) => {
                hasher.update(puzzle.kind().as_token().as_bytes());
                hasher.update((puzzle.zones().len() as u64).to_le_bytes());
            }
            None => hasher.update(b"none"),
        }
        hasher.update([0u8]);
    }
    to_hex_lower(&hasher.finalize())
}

fn to_hex_lower(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use engine::parse_json;
    use serde_json::json;

    use super::*;
    use crate::app::gameplay::content::build_world;
    use crate::app::gameplay::puzzles::Puzzle;

    fn test_player() -> Player {
        Player {
            position: Vec2 { x: 96.0, y: 276.0 },
            size: Vec2 { x: 24.0, y: 24.0 },
            speed: 160.0,
            name: "ivy".to_string(),
            color: "#00ff00".to_string(),
        }
    }

    fn minimal_legacy_json() -> serde_json::Value {
        json!({
            "player_name": "ivy",
            "region": 1,
            "pos_x": 40.0,
            "pos_y": 270.5,
            "game_time": 12.5,
            "seeds": [
                [true, false, true],
                [false, false, true],
                [false, false],
                [false, false, false],
                [false, false]
            ],
            "crates": [
                [{"x": 448.0, "y": 416.0}],
                [],
                [{"x": 224.0, "y": 192.0}, {"x": 224.0, "y": 384.0}],
                [],
                []
            ],
            "puzzles": [
                {"solved": true},
                {
                    "solved": false,
                    "current_index": 1,
                    "entered_correct_pad": false,
                    "last_hit_index": -1
                },
                {"solved": false},
                {"solved": false, "active": [true, false, true]},
                {"solved": false}
            ]
        })
    }

    #[test]
    fn legacy_shape_without_version_or_digest_restores() {
        let snapshot: SessionSnapshot =
            parse_json(&minimal_legacy_json().to_string()).expect("parse");
        assert_eq!(snapshot.save_version, 0);
        assert_eq!(snapshot.layout_digest, None);

        let mut world = build_world();
        let mut player = test_player();
        let restored = snapshot.restore_into(&mut world, &mut player);

        assert!(restored.issues.is_empty(), "{:?}", restored.issues);
        assert_eq!(restored.region, 1);
        assert_eq!(restored.game_time, 12.5);
        assert_eq!(player.position, Vec2 { x: 40.0, y: 270.5 });
        assert!(world.regions[0].collectibles[0].collected);
        assert!(!world.regions[0].collectibles[1].collected);
        assert_eq!(world.regions[0].crates[0].position, Vec2 { x: 448.0, y: 416.0 });
        assert!(world.regions[0].puzzle.as_ref().is_some_and(Puzzle::is_solved));
        assert!(!world.regions[0].gate.as_ref().expect("gate").closed);
        assert!(world.regions[1].gate.as_ref().expect("gate").closed);
    }

    #[test]
    fn capture_then_restore_reproduces_world_state() {
        let mut world = build_world();
        world.regions[0].collectibles[2].collected = true;
        world.regions[2].crates[1].position = Vec2 { x: 300.0, y: 384.0 };
        let player = test_player();

        let snapshot = SessionSnapshot::capture(&world, &player, 2, 33.0);
        let json = serde_json::to_string(&snapshot).expect("encode");
        let decoded: SessionSnapshot = parse_json(&json).expect("decode");
        assert_eq!(decoded, snapshot);

        let mut fresh = build_world();
        let mut fresh_player = test_player();
        let restored = decoded.restore_into(&mut fresh, &mut fresh_player);

        assert!(restored.issues.is_empty(), "{:?}", restored.issues);
        assert_eq!(fresh, world);
        assert_eq!(fresh_player.position, player.position);
    }

    #[test]
    fn mismatched_inner_arrays_are_skipped_individually() {
        let mut raw = minimal_legacy_json();
        raw["seeds"][0] = json!([true]);
        raw["crates"][2] = json!([{"x": 1.0, "y": 2.0}]);
        let snapshot: SessionSnapshot = parse_json(&raw.to_string()).expect("parse");

        let mut world = build_world();
        let mut player = test_player();
        let restored = snapshot.restore_into(&mut world, &mut player);

        assert_eq!(
            restored.issues,
            vec![
                RestoreIssue::EntryCountMismatch {
                    field: "seeds",
                    region: 0,
                    expected: 3,
                    actual: 1
                },
                RestoreIssue::EntryCountMismatch {
                    field: "crates",
                    region: 2,
                    expected: 2,
                    actual: 1
                },
            ]
        );
        assert!(!world.regions[0].collectibles[0].collected);
        assert!(world.regions[1].collectibles[2].collected);
        assert_eq!(world.regions[2].crates[0].position, Vec2 { x: 224.0, y: 192.0 });
        assert_eq!(world.regions[0].crates[0].position, Vec2 { x: 448.0, y: 416.0 });
    }

    #[test]
    fn short_outer_arrays_restore_the_prefix() {
        let mut raw = minimal_legacy_json();
        raw["puzzles"] = json!([{"solved": true}]);
        let snapshot: SessionSnapshot = parse_json(&raw.to_string()).expect("parse");

        let mut world = build_world();
        let mut player = test_player();
        let restored = snapshot.restore_into(&mut world, &mut player);

        assert_eq!(
            restored.issues,
            vec![RestoreIssue::RegionCountMismatch {
                field: "puzzles",
                expected: 5,
                actual: 1
            }]
        );
        assert!(world.regions[0].puzzle.as_ref().is_some_and(Puzzle::is_solved));
    }

    #[test]
    fn unknown_region_falls_back_to_start() {
        let mut raw = minimal_legacy_json();
        raw["region"] = json!(42);
        let snapshot: SessionSnapshot = parse_json(&raw.to_string()).expect("parse");

        let mut world = build_world();
        let mut player = test_player();
        let restored = snapshot.restore_into(&mut world, &mut player);

        assert_eq!(restored.region, world.start_region);
        assert_eq!(player.position, world.start_position);
        assert_eq!(
            restored.issues,
            vec![RestoreIssue::UnknownRegion {
                region: 42,
                fallback: 0
            }]
        );
    }

    #[test]
    fn digest_mismatch_is_reported_but_not_fatal() {
        let mut raw = minimal_legacy_json();
        raw["layout_digest"] = json!("deadbeef");
        let snapshot: SessionSnapshot = parse_json(&raw.to_string()).expect("parse");

        let mut world = build_world();
        let mut player = test_player();
        let restored = snapshot.restore_into(&mut world, &mut player);

        assert_eq!(restored.issues, vec![RestoreIssue::LayoutDigestMismatch]);
        assert_eq!(restored.region, 1);
    }

    #[test]
    fn layout_digest_tracks_entity_counts() {
        let world = build_world();
        let mut changed = build_world();
        changed.regions[4].collectibles.pop();

        assert_eq!(layout_digest(&world), layout_digest(&build_world()));
        assert_ne!(layout_digest(&world), layout_digest(&changed));
        assert_eq!(layout_digest(&world).len(), 64);
    }

    #[test]
    fn missing_required_field_is_a_parse_error() {
        let mut raw = minimal_legacy_json();
        raw.as_object_mut().expect("object").remove("pos_x");
        assert!(parse_json::<SessionSnapshot>(&raw.to_string()).is_err());
    }
}
