use engine::{Rect, Vec2};

use super::graph::RegionGraph;
use super::puzzles::{CrateTarget, PressurePlate, Puzzle, StrictSequence, ToggleSwitch};
use super::types::{Collectible, Crate, Direction, Gate, Region, RegionId};
use super::{COLLECTIBLE_SIZE, CRATE_SIZE, REGION_COLS, REGION_ROWS, TILE_SIZE};

const GROVE: RegionId = 0;
const RUINS: RegionId = 1;
const QUARRY: RegionId = 2;
const LANTERNS: RegionId = 3;
const SANCTUM: RegionId = 4;
const OPENING_TILES: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct World {
    pub(crate) regions: Vec<Region>,
    pub(crate) graph: RegionGraph,
    pub(crate) start_region: RegionId,
    pub(crate) start_position: Vec2,
    pub(crate) terminal_region: RegionId,
}

impl World {
    pub(crate) fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    pub(crate) fn total_collectibles(&self) -> usize {
        self.regions
            .iter()
            .map(|region| region.collectibles.len())
            .sum()
    }

    pub(crate) fn remaining_collectibles(&self) -> usize {
        self.regions
            .iter()
            .map(Region::remaining_collectibles)
            .sum()
    }

    pub(crate) fn all_collected(&self) -> bool {
        self.remaining_collectibles() == 0
    }

    pub(crate) fn landmark(&self) -> Option<Rect> {
        self.region(self.terminal_region)
            .and_then(|region| region.landmark)
    }

    pub(crate) fn sync_gates(&mut self) {
        for region in &mut self.regions {
            region.sync_gate();
        }
    }
}

fn tiles(count: u32) -> f32 {
    count as f32 * TILE_SIZE
}

fn tile_rect(col: u32, row: u32, cols: u32, rows: u32) -> Rect {
    Rect::new(tiles(col), tiles(row), tiles(cols), tiles(rows))
}

/// Start tile of the centered opening along an edge of `len` tiles.
fn opening_start(len: u32) -> u32 {
    len / 2 - 1
}

/// One-tile border walls, leaving a centered gap on each listed side.
fn perimeter_walls(cols: u32, rows: u32, openings: &[Direction]) -> Vec<Rect> {
    let mut walls = Vec::new();
    let col_gap = opening_start(cols);
    let row_gap = opening_start(rows);

    for (direction, row) in [(Direction::Up, 0), (Direction::Down, rows - 1)] {
        if openings.contains(&direction) {
            walls.push(tile_rect(0, row, col_gap, 1));
            let after = col_gap + OPENING_TILES;
            walls.push(tile_rect(after, row, cols - after, 1));
        } else {
            walls.push(tile_rect(0, row, cols, 1));
        }
    }

    for (direction, col) in [(Direction::Left, 0), (Direction::Right, cols - 1)] {
        if openings.contains(&direction) {
            walls.push(tile_rect(col, 1, 1, row_gap - 1));
            let after = row_gap + OPENING_TILES;
            walls.push(tile_rect(col, after, 1, rows - 1 - after));
        } else {
            walls.push(tile_rect(col, 1, 1, rows - 2));
        }
    }

    walls
}

fn gate_in_opening(cols: u32, rows: u32, side: Direction) -> Gate {
    let rect = match side {
        Direction::Up => tile_rect(opening_start(cols), 0, OPENING_TILES, 1),
        Direction::Down => tile_rect(opening_start(cols), rows - 1, OPENING_TILES, 1),
        Direction::Left => tile_rect(0, opening_start(rows), 1, OPENING_TILES),
        Direction::Right => tile_rect(cols - 1, opening_start(rows), 1, OPENING_TILES),
    };
    Gate { rect, closed: true }
}

fn zone(col: u32, row: u32) -> Rect {
    tile_rect(col, row, 1, 1)
}

fn seed(x: f32, y: f32) -> Collectible {
    Collectible::new(x, y, COLLECTIBLE_SIZE)
}

fn crate_at(col: u32, row: u32) -> Crate {
    Crate::new(tiles(col), tiles(row), CRATE_SIZE)
}

/// Walled region with an opening toward every neighbor in `graph`.
fn region_shell(
    graph: &RegionGraph,
    id: RegionId,
    name: &str,
    gate_side: Option<Direction>,
) -> Region {
    let mut region = Region::new(id, name, REGION_COLS, REGION_ROWS, TILE_SIZE);
    region.obstacles = perimeter_walls(REGION_COLS, REGION_ROWS, &graph.exits(id));
    region.gate = gate_side.map(|side| gate_in_opening(REGION_COLS, REGION_ROWS, side));
    region
}

/// The fixed five-region world. Entity order inside each region is part of
/// the save format: snapshots restore collectibles and crates by position.
pub(crate) fn build_world() -> World {
    let mut graph = RegionGraph::new(5);
    graph.connect(GROVE, Direction::Right, RUINS);
    graph.connect(RUINS, Direction::Right, QUARRY);
    graph.connect(QUARRY, Direction::Down, LANTERNS);
    graph.connect(LANTERNS, Direction::Left, SANCTUM);

    let mut grove = region_shell(&graph, GROVE, "Grove", Some(Direction::Right));
    grove.obstacles.push(tile_rect(3, 3, 2, 1));
    grove.obstacles.push(tile_rect(18, 7, 1, 3));
    grove.crates.push(crate_at(13, 13));
    grove.collectibles.extend([seed(160.0, 448.0), seed(640.0, 96.0), seed(352.0, 224.0)]);
    grove.puzzle = Some(Puzzle::PressurePlate(PressurePlate::new(vec![
        zone(7, 4),
        zone(16, 13),
    ])));

    let mut ruins = region_shell(&graph, RUINS, "Ruins", Some(Direction::Right));
    ruins.obstacles.push(tile_rect(8, 6, 1, 2));
    ruins.obstacles.push(tile_rect(16, 11, 1, 2));
    ruins.collectibles.extend([seed(96.0, 480.0), seed(392.0, 96.0), seed(680.0, 456.0)]);
    ruins.puzzle = Some(Puzzle::StrictSequence(StrictSequence::new(vec![
        zone(5, 4),
        zone(12, 13),
        zone(19, 4),
    ])));

    let mut quarry = region_shell(&graph, QUARRY, "Quarry", Some(Direction::Down));
    quarry.obstacles.push(tile_rect(20, 7, 2, 2));
    quarry.crates.push(crate_at(7, 6));
    quarry.crates.push(crate_at(7, 12));
    quarry.collectibles.extend([seed(128.0, 96.0), seed(640.0, 480.0)]);
    quarry.puzzle = Some(Puzzle::CrateTarget(CrateTarget::new(vec![
        zone(15, 6),
        zone(15, 12),
    ])));

    let mut lanterns = region_shell(&graph, LANTERNS, "Lanterns", Some(Direction::Left));
    lanterns.obstacles.push(tile_rect(6, 11, 3, 1));
    lanterns.obstacles.push(tile_rect(17, 11, 3, 1));
    lanterns.collectibles.extend([seed(96.0, 456.0), seed(680.0, 456.0), seed(392.0, 96.0)]);
    lanterns.puzzle = Some(Puzzle::ToggleSwitch(ToggleSwitch::new(vec![
        zone(5, 5),
        zone(12, 9),
        zone(20, 5),
    ])));

    let mut sanctum = region_shell(&graph, SANCTUM, "Sanctum", None);
    sanctum.collectibles.extend([seed(160.0, 128.0), seed(160.0, 416.0)]);
    sanctum.landmark = Some(tile_rect(11, 8, 2, 2));

    let mut world = World {
        regions: vec![grove, ruins, quarry, lanterns, sanctum],
        graph,
        start_region: GROVE,
        start_position: Vec2 { x: 96.0, y: 276.0 },
        terminal_region: SANCTUM,
    };
    world.sync_gates();
    world
}
