use engine::{Rect, Vec2};

use super::puzzles::Puzzle;

pub(crate) type RegionId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub(crate) const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub(crate) const fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }

    pub(crate) const fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Player {
    pub(crate) position: Vec2,
    pub(crate) size: Vec2,
    pub(crate) speed: f32,
    pub(crate) name: String,
    pub(crate) color: String,
}

impl Player {
    pub(crate) fn rect(&self) -> Rect {
        Rect::from_position(self.position, self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Collectible {
    pub(crate) position: Vec2,
    pub(crate) size: f32,
    pub(crate) collected: bool,
    /// Presentation only; never persisted.
    pub(crate) anim_phase: f32,
}

impl Collectible {
    pub(crate) fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            position: Vec2 { x, y },
            size,
            collected: false,
            anim_phase: (x + y) * 0.01,
        }
    }

    pub(crate) fn rect(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size, self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Crate {
    pub(crate) position: Vec2,
    pub(crate) size: f32,
}

impl Crate {
    pub(crate) fn new(x: f32, y: f32, size: f32) -> Self {
        Self {
            position: Vec2 { x, y },
            size,
        }
    }

    pub(crate) fn rect(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.size, self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Gate {
    pub(crate) rect: Rect,
    pub(crate) closed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Region {
    pub(crate) id: RegionId,
    pub(crate) name: String,
    pub(crate) cols: u32,
    pub(crate) rows: u32,
    pub(crate) tile_size: f32,
    pub(crate) obstacles: Vec<Rect>,
    pub(crate) collectibles: Vec<Collectible>,
    pub(crate) crates: Vec<Crate>,
    pub(crate) puzzle: Option<Puzzle>,
    pub(crate) gate: Option<Gate>,
    pub(crate) landmark: Option<Rect>,
}

impl Region {
    pub(crate) fn new(
        id: RegionId,
        name: impl Into<String>,
        cols: u32,
        rows: u32,
        tile_size: f32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            cols,
            rows,
            tile_size,
            obstacles: Vec::new(),
            collectibles: Vec::new(),
            crates: Vec::new(),
            puzzle: None,
            gate: None,
            landmark: None,
        }
    }

    pub(crate) fn pixel_width(&self) -> f32 {
        self.cols as f32 * self.tile_size
    }

    pub(crate) fn pixel_height(&self) -> f32 {
        self.rows as f32 * self.tile_size
    }

    pub(crate) fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.pixel_width(), self.pixel_height())
    }

    pub(crate) fn crate_rects(&self) -> Vec<Rect> {
        self.crates.iter().map(Crate::rect).collect()
    }

    /// Zones the region's puzzle reacts to (plates, pads, targets or switches).
    #[cfg(test)]
    pub(crate) fn target_zones(&self) -> &[Rect] {
        self.puzzle.as_ref().map(Puzzle::zones).unwrap_or(&[])
    }

    pub(crate) fn closed_gate(&self) -> Option<&Rect> {
        self.gate
            .as_ref()
            .filter(|gate| gate.closed)
            .map(|gate| &gate.rect)
    }

    /// Gate is open iff the region has no puzzle or its puzzle is solved.
    pub(crate) fn sync_gate(&mut self) {
        let blocking = self.puzzle.as_ref().is_some_and(Puzzle::is_blocking);
        if let Some(gate) = self.gate.as_mut() {
            gate.closed = blocking;
        }
    }

    pub(crate) fn remaining_collectibles(&self) -> usize {
        self.collectibles
            .iter()
            .filter(|collectible| !collectible.collected)
            .count()
    }
}
