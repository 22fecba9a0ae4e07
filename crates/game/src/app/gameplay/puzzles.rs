use engine::{overlaps, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PuzzleKind {
    PressurePlate,
    StrictSequence,
    CrateTarget,
    ToggleSwitch,
}

impl PuzzleKind {
    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::PressurePlate => "pressure_plate",
            Self::StrictSequence => "strict_sequence",
            Self::CrateTarget => "crate_target",
            Self::ToggleSwitch => "toggle_switch",
        }
    }
}

/// What a puzzle sees each tick.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PuzzleContext<'a> {
    pub(crate) player: Rect,
    pub(crate) crates: &'a [Rect],
    pub(crate) interact_pressed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PuzzleEvent {
    SequenceAdvanced { next_index: usize },
    SequenceReset,
    SwitchToggled { index: usize, active: bool },
    Solved,
}

/// Persisted puzzle sub-state. Every variant shares this flat shape; fields a
/// variant does not use stay absent. `last_hit_index` uses `-1` for "none".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct PuzzleState {
    #[serde(default)]
    pub(crate) solved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) current_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) entered_correct_pad: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) last_hit_index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) active: Option<Vec<bool>>,
}

impl PuzzleState {
    pub(crate) fn unsolved() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum PuzzleRestoreError {
    #[error("current_index {index} out of range for {pad_count} pads")]
    IndexOutOfRange { index: usize, pad_count: usize },
    #[error("last_hit_index {index} out of range for {pad_count} pads")]
    LastHitOutOfRange { index: i64, pad_count: usize },
    #[error("active has {actual} entries, expected {expected}")]
    ActiveLengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Puzzle {
    PressurePlate(PressurePlate),
    StrictSequence(StrictSequence),
    CrateTarget(CrateTarget),
    ToggleSwitch(ToggleSwitch),
}

impl Puzzle {
    pub(crate) fn kind(&self) -> PuzzleKind {
        match self {
            Self::PressurePlate(_) => PuzzleKind::PressurePlate,
            Self::StrictSequence(_) => PuzzleKind::StrictSequence,
            Self::CrateTarget(_) => PuzzleKind::CrateTarget,
            Self::ToggleSwitch(_) => PuzzleKind::ToggleSwitch,
        }
    }

    pub(crate) fn is_solved(&self) -> bool {
        match self {
            Self::PressurePlate(puzzle) => puzzle.solved,
            Self::StrictSequence(puzzle) => puzzle.solved,
            Self::CrateTarget(puzzle) => puzzle.solved,
            Self::ToggleSwitch(puzzle) => puzzle.solved,
        }
    }

    pub(crate) fn is_blocking(&self) -> bool {
        !self.is_solved()
    }

    pub(crate) fn zones(&self) -> &[Rect] {
        match self {
            Self::PressurePlate(puzzle) => &puzzle.plates,
            Self::StrictSequence(puzzle) => &puzzle.pads,
            Self::CrateTarget(puzzle) => &puzzle.targets,
            Self::ToggleSwitch(puzzle) => &puzzle.switches,
        }
    }

    /// Advances the puzzle by one tick. A no-op once solved.
    pub(crate) fn update(&mut self, ctx: &PuzzleContext<'_>) -> Option<PuzzleEvent> {
        if self.is_solved() {
            return None;
        }
        match self {
            Self::PressurePlate(puzzle) => puzzle.update(ctx),
            Self::StrictSequence(puzzle) => puzzle.update(ctx),
            Self::CrateTarget(puzzle) => puzzle.update(ctx),
            Self::ToggleSwitch(puzzle) => puzzle.update(ctx),
        }
    }

    pub(crate) fn snapshot(&self) -> PuzzleState {
        match self {
            Self::PressurePlate(puzzle) => PuzzleState {
                solved: puzzle.solved,
                ..PuzzleState::default()
            },
            Self::StrictSequence(puzzle) => PuzzleState {
                solved: puzzle.solved,
                current_index: Some(puzzle.current_index),
                entered_correct_pad: Some(puzzle.entered_correct_pad),
                last_hit_index: Some(puzzle.last_hit_index.map_or(-1, |index| index as i64)),
                active: None,
            },
            Self::CrateTarget(puzzle) => PuzzleState {
                solved: puzzle.solved,
                ..PuzzleState::default()
            },
            Self::ToggleSwitch(puzzle) => PuzzleState {
                solved: puzzle.solved,
                active: Some(puzzle.active.clone()),
                ..PuzzleState::default()
            },
        }
    }

    /// Applies a persisted state. `solved` is always applied; sub-state that
    /// does not fit this puzzle is reset to its initial value and reported.
    pub(crate) fn restore(&mut self, state: &PuzzleState) -> Result<(), PuzzleRestoreError> {
        match self {
            Self::PressurePlate(puzzle) => {
                puzzle.solved = state.solved;
                Ok(())
            }
            Self::StrictSequence(puzzle) => puzzle.restore(state),
            Self::CrateTarget(puzzle) => {
                puzzle.solved = state.solved;
                Ok(())
            }
            Self::ToggleSwitch(puzzle) => puzzle.restore(state),
        }
    }
}

/// Solved the first tick every plate is covered by the player or a crate.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PressurePlate {
    plates: Vec<Rect>,
    solved: bool,
}

impl PressurePlate {
    pub(crate) fn new(plates: Vec<Rect>) -> Self {
        Self {
            plates,
            solved: false,
        }
    }

    fn pressed_plates(&self, ctx: &PuzzleContext<'_>) -> Vec<bool> {
        self.plates
            .iter()
            .map(|plate| {
                overlaps(&ctx.player, plate)
                    || ctx.crates.iter().any(|crate_rect| overlaps(crate_rect, plate))
            })
            .collect()
    }

    fn update(&mut self, ctx: &PuzzleContext<'_>) -> Option<PuzzleEvent> {
        if self.pressed_plates(ctx).into_iter().all(|pressed| pressed) {
            self.solved = true;
            return Some(PuzzleEvent::Solved);
        }
        None
    }
}

/// Pads must be stepped on and left in order. Touching any pad other than
/// the current target resets progress to the first pad.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StrictSequence {
    pads: Vec<Rect>,
    current_index: usize,
    entered_correct_pad: bool,
    last_hit_index: Option<usize>,
    solved: bool,
}

impl StrictSequence {
    pub(crate) fn new(pads: Vec<Rect>) -> Self {
        Self {
            pads,
            current_index: 0,
            entered_correct_pad: false,
            last_hit_index: None,
            solved: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn current_index(&self) -> usize {
        self.current_index
    }

    #[cfg(test)]
    pub(crate) fn entered_correct_pad(&self) -> bool {
        self.entered_correct_pad
    }

    fn reset_progress(&mut self) {
        self.current_index = 0;
        self.entered_correct_pad = false;
        self.last_hit_index = None;
    }

    fn update(&mut self, ctx: &PuzzleContext<'_>) -> Option<PuzzleEvent> {
        let mut on_target = false;
        let mut on_wrong_pad = false;
        for (index, pad) in self.pads.iter().enumerate() {
            if overlaps(&ctx.player, pad) {
                if index == self.current_index {
                    on_target = true;
                } else {
                    on_wrong_pad = true;
                }
            }
        }

        if on_wrong_pad {
            let had_progress = self.current_index > 0 || self.entered_correct_pad;
            self.reset_progress();
            return had_progress.then_some(PuzzleEvent::SequenceReset);
        }

        if on_target {
            self.entered_correct_pad = true;
            self.last_hit_index = Some(self.current_index);
            return None;
        }

        if self.entered_correct_pad && self.last_hit_index == Some(self.current_index) {
            self.current_index += 1;
            self.entered_correct_pad = false;
            self.last_hit_index = None;
            if self.current_index >= self.pads.len() {
                self.solved = true;
                return Some(PuzzleEvent::Solved);
            }
            return Some(PuzzleEvent::SequenceAdvanced {
                next_index: self.current_index,
            });
        }

        None
    }

    fn restore(&mut self, state: &PuzzleState) -> Result<(), PuzzleRestoreError> {
        self.solved = state.solved;
        self.reset_progress();

        let pad_count = self.pads.len();
        let current_index = state.current_index.unwrap_or(0);
        if current_index > pad_count || (current_index == pad_count && !state.solved) {
            return Err(PuzzleRestoreError::IndexOutOfRange {
                index: current_index,
                pad_count,
            });
        }
        let last_hit_index = match state.last_hit_index {
            None => None,
            Some(index) if index < 0 => None,
            Some(index) if (index as usize) < pad_count => Some(index as usize),
            Some(index) => {
                return Err(PuzzleRestoreError::LastHitOutOfRange { index, pad_count });
            }
        };

        self.current_index = current_index;
        self.entered_correct_pad = state.entered_correct_pad.unwrap_or(false);
        self.last_hit_index = last_hit_index;
        Ok(())
    }
}

/// Sokoban goal: each crate rests on its own target zone.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CrateTarget {
    targets: Vec<Rect>,
    solved: bool,
}

impl CrateTarget {
    pub(crate) fn new(targets: Vec<Rect>) -> Self {
        Self {
            targets,
            solved: false,
        }
    }

    fn update(&mut self, ctx: &PuzzleContext<'_>) -> Option<PuzzleEvent> {
        if crates_cover_distinct_targets(ctx.crates, &self.targets) {
            self.solved = true;
            return Some(PuzzleEvent::Solved);
        }
        None
    }
}

/// True when crate and target counts match and every crate can be assigned
/// a different target it overlaps (bipartite matching by augmenting paths).
fn crates_cover_distinct_targets(crates: &[Rect], targets: &[Rect]) -> bool {
    if crates.len() != targets.len() {
        return false;
    }

    let mut crate_for_target: Vec<Option<usize>> = vec![None; targets.len()];
    for crate_index in 0..crates.len() {
        let mut visited = vec![false; targets.len()];
        if !assign_crate(crate_index, crates, targets, &mut crate_for_target, &mut visited) {
            return false;
        }
    }
    true
}

fn assign_crate(
    crate_index: usize,
    crates: &[Rect],
    targets: &[Rect],
    crate_for_target: &mut [Option<usize>],
    visited: &mut [bool],
) -> bool {
    for (target_index, target) in targets.iter().enumerate() {
        if visited[target_index] || !overlaps(&crates[crate_index], target) {
            continue;
        }
        visited[target_index] = true;
        let free = match crate_for_target[target_index] {
            None => true,
            Some(other) => assign_crate(other, crates, targets, crate_for_target, visited),
        };
        if free {
            crate_for_target[target_index] = Some(crate_index);
            return true;
        }
    }
    false
}

/// Interact while standing on a switch flips it; all switches on solves.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ToggleSwitch {
    switches: Vec<Rect>,
    active: Vec<bool>,
    solved: bool,
}

impl ToggleSwitch {
    pub(crate) fn new(switches: Vec<Rect>) -> Self {
        let active = vec![false; switches.len()];
        Self {
            switches,
            active,
            solved: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn active(&self) -> &[bool] {
        &self.active
    }

    fn update(&mut self, ctx: &PuzzleContext<'_>) -> Option<PuzzleEvent> {
        let mut event = None;
        if ctx.interact_pressed {
            if let Some(index) = self
                .switches
                .iter()
                .position(|switch| overlaps(&ctx.player, switch))
            {
                self.active[index] = !self.active[index];
                event = Some(PuzzleEvent::SwitchToggled {
                    index,
                    active: self.active[index],
                });
            }
        }

        if self.active.iter().all(|active| *active) {
            // Solved latches: the gate stays open even if a switch could
            // later be flipped back off.
            self.solved = true;
            return Some(PuzzleEvent::Solved);
        }
        event
    }

    fn restore(&mut self, state: &PuzzleState) -> Result<(), PuzzleRestoreError> {
        self.solved = state.solved;
        let expected = self.switches.len();
        match &state.active {
            Some(active) if active.len() == expected => {
                self.active = active.clone();
                Ok(())
            }
            Some(active) => {
                self.active = vec![state.solved; expected];
                Err(PuzzleRestoreError::ActiveLengthMismatch {
                    expected,
                    actual: active.len(),
                })
            }
            None => {
                self.active = vec![state.solved; expected];
                Ok(())
            }
        }
    }
}
