use engine::{overlaps, Rect, Vec2};

use super::types::{Player, Region};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct MovementOutcome {
    /// Displacement actually applied to the player.
    pub(crate) applied: Vec2,
    pub(crate) pushed_crate: Option<usize>,
    pub(crate) blocked_x: bool,
    pub(crate) blocked_y: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisStep {
    Moved,
    Pushed(usize),
    Blocked,
}

/// Moves the player by `delta`, X first then Y, so a blocked axis still lets
/// the other one slide. Crates are pushed one at a time, never in chains,
/// and a step that would touch two crates at once is blocked.
pub(crate) fn resolve_movement(
    player: &mut Player,
    region: &mut Region,
    delta: Vec2,
) -> MovementOutcome {
    let mut outcome = MovementOutcome::default();

    if delta.x != 0.0 {
        match step_axis(&player.rect(), region, delta.x, 0.0) {
            AxisStep::Moved => {
                player.position.x += delta.x;
                outcome.applied.x = delta.x;
            }
            AxisStep::Pushed(index) => {
                region.crates[index].position.x += delta.x;
                player.position.x += delta.x;
                outcome.applied.x = delta.x;
                outcome.pushed_crate = Some(index);
            }
            AxisStep::Blocked => outcome.blocked_x = true,
        }
    }

    if delta.y != 0.0 {
        match step_axis(&player.rect(), region, 0.0, delta.y) {
            AxisStep::Moved => {
                player.position.y += delta.y;
                outcome.applied.y = delta.y;
            }
            AxisStep::Pushed(index) => {
                region.crates[index].position.y += delta.y;
                player.position.y += delta.y;
                outcome.applied.y = delta.y;
                outcome.pushed_crate = Some(index);
            }
            AxisStep::Blocked => outcome.blocked_y = true,
        }
    }

    outcome
}

fn step_axis(player: &Rect, region: &Region, dx: f32, dy: f32) -> AxisStep {
    let candidate = player.translated(dx, dy);

    // Closed gates reject even when a crate sits in front of them.
    if region
        .closed_gate()
        .is_some_and(|gate| overlaps(&candidate, gate))
    {
        return AxisStep::Blocked;
    }

    let mut touching = region
        .crates
        .iter()
        .enumerate()
        .filter(|(_, crate_box)| overlaps(&candidate, &crate_box.rect()))
        .map(|(index, _)| index);
    if let Some(index) = touching.next() {
        // Only a single crate can be pushed; straddling two blocks the step.
        if touching.next().is_none()
            && can_push_crate(region, index, dx, dy)
            && !hits_obstacle(region, &candidate)
        {
            return AxisStep::Pushed(index);
        }
        return AxisStep::Blocked;
    }

    if hits_obstacle(region, &candidate) || !within_movement_allowance(region, &candidate) {
        return AxisStep::Blocked;
    }

    AxisStep::Moved
}

fn can_push_crate(region: &Region, index: usize, dx: f32, dy: f32) -> bool {
    let moved = region.crates[index].rect().translated(dx, dy);

    if !region.bounds().contains_rect(&moved) || hits_obstacle(region, &moved) {
        return false;
    }
    if region
        .closed_gate()
        .is_some_and(|gate| overlaps(&moved, gate))
    {
        return false;
    }
    !region
        .crates
        .iter()
        .enumerate()
        .any(|(other, crate_box)| other != index && overlaps(&moved, &crate_box.rect()))
}

fn hits_obstacle(region: &Region, rect: &Rect) -> bool {
    region
        .obstacles
        .iter()
        .any(|obstacle| overlaps(rect, obstacle))
}

/// The player may stray one tile past the region so the transition check can
/// see the crossing before it clamps.
fn within_movement_allowance(region: &Region, rect: &Rect) -> bool {
    region.bounds().inflated(region.tile_size).contains_rect(rect)
}
