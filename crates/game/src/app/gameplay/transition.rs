use super::graph::RegionGraph;
use super::types::{Direction, Player, Region, RegionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransitionOutcome {
    Stayed,
    /// Crossed a world edge; the player was pushed back inside.
    Clamped(Direction),
    Entered {
        from: RegionId,
        to: RegionId,
        via: Direction,
    },
}

/// Checks the player against the current region's edges (right, left, top,
/// bottom; first hit wins) and either moves them into the neighbor or clamps
/// them inside the world edge.
pub(crate) fn resolve_transition(
    player: &mut Player,
    current: RegionId,
    regions: &[Region],
    graph: &RegionGraph,
    inset: f32,
) -> TransitionOutcome {
    let Some(region) = regions.get(current) else {
        return TransitionOutcome::Stayed;
    };
    let Some(crossed) = crossed_edge(player, region) else {
        return TransitionOutcome::Stayed;
    };

    let target = graph
        .neighbor(current, crossed)
        .and_then(|next| regions.get(next));
    let Some(next_region) = target else {
        clamp_inside(player, region);
        return TransitionOutcome::Clamped(crossed);
    };

    place_at_entry(player, region, next_region, crossed, inset);
    TransitionOutcome::Entered {
        from: current,
        to: next_region.id,
        via: crossed,
    }
}

fn crossed_edge(player: &Player, region: &Region) -> Option<Direction> {
    let rect = player.rect();
    if rect.right() > region.pixel_width() {
        Some(Direction::Right)
    } else if rect.x < 0.0 {
        Some(Direction::Left)
    } else if rect.y < 0.0 {
        Some(Direction::Up)
    } else if rect.bottom() > region.pixel_height() {
        Some(Direction::Down)
    } else {
        None
    }
}

fn clamp_inside(player: &mut Player, region: &Region) {
    let max_x = (region.pixel_width() - player.size.x).max(0.0);
    let max_y = (region.pixel_height() - player.size.y).max(0.0);
    player.position.x = player.position.x.clamp(0.0, max_x);
    player.position.y = player.position.y.clamp(0.0, max_y);
}

fn place_at_entry(
    player: &mut Player,
    from: &Region,
    to: &Region,
    crossed: Direction,
    inset: f32,
) {
    let max_x = (to.pixel_width() - player.size.x).max(0.0);
    let max_y = (to.pixel_height() - player.size.y).max(0.0);

    match crossed {
        Direction::Right | Direction::Left => {
            player.position.y = carry_over(
                player.position.y,
                from.pixel_height(),
                to.pixel_height(),
                max_y,
            );
            player.position.x = if crossed == Direction::Right {
                inset
            } else {
                max_x - inset
            };
        }
        Direction::Up | Direction::Down => {
            player.position.x = carry_over(
                player.position.x,
                from.pixel_width(),
                to.pixel_width(),
                max_x,
            );
            player.position.y = if crossed == Direction::Down {
                inset
            } else {
                max_y - inset
            };
        }
    }
}

/// Keeps the perpendicular coordinate at the same relative spot across
/// regions of different size.
fn carry_over(value: f32, from_extent: f32, to_extent: f32, max_value: f32) -> f32 {
    let scaled = if from_extent > 0.0 {
        value / from_extent * to_extent
    } else {
        value
    };
    scaled.clamp(0.0, max_value)
}

#[cfg(test)]
mod tests {
    use engine::Vec2;

    use super::*;

    fn player_at(x: f32, y: f32) -> Player {
        Player {
            position: Vec2 { x, y },
            size: Vec2 { x: 24.0, y: 24.0 },
            speed: 160.0,
            name: "tester".to_string(),
            color: "#ffffff".to_string(),
        }
    }

    fn two_regions() -> (Vec<Region>, RegionGraph) {
        let regions = vec![
            Region::new(0, "west", 10, 10, 32.0),
            Region::new(1, "east", 10, 20, 32.0),
        ];
        let mut graph = RegionGraph::new(2);
        graph.connect(0, Direction::Right, 1);
        (regions, graph)
    }

    #[test]
    fn inside_bounds_stays() {
        let (regions, graph) = two_regions();
        let mut player = player_at(100.0, 100.0);
        assert_eq!(
            resolve_transition(&mut player, 0, &regions, &graph, 2.0),
            TransitionOutcome::Stayed
        );
        assert_eq!(player.position, Vec2 { x: 100.0, y: 100.0 });
    }

    #[test]
    fn right_edge_without_neighbor_clamps_to_boundary() {
        let (regions, graph) = two_regions();
        let mut player = player_at(310.0, 100.0);

        let outcome = resolve_transition(&mut player, 1, &regions, &graph, 2.0);

        assert_eq!(outcome, TransitionOutcome::Clamped(Direction::Right));
        assert_eq!(player.rect().right(), regions[1].pixel_width());
        assert_eq!(player.position.y, 100.0);
    }

    #[test]
    fn right_edge_with_neighbor_enters_at_left_inset_with_scaled_y() {
        let (regions, graph) = two_regions();
        let mut player = player_at(310.0, 160.0);

        let outcome = resolve_transition(&mut player, 0, &regions, &graph, 2.0);

        assert_eq!(
            outcome,
            TransitionOutcome::Entered {
                from: 0,
                to: 1,
                via: Direction::Right
            }
        );
        assert_eq!(player.position.x, 2.0);
        // Halfway down a 320px region maps to halfway down a 640px one.
        assert_eq!(player.position.y, 320.0);
    }

    #[test]
    fn left_edge_enters_neighbor_at_right_inset() {
        let (regions, graph) = two_regions();
        let mut player = player_at(-5.0, 620.0);

        resolve_transition(&mut player, 1, &regions, &graph, 2.0);

        assert_eq!(player.position.x, 320.0 - 24.0 - 2.0);
        // 620/640 of 320 = 310, clamped to keep the player inside.
        assert_eq!(player.position.y, 320.0 - 24.0);
    }

    #[test]
    fn vertical_crossing_carries_x() {
        let regions = vec![
            Region::new(0, "north", 10, 10, 32.0),
            Region::new(1, "south", 10, 10, 32.0),
        ];
        let mut graph = RegionGraph::new(2);
        graph.connect(0, Direction::Down, 1);

        let mut player = player_at(150.0, 300.0);
        let outcome = resolve_transition(&mut player, 0, &regions, &graph, 2.0);
        assert_eq!(
            outcome,
            TransitionOutcome::Entered {
                from: 0,
                to: 1,
                via: Direction::Down
            }
        );
        assert_eq!(player.position, Vec2 { x: 150.0, y: 2.0 });

        let mut player = player_at(150.0, -3.0);
        resolve_transition(&mut player, 1, &regions, &graph, 2.0);
        assert_eq!(player.position, Vec2 { x: 150.0, y: 320.0 - 24.0 - 2.0 });
    }

    #[test]
    fn right_edge_wins_over_bottom_edge() {
        let (regions, graph) = two_regions();
        let mut player = player_at(310.0, 310.0);

        let outcome = resolve_transition(&mut player, 0, &regions, &graph, 2.0);
        assert!(matches!(
            outcome,
            TransitionOutcome::Entered {
                via: Direction::Right,
                ..
            }
        ));
    }

    #[test]
    fn top_edge_without_neighbor_clamps() {
        let (regions, graph) = two_regions();
        let mut player = player_at(100.0, -10.0);

        let outcome = resolve_transition(&mut player, 0, &regions, &graph, 2.0);
        assert_eq!(outcome, TransitionOutcome::Clamped(Direction::Up));
        assert_eq!(player.position.y, 0.0);
    }
}
