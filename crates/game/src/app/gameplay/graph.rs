use super::types::{Direction, RegionId};

/// Directional adjacency between regions. Fixed once content is generated.
///
/// Symmetry (A right-of B implies B left-of A) is a property of the content,
/// not something this table checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegionGraph {
    neighbors: Vec<[Option<RegionId>; 4]>,
}

impl RegionGraph {
    pub(crate) fn new(region_count: usize) -> Self {
        Self {
            neighbors: vec![[None; 4]; region_count],
        }
    }

    #[cfg(test)]
    pub(crate) fn region_count(&self) -> usize {
        self.neighbors.len()
    }

    pub(crate) fn link(&mut self, from: RegionId, direction: Direction, to: RegionId) {
        if let Some(slots) = self.neighbors.get_mut(from) {
            slots[direction.index()] = Some(to);
        }
    }

    /// Links `a -> b` along `direction` and `b -> a` along the opposite one.
    pub(crate) fn connect(&mut self, a: RegionId, direction: Direction, b: RegionId) {
        self.link(a, direction, b);
        self.link(b, direction.opposite(), a);
    }

    pub(crate) fn neighbor(&self, region: RegionId, direction: Direction) -> Option<RegionId> {
        self.neighbors
            .get(region)
            .and_then(|slots| slots[direction.index()])
    }

    pub(crate) fn exits(&self, region: RegionId) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|direction| self.neighbor(region, *direction).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_links_both_directions() {
        let mut graph = RegionGraph::new(3);
        graph.connect(0, Direction::Right, 1);
        graph.connect(1, Direction::Down, 2);

        assert_eq!(graph.neighbor(0, Direction::Right), Some(1));
        assert_eq!(graph.neighbor(1, Direction::Left), Some(0));
        assert_eq!(graph.neighbor(1, Direction::Down), Some(2));
        assert_eq!(graph.neighbor(2, Direction::Up), Some(1));
    }

    #[test]
    fn missing_neighbor_is_world_edge() {
        let mut graph = RegionGraph::new(2);
        graph.link(0, Direction::Right, 1);

        assert_eq!(graph.neighbor(0, Direction::Left), None);
        assert_eq!(graph.neighbor(1, Direction::Left), None);
        assert_eq!(graph.exits(0), vec![Direction::Right]);
    }

    #[test]
    fn unknown_region_has_no_neighbors() {
        let graph = RegionGraph::new(1);
        assert_eq!(graph.neighbor(7, Direction::Up), None);
        assert!(graph.exits(7).is_empty());
    }
}
