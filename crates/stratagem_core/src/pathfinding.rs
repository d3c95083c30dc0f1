//! Grid-based pathfinding using the A* algorithm.
//!
//! Goals are ranges rather than single tiles: a search succeeds on any
//! tile whose distance to the goal rectangle lies inside
//! `[min_range, max_range]`. Orders publish that goal each tick through a
//! [`PathfinderInput`].
//!
//! All costs are integers and ties are broken by tile coordinates, so the
//! same grid and goal always produce the same path.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{GameError, Result};
use crate::math::{rect_distance, TilePos, TileSize};

/// Cell types for the navigation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellType {
    /// Normal walkable terrain (cost: 1).
    #[default]
    Walkable,
    /// Impassable terrain.
    Blocked,
    /// Slow terrain with 2x movement cost.
    SlowTerrain,
}

impl CellType {
    /// Returns the movement cost for this cell type.
    /// Returns `None` for blocked cells.
    #[must_use]
    pub const fn movement_cost(self) -> Option<u32> {
        match self {
            Self::Walkable => Some(1),
            Self::Blocked => None,
            Self::SlowTerrain => Some(2),
        }
    }

    /// Returns true if this cell is walkable.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        !matches!(self, Self::Blocked)
    }
}

/// Navigation grid of one map layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavGrid {
    width: u32,
    height: u32,
    /// Cell data stored in row-major order.
    cells: Vec<CellType>,
}

impl NavGrid {
    /// Create a new navigation grid with all cells walkable.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "NavGrid width must be positive");
        assert!(height > 0, "NavGrid height must be positive");

        let cell_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![CellType::Walkable; cell_count],
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, tile: TilePos) -> Option<usize> {
        if self.in_bounds(tile) {
            Some((tile.y as usize) * (self.width as usize) + (tile.x as usize))
        } else {
            None
        }
    }

    /// Check if a tile is within grid bounds.
    #[must_use]
    pub fn in_bounds(&self, tile: TilePos) -> bool {
        tile.x >= 0 && tile.y >= 0 && (tile.x as u32) < self.width && (tile.y as u32) < self.height
    }

    /// Get cell type at a tile.
    /// Returns `None` if out of bounds.
    #[must_use]
    pub fn get_cell(&self, tile: TilePos) -> Option<CellType> {
        self.index(tile).map(|i| self.cells[i])
    }

    /// Set cell type at a tile.
    /// Returns `false` if out of bounds.
    pub fn set_cell(&mut self, tile: TilePos, cell_type: CellType) -> bool {
        match self.index(tile) {
            Some(i) => {
                self.cells[i] = cell_type;
                true
            }
            None => false,
        }
    }

    /// Check if a tile is walkable.
    #[must_use]
    pub fn is_walkable(&self, tile: TilePos) -> bool {
        self.get_cell(tile).is_some_and(CellType::is_walkable)
    }

    /// Get movement cost for entering a tile.
    /// Returns `None` for blocked or out-of-bounds tiles.
    #[must_use]
    pub fn movement_cost(&self, tile: TilePos) -> Option<u32> {
        self.get_cell(tile).and_then(CellType::movement_cost)
    }
}

/// Navigational goal published by an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PathfinderInput {
    min_range: u32,
    max_range: u32,
    goal: TilePos,
    goal_size: TileSize,
    map_layer: usize,
}

impl PathfinderInput {
    /// Create an input aimed at a single tile.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest acceptable distance to the goal.
    pub fn set_min_range(&mut self, range: u32) {
        self.min_range = range;
    }

    /// Largest acceptable distance to the goal.
    pub fn set_max_range(&mut self, range: u32) {
        self.max_range = range;
    }

    /// Goal rectangle. A zero size marks a plain position.
    pub fn set_goal(&mut self, goal: TilePos, size: TileSize, map_layer: usize) {
        self.goal = goal;
        self.goal_size = size;
        self.map_layer = map_layer;
    }

    /// Smallest acceptable distance.
    #[must_use]
    pub const fn min_range(&self) -> u32 {
        self.min_range
    }

    /// Largest acceptable distance.
    #[must_use]
    pub const fn max_range(&self) -> u32 {
        self.max_range
    }

    /// Top-left tile of the goal.
    #[must_use]
    pub const fn goal(&self) -> TilePos {
        self.goal
    }

    /// Goal footprint.
    #[must_use]
    pub const fn goal_size(&self) -> TileSize {
        self.goal_size
    }

    /// Map layer of the goal.
    #[must_use]
    pub const fn map_layer(&self) -> usize {
        self.map_layer
    }

    /// Whether a unit of `size` standing at `tile` has arrived.
    #[must_use]
    pub fn is_goal(&self, tile: TilePos, size: TileSize) -> bool {
        let distance = rect_distance(tile, size, self.goal, self.goal_size);
        distance >= self.min_range && distance <= self.max_range
    }

    /// Lower bound on the steps still needed from `tile`.
    fn heuristic(&self, tile: TilePos) -> u32 {
        let gap_x = axis_gap(tile.x, self.goal.x, self.goal_size.w);
        let gap_y = axis_gap(tile.y, self.goal.y, self.goal_size.h);
        gap_x.max(gap_y).saturating_sub(self.max_range)
    }
}

fn axis_gap(value: i32, start: i32, len: u32) -> u32 {
    let end = start + len.max(1) as i32 - 1;
    if value < start {
        start.abs_diff(value)
    } else if value > end {
        value.abs_diff(end)
    } else {
        0
    }
}

/// A node in the A* open set priority queue.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct AStarNode {
    tile: TilePos,
    /// f_score = g_score + heuristic (negated for min-heap)
    f_score: u32,
    /// Tie-breaker for determinism: lower coordinates first.
    tie_breaker: u64,
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; lower f_score = higher priority.
        match other.f_score.cmp(&self.f_score) {
            Ordering::Equal => other.tie_breaker.cmp(&self.tie_breaker),
            ord => ord,
        }
    }
}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Direction offsets for 8-directional movement.
const DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),   // East
    (1, 1),   // Southeast
    (0, 1),   // South
    (-1, 1),  // Southwest
    (-1, 0),  // West
    (-1, -1), // Northwest
    (0, -1),  // North
    (1, -1),  // Northeast
];

/// Check if a diagonal move is valid (no corner cutting through blocked cells).
#[inline]
fn is_diagonal_valid(grid: &NavGrid, tile: TilePos, dx: i32, dy: i32) -> bool {
    if dx != 0 && dy != 0 {
        grid.is_walkable(TilePos::new(tile.x + dx, tile.y))
            && grid.is_walkable(TilePos::new(tile.x, tile.y + dy))
    } else {
        true
    }
}

/// Convert coordinates to a tie-breaker value for deterministic ordering.
#[inline]
fn tie_breaker(tile: TilePos) -> u64 {
    (u64::from(tile.y as u32) << 32) | u64::from(tile.x as u32)
}

/// Find a path for a unit of `size` from `start` to any goal tile of `input`.
///
/// Units are steered by their top-left tile. The returned path excludes
/// `start`; it is empty when `start` already satisfies the goal.
///
/// # Errors
///
/// Returns `GameError::InvalidState` if:
/// - The start tile is outside the grid or blocked
/// - No tile satisfying the goal is reachable
pub fn find_path_to(
    grid: &NavGrid,
    start: TilePos,
    size: TileSize,
    input: &PathfinderInput,
) -> Result<Vec<TilePos>> {
    if !grid.is_walkable(start) {
        return Err(GameError::InvalidState(format!(
            "Start tile ({}, {}) is blocked or off the grid",
            start.x, start.y
        )));
    }

    if input.is_goal(start, size) {
        return Ok(Vec::new());
    }

    let mut open_set: BinaryHeap<AStarNode> = BinaryHeap::new();
    let mut came_from: HashMap<TilePos, TilePos> = HashMap::new();
    let mut g_score: HashMap<TilePos, u32> = HashMap::new();

    g_score.insert(start, 0);
    open_set.push(AStarNode {
        tile: start,
        f_score: input.heuristic(start),
        tie_breaker: tie_breaker(start),
    });

    while let Some(current) = open_set.pop() {
        if input.is_goal(current.tile, size) {
            return Ok(reconstruct_path(&came_from, start, current.tile));
        }

        let current_g = g_score.get(&current.tile).copied().unwrap_or(u32::MAX);

        for &(dx, dy) in &DIRECTIONS {
            let next = TilePos::new(current.tile.x + dx, current.tile.y + dy);

            // Get movement cost (None if blocked or off the grid)
            let Some(move_cost) = grid.movement_cost(next) else {
                continue;
            };

            if !is_diagonal_valid(grid, current.tile, dx, dy) {
                continue;
            }

            let tentative_g = current_g.saturating_add(move_cost);
            let neighbor_g = g_score.get(&next).copied().unwrap_or(u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(next, current.tile);
                g_score.insert(next, tentative_g);
                open_set.push(AStarNode {
                    tile: next,
                    f_score: tentative_g.saturating_add(input.heuristic(next)),
                    tie_breaker: tie_breaker(next),
                });
            }
        }
    }

    Err(GameError::InvalidState(format!(
        "No path from ({}, {}) to ({}, {})",
        start.x,
        start.y,
        input.goal().x,
        input.goal().y
    )))
}

/// Reconstruct path from came_from map, excluding the start tile.
fn reconstruct_path(
    came_from: &HashMap<TilePos, TilePos>,
    start: TilePos,
    goal: TilePos,
) -> Vec<TilePos> {
    let mut path = vec![goal];
    let mut current = goal;

    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }

    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile_goal(x: i32, y: i32) -> PathfinderInput {
        let mut input = PathfinderInput::new();
        input.set_goal(TilePos::new(x, y), TileSize::ZERO, 0);
        input
    }

    #[test]
    fn test_cell_type_costs() {
        assert_eq!(CellType::Walkable.movement_cost(), Some(1));
        assert_eq!(CellType::Blocked.movement_cost(), None);
        assert_eq!(CellType::SlowTerrain.movement_cost(), Some(2));
    }

    #[test]
    fn test_set_and_get_cell() {
        let mut grid = NavGrid::new(5, 5);
        let tile = TilePos::new(2, 2);

        assert!(grid.is_walkable(tile));
        grid.set_cell(tile, CellType::Blocked);
        assert!(!grid.is_walkable(tile));
        grid.set_cell(tile, CellType::SlowTerrain);
        assert_eq!(grid.movement_cost(tile), Some(2));

        assert!(!grid.set_cell(TilePos::new(-1, 0), CellType::Blocked));
        assert_eq!(grid.get_cell(TilePos::new(5, 0)), None);
    }

    #[test]
    fn test_simple_path() {
        let grid = NavGrid::new(10, 10);

        let path = find_path_to(&grid, TilePos::new(0, 0), TileSize::ONE, &tile_goal(5, 5)).unwrap();

        assert_eq!(path.len(), 5);
        assert_eq!(path.last(), Some(&TilePos::new(5, 5)));
    }

    #[test]
    fn test_path_stops_in_range() {
        let grid = NavGrid::new(10, 10);
        let mut input = PathfinderInput::new();
        input.set_goal(TilePos::new(6, 0), TileSize::new(2, 2), 0);
        input.set_max_range(1);

        let path = find_path_to(&grid, TilePos::new(0, 0), TileSize::ONE, &input).unwrap();

        assert_eq!(path.last(), Some(&TilePos::new(5, 0)));
        assert!(input.is_goal(TilePos::new(5, 0), TileSize::ONE));
    }

    #[test]
    fn test_path_around_obstacle() {
        let mut grid = NavGrid::new(10, 10);
        for y in 2..8 {
            grid.set_cell(TilePos::new(5, y), CellType::Blocked);
        }

        let path = find_path_to(&grid, TilePos::new(2, 5), TileSize::ONE, &tile_goal(8, 5)).unwrap();

        assert_eq!(path.last(), Some(&TilePos::new(8, 5)));
        for tile in &path {
            assert!(grid.is_walkable(*tile), "Path goes through blocked cell {tile:?}");
        }
    }

    #[test]
    fn test_no_path_exists() {
        let mut grid = NavGrid::new(10, 10);
        for y in 0..10 {
            grid.set_cell(TilePos::new(5, y), CellType::Blocked);
        }

        let result = find_path_to(&grid, TilePos::new(2, 5), TileSize::ONE, &tile_goal(8, 5));
        assert!(result.is_err());
    }

    #[test]
    fn test_already_there() {
        let grid = NavGrid::new(10, 10);
        let path = find_path_to(&grid, TilePos::new(5, 5), TileSize::ONE, &tile_goal(5, 5)).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_blocked_start() {
        let mut grid = NavGrid::new(10, 10);
        grid.set_cell(TilePos::new(0, 0), CellType::Blocked);

        let result = find_path_to(&grid, TilePos::new(0, 0), TileSize::ONE, &tile_goal(5, 5));
        assert!(result.is_err());
    }

    #[test]
    fn test_min_range_keeps_distance() {
        let grid = NavGrid::new(10, 10);
        let mut input = tile_goal(5, 5);
        input.set_min_range(2);
        input.set_max_range(3);

        let path = find_path_to(&grid, TilePos::new(5, 5), TileSize::ONE, &input).unwrap();
        let end = *path.last().unwrap();
        let distance = rect_distance(end, TileSize::ONE, TilePos::new(5, 5), TileSize::ZERO);

        assert!((2..=3).contains(&distance));
    }

    #[test]
    fn test_determinism() {
        let mut grid = NavGrid::new(20, 20);
        for y in 5..15 {
            grid.set_cell(TilePos::new(10, y), CellType::Blocked);
        }
        let start = TilePos::new(5, 10);
        let goal = tile_goal(15, 10);

        let path1 = find_path_to(&grid, start, TileSize::ONE, &goal).unwrap();
        let path2 = find_path_to(&grid, start, TileSize::ONE, &goal).unwrap();
        let path3 = find_path_to(&grid, start, TileSize::ONE, &goal).unwrap();

        assert_eq!(path1, path2);
        assert_eq!(path2, path3);
    }

    #[test]
    fn test_slow_terrain_avoided_when_cheaper() {
        let mut grid = NavGrid::new(10, 3);
        for x in 2..8 {
            grid.set_cell(TilePos::new(x, 1), CellType::SlowTerrain);
        }

        let path = find_path_to(&grid, TilePos::new(0, 1), TileSize::ONE, &tile_goal(9, 1)).unwrap();

        assert_eq!(path.last(), Some(&TilePos::new(9, 1)));
        assert!(path
            .iter()
            .all(|t| grid.get_cell(*t) != Some(CellType::SlowTerrain)));
    }
}
