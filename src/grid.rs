//! Occupancy grid and footprint-aware collision checks.
//!
//! The obstacle mask is stored row-major in a flat `Vec<bool>`, the same
//! layout the pheromone fields and the traffic heatmap use, so one index
//! addresses the same cell in all of them.

use crate::components::{Cell, Footprint};
use crate::error::{ConfigError, Result};

/// 8-connected moves: orthogonal first, then diagonals.
pub const DIRECTIONS: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    height: usize,
    width: usize,
    obstacles: Vec<bool>,
    footprint: Footprint,
}

impl Grid {
    /// Obstacle-free grid with a unit footprint.
    pub fn new(height: usize, width: usize) -> Result<Self> {
        Self::from_mask(height, width, vec![false; height * width])
    }

    /// Grid from a row-major mask where `true` marks an obstacle.
    pub fn from_mask(height: usize, width: usize, obstacles: Vec<bool>) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(ConfigError::EmptyGrid { height, width });
        }
        if obstacles.len() != height * width {
            return Err(ConfigError::MaskSizeMismatch {
                expected: height * width,
                actual: obstacles.len(),
            });
        }
        Ok(Self {
            height,
            width,
            obstacles,
            footprint: Footprint::UNIT,
        })
    }

    /// Set the footprint used by footprint-constrained agents.
    pub fn with_footprint(mut self, footprint: Footprint) -> Result<Self> {
        if footprint.height == 0 || footprint.width == 0 {
            return Err(ConfigError::EmptyFootprint {
                height: footprint.height,
                width: footprint.width,
            });
        }
        self.footprint = footprint;
        Ok(self)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// Footprint a class occupies: the grid footprint when constrained,
    /// a single cell otherwise.
    pub fn footprint_for(&self, footprint_aware: bool) -> Footprint {
        if footprint_aware {
            self.footprint
        } else {
            Footprint::UNIT
        }
    }

    /// Flat index of an in-bounds cell.
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some(cell.row * self.width + cell.col)
        } else {
            None
        }
    }

    /// Inverse of [`Grid::index`].
    pub fn cell_at(&self, index: usize) -> Cell {
        Cell::new(index / self.width, index % self.width)
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| self.obstacles[i])
    }

    /// Mark the half-open rectangle `[top_left, bottom_right)` as obstacle.
    /// Parts outside the grid are ignored.
    pub fn add_obstacle(&mut self, top_left: Cell, bottom_right: Cell) {
        let row_end = bottom_right.row.min(self.height);
        let col_end = bottom_right.col.min(self.width);
        for row in top_left.row..row_end {
            for col in top_left.col..col_end {
                self.obstacles[row * self.width + col] = true;
            }
        }
    }

    /// Set or clear a single cell. Out-of-bounds cells are ignored.
    pub fn set_obstacle(&mut self, cell: Cell, blocked: bool) {
        if let Some(i) = self.index(cell) {
            self.obstacles[i] = blocked;
        }
    }

    pub fn is_passable(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| !self.obstacles[i])
    }

    /// True when the grid footprint anchored at `origin` leaves the grid on
    /// either axis or covers any obstacle.
    pub fn footprint_collides(&self, origin: Cell) -> bool {
        self.collides_with(origin, self.footprint)
    }

    pub fn collides_with(&self, origin: Cell, footprint: Footprint) -> bool {
        if origin.row + footprint.height > self.height || origin.col + footprint.width > self.width
        {
            return true;
        }
        footprint
            .cells(origin)
            .any(|c| self.obstacles[c.row * self.width + c.col])
    }

    /// True when an agent can stand at `cell`.
    pub fn fits(&self, cell: Cell, footprint_aware: bool) -> bool {
        self.is_passable(cell) && (!footprint_aware || !self.footprint_collides(cell))
    }

    /// Adjacent cells (diagonals included) an agent can step onto, in
    /// [`DIRECTIONS`] order.
    pub fn neighbors(&self, cell: Cell, footprint_aware: bool) -> Vec<Cell> {
        let mut out = Vec::with_capacity(DIRECTIONS.len());
        self.neighbors_into(cell, footprint_aware, &mut out);
        out
    }

    /// Like [`Grid::neighbors`] but reuses `out`, which is cleared first.
    pub fn neighbors_into(&self, cell: Cell, footprint_aware: bool, out: &mut Vec<Cell>) {
        out.clear();
        out.extend(
            DIRECTIONS
                .iter()
                .filter_map(|&(dr, dc)| cell.offset(dr, dc))
                .filter(|&n| self.fits(n, footprint_aware)),
        );
    }

    /// Number of the 8 surrounding cells that are in bounds, free, and
    /// footprint-clear.
    pub fn clearance(&self, cell: Cell, footprint_aware: bool) -> usize {
        let footprint = self.footprint_for(footprint_aware);
        DIRECTIONS
            .iter()
            .filter_map(|&(dr, dc)| cell.offset(dr, dc))
            .filter(|&n| self.is_passable(n) && !self.collides_with(n, footprint))
            .count()
    }

    pub fn obstacle_count(&self) -> usize {
        self.obstacles.iter().filter(|&&b| b).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(h: usize, w: usize) -> Grid {
        Grid::new(h, w).unwrap()
    }

    #[test]
    fn test_rejects_empty_grid() {
        assert_eq!(
            Grid::new(0, 4),
            Err(ConfigError::EmptyGrid { height: 0, width: 4 })
        );
    }

    #[test]
    fn test_rejects_mask_size_mismatch() {
        let err = Grid::from_mask(2, 2, vec![false; 3]).unwrap_err();
        assert_eq!(err, ConfigError::MaskSizeMismatch { expected: 4, actual: 3 });
    }

    #[test]
    fn test_rejects_zero_footprint() {
        assert!(open(3, 3).with_footprint(Footprint::new(0, 2)).is_err());
    }

    #[test]
    fn test_add_obstacle_is_half_open_and_clipped() {
        let mut grid = open(5, 5);
        grid.add_obstacle(Cell::new(1, 1), Cell::new(3, 9));
        assert!(grid.is_obstacle(Cell::new(1, 1)));
        assert!(grid.is_obstacle(Cell::new(2, 4)));
        assert!(!grid.is_obstacle(Cell::new(3, 1)));
        assert!(!grid.is_obstacle(Cell::new(0, 1)));
        assert_eq!(grid.obstacle_count(), 8);
    }

    #[test]
    fn test_passable_checks_bounds_and_obstacles() {
        let mut grid = open(3, 3);
        grid.set_obstacle(Cell::new(1, 1), true);
        assert!(grid.is_passable(Cell::new(0, 0)));
        assert!(!grid.is_passable(Cell::new(1, 1)));
        assert!(!grid.is_passable(Cell::new(3, 0)));
        assert!(!grid.is_passable(Cell::new(0, 3)));
    }

    #[test]
    fn test_footprint_past_bounds_always_collides() {
        let grid = open(6, 6).with_footprint(Footprint::new(2, 2)).unwrap();
        assert!(grid.footprint_collides(Cell::new(5, 5)));
        assert!(grid.footprint_collides(Cell::new(5, 0)));
        assert!(grid.footprint_collides(Cell::new(0, 5)));
        assert!(!grid.footprint_collides(Cell::new(4, 4)));
    }

    #[test]
    fn test_footprint_covering_obstacle_collides() {
        let mut grid = open(6, 6).with_footprint(Footprint::new(2, 3)).unwrap();
        grid.set_obstacle(Cell::new(3, 4), true);
        assert!(grid.footprint_collides(Cell::new(2, 2)));
        assert!(!grid.footprint_collides(Cell::new(0, 0)));
    }

    #[test]
    fn test_neighbors_in_corner() {
        let grid = open(4, 4);
        let n = grid.neighbors(Cell::new(0, 0), false);
        assert_eq!(n, vec![Cell::new(1, 0), Cell::new(0, 1), Cell::new(1, 1)]);
    }

    #[test]
    fn test_neighbors_respect_footprint() {
        let grid = open(4, 4).with_footprint(Footprint::new(2, 2)).unwrap();
        let unconstrained = grid.neighbors(Cell::new(2, 2), false);
        let constrained = grid.neighbors(Cell::new(2, 2), true);
        assert_eq!(unconstrained.len(), 8);
        // only anchors with row <= 2 and col <= 2 fit
        assert_eq!(
            constrained,
            vec![Cell::new(1, 2), Cell::new(2, 1), Cell::new(1, 1)]
        );
    }

    #[test]
    fn test_clearance_counts_free_neighbours() {
        let mut grid = open(5, 5);
        assert_eq!(grid.clearance(Cell::new(2, 2), false), 8);
        assert_eq!(grid.clearance(Cell::new(0, 0), false), 3);
        grid.add_obstacle(Cell::new(1, 0), Cell::new(2, 5));
        assert_eq!(grid.clearance(Cell::new(2, 2), false), 5);
    }

    #[test]
    fn test_index_round_trip() {
        let grid = open(3, 7);
        let cell = Cell::new(2, 5);
        let i = grid.index(cell).unwrap();
        assert_eq!(i, 19);
        assert_eq!(grid.cell_at(i), cell);
        assert_eq!(grid.index(Cell::new(3, 0)), None);
    }
}
