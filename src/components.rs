use serde::{Deserialize, Serialize};
use std::fmt;

/// A grid coordinate, `row` first like the obstacle mask layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Euclidean distance, used by the path heuristic.
    pub fn distance(&self, other: &Cell) -> f32 {
        let dr = self.row as f32 - other.row as f32;
        let dc = self.col as f32 - other.col as f32;
        (dr * dr + dc * dc).sqrt()
    }

    /// Offset by a signed step, `None` when it would go below zero.
    pub fn offset(&self, dr: isize, dc: isize) -> Option<Cell> {
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        Some(Cell { row, col })
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Rectangular area an agent occupies, anchored at its top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub height: usize,
    pub width: usize,
}

impl Default for Footprint {
    fn default() -> Self {
        Self::UNIT
    }
}

impl Footprint {
    pub const UNIT: Footprint = Footprint { height: 1, width: 1 };

    pub const fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    /// Every cell covered when anchored at `origin`. Cells past the grid edge
    /// are still yielded; bounds are the caller's concern.
    pub fn cells(&self, origin: Cell) -> impl Iterator<Item = Cell> {
        let Footprint { height, width } = *self;
        (0..height).flat_map(move |dr| {
            (0..width).map(move |dc| Cell::new(origin.row + dr, origin.col + dc))
        })
    }
}

/// Kind of agent routed through the grid. Each class keeps its own pheromone
/// field, best-route records and traffic history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentClass {
    /// Unit-size walker, ignores the grid footprint.
    Person,
    /// Rectangular cart, every position must fit the grid footprint.
    Cart,
}

impl AgentClass {
    pub fn footprint_aware(&self) -> bool {
        matches!(self, AgentClass::Cart)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgentClass::Person => "person",
            AgentClass::Cart => "cart",
        }
    }
}

/// Ordered cells from start to the final waypoint, both inclusive.
pub type Route = Vec<Cell>;

/// What a best-route record is kept for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RouteScope {
    /// Single-leg route from start to one target (independent routing).
    Target(Cell),
    /// Whole chained route over the waypoint list (sequential routing).
    Sequence,
}

/// Shortest successful route seen so far for one (class, scope).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestRoute {
    pub class: AgentClass,
    pub scope: RouteScope,
    /// Number of cells in `route`.
    pub length: usize,
    pub route: Route,
    /// Iteration (1-based) the record was set in.
    pub iteration: usize,
}
