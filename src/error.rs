//! Setup-time errors for the colony engine.
//!
//! Pathfinding failure is not an error: a leg that runs out of steps or
//! neighbours yields `None` in the batch result. Only configuration problems
//! detected before the first iteration are reported here.

use crate::components::{AgentClass, Cell};
use thiserror::Error;

/// Invalid configuration rejected at setup time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("grid must have at least one row and one column, got {height}x{width}")]
    EmptyGrid { height: usize, width: usize },

    #[error("obstacle mask has {actual} cells, expected {expected}")]
    MaskSizeMismatch { expected: usize, actual: usize },

    #[error("footprint must cover at least one cell, got {height}x{width}")]
    EmptyFootprint { height: usize, width: usize },

    #[error("waypoint list is empty")]
    NoWaypoints,

    #[error("start {0} is outside the grid")]
    StartOutOfBounds(Cell),

    #[error("start {0} lies on an obstacle")]
    StartBlocked(Cell),

    #[error("footprint anchored at start {0} leaves the grid or overlaps an obstacle")]
    StartFootprintCollides(Cell),

    #[error("target #{index} {cell} is outside the grid")]
    TargetOutOfBounds { index: usize, cell: Cell },

    #[error("target #{index} {cell} lies on an obstacle")]
    TargetBlocked { index: usize, cell: Cell },

    #[error("footprint anchored at target #{index} {cell} leaves the grid or overlaps an obstacle")]
    TargetFootprintCollides { index: usize, cell: Cell },

    #[error("at least one agent class must be configured")]
    NoAgentClasses,

    #[error("agent class {0:?} is configured more than once")]
    DuplicateClass(AgentClass),

    #[error("colony size must be positive")]
    EmptyColony,

    #[error("evaporation rate must lie strictly between 0 and 1, got {0}")]
    EvaporationRate(f32),

    #[error("deposit constant must be positive and finite, got {0}")]
    Deposit(f32),

    #[error("{name} must be finite and non-negative, got {value}")]
    Exponent { name: &'static str, value: f32 },

    #[error("initial pheromone {value} is below the floor {floor}")]
    InitialPheromone { value: f32, floor: f32 },

    #[error("bottleneck threshold must be finite and non-negative, got {0}")]
    BottleneckThreshold(f32),

    #[error("conflict {0} window must be positive")]
    ConflictWindow(&'static str),

    #[error("history limit {limit} is shorter than the conflict route window {window}")]
    HistoryLimit { limit: usize, window: usize },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
