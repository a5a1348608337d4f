//! Ant colony route optimisation over 2D occupancy grids.
//!
//! A [`Colony`] owns one optimisation session: the layout, the waypoints, a
//! pheromone field per agent class and the traffic recorded so far. Each
//! call to [`Colony::run_iteration`] sends out a batch of ants, then decays
//! the fields and reinforces every route that arrived.
//!
//! ```no_run
//! use antroute::{AgentClass, Cell, Colony, ColonyConfig, Footprint, Grid, Waypoints};
//!
//! let mut grid = Grid::new(40, 60)?.with_footprint(Footprint::new(2, 3))?;
//! grid.add_obstacle(Cell::new(10, 5), Cell::new(30, 8));
//!
//! let waypoints = Waypoints::new(Cell::new(0, 0), vec![Cell::new(35, 50), Cell::new(5, 55)]);
//! let mut colony = Colony::with_seed(grid, waypoints, ColonyConfig::dual(), 42)?;
//! colony.run(30);
//!
//! println!("{:?}", colony.class_comparison());
//! for b in colony.bottlenecks(AgentClass::Cart) {
//!     println!("bottleneck at {} ({} routes)", b.position, b.traffic_count);
//! }
//! # Ok::<(), antroute::ConfigError>(())
//! ```

pub mod colony;
pub mod components;
pub mod config;
pub mod error;
pub mod grid;
pub mod path;
pub mod pheromones;
pub mod route;
pub mod traffic;

pub use colony::{BatchResult, ClassComparison, Colony, RouteOutcome};
pub use components::{AgentClass, BestRoute, Cell, Footprint, Route, RouteScope};
pub use config::{ColonyConfig, ConflictPolicy, RoutingMode, DEFAULT_HISTORY_LIMIT};
pub use error::{ConfigError, Result};
pub use grid::Grid;
pub use path::PathConstructor;
pub use pheromones::{PheromoneField, PheromoneGrid, PHEROMONE_FLOOR};
pub use route::{build_sequential, split_into_segments, waypoint_indices, Waypoints};
pub use traffic::{
    conflict_hotspots, detect_bottlenecks, detect_conflicts, Bottleneck, Conflict, ConflictHotspot,
    Heatmap, TrafficLog, TrafficSummary,
};
