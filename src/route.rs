//! Waypoint sequences and chained multi-leg routes.

use crate::components::{AgentClass, Cell, Route};
use crate::error::{ConfigError, Result};
use crate::grid::Grid;
use crate::path::PathConstructor;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Route origin and the ordered targets to visit. The order is never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Waypoints {
    pub start: Cell,
    pub targets: Vec<Cell>,
}

impl Waypoints {
    pub fn new(start: Cell, targets: Vec<Cell>) -> Self {
        Self { start, targets }
    }

    /// Targets in visiting order, with the start appended when returning.
    pub fn sequence(&self, return_to_start: bool) -> Vec<Cell> {
        let mut seq = self.targets.clone();
        if return_to_start {
            seq.push(self.start);
        }
        seq
    }

    /// Reject layouts no agent of `classes` could ever route through.
    ///
    /// A target only a cart cannot stand on is accepted while unconstrained
    /// classes are configured: carts simply never arrive there.
    pub fn validate(&self, grid: &Grid, classes: &[AgentClass]) -> Result<()> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoWaypoints);
        }
        let constrained = classes.iter().any(AgentClass::footprint_aware);
        let all_constrained = !classes.is_empty() && classes.iter().all(AgentClass::footprint_aware);

        let start = self.start;
        if !grid.in_bounds(start) {
            return Err(ConfigError::StartOutOfBounds(start));
        }
        if grid.is_obstacle(start) {
            return Err(ConfigError::StartBlocked(start));
        }
        if constrained && grid.footprint_collides(start) {
            return Err(ConfigError::StartFootprintCollides(start));
        }

        for (index, &cell) in self.targets.iter().enumerate() {
            if !grid.in_bounds(cell) {
                return Err(ConfigError::TargetOutOfBounds { index, cell });
            }
            if grid.is_obstacle(cell) {
                return Err(ConfigError::TargetBlocked { index, cell });
            }
            if all_constrained && grid.footprint_collides(cell) {
                return Err(ConfigError::TargetFootprintCollides { index, cell });
            }
        }
        Ok(())
    }
}

/// Chain one leg per consecutive waypoint pair, starting at `start`.
///
/// The shared endpoint between two legs appears once. Any failed leg fails
/// the whole route.
pub fn build_sequential<R: Rng + ?Sized>(
    constructor: &PathConstructor<'_>,
    start: Cell,
    waypoints: &[Cell],
    rng: &mut R,
) -> Option<Route> {
    let mut route: Route = Vec::new();
    let mut leg_start = start;

    for &target in waypoints {
        let leg = constructor.construct(leg_start, target, rng)?;
        let skip = usize::from(!route.is_empty());
        route.extend(leg.into_iter().skip(skip));
        leg_start = target;
    }

    if route.is_empty() {
        None
    } else {
        Some(route)
    }
}

/// Positions in `route` where each waypoint is hit, in order. `None` when
/// the route does not visit them all in sequence.
pub fn waypoint_indices(route: &[Cell], waypoints: &[Cell]) -> Option<Vec<usize>> {
    let mut hits = Vec::with_capacity(waypoints.len());
    let mut from = 0;
    for wp in waypoints {
        let offset = route.get(from..)?.iter().position(|c| c == wp)?;
        hits.push(from + offset);
        from += offset + 1;
    }
    Some(hits)
}

/// Split a chained route into its legs. Each segment ends on a waypoint and
/// the next one starts there; a trailing piece past the last waypoint is
/// kept as its own segment.
pub fn split_into_segments(route: &[Cell], waypoints: &[Cell]) -> Vec<Route> {
    let Some((&first, rest)) = route.split_first() else {
        return Vec::new();
    };
    if waypoints.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = vec![first];
    let mut next_wp = 0;

    for &cell in rest {
        current.push(cell);
        if next_wp < waypoints.len() && cell == waypoints[next_wp] {
            segments.push(std::mem::replace(&mut current, vec![cell]));
            next_wp += 1;
        }
    }
    if current.len() > 1 {
        segments.push(current);
    }
    segments
}
