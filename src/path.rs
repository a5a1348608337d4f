//! Stochastic single-leg path construction.
//!
//! An ant walks from a start cell to one target over the 8-connected grid.
//! Each step it scores the reachable neighbours by pheromone strength and
//! closeness to the target:
//!
//! ```text
//! score(n) = pheromone(n)^alpha * (1 / (dist(n, target) + 1))^beta
//! ```
//!
//! and samples the next cell proportionally to the scores. Cells already
//! visited on this leg score zero. If every neighbour scores zero the ant
//! picks uniformly among them instead of giving up.
//!
//! The walk fails, returning `None`, when it has no neighbour left or runs
//! out of steps (one step per grid cell by default).

use crate::components::{Cell, Route};
use crate::grid::Grid;
use crate::pheromones::PheromoneField;
use log::trace;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct PathConstructor<'a> {
    grid: &'a Grid,
    field: &'a PheromoneField,
    footprint_aware: bool,
    alpha: f32,
    beta: f32,
    max_steps: usize,
}

impl<'a> PathConstructor<'a> {
    /// Constructor reading a frozen pheromone field. Exponents default to
    /// alpha = 1, beta = 2 and the step budget to the grid area.
    pub fn new(grid: &'a Grid, field: &'a PheromoneField, footprint_aware: bool) -> Self {
        Self {
            grid,
            field,
            footprint_aware,
            alpha: 1.0,
            beta: 2.0,
            max_steps: grid.len(),
        }
    }

    pub fn with_exponents(mut self, alpha: f32, beta: f32) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    pub fn with_step_budget(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Attractiveness of stepping onto `cell` when heading for `target`.
    pub fn score(&self, cell: Cell, target: Cell) -> f32 {
        let pheromone = self.field.get(cell).powf(self.alpha);
        let heuristic = (1.0 / (cell.distance(&target) + 1.0)).powf(self.beta);
        pheromone * heuristic
    }

    /// Walk from `start` to `target`. The returned route starts with `start`
    /// and ends with `target`.
    pub fn construct<R: Rng + ?Sized>(&self, start: Cell, target: Cell, rng: &mut R) -> Option<Route> {
        let start_idx = self.grid.index(start)?;
        if !self.grid.in_bounds(target) {
            return None;
        }
        if start == target {
            return Some(vec![start]);
        }

        let mut path = vec![start];
        let mut visited = vec![false; self.grid.len()];
        visited[start_idx] = true;

        let mut current = start;
        let mut neighbors = Vec::with_capacity(8);
        let mut weights = Vec::with_capacity(8);

        for _ in 0..self.max_steps {
            if current == target {
                return Some(path);
            }

            self.grid
                .neighbors_into(current, self.footprint_aware, &mut neighbors);
            if neighbors.is_empty() {
                trace!("[Path] dead end at {} heading for {}", current, target);
                return None;
            }

            weights.clear();
            weights.extend(neighbors.iter().map(|&n| {
                if visited[n.row * self.grid.width() + n.col] {
                    0.0
                } else {
                    self.score(n, target)
                }
            }));

            let next = neighbors[pick(&weights, rng)];
            visited[next.row * self.grid.width() + next.col] = true;
            path.push(next);
            current = next;
        }

        trace!(
            "[Path] step budget {} exhausted heading for {}",
            self.max_steps,
            target
        );
        None
    }
}

/// Index sampled proportionally to `weights`, uniform when they carry no
/// signal (all zero, or not a valid distribution).
fn pick<R: Rng + ?Sized>(weights: &[f32], rng: &mut R) -> usize {
    let total: f32 = weights.iter().sum();
    if total > 0.0 && total.is_finite() {
        if let Ok(dist) = WeightedIndex::new(weights) {
            return dist.sample(rng);
        }
    }
    rng.gen_range(0..weights.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Footprint;
    use crate::pheromones::PHEROMONE_FLOOR;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn is_adjacent(a: Cell, b: Cell) -> bool {
        let dr = a.row.abs_diff(b.row);
        let dc = a.col.abs_diff(b.col);
        dr <= 1 && dc <= 1 && (dr, dc) != (0, 0)
    }

    #[test]
    fn test_score_prefers_closer_cells() {
        let grid = Grid::new(5, 5).unwrap();
        let field = PheromoneField::new(5, 5, PHEROMONE_FLOOR);
        let ctor = PathConstructor::new(&grid, &field, false);
        let target = Cell::new(4, 4);
        assert!(ctor.score(Cell::new(1, 1), target) > ctor.score(Cell::new(0, 1), target));
        // pheromone 0.1 at distance 0: 0.1 * 1
        assert_relative_eq!(ctor.score(target, target), 0.1);
    }

    #[test]
    fn test_open_grid_route_reaches_target() {
        let grid = Grid::new(5, 5).unwrap();
        let field = PheromoneField::new(5, 5, PHEROMONE_FLOOR);
        let ctor = PathConstructor::new(&grid, &field, false);

        let mut successes = 0;
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let Some(route) = ctor.construct(Cell::new(0, 0), Cell::new(4, 4), &mut rng) else {
                continue;
            };
            successes += 1;
            assert_eq!(route.first(), Some(&Cell::new(0, 0)));
            assert_eq!(route.last(), Some(&Cell::new(4, 4)));
            assert!(route.len() >= 5 && route.len() <= 25);
            for pair in route.windows(2) {
                assert!(is_adjacent(pair[0], pair[1]));
            }
        }
        // a walk can still burn its budget; nearly all should arrive
        assert!(successes >= 30, "only {} of 40 walks arrived", successes);
    }

    #[test]
    fn test_start_equal_to_target() {
        let grid = Grid::new(3, 3).unwrap();
        let field = PheromoneField::new(3, 3, PHEROMONE_FLOOR);
        let ctor = PathConstructor::new(&grid, &field, false);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            ctor.construct(Cell::new(1, 1), Cell::new(1, 1), &mut rng),
            Some(vec![Cell::new(1, 1)])
        );
    }

    #[test]
    fn test_start_on_target_needs_no_steps() {
        let grid = Grid::new(3, 3).unwrap();
        let field = PheromoneField::new(3, 3, PHEROMONE_FLOOR);
        let ctor = PathConstructor::new(&grid, &field, false).with_step_budget(0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            ctor.construct(Cell::new(2, 0), Cell::new(2, 0), &mut rng),
            Some(vec![Cell::new(2, 0)])
        );
        assert_eq!(ctor.construct(Cell::new(2, 0), Cell::new(2, 1), &mut rng), None);
    }

    #[test]
    fn test_walk_backs_out_of_dead_end() {
        // single row: stepping left first strands the ant at (0, 0) where
        // every neighbour is already visited
        let grid = Grid::new(1, 6).unwrap();
        let field = PheromoneField::new(1, 6, PHEROMONE_FLOOR);
        let ctor = PathConstructor::new(&grid, &field, false).with_step_budget(60);

        let mut backtracked = 0;
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let route = ctor
                .construct(Cell::new(0, 2), Cell::new(0, 5), &mut rng)
                .expect("walk gave up in the dead end");
            assert_eq!(route.last(), Some(&Cell::new(0, 5)));
            for pair in route.windows(2) {
                assert!(is_adjacent(pair[0], pair[1]));
            }
            if route.contains(&Cell::new(0, 0)) {
                // reached the far end and came back over visited cells
                assert!(route.len() > 6);
                backtracked += 1;
            }
        }
        assert!(backtracked > 0);
    }

    #[test]
    fn test_walled_off_target_fails() {
        let mut grid = Grid::new(5, 5).unwrap();
        grid.add_obstacle(Cell::new(0, 2), Cell::new(5, 3));
        let field = PheromoneField::new(5, 5, PHEROMONE_FLOOR);
        let ctor = PathConstructor::new(&grid, &field, false);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(ctor.construct(Cell::new(0, 0), Cell::new(4, 4), &mut rng), None);
    }

    #[test]
    fn test_isolated_start_fails() {
        let mut grid = Grid::new(3, 3).unwrap();
        grid.add_obstacle(Cell::new(0, 0), Cell::new(3, 3));
        grid.set_obstacle(Cell::new(1, 1), false);
        let field = PheromoneField::new(3, 3, PHEROMONE_FLOOR);
        let ctor = PathConstructor::new(&grid, &field, false);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(ctor.construct(Cell::new(1, 1), Cell::new(0, 0), &mut rng), None);
    }

    #[test]
    fn test_short_budget_fails() {
        let grid = Grid::new(3, 3).unwrap();
        let field = PheromoneField::new(3, 3, PHEROMONE_FLOOR);
        let ctor = PathConstructor::new(&grid, &field, false).with_step_budget(1);
        let mut rng = StdRng::seed_from_u64(3);
        // two moves are needed at minimum
        assert_eq!(ctor.construct(Cell::new(0, 0), Cell::new(2, 2), &mut rng), None);
    }

    #[test]
    fn test_footprint_aware_route_stays_clear() {
        let mut grid = Grid::new(8, 8)
            .unwrap()
            .with_footprint(Footprint::new(2, 2))
            .unwrap();
        grid.add_obstacle(Cell::new(3, 0), Cell::new(4, 5));
        let field = PheromoneField::new(8, 8, PHEROMONE_FLOOR);
        let ctor = PathConstructor::new(&grid, &field, true);

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            if let Some(route) = ctor.construct(Cell::new(0, 0), Cell::new(6, 0), &mut rng) {
                for cell in &route[1..] {
                    assert!(!grid.footprint_collides(*cell), "{} collides", cell);
                }
            }
        }
    }

    #[test]
    fn test_uniform_fallback_when_all_zero() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[pick(&[0.0, 0.0, 0.0], &mut rng)] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }

    #[test]
    fn test_pick_never_selects_zero_weight() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            assert_ne!(pick(&[0.0, 2.0, 0.0, 1.0], &mut rng) % 2, 0);
        }
    }

    #[test]
    fn test_same_seed_same_route() {
        let grid = Grid::new(12, 12).unwrap();
        let field = PheromoneField::new(12, 12, PHEROMONE_FLOOR);
        let ctor = PathConstructor::new(&grid, &field, false);
        let a = ctor.construct(Cell::new(0, 0), Cell::new(11, 6), &mut StdRng::seed_from_u64(42));
        let b = ctor.construct(Cell::new(0, 0), Cell::new(11, 6), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
