//! The colony engine: one optimisation session over a fixed layout.
//!
//! Each iteration every configured agent class sends out a batch of ants.
//! All ants of a batch read the same pheromone snapshot, so they can be
//! built on the rayon pool; each gets its own `StdRng` seeded from the
//! session's master RNG, which keeps results independent of thread
//! scheduling. Once the whole batch is in, the update rule runs serially:
//! evaporate, clamp, deposit, then best-route and traffic bookkeeping.

use crate::components::{AgentClass, BestRoute, Cell, Route, RouteScope};
use crate::config::{ColonyConfig, RoutingMode};
use crate::error::Result;
use crate::grid::Grid;
use crate::path::PathConstructor;
use crate::pheromones::{PheromoneField, PheromoneGrid};
use crate::route::{build_sequential, Waypoints};
use crate::traffic::{
    default_bottleneck_threshold, detect_bottlenecks, detect_conflicts, Bottleneck, Conflict,
    TrafficLog, TrafficSummary,
};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One ant's attempt. `route` is `None` when the ant never arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOutcome {
    pub class: AgentClass,
    pub scope: RouteScope,
    pub route: Option<Route>,
}

/// Every attempt made in one iteration, failures included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// 1-based iteration number.
    pub iteration: usize,
    pub outcomes: Vec<RouteOutcome>,
}

impl BatchResult {
    pub fn successes(&self) -> impl Iterator<Item = &RouteOutcome> {
        self.outcomes.iter().filter(|o| o.route.is_some())
    }

    pub fn failures(&self) -> impl Iterator<Item = &RouteOutcome> {
        self.outcomes.iter().filter(|o| o.route.is_none())
    }

    pub fn for_class(&self, class: AgentClass) -> impl Iterator<Item = &RouteOutcome> {
        self.outcomes.iter().filter(move |o| o.class == class)
    }
}

/// Best route lengths of people against carts on the same layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassComparison {
    pub person: Option<usize>,
    pub cart: Option<usize>,
    /// Extra cells a cart needs over a person.
    pub cart_extra: Option<isize>,
    pub cart_extra_percent: Option<f32>,
}

pub struct Colony<R = StdRng> {
    grid: Grid,
    waypoints: Waypoints,
    config: ColonyConfig,
    pheromones: PheromoneGrid,
    best: BTreeMap<(AgentClass, RouteScope), BestRoute>,
    traffic: BTreeMap<AgentClass, TrafficLog>,
    iteration: usize,
    rng: R,
}

impl Colony<StdRng> {
    /// Session seeded from OS entropy.
    pub fn new(grid: Grid, waypoints: Waypoints, config: ColonyConfig) -> Result<Self> {
        Self::with_rng(grid, waypoints, config, StdRng::from_entropy())
    }

    /// Reproducible session: the same seed, layout and config yield the same
    /// routes and pheromone fields.
    pub fn with_seed(grid: Grid, waypoints: Waypoints, config: ColonyConfig, seed: u64) -> Result<Self> {
        Self::with_rng(grid, waypoints, config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Colony<R> {
    /// Validate the setup and create fresh pheromone fields and traffic logs.
    pub fn with_rng(grid: Grid, waypoints: Waypoints, config: ColonyConfig, rng: R) -> Result<Self> {
        config.validate()?;
        waypoints.validate(&grid, &config.classes)?;

        let pheromones = PheromoneGrid::new(grid.height(), grid.width(), config.initial_pheromone);
        let traffic = config
            .classes
            .iter()
            .map(|&class| {
                let log = TrafficLog::new(grid.height(), grid.width(), config.history_limit);
                (class, log)
            })
            .collect();

        debug!(
            "[Colony] {}x{} grid, {} obstacles, footprint {}x{}, {} targets, classes {:?}",
            grid.height(),
            grid.width(),
            grid.obstacle_count(),
            grid.footprint().height,
            grid.footprint().width,
            waypoints.targets.len(),
            config.classes
        );

        Ok(Self {
            grid,
            waypoints,
            config,
            pheromones,
            best: BTreeMap::new(),
            traffic,
            iteration: 0,
            rng,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn waypoints(&self) -> &Waypoints {
        &self.waypoints
    }

    pub fn config(&self) -> &ColonyConfig {
        &self.config
    }

    /// Iterations completed so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn pheromones(&self) -> &PheromoneGrid {
        &self.pheromones
    }

    pub fn pheromone(&self, class: AgentClass) -> &PheromoneField {
        self.pheromones.field(class)
    }

    pub fn best_route(&self, class: AgentClass, scope: RouteScope) -> Option<&BestRoute> {
        self.best.get(&(class, scope))
    }

    pub fn best_routes(&self) -> impl Iterator<Item = &BestRoute> {
        self.best.values()
    }

    /// Best total length for a class: the sequential record, or the sum of
    /// per-target records once every target has one.
    pub fn best_length(&self, class: AgentClass) -> Option<usize> {
        match self.config.routing {
            RoutingMode::Sequential => self
                .best_route(class, RouteScope::Sequence)
                .map(|b| b.length),
            RoutingMode::Independent => self
                .waypoints
                .targets
                .iter()
                .map(|&t| self.best_route(class, RouteScope::Target(t)).map(|b| b.length))
                .sum(),
        }
    }

    pub fn traffic(&self, class: AgentClass) -> Option<&TrafficLog> {
        self.traffic.get(&class)
    }

    /// Run `iterations` iterations back to back.
    pub fn run(&mut self, iterations: usize) -> Vec<BatchResult> {
        (0..iterations).map(|_| self.run_iteration()).collect()
    }

    /// One batch per class against the current fields, then one update.
    pub fn run_iteration(&mut self) -> BatchResult {
        self.iteration += 1;

        let classes = self.config.classes.clone();
        let mut outcomes = Vec::new();
        for &class in &classes {
            outcomes.extend(self.run_batch(class));
        }
        for &class in &classes {
            self.apply_update(class, &outcomes);
        }

        let arrived = outcomes.iter().filter(|o| o.route.is_some()).count();
        debug!(
            "[Colony] iteration {}: {}/{} ants arrived",
            self.iteration,
            arrived,
            outcomes.len()
        );

        BatchResult {
            iteration: self.iteration,
            outcomes,
        }
    }

    fn scopes(&self) -> Vec<RouteScope> {
        match self.config.routing {
            RoutingMode::Sequential => vec![RouteScope::Sequence],
            RoutingMode::Independent => self
                .waypoints
                .targets
                .iter()
                .map(|&t| RouteScope::Target(t))
                .collect(),
        }
    }

    fn run_batch(&mut self, class: AgentClass) -> Vec<RouteOutcome> {
        // Seeds are drawn serially so the batch result does not depend on
        // how rayon schedules the ants.
        let mut jobs: Vec<(RouteScope, u64)> = Vec::new();
        for scope in self.scopes() {
            for _ in 0..self.config.colony_size {
                jobs.push((scope, self.rng.gen()));
            }
        }

        let constructor = PathConstructor::new(
            &self.grid,
            self.pheromones.field(class),
            class.footprint_aware(),
        )
        .with_exponents(self.config.alpha, self.config.beta);
        let start = self.waypoints.start;
        let sequence = self.waypoints.sequence(self.config.return_to_start);

        let build = |&(scope, seed): &(RouteScope, u64)| {
            let mut rng = StdRng::seed_from_u64(seed);
            let route = match scope {
                RouteScope::Sequence => build_sequential(&constructor, start, &sequence, &mut rng),
                RouteScope::Target(target) => constructor.construct(start, target, &mut rng),
            };
            RouteOutcome { class, scope, route }
        };

        if self.config.parallel {
            jobs.par_iter().map(build).collect()
        } else {
            jobs.iter().map(build).collect()
        }
    }

    fn apply_update(&mut self, class: AgentClass, outcomes: &[RouteOutcome]) {
        let arrived: Vec<(RouteScope, &Route)> = outcomes
            .iter()
            .filter(|o| o.class == class)
            .filter_map(|o| o.route.as_ref().map(|r| (o.scope, r)))
            .collect();

        self.pheromones.field_mut(class).update(
            arrived.iter().map(|(_, r)| r.as_slice()),
            self.config.evaporation_rate,
            self.config.deposit,
        );

        if let Some(log) = self.traffic.get_mut(&class) {
            for (_, route) in &arrived {
                log.record(route);
            }
        }

        for (scope, route) in arrived {
            let improved = self
                .best
                .get(&(class, scope))
                .map_or(true, |best| route.len() < best.length);
            if improved {
                info!(
                    "[Colony] iteration {}: new best {} route for {:?}: {} cells",
                    self.iteration,
                    class.label(),
                    scope,
                    route.len()
                );
                self.best.insert(
                    (class, scope),
                    BestRoute {
                        class,
                        scope,
                        length: route.len(),
                        route: route.clone(),
                        iteration: self.iteration,
                    },
                );
            }
        }
    }

    /// High-traffic, low-clearance cells for a class. Uses the configured
    /// threshold, or 30% of the routes recorded so far.
    pub fn bottlenecks(&self, class: AgentClass) -> Vec<Bottleneck> {
        let Some(log) = self.traffic(class) else {
            return Vec::new();
        };
        let threshold = self
            .config
            .bottleneck_threshold
            .unwrap_or_else(|| default_bottleneck_threshold(log.recorded()));
        detect_bottlenecks(&self.grid, log.heatmap(), class.footprint_aware(), threshold)
    }

    /// Conflicts among the most recent routes over the configured time window.
    pub fn conflicts(&self, class: AgentClass) -> Vec<Conflict> {
        self.conflicts_within(class, self.config.conflict_time_window)
    }

    pub fn conflicts_within(&self, class: AgentClass, time_window: usize) -> Vec<Conflict> {
        let Some(log) = self.traffic(class) else {
            return Vec::new();
        };
        let routes = log.recent(self.config.conflict_route_window);
        detect_conflicts(
            &routes,
            self.grid.footprint_for(class.footprint_aware()),
            time_window,
            self.config.conflict_policy,
        )
    }

    pub fn traffic_summary(&self, class: AgentClass) -> TrafficSummary {
        self.traffic(class)
            .map(|log| log.heatmap().summary())
            .unwrap_or_default()
    }

    pub fn class_comparison(&self) -> ClassComparison {
        let person = self.best_length(AgentClass::Person);
        let cart = self.best_length(AgentClass::Cart);
        let (cart_extra, cart_extra_percent) = match (person, cart) {
            (Some(p), Some(c)) => {
                let extra = c as isize - p as isize;
                (Some(extra), Some(extra as f32 / p as f32 * 100.0))
            }
            _ => (None, None),
        };
        ClassComparison {
            person,
            cart,
            cart_extra,
            cart_extra_percent,
        }
    }

    /// Start cell, handy for reporting collaborators.
    pub fn start(&self) -> Cell {
        self.waypoints.start
    }
}
