//! Traffic accounting over successful routes: pass-count heatmap, rolling
//! route history, bottleneck and conflict detection.

use crate::components::{Cell, Footprint, Route};
use crate::config::ConflictPolicy;
use crate::grid::Grid;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Share of recorded routes a cell must exceed to count as high traffic.
pub const BOTTLENECK_TRAFFIC_SHARE: f32 = 0.3;
/// A high-traffic cell with at most this many clear neighbours is a bottleneck.
pub const BOTTLENECK_MAX_CLEARANCE: usize = 4;
/// Peak above this multiple of the mean pass count flags congestion.
pub const CONGESTION_RATIO: f32 = 3.0;

/// Per-cell count of routes passing through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heatmap {
    pub height: usize,
    pub width: usize,
    counts: Vec<u32>,
}

impl Heatmap {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            counts: vec![0; height * width],
        }
    }

    pub fn get(&self, cell: Cell) -> u32 {
        self.counts[cell.row * self.width + cell.col]
    }

    /// Row-major snapshot of every counter.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Count each distinct cell of `route` once.
    pub fn record_route(&mut self, route: &[Cell]) {
        let mut seen = HashSet::with_capacity(route.len());
        for &cell in route {
            if seen.insert(cell) {
                self.counts[cell.row * self.width + cell.col] += 1;
            }
        }
    }

    pub fn peak(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn summary(&self) -> TrafficSummary {
        let used: Vec<u32> = self.counts.iter().copied().filter(|&c| c > 0).collect();
        if used.is_empty() {
            return TrafficSummary::default();
        }
        let peak = used.iter().copied().max().unwrap_or(0);
        let mean = used.iter().map(|&c| c as f32).sum::<f32>() / used.len() as f32;
        TrafficSummary {
            peak,
            mean,
            used_cells: used.len(),
            congested: peak as f32 > mean * CONGESTION_RATIO,
        }
    }
}

/// Aggregate view of a heatmap over the cells routes actually used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficSummary {
    pub peak: u32,
    /// Mean pass count over cells with at least one pass.
    pub mean: f32,
    pub used_cells: usize,
    pub congested: bool,
}

/// Heatmap plus the rolling history of successful routes for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLog {
    heatmap: Heatmap,
    history: VecDeque<Route>,
    recorded: usize,
    limit: usize,
}

impl TrafficLog {
    /// Log keeping at most `limit` routes of history.
    pub fn new(height: usize, width: usize, limit: usize) -> Self {
        Self {
            heatmap: Heatmap::new(height, width),
            history: VecDeque::new(),
            recorded: 0,
            limit,
        }
    }

    pub fn record(&mut self, route: &[Cell]) {
        self.heatmap.record_route(route);
        self.history.push_back(route.to_vec());
        self.recorded += 1;
        while self.history.len() > self.limit {
            self.history.pop_front();
        }
    }

    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    pub fn history(&self) -> &VecDeque<Route> {
        &self.history
    }

    /// Routes recorded since setup, including ones dropped from the history.
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// The last `n` routes in recording order.
    pub fn recent(&self, n: usize) -> Vec<&[Cell]> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).map(Vec::as_slice).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub position: Cell,
    pub traffic_count: u32,
    pub clearance: usize,
}

/// Two routes occupying the same cell at the same time step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub time: usize,
    pub position: Cell,
    /// Indices into the analysed route window, earlier claimant first.
    pub routes: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictHotspot {
    pub position: Cell,
    pub conflicts: usize,
}

pub fn default_bottleneck_threshold(routes_recorded: usize) -> f32 {
    routes_recorded as f32 * BOTTLENECK_TRAFFIC_SHARE
}

/// Cells with traffic above `threshold` and few clear neighbours, in
/// row-major order.
pub fn detect_bottlenecks(
    grid: &Grid,
    heatmap: &Heatmap,
    footprint_aware: bool,
    threshold: f32,
) -> Vec<Bottleneck> {
    let bottlenecks: Vec<Bottleneck> = heatmap
        .counts()
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count as f32 > threshold)
        .filter_map(|(idx, &count)| {
            let position = grid.cell_at(idx);
            let clearance = grid.clearance(position, footprint_aware);
            (clearance <= BOTTLENECK_MAX_CLEARANCE).then_some(Bottleneck {
                position,
                traffic_count: count,
                clearance,
            })
        })
        .collect();

    debug!(
        "[Traffic] {} bottlenecks above threshold {:.1}",
        bottlenecks.len(),
        threshold
    );
    bottlenecks
}

/// Replay `routes` in lockstep for `time_window` steps and report every cell
/// two of them occupy at the same step. Route `i` stands at `routes[i][t]`
/// at step `t` and covers `footprint` anchored there; a route that has
/// already arrived occupies nothing.
pub fn detect_conflicts(
    routes: &[&[Cell]],
    footprint: Footprint,
    time_window: usize,
    policy: ConflictPolicy,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    let mut occupied: HashMap<Cell, Vec<usize>> = HashMap::new();

    for time in 0..time_window {
        occupied.clear();
        for (idx, route) in routes.iter().enumerate() {
            let Some(&anchor) = route.get(time) else {
                continue;
            };
            for cell in footprint.cells(anchor) {
                match occupied.entry(cell) {
                    Entry::Vacant(slot) => {
                        slot.insert(vec![idx]);
                    }
                    Entry::Occupied(mut slot) => {
                        let earlier: &[usize] = match policy {
                            ConflictPolicy::FirstClaimant => &slot.get()[..1],
                            ConflictPolicy::AllPairs => slot.get(),
                        };
                        conflicts.extend(earlier.iter().map(|&prev| Conflict {
                            time,
                            position: cell,
                            routes: vec![prev, idx],
                        }));
                        slot.get_mut().push(idx);
                    }
                }
            }
        }
    }

    debug!(
        "[Traffic] {} conflicts over {} routes, {} steps",
        conflicts.len(),
        routes.len(),
        time_window
    );
    conflicts
}

/// Conflicts counted per cell, busiest first.
pub fn conflict_hotspots(conflicts: &[Conflict]) -> Vec<ConflictHotspot> {
    let mut counts: BTreeMap<Cell, usize> = BTreeMap::new();
    for conflict in conflicts {
        *counts.entry(conflict.position).or_default() += 1;
    }
    let mut hotspots: Vec<ConflictHotspot> = counts
        .into_iter()
        .map(|(position, conflicts)| ConflictHotspot {
            position,
            conflicts,
        })
        .collect();
    hotspots.sort_by(|a, b| b.conflicts.cmp(&a.conflicts).then(a.position.cmp(&b.position)));
    hotspots
}
