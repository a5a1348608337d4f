use crate::components::{AgentClass, Cell};
use rayon::prelude::*;

/// No cell ever drops below this, so every free cell keeps a non-zero
/// chance of being sampled.
pub const PHEROMONE_FLOOR: f32 = 0.1;

/// One H×W pheromone layer, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PheromoneField {
    pub width: usize,
    pub height: usize,
    values: Vec<f32>,
}

impl PheromoneField {
    pub fn new(height: usize, width: usize, initial: f32) -> Self {
        Self {
            width,
            height,
            values: vec![initial.max(PHEROMONE_FLOOR); width * height],
        }
    }

    fn index(&self, cell: Cell) -> usize {
        cell.row * self.width + cell.col
    }

    pub fn get(&self, cell: Cell) -> f32 {
        self.values[self.index(cell)]
    }

    /// Row-major snapshot of every cell.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn min(&self) -> f32 {
        self.values.iter().copied().fold(f32::INFINITY, f32::min)
    }

    pub fn max(&self) -> f32 {
        self.values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Evaporation followed by the floor clamp.
    pub fn evaporate(&mut self, rate: f32) {
        let keep = 1.0 - rate;
        self.values
            .par_iter_mut()
            .for_each(|val| *val = (*val * keep).max(PHEROMONE_FLOOR));
    }

    /// Spread `total` evenly over the cells of a route, so shorter routes lay
    /// a stronger trail per cell.
    pub fn deposit_route(&mut self, route: &[Cell], total: f32) {
        if route.is_empty() {
            return;
        }
        let amount = total / route.len() as f32;
        for &cell in route {
            let idx = self.index(cell);
            self.values[idx] += amount;
        }
    }

    /// One full update: evaporate everything, then reinforce each route.
    pub fn update<'a, I>(&mut self, routes: I, evaporation_rate: f32, deposit: f32)
    where
        I: IntoIterator<Item = &'a [Cell]>,
    {
        self.evaporate(evaporation_rate);
        for route in routes {
            self.deposit_route(route, deposit);
        }
    }
}

/// Pheromone layers, one per agent class.
#[derive(Debug, Clone, PartialEq)]
pub struct PheromoneGrid {
    pub person: PheromoneField,
    pub cart: PheromoneField,
}

impl PheromoneGrid {
    pub fn new(height: usize, width: usize, initial: f32) -> Self {
        Self {
            person: PheromoneField::new(height, width, initial),
            cart: PheromoneField::new(height, width, initial),
        }
    }

    pub fn field(&self, class: AgentClass) -> &PheromoneField {
        match class {
            AgentClass::Person => &self.person,
            AgentClass::Cart => &self.cart,
        }
    }

    pub fn field_mut(&mut self, class: AgentClass) -> &mut PheromoneField {
        match class {
            AgentClass::Person => &mut self.person,
            AgentClass::Cart => &mut self.cart,
        }
    }
}
