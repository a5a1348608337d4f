use crate::components::AgentClass;
use crate::error::{ConfigError, Result};
use crate::pheromones::PHEROMONE_FLOOR;
use serde::{Deserialize, Serialize};

/// Routes kept per class for conflict replay unless configured otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// How targets are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingMode {
    /// One single-leg route from start to each target, optimised separately.
    Independent,
    /// One chained route visiting targets in the given order.
    Sequential,
}

/// How the conflict detector reports three or more routes sharing a cell at
/// the same time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Every later occupant is paired with the first claimant only.
    #[default]
    FirstClaimant,
    /// Every later occupant is paired with each earlier occupant.
    AllPairs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyConfig {
    pub routing: RoutingMode,
    pub return_to_start: bool,
    /// Classes routed each iteration, in this order.
    pub classes: Vec<AgentClass>,

    // Colony parameters
    pub colony_size: usize,
    pub evaporation_rate: f32,
    pub deposit: f32,
    pub alpha: f32,
    pub beta: f32,
    pub initial_pheromone: f32,
    /// Build a batch on the rayon pool.
    pub parallel: bool,

    // Traffic analysis
    pub bottleneck_threshold: Option<f32>,
    pub conflict_time_window: usize,
    pub conflict_route_window: usize,
    pub conflict_policy: ConflictPolicy,
    /// Oldest routes are dropped from the history past this many. Must cover
    /// `conflict_route_window`.
    pub history_limit: usize,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            routing: RoutingMode::Sequential,
            return_to_start: false,
            classes: vec![AgentClass::Cart],

            colony_size: 50, // more ants per iteration = better coverage, slower
            evaporation_rate: 0.1,
            deposit: 100.0,
            alpha: 1.0,
            beta: 2.0,
            initial_pheromone: PHEROMONE_FLOOR,
            parallel: true,

            bottleneck_threshold: None, // 0.3 x routes recorded
            conflict_time_window: 10,
            conflict_route_window: 20,
            conflict_policy: ConflictPolicy::FirstClaimant,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl ColonyConfig {
    /// Dual people/cart routing over the same layout.
    pub fn dual() -> Self {
        Self {
            classes: vec![AgentClass::Person, AgentClass::Cart],
            ..Default::default()
        }
    }

    pub fn with_routing(mut self, routing: RoutingMode) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_colony_size(mut self, colony_size: usize) -> Self {
        self.colony_size = colony_size;
        self
    }

    pub fn with_return_to_start(mut self, return_to_start: bool) -> Self {
        self.return_to_start = return_to_start;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(ConfigError::NoAgentClasses);
        }
        for (i, class) in self.classes.iter().enumerate() {
            if self.classes[..i].contains(class) {
                return Err(ConfigError::DuplicateClass(*class));
            }
        }
        if self.colony_size == 0 {
            return Err(ConfigError::EmptyColony);
        }
        if !(self.evaporation_rate > 0.0 && self.evaporation_rate < 1.0) {
            return Err(ConfigError::EvaporationRate(self.evaporation_rate));
        }
        if !(self.deposit.is_finite() && self.deposit > 0.0) {
            return Err(ConfigError::Deposit(self.deposit));
        }
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Exponent { name, value });
            }
        }
        if !(self.initial_pheromone.is_finite() && self.initial_pheromone >= PHEROMONE_FLOOR) {
            return Err(ConfigError::InitialPheromone {
                value: self.initial_pheromone,
                floor: PHEROMONE_FLOOR,
            });
        }
        if let Some(t) = self.bottleneck_threshold {
            if !(t.is_finite() && t >= 0.0) {
                return Err(ConfigError::BottleneckThreshold(t));
            }
        }
        if self.conflict_time_window == 0 {
            return Err(ConfigError::ConflictWindow("time"));
        }
        if self.conflict_route_window == 0 {
            return Err(ConfigError::ConflictWindow("route"));
        }
        if self.history_limit < self.conflict_route_window {
            return Err(ConfigError::HistoryLimit {
                limit: self.history_limit,
                window: self.conflict_route_window,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_is_valid() {
        assert!(ColonyConfig::default().validate().is_ok());
        assert!(ColonyConfig::dual().validate().is_ok());
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    #[case(-0.2)]
    #[case(f32::NAN)]
    fn test_rejects_evaporation_rate(#[case] rate: f32) {
        let config = ColonyConfig {
            evaporation_rate: rate,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EvaporationRate(_))
        ));
    }

    #[test]
    fn test_rejects_repeated_class() {
        let config = ColonyConfig {
            classes: vec![AgentClass::Cart, AgentClass::Person, AgentClass::Cart],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateClass(AgentClass::Cart))
        );
    }

    #[test]
    fn test_history_must_cover_route_window() {
        let config = ColonyConfig {
            history_limit: 10,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::HistoryLimit { limit: 10, window: 20 })
        );
        let config = ColonyConfig {
            history_limit: 20,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_colony() {
        let config = ColonyConfig::default().with_colony_size(0);
        assert_eq!(config.validate(), Err(ConfigError::EmptyColony));
    }

    #[test]
    fn test_rejects_pheromone_below_floor() {
        let config = ColonyConfig {
            initial_pheromone: 0.05,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InitialPheromone { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_beta() {
        let config = ColonyConfig {
            beta: -1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Exponent {
                name: "beta",
                value: -1.0
            })
        );
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let json = r#"{ "colony_size": 8, "routing": "Independent", "classes": ["Person", "Cart"] }"#;
        let config: ColonyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.colony_size, 8);
        assert_eq!(config.routing, RoutingMode::Independent);
        assert_eq!(config.classes, vec![AgentClass::Person, AgentClass::Cart]);
        assert_eq!(config.conflict_route_window, 20);
        assert_eq!(config.bottleneck_threshold, None);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }
}
