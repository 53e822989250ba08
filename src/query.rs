//! Read-only status of a simulation.
//!
//! Collaborators such as a chat assistant snapshot the engine through
//! [`Status`] and receive either a short prose report or JSON.

use crate::engine::Engine;
use anyhow::{Context, Result};
use serde::{Serialize, Serializer};

/// Parameters and aggregate counts of a simulation at its current step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub num_nodes: usize,
    pub avg_node_degree: f64,
    pub virus_spread_chance: f64,
    pub virus_check_frequency: f64,
    pub recovery_chance: f64,
    pub gain_resistance_chance: f64,
    pub initial_outbreak_size: usize,
    pub seed: u64,

    pub step: usize,
    pub infected: usize,
    pub susceptible: usize,
    pub resistant: usize,
    #[serde(serialize_with = "serialize_ratio")]
    pub r_to_s_ratio: f64,
}

impl Status {
    pub fn from_engine(engine: &Engine) -> Self {
        let cfg = engine.cfg();
        let snapshot = engine.snapshot();
        Self {
            num_nodes: cfg.network.num_nodes,
            avg_node_degree: cfg.network.avg_node_degree,
            virus_spread_chance: cfg.disease.virus_spread_chance,
            virus_check_frequency: cfg.disease.virus_check_frequency,
            recovery_chance: cfg.disease.recovery_chance,
            gain_resistance_chance: cfg.disease.gain_resistance_chance,
            initial_outbreak_size: cfg.init.initial_outbreak_size.min(cfg.network.num_nodes),
            seed: engine.seed(),
            step: snapshot.step,
            infected: snapshot.infected,
            susceptible: snapshot.susceptible,
            resistant: snapshot.resistant,
            r_to_s_ratio: snapshot.r_to_s_ratio,
        }
    }

    /// Short prose report of the simulation state.
    pub fn summary(&self) -> String {
        format!(
            "Step {} of an SIR simulation on a network of {} agents (average degree {}, seed {}).\n\
             Infected: {}, susceptible: {}, resistant: {}.\n\
             Resistant/susceptible ratio: {}.\n\
             Parameters: initial outbreak {}, spread chance {}, check frequency {}, \
             recovery chance {}, gain resistance chance {}.",
            self.step,
            self.num_nodes,
            self.avg_node_degree,
            self.seed,
            self.infected,
            self.susceptible,
            self.resistant,
            format_ratio(self.r_to_s_ratio),
            self.initial_outbreak_size,
            self.virus_spread_chance,
            self.virus_check_frequency,
            self.recovery_chance,
            self.gain_resistance_chance
        )
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize status")
    }
}

fn format_ratio(ratio: f64) -> String {
    if ratio.is_infinite() {
        "inf".to_string()
    } else {
        format!("{ratio:.2}")
    }
}

// JSON has no infinity, so an infinite ratio is written as a string.
fn serialize_ratio<S: Serializer>(ratio: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if ratio.is_infinite() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_f64(*ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn engine(num_nodes: usize, initial_outbreak_size: usize) -> Engine {
        let mut cfg = Config::default();
        cfg.network.num_nodes = num_nodes;
        cfg.init.initial_outbreak_size = initial_outbreak_size;
        cfg.init.seed = Some(42);
        Engine::new(cfg).unwrap()
    }

    #[test]
    fn reflects_engine_state() {
        let mut engine = engine(30, 2);
        engine.step();
        let status = engine.status();
        let counts = engine.counts();
        assert_eq!(status.num_nodes, 30);
        assert_eq!(status.seed, 42);
        assert_eq!(status.step, 1);
        assert_eq!(status.infected, counts.infected);
        assert_eq!(status.susceptible, counts.susceptible);
        assert_eq!(status.resistant, counts.resistant);
        assert_eq!(status.r_to_s_ratio, engine.resistant_to_susceptible_ratio());
    }

    #[test]
    fn reading_does_not_mutate() {
        let engine = engine(30, 2);
        let before = engine.history().snapshots().to_vec();
        let status_a = engine.status();
        let status_b = Status::from_engine(&engine);
        assert_eq!(status_a, status_b);
        assert_eq!(engine.history().snapshots(), before.as_slice());
    }

    #[test]
    fn summary_mentions_counts() {
        let status = engine(30, 2).status();
        let summary = status.summary();
        assert!(summary.contains("Step 0"));
        assert!(summary.contains("Infected: 2, susceptible: 28, resistant: 0."));
        assert!(summary.contains("ratio: 0.00"));
        assert_eq!(summary.lines().count(), 4);
        assert!(summary.lines().nth(3).unwrap().starts_with("Parameters: initial outbreak 2,"));
    }

    #[test]
    fn infinite_ratio_is_reported_as_inf() {
        let status = engine(5, 10).status();
        assert_eq!(status.initial_outbreak_size, 5);
        assert!(status.summary().contains("ratio: inf"));

        let json: serde_json::Value = serde_json::from_str(&status.to_json().unwrap()).unwrap();
        assert_eq!(json["r_to_s_ratio"], "inf");
        assert_eq!(json["infected"], 5);
    }

    #[test]
    fn finite_ratio_is_a_json_number() {
        let json: serde_json::Value =
            serde_json::from_str(&engine(30, 2).status().to_json().unwrap()).unwrap();
        assert_eq!(json["r_to_s_ratio"], 0.0);
        assert_eq!(json["num_nodes"], 30);
    }
}
