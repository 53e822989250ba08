use crate::config::DiseaseConfig;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Epidemiological state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Health {
    Susceptible,
    Infected,
    Resistant,
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Health::Susceptible => "susceptible",
            Health::Infected => "infected",
            Health::Resistant => "resistant",
        };
        f.write_str(name)
    }
}

/// Transition probabilities of an agent.
///
/// Every draw compares a uniform value in `[0, 1)` against one of these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Chances {
    pub virus_spread: f64,
    pub virus_check: f64,
    pub recovery: f64,
    pub gain_resistance: f64,
}

impl From<&DiseaseConfig> for Chances {
    fn from(cfg: &DiseaseConfig) -> Self {
        Self {
            virus_spread: cfg.virus_spread_chance,
            virus_check: cfg.virus_check_frequency,
            recovery: cfg.recovery_chance,
            gain_resistance: cfg.gain_resistance_chance,
        }
    }
}

impl Chances {
    /// New health of a neighbor exposed to an infected agent.
    ///
    /// Only susceptible neighbors consume a draw.
    pub fn spread<R: Rng + ?Sized>(&self, nbr_health: Health, rng: &mut R) -> Health {
        if nbr_health != Health::Susceptible {
            return nbr_health;
        }
        if rng.random::<f64>() < self.virus_spread {
            Health::Infected
        } else {
            Health::Susceptible
        }
    }

    /// New health of an agent after checking its situation.
    ///
    /// The check draw is consumed whatever the health, so every agent advances
    /// the random sequence by at least one value per step. A checked infected
    /// agent may recover, and a recovered agent may then become resistant.
    pub fn check<R: Rng + ?Sized>(&self, health: Health, rng: &mut R) -> Health {
        let checked = rng.random::<f64>() < self.virus_check;
        if !checked || health != Health::Infected {
            return health;
        }
        if rng.random::<f64>() >= self.recovery {
            return Health::Infected;
        }
        if rng.random::<f64>() < self.gain_resistance {
            Health::Resistant
        } else {
            Health::Susceptible
        }
    }
}

/// Agent of the simulation, living on the network node `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    id: usize,
    health: Health,
    chances: Chances,
}

impl Agent {
    pub fn new(id: usize, health: Health, chances: Chances) -> Self {
        Self {
            id,
            health,
            chances,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn health(&self) -> Health {
        self.health
    }

    pub fn chances(&self) -> Chances {
        self.chances
    }

    pub fn set_health(&mut self, health: Health) {
        debug_assert!(
            self.health != Health::Resistant || health == Health::Resistant,
            "resistant agent {} cannot become {health}",
            self.id
        );
        self.health = health;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha12Rng;

    fn chances(
        virus_spread: f64,
        virus_check: f64,
        recovery: f64,
        gain_resistance: f64,
    ) -> Chances {
        Chances {
            virus_spread,
            virus_check,
            recovery,
            gain_resistance,
        }
    }

    #[test]
    fn spread_only_affects_susceptible() {
        let mut rng = ChaCha12Rng::seed_from_u64(0);
        let certain = chances(1.0, 0.0, 0.0, 0.0);
        assert_eq!(certain.spread(Health::Susceptible, &mut rng), Health::Infected);
        assert_eq!(certain.spread(Health::Infected, &mut rng), Health::Infected);
        assert_eq!(certain.spread(Health::Resistant, &mut rng), Health::Resistant);

        let never = chances(0.0, 0.0, 0.0, 0.0);
        assert_eq!(never.spread(Health::Susceptible, &mut rng), Health::Susceptible);
    }

    #[test]
    fn spread_draws_nothing_for_non_susceptible() {
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        let reference = rng.clone();
        let some = chances(0.5, 0.5, 0.5, 0.5);
        some.spread(Health::Infected, &mut rng);
        some.spread(Health::Resistant, &mut rng);
        assert_eq!(rng, reference);
    }

    #[test]
    fn check_draw_consumed_for_every_health() {
        let some = chances(0.5, 0.5, 0.5, 0.5);
        for health in [Health::Susceptible, Health::Resistant] {
            let mut rng = ChaCha12Rng::seed_from_u64(9);
            let mut reference = rng.clone();
            assert_eq!(some.check(health, &mut rng), health);
            reference.random::<f64>();
            assert_eq!(rng, reference);
        }
    }

    #[test]
    fn certain_recovery_and_resistance() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let certain = chances(0.0, 1.0, 1.0, 1.0);
        assert_eq!(certain.check(Health::Infected, &mut rng), Health::Resistant);

        let no_resistance = chances(0.0, 1.0, 1.0, 0.0);
        assert_eq!(no_resistance.check(Health::Infected, &mut rng), Health::Susceptible);
    }

    #[test]
    fn failed_recovery_stays_infected() {
        let mut rng = ChaCha12Rng::seed_from_u64(2);
        let never_recover = chances(0.0, 1.0, 0.0, 1.0);
        for _ in 0..100 {
            assert_eq!(never_recover.check(Health::Infected, &mut rng), Health::Infected);
        }

        let never_check = chances(0.0, 0.0, 1.0, 1.0);
        for _ in 0..100 {
            assert_eq!(never_check.check(Health::Infected, &mut rng), Health::Infected);
        }
    }

    #[test]
    fn resistant_is_terminal() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let certain = chances(1.0, 1.0, 1.0, 0.0);
        for _ in 0..100 {
            assert_eq!(certain.spread(Health::Resistant, &mut rng), Health::Resistant);
            assert_eq!(certain.check(Health::Resistant, &mut rng), Health::Resistant);
        }
    }

    #[test]
    fn chances_from_config() {
        let cfg = DiseaseConfig::default();
        let chances = Chances::from(&cfg);
        assert_eq!(chances.virus_spread, cfg.virus_spread_chance);
        assert_eq!(chances.virus_check, cfg.virus_check_frequency);
        assert_eq!(chances.recovery, cfg.recovery_chance);
        assert_eq!(chances.gain_resistance, cfg.gain_resistance_chance);
    }
}
