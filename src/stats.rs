use crate::model::{Agent, Health};
use serde::{Deserialize, Serialize};

/// Number of agents in each health state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub susceptible: usize,
    pub infected: usize,
    pub resistant: usize,
}

impl Counts {
    pub fn tally(agt_vec: &[Agent]) -> Self {
        let mut counts = Self::default();
        for agt in agt_vec {
            match agt.health() {
                Health::Susceptible => counts.susceptible += 1,
                Health::Infected => counts.infected += 1,
                Health::Resistant => counts.resistant += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.resistant
    }

    pub fn r_to_s_ratio(&self) -> f64 {
        resistant_to_susceptible_ratio(self.resistant, self.susceptible)
    }
}

/// Ratio of resistant to susceptible agents.
///
/// Returns `f64::INFINITY` when there are no susceptible agents.
pub fn resistant_to_susceptible_ratio(resistant: usize, susceptible: usize) -> f64 {
    if susceptible == 0 {
        return f64::INFINITY;
    }
    resistant as f64 / susceptible as f64
}

/// Aggregate statistics of the simulation at a single step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub step: usize,
    pub infected: usize,
    pub susceptible: usize,
    pub resistant: usize,
    pub r_to_s_ratio: f64,
}

impl Snapshot {
    pub fn new(step: usize, counts: Counts) -> Self {
        Self {
            step,
            infected: counts.infected,
            susceptible: counts.susceptible,
            resistant: counts.resistant,
            r_to_s_ratio: counts.r_to_s_ratio(),
        }
    }

    pub fn counts(&self) -> Counts {
        Counts {
            susceptible: self.susceptible,
            infected: self.infected,
            resistant: self.resistant,
        }
    }

    pub fn total(&self) -> usize {
        self.counts().total()
    }
}

/// Append-only record of one snapshot per step.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tally the agents, append the resulting snapshot and return it.
    pub fn collect(&mut self, step: usize, agt_vec: &[Agent]) -> Snapshot {
        let snapshot = Snapshot::new(step, Counts::tally(agt_vec));
        self.snapshots.push(snapshot);
        snapshot
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Snapshots recorded at `step` and later.
    pub fn since(&self, step: usize) -> &[Snapshot] {
        let i_first = self.snapshots.partition_point(|snapshot| snapshot.step < step);
        &self.snapshots[i_first..]
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Running mean and variance (Welford's algorithm).
pub struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccumulatorReport {
    pub mean: f64,
    pub std_dev: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self {
            n_vals: 0,
            mean: 0.0,
            diff_2_sum: 0.0,
        }
    }

    pub fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }

    pub fn report(&self) -> AccumulatorReport {
        AccumulatorReport {
            mean: if self.n_vals > 0 { self.mean } else { f64::NAN },
            std_dev: if self.n_vals > 1 {
                (self.diff_2_sum / (self.n_vals as f64 - 1.0)).sqrt()
            } else {
                f64::NAN
            },
        }
    }
}
