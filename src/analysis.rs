use crate::stats::{Accumulator, Snapshot};
use anyhow::{Context, Result};
use rmp_serde::decode;
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

pub trait Obs {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()>;
    fn report(&self) -> serde_json::Value;
}

/// Largest number of infected agents and the first step reaching it.
pub struct PeakInfected {
    peak: usize,
    step: usize,
}

impl PeakInfected {
    pub fn new() -> Self {
        Self { peak: 0, step: 0 }
    }
}

impl Obs for PeakInfected {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.infected > self.peak {
            self.peak = snapshot.infected;
            self.step = snapshot.step;
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "peak_infected": { "count": self.peak, "step": self.step } })
    }
}

/// Counts at the last step and the fraction of agents no longer susceptible.
pub struct FinalSize {
    last: Option<Snapshot>,
}

impl FinalSize {
    pub fn new() -> Self {
        Self { last: None }
    }
}

impl Obs for FinalSize {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.last = Some(*snapshot);
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        let Some(last) = self.last else {
            return serde_json::json!({ "final_size": null });
        };
        let attack_fraction = 1.0 - last.susceptible as f64 / last.total() as f64;
        serde_json::json!({
            "final_size": {
                "step": last.step,
                "infected": last.infected,
                "susceptible": last.susceptible,
                "resistant": last.resistant,
                "attack_fraction": attack_fraction,
            }
        })
    }
}

/// Fraction of infected agents over all recorded steps.
pub struct Prevalence {
    acc: Accumulator,
}

impl Prevalence {
    pub fn new() -> Self {
        Self {
            acc: Accumulator::new(),
        }
    }
}

impl Obs for Prevalence {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.acc.add(snapshot.infected as f64 / snapshot.total() as f64);
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "prevalence": self.acc.report() })
    }
}

/// First step at which no agent is infected.
pub struct Extinction {
    step: Option<usize>,
}

impl Extinction {
    pub fn new() -> Self {
        Self { step: None }
    }
}

impl Obs for Extinction {
    fn update(&mut self, snapshot: &Snapshot) -> Result<()> {
        if self.step.is_none() && snapshot.infected == 0 {
            self.step = Some(snapshot.step);
        }
        Ok(())
    }

    fn report(&self) -> serde_json::Value {
        serde_json::json!({ "extinction_step": self.step })
    }
}

pub struct Analyzer {
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new() -> Self {
        let obs_ptr_vec: Vec<Box<dyn Obs>> = vec![
            Box::new(PeakInfected::new()),
            Box::new(FinalSize::new()),
            Box::new(Prevalence::new()),
            Box::new(Extinction::new()),
        ];
        Self { obs_ptr_vec }
    }

    pub fn add_snapshots(&mut self, snapshots: &[Snapshot]) -> Result<()> {
        for snapshot in snapshots {
            for obs in &mut self.obs_ptr_vec {
                obs.update(snapshot).context("failed to update observable")?;
            }
        }
        Ok(())
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let reader = BufReader::new(file);

        let snapshots: Vec<Snapshot> =
            decode::from_read(reader).context("failed to read snapshots")?;
        self.add_snapshots(&snapshots)
    }

    pub fn reports(&self) -> Vec<serde_json::Value> {
        self.obs_ptr_vec.iter().map(|obs| obs.report()).collect()
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, &self.reports())
            .context("failed to serialize results")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(step: usize, infected: usize, susceptible: usize, resistant: usize) -> Snapshot {
        Snapshot {
            step,
            infected,
            susceptible,
            resistant,
            r_to_s_ratio: resistant as f64 / susceptible as f64,
        }
    }

    #[test]
    fn reports_epidemic_curve() {
        let mut analyzer = Analyzer::new();
        analyzer
            .add_snapshots(&[
                snapshot(0, 1, 9, 0),
                snapshot(1, 4, 6, 0),
                snapshot(2, 4, 4, 2),
                snapshot(3, 0, 4, 6),
                snapshot(4, 0, 4, 6),
            ])
            .unwrap();

        let reports = analyzer.reports();
        assert_eq!(reports[0]["peak_infected"]["count"], 4);
        assert_eq!(reports[0]["peak_infected"]["step"], 1);
        assert_eq!(reports[1]["final_size"]["resistant"], 6);
        let attack_fraction = reports[1]["final_size"]["attack_fraction"].as_f64().unwrap();
        assert!((attack_fraction - 0.6).abs() < 1e-12);
        let mean = reports[2]["prevalence"]["mean"].as_f64().unwrap();
        assert!((mean - 0.18).abs() < 1e-12);
        assert_eq!(reports[3]["extinction_step"], 3);
    }

    #[test]
    fn ongoing_epidemic_has_no_extinction() {
        let mut analyzer = Analyzer::new();
        analyzer.add_snapshots(&[snapshot(0, 2, 8, 0)]).unwrap();
        assert!(analyzer.reports()[3]["extinction_step"].is_null());
    }
}
