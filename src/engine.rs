use crate::config::Config;
use crate::model::{Agent, Chances, Health};
use crate::network::Network;
use crate::query::Status;
use crate::stats::{Counts, History, Snapshot};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Simulation engine.
///
/// Holds the configuration, contact network, agents, random number generator
/// and statistics history, and provides methods to initialize, step, save,
/// and load simulations.
///
/// Every random draw comes from the single engine generator, in this order:
/// network edges, initial outbreak, then for each step the visit order
/// shuffle followed by the draws of each visited agent.
#[derive(Serialize, Deserialize)]
pub struct Engine {
    cfg: Config,
    seed: u64,
    network: Network,
    agt_vec: Vec<Agent>,
    rng: ChaCha12Rng,
    step: usize,
    running: bool,
    history: History,
    order: Vec<usize>,
}

impl Engine {
    /// Create a new `Engine` using the configured seed, or a fresh one if none is set.
    pub fn new(cfg: Config) -> Result<Self> {
        let seed = match cfg.init.seed {
            Some(seed) => seed,
            None => rand::random(),
        };
        Self::with_seed(cfg, seed)
    }

    /// Create a new `Engine` with an explicit seed, ignoring the configured one.
    ///
    /// The network is generated, every agent starts susceptible, and a random
    /// set of distinct agents is infected. The initial snapshot is recorded
    /// as step 0.
    pub fn with_seed(cfg: Config, seed: u64) -> Result<Self> {
        cfg.validate().context("failed to validate config")?;

        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        log::info!("using seed {seed}");

        let n_nodes = cfg.network.num_nodes;
        let network = Network::erdos_renyi(n_nodes, cfg.network.avg_node_degree, &mut rng)
            .context("failed to generate network")?;

        let chances = Chances::from(&cfg.disease);
        let mut agt_vec: Vec<_> = (0..n_nodes)
            .map(|id| Agent::new(id, Health::Susceptible, chances))
            .collect();

        let mut n_outbreak = cfg.init.initial_outbreak_size;
        if n_outbreak > n_nodes {
            log::warn!("initial outbreak size {n_outbreak} > {n_nodes} nodes, clamping");
            n_outbreak = n_nodes;
        }

        // Pick distinct agents to infect.
        let i_agt_all: Vec<usize> = (0..n_nodes).collect();
        for &i_agt in i_agt_all.choose_multiple(&mut rng, n_outbreak) {
            agt_vec[i_agt].set_health(Health::Infected);
        }

        let mut history = History::new();
        history.collect(0, &agt_vec);

        Ok(Self {
            cfg,
            seed,
            network,
            agt_vec,
            rng,
            step: 0,
            running: true,
            history,
            order: i_agt_all,
        })
    }

    /// Rebuild the engine from its configuration and seed.
    pub fn reset(&mut self) -> Result<()> {
        *self = Self::with_seed(self.cfg.clone(), self.seed)?;
        Ok(())
    }

    /// Advance the simulation by one step.
    ///
    /// Every agent is updated exactly once, in an order reshuffled at each
    /// step. Updates apply in place: an agent infected earlier in the step
    /// spreads the virus when its own turn comes.
    pub fn step(&mut self) {
        self.order.clear();
        self.order.extend(0..self.agt_vec.len());
        self.order.shuffle(&mut self.rng);

        for i_order in 0..self.order.len() {
            let i_agt = self.order[i_order];
            self.update_agent(i_agt);
        }

        self.step += 1;
        let snapshot = self.history.collect(self.step, &self.agt_vec);
        log::debug!("{snapshot:?}");
    }

    fn update_agent(&mut self, i_agt: usize) {
        let chances = self.agt_vec[i_agt].chances();

        // Infected agents try to infect their susceptible neighbors.
        if self.agt_vec[i_agt].health() == Health::Infected {
            for &i_nbr in self.network.neighbors(i_agt) {
                let nbr = &mut self.agt_vec[i_nbr];
                nbr.set_health(chances.spread(nbr.health(), &mut self.rng));
            }
        }

        // Every agent checks its situation.
        let agt = &mut self.agt_vec[i_agt];
        agt.set_health(chances.check(agt.health(), &mut self.rng));
    }

    /// Run `steps_per_file` steps and save the new snapshots to a binary file.
    ///
    /// The step 0 snapshot is included when the simulation has not started yet.
    pub fn perform_simulation<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        let first_step = if self.step == 0 { 0 } else { self.step + 1 };

        let n_steps = self.cfg.output.steps_per_file;
        let steps_per_log = (n_steps / 10).max(1);
        for i_step in 0..n_steps {
            self.step();

            if (i_step + 1) % steps_per_log == 0 || i_step + 1 == n_steps {
                let progress = 100.0 * (i_step + 1) as f64 / n_steps as f64;
                log::info!("completed {progress:06.2}%");
            }
        }

        encode::write(&mut writer, self.history.since(first_step))
            .context("failed to serialize snapshots")?;

        writer.flush().context("failed to flush writer stream")?;

        Ok(())
    }

    /// Save a checkpoint of the entire engine state.
    ///
    /// Can be used to resume the simulation later.
    pub fn save_checkpoint<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize engine")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved engine checkpoint.
    pub fn load_checkpoint<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let engine = decode::from_read(&mut reader).context("failed to deserialize engine")?;
        Ok(engine)
    }

    pub fn cfg(&self) -> &Config {
        &self.cfg
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agt_vec
    }

    /// Iterate over `(id, health)` pairs.
    pub fn agent_states(&self) -> impl Iterator<Item = (usize, Health)> + '_ {
        self.agt_vec.iter().map(|agt| (agt.id(), agt.health()))
    }

    pub fn counts(&self) -> Counts {
        Counts::tally(&self.agt_vec)
    }

    /// Ratio of resistant to susceptible agents, infinite without susceptible agents.
    pub fn resistant_to_susceptible_ratio(&self) -> f64 {
        self.counts().r_to_s_ratio()
    }

    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Latest recorded snapshot.
    pub fn snapshot(&self) -> Snapshot {
        match self.history.last() {
            Some(&snapshot) => snapshot,
            None => Snapshot::new(self.step, self.counts()),
        }
    }

    /// Order in which agents were visited during the last step.
    pub fn visit_order(&self) -> &[usize] {
        &self.order
    }

    /// Whether the caller should keep stepping. The engine never clears it itself.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn status(&self) -> Status {
        Status::from_engine(self)
    }
}
