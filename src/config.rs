use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub disease: DiseaseConfig,
    pub init: InitConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Contact network parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Number of nodes (one agent per node).
    pub num_nodes: usize,
    /// Expected number of neighbors per node.
    pub avg_node_degree: f64,
}

/// Disease parameters, shared by every agent.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DiseaseConfig {
    /// Probability of infecting a susceptible neighbor.
    pub virus_spread_chance: f64,
    /// Probability of an agent checking its situation.
    pub virus_check_frequency: f64,
    /// Probability of a checked infected agent recovering.
    pub recovery_chance: f64,
    /// Probability of a recovered agent becoming resistant.
    pub gain_resistance_chance: f64,
}

/// Initial condition parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct InitConfig {
    /// Number of agents infected at step 0 (clamped to the number of nodes).
    pub initial_outbreak_size: usize,
    /// Random seed. A fresh one is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Output parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of steps simulated per trajectory file.
    pub steps_per_file: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            num_nodes: 10,
            avg_node_degree: 3.0,
        }
    }
}

impl Default for DiseaseConfig {
    fn default() -> Self {
        Self {
            virus_spread_chance: 0.4,
            virus_check_frequency: 0.4,
            recovery_chance: 0.3,
            gain_resistance_chance: 0.5,
        }
    }
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            initial_outbreak_size: 1,
            seed: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { steps_per_file: 64 }
    }
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    /// Check every parameter against its allowed range.
    ///
    /// An outbreak larger than the population is not an error: the engine
    /// clamps it to the number of nodes.
    pub fn validate(&self) -> Result<()> {
        check_num(self.network.num_nodes, 1..).context("invalid number of nodes")?;
        check_num(self.network.avg_node_degree, 0.0..).context("invalid average node degree")?;

        check_prob(self.disease.virus_spread_chance).context("invalid virus spread chance")?;
        check_prob(self.disease.virus_check_frequency).context("invalid virus check frequency")?;
        check_prob(self.disease.recovery_chance).context("invalid recovery chance")?;
        check_prob(self.disease.gain_resistance_chance)
            .context("invalid gain resistance chance")?;

        check_num(self.init.initial_outbreak_size, 1..)
            .context("invalid initial outbreak size")?;

        check_num(self.output.steps_per_file, 1..).context("invalid number of steps per file")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_prob(prob: f64) -> Result<()> {
    // NaN is rejected since it is not contained in any range.
    check_num(prob, 0.0..=1.0)
}
