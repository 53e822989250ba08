use anyhow::{Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Bernoulli;
use serde::{Deserialize, Serialize};

/// Undirected contact network.
///
/// Stored as adjacency lists sorted by node id.
/// Nodes and edges are fixed once generated.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Network {
    adj_vec: Vec<Vec<usize>>,
}

impl Network {
    /// Generate an Erdős–Rényi network from a seed.
    ///
    /// Identical arguments always produce the identical edge set.
    pub fn generate(n_nodes: usize, avg_degree: f64, seed: u64) -> Result<Self> {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        Self::erdos_renyi(n_nodes, avg_degree, &mut rng)
    }

    /// Generate an Erdős–Rényi network drawing from `rng`.
    ///
    /// Every pair `(i, j)` with `i < j` is visited in lexicographic order and
    /// linked with probability `avg_degree / n_nodes`, clamped to at most one.
    pub fn erdos_renyi<R: Rng + ?Sized>(
        n_nodes: usize,
        avg_degree: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if n_nodes < 1 {
            bail!("number of nodes must be at least 1");
        }
        if !(avg_degree >= 0.0) {
            bail!("average degree must be non-negative, but is {avg_degree}");
        }

        let mut prob = avg_degree / n_nodes as f64;
        if prob > 1.0 {
            log::warn!(
                "average degree {avg_degree} exceeds {n_nodes} nodes, clamping edge probability"
            );
            prob = 1.0;
        }
        let edge_dist = Bernoulli::new(prob)?;

        let mut adj_vec = vec![Vec::new(); n_nodes];
        for i_node in 0..n_nodes {
            for j_node in (i_node + 1)..n_nodes {
                if edge_dist.sample(rng) {
                    adj_vec[i_node].push(j_node);
                    adj_vec[j_node].push(i_node);
                }
            }
        }

        Ok(Self { adj_vec })
    }

    pub fn n_nodes(&self) -> usize {
        self.adj_vec.len()
    }

    pub fn n_edges(&self) -> usize {
        self.adj_vec.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Neighbors of `node` in ascending order.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.adj_vec[node]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.adj_vec[node].len()
    }

    /// Iterate over edges as `(i, j)` pairs with `i < j`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adj_vec.iter().enumerate().flat_map(|(i_node, nbrs)| {
            nbrs.iter()
                .filter(move |&&j_node| j_node > i_node)
                .map(move |&j_node| (i_node, j_node))
        })
    }
}
