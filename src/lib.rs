//! Agent-based SIR epidemic on a random contact network.
//!
//! An [`engine::Engine`] owns an Erdős–Rényi [`network::Network`], one
//! [`model::Agent`] per node and a seeded random generator. Each call to
//! [`engine::Engine::step`] updates every agent once in a shuffled order and
//! appends a [`stats::Snapshot`] to the history. Outer layers read the state
//! through [`query::Status`].

pub mod analysis;
pub mod config;
pub mod engine;
pub mod manager;
pub mod model;
pub mod network;
pub mod query;
pub mod stats;
