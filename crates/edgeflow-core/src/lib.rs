//! edgeflow-core — shared types and trait seams for the EdgeFlow
//! scheduling core.
//!
//! # Components
//!
//! - **`types`** — requests, candidates, scores, responses
//! - **`providers`** — traits for the external collaborators (directory,
//!   scoring transport, network, identity, execution backend)
//! - **`commands`** — in-memory executable allow-list
//! - **`config`** — edgeflow.toml parsing

pub mod commands;
pub mod config;
pub mod providers;
pub mod types;

pub use commands::CommandStore;
pub use config::EdgeflowConfig;
pub use providers::{
    CandidateDirectory, CommandRegistry, ExecutionBackend, NetworkInfo, NodeIdentity,
    ScoringClient,
};
pub use types::*;
