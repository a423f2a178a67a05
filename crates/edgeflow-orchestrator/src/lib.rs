//! edgeflow-orchestrator — service request intake and dispatch for the
//! EdgeFlow scheduling core.
//!
//! The [`OrchestrationEngine`] is the single public entry point: it
//! validates a [`ServiceRequest`](edgeflow_core::types::ServiceRequest)
//! against the command allow-list, opens a per-request session, runs the
//! concurrent scoring round over the resolved candidates, ranks the
//! results, matches the winning device's execution type to a command
//! line, and dispatches execution exactly once.
//!
//! # Components
//!
//! - **`engine`** — the request_service façade
//! - **`registry`** — per-request sessions and notification listeners
//! - **`command`** — execution-type to command-line matching
//! - **`error`** — orchestrator errors and their result codes

pub mod command;
pub mod engine;
pub mod error;
pub mod registry;

pub use command::match_command;
pub use engine::OrchestrationEngine;
pub use error::{OrchestratorError, OrchestratorResult};
pub use registry::{Session, SessionId, SessionRegistry};
