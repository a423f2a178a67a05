//! Collaborator traits consumed by the scheduling core.
//!
//! Discovery, scoring transport, network enumeration, and the execution
//! backend are owned by other parts of the platform. The core talks to
//! them through these seams, which also makes every piece testable with
//! in-process fakes.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::{ExecutionCandidate, ExecutionType};

/// Maps a service name and the requested execution types to the set of
/// devices able to run it.
#[async_trait]
pub trait CandidateDirectory: Send + Sync {
    async fn resolve(
        &self,
        service_name: &str,
        execution_types: &[ExecutionType],
    ) -> anyhow::Result<Vec<ExecutionCandidate>>;
}

/// Obtains a fitness score for running a service on a device.
///
/// `local_score` evaluates this host; `remote_score` asks a peer over the
/// platform's scoring RPC. Both may fail or stall — callers bound the
/// wait.
#[async_trait]
pub trait ScoringClient: Send + Sync {
    async fn local_score(&self, identity: &str) -> anyhow::Result<f64>;

    async fn remote_score(&self, identity: &str, endpoint: &str) -> anyhow::Result<f64>;
}

/// Enumerates this host's network addresses, used to decide whether a
/// candidate is the local device.
pub trait NetworkInfo: Send + Sync {
    fn local_addresses(&self) -> anyhow::Result<Vec<String>>;
}

/// Stable identity of this host, forwarded to the scoring collaborator.
pub trait NodeIdentity: Send + Sync {
    fn local_identity(&self) -> anyhow::Result<String>;
}

/// Allow-list of executables registered per service name.
pub trait CommandRegistry: Send + Sync {
    /// The registered executable path for a service, or `None` when the
    /// service is unknown.
    fn registered_file_name(&self, service_name: &str) -> Option<String>;
}

/// Launches a service on a device and reports status changes through the
/// session's notification channel.
///
/// The core invokes this exactly once per successful request and does not
/// wait for it; completion is only observable through `notifier`.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    async fn start_execution(
        &self,
        endpoint: &str,
        service_name: &str,
        command: &[String],
        notifier: mpsc::Sender<String>,
    );
}
