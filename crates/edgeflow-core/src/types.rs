//! Domain types for the EdgeFlow scheduling core.
//!
//! These types cross the boundary between the service application, the
//! orchestration engine, and the device directory. All of them are
//! serializable so the platform's transport layers can carry them as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a candidate device.
pub type CandidateId = String;

/// Reserved score meaning "no meaningful evaluation occurred".
///
/// Owned by the scoring collaborator; checked by equality, never by range.
/// A legitimate score of 0.0 is distinct from this sentinel.
pub const INVALID_SCORE: f64 = -1.0;

// ── Requests ───────────────────────────────────────────────────────

/// How a service is launched on the chosen device.
///
/// `Native` and `Packaged` launch a registered binary and are subject to
/// allow-list validation; `Container` delegates to the container runtime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionType {
    Native,
    Packaged,
    Container,
}

impl ExecutionType {
    /// Whether command lines of this type must match the registered
    /// executable for the service.
    pub fn requires_allowlist(self) -> bool {
        matches!(self, ExecutionType::Native | ExecutionType::Packaged)
    }
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionType::Native => write!(f, "native"),
            ExecutionType::Packaged => write!(f, "packaged"),
            ExecutionType::Container => write!(f, "container"),
        }
    }
}

/// One way the requested service may be launched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionVariant {
    pub execution_type: ExecutionType,
    /// Full command line; the first token is the executable.
    pub command: Vec<String>,
}

/// A request to run a named service somewhere in the cluster.
///
/// Variants are ordered; when the winning device supports a type that
/// appears more than once, the first matching variant is used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceRequest {
    pub service_name: String,
    pub variants: Vec<ExecutionVariant>,
}

// ── Candidates and scores ──────────────────────────────────────────

/// A device the directory considers able to run the requested service.
///
/// A candidate may carry zero endpoints (an unreachable placeholder that
/// still counts toward scoring-round completion).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionCandidate {
    pub id: CandidateId,
    pub endpoints: Vec<String>,
    pub execution_type: ExecutionType,
}

/// Fitness report for one candidate in one scoring round.
///
/// Produced exactly once per candidate per round; a failed or unreachable
/// candidate reports a score of 0.0 rather than being dropped, so it sorts
/// last instead of vanishing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceScore {
    pub candidate_id: CandidateId,
    /// First endpoint of the candidate; `None` when it has no endpoints.
    pub endpoint: Option<String>,
    /// Fitness metric, higher is better.
    pub score: f64,
    pub execution_type: ExecutionType,
}

// ── Responses ──────────────────────────────────────────────────────

/// Outcome code of a service request.
///
/// `Other` carries pass-through messages (resolver errors and command
/// matcher misses surface verbatim). `Display` renders the wire strings
/// the platform's REST layer exposes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ResultCode {
    #[serde(rename = "ERROR_NONE")]
    NoError,
    #[serde(rename = "INVALID_PARAMETER")]
    InvalidParameter,
    #[serde(rename = "SERVICE_NOT_FOUND")]
    ServiceNotFound,
    #[serde(rename = "INTERNAL_SERVER_ERROR")]
    InternalError,
    #[serde(rename = "NOT_ALLOWED_COMMAND")]
    NotAllowedCommand,
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultCode::NoError => write!(f, "ERROR_NONE"),
            ResultCode::InvalidParameter => write!(f, "INVALID_PARAMETER"),
            ResultCode::ServiceNotFound => write!(f, "SERVICE_NOT_FOUND"),
            ResultCode::InternalError => write!(f, "INTERNAL_SERVER_ERROR"),
            ResultCode::NotAllowedCommand => write!(f, "NOT_ALLOWED_COMMAND"),
            ResultCode::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Where the service will run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedTarget {
    pub execution_type: ExecutionType,
    pub endpoint: String,
}

/// Synchronous answer to a [`ServiceRequest`].
///
/// `target` is `None` on every failure path. Later execution-status
/// changes flow through the per-request session channel, not this value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceResponse {
    pub code: ResultCode,
    pub service_name: String,
    pub target: Option<ResolvedTarget>,
}

impl ServiceResponse {
    /// A failure response with no resolved target.
    pub fn failure(code: ResultCode, service_name: impl Into<String>) -> Self {
        Self {
            code,
            service_name: service_name.into(),
            target: None,
        }
    }
}
