//! Orchestrator error types.

use thiserror::Error;

use edgeflow_core::types::{ExecutionType, ResultCode};

/// Errors that can occur while serving a request.
///
/// Nothing here is fatal to the process; every variant maps to a
/// structured [`ResultCode`] in the synchronous response.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("orchestration engine is not ready")]
    NotReady,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("command not allowed for service: {0}")]
    CommandNotAllowed(String),

    #[error("no viable candidate for service: {0}")]
    ServiceNotFound(String),

    #[error("candidate resolution failed: {0}")]
    Resolver(#[source] anyhow::Error),

    #[error("Not Found: no command variant for execution type {0}")]
    CommandMismatch(ExecutionType),
}

impl OrchestratorError {
    /// The result code this error surfaces as.
    ///
    /// Resolver failures and command-matcher misses pass their message
    /// through verbatim; everything else maps to a fixed code.
    pub fn result_code(&self) -> ResultCode {
        match self {
            OrchestratorError::NotReady => ResultCode::InternalError,
            OrchestratorError::InvalidParameter(_) => ResultCode::InvalidParameter,
            OrchestratorError::CommandNotAllowed(_) => ResultCode::NotAllowedCommand,
            OrchestratorError::ServiceNotFound(_) => ResultCode::ServiceNotFound,
            OrchestratorError::Resolver(source) => ResultCode::Other(source.to_string()),
            OrchestratorError::CommandMismatch(_) => ResultCode::Other(self.to_string()),
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
