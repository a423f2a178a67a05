//! Orchestration engine — the request_service façade.
//!
//! Coordinates one request end-to-end: validate against the command
//! allow-list, open a session, resolve candidates, run the scoring round,
//! rank, match the winning execution type to a command line, and dispatch
//! to the execution backend. Every failure is returned as a structured
//! response; nothing here aborts the process and nothing is retried.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use edgeflow_core::config::EdgeflowConfig;
use edgeflow_core::providers::{CandidateDirectory, CommandRegistry, ExecutionBackend};
use edgeflow_core::types::{
    ExecutionType, INVALID_SCORE, ResolvedTarget, ResultCode, ServiceRequest, ServiceResponse,
};
use edgeflow_scoring::{ScoreAggregator, rank};

use crate::command::match_command;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::registry::SessionRegistry;

/// The scheduling core's public entry point.
///
/// Owns its collaborators and all mutable state, so multiple isolated
/// engines can coexist in one process.
pub struct OrchestrationEngine {
    directory: Arc<dyn CandidateDirectory>,
    commands: Arc<dyn CommandRegistry>,
    backend: Arc<dyn ExecutionBackend>,
    aggregator: ScoreAggregator,
    sessions: SessionRegistry,
    ready: AtomicBool,
}

impl OrchestrationEngine {
    /// Assemble an engine from its collaborators.
    ///
    /// The engine is ready as soon as it is constructed; the embedding
    /// platform can gate requests during startup or shutdown with
    /// [`set_ready`](Self::set_ready).
    pub fn new(
        directory: Arc<dyn CandidateDirectory>,
        commands: Arc<dyn CommandRegistry>,
        backend: Arc<dyn ExecutionBackend>,
        aggregator: ScoreAggregator,
        config: &EdgeflowConfig,
    ) -> Self {
        Self {
            directory,
            commands,
            backend,
            aggregator,
            sessions: SessionRegistry::new(config.notify_timeout()),
            ready: AtomicBool::new(true),
        }
    }

    /// Gate or ungate request intake.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    /// The per-request session registry (status notification delivery).
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Handle a service request (e.g. offloading) from a service
    /// application.
    ///
    /// Synchronously selects and dispatches the best device for the
    /// service; later execution-status changes arrive through the
    /// request's session channel, not through this response.
    pub async fn request_service(&self, request: ServiceRequest) -> ServiceResponse {
        info!(
            service_name = %request.service_name,
            variants = request.variants.len(),
            "service request received"
        );

        let outcome = self.select_and_dispatch(&request).await;
        match outcome {
            Ok(target) => {
                info!(
                    service_name = %request.service_name,
                    endpoint = %target.endpoint,
                    execution_type = %target.execution_type,
                    "service dispatched"
                );
                ServiceResponse {
                    code: ResultCode::NoError,
                    service_name: request.service_name,
                    target: Some(target),
                }
            }
            Err(e) => {
                warn!(service_name = %request.service_name, error = %e, "service request failed");
                ServiceResponse::failure(e.result_code(), request.service_name)
            }
        }
    }

    /// The fallible pipeline behind [`request_service`](Self::request_service).
    async fn select_and_dispatch(
        &self,
        request: &ServiceRequest,
    ) -> OrchestratorResult<ResolvedTarget> {
        if !self.is_ready() {
            return Err(OrchestratorError::NotReady);
        }

        self.validate(request)?;

        let session = self.sessions.open(&request.service_name).await;

        let execution_types: Vec<ExecutionType> = request
            .variants
            .iter()
            .map(|variant| variant.execution_type)
            .collect();

        let candidates = self
            .directory
            .resolve(&request.service_name, &execution_types)
            .await
            .map_err(OrchestratorError::Resolver)?;
        debug!(
            service_name = %request.service_name,
            candidates = candidates.len(),
            "candidates resolved"
        );

        let ranked = rank(self.aggregator.gather(&candidates).await);
        debug!(service_name = %request.service_name, scores = ?ranked, "scoring round ranked");

        let winner = ranked
            .first()
            .ok_or_else(|| OrchestratorError::ServiceNotFound(request.service_name.clone()))?;
        if winner.score == INVALID_SCORE {
            return Err(OrchestratorError::ServiceNotFound(
                request.service_name.clone(),
            ));
        }
        let endpoint = winner
            .endpoint
            .clone()
            .ok_or_else(|| OrchestratorError::ServiceNotFound(request.service_name.clone()))?;

        let command = match_command(winner.execution_type, &request.variants)?.to_vec();

        self.dispatch(&endpoint, &request.service_name, command, session.notifier);

        Ok(ResolvedTarget {
            execution_type: winner.execution_type,
            endpoint,
        })
    }

    /// Reject malformed requests and command lines that do not match the
    /// allow-list, before any resource is committed.
    fn validate(&self, request: &ServiceRequest) -> OrchestratorResult<()> {
        if request.service_name.is_empty() {
            return Err(OrchestratorError::InvalidParameter(
                "empty service name".to_string(),
            ));
        }
        if request.variants.is_empty() {
            return Err(OrchestratorError::InvalidParameter(
                "no execution variants".to_string(),
            ));
        }

        for variant in &request.variants {
            let Some(head) = variant.command.first() else {
                return Err(OrchestratorError::InvalidParameter(format!(
                    "empty command line for {} variant",
                    variant.execution_type
                )));
            };

            if variant.execution_type.requires_allowlist() {
                let registered = self.commands.registered_file_name(&request.service_name);
                if registered.as_deref() != Some(head.as_str()) {
                    return Err(OrchestratorError::CommandNotAllowed(
                        request.service_name.clone(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Fire-and-forget invocation of the execution backend.
    ///
    /// Invoked exactly once per successful request; completion is only
    /// observable through the session's notification channel.
    fn dispatch(
        &self,
        endpoint: &str,
        service_name: &str,
        command: Vec<String>,
        notifier: mpsc::Sender<String>,
    ) {
        let backend = self.backend.clone();
        let endpoint = endpoint.to_string();
        let service_name = service_name.to_string();

        tokio::spawn(async move {
            backend
                .start_execution(&endpoint, &service_name, &command, notifier)
                .await;
        });
    }
}
