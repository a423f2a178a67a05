//! Score gathering — one concurrent, time-bounded round per request.
//!
//! Each candidate is scored by its own worker task: locally when one of
//! its endpoints matches this host, over the scoring RPC otherwise. A
//! single collector drains the reports until every candidate has answered
//! or the round budget elapses. Slow or unreachable peers cost at most
//! the round timeout, never an unbounded wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use edgeflow_core::providers::{NetworkInfo, NodeIdentity, ScoringClient};
use edgeflow_core::types::{DeviceScore, ExecutionCandidate};

/// Tunables for one scoring round.
#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    /// Global budget for the round. Workers still running when it elapses
    /// are aborted and their reports discarded.
    pub round_timeout: Duration,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            round_timeout: Duration::from_secs(3),
        }
    }
}

/// Gathers fitness scores for a set of candidate devices.
pub struct ScoreAggregator {
    scoring: Arc<dyn ScoringClient>,
    network: Arc<dyn NetworkInfo>,
    identity: Arc<dyn NodeIdentity>,
    policy: ScoringPolicy,
}

impl ScoreAggregator {
    pub fn new(
        scoring: Arc<dyn ScoringClient>,
        network: Arc<dyn NetworkInfo>,
        identity: Arc<dyn NodeIdentity>,
        policy: ScoringPolicy,
    ) -> Self {
        Self {
            scoring,
            network,
            identity,
            policy,
        }
    }

    /// Run one scoring round over `candidates`.
    ///
    /// Returns one report per candidate that answered within the budget —
    /// possibly fewer than the candidate count, never more. Candidates
    /// whose scoring call fails (or that have no endpoint) report a score
    /// of 0.0 rather than being dropped. An empty result means no device
    /// could be evaluated at all.
    pub async fn gather(&self, candidates: &[ExecutionCandidate]) -> Vec<DeviceScore> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let identity = match self.identity.local_identity() {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "local identity unavailable, aborting scoring round");
                return Vec::new();
            }
        };

        let local_addresses: Arc<Vec<String>> = match self.network.local_addresses() {
            Ok(addresses) => Arc::new(addresses),
            Err(e) => {
                warn!(error = %e, "local address lookup failed, treating all candidates as remote");
                Arc::new(Vec::new())
            }
        };

        // One slot per candidate: an abandoned worker's send must never
        // block after the collector has stopped draining.
        let (report_tx, mut report_rx) = mpsc::channel::<DeviceScore>(candidates.len());

        let mut workers = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            workers.push(tokio::spawn(score_candidate(
                candidate.clone(),
                self.scoring.clone(),
                identity.clone(),
                local_addresses.clone(),
                report_tx.clone(),
            )));
        }
        drop(report_tx);

        let mut collected = Vec::with_capacity(candidates.len());
        let deadline = tokio::time::sleep(self.policy.round_timeout);
        tokio::pin!(deadline);

        while collected.len() < candidates.len() {
            tokio::select! {
                report = report_rx.recv() => match report {
                    Some(score) => collected.push(score),
                    None => break,
                },
                _ = &mut deadline => {
                    warn!(
                        collected = collected.len(),
                        candidates = candidates.len(),
                        "scoring round timed out before all candidates reported"
                    );
                    break;
                }
            }
        }

        // Late workers are cancelled; their reports would be discarded
        // anyway.
        for worker in workers {
            worker.abort();
        }

        collected
    }
}

/// Score a single candidate and report the result.
async fn score_candidate(
    candidate: ExecutionCandidate,
    scoring: Arc<dyn ScoringClient>,
    identity: String,
    local_addresses: Arc<Vec<String>>,
    report_tx: mpsc::Sender<DeviceScore>,
) {
    if candidate.endpoints.is_empty() {
        debug!(candidate_id = %candidate.id, "candidate has no endpoint, scoring as zero");
        let _ = report_tx
            .send(DeviceScore {
                candidate_id: candidate.id,
                endpoint: None,
                score: 0.0,
                execution_type: candidate.execution_type,
            })
            .await;
        return;
    }

    let endpoint = candidate.endpoints[0].clone();
    let is_local = candidate
        .endpoints
        .iter()
        .any(|e| local_addresses.contains(e));

    let result = if is_local {
        scoring.local_score(&identity).await
    } else {
        scoring.remote_score(&identity, &endpoint).await
    };

    let score = match result {
        Ok(score) => score,
        Err(e) => {
            warn!(
                candidate_id = %candidate.id,
                endpoint = %endpoint,
                error = %e,
                "scoring call failed, recording zero score"
            );
            0.0
        }
    };

    let _ = report_tx
        .send(DeviceScore {
            candidate_id: candidate.id,
            endpoint: Some(endpoint),
            score,
            execution_type: candidate.execution_type,
        })
        .await;
}
