//! End-to-end request flow: intake → scoring round → ranking → command
//! matching → dispatch, against in-process collaborator fakes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::mpsc;

use edgeflow_core::CommandStore;
use edgeflow_core::config::EdgeflowConfig;
use edgeflow_core::providers::{
    CandidateDirectory, ExecutionBackend, NetworkInfo, NodeIdentity, ScoringClient,
};
use edgeflow_core::types::{
    ExecutionCandidate, ExecutionType, ExecutionVariant, INVALID_SCORE, ResultCode,
    ServiceRequest,
};
use edgeflow_orchestrator::OrchestrationEngine;
use edgeflow_scoring::{ScoreAggregator, ScoringPolicy};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

// ── Collaborator fakes ─────────────────────────────────────────────

struct ScriptedDirectory {
    candidates: Vec<ExecutionCandidate>,
    error: Option<String>,
}

#[async_trait]
impl CandidateDirectory for ScriptedDirectory {
    async fn resolve(
        &self,
        _service_name: &str,
        _execution_types: &[ExecutionType],
    ) -> anyhow::Result<Vec<ExecutionCandidate>> {
        match &self.error {
            Some(message) => Err(anyhow::anyhow!("{message}")),
            None => Ok(self.candidates.clone()),
        }
    }
}

/// Per-endpoint remote behavior for one test.
#[derive(Clone, Copy)]
enum Remote {
    Score(f64),
    /// Answer with this score after a delay (fixes arrival order).
    Delayed(f64, Duration),
    Fails,
    Hangs,
}

struct ScriptedScoring {
    local: f64,
    remote: HashMap<&'static str, Remote>,
}

#[async_trait]
impl ScoringClient for ScriptedScoring {
    async fn local_score(&self, _identity: &str) -> anyhow::Result<f64> {
        Ok(self.local)
    }

    async fn remote_score(&self, _identity: &str, endpoint: &str) -> anyhow::Result<f64> {
        match self.remote.get(endpoint) {
            Some(Remote::Score(score)) => Ok(*score),
            Some(Remote::Delayed(score, delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(*score)
            }
            Some(Remote::Fails) => anyhow::bail!("peer unreachable"),
            Some(Remote::Hangs) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("hung scoring call should have been aborted")
            }
            None => anyhow::bail!("unknown endpoint {endpoint}"),
        }
    }
}

struct FixedNetwork(Vec<&'static str>);

impl NetworkInfo for FixedNetwork {
    fn local_addresses(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.0.iter().map(|s| s.to_string()).collect())
    }
}

struct FixedIdentity;

impl NodeIdentity for FixedIdentity {
    fn local_identity(&self) -> anyhow::Result<String> {
        Ok("edge-01".to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Invocation {
    endpoint: String,
    service_name: String,
    command: Vec<String>,
}

/// Records every dispatch and optionally posts a status notification the
/// way a real backend would.
struct RecordingBackend {
    invocations: Mutex<Vec<Invocation>>,
    dispatched_tx: mpsc::Sender<Invocation>,
    status: Option<String>,
}

impl RecordingBackend {
    fn new(status: Option<String>) -> (Arc<Self>, mpsc::Receiver<Invocation>) {
        let (dispatched_tx, dispatched_rx) = mpsc::channel(8);
        let backend = Arc::new(Self {
            invocations: Mutex::new(Vec::new()),
            dispatched_tx,
            status,
        });
        (backend, dispatched_rx)
    }

    fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionBackend for RecordingBackend {
    async fn start_execution(
        &self,
        endpoint: &str,
        service_name: &str,
        command: &[String],
        notifier: mpsc::Sender<String>,
    ) {
        let invocation = Invocation {
            endpoint: endpoint.to_string(),
            service_name: service_name.to_string(),
            command: command.to_vec(),
        };
        self.invocations.lock().unwrap().push(invocation.clone());
        if let Some(status) = &self.status {
            let _ = notifier.send(status.clone()).await;
        }
        let _ = self.dispatched_tx.send(invocation).await;
    }
}

// ── Harness ────────────────────────────────────────────────────────

struct Harness {
    engine: OrchestrationEngine,
    backend: Arc<RecordingBackend>,
    dispatched_rx: mpsc::Receiver<Invocation>,
}

fn harness(
    candidates: Vec<ExecutionCandidate>,
    directory_error: Option<&str>,
    scoring: ScriptedScoring,
    local_addresses: Vec<&'static str>,
    status: Option<&str>,
) -> Harness {
    init_logging();

    let commands = Arc::new(CommandStore::new());
    commands.register("camera-feed", "/usr/bin/camera-feed");

    let (backend, dispatched_rx) = RecordingBackend::new(status.map(str::to_string));

    let aggregator = ScoreAggregator::new(
        Arc::new(scoring),
        Arc::new(FixedNetwork(local_addresses)),
        Arc::new(FixedIdentity),
        ScoringPolicy {
            round_timeout: Duration::from_millis(200),
        },
    );

    let engine = OrchestrationEngine::new(
        Arc::new(ScriptedDirectory {
            candidates,
            error: directory_error.map(str::to_string),
        }),
        commands,
        backend.clone(),
        aggregator,
        &EdgeflowConfig::default(),
    );

    Harness {
        engine,
        backend,
        dispatched_rx,
    }
}

fn candidate(id: &str, endpoints: &[&str], exec: ExecutionType) -> ExecutionCandidate {
    ExecutionCandidate {
        id: id.to_string(),
        endpoints: endpoints.iter().map(|s| s.to_string()).collect(),
        execution_type: exec,
    }
}

fn native_request() -> ServiceRequest {
    ServiceRequest {
        service_name: "camera-feed".to_string(),
        variants: vec![ExecutionVariant {
            execution_type: ExecutionType::Native,
            command: vec!["/usr/bin/camera-feed".to_string(), "--fps".to_string(), "30".to_string()],
        }],
    }
}

fn container_request() -> ServiceRequest {
    ServiceRequest {
        service_name: "camera-feed".to_string(),
        variants: vec![ExecutionVariant {
            execution_type: ExecutionType::Container,
            command: vec!["registry/camera-feed:latest".to_string()],
        }],
    }
}

async fn await_dispatch(rx: &mut mpsc::Receiver<Invocation>) -> Invocation {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("dispatch should happen within a second")
        .expect("dispatch channel closed")
}

// ── Scenarios ──────────────────────────────────────────────────────

#[tokio::test]
async fn local_candidate_with_best_score_wins() {
    let mut h = harness(
        vec![
            candidate("edge-01", &["10.0.0.1:5000"], ExecutionType::Native),
            candidate("edge-02", &["10.0.0.2:5000"], ExecutionType::Native),
        ],
        None,
        ScriptedScoring {
            local: 0.9,
            remote: HashMap::from([("10.0.0.2:5000", Remote::Score(0.5))]),
        },
        vec!["10.0.0.1:5000"],
        None,
    );

    let response = h.engine.request_service(native_request()).await;

    assert_eq!(response.code, ResultCode::NoError);
    let target = response.target.expect("success carries a target");
    assert_eq!(target.execution_type, ExecutionType::Native);
    assert_eq!(target.endpoint, "10.0.0.1:5000");

    let invocation = await_dispatch(&mut h.dispatched_rx).await;
    assert_eq!(invocation.endpoint, "10.0.0.1:5000");
    assert_eq!(invocation.service_name, "camera-feed");
    assert_eq!(invocation.command[0], "/usr/bin/camera-feed");
}

#[tokio::test]
async fn sole_erroring_remote_still_dispatches_with_zero_score() {
    let mut h = harness(
        vec![candidate("edge-02", &["10.0.0.2:5000"], ExecutionType::Container)],
        None,
        ScriptedScoring {
            local: 0.0,
            remote: HashMap::from([("10.0.0.2:5000", Remote::Fails)]),
        },
        vec![],
        None,
    );

    let response = h.engine.request_service(container_request()).await;

    // A failed scoring call records 0.0, which is not the invalid-score
    // sentinel, so the sole candidate still wins and is dispatched.
    assert_eq!(response.code, ResultCode::NoError);
    assert_eq!(response.target.unwrap().endpoint, "10.0.0.2:5000");

    let invocation = await_dispatch(&mut h.dispatched_rx).await;
    assert_eq!(invocation.endpoint, "10.0.0.2:5000");
}

#[tokio::test]
async fn tie_is_won_by_first_arrival() {
    // Fixed arrival order: edge-02 answers first, edge-03 later, both
    // with the same score.
    let mut h = harness(
        vec![
            candidate("edge-02", &["10.0.0.2:5000"], ExecutionType::Container),
            candidate("edge-03", &["10.0.0.3:5000"], ExecutionType::Container),
        ],
        None,
        ScriptedScoring {
            local: 0.0,
            remote: HashMap::from([
                ("10.0.0.2:5000", Remote::Delayed(0.4, Duration::from_millis(10))),
                ("10.0.0.3:5000", Remote::Delayed(0.4, Duration::from_millis(60))),
            ]),
        },
        vec![],
        None,
    );

    let response = h.engine.request_service(container_request()).await;

    assert_eq!(response.code, ResultCode::NoError);
    assert_eq!(response.target.unwrap().endpoint, "10.0.0.2:5000");
    let invocation = await_dispatch(&mut h.dispatched_rx).await;
    assert_eq!(invocation.endpoint, "10.0.0.2:5000");
}

#[tokio::test]
async fn hung_peer_is_cut_off_at_the_round_budget() {
    let mut h = harness(
        vec![
            candidate("edge-02", &["10.0.0.2:5000"], ExecutionType::Container),
            candidate("edge-03", &["10.0.0.3:5000"], ExecutionType::Container),
        ],
        None,
        ScriptedScoring {
            local: 0.0,
            remote: HashMap::from([
                ("10.0.0.2:5000", Remote::Score(0.6)),
                ("10.0.0.3:5000", Remote::Hangs),
            ]),
        },
        vec![],
        None,
    );

    let started = Instant::now();
    let response = h.engine.request_service(container_request()).await;
    let elapsed = started.elapsed();

    assert_eq!(response.code, ResultCode::NoError);
    assert_eq!(response.target.unwrap().endpoint, "10.0.0.2:5000");
    // The round budget (200ms) bounds the wait for the hung peer.
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_secs(2));

    let invocation = await_dispatch(&mut h.dispatched_rx).await;
    assert_eq!(invocation.endpoint, "10.0.0.2:5000");
}

#[tokio::test]
async fn all_sentinel_scores_mean_service_not_found() {
    let h = harness(
        vec![candidate("edge-02", &["10.0.0.2:5000"], ExecutionType::Container)],
        None,
        ScriptedScoring {
            local: 0.0,
            remote: HashMap::from([("10.0.0.2:5000", Remote::Score(INVALID_SCORE))]),
        },
        vec![],
        None,
    );

    let response = h.engine.request_service(container_request()).await;

    assert_eq!(response.code, ResultCode::ServiceNotFound);
    assert!(response.target.is_none());
    assert!(h.backend.invocations().is_empty());
}

#[tokio::test]
async fn empty_candidate_set_means_service_not_found() {
    let h = harness(
        Vec::new(),
        None,
        ScriptedScoring {
            local: 0.0,
            remote: HashMap::new(),
        },
        vec![],
        None,
    );

    let response = h.engine.request_service(container_request()).await;

    assert_eq!(response.code, ResultCode::ServiceNotFound);
    assert!(response.target.is_none());
    assert!(h.backend.invocations().is_empty());
}

#[tokio::test]
async fn endpointless_winner_means_service_not_found() {
    let h = harness(
        vec![candidate("edge-02", &[], ExecutionType::Container)],
        None,
        ScriptedScoring {
            local: 0.0,
            remote: HashMap::new(),
        },
        vec![],
        None,
    );

    let response = h.engine.request_service(container_request()).await;

    assert_eq!(response.code, ResultCode::ServiceNotFound);
    assert!(h.backend.invocations().is_empty());
}

#[tokio::test]
async fn directory_error_message_passes_through() {
    let h = harness(
        Vec::new(),
        Some("device directory offline"),
        ScriptedScoring {
            local: 0.0,
            remote: HashMap::new(),
        },
        vec![],
        None,
    );

    let response = h.engine.request_service(container_request()).await;

    assert_eq!(
        response.code,
        ResultCode::Other("device directory offline".to_string())
    );
    assert!(response.target.is_none());
}

#[tokio::test]
async fn winner_without_matching_variant_surfaces_matcher_message() {
    // The directory hands back a container-only device, but the request
    // only carries a native variant.
    let h = harness(
        vec![candidate("edge-02", &["10.0.0.2:5000"], ExecutionType::Container)],
        None,
        ScriptedScoring {
            local: 0.0,
            remote: HashMap::from([("10.0.0.2:5000", Remote::Score(0.8))]),
        },
        vec![],
        None,
    );

    let response = h.engine.request_service(native_request()).await;

    let ResultCode::Other(message) = response.code else {
        panic!("expected pass-through code, got {:?}", response.code);
    };
    assert!(message.contains("container"), "message was: {message}");
    assert!(h.backend.invocations().is_empty());
}

#[tokio::test]
async fn dispatch_happens_exactly_once() {
    let mut h = harness(
        vec![
            candidate("edge-02", &["10.0.0.2:5000"], ExecutionType::Container),
            candidate("edge-03", &["10.0.0.3:5000"], ExecutionType::Container),
        ],
        None,
        ScriptedScoring {
            local: 0.0,
            remote: HashMap::from([
                ("10.0.0.2:5000", Remote::Score(0.3)),
                ("10.0.0.3:5000", Remote::Score(0.7)),
            ]),
        },
        vec![],
        None,
    );

    let response = h.engine.request_service(container_request()).await;
    assert_eq!(response.code, ResultCode::NoError);

    await_dispatch(&mut h.dispatched_rx).await;
    // Give a hypothetical second dispatch time to appear.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let invocations = h.backend.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(invocations[0].endpoint, "10.0.0.3:5000");
    assert_eq!(invocations[0].command, vec!["registry/camera-feed:latest".to_string()]);
}

#[tokio::test]
async fn backend_status_notification_closes_the_session() {
    let mut h = harness(
        vec![candidate("edge-02", &["10.0.0.2:5000"], ExecutionType::Container)],
        None,
        ScriptedScoring {
            local: 0.0,
            remote: HashMap::from([("10.0.0.2:5000", Remote::Score(0.7))]),
        },
        vec![],
        Some("started"),
    );

    let response = h.engine.request_service(container_request()).await;
    assert_eq!(response.code, ResultCode::NoError);

    await_dispatch(&mut h.dispatched_rx).await;

    // The listener consumed the backend's single status message and
    // released the session.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.engine.sessions().active_sessions().await, 0);
}

#[tokio::test]
async fn consecutive_requests_are_independent_rounds() {
    let mut h = harness(
        vec![candidate("edge-02", &["10.0.0.2:5000"], ExecutionType::Container)],
        None,
        ScriptedScoring {
            local: 0.0,
            remote: HashMap::from([("10.0.0.2:5000", Remote::Score(0.7))]),
        },
        vec![],
        None,
    );

    let first = h.engine.request_service(container_request()).await;
    let second = h.engine.request_service(container_request()).await;

    assert_eq!(first.code, ResultCode::NoError);
    assert_eq!(second.code, ResultCode::NoError);

    await_dispatch(&mut h.dispatched_rx).await;
    await_dispatch(&mut h.dispatched_rx).await;
    assert_eq!(h.backend.invocations().len(), 2);
}
