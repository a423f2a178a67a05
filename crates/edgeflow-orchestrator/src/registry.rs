//! Session registry — per-request tracking handles and their
//! notification listeners.
//!
//! Each accepted request opens a session: a generated id, the service
//! name, and a single-shot channel the execution backend posts one status
//! message to. A spawned listener waits for that message with a bounded
//! timeout and removes the session when it exits, so sessions never
//! accumulate and ids are never reused.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

/// Identifier of one in-flight service request.
pub type SessionId = u64;

struct SessionEntry {
    service_name: String,
    notifier: mpsc::Sender<String>,
}

/// An open session, handed to the engine for dispatch wiring.
pub struct Session {
    pub id: SessionId,
    /// Sender side of the status channel; passed to the execution
    /// backend.
    pub notifier: mpsc::Sender<String>,
}

/// Allocates sessions and runs their notification listeners.
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
    next_id: AtomicU64,
    /// Bounded wait for the single status notification.
    notify_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(notify_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(0),
            notify_timeout,
        }
    }

    /// Open a session for a request and start its listener.
    ///
    /// The listener consumes exactly one status message, then exits and
    /// removes the session — on delivery, on channel close, or when the
    /// bounded wait expires.
    pub async fn open(&self, service_name: &str) -> Session {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (notifier, receiver) = mpsc::channel::<String>(1);

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(
                id,
                SessionEntry {
                    service_name: service_name.to_string(),
                    notifier: notifier.clone(),
                },
            );
        }

        tokio::spawn(listen_for_status(
            id,
            service_name.to_string(),
            receiver,
            self.notify_timeout,
            self.sessions.clone(),
        ));

        debug!(session_id = id, %service_name, "session opened");
        Session { id, notifier }
    }

    /// Deliver a status message to a session's channel.
    ///
    /// Returns `false` when the session is unknown or its listener has
    /// already finished.
    pub async fn notify(&self, id: SessionId, status: &str) -> bool {
        let sender = {
            let sessions = self.sessions.read().await;
            sessions.get(&id).map(|entry| entry.notifier.clone())
        };
        match sender {
            Some(sender) => sender.send(status.to_string()).await.is_ok(),
            None => false,
        }
    }

    /// Service name of an open session, if it is still tracked.
    pub async fn service_name(&self, id: SessionId) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions.get(&id).map(|entry| entry.service_name.clone())
    }

    /// Number of sessions whose listeners are still waiting.
    pub async fn active_sessions(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    pub async fn contains(&self, id: SessionId) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(&id)
    }
}

/// Single-shot listener for one session.
async fn listen_for_status(
    id: SessionId,
    service_name: String,
    mut receiver: mpsc::Receiver<String>,
    timeout: Duration,
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
) {
    tokio::select! {
        message = receiver.recv() => match message {
            Some(status) => {
                info!(session_id = id, %service_name, %status, "service status changed");
            }
            None => {
                debug!(session_id = id, %service_name, "status channel closed without notification");
            }
        },
        _ = tokio::time::sleep(timeout) => {
            warn!(session_id = id, %service_name, "no status notification before timeout");
        }
    }

    let mut sessions = sessions.write().await;
    sessions.remove(&id);
}
