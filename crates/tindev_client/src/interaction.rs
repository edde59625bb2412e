//! Fire-and-forget like/dislike dispatch with an outcome channel.
//!
//! The caller advances its queue before dispatching; the remote call runs on
//! its own task and its result is reported on the outcome channel. Nothing is
//! retried and nothing is reverted.

use tokio::sync::mpsc;

use crate::api::{Action, ApiClient};
use crate::error::ClientError;
use crate::session::Session;

/// Result of one dispatched like/dislike.
#[derive(Debug)]
pub struct InteractionOutcome {
    pub action: Action,
    pub candidate_id: String,
    pub result: Result<(), ClientError>,
}

impl InteractionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct Interactions {
    api: ApiClient,
    tx: mpsc::UnboundedSender<InteractionOutcome>,
    rx: mpsc::UnboundedReceiver<InteractionOutcome>,
    in_flight: usize,
}

impl Interactions {
    pub fn new(api: ApiClient) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Spawns the remote call and returns immediately. Must be called from
    /// within a tokio runtime.
    pub fn dispatch(&mut self, session: &Session, action: Action, candidate_id: &str) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        let session = session.clone();
        let candidate_id = candidate_id.to_string();
        self.in_flight += 1;
        tokio::spawn(async move {
            let result = api.judge(&session, action, &candidate_id).await;
            if let Err(e) = &result {
                tracing::warn!(%action, candidate_id = %candidate_id, error = %e, "interaction failed");
            }
            // receiver gone means the screen was torn down
            let _ = tx.send(InteractionOutcome {
                action,
                candidate_id,
                result,
            });
        });
    }

    /// Calls dispatched but not yet reported.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Waits for the next completed call. Returns `None` when nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<InteractionOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.rx.recv().await?;
        self.in_flight -= 1;
        Some(outcome)
    }

    pub fn try_next_outcome(&mut self) -> Option<InteractionOutcome> {
        let outcome = self.rx.try_recv().ok()?;
        self.in_flight -= 1;
        Some(outcome)
    }
}

impl std::fmt::Debug for Interactions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interactions")
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}
