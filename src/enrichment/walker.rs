//! Sequential enrichment walker.
//!
//! Walks an ordered list of shelf entries, enriching one at a time through
//! the detail cache. One entry in flight at any moment: the sequential loop
//! is the backpressure that keeps a rate-limited upstream from being hit by
//! a burst of parallel requests.
//!
//! The loop owns a single status field and re-reads it every iteration; a
//! rate limit pauses the walk on the failing entry until an external
//! `resume()` flips the status back, and the same entry is then retried.
//! While paused the walker consumes no provider quota. Abandoning a walk at
//! any point is safe: every cache write is a self-contained upsert, so
//! later entries simply stay unenriched until a future walk.

use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cache::EntityEnricher;
use super::signal::EnrichError;
use crate::catalog::models::EntityKind;

/// Walker lifecycle state.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalkerStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

impl WalkerStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WalkerStatus::Completed)
    }
}

/// One shelf entry to enrich.
#[derive(Clone, Debug)]
pub struct WalkItem {
    pub kind: EntityKind,
    pub entity_id: String,
    /// Human-readable label for logging and progress display.
    pub label: String,
}

/// Progress snapshot published after every state change.
#[derive(Clone, Debug, Serialize)]
pub struct WalkerProgress {
    pub status: WalkerStatus,
    pub processed: usize,
    pub total: usize,
    /// The rate-limit message while paused.
    pub pause_message: Option<String>,
}

struct WalkerState {
    status: WalkerStatus,
    processed: usize,
    pause_message: Option<String>,
}

pub struct ShelfWalker {
    enricher: Arc<dyn EntityEnricher>,
    items: Vec<WalkItem>,
    state: Mutex<WalkerState>,
    resume_notify: Notify,
    progress_tx: watch::Sender<WalkerProgress>,
}

impl ShelfWalker {
    pub fn new(enricher: Arc<dyn EntityEnricher>, items: Vec<WalkItem>) -> Self {
        let total = items.len();
        let (progress_tx, _) = watch::channel(WalkerProgress {
            status: WalkerStatus::Idle,
            processed: 0,
            total,
            pause_message: None,
        });
        Self {
            enricher,
            items,
            state: Mutex::new(WalkerState {
                status: WalkerStatus::Idle,
                processed: 0,
                pause_message: None,
            }),
            resume_notify: Notify::new(),
            progress_tx,
        }
    }

    pub fn status(&self) -> WalkerStatus {
        self.state.lock().unwrap().status
    }

    pub fn progress(&self) -> WalkerProgress {
        let state = self.state.lock().unwrap();
        WalkerProgress {
            status: state.status,
            processed: state.processed,
            total: self.items.len(),
            pause_message: state.pause_message.clone(),
        }
    }

    /// Watch progress updates; the receiver observes every publish.
    pub fn subscribe(&self) -> watch::Receiver<WalkerProgress> {
        self.progress_tx.subscribe()
    }

    /// External resume action. A no-op unless the walker is paused.
    pub fn resume(&self) {
        let mut state = self.state.lock().unwrap();
        if state.status != WalkerStatus::Paused {
            return;
        }
        state.status = WalkerStatus::Running;
        state.pause_message = None;
        drop(state);
        info!("Walker resumed");
        self.resume_notify.notify_one();
        self.publish();
    }

    fn set_status(&self, status: WalkerStatus, pause_message: Option<String>) {
        let mut state = self.state.lock().unwrap();
        state.status = status;
        state.pause_message = pause_message;
    }

    fn bump_processed(&self) {
        self.state.lock().unwrap().processed += 1;
    }

    fn publish(&self) {
        self.progress_tx.send_replace(self.progress());
    }

    /// Suspend until `resume()` flips the status, or the walk is abandoned.
    /// Returns false when cancelled.
    async fn wait_for_resume(&self, shutdown: &CancellationToken) -> bool {
        loop {
            if self.status() != WalkerStatus::Paused {
                return true;
            }
            tokio::select! {
                _ = self.resume_notify.notified() => {}
                _ = shutdown.cancelled() => return false,
            }
        }
    }

    /// Run the walk to completion. Entries are attempted strictly in input
    /// order; a paused entry is retried, never skipped or requeued.
    pub async fn run(&self, shutdown: CancellationToken) {
        {
            let state = self.state.lock().unwrap();
            if state.status != WalkerStatus::Idle {
                warn!("Walker run requested twice, ignoring");
                return;
            }
        }
        let total = self.items.len();
        self.set_status(WalkerStatus::Running, None);
        self.publish();

        for item in &self.items {
            loop {
                if shutdown.is_cancelled() {
                    info!(
                        "Walker abandoned at {}/{} entries",
                        self.progress().processed,
                        total
                    );
                    return;
                }

                match self.enricher.enrich(item.kind, &item.entity_id).await {
                    Ok(outcome) => {
                        debug!(
                            label = %item.label,
                            cached = outcome.cached,
                            "Entry enriched"
                        );
                        break;
                    }
                    Err(EnrichError::RateLimited(signal)) => {
                        info!("Walker paused on '{}': {}", item.label, signal.message);
                        self.set_status(WalkerStatus::Paused, Some(signal.message));
                        self.publish();
                        if !self.wait_for_resume(&shutdown).await {
                            info!(
                                "Walker abandoned while paused at {}/{} entries",
                                self.progress().processed,
                                total
                            );
                            return;
                        }
                        // Retry the same entry.
                    }
                    Err(e) => {
                        // Terminal for this entry; whatever could be stamped
                        // already was.
                        warn!("Walker failed on '{}': {}", item.label, e);
                        break;
                    }
                }
            }

            self.bump_processed();
            self.publish();
        }

        self.set_status(WalkerStatus::Completed, None);
        self.publish();
        info!("Walker completed {}/{} entries", total, total);
    }
}
