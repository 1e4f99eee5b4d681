//! Debounced, non-overlapping diagram saves.
//!
//! Each open editor owns one [`SaveScheduler`]. Edits land in a single-slot
//! [`watch`] channel, so a newer graph replaces an older unsent one. A single
//! worker task waits until the slot has been quiet for the debounce delay and
//! then writes the newest graph. Because there is only one worker, saves
//! never overlap and never complete out of order.
//!
//! Manual saves go through the same worker as a flush request: they bypass
//! the debounce, cancel whatever auto-save was pending, and report their
//! outcome back to the caller.
//!
//! Dropping the scheduler closes both channels. A pending debounce is
//! discarded; a write already in flight still completes.

use std::time::Duration;

use archboard_core::{DiagramGraph, DiagramKind};
use archboard_storage::{graph_digest, SaveCondition, SaveReceipt};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::adapter::{AdapterError, PersistenceAdapter};

/// What the worker knows about the stored row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Baseline {
    /// Loading confirmed that nothing is stored yet.
    Absent,
    /// The stored row as of the last load or write.
    Stored { revision: u64, content_hash: String },
    /// Loading failed; the stored row is unknown.
    Unknown,
}

impl Baseline {
    pub fn revision(&self) -> Option<u64> {
        match self {
            Baseline::Stored { revision, .. } => Some(*revision),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    Auto,
    Manual { force: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved { revision: u64 },
    /// The graph matches what is already stored.
    Unchanged,
    /// The stored state is unknown, so only a forced save may write.
    Held,
    Conflict { message: String },
    Failed { message: String },
}

impl SaveOutcome {
    fn from_error(err: AdapterError) -> Self {
        match err {
            AdapterError::Conflict(message) => SaveOutcome::Conflict { message },
            other => SaveOutcome::Failed {
                message: other.to_string(),
            },
        }
    }
}

/// Observable scheduler state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStatus {
    /// Stored revision, if known.
    pub revision: Option<u64>,
    /// Digest of the last graph known to be stored.
    pub saved_hash: Option<String>,
    /// Successful writes made by this scheduler.
    pub writes: u64,
    /// An auto-save is waiting out the debounce.
    pub pending: bool,
    pub last_outcome: Option<SaveOutcome>,
    pub last_saved_at: Option<DateTime<Utc>>,
}

struct FlushRequest {
    graph: DiagramGraph,
    force: bool,
    reply: oneshot::Sender<SaveOutcome>,
}

pub struct SaveScheduler {
    slot: watch::Sender<Option<DiagramGraph>>,
    flush: mpsc::Sender<FlushRequest>,
    status: watch::Receiver<SaveStatus>,
    worker: JoinHandle<()>,
}

impl SaveScheduler {
    /// Spawns the worker. Must be called inside a tokio runtime.
    pub fn spawn(
        adapter: PersistenceAdapter,
        kind: DiagramKind,
        baseline: Baseline,
        delay: Duration,
    ) -> Self {
        let (slot, slot_rx) = watch::channel(None);
        let (flush, flush_rx) = mpsc::channel(8);
        let initial = SaveStatus {
            revision: baseline.revision(),
            saved_hash: match &baseline {
                Baseline::Stored { content_hash, .. } => Some(content_hash.clone()),
                _ => None,
            },
            ..SaveStatus::default()
        };
        let (status_tx, status) = watch::channel(initial);

        let worker = Worker {
            adapter,
            kind,
            baseline,
            status: status_tx,
        };
        let worker = tokio::spawn(worker.run(slot_rx, flush_rx, delay));

        SaveScheduler {
            slot,
            flush,
            status,
            worker,
        }
    }

    /// Queues `graph` for an auto-save, replacing any graph still waiting.
    pub fn schedule(&self, graph: DiagramGraph) {
        self.slot.send_replace(Some(graph));
    }

    /// Drops a queued auto-save that has not fired yet.
    pub fn cancel(&self) {
        self.slot.send_replace(None);
    }

    /// Saves `graph` now, cancelling any pending auto-save.
    pub async fn flush(&self, graph: DiagramGraph, force: bool) -> SaveOutcome {
        let (reply, rx) = oneshot::channel();
        let request = FlushRequest {
            graph,
            force,
            reply,
        };
        if self.flush.send(request).await.is_err() {
            return SaveOutcome::Failed {
                message: "save worker stopped".to_string(),
            };
        }
        rx.await.unwrap_or_else(|_| SaveOutcome::Failed {
            message: "save worker stopped".to_string(),
        })
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }
}

struct Worker {
    adapter: PersistenceAdapter,
    kind: DiagramKind,
    baseline: Baseline,
    status: watch::Sender<SaveStatus>,
}

impl Worker {
    async fn run(
        mut self,
        mut slot: watch::Receiver<Option<DiagramGraph>>,
        mut flush: mpsc::Receiver<FlushRequest>,
        delay: Duration,
    ) {
        let mut deadline: Option<Instant> = None;
        loop {
            let due = deadline;
            let timer = async move {
                match due {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                changed = slot.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    deadline = Some(Instant::now() + delay);
                    self.status.send_modify(|s| s.pending = true);
                }
                Some(request) = flush.recv() => {
                    deadline = None;
                    let _ = slot.borrow_and_update();
                    self.status.send_modify(|s| s.pending = false);
                    let outcome = self
                        .write(request.graph, SaveTrigger::Manual { force: request.force })
                        .await;
                    let _ = request.reply.send(outcome);
                }
                () = timer => {
                    deadline = None;
                    self.status.send_modify(|s| s.pending = false);
                    let graph = slot.borrow_and_update().clone();
                    if let Some(graph) = graph {
                        self.write(graph, SaveTrigger::Auto).await;
                    }
                }
            }
        }
        tracing::debug!(project = %self.adapter.project(), kind = %self.kind, "save worker stopped");
    }

    async fn write(&mut self, graph: DiagramGraph, trigger: SaveTrigger) -> SaveOutcome {
        let outcome = self.try_write(&graph, trigger).await;
        if trigger == SaveTrigger::Auto {
            match &outcome {
                SaveOutcome::Conflict { .. } => self
                    .adapter
                    .notices()
                    .error("The diagram was changed elsewhere. Reload it or force a save."),
                SaveOutcome::Failed { message } => {
                    tracing::warn!(kind = %self.kind, %message, "auto-save failed")
                }
                _ => {}
            }
        }
        let recorded = outcome.clone();
        self.status.send_modify(|s| s.last_outcome = Some(recorded));
        outcome
    }

    async fn try_write(&mut self, graph: &DiagramGraph, trigger: SaveTrigger) -> SaveOutcome {
        let condition = match (&self.baseline, trigger) {
            (_, SaveTrigger::Manual { force: true }) => SaveCondition::Any,
            (Baseline::Unknown, _) => {
                tracing::info!(kind = %self.kind, "save held: stored diagram state unknown");
                return SaveOutcome::Held;
            }
            (Baseline::Absent, _) => SaveCondition::Absent,
            (Baseline::Stored { revision, .. }, _) => SaveCondition::Revision(*revision),
        };

        if trigger == SaveTrigger::Auto {
            let digest = match graph_digest(graph) {
                Ok(digest) => digest,
                Err(err) => {
                    return SaveOutcome::Failed {
                        message: err.to_string(),
                    }
                }
            };
            let unchanged = match &self.baseline {
                Baseline::Stored { content_hash, .. } => *content_hash == digest,
                Baseline::Absent => graph.is_empty(),
                Baseline::Unknown => false,
            };
            if unchanged {
                tracing::debug!(kind = %self.kind, "auto-save skipped: no changes");
                return SaveOutcome::Unchanged;
            }
        }

        match self.adapter.save_diagram(self.kind, graph, condition).await {
            Ok(receipt) => {
                self.record(&receipt);
                SaveOutcome::Saved {
                    revision: receipt.revision,
                }
            }
            Err(err) => SaveOutcome::from_error(err),
        }
    }

    fn record(&mut self, receipt: &SaveReceipt) {
        self.baseline = Baseline::Stored {
            revision: receipt.revision,
            content_hash: receipt.content_hash.clone(),
        };
        self.status.send_modify(|s| {
            s.revision = Some(receipt.revision);
            s.saved_hash = Some(receipt.content_hash.clone());
            s.writes += 1;
            s.last_saved_at = Some(receipt.updated_at);
        });
    }
}
