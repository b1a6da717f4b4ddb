//! Async host for a [`Session`].
//!
//! The runner owns the session and a single message queue. User intents and
//! operation results both arrive on that queue, so every mutation of the
//! session is serialized. Commands run as independent tokio tasks that post
//! exactly one result back. Snapshots are published on a watch channel after
//! every message.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::CatalogClient;
use crate::poll::PollController;
use crate::source::SourceNetwork;

use super::machine::Session;
use super::types::{Command, Intent, OpId, OpResult, Snapshot};

/// Everything that flows into the session.
#[derive(Debug)]
enum Message {
    Intent(Intent),
    Result { op: OpId, result: OpResult },
}

/// Handle for driving a running session.
///
/// This is cheaply cloneable. Dropping every handle cancels the session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Message>,
    snapshots: watch::Receiver<Snapshot>,
}

impl SessionHandle {
    /// Send an intent. Returns false once the session has ended.
    pub fn send(&self, intent: Intent) -> bool {
        match self.tx.send(Message::Intent(intent)) {
            Ok(()) => true,
            Err(e) => {
                debug!("Session closed, dropping intent: {:?}", e.0);
                false
            }
        }
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }
}

/// Backends shared by all command tasks.
#[derive(Clone)]
struct Backends {
    catalog: Arc<dyn CatalogClient>,
    source: Arc<dyn SourceNetwork>,
    poller: PollController,
}

/// Drives a session until it completes or is cancelled.
pub struct SessionRunner {
    session: Session,
    backends: Backends,
    /// Weak so the queue closes once every handle and task is gone.
    tx: mpsc::WeakUnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    snapshots: watch::Sender<Snapshot>,
    in_flight: Vec<JoinHandle<()>>,
}

impl SessionRunner {
    pub fn new(
        session: Session,
        catalog: Arc<dyn CatalogClient>,
        source: Arc<dyn SourceNetwork>,
        poller: PollController,
    ) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(session.snapshot());

        let weak_tx = tx.downgrade();
        let handle = SessionHandle {
            tx,
            snapshots: snapshot_rx,
        };
        let runner = Self {
            session,
            backends: Backends {
                catalog,
                source,
                poller,
            },
            tx: weak_tx,
            rx,
            snapshots,
            in_flight: Vec::new(),
        };
        (runner, handle)
    }

    /// Process messages until the session reaches a terminal phase.
    ///
    /// Returns the final snapshot. In-flight operations are aborted on exit.
    pub async fn run(mut self) -> Snapshot {
        info!("Session started");

        while !self.session.phase().is_terminal() {
            let message = match self.rx.recv().await {
                Some(message) => message,
                None => {
                    info!("All session handles dropped");
                    Message::Intent(Intent::Cancel)
                }
            };

            let command = match message {
                Message::Intent(intent) => {
                    debug!("Intent {:?}", intent);
                    self.session.handle_intent(intent)
                }
                Message::Result { op, result } => self.session.handle_result(op, result),
            };

            if let Some(command) = command {
                self.dispatch(command);
            }
            self.snapshots.send_replace(self.session.snapshot());
        }

        for task in self.in_flight.drain(..) {
            task.abort();
        }
        info!("Session ended in {}", self.session.phase());
        self.session.snapshot()
    }

    fn dispatch(&mut self, command: Command) {
        self.in_flight.retain(|task| !task.is_finished());

        let op = command.op();
        let Some(tx) = self.tx.upgrade() else {
            debug!("Session queue closed, not dispatching {}", op);
            return;
        };
        let backends = self.backends.clone();
        let task = tokio::spawn(async move {
            let result = execute(&backends, command).await;
            if tx.send(Message::Result { op, result }).is_err() {
                debug!("Session gone, dropping result for {}", op);
            }
        });
        self.in_flight.push(task);
    }
}

/// Run one command against the backends.
async fn execute(backends: &Backends, command: Command) -> OpResult {
    let op = command.op();
    debug!("Executing {} ({})", command.name(), op);

    match command {
        Command::SearchArtists { query, .. } => {
            OpResult::Artists(backends.catalog.search_artists(&query).await)
        }
        Command::LoadReleaseGroups { artist_id, .. } => {
            OpResult::ReleaseGroups(backends.catalog.release_groups(&artist_id).await)
        }
        Command::LoadReleases { release_group, .. } => {
            OpResult::Releases(backends.catalog.releases(&release_group).await)
        }
        Command::LoadReleaseDetails { release_id, .. } => {
            OpResult::ReleaseDetails(backends.catalog.release_details(&release_id).await)
        }
        Command::StartSourceSearch { search_text, .. } => {
            info!(
                "Starting {} search for \"{}\"",
                backends.source.name(),
                search_text
            );
            OpResult::SearchStarted(backends.source.start_search(&search_text).await)
        }
        Command::PollSearch { state, .. } => {
            tokio::time::sleep(backends.poller.config().tick_interval()).await;
            OpResult::Poll(backends.poller.tick(state).await)
        }
        Command::QueueTransfer {
            username, files, ..
        } => {
            let result = backends.source.queue_transfer(&username, &files).await;
            if let Err(e) = &result {
                warn!("Queueing transfer from {} failed: {}", username, e);
            }
            OpResult::TransferQueued(result)
        }
    }
}
