//! Deferred event writes
//!
//! The ingestion endpoint acknowledges a submission as soon as it is queued here. A fixed pool of
//! worker tasks drains the queue and persists each job. A failed write is logged and dropped:
//! nothing is reported back to the client and nothing is retried.

use std::fmt;
use std::sync::Arc;
use the_eye::{Event, NewEvent, Persistable, Storage};
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job queue is closed")]
    Closed,
}

/// Somewhere to hand off an accepted event for out-of-band persistence
pub trait Deferred: Send + Sync {
    /// Queue a job without waiting for it to run
    fn defer(&self, event: NewEvent) -> Result<(), QueueError>;
}

/// In-process job queue backed by an unbounded channel
///
/// Every clone feeds the same worker pool. The workers stop once every clone has been dropped
/// and the jobs already queued have been written.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::UnboundedSender<NewEvent>,
}

/// Handles to the worker tasks of a [`JobQueue`]
pub struct Workers {
    handles: Vec<JoinHandle<()>>,
}

impl JobQueue {
    /// Spawn `workers` tasks (at least one) persisting jobs into `store`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S>(store: Arc<S>, workers: usize) -> (Self, Workers)
    where
        S: Storage + Send + Sync + 'static,
        S::Error: fmt::Display,
        NewEvent: Persistable<S, Event>,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers.max(1))
            .map(|id| tokio::spawn(work(id, store.clone(), receiver.clone())))
            .collect();

        (Self { sender }, Workers { handles })
    }
}

impl Deferred for JobQueue {
    fn defer(&self, event: NewEvent) -> Result<(), QueueError> {
        self.sender.send(event).map_err(|_| QueueError::Closed)
    }
}

impl Workers {
    /// Wait for every worker to finish
    ///
    /// Only returns once all [`JobQueue`] handles are gone and the queue is drained.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                log::error!("Event writer task failed: {}", e);
            }
        }
    }
}

async fn work<S>(id: usize, store: Arc<S>, receiver: Arc<Mutex<mpsc::UnboundedReceiver<NewEvent>>>)
where
    S: Storage + Send + Sync + 'static,
    S::Error: fmt::Display,
    NewEvent: Persistable<S, Event>,
{
    log::debug!("Event writer {} started", id);

    loop {
        // Lock is released before the write so other workers can pick up the next job
        let job = receiver.lock().await.recv().await;

        match job {
            Some(job) => write(&*store, job).await,
            None => break,
        }
    }

    log::debug!("Event writer {} stopped", id);
}

async fn write<S>(store: &S, job: NewEvent)
where
    S: Storage + Send + Sync,
    S::Error: fmt::Display,
    NewEvent: Persistable<S, Event>,
{
    let session_id = job.session_id.clone();
    let category = job.category.clone();
    let name = job.name.clone();

    match job.persist(store).await {
        Ok(event) => log::debug!("Stored event {} for session {}", event.id, event.session_id),
        Err(e) => log::error!(
            "Failed to persist event {}/{} for session {}: {}",
            category,
            name,
            session_id,
            e
        ),
    }
}
