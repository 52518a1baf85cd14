use std::convert::TryFrom;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use the_eye::{
    Event, EventFilter, EventForm, EventQuery, NewEvent, Persistable, Queryable, Storage,
};
use the_eye_server::queue::{Deferred, JobQueue};
use the_eye_storage_sqlx::SqlxSqliteStore;

fn new_event(session_id: &str) -> NewEvent {
    NewEvent::try_from(EventForm {
        session_id: Some(session_id.to_string()),
        category: Some("test".to_string()),
        name: Some("test".to_string()),
        data: Some("{}".to_string()),
        timestamp: None,
    })
    .unwrap()
}

/// A store whose writes always fail
#[derive(Default)]
struct BrokenStore {
    attempts: AtomicUsize,
}

impl Storage for BrokenStore {
    type Error = String;
}

#[async_trait::async_trait]
impl Persistable<BrokenStore, Event> for NewEvent {
    async fn persist(self, store: &BrokenStore) -> Result<Event, String> {
        store.attempts.fetch_add(1, Ordering::SeqCst);

        Err("storage unavailable".to_string())
    }
}

#[tokio::test]
async fn drains_before_stopping() {
    let store = Arc::new(SqlxSqliteStore::in_memory().await.unwrap());
    let (queue, workers) = JobQueue::start(store.clone(), 3);

    for i in 0..20 {
        queue.defer(new_event(&format!("session-{}", i))).unwrap();
    }

    drop(queue);
    workers.join().await;

    let matches = EventQuery::all(EventFilter::new())
        .fetch(&*store)
        .await
        .unwrap();

    assert_eq!(matches.total, 20);
}

#[tokio::test]
async fn failed_writes_are_dropped() {
    let store = Arc::new(BrokenStore::default());
    let (queue, workers) = JobQueue::start(store.clone(), 1);

    queue.defer(new_event("a")).unwrap();
    queue.defer(new_event("b")).unwrap();

    drop(queue);
    workers.join().await;

    // Both jobs were attempted exactly once, and the worker survived the first failure
    assert_eq!(store.attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn zero_workers_still_runs_one() {
    let store = Arc::new(BrokenStore::default());
    let (queue, workers) = JobQueue::start(store.clone(), 0);

    queue.defer(new_event("a")).unwrap();

    drop(queue);
    workers.join().await;

    assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
}
