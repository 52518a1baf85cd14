use chrono::Utc;
use std::convert::TryFrom;
use std::sync::Mutex;
use the_eye::*;

// ---
// Storage provider "crate"
// ---

#[derive(Debug, Default)]
struct FakeStorage {
    events: Mutex<Vec<Event>>,
}

impl Storage for FakeStorage {
    type Error = ValidationError;
}

#[async_trait::async_trait]
impl Persistable<FakeStorage, Event> for NewEvent {
    async fn persist(self, storage: &FakeStorage) -> Result<Event, ValidationError> {
        let timestamp = self.resolve_timestamp()?;
        let mut events = storage.events.lock().unwrap();

        let event = Event {
            id: events.len() as i64 + 1,
            session_id: self.session_id,
            category: self.category,
            name: self.name,
            data: self.data,
            timestamp,
        };

        events.push(event.clone());

        Ok(event)
    }
}

#[async_trait::async_trait]
impl Queryable<FakeStorage> for EventQuery {
    type Output = Matches;

    async fn fetch(&self, storage: &FakeStorage) -> Result<Matches, ValidationError> {
        let events = storage.events.lock().unwrap();

        let matching = events.iter().filter(|e| self.filter.matches(e));
        let total = matching.clone().count() as u64;

        let window = matching
            .skip(self.offset as usize)
            .take(self.limit.map_or(usize::MAX, |l| l as usize))
            .cloned()
            .collect();

        Ok(Matches {
            total,
            events: window,
        })
    }
}

// ---
// Client implementation
// ---

fn submit(session_id: String, category: String, timestamp: Option<String>) -> NewEvent {
    NewEvent::try_from(EventForm {
        session_id: Some(session_id),
        category: Some(category),
        name: Some("test".to_string()),
        data: Some(serde_json::json!({ "test": "test" }).to_string()),
        timestamp,
    })
    .expect("Failed to validate event form")
}

async fn seed(storage: &FakeStorage) {
    for i in 0..10 {
        submit(
            format!("123{}", i),
            format!("test{}", i),
            Some(format!("2022-01-01 00:00:00.{}", i)),
        )
        .persist(storage)
        .await
        .expect("Failed to persist");
    }
}

async fn list(storage: &FakeStorage, params: ListParams) -> Vec<Event> {
    let filter = EventFilter::try_from(&params).expect("Failed to build filter");

    EventQuery::all(filter).fetch(storage).await.unwrap().events
}

#[tokio::test]
async fn unfiltered_returns_everything_in_order() {
    let storage = FakeStorage::default();
    seed(&storage).await;

    let events = list(&storage, ListParams::default()).await;

    assert_eq!(events.len(), 10);
    assert_eq!(
        events.iter().map(|e| e.id).collect::<Vec<_>>(),
        (1..=10).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn session_id_is_exact_match() {
    let storage = FakeStorage::default();
    seed(&storage).await;

    let events = list(
        &storage,
        ListParams {
            session_id: Some("1230".to_string()),
            ..ListParams::default()
        },
    )
    .await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].session_id, "1230");

    let none = list(
        &storage,
        ListParams {
            session_id: Some("123".to_string()),
            ..ListParams::default()
        },
    )
    .await;

    assert!(none.is_empty());
}

#[tokio::test]
async fn timestamp_range_is_inclusive() {
    let storage = FakeStorage::default();
    seed(&storage).await;

    for (start, end) in &[
        ("2022-01-01 00:00:00.0", "2022-01-01 00:00:00.2"),
        ("2022-01-01T00:00:00.0", "2022-01-01T00:00:00.2"),
    ] {
        let events = list(
            &storage,
            ListParams {
                start_time: Some(start.to_string()),
                end_time: Some(end.to_string()),
                ..ListParams::default()
            },
        )
        .await;

        assert_eq!(
            events.iter().map(|e| e.category.as_str()).collect::<Vec<_>>(),
            vec!["test0", "test1", "test2"]
        );
    }
}

#[tokio::test]
async fn open_ranges() {
    let storage = FakeStorage::default();
    seed(&storage).await;

    let after = list(
        &storage,
        ListParams {
            start_time: Some("2022-01-01 00:00:00.7".to_string()),
            ..ListParams::default()
        },
    )
    .await;

    let before = list(
        &storage,
        ListParams {
            end_time: Some("2022-01-01 00:00:00.1".to_string()),
            ..ListParams::default()
        },
    )
    .await;

    assert_eq!(after.len(), 3);
    assert_eq!(before.len(), 2);
}

#[tokio::test]
async fn all_filters_intersect() {
    let storage = FakeStorage::default();
    seed(&storage).await;

    let params = ListParams {
        session_id: Some("1230".to_string()),
        category: Some("test0".to_string()),
        start_time: Some("2022-01-01 00:00:00.0".to_string()),
        end_time: Some("2022-01-01 00:00:00.2".to_string()),
        page: None,
    };

    let events = list(&storage, params.clone()).await;

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].session_id, "1230");

    let disjoint = list(
        &storage,
        ListParams {
            category: Some("test1".to_string()),
            ..params
        },
    )
    .await;

    assert!(disjoint.is_empty());
}

#[tokio::test]
async fn default_timestamp_is_receive_time() {
    let storage = FakeStorage::default();
    let received_at = Utc::now();

    let new_event = NewEvent::from_form(
        EventForm {
            session_id: Some("abc".to_string()),
            category: Some("test".to_string()),
            name: Some("test".to_string()),
            data: Some("{}".to_string()),
            timestamp: None,
        },
        received_at,
    )
    .unwrap();

    let event = new_event.persist(&storage).await.unwrap();

    assert_eq!(event.timestamp, received_at);
}

#[tokio::test]
async fn paged_window() {
    let storage = FakeStorage::default();
    seed(&storage).await;

    let request = PageRequest::parse(Some("2"), 4).unwrap();
    let matches = EventQuery::page(EventFilter::new(), request)
        .fetch(&storage)
        .await
        .unwrap();

    let page = Page::new(request, matches.total, matches.events).unwrap();

    assert_eq!(page.count, 10);
    assert_eq!(page.next, Some(3));
    assert_eq!(page.previous, Some(1));
    assert_eq!(
        page.results.iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![5, 6, 7, 8]
    );
}

#[test]
fn serialized_shape() {
    let event = Event {
        id: 1,
        session_id: "123".to_string(),
        category: "page_interaction".to_string(),
        name: "page_view".to_string(),
        data: r#"{"path": "/"}"#.to_string(),
        timestamp: timestamp::parse("2022-01-01 00:00:00.2").unwrap(),
    };

    assert_eq!(
        serde_json::to_value(&event).unwrap(),
        serde_json::json!({
            "id": 1,
            "session_id": "123",
            "category": "page_interaction",
            "name": "page_view",
            "data": "{\"path\": \"/\"}",
            "timestamp": "2022-01-01T00:00:00.200000Z",
        })
    );

    assert_eq!(event.payload().unwrap(), serde_json::json!({ "path": "/" }));
}
