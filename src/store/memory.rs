use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::broadcast;

use super::{Direction, DocumentStore, OrderBy, StoreError, Subscription};
use crate::models::{parse_timestamp, Document};

const CHANGE_BUFFER: usize = 64;

/// Change notice that concerns every collection.
const ALL_COLLECTIONS: &str = "";

struct Inner {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    offline: AtomicBool,
    changes: broadcast::Sender<String>,
}

/// Process-local document store.
///
/// Used when no database is configured and throughout the tests. Documents
/// keep their insertion order; snapshots are sorted on the way out.
#[derive(Clone)]
pub struct MemoryDocumentStore {
    inner: Arc<Inner>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(HashMap::new()),
                offline: AtomicBool::new(false),
                changes,
            }),
        }
    }

    /// Seed from JSON shaped as `{ "<collection>": [ { "id": "...", ... } ] }`.
    pub fn from_seed(seed: Value) -> Result<Self, StoreError> {
        let collections: HashMap<String, Vec<Document>> = serde_json::from_value(seed)?;
        let store = Self::new();
        *store.lock() = collections;
        Ok(store)
    }

    pub fn from_seed_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::SeedRead {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_seed(serde_json::from_str(&content)?)?;
        tracing::info!(path = %path.display(), "Seeded in-memory document store");
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Document>>> {
        self.inner
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, collection: &str) {
        // No receivers just means nobody is subscribed right now.
        self.inner.changes.send(collection.to_string()).ok();
    }

    /// Insert a document, or replace the one with the same id in place.
    pub fn upsert(&self, collection: &str, doc: Document) {
        {
            let mut collections = self.lock();
            let docs = collections.entry(collection.to_string()).or_default();
            match docs.iter_mut().find(|existing| existing.id == doc.id) {
                Some(existing) => *existing = doc,
                None => docs.push(doc),
            }
        }
        self.notify(collection);
    }

    pub fn remove(&self, collection: &str, id: &str) -> bool {
        let removed = {
            let mut collections = self.lock();
            match collections.get_mut(collection) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|doc| doc.id != id);
                    docs.len() != before
                }
                None => false,
            }
        };
        if removed {
            self.notify(collection);
        }
        removed
    }

    /// Simulate losing the backend. Live subscriptions report the failure.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, AtomicOrdering::SeqCst);
        self.notify(ALL_COLLECTIONS);
    }

    fn snapshot(&self, collection: &str, order: Option<&OrderBy>) -> Result<Vec<Document>, StoreError> {
        if self.inner.offline.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Offline);
        }

        let mut docs = self.lock().get(collection).cloned().unwrap_or_default();
        if let Some(order) = order {
            docs.sort_by(|a, b| compare_documents(a, b, order));
        }
        Ok(docs)
    }
}

/// Timestamps of every accepted shape sort as epoch milliseconds, so they
/// compare with each other and with plain numbers.
#[derive(Debug, PartialEq, PartialOrd)]
enum SortValue {
    Number(f64),
    Text(String),
}

fn sort_value(value: &Value) -> Option<SortValue> {
    let instant = || parse_timestamp(value).map(|moment| SortValue::Number(moment.timestamp_millis() as f64));
    match value {
        Value::Number(number) => instant().or_else(|| number.as_f64().map(SortValue::Number)),
        Value::String(text) => instant().or_else(|| Some(SortValue::Text(text.clone()))),
        Value::Object(_) => instant(),
        _ => None,
    }
}

/// Documents without a usable ordering value sort last in either direction.
fn compare_documents(a: &Document, b: &Document, order: &OrderBy) -> Ordering {
    let left = a.get(&order.field).and_then(sort_value);
    let right = b.get(&order.field).and_then(sort_value);
    match (left, right) {
        (Some(left), Some(right)) => {
            let ordering = left.partial_cmp(&right).unwrap_or(Ordering::Equal);
            match order.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.snapshot(collection, None)
    }

    fn subscribe(&self, collection: &str, order: OrderBy) -> Subscription {
        let store = self.clone();
        let collection = collection.to_string();
        // Subscribe to changes before reading so none are missed.
        let mut changes = self.inner.changes.subscribe();

        Subscription::spawn(move |sender| async move {
            loop {
                let snapshot = store.snapshot(&collection, Some(&order));
                let failed = snapshot.is_err();
                if sender.send(snapshot).await.is_err() || failed {
                    return;
                }

                loop {
                    match changes.recv().await {
                        Ok(changed) if changed == collection || changed == ALL_COLLECTIONS => break,
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(_)) => break,
                        Err(broadcast::error::RecvError::Closed) => return,
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(id: &str, created_at: &str) -> Document {
        Document::from_value(id, json!({ "lastName": id, "createdAt": created_at }))
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|doc| doc.id.as_str()).collect()
    }

    #[tokio::test]
    async fn list_returns_documents_in_insertion_order() {
        let store = MemoryDocumentStore::new();
        store.upsert("categories", Document::from_value("b", json!({})));
        store.upsert("categories", Document::from_value("a", json!({})));

        let docs = store.list_documents("categories").await.unwrap();
        assert_eq!(ids(&docs), vec!["b", "a"]);
        assert!(store.list_documents("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscription_orders_by_field_and_follows_changes() {
        let store = MemoryDocumentStore::new();
        store.upsert("clients", client("old", "2024-01-01T00:00:00Z"));
        store.upsert("clients", client("new", "2024-03-01T00:00:00Z"));
        store.upsert("clients", Document::from_value("undated", json!({})));

        let mut subscription = store.subscribe("clients", OrderBy::new("createdAt", Direction::Descending));
        let first = subscription.next().await.unwrap().unwrap();
        assert_eq!(ids(&first), vec!["new", "old", "undated"]);

        store.upsert("clients", client("mid", "2024-02-01T00:00:00Z"));
        let second = subscription.next().await.unwrap().unwrap();
        assert_eq!(ids(&second), vec!["new", "mid", "old", "undated"]);

        assert!(store.remove("clients", "old"));
        let third = subscription.next().await.unwrap().unwrap();
        assert_eq!(ids(&third), vec!["new", "mid", "undated"]);
    }

    #[tokio::test]
    async fn changes_to_other_collections_are_ignored() {
        let store = MemoryDocumentStore::new();
        let mut subscription = store.subscribe("clients", OrderBy::new("createdAt", Direction::Ascending));
        assert!(subscription.next().await.unwrap().unwrap().is_empty());

        store.upsert("categories", Document::from_value("x", json!({})));
        store.upsert("clients", client("c", "2024-01-01"));
        let next = subscription.next().await.unwrap().unwrap();
        assert_eq!(ids(&next), vec!["c"]);
    }

    #[tokio::test]
    async fn upsert_replaces_documents_with_the_same_id() {
        let store = MemoryDocumentStore::new();
        store.upsert("clients", client("a", "2024-01-01"));
        store.upsert("clients", Document::from_value("a", json!({ "lastName": "Ли" })));

        let docs = store.list_documents("clients").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].str_field("lastName"), Some("Ли"));
    }

    #[tokio::test]
    async fn offline_store_fails_listing_and_live_subscriptions() {
        let store = MemoryDocumentStore::new();
        let mut subscription = store.subscribe("clients", OrderBy::new("createdAt", Direction::Descending));
        assert!(subscription.next().await.unwrap().is_ok());

        store.set_offline(true);
        assert!(matches!(
            store.list_documents("categories").await,
            Err(StoreError::Offline)
        ));
        assert!(matches!(
            subscription.next().await,
            Some(Err(StoreError::Offline))
        ));
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn timestamps_of_different_shapes_sort_together() {
        let store = MemoryDocumentStore::new();
        store.upsert("clients", client("jan", "2024-01-01T00:00:00Z"));
        store.upsert(
            "clients",
            Document::from_value("mar", json!({ "createdAt": 1_709_251_200_000_i64 })),
        );
        store.upsert(
            "clients",
            Document::from_value("feb", json!({ "createdAt": { "seconds": 1_706_745_600, "nanoseconds": 0 } })),
        );

        let mut subscription = store.subscribe("clients", OrderBy::new("createdAt", Direction::Descending));
        let docs = subscription.next().await.unwrap().unwrap();
        assert_eq!(ids(&docs), vec!["mar", "feb", "jan"]);
    }

    #[test]
    fn numbers_sort_numerically() {
        let small = Document::from_value("small", json!({ "totalAmount": 2.5 }));
        let large = Document::from_value("large", json!({ "totalAmount": 10 }));
        let order = OrderBy::new("totalAmount", Direction::Ascending);
        assert_eq!(compare_documents(&small, &large, &order), Ordering::Less);
    }

    #[test]
    fn seed_groups_documents_by_collection() {
        let store = MemoryDocumentStore::from_seed(json!({
            "clients": [ { "id": "c1", "lastName": "Ким" } ],
            "categories": [ { "id": "k1" }, { "id": "k2" } ],
        }))
        .unwrap();

        let clients = store.snapshot("clients", None).unwrap();
        assert_eq!(clients[0].str_field("lastName"), Some("Ким"));
        assert_eq!(store.snapshot("categories", None).unwrap().len(), 2);
    }

    #[test]
    fn demo_seed_file_loads_every_client() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/seed.json");
        let store = MemoryDocumentStore::from_seed_file(&path).unwrap();

        assert_eq!(store.snapshot("categories", None).unwrap().len(), 2);
        let order = OrderBy::new("createdAt", Direction::Descending);
        let clients = store.snapshot("clients", Some(&order)).unwrap();
        assert_eq!(ids(&clients), vec!["petrov", "kim", "abaev"]);
        for doc in &clients {
            assert!(doc.timestamp_field("createdAt").is_some(), "{} has no usable createdAt", doc.id);
        }
    }

    #[test]
    fn missing_seed_file_names_the_path() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/absent.json");
        match MemoryDocumentStore::from_seed_file(&path) {
            Err(StoreError::SeedRead { path: reported, .. }) => assert_eq!(reported, path),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("missing seed file was accepted"),
        }
    }

    #[test]
    fn malformed_seed_is_rejected() {
        let result = MemoryDocumentStore::from_seed(json!({ "clients": [ { "lastName": "no id" } ] }));
        assert!(matches!(result, Err(StoreError::SeedFormat(_))));
    }
}
