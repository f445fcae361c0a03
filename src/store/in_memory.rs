//! InMemoryDocumentStore - HashMap-backed document store for testing and development.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use super::{DocumentStore, Fields, ListenerRegistration, Query, SnapshotListener};
use crate::error::StoreError;

/// Store operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Set,
    Update,
    Delete,
    /// Registration of a live query.
    Listen,
    /// The next initial snapshot of a live query: the listener stays
    /// registered but receives the error instead of its first result.
    Snapshot,
}

struct RegisteredListener {
    collection: String,
    query: Query,
    callback: SnapshotListener,
}

#[derive(Default)]
struct Faults {
    offline: bool,
    next: HashMap<StoreOp, StoreError>,
}

/// In-memory document store.
///
/// Storage key is `"collection:id"`. Clone-friendly via Arc: clones share
/// documents and listeners. Listeners are called synchronously on the
/// writing thread, after the write lock has been released.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    storage: Arc<RwLock<HashMap<String, Fields>>>,
    listeners: Arc<Mutex<HashMap<u64, RegisteredListener>>>,
    faults: Arc<Mutex<Faults>>,
    next_listener: Arc<AtomicU64>,
    removals: Arc<AtomicUsize>,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            faults: Arc::new(Mutex::new(Faults::default())),
            next_listener: Arc::new(AtomicU64::new(1)),
            removals: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn make_key(collection: &str, id: &str) -> String {
        format!("{}:{}", collection, id)
    }

    /// Make the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.next.insert(op, error);
        }
    }

    /// While offline every operation fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.offline = offline;
        }
    }

    /// Deliver `error` to every listener on `collection`, as a remote
    /// fault would.
    pub fn push_fault(&self, collection: &str, error: StoreError) {
        for (_, callback) in self.listeners_for(collection) {
            callback(Err(error.clone()));
        }
    }

    /// Number of listeners currently registered.
    pub fn active_listeners(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Number of listener removals performed so far.
    pub fn listener_removals(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }

    /// Number of documents stored in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        let prefix = format!("{}:", collection);
        self.storage
            .read()
            .map(|s| s.keys().filter(|k| k.starts_with(&prefix)).count())
            .unwrap_or(0)
    }

    fn check(&self, op: StoreOp) -> Result<(), StoreError> {
        let mut faults = self
            .faults
            .lock()
            .map_err(|_| StoreError::LockPoisoned("fault check"))?;
        if faults.offline {
            return Err(StoreError::Unavailable("store is offline".into()));
        }
        match faults.next.remove(&op) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn take_queued(&self, op: StoreOp) -> Option<StoreError> {
        self.faults.lock().ok().and_then(|mut faults| faults.next.remove(&op))
    }

    fn listeners_for(&self, collection: &str) -> Vec<(Query, SnapshotListener)> {
        match self.listeners.lock() {
            Ok(listeners) => listeners
                .values()
                .filter(|l| l.collection == collection)
                .map(|l| (l.query.clone(), Arc::clone(&l.callback)))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn run_query(&self, collection: &str, query: &Query) -> Result<Vec<Fields>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("query"))?;

        let prefix = format!("{}:", collection);
        let mut results: Vec<(&str, &Fields)> = storage
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .filter(|(_, fields)| query.matches(fields))
            .filter(|(_, fields)| match &query.order_by {
                // Ordered queries skip documents lacking the ordering field.
                Some(field) => fields.contains_key(field),
                None => true,
            })
            .map(|(key, fields)| (&key[prefix.len()..], fields))
            .collect();

        results.sort_by(|(a_id, a), (b_id, b)| {
            let by_field = match &query.order_by {
                Some(field) => compare_values(a.get(field), b.get(field)),
                None => CmpOrdering::Equal,
            };
            by_field.then_with(|| a_id.cmp(b_id))
        });

        Ok(results.into_iter().map(|(_, fields)| fields.clone()).collect())
    }

    /// Push a fresh snapshot to every listener whose result set the write
    /// from `before` to `after` can change.
    fn notify(&self, collection: &str, before: Option<&Fields>, after: Option<&Fields>) {
        let touches = |query: &Query| {
            before.is_some_and(|fields| query.matches(fields))
                || after.is_some_and(|fields| query.matches(fields))
        };
        let listeners: Vec<_> = self
            .listeners_for(collection)
            .into_iter()
            .filter(|(query, _)| touches(query))
            .collect();
        if listeners.is_empty() {
            return;
        }
        tracing::trace!(collection, listeners = listeners.len(), "fanning out snapshot");
        for (query, callback) in listeners {
            callback(self.run_query(collection, &query));
        }
    }
}

/// Ascending order over JSON scalars: null < bool < number < string.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> CmpOrdering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(CmpOrdering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn new_document_id(&self, _collection: &str) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Fields>, StoreError> {
        self.check(StoreOp::Get)?;
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("get"))?;
        Ok(storage.get(&Self::make_key(collection, id)).cloned())
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.check(StoreOp::Set)?;
        let before = {
            let mut storage = self
                .storage
                .write()
                .map_err(|_| StoreError::LockPoisoned("set"))?;
            storage.insert(Self::make_key(collection, id), fields.clone())
        };
        self.notify(collection, before.as_ref(), Some(&fields));
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.check(StoreOp::Update)?;
        let (before, after) = {
            let mut storage = self
                .storage
                .write()
                .map_err(|_| StoreError::LockPoisoned("update"))?;
            let existing = storage
                .get_mut(&Self::make_key(collection, id))
                .ok_or_else(|| StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })?;
            let before = existing.clone();
            for (field, value) in fields {
                existing.insert(field, value);
            }
            (before, existing.clone())
        };
        self.notify(collection, Some(&before), Some(&after));
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check(StoreOp::Delete)?;
        let removed = {
            let mut storage = self
                .storage
                .write()
                .map_err(|_| StoreError::LockPoisoned("delete"))?;
            storage.remove(&Self::make_key(collection, id))
        };
        if let Some(before) = removed {
            self.notify(collection, Some(&before), None);
        }
        Ok(())
    }

    fn listen(
        &self,
        collection: &str,
        query: Query,
        listener: SnapshotListener,
    ) -> Result<ListenerRegistration, StoreError> {
        self.check(StoreOp::Listen)?;

        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        {
            let mut listeners = self
                .listeners
                .lock()
                .map_err(|_| StoreError::LockPoisoned("listen"))?;
            listeners.insert(
                id,
                RegisteredListener {
                    collection: collection.to_string(),
                    query: query.clone(),
                    callback: Arc::clone(&listener),
                },
            );
        }

        let initial = match self.take_queued(StoreOp::Snapshot) {
            Some(error) => Err(error),
            None => self.run_query(collection, &query),
        };
        listener(initial);

        let listeners = Arc::clone(&self.listeners);
        let removals = Arc::clone(&self.removals);
        Ok(ListenerRegistration::new(move || {
            if let Ok(mut listeners) = listeners.lock() {
                listeners.remove(&id);
            }
            removals.fetch_add(1, Ordering::SeqCst);
        }))
    }
}
