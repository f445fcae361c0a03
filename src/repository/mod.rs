//! StorageRepository - the only place that talks to the store and auth.
//!
//! It translates live-query callbacks into [`Resources`] streams and turns
//! every store failure into a value: a `Resources::Error` for reads, a
//! `false` completion for writes.
//!
//! ## Example
//!
//! ```ignore
//! let repo = StorageRepository::new(Arc::new(store), Arc::new(auth));
//! let exams = repo.collection::<Exam>();
//!
//! let mut subscription = exams.subscribe_user_records(&repo.current_user_id());
//! while let Some(resources) = subscription.next().await {
//!     render(resources);
//! }
//! ```

mod subscription;

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use crate::auth::AuthProvider;
use crate::config::{CollectionNames, Config};
use crate::error::{Fault, Operation, StoreError};
use crate::record::{Draft, NewRecord, Record};
use crate::resources::Resources;
use crate::store::{DocumentStore, Fields, Query, SnapshotListener};

pub use subscription::{Subscription, SubscriptionHandle};

/// Entry point to every collection, with the signed-in identity.
#[derive(Clone)]
pub struct StorageRepository {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    collections: CollectionNames,
}

impl StorageRepository {
    pub fn new(store: Arc<dyn DocumentStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            store,
            auth,
            collections: CollectionNames::default(),
        }
    }

    pub fn from_config(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        config: &Config,
    ) -> Self {
        Self::new(store, auth).with_collections(config.collections.clone())
    }

    pub fn with_collections(mut self, collections: CollectionNames) -> Self {
        self.collections = collections;
        self
    }

    /// Typed access to the collection backing `R`.
    pub fn collection<R: Record>(&self) -> RecordCollection<R> {
        RecordCollection {
            store: Arc::clone(&self.store),
            name: self.collections.resolve::<R>().to_string(),
            _marker: PhantomData,
        }
    }

    /// Signed-in user id, or an empty string when signed out.
    pub fn current_user_id(&self) -> String {
        self.auth.current_user_id().unwrap_or_default()
    }

    pub fn has_user(&self) -> bool {
        self.auth.current_user_id().is_some()
    }

    /// Ends the session. Open subscriptions are left running; their owners
    /// must tear them down.
    pub fn sign_out(&self) {
        tracing::debug!("signing out");
        self.auth.sign_out();
    }
}

/// CRUD and live queries over the collection backing `R`.
pub struct RecordCollection<R> {
    store: Arc<dyn DocumentStore>,
    name: String,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Clone for RecordCollection<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R: Record> RecordCollection<R> {
    /// Store collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Live list of the records owned by `owner_id`.
    ///
    /// Every snapshot the store pushes (initial load, local or remote
    /// write) yields one `Success` with the full matching list; every
    /// store fault yields one `Error` and the stream stays open. A failed
    /// registration yields a single `Error`.
    pub fn subscribe_user_records(&self, owner_id: &str) -> Subscription<Vec<R>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = SubscriptionHandle::new(self.name.clone());

        let query = Query::owned_by(R::OWNER_FIELD, owner_id).order_by(R::ORDER_BY);
        let listener = self.snapshot_listener(sender.clone(), handle.clone());

        tracing::debug!(collection = %self.name, owner_id, "opening live query");
        match self.store.listen(&self.name, query, listener) {
            Ok(registration) => {
                handle.attach(registration);
                Subscription::new(receiver, handle, None)
            }
            Err(err) => {
                tracing::warn!(collection = %self.name, error = %err, "live query setup failed");
                let _ = sender.send(Resources::error(Fault::subscription(&self.name, err)));
                Subscription::new(receiver, handle, Some(sender))
            }
        }
    }

    fn snapshot_listener(
        &self,
        sender: mpsc::UnboundedSender<Resources<Vec<R>>>,
        handle: SubscriptionHandle,
    ) -> SnapshotListener {
        let collection = self.name.clone();
        Arc::new(move |snapshot: Result<Vec<Fields>, StoreError>| {
            if handle.is_cancelled() {
                return;
            }
            let resources: Resources<Vec<R>> = match snapshot {
                Ok(documents) => documents
                    .into_iter()
                    .map(R::from_fields)
                    .collect::<Result<Vec<R>, _>>()
                    .map_err(|err| Fault::subscription(&collection, err))
                    .into(),
                Err(err) => {
                    tracing::warn!(collection = %collection, error = %err, "live query fault");
                    Resources::error(Fault::subscription(&collection, err))
                }
            };
            // A closed receiver means the subscriber is gone.
            let _ = sender.send(resources);
        })
    }

    /// Fetch one record. `Ok(None)` when it does not exist.
    pub async fn get_record_by_id(&self, id: &str) -> Result<Option<R>, Fault> {
        let fields = self
            .store
            .get(&self.name, id)
            .await
            .map_err(|err| Fault::operation(Operation::Get, &self.name, err))?;

        fields
            .map(R::from_fields)
            .transpose()
            .map_err(|err| Fault::operation(Operation::Get, &self.name, err))
    }

    /// Create a record owned by `owner_id` under a fresh client-generated
    /// id. Fields are not validated here. Returns the store's
    /// acknowledgement.
    pub async fn add_record(&self, owner_id: &str, draft: R::Draft) -> bool {
        let document_id = self.store.new_document_id(&self.name);
        let record = draft.into_record(NewRecord {
            owner_id: owner_id.to_string(),
            document_id: document_id.clone(),
            created_at: Utc::now(),
        });

        let result = match record.to_fields() {
            Ok(fields) => self.store.set(&self.name, &document_id, fields).await,
            Err(err) => Err(err),
        };
        self.acknowledge(Operation::Add, &document_id, result)
    }

    /// Merge `fields` into record `id`; unlisted fields keep their values.
    pub async fn update_record(&self, id: &str, fields: Fields) -> bool {
        let result = self.store.update(&self.name, id, fields).await;
        self.acknowledge(Operation::Update, id, result)
    }

    /// Delete record `id`. Succeeds when the record does not exist.
    pub async fn delete_record(&self, id: &str) -> bool {
        let result = self.store.delete(&self.name, id).await;
        self.acknowledge(Operation::Delete, id, result)
    }

    fn acknowledge(
        &self,
        operation: Operation,
        id: &str,
        result: Result<(), StoreError>,
    ) -> bool {
        match result {
            Ok(()) => {
                tracing::debug!(collection = %self.name, %operation, id, "write acknowledged");
                true
            }
            Err(err) => {
                let fault = Fault::operation(operation, &self.name, err);
                tracing::warn!(id, error = %fault, "write failed");
                false
            }
        }
    }
}
