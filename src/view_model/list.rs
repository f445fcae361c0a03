//! ListViewModel - a screen listing the signed-in user's records.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::state::{StateCell, WeakState};
use crate::error::Fault;
use crate::record::Record;
use crate::repository::{RecordCollection, StorageRepository, SubscriptionHandle};
use crate::resources::Resources;

/// What a list screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ListUiState<R> {
    pub records: Resources<Vec<R>>,
    /// One-shot: set by a delete completion, reset once consumed.
    pub deleted_status: bool,
}

impl<R> Default for ListUiState<R> {
    fn default() -> Self {
        Self {
            records: Resources::Loading,
            deleted_status: false,
        }
    }
}

struct ActiveSubscription {
    handle: SubscriptionHandle,
    // Closed under lock before the listener goes away; the merge loop
    // checks it under the same lock.
    open: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl ActiveSubscription {
    fn close(self) {
        *self.open.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.handle.cancel();
        self.task.abort();
    }
}

/// Owns the list state and at most one live subscription.
///
/// Must be used inside a tokio runtime. Dropping the view-model tears the
/// subscription down.
pub struct ListViewModel<R: Record> {
    repository: StorageRepository,
    records: RecordCollection<R>,
    state: StateCell<ListUiState<R>>,
    active: Option<ActiveSubscription>,
}

impl<R: Record> ListViewModel<R> {
    pub fn new(repository: StorageRepository) -> Self {
        let records = repository.collection::<R>();
        Self {
            repository,
            records,
            state: StateCell::new(ListUiState::default()),
            active: None,
        }
    }

    pub fn state(&self) -> ListUiState<R> {
        self.state.snapshot()
    }

    /// Receiver notified on every state replacement.
    pub fn watch(&self) -> watch::Receiver<ListUiState<R>> {
        self.state.watch()
    }

    pub fn has_user(&self) -> bool {
        self.repository.has_user()
    }

    pub fn is_subscribed(&self) -> bool {
        self.active.is_some()
    }

    /// Start (or restart) the live list for the signed-in user.
    ///
    /// Signed out: the list becomes a "not authenticated" error and no
    /// subscription is opened.
    pub fn load(&mut self) {
        self.teardown();

        let user_id = self.repository.current_user_id();
        if user_id.is_empty() {
            tracing::debug!(collection = self.records.name(), "no signed-in user");
            self.state.replace(|current| ListUiState {
                records: Resources::error(Fault::not_authenticated()),
                ..current.clone()
            });
            return;
        }

        self.state.replace(|current| ListUiState {
            records: Resources::Loading,
            ..current.clone()
        });

        let mut subscription = self.records.subscribe_user_records(&user_id);
        let handle = subscription.handle();
        let open = Arc::new(Mutex::new(true));
        let gate = Arc::clone(&open);
        let state = self.state.downgrade();

        let task = tokio::spawn(async move {
            while let Some(resources) = subscription.next().await {
                if !merge_records(&gate, &state, resources) {
                    break;
                }
            }
        });

        self.active = Some(ActiveSubscription { handle, open, task });
    }

    /// Delete `id`; the completion lands in `deleted_status`.
    pub fn delete(&self, id: &str) -> JoinHandle<()> {
        let records = self.records.clone();
        let state = self.state.downgrade();
        let id = id.to_string();

        tokio::spawn(async move {
            let deleted = records.delete_record(&id).await;
            state.replace(|current| ListUiState {
                deleted_status: deleted,
                ..current.clone()
            });
        })
    }

    pub fn reset_deleted_status(&self) {
        self.state.replace(|current| ListUiState {
            deleted_status: false,
            ..current.clone()
        });
    }

    /// Ends the session. The live list keeps running until `teardown`.
    pub fn sign_out(&self) {
        self.repository.sign_out();
    }

    /// Release the live subscription. No emission is merged afterwards.
    pub fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::debug!(collection = self.records.name(), "tearing down list");
            active.close();
        }
    }
}

/// Replace the list with `resources` unless the subscription was closed or
/// the view-model is gone. Returns whether delivery should continue.
fn merge_records<R: Record>(
    open: &Mutex<bool>,
    state: &WeakState<ListUiState<R>>,
    resources: Resources<Vec<R>>,
) -> bool {
    let open = open.lock().unwrap_or_else(PoisonError::into_inner);
    if !*open {
        return false;
    }
    state.replace(|current| ListUiState {
        records: resources,
        ..current.clone()
    })
}

impl<R: Record> Drop for ListViewModel<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
