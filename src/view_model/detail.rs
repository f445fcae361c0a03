//! DetailViewModel - create/edit form for one record.
//!
//! An empty id means create mode, any other id edit mode.

use std::fmt;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::state::StateCell;
use crate::error::Fault;
use crate::record::{Draft, Record};
use crate::repository::{RecordCollection, StorageRepository};

/// What a detail screen renders.
pub struct DetailUiState<R: Record> {
    /// Id being edited; empty in create mode.
    pub record_id: String,
    pub draft: R::Draft,
    /// Record loaded in edit mode.
    pub selected: Option<R>,
    /// One-shot: set by an add completion, reset once consumed.
    pub added_status: bool,
    /// One-shot: set by an update completion, reset once consumed.
    pub updated_status: bool,
}

impl<R: Record> Default for DetailUiState<R> {
    fn default() -> Self {
        Self {
            record_id: String::new(),
            draft: R::Draft::default(),
            selected: None,
            added_status: false,
            updated_status: false,
        }
    }
}

impl<R: Record> Clone for DetailUiState<R> {
    fn clone(&self) -> Self {
        Self {
            record_id: self.record_id.clone(),
            draft: self.draft.clone(),
            selected: self.selected.clone(),
            added_status: self.added_status,
            updated_status: self.updated_status,
        }
    }
}

impl<R: Record + PartialEq> PartialEq for DetailUiState<R> {
    fn eq(&self, other: &Self) -> bool {
        self.record_id == other.record_id
            && self.draft == other.draft
            && self.selected == other.selected
            && self.added_status == other.added_status
            && self.updated_status == other.updated_status
    }
}

impl<R: Record + fmt::Debug> fmt::Debug for DetailUiState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailUiState")
            .field("record_id", &self.record_id)
            .field("draft", &self.draft)
            .field("selected", &self.selected)
            .field("added_status", &self.added_status)
            .field("updated_status", &self.updated_status)
            .finish()
    }
}

/// Owns the form state of one detail screen.
///
/// Writes run to completion even if the view-model is dropped first; their
/// results are then discarded.
pub struct DetailViewModel<R: Record> {
    repository: StorageRepository,
    records: RecordCollection<R>,
    state: StateCell<DetailUiState<R>>,
}

impl<R: Record> DetailViewModel<R> {
    pub fn new(repository: StorageRepository) -> Self {
        let records = repository.collection::<R>();
        Self {
            repository,
            records,
            state: StateCell::new(DetailUiState::default()),
        }
    }

    pub fn state(&self) -> DetailUiState<R> {
        self.state.snapshot()
    }

    pub fn watch(&self) -> watch::Receiver<DetailUiState<R>> {
        self.state.watch()
    }

    /// Enter edit mode for `id`, or create mode when `id` is empty.
    ///
    /// Edit mode fetches the record and fills the form; the returned
    /// handle completes once it has been applied.
    pub fn open(&self, id: &str) -> Option<JoinHandle<()>> {
        if id.is_empty() {
            self.reset_state();
            return None;
        }

        self.state.replace(|_| DetailUiState {
            record_id: id.to_string(),
            ..DetailUiState::default()
        });

        let records = self.records.clone();
        let state = self.state.downgrade();
        let id = id.to_string();

        Some(tokio::spawn(async move {
            match records.get_record_by_id(&id).await {
                Ok(Some(record)) => {
                    state.replace(|current| {
                        // A later open() wins over a slow fetch.
                        if current.record_id != id {
                            return current.clone();
                        }
                        DetailUiState {
                            draft: R::Draft::from_record(&record),
                            selected: Some(record),
                            ..current.clone()
                        }
                    });
                }
                Ok(None) => {
                    tracing::warn!(collection = records.name(), id = %id, "record not found");
                }
                Err(fault) => {
                    tracing::warn!(id = %id, error = %fault, "record fetch failed");
                }
            }
        }))
    }

    /// Replace the form with a copy edited by `edit`.
    pub fn edit<F>(&self, edit: F)
    where
        F: FnOnce(&mut R::Draft),
    {
        self.state.replace(|current| {
            let mut draft = current.draft.clone();
            edit(&mut draft);
            DetailUiState {
                draft,
                ..current.clone()
            }
        });
    }

    /// Whether every required field is filled in.
    pub fn can_submit(&self) -> bool {
        self.state.snapshot().draft.is_complete()
    }

    /// Add (create mode) or update (edit mode) the record.
    ///
    /// Returns `None` without touching the store when the form is
    /// incomplete or, in create mode, when nobody is signed in.
    pub fn submit(&self) -> Option<JoinHandle<()>> {
        let snapshot = self.state.snapshot();
        if !snapshot.draft.is_complete() {
            tracing::debug!(collection = self.records.name(), "submit ignored: form incomplete");
            return None;
        }

        let records = self.records.clone();
        let state = self.state.downgrade();

        if snapshot.record_id.is_empty() {
            let owner_id = self.repository.current_user_id();
            if owner_id.is_empty() {
                tracing::warn!(
                    collection = self.records.name(),
                    error = %Fault::not_authenticated(),
                    "submit refused"
                );
                return None;
            }

            Some(tokio::spawn(async move {
                let added = records.add_record(&owner_id, snapshot.draft).await;
                state.replace(|current| DetailUiState {
                    added_status: added,
                    ..current.clone()
                });
            }))
        } else {
            let fields = snapshot.draft.to_fields();
            let id = snapshot.record_id;

            Some(tokio::spawn(async move {
                let updated = records.update_record(&id, fields).await;
                state.replace(|current| DetailUiState {
                    updated_status: updated,
                    ..current.clone()
                });
            }))
        }
    }

    pub fn reset_added_status(&self) {
        self.state.replace(|current| DetailUiState {
            added_status: false,
            ..current.clone()
        });
    }

    pub fn reset_updated_status(&self) {
        self.state.replace(|current| DetailUiState {
            updated_status: false,
            ..current.clone()
        });
    }

    /// Back to a blank create-mode form.
    pub fn reset_state(&self) {
        self.state.replace(|_| DetailUiState::default());
    }
}
