// Lets `#[derive(Record)]` expand to `tareas::Record` inside this crate too.
extern crate self as tareas;

mod auth;
mod config;
mod error;
pub mod logging;
mod record;
pub mod records;
mod repository;
mod resources;
pub mod store;
mod view_model;

pub use auth::{AuthProvider, InMemoryAuth};
pub use config::{CollectionNames, Config, ConfigError, LoggingConfig};
pub use error::{Fault, Operation, StoreError};
pub use record::{all_filled, Draft, NewRecord, Record};
pub use records::{CollegeTask, CollegeTaskDraft, Exam, ExamDraft, Purchase, PurchaseDraft};
pub use repository::{RecordCollection, StorageRepository, Subscription, SubscriptionHandle};
pub use resources::Resources;
pub use store::{
    DocumentStore, Fields, InMemoryDocumentStore, ListenerRegistration, Query, SnapshotListener,
    StoreOp,
};
pub use view_model::{DetailUiState, DetailViewModel, ListUiState, ListViewModel};
