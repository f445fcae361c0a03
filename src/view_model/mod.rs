//! View-models - bridge repository streams into immutable screen state.
//!
//! Each view-model is the single owner of its screen's state. Every change
//! replaces the whole snapshot, and screens observe it through a tokio
//! `watch` receiver.

mod detail;
mod list;
mod state;

pub use detail::{DetailUiState, DetailViewModel};
pub use list::{ListUiState, ListViewModel};
