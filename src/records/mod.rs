//! Records - the entity types the application stores.
//!
//! | Type | Collection | Ordered by |
//! |---|---|---|
//! | [`Exam`] | `examenes` | `timestamp` |
//! | [`Purchase`] | `compras` | `producto` |
//! | [`CollegeTask`] | `tareasFacultad` | - |

mod coursework;
mod purchase;

pub use coursework::{CollegeTask, CollegeTaskDraft, Exam, ExamDraft};
pub use purchase::{Purchase, PurchaseDraft};
