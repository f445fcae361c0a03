//! Exams and college tasks share one shape: a subject, a description and
//! a due date split into date, weekday and time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::record::{all_filled, Draft, NewRecord, Record};
use crate::store::Fields;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Record)]
#[record(collection = "examenes", order_by = "timestamp", draft = ExamDraft)]
#[serde(default, rename_all = "camelCase")]
pub struct Exam {
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub materia: String,
    pub description: String,
    pub fecha: String,
    pub dia: String,
    pub hora: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub color_index: i32,
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Record)]
#[record(collection = "tareasFacultad", draft = CollegeTaskDraft)]
#[serde(default, rename_all = "camelCase")]
pub struct CollegeTask {
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub materia: String,
    pub description: String,
    pub fecha: String,
    pub dia: String,
    pub hora: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub color_index: i32,
    pub document_id: String,
}

macro_rules! coursework_draft {
    ($draft:ident, $record:ident) => {
        /// Editable fields of a
        #[doc = concat!("[`", stringify!($record), "`].")]
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $draft {
            pub materia: String,
            pub description: String,
            pub fecha: String,
            pub dia: String,
            pub hora: String,
            pub color_index: i32,
        }

        impl Draft for $draft {
            type Record = $record;

            fn from_record(record: &$record) -> Self {
                Self {
                    materia: record.materia.clone(),
                    description: record.description.clone(),
                    fecha: record.fecha.clone(),
                    dia: record.dia.clone(),
                    hora: record.hora.clone(),
                    color_index: record.color_index,
                }
            }

            fn is_complete(&self) -> bool {
                all_filled(&[
                    &self.materia,
                    &self.description,
                    &self.fecha,
                    &self.dia,
                    &self.hora,
                ])
            }

            fn into_record(self, identity: NewRecord) -> $record {
                $record {
                    owner_id: identity.owner_id,
                    materia: self.materia,
                    description: self.description,
                    fecha: self.fecha,
                    dia: self.dia,
                    hora: self.hora,
                    timestamp: identity.created_at,
                    color_index: self.color_index,
                    document_id: identity.document_id,
                }
            }

            fn to_fields(&self) -> Fields {
                let mut fields = Fields::new();
                fields.insert("colorIndex".into(), json!(self.color_index));
                fields.insert("description".into(), Value::from(self.description.as_str()));
                fields.insert("materia".into(), Value::from(self.materia.as_str()));
                fields.insert("fecha".into(), Value::from(self.fecha.as_str()));
                fields.insert("dia".into(), Value::from(self.dia.as_str()));
                fields.insert("hora".into(), Value::from(self.hora.as_str()));
                fields
            }
        }
    };
}

coursework_draft!(ExamDraft, Exam);
coursework_draft!(CollegeTaskDraft, CollegeTask);
