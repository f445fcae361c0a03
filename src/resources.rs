//! Resources - Loading / Success / Error tag for asynchronous outcomes.

use crate::error::Fault;

/// Outcome of an asynchronous read, as seen by a screen.
///
/// Exactly one tag is active at a time. `data` exists only under `Success`
/// and the cause only under `Error`. Transitions are not defined here: a
/// repository emits a fresh value for every store event.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Resources<T> {
    #[default]
    Loading,
    Success(Option<T>),
    Error(Option<Fault>),
}

impl<T> Resources<T> {
    pub fn success(data: T) -> Self {
        Resources::Success(Some(data))
    }

    pub fn error(fault: Fault) -> Self {
        Resources::Error(Some(fault))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Resources::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Resources::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Resources::Error(_))
    }

    /// Payload of a `Success`; `None` for every other tag.
    pub fn data(&self) -> Option<&T> {
        match self {
            Resources::Success(data) => data.as_ref(),
            _ => None,
        }
    }

    /// Cause of an `Error`; `None` for every other tag.
    pub fn cause(&self) -> Option<&Fault> {
        match self {
            Resources::Error(cause) => cause.as_ref(),
            _ => None,
        }
    }

    /// Text a list screen shows in place of content.
    pub fn error_message(&self) -> Option<String> {
        match self {
            Resources::Error(Some(fault)) => Some(fault.to_string()),
            Resources::Error(None) => Some("unknown error".to_string()),
            _ => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> Resources<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Resources::Loading => Resources::Loading,
            Resources::Success(data) => Resources::Success(data.map(f)),
            Resources::Error(cause) => Resources::Error(cause),
        }
    }
}

impl<T> From<Result<T, Fault>> for Resources<T> {
    fn from(result: Result<T, Fault>) -> Self {
        match result {
            Ok(data) => Resources::success(data),
            Err(fault) => Resources::error(fault),
        }
    }
}
