//! ListenerRegistration - handle that detaches a live query listener.

use std::fmt;

type Removal = Box<dyn FnOnce() + Send>;

/// Detaches a live query listener.
///
/// The removal runs at most once: on the first `remove()` call or when the
/// registration is dropped, whichever comes first.
pub struct ListenerRegistration {
    removal: Option<Removal>,
}

impl ListenerRegistration {
    pub fn new<F>(removal: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            removal: Some(Box::new(removal)),
        }
    }

    /// A registration with nothing to detach.
    pub fn noop() -> Self {
        Self { removal: None }
    }

    pub fn remove(&mut self) {
        if let Some(removal) = self.removal.take() {
            removal();
        }
    }

    pub fn is_removed(&self) -> bool {
        self.removal.is_none()
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for ListenerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistration")
            .field("removed", &self.is_removed())
            .finish()
    }
}
