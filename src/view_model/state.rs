//! StateCell - single-owner UI state replaced wholesale on every change.

use std::sync::{Arc, Weak};

use tokio::sync::watch;

pub(crate) struct StateCell<S> {
    sender: Arc<watch::Sender<S>>,
}

impl<S: Clone> StateCell<S> {
    pub(crate) fn new(initial: S) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub(crate) fn snapshot(&self) -> S {
        self.sender.borrow().clone()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<S> {
        self.sender.subscribe()
    }

    /// Swap in the value `next` derives from the current one.
    pub(crate) fn replace<F>(&self, next: F)
    where
        F: FnOnce(&S) -> S,
    {
        replace(&self.sender, next);
    }

    pub(crate) fn downgrade(&self) -> WeakState<S> {
        WeakState {
            sender: Arc::downgrade(&self.sender),
        }
    }
}

/// Handle held by background tasks; goes dead with the view-model.
pub(crate) struct WeakState<S> {
    sender: Weak<watch::Sender<S>>,
}

impl<S: Clone> WeakState<S> {
    /// Returns `false` when the owning view-model is gone.
    pub(crate) fn replace<F>(&self, next: F) -> bool
    where
        F: FnOnce(&S) -> S,
    {
        match self.sender.upgrade() {
            Some(sender) => {
                replace(&sender, next);
                true
            }
            None => false,
        }
    }
}

// Derive and swap under the channel's write lock.
fn replace<S: Clone, F: FnOnce(&S) -> S>(sender: &watch::Sender<S>, next: F) {
    sender.send_modify(|state| {
        let value = next(state);
        *state = value;
    });
}
