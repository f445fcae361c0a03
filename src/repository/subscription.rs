//! Subscription - a live query exposed as a cancelable stream.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::future::poll_fn;
use futures::task::AtomicWaker;
use futures::Stream;
use tokio::sync::mpsc;

use crate::resources::Resources;
use crate::store::ListenerRegistration;

struct Shared {
    collection: String,
    cancelled: AtomicBool,
    registration: Mutex<Option<ListenerRegistration>>,
    waker: AtomicWaker,
}

/// Cloneable cancel handle for a [`Subscription`].
#[derive(Clone)]
pub struct SubscriptionHandle {
    shared: Arc<Shared>,
}

impl SubscriptionHandle {
    pub(crate) fn new(collection: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                collection: collection.into(),
                cancelled: AtomicBool::new(false),
                registration: Mutex::new(None),
                waker: AtomicWaker::new(),
            }),
        }
    }

    /// Stop delivery and release the store listener.
    ///
    /// The listener is removed exactly once no matter how often this is
    /// called. Nothing is yielded by the subscription afterwards.
    pub fn cancel(&self) {
        if self.shared.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let registration = match self.shared.registration.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(mut registration) = registration {
            registration.remove();
        }
        // Release a consumer parked on the channel.
        self.shared.waker.wake();
        tracing::debug!(collection = %self.shared.collection, "subscription cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn attach(&self, registration: ListenerRegistration) {
        let mut registration = registration;
        if self.is_cancelled() {
            registration.remove();
            return;
        }
        match self.shared.registration.lock() {
            Ok(mut slot) => *slot = Some(registration),
            Err(poisoned) => *poisoned.into_inner() = Some(registration),
        }
    }
}

/// Infinite sequence of values pushed by a live query.
///
/// Stays open until cancelled or dropped; dropping cancels.
pub struct Subscription<T> {
    receiver: mpsc::UnboundedReceiver<Resources<T>>,
    handle: SubscriptionHandle,
    // Keeps the stream open when setup failed and no listener owns a sender.
    _keepalive: Option<mpsc::UnboundedSender<Resources<T>>>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        receiver: mpsc::UnboundedReceiver<Resources<T>>,
        handle: SubscriptionHandle,
        keepalive: Option<mpsc::UnboundedSender<Resources<T>>>,
    ) -> Self {
        Self {
            receiver,
            handle,
            _keepalive: keepalive,
        }
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// Wait for the next value. `None` once cancelled, including when the
    /// cancel comes from another handle while this call is waiting.
    pub async fn next(&mut self) -> Option<Resources<T>> {
        poll_fn(|cx| self.poll_item(cx)).await
    }

    fn poll_item(&mut self, cx: &mut Context<'_>) -> Poll<Option<Resources<T>>> {
        // Register before checking the flag so a concurrent cancel is not missed.
        self.handle.shared.waker.register(cx.waker());
        if self.is_cancelled() {
            return Poll::Ready(None);
        }
        match self.receiver.poll_recv(cx) {
            Poll::Ready(Some(_)) if self.is_cancelled() => Poll::Ready(None),
            other => other,
        }
    }

    /// Take a value that has already been delivered, without waiting.
    pub fn try_next(&mut self) -> Option<Resources<T>> {
        if self.is_cancelled() {
            return None;
        }
        self.receiver.try_recv().ok()
    }
}

impl<T> Unpin for Subscription<T> {}

impl<T> Stream for Subscription<T> {
    type Item = Resources<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_item(cx)
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}
