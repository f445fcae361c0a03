//! Auth - the authentication provider seam.

use std::sync::{Arc, RwLock};

/// Source of the signed-in identity.
pub trait AuthProvider: Send + Sync {
    /// Id of the signed-in user, `None` when signed out.
    fn current_user_id(&self) -> Option<String>;

    /// Invalidate the current session.
    fn sign_out(&self);
}

/// Auth provider holding the session in memory.
#[derive(Clone, Default)]
pub struct InMemoryAuth {
    user: Arc<RwLock<Option<String>>>,
}

impl InMemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `user_id` already signed in.
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        let auth = Self::new();
        auth.sign_in(user_id);
        auth
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        if let Ok(mut user) = self.user.write() {
            *user = Some(user_id.into());
        }
    }
}

impl AuthProvider for InMemoryAuth {
    fn current_user_id(&self) -> Option<String> {
        self.user.read().ok().and_then(|user| user.clone())
    }

    fn sign_out(&self) {
        if let Ok(mut user) = self.user.write() {
            *user = None;
        }
    }
}
