/// Session identity lookup. Consulted once per `start()`; a `None` user means
/// no session and subscriptions are not opened.
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Fixed identity, useful where the session user is known up front.
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { user_id: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}
