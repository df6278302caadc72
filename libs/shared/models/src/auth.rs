use std::fmt;
use serde::{Deserialize, Serialize};

/// Bearer credential for the current client session.
///
/// Passed explicitly into every service that talks to the backend instead of
/// being looked up from process-wide storage.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: Some(token.into()) }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn from_token(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Value for the `Authorization` header. An empty session still sends a
    /// header, with the literal `null` the browser client produced.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.token.as_deref().unwrap_or("null"))
    }
}

// Keep tokens out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Identity of the signed-in user as returned by `/api/users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub name: String,
    pub email: String,
}
