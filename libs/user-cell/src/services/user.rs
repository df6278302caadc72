use reqwest::Method;
use tracing::{debug, instrument, warn};

use shared_backend::BackendClient;
use shared_config::AppConfig;
use shared_models::auth::{CurrentUser, Session};

use crate::models::UserError;

pub struct UserService {
    backend: BackendClient,
}

impl UserService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::new(config),
        }
    }

    pub fn with_client(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Resolve the identity behind the session's bearer token.
    #[instrument(skip(self, session))]
    pub async fn current_user(&self, session: &Session) -> Result<CurrentUser, UserError> {
        if !session.is_authenticated() {
            warn!("Looking up current user without a session token");
        }

        let user: CurrentUser = self
            .backend
            .request(Method::GET, "/api/users/me", Some(session), None)
            .await
            .map_err(|e| {
                warn!("Current user lookup failed: {}", e);
                UserError::from(e)
            })?;

        debug!("Session belongs to {}", user.email);
        Ok(user)
    }
}
