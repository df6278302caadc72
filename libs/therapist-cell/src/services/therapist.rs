use reqwest::Method;
use tracing::{debug, instrument, warn};

use shared_backend::BackendClient;
use shared_config::AppConfig;

use crate::models::{Therapist, TherapistError};

pub struct TherapistService {
    backend: BackendClient,
}

impl TherapistService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            backend: BackendClient::new(config),
        }
    }

    pub fn with_client(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Get therapist by ID. The lookup is public and sends no credentials.
    #[instrument(skip(self))]
    pub async fn get_therapist(&self, therapist_id: &str) -> Result<Therapist, TherapistError> {
        let therapist_id = therapist_id.trim();
        if therapist_id.is_empty() {
            return Err(TherapistError::InvalidId);
        }

        debug!("Fetching therapist profile: {}", therapist_id);

        let path = format!("/api/therapists/{}", urlencoding::encode(therapist_id));
        let therapist: Therapist = self
            .backend
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| {
                warn!("Therapist lookup for {} failed: {}", therapist_id, e);
                TherapistError::from(e)
            })?;

        debug!("Fetched therapist {}", therapist.name);
        Ok(therapist)
    }
}
