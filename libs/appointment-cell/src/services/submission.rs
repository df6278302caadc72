use reqwest::Method;
use tracing::{debug, error, instrument};

use shared_backend::{ApiError, BackendClient};
use shared_models::auth::Session;

use crate::models::{BookingError, BookingRequest};

pub const BOOKING_PATH: &str = "/api/appointments/book";

/// Posts finished bookings to the backend.
pub struct Submitter {
    backend: BackendClient,
}

impl Submitter {
    pub fn with_client(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// Any 2xx response counts as booked; the body is not inspected.
    #[instrument(skip(self, request, session), fields(therapist_id = %request.therapist_id))]
    pub async fn submit(&self, request: &BookingRequest, session: &Session) -> Result<(), BookingError> {
        let body = serde_json::to_value(request)
            .map_err(|e| BookingError::Serialization(e.to_string()))?;

        debug!("Submitting booking for {}", request.user_email);

        self.backend
            .send(Method::POST, BOOKING_PATH, Some(session), Some(body))
            .await
            .map_err(|e| {
                error!("Error: {}", e);
                match e {
                    ApiError::Transport(err) => BookingError::Unreachable(err.to_string()),
                    ApiError::InvalidHeader(msg) => BookingError::Unreachable(msg),
                    other => BookingError::Rejected {
                        status: other.status(),
                        body: other.to_string(),
                    },
                }
            })?;

        Ok(())
    }
}
