use tracing::debug;

use crate::models::{BookingForm, ValidationError};

/// Client-side gate in front of export and submission.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingValidator;

impl BookingValidator {
    pub fn new() -> Self {
        Self
    }

    /// Reports the first empty required field. Disease is checked before
    /// location; whitespace-only values count as empty.
    pub fn validate(&self, form: &BookingForm) -> Result<(), ValidationError> {
        if form.disease.trim().is_empty() {
            debug!("Booking blocked: disease is empty");
            return Err(ValidationError::MissingDisease);
        }
        if form.location.trim().is_empty() {
            debug!("Booking blocked: location is empty");
            return Err(ValidationError::MissingLocation);
        }
        Ok(())
    }
}
