use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use shared_backend::ApiError;
use shared_models::error::AppError;

/// Therapist record as served by `/api/therapists/{id}`.
///
/// Only `name` is required. Everything else the backend sends is kept in
/// `extra` so the record can be shown or forwarded unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Therapist {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Therapist {
    /// Backend identifier, accepting either `id` or Mongo-style `_id`.
    pub fn id(&self) -> Option<String> {
        ["id", "_id"]
            .iter()
            .filter_map(|key| self.extra.get(*key))
            .find_map(|value| match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TherapistError {
    #[error("Therapist not found")]
    NotFound,

    #[error("Therapist id must not be empty")]
    InvalidId,

    #[error("Therapist lookup failed: {0}")]
    Unreachable(String),

    #[error("Therapist record is malformed: {0}")]
    Malformed(String),
}

impl From<ApiError> for TherapistError {
    fn from(err: ApiError) -> Self {
        match err {
            // Any rejected lookup reads as "not found" to the user.
            ApiError::NotFound(_)
            | ApiError::Unauthorized { .. }
            | ApiError::Status { .. } => TherapistError::NotFound,
            ApiError::Decode(msg) => TherapistError::Malformed(msg),
            ApiError::Transport(e) => TherapistError::Unreachable(e.to_string()),
            ApiError::InvalidHeader(msg) => TherapistError::Unreachable(msg),
        }
    }
}

impl From<TherapistError> for AppError {
    fn from(err: TherapistError) -> Self {
        match err {
            TherapistError::NotFound | TherapistError::InvalidId => AppError::NotFound(err.to_string()),
            TherapistError::Unreachable(_) | TherapistError::Malformed(_) => {
                AppError::ExternalService(err.to_string())
            }
        }
    }
}
