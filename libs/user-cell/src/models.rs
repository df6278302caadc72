use shared_backend::ApiError;
use shared_models::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    /// The backend rejected the session credential.
    #[error("User not found")]
    Unauthorized,

    #[error("User lookup failed: {0}")]
    Unreachable(String),

    #[error("User record is malformed: {0}")]
    Malformed(String),
}

impl From<ApiError> for UserError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized { .. } => UserError::Unauthorized,
            ApiError::NotFound(_) | ApiError::Status { .. } => UserError::NotFound,
            ApiError::Decode(msg) => UserError::Malformed(msg),
            ApiError::Transport(e) => UserError::Unreachable(e.to_string()),
            // A token that cannot be sent is as good as a rejected one.
            ApiError::InvalidHeader(_) => UserError::Unauthorized,
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Unauthorized => AppError::Auth(err.to_string()),
            UserError::NotFound => AppError::NotFound(err.to_string()),
            UserError::Unreachable(_) | UserError::Malformed(_) => {
                AppError::ExternalService(err.to_string())
            }
        }
    }
}
