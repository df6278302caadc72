use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication error ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => ApiError::Unauthorized { status, body },
            404 => ApiError::NotFound(body),
            _ => ApiError::Status { status, body },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status, .. } | ApiError::Status { status, .. } => Some(*status),
            ApiError::NotFound(_) => Some(404),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            ApiError::Decode(_) | ApiError::InvalidHeader(_) => None,
        }
    }
}
