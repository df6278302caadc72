use thiserror::Error;

/// Workflow-level error shared by the cells and the binary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Submission error: {0}")]
    Submission(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl AppError {
    /// True for errors the user can fix and retry from the same view.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::ValidationError(_) | AppError::Export(_) | AppError::Submission(_)
        )
    }
}
