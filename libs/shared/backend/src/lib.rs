pub mod client;
pub mod error;

pub use client::BackendClient;
pub use error::ApiError;
