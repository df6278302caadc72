use std::env;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_API_BASE_URL: &str = "https://therapist-backend5.onrender.com";

/// How the appointment date and time are written into the booking payload.
///
/// `Legacy` reproduces the older client, which put the time-only string into
/// `appointmentDate` and the date-only string into `appointmentTime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateTimeSerialization {
    #[default]
    Corrected,
    Legacy,
}

impl DateTimeSerialization {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "corrected" => Some(Self::Corrected),
            "legacy" => Some(Self::Legacy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub session_token: Option<String>,
    pub pdf_output_dir: PathBuf,
    pub request_timeout_secs: Option<u64>,
    pub datetime_serialization: DateTimeSerialization,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_token: None,
            pdf_output_dir: PathBuf::from("."),
            request_timeout_secs: None,
            datetime_serialization: DateTimeSerialization::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any variable source. Missing or invalid values
    /// fall back to defaults with a warning.
    pub fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            api_base_url: var("BOOKING_API_BASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| {
                    warn!("BOOKING_API_BASE_URL not set, using default");
                    DEFAULT_API_BASE_URL.to_string()
                }),
            session_token: var("BOOKING_SESSION_TOKEN").filter(|token| !token.trim().is_empty()),
            pdf_output_dir: var("BOOKING_PDF_OUTPUT_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            request_timeout_secs: var("BOOKING_REQUEST_TIMEOUT_SECS").and_then(|raw| {
                match raw.trim().parse::<u64>() {
                    Ok(secs) => Some(secs),
                    Err(_) => {
                        warn!("BOOKING_REQUEST_TIMEOUT_SECS is not a number, ignoring: {}", raw);
                        None
                    }
                }
            }),
            datetime_serialization: var("BOOKING_DATETIME_SERIALIZATION")
                .map(|raw| {
                    DateTimeSerialization::parse(&raw).unwrap_or_else(|| {
                        warn!("Unknown BOOKING_DATETIME_SERIALIZATION '{}', using corrected", raw);
                        DateTimeSerialization::Corrected
                    })
                })
                .unwrap_or_default(),
        };

        if !config.is_configured() {
            warn!("BOOKING_SESSION_TOKEN not set - authenticated requests will be rejected");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty() && self.session_token.is_some()
    }
}
