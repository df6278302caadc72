use std::path::PathBuf;

use serde_json::json;

use shared_config::{AppConfig, DateTimeSerialization};
use shared_models::auth::Session;

pub const TEST_TOKEN: &str = "test-session-token";

pub struct TestConfig {
    pub api_base_url: String,
    pub session_token: String,
    pub pdf_output_dir: PathBuf,
    pub datetime_serialization: DateTimeSerialization,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            session_token: TEST_TOKEN.to_string(),
            pdf_output_dir: std::env::temp_dir(),
            datetime_serialization: DateTimeSerialization::Corrected,
        }
    }
}

impl TestConfig {
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            session_token: Some(self.session_token.clone()),
            pdf_output_dir: self.pdf_output_dir.clone(),
            request_timeout_secs: Some(5),
            datetime_serialization: self.datetime_serialization,
        }
    }

    pub fn session(&self) -> Session {
        Session::new(self.session_token.clone())
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.session_token)
    }
}

pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn therapist_response(id: &str, name: &str) -> serde_json::Value {
        json!({
            "_id": id,
            "id": id,
            "name": name,
            "specialization": "Cognitive Behavioural Therapy",
            "experience": 8,
            "location": "Dublin"
        })
    }

    pub fn user_response(name: &str, email: &str) -> serde_json::Value {
        json!({
            "_id": "user-1",
            "name": name,
            "email": email
        })
    }

    pub fn booking_response() -> serde_json::Value {
        json!({
            "message": "Appointment booked successfully"
        })
    }

    pub fn error_response(message: &str) -> serde_json::Value {
        json!({
            "message": message
        })
    }
}
