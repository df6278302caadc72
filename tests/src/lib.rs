//! Scenario harness for end-to-end booking flows against a mocked backend.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::{BookingForm, BookingWorkflow, Notifier};
use shared_models::auth::Session;
use shared_utils::test_utils::{MockBackendResponses, TestConfig};

pub const THERAPIST_ID: &str = "64f1c2";

#[derive(Default)]
pub struct AlertLog(Mutex<Vec<String>>);

impl AlertLog {
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for AlertLog {
    fn alert(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

/// Mock backend plus a scratch directory for exported documents.
pub struct BookingScenario {
    pub server: MockServer,
    pub output: TempDir,
    pub alerts: Arc<AlertLog>,
}

impl BookingScenario {
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/api/therapists/{}", THERAPIST_ID)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(MockBackendResponses::therapist_response(THERAPIST_ID, "Dr. Lee")),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .and(header("Authorization", TestConfig::default().bearer_header().as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(MockBackendResponses::user_response("Ana Ruiz", "ana@example.com")),
            )
            .mount(&server)
            .await;

        Self {
            server,
            output: tempfile::tempdir().expect("temp dir for exported documents"),
            alerts: Arc::new(AlertLog::default()),
        }
    }

    pub fn config(&self) -> TestConfig {
        TestConfig {
            pdf_output_dir: self.output.path().to_path_buf(),
            ..TestConfig::with_base_url(self.server.uri())
        }
    }

    pub fn workflow(&self, session: Session) -> BookingWorkflow {
        let opened_at = NaiveDate::from_ymd_opt(2026, 3, 5)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();
        BookingWorkflow::new(&self.config().to_app_config(), THERAPIST_ID, session)
            .with_form(BookingForm::new(opened_at))
            .with_notifier(self.alerts.clone())
    }

    pub async fn accept_bookings(&self) {
        Mock::given(method("POST"))
            .and(path("/api/appointments/book"))
            .respond_with(ResponseTemplate::new(201).set_body_json(MockBackendResponses::booking_response()))
            .mount(&self.server)
            .await;
    }

    pub async fn posted_bookings(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == "POST")
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }
}
