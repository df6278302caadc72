use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use mockall::mock;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::services::booking::BOOKED_MESSAGE;
use appointment_cell::{
    AppointmentSummary, BookingError, BookingForm, BookingView, BookingWorkflow, DocumentExporter,
    ExportError, ExportedDocument, LoadOutcome, Notifier, SubmissionOutcome, SubmissionState,
    ValidationError,
};
use shared_backend::BackendClient;
use shared_config::DateTimeSerialization;
use shared_models::error::AppError;
use shared_utils::test_utils::{MockBackendResponses, TestConfig};
use therapist_cell::TherapistError;
use user_cell::UserError;

mock! {
    pub Alerts {}
    impl Notifier for Alerts {
        fn alert(&self, message: &str);
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Records summaries instead of writing files. Fails the first
/// `failures` calls.
#[derive(Default)]
struct StubExporter {
    failures: AtomicUsize,
    exported: Mutex<Vec<AppointmentSummary>>,
}

impl StubExporter {
    fn failing_once() -> Self {
        Self {
            failures: AtomicUsize::new(1),
            ..Self::default()
        }
    }

    fn exported(&self) -> Vec<AppointmentSummary> {
        self.exported.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentExporter for StubExporter {
    async fn export(&self, summary: &AppointmentSummary) -> Result<ExportedDocument, ExportError> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ExportError::Render("renderer crashed".to_string()));
        }
        self.exported.lock().unwrap().push(summary.clone());
        Ok(ExportedDocument {
            path: PathBuf::from("appointment.pdf"),
            size_bytes: 0,
        })
    }
}

fn fixed_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap()
}

fn workflow_for(
    mock_server: &MockServer,
    exporter: Arc<StubExporter>,
    notifier: Arc<dyn Notifier>,
) -> BookingWorkflow {
    workflow_with(TestConfig::with_base_url(mock_server.uri()), exporter, notifier)
}

fn workflow_with(
    config: TestConfig,
    exporter: Arc<StubExporter>,
    notifier: Arc<dyn Notifier>,
) -> BookingWorkflow {
    BookingWorkflow::new(&config.to_app_config(), "42", config.session())
        .with_form(BookingForm::new(fixed_time()))
        .with_exporter(exporter)
        .with_notifier(notifier)
}

async fn setup_lookup_mocks(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/therapists/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockBackendResponses::therapist_response("42", "Dr. Lee")),
        )
        .expect(1)
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("Authorization", TestConfig::default().bearer_header().as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockBackendResponses::user_response("Ana Ruiz", "ana@example.com")),
        )
        .expect(1)
        .mount(mock_server)
        .await;
}

// ==============================================================================
// MOUNT
// ==============================================================================

#[tokio::test]
async fn test_mount_populates_doctor_and_user() {
    let mock_server = MockServer::start().await;
    setup_lookup_mocks(&mock_server).await;

    let workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        Arc::new(RecordingNotifier::default()),
    );

    assert_eq!(workflow.view().await, BookingView::Loading);
    assert_eq!(workflow.mount().await, LoadOutcome::Ready);

    let form = workflow.snapshot().await;
    assert_eq!(form.doctor_name, "Dr. Lee");
    assert_eq!(form.user_name, "Ana Ruiz");
    assert_eq!(form.user_email, "ana@example.com");
    assert_eq!(form.appointment_date, fixed_time());

    assert_eq!(
        workflow.view().await.render(),
        "Book Appointment with Dr. Lee\nLogged in as: Ana Ruiz (ana@example.com)"
    );
}

#[tokio::test]
async fn test_independent_failures_keep_distinct_messages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/therapists/42"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        Arc::new(RecordingNotifier::default()),
    );

    let outcome = workflow.mount().await;
    assert_eq!(
        outcome,
        LoadOutcome::Failed {
            therapist_error: Some(TherapistError::NotFound),
            user_error: Some(UserError::Unauthorized),
        }
    );
    assert_matches!(workflow.view().await, BookingView::Failed(_));
}

#[tokio::test]
async fn test_user_failure_alone_fails_the_view() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/therapists/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockBackendResponses::therapist_response("42", "Dr. Lee")),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        Arc::new(RecordingNotifier::default()),
    );

    let outcome = workflow.mount().await;
    assert_eq!(
        outcome,
        LoadOutcome::Failed {
            therapist_error: None,
            user_error: Some(UserError::Unauthorized),
        }
    );
    assert_eq!(workflow.view().await.render(), "Error: User not found");
    // Same text on screen, but the rejected session stays an auth failure.
    assert_eq!(outcome.into_result(), Err(AppError::Auth("User not found".to_string())));
    // The therapist lookup still merged its field.
    assert_eq!(workflow.snapshot().await.doctor_name, "Dr. Lee");
}

#[tokio::test]
async fn test_missing_user_is_not_an_auth_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/therapists/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockBackendResponses::therapist_response("42", "Dr. Lee")),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        Arc::new(RecordingNotifier::default()),
    );

    let outcome = workflow.mount().await;
    assert_matches!(
        outcome,
        LoadOutcome::Failed { therapist_error: None, user_error: Some(UserError::NotFound) }
    );
    assert_eq!(outcome.into_result(), Err(AppError::NotFound("User not found".to_string())));
}

#[tokio::test]
async fn test_edits_during_load_are_preserved() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/therapists/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockBackendResponses::therapist_response("42", "Dr. Lee"))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockBackendResponses::user_response("Ana Ruiz", "ana@example.com"))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&mock_server)
        .await;

    let workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        Arc::new(RecordingNotifier::default()),
    );

    let (outcome, _) = tokio::join!(workflow.mount(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        workflow.set_location("Cork").await;
        workflow.set_disease("Migraine").await;
    });

    assert_eq!(outcome, LoadOutcome::Ready);
    let form = workflow.snapshot().await;
    assert_eq!(form.location, "Cork");
    assert_eq!(form.disease, "Migraine");
    assert_eq!(form.doctor_name, "Dr. Lee");
    assert_eq!(form.user_name, "Ana Ruiz");
}

#[tokio::test]
async fn test_unmount_before_lookups_leaves_form_untouched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/therapists/42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockBackendResponses::therapist_response("42", "Dr. Lee"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockBackendResponses::user_response("Ana Ruiz", "ana@example.com"))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        Arc::new(RecordingNotifier::default()),
    );

    let token = workflow.cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(2), workflow.mount())
        .await
        .expect("cancelled mount should return promptly");

    assert_eq!(outcome, LoadOutcome::Cancelled);
    let form = workflow.snapshot().await;
    assert_eq!(form.doctor_name, "");
    assert_eq!(form.user_name, "");
    assert_eq!(workflow.view().await, BookingView::Loading);
}

#[tokio::test]
async fn test_mount_after_unmount_does_nothing() {
    let mock_server = MockServer::start().await;

    let workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        Arc::new(RecordingNotifier::default()),
    );
    workflow.unmount();

    assert_eq!(workflow.mount().await, LoadOutcome::Cancelled);
    assert!(mock_server.received_requests().await.unwrap_or_default().is_empty());
}

// ==============================================================================
// SUBMIT
// ==============================================================================

#[tokio::test]
async fn test_submit_before_mount_is_rejected() {
    let mock_server = MockServer::start().await;
    let mut workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        Arc::new(RecordingNotifier::default()),
    );

    let outcome = workflow.submit().await;
    assert_matches!(outcome, SubmissionOutcome::Rejected(BookingError::NotReady(_)));
    assert_eq!(workflow.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn test_missing_disease_blocks_with_disease_alert() {
    let mock_server = MockServer::start().await;
    setup_lookup_mocks(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut alerts = MockAlerts::new();
    alerts
        .expect_alert()
        .withf(|message: &str| message == "Please fill in the disease field.")
        .times(1)
        .return_const(());

    let exporter = Arc::new(StubExporter::default());
    let mut workflow = workflow_for(&mock_server, Arc::clone(&exporter), Arc::new(alerts));
    workflow.mount().await;
    workflow.set_location("Dublin").await;

    let outcome = workflow.submit().await;

    assert_matches!(outcome, SubmissionOutcome::Blocked(ValidationError::MissingDisease));
    assert_eq!(workflow.state(), SubmissionState::Idle);
    assert!(exporter.exported().is_empty());
}

#[tokio::test]
async fn test_missing_location_blocks_with_location_alert() {
    let mock_server = MockServer::start().await;
    setup_lookup_mocks(&mock_server).await;

    let mut alerts = MockAlerts::new();
    alerts
        .expect_alert()
        .withf(|message: &str| message.contains("location"))
        .times(1)
        .return_const(());

    let mut workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        Arc::new(alerts),
    );
    workflow.mount().await;
    workflow.set_location("").await;
    workflow.set_disease("Flu").await;

    let outcome = workflow.submit().await;
    assert_matches!(outcome, SubmissionOutcome::Blocked(ValidationError::MissingLocation));
}

#[tokio::test]
async fn test_filled_form_exports_then_books() {
    let mock_server = MockServer::start().await;
    setup_lookup_mocks(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .and(header("Authorization", TestConfig::default().bearer_header().as_str()))
        .and(body_partial_json(json!({
            "therapistId": "42",
            "userName": "Ana Ruiz",
            "userEmail": "ana@example.com",
            "doctorName": "Dr. Lee",
            "location": "Dublin",
            "disease": "Flu",
            "appointmentDate": "10/19/2026",
            "appointmentTime": "2:30:00 PM"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::booking_response()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let exporter = Arc::new(StubExporter::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let mut workflow = workflow_for(&mock_server, Arc::clone(&exporter), notifier.clone());
    workflow.mount().await;
    workflow.set_location("Dublin").await;
    workflow.set_disease("Flu").await;

    let outcome = workflow.submit().await;

    let receipt = match outcome {
        SubmissionOutcome::Booked(receipt) => receipt,
        other => panic!("expected booking, got {:?}", other),
    };
    assert_eq!(receipt.request.therapist_id, "42");
    assert_eq!(workflow.state(), SubmissionState::Done);
    assert_eq!(notifier.messages(), vec![BOOKED_MESSAGE.to_string()]);

    let exported = exporter.exported();
    assert_eq!(exported.len(), 1);
    assert_eq!(exported[0].doctor_name, "Dr. Lee");
    assert_eq!(exported[0].date, "October 19, 2026");
    assert_eq!(exported[0].time, "2:30 PM");
}

#[tokio::test]
async fn test_second_submit_after_success_is_rejected() {
    let mock_server = MockServer::start().await;
    setup_lookup_mocks(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        Arc::new(RecordingNotifier::default()),
    );
    workflow.mount().await;
    workflow.set_location("Dublin").await;
    workflow.set_disease("Flu").await;

    assert!(workflow.submit().await.is_booked());
    assert_matches!(
        workflow.submit().await,
        SubmissionOutcome::Rejected(BookingError::InvalidTransition {
            from: SubmissionState::Done,
            to: SubmissionState::Validating,
        })
    );
}

#[tokio::test]
async fn test_therapist_id_comes_from_route_not_form() {
    let mock_server = MockServer::start().await;
    setup_lookup_mocks(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .and(body_partial_json(json!({"therapistId": "42", "doctorName": "Someone Else"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        Arc::new(RecordingNotifier::default()),
    );
    workflow.mount().await;
    {
        let form = workflow.form();
        let mut form = form.write().await;
        form.doctor_name = "Someone Else".to_string();
        form.set_location("Dublin");
        form.set_disease("Flu");
    }

    assert!(workflow.submit().await.is_booked());
}

#[tokio::test]
async fn test_export_failure_is_recoverable() {
    let mock_server = MockServer::start().await;
    setup_lookup_mocks(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let exporter = Arc::new(StubExporter::failing_once());
    let notifier = Arc::new(RecordingNotifier::default());
    let mut workflow = workflow_for(&mock_server, Arc::clone(&exporter), notifier.clone());
    workflow.mount().await;
    workflow.set_location("Dublin").await;
    workflow.set_disease("Flu").await;

    assert_matches!(workflow.submit().await, SubmissionOutcome::ExportFailed(ExportError::Render(_)));
    assert_eq!(workflow.state(), SubmissionState::Idle);
    // Nothing was posted yet.
    let posts = mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert_eq!(posts, 0);

    assert!(workflow.submit().await.is_booked());
    assert_eq!(exporter.exported().len(), 1);
    assert_eq!(notifier.messages().len(), 2);
}

#[tokio::test]
async fn test_rejected_booking_allows_resubmission() {
    let mock_server = MockServer::start().await;
    setup_lookup_mocks(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .respond_with(ResponseTemplate::new(500).set_body_json(MockBackendResponses::error_response("db down")))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let mut workflow = workflow_for(
        &mock_server,
        Arc::new(StubExporter::default()),
        notifier.clone(),
    );
    workflow.mount().await;
    workflow.set_location("Dublin").await;
    workflow.set_disease("Flu").await;

    let outcome = workflow.submit().await;
    assert_matches!(
        outcome,
        SubmissionOutcome::SubmitFailed(BookingError::Rejected { status: Some(500), .. })
    );
    assert_eq!(workflow.state(), SubmissionState::Idle);
    assert_eq!(notifier.messages(), vec!["Failed to book appointment".to_string()]);

    assert!(workflow.submit().await.is_booked());
    assert_eq!(workflow.state(), SubmissionState::Done);
}

#[tokio::test]
async fn test_legacy_serialization_swaps_fields_on_the_wire() {
    let mock_server = MockServer::start().await;
    setup_lookup_mocks(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .and(body_partial_json(json!({
            "appointmentDate": "2:30:00 PM",
            "appointmentTime": "10/19/2026"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig {
        datetime_serialization: DateTimeSerialization::Legacy,
        ..TestConfig::with_base_url(mock_server.uri())
    };
    let mut workflow = workflow_with(
        config,
        Arc::new(StubExporter::default()),
        Arc::new(RecordingNotifier::default()),
    );
    workflow.mount().await;
    workflow.set_location("Dublin").await;
    workflow.set_disease("Flu").await;

    assert!(workflow.submit().await.is_booked());
}

#[tokio::test]
async fn test_padded_route_id_is_trimmed_for_lookup_and_payload() {
    let mock_server = MockServer::start().await;
    setup_lookup_mocks(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .and(body_partial_json(json!({"therapistId": "42"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_base_url(mock_server.uri());
    let mut workflow = BookingWorkflow::new(&config.to_app_config(), " 42 ", config.session())
        .with_form(BookingForm::new(fixed_time()))
        .with_exporter(Arc::new(StubExporter::default()))
        .with_notifier(Arc::new(RecordingNotifier::default()));

    assert_eq!(workflow.therapist_id(), "42");
    assert_eq!(workflow.mount().await, LoadOutcome::Ready);
    workflow.set_location("Dublin").await;
    workflow.set_disease("Flu").await;

    let receipt = workflow.submit().await.into_result().unwrap();
    assert_eq!(receipt.request.therapist_id, "42");
}

#[tokio::test]
async fn test_injected_client_serves_every_backend_call() {
    let mock_server = MockServer::start().await;
    setup_lookup_mocks(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/api/appointments/book"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    // The config points nowhere; only the injected client knows the server.
    let config = TestConfig::with_base_url("http://127.0.0.1:1");
    let backend = BackendClient::new(&TestConfig::with_base_url(mock_server.uri()).to_app_config());
    let mut workflow =
        BookingWorkflow::with_client(&config.to_app_config(), backend, "42", config.session())
            .with_form(BookingForm::new(fixed_time()))
            .with_exporter(Arc::new(StubExporter::default()))
            .with_notifier(Arc::new(RecordingNotifier::default()));

    assert_eq!(workflow.mount().await, LoadOutcome::Ready);
    workflow.set_location("Dublin").await;
    workflow.set_disease("Flu").await;

    assert!(workflow.submit().await.is_booked());
}
