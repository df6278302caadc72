// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use shared_backend::BackendClient;
use shared_config::{AppConfig, DateTimeSerialization};
use shared_models::auth::Session;
use shared_utils::CancellationToken;

use crate::models::{
    AppointmentSummary, BookingError, BookingForm, BookingReceipt, BookingRequest, BookingView,
    LoadOutcome, SharedForm, SharedView, SubmissionOutcome, SubmissionState, ViewState,
};
use crate::services::export::{DocumentExporter, PdfExporter};
use crate::services::lifecycle::SubmissionLifecycle;
use crate::services::loader::DataLoader;
use crate::services::notify::{LogNotifier, Notifier};
use crate::services::submission::Submitter;
use crate::services::validation::BookingValidator;

pub const BOOKED_MESSAGE: &str = "Appointment booked successfully!";

/// Booking form for one therapist: mount-time loading, draft editing, and
/// the validate, export, submit sequence.
pub struct BookingWorkflow {
    therapist_id: String,
    session: Session,
    serialization: DateTimeSerialization,
    form: SharedForm,
    view: SharedView,
    state: SubmissionState,
    cancel: CancellationToken,
    loader: DataLoader,
    validator: BookingValidator,
    lifecycle: SubmissionLifecycle,
    exporter: Arc<dyn DocumentExporter>,
    submitter: Submitter,
    notifier: Arc<dyn Notifier>,
}

impl BookingWorkflow {
    pub fn new(config: &AppConfig, therapist_id: impl Into<String>, session: Session) -> Self {
        Self::with_client(config, BackendClient::new(config), therapist_id, session)
    }

    /// Every backend call of the workflow goes through `backend`.
    pub fn with_client(
        config: &AppConfig,
        backend: BackendClient,
        therapist_id: impl Into<String>,
        session: Session,
    ) -> Self {
        // Lookup and payload both use the trimmed route id.
        let therapist_id: String = therapist_id.into();
        Self {
            therapist_id: therapist_id.trim().to_string(),
            session,
            serialization: config.datetime_serialization,
            form: Arc::new(RwLock::new(BookingForm::with_current_time())),
            view: Arc::new(RwLock::new(ViewState::default())),
            state: SubmissionState::Idle,
            cancel: CancellationToken::new(),
            loader: DataLoader::with_client(backend.clone()),
            validator: BookingValidator::new(),
            lifecycle: SubmissionLifecycle::new(),
            exporter: Arc::new(PdfExporter::from_config(config)),
            submitter: Submitter::with_client(backend),
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_exporter(mut self, exporter: Arc<dyn DocumentExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replaces the initial draft, e.g. to pin the pickers to a known time.
    pub fn with_form(mut self, form: BookingForm) -> Self {
        self.form = Arc::new(RwLock::new(form));
        self
    }

    pub fn therapist_id(&self) -> &str {
        &self.therapist_id
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Handle to the draft shared with the mount-time lookups.
    pub fn form(&self) -> SharedForm {
        Arc::clone(&self.form)
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // ==========================================================================
    // MOUNT
    // ==========================================================================

    #[instrument(skip(self), fields(therapist_id = %self.therapist_id))]
    pub async fn mount(&self) -> LoadOutcome {
        let outcome = self
            .loader
            .load(&self.therapist_id, &self.session, &self.form, &self.view, &self.cancel)
            .await;
        info!("Booking form mounted: {:?}", outcome);
        outcome
    }

    /// Stops pending lookups from touching the form.
    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    pub async fn view(&self) -> BookingView {
        let view = self.view.read().await;
        let form = self.form.read().await;
        BookingView::from_state(&view, &form)
    }

    pub async fn snapshot(&self) -> BookingForm {
        self.form.read().await.clone()
    }

    // ==========================================================================
    // CHANGE HANDLERS
    // ==========================================================================

    pub async fn set_location(&self, location: impl Into<String>) {
        self.form.write().await.set_location(location);
    }

    pub async fn set_disease(&self, disease: impl Into<String>) {
        self.form.write().await.set_disease(disease);
    }

    pub async fn set_appointment_date(&self, date: NaiveDateTime) {
        self.form.write().await.set_appointment_date(date);
    }

    pub async fn set_appointment_time(&self, time: NaiveDateTime) {
        self.form.write().await.set_appointment_time(time);
    }

    // ==========================================================================
    // SUBMIT
    // ==========================================================================

    #[instrument(skip(self), fields(therapist_id = %self.therapist_id))]
    pub async fn submit(&mut self) -> SubmissionOutcome {
        let view = self.view().await;
        if !view.is_ready() {
            warn!("Submit attempted while the form is not ready");
            return SubmissionOutcome::Rejected(BookingError::NotReady(view.render()));
        }

        if let Err(e) = self.advance(SubmissionState::Validating) {
            return SubmissionOutcome::Rejected(e);
        }

        let form = self.snapshot().await;
        if let Err(e) = self.validator.validate(&form) {
            self.notifier.alert(&e.to_string());
            self.reset();
            return SubmissionOutcome::Blocked(e);
        }

        // Export must finish before anything is sent.
        self.step(SubmissionState::Exporting);
        let summary = AppointmentSummary::from_form(&form);
        let document = match self.exporter.export(&summary).await {
            Ok(document) => document,
            Err(e) => {
                error!("Appointment export failed: {}", e);
                self.notifier.alert(&e.to_string());
                self.reset();
                return SubmissionOutcome::ExportFailed(e);
            }
        };

        self.step(SubmissionState::Submitting);
        let request = BookingRequest::from_form(&form, &self.therapist_id, self.serialization);
        match self.submitter.submit(&request, &self.session).await {
            Ok(()) => {
                self.step(SubmissionState::Done);
                self.notifier.alert(BOOKED_MESSAGE);
                info!("Appointment booked with {}", request.doctor_name);
                SubmissionOutcome::Booked(BookingReceipt { request, document })
            }
            Err(e) => {
                error!("Error: {}", e);
                self.notifier.alert(&e.to_string());
                self.reset();
                SubmissionOutcome::SubmitFailed(e)
            }
        }
    }

    fn advance(&mut self, next: SubmissionState) -> Result<(), BookingError> {
        self.lifecycle.validate_transition(self.state, next)?;
        self.state = next;
        Ok(())
    }

    // Moves along the fixed submit sequence. Failing here means the sequence
    // itself is wrong, so it is logged rather than surfaced.
    fn step(&mut self, next: SubmissionState) {
        if let Err(e) = self.advance(next) {
            error!("{}", e);
            self.state = next;
        }
    }

    fn reset(&mut self) {
        self.step(SubmissionState::Idle);
    }
}
