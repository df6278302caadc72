// libs/appointment-cell/src/models.rs
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use shared_config::DateTimeSerialization;
use shared_models::auth::CurrentUser;
use shared_models::error::AppError;
use therapist_cell::{Therapist, TherapistError};
use user_cell::UserError;

use crate::formatting::{
    format_summary_date, format_summary_time, format_wire_date, format_wire_time,
};

// ==============================================================================
// BOOKING FORM
// ==============================================================================

/// Editable booking draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingForm {
    pub user_name: String,
    pub user_email: String,
    pub doctor_name: String,
    pub location: String,
    pub disease: String,
    pub appointment_date: NaiveDateTime,
    pub appointment_time: NaiveDateTime,
}

impl BookingForm {
    /// Empty draft with both pickers set to `now`.
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            user_name: String::new(),
            user_email: String::new(),
            doctor_name: String::new(),
            location: String::new(),
            disease: String::new(),
            appointment_date: now,
            appointment_time: now,
        }
    }

    pub fn with_current_time() -> Self {
        Self::new(Local::now().naive_local())
    }

    /// Overwrites only the fields the patch sets.
    pub fn apply(&mut self, patch: FormPatch) {
        if let Some(user_name) = patch.user_name {
            self.user_name = user_name;
        }
        if let Some(user_email) = patch.user_email {
            self.user_email = user_email;
        }
        if let Some(doctor_name) = patch.doctor_name {
            self.doctor_name = doctor_name;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(disease) = patch.disease {
            self.disease = disease;
        }
        if let Some(appointment_date) = patch.appointment_date {
            self.appointment_date = appointment_date;
        }
        if let Some(appointment_time) = patch.appointment_time {
            self.appointment_time = appointment_time;
        }
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = location.into();
    }

    pub fn set_disease(&mut self, disease: impl Into<String>) {
        self.disease = disease.into();
    }

    pub fn set_appointment_date(&mut self, date: NaiveDateTime) {
        self.appointment_date = date;
    }

    pub fn set_appointment_time(&mut self, time: NaiveDateTime) {
        self.appointment_time = time;
    }
}

/// Form state shared between the loader and whoever edits the draft.
pub type SharedForm = Arc<RwLock<BookingForm>>;

/// Partial update for [`BookingForm`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPatch {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub doctor_name: Option<String>,
    pub location: Option<String>,
    pub disease: Option<String>,
    pub appointment_date: Option<NaiveDateTime>,
    pub appointment_time: Option<NaiveDateTime>,
}

impl FormPatch {
    /// The therapist lookup owns `doctorName` and nothing else.
    pub fn from_therapist(therapist: &Therapist) -> Self {
        Self {
            doctor_name: Some(therapist.name.clone()),
            ..Self::default()
        }
    }

    /// The user lookup owns `userName` and `userEmail`.
    pub fn from_user(user: &CurrentUser) -> Self {
        Self {
            user_name: Some(user.name.clone()),
            user_email: Some(user.email.clone()),
            ..Self::default()
        }
    }
}

// ==============================================================================
// WIRE PAYLOAD
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub user_name: String,
    pub user_email: String,
    pub doctor_name: String,
    pub location: String,
    pub disease: String,
    pub therapist_id: String,
    pub appointment_date: String,
    pub appointment_time: String,
}

impl BookingRequest {
    /// `therapist_id` comes from the route, never from the draft.
    pub fn from_form(
        form: &BookingForm,
        therapist_id: &str,
        serialization: DateTimeSerialization,
    ) -> Self {
        let (appointment_date, appointment_time) = match serialization {
            DateTimeSerialization::Corrected => (
                format_wire_date(&form.appointment_date),
                format_wire_time(&form.appointment_time),
            ),
            DateTimeSerialization::Legacy => (
                format_wire_time(&form.appointment_date),
                format_wire_date(&form.appointment_time),
            ),
        };

        Self {
            user_name: form.user_name.clone(),
            user_email: form.user_email.clone(),
            doctor_name: form.doctor_name.clone(),
            location: form.location.clone(),
            disease: form.disease.clone(),
            therapist_id: therapist_id.to_string(),
            appointment_date,
            appointment_time,
        }
    }
}

// ==============================================================================
// SUMMARY DOCUMENT
// ==============================================================================

pub const SUMMARY_TITLE: &str = "Appointment Details";

/// Human-readable summary rendered into the exported document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSummary {
    pub patient_name: String,
    pub doctor_name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub disease: String,
}

impl AppointmentSummary {
    pub fn from_form(form: &BookingForm) -> Self {
        Self {
            patient_name: form.user_name.clone(),
            doctor_name: form.doctor_name.clone(),
            date: format_summary_date(&form.appointment_date),
            time: format_summary_time(&form.appointment_time),
            location: form.location.clone(),
            disease: form.disease.clone(),
        }
    }

    pub fn title(&self) -> &'static str {
        SUMMARY_TITLE
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Patient Name: {}", self.patient_name),
            format!("Doctor Name: {}", self.doctor_name),
            format!("Date: {}", self.date),
            format!("Time: {}", self.time),
            format!("Location: {}", self.location),
            format!("Disease: {}", self.disease),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub path: PathBuf,
    pub size_bytes: usize,
}

// ==============================================================================
// VIEW AND LOAD STATE
// ==============================================================================

/// Mutable view state written by the mount-time fetches.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub loading: bool,
    pub error: Option<String>,
    pub therapist: Option<Therapist>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            loading: true,
            error: None,
            therapist: None,
        }
    }
}

pub type SharedView = Arc<RwLock<ViewState>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingView {
    Loading,
    Failed(String),
    Ready {
        therapist_name: String,
        user_name: String,
        user_email: String,
    },
}

impl BookingView {
    /// Loading wins over errors until the therapist lookup settles.
    pub fn from_state(view: &ViewState, form: &BookingForm) -> Self {
        if view.loading {
            return BookingView::Loading;
        }
        if let Some(error) = &view.error {
            return BookingView::Failed(error.clone());
        }
        match &view.therapist {
            Some(therapist) => BookingView::Ready {
                therapist_name: therapist.name.clone(),
                user_name: form.user_name.clone(),
                user_email: form.user_email.clone(),
            },
            None => BookingView::Loading,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, BookingView::Ready { .. })
    }

    pub fn render(&self) -> String {
        match self {
            BookingView::Loading => "Loading...".to_string(),
            BookingView::Failed(error) => format!("Error: {}", error),
            BookingView::Ready { therapist_name, user_name, user_email } => format!(
                "Book Appointment with {}\nLogged in as: {} ({})",
                therapist_name, user_name, user_email
            ),
        }
    }
}

/// Result of the mount-time fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready,
    Failed {
        therapist_error: Option<TherapistError>,
        user_error: Option<UserError>,
    },
    Cancelled,
}

impl LoadOutcome {
    /// The therapist failure wins when both lookups failed.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            LoadOutcome::Ready => Ok(()),
            LoadOutcome::Cancelled => Err(AppError::Cancelled),
            LoadOutcome::Failed { therapist_error: Some(err), .. } => Err(err.into()),
            LoadOutcome::Failed { user_error: Some(err), .. } => Err(err.into()),
            LoadOutcome::Failed { .. } => {
                Err(AppError::ExternalService("Booking form failed to load".to_string()))
            }
        }
    }
}

// ==============================================================================
// SUBMISSION STATE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Validating,
    Exporting,
    Submitting,
    Done,
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionState::Idle => write!(f, "idle"),
            SubmissionState::Validating => write!(f, "validating"),
            SubmissionState::Exporting => write!(f, "exporting"),
            SubmissionState::Submitting => write!(f, "submitting"),
            SubmissionState::Done => write!(f, "done"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingReceipt {
    pub request: BookingRequest,
    pub document: ExportedDocument,
}

/// Tagged result of one submit attempt.
#[derive(Debug)]
pub enum SubmissionOutcome {
    Booked(BookingReceipt),
    Blocked(ValidationError),
    ExportFailed(ExportError),
    SubmitFailed(BookingError),
    Rejected(BookingError),
}

impl SubmissionOutcome {
    pub fn is_booked(&self) -> bool {
        matches!(self, SubmissionOutcome::Booked(_))
    }

    pub fn into_result(self) -> Result<BookingReceipt, AppError> {
        match self {
            SubmissionOutcome::Booked(receipt) => Ok(receipt),
            SubmissionOutcome::Blocked(err) => Err(err.into()),
            SubmissionOutcome::ExportFailed(err) => Err(err.into()),
            SubmissionOutcome::SubmitFailed(err) | SubmissionOutcome::Rejected(err) => Err(err.into()),
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

/// Required fields, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in the disease field.")]
    MissingDisease,

    #[error("Please fill in the location field.")]
    MissingLocation,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingDisease => "disease",
            ValidationError::MissingLocation => "location",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to render appointment document: {0}")]
    Render(String),

    #[error("Failed to write appointment document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export task did not complete: {0}")]
    Task(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Failed to book appointment")]
    Rejected { status: Option<u16>, body: String },

    #[error("Failed to book appointment: {0}")]
    Unreachable(String),

    #[error("Failed to encode booking request: {0}")]
    Serialization(String),

    #[error("Booking form is not ready: {0}")]
    NotReady(String),

    #[error("Submission cannot move from {from} to {to}")]
    InvalidTransition { from: SubmissionState, to: SubmissionState },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Export(err.to_string())
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError::Submission(err.to_string())
    }
}
