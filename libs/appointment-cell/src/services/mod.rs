pub mod booking;
pub mod export;
pub mod lifecycle;
pub mod loader;
pub mod notify;
pub mod submission;
pub mod validation;

pub use booking::BookingWorkflow;
pub use export::{DocumentExporter, ExportOptions, Orientation, PageFormat, PdfExporter};
pub use lifecycle::SubmissionLifecycle;
pub use loader::DataLoader;
pub use notify::{LogNotifier, Notifier};
pub use submission::Submitter;
pub use validation::BookingValidator;
