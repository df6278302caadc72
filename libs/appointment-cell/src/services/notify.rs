use tracing::info;

/// Sink for blocking, user-facing messages.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Writes alerts to the log. Used when no interactive surface is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        info!(target: "booking::alert", "{}", message);
    }
}
