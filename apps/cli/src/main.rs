use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod draft;

use appointment_cell::{BookingWorkflow, Notifier};
use shared_config::AppConfig;
use shared_models::auth::Session;

use crate::draft::Draft;

const USAGE: &str = "usage: therapist-booking <therapist-id> <draft.json>";

/// Prints alerts where the user will see them.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        println!("{}", message);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(therapist_id), Some(draft_path)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let draft = Draft::load(&PathBuf::from(draft_path))?;

    let config = AppConfig::from_env();
    let session = Session::from_token(config.session_token.clone());

    info!("Booking with therapist {}", therapist_id);
    let mut workflow =
        BookingWorkflow::new(&config, therapist_id, session).with_notifier(Arc::new(ConsoleNotifier));

    let outcome = workflow.mount().await;
    println!("{}", workflow.view().await.render());
    outcome.into_result().context("Could not load booking form")?;

    workflow.form().write().await.apply(draft.into_patch());

    let receipt = match workflow.submit().await.into_result() {
        Ok(receipt) => receipt,
        Err(e) if e.is_recoverable() => {
            bail!("Booking was not completed, update the draft and run again: {}", e)
        }
        Err(e) => return Err(e).context("Booking was not completed"),
    };

    println!("Summary saved to {}", receipt.document.path.display());
    Ok(())
}
