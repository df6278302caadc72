use tracing::{debug, info, instrument, warn};

use shared_backend::BackendClient;
use shared_models::auth::Session;
use shared_utils::CancellationToken;
use therapist_cell::{TherapistError, TherapistService};
use user_cell::{UserError, UserService};

use crate::models::{FormPatch, LoadOutcome, SharedForm, SharedView};

/// What one mount-time fetch did to the shared state.
#[derive(Debug)]
enum Fetch<E> {
    Applied,
    Failed(E),
    Cancelled,
}

impl<E> Fetch<E> {
    fn error(self) -> Option<E> {
        match self {
            Fetch::Failed(message) => Some(message),
            Fetch::Applied | Fetch::Cancelled => None,
        }
    }
}

/// Runs the therapist and current-user lookups for a freshly mounted form.
pub struct DataLoader {
    therapists: TherapistService,
    users: UserService,
}

impl DataLoader {
    /// Both lookups share `backend` and its connection pool.
    pub fn with_client(backend: BackendClient) -> Self {
        Self {
            therapists: TherapistService::with_client(backend.clone()),
            users: UserService::with_client(backend),
        }
    }

    /// Both lookups run concurrently and each merges only the fields it owns.
    /// After `cancel` fires neither of them writes to `form` or `view`.
    #[instrument(skip(self, session, form, view, cancel))]
    pub async fn load(
        &self,
        therapist_id: &str,
        session: &Session,
        form: &SharedForm,
        view: &SharedView,
        cancel: &CancellationToken,
    ) -> LoadOutcome {
        let (therapist, user) = futures::future::join(
            self.load_therapist(therapist_id, form, view, cancel),
            self.load_user(session, form, view, cancel),
        )
        .await;

        match (therapist, user) {
            (Fetch::Cancelled, _) | (_, Fetch::Cancelled) => {
                info!("Form unmounted before lookups finished");
                LoadOutcome::Cancelled
            }
            (Fetch::Applied, Fetch::Applied) => LoadOutcome::Ready,
            (therapist, user) => LoadOutcome::Failed {
                therapist_error: therapist.error(),
                user_error: user.error(),
            },
        }
    }

    async fn load_therapist(
        &self,
        therapist_id: &str,
        form: &SharedForm,
        view: &SharedView,
        cancel: &CancellationToken,
    ) -> Fetch<TherapistError> {
        let Some(result) = cancel
            .run_until_cancelled(self.therapists.get_therapist(therapist_id))
            .await
        else {
            debug!("Therapist lookup cancelled in flight");
            return Fetch::Cancelled;
        };

        // Lock order is view, then form.
        let mut view_state = view.write().await;
        if cancel.is_cancelled() {
            return Fetch::Cancelled;
        }

        let fetch = match result {
            Ok(therapist) => {
                form.write().await.apply(FormPatch::from_therapist(&therapist));
                view_state.therapist = Some(therapist);
                Fetch::Applied
            }
            Err(e) => {
                warn!("Therapist lookup failed: {}", e);
                view_state.error = Some(e.to_string());
                Fetch::Failed(e)
            }
        };

        // The view stops loading once the therapist lookup has settled.
        view_state.loading = false;
        fetch
    }

    async fn load_user(
        &self,
        session: &Session,
        form: &SharedForm,
        view: &SharedView,
        cancel: &CancellationToken,
    ) -> Fetch<UserError> {
        let Some(result) = cancel
            .run_until_cancelled(self.users.current_user(session))
            .await
        else {
            debug!("User lookup cancelled in flight");
            return Fetch::Cancelled;
        };

        let mut view_state = view.write().await;
        if cancel.is_cancelled() {
            return Fetch::Cancelled;
        }

        match result {
            Ok(user) => {
                form.write().await.apply(FormPatch::from_user(&user));
                Fetch::Applied
            }
            Err(e) => {
                warn!("User lookup failed: {}", e);
                view_state.error = Some(e.to_string());
                Fetch::Failed(e)
            }
        }
    }
}
