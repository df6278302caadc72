pub mod models;
pub mod services;

pub use models::*;
pub use services::UserService;
pub use shared_models::auth::CurrentUser;
