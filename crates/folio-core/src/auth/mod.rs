//! Admin authentication: credentials and bearer-token sessions.

mod credential;
mod manager;
mod model;

pub use credential::{CredentialStore, InMemoryCredentialStore, MIN_PASSWORD_LENGTH, PasswordDigest};
pub use manager::{DEFAULT_SESSION_TIMEOUT_MINUTES, SessionManager};
pub use model::Session;
