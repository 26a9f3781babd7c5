use super::credential::{CredentialStore, MIN_PASSWORD_LENGTH, PasswordDigest};
use super::model::Session;
use crate::clock::Clock;
use crate::error::{FolioError, Result};
use chrono::Duration;
use rand::RngCore;
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Default idle timeout for admin sessions.
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 30;

const TOKEN_BYTES: usize = 32;

/// Issues, validates and expires bearer-token sessions.
///
/// `SessionManager` is responsible for:
/// - Checking credentials and minting tokens
/// - Sliding-window expiry (every successful validation touches the session)
/// - Revocation and credential changes
///
/// The session table lives in memory only; a restart logs everybody out.
pub struct SessionManager {
    /// Live sessions keyed by token
    sessions: RwLock<HashMap<String, Session>>,
    credentials: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl SessionManager {
    /// Creates a manager with the default 30-minute idle timeout.
    pub fn new(credentials: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_timeout(
            credentials,
            clock,
            Duration::minutes(DEFAULT_SESSION_TIMEOUT_MINUTES),
        )
    }

    pub fn with_timeout(
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            credentials,
            clock,
            timeout,
        }
    }

    /// Logs a user in and returns a fresh token.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for an unknown user or a wrong password alike.
    pub async fn issue(&self, username: &str, password: &str) -> Result<String> {
        if !self.credentials.verify(username, password).await? {
            tracing::warn!(username, "Rejected login attempt");
            return Err(FolioError::InvalidCredentials);
        }

        let token = generate_token();
        let session = Session::new(token.clone(), username.to_string(), self.clock.now());

        let mut sessions = self.sessions.write().await;
        sessions.insert(token.clone(), session);
        drop(sessions);

        tracing::info!(username, "Admin session issued");
        Ok(token)
    }

    /// Resolves a token to its session and touches it.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated`: token missing, empty or unknown
    /// - `SessionExpired`: idle past the timeout; the session is removed
    pub async fn validate(&self, token: Option<&str>) -> Result<Session> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(FolioError::Unauthenticated),
        };

        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;

        let Some(session) = sessions.get_mut(token) else {
            return Err(FolioError::Unauthenticated);
        };

        if session.is_expired(now, self.timeout) {
            let username = session.username.clone();
            sessions.remove(token);
            tracing::info!(username = %username, "Admin session expired");
            return Err(FolioError::SessionExpired);
        }

        session.touch(now);
        Ok(session.clone())
    }

    /// Deletes a session. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.remove(token) {
            tracing::info!(username = %session.username, "Admin session revoked");
        }
    }

    /// Changes the password of the user owning `token`.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` / `SessionExpired`: no valid session
    /// - `CurrentPasswordMismatch`: `current_password` does not match
    /// - `WeakCredential`: `new_password` shorter than 8 characters
    pub async fn change_credential(
        &self,
        token: Option<&str>,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let session = self.validate(token).await?;
        let username = session.username.as_str();

        if !self.credentials.verify(username, current_password).await? {
            tracing::warn!(username, "Password change rejected: current password mismatch");
            return Err(FolioError::CurrentPasswordMismatch);
        }

        if new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(FolioError::WeakCredential {
                min_length: MIN_PASSWORD_LENGTH,
            });
        }

        self.credentials
            .replace(username, PasswordDigest::generate(new_password))
            .await?;

        tracing::info!(username, "Admin password changed");
        Ok(())
    }

    /// Drops every session idle past the timeout. Returns how many went.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now, self.timeout));
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, "Purged idle admin sessions");
        }
        removed
    }

    /// Number of sessions currently held, expired-but-unpurged included.
    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// 256 bits from the OS RNG, hex encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
