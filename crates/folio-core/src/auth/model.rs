use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// An authenticated admin context identified by a bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub login_time: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(token: String, username: String, now: DateTime<Utc>) -> Self {
        Self {
            token,
            username,
            login_time: now,
            last_activity: now,
        }
    }

    /// Records activity at `now`. `last_activity` never moves backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity {
            self.last_activity = now;
        }
    }

    /// Idle for strictly longer than `timeout`.
    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now - self.last_activity > timeout
    }
}

// Tokens stay out of logs
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .field("login_time", &self.login_time)
            .field("last_activity", &self.last_activity)
            .finish()
    }
}
