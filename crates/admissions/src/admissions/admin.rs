use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::AdminConfig;

/// Header the admin console sends its session token in.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
}

/// Token handed to the admin console after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and checks expiring admin session tokens.
pub struct AdminAuthenticator {
    username: String,
    password: String,
    ttl: Duration,
    sessions: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl fmt::Debug for AdminAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminAuthenticator")
            .field("username", &self.username)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl AdminAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>, ttl: Duration) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(
            config.username.clone(),
            config.password.clone(),
            Duration::hours(i64::from(config.token_ttl_hours)),
        )
    }

    pub fn login(&self, username: &str, password: &str) -> Result<AdminSession, AuthError> {
        self.login_at(username, password, Utc::now())
    }

    pub fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminSession, AuthError> {
        if username != self.username || password != self.password {
            return Err(AuthError::InvalidCredentials);
        }

        let session = AdminSession {
            token: Uuid::new_v4().simple().to_string(),
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions();
        sessions.retain(|_, expires_at| *expires_at > now);
        sessions.insert(session.token.clone(), session.expires_at);
        Ok(session)
    }

    pub fn verify(&self, token: &str) -> Result<(), AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        let mut sessions = self.sessions();
        match sessions.get(token).copied() {
            Some(expires_at) if expires_at > now => Ok(()),
            Some(_) => {
                sessions.remove(token);
                Err(AuthError::Unauthorized)
            }
            None => Err(AuthError::Unauthorized),
        }
    }

    // The map holds no cross-entry invariants, so a poisoned lock is still usable.
    fn sessions(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
