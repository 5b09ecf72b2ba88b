//! Authenticated session shared by the wizard operations.
//!
//! A session is created at login and destroyed at logout, at its scheduled
//! expiry, or as soon as the service rejects its token.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::wizard::Variant;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access session file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse session file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Audience a session was issued for; each has its own login endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Attendee,
    Artist,
    Admin,
}

impl SessionKind {
    pub fn login_path(self) -> &'static str {
        match self {
            SessionKind::Attendee => "/api/auth",
            SessionKind::Artist => "/api/auth/artist",
            SessionKind::Admin => "/api/auth/admin",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Attendee => "attendee",
            SessionKind::Artist => "artist",
            SessionKind::Admin => "admin",
        }
    }
}

impl From<Variant> for SessionKind {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Attendee => SessionKind::Attendee,
            Variant::Artist => SessionKind::Artist,
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Token state of one login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub kind: SessionKind,
    token: Option<String>,
    authenticated: bool,
    /// Scheduled logout, if any
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(kind: SessionKind) -> Self {
        Self {
            kind,
            token: None,
            authenticated: false,
            expires_at: None,
        }
    }

    /// Start a fresh login; any previously scheduled logout no longer applies
    pub fn login(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
        self.authenticated = true;
        self.expires_at = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated && self.token.is_some()
    }

    /// Token to send, only while authenticated
    pub fn token(&self) -> Option<&str> {
        if self.authenticated {
            self.token.as_deref()
        } else {
            None
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn invalidate(&mut self) {
        self.token = None;
        self.authenticated = false;
        self.expires_at = None;
    }

    /// Invalidate if the scheduled logout has passed; returns true if it did
    pub fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(deadline) if deadline <= now => {
                tracing::info!(kind = %self.kind, %deadline, "Session expired");
                self.invalidate();
                true
            }
            _ => false,
        }
    }
}

/// Shared handle to a [`Session`]; clones refer to the same session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    pub fn kind(&self) -> SessionKind {
        self.lock().kind
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token().map(str::to_string)
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    pub fn login(&self, token: impl Into<String>) {
        let mut session = self.lock();
        session.login(token);
        tracing::info!(kind = %session.kind, "Logged in");
    }

    /// Log out immediately
    pub fn invalidate(&self) {
        let mut session = self.lock();
        if session.is_authenticated() {
            tracing::info!(kind = %session.kind, "Logged out");
        }
        session.invalidate();
    }

    /// Schedule a logout after `delay`.
    ///
    /// The deadline is recorded on the session so a persisted session honours
    /// it after a restart. The timer only fires for the login it was scheduled
    /// on: a later login or an earlier logout makes it a no-op.
    pub fn invalidate_after(&self, delay: Duration) -> JoinHandle<()> {
        let deadline = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta));
        {
            let mut session = self.lock();
            session.expires_at = deadline;
            tracing::info!(kind = %session.kind, delay_secs = delay.as_secs(), "Logout scheduled");
        }

        let handle = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut session = handle.lock();
            if session.is_authenticated() && session.expires_at == deadline {
                tracing::info!(kind = %session.kind, "Scheduled logout");
                session.invalidate();
            }
        })
    }

    /// Load a session persisted by [`SessionHandle::save`].
    ///
    /// A missing file, or one issued for another kind, yields a logged-out
    /// session. A passed deadline is applied on load.
    pub fn load(path: &Path, kind: SessionKind) -> Result<Self, SessionError> {
        let mut session = match fs::read_to_string(path) {
            Ok(contents) => {
                serde_json::from_str::<Session>(&contents).map_err(|source| SessionError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Session::new(kind),
            Err(source) => {
                return Err(SessionError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if session.kind != kind {
            tracing::debug!(stored = %session.kind, requested = %kind, "Ignoring session of another kind");
            session = Session::new(kind);
        }
        session.expire_if_due(Utc::now());
        Ok(Self::new(session))
    }

    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let io_error = |source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let contents = serde_json::to_string_pretty(&*self.lock()).map_err(|source| {
            SessionError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, contents).map_err(io_error)
    }
}
