use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::campground::CampgroundStore;
use crate::users::UserStore;

/// One-time user-facing notice, queued by a handler and consumed by the next
/// rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    user_id: Option<Uuid>,
    flash: Vec<Flash>,
    expires: Instant,
}

/// Session token -> session record. Anonymous visitors get a session too, so
/// flash messages work before login. Expired entries are dropped lazily on
/// access and swept by a background task.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<DashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Mint an anonymous session and return its token.
    pub fn create(&self) -> String {
        let token = Uuid::new_v4().to_string();
        self.inner.insert(
            token.clone(),
            Session {
                user_id: None,
                flash: Vec::new(),
                expires: Instant::now() + self.ttl,
            },
        );
        token
    }

    pub fn is_live(&self, token: &str) -> bool {
        self.with_live(token, |_| ()).is_some()
    }

    pub fn user_id(&self, token: &str) -> Option<Uuid> {
        self.with_live(token, |session| session.user_id).flatten()
    }

    /// Bind a user to a fresh token and drop the old session. Rotation keeps a
    /// pre-login token from ever naming an authenticated session.
    pub fn set_user(&self, old_token: &str, user_id: Uuid) -> String {
        self.inner.remove(old_token);
        let token = Uuid::new_v4().to_string();
        self.inner.insert(
            token.clone(),
            Session {
                user_id: Some(user_id),
                flash: Vec::new(),
                expires: Instant::now() + self.ttl,
            },
        );
        token
    }

    pub fn clear_user(&self, token: &str) {
        self.with_live(token, |session| session.user_id = None);
    }

    pub fn push_flash(&self, token: &str, flash: Flash) {
        self.with_live(token, |session| session.flash.push(flash));
    }

    /// Consume the queued flash messages. A second call returns nothing.
    pub fn take_flash(&self, token: &str) -> Vec<Flash> {
        self.with_live(token, |session| std::mem::take(&mut session.flash))
            .unwrap_or_default()
    }

    pub fn remove(&self, token: &str) {
        self.inner.remove(token);
    }

    /// Drop every expired session; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.inner.len();
        self.inner.retain(|_, session| session.expires > now);
        before - self.inner.len()
    }

    fn with_live<T>(&self, token: &str, apply: impl FnOnce(&mut Session) -> T) -> Option<T> {
        let mut entry = self.inner.get_mut(token)?;
        if entry.expires > Instant::now() {
            Some(apply(&mut entry))
        } else {
            drop(entry);
            self.inner.remove(token);
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub users: UserStore,
    pub campgrounds: CampgroundStore,
    pub sessions: SessionStore,
    pub secure_cookies: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;

    use super::{Flash, SessionStore};

    #[test]
    fn flash_is_consumed_once() {
        let sessions = SessionStore::new(Duration::from_secs(3600));
        let token = sessions.create();

        sessions.push_flash(&token, Flash::success("hello"));
        sessions.push_flash(&token, Flash::error("oops"));

        let taken = sessions.take_flash(&token);
        assert_eq!(taken.len(), 2);
        assert!(sessions.take_flash(&token).is_empty());
    }

    #[test]
    fn expired_sessions_are_dropped_on_access() {
        let sessions = SessionStore::new(Duration::ZERO);
        let token = sessions.create();
        assert!(!sessions.is_live(&token));
    }

    #[test]
    fn set_user_rotates_the_token() {
        let sessions = SessionStore::new(Duration::from_secs(3600));
        let anonymous = sessions.create();
        let user_id = Uuid::new_v4();

        let rotated = sessions.set_user(&anonymous, user_id);
        assert_ne!(anonymous, rotated);
        assert!(!sessions.is_live(&anonymous));
        assert_eq!(sessions.user_id(&rotated), Some(user_id));
    }

    #[test]
    fn clear_user_keeps_the_session_alive() {
        let sessions = SessionStore::new(Duration::from_secs(3600));
        let token = sessions.set_user(&sessions.create(), Uuid::new_v4());

        sessions.clear_user(&token);
        assert!(sessions.is_live(&token));
        assert_eq!(sessions.user_id(&token), None);
    }

    #[test]
    fn purge_expired_reports_removed_count() {
        let sessions = SessionStore::new(Duration::ZERO);
        sessions.create();
        sessions.create();
        assert_eq!(sessions.purge_expired(), 2);
        assert_eq!(sessions.purge_expired(), 0);
    }
}
