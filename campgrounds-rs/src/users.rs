//! User documents and the credential store.
//!
//! Passwords are bcrypt-hashed at registration and only ever compared through
//! `bcrypt::verify`. The hash stays inside the store; `User` carries no credential
//! material and is safe to hand to rendering code.

use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use dashmap::DashMap;
use regex::Regex;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Why a registration was rejected. The `Display` text of these variants is shown
/// to the user as a flash message on the registration form.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("username is required")]
    MissingUsername,
    #[error("that does not look like an email address")]
    InvalidEmail,
    #[error("password is required")]
    MissingPassword,
    #[error("a user with that username already exists")]
    DuplicateUsername,
    #[error("a user with that email already exists")]
    DuplicateEmail,
    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .unwrap_or_else(|e| panic!("email regex must be valid: {e}"))
});

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

/// In-memory user collection. Username and email are unique; uniqueness is
/// enforced here the way the document store of the original app enforced it with
/// indexes.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    inner: Arc<DashMap<Uuid, StoredUser>>,
    register_lock: Arc<Mutex<()>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user with a freshly hashed credential. Usernames are trimmed and
    /// emails lowercased before the uniqueness checks.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, RegisterError> {
        let username = username.trim();
        let email = email.trim().to_ascii_lowercase();

        if username.is_empty() {
            return Err(RegisterError::MissingUsername);
        }
        if !EMAIL_RE.is_match(&email) {
            return Err(RegisterError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(RegisterError::MissingPassword);
        }

        // Held across check-and-insert so two concurrent registrations of the
        // same name cannot both pass the uniqueness checks.
        let _guard = self
            .register_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self
            .inner
            .iter()
            .any(|entry| entry.user.username == username)
        {
            return Err(RegisterError::DuplicateUsername);
        }
        if self.inner.iter().any(|entry| entry.user.email == email) {
            return Err(RegisterError::DuplicateEmail);
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        let user = User {
            id: Uuid::new_v4(),
            username: String::from(username),
            email,
        };
        self.inner.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash,
            },
        );
        Ok(user)
    }

    /// Check a username/password pair. `None` on unknown user or wrong password;
    /// the caller cannot tell which.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        let entry = self
            .inner
            .iter()
            .find(|entry| entry.user.username == username)?;
        match bcrypt::verify(password, &entry.password_hash) {
            Ok(true) => Some(entry.user.clone()),
            Ok(false) => None,
            Err(error) => {
                warn!(username, error = %error, "credential verification failed");
                None
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.inner.get(&id).map(|entry| entry.user.clone())
    }

    pub fn find_by_username(&self, username: &str) -> Option<User> {
        self.inner
            .iter()
            .find(|entry| entry.user.username == username)
            .map(|entry| entry.user.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::{RegisterError, UserStore};

    #[test]
    fn register_then_authenticate_round_trip() {
        let store = UserStore::new();
        let user = store.register("bob", "a@b.com", "pw").unwrap();

        let authenticated = store.authenticate("bob", "pw").unwrap();
        assert_eq!(authenticated, user);
        assert_eq!(store.get(user.id).unwrap().username, "bob");
    }

    #[test]
    fn authenticate_rejects_wrong_password() {
        let store = UserStore::new();
        store.register("bob", "a@b.com", "pw").unwrap();
        assert!(store.authenticate("bob", "wrong").is_none());
    }

    #[test]
    fn authenticate_rejects_unknown_user() {
        let store = UserStore::new();
        store.register("bob", "a@b.com", "pw").unwrap();
        assert!(store.authenticate("alice", "pw").is_none());
    }

    #[test]
    fn register_rejects_duplicate_username() {
        let store = UserStore::new();
        store.register("bob", "a@b.com", "pw").unwrap();
        let result = store.register("bob", "other@b.com", "pw");
        assert!(matches!(result, Err(RegisterError::DuplicateUsername)));
    }

    #[test]
    fn register_rejects_duplicate_email_case_insensitively() {
        let store = UserStore::new();
        store.register("bob", "a@b.com", "pw").unwrap();
        let result = store.register("alice", "A@B.COM", "pw");
        assert!(matches!(result, Err(RegisterError::DuplicateEmail)));
    }

    #[test]
    fn register_rejects_malformed_email() {
        let store = UserStore::new();
        assert!(matches!(
            store.register("bob", "not-an-email", "pw"),
            Err(RegisterError::InvalidEmail)
        ));
    }

    #[test]
    fn concurrent_registration_admits_exactly_one_winner() {
        let store = UserStore::new();
        let handles = (0..4)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .register("bob", &format!("bob{i}@example.com"), "pw")
                        .is_ok()
                })
            })
            .collect::<Vec<_>>();

        let successes = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|registered| *registered)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
        assert!(store.find_by_username("bob").is_some());
    }

    #[test]
    fn register_rejects_blank_username_and_password() {
        let store = UserStore::new();
        assert!(matches!(
            store.register("  ", "a@b.com", "pw"),
            Err(RegisterError::MissingUsername)
        ));
        assert!(matches!(
            store.register("bob", "a@b.com", ""),
            Err(RegisterError::MissingPassword)
        ));
    }
}
