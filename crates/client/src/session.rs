//! Authentication session state.
//!
//! Holds the bearer token and the signed-in user's profile, persists them
//! under the `auth-storage` namespace, and notifies subscribers through a
//! `watch` channel on every change.
//!
//! Token and user travel together: a persisted session holding only one of
//! them is discarded on restore, and [`SessionStore::establish`] /
//! [`SessionStore::logout`] change both in a single notification.

use std::sync::Arc;

use bazaar_core::UserProfile;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::storage::{SESSION_NAMESPACE, Storage};

/// Snapshot of the session.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone, Default)]
pub struct Session {
    token: Option<SecretString>,
    user: Option<UserProfile>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("user", &self.user)
            .finish()
    }
}

impl Session {
    /// The bearer token, if signed in.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    /// The signed-in user's profile.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Whether both token and user are present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    /// Whether neither token nor user is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

/// On-disk shape of the session.
#[derive(Serialize, Deserialize)]
struct PersistedSession {
    token: Option<String>,
    user: Option<UserProfile>,
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.as_ref().map(|t| t.expose_secret().to_string()),
            user: session.user.clone(),
        }
    }
}

/// Process-wide session container.
///
/// Cheap to clone; every clone shares the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    state: watch::Sender<Session>,
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    /// Open the session store, restoring any persisted session.
    ///
    /// An unreadable, corrupt or half-populated persisted session is logged
    /// and treated as signed out.
    #[must_use]
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let restored = restore(storage.as_ref());
        Self {
            inner: Arc::new(SessionStoreInner {
                state: watch::Sender::new(restored),
                storage,
            }),
        }
    }

    /// Current session snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Receive a new snapshot after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// The bearer token to attach to outgoing requests.
    #[must_use]
    pub fn bearer_token(&self) -> Option<SecretString> {
        self.inner.state.borrow().token.clone()
    }

    /// The signed-in user's profile.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.inner.state.borrow().user.clone()
    }

    /// Replace the token.
    pub fn set_token(&self, token: SecretString) {
        self.commit(|session| session.token = Some(token));
    }

    /// Replace the user profile.
    pub fn set_user(&self, user: UserProfile) {
        self.commit(|session| session.user = Some(user));
    }

    /// Set token and user together, as after a successful login or signup.
    pub fn establish(&self, token: SecretString, user: UserProfile) {
        self.commit(|session| {
            session.token = Some(token);
            session.user = Some(user);
        });
    }

    /// Clear token and user together.
    pub fn logout(&self) {
        self.commit(|session| {
            session.token = None;
            session.user = None;
        });
    }

    /// Apply `change`, publish one snapshot, and persist the result.
    fn commit(&self, change: impl FnOnce(&mut Session)) {
        self.inner.state.send_modify(change);
        let snapshot = self.snapshot();
        if let Err(e) = self.persist(&snapshot) {
            warn!(error = %e, "Failed to persist session");
        }
    }

    fn persist(&self, session: &Session) -> Result<(), crate::error::StorageError> {
        if session.is_empty() {
            return self.inner.storage.remove(SESSION_NAMESPACE);
        }
        let contents = serde_json::to_string(&PersistedSession::from(session))?;
        self.inner.storage.save(SESSION_NAMESPACE, &contents)
    }
}

fn restore(storage: &dyn Storage) -> Session {
    let contents = match storage.load(SESSION_NAMESPACE) {
        Ok(Some(contents)) => contents,
        Ok(None) => return Session::default(),
        Err(e) => {
            warn!(error = %e, "Failed to read persisted session");
            return Session::default();
        }
    };

    match serde_json::from_str::<PersistedSession>(&contents) {
        Ok(PersistedSession {
            token: Some(token),
            user: Some(user),
        }) if !token.trim().is_empty() => {
            debug!(user_id = %user.id, "Restored persisted session");
            Session {
                token: Some(SecretString::from(token)),
                user: Some(user),
            }
        }
        Ok(_) => {
            debug!("Persisted session incomplete, starting signed out");
            Session::default()
        }
        Err(e) => {
            warn!(error = %e, "Persisted session is corrupt, starting signed out");
            Session::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{Role, UserId};

    use super::*;
    use crate::storage::MemoryStorage;

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::new("u1"),
            name: "Ada".to_string(),
            email: Some("ada@example.com".to_string()),
            role: Role::Vendor,
            store_name: Some("Ada's Shop".to_string()),
            store_slug: Some("adas-shop".to_string()),
            whatsapp_number: Some("+2348012345678".to_string()),
            bio: None,
        }
    }

    #[test]
    fn test_establish_persists_and_restores() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let store = SessionStore::open(Arc::clone(&storage));
        store.establish(SecretString::from("tok-1"), profile());

        let reopened = SessionStore::open(storage);
        let session = reopened.snapshot();
        assert!(session.is_authenticated());
        assert_eq!(session.token().unwrap().expose_secret(), "tok-1");
        assert_eq!(session.user().unwrap().id, UserId::new("u1"));
    }

    #[test]
    fn test_logout_clears_both_and_storage() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let store = SessionStore::open(Arc::clone(&storage));
        store.establish(SecretString::from("tok-1"), profile());
        store.logout();

        assert!(store.snapshot().is_empty());
        assert!(storage.load(SESSION_NAMESPACE).unwrap().is_none());
    }

    #[test]
    fn test_half_persisted_session_is_discarded() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage
            .save(SESSION_NAMESPACE, r#"{"token":"tok-1","user":null}"#)
            .unwrap();
        assert!(SessionStore::open(Arc::clone(&storage)).snapshot().is_empty());

        storage.save(SESSION_NAMESPACE, "{not json").unwrap();
        assert!(SessionStore::open(storage).snapshot().is_empty());
    }

    #[test]
    fn test_subscribers_see_one_snapshot_per_change() {
        let store = SessionStore::open(Arc::new(MemoryStorage::new()));
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.establish(SecretString::from("tok-1"), profile());
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        store.logout();
        assert!(rx.borrow_and_update().is_empty());
    }

    #[test]
    fn test_debug_redacts_token() {
        let store = SessionStore::open(Arc::new(MemoryStorage::new()));
        store.set_token(SecretString::from("super-secret"));
        let rendered = format!("{:?}", store.snapshot());
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
