//! Session store.
//!
//! Holds the bearer token and the identity decoded from it for the lifetime
//! of the client process. The token is persisted so a restart can restore
//! the session without contacting the server.
//!
//! # Lifecycle
//!
//! 1. [`SessionStore::new`] starts in [`SessionStatus::Loading`].
//! 2. [`SessionStore::restore_session`] reads the persisted token and
//!    settles on `Authenticated` or `Anonymous`. An undecodable (or, when
//!    enforced, expired) token is cleared silently.
//! 3. [`SessionStore::establish`] installs a fresh token after login.
//! 4. [`SessionStore::logout`] clears everything and sends the client to
//!    the login route.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use pokestore_core::Identity;

use crate::auth::{TokenDecodeError, TokenDecoder};
use crate::events::{EventBus, Route};
use crate::storage::{self, Storage, StorageError, keys};

/// Authentication state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The persisted token has not been examined yet.
    Loading,
    /// A token is held and decoded into an identity.
    Authenticated,
    /// No usable token.
    Anonymous,
}

/// Errors from installing a new token.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The token could not be decoded.
    #[error(transparent)]
    Token(#[from] TokenDecodeError),

    /// The token could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The in-memory session snapshot.
#[derive(Clone)]
pub struct Session {
    token: Option<SecretString>,
    identity: Option<Identity>,
    status: SessionStatus,
}

impl Session {
    const fn loading() -> Self {
        Self {
            token: None,
            identity: None,
            status: SessionStatus::Loading,
        }
    }

    const fn anonymous() -> Self {
        Self {
            token: None,
            identity: None,
            status: SessionStatus::Anonymous,
        }
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Whether the current identity holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.identity.as_ref().is_some_and(Identity::is_admin)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("identity", &self.identity)
            .field("status", &self.status)
            .finish()
    }
}

/// Shared handle to the process-wide session.
///
/// Cloning is cheap; all clones observe the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    storage: Arc<dyn Storage>,
    decoder: TokenDecoder,
    state: RwLock<Session>,
    navigation: EventBus<Route>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store in the `Loading` state.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, decoder: TokenDecoder) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                storage,
                decoder,
                state: RwLock::new(Session::loading()),
                navigation: EventBus::new(),
            }),
        }
    }

    /// Restore the session from the persisted token.
    ///
    /// Never performs network I/O and never fails: anything short of a
    /// decodable token ends in `Anonymous`.
    pub fn restore_session(&self) -> SessionStatus {
        let stored = match storage::read_json::<String>(self.inner.storage.as_ref(), keys::TOKEN) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Could not read stored token");
                None
            }
        };

        let Some(token) = stored else {
            self.replace(Session::anonymous());
            return SessionStatus::Anonymous;
        };

        match self.inner.decoder.decode(&token, Utc::now()) {
            Ok(decoded) => {
                info!(user_id = %decoded.identity.id, "Restored session");
                self.replace(Session {
                    token: Some(SecretString::from(token)),
                    identity: Some(decoded.identity),
                    status: SessionStatus::Authenticated,
                });
                SessionStatus::Authenticated
            }
            Err(e) => {
                warn!(error = %e, "Stored token is unusable, logging out");
                let _ = self.logout();
                SessionStatus::Anonymous
            }
        }
    }

    /// Install a freshly issued token: decode, persist, then authenticate.
    ///
    /// On error the session is left as it was.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Token` if the token does not decode and
    /// `SessionError::Storage` if it cannot be persisted.
    pub fn establish(&self, token: SecretString) -> Result<Identity, SessionError> {
        let decoded = self
            .inner
            .decoder
            .decode(token.expose_secret(), Utc::now())?;
        storage::write_json(self.inner.storage.as_ref(), keys::TOKEN, token.expose_secret())?;

        info!(user_id = %decoded.identity.id, email = %decoded.identity.email, "Session established");
        self.replace(Session {
            token: Some(token),
            identity: Some(decoded.identity.clone()),
            status: SessionStatus::Authenticated,
        });
        Ok(decoded.identity)
    }

    /// Clear the token and identity, then send the client to login.
    ///
    /// The returned route must be honored by the caller; it is also
    /// published to navigation subscribers.
    #[must_use = "logout ends the current view; navigate to the returned route"]
    pub fn logout(&self) -> Route {
        if let Err(e) = self.inner.storage.remove(keys::TOKEN) {
            warn!(error = %e, "Could not remove stored token");
        }
        self.replace(Session::anonymous());
        info!("Logged out");

        self.inner.navigation.publish(Route::Login);
        Route::Login
    }

    /// A copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.read().status
    }

    /// The current identity, if authenticated.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.read().identity.clone()
    }

    /// The bearer token, if any.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.read().token.clone()
    }

    /// Whether the current identity is an admin. Recomputed on every call.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.read().is_admin()
    }

    /// Receive the routes the client is sent to.
    #[must_use]
    pub fn subscribe_navigation(&self) -> broadcast::Receiver<Route> {
        self.inner.navigation.subscribe()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn replace(&self, session: Session) {
        *self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::storage::MemoryStorage;
    use crate::test_support::token_for;

    fn store_with(storage: &Arc<MemoryStorage>) -> SessionStore {
        SessionStore::new(storage.clone(), TokenDecoder::default())
    }

    #[test]
    fn test_starts_loading() {
        let store = store_with(&Arc::new(MemoryStorage::new()));
        assert_eq!(store.status(), SessionStatus::Loading);
        assert!(store.identity().is_none());
    }

    #[test]
    fn test_restore_without_token_is_anonymous() {
        let store = store_with(&Arc::new(MemoryStorage::new()));
        assert_eq!(store.restore_session(), SessionStatus::Anonymous);
        assert_eq!(store.status(), SessionStatus::Anonymous);
    }

    #[test]
    fn test_restore_valid_token() {
        let storage = Arc::new(MemoryStorage::new());
        let token = token_for(&json!({"sub": 5, "email": "ash@pallet.town", "role": "admin"}));
        storage::write_json(storage.as_ref(), keys::TOKEN, &token).unwrap();

        let store = store_with(&storage);
        assert_eq!(store.restore_session(), SessionStatus::Authenticated);
        assert!(store.is_admin());
        assert_eq!(store.token().unwrap().expose_secret(), token);
    }

    #[test]
    fn test_restore_bad_token_logs_out_silently() {
        let storage = Arc::new(MemoryStorage::new());
        storage::write_json(storage.as_ref(), keys::TOKEN, "garbage").unwrap();

        let store = store_with(&storage);
        let mut navigation = store.subscribe_navigation();

        assert_eq!(store.restore_session(), SessionStatus::Anonymous);
        assert!(storage.get(keys::TOKEN).unwrap().is_none());
        assert_eq!(navigation.try_recv().unwrap(), Route::Login);
    }

    #[test]
    fn test_restore_corrupt_token_value_is_anonymous() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::TOKEN, "{{{").unwrap();

        let store = store_with(&storage);
        assert_eq!(store.restore_session(), SessionStatus::Anonymous);
    }

    #[test]
    fn test_restore_expired_token_depends_on_policy() {
        let past = (Utc::now() - Duration::minutes(5)).timestamp();
        let token = token_for(&json!({"sub": 5, "email": "ash@pallet.town", "exp": past}));

        let storage = Arc::new(MemoryStorage::new());
        storage::write_json(storage.as_ref(), keys::TOKEN, &token).unwrap();
        let lenient = SessionStore::new(storage.clone(), TokenDecoder::new(false));
        assert_eq!(lenient.restore_session(), SessionStatus::Authenticated);

        let strict = SessionStore::new(storage.clone(), TokenDecoder::new(true));
        assert_eq!(strict.restore_session(), SessionStatus::Anonymous);
        assert!(storage.get(keys::TOKEN).unwrap().is_none());
    }

    #[test]
    fn test_establish_persists_token() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(&storage);
        let token = token_for(&json!({"sub": 9, "email": "misty@cerulean.gym"}));

        let identity = store.establish(SecretString::from(token.clone())).unwrap();
        assert_eq!(identity.display_name, "misty");
        assert_eq!(store.status(), SessionStatus::Authenticated);

        let persisted: Option<String> = storage::read_json(storage.as_ref(), keys::TOKEN).unwrap();
        assert_eq!(persisted.as_deref(), Some(token.as_str()));
    }

    #[test]
    fn test_establish_rejects_bad_token_without_side_effects() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(&storage);
        store.restore_session();

        let result = store.establish(SecretString::from("bad".to_string()));
        assert!(matches!(result, Err(SessionError::Token(_))));
        assert_eq!(store.status(), SessionStatus::Anonymous);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_logout_clears_and_navigates() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(&storage);
        let token = token_for(&json!({"sub": 9, "email": "misty@cerulean.gym", "roles": ["admin"]}));
        store.establish(SecretString::from(token)).unwrap();
        assert!(store.is_admin());

        let mut navigation = store.subscribe_navigation();
        assert_eq!(store.logout(), Route::Login);

        assert_eq!(store.status(), SessionStatus::Anonymous);
        assert!(store.identity().is_none());
        assert!(store.token().is_none());
        assert!(!store.is_admin());
        assert!(storage.get(keys::TOKEN).unwrap().is_none());
        assert_eq!(navigation.try_recv().unwrap(), Route::Login);
    }

    #[test]
    fn test_debug_redacts_token() {
        let store = store_with(&Arc::new(MemoryStorage::new()));
        let token = token_for(&json!({"sub": 9, "email": "misty@cerulean.gym"}));
        store.establish(SecretString::from(token.clone())).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(&token));
    }
}
