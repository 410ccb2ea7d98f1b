//! Signed-in session state.
//!
//! The session is an explicit object injected into the API client and
//! anything else that needs auth state - never ambient globals. Login,
//! logout, and token rejection are observable through a watch channel, so
//! collaborators react to changes instead of polling.
//!
//! The token and account summary persist in client-side [`storage`] (keys
//! [`keys::TOKEN`] and [`keys::USER`]) and are restored on startup.
//!
//! [`storage`]: crate::storage
//! [`keys::TOKEN`]: crate::storage::keys::TOKEN
//! [`keys::USER`]: crate::storage::keys::USER

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use cartwheel_core::UserId;

use crate::storage::{SharedStorage, StorageError, keys};

/// Minimal identity of the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    /// Account's backend ID.
    pub id: UserId,
    /// Sign-in name.
    pub username: String,
    /// Account email address.
    pub email: String,
}

struct Authenticated {
    token: SecretString,
    account: Option<AccountSummary>,
}

struct SessionInner {
    storage: SharedStorage,
    state: RwLock<Option<Authenticated>>,
    notify: watch::Sender<Option<AccountSummary>>,
}

/// Auth state for one client.
///
/// Cheaply cloneable; all clones share the same state and storage.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Restore the session persisted in `storage`, or start signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted state cannot be read or parsed.
    pub fn restore(storage: SharedStorage) -> Result<Self, StorageError> {
        let token = storage.get(keys::TOKEN)?.map(SecretString::from);
        let account = match storage.get(keys::USER)? {
            Some(json) => Some(serde_json::from_str(&json)?),
            None => None,
        };

        let state = token.map(|token| Authenticated { token, account });
        let summary = state.as_ref().and_then(|s| s.account.clone());
        let (notify, _) = watch::channel(summary);

        Ok(Self {
            inner: Arc::new(SessionInner {
                storage,
                state: RwLock::new(state),
                notify,
            }),
        })
    }

    /// Sign in with an externally obtained bearer token.
    ///
    /// Persists the token and account summary, then notifies watchers.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be persisted; the in-memory
    /// session is left unchanged in that case.
    pub fn login(
        &self,
        token: SecretString,
        account: Option<AccountSummary>,
    ) -> Result<(), StorageError> {
        self.inner
            .storage
            .set(keys::TOKEN, token.expose_secret())?;
        match &account {
            Some(account) => {
                let json = serde_json::to_string(account)?;
                self.inner.storage.set(keys::USER, &json)?;
            }
            None => self.inner.storage.remove(keys::USER)?,
        }

        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *state = Some(Authenticated {
            token,
            account: account.clone(),
        });
        drop(state);

        debug!("session signed in");
        let _ = self.inner.notify.send(account);
        Ok(())
    }

    /// Sign out, removing the persisted token and account summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted state cannot be removed; the
    /// in-memory session is still cleared.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.clear_state();
        self.inner.storage.remove(keys::TOKEN)?;
        self.inner.storage.remove(keys::USER)?;
        Ok(())
    }

    /// Drop auth state after the server rejected the token.
    ///
    /// Called by the API client on any 401. Storage failures are logged,
    /// not propagated - the in-memory state is cleared regardless, so no
    /// further authenticated calls are attempted until re-login.
    pub fn clear_on_unauthorized(&self) {
        self.clear_state();
        if let Err(error) = self.inner.storage.remove(keys::TOKEN) {
            warn!(%error, "failed to remove persisted token");
        }
        if let Err(error) = self.inner.storage.remove(keys::USER) {
            warn!(%error, "failed to remove persisted account");
        }
    }

    /// The bearer token, if signed in.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        let state = self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        state.as_ref().map(|s| s.token.clone())
    }

    /// Whether a token is currently held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// The signed-in account summary, when one was provided at login.
    #[must_use]
    pub fn account(&self) -> Option<AccountSummary> {
        let state = self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        state.as_ref().and_then(|s| s.account.clone())
    }

    /// Subscribe to auth changes: `Some(account)` on login, `None` on
    /// logout or token rejection.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<AccountSummary>> {
        self.inner.notify.subscribe()
    }

    fn clear_state(&self) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let was_authenticated = state.take().is_some();
        drop(state);

        if was_authenticated {
            debug!("session signed out");
            let _ = self.inner.notify.send(None);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("account", &self.account())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn account() -> AccountSummary {
        AccountSummary {
            id: UserId::new(7),
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
        }
    }

    #[test]
    fn test_restore_starts_signed_out() {
        let session = Session::restore(MemoryStorage::shared()).unwrap();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(session.account().is_none());
    }

    #[test]
    fn test_login_persists_and_restores() {
        let storage = MemoryStorage::shared();
        let session = Session::restore(Arc::clone(&storage)).unwrap();
        session
            .login(SecretString::from("tok-1"), Some(account()))
            .unwrap();
        assert!(session.is_authenticated());

        // A fresh session over the same storage sees the login
        let restored = Session::restore(storage).unwrap();
        assert!(restored.is_authenticated());
        assert_eq!(restored.account(), Some(account()));
        assert_eq!(restored.token().unwrap().expose_secret(), "tok-1");
    }

    #[test]
    fn test_logout_removes_persisted_state() {
        let storage = MemoryStorage::shared();
        let session = Session::restore(Arc::clone(&storage)).unwrap();
        session
            .login(SecretString::from("tok-1"), Some(account()))
            .unwrap();
        session.logout().unwrap();

        assert!(!session.is_authenticated());
        assert!(storage.get(keys::TOKEN).unwrap().is_none());
        assert!(storage.get(keys::USER).unwrap().is_none());
    }

    #[test]
    fn test_clear_on_unauthorized_notifies_watchers() {
        let session = Session::restore(MemoryStorage::shared()).unwrap();
        session
            .login(SecretString::from("tok-1"), Some(account()))
            .unwrap();

        let mut watcher = session.subscribe();
        assert_eq!(*watcher.borrow_and_update(), Some(account()));

        session.clear_on_unauthorized();
        assert!(watcher.has_changed().unwrap());
        assert_eq!(*watcher.borrow_and_update(), None);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_watchers_see_login() {
        let session = Session::restore(MemoryStorage::shared()).unwrap();
        let mut watcher = session.subscribe();
        assert_eq!(*watcher.borrow_and_update(), None);

        session.login(SecretString::from("tok-1"), None).unwrap();
        assert!(watcher.has_changed().unwrap());
        // Token without an account summary still counts as signed in
        assert_eq!(*watcher.borrow_and_update(), None);
        assert!(session.is_authenticated());
    }
}
