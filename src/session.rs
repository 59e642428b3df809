//! Process-wide credential state.
//!
//! [`Session`] is the single place the bearer credential lives. Components
//! never read the credential directly; the transport asks for it per
//! request, and a forced sign-out (missing or rejected credential) is
//! observable through a watch channel.

use std::sync::{PoisonError, RwLock};

use tokio::sync::watch;

/// Holder for the current bearer credential with an explicit
/// `init`/`clear` lifecycle.
pub struct Session {
    token: RwLock<Option<String>>,
    auth_tx: watch::Sender<bool>,
}

impl Session {
    pub fn new() -> Self {
        let (auth_tx, _) = watch::channel(false);
        Self {
            token: RwLock::new(None),
            auth_tx,
        }
    }

    /// Installs a credential and signals observers that the session is live.
    pub fn init(&self, token: String) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(token);
        drop(guard);
        self.auth_tx.send_replace(true);
    }

    /// Drops the credential and signals sign-out. Called by the transport
    /// when the backend rejects the session; idempotent.
    pub fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        let had_token = guard.take().is_some();
        drop(guard);
        if had_token {
            log::info!("session credential cleared, signing out");
        }
        self.auth_tx.send_replace(false);
    }

    /// Current credential, if any.
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Watch channel carrying `true` while a credential is installed.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.auth_tx.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unauthenticated() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn init_then_clear_lifecycle() {
        let session = Session::new();
        session.init("tok-123".into());
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("tok-123"));

        session.clear();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let session = Session::new();
        session.clear();
        session.clear();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn subscribers_observe_sign_out() {
        let session = Session::new();
        let rx = session.subscribe();
        session.init("tok".into());
        assert!(*rx.borrow());
        session.clear();
        assert!(!*rx.borrow());
    }
}
