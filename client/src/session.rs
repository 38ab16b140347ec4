use async_trait::async_trait;
use eyre::Result;
use keyring::Entry;
use log::{debug, info, warn};

use types::domain::{Session, User};
use types::error::Error;

use crate::auth::{IdentityProvider, SignupProvider};

pub const KEYRING_SERVICE: &str = "optima";
const KEYRING_USER: &str = "access_token";

/// Access token kept in the OS keyring between runs.
#[cfg_attr(test, faux::create)]
pub struct TokenStore {
    entry: Entry,
}

#[cfg_attr(test, faux::methods)]
impl TokenStore {
    pub fn new(entry: Entry) -> Self {
        Self { entry }
    }

    pub fn token(&self) -> Option<String> {
        match self.entry.get_password() {
            Ok(token) => Some(token),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!("Could not read stored token: {}", e);
                None
            }
        }
    }

    pub fn save(&self, token: String) -> Result<(), Error> {
        self.entry
            .set_password(&token)
            .map_err(|e| Error::Session(e.to_string()))
    }

    pub fn clear(&self) -> Result<(), Error> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(Error::Session(e.to_string())),
        }
    }
}

pub fn open_token_store(service: &str) -> Result<TokenStore> {
    Ok(TokenStore::new(Entry::new(service, KEYRING_USER)?))
}

/// The session collaborator: who is signed in, and where sign-up tokens go.
pub struct SessionManager<P> {
    provider: P,
    store: TokenStore,
}

impl<P: IdentityProvider> SessionManager<P> {
    pub fn new(provider: P, store: TokenStore) -> Self {
        Self { provider, store }
    }

    /// Resolves the stored token. Failures leave the user signed out.
    pub async fn restore(&self) -> Session {
        let Some(token) = self.store.token() else {
            debug!("No stored session");
            return Session::resolved(None);
        };
        match self.provider.user(&token).await {
            Ok(Some(user)) => {
                info!("Restored session for user {}", user.id);
                Session::resolved(Some(user))
            }
            Ok(None) => {
                info!("Stored session expired");
                if let Err(e) = self.store.clear() {
                    warn!("Could not clear expired token: {}", e);
                }
                Session::resolved(None)
            }
            Err(e) => {
                warn!("Session lookup failed: {}", e);
                Session::resolved(None)
            }
        }
    }

    pub fn sign_out(&self, user: &User) -> Result<(), Error> {
        info!("Signing out user {}", user.id);
        self.store.clear()
    }
}

#[async_trait]
impl<P: SignupProvider + IdentityProvider> SignupProvider for SessionManager<P> {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Option<String>, Error> {
        let token = self.provider.sign_up(email, password, full_name).await?;
        if let Some(token) = &token {
            if let Err(e) = self.store.save(token.clone()) {
                warn!("Could not store session token: {}", e);
            }
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[derive(Default)]
    struct FakeProvider {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        async fn user(&self, access_token: &str) -> Result<Option<User>, Error> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            match access_token {
                "good" => Ok(Some(User {
                    id: "u1".to_string(),
                    email: None,
                })),
                "broken" => Err(Error::Session("boom".to_string())),
                _ => Ok(None),
            }
        }
    }

    #[async_trait]
    impl SignupProvider for FakeProvider {
        async fn sign_up(&self, email: &str, _: &str, _: &str) -> Result<Option<String>, Error> {
            match email {
                "instant@example.com" => Ok(Some("tok-1".to_string())),
                _ => Ok(None),
            }
        }
    }

    fn store_with(token: Option<&'static str>) -> TokenStore {
        let mut store = TokenStore::faux();
        faux::when!(store.token).then(move |_| token.map(str::to_string));
        store
    }

    #[tokio::test]
    async fn no_token_means_signed_out_without_lookup() {
        let provider = FakeProvider::default();
        let manager = SessionManager::new(provider, store_with(None));
        let session = manager.restore().await;
        assert_eq!(session, Session::resolved(None));
        assert_eq!(manager.provider.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_token_restores_user() {
        let manager = SessionManager::new(FakeProvider::default(), store_with(Some("good")));
        let session = manager.restore().await;
        assert!(!session.loading);
        assert_eq!(session.user.map(|u| u.id).as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn expired_token_is_cleared() {
        let cleared = Arc::new(AtomicUsize::new(0));
        let mut store = store_with(Some("stale"));
        let counter = cleared.clone();
        faux::when!(store.clear).then(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let manager = SessionManager::new(FakeProvider::default(), store);
        assert_eq!(manager.restore().await, Session::resolved(None));
        assert_eq!(cleared.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lookup_failure_keeps_token() {
        let manager = SessionManager::new(FakeProvider::default(), store_with(Some("broken")));
        assert_eq!(manager.restore().await, Session::resolved(None));
    }

    #[test]
    fn sign_out_clears_the_store() {
        let cleared = Arc::new(AtomicUsize::new(0));
        let mut store = TokenStore::faux();
        let counter = cleared.clone();
        faux::when!(store.clear).then(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let manager = SessionManager::new(FakeProvider::default(), store);
        let user = User {
            id: "u1".to_string(),
            email: Some("ada@example.com".to_string()),
        };
        assert_eq!(manager.sign_out(&user), Ok(()));
        assert_eq!(cleared.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn immediate_sign_up_token_is_saved() {
        let saved = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
        let mut store = TokenStore::faux();
        let sink = saved.clone();
        faux::when!(store.save).then(move |token: String| {
            sink.lock().unwrap().push(token);
            Ok(())
        });
        let manager = SessionManager::new(FakeProvider::default(), store);

        let token = manager
            .sign_up("instant@example.com", "secret", "Ada")
            .await
            .unwrap();
        assert_eq!(token.as_deref(), Some("tok-1"));
        assert_eq!(manager.sign_up("later@example.com", "secret", "Ada").await.unwrap(), None);
        assert_eq!(*saved.lock().unwrap(), vec!["tok-1".to_string()]);
    }
}
