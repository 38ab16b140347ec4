use async_trait::async_trait;

use types::domain::{LoginRequest, MessageBody, Role, User};
use types::error::Error;

/// Role login against the backend host.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<MessageBody, Error>;

    fn dashboard_url(&self, role: Role) -> String;
}

/// Account registration. A provider that confirms immediately hands back an
/// access token.
#[async_trait]
pub trait SignupProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Option<String>, Error>;
}

/// Resolves a stored access token to the signed-in user, `None` when the
/// token is no longer accepted.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn user(&self, access_token: &str) -> Result<Option<User>, Error>;
}
