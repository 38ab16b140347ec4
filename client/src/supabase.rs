use async_trait::async_trait;
use eyre::Result;
use log::{debug, info, warn};
use reqwest::{Client as ReqwestClient, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::json;

use types::domain::User;
use types::error::{Error, NETWORK_ERROR};

use crate::auth::{IdentityProvider, SignupProvider};
use crate::config::{Config, ProviderConfig};

const NOT_CONFIGURED: &str = "Sign-up is not configured. Set SUPABASE_URL and SUPABASE_ANON_KEY.";

/// GoTrue endpoints of a Supabase project.
pub struct SupabaseAuth {
    client: ReqwestClient,
    provider: Option<ProviderConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ProviderErrorBody {
    fn into_message(self, status: StatusCode) -> String {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| format!("Sign-up provider answered {}", status))
    }
}

#[derive(Debug, Default, Deserialize)]
struct SignupResponse {
    access_token: Option<String>,
}

impl SupabaseAuth {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            provider: config.provider.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<(String, &ProviderConfig), Error> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| Error::Provider(NOT_CONFIGURED.to_string()))?;
        Ok((format!("{}/auth/v1/{}", provider.url, path), provider))
    }
}

fn with_key(builder: RequestBuilder, anon_key: &str, bearer: &str) -> RequestBuilder {
    builder.header("apikey", anon_key).bearer_auth(bearer)
}

async fn provider_error(response: reqwest::Response) -> Error {
    let status = response.status();
    let body = response
        .json::<ProviderErrorBody>()
        .await
        .unwrap_or_default();
    Error::Provider(body.into_message(status))
}

#[async_trait]
impl SignupProvider for SupabaseAuth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<Option<String>, Error> {
        let (url, provider) = self.endpoint("signup")?;
        debug!("POST {}", url);
        let response = with_key(self.client.post(&url), &provider.anon_key, &provider.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
            }))
            .send()
            .await
            .map_err(|e| {
                warn!("Sign-up request for {} failed: {}", email, e);
                Error::Provider(NETWORK_ERROR.to_string())
            })?;

        if !response.status().is_success() {
            let err = provider_error(response).await;
            warn!("Sign-up for {} refused: {}", email, err);
            return Err(err);
        }
        let body = response
            .json::<SignupResponse>()
            .await
            .unwrap_or_default();
        info!("Sign-up accepted for {}", email);
        Ok(body.access_token)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn user(&self, access_token: &str) -> Result<Option<User>, Error> {
        let (url, provider) = self.endpoint("user")?;
        let response = with_key(self.client.get(&url), &provider.anon_key, access_token)
            .send()
            .await
            .map_err(|e| Error::Session(e.to_string()))?;
        match response.status() {
            status if status.is_success() => response
                .json::<User>()
                .await
                .map(Some)
                .map_err(|e| Error::Session(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(Error::Session(format!("user lookup answered {}", status))),
        }
    }
}
