use async_trait::async_trait;
use eyre::Result;
use log::{debug, info, warn};
use reqwest::Client as ReqwestClient;

use types::domain::{LoginRequest, MessageBody, Role};
use types::error::Error;

use crate::auth::Authenticator;
use crate::config::Config;

/// HTTP client for the role login endpoints of the backend host.
pub struct Client {
    pub client: ReqwestClient,
    base_url: String,
}

impl Client {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = ReqwestClient::builder().cookie_store(true);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.api_url.clone(),
        })
    }

    pub fn login_url(&self, role: Role) -> String {
        format!("{}{}", self.base_url, role.login_path())
    }
}

fn network(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

#[async_trait]
impl Authenticator for Client {
    async fn login(&self, request: &LoginRequest) -> Result<MessageBody, Error> {
        let url = self.login_url(request.role);
        debug!("POST {} as {}", url, request.role);
        let response = self
            .client
            .post(&url)
            .json(&request.payload())
            .send()
            .await
            .map_err(network)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(network)?;
        let body: MessageBody = serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Response {} from {} is not JSON: {}", status, url, e);
            Error::Network(e.to_string())
        })?;

        if status.is_success() {
            info!("{} login accepted for {}", request.role, request.email);
            Ok(body)
        } else {
            warn!("{} login rejected with {}", request.role, status);
            Err(Error::Rejected {
                status: status.as_u16(),
                message: body.message,
            })
        }
    }

    fn dashboard_url(&self, role: Role) -> String {
        format!("{}{}", self.base_url, role.dashboard_path())
    }
}
