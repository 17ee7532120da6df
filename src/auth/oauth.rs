//! OAuth authorization-code flow against Auth0

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AuthConfig;
use crate::models::SessionIdentity;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Sign-in state is missing or does not match")]
    StateMismatch,
    #[error("Authorization code missing from callback")]
    MissingCode,
    #[error("Sign-in was refused: {0}")]
    Denied(String),
    #[error("Identity provider request failed: {0:#}")]
    Provider(#[from] anyhow::Error),
}

/// Third-party sign-in
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to start signing in
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String;

    /// Trade an authorization code for the signed-in identity
    async fn authenticate(&self, code: &str, redirect_uri: &str) -> Result<SessionIdentity, AuthError>;

    /// Where to send the browser after the local session is cleared
    fn logout_url(&self, return_to: &str) -> String;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<UserInfo> for SessionIdentity {
    fn from(info: UserInfo) -> Self {
        let display_name = info
            .name
            .or(info.nickname)
            .unwrap_or_else(|| info.sub.clone());
        SessionIdentity::new(info.sub, display_name, info.picture.unwrap_or_default())
    }
}

pub struct Auth0Provider {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
}

impl Auth0Provider {
    pub fn new(config: &AuthConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build identity provider HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
        })
    }

    fn audience(&self) -> String {
        format!("{}/userinfo", self.base_url)
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/oauth/token", self.base_url))
            .json(&TokenRequest {
                grant_type: "authorization_code",
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                code,
                redirect_uri,
            })
            .send()
            .await
            .context("Token request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Token endpoint returned {}", status);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;
        Ok(token.access_token)
    }

    async fn fetch_userinfo(&self, access_token: &str) -> anyhow::Result<UserInfo> {
        let response = self
            .client
            .get(format!("{}/userinfo", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await
            .context("Userinfo request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Userinfo endpoint returned {}", status);
        }

        response.json().await.context("Failed to parse userinfo")
    }
}

#[async_trait]
impl IdentityProvider for Auth0Provider {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String {
        format!(
            "{}/authorize?response_type=code&client_id={}&redirect_uri={}&scope={}&audience={}&state={}",
            self.base_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&self.scope),
            urlencoding::encode(&self.audience()),
            urlencoding::encode(state),
        )
    }

    async fn authenticate(&self, code: &str, redirect_uri: &str) -> Result<SessionIdentity, AuthError> {
        let access_token = self.exchange_code(code, redirect_uri).await?;
        let info = self.fetch_userinfo(&access_token).await?;
        tracing::info!("Signed in {}", info.sub);
        Ok(info.into())
    }

    fn logout_url(&self, return_to: &str) -> String {
        format!(
            "{}/v2/logout?returnTo={}&client_id={}",
            self.base_url,
            urlencoding::encode(return_to),
            urlencoding::encode(&self.client_id),
        )
    }
}
