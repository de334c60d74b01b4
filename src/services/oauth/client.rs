use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::config::OAuthProviderConfig;
use crate::models::user::OauthProvider;
use crate::services::oauth::{errors::OAuthError, OAuthClient};

pub struct HttpOAuthClient {
    provider: OauthProvider,
    config: OAuthProviderConfig,
    client: Client,
}

impl HttpOAuthClient {
    pub fn new(provider: OauthProvider, config: OAuthProviderConfig, client: Client) -> Self {
        Self {
            provider,
            config,
            client,
        }
    }

    fn scope(&self) -> &'static str {
        match self.provider {
            OauthProvider::Facebook => "email,public_profile",
            _ => "openid email profile",
        }
    }
}

#[async_trait]
impl OAuthClient for HttpOAuthClient {
    fn provider(&self) -> OauthProvider {
        self.provider
    }

    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let mut url = Url::parse(&self.config.authorize_url)
            .map_err(|_| OAuthError::ProviderNotConfigured(self.provider))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", self.scope())
            .append_pair("state", state);

        Ok(url.into())
    }

    async fn exchange_code_for_token(&self, code: &str) -> Result<String, OAuthError> {
        let res = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|_| OAuthError::TokenExchangeFailed)?;

        if !res.status().is_success() {
            return Err(OAuthError::TokenExchangeFailed);
        }

        let token_json: Value = res.json().await.map_err(|_| OAuthError::InvalidTokenJson)?;
        token_json["access_token"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or(OAuthError::InvalidTokenJson)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Value, OAuthError> {
        let res = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|_| OAuthError::UserInfoFetchFailed)?;

        if !res.status().is_success() {
            return Err(OAuthError::UserInfoFetchFailed);
        }

        res.json().await.map_err(|_| OAuthError::InvalidUserInfo)
    }
}
