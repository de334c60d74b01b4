use async_trait::async_trait;
use serde_json::Value;

use super::{errors::OAuthError, OAuthClient};
use crate::models::user::OauthProvider;

pub struct MockOAuthClient {
    pub provider: OauthProvider,
    pub token: String,
    pub profile: Value,
    pub fail_exchange: bool,
}

impl MockOAuthClient {
    pub fn new(provider: OauthProvider, profile: Value) -> Self {
        Self {
            provider,
            token: "mock-access-token".into(),
            profile,
            fail_exchange: false,
        }
    }
}

#[async_trait]
impl OAuthClient for MockOAuthClient {
    fn provider(&self) -> OauthProvider {
        self.provider
    }

    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        Ok(format!(
            "https://provider.example.com/{}/authorize?state={}",
            self.provider.slug(),
            state
        ))
    }

    async fn exchange_code_for_token(&self, _code: &str) -> Result<String, OAuthError> {
        if self.fail_exchange {
            return Err(OAuthError::TokenExchangeFailed);
        }
        Ok(self.token.clone())
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<Value, OAuthError> {
        Ok(self.profile.clone())
    }
}
