use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::user::OauthProvider;

pub mod client;
pub mod errors;
pub mod identity;
#[cfg(test)]
pub mod mock_oauth;

use errors::OAuthError;

/// Authorization-code flow against one social provider.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    fn provider(&self) -> OauthProvider;
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError>;
    async fn exchange_code_for_token(&self, code: &str) -> Result<String, OAuthError>;
    async fn fetch_profile(&self, access_token: &str) -> Result<Value, OAuthError>;
}

/// The providers enabled for this deployment.
#[derive(Default, Clone)]
pub struct OAuthProviders {
    clients: HashMap<OauthProvider, Arc<dyn OAuthClient>>,
}

impl OAuthProviders {
    pub fn with(mut self, client: Arc<dyn OAuthClient>) -> Self {
        self.clients.insert(client.provider(), client);
        self
    }

    pub fn get(&self, provider: OauthProvider) -> Result<&Arc<dyn OAuthClient>, OAuthError> {
        self.clients
            .get(&provider)
            .ok_or(OAuthError::ProviderNotConfigured(provider))
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
