use serde::{Deserialize, Serialize};

use super::user::OauthProvider;

/// Provider-independent view of a social sign-in profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedIdentity {
    pub provider: OauthProvider,
    pub provider_account_id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}
