use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Session token payload. `iss` and `aud` are stamped by `create_jwt`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Claims {
    pub sub: String, // user UUID
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub email_verified: bool,
    pub exp: usize, // expiration (as UNIX timestamp)
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub aud: String,
}

impl Claims {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}
