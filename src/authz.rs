//! Role-based route access. Every guard goes through [`authorize`].

use crate::errors::AppError;
use crate::models::user::UserRole;
use crate::routes::auth::session::AuthSession;

pub const FALLBACK_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectedArea {
    Dashboard,
    Profile,
    Business,
    Admin,
    Moderator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    SignInRequired,
    RedirectTo(&'static str),
}

impl ProtectedArea {
    /// Role required beyond being signed in, if any.
    fn required_role(&self) -> Option<UserRole> {
        match self {
            ProtectedArea::Dashboard | ProtectedArea::Profile => None,
            ProtectedArea::Business => Some(UserRole::BusinessOwner),
            ProtectedArea::Admin => Some(UserRole::Admin),
            ProtectedArea::Moderator => Some(UserRole::Moderator),
        }
    }
}

pub fn authorize(role: Option<UserRole>, area: ProtectedArea) -> Access {
    let Some(role) = role else {
        return Access::SignInRequired;
    };

    match area.required_role() {
        Some(required) if required != role => Access::RedirectTo(FALLBACK_PATH),
        _ => Access::Granted,
    }
}

pub fn landing_path(role: UserRole) -> &'static str {
    match role {
        UserRole::BusinessOwner => "/business/dashboard",
        UserRole::Admin => "/admin/dashboard",
        UserRole::Customer => "/customer/dashboard",
        UserRole::Moderator => FALLBACK_PATH,
    }
}

impl AuthSession {
    pub fn require(&self, area: ProtectedArea) -> Result<(), AppError> {
        match authorize(Some(self.0.role), area) {
            Access::Granted => Ok(()),
            Access::SignInRequired => Err(AppError::Unauthorized("Sign in required".into())),
            Access::RedirectTo(redirect_to) => Err(AppError::AccessDenied { redirect_to }),
        }
    }
}
