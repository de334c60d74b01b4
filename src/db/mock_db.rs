use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::user_repository::{InsertError, UserRepository};
use crate::models::{
    business::{Business, NewBusiness},
    identity::NormalizedIdentity,
    user::{EmailVerificationStatus, NewAccount, OauthProvider, User, UserRole},
};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    verification_token: Option<String>,
    reset_token: Option<String>,
    reset_expires: Option<OffsetDateTime>,
}

#[derive(Default)]
struct Store {
    users: Vec<StoredUser>,
    businesses: Vec<Business>,
    oauth_links: Vec<(Uuid, OauthProvider, String)>,
}

/// In-memory repository for handler and service tests.
#[derive(Default)]
pub struct MockDb {
    store: Mutex<Store>,
    should_fail: bool,
    fail_business_insert: bool,
    /// Account written by a competing request just before the next insert.
    competing_signup: Mutex<Option<User>>,
}

pub fn sample_user(email: &str, role: UserRole) -> User {
    User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: Some("Test User".into()),
        image: None,
        password_hash: String::new(),
        role,
        oauth_provider: Some(OauthProvider::Email),
        email_verified: true,
        email_verification_attempts: 0,
        email_verification_last_attempt: None,
        email_verification_status: EmailVerificationStatus::Verified,
        created_at: OffsetDateTime::now_utc(),
    }
}

fn mock_failure() -> sqlx::Error {
    sqlx::Error::Protocol("Mock DB failure".into())
}

impl MockDb {
    pub fn failing() -> Self {
        MockDb {
            should_fail: true,
            ..Default::default()
        }
    }

    /// The business insert fails after the account row is written, and the
    /// account row is then rolled back.
    pub fn failing_business_insert() -> Self {
        MockDb {
            fail_business_insert: true,
            ..Default::default()
        }
    }

    /// Lands `user` between the caller's availability check and its insert.
    pub fn with_competing_signup(user: User) -> Self {
        MockDb {
            competing_signup: Mutex::new(Some(user)),
            ..Default::default()
        }
    }

    fn land_competing_signup(&self, store: &mut Store) {
        if let Some(user) = self.competing_signup.lock().unwrap().take() {
            store.users.push(StoredUser {
                user,
                verification_token: None,
                reset_token: None,
                reset_expires: None,
            });
        }
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let db = MockDb::default();
        for user in users {
            db.insert_user(user);
        }
        db
    }

    pub fn insert_user(&self, user: User) {
        self.store.lock().unwrap().users.push(StoredUser {
            user,
            verification_token: None,
            reset_token: None,
            reset_expires: None,
        });
    }

    pub fn user(&self, email: &str) -> Option<User> {
        self.store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|s| s.user.email == email)
            .map(|s| s.user.clone())
    }

    pub fn user_count(&self) -> usize {
        self.store.lock().unwrap().users.len()
    }

    pub fn business_count(&self) -> usize {
        self.store.lock().unwrap().businesses.len()
    }

    pub fn verification_token_hash(&self, email: &str) -> Option<String> {
        self.store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|s| s.user.email == email)
            .and_then(|s| s.verification_token.clone())
    }

    pub fn reset_token_hash(&self, email: &str) -> Option<String> {
        self.store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|s| s.user.email == email)
            .and_then(|s| s.reset_token.clone())
    }

    pub fn set_reset_token(&self, email: &str, hash: &str, expires_at: OffsetDateTime) {
        let mut store = self.store.lock().unwrap();
        if let Some(stored) = store.users.iter_mut().find(|s| s.user.email == email) {
            stored.reset_token = Some(hash.to_string());
            stored.reset_expires = Some(expires_at);
        }
    }

    pub fn set_verification_token(&self, email: &str, hash: &str) {
        let mut store = self.store.lock().unwrap();
        if let Some(stored) = store.users.iter_mut().find(|s| s.user.email == email) {
            stored.verification_token = Some(hash.to_string());
        }
    }

    pub fn set_last_verification_attempt(&self, email: &str, at: OffsetDateTime) {
        let mut store = self.store.lock().unwrap();
        if let Some(stored) = store.users.iter_mut().find(|s| s.user.email == email) {
            stored.user.email_verification_last_attempt = Some(at);
        }
    }

    pub fn oauth_links(&self) -> Vec<(Uuid, OauthProvider, String)> {
        self.store.lock().unwrap().oauth_links.clone()
    }

    fn new_stored_user(account: &NewAccount) -> StoredUser {
        StoredUser {
            user: User {
                id: Uuid::new_v4(),
                email: account.email.clone(),
                name: account.name.clone(),
                image: None,
                password_hash: account.password_hash.clone(),
                role: account.role,
                oauth_provider: Some(OauthProvider::Email),
                email_verified: false,
                email_verification_attempts: 0,
                email_verification_last_attempt: None,
                email_verification_status: EmailVerificationStatus::Pending,
                created_at: OffsetDateTime::now_utc(),
            },
            verification_token: Some(account.verification_token_hash.clone()),
            reset_token: None,
            reset_expires: None,
        }
    }
}

#[async_trait]
impl UserRepository for MockDb {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        Ok(self.user(email))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        Ok(self
            .store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|s| s.user.id == user_id)
            .map(|s| s.user.clone()))
    }

    async fn is_email_taken(&self, email: &str) -> Result<bool, sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        Ok(self.user(email).is_some())
    }

    async fn create_user(&self, account: &NewAccount) -> Result<User, InsertError> {
        if self.should_fail {
            return Err(mock_failure().into());
        }
        let mut store = self.store.lock().unwrap();
        self.land_competing_signup(&mut store);
        if store.users.iter().any(|s| s.user.email == account.email) {
            return Err(InsertError::DuplicateEmail);
        }
        let stored = Self::new_stored_user(account);
        let user = stored.user.clone();
        store.users.push(stored);
        Ok(user)
    }

    async fn create_business_owner(
        &self,
        account: &NewAccount,
        business: &NewBusiness,
    ) -> Result<(User, Business), InsertError> {
        if self.should_fail {
            return Err(mock_failure().into());
        }
        let mut store = self.store.lock().unwrap();
        self.land_competing_signup(&mut store);
        if store.users.iter().any(|s| s.user.email == account.email) {
            return Err(InsertError::DuplicateEmail);
        }

        // rolled back if the business row cannot be written
        let stored = Self::new_stored_user(account);
        let user = stored.user.clone();
        store.users.push(stored);

        if self.fail_business_insert {
            store.users.retain(|s| s.user.id != user.id);
            return Err(mock_failure().into());
        }

        let created = Business {
            id: Uuid::new_v4(),
            owner_id: user.id,
            name: business.name.clone(),
            category: business.category.clone(),
            phone: business.phone.clone(),
            website: business.website.clone(),
            address: business.address.clone(),
            city: business.city.clone(),
            county: business.county.clone(),
            eircode: business.eircode.clone(),
            opening_hours: business.opening_hours.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        store.businesses.push(created.clone());
        Ok((user, created))
    }

    async fn find_business_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Option<Business>, sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        Ok(self
            .store
            .lock()
            .unwrap()
            .businesses
            .iter()
            .find(|b| b.owner_id == owner_id)
            .cloned())
    }

    async fn consume_verification_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        let mut store = self.store.lock().unwrap();
        let Some(stored) = store
            .users
            .iter_mut()
            .find(|s| s.verification_token.as_deref() == Some(token_hash))
        else {
            return Ok(None);
        };
        stored.verification_token = None;
        stored.user.email_verified = true;
        stored.user.email_verification_status = EmailVerificationStatus::Verified;
        Ok(Some(stored.user.id))
    }

    async fn replace_verification_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        attempted_at: OffsetDateTime,
        not_after: OffsetDateTime,
    ) -> Result<bool, sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        let mut store = self.store.lock().unwrap();
        let Some(stored) = store.users.iter_mut().find(|s| {
            s.user.id == user_id
                && s.user
                    .email_verification_last_attempt
                    .map_or(true, |last| last <= not_after)
        }) else {
            return Ok(false);
        };
        stored.verification_token = Some(token_hash.to_string());
        stored.user.email_verification_attempts += 1;
        stored.user.email_verification_last_attempt = Some(attempted_at);
        stored.user.email_verification_status = EmailVerificationStatus::Pending;
        Ok(true)
    }

    async fn set_verification_status(
        &self,
        user_id: Uuid,
        status: EmailVerificationStatus,
    ) -> Result<(), sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        let mut store = self.store.lock().unwrap();
        if let Some(stored) = store.users.iter_mut().find(|s| s.user.id == user_id) {
            stored.user.email_verification_status = status;
        }
        Ok(())
    }

    async fn set_password_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        let mut store = self.store.lock().unwrap();
        if let Some(stored) = store.users.iter_mut().find(|s| s.user.id == user_id) {
            stored.reset_token = Some(token_hash.to_string());
            stored.reset_expires = Some(expires_at);
        }
        Ok(())
    }

    async fn find_user_id_by_reset_token(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        Ok(self
            .store
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|s| {
                s.reset_token.as_deref() == Some(token_hash)
                    && s.reset_expires.is_some_and(|exp| exp > now)
            })
            .map(|s| s.user.id))
    }

    async fn consume_password_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        let mut store = self.store.lock().unwrap();
        let Some(stored) = store.users.iter_mut().find(|s| {
            s.reset_token.as_deref() == Some(token_hash)
                && s.reset_expires.is_some_and(|exp| exp > now)
        }) else {
            return Ok(None);
        };
        stored.user.password_hash = password_hash.to_string();
        stored.reset_token = None;
        stored.reset_expires = None;
        Ok(Some(stored.user.id))
    }

    async fn create_user_with_oauth(
        &self,
        identity: &NormalizedIdentity,
    ) -> Result<User, sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        let mut user = sample_user(&identity.email, UserRole::Customer);
        user.name = identity.name.clone();
        user.image = identity.image.clone();
        user.oauth_provider = Some(identity.provider);
        self.insert_user(user.clone());
        Ok(user)
    }

    async fn refresh_user_from_oauth(
        &self,
        user_id: Uuid,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        let mut store = self.store.lock().unwrap();
        let stored = store
            .users
            .iter_mut()
            .find(|s| s.user.id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        stored.verification_token = None;
        stored.user.email_verified = true;
        stored.user.email_verification_status = EmailVerificationStatus::Verified;
        if let Some(name) = name {
            stored.user.name = Some(name.to_string());
        }
        if let Some(image) = image {
            stored.user.image = Some(image.to_string());
        }
        Ok(stored.user.clone())
    }

    async fn link_oauth_account(
        &self,
        user_id: Uuid,
        provider: OauthProvider,
        provider_account_id: &str,
    ) -> Result<(), sqlx::Error> {
        if self.should_fail {
            return Err(mock_failure());
        }
        let mut store = self.store.lock().unwrap();
        let exists = store
            .oauth_links
            .iter()
            .any(|(_, p, id)| *p == provider && id == provider_account_id);
        if !exists {
            store
                .oauth_links
                .push((user_id, provider, provider_account_id.to_string()));
        }
        Ok(())
    }
}
