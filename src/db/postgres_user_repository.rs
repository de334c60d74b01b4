use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    db::user_repository::{InsertError, UserRepository},
    models::{
        business::{Business, NewBusiness},
        identity::NormalizedIdentity,
        user::{EmailVerificationStatus, NewAccount, OauthProvider, User, UserRole},
    },
};

const USER_COLUMNS: &str = r#"
    id,
    email,
    name,
    image,
    password_hash,
    role,
    oauth_provider,
    email_verified,
    email_verification_attempts,
    email_verification_last_attempt,
    email_verification_status,
    created_at
"#;

const BUSINESS_COLUMNS: &str = r#"
    id,
    owner_id,
    name,
    category,
    phone,
    website,
    address,
    city,
    county,
    eircode,
    opening_hours,
    created_at
"#;

pub struct PostgresUserRepository {
    pub pool: PgPool,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn is_email_taken(&self, email: &str) -> Result<bool, sqlx::Error> {
        let res = sqlx::query_scalar::<_, i32>("SELECT 1 FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(res.is_some())
    }

    async fn create_user(&self, account: &NewAccount) -> Result<User, InsertError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                email,
                name,
                password_hash,
                role,
                oauth_provider,
                verification_token,
                email_verification_status
            )
            VALUES ($1, $2, $3, $4, 'email', $5, 'pending')
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(account.role)
        .bind(&account.verification_token_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_business_owner(
        &self,
        account: &NewAccount,
        business: &NewBusiness,
    ) -> Result<(User, Business), InsertError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                email,
                name,
                password_hash,
                role,
                oauth_provider,
                verification_token,
                email_verification_status
            )
            VALUES ($1, $2, $3, $4, 'email', $5, 'pending')
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(account.role)
        .bind(&account.verification_token_hash)
        .fetch_one(&mut *tx)
        .await?;

        let business = sqlx::query_as::<_, Business>(&format!(
            r#"
            INSERT INTO businesses (
                owner_id, name, category, phone, website,
                address, city, county, eircode, opening_hours
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {BUSINESS_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&business.name)
        .bind(&business.category)
        .bind(&business.phone)
        .bind(&business.website)
        .bind(&business.address)
        .bind(&business.city)
        .bind(&business.county)
        .bind(&business.eircode)
        .bind(Json(&business.opening_hours))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((user, business))
    }

    async fn find_business_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Option<Business>, sqlx::Error> {
        sqlx::query_as::<_, Business>(&format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn consume_verification_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
            SET email_verified = true,
                verification_token = NULL,
                email_verification_status = 'verified'
            WHERE verification_token = $1
            RETURNING id
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
    }

    async fn replace_verification_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        attempted_at: OffsetDateTime,
        not_after: OffsetDateTime,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET verification_token = $2,
                email_verification_attempts = email_verification_attempts + 1,
                email_verification_last_attempt = $3,
                email_verification_status = 'pending'
            WHERE id = $1
              AND (email_verification_last_attempt IS NULL
                   OR email_verification_last_attempt <= $4)
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(attempted_at)
        .bind(not_after)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_verification_status(
        &self,
        user_id: Uuid,
        status: EmailVerificationStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET email_verification_status = $2 WHERE id = $1")
            .bind(user_id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_password_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $2,
                password_reset_expires = $3
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_user_id_by_reset_token(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM users
            WHERE password_reset_token = $1
              AND password_reset_expires > $2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
    }

    async fn consume_password_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_token = NULL,
                password_reset_expires = NULL
            WHERE password_reset_token = $1
              AND password_reset_expires > $3
            RETURNING id
            "#,
        )
        .bind(token_hash)
        .bind(password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_user_with_oauth(
        &self,
        identity: &NormalizedIdentity,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                email,
                name,
                image,
                password_hash,
                role,
                oauth_provider,
                email_verified,
                email_verification_status
            )
            VALUES ($1, $2, $3, '', $4, $5, true, 'verified')
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(&identity.image)
        .bind(UserRole::Customer)
        .bind(identity.provider)
        .fetch_one(&self.pool)
        .await
    }

    async fn refresh_user_from_oauth(
        &self,
        user_id: Uuid,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email_verified = true,
                verification_token = NULL,
                email_verification_status = 'verified',
                name = COALESCE($2, name),
                image = COALESCE($3, image)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(name)
        .bind(image)
        .fetch_one(&self.pool)
        .await
    }

    async fn link_oauth_account(
        &self,
        user_id: Uuid,
        provider: OauthProvider,
        provider_account_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO oauth_accounts (user_id, provider, provider_account_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (provider, provider_account_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .bind(provider_account_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
