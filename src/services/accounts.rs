/// Account service - registration, authentication, password lifecycle
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::User;
use crate::security::password;

/// Reset links stay valid for one hour.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, password_hash, created_at";

pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Register a new account. The password arrives pre-validated; the
    /// username race is resolved by the unique constraint.
    pub async fn create_account(&self, account: NewAccount) -> Result<User> {
        let password_hash = password::hash_password(&account.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&account.username)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Validation("A user with that username already exists.".to_string())
            }
            _ => AppError::from(e),
        })?;

        Ok(user)
    }

    /// Check credentials; `None` means unknown user or wrong password.
    pub async fn authenticate(&self, username: &str, raw_password: &str) -> Result<Option<User>> {
        let Some(user) = self.get_by_username(username).await? else {
            return Ok(None);
        };
        if password::verify_password(raw_password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Replace a user's password.
    pub async fn set_password(&self, user_id: Uuid, new_password: &str) -> Result<()> {
        let password_hash = password::hash_password(new_password)?;
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Issue a reset token for the account behind an email address, if any.
    pub async fn create_reset_token(&self, email: &str) -> Result<Option<(User, Uuid)>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 ORDER BY created_at LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        let token = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(token)
        .bind(user.id)
        .bind(Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS))
        .execute(&self.pool)
        .await?;

        Ok(Some((user, token)))
    }

    /// The user behind a still-valid reset token.
    pub async fn get_reset_token_user(&self, token: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT u.{cols}
            FROM password_reset_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token = $1 AND t.used_at IS NULL AND t.expires_at > NOW()
            "#,
            cols = USER_COLUMNS.replace(", ", ", u.")
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Redeem a reset token: single use, expiring, atomic with the
    /// password change. Returns false when the token is unusable.
    pub async fn redeem_reset_token(&self, token: Uuid, new_password: &str) -> Result<bool> {
        let password_hash = password::hash_password(new_password)?;
        let mut tx = self.pool.begin().await?;

        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE password_reset_tokens
            SET used_at = NOW()
            WHERE token = $1 AND used_at IS NULL AND expires_at > NOW()
            RETURNING user_id
            "#,
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((user_id,)) = row else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(&password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
